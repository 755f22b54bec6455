mod bundle;
mod manifest;
mod meeting;
mod talk;
mod update_log;

pub use bundle::*;
pub use manifest::*;
pub use meeting::*;
pub use talk::*;
pub use update_log::*;

/// Keys a model does not know about, carried through load/save untouched.
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;
