pub mod json_bundles;

pub use json_bundles::{
    bundle_path, list_bundles, load_bundle, load_manifest, load_update_log, save_bundle,
    save_manifest, save_update_log, to_pretty_json,
};
