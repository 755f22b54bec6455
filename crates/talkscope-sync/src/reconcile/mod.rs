//! The reconciliation core: match, merge and allocate ids for one meeting.
//!
//! Everything in here is pure and synchronous; fetching, parsing and
//! persistence live in the surrounding modules.

pub mod abstracts;
pub mod ids;
pub mod matcher;
pub mod orchestrator;
pub mod policy;

pub use abstracts::{MAX_CLEAN_PASSES, clean_abstract_text};
pub use ids::next_id;
pub use matcher::{MatchKey, TalkIndex, TalkMatch};
pub use orchestrator::{Reconciliation, reconcile_meeting};
pub use policy::{MeetingContext, TalkMerge, merge_talk, should_refresh_meta};
