//! talkscope sync: extract LLVM developer meeting pages and reconcile them
//! into the curated talk catalog without losing hand edits.

pub mod candidate;
pub mod changelog;
pub mod error;
pub mod extract;
pub mod http;
pub mod reconcile;
pub mod sources;
pub mod sync;
pub mod text;

pub use candidate::{IndexHint, MeetingHint, TalkCandidate};
pub use error::{Result, SyncError};
pub use extract::ExtractedMeeting;
pub use reconcile::{Reconciliation, reconcile_meeting};
pub use sources::{LlvmWwwSource, MeetingSource};
pub use sync::{SyncOptions, SyncReport, run_sync};
