//! Where meeting pages come from.

use async_trait::async_trait;

use crate::error::Result;

pub mod llvm_www;

pub use llvm_www::LlvmWwwSource;

/// Read-only access to the upstream devmtg pages.
#[async_trait]
pub trait MeetingSource: Send + Sync {
    fn name(&self) -> &str;

    /// Meeting slugs (`2024-10`, `2019-04-08`), newest first, unique.
    async fn list_slugs(&self) -> Result<Vec<String>>;

    /// Raw HTML of `devmtg/{slug}/index.html`.
    async fn fetch_meeting_page(&self, slug: &str) -> Result<String>;

    /// Raw HTML of the `devmtg/index.html` overview page.
    async fn fetch_index_page(&self) -> Result<String>;
}
