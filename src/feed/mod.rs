pub mod client;

pub use client::FederalRegisterClient;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::Notice;

/// Source of the day's candidate notices
#[async_trait]
pub trait NoticeSource: Send + Sync {
    /// Fetch notices published on `date`. Outages yield an empty list.
    async fn fetch_notices(&self, date: NaiveDate) -> Vec<Notice>;
}
