use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interval the shop marked as unavailable (holiday, staff training...).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ScheduleBlock {
    pub id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl ScheduleBlock {
    /// Half-open overlap between `[start_at, end_at)` and `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_at < end && start < self.end_at
    }
}
