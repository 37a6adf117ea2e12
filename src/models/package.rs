use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Credits of one service bought for one pet.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServicePackage {
    pub id: i64,
    pub pet_id: i64,
    pub service_id: i64,
    pub total_qty: u32,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ServicePackage {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[derive(Debug, Display, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[display("available")]
    Available,
    #[display("scheduled")]
    Scheduled,
    #[display("used")]
    Used,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PackageSlot {
    /// 1-based, as shown to the tutor.
    pub position: u32,
    pub status: SlotStatus,
    pub appointment_id: Option<i64>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PackageUsage {
    pub package_id: i64,
    pub total_qty: u32,
    pub used_qty: u32,
    pub scheduled_qty: u32,
    pub available_qty: u32,
    pub remaining_qty: u32,
    /// Appointments bound to the package beyond its capacity. Two bookings
    /// racing for the last credit both succeed; staff reconcile by hand.
    pub overbooked_qty: u32,
    pub is_expired: bool,
    pub slots: Vec<PackageSlot>,
}

impl PackageUsage {
    /// Whether a new appointment may still be charged to this package.
    pub fn can_book(&self) -> bool {
        !self.is_expired && self.available_qty > 0
    }
}
