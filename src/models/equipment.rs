//! Equipment lifecycle enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EquipmentStatus {
    #[default]
    Available,
    Reserved,
    InUse,
    Maintenance,
    Excluded,
}

impl EquipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Available => "available",
            EquipmentStatus::Reserved => "reserved",
            EquipmentStatus::InUse => "in_use",
            EquipmentStatus::Maintenance => "maintenance",
            EquipmentStatus::Excluded => "excluded",
        }
    }

    /// Equipment can only leave the stock when nothing else holds it.
    pub fn can_withdraw(&self) -> bool {
        matches!(self, EquipmentStatus::Available | EquipmentStatus::Reserved)
    }
}

/// Physical condition of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EquipmentCondition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    Damaged,
}
