//! Bag lifecycle: a named group of equipment moved as one unit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum BagStatus {
    #[default]
    Available,
    Reserved,
    InUse,
    Excluded,
}

impl BagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BagStatus::Available => "available",
            BagStatus::Reserved => "reserved",
            BagStatus::InUse => "in_use",
            BagStatus::Excluded => "excluded",
        }
    }

    pub fn can_withdraw(&self) -> bool {
        matches!(self, BagStatus::Available | BagStatus::Reserved)
    }
}
