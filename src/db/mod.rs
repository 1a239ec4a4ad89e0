//! Database layer: pool, schema and repositories for SQLite.

mod audit;
mod bags;
mod equipment;
mod events;
mod pool;
mod reservations;
mod transactions;
mod users;

pub use audit::*;
pub use bags::*;
pub use equipment::*;
pub use events::*;
pub use pool::{create_pool, init_schema, DbPool};
pub use reservations::*;
pub use transactions::*;
pub use users::*;

use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

/// `skip`/`limit` window applied to list queries.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            skip: skip.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_LIMIT),
        }
    }

    pub fn skip(&self) -> i64 {
        self.skip.max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(0, MAX_LIMIT)
    }
}
