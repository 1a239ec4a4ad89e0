//! Withdrawal/return transaction persistence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use super::{DbPool, Pagination};
use crate::error::AppResult;
use crate::models::{TransactionStatus, TransactionType};

const TRANSACTION_COLUMNS: &str = "id, equipment_id, bag_id, event_id, user_id, transaction_type, \
     status, scheduled_date, actual_date, notes, created_at, updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub equipment_id: Option<Uuid>,
    pub bag_id: Option<Uuid>,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub scheduled_date: DateTime<Utc>,
    pub actual_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewTransaction {
    pub equipment_id: Option<Uuid>,
    pub bag_id: Option<Uuid>,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub scheduled_date: DateTime<Utc>,
    pub actual_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default)]
pub struct TransactionChanges {
    pub status: Option<TransactionStatus>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub actual_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

pub async fn transaction_create<'e, E: SqliteExecutor<'e>>(
    executor: E,
    new: NewTransaction,
) -> AppResult<TransactionRow> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        INSERT INTO transactions (id, equipment_id, bag_id, event_id, user_id, transaction_type,
                                  status, scheduled_date, actual_date, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.equipment_id)
    .bind(new.bag_id)
    .bind(new.event_id)
    .bind(new.user_id)
    .bind(new.transaction_type)
    .bind(new.status)
    .bind(new.scheduled_date)
    .bind(new.actual_date)
    .bind(new.notes)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;
    Ok(row)
}

pub async fn transaction_get_by_id<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> AppResult<Option<TransactionRow>> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

pub async fn transactions_list(
    pool: &DbPool,
    filter: &TransactionFilter,
    page: Pagination,
) -> AppResult<Vec<TransactionRow>> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        SELECT {TRANSACTION_COLUMNS} FROM transactions
        WHERE (? IS NULL OR transaction_type = ?) AND (? IS NULL OR status = ?)
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(filter.transaction_type)
    .bind(filter.transaction_type)
    .bind(filter.status)
    .bind(filter.status)
    .bind(page.limit())
    .bind(page.skip())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn transaction_update<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
    changes: TransactionChanges,
) -> AppResult<Option<TransactionRow>> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        UPDATE transactions SET
            status = COALESCE(?, status),
            scheduled_date = COALESCE(?, scheduled_date),
            actual_date = COALESCE(?, actual_date),
            notes = COALESCE(?, notes),
            updated_at = ?
        WHERE id = ?
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(changes.status)
    .bind(changes.scheduled_date)
    .bind(changes.actual_date)
    .bind(changes.notes)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// What a withdrawal took out: a single item or a whole bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovedTarget {
    Equipment(Uuid),
    Bag(Uuid),
}

impl MovedTarget {
    fn column(&self) -> &'static str {
        match self {
            MovedTarget::Equipment(_) => "equipment_id",
            MovedTarget::Bag(_) => "bag_id",
        }
    }

    fn id(&self) -> Uuid {
        match self {
            MovedTarget::Equipment(id) | MovedTarget::Bag(id) => *id,
        }
    }
}

/// Most recent withdrawal of an item or bag; used to name the event holding it.
pub async fn transaction_latest_withdrawal<'e, E: SqliteExecutor<'e>>(
    executor: E,
    target: MovedTarget,
) -> AppResult<Option<TransactionRow>> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        SELECT {TRANSACTION_COLUMNS} FROM transactions
        WHERE {} = ? AND transaction_type = 'withdrawal'
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        target.column()
    ))
    .bind(target.id())
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// `(withdrawals, returns)` recorded for an event, cancelled ones excluded.
pub async fn transaction_counts_for_event<'e, E: SqliteExecutor<'e>>(
    executor: E,
    event_id: Uuid,
) -> AppResult<(i64, i64)> {
    let row: (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(CASE WHEN transaction_type = 'withdrawal' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN transaction_type = 'return' THEN 1 ELSE 0 END), 0)
        FROM transactions
        WHERE event_id = ? AND status <> 'cancelled'
        "#,
    )
    .bind(event_id)
    .fetch_one(executor)
    .await?;
    Ok(row)
}

/// `(pending, completed)` transaction counts.
pub async fn transaction_status_counts(pool: &DbPool) -> AppResult<(i64, i64)> {
    let row: (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0)
        FROM transactions
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}
