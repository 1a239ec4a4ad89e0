//! Withdrawal and return bookkeeping.
//!
//! Every movement touches the transaction, the equipment status, possibly the
//! event status and the audit trail. All of it commits together or not at all.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{
    bag_get_by_id, bag_set_status, equipment_get_by_id, equipment_in_bag, equipment_set_status,
    event_get_by_id, event_set_status, transaction_counts_for_event, transaction_create,
    transaction_get_by_id, transaction_latest_withdrawal, transaction_update, DbPool, EventRow,
    MovedTarget, NewTransaction, TransactionChanges, TransactionRow,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AuditAction, BagStatus, EquipmentStatus, EventStatus, TransactionStatus, TransactionType,
};
use crate::services::audit::{self, AuditContext};

const TRANSACTIONS_TABLE: &str = "transactions";
pub(crate) const EQUIPMENT_TABLE: &str = "equipment";
pub(crate) const BAGS_TABLE: &str = "bags";

/// Grace period after an event's end before returns may close it.
const COMPLETION_GRACE_HOURS: i64 = 24;

#[derive(Debug)]
pub struct MovementRequest {
    pub equipment_id: Option<Uuid>,
    pub bag_id: Option<Uuid>,
    pub event_id: Uuid,
    pub transaction_type: TransactionType,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl MovementRequest {
    fn target(&self) -> AppResult<MovedTarget> {
        match (self.equipment_id, self.bag_id) {
            (Some(id), None) => Ok(MovedTarget::Equipment(id)),
            (None, Some(id)) => Ok(MovedTarget::Bag(id)),
            _ => Err(AppError::Validation(
                "Exactly one of equipment_id or bag_id must be provided".to_string(),
            )),
        }
    }
}

/// Status an event moves to after a withdrawal, if any.
pub fn event_status_after_withdrawal(current: EventStatus) -> Option<EventStatus> {
    match current {
        EventStatus::Planned | EventStatus::Confirmed => Some(EventStatus::InProgress),
        _ => None,
    }
}

/// Whether a return should close the event: something went out, everything that
/// went out came back, and the grace period after `end_date` is over.
pub fn return_completes_event(
    current: EventStatus,
    withdrawals: i64,
    returns: i64,
    end_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    current == EventStatus::InProgress
        && withdrawals > 0
        && returns >= withdrawals
        && now > end_date + Duration::hours(COMPLETION_GRACE_HOURS)
}

/// Move every item of `bag_id` whose status is in `from` to `to`, with one
/// audit row per changed item. Returns how many items moved.
pub(crate) async fn cascade_to_bag_items(
    conn: &mut SqliteConnection,
    ctx: &AuditContext,
    bag_id: Uuid,
    from: &[EquipmentStatus],
    to: EquipmentStatus,
) -> AppResult<usize> {
    let mut moved = 0;
    for item in equipment_in_bag(&mut *conn, bag_id).await? {
        if !from.contains(&item.status) {
            continue;
        }
        equipment_set_status(&mut *conn, item.id, to).await?;
        audit::record(
            &mut *conn,
            ctx,
            EQUIPMENT_TABLE,
            item.id,
            AuditAction::Update,
            Some(&audit::status_snapshot(item.status)),
            Some(&audit::status_snapshot(to)),
        )
        .await?;
        moved += 1;
    }
    Ok(moved)
}

/// Event named in the latest withdrawal of `target`, if any.
async fn holding_event(
    conn: &mut SqliteConnection,
    target: MovedTarget,
) -> AppResult<Option<EventRow>> {
    match transaction_latest_withdrawal(&mut *conn, target).await? {
        Some(last) => event_get_by_id(&mut *conn, last.event_id).await,
        None => Ok(None),
    }
}

/// Check a single item can make the move and apply it.
async fn move_equipment(
    conn: &mut SqliteConnection,
    ctx: &AuditContext,
    id: Uuid,
    kind: TransactionType,
) -> AppResult<String> {
    let equipment = equipment_get_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))?;

    let next = match kind {
        TransactionType::Withdrawal => {
            if !equipment.status.can_withdraw() {
                let holder = holding_event(conn, MovedTarget::Equipment(id)).await?;
                warn!(code = %equipment.code, status = equipment.status.as_str(), "withdrawal refused");
                return Err(AppError::Validation(match holder {
                    Some(ev) => format!(
                        "Equipment {} is not available (in use by event {})",
                        equipment.code, ev.code
                    ),
                    None => format!(
                        "Equipment {} is not available (status {})",
                        equipment.code,
                        equipment.status.as_str()
                    ),
                }));
            }
            EquipmentStatus::InUse
        }
        TransactionType::Return => {
            if equipment.status != EquipmentStatus::InUse {
                warn!(code = %equipment.code, status = equipment.status.as_str(), "return refused");
                return Err(AppError::Validation(format!(
                    "Equipment {} is not in use",
                    equipment.code
                )));
            }
            EquipmentStatus::Available
        }
    };

    equipment_set_status(&mut *conn, id, next).await?;
    audit::record(
        &mut *conn,
        ctx,
        EQUIPMENT_TABLE,
        id,
        AuditAction::Update,
        Some(&audit::status_snapshot(equipment.status)),
        Some(&audit::status_snapshot(next)),
    )
    .await?;
    Ok(equipment.code)
}

/// Check a bag can make the move, then carry its items along.
async fn move_bag(
    conn: &mut SqliteConnection,
    ctx: &AuditContext,
    id: Uuid,
    kind: TransactionType,
) -> AppResult<String> {
    let bag = bag_get_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Bag not found".to_string()))?;
    if bag.status == BagStatus::Excluded {
        return Err(AppError::Validation(format!("Bag {} is excluded", bag.code)));
    }

    let (next, from, to): (BagStatus, &[EquipmentStatus], EquipmentStatus) = match kind {
        TransactionType::Withdrawal => {
            if !bag.status.can_withdraw() {
                let holder = holding_event(conn, MovedTarget::Bag(id)).await?;
                warn!(code = %bag.code, status = bag.status.as_str(), "bag withdrawal refused");
                return Err(AppError::Validation(match holder {
                    Some(ev) => format!("Bag {} is already in use by event {}", bag.code, ev.code),
                    None => format!("Bag {} is already in use", bag.code),
                }));
            }
            (
                BagStatus::InUse,
                &[EquipmentStatus::Available, EquipmentStatus::Reserved],
                EquipmentStatus::InUse,
            )
        }
        TransactionType::Return => {
            if bag.status != BagStatus::InUse {
                warn!(code = %bag.code, status = bag.status.as_str(), "bag return refused");
                return Err(AppError::Validation(format!("Bag {} is not in use", bag.code)));
            }
            (
                BagStatus::Available,
                &[EquipmentStatus::InUse],
                EquipmentStatus::Available,
            )
        }
    };

    bag_set_status(&mut *conn, id, next).await?;
    audit::record(
        &mut *conn,
        ctx,
        BAGS_TABLE,
        id,
        AuditAction::Update,
        Some(&audit::status_snapshot(bag.status)),
        Some(&audit::status_snapshot(next)),
    )
    .await?;
    let moved = cascade_to_bag_items(conn, ctx, id, from, to).await?;
    info!(bag = %bag.code, items = moved, "bag items moved");
    Ok(bag.code)
}

pub struct TransactionService;

impl TransactionService {
    /// Record a withdrawal or return of one item or a whole bag and apply its effects.
    pub async fn create(
        pool: &DbPool,
        ctx: &AuditContext,
        req: MovementRequest,
    ) -> AppResult<TransactionRow> {
        let target = req.target()?;
        let mut tx = pool.begin().await?;

        let event = event_get_by_id(&mut *tx, req.event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
        if !event.status.accepts_transactions() {
            return Err(AppError::Validation(format!(
                "Event is {} and does not accept transactions",
                event.status.as_str()
            )));
        }

        let moved = match target {
            MovedTarget::Equipment(id) => move_equipment(&mut *tx, ctx, id, req.transaction_type).await?,
            MovedTarget::Bag(id) => move_bag(&mut *tx, ctx, id, req.transaction_type).await?,
        };

        let now = Utc::now();
        let row = transaction_create(
            &mut *tx,
            NewTransaction {
                equipment_id: req.equipment_id,
                bag_id: req.bag_id,
                event_id: event.id,
                user_id: ctx.user_id,
                transaction_type: req.transaction_type,
                status: TransactionStatus::Completed,
                scheduled_date: req.scheduled_date.unwrap_or(now),
                actual_date: Some(now),
                notes: req.notes,
            },
        )
        .await?;

        let next_event_status = match req.transaction_type {
            TransactionType::Withdrawal => event_status_after_withdrawal(event.status),
            TransactionType::Return => {
                let (withdrawals, returns) = transaction_counts_for_event(&mut *tx, event.id).await?;
                return_completes_event(event.status, withdrawals, returns, event.end_date, now)
                    .then_some(EventStatus::Completed)
            }
        };
        if let Some(status) = next_event_status {
            event_set_status(&mut *tx, event.id, status).await?;
            info!(event = %event.code, status = status.as_str(), "event status changed");
        }

        audit::record(
            &mut *tx,
            ctx,
            TRANSACTIONS_TABLE,
            row.id,
            AuditAction::Insert,
            None::<&TransactionRow>,
            Some(&row),
        )
        .await?;

        tx.commit().await?;
        info!(
            kind = req.transaction_type.as_str(),
            target = %moved,
            event = %event.code,
            "transaction recorded"
        );
        Ok(row)
    }

    /// Patch a transaction. Marking it completed stamps now unless a date is
    /// given or already stored.
    pub async fn update(
        pool: &DbPool,
        ctx: &AuditContext,
        id: Uuid,
        mut changes: TransactionChanges,
    ) -> AppResult<TransactionRow> {
        let mut tx = pool.begin().await?;
        let old = transaction_get_by_id(&mut *tx, id)
            .await?
            .ok_or_else(not_found)?;

        if changes.status == Some(TransactionStatus::Completed)
            && changes.actual_date.is_none()
            && old.actual_date.is_none()
        {
            changes.actual_date = Some(Utc::now());
        }

        let new = transaction_update(&mut *tx, id, changes)
            .await?
            .ok_or_else(not_found)?;
        audit::record(
            &mut *tx,
            ctx,
            TRANSACTIONS_TABLE,
            id,
            AuditAction::Update,
            Some(&old),
            Some(&new),
        )
        .await?;
        tx.commit().await?;
        Ok(new)
    }

    /// Cancel a transaction that has not completed yet.
    pub async fn cancel(pool: &DbPool, ctx: &AuditContext, id: Uuid) -> AppResult<TransactionRow> {
        let mut tx = pool.begin().await?;
        let old = transaction_get_by_id(&mut *tx, id)
            .await?
            .ok_or_else(not_found)?;
        if old.status == TransactionStatus::Completed {
            return Err(AppError::Validation(
                "Completed transactions cannot be cancelled".to_string(),
            ));
        }

        let changes = TransactionChanges {
            status: Some(TransactionStatus::Cancelled),
            ..Default::default()
        };
        let new = transaction_update(&mut *tx, id, changes)
            .await?
            .ok_or_else(not_found)?;
        audit::record(
            &mut *tx,
            ctx,
            TRANSACTIONS_TABLE,
            id,
            AuditAction::Update,
            Some(&audit::status_snapshot(old.status)),
            Some(&audit::status_snapshot(new.status)),
        )
        .await?;
        tx.commit().await?;
        info!(transaction_id = %id, "transaction cancelled");
        Ok(new)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Transaction not found".to_string())
}
