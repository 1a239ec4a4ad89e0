//! Reservations hold an item or a bag for an event over a date range.
//!
//! Reserving flips the target (and every item in a bag) to `reserved`; ending
//! the reservation hands back whatever is still reserved.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{
    bag_get_by_id, bag_set_status, equipment_get_by_id, equipment_set_status, event_get_by_id,
    reservation_create, reservation_get_by_id, reservation_overlaps, reservation_update, DbPool,
    NewReservation, ReservationChanges, ReservationRow,
};
use crate::error::{AppError, AppResult};
use crate::models::{AuditAction, BagStatus, EquipmentStatus, ReservationStatus};
use crate::services::audit::{self, AuditContext};
use crate::services::transaction::{cascade_to_bag_items, BAGS_TABLE, EQUIPMENT_TABLE};

const RESERVATIONS_TABLE: &str = "reservations";
const CONFLICT_MESSAGE: &str = "Conflicting reservation exists for the specified dates";

#[derive(Debug)]
pub struct ReservationRequest {
    pub equipment_id: Option<Uuid>,
    pub bag_id: Option<Uuid>,
    pub event_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

fn check_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end < start {
        return Err(AppError::Validation(
            "end_date must be greater than or equal to start_date".to_string(),
        ));
    }
    Ok(())
}

async fn set_equipment_status(
    conn: &mut SqliteConnection,
    ctx: &AuditContext,
    id: Uuid,
    from: EquipmentStatus,
    to: EquipmentStatus,
) -> AppResult<()> {
    equipment_set_status(&mut *conn, id, to).await?;
    audit::record(
        &mut *conn,
        ctx,
        EQUIPMENT_TABLE,
        id,
        AuditAction::Update,
        Some(&audit::status_snapshot(from)),
        Some(&audit::status_snapshot(to)),
    )
    .await?;
    Ok(())
}

async fn set_bag_status(
    conn: &mut SqliteConnection,
    ctx: &AuditContext,
    id: Uuid,
    from: BagStatus,
    to: BagStatus,
) -> AppResult<()> {
    bag_set_status(&mut *conn, id, to).await?;
    audit::record(
        &mut *conn,
        ctx,
        BAGS_TABLE,
        id,
        AuditAction::Update,
        Some(&audit::status_snapshot(from)),
        Some(&audit::status_snapshot(to)),
    )
    .await?;
    Ok(())
}

/// Put a reservation's target back in stock if it is still held by it.
async fn release(
    conn: &mut SqliteConnection,
    ctx: &AuditContext,
    reservation: &ReservationRow,
) -> AppResult<()> {
    if let Some(id) = reservation.equipment_id {
        if let Some(item) = equipment_get_by_id(&mut *conn, id).await? {
            if item.status == EquipmentStatus::Reserved {
                set_equipment_status(conn, ctx, id, item.status, EquipmentStatus::Available)
                    .await?;
            }
        }
    }
    if let Some(id) = reservation.bag_id {
        if let Some(bag) = bag_get_by_id(&mut *conn, id).await? {
            if bag.status == BagStatus::Reserved {
                set_bag_status(&mut *conn, ctx, id, bag.status, BagStatus::Available).await?;
            }
            cascade_to_bag_items(
                conn,
                ctx,
                id,
                &[EquipmentStatus::Reserved],
                EquipmentStatus::Available,
            )
            .await?;
        }
    }
    Ok(())
}

fn not_found() -> AppError {
    AppError::NotFound("Reservation not found".to_string())
}

pub struct ReservationService;

impl ReservationService {
    /// Reserve an item or a bag for a confirmed or running event.
    pub async fn create(
        pool: &DbPool,
        ctx: &AuditContext,
        req: ReservationRequest,
    ) -> AppResult<ReservationRow> {
        if req.equipment_id.is_some() == req.bag_id.is_some() {
            return Err(AppError::Validation(
                "Exactly one of equipment_id or bag_id must be provided".to_string(),
            ));
        }
        check_dates(req.start_date, req.end_date)?;

        let mut tx = pool.begin().await?;

        let event = event_get_by_id(&mut *tx, req.event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
        if !event.status.accepts_reservations() {
            return Err(AppError::Validation(format!(
                "Reservations are only accepted for confirmed or running events (status {})",
                event.status.as_str()
            )));
        }

        let equipment = match req.equipment_id {
            Some(id) => {
                let item = equipment_get_by_id(&mut *tx, id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))?;
                if item.bag_id.is_some() {
                    return Err(AppError::Validation(format!(
                        "Equipment {} belongs to a bag; reserve the whole bag instead",
                        item.code
                    )));
                }
                if item.status != EquipmentStatus::Available {
                    return Err(AppError::Validation(format!(
                        "Equipment is not available for reservation (status {})",
                        item.status.as_str()
                    )));
                }
                Some(item)
            }
            None => None,
        };

        let bag = match req.bag_id {
            Some(id) => {
                let bag = bag_get_by_id(&mut *tx, id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Bag not found".to_string()))?;
                if !bag.is_active {
                    return Err(AppError::Validation("Bag is not active".to_string()));
                }
                if bag.status != BagStatus::Available {
                    return Err(AppError::Validation(format!(
                        "Bag is not available for reservation (status {})",
                        bag.status.as_str()
                    )));
                }
                Some(bag)
            }
            None => None,
        };

        if reservation_overlaps(
            &mut *tx,
            req.equipment_id,
            req.bag_id,
            req.start_date,
            req.end_date,
            None,
        )
        .await?
        {
            warn!(event = %event.code, "overlapping reservation refused");
            return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
        }

        let row = reservation_create(
            &mut *tx,
            NewReservation {
                equipment_id: req.equipment_id,
                bag_id: req.bag_id,
                event_id: event.id,
                reserved_by: ctx.user_id,
                start_date: req.start_date,
                end_date: req.end_date,
            },
        )
        .await?;

        if let Some(item) = &equipment {
            set_equipment_status(&mut *tx, ctx, item.id, item.status, EquipmentStatus::Reserved)
                .await?;
        }
        if let Some(bag) = &bag {
            set_bag_status(&mut *tx, ctx, bag.id, bag.status, BagStatus::Reserved).await?;
            cascade_to_bag_items(
                &mut *tx,
                ctx,
                bag.id,
                &[EquipmentStatus::Available],
                EquipmentStatus::Reserved,
            )
            .await?;
        }

        audit::record(
            &mut *tx,
            ctx,
            RESERVATIONS_TABLE,
            row.id,
            AuditAction::Insert,
            None::<&ReservationRow>,
            Some(&row),
        )
        .await?;
        tx.commit().await?;
        info!(reservation_id = %row.id, event = %event.code, "reservation created");
        Ok(row)
    }

    /// Move dates or close a reservation. Date moves re-check overlaps; closing
    /// an active reservation releases its target.
    pub async fn update(
        pool: &DbPool,
        ctx: &AuditContext,
        id: Uuid,
        changes: ReservationChanges,
    ) -> AppResult<ReservationRow> {
        let mut tx = pool.begin().await?;
        let old = reservation_get_by_id(&mut *tx, id)
            .await?
            .ok_or_else(not_found)?;

        if changes.start_date.is_some() || changes.end_date.is_some() {
            let start = changes.start_date.unwrap_or(old.start_date);
            let end = changes.end_date.unwrap_or(old.end_date);
            check_dates(start, end)?;
            if reservation_overlaps(&mut *tx, old.equipment_id, old.bag_id, start, end, Some(id))
                .await?
            {
                return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
            }
        }

        let new = reservation_update(&mut *tx, id, changes)
            .await?
            .ok_or_else(not_found)?;
        if old.status == ReservationStatus::Active && new.status.releases_target() {
            release(&mut *tx, ctx, &new).await?;
        }

        audit::record(
            &mut *tx,
            ctx,
            RESERVATIONS_TABLE,
            id,
            AuditAction::Update,
            Some(&old),
            Some(&new),
        )
        .await?;
        tx.commit().await?;
        Ok(new)
    }

    /// Cancel an active reservation and release its target.
    pub async fn cancel(pool: &DbPool, ctx: &AuditContext, id: Uuid) -> AppResult<ReservationRow> {
        let mut tx = pool.begin().await?;
        let old = reservation_get_by_id(&mut *tx, id)
            .await?
            .ok_or_else(not_found)?;
        if old.status != ReservationStatus::Active {
            return Err(AppError::Validation(
                "Only active reservations can be cancelled".to_string(),
            ));
        }

        let changes = ReservationChanges {
            status: Some(ReservationStatus::Cancelled),
            ..Default::default()
        };
        let new = reservation_update(&mut *tx, id, changes)
            .await?
            .ok_or_else(not_found)?;
        release(&mut *tx, ctx, &new).await?;
        audit::record(
            &mut *tx,
            ctx,
            RESERVATIONS_TABLE,
            id,
            AuditAction::Update,
            Some(&audit::status_snapshot(old.status)),
            Some(&audit::status_snapshot(new.status)),
        )
        .await?;
        tx.commit().await?;
        info!(reservation_id = %id, "reservation cancelled");
        Ok(new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::db::{
        bag_create, create_pool, equipment_create, equipment_set_bag, event_create, init_schema,
        user_create, EquipmentRow, EventRow, NewBag, NewEquipment, NewEvent,
    };
    use crate::models::{EquipmentCondition, EventStatus, Role};

    struct Fixture {
        pool: DbPool,
        ctx: AuditContext,
        equipment: EquipmentRow,
        event: EventRow,
    }

    fn new_equipment(code: &str) -> NewEquipment {
        NewEquipment {
            code: code.to_string(),
            name: "Microphone".to_string(),
            category: "audio".to_string(),
            serial: None,
            qr_code: None,
            status: EquipmentStatus::Available,
            condition: EquipmentCondition::Good,
            location: None,
            description: None,
            image: None,
        }
    }

    async fn fixture(status: EventStatus) -> Fixture {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        let user = user_create(&pool, "ops", "ops@example.com", "x", Role::Admin)
            .await
            .unwrap();
        let equipment = equipment_create(&pool, new_equipment("MIC-001")).await.unwrap();
        let start = Utc::now() + Duration::days(1);
        let event = event_create(
            &pool,
            NewEvent {
                code: "EV-100".to_string(),
                name: "Festival".to_string(),
                event_type: "music".to_string(),
                category: None,
                status,
                start_date: start,
                end_date: start + Duration::days(2),
                owner_id: user.id,
                location: None,
                description: None,
            },
        )
        .await
        .unwrap();
        Fixture {
            pool,
            ctx: AuditContext {
                user_id: user.id,
                ip_address: None,
            },
            equipment,
            event,
        }
    }

    fn request(f: &Fixture) -> ReservationRequest {
        ReservationRequest {
            equipment_id: Some(f.equipment.id),
            bag_id: None,
            event_id: f.event.id,
            start_date: f.event.start_date,
            end_date: f.event.end_date,
        }
    }

    #[tokio::test]
    async fn reserving_holds_the_item_and_cancelling_frees_it() {
        let f = fixture(EventStatus::Confirmed).await;
        let row = ReservationService::create(&f.pool, &f.ctx, request(&f))
            .await
            .unwrap();
        assert_eq!(row.status, ReservationStatus::Active);
        assert_eq!(row.reserved_by, f.ctx.user_id);
        let item = equipment_get_by_id(&f.pool, f.equipment.id).await.unwrap().unwrap();
        assert_eq!(item.status, EquipmentStatus::Reserved);

        let cancelled = ReservationService::cancel(&f.pool, &f.ctx, row.id).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        let item = equipment_get_by_id(&f.pool, f.equipment.id).await.unwrap().unwrap();
        assert_eq!(item.status, EquipmentStatus::Available);

        assert!(matches!(
            ReservationService::cancel(&f.pool, &f.ctx, row.id).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn planned_event_does_not_take_reservations() {
        let f = fixture(EventStatus::Planned).await;
        assert!(matches!(
            ReservationService::create(&f.pool, &f.ctx, request(&f)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn overlapping_dates_conflict() {
        let f = fixture(EventStatus::Confirmed).await;
        let first = ReservationService::create(&f.pool, &f.ctx, request(&f))
            .await
            .unwrap();
        // Hand the item back without closing the reservation, so only the date check can refuse.
        equipment_set_status(&f.pool, f.equipment.id, EquipmentStatus::Available)
            .await
            .unwrap();

        let mut req = request(&f);
        req.start_date = first.start_date + Duration::hours(6);
        req.end_date = first.end_date + Duration::days(1);
        assert!(matches!(
            ReservationService::create(&f.pool, &f.ctx, req).await,
            Err(AppError::Conflict(_))
        ));

        let mut req = request(&f);
        req.start_date = first.end_date;
        req.end_date = first.end_date + Duration::days(1);
        tokio_test::assert_ok!(ReservationService::create(&f.pool, &f.ctx, req).await);
    }

    #[tokio::test]
    async fn bagged_item_must_be_reserved_through_its_bag() {
        let f = fixture(EventStatus::InProgress).await;
        let bag = bag_create(
            &f.pool,
            NewBag {
                code: "BAG-07".to_string(),
                name: "Stage kit".to_string(),
                description: None,
                status: BagStatus::Available,
            },
        )
        .await
        .unwrap();
        let cable = equipment_create(&f.pool, new_equipment("CAB-001")).await.unwrap();
        equipment_set_bag(&f.pool, f.equipment.id, Some(bag.id)).await.unwrap();
        equipment_set_bag(&f.pool, cable.id, Some(bag.id)).await.unwrap();

        assert!(matches!(
            ReservationService::create(&f.pool, &f.ctx, request(&f)).await,
            Err(AppError::Validation(_))
        ));

        let mut req = request(&f);
        req.equipment_id = None;
        req.bag_id = Some(bag.id);
        let row = ReservationService::create(&f.pool, &f.ctx, req).await.unwrap();
        let held = bag_get_by_id(&f.pool, bag.id).await.unwrap().unwrap();
        assert_eq!(held.status, BagStatus::Reserved);
        for id in [f.equipment.id, cable.id] {
            let item = equipment_get_by_id(&f.pool, id).await.unwrap().unwrap();
            assert_eq!(item.status, EquipmentStatus::Reserved);
        }

        ReservationService::update(
            &f.pool,
            &f.ctx,
            row.id,
            ReservationChanges {
                status: Some(ReservationStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let freed = bag_get_by_id(&f.pool, bag.id).await.unwrap().unwrap();
        assert_eq!(freed.status, BagStatus::Available);
        for id in [f.equipment.id, cable.id] {
            let item = equipment_get_by_id(&f.pool, id).await.unwrap().unwrap();
            assert_eq!(item.status, EquipmentStatus::Available);
        }
    }

    #[tokio::test]
    async fn reversed_dates_are_refused() {
        let f = fixture(EventStatus::Confirmed).await;
        let mut req = request(&f);
        req.end_date = req.start_date - Duration::hours(1);
        assert!(matches!(
            ReservationService::create(&f.pool, &f.ctx, req).await,
            Err(AppError::Validation(_))
        ));
    }
}
