//! Equipment asset tracking API.
//!
//! Tracks equipment and the bags grouping it, the events it is reserved for
//! and taken to, and the withdrawals and returns between them. Access is by
//! bearer token with `standard` and `admin` roles.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod reports;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;

use axum::routing::{get, post};
use handlers::{bags, equipment, events, http, reservations, transactions, users};

/// Build the API router. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let auth_routes = axum::Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user_routes = axum::Router::new()
        .route("/", get(users::list_users))
        .route("/me", get(users::get_me).put(users::update_me))
        .route("/public", get(users::list_public))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        );

    let equipment_routes = axum::Router::new()
        .route(
            "/",
            get(equipment::list_equipment).post(equipment::create_equipment),
        )
        .route("/qr/:qr_code", get(equipment::get_equipment_by_qr))
        .route("/code/:code", get(equipment::get_equipment_by_code))
        .route(
            "/:id",
            get(equipment::get_equipment)
                .put(equipment::update_equipment)
                .delete(equipment::delete_equipment),
        );

    let bag_routes = axum::Router::new()
        .route("/", get(bags::list_bags).post(bags::create_bag))
        .route("/code/:code", get(bags::get_bag_by_code))
        .route(
            "/:id",
            get(bags::get_bag)
                .put(bags::update_bag)
                .delete(bags::delete_bag),
        )
        // Items are added by code and removed by id.
        .route(
            "/:id/equipment/:item",
            post(bags::add_equipment_to_bag).delete(bags::remove_equipment_from_bag),
        );

    let event_routes = axum::Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route("/code/:code", get(events::get_event_by_code))
        .route(
            "/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        );

    let transaction_routes = axum::Router::new()
        .route(
            "/",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route(
            "/:id",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::cancel_transaction),
        );

    let reservation_routes = axum::Router::new()
        .route(
            "/",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route(
            "/:id",
            get(reservations::get_reservation)
                .put(reservations::update_reservation)
                .delete(reservations::cancel_reservation),
        );

    let report_routes = axum::Router::new()
        .route("/dashboard", get(reports::dashboard))
        .route("/equipment-usage", get(reports::equipment_usage))
        .route("/audit-log", get(reports::audit_log))
        .route("/audit-log/summary", get(reports::audit_log_summary));

    axum::Router::new()
        .route("/health", get(http::health))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/equipment", equipment_routes)
        .nest("/bags", bag_routes)
        .nest("/events", event_routes)
        .nest("/transactions", transaction_routes)
        .nest("/reservations", reservation_routes)
        .nest("/reports", report_routes)
        .with_state(state)
}
