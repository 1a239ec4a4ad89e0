//! SQLite connection pool and schema bootstrap.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub type DbPool = sqlx::SqlitePool;

/// Open a pool for `database_url`, creating the database file if needed.
///
/// In-memory databases live only as long as their connection, so those get a
/// single connection that is never recycled.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    if is_memory_url(database_url) {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'standard' CHECK (role IN ('standard', 'admin')),
        is_active BOOLEAN NOT NULL DEFAULT 1,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
    r#"
    CREATE TABLE IF NOT EXISTS bags (
        id BLOB PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL DEFAULT 'available',
        is_active BOOLEAN NOT NULL DEFAULT 1,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_bags_status ON bags(status)",
    r#"
    CREATE TABLE IF NOT EXISTS equipment (
        id BLOB PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        serial TEXT UNIQUE,
        qr_code TEXT UNIQUE,
        status TEXT NOT NULL DEFAULT 'available',
        condition TEXT NOT NULL DEFAULT 'good',
        location TEXT,
        description TEXT,
        image TEXT,
        bag_id BLOB REFERENCES bags(id) ON DELETE SET NULL,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_equipment_category ON equipment(category)",
    "CREATE INDEX IF NOT EXISTS idx_equipment_status ON equipment(status)",
    "CREATE INDEX IF NOT EXISTS idx_equipment_bag ON equipment(bag_id)",
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id BLOB PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        event_type TEXT NOT NULL,
        category TEXT,
        status TEXT NOT NULL DEFAULT 'planned',
        start_date DATETIME NOT NULL,
        end_date DATETIME NOT NULL,
        owner_id BLOB REFERENCES users(id) ON DELETE SET NULL,
        location TEXT,
        description TEXT,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_events_status ON events(status)",
    "CREATE INDEX IF NOT EXISTS idx_events_start_date ON events(start_date)",
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id BLOB PRIMARY KEY,
        equipment_id BLOB REFERENCES equipment(id) ON DELETE RESTRICT,
        bag_id BLOB REFERENCES bags(id) ON DELETE RESTRICT,
        event_id BLOB NOT NULL REFERENCES events(id) ON DELETE RESTRICT,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
        transaction_type TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        scheduled_date DATETIME NOT NULL,
        actual_date DATETIME,
        notes TEXT,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        CHECK ((equipment_id IS NULL) <> (bag_id IS NULL))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_transactions_equipment ON transactions(equipment_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_bag ON transactions(bag_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_event ON transactions(event_id)",
    r#"
    CREATE TABLE IF NOT EXISTS reservations (
        id BLOB PRIMARY KEY,
        equipment_id BLOB REFERENCES equipment(id) ON DELETE CASCADE,
        bag_id BLOB REFERENCES bags(id) ON DELETE CASCADE,
        event_id BLOB NOT NULL REFERENCES events(id) ON DELETE CASCADE,
        reserved_by BLOB NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
        start_date DATETIME NOT NULL,
        end_date DATETIME NOT NULL,
        status TEXT NOT NULL DEFAULT 'active',
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        CHECK (end_date >= start_date),
        CHECK ((equipment_id IS NULL) <> (bag_id IS NULL))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reservations_event ON reservations(event_id)",
    "CREATE INDEX IF NOT EXISTS idx_reservations_status ON reservations(status)",
    r#"
    CREATE TABLE IF NOT EXISTS audit_log (
        id BLOB PRIMARY KEY,
        table_name TEXT NOT NULL,
        record_id TEXT NOT NULL,
        action TEXT NOT NULL,
        old_values TEXT,
        new_values TEXT,
        user_id BLOB REFERENCES users(id) ON DELETE SET NULL,
        ip_address TEXT,
        created_at DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_audit_log_table ON audit_log(table_name)",
    "CREATE INDEX IF NOT EXISTS idx_audit_log_created_at ON audit_log(created_at)",
];

/// Create every table and index that does not exist yet.
pub async fn init_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
