//! SQLite persistence
//!
//! One connection behind an async mutex. Catalog and order queries are plain
//! functions over `&Connection` (see [`catalog`] and [`orders`]) wrapped by
//! async [`Store`] methods, so the seeding step can reuse them before the
//! connection is shared.

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use log::{debug, info};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::core::catalog::SeedCatalog;
use crate::core::error::{StoreError, StoreResult};
use crate::core::order::{Order, OrderStatus};

pub mod attachments;
pub mod catalog;
pub mod orders;

/// Relational store for categories, services and orders
pub struct Store {
    conn: Mutex<Connection>,
}

/// Admin dashboard counters
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub services: i64,
    pub active_services: i64,
    pub categories: i64,
    pub orders: i64,
    pub orders_by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub label: &'static str,
    pub count: i64,
}

/// Dashboard payload
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
}

const RECENT_ORDER_LIMIT: usize = 5;

impl Store {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name_en TEXT NOT NULL,
            name_hi TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS services (
            id INTEGER PRIMARY KEY,
            name_en TEXT NOT NULL,
            name_hi TEXT NOT NULL,
            price REAL NOT NULL,
            delivery_time INTEGER NOT NULL,
            short_desc_en TEXT,
            short_desc_hi TEXT,
            full_desc_en TEXT,
            full_desc_hi TEXT,
            features_en TEXT,
            features_hi TEXT,
            image_url TEXT,
            category_id INTEGER NOT NULL REFERENCES categories(id),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY,
            order_id TEXT NOT NULL UNIQUE,
            customer_name TEXT NOT NULL,
            customer_phone TEXT NOT NULL,
            customer_email TEXT,
            customer_whatsapp TEXT,
            service_id INTEGER REFERENCES services(id) ON DELETE SET NULL,
            service_name TEXT NOT NULL,
            service_price REAL,
            requirements TEXT NOT NULL,
            budget_range TEXT,
            delivery_preference TEXT,
            additional_notes TEXT,
            status TEXT NOT NULL DEFAULT 'received',
            priority TEXT NOT NULL DEFAULT 'normal',
            whatsapp_sent INTEGER NOT NULL DEFAULT 0,
            admin_notes TEXT,
            attachment_files TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            contacted_at TEXT,
            completed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_services_category
        ON services(category_id);

        CREATE INDEX IF NOT EXISTS idx_orders_created
        ON orders(created_at);

        CREATE INDEX IF NOT EXISTS idx_orders_status
        ON orders(status);
    ";

    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::initialize(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(Self::SCHEMA)?;
        seed_catalog(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Counters and the most recent orders for the admin dashboard
    pub async fn dashboard(&self) -> StoreResult<Dashboard> {
        let conn = self.conn.lock().await;

        let count = |sql: &str| -> StoreResult<i64> { Ok(conn.query_row(sql, [], |row| row.get(0))?) };

        let mut orders_by_status = Vec::with_capacity(OrderStatus::ALL.len());
        for status in OrderStatus::ALL {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM orders WHERE status = ?1",
                [status.as_str()],
                |row| row.get(0),
            )?;
            orders_by_status.push(StatusCount {
                status,
                label: status.label(),
                count: n,
            });
        }

        let stats = DashboardStats {
            services: count("SELECT COUNT(*) FROM services")?,
            active_services: count("SELECT COUNT(*) FROM services WHERE is_active = 1")?,
            categories: count("SELECT COUNT(*) FROM categories")?,
            orders: count("SELECT COUNT(*) FROM orders")?,
            orders_by_status,
        };

        let mut recent_orders = orders::list_orders(&conn)?;
        recent_orders.truncate(RECENT_ORDER_LIMIT);

        Ok(Dashboard {
            stats,
            recent_orders,
        })
    }
}

/// Populate the catalog from the embedded seed when no categories exist
fn seed_catalog(conn: &Connection) -> StoreResult<()> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
    if existing > 0 {
        debug!("Catalog already populated ({} categories)", existing);
        return Ok(());
    }

    let seed = SeedCatalog::load()?;
    let now = Utc::now();

    for seed_category in &seed.categories {
        let category = catalog::insert_category(
            conn,
            &crate::core::catalog::CategoryInput {
                name_en: seed_category.name_en.clone(),
                name_hi: seed_category.name_hi.clone(),
                slug: seed_category.slug.clone(),
            },
            now,
        )?;

        for seed_service in seed.services.iter().filter(|s| s.category == category.slug) {
            catalog::insert_service(conn, &seed_service.to_input(category.id), now)?;
        }
    }

    info!(
        "Seeded catalog with {} categories and {} services",
        seed.categories.len(),
        seed.services.len()
    );
    Ok(())
}

/// Parse a text column into a domain enum
pub(crate) fn parse_column<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = StoreError>,
{
    value
        .parse()
        .map_err(|e: StoreError| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map UNIQUE/FOREIGN KEY failures to a conflict
pub(crate) fn conflict_on_constraint(err: rusqlite::Error, msg: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Conflict(msg.to_string())
        }
        _ => StoreError::Storage(err),
    }
}
