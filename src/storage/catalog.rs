use chrono::{DateTime, Utc};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{conflict_on_constraint, Store};
use crate::core::catalog::{Category, CategoryInput, Service, ServiceInput, ServiceWithCategory};
use crate::core::error::{StoreError, StoreResult};

const CATEGORY_COLUMNS: &str = "id, name_en, name_hi, slug, created_at, updated_at";

const SERVICE_COLUMNS: &str = "s.id, s.name_en, s.name_hi, s.price, s.delivery_time, \
     s.short_desc_en, s.short_desc_hi, s.full_desc_en, s.full_desc_hi, \
     s.features_en, s.features_hi, s.image_url, s.category_id, s.is_active, \
     s.created_at, s.updated_at";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name_en: row.get(1)?,
        name_hi: row.get(2)?,
        slug: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name_en: row.get(1)?,
        name_hi: row.get(2)?,
        price: row.get(3)?,
        delivery_time: row.get(4)?,
        short_desc_en: row.get(5)?,
        short_desc_hi: row.get(6)?,
        full_desc_en: row.get(7)?,
        full_desc_hi: row.get(8)?,
        features_en: row.get(9)?,
        features_hi: row.get(10)?,
        image_url: row.get(11)?,
        category_id: row.get(12)?,
        is_active: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn service_with_category_from_row(row: &Row<'_>) -> rusqlite::Result<ServiceWithCategory> {
    Ok(ServiceWithCategory {
        service: service_from_row(row)?,
        category_name: row.get(16)?,
        category_slug: row.get(17)?,
    })
}

pub(crate) fn get_category(conn: &Connection, id: i64) -> StoreResult<Category> {
    conn.query_row(
        &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS),
        [id],
        category_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("Category"))
}

pub(crate) fn insert_category(
    conn: &Connection,
    input: &CategoryInput,
    now: DateTime<Utc>,
) -> StoreResult<Category> {
    conn.execute(
        "INSERT INTO categories (name_en, name_hi, slug, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![input.name_en, input.name_hi, input.slug, now],
    )
    .map_err(|e| conflict_on_constraint(e, &format!("Slug '{}' already exists", input.slug)))?;

    get_category(conn, conn.last_insert_rowid())
}

fn ensure_category_exists(conn: &Connection, category_id: i64) -> StoreResult<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
        [category_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::validation(format!("Category {} does not exist", category_id)))
    }
}

pub(crate) fn get_service(conn: &Connection, id: i64) -> StoreResult<ServiceWithCategory> {
    conn.query_row(
        &format!(
            "SELECT {}, c.name_en, c.slug FROM services s
             JOIN categories c ON s.category_id = c.id
             WHERE s.id = ?1",
            SERVICE_COLUMNS
        ),
        [id],
        service_with_category_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("Service"))
}

pub(crate) fn insert_service(
    conn: &Connection,
    input: &ServiceInput,
    now: DateTime<Utc>,
) -> StoreResult<Service> {
    ensure_category_exists(conn, input.category_id)?;

    conn.execute(
        "INSERT INTO services (name_en, name_hi, price, delivery_time, short_desc_en, short_desc_hi,
         full_desc_en, full_desc_hi, features_en, features_hi, image_url, category_id, is_active,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
        params![
            input.name_en,
            input.name_hi,
            input.price,
            input.delivery_time,
            input.short_desc_en,
            input.short_desc_hi,
            input.full_desc_en,
            input.full_desc_hi,
            input.features_en,
            input.features_hi,
            input.image_url,
            input.category_id,
            input.is_active,
            now,
        ],
    )?;

    Ok(get_service(conn, conn.last_insert_rowid())?.service)
}

impl Store {
    /// All categories, newest first
    pub async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories ORDER BY created_at DESC, id DESC",
            CATEGORY_COLUMNS
        ))?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub async fn get_category(&self, id: i64) -> StoreResult<Category> {
        let conn = self.conn.lock().await;
        get_category(&conn, id)
    }

    pub async fn create_category(&self, input: CategoryInput) -> StoreResult<Category> {
        let input = input.validate()?;
        let conn = self.conn.lock().await;
        let category = insert_category(&conn, &input, Utc::now())?;
        info!("Created category {} ({})", category.id, category.slug);
        Ok(category)
    }

    pub async fn update_category(&self, id: i64, input: CategoryInput) -> StoreResult<Category> {
        let input = input.validate()?;
        let conn = self.conn.lock().await;

        let changed = conn
            .execute(
                "UPDATE categories SET name_en = ?1, name_hi = ?2, slug = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![input.name_en, input.name_hi, input.slug, Utc::now(), id],
            )
            .map_err(|e| conflict_on_constraint(e, &format!("Slug '{}' already exists", input.slug)))?;
        if changed == 0 {
            return Err(StoreError::not_found("Category"));
        }

        get_category(&conn, id)
    }

    /// Delete a category that no service references
    pub async fn delete_category(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock().await;

        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM services WHERE category_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(StoreError::validation(
                "Cannot delete category with existing services",
            ));
        }

        if conn.execute("DELETE FROM categories WHERE id = ?1", [id])? == 0 {
            return Err(StoreError::not_found("Category"));
        }
        info!("Deleted category {}", id);
        Ok(())
    }

    /// Services joined with their category, newest first.
    ///
    /// `active_only` hides inactive services; `category_slug` narrows to one
    /// category.
    pub async fn list_services(
        &self,
        active_only: bool,
        category_slug: Option<&str>,
    ) -> StoreResult<Vec<ServiceWithCategory>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, c.name_en, c.slug FROM services s
             JOIN categories c ON s.category_id = c.id
             WHERE (?1 = 0 OR s.is_active = 1)
               AND (?2 IS NULL OR c.slug = ?2)
             ORDER BY s.created_at DESC, s.id DESC",
            SERVICE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![active_only, category_slug], service_with_category_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub async fn get_service(&self, id: i64) -> StoreResult<ServiceWithCategory> {
        let conn = self.conn.lock().await;
        get_service(&conn, id)
    }

    pub async fn create_service(&self, input: ServiceInput) -> StoreResult<Service> {
        let input = input.validate()?;
        let conn = self.conn.lock().await;
        let service = insert_service(&conn, &input, Utc::now())?;
        info!("Created service {} ({})", service.id, service.name_en);
        Ok(service)
    }

    pub async fn update_service(&self, id: i64, input: ServiceInput) -> StoreResult<Service> {
        let input = input.validate()?;
        let conn = self.conn.lock().await;
        ensure_category_exists(&conn, input.category_id)?;

        let changed = conn.execute(
            "UPDATE services SET name_en = ?1, name_hi = ?2, price = ?3, delivery_time = ?4,
             short_desc_en = ?5, short_desc_hi = ?6, full_desc_en = ?7, full_desc_hi = ?8,
             features_en = ?9, features_hi = ?10, image_url = ?11, category_id = ?12,
             is_active = ?13, updated_at = ?14
             WHERE id = ?15",
            params![
                input.name_en,
                input.name_hi,
                input.price,
                input.delivery_time,
                input.short_desc_en,
                input.short_desc_hi,
                input.full_desc_en,
                input.full_desc_hi,
                input.features_en,
                input.features_hi,
                input.image_url,
                input.category_id,
                input.is_active,
                Utc::now(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("Service"));
        }

        Ok(get_service(&conn, id)?.service)
    }

    pub async fn delete_service(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        if conn.execute("DELETE FROM services WHERE id = ?1", [id])? == 0 {
            return Err(StoreError::not_found("Service"));
        }
        info!("Deleted service {}", id);
        Ok(())
    }
}
