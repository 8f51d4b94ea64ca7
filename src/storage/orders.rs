use chrono::Utc;
use log::info;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{parse_column, Store};
use crate::core::error::{StoreError, StoreResult};
use crate::core::order::{
    order_reference, AttachmentFile, NewOrder, Order, OrderStatus, Priority, ORDER_REF_PREFIX,
};

const ORDER_COLUMNS: &str = "id, order_id, customer_name, customer_phone, customer_email, \
     customer_whatsapp, service_id, service_name, service_price, requirements, budget_range, \
     delivery_preference, additional_notes, status, priority, whatsapp_sent, admin_notes, \
     attachment_files, created_at, updated_at, contacted_at, completed_at";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let attachments: String = row.get(17)?;
    let attachment_files: Vec<AttachmentFile> = serde_json::from_str(&attachments)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(17, Type::Text, Box::new(e)))?;

    Ok(Order {
        id: row.get(0)?,
        order_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_phone: row.get(3)?,
        customer_email: row.get(4)?,
        customer_whatsapp: row.get(5)?,
        service_id: row.get(6)?,
        service_name: row.get(7)?,
        service_price: row.get(8)?,
        requirements: row.get(9)?,
        budget_range: row.get(10)?,
        delivery_preference: row.get(11)?,
        additional_notes: row.get(12)?,
        status: parse_column::<OrderStatus>(13, row.get(13)?)?,
        priority: parse_column::<Priority>(14, row.get(14)?)?,
        whatsapp_sent: row.get(15)?,
        admin_notes: row.get(16)?,
        attachment_files,
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
        contacted_at: row.get(20)?,
        completed_at: row.get(21)?,
    })
}

/// All orders, newest first
pub(crate) fn list_orders(conn: &Connection) -> StoreResult<Vec<Order>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM orders ORDER BY created_at DESC, id DESC",
        ORDER_COLUMNS
    ))?;
    let rows = stmt.query_map([], order_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn get_order(conn: &Connection, id: i64) -> StoreResult<Order> {
    conn.query_row(
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS),
        [id],
        order_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("Order"))
}

/// Next daily sequence number for an order reference prefix
fn next_sequence(conn: &Connection, day_prefix: &str) -> StoreResult<u32> {
    // Numeric max, so 10000 ranks above 9999
    let last: Option<i64> = conn.query_row(
        "SELECT MAX(CAST(substr(order_id, ?2) AS INTEGER)) FROM orders WHERE order_id LIKE ?1",
        params![format!("{}%", day_prefix), day_prefix.len() as i64 + 1],
        |row| row.get(0),
    )?;

    let last_seq = last.and_then(|seq| u32::try_from(seq).ok()).unwrap_or(0);
    Ok(last_seq + 1)
}

fn touch(conn: &Connection, sql: &str, id: i64, value: &dyn rusqlite::ToSql) -> StoreResult<Order> {
    let changed = conn.execute(sql, params![value, Utc::now(), id])?;
    if changed == 0 {
        return Err(StoreError::not_found("Order"));
    }
    get_order(conn, id)
}

impl Store {
    /// Insert a validated order, assigning its public reference
    pub async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut conn = self.conn.lock().await;
        let now = Utc::now();

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let day_prefix = format!("{}-{}-", ORDER_REF_PREFIX, now.format("%Y%m%d"));
        let reference = order_reference(now.date_naive(), next_sequence(&tx, &day_prefix)?);

        tx.execute(
            "INSERT INTO orders (order_id, customer_name, customer_phone, customer_email,
             customer_whatsapp, service_id, service_name, service_price, requirements,
             budget_range, delivery_preference, additional_notes, status, priority,
             created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
            params![
                reference,
                order.customer_name,
                order.customer_phone,
                order.customer_email,
                order.customer_whatsapp,
                order.service_id,
                order.service_name,
                order.service_price,
                order.requirements,
                order.budget_range,
                order.delivery_preference,
                order.additional_notes,
                OrderStatus::Received.as_str(),
                Priority::default().as_str(),
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let stored = get_order(&tx, id)?;
        tx.commit()?;

        info!("Created order {} for service {}", stored.order_id, stored.service_name);
        Ok(stored)
    }

    pub async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let conn = self.conn.lock().await;
        list_orders(&conn)
    }

    pub async fn get_order(&self, id: i64) -> StoreResult<Order> {
        let conn = self.conn.lock().await;
        get_order(&conn, id)
    }

    /// Look up an order by its public reference
    pub async fn get_order_by_reference(&self, reference: &str) -> StoreResult<Order> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {} FROM orders WHERE order_id = ?1", ORDER_COLUMNS),
            [reference],
            order_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("Order"))
    }

    /// Change status, stamping `contacted_at`/`completed_at` on entry
    pub async fn set_order_status(&self, id: i64, status: OrderStatus) -> StoreResult<Order> {
        let conn = self.conn.lock().await;
        let mut order = get_order(&conn, id)?;
        let previous = order.status;
        order.apply_status(status, Utc::now());

        conn.execute(
            "UPDATE orders SET status = ?1, updated_at = ?2, contacted_at = ?3, completed_at = ?4
             WHERE id = ?5",
            params![
                order.status.as_str(),
                order.updated_at,
                order.contacted_at,
                order.completed_at,
                id,
            ],
        )?;

        info!("Order {} status {} -> {}", order.order_id, previous, status);
        Ok(order)
    }

    pub async fn set_order_priority(&self, id: i64, priority: Priority) -> StoreResult<Order> {
        let conn = self.conn.lock().await;
        let mut order = get_order(&conn, id)?;
        order.apply_priority(priority, Utc::now());

        conn.execute(
            "UPDATE orders SET priority = ?1, updated_at = ?2 WHERE id = ?3",
            params![order.priority.as_str(), order.updated_at, id],
        )?;
        Ok(order)
    }

    pub async fn set_admin_notes(&self, id: i64, notes: Option<String>) -> StoreResult<Order> {
        let conn = self.conn.lock().await;
        touch(
            &conn,
            "UPDATE orders SET admin_notes = ?1, updated_at = ?2 WHERE id = ?3",
            id,
            &notes,
        )
    }

    pub async fn mark_whatsapp_sent(&self, id: i64) -> StoreResult<Order> {
        let conn = self.conn.lock().await;
        touch(
            &conn,
            "UPDATE orders SET whatsapp_sent = ?1, updated_at = ?2 WHERE id = ?3",
            id,
            &true,
        )
    }

    /// Append stored attachments to an order, keeping at most `max_files`.
    ///
    /// The count is checked under the connection lock, so concurrent uploads
    /// cannot push an order past the limit. Files that did not fit are
    /// returned alongside the updated order.
    pub async fn add_attachments(
        &self,
        id: i64,
        files: &[AttachmentFile],
        max_files: usize,
    ) -> StoreResult<(Order, Vec<AttachmentFile>)> {
        let conn = self.conn.lock().await;
        let mut order = get_order(&conn, id)?;

        let room = max_files.saturating_sub(order.attachment_files.len());
        let (kept, overflow) = files.split_at(room.min(files.len()));
        if kept.is_empty() {
            return Ok((order, overflow.to_vec()));
        }
        order.attachment_files.extend_from_slice(kept);

        let encoded = serde_json::to_string(&order.attachment_files)
            .map_err(|e| StoreError::Internal(format!("Failed to encode attachments: {}", e)))?;
        let order = touch(
            &conn,
            "UPDATE orders SET attachment_files = ?1, updated_at = ?2 WHERE id = ?3",
            id,
            &encoded,
        )?;
        Ok((order, overflow.to_vec()))
    }

    pub async fn delete_order(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        if conn.execute("DELETE FROM orders WHERE id = ?1", [id])? == 0 {
            return Err(StoreError::not_found("Order"));
        }
        info!("Deleted order {}", id);
        Ok(())
    }
}
