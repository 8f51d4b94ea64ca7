use chrono::{DateTime, NaiveDate, Utc};

use crate::core::error::{StoreError, StoreResult};
use crate::core::order::Order;

/// CSV columns in export order
pub const EXPORT_COLUMNS: [&str; 21] = [
    "Order ID",
    "Customer Name",
    "Phone",
    "Email",
    "WhatsApp",
    "Service",
    "Service Price",
    "Requirements",
    "Budget Range",
    "Delivery Preference",
    "Additional Notes",
    "Status",
    "Priority",
    "WhatsApp Sent",
    "Admin Notes",
    "Attachment Files",
    "Created Date",
    "Created Time",
    "Updated Date",
    "Contacted Date",
    "Completed Date",
];

fn date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

fn opt_date(ts: &Option<DateTime<Utc>>) -> String {
    ts.as_ref().map(date).unwrap_or_default()
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// One order flattened into export columns
pub fn export_row(order: &Order) -> Vec<String> {
    vec![
        order.order_id.clone(),
        order.customer_name.clone(),
        order.customer_phone.clone(),
        opt(&order.customer_email),
        opt(&order.customer_whatsapp),
        order.service_name.clone(),
        order.service_price.map(|p| p.to_string()).unwrap_or_default(),
        order.requirements.clone(),
        opt(&order.budget_range),
        opt(&order.delivery_preference),
        opt(&order.additional_notes),
        order.status.to_string(),
        order.priority.to_string(),
        if order.whatsapp_sent { "Yes" } else { "No" }.to_string(),
        opt(&order.admin_notes),
        order
            .attachment_files
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        date(&order.created_at),
        order.created_at.format("%H:%M:%S").to_string(),
        date(&order.updated_at),
        opt_date(&order.contacted_at),
        opt_date(&order.completed_at),
    ]
}

/// Quote a field when it holds a comma, quote or newline
pub fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render orders as CSV, header first
pub fn orders_to_csv(orders: &[Order]) -> StoreResult<String> {
    if orders.is_empty() {
        return Err(StoreError::validation("No data to export"));
    }

    let mut lines = Vec::with_capacity(orders.len() + 1);
    lines.push(csv_line(&EXPORT_COLUMNS));
    lines.extend(orders.iter().map(|o| csv_line(&export_row(o))));

    Ok(lines.join("\n"))
}

pub fn export_filename(all: bool, date: NaiveDate) -> String {
    let scope = if all { "all-orders" } else { "orders" };
    format!("taliyo-{}-{}.csv", scope, date.format("%Y-%m-%d"))
}
