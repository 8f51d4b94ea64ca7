//! Prometheus counters for order and admin activity

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::core::error::{StoreError, StoreResult};
use crate::core::order::OrderStatus;
use crate::core::whatsapp::MessageKind;

pub struct Metrics {
    registry: Registry,
    pub orders_created: IntCounter,
    pub status_changes: IntCounterVec,
    pub whatsapp_links: IntCounterVec,
    pub attachments_stored: IntCounter,
    pub attachments_rejected: IntCounter,
    pub failed_logins: IntCounter,
}

fn metric_error(e: prometheus::Error) -> StoreError {
    StoreError::Internal(format!("Metrics error: {}", e))
}

impl Metrics {
    pub fn new() -> StoreResult<Self> {
        let registry = Registry::new_custom(Some("storefront".to_string()), None).map_err(metric_error)?;

        let orders_created = IntCounter::new("orders_created_total", "Orders received from the intake form")
            .map_err(metric_error)?;
        let status_changes = IntCounterVec::new(
            Opts::new("order_status_changes_total", "Order status changes by new status"),
            &["status"],
        )
        .map_err(metric_error)?;
        let whatsapp_links = IntCounterVec::new(
            Opts::new("whatsapp_links_total", "WhatsApp deep-links generated by kind"),
            &["kind"],
        )
        .map_err(metric_error)?;
        let attachments_stored = IntCounter::new("attachments_stored_total", "Attachment files stored")
            .map_err(metric_error)?;
        let attachments_rejected = IntCounter::new("attachments_rejected_total", "Attachment files rejected")
            .map_err(metric_error)?;
        let failed_logins = IntCounter::new("admin_login_failures_total", "Failed admin logins")
            .map_err(metric_error)?;

        registry.register(Box::new(orders_created.clone())).map_err(metric_error)?;
        registry.register(Box::new(status_changes.clone())).map_err(metric_error)?;
        registry.register(Box::new(whatsapp_links.clone())).map_err(metric_error)?;
        registry.register(Box::new(attachments_stored.clone())).map_err(metric_error)?;
        registry.register(Box::new(attachments_rejected.clone())).map_err(metric_error)?;
        registry.register(Box::new(failed_logins.clone())).map_err(metric_error)?;

        Ok(Self {
            registry,
            orders_created,
            status_changes,
            whatsapp_links,
            attachments_stored,
            attachments_rejected,
            failed_logins,
        })
    }

    pub fn status_changed(&self, status: OrderStatus) {
        self.status_changes.with_label_values(&[status.as_str()]).inc();
    }

    pub fn whatsapp_link(&self, kind: &str) {
        self.whatsapp_links.with_label_values(&[kind]).inc();
    }

    pub fn order_message(&self, kind: MessageKind) {
        self.whatsapp_link(kind.as_str());
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> StoreResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metric_error)?;
        String::from_utf8(buffer).map_err(|e| StoreError::Internal(e.to_string()))
    }
}
