//! Order lifecycle types
//!
//! An order is created by the public intake form in the `received` state and
//! then moved through `contacted`, `in_progress`, `completed` or `cancelled`
//! by staff. Priority is an independent triage flag.

use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::catalog::{normalize_optional, Language, Service};
use crate::core::error::{StoreError, StoreResult};

/// Prefix of public order references
pub const ORDER_REF_PREFIX: &str = "TAL";

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Received,
    Contacted,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Received,
        OrderStatus::Contacted,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "received",
            OrderStatus::Contacted => "contacted",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Title-case label for the admin console
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Received => "Received",
            OrderStatus::Contacted => "Contacted",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Upper-case label used in customer messages, e.g. `IN PROGRESS`
    pub fn shout(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| StoreError::validation(format!("Unknown order status: {}", s)))
    }
}

/// Order triage priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| StoreError::validation(format!("Unknown priority: {}", s)))
    }
}

/// Selectable option with bilingual labels
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label_en: &'static str,
    pub label_hi: &'static str,
}

impl ChoiceOption {
    pub fn label(&self, lang: Language) -> &'static str {
        lang.pick(self.label_en, self.label_hi)
    }
}

/// Budget ranges offered by the order form
pub const BUDGET_OPTIONS: [ChoiceOption; 6] = [
    ChoiceOption { value: "under-5k", label_en: "Under ₹5,000", label_hi: "₹5,000 से कम" },
    ChoiceOption { value: "5k-10k", label_en: "₹5,000 - ₹10,000", label_hi: "₹5,000 - ₹10,000" },
    ChoiceOption { value: "10k-25k", label_en: "₹10,000 - ₹25,000", label_hi: "₹10,000 - ₹25,000" },
    ChoiceOption { value: "25k-50k", label_en: "₹25,000 - ₹50,000", label_hi: "₹25,000 - ₹50,000" },
    ChoiceOption { value: "above-50k", label_en: "Above ₹50,000", label_hi: "₹50,000 से अधिक" },
    ChoiceOption { value: "flexible", label_en: "Flexible", label_hi: "लचीला बजट" },
];

/// Delivery preferences offered by the order form
pub const DELIVERY_OPTIONS: [ChoiceOption; 5] = [
    ChoiceOption { value: "asap", label_en: "ASAP", label_hi: "जल्दी से जल्दी" },
    ChoiceOption { value: "1-week", label_en: "1 Week", label_hi: "1 सप्ताह" },
    ChoiceOption { value: "2-weeks", label_en: "2 Weeks", label_hi: "2 सप्ताह" },
    ChoiceOption { value: "1-month", label_en: "1 Month", label_hi: "1 महीना" },
    ChoiceOption { value: "flexible", label_en: "Flexible", label_hi: "लचीला समय" },
];

fn check_choice(
    value: Option<String>,
    options: &[ChoiceOption],
    field: &str,
) -> StoreResult<Option<String>> {
    match normalize_optional(value) {
        None => Ok(None),
        Some(v) if options.iter().any(|o| o.value == v) => Ok(Some(v)),
        Some(v) => Err(StoreError::validation(format!("Unknown {}: {}", field, v))),
    }
}

/// File attached to an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentFile {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
}

/// Stored order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    /// Public reference shown to the customer
    pub order_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub customer_whatsapp: Option<String>,
    pub service_id: Option<i64>,
    pub service_name: String,
    pub service_price: Option<f64>,
    pub requirements: String,
    pub budget_range: Option<String>,
    pub delivery_preference: Option<String>,
    pub additional_notes: Option<String>,
    pub status: OrderStatus,
    pub priority: Priority,
    pub whatsapp_sent: bool,
    pub admin_notes: Option<String>,
    pub attachment_files: Vec<AttachmentFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub contacted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Number that WhatsApp messages go to
    pub fn contact_number(&self) -> &str {
        self.customer_whatsapp
            .as_deref()
            .filter(|w| !w.trim().is_empty())
            .unwrap_or(&self.customer_phone)
    }

    /// Move the order to a new status, stamping contact/completion times
    pub fn apply_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
        match status {
            OrderStatus::Contacted => self.contacted_at = Some(now),
            OrderStatus::Completed => self.completed_at = Some(now),
            _ => {}
        }
    }

    pub fn apply_priority(&mut self, priority: Priority, now: DateTime<Utc>) {
        self.priority = priority;
        self.updated_at = now;
    }
}

/// Order intake body as posted by the order form
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OrderRequest {
    #[serde(alias = "customerName")]
    pub customer_name: String,
    #[serde(alias = "customerPhone")]
    pub customer_phone: String,
    #[serde(default, alias = "customerEmail")]
    pub customer_email: Option<String>,
    #[serde(default, alias = "customerWhatsapp")]
    pub customer_whatsapp: Option<String>,
    #[serde(alias = "serviceId")]
    pub service_id: i64,
    pub requirements: String,
    #[serde(default, alias = "budgetRange")]
    pub budget_range: Option<String>,
    #[serde(default, alias = "deliveryPreference")]
    pub delivery_preference: Option<String>,
    #[serde(default, alias = "additionalNotes")]
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Validated order ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub customer_whatsapp: String,
    pub service_id: i64,
    pub service_name: String,
    pub service_price: f64,
    pub requirements: String,
    pub budget_range: Option<String>,
    pub delivery_preference: Option<String>,
    pub additional_notes: Option<String>,
}

fn required(value: &str, field: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    }
}

impl OrderRequest {
    /// Validate the request against the selected catalog service
    pub fn validate(self, service: &Service) -> StoreResult<NewOrder> {
        if !service.is_active {
            return Err(StoreError::validation("Service is not available"));
        }

        let lang = Language::from_code(self.language.as_deref());
        let customer_name = required(&self.customer_name, "Customer name")?;
        let customer_phone = required(&self.customer_phone, "Phone number")?;
        let requirements = required(&self.requirements, "Requirements")?;

        if customer_phone.chars().filter(char::is_ascii_digit).count() < 7 {
            return Err(StoreError::validation("Phone number looks incomplete"));
        }

        let customer_email = normalize_optional(self.customer_email);
        if let Some(email) = &customer_email {
            if !valid_email(email) {
                return Err(StoreError::validation(format!("Invalid email: {}", email)));
            }
        }

        let customer_whatsapp =
            normalize_optional(self.customer_whatsapp).unwrap_or_else(|| customer_phone.clone());

        Ok(NewOrder {
            customer_name,
            customer_phone,
            customer_email,
            customer_whatsapp,
            service_id: service.id,
            service_name: service.name(lang).to_string(),
            service_price: service.price,
            requirements,
            budget_range: check_choice(self.budget_range, &BUDGET_OPTIONS, "budget range")?,
            delivery_preference: check_choice(
                self.delivery_preference,
                &DELIVERY_OPTIONS,
                "delivery preference",
            )?,
            additional_notes: normalize_optional(self.additional_notes),
        })
    }
}

/// Public order reference, e.g. `TAL-20250101-0007`
pub fn order_reference(date: NaiveDate, sequence: u32) -> String {
    format!("{}-{}-{:04}", ORDER_REF_PREFIX, date.format("%Y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> Service {
        let now = Utc::now();
        Service {
            id: 7,
            name_en: "Flutter App".into(),
            name_hi: "फ्लटर ऐप".into(),
            price: 12999.0,
            delivery_time: 12,
            short_desc_en: None,
            short_desc_hi: None,
            full_desc_en: None,
            full_desc_hi: None,
            features_en: None,
            features_hi: None,
            image_url: None,
            category_id: 2,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn request() -> OrderRequest {
        OrderRequest {
            customer_name: " Asha ".into(),
            customer_phone: "+91 98765 43210".into(),
            service_id: 7,
            requirements: "Need a delivery app".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_whatsapp_defaults_to_phone() {
        let order = request().validate(&service()).unwrap();
        assert_eq!(order.customer_name, "Asha");
        assert_eq!(order.customer_whatsapp, "+91 98765 43210");
        assert_eq!(order.service_name, "Flutter App");
        assert_eq!(order.service_price, 12999.0);
    }

    #[test]
    fn test_hindi_service_name_snapshot() {
        let mut req = request();
        req.language = Some("hi".into());
        let order = req.validate(&service()).unwrap();
        assert_eq!(order.service_name, "फ्लटर ऐप");
    }

    #[test]
    fn test_required_fields() {
        let mut req = request();
        req.requirements = "   ".into();
        assert!(req.validate(&service()).is_err());

        let mut req = request();
        req.customer_phone = "12".into();
        assert!(req.validate(&service()).is_err());
    }

    #[test]
    fn test_option_values_checked() {
        let mut req = request();
        req.budget_range = Some("5k-10k".into());
        req.delivery_preference = Some("".into());
        let order = req.validate(&service()).unwrap();
        assert_eq!(order.budget_range.as_deref(), Some("5k-10k"));
        assert_eq!(order.delivery_preference, None);

        let mut req = request();
        req.budget_range = Some("a-million".into());
        assert!(req.validate(&service()).is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(valid_email("a@b.in"));
        assert!(!valid_email("a@@b"));
        assert!(!valid_email("@b.in"));
        assert!(!valid_email("a b@c.in"));
    }

    #[test]
    fn test_inactive_service_rejected() {
        let mut svc = service();
        svc.is_active = false;
        assert!(request().validate(&svc).is_err());
    }

    #[test]
    fn test_status_parsing_and_labels() {
        assert_eq!("in_progress".parse::<OrderStatus>().unwrap(), OrderStatus::InProgress);
        assert!("done".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::InProgress.shout(), "IN PROGRESS");
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
    }

    fn stored_order(created: DateTime<Utc>) -> Order {
        Order {
            id: 1,
            order_id: "TAL-20250101-0001".into(),
            customer_name: "Asha".into(),
            customer_phone: "9876543210".into(),
            customer_email: None,
            customer_whatsapp: None,
            service_id: Some(7),
            service_name: "Flutter App".into(),
            service_price: Some(12999.0),
            requirements: "Need a delivery app".into(),
            budget_range: None,
            delivery_preference: None,
            additional_notes: None,
            status: OrderStatus::Received,
            priority: Priority::Normal,
            whatsapp_sent: false,
            admin_notes: None,
            attachment_files: Vec::new(),
            created_at: created,
            updated_at: created,
            contacted_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_reentering_status_restamps() {
        let start = Utc::now();
        let first = start + chrono::Duration::minutes(5);
        let done = start + chrono::Duration::minutes(10);
        let again = start + chrono::Duration::minutes(15);
        let mut order = stored_order(start);

        order.apply_status(OrderStatus::Contacted, first);
        assert_eq!(order.contacted_at, Some(first));
        assert_eq!(order.completed_at, None);

        order.apply_status(OrderStatus::Completed, done);
        order.apply_status(OrderStatus::Contacted, again);
        assert_eq!(order.status, OrderStatus::Contacted);
        assert_eq!(order.contacted_at, Some(again));
        assert_eq!(order.completed_at, Some(done));
        assert_eq!(order.updated_at, again);

        order.apply_status(OrderStatus::InProgress, again + chrono::Duration::minutes(1));
        assert_eq!(order.contacted_at, Some(again));
        assert_eq!(order.completed_at, Some(done));
    }

    #[test]
    fn test_apply_priority_bumps_updated_at() {
        let start = Utc::now();
        let later = start + chrono::Duration::hours(1);
        let mut order = stored_order(start);

        order.apply_priority(Priority::Urgent, later);
        assert_eq!(order.priority, Priority::Urgent);
        assert_eq!(order.updated_at, later);
        assert_eq!(order.status, OrderStatus::Received);
    }

    #[test]
    fn test_order_reference_format() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        assert_eq!(order_reference(date, 7), "TAL-20250109-0007");
    }
}
