//! WhatsApp deep-links
//!
//! Notifications are not sent by the server. It builds `wa.me` links with a
//! prefilled message and the operator (or customer) opens them.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::core::catalog::Language;
use crate::core::error::{StoreError, StoreResult};
use crate::core::order::Order;

const WA_BASE: &str = "https://wa.me";
const AS_DISCUSSED: &str = "As discussed";

/// Customer message template
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Confirmation,
    Update,
    Completion,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Confirmation => "confirmation",
            MessageKind::Update => "update",
            MessageKind::Completion => "completion",
        }
    }
}

/// Message from staff to the customer about an order
pub fn order_message(order: &Order, kind: MessageKind) -> String {
    let greeting = format!("Hi {}! 👋\n\n", order.customer_name);

    match kind {
        MessageKind::Confirmation => {
            let requirements = if order.requirements.trim().is_empty() {
                String::new()
            } else {
                format!("📝 Requirements noted:\n{}\n\n", order.requirements)
            };
            format!(
                "{greeting}✅ Your order has been received!\n\n\
                 📋 Order ID: {id}\n\
                 🛍️ Service: {service}\n\
                 💰 Budget: {budget}\n\
                 ⏰ Delivery: {delivery}\n\n\
                 {requirements}\
                 We'll contact you within 24 hours to discuss details.\n\n\
                 - Taliyo Technologies Team",
                id = order.order_id,
                service = order.service_name,
                budget = order.budget_range.as_deref().unwrap_or(AS_DISCUSSED),
                delivery = order.delivery_preference.as_deref().unwrap_or(AS_DISCUSSED),
            )
        }
        MessageKind::Update => format!(
            "{greeting}📋 Order Update - {id}\n\n\
             ✅ Status: {status}\n\
             🛍️ Service: {service}\n\n\
             Your project is progressing well! We'll keep you updated.\n\n\
             - Taliyo Team",
            id = order.order_id,
            status = order.status.shout(),
            service = order.service_name,
        ),
        MessageKind::Completion => format!(
            "{greeting}🎉 Great news! Your order is complete!\n\n\
             📋 Order ID: {id}\n\
             🛍️ Service: {service}\n\
             ✅ Status: COMPLETED\n\n\
             Thank you for choosing Taliyo Technologies! We hope you're satisfied with our work.\n\n\
             - Taliyo Team",
            id = order.order_id,
            service = order.service_name,
        ),
    }
}

/// General inquiry sent from the site header
pub fn inquiry_message(lang: Language) -> String {
    match lang {
        Language::En => "Hi Taliyo, I want to know more about your digital services.".to_string(),
        Language::Hi => "हाय तलियो, मैं आपकी डिजिटल सेवाओं के बारे में और जानना चाहता हूं।".to_string(),
    }
}

/// Order request for one service, sent from the service card
pub fn service_order_message(lang: Language, service_name: &str, price: f64) -> String {
    match lang {
        Language::En => format!(
            "Hi Taliyo, I want to order \"{}\" (₹{}). Please confirm.",
            service_name, price
        ),
        Language::Hi => format!(
            "हाय तलियो, मैं \"{}\" (₹{}) ऑर्डर करना चाहता हूं। कृपया कन्फर्म करें।",
            service_name, price
        ),
    }
}

/// Build a `wa.me` link for the given phone number and message
pub fn deep_link(phone: &str, text: &str) -> StoreResult<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(StoreError::validation(format!(
            "Phone number has no digits: {}",
            phone
        )));
    }

    // form encoding writes spaces as '+' and literal '+' as %2B
    let encoded = form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20");

    Ok(format!("{}/{}?text={}", WA_BASE, digits, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::order::{OrderStatus, Priority};
    use chrono::Utc;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: 3,
            order_id: "TAL-20250101-0003".into(),
            customer_name: "Asha".into(),
            customer_phone: "+91 98765-43210".into(),
            customer_email: None,
            customer_whatsapp: None,
            service_id: Some(1),
            service_name: "Logo Design".into(),
            service_price: Some(1999.0),
            requirements: "Minimal mark".into(),
            budget_range: Some("under-5k".into()),
            delivery_preference: None,
            additional_notes: None,
            status: OrderStatus::InProgress,
            priority: Priority::Normal,
            whatsapp_sent: false,
            admin_notes: None,
            attachment_files: Vec::new(),
            created_at: now,
            updated_at: now,
            contacted_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_confirmation_message() {
        let msg = order_message(&order(), MessageKind::Confirmation);
        assert!(msg.starts_with("Hi Asha! 👋"));
        assert!(msg.contains("📋 Order ID: TAL-20250101-0003"));
        assert!(msg.contains("💰 Budget: under-5k"));
        assert!(msg.contains("⏰ Delivery: As discussed"));
        assert!(msg.contains("📝 Requirements noted:\nMinimal mark"));
    }

    #[test]
    fn test_update_message_uses_status_label() {
        let msg = order_message(&order(), MessageKind::Update);
        assert!(msg.contains("✅ Status: IN PROGRESS"));
    }

    #[test]
    fn test_deep_link_strips_phone_and_encodes_text() {
        let link = deep_link("+91 98765-43210", "Hi there + you").unwrap();
        assert_eq!(link, "https://wa.me/919876543210?text=Hi%20there%20%2B%20you");
    }

    #[test]
    fn test_deep_link_requires_digits() {
        assert!(deep_link("n/a", "hello").is_err());
    }

    #[test]
    fn test_service_order_message() {
        let msg = service_order_message(Language::En, "Logo Design", 1999.0);
        assert_eq!(msg, "Hi Taliyo, I want to order \"Logo Design\" (₹1999). Please confirm.");
    }
}
