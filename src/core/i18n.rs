//! English/Hindi page strings

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::core::catalog::Language;

lazy_static::lazy_static! {
    static ref EN: HashMap<&'static str, &'static str> = [
        ("header.whatsapp", "WhatsApp"),
        ("header.language", "हिंदी"),
        ("hero.tagline", "Digital Services, Delivered Like Products."),
        ("hero.subtitle", "Get professional websites, mobile apps, digital marketing, and branding services with just a WhatsApp message."),
        ("hero.services", "Services"),
        ("hero.delivery", "Days Delivery"),
        ("hero.startingPrice", "Starting Price"),
        ("hero.ordering", "Easy Ordering"),
        ("categories.all", "All Services"),
        ("service.days", "Days"),
        ("service.order", "Order on WhatsApp"),
        ("service.orderForm", "Place Detailed Order"),
        ("service.features", "Key Features"),
        ("order.title", "Place Your Order"),
        ("order.name", "Full Name"),
        ("order.phone", "Phone Number"),
        ("order.email", "Email"),
        ("order.whatsapp", "WhatsApp Number"),
        ("order.whatsappHint", "If different from phone"),
        ("order.requirements", "Project Requirements"),
        ("order.budget", "Budget Range"),
        ("order.delivery", "Delivery Preference"),
        ("order.notes", "Additional Notes"),
        ("order.attachments", "Attachments"),
        ("order.attachmentsHint", "Up to 5 files, 10MB each (JPG, PNG, SVG, PDF, TXT)"),
        ("order.select", "Select an option"),
        ("order.submit", "Submit Order"),
        ("order.success", "Order submitted successfully! Your order ID is"),
        ("order.error", "Failed to submit order. Please try again."),
        ("notFound.title", "Page not found"),
        ("notFound.back", "Back to services"),
        ("currency", "₹"),
    ]
    .into_iter()
    .collect();

    static ref HI: HashMap<&'static str, &'static str> = [
        ("header.whatsapp", "व्हाट्सऐप"),
        ("header.language", "English"),
        ("hero.tagline", "डिजिटल सेवाएं, प्रोडक्ट्स की तरह डिलीवर।"),
        ("hero.subtitle", "सिर्फ एक व्हाट्सऐप मैसेज के साथ प्रोफेशनल वेबसाइट्स, मोबाइल ऐप्स, डिजिटल मार्केटिंग, और ब्रांडिंग सेवाएं पाएं।"),
        ("hero.services", "सेवाएं"),
        ("hero.delivery", "दिन में डिलीवरी"),
        ("hero.startingPrice", "शुरुआती कीमत"),
        ("hero.ordering", "आसान ऑर्डर"),
        ("categories.all", "सभी सेवाएं"),
        ("service.days", "दिन"),
        ("service.order", "व्हाट्सऐप पर ऑर्डर करें"),
        ("service.orderForm", "विस्तृत ऑर्डर दें"),
        ("service.features", "मुख्य विशेषताएं"),
        ("order.title", "अपना ऑर्डर दें"),
        ("order.name", "पूरा नाम"),
        ("order.phone", "फोन नंबर"),
        ("order.email", "ईमेल"),
        ("order.whatsapp", "व्हाट्सऐप नंबर"),
        ("order.whatsappHint", "फोन नंबर से अलग हो तो"),
        ("order.requirements", "प्रोजेक्ट की आवश्यकताएं"),
        ("order.budget", "बजट रेंज"),
        ("order.delivery", "डिलीवरी प्राथमिकता"),
        ("order.notes", "अतिरिक्त नोट्स"),
        ("order.attachments", "संलग्न फाइलें"),
        ("order.attachmentsHint", "अधिकतम 5 फाइलें, प्रत्येक 10MB तक (JPG, PNG, SVG, PDF, TXT)"),
        ("order.select", "एक विकल्प चुनें"),
        ("order.submit", "ऑर्डर सबमिट करें"),
        ("order.success", "ऑर्डर सफलतापूर्वक सबमिट हुआ! आपका ऑर्डर आईडी है"),
        ("order.error", "ऑर्डर सबमिट नहीं हो सका। कृपया फिर से कोशिश करें।"),
        ("notFound.title", "पेज नहीं मिला"),
        ("notFound.back", "सेवाओं पर वापस जाएं"),
        ("currency", "₹"),
    ]
    .into_iter()
    .collect();
}

fn table(lang: Language) -> &'static HashMap<&'static str, &'static str> {
    match lang {
        Language::En => &*EN,
        Language::Hi => &*HI,
    }
}

/// Look up a string, falling back to the key itself
pub fn translate(lang: Language, key: &str) -> String {
    table(lang)
        .get(key)
        .map(|s| s.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Whole table for one language, nested on `.` so templates can write
/// `{{t.hero.tagline}}`
pub fn page_strings(lang: Language) -> Value {
    let mut root = Map::new();
    for (key, text) in table(lang).iter() {
        match key.split_once('.') {
            Some((group, name)) => {
                let entry = root
                    .entry(group.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(inner) = entry {
                    inner.insert(name.to_string(), Value::String(text.to_string()));
                }
            }
            None => {
                root.insert(key.to_string(), Value::String(text.to_string()));
            }
        }
    }
    Value::Object(root)
}
