//! Service catalog types
//!
//! Categories and services carry English and Hindi text side by side. The
//! public site only ever sees a [`LocalizedService`] projected into one
//! language; the admin console works on the raw bilingual rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::error::{StoreError, StoreResult};

/// Seed catalog used to populate an empty database
const SEED_CATALOG: &str = include_str!("../../seed/catalog.json");

/// Display language of the public site
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    /// Parse a language code, falling back to English
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_ascii_lowercase()) {
            Some(c) if c == "hi" => Language::Hi,
            _ => Language::En,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }

    /// The other language, used by the language toggle
    pub fn toggled(&self) -> Self {
        match self {
            Language::En => Language::Hi,
            Language::Hi => Language::En,
        }
    }

    /// Pick the text for this language, falling back to English when the
    /// Hindi text is missing
    pub fn pick<'a>(&self, en: &'a str, hi: &'a str) -> &'a str {
        match self {
            Language::Hi if !hi.trim().is_empty() => hi,
            _ => en,
        }
    }
}

/// Service category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name_en: String,
    pub name_hi: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn name(&self, lang: Language) -> &str {
        lang.pick(&self.name_en, &self.name_hi)
    }
}

/// Purchasable service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: i64,
    pub name_en: String,
    pub name_hi: String,
    pub price: f64,
    /// Delivery estimate in days
    pub delivery_time: i64,
    pub short_desc_en: Option<String>,
    pub short_desc_hi: Option<String>,
    pub full_desc_en: Option<String>,
    pub full_desc_hi: Option<String>,
    /// Newline separated feature list
    pub features_en: Option<String>,
    pub features_hi: Option<String>,
    pub image_url: Option<String>,
    pub category_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Service row joined with its category, used by admin listings
#[derive(Debug, Clone, Serialize)]
pub struct ServiceWithCategory {
    #[serde(flatten)]
    pub service: Service,
    pub category_name: String,
    pub category_slug: String,
}

/// Service projected into one language for the public site
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocalizedService {
    pub id: i64,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub features: Vec<String>,
    pub price: f64,
    pub delivery_days: i64,
    pub image_url: Option<String>,
    pub category_slug: String,
}

fn opt_str(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn split_features(features: &str) -> Vec<String> {
    features
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl Service {
    pub fn name(&self, lang: Language) -> &str {
        lang.pick(&self.name_en, &self.name_hi)
    }

    /// Project the service into a single language
    pub fn localize(&self, lang: Language, category_slug: &str) -> LocalizedService {
        let short = lang.pick(opt_str(&self.short_desc_en), opt_str(&self.short_desc_hi));
        let full = lang.pick(opt_str(&self.full_desc_en), opt_str(&self.full_desc_hi));
        let features = lang.pick(opt_str(&self.features_en), opt_str(&self.features_hi));

        LocalizedService {
            id: self.id,
            name: self.name(lang).to_string(),
            short_description: short.to_string(),
            // The full description falls back to the short one
            description: if full.is_empty() { short } else { full }.to_string(),
            features: split_features(features),
            price: self.price,
            delivery_days: self.delivery_time,
            image_url: self.image_url.clone(),
            category_slug: category_slug.to_string(),
        }
    }
}

/// Category create/update body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryInput {
    pub name_en: String,
    pub name_hi: String,
    pub slug: String,
}

impl CategoryInput {
    /// Trim and check the category fields
    pub fn validate(self) -> StoreResult<Self> {
        let input = Self {
            name_en: self.name_en.trim().to_string(),
            name_hi: self.name_hi.trim().to_string(),
            slug: self.slug.trim().to_string(),
        };

        if input.name_en.is_empty() || input.name_hi.is_empty() {
            return Err(StoreError::validation("Category names are required"));
        }
        if input.slug.is_empty() {
            return Err(StoreError::validation("Category slug is required"));
        }
        if !input
            .slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(StoreError::validation(
                "Slug may only contain lowercase letters, digits and '-'",
            ));
        }

        Ok(input)
    }
}

fn default_active() -> bool {
    true
}

/// Service create/update body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceInput {
    pub name_en: String,
    pub name_hi: String,
    pub price: f64,
    pub delivery_time: i64,
    #[serde(default)]
    pub short_desc_en: Option<String>,
    #[serde(default)]
    pub short_desc_hi: Option<String>,
    #[serde(default)]
    pub full_desc_en: Option<String>,
    #[serde(default)]
    pub full_desc_hi: Option<String>,
    #[serde(default)]
    pub features_en: Option<String>,
    #[serde(default)]
    pub features_hi: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category_id: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Blank optional text becomes `None`
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServiceInput {
    /// Trim and check the service fields
    pub fn validate(self) -> StoreResult<Self> {
        let name_en = self.name_en.trim().to_string();
        let name_hi = self.name_hi.trim().to_string();

        if name_en.is_empty() || name_hi.is_empty() {
            return Err(StoreError::validation("Service names are required"));
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(StoreError::validation("Price must be positive"));
        }
        if self.delivery_time <= 0 {
            return Err(StoreError::validation("Delivery time must be positive"));
        }
        if self.category_id <= 0 {
            return Err(StoreError::validation("Category is required"));
        }

        let image_url = normalize_optional(self.image_url);
        if let Some(raw) = &image_url {
            match Url::parse(raw) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                _ => return Err(StoreError::validation(format!("Invalid image URL: {}", raw))),
            }
        }

        Ok(Self {
            name_en,
            name_hi,
            price: self.price,
            delivery_time: self.delivery_time,
            short_desc_en: normalize_optional(self.short_desc_en),
            short_desc_hi: normalize_optional(self.short_desc_hi),
            full_desc_en: normalize_optional(self.full_desc_en),
            full_desc_hi: normalize_optional(self.full_desc_hi),
            features_en: normalize_optional(self.features_en),
            features_hi: normalize_optional(self.features_hi),
            image_url,
            category_id: self.category_id,
            is_active: self.is_active,
        })
    }
}

/// Seed category entry
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCategory {
    pub slug: String,
    pub name_en: String,
    pub name_hi: String,
}

/// Seed service entry
#[derive(Debug, Clone, Deserialize)]
pub struct SeedService {
    pub category: String,
    pub name_en: String,
    pub name_hi: String,
    pub price: f64,
    pub delivery_days: i64,
    pub description_en: String,
    pub description_hi: String,
    pub features_en: Vec<String>,
    pub features_hi: Vec<String>,
    pub image_url: String,
}

/// Static bilingual catalog shipped with the binary
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCatalog {
    pub categories: Vec<SeedCategory>,
    pub services: Vec<SeedService>,
}

impl SeedCatalog {
    pub fn load() -> StoreResult<Self> {
        serde_json::from_str(SEED_CATALOG)
            .map_err(|e| StoreError::Internal(format!("Invalid seed catalog: {}", e)))
    }
}

impl SeedService {
    /// Convert into a service body for the given category id
    pub fn to_input(&self, category_id: i64) -> ServiceInput {
        ServiceInput {
            name_en: self.name_en.clone(),
            name_hi: self.name_hi.clone(),
            price: self.price,
            delivery_time: self.delivery_days,
            short_desc_en: Some(self.description_en.clone()),
            short_desc_hi: Some(self.description_hi.clone()),
            full_desc_en: None,
            full_desc_hi: None,
            features_en: Some(self.features_en.join("\n")),
            features_hi: Some(self.features_hi.join("\n")),
            image_url: Some(self.image_url.clone()),
            category_id,
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> ServiceInput {
        ServiceInput {
            name_en: " Logo Design ".to_string(),
            name_hi: "लोगो डिज़ाइन".to_string(),
            price: 1999.0,
            delivery_time: 3,
            short_desc_en: Some("  ".to_string()),
            short_desc_hi: None,
            full_desc_en: None,
            full_desc_hi: None,
            features_en: Some("3 Concepts\nVector Files".to_string()),
            features_hi: None,
            image_url: Some("https://example.com/logo.png".to_string()),
            category_id: 4,
            is_active: true,
        }
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!(Language::from_code(Some("HI")), Language::Hi);
        assert_eq!(Language::from_code(Some("fr")), Language::En);
        assert_eq!(Language::from_code(None), Language::En);
        assert_eq!(Language::Hi.toggled(), Language::En);
    }

    #[test]
    fn test_service_input_normalizes() {
        let input = sample_input().validate().unwrap();
        assert_eq!(input.name_en, "Logo Design");
        assert_eq!(input.short_desc_en, None);
    }

    #[test]
    fn test_service_input_rejects_bad_values() {
        let mut input = sample_input();
        input.price = 0.0;
        assert!(input.validate().is_err());

        let mut input = sample_input();
        input.delivery_time = 0;
        assert!(input.validate().is_err());

        let mut input = sample_input();
        input.image_url = Some("not a url".to_string());
        assert!(input.validate().is_err());

        let mut input = sample_input();
        input.image_url = Some("ftp://example.com/a.png".to_string());
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_category_slug_rules() {
        let ok = CategoryInput {
            name_en: "Mobile Apps".into(),
            name_hi: "मोबाइल ऐप्स".into(),
            slug: "mobile-apps".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = CategoryInput {
            name_en: "Mobile Apps".into(),
            name_hi: "मोबाइल ऐप्स".into(),
            slug: "Mobile Apps".into(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_localize_falls_back_to_english() {
        let input = sample_input().validate().unwrap();
        let now = Utc::now();
        let service = Service {
            id: 1,
            name_en: input.name_en,
            name_hi: input.name_hi,
            price: input.price,
            delivery_time: input.delivery_time,
            short_desc_en: Some("Professional logo".into()),
            short_desc_hi: None,
            full_desc_en: None,
            full_desc_hi: None,
            features_en: input.features_en,
            features_hi: None,
            image_url: input.image_url,
            category_id: 4,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let hi = service.localize(Language::Hi, "branding");
        assert_eq!(hi.name, "लोगो डिज़ाइन");
        assert_eq!(hi.description, "Professional logo");
        assert_eq!(hi.features, vec!["3 Concepts", "Vector Files"]);
        assert_eq!(hi.category_slug, "branding");
    }

    #[test]
    fn test_seed_catalog_is_consistent() {
        let seed = SeedCatalog::load().unwrap();
        assert_eq!(seed.categories.len(), 4);
        for service in &seed.services {
            assert!(
                seed.categories.iter().any(|c| c.slug == service.category),
                "unknown category {}",
                service.category
            );
            assert!(service.to_input(1).validate().is_ok());
        }
    }
}
