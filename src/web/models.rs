use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::catalog::Language;
use crate::core::filter::OrderFilterQuery;
use crate::core::order::{AttachmentFile, ChoiceOption};
use crate::core::whatsapp::MessageKind;
use crate::storage::attachments::RejectedUpload;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Generic response
#[derive(Serialize)]
pub struct GenericResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl GenericResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// `?lang=` query
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

impl LangQuery {
    pub fn language(&self) -> Language {
        Language::from_code(self.lang.as_deref())
    }
}

/// Public service listing query
#[derive(Debug, Default, Deserialize)]
pub struct ServicesQuery {
    pub category: Option<String>,
    pub lang: Option<String>,
}

/// WhatsApp contact link query
#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    pub lang: Option<String>,
    pub service_id: Option<i64>,
}

/// Option value with its label in the requested language
#[derive(Debug, Serialize)]
pub struct LocalizedOption {
    pub value: &'static str,
    pub label: &'static str,
}

impl LocalizedOption {
    pub fn list(options: &[ChoiceOption], lang: Language) -> Vec<Self> {
        options
            .iter()
            .map(|o| Self {
                value: o.value,
                label: o.label(lang),
            })
            .collect()
    }
}

/// Budget and delivery choices for the order form
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub budget_ranges: Vec<LocalizedOption>,
    pub delivery_preferences: Vec<LocalizedOption>,
}

/// WhatsApp deep-link with the message it carries
#[derive(Debug, Serialize, Deserialize)]
pub struct WhatsAppLinkResponse {
    pub url: String,
    pub message: String,
}

/// Order intake result
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderCreatedResponse {
    pub success: bool,
    pub id: i64,
    pub order_id: String,
}

/// Attachment upload result
#[derive(Debug, Serialize)]
pub struct AttachmentUploadResponse {
    pub success: bool,
    pub stored: Vec<AttachmentFile>,
    pub rejected: Vec<RejectedUpload>,
}

/// Admin login body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "secretKey")]
    pub secret_key: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Current admin session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct PriorityUpdateRequest {
    pub priority: String,
}

#[derive(Debug, Deserialize)]
pub struct NotesUpdateRequest {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WhatsAppMessageRequest {
    pub kind: MessageKind,
}

/// CSV export query: the order filter plus `all`
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub all: Option<String>,
}

impl ExportQuery {
    /// `all=true` (or `1`) exports every order and ignores the filter
    pub fn export_all(&self) -> bool {
        matches!(self.all.as_deref().map(str::trim), Some("true" | "1" | "yes"))
    }

    pub fn filter(&self) -> OrderFilterQuery {
        OrderFilterQuery {
            search: self.search.clone(),
            status: self.status.clone(),
            priority: self.priority.clone(),
        }
    }
}
