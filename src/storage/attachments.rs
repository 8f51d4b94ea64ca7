//! Order attachment storage
//!
//! Uploads arrive base64 encoded in a JSON body. Each file is checked against
//! the [`AttachmentPolicy`] and handed to an [`AttachmentStore`]; a file that
//! fails any step is reported back and the rest carry on.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use log::{debug, warn};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::core::error::{StoreError, StoreResult};
use crate::core::order::AttachmentFile;

/// Sub-directory (and URL segment) holding order attachments
pub const ATTACHMENT_DIR: &str = "order-attachments";

/// Limits applied to every uploaded file
#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    pub max_files: usize,
    pub max_file_size: u64,
    pub accepted_types: &'static [&'static str],
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_file_size: 10 * 1024 * 1024,
            accepted_types: &[
                "image/jpeg",
                "image/png",
                "image/svg+xml",
                "application/pdf",
                "text/plain",
            ],
        }
    }
}

impl AttachmentPolicy {
    /// Check one decoded file, returning the rejection reason
    pub fn check(&self, upload: &Upload) -> Result<(), String> {
        if !self.accepted_types.contains(&upload.content_type.as_str()) {
            return Err(format!("File type {} is not accepted", upload.content_type));
        }
        if upload.bytes.is_empty() {
            return Err("File is empty".to_string());
        }
        if upload.bytes.len() as u64 > self.max_file_size {
            return Err(format!(
                "File is larger than {} MB",
                self.max_file_size / (1024 * 1024)
            ));
        }
        Ok(())
    }
}

/// Upload body for `POST /api/orders/{order_id}/attachments`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    pub files: Vec<EncodedUpload>,
}

/// One file as posted by the browser
#[derive(Debug, Clone, Deserialize)]
pub struct EncodedUpload {
    pub name: String,
    #[serde(alias = "type")]
    pub content_type: String,
    /// Base64 payload, optionally as a `data:` URL
    pub data: String,
}

/// Decoded file ready to store
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl EncodedUpload {
    pub fn decode(self) -> Result<Upload, String> {
        let payload = match self.data.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => self.data.as_str(),
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| format!("Invalid file data: {}", e))?;

        Ok(Upload {
            name: self.name.trim().to_string(),
            content_type: self.content_type.trim().to_ascii_lowercase(),
            bytes,
        })
    }
}

/// File that was not stored, with the reason
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RejectedUpload {
    pub name: String,
    pub reason: String,
}

/// Result of storing a batch of uploads
#[derive(Debug, Default, Serialize)]
pub struct UploadOutcome {
    pub stored: Vec<AttachmentFile>,
    pub rejected: Vec<RejectedUpload>,
}

/// Where attachment bytes end up
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Persist one file for an order and describe where it can be fetched
    async fn put(&self, order_ref: &str, upload: &Upload) -> StoreResult<AttachmentFile>;

    /// Drop a file written by `put` that ended up not being attached
    async fn remove(&self, file: &AttachmentFile) -> StoreResult<()>;
}

/// Extension for the stored file name, from the original name or the type
fn extension_for(upload: &Upload) -> String {
    let from_name = Path::new(&upload.name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| {
        match upload.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/svg+xml" => "svg",
            "application/pdf" => "pdf",
            "text/plain" => "txt",
            _ => "bin",
        }
        .to_string()
    })
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// Attachments written below a local directory and served from `/files`
pub struct LocalAttachmentStore {
    root: PathBuf,
    public_url: String,
}

impl LocalAttachmentStore {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    async fn put(&self, order_ref: &str, upload: &Upload) -> StoreResult<AttachmentFile> {
        let dir = self.root.join(ATTACHMENT_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!(
            "{}_{}_{}.{}",
            order_ref,
            Utc::now().timestamp_millis(),
            random_suffix(),
            extension_for(upload)
        );
        tokio::fs::write(dir.join(&file_name), &upload.bytes).await?;
        debug!("Stored attachment {} ({} bytes)", file_name, upload.bytes.len());

        Ok(AttachmentFile {
            name: upload.name.clone(),
            url: format!("{}/files/{}/{}", self.public_url, ATTACHMENT_DIR, file_name),
            content_type: upload.content_type.clone(),
            size: upload.bytes.len() as u64,
        })
    }

    async fn remove(&self, file: &AttachmentFile) -> StoreResult<()> {
        let prefix = format!("{}/files/{}/", self.public_url, ATTACHMENT_DIR);
        let stored_name = file
            .url
            .strip_prefix(&prefix)
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
            .ok_or_else(|| StoreError::validation(format!("Not a stored attachment: {}", file.url)))?;

        tokio::fs::remove_file(self.root.join(ATTACHMENT_DIR).join(stored_name)).await?;
        debug!("Removed attachment {}", stored_name);
        Ok(())
    }
}

/// Decode, check and store a batch of uploads for one order.
///
/// `existing` is the number of files the order already has; uploads past the
/// policy's file limit are rejected.
pub async fn store_uploads(
    store: &dyn AttachmentStore,
    policy: &AttachmentPolicy,
    order_ref: &str,
    existing: usize,
    uploads: Vec<EncodedUpload>,
) -> UploadOutcome {
    let mut outcome = UploadOutcome::default();

    for encoded in uploads {
        let name = encoded.name.clone();
        let reject = |reason: String| RejectedUpload {
            name: name.clone(),
            reason,
        };

        if existing + outcome.stored.len() >= policy.max_files {
            outcome.rejected.push(reject(format!(
                "At most {} files per order",
                policy.max_files
            )));
            continue;
        }

        let upload = match encoded.decode() {
            Ok(upload) => upload,
            Err(reason) => {
                outcome.rejected.push(reject(reason));
                continue;
            }
        };

        if let Err(reason) = policy.check(&upload) {
            outcome.rejected.push(reject(reason));
            continue;
        }

        match store.put(order_ref, &upload).await {
            Ok(file) => outcome.stored.push(file),
            Err(e) => {
                warn!("Failed to store attachment {} for {}: {}", name, order_ref, e);
                outcome.rejected.push(reject("Upload failed".to_string()));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(name: &str, content_type: &str, bytes: &[u8]) -> EncodedUpload {
        EncodedUpload {
            name: name.into(),
            content_type: content_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    fn upload(name: &str, content_type: &str, size: usize) -> Upload {
        Upload {
            name: name.into(),
            content_type: content_type.into(),
            bytes: vec![b'x'; size],
        }
    }

    #[test]
    fn test_policy_checks_type_and_size() {
        let policy = AttachmentPolicy::default();
        assert!(policy.check(&upload("a.pdf", "application/pdf", 10)).is_ok());
        assert!(policy.check(&upload("a.exe", "application/x-msdownload", 10)).is_err());
        assert!(policy.check(&upload("a.txt", "text/plain", 0)).is_err());
        assert!(policy
            .check(&upload("big.png", "image/png", 10 * 1024 * 1024 + 1))
            .is_err());
    }

    #[test]
    fn test_decode_accepts_data_url() {
        let upload = EncodedUpload {
            name: "note.txt".into(),
            content_type: "Text/Plain".into(),
            data: format!("data:text/plain;base64,{}", STANDARD.encode("hello")),
        }
        .decode()
        .unwrap();
        assert_eq!(upload.bytes, b"hello");
        assert_eq!(upload.content_type, "text/plain");

        let bad = EncodedUpload {
            name: "x".into(),
            content_type: "text/plain".into(),
            data: "***".into(),
        };
        assert!(bad.decode().is_err());
    }

    #[test]
    fn test_extension_falls_back_to_type() {
        assert_eq!(extension_for(&upload("Logo.PNG", "image/png", 1)), "png");
        assert_eq!(extension_for(&upload("brief", "application/pdf", 1)), "pdf");
    }

    #[actix_web::test]
    async fn test_local_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAttachmentStore::new(dir.path(), "http://localhost:8080/");

        let file = store
            .put("TAL-20250101-0001", &upload("brief.pdf", "application/pdf", 64))
            .await
            .unwrap();

        assert_eq!(file.size, 64);
        assert_eq!(file.name, "brief.pdf");
        let prefix = "http://localhost:8080/files/order-attachments/TAL-20250101-0001_";
        assert!(file.url.starts_with(prefix));
        assert!(file.url.ends_with(".pdf"));

        let stored_name = file.url.rsplit('/').next().unwrap();
        let on_disk = store.root().join(ATTACHMENT_DIR).join(stored_name);
        assert_eq!(std::fs::read(&on_disk).unwrap().len(), 64);

        store.remove(&file).await.unwrap();
        assert!(!on_disk.exists());

        let foreign = AttachmentFile {
            url: "http://elsewhere/files/order-attachments/../secret".into(),
            ..file
        };
        assert!(matches!(store.remove(&foreign).await, Err(StoreError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_failed_upload_is_skipped() {
        let mut mock = MockAttachmentStore::new();
        mock.expect_put().times(2).returning(|order_ref, upload| {
            if upload.name == "broken.png" {
                return Err(StoreError::Internal("disk full".into()));
            }
            Ok(AttachmentFile {
                name: upload.name.clone(),
                url: format!("http://x/files/{}", order_ref),
                content_type: upload.content_type.clone(),
                size: upload.bytes.len() as u64,
            })
        });

        let uploads = vec![
            encoded("broken.png", "image/png", b"abc"),
            encoded("brief.pdf", "application/pdf", b"abcd"),
            encoded("tool.exe", "application/octet-stream", b"abcd"),
        ];
        let outcome =
            store_uploads(&mock, &AttachmentPolicy::default(), "TAL-1", 0, uploads).await;

        assert_eq!(outcome.stored.len(), 1);
        assert_eq!(outcome.stored[0].name, "brief.pdf");
        let rejected: Vec<_> = outcome.rejected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(rejected, vec!["broken.png", "tool.exe"]);
    }

    #[actix_web::test]
    async fn test_file_limit_counts_existing() {
        let mut mock = MockAttachmentStore::new();
        mock.expect_put().times(1).returning(|_, upload| {
            Ok(AttachmentFile {
                name: upload.name.clone(),
                url: "http://x".into(),
                content_type: upload.content_type.clone(),
                size: 1,
            })
        });

        let uploads = vec![
            encoded("a.txt", "text/plain", b"a"),
            encoded("b.txt", "text/plain", b"b"),
        ];
        let outcome =
            store_uploads(&mock, &AttachmentPolicy::default(), "TAL-1", 4, uploads).await;

        assert_eq!(outcome.stored.len(), 1);
        assert_eq!(outcome.rejected[0].name, "b.txt");
    }
}
