use crate::config::Config;
use crate::target::CacheKey;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A compiled document as handed to the previews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    pub key: CacheKey,
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`.
    pub fingerprint: String,
}

/// Cache of rendered output, shared by every preview of a document.
#[async_trait]
pub trait PdfCache: Send + Sync {
    /// Drops `key`. Unknown keys are ignored.
    async fn forget(&self, key: &CacheKey);

    async fn load(&self, key: &CacheKey) -> Result<Arc<PdfDocument>>;
}

pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// [`PdfCache`] that reads the PDF from the project directory on first load.
#[derive(Debug)]
pub struct MemoryPdfCache {
    config: Config,
    entries: Mutex<HashMap<CacheKey, Arc<PdfDocument>>>,
}

impl MemoryPdfCache {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<PdfDocument>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[async_trait]
impl PdfCache for MemoryPdfCache {
    async fn forget(&self, key: &CacheKey) {
        if self.entries().remove(key).is_some() {
            log::debug!("Forgot cached document {}", key);
        }
    }

    async fn load(&self, key: &CacheKey) -> Result<Arc<PdfDocument>> {
        let cached = self.entries().get(key).cloned();
        if let Some(doc) = cached {
            return Ok(doc);
        }

        let path = self.config.project_dir(&key.project_id).join(&key.pdf_path);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let doc = Arc::new(PdfDocument {
            key: key.clone(),
            fingerprint: fingerprint(&bytes),
            bytes,
        });
        log::debug!("Loaded {} ({})", key, doc.fingerprint);

        // A concurrent load of the same key may have won; keep the first.
        let doc = self
            .entries()
            .entry(key.clone())
            .or_insert(doc)
            .clone();
        Ok(doc)
    }
}
