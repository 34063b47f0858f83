//! Shared fixtures for pipeline integration tests: an in-memory pinning
//! provider, an in-memory pin record store, and temp-file payload builders.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use pinner_core::{PinRecordUpdate, PinStatus};
use pinner_indexer::{IndexerError, IndexerResult, PinRecordStore};
use pinner_storage::{
    AddedContent, PersistenceProvider, ProviderError, ProviderResult, ProviderSelector,
};
use pinner_worker::JobRouter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Add { filename: String },
    Pin { cid: String },
}

/// Provider that reads the uploaded file and answers with scripted CIDs.
pub struct MockProvider {
    name: String,
    healthy: AtomicBool,
    cids: Mutex<HashMap<String, String>>,
    failing_uploads: Mutex<HashSet<String>>,
    failing_once: Mutex<HashSet<String>>,
    failing_pins: Mutex<HashSet<String>>,
    calls: Mutex<Vec<ProviderCall>>,
    uploads: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockProvider {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            healthy: AtomicBool::new(true),
            cids: Mutex::new(HashMap::new()),
            failing_uploads: Mutex::new(HashSet::new()),
            failing_once: Mutex::new(HashSet::new()),
            failing_pins: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            uploads: Mutex::new(HashMap::new()),
        })
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// CID returned when a file with `filename` is added. Defaults to `Qm<filename>`.
    pub fn with_cid(&self, filename: &str, cid: &str) {
        self.cids
            .lock()
            .unwrap()
            .insert(filename.to_string(), cid.to_string());
    }

    pub fn fail_upload(&self, filename: &str) {
        self.failing_uploads
            .lock()
            .unwrap()
            .insert(filename.to_string());
    }

    /// Fail only the next upload of `filename`.
    pub fn fail_upload_once(&self, filename: &str) {
        self.failing_once
            .lock()
            .unwrap()
            .insert(filename.to_string());
    }

    /// Reject every pin of `cid`; adding content is unaffected.
    pub fn fail_pin(&self, cid: &str) {
        self.failing_pins.lock().unwrap().insert(cid.to_string());
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn added_filenames(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::Add { filename } => Some(filename),
                ProviderCall::Pin { .. } => None,
            })
            .collect()
    }

    pub fn uploaded(&self, filename: &str) -> Option<Vec<u8>> {
        self.uploads.lock().unwrap().get(filename).cloned()
    }
}

#[async_trait]
impl PersistenceProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, file_path: &Path, filename: &str) -> ProviderResult<AddedContent> {
        self.calls.lock().unwrap().push(ProviderCall::Add {
            filename: filename.to_string(),
        });

        let scripted = self.failing_uploads.lock().unwrap().contains(filename)
            || self.failing_once.lock().unwrap().remove(filename);
        if scripted {
            return Err(ProviderError::UploadFailed(format!(
                "scripted failure for {}",
                filename
            )));
        }

        let bytes = tokio::fs::read(file_path).await?;
        self.uploads
            .lock()
            .unwrap()
            .insert(filename.to_string(), bytes);

        let cid = self
            .cids
            .lock()
            .unwrap()
            .get(filename)
            .cloned()
            .unwrap_or_else(|| format!("Qm{}", filename));

        Ok(AddedContent {
            cid,
            content_hash: format!("hash-{}", filename),
        })
    }

    async fn pin(&self, cid: &str, _display_name: &str) -> ProviderResult<()> {
        self.calls.lock().unwrap().push(ProviderCall::Pin {
            cid: cid.to_string(),
        });
        if self.failing_pins.lock().unwrap().contains(cid) {
            return Err(ProviderError::PinFailed(format!(
                "scripted failure for {}",
                cid
            )));
        }
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

/// In-memory pin record store recording every update it receives.
#[derive(Default)]
pub struct MockPinStore {
    /// Every update received, accepted or not, in arrival order.
    received: Mutex<Vec<(String, PinRecordUpdate)>>,
    records: Mutex<HashMap<String, PinRecordUpdate>>,
    created: Mutex<Vec<String>>,
    /// (pin id, status) pairs whose updates are rejected; `None` rejects every status.
    failing: Mutex<Vec<(String, Option<PinStatus>)>>,
    fail_creates: AtomicBool,
}

impl MockPinStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_updates(&self, pin_id: &str, status: Option<PinStatus>) {
        self.failing
            .lock()
            .unwrap()
            .push((pin_id.to_string(), status));
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    /// Last accepted update for `pin_id`.
    pub fn record(&self, pin_id: &str) -> Option<PinRecordUpdate> {
        self.records.lock().unwrap().get(pin_id).cloned()
    }

    pub fn status(&self, pin_id: &str) -> Option<PinStatus> {
        self.record(pin_id).map(|r| r.status)
    }

    /// Statuses sent for `pin_id`, accepted or not.
    pub fn history(&self, pin_id: &str) -> Vec<PinStatus> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == pin_id)
            .map(|(_, update)| update.status)
            .collect()
    }

    pub fn received(&self) -> Vec<(String, PinRecordUpdate)> {
        self.received.lock().unwrap().clone()
    }

    pub fn created_for(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    fn rejects(&self, pin_id: &str, status: PinStatus) -> bool {
        self.failing
            .lock()
            .unwrap()
            .iter()
            .any(|(id, s)| id == pin_id && s.map_or(true, |s| s == status))
    }
}

#[async_trait]
impl PinRecordStore for MockPinStore {
    async fn update_pin_record(&self, id: &str, update: &PinRecordUpdate) -> IndexerResult<()> {
        self.received
            .lock()
            .unwrap()
            .push((id.to_string(), update.clone()));

        if self.rejects(id, update.status) {
            return Err(IndexerError::Status {
                status: 503,
                body: "indexer unavailable".to_string(),
            });
        }

        self.records
            .lock()
            .unwrap()
            .insert(id.to_string(), update.clone());
        Ok(())
    }

    async fn create_manifest_pin_record(&self, release_id: &str) -> IndexerResult<String> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(IndexerError::Status {
                status: 500,
                body: "create failed".to_string(),
            });
        }
        self.created.lock().unwrap().push(release_id.to_string());
        Ok(format!("pin-manifest-{}", release_id))
    }
}

/// Temp directories for uploaded files and for derived manifests.
pub struct Workspace {
    pub files: TempDir,
    pub manifests: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            files: TempDir::new().unwrap(),
            manifests: TempDir::new().unwrap(),
        }
    }

    /// Create a temp file named `name` with some bytes and return its path.
    pub fn file(&self, name: &str) -> PathBuf {
        let path = self.files.path().join(name);
        std::fs::write(&path, format!("contents of {}", name)).unwrap();
        path
    }

    pub fn missing(&self, name: &str) -> PathBuf {
        self.files.path().join(name)
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.manifests.path().to_path_buf()
    }

    pub fn manifest_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.manifests.path()).unwrap().next().is_none()
    }
}

pub fn descriptor(path: &Path, pin_id: &str) -> Value {
    json!({
        "tempPath": path.display().to_string(),
        "originalName": path.file_name().unwrap().to_string_lossy(),
        "pinId": pin_id
    })
}

pub fn release_payload(main: Option<Value>, thumbnails: Vec<Value>, existing: &[&str]) -> Value {
    let mut payload = json!({
        "organizationId": "org-1",
        "releaseId": "rel-1",
        "thumbnails": thumbnails,
        "existingThumbnailCIDs": existing
    });
    if let Some(main) = main {
        payload["mainFile"] = main;
    }
    payload
}

pub fn logo_payload(path: &Path, pin_id: &str) -> Value {
    json!({
        "organizationId": "org-1",
        "tempPath": path.display().to_string(),
        "originalName": path.file_name().unwrap().to_string_lossy(),
        "pinId": pin_id
    })
}

pub fn selector_with(providers: &[&Arc<MockProvider>]) -> Arc<ProviderSelector> {
    let providers: Vec<Arc<dyn PersistenceProvider>> = providers
        .iter()
        .map(|p| Arc::clone(*p) as Arc<dyn PersistenceProvider>)
        .collect();
    Arc::new(ProviderSelector::new(providers))
}

pub fn router(
    provider: &Arc<MockProvider>,
    store: &Arc<MockPinStore>,
    workspace: &Workspace,
) -> JobRouter {
    JobRouter::new(
        selector_with(&[provider]),
        store.clone(),
        workspace.manifest_dir(),
    )
}
