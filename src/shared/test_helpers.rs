//! Test doubles and fixtures shared by the unit tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use tempfile::TempDir;
use tokio::sync::RwLock;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::cosmetics::dtos::{CosmeticFields, CosmeticInput, UploadedImage};
use crate::features::cosmetics::models::Cosmetic;
use crate::features::cosmetics::repositories::CosmeticRepository;
use crate::features::cosmetics::CosmeticService;
use crate::modules::storage::LocalImageStorage;

pub const TEST_MAX_IMAGE_SIZE: usize = 64 * 1024;

/// In-memory stand-in for the Postgres repository
#[derive(Default)]
pub struct InMemoryCosmeticRepository {
    rows: RwLock<BTreeMap<i32, Cosmetic>>,
    next_id: AtomicUsize,
    writes: AtomicUsize,
    conflict_on_update: AtomicBool,
}

impl InMemoryCosmeticRepository {
    /// Number of insert/update/delete calls that changed a row
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every update report a concurrency conflict
    pub fn fail_updates_with_conflict(&self) {
        self.conflict_on_update.store(true, Ordering::SeqCst);
    }

    /// Drop a row behind the service's back, as a concurrent request would
    pub async fn remove_row(&self, id: i32) {
        self.rows.write().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl CosmeticRepository for InMemoryCosmeticRepository {
    async fn list(&self) -> Result<Vec<Cosmetic>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Cosmetic>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, input: &CosmeticInput, picture: &str) -> Result<Cosmetic> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i32 + 1;
        let now = Utc::now();
        let cosmetic = Cosmetic {
            id,
            name: input.name.clone(),
            brand: input.brand.clone(),
            price: input.price,
            description: input.description.clone(),
            picture: picture.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.insert(id, cosmetic.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(cosmetic)
    }

    async fn update(&self, id: i32, input: &CosmeticInput) -> Result<Cosmetic> {
        let conflict =
            || AppError::Concurrency(format!("Update of cosmetic {} affected no rows", id));
        if self.conflict_on_update.load(Ordering::SeqCst) {
            return Err(conflict());
        }

        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or_else(conflict)?;
        row.name = input.name.clone();
        row.brand = input.brand.clone();
        row.price = input.price;
        row.description = input.description.clone();
        row.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(row.clone())
    }

    async fn delete(&self, id: i32) -> Result<()> {
        if self.rows.write().await.remove(&id).is_some() {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn exists(&self, id: i32) -> Result<bool> {
        Ok(self.rows.read().await.contains_key(&id))
    }
}

/// Service wired to an in-memory repository and a temporary web root
pub struct TestContext {
    pub service: Arc<CosmeticService>,
    pub repository: Arc<InMemoryCosmeticRepository>,
    pub storage: Arc<LocalImageStorage>,
    // Held so the web root outlives the test
    pub web_root: TempDir,
}

pub fn test_context() -> TestContext {
    let web_root = TempDir::new().unwrap();
    let storage = Arc::new(LocalImageStorage::new(&StorageConfig {
        web_root: web_root.path().to_path_buf(),
        upload_dir: "uploads".to_string(),
        max_image_size: TEST_MAX_IMAGE_SIZE,
    }));
    let repository = Arc::new(InMemoryCosmeticRepository::default());
    let service = Arc::new(CosmeticService::new(
        repository.clone(),
        Arc::clone(&storage),
        TEST_MAX_IMAGE_SIZE,
    ));

    TestContext {
        service,
        repository,
        storage,
        web_root,
    }
}

/// Valid form fields with generated values
pub fn sample_fields() -> CosmeticFields {
    let word: String = Word().fake();
    CosmeticFields {
        name: format!("{} lipstick", word),
        brand: CompanyName().fake(),
        price: "24.90".to_string(),
        description: Sentence(3..8).fake(),
    }
}

pub fn sample_image(file_name: &str, data: &[u8]) -> UploadedImage {
    UploadedImage {
        file_name: file_name.to_string(),
        content_type: "image/png".to_string(),
        data: data.to_vec(),
    }
}

/// Files currently in the upload directory
pub fn stored_files(storage: &LocalImageStorage) -> Vec<String> {
    match std::fs::read_dir(storage.upload_path()) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}
