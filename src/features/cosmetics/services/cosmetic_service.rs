use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};
use crate::features::cosmetics::dtos::{
    CosmeticFields, EditCosmeticForm, FieldError, UploadedImage, IMAGE_FIELD,
    IMAGE_REQUIRED_MESSAGE,
};
use crate::features::cosmetics::models::Cosmetic;
use crate::features::cosmetics::repositories::CosmeticRepository;
use crate::modules::storage::LocalImageStorage;

/// Result of submitting a create or edit form
#[derive(Debug)]
pub enum FormOutcome {
    Saved(Cosmetic),
    /// Nothing was persisted; the form should be shown again with these errors
    Invalid(Vec<FieldError>),
}

/// Service for catalog cosmetic operations
pub struct CosmeticService {
    repository: Arc<dyn CosmeticRepository>,
    storage: Arc<LocalImageStorage>,
    max_image_size: usize,
}

impl CosmeticService {
    pub fn new(
        repository: Arc<dyn CosmeticRepository>,
        storage: Arc<LocalImageStorage>,
        max_image_size: usize,
    ) -> Self {
        Self {
            repository,
            storage,
            max_image_size,
        }
    }

    pub fn max_image_size(&self) -> usize {
        self.max_image_size
    }

    /// List all cosmetics
    pub async fn list(&self) -> Result<Vec<Cosmetic>> {
        self.repository.list().await
    }

    /// Get a cosmetic by id; a missing id is treated like a missing record
    pub async fn get(&self, id: Option<i32>) -> Result<Cosmetic> {
        let id = id.ok_or_else(|| AppError::NotFound("Cosmetic id is required".to_string()))?;

        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cosmetic {} not found", id)))
    }

    /// Create a cosmetic from the submitted fields and image
    ///
    /// The image is stored first so the derived picture path exists before the
    /// fields are validated. If anything after that rejects the record, the
    /// stored image is removed again.
    pub async fn create(
        &self,
        fields: CosmeticFields,
        image: Option<UploadedImage>,
    ) -> Result<FormOutcome> {
        let mut errors = Vec::new();

        let picture = match image {
            Some(image) => match image.check(self.max_image_size) {
                Some(error) => {
                    errors.push(error);
                    None
                }
                None => Some(self.storage.save(&image.file_name, &image.data).await?),
            },
            None => {
                errors.push(FieldError::new(IMAGE_FIELD, IMAGE_REQUIRED_MESSAGE));
                None
            }
        };

        let input = match fields.parse() {
            Ok(input) => Some(input),
            Err(field_errors) => {
                errors.extend(field_errors);
                None
            }
        };

        let (input, picture) = match (input, picture) {
            (Some(input), Some(picture)) => (input, picture),
            (_, picture) => {
                if let Some(picture) = picture {
                    self.discard_image(&picture).await;
                }
                log_rejected("create", &errors);
                return Ok(FormOutcome::Invalid(errors));
            }
        };

        match self.repository.insert(&input, &picture).await {
            Ok(cosmetic) => {
                info!(
                    "Cosmetic created: id={}, name={}, picture={}",
                    cosmetic.id, cosmetic.name, cosmetic.picture
                );
                Ok(FormOutcome::Saved(cosmetic))
            }
            Err(e) => {
                self.discard_image(&picture).await;
                Err(e)
            }
        }
    }

    /// Update the descriptive fields of a cosmetic
    ///
    /// The path id must match the id carried by the form. The picture is never
    /// replaced here.
    pub async fn update(&self, id: i32, form: EditCosmeticForm) -> Result<FormOutcome> {
        if form.id != Some(id) {
            return Err(AppError::NotFound(format!(
                "Cosmetic id mismatch: path {} vs form {:?}",
                id, form.id
            )));
        }

        let input = match form.fields().parse() {
            Ok(input) => input,
            Err(errors) => {
                log_rejected("edit", &errors);
                return Ok(FormOutcome::Invalid(errors));
            }
        };

        match self.repository.update(id, &input).await {
            Ok(cosmetic) => {
                info!("Cosmetic updated: id={}, name={}", cosmetic.id, cosmetic.name);
                Ok(FormOutcome::Saved(cosmetic))
            }
            Err(AppError::Concurrency(msg)) => {
                if self.repository.exists(id).await? {
                    Err(AppError::Concurrency(msg))
                } else {
                    Err(AppError::NotFound(format!("Cosmetic {} not found", id)))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a cosmetic and, best effort, its image
    ///
    /// Deleting an unknown id does nothing.
    pub async fn delete(&self, id: i32) -> Result<()> {
        let Some(cosmetic) = self.repository.find_by_id(id).await? else {
            debug!("Delete requested for unknown cosmetic {}", id);
            return Ok(());
        };

        if !cosmetic.picture.is_empty() {
            match self.storage.remove(&cosmetic.picture).await {
                Ok(true) => {}
                Ok(false) => debug!("Image already missing: {}", cosmetic.picture),
                Err(e) => debug!("Failed to remove image {}: {}", cosmetic.picture, e),
            }
        }

        self.repository.delete(id).await?;
        info!("Cosmetic deleted: id={}", id);

        Ok(())
    }

    async fn discard_image(&self, picture: &str) {
        if let Err(e) = self.storage.remove(picture).await {
            warn!("Failed to discard image {}: {}", picture, e);
        }
    }
}

fn log_rejected(operation: &str, errors: &[FieldError]) {
    for error in errors {
        debug!(
            operation,
            field = %error.field,
            "Cosmetic form rejected: {}",
            error.message
        );
    }
}
