use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, Multipart},
        FromRequest, Path, Request, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use minijinja::context;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppForm;
use crate::features::cosmetics::dtos::{
    CosmeticFields, CosmeticFormView, CosmeticView, EditCosmeticForm, FieldError, UploadedImage,
    IMAGE_FIELD,
};
use crate::features::cosmetics::services::{CosmeticService, FormOutcome};
use crate::shared::views;

/// Where every successful write sends the browser
const INDEX_PATH: &str = "/cosmetics";

/// Combined size of the text parts of one form
const MAX_TEXT_BYTES: usize = 64 * 1024;

/// Id taken from the path; one that is not a number counts as missing
fn path_id(id: Option<Path<String>>) -> Option<i32> {
    id.and_then(|Path(raw)| raw.trim().parse().ok())
}

fn render(view: &str, ctx: minijinja::Value) -> Result<Html<String>> {
    Ok(Html(views::render(view, ctx)?))
}

/// Show the submitted form again with its errors
fn render_invalid(view: &str, form: CosmeticFormView, errors: Vec<FieldError>) -> Result<Response> {
    let page = render(view, context! { form => form, errors => errors })?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

/// List all cosmetics
pub async fn index(State(service): State<Arc<CosmeticService>>) -> Result<Html<String>> {
    let cosmetics: Vec<CosmeticView> = service.list().await?.iter().map(Into::into).collect();
    render("cosmetics/index.html", context! { cosmetics => cosmetics })
}

/// Show one cosmetic
pub async fn details(
    State(service): State<Arc<CosmeticService>>,
    id: Option<Path<String>>,
) -> Result<Html<String>> {
    let cosmetic = service.get(path_id(id)).await?;
    render(
        "cosmetics/details.html",
        context! { cosmetic => CosmeticView::from(&cosmetic) },
    )
}

/// Empty create form
pub async fn create_form() -> Result<Html<String>> {
    render(
        "cosmetics/create.html",
        context! { form => CosmeticFormView::default() },
    )
}

/// Create a cosmetic from a multipart form with an `image_file` part
pub async fn create(
    State(service): State<Arc<CosmeticService>>,
    multipart: Multipart,
) -> Result<Response> {
    let (fields, image) = read_create_form(multipart, service.max_image_size()).await?;

    match service.create(fields.clone(), image).await? {
        FormOutcome::Saved(_) => Ok(Redirect::to(INDEX_PATH).into_response()),
        FormOutcome::Invalid(errors) => {
            render_invalid("cosmetics/create.html", fields.into(), errors)
        }
    }
}

/// Edit form filled with the current values
pub async fn edit_form(
    State(service): State<Arc<CosmeticService>>,
    id: Option<Path<String>>,
) -> Result<Html<String>> {
    let cosmetic = service.get(path_id(id)).await?;
    render(
        "cosmetics/edit.html",
        context! { form => CosmeticFormView::from(&cosmetic) },
    )
}

/// Save the edited fields of a cosmetic
///
/// Accepts the form urlencoded or as multipart; an image part is ignored.
pub async fn edit(
    State(service): State<Arc<CosmeticService>>,
    id: Option<Path<String>>,
    request: Request,
) -> Result<Response> {
    let id = path_id(id)
        .ok_or_else(|| AppError::NotFound("Cosmetic id is required".to_string()))?;
    let form = read_edit_form(request).await?;

    match service.update(id, form.clone()).await? {
        FormOutcome::Saved(_) => Ok(Redirect::to(INDEX_PATH).into_response()),
        FormOutcome::Invalid(errors) => render_invalid("cosmetics/edit.html", form.into(), errors),
    }
}

/// Delete confirmation page
pub async fn delete_form(
    State(service): State<Arc<CosmeticService>>,
    id: Option<Path<String>>,
) -> Result<Html<String>> {
    let cosmetic = service.get(path_id(id)).await?;
    render(
        "cosmetics/delete.html",
        context! { cosmetic => CosmeticView::from(&cosmetic) },
    )
}

/// Delete a cosmetic; missing or unknown ids redirect the same way
pub async fn delete_confirmed(
    State(service): State<Arc<CosmeticService>>,
    id: Option<Path<String>>,
) -> Result<Redirect> {
    match path_id(id) {
        Some(id) => service.delete(id).await?,
        None => debug!("Delete confirmed without a usable id"),
    }
    Ok(Redirect::to(INDEX_PATH))
}

/// Split the create form into its text fields and optional image
///
/// A file input left empty arrives as a part with no file name and no bytes;
/// that counts as no image. Reading stops at an image larger than
/// `max_image_size`, which is then reported as too large.
async fn read_create_form(
    mut multipart: Multipart,
    max_image_size: usize,
) -> Result<(CosmeticFields, Option<UploadedImage>)> {
    let mut fields = CosmeticFields::default();
    let mut image = None;
    let mut text_budget = MAX_TEXT_BYTES;

    while let Some(mut field) = next_field(&mut multipart).await? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or("").to_string();
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let (data, complete) = read_image(&mut field, max_image_size).await?;

            if file_name.is_empty() && data.is_empty() {
                continue;
            }
            image = Some(UploadedImage {
                file_name,
                content_type,
                data,
            });
            if !complete {
                debug!(
                    "Image exceeds {} bytes, ignoring the rest of the form",
                    max_image_size
                );
                break;
            }
            continue;
        }

        let value = read_text(field, &field_name, &mut text_budget).await?;
        match field_name.as_str() {
            "name" => fields.name = value,
            "brand" => fields.brand = value,
            "price" => fields.price = value,
            "description" => fields.description = value,
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    Ok((fields, image))
}

/// Read the edit form from either a urlencoded or a multipart body
async fn read_edit_form(request: Request) -> Result<EditCosmeticForm> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let AppForm(form) = AppForm::<EditCosmeticForm>::from_request(request, &()).await?;
        return Ok(form);
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e)))?;
    let mut form = EditCosmeticForm::default();
    let mut text_budget = MAX_TEXT_BYTES;

    while let Some(field) = next_field(&mut multipart).await? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name == IMAGE_FIELD {
            debug!("Ignoring image part on edit");
            continue;
        }

        let value = read_text(field, &field_name, &mut text_budget).await?;
        match field_name.as_str() {
            "id" => form.id = value.trim().parse().ok(),
            "name" => form.name = value,
            "brand" => form.brand = value,
            "price" => form.price = value,
            "description" => form.description = value,
            "picture" => form.picture = Some(value),
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    Ok(form)
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>> {
    multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })
}

/// Read an image part, stopping once it grows past `max_size`
///
/// Returns the bytes read and whether the part was read to its end.
async fn read_image(field: &mut Field<'_>, max_size: usize) -> Result<(Vec<u8>, bool)> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        debug!("Failed to read image bytes: {}", e);
        AppError::BadRequest(format!("Failed to read image data: {}", e))
    })? {
        data.extend_from_slice(&chunk);
        if data.len() > max_size {
            return Ok((data, false));
        }
    }
    Ok((data, true))
}

/// Read a text part, charging its size against the form's text budget
async fn read_text(
    mut field: Field<'_>,
    field_name: &str,
    budget: &mut usize,
) -> Result<String> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read {} field: {}", field_name, e))
    })? {
        *budget = budget
            .checked_sub(chunk.len())
            .ok_or_else(|| AppError::BadRequest("Form fields are too large".to_string()))?;
        data.extend_from_slice(&chunk);
    }

    String::from_utf8(data)
        .map_err(|_| AppError::BadRequest(format!("Field {} is not valid UTF-8", field_name)))
}
