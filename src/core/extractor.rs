use axum::{
    body::Body,
    extract::{rejection::FormRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Form,
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;

/// Custom urlencoded form extractor that provides consistent error pages
pub struct AppForm<T>(pub T);

impl<T, S> FromRequest<S> for AppForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppFormRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppFormRejection(rejection)),
        }
    }
}

pub struct AppFormRejection(FormRejection);

impl From<AppFormRejection> for AppError {
    fn from(rejection: AppFormRejection) -> Self {
        let message = match rejection.0 {
            FormRejection::InvalidFormContentType(err) => {
                format!("Invalid form content type: {}", err)
            }
            FormRejection::FailedToDeserializeForm(err) => format!("Invalid form data: {}", err),
            FormRejection::FailedToDeserializeFormBody(err) => {
                format!("Invalid form data: {}", err)
            }
            _ => "Failed to parse form body".to_string(),
        };

        AppError::BadRequest(message)
    }
}

impl IntoResponse for AppFormRejection {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
