use axum::{
    extract::{multipart::MultipartError, rejection::ExtensionRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::constants::GENERIC_ERROR_MESSAGE;

/// Any possible server errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    /// A submitted value was well-formed but unusable, e.g. an unknown contributor.
    #[error("{0}")]
    Invalid(String),

    #[error("No image selected")]
    MissingImage,

    #[error("Email address is already registered")]
    EmailTaken,

    #[error("Email address is not registered")]
    UnknownEmail,

    #[error("Password mismatch")]
    PasswordMismatch,

    #[error("You need to log in first")]
    Unauthenticated,

    #[error("You are not allowed to do that")]
    Forbidden,

    #[error("Point of interest not found")]
    NotFound,

    #[error("User account not found")]
    UnknownUser,

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("image host refused the upload: {0}")]
    ImageHost(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Authorization(#[from] oso::OsoError),

    #[error("password hasher failed: {0}")]
    Hasher(String),

    #[error(transparent)]
    MissingState(#[from] ExtensionRejection),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Multipart(_)
            | AppError::Invalid(_)
            | AppError::MissingImage => StatusCode::BAD_REQUEST,
            AppError::EmailTaken => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnknownEmail | AppError::PasswordMismatch => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated => StatusCode::SEE_OTHER,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound | AppError::UnknownUser => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Http(_)
            | AppError::ImageHost(_)
            | AppError::Io(_)
            | AppError::Template(_)
            | AppError::Authorization(_)
            | AppError::Hasher(_)
            | AppError::MissingState(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Messages fit to show the user. Internal failures are logged and replaced by a generic message.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            AppError::Validation(errors) => validation_messages(errors),
            _ if self.status_code().is_server_error() => {
                tracing::error!("Request failed: {:?}", self);
                vec![GENERIC_ERROR_MESSAGE.to_owned()]
            }
            _ => vec![self.to_string()],
        }
    }
}

/// Flatten validation errors into one message per failed rule, ordered by field.
fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Unauthenticated = self {
            return Redirect::to("/login").into_response();
        }

        let status = self.status_code();
        let message = self.user_messages().join(" ");
        let body = format!(
            "<!DOCTYPE html><html><head><title>{code}</title></head><body><h1>{code}</h1><p>{message}</p><p><a href=\"/home\">Back to your dashboard</a></p></body></html>",
            code = status,
            message = message,
        );
        (status, Html(body)).into_response()
    }
}

/// Why a form submission was turned away, in terms the originating page can show.
#[derive(Debug)]
pub struct Rejection {
    pub status: StatusCode,
    pub errors: Vec<String>,
}

impl From<AppError> for Rejection {
    fn from(error: AppError) -> Self {
        Rejection {
            status: error.status_code(),
            errors: error.user_messages(),
        }
    }
}

/// The outcome of a form submission: what to send on success, or what to re-render the form with.
pub type Submission<T> = Result<T, Rejection>;
