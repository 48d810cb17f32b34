use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::borrow::Cow;
use vestibule_database::DatabaseError;

/// A specialized [`IdentityError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Malformed or rejected input (bad email, short password, missing field).
    #[error("Identity validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A uniqueness constraint was violated (e.g. duplicate email).
    #[error("Identity conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Credential verification failed on the token endpoint.
    #[error("Identity auth error{}: {message}", format_context(.context))]
    Auth { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Missing or invalid bearer token on a protected route.
    #[error("Unauthorized{}: {message}", format_context(.context))]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The requested record does not exist.
    #[error("Identity record not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A wrapper for underlying datastore errors.
    #[error("Identity datastore error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl IdentityError {
    fn set_context(&mut self, context: Cow<'static, str>) {
        match self {
            Self::Validation { context: c, .. }
            | Self::Conflict { context: c, .. }
            | Self::Auth { context: c, .. }
            | Self::Unauthorized { context: c, .. }
            | Self::NotFound { context: c, .. }
            | Self::Database { context: c, .. }
            | Self::Internal { context: c, .. } => *c = Some(context),
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Conflict { .. } | Self::Auth { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatabaseError> for IdentityError {
    fn from(source: DatabaseError) -> Self {
        Self::Database { source, context: None }
    }
}

impl From<surrealdb::Error> for IdentityError {
    fn from(source: surrealdb::Error) -> Self {
        Self::Database { source: source.into(), context: None }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // Internals stay in the log; clients get an opaque message.
            tracing::error!(error = %self, "Identity request failed");
            return (status, Json(json!({ "error": "internal error" }))).into_response();
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Adds contextual information to fallible identity operations.
pub trait IdentityErrorExt<T> {
    /// Wraps the error with a static context string.
    ///
    /// # Errors
    /// Propagates the original error, annotated.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, IdentityError>;
}

impl<T, E> IdentityErrorExt<T> for Result<T, E>
where
    E: Into<IdentityError>,
{
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, IdentityError> {
        self.map_err(|e| {
            let mut err = e.into();
            err.set_context(context.into());
            err
        })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
