//! Identity feature slice: registration, JWT token issuance, and profile management.
//!
//! The slice exposes an [`IdentityService`] holding the datastore handle and
//! token configuration, plus an `OpenAPI`-documented axum router mounting:
//!
//! * `POST /api/user/create` — register a new user
//! * `POST /api/user/token`  — exchange credentials for a bearer token
//! * `GET  /api/user/me`     — current user's profile (authenticated)
//! * `PATCH /api/user/me`    — update name/password (authenticated)

mod api;
mod error;
mod model;
mod password;
mod service;
mod token;

pub use api::{CurrentUser, identity_router};
pub use error::{IdentityError, IdentityErrorExt};
pub use model::{MIN_PASSWORD_LEN, NewUser, User, normalize_email};
pub use service::{IdentityService, ProfileUpdate};
pub use token::Claims;
