use crate::error::IdentityError;
use crate::model::{NewUser, User};
use crate::service::{IdentityService, ProfileUpdate};
use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use vestibule_domain::constants::IDENTITY_TAG;

/// Registration payload
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateUserRequest {
    /// Email address (domain part is normalized to lowercase)
    email: String,
    /// Password, at least 5 characters
    password: String,
    /// Display name
    name: String,
}

/// Public view of a user
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    /// Record key
    id: String,
    /// Normalized email address
    email: String,
    /// Display name
    name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self { id: user.id, email: user.email, name: user.name }
    }
}

/// Credential payload for token issuance
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct TokenRequest {
    email: String,
    password: String,
}

/// Issued bearer token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    token: String,
}

/// Profile view of the authenticated user
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    email: String,
    name: String,
}

/// Partial profile update
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UpdateProfileRequest {
    /// New display name
    name: Option<String>,
    /// Replacement password, same length rule as registration
    password: Option<String>,
}

/// The authenticated caller, extracted from the `Authorization` bearer token.
///
/// Rejects with 401 when the header is absent, malformed, carries an invalid
/// token, or the token's subject no longer exists.
#[derive(Debug)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    IdentityService: FromRef<S>,
{
    type Rejection = IdentityError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let service = IdentityService::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| IdentityError::Unauthorized {
                message: "missing bearer token".into(),
                context: None,
            })?;

        let claims = service.verify_token(token)?;
        let user = service.profile(&claims.sub).await.map_err(|_| IdentityError::Unauthorized {
            message: "token subject no longer exists".into(),
            context: None,
        })?;

        Ok(Self(user))
    }
}

#[utoipa::path(
    post,
    path = "/api/user/create",
    request_body = CreateUserRequest,
    responses(
        (status = CREATED, description = "User registered", body = UserResponse),
        (status = BAD_REQUEST, description = "Invalid payload or email already registered"),
    ),
    tag = IDENTITY_TAG,
)]
async fn create_user_handler(
    State(service): State<IdentityService>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    let user = service
        .register(NewUser { email: payload.email, password: payload.password, name: payload.name })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/api/user/token",
    request_body = TokenRequest,
    responses(
        (status = OK, description = "Token issued", body = TokenResponse),
        (status = BAD_REQUEST, description = "Invalid credentials"),
    ),
    tag = IDENTITY_TAG,
)]
async fn token_handler(
    State(service): State<IdentityService>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, IdentityError> {
    let token = service.issue_token(&payload.email, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    get,
    path = "/api/user/me",
    responses(
        (status = OK, description = "Authenticated user's profile", body = ProfileResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid bearer token"),
    ),
    security(("bearer" = [])),
    tag = IDENTITY_TAG,
)]
async fn profile_handler(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse { email: user.email, name: user.name })
}

#[utoipa::path(
    patch,
    path = "/api/user/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = OK, description = "Updated profile", body = ProfileResponse),
        (status = BAD_REQUEST, description = "Invalid update payload"),
        (status = UNAUTHORIZED, description = "Missing or invalid bearer token"),
    ),
    security(("bearer" = [])),
    tag = IDENTITY_TAG,
)]
async fn update_profile_handler(
    State(service): State<IdentityService>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, IdentityError> {
    let updated = service
        .update_profile(&user.id, ProfileUpdate { name: payload.name, password: payload.password })
        .await?;

    Ok(Json(ProfileResponse { email: updated.email, name: updated.name }))
}

/// Routes of the identity slice. The profile path answers GET and PATCH;
/// anything else on it gets the router's automatic 405.
pub fn identity_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
    IdentityService: FromRef<S>,
{
    OpenApiRouter::<S>::new()
        .routes(routes!(create_user_handler))
        .routes(routes!(token_handler))
        .routes(routes!(profile_handler, update_profile_handler))
}
