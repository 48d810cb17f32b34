use crate::error::{IdentityError, IdentityErrorExt};
use crate::model::{CredentialRow, NewUser, User, normalize_email, validate_password};
use crate::password::{hash_password, verify_password};
use crate::token::{self, Claims};
use tracing::{info, instrument};
use vestibule_database::Database;
use vestibule_domain::config::JwtConfig;
use vestibule_domain::constants::USER;
use vestibule_kernel::safe_nanoid;
use vestibule_kernel::security::resource::ResourceGuard;

/// Fields returned to callers; the password hash never leaves the service.
const USER_PROJECTION: &str = "id.id() AS id, email, name, is_active, is_staff, is_superuser";

/// Profile fields a user may change about themselves.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Identity feature state: user lifecycle, credential checks, token issuance.
#[derive(Debug, Clone)]
pub struct IdentityService {
    db: Database,
    jwt: JwtConfig,
}

impl IdentityService {
    #[must_use]
    pub fn new(db: Database, jwt: JwtConfig) -> Self {
        Self { db, jwt }
    }

    /// Registers a regular user.
    ///
    /// Normalizes the email, enforces the password length rule, and rejects
    /// duplicate emails before creating the record.
    ///
    /// # Errors
    /// * [`IdentityError::Validation`] for a malformed email or short password.
    /// * [`IdentityError::Conflict`] when the email is already registered.
    #[instrument(skip_all, fields(email = %new_user.email))]
    pub async fn register(&self, new_user: NewUser) -> Result<User, IdentityError> {
        self.create(&new_user.email, &new_user.password, &new_user.name, false, false).await
    }

    /// Creates a privileged user with `is_staff` and `is_superuser` set.
    ///
    /// # Errors
    /// Same failure modes as [`register`](Self::register).
    #[instrument(skip_all, fields(email = %email))]
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, IdentityError> {
        self.create(email, password, "", true, true).await
    }

    async fn create(
        &self,
        email: &str,
        password: &str,
        name: &str,
        is_staff: bool,
        is_superuser: bool,
    ) -> Result<User, IdentityError> {
        let email = normalize_email(email)?;
        validate_password(password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::Conflict {
                message: "email is already registered".into(),
                context: None,
            });
        }

        let id = safe_nanoid!();
        let password_hash = hash_password(password)?;

        let query = format!(
            "CREATE type::thing('{USER}', $id) SET
                email = $email,
                name = $name,
                password_hash = $hash,
                is_active = true,
                is_staff = $is_staff,
                is_superuser = $is_superuser;
            SELECT {USER_PROJECTION} FROM ONLY type::thing('{USER}', $id);"
        );

        let user = self
            .db
            .query(&query)
            .bind(("id", id))
            .bind(("email", email))
            .bind(("name", name.to_owned()))
            .bind(("hash", password_hash))
            .bind(("is_staff", is_staff))
            .bind(("is_superuser", is_superuser))
            .await
            .context("Creating user")?
            .take::<Option<User>>(1)
            .map_err(classify_create_error)?
            .ok_or_else(|| IdentityError::Internal {
                message: "created user could not be read back".into(),
                context: None,
            })?;

        info!(user = %user.id, "User created");
        Ok(user)
    }

    /// Looks a user up by (normalized) email.
    ///
    /// # Errors
    /// Validation error for a malformed email; datastore errors pass through.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        let email = normalize_email(email)?;

        let mut found = self
            .db
            .query(format!("SELECT {USER_PROJECTION} FROM {USER} WHERE email = $email LIMIT 1"))
            .bind(("email", email))
            .await
            .context("Looking up user by email")?
            .take::<Vec<User>>(0)
            .context("Parsing user row")?;

        Ok(found.pop())
    }

    /// Checks credentials and returns the matching active user.
    ///
    /// # Errors
    /// [`IdentityError::Auth`] for an unknown email, wrong password, or a
    /// deactivated account — indistinguishable on purpose.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, IdentityError> {
        let email = normalize_email(email)?;

        let mut rows = self
            .db
            .query(format!(
                "SELECT id.id() AS id, password_hash, is_active FROM {USER} \
                 WHERE email = $email LIMIT 1"
            ))
            .bind(("email", email))
            .await
            .context("Looking up credentials")?
            .take::<Vec<CredentialRow>>(0)
            .context("Parsing credential row")?;

        let Some(row) = rows.pop() else {
            return Err(invalid_credentials());
        };

        if !row.is_active || !verify_password(password, &row.password_hash)? {
            return Err(invalid_credentials());
        }

        self.profile(&row.id).await
    }

    /// Exchanges valid credentials for a signed bearer token.
    ///
    /// # Errors
    /// Same failure modes as [`verify_credentials`](Self::verify_credentials),
    /// plus internal errors from token encoding.
    pub async fn issue_token(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let user = self.verify_credentials(email, password).await?;
        token::issue(&user.id, &self.jwt)
    }

    /// Validates a bearer token and returns its claims.
    ///
    /// # Errors
    /// [`IdentityError::Unauthorized`] for an expired, tampered, or
    /// wrong-issuer token.
    pub fn verify_token(&self, token: &str) -> Result<Claims, IdentityError> {
        token::verify(token, &self.jwt)
    }

    /// Fetches a user's profile by record key (or full `user:<key>` id).
    ///
    /// # Errors
    /// [`IdentityError::NotFound`] when no such record exists;
    /// [`IdentityError::Validation`] for an id belonging to another table.
    pub async fn profile(&self, user_id: &str) -> Result<User, IdentityError> {
        let key = user_key(user_id)?;

        self.db
            .query(format!("SELECT {USER_PROJECTION} FROM ONLY type::thing('{USER}', $key)"))
            .bind(("key", key))
            .await
            .context("Fetching profile")?
            .take::<Option<User>>(0)
            .context("Parsing profile")?
            .ok_or_else(|| IdentityError::NotFound {
                message: "user does not exist".into(),
                context: None,
            })
    }

    /// Applies a partial profile update and returns the fresh profile.
    ///
    /// # Errors
    /// Validation error for a short replacement password; otherwise the
    /// failure modes of [`profile`](Self::profile).
    #[instrument(skip_all, fields(user = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<User, IdentityError> {
        let key = user_key(user_id)?;

        let mut assignments = Vec::new();
        if update.name.is_some() {
            assignments.push("name = $name");
        }
        let password_hash = match update.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                assignments.push("password_hash = $hash");
                Some(hash_password(password)?)
            }
            None => None,
        };

        if assignments.is_empty() {
            return self.profile(user_id).await;
        }

        let query = format!(
            "UPDATE type::thing('{USER}', $key) SET {};
            SELECT {USER_PROJECTION} FROM ONLY type::thing('{USER}', $key);",
            assignments.join(", ")
        );

        let mut request = self.db.query(&query).bind(("key", key));
        if let Some(name) = update.name {
            request = request.bind(("name", name));
        }
        if let Some(hash) = password_hash {
            request = request.bind(("hash", hash));
        }

        request
            .await
            .context("Updating profile")?
            .take::<Option<User>>(1)
            .context("Parsing updated profile")?
            .ok_or_else(|| IdentityError::NotFound {
                message: "user does not exist".into(),
                context: None,
            })
    }
}

/// Maps any accepted id form onto the record key, rejecting foreign tables.
fn user_key(user_id: &str) -> Result<String, IdentityError> {
    let full = ResourceGuard::verify(user_id, USER).map_err(|e| IdentityError::Validation {
        message: e.to_string().into(),
        context: Some("User id rejected".into()),
    })?;
    Ok(full.split_once(':').map_or(full.clone(), |(_, key)| key.to_owned()))
}

const fn invalid_credentials() -> IdentityError {
    IdentityError::Auth { message: std::borrow::Cow::Borrowed("invalid credentials"), context: None }
}

/// The unique email index is the backstop behind the pre-insert lookup;
/// surface its violation as the same conflict the lookup reports.
fn classify_create_error(err: surrealdb::Error) -> IdentityError {
    let message = err.to_string();
    if message.contains("user_email_idx") {
        return IdentityError::Conflict {
            message: "email is already registered".into(),
            context: None,
        };
    }
    IdentityError::Database { source: err.into(), context: Some("Creating user".into()) }
}
