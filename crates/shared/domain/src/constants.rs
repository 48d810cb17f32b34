//! Entity table names and OpenAPI tags shared across slices.

/// `SurrealDB` table holding user records.
pub const USER: &str = "user";

/// Resource identifier of the primary datastore, as used by the readiness gate.
pub const PRIMARY_DATASTORE: &str = "primary";

/// OpenAPI tag for system endpoints (health, docs).
pub const SYSTEM_TAG: &str = "system";

/// OpenAPI tag for identity endpoints.
pub const IDENTITY_TAG: &str = "identity";
