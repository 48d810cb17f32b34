//! Convenience re-exports for downstream crates.

pub use crate::config::{ConfigError, ConfigErrorExt, load_config};
pub use crate::readiness::{
    ProbeError, ReadinessError, ReadinessProbe, ResourceId, WaitPolicy, wait_until_ready,
};
pub use crate::security::resource::{ResourceGuard, ResourceGuardError};
pub use crate::safe_nanoid;
