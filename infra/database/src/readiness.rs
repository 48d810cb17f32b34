//! Datastore-side implementation of the kernel's readiness probe.

use fxhash::FxHashMap;
use surrealdb::engine::any::connect;
use vestibule_kernel::readiness::{ProbeError, ReadinessProbe, ResourceId};

/// Confirms that named datastore endpoints accept connections and pass the
/// engine health check.
///
/// Each registered resource maps to an engine URL. A connection attempt is
/// made per check — the probe holds no live handle, so it observes exactly
/// what a fresh startup would: an engine that is still booting refuses the
/// connection (`NotYetAvailable`), one that accepts but cannot serve fails
/// the health check (`Unavailable`). Asking for a resource that was never
/// registered is a configuration bug and fails fatally.
#[derive(Debug, Default)]
pub struct ConnectivityProbe {
    endpoints: FxHashMap<String, String>,
}

impl ConnectivityProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `resource` as reachable through `url`.
    #[must_use]
    pub fn register(mut self, resource: impl Into<String>, url: impl Into<String>) -> Self {
        self.endpoints.insert(resource.into(), url.into());
        self
    }
}

impl ReadinessProbe for ConnectivityProbe {
    async fn check(&self, resources: &[ResourceId]) -> Result<(), ProbeError> {
        for resource in resources {
            let url = self.endpoints.get(resource.as_str()).ok_or_else(|| ProbeError::Fatal {
                message: format!("unknown resource '{resource}'").into(),
                context: Some("resource was never registered with the probe".into()),
            })?;

            let instance = connect(url).await.map_err(|e| ProbeError::NotYetAvailable {
                message: e.to_string().into(),
                context: Some(format!("connecting to '{resource}'").into()),
            })?;

            instance.health().await.map_err(|e| ProbeError::Unavailable {
                message: e.to_string().into(),
                context: Some(format!("health check for '{resource}'").into()),
            })?;
        }

        Ok(())
    }
}
