//! Startup readiness gate for external dependencies.
//!
//! A process that depends on a datastore it does not supervise (a sibling
//! container, a remote cluster) has no guarantee the dependency accepts
//! connections when the process starts. [`wait_until_ready`] closes that gap:
//! it polls an injected [`ReadinessProbe`] at a fixed interval until the
//! dependency answers, absorbing the two expected transient failure kinds and
//! surfacing everything else immediately.
//!
//! The waiter owns nothing beyond the borrowed probe, persists nothing, and is
//! meant to run exactly once during startup, before any request-serving
//! concurrency begins.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vestibule_kernel::readiness::{
//!     ProbeError, ReadinessProbe, ResourceId, WaitPolicy, wait_until_ready,
//! };
//!
//! struct AlwaysUp;
//!
//! impl ReadinessProbe for AlwaysUp {
//!     async fn check(&self, _resources: &[ResourceId]) -> Result<(), ProbeError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resources = [ResourceId::from("primary")];
//! wait_until_ready(&AlwaysUp, &resources, &WaitPolicy::default()).await?;
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::info;
use vestibule_domain::config::ReadinessConfig;

/// Default delay between probe attempts.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Identifier of a resource the probe confirms ready (e.g. a named data store).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(Cow<'static, str>);

impl ResourceId {
    #[must_use]
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ResourceId {
    fn from(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

/// Failure kinds a probe may report.
///
/// The set is closed on purpose: the retry decision in [`wait_until_ready`] is
/// an explicit branch over [`ProbeError::is_transient`], not a guess about
/// which upstream error types happen to be recoverable.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The dependency has not finished initializing (e.g. connection refused
    /// during an early-startup race). Expected, retried.
    #[error("Resource not yet available{}: {message}", format_context(.context))]
    NotYetAvailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The dependency is reachable but reports itself down. Also retried,
    /// with the same policy as [`ProbeError::NotYetAvailable`].
    #[error("Resource unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Anything outside the known transient set: a logic or configuration
    /// bug. Never retried.
    #[error("Fatal probe failure{}: {message}", format_context(.context))]
    Fatal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ProbeError {
    /// Whether the waiter may absorb this failure and try again.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NotYetAvailable { .. } | Self::Unavailable { .. })
    }
}

/// Terminal outcomes of [`wait_until_ready`].
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    /// The retry budget was exhausted without the dependency answering.
    #[error("Readiness check timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// The probe reported a non-transient failure; surfaced immediately.
    #[error("Fatal readiness failure{}: {source}", format_context(.context))]
    Fatal {
        #[source]
        source: ProbeError,
        context: Option<Cow<'static, str>>,
    },
}

/// A side-effect-free check reporting whether a set of named dependencies can
/// currently serve requests.
///
/// Implementations check all requested resources together: the call succeeds
/// only when every resource in the slice is ready.
pub trait ReadinessProbe {
    fn check(
        &self,
        resources: &[ResourceId],
    ) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// Retry policy for the readiness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Fixed delay between attempts. No backoff, no jitter: this is a
    /// startup-only gate against a well-known local dependency, not a network
    /// client under load.
    pub check_interval: Duration,
    /// Attempt cap. `None` retries until the dependency answers.
    pub max_attempts: Option<NonZeroU32>,
}

impl WaitPolicy {
    #[must_use]
    pub const fn new(check_interval: Duration) -> Self {
        Self { check_interval, max_attempts: None }
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: NonZeroU32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_INTERVAL)
    }
}

impl From<&ReadinessConfig> for WaitPolicy {
    fn from(cfg: &ReadinessConfig) -> Self {
        Self {
            check_interval: Duration::from_secs(cfg.check_interval_secs),
            max_attempts: cfg.max_attempts.and_then(NonZeroU32::new),
        }
    }
}

/// Suspends the calling task until `probe` confirms every resource in
/// `resources` is ready.
///
/// Each attempt invokes `probe.check(resources)` once:
///
/// * success returns immediately, after a single informational log line;
/// * a transient failure ([`ProbeError::is_transient`]) logs one line, sleeps
///   for [`WaitPolicy::check_interval`], and retries;
/// * any other failure propagates as [`ReadinessError::Fatal`] at once,
///   regardless of remaining budget.
///
/// With `max_attempts = N` and nothing but transient failures, the function
/// returns [`ReadinessError::Timeout`] after exactly N probe invocations and
/// N − 1 sleeps: the sleep only ever runs when another attempt will follow.
///
/// # Errors
///
/// * [`ReadinessError::Fatal`] if the probe reports a non-transient failure,
///   or if `resources` is empty (a caller bug; the probe is never invoked).
/// * [`ReadinessError::Timeout`] if `max_attempts` is set and exhausted.
#[tracing::instrument(skip(probe))]
pub async fn wait_until_ready<P>(
    probe: &P,
    resources: &[ResourceId],
    policy: &WaitPolicy,
) -> Result<(), ReadinessError>
where
    P: ReadinessProbe,
{
    if resources.is_empty() {
        return Err(ReadinessError::Fatal {
            source: ProbeError::Fatal {
                message: "resource set is empty".into(),
                context: None,
            },
            context: Some("Readiness gate invoked with nothing to check".into()),
        });
    }

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match probe.check(resources).await {
            Ok(()) => {
                info!(attempt, "Dependencies ready");
                return Ok(());
            }
            Err(err) if err.is_transient() => {
                if policy.max_attempts.is_some_and(|max| attempt >= max.get()) {
                    return Err(ReadinessError::Timeout { attempts: attempt });
                }
                info!(attempt, error = %err, "Dependencies not ready, retrying...");
                tokio::time::sleep(policy.check_interval).await;
            }
            Err(err) => {
                return Err(ReadinessError::Fatal { source: err, context: None });
            }
        }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_from_config_maps_zero_attempts_to_unbounded() {
        let cfg = ReadinessConfig { check_interval_secs: 2, max_attempts: Some(0) };
        let policy = WaitPolicy::from(&cfg);
        assert_eq!(policy.check_interval, Duration::from_secs(2));
        assert!(policy.max_attempts.is_none());
    }

    #[test]
    fn transient_classification_is_closed() {
        let not_yet =
            ProbeError::NotYetAvailable { message: "refused".into(), context: None };
        let down = ProbeError::Unavailable { message: "engine down".into(), context: None };
        let fatal = ProbeError::Fatal { message: "bad config".into(), context: None };

        assert!(not_yet.is_transient());
        assert!(down.is_transient());
        assert!(!fatal.is_transient());
    }
}
