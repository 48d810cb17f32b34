use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use vestibule_kernel::readiness::{
    ProbeError, ReadinessError, ReadinessProbe, ResourceId, WaitPolicy, wait_until_ready,
};

/// What the scripted probe reports on a given attempt.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Ready,
    NotYet,
    Down,
    Broken,
}

/// Probe replaying a fixed script of outcomes; counts invocations.
struct ScriptedProbe {
    script: Mutex<VecDeque<Outcome>>,
    calls: AtomicU32,
}

impl ScriptedProbe {
    fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self { script: Mutex::new(outcomes.into_iter().collect()), calls: AtomicU32::new(0) }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReadinessProbe for ScriptedProbe {
    async fn check(&self, _resources: &[ResourceId]) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().expect("script lock").pop_front().unwrap_or(Outcome::Ready);
        match next {
            Outcome::Ready => Ok(()),
            Outcome::NotYet => Err(ProbeError::NotYetAvailable {
                message: "connection refused".into(),
                context: None,
            }),
            Outcome::Down => {
                Err(ProbeError::Unavailable { message: "engine reports down".into(), context: None })
            }
            Outcome::Broken => {
                Err(ProbeError::Fatal { message: "unknown resource".into(), context: None })
            }
        }
    }
}

fn resources() -> [ResourceId; 1] {
    [ResourceId::from("primary")]
}

#[tokio::test(start_paused = true)]
async fn immediate_success_returns_without_sleeping() {
    let probe = ScriptedProbe::new([Outcome::Ready]);
    let started = Instant::now();

    wait_until_ready(&probe, &resources(), &WaitPolicy::default())
        .await
        .expect("probe reported ready");

    assert_eq!(probe.calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO, "no sleep may occur before a ready probe");
}

#[tokio::test(start_paused = true)]
async fn reference_sequence_probes_six_times_and_sleeps_five() {
    // Two refused connections, three engine-down reports, then ready.
    let probe = ScriptedProbe::new([
        Outcome::NotYet,
        Outcome::NotYet,
        Outcome::Down,
        Outcome::Down,
        Outcome::Down,
        Outcome::Ready,
    ]);
    let started = Instant::now();

    wait_until_ready(&probe, &resources(), &WaitPolicy::default())
        .await
        .expect("sixth attempt succeeds");

    assert_eq!(probe.calls(), 6);
    assert_eq!(started.elapsed(), Duration::from_secs(5), "one sleep per transient failure");
}

#[tokio::test(start_paused = true)]
async fn sleeps_match_leading_transient_failures() {
    let interval = Duration::from_millis(250);
    let probe = ScriptedProbe::new([Outcome::Down, Outcome::Down, Outcome::Down, Outcome::Ready]);
    let started = Instant::now();

    wait_until_ready(&probe, &resources(), &WaitPolicy::new(interval))
        .await
        .expect("fourth attempt succeeds");

    assert_eq!(probe.calls(), 4);
    assert_eq!(started.elapsed(), interval * 3);
}

#[tokio::test(start_paused = true)]
async fn fatal_failure_stops_retrying_immediately() {
    // Budget left over, script continues past the fatal entry; neither may matter.
    let probe =
        ScriptedProbe::new([Outcome::NotYet, Outcome::NotYet, Outcome::Broken, Outcome::Ready]);
    let started = Instant::now();

    let err = wait_until_ready(&probe, &resources(), &WaitPolicy::default())
        .await
        .expect_err("fatal outcome must surface");

    assert!(matches!(err, ReadinessError::Fatal { .. }), "got: {err}");
    assert_eq!(probe.calls(), 3, "no attempt may follow a fatal failure");
    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_times_out_after_n_attempts_and_n_minus_one_sleeps() {
    let probe = ScriptedProbe::new([Outcome::NotYet; 10]);
    let policy = WaitPolicy::default()
        .with_max_attempts(NonZeroU32::new(4).expect("nonzero"));
    let started = Instant::now();

    let err = wait_until_ready(&probe, &resources(), &policy)
        .await
        .expect_err("budget must be enforced");

    assert!(matches!(err, ReadinessError::Timeout { attempts: 4 }), "got: {err}");
    assert_eq!(probe.calls(), 4);
    assert_eq!(started.elapsed(), Duration::from_secs(3), "no sleep after the final attempt");
}

#[tokio::test(start_paused = true)]
async fn success_on_final_budgeted_attempt_is_not_a_timeout() {
    let probe = ScriptedProbe::new([Outcome::NotYet, Outcome::NotYet, Outcome::Ready]);
    let policy = WaitPolicy::default()
        .with_max_attempts(NonZeroU32::new(3).expect("nonzero"));

    wait_until_ready(&probe, &resources(), &policy)
        .await
        .expect("third and final attempt succeeds");

    assert_eq!(probe.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn unavailable_is_retried_like_not_yet_available() {
    let probe = ScriptedProbe::new([Outcome::Down, Outcome::Ready]);

    wait_until_ready(&probe, &resources(), &WaitPolicy::default())
        .await
        .expect("unavailable is transient");

    assert_eq!(probe.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn empty_resource_set_fails_without_probing() {
    let probe = ScriptedProbe::new([Outcome::Ready]);

    let err = wait_until_ready(&probe, &[], &WaitPolicy::default())
        .await
        .expect_err("empty resource set is a caller bug");

    assert!(matches!(err, ReadinessError::Fatal { .. }), "got: {err}");
    assert_eq!(probe.calls(), 0, "probe must not run for an empty resource set");
}
