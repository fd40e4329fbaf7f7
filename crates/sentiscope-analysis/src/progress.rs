//! Cosmetic staged progress for one in-flight analysis.
//!
//! The analyzer reports no real milestones, so the reporter walks a fixed
//! schedule of checkpoints on a timer. The only real synchronization point is
//! the gated checkpoint, which is held until the tracked call resolves.
//! Observers read the current [`ProgressState`] through a watch channel.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

/// What a progress display should show right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub percent: u8,
    pub phase_label: String,
    pub active: bool,
}

/// A percent/label pair, shown for `pause` before the schedule moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub percent: u8,
    pub label: String,
    pub pause: Duration,
}

impl Checkpoint {
    #[must_use]
    pub fn new(percent: u8, label: impl Into<String>, pause: Duration) -> Self {
        Self {
            percent: percent.min(100),
            label: label.into(),
            pause,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSchedule {
    /// Label shown at 0% as soon as tracking starts.
    pub initial_label: String,
    /// Walked while the call is in flight.
    pub before_call: Vec<Checkpoint>,
    /// Held until the call resolves; its pause is ignored.
    pub gate: Checkpoint,
    /// Walked only after the call succeeds.
    pub after_call: Vec<Checkpoint>,
}

impl Default for ProgressSchedule {
    fn default() -> Self {
        let ms = Duration::from_millis;
        Self {
            initial_label: "Initializing...".to_string(),
            before_call: vec![
                Checkpoint::new(10, "Fetching Reddit posts...", ms(500)),
                Checkpoint::new(25, "Searching subreddits...", ms(300)),
            ],
            gate: Checkpoint::new(40, "Processing posts...", Duration::ZERO),
            after_call: vec![
                Checkpoint::new(70, "Analyzing sentiment...", ms(400)),
                Checkpoint::new(90, "Generating insights...", ms(300)),
                Checkpoint::new(100, "Complete!", ms(200)),
            ],
        }
    }
}

/// Drives a [`ProgressSchedule`] alongside a tracked call.
///
/// Every [`track`](Self::track) call takes a fresh generation. Writes from an
/// older generation are discarded, so a superseded schedule that is still
/// sleeping can never overwrite the state of a newer request.
#[derive(Debug)]
pub struct ProgressReporter {
    schedule: ProgressSchedule,
    generation: AtomicU64,
    state: watch::Sender<ProgressState>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(ProgressSchedule::default())
    }
}

impl ProgressReporter {
    #[must_use]
    pub fn new(schedule: ProgressSchedule) -> Self {
        let (state, _) = watch::channel(ProgressState::default());
        Self {
            schedule,
            generation: AtomicU64::new(0),
            state,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> ProgressState {
        self.state.borrow().clone()
    }

    /// Await `call` while walking the schedule, then reset to the idle state.
    ///
    /// An `Err` from `call` skips every remaining checkpoint. The state is back
    /// at `{0, "", false}` by the time this returns, unless a newer `track`
    /// call has taken over in the meantime.
    pub async fn track<F, T, E>(&self, call: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _reset = ResetOnDrop {
            reporter: self,
            generation,
        };
        self.write(generation, |state| {
            *state = ProgressState {
                percent: 0,
                phase_label: self.schedule.initial_label.clone(),
                active: true,
            };
        });

        tokio::pin!(call);
        let mut early = None;

        for checkpoint in &self.schedule.before_call {
            self.advance(generation, checkpoint);
            tokio::select! {
                output = &mut call => {
                    early = Some(output);
                    break;
                }
                () = tokio::time::sleep(checkpoint.pause) => {}
            }
        }

        let output = match early {
            Some(output) => output,
            None => {
                self.advance(generation, &self.schedule.gate);
                call.await
            }
        };

        if output.is_ok() {
            // The call may have finished during the pre-call steps.
            self.advance(generation, &self.schedule.gate);
            for checkpoint in &self.schedule.after_call {
                self.advance(generation, checkpoint);
                tokio::time::sleep(checkpoint.pause).await;
            }
        }

        output
    }

    /// Move forward to `checkpoint`; percent never goes backwards.
    fn advance(&self, generation: u64, checkpoint: &Checkpoint) {
        self.write(generation, |state| {
            state.percent = state.percent.max(checkpoint.percent.min(100));
            state.phase_label.clone_from(&checkpoint.label);
            state.active = true;
        });
    }

    fn write(&self, generation: u64, update: impl FnOnce(&mut ProgressState)) {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            let before = state.clone();
            update(state);
            *state != before
        });
    }
}

/// Returns the reporter to idle when a `track` call ends, including when its
/// future is dropped before completion.
struct ResetOnDrop<'a> {
    reporter: &'a ProgressReporter,
    generation: u64,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.reporter
            .write(self.generation, |state| *state = ProgressState::default());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::{sleep, Instant};

    use super::*;

    async fn resolve_after<T, E>(delay: Duration, output: Result<T, E>) -> Result<T, E> {
        sleep(delay).await;
        output
    }

    fn record(reporter: &ProgressReporter) -> Arc<Mutex<Vec<ProgressState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut rx = reporter.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                sink.lock().unwrap().push(state);
            }
        });
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn success_walks_schedule_monotonically_then_resets() {
        let reporter = ProgressReporter::default();
        let seen = record(&reporter);

        let output = reporter
            .track(resolve_after(Duration::from_secs(2), Ok::<_, ()>("done")))
            .await;

        assert_eq!(output, Ok("done"));
        assert_eq!(reporter.current(), ProgressState::default());

        tokio::task::yield_now().await;
        let seen = seen.lock().unwrap().clone();
        let active: Vec<u8> = seen
            .iter()
            .take_while(|s| s.active)
            .map(|s| s.percent)
            .collect();
        assert!(
            active.windows(2).all(|w| w[0] <= w[1]),
            "percent went backwards: {active:?}"
        );
        assert!(active.contains(&40));
        assert!(active.contains(&100));
        assert!(seen.iter().any(|s| s.phase_label == "Complete!"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_resets_immediately() {
        let reporter = ProgressReporter::default();
        let started = Instant::now();

        let output = reporter
            .track(resolve_after(Duration::from_millis(100), Err::<(), _>("boom")))
            .await;

        assert_eq!(output, Err("boom"));
        assert_eq!(reporter.current(), ProgressState::default());
        assert!(
            started.elapsed() < Duration::from_millis(500),
            "failure should not wait out the schedule"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failure_after_gate_resets_without_post_steps() {
        let reporter = ProgressReporter::default();
        let seen = record(&reporter);

        let output = reporter
            .track(resolve_after(Duration::from_secs(3), Err::<(), _>("exit 1")))
            .await;

        assert!(output.is_err());
        assert_eq!(reporter.current(), ProgressState::default());
        tokio::task::yield_now().await;
        assert!(seen.lock().unwrap().iter().all(|s| s.percent <= 40));
    }

    #[tokio::test(start_paused = true)]
    async fn early_success_still_shows_remaining_checkpoints() {
        let reporter = ProgressReporter::default();
        let seen = record(&reporter);

        let output = reporter.track(async { Ok::<_, ()>(7) }).await;

        assert_eq!(output, Ok(7));
        assert_eq!(reporter.current(), ProgressState::default());
        tokio::task::yield_now().await;
        assert!(seen.lock().unwrap().iter().any(|s| s.percent == 100));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_schedule_cannot_overwrite_newer_request() {
        let reporter = ProgressReporter::default();

        let first = reporter.track(resolve_after(Duration::from_secs(1), Ok::<_, ()>(1)));
        let second = async {
            sleep(Duration::from_millis(100)).await;
            reporter
                .track(resolve_after(Duration::from_secs(5), Ok::<_, ()>(2)))
                .await
        };
        let probe = async {
            // The first schedule would be walking its post-call steps here.
            sleep(Duration::from_millis(1500)).await;
            reporter.current()
        };

        let (a, b, mid) = tokio::join!(first, second, probe);

        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(2));
        assert_eq!(
            mid,
            ProgressState {
                percent: 40,
                phase_label: "Processing posts...".to_string(),
                active: true,
            }
        );
        assert_eq!(reporter.current(), ProgressState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_track_returns_to_idle() {
        let reporter = ProgressReporter::default();

        let output = tokio::time::timeout(
            Duration::from_secs(2),
            reporter.track(resolve_after(Duration::from_secs(60), Ok::<_, ()>(()))),
        )
        .await;

        assert!(output.is_err(), "tracked call should have been cut off");
        assert_eq!(reporter.current(), ProgressState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_checkpoint_literal_is_capped() {
        let schedule = ProgressSchedule {
            initial_label: "Starting".to_string(),
            before_call: vec![Checkpoint {
                percent: 250,
                label: "Too far".to_string(),
                pause: Duration::from_millis(100),
            }],
            gate: Checkpoint::new(40, "Waiting", Duration::ZERO),
            after_call: Vec::new(),
        };
        let reporter = ProgressReporter::new(schedule);
        let seen = record(&reporter);

        let output = reporter
            .track(resolve_after(Duration::from_secs(1), Ok::<_, ()>(())))
            .await;

        assert!(output.is_ok());
        tokio::task::yield_now().await;
        let seen = seen.lock().unwrap().clone();
        assert!(seen.iter().any(|s| s.percent == 100));
        assert!(seen.iter().all(|s| s.percent <= 100), "{seen:?}");
    }

    #[test]
    fn checkpoint_percent_is_capped() {
        assert_eq!(Checkpoint::new(140, "over", Duration::ZERO).percent, 100);
    }
}
