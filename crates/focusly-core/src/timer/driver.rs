//! Periodic driver for [`PomodoroEngine`].
//!
//! Owns the engine and at most one ticker task calling `tick()` every
//! period (one second by default). Each armed ticker carries a generation
//! number; a tick from any other generation is dropped under the lock, so
//! nothing mutates the engine after `pause()`, `reset()` or drop returns.
//!
//! Subscribers get discrete [`Event`]s through a broadcast channel and the
//! latest [`TimerSnapshot`] through a watch channel.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::engine::{PomodoroEngine, TimerSnapshot};
use crate::events::Event;

const EVENT_CAPACITY: usize = 64;

struct Inner {
    engine: PomodoroEngine,
    generation: u64,
}

struct Shared {
    inner: Mutex<Inner>,
    events: broadcast::Sender<Event>,
    snapshots: watch::Sender<TimerSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish the outcome of an engine call made while holding `inner`.
    fn publish(&self, inner: &Inner, event: Option<&Event>) {
        let snapshot = inner.engine.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        if let Some(event) = event {
            // No receivers is fine.
            let _ = self.events.send(event.clone());
        }
    }
}

pub struct TimerDriver {
    shared: Arc<Shared>,
    ticker: Option<JoinHandle<()>>,
    period: Duration,
}

impl TimerDriver {
    pub fn new(engine: PomodoroEngine) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (snapshots, _) = watch::channel(engine.snapshot());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    engine,
                    generation: 0,
                }),
                events,
                snapshots,
            }),
            ticker: None,
            period: Duration::from_secs(1),
        }
    }

    /// Tick every `period` instead of every second.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    pub fn watch(&self) -> watch::Receiver<TimerSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.shared.lock().engine.snapshot()
    }

    /// Whether a ticker task is currently alive.
    pub fn is_armed(&self) -> bool {
        self.ticker.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the countdown and arm the ticker.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn start(&mut self) -> Option<Event> {
        let (event, generation) = {
            let mut inner = self.shared.lock();
            let event = inner.engine.start();
            if event.is_some() {
                inner.generation += 1;
            }
            self.shared.publish(&inner, event.as_ref());
            (event, inner.generation)
        };
        if event.is_some() {
            self.arm(generation);
        }
        event
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.with_disarm(PomodoroEngine::pause);
        self.disarm();
        event
    }

    /// Start when stopped, pause when running.
    pub fn toggle(&mut self) -> Option<Event> {
        if self.shared.lock().engine.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    /// End the current phase. A running ticker survives only when the
    /// engine keeps running into the next phase.
    pub fn skip(&mut self) -> Option<Event> {
        let armed = self.is_armed();
        let (event, running, generation) = {
            let mut inner = self.shared.lock();
            let event = inner.engine.skip();
            let running = inner.engine.is_running();
            if !running || !armed {
                inner.generation += 1;
            }
            self.shared.publish(&inner, event.as_ref());
            (event, running, inner.generation)
        };
        if !running {
            self.disarm();
        } else if !armed {
            self.arm(generation);
        }
        event
    }

    pub fn reset(&mut self) -> Option<Event> {
        let event = self.with_disarm(PomodoroEngine::reset);
        self.disarm();
        event
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn with_disarm(&self, op: fn(&mut PomodoroEngine) -> Option<Event>) -> Option<Event> {
        let mut inner = self.shared.lock();
        let event = op(&mut inner.engine);
        inner.generation += 1;
        self.shared.publish(&inner, event.as_ref());
        event
    }

    fn arm(&mut self, generation: u64) {
        self.disarm();
        let shared = Arc::clone(&self.shared);
        let period = self.period;
        self.ticker = Some(tokio::spawn(run_ticker(shared, generation, period)));
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.shared.lock().generation += 1;
        self.disarm();
    }
}

async fn run_ticker(shared: Arc<Shared>, generation: u64, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        interval.tick().await;

        let keep_going = {
            let mut inner = shared.lock();
            if inner.generation != generation {
                false
            } else {
                let event = inner.engine.tick();
                shared.publish(&inner, event.as_ref());
                inner.engine.is_running()
            }
        };
        if !keep_going {
            tracing::debug!(generation, "ticker stopped");
            return;
        }
    }
}
