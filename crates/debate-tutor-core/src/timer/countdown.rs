//! Single-flight, cancelable one-second countdown.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> (Paused | Expired) -> (reset/rebind) -> Stopped
//! ```
//!
//! Inside a tokio runtime, `start()` spawns one tick task driven by
//! `tokio::time::interval`. Outside a runtime nothing is spawned and the
//! caller is responsible for calling `tick()` once per second.
//!
//! Every arming of the tick task carries a generation number. The task
//! re-checks it under the state mutex before each decrement, and every
//! cancel (pause, reset, rebind, drop) bumps it under the same mutex, so a
//! tick that was already scheduled when the cancel happened never lands.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::events::Event;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub remaining_secs: u64,
    pub running: bool,
    /// Set when a running countdown reaches zero; cleared by the next
    /// start, reset or rebind.
    pub expired: bool,
}

#[derive(Debug)]
struct Inner {
    duration_secs: u64,
    state: TimerState,
    generation: u64,
}

impl Inner {
    fn stop(&mut self) {
        self.state.running = false;
        self.generation = self.generation.wrapping_add(1);
    }

    fn tick(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs == 0 {
            self.stop();
            self.state.expired = true;
            return Some(Event::TimerExpired { at: Utc::now() });
        }
        Some(Event::TimerTicked {
            remaining_secs: self.state.remaining_secs,
        })
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Countdown {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<Event>,
    ticker: Option<JoinHandle<()>>,
    period: Duration,
}

impl Countdown {
    /// A stopped countdown of `duration_secs`.
    pub fn new(duration_secs: u64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                duration_secs,
                state: TimerState {
                    remaining_secs: duration_secs,
                    running: false,
                    expired: false,
                },
                generation: 0,
            })),
            events,
            ticker: None,
            period: Duration::from_secs(1),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        lock(&self.inner).state
    }

    pub fn duration_secs(&self) -> u64 {
        lock(&self.inner).duration_secs
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Receive `TimerTicked` and `TimerExpired` events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down. No-op when already running or at zero.
    pub fn start(&mut self) -> Option<Event> {
        let (generation, remaining_secs) = {
            let mut inner = lock(&self.inner);
            if inner.state.running || inner.state.remaining_secs == 0 {
                return None;
            }
            inner.state.running = true;
            inner.state.expired = false;
            inner.generation = inner.generation.wrapping_add(1);
            (inner.generation, inner.state.remaining_secs)
        };
        self.spawn_ticker(generation);
        debug!(remaining_secs, "countdown started");
        Some(Event::TimerStarted {
            remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop ticking and keep the remaining time.
    pub fn pause(&mut self) -> Option<Event> {
        let remaining_secs = {
            let mut inner = lock(&self.inner);
            if !inner.state.running {
                return None;
            }
            inner.stop();
            inner.state.remaining_secs
        };
        self.abort_ticker();
        debug!(remaining_secs, "countdown paused");
        Some(Event::TimerPaused {
            remaining_secs,
            at: Utc::now(),
        })
    }

    /// Restore the full duration, stop, and clear expiry.
    pub fn reset(&mut self) -> Event {
        let duration_secs = self.duration_secs();
        self.rebind(duration_secs)
    }

    /// Bind a new duration; same as `reset` otherwise.
    pub fn rebind(&mut self, duration_secs: u64) -> Event {
        {
            let mut inner = lock(&self.inner);
            inner.stop();
            inner.duration_secs = duration_secs;
            inner.state = TimerState {
                remaining_secs: duration_secs,
                running: false,
                expired: false,
            };
        }
        self.abort_ticker();
        Event::TimerReset {
            remaining_secs: duration_secs,
            at: Utc::now(),
        }
    }

    /// Advance one second. Used directly when no tokio runtime drives the
    /// countdown; returns `None` while the runtime ticker is armed. Returns
    /// `TimerExpired` on the tick that reaches zero.
    pub fn tick(&self) -> Option<Event> {
        if self.ticker.is_some() {
            return None;
        }
        let mut inner = lock(&self.inner);
        let event = inner.tick();
        if let Some(ref e) = event {
            let _ = self.events.send(e.clone());
        }
        event
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn spawn_ticker(&mut self, generation: u64) {
        self.abort_ticker();
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no tokio runtime; countdown is driven by tick()");
            return;
        };

        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        let period = self.period;
        self.ticker = Some(handle.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                // Send under the lock: nothing is delivered after a cancel returns.
                let mut state = lock(&inner);
                if state.generation != generation {
                    break;
                }
                match state.tick() {
                    Some(e @ Event::TimerExpired { .. }) => {
                        debug!("countdown expired");
                        let _ = events.send(e);
                        break;
                    }
                    Some(e) => {
                        let _ = events.send(e);
                    }
                    None => break,
                }
            }
        }));
    }

    fn abort_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        lock(&self.inner).stop();
        self.abort_ticker();
    }
}
