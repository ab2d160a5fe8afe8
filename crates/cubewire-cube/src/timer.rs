//! Per-channel command timer.
//!
//! Issuing a timed command is one critical section: cancel whatever is
//! armed, write the new command, then arm for its duration. Expiry runs on a
//! short-lived thread that waits on a cancellation channel; dropping the
//! sender cancels it. Each arm bumps a generation counter, so an expiry that
//! lost the race with a newer command never clears the newer state.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use cubewire_transport::CharacteristicId;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{CubeError, Result};

/// Observable timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed { expires_at: Instant },
}

#[derive(Default)]
struct Slot {
    generation: u64,
    armed: Option<Armed>,
}

struct Armed {
    expires_at: Instant,
    _cancel: mpsc::Sender<()>,
}

pub struct CommandTimer {
    channel: CharacteristicId,
    slot: Arc<Mutex<Slot>>,
}

impl CommandTimer {
    pub fn new(channel: CharacteristicId) -> Self {
        Self {
            channel,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn state(&self) -> TimerState {
        match &self.slot.lock().armed {
            Some(armed) if armed.expires_at > Instant::now() => TimerState::Armed {
                expires_at: armed.expires_at,
            },
            _ => TimerState::Idle,
        }
    }

    /// Cancel the armed timer, if any. Returns whether one was armed.
    pub fn cancel(&self) -> bool {
        let cancelled = self.slot.lock().armed.take().is_some();
        if cancelled {
            debug!(channel = %self.channel, "command timer cancelled");
        }
        cancelled
    }

    /// Cancel any pending timer, run `send`, and arm for the duration it
    /// returns. A zero duration leaves the timer idle.
    ///
    /// Concurrent callers are serialized, so the timer always reflects the
    /// last command that was actually written.
    pub fn issue<F>(&self, send: F) -> Result<()>
    where
        F: FnOnce() -> Result<Duration>,
    {
        let mut slot = self.slot.lock();
        if slot.armed.take().is_some() {
            debug!(channel = %self.channel, "pending command timer superseded");
        }

        let duration = send()?;
        if duration.is_zero() {
            return Ok(());
        }

        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let weak = Arc::downgrade(&self.slot);
        let channel = self.channel;

        thread::Builder::new()
            .name(format!("cubewire-{channel}-timer"))
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(duration) {
                    expire(&weak, channel, generation);
                }
            })
            .map_err(CubeError::Timer)?;

        slot.armed = Some(Armed {
            expires_at: Instant::now() + duration,
            _cancel: cancel_tx,
        });
        trace!(%channel, ?duration, "command timer armed");
        Ok(())
    }
}

fn expire(slot: &Weak<Mutex<Slot>>, channel: CharacteristicId, generation: u64) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let mut slot = slot.lock();
    if slot.generation == generation && slot.armed.take().is_some() {
        debug!(%channel, "command timer expired");
    }
}

impl std::fmt::Debug for CommandTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTimer")
            .field("channel", &self.channel)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn wait_for_idle(timer: &CommandTimer, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if timer.state() == TimerState::Idle {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn zero_duration_stays_idle() {
        let timer = CommandTimer::new(CharacteristicId::Light);
        timer.issue(|| Ok(Duration::ZERO)).unwrap();
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn arms_and_expires() {
        let timer = CommandTimer::new(CharacteristicId::Light);
        timer.issue(|| Ok(Duration::from_millis(40))).unwrap();
        assert!(matches!(timer.state(), TimerState::Armed { .. }));
        assert!(wait_for_idle(&timer, Duration::from_secs(2)));
    }

    #[test]
    fn new_command_replaces_pending_timer() {
        let timer = CommandTimer::new(CharacteristicId::Motor);
        timer.issue(|| Ok(Duration::from_millis(30))).unwrap();
        timer.issue(|| Ok(Duration::from_secs(30))).unwrap();

        thread::sleep(Duration::from_millis(120));
        let TimerState::Armed { expires_at } = timer.state() else {
            panic!("stale expiry must not clear the newer timer");
        };
        assert!(expires_at > Instant::now() + Duration::from_secs(20));
    }

    #[test]
    fn cancel_reports_whether_armed() {
        let timer = CommandTimer::new(CharacteristicId::Sound);
        assert!(!timer.cancel());
        timer.issue(|| Ok(Duration::from_secs(5))).unwrap();
        assert!(timer.cancel());
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn failed_send_cancels_and_does_not_arm() {
        let timer = CommandTimer::new(CharacteristicId::Light);
        timer.issue(|| Ok(Duration::from_secs(5))).unwrap();
        let err = timer
            .issue(|| Err(CubeError::Cancelled))
            .unwrap_err();
        assert!(matches!(err, CubeError::Cancelled));
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn concurrent_issues_leave_one_timer() {
        let timer = Arc::new(CommandTimer::new(CharacteristicId::Motor));
        let sends = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let timer = Arc::clone(&timer);
                let sends = Arc::clone(&sends);
                thread::spawn(move || {
                    timer
                        .issue(|| {
                            sends.fetch_add(1, Ordering::SeqCst);
                            Ok(Duration::from_secs(10))
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sends.load(Ordering::SeqCst), 8);
        assert!(matches!(timer.state(), TimerState::Armed { .. }));
        assert!(timer.cancel());
        assert!(!timer.cancel());
    }
}
