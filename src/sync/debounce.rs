//! Per-item debounce over an injected timer source.
//!
//! Each key owns at most one armed timer: arming again cancels and replaces
//! the previous one, so a burst of edits collapses into a single callback
//! after the quiet period. The timer source is a trait so the state machine
//! runs against a logical clock in native tests and `window.setTimeout` in
//! the browser.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use wasm_bindgen::JsCast;

pub(crate) type TimerId = i32;

pub(crate) trait Scheduler: Send + Sync {
    fn schedule(&self, delay_ms: i32, f: Box<dyn FnOnce() + Send>) -> TimerId;
    fn cancel(&self, id: TimerId);
}

/// `window.setTimeout`-backed scheduler for the browser runtime.
pub(crate) struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay_ms: i32, f: Box<dyn FnOnce() + Send>) -> TimerId {
        let Some(win) = web_sys::window() else {
            return 0;
        };

        let cb = wasm_bindgen::closure::Closure::once_into_js(move || f());
        win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), delay_ms)
            .unwrap_or(0)
    }

    fn cancel(&self, id: TimerId) {
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(id);
        }
    }
}

/// Idle/Armed debounce machine, one state per key.
#[derive(Clone)]
pub(crate) struct Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    quiet_ms: i32,
    scheduler: Arc<dyn Scheduler>,
    timers: Arc<Mutex<HashMap<K, TimerId>>>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(scheduler: Arc<dyn Scheduler>, quiet_ms: i32) -> Self {
        Self {
            quiet_ms,
            scheduler,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Armed → Armed (cancel-and-restart) or Idle → Armed.
    ///
    /// `f` runs once the quiet period elapses with no further `arm` for the
    /// same key; the key transitions back to Idle before `f` runs, so `f`
    /// may re-arm.
    pub fn arm(&self, key: K, f: impl FnOnce() + Send + 'static) {
        if let Ok(mut map) = self.timers.lock() {
            if let Some(prev) = map.remove(&key) {
                self.scheduler.cancel(prev);
            }
        }

        let timers = Arc::clone(&self.timers);
        let key2 = key.clone();
        let id = self.scheduler.schedule(
            self.quiet_ms,
            Box::new(move || {
                if let Ok(mut map) = timers.lock() {
                    map.remove(&key2);
                }
                f();
            }),
        );

        if let Ok(mut map) = self.timers.lock() {
            map.insert(key, id);
        }
    }

    /// Armed → Idle without firing. Returns whether a timer was pending.
    pub fn cancel(&self, key: &K) -> bool {
        let removed = self.timers.lock().ok().and_then(|mut map| map.remove(key));
        match removed {
            Some(id) => {
                self.scheduler.cancel(id);
                true
            }
            None => false,
        }
    }

    /// Teardown: drop every pending timer so no callback runs against
    /// unmounted state.
    pub fn cancel_all(&self) {
        let drained: Vec<TimerId> = self
            .timers
            .lock()
            .map(|mut map| map.drain().map(|(_, id)| id).collect())
            .unwrap_or_default();
        for id in drained {
            self.scheduler.cancel(id);
        }
    }

    pub fn is_armed(&self, key: &K) -> bool {
        self.timers
            .lock()
            .map(|map| map.contains_key(key))
            .unwrap_or(false)
    }

    /// Keys with a pending timer. Reconciliation skips these so a server
    /// snapshot never clobbers an edit that has not been flushed yet.
    pub fn armed_keys(&self) -> Vec<K> {
        self.timers
            .lock()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};

    /// Logical-clock scheduler: timers fire only when the test advances time.
    pub(crate) struct FakeScheduler {
        now: AtomicI64,
        next_id: AtomicI32,
        #[allow(clippy::type_complexity)]
        pending: Mutex<Vec<(TimerId, i64, Box<dyn FnOnce() + Send>)>>,
    }

    impl FakeScheduler {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                now: AtomicI64::new(0),
                next_id: AtomicI32::new(1),
                pending: Mutex::new(Vec::new()),
            })
        }

        pub fn now(&self) -> i64 {
            self.now.load(Ordering::Relaxed)
        }

        pub fn pending_count(&self) -> usize {
            self.pending.lock().map(|p| p.len()).unwrap_or(0)
        }

        /// Fire all timers due at or before `target`, in fire-time order.
        /// Callbacks run outside the pending lock so they may schedule or
        /// cancel further timers.
        pub fn advance_to(&self, target: i64) {
            loop {
                let next = {
                    let pending = self.pending.lock().expect("scheduler lock");
                    pending
                        .iter()
                        .enumerate()
                        .filter(|(_, (_, at, _))| *at <= target)
                        .min_by_key(|(_, (id, at, _))| (*at, *id))
                        .map(|(idx, _)| idx)
                };

                let Some(idx) = next else {
                    break;
                };

                let (_, at, f) = self.pending.lock().expect("scheduler lock").remove(idx);
                self.now.store(at, Ordering::Relaxed);
                f();
            }
            self.now.store(target, Ordering::Relaxed);
        }

        pub fn advance(&self, dt: i64) {
            self.advance_to(self.now() + dt);
        }
    }

    impl Scheduler for FakeScheduler {
        fn schedule(&self, delay_ms: i32, f: Box<dyn FnOnce() + Send>) -> TimerId {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if let Ok(mut pending) = self.pending.lock() {
                pending.push((id, self.now() + i64::from(delay_ms), f));
            }
            id
        }

        fn cancel(&self, id: TimerId) {
            if let Ok(mut pending) = self.pending.lock() {
                pending.retain(|(tid, _, _)| *tid != id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeScheduler;
    use super::*;

    const QUIET_MS: i32 = 800;

    type Recorder = Arc<Mutex<Vec<(i64, String)>>>;

    fn recorder() -> (Recorder, Arc<FakeScheduler>) {
        (Arc::new(Mutex::new(Vec::new())), FakeScheduler::new())
    }

    #[test]
    fn test_rapid_edits_coalesce_into_one_fire() {
        let (fired, sched) = recorder();
        let d: Debouncer<usize> = Debouncer::new(sched.clone(), QUIET_MS);

        // Edits at t=0, 100, 200; quiet period 800ms.
        for (t, val) in [(0, "v0"), (100, "v1"), (200, "v2")] {
            sched.advance_to(t);
            let fired2 = Arc::clone(&fired);
            let sched2 = Arc::clone(&sched);
            d.arm(0, move || {
                fired2
                    .lock()
                    .expect("recorder lock")
                    .push((sched2.now(), val.to_string()));
            });
        }

        sched.advance_to(5_000);

        // Exactly one fire, at ~1000ms, carrying the latest value.
        let fired = fired.lock().expect("recorder lock");
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0], (1_000, "v2".to_string()));
    }

    #[test]
    fn test_armed_then_fire_returns_to_idle() {
        let (fired, sched) = recorder();
        let d: Debouncer<usize> = Debouncer::new(sched.clone(), QUIET_MS);

        let fired2 = Arc::clone(&fired);
        d.arm(7, move || {
            fired2
                .lock()
                .expect("recorder lock")
                .push((0, "x".to_string()));
        });
        assert!(d.is_armed(&7));

        sched.advance(i64::from(QUIET_MS));
        assert!(!d.is_armed(&7));
        assert_eq!(fired.lock().expect("recorder lock").len(), 1);
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let (fired, sched) = recorder();
        let d: Debouncer<usize> = Debouncer::new(sched.clone(), QUIET_MS);

        let fired2 = Arc::clone(&fired);
        d.arm(1, move || {
            fired2
                .lock()
                .expect("recorder lock")
                .push((0, "late".to_string()));
        });

        assert!(d.cancel(&1));
        assert!(!d.is_armed(&1));
        assert!(!d.cancel(&1));

        sched.advance_to(10_000);
        assert!(fired.lock().expect("recorder lock").is_empty());
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let (fired, sched) = recorder();
        let d: Debouncer<usize> = Debouncer::new(sched.clone(), QUIET_MS);

        for key in [1usize, 2] {
            let fired2 = Arc::clone(&fired);
            d.arm(key, move || {
                fired2
                    .lock()
                    .expect("recorder lock")
                    .push((0, format!("k{key}")));
            });
        }

        // Cancelling one key leaves the other armed.
        d.cancel(&1);
        sched.advance_to(1_000);

        let fired = fired.lock().expect("recorder lock");
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, "k2");
    }

    #[test]
    fn test_cancel_all_drops_everything() {
        let (fired, sched) = recorder();
        let d: Debouncer<usize> = Debouncer::new(sched.clone(), QUIET_MS);

        for key in 0..4usize {
            let fired2 = Arc::clone(&fired);
            d.arm(key, move || {
                fired2
                    .lock()
                    .expect("recorder lock")
                    .push((0, key.to_string()));
            });
        }
        assert_eq!(d.armed_keys().len(), 4);

        d.cancel_all();
        sched.advance_to(10_000);

        assert!(fired.lock().expect("recorder lock").is_empty());
        assert!(d.armed_keys().is_empty());
    }

    #[test]
    fn test_callback_may_rearm() {
        let (fired, sched) = recorder();
        let d: Debouncer<usize> = Debouncer::new(sched.clone(), QUIET_MS);

        let fired2 = Arc::clone(&fired);
        let d2 = d.clone();
        let sched2 = Arc::clone(&sched);
        d.arm(0, move || {
            fired2
                .lock()
                .expect("recorder lock")
                .push((sched2.now(), "first".to_string()));
            let fired3 = Arc::clone(&fired2);
            let sched3 = Arc::clone(&sched2);
            d2.arm(0, move || {
                fired3
                    .lock()
                    .expect("recorder lock")
                    .push((sched3.now(), "second".to_string()));
            });
        });

        sched.advance_to(2_000);
        let fired = fired.lock().expect("recorder lock");
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0], (800, "first".to_string()));
        assert_eq!(fired[1], (1_600, "second".to_string()));
    }
}
