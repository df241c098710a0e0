use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the two run counters.
///
/// While discovery is still running `found` may still be rising, so a
/// transient snapshot says nothing final; once every category page has been
/// counted, `imported <= found` holds for every later snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub found: u64,
    pub imported: u64,
}

/// Observer for progress pushes.
///
/// Called synchronously on the task that performed the mutation, so
/// implementations must not block for long — a slow observer stalls the
/// producing task's progress reporting.
pub trait ProgressObserver: Send + Sync {
    fn publish(&self, snapshot: ProgressSnapshot);
}

impl<F> ProgressObserver for F
where
    F: Fn(ProgressSnapshot) + Send + Sync,
{
    fn publish(&self, snapshot: ProgressSnapshot) {
        self(snapshot)
    }
}

/// Observer that discards every push.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn publish(&self, _snapshot: ProgressSnapshot) {}
}

const FOUND_UNIT: u64 = 1 << 32;
const IMPORTED_MASK: u64 = FOUND_UNIT - 1;

/// Thread-safe found/imported counter pair for one import run.
///
/// Both counters live in a single `AtomicU64` (found in the high 32 bits,
/// imported in the low 32), so every mutation is one `fetch_add` and every
/// snapshot one `load` — a snapshot can never pair a fresh `found` with a
/// stale `imported` or vice versa. Each mutation publishes the exact state
/// it produced, computed from the `fetch_add` return value, so concurrent
/// publishers never report each other's state.
///
/// One instance per run, passed explicitly to every collaborator.
pub struct ProgressCounter {
    state: AtomicU64,
    observer: Box<dyn ProgressObserver>,
}

impl ProgressCounter {
    pub fn new(observer: impl ProgressObserver + 'static) -> Self {
        ProgressCounter {
            state: AtomicU64::new(0),
            observer: Box::new(observer),
        }
    }

    /// Record `n` newly discovered decks and publish.
    pub fn add_found(&self, n: u64) {
        let previous = self.state.fetch_add(n * FOUND_UNIT, Ordering::SeqCst);
        self.observer.publish(unpack(previous + n * FOUND_UNIT));
    }

    /// Record one successfully imported deck and publish.
    pub fn increment_imported(&self) {
        let previous = self.state.fetch_add(1, Ordering::SeqCst);
        self.observer.publish(unpack(previous + 1));
    }

    /// Atomic read of both counters as one pair.
    pub fn snapshot(&self) -> ProgressSnapshot {
        unpack(self.state.load(Ordering::SeqCst))
    }
}

fn unpack(state: u64) -> ProgressSnapshot {
    ProgressSnapshot {
        found: state >> 32,
        imported: state & IMPORTED_MASK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn counters_accumulate_and_snapshot_together() {
        let progress = ProgressCounter::new(NullObserver);

        progress.add_found(5);
        progress.increment_imported();
        progress.increment_imported();

        assert_eq!(
            progress.snapshot(),
            ProgressSnapshot {
                found: 5,
                imported: 2
            }
        );
    }

    #[test]
    fn every_mutation_publishes_its_own_state() {
        let published = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&published);
        let progress =
            ProgressCounter::new(move |snapshot: ProgressSnapshot| sink.lock().unwrap().push(snapshot));

        progress.add_found(3);
        progress.increment_imported();
        progress.add_found(0);

        let published = published.lock().unwrap();
        assert_eq!(
            *published,
            vec![
                ProgressSnapshot {
                    found: 3,
                    imported: 0
                },
                ProgressSnapshot {
                    found: 3,
                    imported: 1
                },
                // add_found(0) still publishes a baseline report
                ProgressSnapshot {
                    found: 3,
                    imported: 1
                },
            ]
        );
    }

    #[test]
    fn concurrent_mutation_is_never_torn() {
        let progress = Arc::new(ProgressCounter::new(NullObserver));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let progress = Arc::clone(&progress);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    progress.add_found(1);
                    progress.increment_imported();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            progress.snapshot(),
            ProgressSnapshot {
                found: 4000,
                imported: 4000
            }
        );
    }

    #[test]
    fn imported_never_exceeds_found_in_any_published_snapshot() {
        // Mirrors the pipeline's causal order: found is raised before the
        // corresponding imports can happen.
        let published = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&published);
        let progress = Arc::new(ProgressCounter::new(move |snapshot: ProgressSnapshot| {
            sink.lock().unwrap().push(snapshot)
        }));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let progress = Arc::clone(&progress);
            handles.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    progress.add_found(1);
                    progress.increment_imported();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for snapshot in published.lock().unwrap().iter() {
            assert!(snapshot.imported <= snapshot.found);
        }
    }
}
