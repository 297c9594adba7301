//! Background collection thread.
//!
//! A single worker that wakes on a timer (or an explicit poke), takes
//! the heap lock, and runs whatever collection the configured mode calls
//! for. Communication is a stop flag plus a condvar; collection itself
//! is fully serialized with foreground allocation through the heap
//! mutex, so there is mutual exclusion, never concurrent collection.

use crate::heap::Heap;
use crossbeam::atomic::AtomicCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

/// What the background thread is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcPhase {
    /// Waiting for the next tick.
    Idle,
    /// Holding the heap lock and collecting.
    Collecting,
}

/// Handle to the background collection thread.
///
/// Dropping the handle stops and joins the thread.
pub struct BackgroundCollector {
    stop: Arc<AtomicBool>,
    signal: Arc<(Mutex<()>, Condvar)>,
    phase: Arc<AtomicCell<GcPhase>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundCollector {
    /// Spawns the background thread for `heap`, ticking at the
    /// configured interval.
    pub fn start(heap: Heap) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let signal = Arc::new((Mutex::new(()), Condvar::new()));
        let phase = Arc::new(AtomicCell::new(GcPhase::Idle));
        let interval = heap.gc_config().background_interval;

        let thread_stop = Arc::clone(&stop);
        let thread_signal = Arc::clone(&signal);
        let thread_phase = Arc::clone(&phase);
        let handle = std::thread::Builder::new()
            .name("gc-background".to_string())
            .spawn(move || loop {
                {
                    let (lock, condvar) = &*thread_signal;
                    let guard = lock.lock().unwrap();
                    let _ = condvar.wait_timeout(guard, interval).unwrap();
                }
                if thread_stop.load(Ordering::Acquire) {
                    break;
                }
                thread_phase.store(GcPhase::Collecting);
                heap.background_tick();
                thread_phase.store(GcPhase::Idle);
            })
            .expect("failed to spawn gc background thread");

        BackgroundCollector {
            stop,
            signal,
            phase,
            handle: Some(handle),
        }
    }

    /// Current phase of the worker.
    pub fn phase(&self) -> GcPhase {
        self.phase.load()
    }

    /// True while the worker thread is running.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Wakes the worker immediately ("go collect now").
    pub fn request_collection(&self) {
        let (_lock, condvar) = &*self.signal;
        condvar.notify_all();
    }

    /// Stops the worker and joins it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        let (_lock, condvar) = &*self.signal;
        condvar.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BackgroundCollector {
    fn drop(&mut self) {
        self.shutdown();
    }
}
