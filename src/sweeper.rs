//! Background expiry worker.
//!
//! One named thread per cache instance wakes on a `crossbeam` ticker and
//! runs a sweep callback. The callback returns `false` once the cache it
//! serves is gone, which also ends the thread.
//!
//! ```text
//!   ┌──────────────┐  tick(interval)  ┌──────────────────────────────┐
//!   │ ticker chan  │ ───────────────► │ select! {                    │
//!   └──────────────┘                  │   tick  => sweep() or exit   │
//!   ┌──────────────┐   disconnect     │   stop  => exit              │
//!   │ stop sender  │ ───────────────► │ }                            │
//!   └──────────────┘                  └──────────────────────────────┘
//! ```
//!
//! `stop` drops the sender and joins the thread. It is idempotent, and when
//! called from the worker thread itself (a listener closing its own cache)
//! it skips the join.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use crossbeam::select;
use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug)]
pub struct Sweeper {
    name: String,
    stop_tx: Mutex<Option<Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Spawns a worker that calls `sweep` every `interval` until stopped or
    /// until `sweep` returns `false`.
    pub fn spawn<F>(name: &str, interval: Duration, mut sweep: F) -> io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let thread_name = format!("evictkit-{name}-sweeper");
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let ticker = channel::tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if !sweep() {
                                break;
                            }
                        },
                        recv(stop_rx) -> _ => break,
                    }
                }
            })?;
        debug!(sweeper = %thread_name, ?interval, "expiry sweeper started");

        Ok(Self {
            name: thread_name,
            stop_tx: Mutex::new(Some(stop_tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// `true` until `stop` has been called.
    pub fn is_running(&self) -> bool {
        self.stop_tx.lock().is_some()
    }

    /// Signals the worker and waits for it to exit. Later calls do nothing.
    pub fn stop(&self) {
        let Some(stop_tx) = self.stop_tx.lock().take() else {
            return;
        };
        drop(stop_tx);

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                // A panicking sweep already unwound the worker; nothing to recover.
                let _ = handle.join();
            }
        }
        debug!(sweeper = %self.name, "expiry sweeper stopped");
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
