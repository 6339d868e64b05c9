//! Background cleanup worker for the disk tier
//!
//! A dedicated thread wipes and rebuilds the store on a fixed period. The
//! worker is daemon-like: it never blocks shutdown. `stop()` signals the
//! thread, waits a bounded grace period for an in-flight wipe to finish, and
//! detaches the thread if it does not.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use super::DiskShared;

/// How long `stop()` waits for an in-flight cleanup before detaching.
pub(crate) const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub(crate) struct CleanupWorker {
    shutdown: Sender<()>,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl CleanupWorker {
    /// Spawn the worker; it wipes the store every `interval` until stopped.
    pub(crate) fn spawn(
        shared: Arc<DiskShared>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let (done_tx, done_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("permafrost-disk-cleanup".to_string())
            .spawn(move || {
                run(shared, interval, shutdown_rx);
                let _ = done_tx.send(());
            })?;

        Ok(Self {
            shutdown: shutdown_tx,
            done: done_rx,
            handle: Some(handle),
        })
    }

    /// Signal shutdown and wait up to [`SHUTDOWN_GRACE`] for the worker.
    pub(crate) fn stop(mut self) {
        let _ = self.shutdown.try_send(());
        match self.done.recv_timeout(SHUTDOWN_GRACE) {
            Ok(()) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
            }
            Err(_) => {
                log::warn!(
                    "disk cleanup worker did not stop within {:?}; detaching",
                    SHUTDOWN_GRACE
                );
                self.handle.take();
            }
        }
    }
}

fn run(shared: Arc<DiskShared>, interval: Duration, shutdown: Receiver<()>) {
    loop {
        match shutdown.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => match shared.run_cleanup() {
                Ok(()) => log::debug!("disk tier wiped by scheduled cleanup"),
                Err(err) => log::warn!("scheduled disk cleanup failed: {}", err),
            },
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
