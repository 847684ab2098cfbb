//! Background writer applying word batches to a [`WordStore`].
//!
//! Learning dictionaries never block the input thread on storage. Batches are
//! sent over a channel to a named worker thread that applies them in order.
//! Storage failures are logged and dropped; the in-memory state stays
//! authoritative for the running session.

use std::sync::{mpsc, Arc};
use std::thread;

use tracing::{debug, warn};

use crate::error::Result;
use crate::word_store::{WordStore, WordUpdate};

enum Job {
    Apply { locale: String, batch: Vec<WordUpdate> },
    Sync(mpsc::Sender<()>),
}

pub(crate) struct StoreWriter {
    tx: Option<mpsc::Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StoreWriter {
    pub(crate) fn spawn(name: &str, store: Arc<dyn WordStore>) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || write_loop(rx, store))?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    fn send(&self, job: Job) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(job).is_ok())
    }

    pub(crate) fn submit(&self, locale: &str, batch: Vec<WordUpdate>) {
        let job = Job::Apply {
            locale: locale.to_string(),
            batch,
        };
        if !self.send(job) {
            warn!("store writer stopped; dropping batch");
        }
    }

    /// Block until every batch submitted so far has been applied.
    pub(crate) fn sync(&self) {
        let (done_tx, done_rx) = mpsc::channel();
        if self.send(Job::Sync(done_tx)) {
            let _ = done_rx.recv();
        }
    }
}

impl Drop for StoreWriter {
    // Drain queued batches and release the store before returning.
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("store writer panicked");
            }
        }
    }
}

fn write_loop(rx: mpsc::Receiver<Job>, store: Arc<dyn WordStore>) {
    while let Ok(job) = rx.recv() {
        match job {
            Job::Apply { locale, batch } => {
                debug!(entries = batch.len(), %locale, "writing learned words");
                if let Err(e) = store.apply(&locale, &batch) {
                    warn!("failed to persist learned words: {}", e);
                }
            }
            Job::Sync(done) => {
                let _ = done.send(());
            }
        }
    }
}
