//! Storage sink - drains the storage queue into a JSONL file
//!
//! Records are written one JSON object per line to the file configured in
//! `[storage]`. Write failures are logged and the record is dropped; the
//! queue is never blocked on the filesystem.

use crate::domain::types::StorageRecord;
use crate::infra::metrics::Metrics;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// Sink consuming the storage queue
pub struct StorageSink {
    file_path: String,
    metrics: Arc<Metrics>,
}

impl StorageSink {
    pub fn new(file_path: &str, metrics: Arc<Metrics>) -> Self {
        info!(file_path = %file_path, "storage_sink_initialized");
        Self { file_path: file_path.to_string(), metrics }
    }

    /// Write a record to the storage file.
    /// Returns true if successful, false otherwise.
    pub fn write_record(&self, record: &StorageRecord) -> bool {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                error!(topic = %record.topic, error = %e, "record_encode_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => {
                self.metrics.record_record_stored();
                debug!(topic = %record.topic, bytes = %json.len(), "record_stored");
                true
            }
            Err(e) => {
                error!(topic = %record.topic, error = %e, "record_store_failed");
                false
            }
        }
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;

        Ok(())
    }

    /// Drain the storage queue until shutdown, flushing remaining records
    /// before returning.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<StorageRecord>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        while let Ok(record) = rx.try_recv() {
                            self.write_record(&record);
                        }
                        info!("storage_sink_shutdown");
                        return;
                    }
                }
                record = rx.recv() => {
                    match record {
                        Some(record) => { self.write_record(&record); }
                        None => return, // all producers gone
                    }
                }
            }
        }
    }
}
