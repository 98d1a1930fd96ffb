//! Offline report queue.
//!
//! Reports captured without connectivity are kept as a JSON list under one
//! session-store key and submitted later, in order, through a [`ReportSink`].
//! Reports the destination refuses outright are parked under a second key
//! so they cannot hold up the rest of the queue.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::logging::{log, log_queue_flush, obj, v_str, Domain, Level};
use crate::model::{HazardReport, NewReport};
use crate::session::SessionStore;

pub const QUEUE_KEY: &str = "offlineReports";
pub const REJECTED_KEY: &str = "offlineReportsRejected";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedReport {
    pub local_id: String,
    pub queued_at: DateTime<Utc>,
    pub report: NewReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedReport {
    pub queued: QueuedReport,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The destination refused the report itself; resending it unchanged
    /// fails the same way.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Transport or session problem; the report may go through later.
    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

/// Destination for queued reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit(&self, report: &NewReport) -> Result<HazardReport, SubmitError>;
}

#[derive(Debug, Default)]
pub struct FlushOutcome {
    pub submitted: Vec<HazardReport>,
    pub rejected: Vec<RejectedReport>,
    pub remaining: usize,
    pub error: Option<String>,
}

pub struct OfflineQueue<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> OfflineQueue<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn pending(&self) -> Result<Vec<QueuedReport>> {
        match self.store.get(QUEUE_KEY) {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).context("decoding offline queue"),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.pending()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Reports parked after a permanent rejection, oldest first.
    pub fn rejected(&self) -> Result<Vec<RejectedReport>> {
        match self.store.get(REJECTED_KEY) {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).context("decoding rejected reports"),
        }
    }

    /// Queues a report for later submission. Invalid reports are refused
    /// here rather than left to fail at the server.
    pub fn enqueue(&mut self, report: NewReport, now: DateTime<Utc>) -> Result<QueuedReport> {
        report.validate().map_err(|msg| anyhow!("invalid report: {}", msg))?;
        let mut id = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut id);
        let item = QueuedReport { local_id: hex::encode(id), queued_at: now, report };

        let mut items = self.pending()?;
        items.push(item.clone());
        self.save(&items)?;
        log(
            Level::Info,
            Domain::Queue,
            "enqueued",
            obj(&[("local_id", v_str(&item.local_id)), ("pending", serde_json::json!(items.len()))]),
        );
        Ok(item)
    }

    /// Submits queued reports oldest first. Accepted reports leave the
    /// queue; refused ones are parked and the flush moves on. The first
    /// transport failure stops the flush and leaves that report and
    /// everything behind it queued.
    pub async fn flush<K: ReportSink + ?Sized>(&mut self, sink: &K) -> Result<FlushOutcome> {
        let mut items = self.pending()?;
        let mut parked = self.rejected()?;
        let mut outcome = FlushOutcome::default();

        while let Some(item) = items.first() {
            match sink.submit(&item.report).await {
                Ok(created) => {
                    outcome.submitted.push(created);
                    items.remove(0);
                    self.save(&items)?;
                }
                Err(SubmitError::Rejected(reason)) => {
                    let queued = items.remove(0);
                    log(
                        Level::Warn,
                        Domain::Queue,
                        "report_rejected",
                        obj(&[("local_id", v_str(&queued.local_id)), ("reason", v_str(&reason))]),
                    );
                    let rejected = RejectedReport { queued, reason };
                    parked.push(rejected.clone());
                    // Park before dropping from the queue so a failed write never loses it.
                    self.save_rejected(&parked)?;
                    self.save(&items)?;
                    outcome.rejected.push(rejected);
                }
                Err(SubmitError::Unavailable(err)) => {
                    outcome.error = Some(err.to_string());
                    break;
                }
            }
        }

        outcome.remaining = items.len();
        log_queue_flush(
            outcome.submitted.len(),
            outcome.rejected.len(),
            outcome.remaining,
            outcome.error.as_deref(),
        );
        Ok(outcome)
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn save(&mut self, items: &[QueuedReport]) -> Result<()> {
        if items.is_empty() {
            return self.store.remove(QUEUE_KEY);
        }
        let raw = serde_json::to_string(items)?;
        self.store.set(QUEUE_KEY, &raw)
    }

    fn save_rejected(&mut self, items: &[RejectedReport]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.store.set(REJECTED_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeoPoint, HazardType, Role, Severity};
    use crate::session::{FileStore, MemoryStore};
    use std::sync::Mutex;

    /// Accepts reports until `fail_at` submissions have succeeded. Reports
    /// whose description contains "duplicate" are refused outright.
    struct MockSink {
        fail_at: Option<usize>,
        seen: Mutex<Vec<String>>,
    }

    impl MockSink {
        fn new(fail_at: Option<usize>) -> Self {
            Self { fail_at, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ReportSink for MockSink {
        async fn submit(&self, report: &NewReport) -> Result<HazardReport, SubmitError> {
            let mut seen = self.seen.lock().unwrap();
            if Some(seen.len()) == self.fail_at {
                return Err(anyhow!("network unreachable").into());
            }
            if report.description.contains("duplicate") {
                return Err(SubmitError::Rejected("duplicate report (409)".to_string()));
            }
            seen.push(report.description.clone());
            let id = seen.len().to_string();
            Ok(report.clone().into_report(id, "tester".into(), Role::Citizen, Utc::now()))
        }
    }

    fn report(description: &str) -> NewReport {
        NewReport {
            hazard_type: HazardType::HighWaves,
            description: description.to_string(),
            location: GeoPoint { lat: 15.29, lng: 73.91, address: "Colva Beach, Goa".into() },
            severity: Severity::High,
            media: None,
        }
    }

    #[tokio::test]
    async fn test_flush_submits_in_order_and_clears() {
        let mut queue = OfflineQueue::new(MemoryStore::new());
        for d in ["first", "second", "third"] {
            queue.enqueue(report(d), Utc::now()).unwrap();
        }
        let sink = MockSink::new(None);
        let outcome = queue.flush(&sink).await.unwrap();

        assert_eq!(outcome.submitted.len(), 3);
        assert_eq!(outcome.remaining, 0);
        assert!(outcome.error.is_none());
        assert_eq!(*sink.seen.lock().unwrap(), vec!["first", "second", "third"]);
        assert!(queue.into_store().get(QUEUE_KEY).is_none());
    }

    #[tokio::test]
    async fn test_flush_stops_at_first_failure() {
        let mut queue = OfflineQueue::new(MemoryStore::new());
        for d in ["first", "second", "third"] {
            queue.enqueue(report(d), Utc::now()).unwrap();
        }
        let outcome = queue.flush(&MockSink::new(Some(1))).await.unwrap();

        assert_eq!(outcome.submitted.len(), 1);
        assert_eq!(outcome.remaining, 2);
        assert_eq!(outcome.error.as_deref(), Some("network unreachable"));
        let left: Vec<_> = queue.pending().unwrap().into_iter().map(|q| q.report.description).collect();
        assert_eq!(left, vec!["second", "third"]);
    }

    #[tokio::test]
    async fn test_enqueue_refuses_invalid_report() {
        let mut queue = OfflineQueue::new(MemoryStore::new());
        let err = queue.enqueue(report("   "), Utc::now()).unwrap_err();
        assert!(err.to_string().contains("description is required"));
        queue.enqueue(report("real flooding"), Utc::now()).unwrap();
        assert_eq!(queue.len().unwrap(), 1);

        let outcome = queue.flush(&MockSink::new(None)).await.unwrap();
        assert_eq!(outcome.submitted.len(), 1);
        assert_eq!(outcome.remaining, 0);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_refused_report_is_parked_and_flush_continues() {
        let mut queue = OfflineQueue::new(MemoryStore::new());
        for d in ["first", "duplicate of first", "third"] {
            queue.enqueue(report(d), Utc::now()).unwrap();
        }
        let sink = MockSink::new(None);
        let outcome = queue.flush(&sink).await.unwrap();

        assert_eq!(outcome.submitted.len(), 2);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.remaining, 0);
        assert!(outcome.error.is_none());
        assert_eq!(*sink.seen.lock().unwrap(), vec!["first", "third"]);

        let parked = queue.rejected().unwrap();
        assert_eq!(parked.len(), 1);
        assert_eq!(parked[0].queued.report.description, "duplicate of first");
        assert_eq!(parked[0].reason, "duplicate report (409)");
        assert!(queue.is_empty().unwrap());

        let again = queue.flush(&sink).await.unwrap();
        assert!(again.submitted.is_empty() && again.rejected.is_empty());
        assert_eq!(queue.rejected().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_flush_empty_queue() {
        let mut queue = OfflineQueue::new(MemoryStore::new());
        let outcome = queue.flush(&MockSink::new(Some(0))).await.unwrap();
        assert!(outcome.submitted.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_queue_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        {
            let mut queue = OfflineQueue::new(FileStore::open(&path).unwrap());
            queue.enqueue(report("kept"), Utc::now()).unwrap();
        }
        let queue = OfflineQueue::new(FileStore::open(&path).unwrap());
        let pending = queue.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].report.description, "kept");
    }

    #[test]
    fn test_corrupt_queue_is_an_error() {
        let mut store = MemoryStore::new();
        store.set(QUEUE_KEY, "{not json").unwrap();
        assert!(OfflineQueue::new(store).pending().is_err());
    }
}
