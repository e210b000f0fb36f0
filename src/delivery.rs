//! Out-of-band delivery of advanced conversions.
//!
//! A delivery job runs on its own detached thread. It owns everything it
//! needs (its own extractor included) and never synchronizes with the caller
//! beyond reporting status on a channel. Nothing cancels a running job;
//! failures are logged and reported as [`JobStatus::Failed`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::error::{Error, Result};

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// A finished conversion addressed to a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Recipient address
    pub recipient: String,
    /// Attachment name, e.g. `report.md`
    pub file_name: String,
    /// Converted Markdown
    pub markdown: String,
}

impl Delivery {
    /// Attachment name derived from a source file name.
    pub fn attachment_name(source: Option<&str>) -> String {
        let stem = source
            .and_then(|name| name.split('.').next())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("content");
        format!("{}.md", stem)
    }
}

/// Sends finished conversions somewhere (email, queue, ...).
pub trait DeliverySink: Send + Sync {
    /// Deliver one result.
    fn deliver(&self, delivery: &Delivery) -> Result<()>;
}

/// Progress of a delivery job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Extraction or delivery in progress
    Running,
    /// The sink accepted the result
    Delivered,
    /// Extraction or delivery failed
    Failed(String),
}

impl JobStatus {
    /// Whether the job has stopped.
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Handle to a detached delivery job.
///
/// Dropping the handle does not stop the job.
#[derive(Debug)]
pub struct DeliveryJob {
    id: u64,
    status: JobStatus,
    updates: Receiver<JobStatus>,
}

impl DeliveryJob {
    /// Job identity, unique within the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Latest known status, without blocking.
    pub fn status(&mut self) -> &JobStatus {
        while let Ok(update) = self.updates.try_recv() {
            self.status = update;
        }
        &self.status
    }

    /// Wait up to `timeout` for the job to finish.
    pub fn wait(&mut self, timeout: Duration) -> JobStatus {
        if self.status().is_finished() {
            return self.status.clone();
        }
        loop {
            match self.updates.recv_timeout(timeout) {
                Ok(update) => {
                    self.status = update;
                    if self.status.is_finished() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    if !self.status.is_finished() {
                        self.status = JobStatus::Failed("job exited without reporting".to_string());
                    }
                    break;
                }
            }
        }
        self.status.clone()
    }
}

/// Start a detached job: run `produce`, then hand its Markdown to `sink`.
pub fn spawn_delivery<F>(
    sink: Arc<dyn DeliverySink>,
    recipient: String,
    file_name: String,
    produce: F,
) -> Result<DeliveryJob>
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    let id = NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = crossbeam_channel::unbounded();
    let _ = tx.send(JobStatus::Running);

    std::thread::Builder::new()
        .name(format!("deepdoc-delivery-{}", id))
        .spawn(move || {
            let outcome = produce().and_then(|markdown| {
                let delivery = Delivery {
                    recipient,
                    file_name,
                    markdown,
                };
                sink.deliver(&delivery)
            });
            let status = match outcome {
                Ok(()) => {
                    log::info!("Delivery job {} completed", id);
                    JobStatus::Delivered
                }
                Err(e) => {
                    log::error!("Delivery job {} failed: {}", id, e);
                    JobStatus::Failed(e.to_string())
                }
            };
            let _ = tx.send(status);
        })
        .map_err(|e| Error::Delivery(format!("cannot start job: {}", e)))?;

    log::debug!("Started delivery job {}", id);
    Ok(DeliveryJob {
        id,
        status: JobStatus::Running,
        updates: rx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<Delivery>>,
    }

    impl DeliverySink for Outbox {
        fn deliver(&self, delivery: &Delivery) -> Result<()> {
            self.sent.lock().unwrap().push(delivery.clone());
            Ok(())
        }
    }

    struct Rejecting;

    impl DeliverySink for Rejecting {
        fn deliver(&self, _delivery: &Delivery) -> Result<()> {
            Err(Error::Delivery("SMTP refused".into()))
        }
    }

    #[test]
    fn test_job_delivers() {
        let outbox = Arc::new(Outbox::default());
        let mut job = spawn_delivery(outbox.clone(), "a@b.c".into(), "doc.md".into(), || {
            Ok("# Done".to_string())
        })
        .unwrap();

        assert_eq!(job.wait(Duration::from_secs(5)), JobStatus::Delivered);
        let sent = outbox.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].markdown, "# Done");
        assert_eq!(sent[0].recipient, "a@b.c");
    }

    #[test]
    fn test_job_reports_failure() {
        let mut job =
            spawn_delivery(Arc::new(Rejecting), "a@b.c".into(), "doc.md".into(), || Ok(String::new()))
                .unwrap();
        assert!(matches!(job.wait(Duration::from_secs(5)), JobStatus::Failed(msg) if msg.contains("SMTP")));
    }

    #[test]
    fn test_extraction_failure_skips_sink() {
        let outbox = Arc::new(Outbox::default());
        let mut job = spawn_delivery(outbox.clone(), "a@b.c".into(), "doc.md".into(), || {
            Err(Error::PdfParse("bad xref".into()))
        })
        .unwrap();
        assert!(job.wait(Duration::from_secs(5)).is_finished());
        assert!(outbox.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_job_ids_unique() {
        let a = spawn_delivery(Arc::new(Rejecting), "x".into(), "y".into(), || Ok(String::new())).unwrap();
        let b = spawn_delivery(Arc::new(Rejecting), "x".into(), "y".into(), || Ok(String::new())).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_attachment_name() {
        assert_eq!(Delivery::attachment_name(Some("report.pdf")), "report.md");
        assert_eq!(Delivery::attachment_name(None), "content.md");
    }
}
