//! The consumer loop.
//!
//! Pulls batches from the work queue, dispatches each message
//! independently, and acknowledges every delivery exactly once: successful
//! jobs, failed jobs (per the failure policy), and rejected messages all
//! leave the queue. The only retried failure class is the receive call
//! itself, which backs off and tries again.

use std::sync::Arc;

use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

use pixmill_models::{decode, Decoded, TransformJob};
use pixmill_queue::{Message, WorkQueue};
use pixmill_storage::ObjectStore;
use pixmill_transform::render;

use crate::config::{FailurePolicy, WorkerConfig};
use crate::error::{WorkerError, WorkerResult};
use crate::events::{EventSink, JobEvent};

/// Consumer loop over injected queue/store/sink handles.
pub struct ConsumerLoop {
    config: WorkerConfig,
    queue: Arc<dyn WorkQueue>,
    store: Arc<dyn ObjectStore>,
    events: Arc<dyn EventSink>,
    job_semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
}

impl ConsumerLoop {
    /// Create a new consumer loop.
    pub fn new(
        config: WorkerConfig,
        queue: Arc<dyn WorkQueue>,
        store: Arc<dyn ObjectStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let concurrency = config.max_concurrent.min(config.batch_size).max(1);
        let job_semaphore = Arc::new(Semaphore::new(concurrency));
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            queue,
            store,
            events,
            job_semaphore,
            shutdown,
        }
    }

    /// Run until shutdown is signalled.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting consumer loop: batch={} concurrency={} policy={:?}",
            self.config.batch_size,
            self.job_semaphore.available_permits(),
            self.config.failure_policy
        );

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping consumer");
                        break;
                    }
                }
                result = self.iteration() => {
                    if let Err(e) = result {
                        // Queue unreachable or throttled: the one retried
                        // failure class.
                        error!("Receive failed: {}", e);
                        tokio::time::sleep(self.config.receive_backoff).await;
                    }
                }
            }
        }

        info!("Waiting for in-flight jobs to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("Consumer loop stopped");
        Ok(())
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// One receive/dispatch/acknowledge cycle.
    async fn iteration(&self) -> WorkerResult<()> {
        let batch = self
            .queue
            .receive(
                self.config.batch_size,
                self.config.poll_wait,
                self.config.visibility_timeout,
            )
            .await?;

        if batch.is_empty() {
            // The long poll already rate-limits empty polls.
            return Ok(());
        }

        debug!("Received {} messages", batch.len());

        let mut handles = Vec::with_capacity(batch.len());
        for message in batch {
            let permit = self
                .job_semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("semaphore closed"))?;

            let queue = Arc::clone(&self.queue);
            let store = Arc::clone(&self.store);
            let events = Arc::clone(&self.events);
            let policy = self.config.failure_policy;

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                Self::handle_message(queue, store, events, policy, message).await;
            }));
        }

        for handle in handles {
            handle.await.ok();
        }

        // Brief pause so sparse-but-present traffic does not turn into a
        // tight poll loop.
        tokio::time::sleep(self.config.batch_pause).await;
        Ok(())
    }

    /// Decode, process, and acknowledge one delivery.
    ///
    /// Never propagates an error: whatever happens, the message leaves the
    /// queue exactly once and the next message is unaffected.
    async fn handle_message(
        queue: Arc<dyn WorkQueue>,
        store: Arc<dyn ObjectStore>,
        events: Arc<dyn EventSink>,
        policy: FailurePolicy,
        message: Message,
    ) {
        let job = match decode(&message.body) {
            Decoded::Rejected { key } => {
                warn!(key = %key, "dropping undecodable or out-of-namespace message");
                events.emit(&JobEvent::Dropped { key });
                if let Err(e) = queue.delete(&message.receipt).await {
                    error!("Failed to delete rejected message: {}", e);
                }
                return;
            }
            Decoded::Job(job) => job,
        };

        info!(owner = ?job.owner, "processing: {} {}", job.key, job.preset);
        events.emit(&JobEvent::Processing {
            key: job.key.clone(),
            preset: job.preset.name().to_string(),
        });

        match Self::process_job(&store, &job).await {
            Ok(output_key) => {
                info!("processed: {}", output_key);
                events.emit(&JobEvent::Processed {
                    key: job.key.clone(),
                    output_key,
                });
                if let Err(e) = queue.delete(&message.receipt).await {
                    error!("Failed to delete processed message: {}", e);
                }
            }
            Err(e) => {
                error!("error: {} {}", job.key, e);
                events.emit(&JobEvent::Failed {
                    key: job.key.clone(),
                    error: e.to_string(),
                });
                let disposed = match policy {
                    // One attempt, then the job is gone. Legacy behavior.
                    FailurePolicy::Delete => queue.delete(&message.receipt).await,
                    FailurePolicy::DeadLetter => {
                        queue
                            .dead_letter(&message.receipt, &message.body, &e.to_string())
                            .await
                    }
                };
                if let Err(e) = disposed {
                    error!("Failed to dispose of failed message: {}", e);
                }
            }
        }
    }

    /// Fetch the input, run the transform off the async runtime, write the
    /// output artifact (overwriting any prior one).
    async fn process_job(store: &Arc<dyn ObjectStore>, job: &TransformJob) -> WorkerResult<String> {
        let input = store.get(&job.key).await?;

        let preset = job.preset.clone();
        let format = job.output_format();
        let output = tokio::task::spawn_blocking(move || render(&input, &preset, format))
            .await
            .map_err(|e| WorkerError::job_failed(format!("transform task panicked: {e}")))??;

        let output_key = job.output_key();
        store.put(&output_key, output, format.content_type()).await?;
        Ok(output_key)
    }

    /// Wait for all in-flight jobs to release their permits.
    async fn wait_for_jobs(&self) {
        let max = self.config.max_concurrent.min(self.config.batch_size).max(1);
        loop {
            if self.job_semaphore.available_permits() == max {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }
}
