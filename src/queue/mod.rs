//! Single-worker task queue
//!
//! A [`MergeQueue`] owns a resource (in production the [`WorkingCopy`]) and
//! runs submitted tasks against it one at a time, in submission order. Each
//! task gets `&mut` access for its whole duration, including across `.await`
//! points, so two task bodies can never interleave.
//!
//! A task that returns `Err` or panics is logged and dropped; the worker moves
//! on to the next task. Nothing is retried.
//!
//! [`WorkingCopy`]: crate::git::WorkingCopy

use crate::error::{Error, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::panic::AssertUnwindSafe;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

type Job<R> = Box<dyn for<'a> FnOnce(&'a mut R) -> BoxFuture<'a, ()> + Send>;

/// Handle to a queued task's result
#[derive(Debug)]
pub struct TaskHandle<T> {
    label: String,
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task to finish
    ///
    /// Returns [`Error::Queue`] if the task panicked or the queue shut down
    /// before running it.
    pub async fn wait(self) -> Result<T> {
        self.rx
            .await
            .map_err(|_| Error::Queue(format!("task '{}' did not complete", self.label)))?
    }
}

/// Strictly serialized executor over a resource `R`
pub struct MergeQueue<R> {
    tx: mpsc::UnboundedSender<(String, Job<R>)>,
}

impl<R> Clone for MergeQueue<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R: Send + 'static> MergeQueue<R> {
    /// Start the worker task that owns `resource`.
    ///
    /// The worker exits, handing the resource back through the join handle,
    /// once every `MergeQueue` clone has been dropped and the backlog drained.
    pub fn start(resource: R) -> (Self, JoinHandle<R>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(resource, rx));
        (Self { tx }, worker)
    }

    /// Append a task. It runs after every previously submitted task.
    pub fn submit<T, F>(&self, label: impl Into<String>, task: F) -> Result<TaskHandle<T>>
    where
        T: Send + 'static,
        F: for<'a> FnOnce(&'a mut R) -> BoxFuture<'a, Result<T>> + Send + 'static,
    {
        let label = label.into();
        let (result_tx, result_rx) = oneshot::channel();
        let task_label = label.clone();

        let job = erase(move |resource: &mut R| {
            async move {
                let result = task(resource).await;
                if let Err(e) = &result {
                    error!(task = %task_label, error = %e, "queued task failed");
                }
                // The submitter may have stopped listening; that is fine.
                let _ = result_tx.send(result);
            }
            .boxed()
        });

        self.tx
            .send((label.clone(), job))
            .map_err(|_| Error::Queue("merge queue worker has stopped".to_string()))?;
        debug!(task = %label, "task queued");

        Ok(TaskHandle {
            label,
            rx: result_rx,
        })
    }
}

// Pins the closure to the higher-ranked signature before boxing it.
fn erase<R, C>(job: C) -> Job<R>
where
    C: for<'a> FnOnce(&'a mut R) -> BoxFuture<'a, ()> + Send + 'static,
{
    Box::new(job)
}

async fn run_worker<R: Send>(
    mut resource: R,
    mut rx: mpsc::UnboundedReceiver<(String, Job<R>)>,
) -> R {
    while let Some((label, job)) = rx.recv().await {
        debug!(task = %label, "task started");
        let outcome = AssertUnwindSafe(job(&mut resource)).catch_unwind().await;
        match outcome {
            Ok(()) => debug!(task = %label, "task finished"),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(task = %label, %message, "queued task panicked; continuing");
            }
        }
    }
    resource
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_tasks_run_in_fifo_order_without_interleaving() {
        let (queue, worker) = MergeQueue::start(Vec::<String>::new());

        let mut handles = Vec::new();
        for i in 0..5u64 {
            let handle = queue
                .submit(format!("task-{i}"), move |log: &mut Vec<String>| {
                    async move {
                        log.push(format!("start {i}"));
                        // Later tasks sleep less; they still must not overtake.
                        tokio::time::sleep(Duration::from_millis(25 - i * 5)).await;
                        log.push(format!("end {i}"));
                        Ok(i)
                    }
                    .boxed()
                })
                .unwrap();
            handles.push(handle);
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.wait().await.unwrap(), i as u64);
        }

        drop(queue);
        let log = worker.await.unwrap();
        let expected: Vec<String> = (0..5)
            .flat_map(|i| [format!("start {i}"), format!("end {i}")])
            .collect();
        assert_eq!(log, expected);
    }

    #[tokio::test]
    async fn test_failed_task_does_not_stall_queue() {
        let (queue, _worker) = MergeQueue::start(0u32);

        let failing = queue
            .submit("failing", |_: &mut u32| {
                async { Err::<(), _>(Error::Internal("boom".to_string())) }.boxed()
            })
            .unwrap();
        let next = queue
            .submit("next", |count: &mut u32| {
                async move {
                    *count += 1;
                    Ok(*count)
                }
                .boxed()
            })
            .unwrap();

        assert!(matches!(failing.wait().await, Err(Error::Internal(_))));
        assert_eq!(next.wait().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stall_queue() {
        let (queue, _worker) = MergeQueue::start(0u32);

        let panicking = queue
            .submit("panicking", |_: &mut u32| {
                async {
                    if true {
                        panic!("task blew up");
                    }
                    Ok(())
                }
                .boxed()
            })
            .unwrap();
        let next = queue
            .submit("next", |count: &mut u32| {
                async move {
                    *count += 10;
                    Ok(*count)
                }
                .boxed()
            })
            .unwrap();

        assert!(matches!(panicking.wait().await, Err(Error::Queue(_))));
        assert_eq!(next.wait().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_worker_returns_resource_after_last_handle_dropped() {
        let (queue, worker) = MergeQueue::start(String::from("state"));
        queue
            .submit("append", |s: &mut String| {
                async move {
                    s.push_str("-touched");
                    Ok(())
                }
                .boxed()
            })
            .unwrap()
            .wait()
            .await
            .unwrap();

        drop(queue);
        assert_eq!(worker.await.unwrap(), "state-touched");
    }
}
