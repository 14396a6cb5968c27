//! Fixed-interval polling of asynchronous deployment-server tasks.
//!
//! [`DeploymentPoller::wait_for_completion`] never fails: an exhausted budget
//! is reported as `false` and a transport error counts as "not yet complete".
//! [`DeploymentPoller::wait_for_release_deployments`] turns an exhausted
//! budget into [`DeployServerError::Timeout`].

use std::sync::Arc;

use async_trait::async_trait;
use sandbox_core::metrics::METRICS;
use sandbox_core::obs::emit_poll_attempt;
use tracing::{debug, info, instrument, warn};

use crate::client::DeployServerClient;
use crate::config::PollPolicy;
use crate::error::{DeployServerError, Result};
use crate::model::{DeploymentTask, TaskStatus};

/// The two server reads the poller needs.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn task_status(&self, task_path: &str) -> Result<TaskStatus>;

    async fn release_deployments(&self, release_path: &str) -> Result<Vec<DeploymentTask>>;
}

#[async_trait]
impl TaskStatusSource for DeployServerClient {
    async fn task_status(&self, task_path: &str) -> Result<TaskStatus> {
        self.get_task_status(task_path).await
    }

    async fn release_deployments(&self, release_path: &str) -> Result<Vec<DeploymentTask>> {
        self.list_release_deployments(release_path).await
    }
}

#[async_trait]
impl<T: TaskStatusSource + ?Sized> TaskStatusSource for Arc<T> {
    async fn task_status(&self, task_path: &str) -> Result<TaskStatus> {
        (**self).task_status(task_path).await
    }

    async fn release_deployments(&self, release_path: &str) -> Result<Vec<DeploymentTask>> {
        (**self).release_deployments(release_path).await
    }
}

pub struct DeploymentPoller<P> {
    tasks: P,
}

impl<P: TaskStatusSource> DeploymentPoller<P> {
    pub fn new(tasks: P) -> Self {
        Self { tasks }
    }

    /// Poll `task` up to `policy.max_retries` times, sleeping `policy.interval`
    /// between checks. Returns `true` on the first completed status.
    #[instrument(skip_all, fields(task_id = %task.task_id))]
    pub async fn wait_for_completion(&self, task: &DeploymentTask, policy: PollPolicy) -> bool {
        self.poll_path(&task.task_id, &task.task_path(), policy)
            .await
    }

    /// Wait for every deployment of the release `task` belongs to.
    ///
    /// Deployments are polled one after another, each with the full `policy`.
    pub async fn wait_for_release_deployments(
        &self,
        task: &DeploymentTask,
        policy: PollPolicy,
    ) -> Result<()> {
        let release_path = task
            .release_path()
            .ok_or(DeployServerError::MissingLink("Release"))?;
        let deployments = self.tasks.release_deployments(release_path).await?;
        info!(
            release = %release_path,
            deployments = deployments.len(),
            "waiting for release deployments"
        );

        for deployment in &deployments {
            if !self
                .poll_path(&deployment.task_id, &deployment.task_path(), policy)
                .await
            {
                return Err(DeployServerError::Timeout {
                    seconds: policy.budget().as_secs(),
                });
            }
        }
        Ok(())
    }

    async fn poll_path(&self, task_id: &str, task_path: &str, policy: PollPolicy) -> bool {
        for attempt in 1..=policy.max_retries {
            METRICS.inc_polls();
            let completed = match self.tasks.task_status(task_path).await {
                Ok(status) => status.is_completed,
                Err(e) => {
                    warn!(task_id, attempt, error = %e, "task status check failed");
                    false
                }
            };
            emit_poll_attempt(task_id, attempt, policy.max_retries, completed);
            if completed {
                debug!(task_id, attempt, "task completed");
                return true;
            }
            if attempt < policy.max_retries {
                tokio::time::sleep(policy.interval).await;
            }
        }
        warn!(task_id, retries = policy.max_retries, "task did not complete in time");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Source that replays a scripted sequence of status answers per task path.
    #[derive(Default)]
    struct ScriptedTasks {
        answers: Mutex<HashMap<String, VecDeque<Result<TaskStatus>>>>,
        polls: Mutex<HashMap<String, usize>>,
        deployments: Vec<DeploymentTask>,
    }

    impl ScriptedTasks {
        fn script(self, path: &str, answers: Vec<Result<TaskStatus>>) -> Self {
            self.answers
                .lock()
                .unwrap()
                .insert(path.to_string(), answers.into());
            self
        }

        fn polls(&self, path: &str) -> usize {
            self.polls.lock().unwrap().get(path).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl TaskStatusSource for ScriptedTasks {
        async fn task_status(&self, task_path: &str) -> Result<TaskStatus> {
            *self
                .polls
                .lock()
                .unwrap()
                .entry(task_path.to_string())
                .or_default() += 1;
            self.answers
                .lock()
                .unwrap()
                .get_mut(task_path)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Ok(TaskStatus::running()))
        }

        async fn release_deployments(&self, _release_path: &str) -> Result<Vec<DeploymentTask>> {
            Ok(self.deployments.clone())
        }
    }

    const NO_WAIT: PollPolicy = PollPolicy::new(3, Duration::ZERO);

    fn task() -> DeploymentTask {
        DeploymentTask::new("ServerTasks-1")
    }

    #[tokio::test]
    async fn test_completes_on_third_poll() {
        let tasks = Arc::new(ScriptedTasks::default().script(
            "/api/tasks/ServerTasks-1",
            vec![
                Ok(TaskStatus::running()),
                Ok(TaskStatus::running()),
                Ok(TaskStatus::completed()),
            ],
        ));
        let poller = DeploymentPoller::new(Arc::clone(&tasks));

        assert!(poller.wait_for_completion(&task(), NO_WAIT).await);
        assert_eq!(tasks.polls("/api/tasks/ServerTasks-1"), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_false() {
        let tasks = Arc::new(ScriptedTasks::default());
        let poller = DeploymentPoller::new(Arc::clone(&tasks));

        assert!(!poller.wait_for_completion(&task(), NO_WAIT).await);
        assert_eq!(tasks.polls("/api/tasks/ServerTasks-1"), 3);
    }

    #[tokio::test]
    async fn test_transport_error_consumes_a_retry() {
        let tasks = Arc::new(ScriptedTasks::default().script(
            "/api/tasks/ServerTasks-1",
            vec![
                Err(DeployServerError::Unreachable {
                    url: "http://octo".to_string(),
                }),
                Err(DeployServerError::Timeout { seconds: 1 }),
                Ok(TaskStatus::completed()),
            ],
        ));
        let poller = DeploymentPoller::new(Arc::clone(&tasks));

        assert!(poller.wait_for_completion(&task(), NO_WAIT).await);
        assert_eq!(tasks.polls("/api/tasks/ServerTasks-1"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_between_polls_only() {
        let tasks = ScriptedTasks::default();
        let poller = DeploymentPoller::new(tasks);
        let policy = PollPolicy::new(4, Duration::from_secs(30));

        let started = tokio::time::Instant::now();
        assert!(!poller.wait_for_completion(&task(), policy).await);

        assert_eq!(started.elapsed(), Duration::from_secs(90));
    }

    #[tokio::test]
    async fn test_release_deployments_time_out_with_budget() {
        let tasks = ScriptedTasks {
            deployments: vec![
                DeploymentTask::new("ServerTasks-2"),
                DeploymentTask::new("ServerTasks-3"),
            ],
            ..Default::default()
        }
        .script("/api/tasks/ServerTasks-2", vec![Ok(TaskStatus::completed())]);
        let poller = DeploymentPoller::new(tasks);
        let release_task = task().with_link("Release", "/api/releases/Releases-1");

        let err = poller
            .wait_for_release_deployments(&release_task, PollPolicy::new(2, Duration::ZERO))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployServerError::Timeout { seconds: 0 }));
    }

    #[tokio::test]
    async fn test_release_deployments_all_complete() {
        let tasks = Arc::new(
            ScriptedTasks {
                deployments: vec![
                    DeploymentTask::new("ServerTasks-2"),
                    DeploymentTask::new("ServerTasks-3")
                        .with_link("Task", "/api/tasks/ServerTasks-3"),
                ],
                ..Default::default()
            }
            .script("/api/tasks/ServerTasks-2", vec![Ok(TaskStatus::completed())])
            .script(
                "/api/tasks/ServerTasks-3",
                vec![Ok(TaskStatus::running()), Ok(TaskStatus::completed())],
            ),
        );
        let poller = DeploymentPoller::new(Arc::clone(&tasks));
        let release_task = task().with_link("Release", "/api/releases/Releases-1");

        poller
            .wait_for_release_deployments(&release_task, NO_WAIT)
            .await
            .unwrap();

        assert_eq!(tasks.polls("/api/tasks/ServerTasks-3"), 2);
    }

    #[tokio::test]
    async fn test_release_link_is_required() {
        let poller = DeploymentPoller::new(ScriptedTasks::default());

        let err = poller
            .wait_for_release_deployments(&task(), NO_WAIT)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployServerError::MissingLink("Release")));
    }
}
