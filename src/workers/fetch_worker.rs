// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::config::settings::FetchSettings;
use crate::domain::models::document::RawDocument;
use crate::domain::models::task::CrawlTask;
use crate::engines::circuit_breaker::{BreakerDecision, DomainCircuitBreaker};
use crate::engines::rate_limiter::{Admission, DomainRateLimiter};
use crate::engines::traits::{FetchEngine, FetchError, FetchRequest};
use crate::queue::task_queue::{Popped, TaskQueue};
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::robots::RobotsChecker;

/// 队列空但仍有在途任务时的轮询间隔
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// 取消运行时写入任务的失败原因
pub const CANCELLED_CAUSE: &str = "run cancelled";

/// 抓取结果报告
///
/// 每个任务终结时恰好发出一份，携带任务的终态。
#[derive(Debug)]
pub struct FetchReport {
    /// 终态任务
    pub task: CrawlTask,
    /// 抓取结果
    pub outcome: FetchOutcome,
}

/// 任务终态的抓取结果
#[derive(Debug)]
pub enum FetchOutcome {
    /// 抓取成功，附原始文档
    Fetched(RawDocument),
    /// 所有尝试耗尽或遇到永久失败
    Failed,
}

/// 抓取工作者
///
/// 从共享队列取就绪任务，依次通过熔断器与限流器，执行抓取
/// 并按错误分类决定重试或终结。熔断挂起的任务带着冷却时刻
/// 回到队列，不消耗尝试额度。取消运行时，所有未终结的任务
/// 都以取消原因补发失败报告，报告流因此总是完整的。
pub struct FetchWorker {
    worker_id: usize,
    queue: Arc<TaskQueue>,
    engine: Arc<dyn FetchEngine>,
    rate_limiter: Arc<DomainRateLimiter>,
    breaker: Arc<DomainCircuitBreaker>,
    robots: Arc<RobotsChecker>,
    retry_policy: RetryPolicy,
    settings: FetchSettings,
    outstanding: Arc<AtomicUsize>,
    reports: mpsc::Sender<FetchReport>,
    cancel: watch::Receiver<bool>,
}

impl FetchWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        worker_id: usize,
        queue: Arc<TaskQueue>,
        engine: Arc<dyn FetchEngine>,
        rate_limiter: Arc<DomainRateLimiter>,
        breaker: Arc<DomainCircuitBreaker>,
        robots: Arc<RobotsChecker>,
        settings: FetchSettings,
        outstanding: Arc<AtomicUsize>,
        reports: mpsc::Sender<FetchReport>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let retry_policy = RetryPolicy::from_settings(&settings);
        Self {
            worker_id,
            queue,
            engine,
            rate_limiter,
            breaker,
            robots,
            retry_policy,
            settings,
            outstanding,
            reports,
            cancel,
        }
    }

    /// 运行工作者循环
    ///
    /// 队列耗尽且没有在途任务时正常退出；收到取消信号时
    /// 给队列中剩余的任务补发取消失败报告后退出。
    pub async fn run(mut self) {
        debug!(worker_id = self.worker_id, "抓取工作者启动");

        loop {
            if *self.cancel.borrow() {
                self.fail_remaining().await;
                break;
            }

            match self.queue.pop_ready(Instant::now()) {
                Popped::Task(task) => {
                    if let Err(e) = self.process_task(task).await {
                        error!(worker_id = self.worker_id, error = %e, "任务处理失败");
                        self.outstanding.fetch_sub(1, Ordering::SeqCst);
                    }
                }
                Popped::WaitUntil(at) => {
                    if self.wait_until(at).await {
                        self.fail_remaining().await;
                        break;
                    }
                }
                Popped::Empty => {
                    if self.outstanding.load(Ordering::SeqCst) == 0 {
                        break;
                    }
                    if self.sleep(IDLE_POLL_INTERVAL).await {
                        self.fail_remaining().await;
                        break;
                    }
                }
            }
        }

        debug!(worker_id = self.worker_id, "抓取工作者退出");
    }

    #[instrument(skip(self, task), fields(worker_id = self.worker_id, task_id = %task.id, url = %task.url))]
    async fn process_task(&mut self, mut task: CrawlTask) -> Result<()> {
        // 熔断挂起不消耗尝试额度，任务等冷却结束再回来
        if let BreakerDecision::Hold(wait) = self.breaker.check(&task.domain) {
            debug!(domain = %task.domain, wait_ms = wait.as_millis() as u64, "域名熔断中，任务延后");
            self.queue.push(task, Instant::now() + wait);
            return Ok(());
        }

        // 限流等待。拒绝不扣令牌，醒来后重新申请即可
        loop {
            match self.rate_limiter.admit(&task.domain) {
                Admission::Granted => break,
                Admission::RetryAfter(wait) => {
                    if self.sleep(wait).await {
                        return self.fail_cancelled(task).await;
                    }
                }
            }
        }

        if self.settings.respect_robots
            && !self
                .robots
                .is_allowed(&task.url, &self.settings.user_agent)
                .await
        {
            info!(url = %task.url, "robots策略禁止抓取");
            task.fail(FetchError::PolicyDisallowed.to_string())
                .context("marking policy-disallowed task failed")?;
            return self.report(task, FetchOutcome::Failed).await;
        }

        task.start_attempt().context("starting fetch attempt")?;

        let request = FetchRequest::new(task.url.clone(), self.settings.fetch_timeout());
        let cancelled = {
            let fetch = self.engine.fetch(&request);
            tokio::select! {
                _ = self.cancel.changed() => None,
                result = fetch => Some(result),
            }
        };
        let result = match cancelled {
            Some(result) => result,
            None => return self.fail_cancelled(task).await,
        };

        match result {
            Ok(document) => {
                self.breaker.record_success(&task.domain);
                task.succeed().context("marking task succeeded")?;
                debug!(status = document.status_code, bytes = document.content.len(), "抓取成功");
                self.report(task, FetchOutcome::Fetched(document)).await
            }
            Err(e) => self.handle_failure(task, e).await,
        }
    }

    /// 失败处理
    ///
    /// 瞬态失败计入熔断器并按指数退避重新入队，额度耗尽或
    /// 永久失败直接终结任务。
    async fn handle_failure(&mut self, mut task: CrawlTask, error: FetchError) -> Result<()> {
        if error.counts_toward_breaker() {
            self.breaker.record_failure(&task.domain);
        }

        if error.is_retryable() && self.retry_policy.should_retry(task.attempt_count) {
            let backoff = self.retry_policy.calculate_backoff(task.attempt_count);
            warn!(
                error = %error,
                attempt = task.attempt_count,
                backoff_ms = backoff.as_millis() as u64,
                "瞬态失败，安排重试"
            );
            task.schedule_retry(Utc::now() + chrono::Duration::milliseconds(backoff.as_millis() as i64))
                .context("scheduling retry")?;
            self.queue.push(task, Instant::now() + backoff);
            return Ok(());
        }

        warn!(error = %error, attempts = task.attempt_count, "任务终结失败");
        task.fail(error.to_string()).context("marking task failed")?;
        self.report(task, FetchOutcome::Failed).await
    }

    async fn report(&self, task: CrawlTask, outcome: FetchOutcome) -> Result<()> {
        self.reports
            .send(FetchReport { task, outcome })
            .await
            .context("report channel closed")?;
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    /// 以取消原因终结任务并发出报告
    async fn fail_cancelled(&self, mut task: CrawlTask) -> Result<()> {
        task.fail(CANCELLED_CAUSE.to_string())
            .context("marking cancelled task failed")?;
        self.report(task, FetchOutcome::Failed).await
    }

    /// 取消后清空队列，给剩余任务补发取消失败报告
    async fn fail_remaining(&mut self) {
        for task in self.queue.drain() {
            if let Err(e) = self.fail_cancelled(task).await {
                error!(worker_id = self.worker_id, error = %e, "补发取消报告失败");
                self.outstanding.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    /// 可取消的定时等待，收到取消信号返回true
    async fn sleep(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.changed() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }

    async fn wait_until(&mut self, deadline: Instant) -> bool {
        tokio::select! {
            _ = self.cancel.changed() => true,
            _ = tokio::time::sleep_until(deadline) => false,
        }
    }
}
