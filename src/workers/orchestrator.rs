// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::settings::FetchSettings;
use crate::domain::models::task::CrawlTask;
use crate::engines::circuit_breaker::{BreakerConfig, DomainCircuitBreaker};
use crate::engines::rate_limiter::DomainRateLimiter;
use crate::engines::traits::FetchEngine;
use crate::queue::task_queue::TaskQueue;
use crate::utils::robots::RobotsChecker;
use crate::utils::url_utils;
use crate::workers::fetch_worker::{FetchOutcome, FetchReport, FetchWorker};

/// 报告通道容量
const REPORT_CHANNEL_CAPACITY: usize = 64;

/// 无法提取域名的种子的失败原因
pub const INVALID_SEED_CAUSE: &str = "invalid seed URL";

/// 抓取编排器
///
/// 持有限流器、熔断器与任务队列，按配置的并发度派生
/// 工作者池。一次submit对应一次完整的抓取运行。
pub struct FetchOrchestrator {
    settings: FetchSettings,
    engine: Arc<dyn FetchEngine>,
    rate_limiter: Arc<DomainRateLimiter>,
    breaker: Arc<DomainCircuitBreaker>,
    robots: Arc<RobotsChecker>,
}

/// 一次抓取运行的句柄
///
/// 逐条消费终态报告；所有任务终结后通道关闭。丢弃句柄
/// 或调用`cancel`都会让工作者尽快退出。
pub struct RunHandle {
    reports: mpsc::Receiver<FetchReport>,
    cancel_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl RunHandle {
    /// 接收下一份终态报告，运行结束后返回None
    pub async fn recv(&mut self) -> Option<FetchReport> {
        self.reports.recv().await
    }

    /// 请求取消，在途等待会被立即打断
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// 等待所有工作者退出
    pub async fn join(self) {
        drop(self.reports);
        for result in futures::future::join_all(self.workers).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "工作者任务异常退出");
            }
        }
    }
}

impl FetchOrchestrator {
    /// 创建新的抓取编排器
    ///
    /// # 参数
    ///
    /// * `settings` - 抓取配置
    /// * `engine` - 抓取引擎（通常为引擎路由器）
    pub fn new(settings: FetchSettings, engine: Arc<dyn FetchEngine>) -> Self {
        let rate_limiter = Arc::new(DomainRateLimiter::new(&settings));
        let breaker = Arc::new(DomainCircuitBreaker::new(BreakerConfig {
            failure_threshold: settings.circuit_breaker_threshold,
            cooldown: settings.circuit_breaker_cooldown(),
        }));
        Self {
            settings,
            engine,
            rate_limiter,
            breaker,
            robots: Arc::new(RobotsChecker::new()),
        }
    }

    /// 提交一批种子URL并启动抓取运行
    ///
    /// 种子按URL去重；无法提取域名的种子不进入队列，
    /// 但仍会产生一条终态失败报告，保证每个种子在
    /// 运行结果中都有对应条目。
    ///
    /// # 参数
    ///
    /// * `seeds` - 种子URL列表
    ///
    /// # 返回值
    ///
    /// 本次运行的句柄
    pub fn submit(&self, seeds: Vec<String>) -> RunHandle {
        let queue = Arc::new(TaskQueue::new());
        let now = Instant::now();

        let mut seen = HashSet::new();
        let mut accepted = 0usize;
        let mut rejected = Vec::new();
        for url in seeds {
            if !seen.insert(url.clone()) {
                continue;
            }
            match url_utils::domain_of(&url) {
                Some(domain) => {
                    queue.push(CrawlTask::new(url, domain, 0), now);
                    accepted += 1;
                }
                None => {
                    warn!(url = %url, "种子URL无法提取域名，标记为失败");
                    let mut task = CrawlTask::new(url, String::new(), 0);
                    if task.fail(INVALID_SEED_CAUSE.to_string()).is_ok() {
                        rejected.push(FetchReport {
                            task,
                            outcome: FetchOutcome::Failed,
                        });
                    }
                }
            }
        }

        info!(
            seeds = accepted,
            workers = self.settings.worker_pool_size,
            "抓取运行启动"
        );

        let outstanding = Arc::new(AtomicUsize::new(accepted));
        let (report_tx, report_rx) = mpsc::channel(REPORT_CHANNEL_CAPACITY);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        if !rejected.is_empty() {
            let tx = report_tx.clone();
            tokio::spawn(async move {
                for report in rejected {
                    if tx.send(report).await.is_err() {
                        break;
                    }
                }
            });
        }

        let workers = (0..self.settings.worker_pool_size.max(1))
            .map(|worker_id| {
                let worker = FetchWorker::new(
                    worker_id,
                    queue.clone(),
                    self.engine.clone(),
                    self.rate_limiter.clone(),
                    self.breaker.clone(),
                    self.robots.clone(),
                    self.settings.clone(),
                    outstanding.clone(),
                    report_tx.clone(),
                    cancel_rx.clone(),
                );
                tokio::spawn(worker.run())
            })
            .collect();

        RunHandle {
            reports: report_rx,
            cancel_tx,
            workers,
        }
    }
}
