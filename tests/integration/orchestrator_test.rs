// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use founderscout::config::settings::FetchSettings;
use founderscout::domain::models::document::RawDocument;
use founderscout::domain::models::task::TaskStatus;
use founderscout::engines::reqwest_engine::HttpFetchEngine;
use founderscout::engines::traits::{FetchEngine, FetchError, FetchRequest};
use founderscout::workers::fetch_worker::{FetchOutcome, FetchReport};
use founderscout::workers::orchestrator::FetchOrchestrator;

/// 集成测试用的快速配置：高限流额度、毫秒级退避
fn fast_settings() -> FetchSettings {
    FetchSettings {
        rate_limit_per_domain: 6000,
        rate_limit_burst: 100,
        max_fetch_attempts: 3,
        retry_base_seconds: 0.01,
        retry_max_seconds: 0.05,
        respect_robots: false,
        worker_pool_size: 2,
        ..FetchSettings::default()
    }
}

fn orchestrator(settings: FetchSettings) -> FetchOrchestrator {
    let engine = HttpFetchEngine::new(&settings.user_agent).unwrap();
    FetchOrchestrator::new(settings, Arc::new(engine))
}

async fn collect_reports(orchestrator: &FetchOrchestrator, seeds: Vec<String>) -> Vec<FetchReport> {
    let mut handle = orchestrator.submit(seeds);
    let mut reports = Vec::new();
    while let Some(report) = handle.recv().await {
        reports.push(report);
    }
    handle.join().await;
    reports
}

#[tokio::test]
async fn test_successful_fetch_reports_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>profile</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator(fast_settings());
    let reports = collect_reports(&orchestrator, vec![format!("{}/in/alice", server.uri())]).await;

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.task.status, TaskStatus::Succeeded);
    assert_eq!(report.task.attempt_count, 1);
    match &report.outcome {
        FetchOutcome::Fetched(document) => assert!(document.content.contains("profile")),
        other => panic!("expected fetched outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_permanent_failure_uses_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator(fast_settings());
    let reports = collect_reports(&orchestrator, vec![format!("{}/in/gone", server.uri())]).await;

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.task.status, TaskStatus::Failed);
    assert_eq!(report.task.attempt_count, 1);
    assert_eq!(report.task.failure_cause.as_deref(), Some("HTTP status 404"));
}

#[tokio::test]
async fn test_transient_failure_retries_until_budget_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let orchestrator = orchestrator(fast_settings());
    let reports = collect_reports(&orchestrator, vec![format!("{}/in/flaky", server.uri())]).await;

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.task.status, TaskStatus::Failed);
    assert_eq!(report.task.attempt_count, 3);
}

#[tokio::test]
async fn test_duplicate_seeds_collapse_to_one_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>profile</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/in/alice", server.uri());
    let orchestrator = orchestrator(fast_settings());
    let reports = collect_reports(&orchestrator, vec![url.clone(), url.clone(), url]).await;

    assert_eq!(reports.len(), 1);
}

#[tokio::test]
async fn test_invalid_seed_reports_terminal_failure() {
    // 无法提取域名的种子不进队列，但结果中必须有对应的失败条目
    let orchestrator = orchestrator(fast_settings());
    let reports = collect_reports(&orchestrator, vec!["definitely not a url".to_string()]).await;

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.task.status, TaskStatus::Failed);
    assert_eq!(report.task.attempt_count, 0);
    assert_eq!(
        report.task.failure_cause.as_deref(),
        Some("invalid seed URL")
    );
}

#[tokio::test]
async fn test_robots_disallow_fails_without_fetch_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/profile"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = FetchSettings {
        respect_robots: true,
        ..fast_settings()
    };
    let orchestrator = orchestrator(settings);
    let reports = collect_reports(
        &orchestrator,
        vec![format!("{}/private/profile", server.uri())],
    )
    .await;

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.task.status, TaskStatus::Failed);
    assert_eq!(report.task.attempt_count, 0);
    assert_eq!(
        report.task.failure_cause.as_deref(),
        Some("Disallowed by robots policy")
    );
}

#[tokio::test]
async fn test_cancellation_fails_pending_tasks_with_cause() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let orchestrator = orchestrator(fast_settings());
    let mut handle = orchestrator.submit(vec![
        format!("{}/in/slow-a", server.uri()),
        format!("{}/in/slow-b", server.uri()),
        format!("{}/in/slow-c", server.uri()),
    ]);
    handle.cancel();

    let mut reports = Vec::new();
    let deadline = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(report) = handle.recv().await {
            reports.push(report);
        }
    })
    .await;
    assert!(deadline.is_ok(), "cancelled run did not wind down in time");

    // 每个未终结任务都拿到带取消原因的失败报告
    assert_eq!(reports.len(), 3);
    for report in &reports {
        assert_eq!(report.task.status, TaskStatus::Failed);
        assert_eq!(report.task.failure_cause.as_deref(), Some("run cancelled"));
    }
}

/// 永远返回连接失败的桩引擎
struct FailingEngine {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl FetchEngine for FailingEngine {
    async fn fetch(&self, _request: &FetchRequest) -> Result<RawDocument, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::ConnectionFailure("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// 成功一次的桩引擎：前`failures`次连接失败，之后成功
struct RecoveringEngine {
    calls: Arc<AtomicUsize>,
    failures: usize,
}

#[async_trait]
impl FetchEngine for RecoveringEngine {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(FetchError::ConnectionFailure("connection reset".to_string()));
        }
        Ok(RawDocument {
            url: request.url.clone(),
            content: "<html>recovered</html>".to_string(),
            content_type: "text/html".to_string(),
            status_code: 200,
            fetched_at: Utc::now(),
        })
    }

    fn name(&self) -> &'static str {
        "recovering"
    }
}

#[tokio::test(start_paused = true)]
async fn test_open_breaker_holds_tasks_through_cooldown() {
    let calls = Arc::new(AtomicUsize::new(0));
    let settings = FetchSettings {
        circuit_breaker_threshold: 1,
        circuit_breaker_cooldown_seconds: 60,
        max_fetch_attempts: 2,
        worker_pool_size: 1,
        ..fast_settings()
    };
    let orchestrator = FetchOrchestrator::new(
        settings,
        Arc::new(FailingEngine { calls: calls.clone() }),
    );

    let reports = collect_reports(
        &orchestrator,
        vec![
        "https://dead.example.com/in/a".to_string(),
        "https://dead.example.com/in/b".to_string(),
        ],
    )
    .await;

    // 两个任务都终结失败，每次实际抓取都消耗尝试额度
    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert_eq!(report.task.status, TaskStatus::Failed);
        assert_eq!(report.task.attempt_count, 2);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_probe_recovers_domain() {
    let calls = Arc::new(AtomicUsize::new(0));
    let settings = FetchSettings {
        circuit_breaker_threshold: 1,
        circuit_breaker_cooldown_seconds: 60,
        max_fetch_attempts: 5,
        worker_pool_size: 1,
        ..fast_settings()
    };
    let orchestrator = FetchOrchestrator::new(
        settings,
        Arc::new(RecoveringEngine {
            calls: calls.clone(),
            failures: 1,
        }),
    );

    let reports = collect_reports(
        &orchestrator,
        vec!["https://flaky.example.com/in/a".to_string()],
    )
    .await;

    // 首次失败开路，冷却后的探测成功，任务在第二次尝试完成
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].task.status, TaskStatus::Succeeded);
    assert_eq!(reports[0].task.attempt_count, 2);
}
