// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::settings::{ScoringSettings, SettingsError};
use crate::domain::models::score::ScoreBreakdown;
use crate::domain::repositories::profile_gateway::ProfileGateway;
use crate::domain::services::age_estimator::AgeEstimator;
use crate::domain::services::extraction_service::ExtractionService;
use crate::domain::services::progression_analyzer::ProgressionAnalyzer;
use crate::domain::services::scoring_engine::ScoringEngine;
use crate::workers::fetch_worker::{FetchOutcome, FetchReport};
use crate::workers::orchestrator::RunHandle;

/// 单个URL的处理结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// 抓取、抽取、评分、保存全部完成
    Scored,
    /// 抓取终结失败
    FetchFailed,
    /// 抓取成功但文档无法抽取出可用画像
    Skipped,
}

/// 单个URL的运行记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// 来源URL
    pub url: String,
    /// 处理状态
    pub status: RunStatus,
    /// 评分明细（仅Scored）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreBreakdown>,
    /// 失败或跳过原因
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// 存储记录ID（仅Scored）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
}

/// 一次完整运行的清单
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunManifest {
    /// 逐URL记录
    pub records: Vec<RunRecord>,
    /// 成功评分数
    pub scored: usize,
    /// 抓取失败数
    pub fetch_failed: usize,
    /// 跳过数
    pub skipped: usize,
}

impl RunManifest {
    fn push(&mut self, record: RunRecord) {
        match record.status {
            RunStatus::Scored => self.scored += 1,
            RunStatus::FetchFailed => self.fetch_failed += 1,
            RunStatus::Skipped => self.skipped += 1,
        }
        self.records.push(record);
    }
}

/// 画像处理管线
///
/// 消费抓取运行的终态报告流：成功抓取的文档依次走抽取、
/// 年龄估计、晋升分析、评分与持久化；失败与不可抽取的
/// 文档记入清单。一个URL的任何失败都不影响其他URL。
pub struct ProfilePipeline<G: ProfileGateway> {
    age_estimator: AgeEstimator,
    progression_analyzer: ProgressionAnalyzer,
    scoring_engine: ScoringEngine,
    gateway: G,
}

impl<G: ProfileGateway> ProfilePipeline<G> {
    /// 创建新的处理管线
    ///
    /// # 参数
    ///
    /// * `scoring` - 评分配置
    /// * `gateway` - 持久化网关
    ///
    /// # 返回值
    ///
    /// * `Ok(ProfilePipeline)` - 管线实例
    /// * `Err(SettingsError)` - 评分配置非法
    pub fn new(scoring: ScoringSettings, gateway: G) -> Result<Self, SettingsError> {
        Ok(Self {
            age_estimator: AgeEstimator::new(),
            progression_analyzer: ProgressionAnalyzer::new(),
            scoring_engine: ScoringEngine::new(scoring)?,
            gateway,
        })
    }

    /// 消费一次抓取运行直至报告流结束
    ///
    /// # 参数
    ///
    /// * `handle` - 抓取运行句柄
    ///
    /// # 返回值
    ///
    /// 本次运行的完整清单
    pub async fn run(&self, handle: &mut RunHandle) -> RunManifest {
        let mut manifest = RunManifest::default();
        while let Some(report) = handle.recv().await {
            let record = self.handle_report(report).await;
            manifest.push(record);
        }
        info!(
            scored = manifest.scored,
            fetch_failed = manifest.fetch_failed,
            skipped = manifest.skipped,
            "抓取运行结束"
        );
        manifest
    }

    async fn handle_report(&self, report: FetchReport) -> RunRecord {
        let url = report.task.url.clone();
        match report.outcome {
            FetchOutcome::Failed => RunRecord {
                url,
                status: RunStatus::FetchFailed,
                score: None,
                cause: report.task.failure_cause.clone(),
                record_id: None,
            },
            FetchOutcome::Fetched(document) => match ExtractionService::extract(&document) {
                Err(e) => {
                    debug!(url = %url, error = %e, "文档无法抽取，跳过");
                    RunRecord {
                        url,
                        status: RunStatus::Skipped,
                        score: None,
                        cause: Some(e.to_string()),
                        record_id: None,
                    }
                }
                Ok(profile) => {
                    let age = self.age_estimator.estimate(&profile);
                    let progression = self.progression_analyzer.analyze(&profile);
                    let score = self.scoring_engine.score(&profile, &age, &progression);

                    match self.gateway.save(&profile, &score).await {
                        Ok(record_id) => {
                            debug!(url = %url, total = score.total, "画像已评分保存");
                            RunRecord {
                                url,
                                status: RunStatus::Scored,
                                score: Some(score),
                                cause: None,
                                record_id: Some(record_id),
                            }
                        }
                        Err(e) => {
                            warn!(url = %url, error = %e, "画像保存失败");
                            RunRecord {
                                url,
                                status: RunStatus::Skipped,
                                score: Some(score),
                                cause: Some(e.to_string()),
                                record_id: None,
                            }
                        }
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::document::RawDocument;
    use crate::domain::models::task::CrawlTask;
    use crate::infrastructure::repositories::memory_profile_gateway::MemoryProfileGateway;
    use chrono::Utc;
    use std::sync::Arc;

    const PROFILE_HTML: &str = r#"
        <html><body>
          <h1 class="profile-name">Alice Chen</h1>
          <div class="profile-title">Director of Engineering</div>
          <div class="profile-company">Nimbus Labs</div>
          <div class="experience-item">
            <span class="title">Software Engineer</span>
            <span class="company">Acme Corp</span>
            <span class="duration">Jan 2018 - Dec 2020</span>
          </div>
          <div class="experience-item">
            <span class="title">Director of Engineering</span>
            <span class="company">Nimbus Labs</span>
            <span class="duration">Jan 2021 - Present</span>
          </div>
          <div class="education-item">
            <span class="school">Stanford University</span>
            <span class="degree">B.S. Computer Science</span>
            <span class="year">2017</span>
          </div>
        </body></html>
    "#;

    fn fetched_report(url: &str, content: &str) -> FetchReport {
        let mut task = CrawlTask::new(url.to_string(), "example.com".to_string(), 0);
        task.start_attempt().unwrap();
        task.succeed().unwrap();
        FetchReport {
            task,
            outcome: FetchOutcome::Fetched(RawDocument {
                url: url.to_string(),
                content: content.to_string(),
                content_type: "text/html".to_string(),
                status_code: 200,
                fetched_at: Utc::now(),
            }),
        }
    }

    fn failed_report(url: &str) -> FetchReport {
        let mut task = CrawlTask::new(url.to_string(), "example.com".to_string(), 0);
        task.start_attempt().unwrap();
        task.fail("HTTP status 500".to_string()).unwrap();
        FetchReport {
            task,
            outcome: FetchOutcome::Failed,
        }
    }

    fn pipeline(gateway: Arc<MemoryProfileGateway>) -> ProfilePipeline<Arc<MemoryProfileGateway>> {
        ProfilePipeline::new(ScoringSettings::default(), gateway).unwrap()
    }

    #[tokio::test]
    async fn test_fetched_document_is_scored_and_saved() {
        let gateway = Arc::new(MemoryProfileGateway::new());
        let pipeline = pipeline(gateway.clone());

        let record = pipeline
            .handle_report(fetched_report("https://example.com/in/alice", PROFILE_HTML))
            .await;

        assert_eq!(record.status, RunStatus::Scored);
        assert!(record.record_id.is_some());
        assert_eq!(gateway.len(), 1);
        let score = record.score.unwrap();
        assert!((0.0..=1.0).contains(&score.total));
    }

    #[tokio::test]
    async fn test_failed_fetch_carries_cause() {
        let gateway = Arc::new(MemoryProfileGateway::new());
        let pipeline = pipeline(gateway.clone());

        let record = pipeline
            .handle_report(failed_report("https://example.com/in/bob"))
            .await;

        assert_eq!(record.status, RunStatus::FetchFailed);
        assert_eq!(record.cause.as_deref(), Some("HTTP status 500"));
        assert!(gateway.is_empty());
    }

    #[tokio::test]
    async fn test_unextractable_document_is_skipped() {
        let gateway = Arc::new(MemoryProfileGateway::new());
        let pipeline = pipeline(gateway.clone());

        let record = pipeline
            .handle_report(fetched_report(
                "https://example.com/in/ghost",
                "<html><body>nothing here</body></html>",
            ))
            .await;

        assert_eq!(record.status, RunStatus::Skipped);
        assert!(record.cause.is_some());
        assert!(gateway.is_empty());
    }
}
