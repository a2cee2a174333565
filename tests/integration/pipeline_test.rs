// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use founderscout::application::pipeline::{ProfilePipeline, RunStatus};
use founderscout::config::settings::{FetchSettings, SchoolQuality, ScoringSettings};
use founderscout::domain::repositories::profile_gateway::{ProfileGateway, ProfileQuery};
use founderscout::engines::reqwest_engine::HttpFetchEngine;
use founderscout::infrastructure::repositories::memory_profile_gateway::MemoryProfileGateway;
use founderscout::workers::orchestrator::FetchOrchestrator;

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

fn fast_settings() -> FetchSettings {
    FetchSettings {
        rate_limit_per_domain: 6000,
        rate_limit_burst: 100,
        max_fetch_attempts: 2,
        retry_base_seconds: 0.01,
        retry_max_seconds: 0.05,
        respect_robots: false,
        worker_pool_size: 2,
        ..FetchSettings::default()
    }
}

fn scoring_settings() -> ScoringSettings {
    ScoringSettings {
        prestige_companies: vec!["Nimbus Labs".to_string()],
        near_tier_companies: vec!["Acme Corp".to_string()],
        education_quality: vec![SchoolQuality {
            school: "Stanford".to_string(),
            score: 1.0,
        }],
        ..ScoringSettings::default()
    }
}

#[tokio::test]
async fn test_end_to_end_run_scores_and_persists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in/alice"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(PROFILE_HTML, "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/in/empty"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>no profile markup</body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    // /in/ghost 没有挂mock，wiremock返回404

    let settings = fast_settings();
    let engine = HttpFetchEngine::new(&settings.user_agent).unwrap();
    let orchestrator = FetchOrchestrator::new(settings, Arc::new(engine));

    let gateway = Arc::new(MemoryProfileGateway::new());
    let pipeline = ProfilePipeline::new(scoring_settings(), gateway.clone()).unwrap();

    let mut handle = orchestrator.submit(vec![
        format!("{}/in/alice", server.uri()),
        format!("{}/in/ghost", server.uri()),
        format!("{}/in/empty", server.uri()),
    ]);
    let manifest = pipeline.run(&mut handle).await;
    handle.join().await;

    assert_eq!(manifest.records.len(), 3);
    assert_eq!(manifest.scored, 1);
    assert_eq!(manifest.fetch_failed, 1);
    assert_eq!(manifest.skipped, 1);

    let scored = manifest
        .records
        .iter()
        .find(|record| record.status == RunStatus::Scored)
        .unwrap();
    assert!(scored.url.ends_with("/in/alice"));
    let score = scored.score.as_ref().unwrap();
    assert!((0.0..=1.0).contains(&score.total));
    // 顶级公司、高速晋升、优质教育背景的画像应拿到可观总分
    assert!(score.total >= 0.6, "total {} unexpectedly low", score.total);

    let records = gateway.query(&ProfileQuery::default()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].profile.current_company.as_deref(),
        Some("Nimbus Labs")
    );
}

#[tokio::test]
async fn test_rerunning_same_seed_updates_in_place() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in/alice"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(PROFILE_HTML, "text/html"),
        )
        .mount(&server)
        .await;

    let settings = fast_settings();
    let engine = HttpFetchEngine::new(&settings.user_agent).unwrap();
    let orchestrator = FetchOrchestrator::new(settings, Arc::new(engine));
    let gateway = Arc::new(MemoryProfileGateway::new());
    let pipeline = ProfilePipeline::new(scoring_settings(), gateway.clone()).unwrap();

    let url = format!("{}/in/alice", server.uri());
    for _ in 0..2 {
        let mut handle = orchestrator.submit(vec![url.clone()]);
        let manifest = pipeline.run(&mut handle).await;
        handle.join().await;
        assert_eq!(manifest.scored, 1);
    }

    // 同一URL两次运行仍只有一条记录
    assert_eq!(gateway.len(), 1);
}
