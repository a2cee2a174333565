// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use founderscout::application::pipeline::ProfilePipeline;
use founderscout::config::settings::Settings;
use founderscout::engines::reqwest_engine::HttpFetchEngine;
use founderscout::engines::router::EngineRouter;
use founderscout::infrastructure::repositories::memory_profile_gateway::MemoryProfileGateway;
use founderscout::utils::telemetry;
use founderscout::workers::orchestrator::FetchOrchestrator;

/// 主函数
///
/// 读取种子文件，跑完一次完整的抓取评分运行，把运行清单
/// 以JSON写到标准输出。
#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting founderscout...");

    // 2. Load configuration
    let settings = Settings::new().context("loading configuration")?;
    info!("Configuration loaded");

    // 3. Read seed URLs, one per line
    let seeds_path = std::env::args()
        .nth(1)
        .context("usage: founderscout <seeds-file>")?;
    let seeds: Vec<String> = std::fs::read_to_string(&seeds_path)
        .with_context(|| format!("reading seeds file {}", seeds_path))?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    info!(seeds = seeds.len(), "Seed list loaded");

    // 4. Assemble the fetch side
    let engine = HttpFetchEngine::new(&settings.fetch.user_agent)
        .map_err(|e| anyhow::anyhow!("building HTTP engine: {e}"))?;
    let router = Arc::new(EngineRouter::new(Box::new(engine), None, &settings.fetch));
    let orchestrator = FetchOrchestrator::new(settings.fetch.clone(), router);

    // 5. Assemble the scoring side
    let gateway = Arc::new(MemoryProfileGateway::new());
    let pipeline = ProfilePipeline::new(settings.scoring.clone(), gateway.clone())
        .context("building pipeline")?;

    // 6. Run to completion
    let mut handle = orchestrator.submit(seeds);
    let manifest = pipeline.run(&mut handle).await;
    handle.join().await;

    println!("{}", serde_json::to_string_pretty(&manifest)?);
    info!(
        scored = manifest.scored,
        fetch_failed = manifest.fetch_failed,
        skipped = manifest.skipped,
        "Run complete"
    );
    Ok(())
}
