// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// 权重之和与1.0的允许误差
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// 配置错误类型
///
/// 配置错误在启动阶段是致命的：任何一项校验失败，
/// 运行都不允许开始。
#[derive(Error, Debug)]
pub enum SettingsError {
    /// 评分权重之和不等于1.0
    #[error("Scoring weights must sum to 1.0, got {0}")]
    WeightsDoNotSumToOne(f64),

    /// 缺少必需的配置项
    #[error("Missing required config: {0}")]
    MissingRequiredConfig(String),

    /// 配置项取值非法
    #[error("Invalid config value: {0}")]
    Invalid(String),

    /// 配置加载失败
    #[error("Config load error: {0}")]
    Load(#[from] config::ConfigError),
}

/// 应用程序配置设置
///
/// 包含抓取编排和评分流水线的所有配置项
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 抓取编排配置
    pub fetch: FetchSettings,
    /// 评分配置
    pub scoring: ScoringSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            scoring: ScoringSettings::default(),
        }
    }
}

/// 抓取编排配置设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// 每个域名每分钟允许的请求数
    pub rate_limit_per_domain: u32,
    /// 令牌桶突发容量
    pub rate_limit_burst: u32,
    /// 单个任务的最大抓取尝试次数
    pub max_fetch_attempts: u32,
    /// 单次抓取的超时时间（秒）
    pub fetch_timeout_seconds: u64,
    /// 工作器池大小
    pub worker_pool_size: usize,
    /// 熔断阈值：连续瞬时失败次数
    pub circuit_breaker_threshold: u32,
    /// 熔断冷却时间（秒）
    pub circuit_breaker_cooldown_seconds: u64,
    /// 重试退避基准时间（秒）
    pub retry_base_seconds: f64,
    /// 重试退避上限时间（秒）
    pub retry_max_seconds: f64,
    /// 是否遵循robots.txt
    pub respect_robots: bool,
    /// 请求User-Agent
    pub user_agent: String,
    /// 静态抓取结果被视为不完整的最小内容长度（0表示禁用该启发式）
    pub render_min_content_length: usize,
    /// 静态抓取结果必须命中的选择器（未命中时触发渲染引擎）
    pub render_required_selector: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            rate_limit_per_domain: 20,
            rate_limit_burst: 5,
            max_fetch_attempts: 3,
            fetch_timeout_seconds: 30,
            worker_pool_size: 4,
            circuit_breaker_threshold: 5,
            circuit_breaker_cooldown_seconds: 60,
            retry_base_seconds: 1.0,
            retry_max_seconds: 60.0,
            respect_robots: true,
            user_agent: "Mozilla/5.0 (compatible; founderscout/0.1; +https://founderscout.dev)"
                .to_string(),
            render_min_content_length: 0,
            render_required_selector: None,
        }
    }
}

impl FetchSettings {
    /// 单次抓取的超时时间
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    /// 熔断冷却时间
    pub fn circuit_breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_cooldown_seconds)
    }
}

/// 评分权重配置
///
/// 五项子分数的固定权重，权重之和必须等于1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    /// 年龄权重
    pub age: f64,
    /// 职业晋升权重
    pub progression: f64,
    /// 公司声望权重
    pub company_prestige: f64,
    /// 头衔级别权重
    pub title_level: f64,
    /// 教育背景权重
    pub education: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            age: 0.25,
            progression: 0.35,
            company_prestige: 0.20,
            title_level: 0.15,
            education: 0.05,
        }
    }
}

impl ScoringWeights {
    /// 权重之和
    pub fn sum(&self) -> f64 {
        self.age + self.progression + self.company_prestige + self.title_level + self.education
    }

    /// 校验权重
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 权重合法
    /// * `Err(SettingsError)` - 权重之和不为1.0或存在负权重
    pub fn validate(&self) -> Result<(), SettingsError> {
        let entries = [
            self.age,
            self.progression,
            self.company_prestige,
            self.title_level,
            self.education,
        ];
        if entries.iter().any(|w| *w < 0.0) {
            return Err(SettingsError::Invalid(
                "scoring weights must be non-negative".to_string(),
            ));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(SettingsError::WeightsDoNotSumToOne(sum));
        }
        Ok(())
    }
}

/// 学校质量条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolQuality {
    /// 学校名称（大小写不敏感的包含匹配）
    pub school: String,
    /// 质量分数，取值[0,1]
    pub score: f64,
}

/// 评分配置设置
///
/// 声望公司、学校质量等名单均为可调参数，
/// 算法本身不硬编码任何公司或学校名称。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// 评分权重
    pub weights: ScoringWeights,
    /// 理想年龄下界
    pub target_age_low: f64,
    /// 理想年龄上界
    pub target_age_high: f64,
    /// 顶级公司名单
    pub prestige_companies: Vec<String>,
    /// 准顶级公司名单
    pub near_tier_companies: Vec<String>,
    /// 准顶级公司的部分得分
    pub near_tier_credit: f64,
    /// 学校质量名单
    pub education_quality: Vec<SchoolQuality>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            target_age_low: 25.0,
            target_age_high: 30.0,
            prestige_companies: Vec::new(),
            near_tier_companies: Vec::new(),
            near_tier_credit: 0.5,
            education_quality: Vec::new(),
        }
    }
}

impl ScoringSettings {
    /// 校验评分配置
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.weights.validate()?;
        if self.target_age_low >= self.target_age_high {
            return Err(SettingsError::Invalid(format!(
                "target_age_low ({}) must be below target_age_high ({})",
                self.target_age_low, self.target_age_high
            )));
        }
        if !(0.0..=1.0).contains(&self.near_tier_credit) {
            return Err(SettingsError::Invalid(
                "near_tier_credit must be within [0, 1]".to_string(),
            ));
        }
        for entry in &self.education_quality {
            if !(0.0..=1.0).contains(&entry.score) {
                return Err(SettingsError::Invalid(format!(
                    "education_quality score for '{}' must be within [0, 1]",
                    entry.school
                )));
            }
        }
        Ok(())
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件和环境变量加载配置，支持默认值，
    /// 加载完成后立即执行启动校验。
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并通过校验的配置
    /// * `Err(SettingsError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, SettingsError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("FOUNDERSCOUT").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验配置
    ///
    /// 任何一项失败都阻止运行开始
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.fetch.worker_pool_size == 0 {
            return Err(SettingsError::Invalid(
                "worker_pool_size must be at least 1".to_string(),
            ));
        }
        if self.fetch.max_fetch_attempts == 0 {
            return Err(SettingsError::Invalid(
                "max_fetch_attempts must be at least 1".to_string(),
            ));
        }
        if self.fetch.rate_limit_per_domain == 0 {
            return Err(SettingsError::MissingRequiredConfig(
                "fetch.rate_limit_per_domain".to_string(),
            ));
        }
        self.scoring.validate()
    }
}
