// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{ScoringSettings, SettingsError};
use crate::domain::models::profile::StructuredProfile;
use crate::domain::models::score::{
    AgeEstimate, ProgressionResult, ScoreBreakdown, SeniorityLevel,
};
use crate::domain::services::progression_analyzer::ProgressionAnalyzer;

/// 理想年龄上界之外的线性衰减带宽（年）
const AGE_DECAY_YEARS: f64 = 5.0;
/// 晋升速度拿满分所需的级/年
const FULL_CREDIT_VELOCITY: f64 = 1.25;
/// 异常跳跃（创始人信号）加成
const ANOMALY_BONUS: f64 = 0.25;
/// 研究生学位的教育加成
const GRADUATE_DEGREE_BONUS: f64 = 0.1;

/// 评分引擎
///
/// 将子分数按固定权重合成创始潜力总分。纯函数、无I/O，
/// 任意数量的并发调用方无需同步即可安全使用。
///
/// 权重在构造时校验（之和必须为1.0），评分调用本身永不失败；
/// 配置错误只可能在启动阶段被拒绝。
pub struct ScoringEngine {
    config: ScoringSettings,
}

impl ScoringEngine {
    /// 创建新的评分引擎实例
    ///
    /// # 参数
    ///
    /// * `config` - 评分配置
    ///
    /// # 返回值
    ///
    /// * `Ok(ScoringEngine)` - 配置通过校验的引擎
    /// * `Err(SettingsError)` - 权重之和不为1.0或名单取值非法
    pub fn new(config: ScoringSettings) -> Result<Self, SettingsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 计算创始潜力评分
    ///
    /// 每项子分数都落在[0,1]，总分为加权和，构造上保证落在[0,1]。
    ///
    /// # 参数
    ///
    /// * `profile` - 结构化画像
    /// * `age` - 年龄估计
    /// * `progression` - 晋升分析结果
    ///
    /// # 返回值
    ///
    /// 包含全部子分数、权重与总分的评分明细
    pub fn score(
        &self,
        profile: &StructuredProfile,
        age: &AgeEstimate,
        progression: &ProgressionResult,
    ) -> ScoreBreakdown {
        let age_score = self.age_score(age);
        let progression_score = Self::progression_score(progression);
        let prestige_score = self.company_prestige_score(profile);
        let title_score = Self::title_level_score(profile);
        let education_score = self.education_score(profile);

        let weights = self.config.weights;
        let total = weights.age * age_score
            + weights.progression * progression_score
            + weights.company_prestige * prestige_score
            + weights.title_level * title_score
            + weights.education * education_score;

        ScoreBreakdown {
            age: age_score,
            progression: progression_score,
            company_prestige: prestige_score,
            title_level: title_score,
            education: education_score,
            weights,
            total: total.clamp(0.0, 1.0),
        }
    }

    /// 年龄子分数
    ///
    /// 零置信度估计永远记0分，绝不代入假定中位数。
    /// 理想区间内1.0，区间上界之外5年内线性衰减到0，
    /// 下界之下与衰减带之外为0。
    fn age_score(&self, age: &AgeEstimate) -> f64 {
        if !age.has_signal() {
            return 0.0;
        }
        let low = self.config.target_age_low;
        let high = self.config.target_age_high;
        if age.point < low {
            0.0
        } else if age.point <= high {
            1.0
        } else if age.point < high + AGE_DECAY_YEARS {
            1.0 - (age.point - high) / AGE_DECAY_YEARS
        } else {
            0.0
        }
    }

    /// 晋升子分数
    ///
    /// 速度的单调递增函数，封顶1.0；异常跳跃标记
    /// 追加固定加成，合计仍封顶1.0。
    fn progression_score(progression: &ProgressionResult) -> f64 {
        let base = (progression.velocity / FULL_CREDIT_VELOCITY).min(1.0);
        let bonus = if progression.anomalous_jump {
            ANOMALY_BONUS
        } else {
            0.0
        };
        (base + bonus).min(1.0)
    }

    /// 公司声望子分数
    ///
    /// 当前/最近公司命中顶级名单得1.0，命中准顶级名单得
    /// 配置的部分分，否则0。名单完全来自配置。
    fn company_prestige_score(&self, profile: &StructuredProfile) -> f64 {
        let Some(company) = profile.current_or_recent_company() else {
            return 0.0;
        };
        let company = company.to_lowercase();
        if Self::matches_any(&company, &self.config.prestige_companies) {
            1.0
        } else if Self::matches_any(&company, &self.config.near_tier_companies) {
            self.config.near_tier_credit
        } else {
            0.0
        }
    }

    /// 头衔级别子分数：最近职级相对阶梯顶端的归一化值
    fn title_level_score(profile: &StructuredProfile) -> f64 {
        let level = profile
            .current_title
            .as_deref()
            .or_else(|| {
                profile
                    .most_recent_experience()
                    .map(|record| record.title.as_str())
            })
            .map(ProgressionAnalyzer::map_title)
            .unwrap_or(SeniorityLevel::IndividualContributor);
        (level.rank() as f64 / SeniorityLevel::max_rank() as f64).min(1.0)
    }

    /// 教育子分数
    ///
    /// 取所有教育经历在质量名单中的最高分，研究生学位追加
    /// 固定加成；没有任何教育经历时为0。
    fn education_score(&self, profile: &StructuredProfile) -> f64 {
        if profile.education.is_empty() {
            return 0.0;
        }
        let mut best: f64 = 0.0;
        for record in &profile.education {
            let school = record.school.to_lowercase();
            let mut score = self
                .config
                .education_quality
                .iter()
                .filter(|entry| school.contains(&entry.school.to_lowercase()))
                .map(|entry| entry.score)
                .fold(0.0, f64::max);
            if record.is_graduate_degree() {
                score = (score + GRADUATE_DEGREE_BONUS).min(1.0);
            }
            best = best.max(score);
        }
        best
    }

    fn matches_any(needle: &str, haystack: &[String]) -> bool {
        haystack
            .iter()
            .any(|entry| needle.contains(&entry.to_lowercase()))
    }
}
