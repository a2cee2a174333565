// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::StructuredProfile;
use crate::domain::models::score::AgeEstimate;
use chrono::{Datelike, Utc};

/// 本科毕业的假定年龄
const BACHELOR_GRADUATION_AGE: i32 = 22;
/// 研究生及以上学位毕业的假定年龄
const GRADUATE_GRADUATION_AGE: i32 = 24;
/// 首份全职工作的假定起始年龄下限
const FIRST_ROLE_AGE: i32 = 22;
/// 首份工作假定在毕业后0–2年内开始，点估计取区间中点
const FIRST_ROLE_HALF_WINDOW: f64 = 1.0;
/// 两个信号视为一致的最大年差
const AGREEMENT_WINDOW: f64 = 2.0;
/// 年龄合理区间
const AGE_FLOOR: f64 = 18.0;
const AGE_CEILING: f64 = 100.0;

/// 年龄估计器
///
/// 从教育和工作经历时间线启发式推断年龄区间与置信度。
/// 参考年份在构造时注入，保证对同一画像的估计是确定性的。
pub struct AgeEstimator {
    /// 参考年份（通常为当前年份）
    reference_year: i32,
}

impl Default for AgeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl AgeEstimator {
    /// 创建以当前年份为参考的估计器
    pub fn new() -> Self {
        Self {
            reference_year: Utc::now().year(),
        }
    }

    /// 创建指定参考年份的估计器
    ///
    /// # 参数
    ///
    /// * `reference_year` - 参考年份
    pub fn with_reference_year(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// 估计候选人年龄
    ///
    /// 启发式规则：
    /// - 毕业信号：最近一条带毕业年份的教育经历，本科按22岁、
    ///   研究生按24岁毕业推算；
    /// - 经历信号：最早一段工作的开始日期，假定首份全职工作
    ///   在毕业后0–2年内开始，点估计按区间中点23岁起算；
    /// - 两个信号相差不超过2年时置信度高（0.9），相互矛盾或只有
    ///   单一信号时置信度低（≤0.4）且区间放宽；
    /// - 没有任何可用信号时返回零置信度估计而不是失败，
    ///   调用方必须显式处理零置信度。
    ///
    /// # 参数
    ///
    /// * `profile` - 结构化画像
    ///
    /// # 返回值
    ///
    /// 年龄估计结果
    pub fn estimate(&self, profile: &StructuredProfile) -> AgeEstimate {
        let graduation_signal = self.age_from_graduation(profile);
        let experience_signal = self.age_from_first_role(profile);

        match (graduation_signal, experience_signal) {
            (Some(from_grad), Some(from_exp)) => {
                let point = Self::clamp_age((from_grad + from_exp) / 2.0);
                if (from_grad - from_exp).abs() <= AGREEMENT_WINDOW {
                    AgeEstimate {
                        point,
                        low: Self::clamp_age(point - 2.0),
                        high: Self::clamp_age(point + 2.0),
                        confidence: 0.9,
                    }
                } else {
                    AgeEstimate {
                        point,
                        low: Self::clamp_age(point - 5.0),
                        high: Self::clamp_age(point + 5.0),
                        confidence: 0.35,
                    }
                }
            }
            (Some(single), None) | (None, Some(single)) => {
                let point = Self::clamp_age(single);
                AgeEstimate {
                    point,
                    low: Self::clamp_age(point - 5.0),
                    high: Self::clamp_age(point + 5.0),
                    confidence: 0.4,
                }
            }
            (None, None) => AgeEstimate::unknown(),
        }
    }

    /// 由毕业年份推算的年龄
    fn age_from_graduation(&self, profile: &StructuredProfile) -> Option<f64> {
        let latest = profile
            .education
            .iter()
            .filter(|record| record.graduation_year.is_some())
            .max_by_key(|record| record.graduation_year)?;

        let graduation_year = latest.graduation_year?;
        let graduation_age = if latest.is_graduate_degree() {
            GRADUATE_GRADUATION_AGE
        } else {
            BACHELOR_GRADUATION_AGE
        };
        Some((self.reference_year - graduation_year + graduation_age) as f64)
    }

    /// 由最早工作开始日期推算的年龄
    fn age_from_first_role(&self, profile: &StructuredProfile) -> Option<f64> {
        let earliest_start = profile
            .experience
            .iter()
            .filter_map(|record| record.start)
            .min()?;
        Some(
            (self.reference_year - earliest_start.year() + FIRST_ROLE_AGE) as f64
                + FIRST_ROLE_HALF_WINDOW,
        )
    }

    fn clamp_age(age: f64) -> f64 {
        age.clamp(AGE_FLOOR, AGE_CEILING)
    }
}
