// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{ExperienceRecord, StructuredProfile};
use crate::domain::models::score::{ProgressionResult, SeniorityLevel};
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;

/// 跨度折算的一年下限，避免除法爆炸
const MIN_SPAN_YEARS: f64 = 1.0;
/// 相邻职级跳跃超过该值视为异常
const ANOMALOUS_JUMP_LEVELS: i32 = 2;

/// 创始人/所有者类头衔关键词（已规范化为小写词元）
///
/// 命中即打上异常跳跃标记（映射到Executive级别）
static FOUNDER_KEYWORDS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["founder", "cofounder", "owner", "entrepreneur"]);

/// 头衔关键词到职级的映射表（已规范化为小写词元）
///
/// 按从高到低的顺序匹配，首个命中生效；未命中的头衔
/// 默认为个人贡献者级别。匹配以完整词元为单位，
/// 避免诸如"cto"落入"director"、"coo"落入"coordinator"
/// 的子串误命中。
static LADDER_KEYWORDS: Lazy<Vec<(&'static str, SeniorityLevel)>> = Lazy::new(|| {
    vec![
        ("founder", SeniorityLevel::Executive),
        ("cofounder", SeniorityLevel::Executive),
        ("owner", SeniorityLevel::Executive),
        ("entrepreneur", SeniorityLevel::Executive),
        ("chief", SeniorityLevel::Executive),
        ("ceo", SeniorityLevel::Executive),
        ("cto", SeniorityLevel::Executive),
        ("cfo", SeniorityLevel::Executive),
        ("coo", SeniorityLevel::Executive),
        ("president", SeniorityLevel::Executive),
        ("vp", SeniorityLevel::Executive),
        ("vice president", SeniorityLevel::Executive),
        ("executive", SeniorityLevel::Executive),
        ("director", SeniorityLevel::Director),
        ("head of", SeniorityLevel::Director),
        ("manager", SeniorityLevel::Manager),
        ("principal", SeniorityLevel::Lead),
        ("staff", SeniorityLevel::Lead),
        ("lead", SeniorityLevel::Lead),
        ("senior", SeniorityLevel::SeniorIc),
        ("sr", SeniorityLevel::SeniorIc),
    ]
});

/// 把头衔规范化为空格分隔的小写词元串
///
/// 非字母数字字符一律作为分隔符，"Co-Founder & CEO"规范化为
/// "co founder ceo"，关键词匹配在词元边界上进行。
fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 词元边界上的关键词匹配
fn contains_keyword(normalized: &str, keyword: &str) -> bool {
    format!(" {} ", normalized).contains(&format!(" {} ", keyword))
}

/// 职业晋升分析器
///
/// 将头衔历史映射到职级阶梯并计算晋升速度。
/// "至今"的结束日期以构造时注入的参考日期折算，
/// 保证分析结果确定可复现。
pub struct ProgressionAnalyzer {
    /// "至今"折算用的参考日期
    reference_date: NaiveDate,
}

impl Default for ProgressionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionAnalyzer {
    /// 创建以当前日期为参考的分析器
    pub fn new() -> Self {
        Self {
            reference_date: Utc::now().date_naive(),
        }
    }

    /// 创建指定参考日期的分析器
    pub fn with_reference_date(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    /// 分析职业晋升
    ///
    /// - 速度 = (最终职级 − 起始职级) / 经历总跨度年数，
    ///   跨度不足一年时按一年折算；
    /// - 相邻两段职级跳跃超过两级，或出现创始人/所有者类头衔时
    ///   打上异常跳跃标记；该标记只作为评分加成输入，
    ///   不直接修改速度。
    ///
    /// # 参数
    ///
    /// * `profile` - 结构化画像
    ///
    /// # 返回值
    ///
    /// 晋升分析结果，职级序列与按时间排序后的经历逐条对齐
    pub fn analyze(&self, profile: &StructuredProfile) -> ProgressionResult {
        let mut records: Vec<&ExperienceRecord> = profile.experience.iter().collect();
        // 无开始日期的记录排到最前，不扰动有日期记录的时间顺序
        records.sort_by_key(|record| record.start);

        let levels: Vec<SeniorityLevel> = records
            .iter()
            .map(|record| Self::map_title(&record.title))
            .collect();

        let mut anomalous_jump = records
            .iter()
            .any(|record| Self::is_founder_title(&record.title));
        for pair in levels.windows(2) {
            let jump = pair[1].rank() as i32 - pair[0].rank() as i32;
            if jump > ANOMALOUS_JUMP_LEVELS {
                anomalous_jump = true;
            }
        }

        let velocity = match (levels.first(), levels.last()) {
            (Some(first), Some(last)) => {
                let gained = last.rank() as f64 - first.rank() as f64;
                let span = self.span_years(&records).max(MIN_SPAN_YEARS);
                (gained / span).max(0.0)
            }
            _ => 0.0,
        };

        ProgressionResult {
            levels,
            velocity,
            anomalous_jump,
        }
    }

    /// 将头衔映射到职级
    ///
    /// 未命中任何关键词的头衔默认为个人贡献者
    pub fn map_title(title: &str) -> SeniorityLevel {
        let normalized = normalize_title(title);
        for (keyword, level) in LADDER_KEYWORDS.iter() {
            if contains_keyword(&normalized, keyword) {
                return *level;
            }
        }
        SeniorityLevel::IndividualContributor
    }

    /// 判断是否为创始人/所有者类头衔
    pub fn is_founder_title(title: &str) -> bool {
        let normalized = normalize_title(title);
        FOUNDER_KEYWORDS
            .iter()
            .any(|keyword| contains_keyword(&normalized, keyword))
    }

    /// 经历总跨度（年）：最早开始到最晚结束（至今按参考日期计）
    fn span_years(&self, records: &[&ExperienceRecord]) -> f64 {
        let earliest = records.iter().filter_map(|record| record.start).min();
        let latest = records
            .iter()
            .map(|record| record.end.unwrap_or(self.reference_date))
            .max();
        match (earliest, latest) {
            (Some(start), Some(end)) if end > start => {
                (end - start).num_days() as f64 / 365.25
            }
            _ => 0.0,
        }
    }
}
