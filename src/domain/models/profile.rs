// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 结构化候选人画像
///
/// 从原始文档中提取出的职业生涯数据。除姓名和工作经历之外的
/// 所有字段都是可选的：缺失产出None/空，而不是提取失败。
///
/// 最小可用性不变量：姓名存在且工作经历非空，否则该文档的
/// 提取以MissingRequiredField失败。画像创建后不可变，重新评分
/// 需要一次全新的流水线运行，以保证可审计性。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredProfile {
    /// 姓名
    pub name: Option<String>,
    /// 简介标题
    pub headline: Option<String>,
    /// 当前头衔
    pub current_title: Option<String>,
    /// 当前公司
    pub current_company: Option<String>,
    /// 所在地
    pub location: Option<String>,
    /// 教育经历，按文档出现顺序
    pub education: Vec<EducationRecord>,
    /// 工作经历，按文档出现顺序
    pub experience: Vec<ExperienceRecord>,
    /// 来源URL，作为持久化的幂等键
    pub source_url: String,
}

impl StructuredProfile {
    /// 判断画像是否满足最小可用性不变量
    pub fn is_usable(&self) -> bool {
        self.name.is_some() && !self.experience.is_empty()
    }

    /// 最近一段工作经历
    ///
    /// 按开始日期取最近的一条；没有开始日期的记录排在最前
    /// （文档通常按时间倒序排列）。
    pub fn most_recent_experience(&self) -> Option<&ExperienceRecord> {
        self.experience
            .iter()
            .max_by_key(|record| (record.end.is_none(), record.start))
    }

    /// 当前或最近任职的公司
    pub fn current_or_recent_company(&self) -> Option<&str> {
        self.current_company
            .as_deref()
            .or_else(|| self.most_recent_experience().map(|r| r.company.as_str()))
    }
}

/// 教育经历记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    /// 学校名称
    pub school: String,
    /// 学位（可选）
    pub degree: Option<String>,
    /// 毕业年份（可选）
    pub graduation_year: Option<i32>,
}

impl EducationRecord {
    /// 判断是否为研究生及以上学位
    pub fn is_graduate_degree(&self) -> bool {
        let Some(degree) = &self.degree else {
            return false;
        };
        let degree = degree.to_lowercase();
        ["master", "mba", "phd", "doctor", "m.s", "ms "]
            .iter()
            .any(|keyword| degree.contains(keyword))
            || degree.trim() == "ms"
    }
}

/// 工作经历记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRecord {
    /// 头衔
    pub title: String,
    /// 公司
    pub company: String,
    /// 开始日期（可选）
    pub start: Option<NaiveDate>,
    /// 结束日期，None表示至今
    pub end: Option<NaiveDate>,
}
