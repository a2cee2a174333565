// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScoringWeights;
use serde::{Deserialize, Serialize};

/// 年龄估计结果
///
/// 启发式推断的年龄点估计与区间，confidence取值[0,1]。
/// 派生数据，不做权威存储。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeEstimate {
    /// 点估计（岁）
    pub point: f64,
    /// 区间下界
    pub low: f64,
    /// 区间上界
    pub high: f64,
    /// 置信度，取值[0,1]
    pub confidence: f64,
}

impl AgeEstimate {
    /// 完全不确定的估计
    ///
    /// 没有任何可用信号时返回，置信度为0。调用方必须显式处理
    /// 零置信度：评分引擎将其年龄子分数记为0，绝不代入中位数。
    pub fn unknown() -> Self {
        Self {
            point: 0.0,
            low: 18.0,
            high: 100.0,
            confidence: 0.0,
        }
    }

    /// 是否存在可用信号
    pub fn has_signal(&self) -> bool {
        self.confidence > 0.0
    }
}

/// 职级阶梯
///
/// 用于量化头衔晋升的有序职业级别。创始人/所有者类头衔
/// 映射到Executive并由分析器单独打上异常跳跃标记。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    /// 个人贡献者
    IndividualContributor,
    /// 高级个人贡献者
    SeniorIc,
    /// 技术负责人/资深专家
    Lead,
    /// 经理
    Manager,
    /// 总监
    Director,
    /// 高管/创始人
    Executive,
}

impl SeniorityLevel {
    /// 阶梯数值，从1开始
    pub fn rank(&self) -> u8 {
        match self {
            SeniorityLevel::IndividualContributor => 1,
            SeniorityLevel::SeniorIc => 2,
            SeniorityLevel::Lead => 3,
            SeniorityLevel::Manager => 4,
            SeniorityLevel::Director => 5,
            SeniorityLevel::Executive => 6,
        }
    }

    /// 阶梯最高级别的数值
    pub fn max_rank() -> u8 {
        SeniorityLevel::Executive.rank()
    }
}

/// 职业晋升分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionResult {
    /// 与工作经历逐条对齐的职级序列（按时间先后排序）
    pub levels: Vec<SeniorityLevel>,
    /// 晋升速度（级/年），跨度不足一年时按一年下限折算
    pub velocity: f64,
    /// 异常跳跃标记：相邻两段职级跳跃超过两级，
    /// 或出现创始人/所有者类头衔
    pub anomalous_jump: bool,
}

/// 评分明细
///
/// 五项子分数各自取值[0,1]，total为加权和，构造上保证落在[0,1]。
/// 明细创建后不可变。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// 年龄子分数
    pub age: f64,
    /// 职业晋升子分数
    pub progression: f64,
    /// 公司声望子分数
    pub company_prestige: f64,
    /// 头衔级别子分数
    pub title_level: f64,
    /// 教育背景子分数
    pub education: f64,
    /// 使用的权重
    pub weights: ScoringWeights,
    /// 加权总分，取值[0,1]
    pub total: f64,
}
