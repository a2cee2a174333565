// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// 抓取任务实体
///
/// 表示一次运行中针对单个目标URL的工作单元。任务在一次运行内
/// 按URL唯一，只由编排器本身修改（尝试计数、调度时间），
/// 到达终态（Succeeded/Failed）后归档，不再变化。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 目标URL
    pub url: String,
    /// 目标域名，用于限流和熔断的键
    pub domain: String,
    /// 任务优先级，数值越大优先级越高
    pub priority: i32,
    /// 任务状态
    pub status: TaskStatus,
    /// 已执行的抓取尝试次数
    pub attempt_count: u32,
    /// 下次可执行时间，None表示立即可执行
    pub scheduled_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 到达终态的时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 终态失败原因
    pub failure_cause: Option<String>,
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Queued → InFlight → Succeeded | Retrying → Queued | Failed
/// Succeeded与Failed为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 已入队，任务等待执行
    #[default]
    Queued,
    /// 执行中，一次抓取尝试正在进行
    InFlight,
    /// 等待重试，下一次尝试已按退避时间排期
    Retrying,
    /// 已成功，文档已产出（终态）
    Succeeded,
    /// 已失败（终态）
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::InFlight => write!(f, "in_flight"),
            TaskStatus::Retrying => write!(f, "retrying"),
            TaskStatus::Succeeded => write!(f, "succeeded"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当任务状态转换不符合业务规则时发生
    #[error("Invalid state transition from {0}")]
    InvalidStateTransition(TaskStatus),

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl fmt::Display for CrawlTask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}]", self.url, self.status)
    }
}

impl CrawlTask {
    /// 创建一个新的抓取任务
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `domain` - 目标域名
    /// * `priority` - 任务优先级
    ///
    /// # 返回值
    ///
    /// 返回新创建的任务实例，初始状态为Queued
    pub fn new(url: String, domain: String, priority: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            domain,
            priority,
            status: TaskStatus::Queued,
            attempt_count: 0,
            scheduled_at: None,
            created_at: Utc::now(),
            completed_at: None,
            failure_cause: None,
        }
    }

    /// 启动一次抓取尝试
    ///
    /// 将任务状态从Queued/Retrying变更为InFlight，并递增尝试计数
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 转换成功
    /// * `Err(DomainError)` - 状态转换失败
    pub fn start_attempt(&mut self) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::Queued | TaskStatus::Retrying => {
                self.status = TaskStatus::InFlight;
                self.attempt_count += 1;
                Ok(())
            }
            other => Err(DomainError::InvalidStateTransition(other)),
        }
    }

    /// 标记任务成功（终态）
    pub fn succeed(&mut self) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::InFlight => {
                self.status = TaskStatus::Succeeded;
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DomainError::InvalidStateTransition(other)),
        }
    }

    /// 排期重试
    ///
    /// 将任务转入Retrying状态并记录下次可执行时间
    ///
    /// # 参数
    ///
    /// * `next_eligible` - 下次可执行时间
    pub fn schedule_retry(&mut self, next_eligible: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::InFlight => {
                self.status = TaskStatus::Retrying;
                self.scheduled_at = Some(next_eligible);
                Ok(())
            }
            other => Err(DomainError::InvalidStateTransition(other)),
        }
    }

    /// 标记任务失败（终态）
    ///
    /// # 参数
    ///
    /// * `cause` - 失败原因
    pub fn fail(&mut self, cause: String) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::Queued | TaskStatus::InFlight | TaskStatus::Retrying => {
                self.status = TaskStatus::Failed;
                self.completed_at = Some(Utc::now());
                self.failure_cause = Some(cause);
                Ok(())
            }
            other => Err(DomainError::InvalidStateTransition(other)),
        }
    }

    /// 判断任务是否已到达终态
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded | TaskStatus::Failed)
    }

    /// 判断任务是否还可以重试
    ///
    /// # 参数
    ///
    /// * `max_attempts` - 最大尝试次数
    pub fn can_retry(&self, max_attempts: u32) -> bool {
        self.attempt_count < max_attempts
    }
}
