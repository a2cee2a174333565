// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::StructuredProfile;
use crate::domain::models::score::ScoreBreakdown;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 网关错误类型
#[derive(Error, Debug)]
pub enum GatewayError {
    /// 存储错误
    #[error("Storage error: {0}")]
    Storage(String),

    /// 无效查询参数
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// 已评分画像记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredProfileRecord {
    /// 记录标识符，按来源URL保持稳定
    pub id: Uuid,
    /// 结构化画像
    pub profile: StructuredProfile,
    /// 评分明细
    pub score: ScoreBreakdown,
    /// 保存时间
    pub saved_at: DateTime<Utc>,
}

/// 画像查询条件
#[derive(Debug, Clone, Default)]
pub struct ProfileQuery {
    /// 最低总分过滤
    pub min_total: Option<f64>,
    /// 公司名包含过滤（大小写不敏感）
    pub company: Option<String>,
    /// 返回条数上限，0表示不限制
    pub limit: usize,
    /// 偏移量
    pub offset: usize,
}

/// 持久化网关特质
///
/// 核心将持久化视为黑盒外部协作者：每个成功评分的画像保存
/// 一条记录，并要求按来源身份幂等——同一来源重复保存是更新
/// 而非新增，返回相同的记录ID。
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    /// 保存画像及其评分
    ///
    /// # 参数
    ///
    /// * `profile` - 结构化画像
    /// * `score` - 评分明细
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 记录ID，同一来源URL重复保存时保持不变
    /// * `Err(GatewayError)` - 保存失败
    async fn save(
        &self,
        profile: &StructuredProfile,
        score: &ScoreBreakdown,
    ) -> Result<Uuid, GatewayError>;

    /// 分页查询已评分画像
    async fn query(&self, query: &ProfileQuery) -> Result<Vec<ScoredProfileRecord>, GatewayError>;
}

#[async_trait]
impl<T: ProfileGateway + ?Sized> ProfileGateway for std::sync::Arc<T> {
    async fn save(
        &self,
        profile: &StructuredProfile,
        score: &ScoreBreakdown,
    ) -> Result<Uuid, GatewayError> {
        (**self).save(profile, score).await
    }

    async fn query(&self, query: &ProfileQuery) -> Result<Vec<ScoredProfileRecord>, GatewayError> {
        (**self).query(query).await
    }
}
