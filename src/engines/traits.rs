// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::document::RawDocument;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 抓取错误类型
///
/// 所有抓取失败都归入同一个有限分类，重试判定只看分类，
/// 不看错误产生的引擎。
#[derive(Error, Debug)]
pub enum FetchError {
    /// 请求超时
    #[error("Fetch timed out")]
    Timeout,
    /// 非2xx状态码
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    /// 连接层故障（DNS、TCP、TLS）
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),
    /// robots策略禁止抓取
    #[error("Disallowed by robots policy")]
    PolicyDisallowed,
}

impl FetchError {
    /// 判断错误是否可重试
    ///
    /// 超时、连接故障以及408/429/5xx状态码是瞬态故障；
    /// 其余HTTP状态与策略禁止是永久失败，重试毫无意义。
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::ConnectionFailure(_) => true,
            FetchError::HttpStatus(status) => {
                matches!(status, 408 | 429) || (500..=599).contains(status)
            }
            FetchError::PolicyDisallowed => false,
        }
    }

    /// 判断失败是否计入熔断器
    ///
    /// 永久失败（404、策略禁止等）说明的是目标资源而不是
    /// 目标主机的健康状况，不应推动熔断器开路。
    pub fn counts_toward_breaker(&self) -> bool {
        self.is_retryable()
    }
}

/// 抓取请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// 超时时间
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

/// 抓取引擎trait
///
/// 静态HTTP引擎与渲染引擎共用同一接口，路由器据此
/// 在两者间切换而调用方无感知。
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// 执行抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(RawDocument)` - 抓取到的原始文档
    /// * `Err(FetchError)` - 抓取过程中出现的错误
    async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, FetchError>;

    /// 引擎名称，用于日志与指标
    fn name(&self) -> &'static str;
}
