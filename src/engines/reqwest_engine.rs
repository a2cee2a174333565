// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::document::RawDocument;
use crate::engines::traits::{FetchEngine, FetchError, FetchRequest};
use async_trait::async_trait;
use chrono::Utc;

/// 静态HTTP抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎，公开档案文档的
/// 默认抓取路径。客户端在构造时建好并被所有请求复用，
/// 连接池因此得以共享。
pub struct HttpFetchEngine {
    client: reqwest::Client,
}

impl HttpFetchEngine {
    /// 创建新的静态抓取引擎
    ///
    /// # 参数
    ///
    /// * `user_agent` - 请求携带的User-Agent标识
    ///
    /// # 返回值
    ///
    /// * `Ok(HttpFetchEngine)` - 引擎实例
    /// * `Err(FetchError)` - 客户端构建失败
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::ConnectionFailure(e.to_string()))?;
        Ok(Self { client })
    }

    fn map_reqwest_error(error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = error.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::ConnectionFailure(error.to_string())
        }
    }
}

#[async_trait]
impl FetchEngine for HttpFetchEngine {
    /// 执行HTTP抓取
    ///
    /// 非2xx响应一律转成`FetchError::HttpStatus`，响应体不读取。
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(RawDocument)` - 抓取到的原始文档
    /// * `Err(FetchError)` - 抓取过程中出现的错误
    async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, FetchError> {
        let response = self
            .client
            .get(&request.url)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(status_code));
        }

        // 重复的content-type头以最后一个为准
        let content_type = response
            .headers()
            .get_all(reqwest::header::CONTENT_TYPE)
            .iter()
            .last()
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        let content = response.text().await.map_err(Self::map_reqwest_error)?;

        Ok(RawDocument {
            url: request.url.clone(),
            content,
            content_type,
            status_code,
            fetched_at: Utc::now(),
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
