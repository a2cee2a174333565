// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 原始抓取文档
///
/// 抓取成功后产出的未解析内容。文档由抓取编排器独占持有，
/// 移交给提取服务后即被消费丢弃，不做持久化。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    /// 来源URL
    pub url: String,
    /// 文档内容
    pub content: String,
    /// 内容类型
    pub content_type: String,
    /// HTTP状态码
    pub status_code: u16,
    /// 抓取时间戳
    pub fetched_at: DateTime<Utc>,
}
