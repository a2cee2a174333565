// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::FetchSettings;
use crate::domain::models::document::RawDocument;
use crate::engines::traits::{FetchEngine, FetchError, FetchRequest};
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// 引擎路由器
///
/// 优先走静态HTTP引擎，仅当静态结果被判定为内容不足且
/// 配置了渲染引擎时才升级到渲染路径。渲染引擎也失败时
/// 返回静态结果的错误语义：升级是尽力而为，不是兜底循环。
pub struct EngineRouter {
    primary: Box<dyn FetchEngine>,
    renderer: Option<Box<dyn FetchEngine>>,
    min_content_length: usize,
    required_selector: Option<Selector>,
}

impl EngineRouter {
    /// 创建新的引擎路由器
    ///
    /// # 参数
    ///
    /// * `primary` - 静态抓取引擎
    /// * `renderer` - 可选的渲染引擎
    /// * `settings` - 抓取配置，提供内容不足判定的阈值
    pub fn new(
        primary: Box<dyn FetchEngine>,
        renderer: Option<Box<dyn FetchEngine>>,
        settings: &FetchSettings,
    ) -> Self {
        let required_selector = settings
            .render_required_selector
            .as_deref()
            .and_then(|raw| match Selector::parse(raw) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    warn!(selector = raw, error = %e, "忽略无法解析的渲染判定选择器");
                    None
                }
            });
        Self {
            primary,
            renderer,
            min_content_length: settings.render_min_content_length,
            required_selector,
        }
    }

    /// 判定静态抓取结果是否内容不足
    ///
    /// 两个信号：正文长度低于阈值，或配置的关键选择器在
    /// 文档中不存在。任一命中即认为需要渲染。
    fn needs_render(&self, document: &RawDocument) -> bool {
        if document.content.len() < self.min_content_length {
            return true;
        }
        if let Some(selector) = &self.required_selector {
            let html = Html::parse_document(&document.content);
            if html.select(selector).next().is_none() {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl FetchEngine for EngineRouter {
    /// 路由抓取请求
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(RawDocument)` - 抓取到的原始文档
    /// * `Err(FetchError)` - 所选引擎的失败
    async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, FetchError> {
        let document = self.primary.fetch(request).await?;

        if let Some(renderer) = &self.renderer {
            if self.needs_render(&document) {
                debug!(url = %request.url, engine = renderer.name(), "静态结果内容不足，升级到渲染引擎");
                match renderer.fetch(request).await {
                    Ok(rendered) => return Ok(rendered),
                    Err(e) => {
                        warn!(url = %request.url, error = %e, "渲染引擎失败，保留静态结果");
                    }
                }
            }
        }

        Ok(document)
    }

    fn name(&self) -> &'static str {
        "router"
    }
}
