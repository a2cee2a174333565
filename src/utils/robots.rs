// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// robots.txt缓存TTL
const CACHE_TTL: Duration = Duration::from_secs(3600);
/// robots.txt抓取超时
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// 缓存的robots.txt内容
#[derive(Clone)]
struct CachedRobots {
    content: String,
    expires_at: Instant,
}

/// Robots.txt检查器
///
/// 按域名origin缓存robots.txt内容一小时。取不到robots.txt
/// 时放行（fail-open）：可用性问题不应阻塞抓取，只有明确的
/// Disallow规则才算策略禁止。
pub struct RobotsChecker {
    client: Client,
    cache: DashMap<String, CachedRobots>,
}

impl RobotsChecker {
    /// 创建新的Robots检查器实例
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            cache: DashMap::new(),
        }
    }

    /// 检查URL是否被允许访问
    ///
    /// # 参数
    ///
    /// * `url_str` - 目标URL
    /// * `user_agent` - 本系统的User-Agent标识
    ///
    /// # 返回值
    ///
    /// 被robots规则明确禁止时返回false，其余情况（包括
    /// robots.txt无法获取或解析失败）返回true
    pub async fn is_allowed(&self, url_str: &str, user_agent: &str) -> bool {
        let Ok(url) = Url::parse(url_str) else {
            return true;
        };
        let Some(content) = self.robots_content(&url).await else {
            return true;
        };
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&content, user_agent, url.path())
    }

    async fn robots_content(&self, url: &Url) -> Option<String> {
        let origin = format!(
            "{}://{}",
            url.scheme(),
            url.host_str()
                .map(|host| match url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                })
                .unwrap_or_default()
        );

        if let Some(cached) = self.cache.get(&origin) {
            if cached.expires_at > Instant::now() {
                return Some(cached.content.clone());
            }
        }

        let robots_url = format!("{}/robots.txt", origin);
        let content = match self
            .client
            .get(&robots_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                response.text().await.unwrap_or_default()
            }
            Ok(response) => {
                debug!(url = %robots_url, status = response.status().as_u16(), "robots.txt不可用，放行");
                // 404等情况按无限制处理，同样进缓存避免反复请求
                String::new()
            }
            Err(e) => {
                debug!(url = %robots_url, error = %e, "robots.txt抓取失败，放行");
                String::new()
            }
        };

        self.cache.insert(
            origin,
            CachedRobots {
                content: content.clone(),
                expires_at: Instant::now() + CACHE_TTL,
            },
        );
        Some(content)
    }
}

impl Default for RobotsChecker {
    fn default() -> Self {
        Self::new()
    }
}
