// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::FetchSettings;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use metrics::counter;
use std::num::NonZeroU32;
use std::time::Duration;

/// 限流裁决
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// 允许通过，令牌已扣除
    Granted,
    /// 令牌不足，给出建议的等待时长
    RetryAfter(Duration),
}

/// 按域名限流器
///
/// 每个域名独立一个令牌桶，按分钟速率补充、允许小幅突发。
/// 拒绝不消耗令牌，调用方按返回的等待时长退避后重新申请，
/// 因此长时间过载下的通过速率不会超过配置速率。
pub struct DomainRateLimiter {
    limiter: RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
    clock: DefaultClock,
}

impl DomainRateLimiter {
    /// 创建新的按域名限流器
    ///
    /// # 参数
    ///
    /// * `settings` - 抓取配置，提供每分钟速率与突发容量
    pub fn new(settings: &FetchSettings) -> Self {
        let per_minute = NonZeroU32::new(settings.rate_limit_per_domain.max(1))
            .unwrap_or(NonZeroU32::MIN);
        let burst =
            NonZeroU32::new(settings.rate_limit_burst.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute).allow_burst(burst);
        let clock = DefaultClock::default();
        let limiter = RateLimiter::new(quota, DefaultKeyedStateStore::default(), clock.clone());
        Self { limiter, clock }
    }

    /// 申请抓取许可
    ///
    /// # 参数
    ///
    /// * `domain` - 目标域名
    ///
    /// # 返回值
    ///
    /// * `Admission::Granted` - 获得许可
    /// * `Admission::RetryAfter` - 应等待给定时长后重试
    pub fn admit(&self, domain: &str) -> Admission {
        match self.limiter.check_key(&domain.to_string()) {
            Ok(()) => {
                counter!("rate_limiter_granted_total", "domain" => domain.to_string())
                    .increment(1);
                Admission::Granted
            }
            Err(not_until) => {
                counter!("rate_limiter_throttled_total", "domain" => domain.to_string())
                    .increment(1);
                Admission::RetryAfter(not_until.wait_time_from(self.clock.now()))
            }
        }
    }
}
