// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, gauge};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// 熔断器配置
#[derive(Clone, Debug)]
pub struct BreakerConfig {
    /// 连续失败阈值
    pub failure_threshold: u32,
    /// 开路冷却时间
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// 熔断器状态枚举
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Status {
    /// 关闭状态，请求正常放行
    Closed,
    /// 打开状态，冷却期内拒绝所有请求
    Open,
    /// 半开状态，放行单个探测请求
    HalfOpen,
}

/// 熔断裁决
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakerDecision {
    /// 放行
    Proceed,
    /// 熔断中，给出剩余冷却时长
    Hold(Duration),
}

#[derive(Debug)]
struct DomainState {
    status: Status,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// 半开状态下是否已有在途探测
    probe_in_flight: bool,
}

impl DomainState {
    fn new() -> Self {
        Self {
            status: Status::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// 按域名熔断器
///
/// 每个域名独立计数连续瞬态失败，达到阈值后开路并在冷却期内
/// 拒绝该域名的全部请求。冷却期结束转半开，只放行一个探测
/// 请求：探测成功回到关闭并清零计数，失败立即重新开路。
///
/// 只有瞬态失败才计入计数，404等永久失败描述的是具体资源，
/// 不反映主机健康。
pub struct DomainCircuitBreaker {
    config: BreakerConfig,
    states: RwLock<HashMap<String, DomainState>>,
}

impl DomainCircuitBreaker {
    /// 创建新的熔断器
    ///
    /// # 参数
    ///
    /// * `config` - 熔断配置
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            states: RwLock::new(HashMap::new()),
        }
    }

    /// 检查域名是否放行
    ///
    /// # 参数
    ///
    /// * `domain` - 目标域名
    ///
    /// # 返回值
    ///
    /// * `BreakerDecision::Proceed` - 放行（半开时同时占用探测名额）
    /// * `BreakerDecision::Hold` - 熔断中，剩余冷却时长
    pub fn check(&self, domain: &str) -> BreakerDecision {
        let mut states = self.states.write();
        let state = states
            .entry(domain.to_string())
            .or_insert_with(DomainState::new);

        match state.status {
            Status::Closed => BreakerDecision::Proceed,
            Status::Open => {
                let opened_at = match state.opened_at {
                    Some(instant) => instant,
                    None => {
                        // 不应出现，按冷却已过处理
                        state.status = Status::HalfOpen;
                        state.probe_in_flight = true;
                        return BreakerDecision::Proceed;
                    }
                };
                let elapsed = opened_at.elapsed();
                if elapsed >= self.config.cooldown {
                    state.status = Status::HalfOpen;
                    state.probe_in_flight = true;
                    Self::record_status(domain, Status::HalfOpen);
                    tracing::info!(domain = domain, "熔断器冷却结束，转半开放行探测");
                    BreakerDecision::Proceed
                } else {
                    counter!("circuit_breaker_rejected_total", "domain" => domain.to_string())
                        .increment(1);
                    BreakerDecision::Hold(self.config.cooldown - elapsed)
                }
            }
            Status::HalfOpen => {
                if state.probe_in_flight {
                    counter!("circuit_breaker_rejected_total", "domain" => domain.to_string())
                        .increment(1);
                    BreakerDecision::Hold(self.config.cooldown)
                } else {
                    state.probe_in_flight = true;
                    BreakerDecision::Proceed
                }
            }
        }
    }

    /// 记录一次成功
    ///
    /// 关闭状态下清零连续失败计数，半开状态下探测成功回到关闭。
    pub fn record_success(&self, domain: &str) {
        let mut states = self.states.write();
        let state = states
            .entry(domain.to_string())
            .or_insert_with(DomainState::new);

        counter!("circuit_breaker_successes_total", "domain" => domain.to_string()).increment(1);

        match state.status {
            Status::Closed => {
                state.consecutive_failures = 0;
            }
            Status::HalfOpen => {
                state.status = Status::Closed;
                state.consecutive_failures = 0;
                state.opened_at = None;
                state.probe_in_flight = false;
                Self::record_status(domain, Status::Closed);
                tracing::info!(domain = domain, "探测成功，熔断器关闭");
            }
            Status::Open => {
                // 开路期间不应有成功上报，忽略
            }
        }
    }

    /// 记录一次瞬态失败
    ///
    /// 调用方负责只上报瞬态失败。关闭状态下计数达到阈值时开路，
    /// 半开状态下探测失败立即重新开路。
    pub fn record_failure(&self, domain: &str) {
        let mut states = self.states.write();
        let state = states
            .entry(domain.to_string())
            .or_insert_with(DomainState::new);

        counter!("circuit_breaker_failures_total", "domain" => domain.to_string()).increment(1);

        match state.status {
            Status::Closed => {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= self.config.failure_threshold {
                    state.status = Status::Open;
                    state.opened_at = Some(Instant::now());
                    Self::record_status(domain, Status::Open);
                    tracing::warn!(
                        domain = domain,
                        failures = state.consecutive_failures,
                        "连续失败达到阈值，熔断器开路"
                    );
                }
            }
            Status::HalfOpen => {
                state.status = Status::Open;
                state.opened_at = Some(Instant::now());
                state.probe_in_flight = false;
                Self::record_status(domain, Status::Open);
                tracing::warn!(domain = domain, "探测失败，熔断器重新开路");
            }
            Status::Open => {}
        }
    }

    /// 查询域名当前状态
    pub fn status(&self, domain: &str) -> Status {
        self.states
            .read()
            .get(domain)
            .map(|state| state.status)
            .unwrap_or(Status::Closed)
    }

    fn record_status(domain: &str, status: Status) {
        let value = match status {
            Status::Closed => 0.0,
            Status::HalfOpen => 1.0,
            Status::Open => 2.0,
        };
        gauge!("circuit_breaker_status", "domain" => domain.to_string()).set(value);
    }
}
