// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含端到端的画像评分流水线用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和网关接口
pub mod domain;

/// 引擎模块
///
/// 实现抓取引擎、域名限流器与熔断器
pub mod engines;

/// 基础设施模块
///
/// 提供持久化网关等外部协作者的参考实现
pub mod infrastructure;

/// 队列模块
///
/// 实现抓取任务的内存调度队列
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现抓取编排器和工作器池
pub mod workers;
