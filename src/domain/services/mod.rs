// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含系统的核心业务逻辑服务：
/// - 提取服务（extraction_service）：原始文档到结构化画像的纯转换
/// - 年龄估计器（age_estimator）：基于教育/经历时间线的启发式推断
/// - 晋升分析器（progression_analyzer）：头衔到职级阶梯的映射与速度计算
/// - 评分引擎（scoring_engine）：子分数的加权合成
///
/// 这些服务全部是纯函数式的：无I/O、无锁，
/// 可以在任意并行度下跨画像调用。
pub mod age_estimator;
pub mod extraction_service;
pub mod progression_analyzer;
pub mod scoring_engine;
