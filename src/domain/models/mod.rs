// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 定义系统的核心业务实体和数据结构
pub mod document;
pub mod profile;
pub mod score;
pub mod task;
