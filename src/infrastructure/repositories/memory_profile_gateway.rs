// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::models::profile::StructuredProfile;
use crate::domain::models::score::ScoreBreakdown;
use crate::domain::repositories::profile_gateway::{
    GatewayError, ProfileGateway, ProfileQuery, ScoredProfileRecord,
};

/// 内存画像存储
///
/// 以source_url为主键的进程内实现。同一URL重复保存视为
/// 更新：记录ID保持不变，画像与评分被新值覆盖，一次运行
/// 内重复抓到同一档案不会产生重复记录。
#[derive(Default)]
pub struct MemoryProfileGateway {
    records: DashMap<String, ScoredProfileRecord>,
}

impl MemoryProfileGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前保存的记录数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ProfileGateway for MemoryProfileGateway {
    async fn save(
        &self,
        profile: &StructuredProfile,
        score: &ScoreBreakdown,
    ) -> Result<Uuid, GatewayError> {
        let id = self
            .records
            .get(&profile.source_url)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);

        self.records.insert(
            profile.source_url.clone(),
            ScoredProfileRecord {
                id,
                profile: profile.clone(),
                score: score.clone(),
                saved_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn query(&self, query: &ProfileQuery) -> Result<Vec<ScoredProfileRecord>, GatewayError> {
        let company_filter = query.company.as_ref().map(|c| c.to_lowercase());

        let mut matches: Vec<ScoredProfileRecord> = self
            .records
            .iter()
            .filter(|entry| {
                let record = entry.value();
                if let Some(min_total) = query.min_total {
                    if record.score.total < min_total {
                        return false;
                    }
                }
                if let Some(company) = &company_filter {
                    let hit = record
                        .profile
                        .current_or_recent_company()
                        .map(|c| c.to_lowercase().contains(company))
                        .unwrap_or(false);
                    if !hit {
                        return false;
                    }
                }
                true
            })
            .map(|entry| entry.value().clone())
            .collect();

        // 总分降序，平分时按保存时间先后保证输出稳定
        matches.sort_by(|a, b| {
            b.score
                .total
                .partial_cmp(&a.score.total)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.saved_at.cmp(&b.saved_at))
        });

        let limit = if query.limit == 0 {
            usize::MAX
        } else {
            query.limit
        };
        Ok(matches.into_iter().skip(query.offset).take(limit).collect())
    }
}
