// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;

use founderscout::config::settings::{SchoolQuality, ScoringSettings};
use founderscout::domain::models::profile::{
    EducationRecord, ExperienceRecord, StructuredProfile,
};
use founderscout::domain::services::age_estimator::AgeEstimator;
use founderscout::domain::services::progression_analyzer::ProgressionAnalyzer;
use founderscout::domain::services::scoring_engine::ScoringEngine;

const REFERENCE_YEAR: i32 = 2026;

fn settings() -> ScoringSettings {
    ScoringSettings {
        prestige_companies: vec!["Nimbus Labs".to_string()],
        near_tier_companies: vec!["Acme Corp".to_string()],
        education_quality: vec![SchoolQuality {
            school: "Stanford".to_string(),
            score: 1.0,
        }],
        ..ScoringSettings::default()
    }
}

fn date(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// 理想画像：28岁左右、顶级公司、4年IC到总监、名校
fn strong_profile() -> StructuredProfile {
    StructuredProfile {
        name: Some("Alice Chen".to_string()),
        headline: Some("Director of Engineering at Nimbus Labs".to_string()),
        current_title: Some("Director of Engineering".to_string()),
        current_company: Some("Nimbus Labs".to_string()),
        location: None,
        education: vec![EducationRecord {
            school: "Stanford University".to_string(),
            degree: Some("B.S. Computer Science".to_string()),
            graduation_year: Some(2020),
        }],
        experience: vec![
            ExperienceRecord {
                title: "Software Engineer".to_string(),
                company: "Nimbus Labs".to_string(),
                start: Some(date(2020, 6)),
                end: Some(date(2024, 6)),
            },
            ExperienceRecord {
                title: "Director of Engineering".to_string(),
                company: "Nimbus Labs".to_string(),
                start: Some(date(2024, 6)),
                end: None,
            },
        ],
        source_url: "https://example.com/in/alice".to_string(),
    }
}

/// 同样的职级序列，但没有教育背景也没有可推断年龄的日期
fn undated_profile() -> StructuredProfile {
    StructuredProfile {
        education: vec![],
        experience: vec![
            ExperienceRecord {
                title: "Software Engineer".to_string(),
                company: "Nimbus Labs".to_string(),
                start: None,
                end: None,
            },
            ExperienceRecord {
                title: "Director of Engineering".to_string(),
                company: "Nimbus Labs".to_string(),
                start: None,
                end: None,
            },
        ],
        ..strong_profile()
    }
}

fn score(profile: &StructuredProfile) -> founderscout::domain::models::score::ScoreBreakdown {
    let estimator = AgeEstimator::with_reference_year(REFERENCE_YEAR);
    let analyzer = ProgressionAnalyzer::with_reference_date(date(REFERENCE_YEAR, 1));
    let engine = ScoringEngine::new(settings()).unwrap();
    let age = estimator.estimate(profile);
    let progression = analyzer.analyze(profile);
    engine.score(profile, &age, &progression)
}

#[test]
fn test_strong_candidate_clears_high_band() {
    let breakdown = score(&strong_profile());

    assert_eq!(breakdown.age, 1.0);
    assert_eq!(breakdown.company_prestige, 1.0);
    assert_eq!(breakdown.education, 1.0);
    assert!(
        breakdown.total >= 0.75,
        "strong candidate scored {}",
        breakdown.total
    );
}

#[test]
fn test_missing_signals_never_substitute_defaults() {
    let strong = score(&strong_profile());
    let undated = score(&undated_profile());

    // 零置信度年龄与空教育经历都记0分，而不是代入中位数
    assert_eq!(undated.age, 0.0);
    assert_eq!(undated.education, 0.0);
    assert!(
        undated.total + 0.1 < strong.total,
        "undated {} vs strong {}",
        undated.total,
        strong.total
    );
}

#[test]
fn test_age_estimate_agreement_from_both_signals() {
    let estimator = AgeEstimator::with_reference_year(REFERENCE_YEAR);
    let estimate = estimator.estimate(&strong_profile());

    // 毕业年份与首份工作开始时间一致，置信度应为高档
    assert!((estimate.point - 28.0).abs() < 1.0);
    assert!(estimate.confidence >= 0.9);
}
