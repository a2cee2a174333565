// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::document::RawDocument;
use crate::domain::models::profile::{EducationRecord, ExperienceRecord, StructuredProfile};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// 提取错误类型
///
/// 两种错误都是局部的：出错的文档被跳过并记录原因，
/// 运行继续，绝不导致整次运行失败。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractionError {
    /// 缺少必需字段（姓名或工作经历）
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// 文档完全无法按预期结构解析
    #[error("Malformed document")]
    MalformedDocument,
}

static NAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".profile-name, h1.name").unwrap());
static HEADLINE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".profile-headline, .headline").unwrap());
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".profile-title").unwrap());
static COMPANY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".profile-company").unwrap());
static LOCATION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".profile-location").unwrap());
static EXPERIENCE_ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".experience-item").unwrap());
static EDUCATION_ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".education-item").unwrap());
static ITEM_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".title").unwrap());
static ITEM_COMPANY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".company").unwrap());
static ITEM_DURATION_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".duration").unwrap());
static ITEM_SCHOOL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".school").unwrap());
static ITEM_DEGREE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".degree").unwrap());
static ITEM_YEAR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".year").unwrap());

static MONTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{4})\b")
        .unwrap()
});
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static RANGE_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(?:-|–|—|to)\s+|(?:–|—)").unwrap());
static PRESENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(present|current|now|today)\b").unwrap());

/// 画像提取服务
///
/// 负责将原始文档解析为结构化画像。解析是确定性的、
/// 无副作用的：相同输入永远产出字段完全一致的画像。
pub struct ExtractionService;

impl ExtractionService {
    /// 提取结构化画像
    ///
    /// 除姓名与工作经历外，每个字段都是宽容可选的：
    /// 缺失产出None/空，绝不报错。
    ///
    /// # 参数
    ///
    /// * `document` - 原始抓取文档
    ///
    /// # 返回值
    ///
    /// * `Ok(StructuredProfile)` - 满足最小可用性不变量的画像
    /// * `Err(ExtractionError)` - 文档结构非法或必需字段缺失
    pub fn extract(document: &RawDocument) -> Result<StructuredProfile, ExtractionError> {
        if !document.content_type.to_lowercase().contains("html") {
            return Err(ExtractionError::MalformedDocument);
        }

        let html = Html::parse_document(&document.content);

        // 完全不含画像标记的文档视为结构非法
        let has_profile_markers = html.select(&NAME_SELECTOR).next().is_some()
            || html.select(&TITLE_SELECTOR).next().is_some()
            || html.select(&EXPERIENCE_ITEM_SELECTOR).next().is_some()
            || html.select(&EDUCATION_ITEM_SELECTOR).next().is_some();
        if !has_profile_markers {
            return Err(ExtractionError::MalformedDocument);
        }

        let name = Self::first_text(&html, &NAME_SELECTOR);
        if name.is_none() {
            return Err(ExtractionError::MissingRequiredField("name"));
        }

        let experience: Vec<ExperienceRecord> = html
            .select(&EXPERIENCE_ITEM_SELECTOR)
            .filter_map(Self::parse_experience_item)
            .collect();
        if experience.is_empty() {
            return Err(ExtractionError::MissingRequiredField("experience"));
        }

        let education: Vec<EducationRecord> = html
            .select(&EDUCATION_ITEM_SELECTOR)
            .filter_map(Self::parse_education_item)
            .collect();

        Ok(StructuredProfile {
            name,
            headline: Self::first_text(&html, &HEADLINE_SELECTOR),
            current_title: Self::first_text(&html, &TITLE_SELECTOR),
            current_company: Self::first_text(&html, &COMPANY_SELECTOR),
            location: Self::first_text(&html, &LOCATION_SELECTOR),
            education,
            experience,
            source_url: document.url.clone(),
        })
    }

    /// 选取首个匹配元素的规整文本
    fn first_text(html: &Html, selector: &Selector) -> Option<String> {
        html.select(selector).next().and_then(Self::element_text)
    }

    /// 规整元素文本：合并子节点文本并压缩空白
    fn element_text(element: ElementRef) -> Option<String> {
        let joined = element.text().collect::<Vec<_>>().join(" ");
        let normalized = joined.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        }
    }

    fn child_text(element: ElementRef, selector: &Selector) -> Option<String> {
        element.select(selector).next().and_then(Self::element_text)
    }

    fn parse_experience_item(item: ElementRef) -> Option<ExperienceRecord> {
        let title = Self::child_text(item, &ITEM_TITLE_SELECTOR);
        let company = Self::child_text(item, &ITEM_COMPANY_SELECTOR);
        let duration = Self::child_text(item, &ITEM_DURATION_SELECTOR);

        // 完全空白的条目直接跳过
        if title.is_none() && company.is_none() && duration.is_none() {
            return None;
        }

        let (start, end) = duration
            .as_deref()
            .map(Self::parse_duration)
            .unwrap_or((None, None));

        Some(ExperienceRecord {
            title: title.unwrap_or_default(),
            company: company.unwrap_or_default(),
            start,
            end,
        })
    }

    fn parse_education_item(item: ElementRef) -> Option<EducationRecord> {
        let school = Self::child_text(item, &ITEM_SCHOOL_SELECTOR)?;
        let degree = Self::child_text(item, &ITEM_DEGREE_SELECTOR);
        let graduation_year = Self::child_text(item, &ITEM_YEAR_SELECTOR)
            .as_deref()
            .and_then(Self::parse_year);

        Some(EducationRecord {
            school,
            degree,
            graduation_year,
        })
    }

    /// 解析时间跨度字符串
    ///
    /// 支持 "Jan 2018 - Mar 2021"、"2018 - 2021"、"2019 - Present" 等
    /// 常见写法；"present"/"current" 结束端解析为None（至今）。
    ///
    /// # 返回值
    ///
    /// (开始日期, 结束日期)，任一端无法解析时为None
    pub fn parse_duration(duration: &str) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let mut parts = RANGE_SPLIT_RE.splitn(duration, 2);
        let start_part = parts.next().unwrap_or(duration);
        let end_part = parts.next();

        let start = Self::parse_date_token(start_part);
        let end = match end_part {
            Some(token) if PRESENT_RE.is_match(token) => None,
            Some(token) => Self::parse_date_token(token),
            None => None,
        };
        (start, end)
    }

    /// 解析单个日期记号："Jan 2018" 或 "2018"
    fn parse_date_token(token: &str) -> Option<NaiveDate> {
        if let Some(captures) = MONTH_YEAR_RE.captures(token) {
            let month = match captures[1].to_lowercase().as_str() {
                "jan" => 1,
                "feb" => 2,
                "mar" => 3,
                "apr" => 4,
                "may" => 5,
                "jun" => 6,
                "jul" => 7,
                "aug" => 8,
                "sep" => 9,
                "oct" => 10,
                "nov" => 11,
                "dec" => 12,
                _ => return None,
            };
            let year: i32 = captures[2].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, 1);
        }
        let year = Self::parse_year(token)?;
        NaiveDate::from_ymd_opt(year, 1, 1)
    }

    /// 从文本中解析四位年份
    fn parse_year(text: &str) -> Option<i32> {
        YEAR_RE.find(text).and_then(|m| m.as_str().parse().ok())
    }
}
