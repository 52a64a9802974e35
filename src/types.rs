//! 求人レコードと検索条件の型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 求人1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacancyRecord {
    pub position: String,
    /// 抽出時刻 (UTC, 末尾Z)
    pub created_at: DateTime<Utc>,
    /// サイト表示のまま ("вчера", "12 марта" など)
    pub published_at: String,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub currency: String,
    pub city: String,
    pub description: String,
    pub link: String,
}

/// 検索条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub position: String,
    /// 受け取るが検索URLには反映されない（地域は設定で固定）
    pub city: String,
}

impl SearchQuery {
    pub fn new(position: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            city: city.into(),
        }
    }
}

/// 1回の収集結果
#[derive(Debug, Clone, Default)]
pub struct CollectResult {
    pub vacancies: Vec<VacancyRecord>,
    /// 読み取ったページ数
    pub pages: usize,
    /// 抽出に失敗してスキップした求人数
    pub skipped: usize,
    /// 途中で中断した場合の原因
    pub aborted: Option<String>,
}

impl CollectResult {
    pub fn is_partial(&self) -> bool {
        self.aborted.is_some()
    }
}
