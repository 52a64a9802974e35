//! 求人レコードの保存先
//!
//! TinyDB互換のJSONファイル: `{"_default": {"1": {...}, "2": {...}}}`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::ScraperError;
use crate::types::VacancyRecord;

pub const DEFAULT_TABLE: &str = "_default";

type Table = BTreeMap<u64, serde_json::Value>;
type Database = BTreeMap<String, Table>;

/// 追記結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendSummary {
    pub inserted: usize,
    pub failed: usize,
}

pub trait RecordStore {
    /// 1件ずつ書き込む。1件の失敗で残りを止めない
    fn append(&mut self, records: &[VacancyRecord]) -> AppendSummary;

    /// 挿入順に全件返す
    fn all(&self) -> Result<Vec<VacancyRecord>, ScraperError>;
}

/// JSONファイルのドキュメントストア
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    path: PathBuf,
    table: String,
}

impl JsonDocumentStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Database, ScraperError> {
        if !self.path.exists() {
            return Ok(Database::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Database::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, db: &Database) -> Result<(), ScraperError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string(db)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// 1件追加してドキュメントIDを返す
    pub fn insert(&mut self, record: &VacancyRecord) -> Result<u64, ScraperError> {
        let mut db = self.load()?;
        let table = db.entry(self.table.clone()).or_default();
        let id = table.keys().next_back().map_or(1, |last| last + 1);
        table.insert(id, serde_json::to_value(record)?);
        self.save(&db)?;
        debug!("Inserted document {} into {:?}", id, self.path);
        Ok(id)
    }
}

impl RecordStore for JsonDocumentStore {
    fn append(&mut self, records: &[VacancyRecord]) -> AppendSummary {
        let mut summary = AppendSummary::default();
        for record in records {
            match self.insert(record) {
                Ok(_) => summary.inserted += 1,
                Err(e) => {
                    warn!("Failed to store vacancy '{}': {}", record.link, e);
                    summary.failed += 1;
                }
            }
        }
        info!(
            "Stored {} vacancies in {:?} ({} failed)",
            summary.inserted, self.path, summary.failed
        );
        summary
    }

    fn all(&self) -> Result<Vec<VacancyRecord>, ScraperError> {
        let mut db = self.load()?;
        let Some(table) = db.remove(&self.table) else {
            return Ok(Vec::new());
        };

        let mut records: Vec<VacancyRecord> = Vec::with_capacity(table.len());
        for (id, doc) in table {
            match serde_json::from_value(doc) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping document {}: {}", id, e),
            }
        }
        Ok(records)
    }
}
