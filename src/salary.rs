//! 給与テキストのパーサー
//!
//! `"80 000—120 000 руб."` → `(Some(80000), Some(120000))`
//! `"от 50 000 руб."` → `(Some(50000), None)`
//! `"до 90 000 руб."` → `(None, Some(90000))`

use crate::error::ScraperError;

/// 給与範囲
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalaryRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl SalaryRange {
    pub fn new(from: Option<i64>, to: Option<i64>) -> Self {
        Self { from, to }
    }

    pub fn unstated() -> Self {
        Self::default()
    }
}

/// 範囲区切り・下限/上限を示すマーカー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryMarkers {
    pub range_separators: Vec<char>,
    /// 下限を示す単語 ("от")
    pub lower_bound: String,
    /// 上限を示す単語 ("до")
    pub upper_bound: String,
}

impl Default for SalaryMarkers {
    fn default() -> Self {
        Self {
            range_separators: vec!['—', '–'],
            lower_bound: "от".to_string(),
            upper_bound: "до".to_string(),
        }
    }
}

/// 桁区切りとして扱う空白
const GROUPING_SPACES: [char; 4] = [' ', '\u{a0}', '\u{202f}', '\u{2009}'];

#[derive(Debug, Clone, Default)]
pub struct SalaryParser {
    markers: SalaryMarkers,
}

impl SalaryParser {
    pub fn new(markers: SalaryMarkers) -> Self {
        Self { markers }
    }

    pub fn parse(&self, raw: &str) -> Result<SalaryRange, ScraperError> {
        if raw.contains(&self.markers.range_separators[..]) {
            let segments: Vec<&str> = raw.split(&self.markers.range_separators[..]).collect();
            let [low, high] = segments.as_slice() else {
                return Err(ScraperError::SalaryParse(format!(
                    "expected two range segments in '{}'",
                    raw
                )));
            };
            return Ok(SalaryRange::new(
                Some(parse_amount(low, raw)?),
                Some(parse_amount(high, raw)?),
            ));
        }

        if let Some(rest) = strip_word(raw, &self.markers.lower_bound) {
            return Ok(SalaryRange::new(Some(parse_amount(&rest, raw)?), None));
        }

        if let Some(rest) = strip_word(raw, &self.markers.upper_bound) {
            return Ok(SalaryRange::new(None, Some(parse_amount(&rest, raw)?)));
        }

        Ok(SalaryRange::unstated())
    }
}

/// 給与テキストの最後のトークン（通貨表記）。空なら空文字列
pub fn currency_of(raw: &str) -> String {
    raw.split_whitespace().last().unwrap_or_default().to_string()
}

/// 単語として含まれていれば、その単語を除いた残りを返す
fn strip_word(raw: &str, word: &str) -> Option<String> {
    let word = word.to_lowercase();
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let index = tokens.iter().position(|t| t.to_lowercase() == word)?;

    let rest: Vec<&str> = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, t)| *t)
        .collect();
    Some(rest.join(" "))
}

/// 末尾の通貨/単位表記と桁区切りを除いて整数にする
fn parse_amount(segment: &str, raw: &str) -> Result<i64, ScraperError> {
    let digits: String = segment
        .trim()
        .trim_end_matches(|c: char| !c.is_ascii_digit())
        .chars()
        .filter(|c| !GROUPING_SPACES.contains(c))
        .collect();

    digits
        .parse::<i64>()
        .map_err(|e| ScraperError::SalaryParse(format!("'{}' in '{}': {}", digits, raw, e)))
}
