use std::time::Duration;

use crate::salary::SalaryMarkers;

pub const SUPERJOB_BASE_URL: &str = "https://www.superjob.ru";
/// 検索対象地域 (モスクワ) のクエリ
pub const MOSCOW_REGION_QUERY: &str = "geo[c][0]=1&geo[t][0]=4";
pub const DEFAULT_CITY: &str = "Москва";

/// ページ読み込み待機の方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageWait {
    /// 固定時間スリープ
    Fixed(Duration),
    /// 求人要素が表示されるまでポーリング（タイムアウト後はそのまま続行）
    UntilReady { timeout: Duration, interval: Duration },
}

impl PageWait {
    pub fn fixed_secs(secs: u64) -> Self {
        PageWait::Fixed(Duration::from_secs(secs))
    }
}

/// 要素検索に使うCSSセレクタ
///
/// サイトのマークアップが変わると抽出失敗になるため、全て差し替え可能にしている。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    /// 求人1件分のコンテナ
    pub listing: String,
    pub title: String,
    pub salary: String,
    pub published: String,
    /// 詳細ページへのリンク
    pub link: String,
    /// 「次のページ」ボタン
    pub next_page: String,
    /// 次ページボタンが無効な場合にclassへ付く文字列
    pub disabled_marker: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            listing: "._3mfro".to_string(),
            title: "._1QIBo".to_string(),
            salary: "._2Wp8I".to_string(),
            published: "._3MVeX".to_string(),
            link: "a".to_string(),
            next_page: ".icMQ_".to_string(),
            disabled_marker: "disabled".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub region_query: String,
    /// レコードに固定で入る都市名
    pub city: String,
    pub headless: bool,
    pub debug: bool,
    /// 検索ページを開いた直後の待機
    pub warmup: PageWait,
    /// ページ送り後の待機
    pub settle: PageWait,
    /// CDPリクエストタイムアウト
    pub timeout: Duration,
    pub selectors: Selectors,
    pub salary_markers: SalaryMarkers,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: SUPERJOB_BASE_URL.to_string(),
            region_query: MOSCOW_REGION_QUERY.to_string(),
            city: DEFAULT_CITY.to_string(),
            headless: true,
            debug: false,
            warmup: PageWait::fixed_secs(50),
            settle: PageWait::fixed_secs(5),
            timeout: Duration::from_secs(60),
            selectors: Selectors::default(),
            salary_markers: SalaryMarkers::default(),
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_warmup(mut self, wait: PageWait) -> Self {
        self.warmup = wait;
        self
    }

    pub fn with_settle(mut self, wait: PageWait) -> Self {
        self.settle = wait;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// 検索URLを組み立てる
    ///
    /// `city` は受け取るが使わない。地域は常に `region_query` で固定される。
    pub fn search_url(&self, position: &str, city: &str) -> String {
        tracing::debug!(
            "city '{}' is not routed into the request, region is fixed to '{}'",
            city,
            self.region_query
        );
        format!(
            "{}/vacancy/search/?keywords={}&{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(position),
            self.region_query
        )
    }

    /// 相対リンクをbase_url基準の絶対URLにする
    pub fn absolute_link(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with("//") {
            format!("https:{}", href)
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                href.trim_start_matches('/')
            )
        }
    }
}
