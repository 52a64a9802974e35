use async_trait::async_trait;

use crate::error::ScraperError;

/// 検索結果ページ上の求人1件
#[async_trait]
pub trait ListingHandle: Send + Sync {
    /// セレクタに一致する子要素のテキスト
    async fn text(&self, selector: &str) -> Result<String, ScraperError>;

    /// セレクタに一致する子要素の属性値
    async fn attribute(&self, selector: &str, name: &str)
        -> Result<Option<String>, ScraperError>;
}

/// 「次のページ」ボタンの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    Missing,
    Disabled,
    Available,
}

/// ブラウザセッション（1回の収集で専有する）
#[async_trait]
pub trait SearchSession: Send {
    type Listing: ListingHandle;

    /// URLへ移動
    async fn open(&mut self, url: &str) -> Result<(), ScraperError>;

    /// 現在表示されている求人要素
    async fn listings(&mut self) -> Result<Vec<Self::Listing>, ScraperError>;

    /// 次ページボタンを探す
    async fn next_page(&mut self) -> Result<NextPage, ScraperError>;

    /// 次ページボタンをクリック
    async fn advance(&mut self) -> Result<(), ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// デバッグ用スクリーンショット (PNG)
    async fn screenshot(&mut self) -> Option<Vec<u8>> {
        None
    }
}
