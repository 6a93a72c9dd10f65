use anyhow::Result;
use async_trait::async_trait;

/// One live page handle.
///
/// A session is exclusively owned by one request for its lifetime; it is
/// never shared or pooled across concurrent requests, so no cross-request
/// state can bleed through a live page. `close` must be called on every
/// exit path; dropping the session also tears the underlying browser down.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;
    async fn click(&self, target: &str) -> Result<()>;
    async fn fill(&self, target: &str, value: &str) -> Result<()>;
    async fn select(&self, target: &str, value: &str) -> Result<()>;
    async fn read_text(&self, target: &str) -> Result<String>;
    async fn wait_ms(&self, ms: u64) -> Result<()>;
    async fn current_url(&self) -> Result<String>;
    async fn screenshot(&self) -> Result<Vec<u8>>;
    async fn close(&self) -> Result<()>;
}

/// Hands out fresh sessions, one per execution run.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn acquire(&self) -> Result<std::sync::Arc<dyn PageSession>>;
}
