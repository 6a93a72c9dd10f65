use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::session::{PageSession, SessionFactory};

/// In-memory scripted page for tests: canned readable values per target,
/// per-target failure injection, optional per-target delays, and a full
/// operation trace for assertions.
#[derive(Default)]
pub struct ScriptedSession {
    texts: HashMap<String, String>,
    failures: HashSet<String>,
    delays_ms: HashMap<String, u64>,
    ops: Mutex<Vec<String>>,
    url: Mutex<String>,
    closed: AtomicBool,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned text returned by `read_text` for this target.
    pub fn with_text(mut self, target: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(target.into(), text.into());
        self
    }

    /// Any operation against this target fails.
    pub fn failing_target(mut self, target: impl Into<String>) -> Self {
        self.failures.insert(target.into());
        self
    }

    /// Operations against this target stall for the given time first.
    pub fn with_delay(mut self, target: impl Into<String>, ms: u64) -> Self {
        self.delays_ms.insert(target.into(), ms);
        self
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().expect("ops lock poisoned").clone()
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn touch(&self, op: &str, target: &str) -> Result<()> {
        self.ops
            .lock()
            .expect("ops lock poisoned")
            .push(format!("{op} {target}"));
        if let Some(ms) = self.delays_ms.get(target) {
            tokio::time::sleep(std::time::Duration::from_millis(*ms)).await;
        }
        if self.failures.contains(target) {
            anyhow::bail!("element '{target}' not found");
        }
        Ok(())
    }
}

#[async_trait]
impl PageSession for ScriptedSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.touch("navigate", url).await?;
        *self.url.lock().expect("url lock poisoned") = url.to_string();
        Ok(())
    }

    async fn click(&self, target: &str) -> Result<()> {
        self.touch("click", target).await
    }

    async fn fill(&self, target: &str, _value: &str) -> Result<()> {
        self.touch("fill", target).await
    }

    async fn select(&self, target: &str, _value: &str) -> Result<()> {
        self.touch("select", target).await
    }

    async fn read_text(&self, target: &str) -> Result<String> {
        self.touch("read", target).await?;
        Ok(self.texts.get(target).cloned().unwrap_or_default())
    }

    async fn wait_ms(&self, ms: u64) -> Result<()> {
        self.touch("wait", &ms.to_string()).await?;
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.lock().expect("url lock poisoned").clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(b"scripted-screenshot".to_vec())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one shared scripted session, keeping a handle for the test
/// to assert against afterwards.
pub struct ScriptedFactory {
    session: Arc<ScriptedSession>,
    fail_acquire: bool,
}

impl ScriptedFactory {
    pub fn new(session: ScriptedSession) -> Self {
        Self {
            session: Arc::new(session),
            fail_acquire: false,
        }
    }

    /// Simulate an unavailable browser.
    pub fn unavailable() -> Self {
        Self {
            session: Arc::new(ScriptedSession::new()),
            fail_acquire: true,
        }
    }

    pub fn session(&self) -> Arc<ScriptedSession> {
        Arc::clone(&self.session)
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn acquire(&self) -> Result<Arc<dyn PageSession>> {
        if self.fail_acquire {
            anyhow::bail!("browser not reachable");
        }
        Ok(Arc::clone(&self.session) as Arc<dyn PageSession>)
    }
}
