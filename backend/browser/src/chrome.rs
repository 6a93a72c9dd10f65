use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};

use crate::session::{PageSession, SessionFactory};

/// Browser session backed by headless Chrome.
///
/// Tab calls are blocking, so every operation hops onto the blocking pool;
/// the executor's per-step deadline still applies around the whole hop.
pub struct ChromeSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub async fn launch(headless: bool) -> Result<Self> {
        let session = tokio::task::spawn_blocking(move || -> Result<Self> {
            let options = LaunchOptions {
                headless,
                ..Default::default()
            };
            let browser = Browser::new(options)
                .map_err(|e| anyhow::anyhow!("browser launch failed: {e}"))?;
            let tab = browser.new_tab()?;
            tab.navigate_to("about:blank")?;
            Ok(Self {
                _browser: browser,
                tab,
            })
        })
        .await??;
        info!("browser session launched");
        Ok(session)
    }

    async fn with_tab<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> Result<T> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || f(&tab)).await?
    }
}

/// Plan targets are usually element ids from the extracted schema; allow
/// raw CSS too when the planner emits it.
fn as_selector(target: &str) -> String {
    let looks_like_css = target.starts_with('#')
        || target.starts_with('.')
        || target.starts_with('[')
        || target.contains(' ');
    if looks_like_css {
        target.to_string()
    } else {
        format!("#{0}, [name='{0}']", target)
    }
}

fn js_escape(selector: &str) -> String {
    selector.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, "navigate");
        let url = url.to_string();
        self.with_tab(move |tab| {
            tab.navigate_to(&url)?;
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await
    }

    async fn click(&self, target: &str) -> Result<()> {
        debug!(target, "click");
        let selector = as_selector(target);
        self.with_tab(move |tab| {
            tab.wait_for_element(&selector)?.click()?;
            Ok(())
        })
        .await
    }

    async fn fill(&self, target: &str, value: &str) -> Result<()> {
        debug!(target, "fill");
        let selector = as_selector(target);
        let value = value.to_string();
        self.with_tab(move |tab| {
            let element = tab.wait_for_element(&selector)?;
            element.click()?;
            // Clear any existing value before typing
            let js_sel = js_escape(&selector);
            tab.evaluate(
                &format!("document.querySelector('{js_sel}').value = ''"),
                false,
            )?;
            tab.type_str(&value)?;
            Ok(())
        })
        .await
    }

    async fn select(&self, target: &str, value: &str) -> Result<()> {
        debug!(target, "select");
        let selector = as_selector(target);
        let value = value.to_string();
        self.with_tab(move |tab| {
            tab.wait_for_element(&selector)?;
            let js_sel = js_escape(&selector);
            let js_val = js_escape(&value);
            tab.evaluate(
                &format!(
                    "(() => {{ const el = document.querySelector('{js_sel}'); \
                     el.value = '{js_val}'; \
                     el.dispatchEvent(new Event('input', {{bubbles: true}})); \
                     el.dispatchEvent(new Event('change', {{bubbles: true}})); }})()"
                ),
                false,
            )?;
            Ok(())
        })
        .await
    }

    async fn read_text(&self, target: &str) -> Result<String> {
        debug!(target, "read");
        let selector = as_selector(target);
        self.with_tab(move |tab| {
            let js_sel = js_escape(&selector);
            let result = tab.evaluate(
                &format!(
                    "(() => {{ const el = document.querySelector('{js_sel}'); \
                     if (!el) throw new Error('no element'); \
                     return el.value || el.innerText || ''; }})()"
                ),
                false,
            )?;
            Ok(result
                .value
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default())
        })
        .await
    }

    async fn wait_ms(&self, ms: u64) -> Result<()> {
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.with_tab(|tab| Ok(tab.get_url())).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.with_tab(|tab| {
            Ok(tab.capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )?)
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        // The browser process is torn down when the session drops; closing
        // the tab early just makes that deterministic.
        let result = self.with_tab(|tab| {
            tab.close(true)?;
            Ok(())
        })
        .await;
        info!("browser session closed");
        result
    }
}

/// Launches one fresh Chrome session per execution run.
pub struct ChromeSessionFactory {
    headless: bool,
}

impl ChromeSessionFactory {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn acquire(&self) -> Result<Arc<dyn PageSession>> {
        let session = ChromeSession::launch(self.headless).await?;
        Ok(Arc::new(session))
    }
}
