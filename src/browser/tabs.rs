//! `TabProvider` on top of a Chromium instance.

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::EventLoadEventFired;
use chromiumoxide::cdp::browser_protocol::target::CreateTargetParams;
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled};
use dashmap::DashMap;
use futures::StreamExt;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::setup::launch_browser;
use crate::adapters::{AdapterScript, AdapterSignal};
use crate::context::{TabError, TabEvent, TabEventHub, TabId, TabOptions, TabProvider, TabSubscription};
use crate::utils::ADAPTER_BINDING;

struct OpenTab {
    page: Page,
    watchers: Vec<JoinHandle<()>>,
}

/// Opens one Chromium target per job and translates CDP events into
/// [`TabEvent`]s
pub struct ChromiumTabProvider {
    browser: AsyncMutex<Browser>,
    handler: Mutex<Option<JoinHandle<()>>>,
    user_data_dir: Mutex<Option<PathBuf>>,
    tabs: DashMap<TabId, OpenTab>,
    next_id: AtomicU64,
    hub: TabEventHub,
}

impl ChromiumTabProvider {
    /// Launch a browser and wrap it
    pub async fn launch(headless: bool) -> Result<Self> {
        let (browser, handler, user_data_dir) = launch_browser(headless, None).await?;
        Ok(Self {
            browser: AsyncMutex::new(browser),
            handler: Mutex::new(Some(handler)),
            user_data_dir: Mutex::new(Some(user_data_dir)),
            tabs: DashMap::new(),
            next_id: AtomicU64::new(1),
            hub: TabEventHub::default(),
        })
    }

    /// Number of tabs currently open
    #[must_use]
    pub fn open_tabs(&self) -> usize {
        self.tabs.len()
    }

    /// Close remaining tabs, stop the browser and remove its profile
    pub async fn shutdown(&self) -> Result<()> {
        let ids: Vec<TabId> = self.tabs.iter().map(|t| *t.key()).collect();
        for tab in ids {
            if let Err(e) = self.close_tab(tab).await {
                debug!(%tab, error = %e, "tab close during shutdown failed");
            }
        }

        {
            let mut browser = self.browser.lock().await;
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser cleanly: {e}");
            }
            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {e}");
            }
        }

        if let Some(handler) = self.handler.lock().take() {
            handler.abort();
        }
        self.remove_profile_dir();
        info!("Browser shut down");
        Ok(())
    }

    fn remove_profile_dir(&self) {
        if let Some(dir) = self.user_data_dir.lock().take()
            && let Err(e) = std::fs::remove_dir_all(&dir)
        {
            warn!("Failed to remove browser profile {}: {e}", dir.display());
        }
    }

    fn page(&self, tab: TabId) -> Result<Page, TabError> {
        self.tabs
            .get(&tab)
            .map(|open| open.page.clone())
            .ok_or(TabError::UnknownTab(tab))
    }

    async fn watch(&self, tab: TabId, page: &Page) -> Result<Vec<JoinHandle<()>>, chromiumoxide::error::CdpError> {
        page.execute(AddBindingParams::new(ADAPTER_BINDING)).await?;

        let mut bindings = page.event_listener::<EventBindingCalled>().await?;
        let mut loads = page.event_listener::<EventLoadEventFired>().await?;

        let hub = self.hub.clone();
        let binding_watcher = tokio::spawn(async move {
            while let Some(call) = bindings.next().await {
                if call.name != ADAPTER_BINDING {
                    continue;
                }
                match AdapterSignal::from_payload(&call.payload) {
                    Ok(signal) => hub.publish(TabEvent::AdapterMessage { tab, signal }),
                    Err(e) => log::warn!("{tab}: unparseable adapter payload: {e}"),
                }
            }
            // the event stream ends with the target
            hub.publish(TabEvent::Closed { tab });
        });

        let hub = self.hub.clone();
        let load_watcher = tokio::spawn(async move {
            while loads.next().await.is_some() {
                log::trace!("{tab}: load event");
                hub.publish(TabEvent::Loaded { tab });
            }
        });

        Ok(vec![binding_watcher, load_watcher])
    }
}

#[async_trait]
impl TabProvider for ChromiumTabProvider {
    fn subscribe(&self) -> TabSubscription {
        self.hub.subscribe()
    }

    async fn open_tab(&self, url: &str, options: TabOptions) -> Result<TabId, TabError> {
        let create_err = |reason: String| TabError::Create {
            url: url.to_string(),
            reason,
        };

        let params = CreateTargetParams::builder()
            .url(url)
            .background(!options.active)
            .build()
            .map_err(create_err)?;

        let page = {
            let browser = self.browser.lock().await;
            browser.new_page(params).await.map_err(|e| create_err(e.to_string()))?
        };

        let tab = TabId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let watchers = match self.watch(tab, &page).await {
            Ok(watchers) => watchers,
            Err(e) => {
                let _ = page.close().await;
                return Err(create_err(e.to_string()));
            }
        };
        self.tabs.insert(
            tab,
            OpenTab {
                page: page.clone(),
                watchers,
            },
        );

        // the first load may have fired before the listener existed
        if let Ok(state) = page.evaluate("document.readyState").await
            && state.into_value::<String>().is_ok_and(|s| s == "complete")
        {
            self.hub.publish(TabEvent::Loaded { tab });
        }

        debug!(%tab, url, "opened tab");
        Ok(tab)
    }

    async fn inject(&self, tab: TabId, script: &AdapterScript) -> Result<(), TabError> {
        let page = self.page(tab)?;
        page.evaluate(script.source())
            .await
            .map_err(|e| TabError::Inject {
                tab,
                reason: e.to_string(),
            })?;
        debug!(%tab, adapter = script.name(), "adapter injected");
        Ok(())
    }

    async fn close_tab(&self, tab: TabId) -> Result<(), TabError> {
        let (_, open) = self.tabs.remove(&tab).ok_or(TabError::UnknownTab(tab))?;
        for watcher in &open.watchers {
            watcher.abort();
        }
        open.page.close().await.map_err(|e| TabError::Close {
            tab,
            reason: e.to_string(),
        })
    }
}

impl Drop for ChromiumTabProvider {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.lock().take() {
            warn!("ChromiumTabProvider dropped without shutdown - aborting handler task");
            handler.abort();
        }
        self.remove_profile_dir();
    }
}
