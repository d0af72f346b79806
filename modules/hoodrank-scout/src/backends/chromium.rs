//! Chromium session behind the driven backend.

use std::fmt::Display;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::js_protocol::runtime::ReleaseObjectParams;
use chromiumoxide::element::Element;
use chromiumoxide::layout::Point;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::driven::BrowserSettings;
use crate::driver::{Bounds, DomDriver, ElementHandle};
use crate::error::{DriverError, DriverResult, ScrapeError};
use crate::pipeline::{Extraction, ExtractionInput, ExtractionPipeline};

fn browser_err(e: impl Display) -> DriverError {
    DriverError::Browser(e.to_string())
}

/// Elements handed out since the last release. Handle ids keep counting up
/// across releases so an old handle never aliases a new element.
#[derive(Default)]
struct Registry {
    base: u64,
    elements: Vec<Element>,
}

impl Registry {
    fn get(&self, handle: ElementHandle) -> Option<&Element> {
        let index = handle.0.checked_sub(self.base)?;
        self.elements.get(usize::try_from(index).ok()?)
    }
}

/// [`DomDriver`] over one Chromium tab.
pub struct ChromiumDriver {
    page: Page,
    registry: Mutex<Registry>,
    pointer: Mutex<(f64, f64)>,
}

impl ChromiumDriver {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            registry: Mutex::new(Registry::default()),
            pointer: Mutex::new((0.0, 0.0)),
        }
    }

    async fn register(&self, found: Vec<Element>) -> Vec<ElementHandle> {
        let mut registry = self.registry.lock().await;
        found
            .into_iter()
            .map(|element| {
                registry.elements.push(element);
                ElementHandle(registry.base + registry.elements.len() as u64 - 1)
            })
            .collect()
    }

    async fn dispatch_mouse(&self, kind: DispatchMouseEventType, wheel: Option<(f64, f64)>) -> DriverResult<()> {
        let (x, y) = *self.pointer.lock().await;
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1);
        if let Some((dx, dy)) = wheel {
            builder = builder.delta_x(dx).delta_y(dy);
        }
        let params = builder.build().map_err(DriverError::Browser)?;
        self.page.execute(params).await.map_err(browser_err)?;
        Ok(())
    }
}

// Looks up a handle and runs `$body` with `$el` bound to the element.
macro_rules! with_element {
    ($self:ident, $handle:expr, |$el:ident| $body:expr) => {{
        let registry = $self.registry.lock().await;
        let $el = registry
            .get($handle)
            .ok_or(DriverError::StaleHandle($handle))?;
        $body
    }};
}

#[async_trait]
impl DomDriver for ChromiumDriver {
    async fn page_source(&self) -> DriverResult<String> {
        self.page.content().await.map_err(browser_err)
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let found = self.page.find_elements(selector).await.map_err(browser_err)?;
        Ok(self.register(found).await)
    }

    async fn query_all_within(
        &self,
        scope: ElementHandle,
        selector: &str,
    ) -> DriverResult<Vec<ElementHandle>> {
        let found = with_element!(self, scope, |el| el
            .find_elements(selector)
            .await
            .map_err(browser_err)?);
        Ok(self.register(found).await)
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> DriverResult<Option<String>> {
        with_element!(self, element, |el| el.attribute(name).await.map_err(browser_err))
    }

    async fn text(&self, element: ElementHandle) -> DriverResult<Option<String>> {
        with_element!(self, element, |el| el.inner_text().await.map_err(browser_err))
    }

    async fn click(&self, element: ElementHandle) -> DriverResult<()> {
        with_element!(self, element, |el| {
            el.click().await.map_err(browser_err)?;
            Ok(())
        })
    }

    async fn scroll_into_view(&self, element: ElementHandle) -> DriverResult<()> {
        with_element!(self, element, |el| {
            el.scroll_into_view().await.map_err(browser_err)?;
            Ok(())
        })
    }

    async fn bounds(&self, element: ElementHandle) -> DriverResult<Bounds> {
        let bbox = with_element!(self, element, |el| el
            .bounding_box()
            .await
            .map_err(browser_err)?);
        Ok(Bounds {
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
        })
    }

    async fn release_all(&self) -> DriverResult<()> {
        let released = {
            let mut registry = self.registry.lock().await;
            registry.base += registry.elements.len() as u64;
            std::mem::take(&mut registry.elements)
        };
        let count = released.len();
        for element in released {
            let params = ReleaseObjectParams::new(element.remote_object_id.clone());
            if let Err(e) = self.page.execute(params).await {
                // Usually the node left the page and its object is already gone.
                debug!(error = %e, "Could not release remote object");
            }
        }
        debug!(count, "Released element handles");
        Ok(())
    }

    async fn mouse_move(&self, x: f64, y: f64) -> DriverResult<()> {
        self.page
            .move_mouse(Point { x, y })
            .await
            .map_err(browser_err)?;
        *self.pointer.lock().await = (x, y);
        Ok(())
    }

    async fn mouse_down(&self) -> DriverResult<()> {
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, None).await
    }

    async fn mouse_up(&self) -> DriverResult<()> {
        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, None).await
    }

    async fn mouse_wheel(&self, delta_x: f64, delta_y: f64) -> DriverResult<()> {
        self.dispatch_mouse(DispatchMouseEventType::MouseWheel, Some((delta_x, delta_y)))
            .await
    }
}

/// Launch Chromium, open the target page and run the pipeline with both the
/// page snapshot and the live driver.
pub async fn scrape(
    settings: &BrowserSettings,
    pipeline: &ExtractionPipeline,
) -> Result<Extraction, ScrapeError> {
    let mut builder = BrowserConfig::builder()
        .window_size(settings.width, settings.height)
        .request_timeout(settings.navigation_timeout)
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg(format!("--user-agent={}", settings.user_agent));
    if !settings.headless {
        builder = builder.with_head();
    }
    let browser_config = builder.build().map_err(DriverError::Browser)?;

    let (mut browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(browser_err)?;
    let events = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    info!(url = settings.url.as_str(), headless = settings.headless, "Opening page in Chromium");
    let result = open_and_extract(&browser, settings, pipeline).await;

    if let Err(e) = browser.close().await {
        warn!(error = %e, "Failed to close browser cleanly");
    }
    let _ = browser.wait().await;
    events.abort();

    result
}

async fn open_and_extract(
    browser: &Browser,
    settings: &BrowserSettings,
    pipeline: &ExtractionPipeline,
) -> Result<Extraction, ScrapeError> {
    let fetch_err = |e: chromiumoxide::error::CdpError| ScrapeError::Fetch {
        url: settings.url.clone(),
        message: e.to_string(),
    };

    let page = browser.new_page(settings.url.as_str()).await.map_err(fetch_err)?;
    page.wait_for_navigation().await.map_err(fetch_err)?;
    tokio::time::sleep(settings.load_settle).await;

    let driver = ChromiumDriver::new(page);
    let html = driver.page_source().await?;
    info!(bytes = html.len(), "Captured page source");

    Ok(pipeline.run(ExtractionInput::driven(Some(&html), &driver)).await)
}
