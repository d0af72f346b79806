//! Abstract browser-driver contract used by the driven-automation strategy.
//!
//! The sweep only ever talks to a [`DomDriver`], never to a concrete browser,
//! so it can be exercised against the in-memory driver in `testing.rs`.
//! Elements are opaque [`ElementHandle`]s owned by the driver. A handle stays
//! valid until [`DomDriver::release_all`] is called, even if the node leaves
//! the page, in which case operations on it fail with `DriverError`.

use async_trait::async_trait;

use crate::error::DriverResult;

/// Opaque reference to an element the driver has handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Element box in viewport CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[async_trait]
pub trait DomDriver: Send + Sync {
    /// Serialized HTML of the current document.
    async fn page_source(&self) -> DriverResult<String>;

    /// All elements matching a CSS selector, in document order.
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>>;

    /// Descendants of `scope` matching a CSS selector.
    async fn query_all_within(
        &self,
        scope: ElementHandle,
        selector: &str,
    ) -> DriverResult<Vec<ElementHandle>>;

    async fn attribute(&self, element: ElementHandle, name: &str) -> DriverResult<Option<String>>;

    /// Rendered text of the element, if it has any.
    async fn text(&self, element: ElementHandle) -> DriverResult<Option<String>>;

    async fn click(&self, element: ElementHandle) -> DriverResult<()>;

    async fn scroll_into_view(&self, element: ElementHandle) -> DriverResult<()>;

    async fn bounds(&self, element: ElementHandle) -> DriverResult<Bounds>;

    // Pointer input. `mouse_down`/`mouse_up` act at the last moved-to position.

    async fn mouse_move(&self, x: f64, y: f64) -> DriverResult<()>;

    async fn mouse_down(&self) -> DriverResult<()>;

    async fn mouse_up(&self) -> DriverResult<()>;

    async fn mouse_wheel(&self, delta_x: f64, delta_y: f64) -> DriverResult<()>;

    /// Drop every handle handed out so far. Later use of them fails with
    /// `DriverError::StaleHandle`.
    async fn release_all(&self) -> DriverResult<()>;

    async fn query(&self, selector: &str) -> DriverResult<Option<ElementHandle>> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn query_within(
        &self,
        scope: ElementHandle,
        selector: &str,
    ) -> DriverResult<Option<ElementHandle>> {
        Ok(self.query_all_within(scope, selector).await?.into_iter().next())
    }
}
