// Test double for the DomDriver boundary.
//
// MockDriver is a scripted map page: a list of "views", each the set of
// markers visible at that moment. Every view change (mode click, completed
// drag, wheel tick) advances to the next view, clamping at the last one.
// Popups, the results listing, mode buttons and region options answer the
// default sweep selectors.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::driver::{Bounds, DomDriver, ElementHandle};
use crate::error::{DriverError, DriverResult};
use crate::sweep::{SweepConfig, SweepDelays};

// ---------------------------------------------------------------------------
// MockRestaurant
// ---------------------------------------------------------------------------

/// One marker and the popup it opens. Builder pattern.
#[derive(Debug, Clone, Default)]
pub struct MockRestaurant {
    pub name: Option<String>,
    pub hood: Option<String>,
    pub listing_name: Option<String>,
    pub cuisine: Option<String>,
    pub badge: Option<String>,
    pub reviewers: Option<String>,
    pub indicators: Vec<f64>,
    pub broken: bool,
}

impl MockRestaurant {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Popup without a name element.
    pub fn unnamed() -> Self {
        Self::default()
    }

    /// Listed in the results sidebar under this neighborhood. The listing
    /// shows the name as given to [`MockRestaurant::listed_as`], if any.
    pub fn hood(mut self, hood: &str) -> Self {
        self.hood = Some(hood.to_string());
        self
    }

    pub fn listed_as(mut self, listing_name: &str) -> Self {
        self.listing_name = Some(listing_name.to_string());
        self
    }

    pub fn cuisine(mut self, cuisine: &str) -> Self {
        self.cuisine = Some(cuisine.to_string());
        self
    }

    pub fn badge(mut self, badge: &str) -> Self {
        self.badge = Some(badge.to_string());
        self
    }

    pub fn reviewers(mut self, reviewers: &str) -> Self {
        self.reviewers = Some(reviewers.to_string());
        self
    }

    /// `left:` percentages of the metric indicators, in popup order.
    pub fn indicators(mut self, percents: &[f64]) -> Self {
        self.indicators = percents.to_vec();
        self
    }

    /// Clicking the marker fails.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

// ---------------------------------------------------------------------------
// MockDriver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Click(String),
    Scroll,
    MouseMove(f64, f64),
    MouseDown,
    MouseUp,
    Wheel(f64),
    /// A query, recorded by selector.
    Query(String),
    Release,
}

#[derive(Debug, Clone)]
enum Node {
    Marker(MockRestaurant),
    Popup,
    Text(String),
    Indicator(f64),
    CloseButton,
    Canvas,
    ModeButton(String),
    RegionOption(String),
    ResultItem(usize),
}

#[derive(Default)]
struct MockState {
    view: usize,
    next_id: u64,
    nodes: HashMap<u64, Node>,
    open_popup: Option<MockRestaurant>,
    pressed: bool,
    events: Vec<MockEvent>,
}

impl MockState {
    fn alloc(&mut self, node: Node) -> ElementHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, node);
        ElementHandle(id)
    }

    fn node(&self, handle: ElementHandle) -> DriverResult<Node> {
        self.nodes
            .get(&handle.0)
            .cloned()
            .ok_or(DriverError::StaleHandle(handle))
    }
}

pub struct MockDriver {
    html: String,
    modes: Vec<String>,
    regions: Vec<String>,
    views: Vec<Vec<MockRestaurant>>,
    canvas: bool,
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            html: "<html><body><div class=\"mapboxgl-canvas\"></div></body></html>".to_string(),
            modes: vec!["hot".into(), "age".into(), "gender".into()],
            regions: Vec::new(),
            views: Vec::new(),
            canvas: true,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    pub fn with_modes(mut self, modes: &[&str]) -> Self {
        self.modes = modes.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_region(mut self, label: &str) -> Self {
        self.regions.push(label.to_string());
        self
    }

    pub fn without_canvas(mut self) -> Self {
        self.canvas = false;
        self
    }

    /// Append a view: the markers visible after the next view change.
    pub fn view(mut self, markers: Vec<MockRestaurant>) -> Self {
        self.views.push(markers);
        self
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Click(what) => Some(what),
                _ => None,
            })
            .collect()
    }

    pub fn wheel_ticks(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Wheel(dy) => Some(dy),
                _ => None,
            })
            .collect()
    }

    /// How many times `selector` was queried at page level.
    pub fn queries(&self, selector: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MockEvent::Query(s) if s == selector))
            .count()
    }

    pub fn releases(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MockEvent::Release))
            .count()
    }

    /// Handles currently live.
    pub fn live_handles(&self) -> usize {
        self.state.lock().unwrap().nodes.len()
    }

    /// (press position, release position) of every completed drag.
    pub fn drags(&self) -> Vec<((f64, f64), (f64, f64))> {
        let mut drags = Vec::new();
        let mut pointer = (0.0, 0.0);
        let mut start = None;
        for event in self.events() {
            match event {
                MockEvent::MouseMove(x, y) => pointer = (x, y),
                MockEvent::MouseDown => start = Some(pointer),
                MockEvent::MouseUp => {
                    if let Some(from) = start.take() {
                        drags.push((from, pointer));
                    }
                }
                _ => {}
            }
        }
        drags
    }

    /// Every restaurant that appears in the sidebar listing.
    fn listing(&self) -> Vec<(String, String)> {
        let mut listing: Vec<(String, String)> = Vec::new();
        for r in self.views.iter().flatten() {
            if let (Some(name), Some(hood)) = (r.listing_name.as_ref().or(r.name.as_ref()), &r.hood) {
                if !listing.iter().any(|(n, _)| n == name) {
                    listing.push((name.clone(), hood.clone()));
                }
            }
        }
        listing
    }

    fn current_view(&self, state: &MockState) -> Vec<MockRestaurant> {
        if self.views.is_empty() {
            return Vec::new();
        }
        self.views[state.view.min(self.views.len() - 1)].clone()
    }
}

#[async_trait]
impl DomDriver for MockDriver {
    async fn page_source(&self) -> DriverResult<String> {
        Ok(self.html.clone())
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let mut state = self.state.lock().unwrap();
        state.events.push(MockEvent::Query(selector.to_string()));

        let nodes: Vec<Node> = match selector {
            ".mapboxgl-marker" => self.current_view(&state).into_iter().map(Node::Marker).collect(),
            ".mapboxgl-popup" => state.open_popup.iter().map(|_| Node::Popup).collect(),
            ".mapboxgl-popup-close-button" => {
                state.open_popup.iter().map(|_| Node::CloseButton).collect()
            }
            ".mapboxgl-canvas" if self.canvas => vec![Node::Canvas],
            ".mapboxgl-canvas" => Vec::new(),
            ".city-selector span" => self.regions.iter().cloned().map(Node::RegionOption).collect(),
            ".result-item" => (0..self.listing().len()).map(Node::ResultItem).collect(),
            s if s.starts_with(".mode-button[data-mode='") => {
                let mode = s
                    .trim_start_matches(".mode-button[data-mode='")
                    .trim_end_matches("']");
                self.modes
                    .iter()
                    .filter(|m| m.as_str() == mode)
                    .cloned()
                    .map(Node::ModeButton)
                    .collect()
            }
            other => return Err(DriverError::Selector(other.to_string())),
        };

        Ok(nodes.into_iter().map(|n| state.alloc(n)).collect())
    }

    async fn query_all_within(
        &self,
        scope: ElementHandle,
        selector: &str,
    ) -> DriverResult<Vec<ElementHandle>> {
        let mut state = self.state.lock().unwrap();

        let nodes: Vec<Node> = match state.node(scope)? {
            Node::Popup => {
                let Some(r) = state.open_popup.clone() else {
                    return Ok(Vec::new());
                };
                match selector {
                    "strong" => r.name.map(Node::Text).into_iter().collect(),
                    ".popup-info" => r.cuisine.map(Node::Text).into_iter().collect(),
                    ".popup-score" => r.badge.map(Node::Text).into_iter().collect(),
                    "div[style*='text-align: center']" => {
                        r.reviewers.map(Node::Text).into_iter().collect()
                    }
                    ".metric-indicator" => r.indicators.into_iter().map(Node::Indicator).collect(),
                    _ => Vec::new(),
                }
            }
            Node::ResultItem(i) => {
                let listing = self.listing();
                let (name, hood) = listing[i].clone();
                match selector {
                    ".result-name" => vec![Node::Text(name)],
                    ".result-hood" => vec![Node::Text(hood)],
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        };

        Ok(nodes.into_iter().map(|n| state.alloc(n)).collect())
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> DriverResult<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(match (state.node(element)?, name) {
            (Node::Indicator(percent), "style") => Some(format!("left: {percent}%;")),
            _ => None,
        })
    }

    async fn text(&self, element: ElementHandle) -> DriverResult<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(match state.node(element)? {
            Node::Text(text) | Node::RegionOption(text) | Node::ModeButton(text) => Some(text),
            Node::Marker(r) => r.name,
            _ => None,
        })
    }

    async fn click(&self, element: ElementHandle) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        match state.node(element)? {
            Node::Marker(r) => {
                if r.broken {
                    return Err(DriverError::Browser("marker detached".into()));
                }
                let label = r.name.clone().unwrap_or_default();
                state.events.push(MockEvent::Click(format!("marker:{label}")));
                state.open_popup = Some(r);
            }
            Node::CloseButton => {
                state.events.push(MockEvent::Click("close".into()));
                state.open_popup = None;
            }
            Node::ModeButton(mode) => {
                state.events.push(MockEvent::Click(format!("mode:{mode}")));
                state.view += 1;
            }
            Node::RegionOption(label) => {
                state.events.push(MockEvent::Click(format!("region:{label}")));
            }
            _ => {}
        }
        Ok(())
    }

    async fn scroll_into_view(&self, element: ElementHandle) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.node(element)?;
        state.events.push(MockEvent::Scroll);
        Ok(())
    }

    async fn bounds(&self, element: ElementHandle) -> DriverResult<Bounds> {
        let state = self.state.lock().unwrap();
        Ok(match state.node(element)? {
            Node::Canvas => Bounds {
                x: 0.0,
                y: 0.0,
                width: 800.0,
                height: 600.0,
            },
            _ => Bounds {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
        })
    }

    async fn release_all(&self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.nodes.clear();
        state.events.push(MockEvent::Release);
        Ok(())
    }

    async fn mouse_move(&self, x: f64, y: f64) -> DriverResult<()> {
        self.state.lock().unwrap().events.push(MockEvent::MouseMove(x, y));
        Ok(())
    }

    async fn mouse_down(&self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.pressed = true;
        state.events.push(MockEvent::MouseDown);
        Ok(())
    }

    async fn mouse_up(&self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.pressed {
            state.pressed = false;
            state.view += 1;
        }
        state.events.push(MockEvent::MouseUp);
        Ok(())
    }

    async fn mouse_wheel(&self, _delta_x: f64, delta_y: f64) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.view += 1;
        state.events.push(MockEvent::Wheel(delta_y));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Default sweep with every delay zeroed.
pub fn instant_sweep() -> SweepConfig {
    SweepConfig {
        delays: SweepDelays::none(),
        ..SweepConfig::default()
    }
}
