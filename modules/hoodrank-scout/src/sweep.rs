//! Driven-automation strategy: walk the live map through every ranking mode,
//! a fixed set of pans and zoom levels, and read the popup of each visible
//! marker.
//!
//! Every step is best effort. A missing element is a warning, a failing
//! marker is skipped, and a failing pan or zoom simply contributes nothing.
//! All harvested records flow through one [`RecordSet`] that is passed
//! explicitly from step to step.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use hoodrank_common::{clean_text, RawScore, Record, RecordSet, UNKNOWN_NEIGHBORHOOD};

use crate::driver::{DomDriver, ElementHandle};
use crate::error::DriverResult;

static SCORE_OUT_OF_TEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*/\s*10").expect("valid regex"));
static LEFT_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"left:\s*(-?\d+(?:\.\d+)?)%").expect("valid regex"));

const DEFAULT_SCORE: &str = "0";
const DEFAULT_REVIEWERS: &str = "0 reviewers";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SweepSelectors {
    pub region_option: String,
    /// `{mode}` is replaced with the mode name.
    pub mode_button: String,
    pub marker: String,
    pub popup: String,
    pub popup_close: String,
    pub canvas: String,
    pub popup_name: String,
    pub popup_cuisine: String,
    pub popup_score: String,
    pub popup_reviewers: String,
    pub metric_indicator: String,
    pub result_item: String,
    pub result_name: String,
    pub result_hood: String,
}

impl Default for SweepSelectors {
    fn default() -> Self {
        Self {
            region_option: ".city-selector span".into(),
            mode_button: ".mode-button[data-mode='{mode}']".into(),
            marker: ".mapboxgl-marker".into(),
            popup: ".mapboxgl-popup".into(),
            popup_close: ".mapboxgl-popup-close-button".into(),
            canvas: ".mapboxgl-canvas".into(),
            popup_name: "strong".into(),
            popup_cuisine: ".popup-info".into(),
            popup_score: ".popup-score".into(),
            popup_reviewers: "div[style*='text-align: center']".into(),
            metric_indicator: ".metric-indicator".into(),
            result_item: ".result-item".into(),
            result_name: ".result-name".into(),
            result_hood: ".result-hood".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepDelays {
    pub region_select: Duration,
    pub mode_switch: Duration,
    pub scroll: Duration,
    pub popup_open: Duration,
    pub popup_close: Duration,
    pub settle: Duration,
    pub wheel_tick: Duration,
}

impl Default for SweepDelays {
    fn default() -> Self {
        Self {
            region_select: Duration::from_secs(3),
            mode_switch: Duration::from_secs(3),
            scroll: Duration::from_millis(300),
            popup_open: Duration::from_secs(1),
            popup_close: Duration::from_millis(500),
            settle: Duration::from_secs(2),
            wheel_tick: Duration::from_secs(1),
        }
    }
}

impl SweepDelays {
    pub fn none() -> Self {
        Self {
            region_select: Duration::ZERO,
            mode_switch: Duration::ZERO,
            scroll: Duration::ZERO,
            popup_open: Duration::ZERO,
            popup_close: Duration::ZERO,
            settle: Duration::ZERO,
            wheel_tick: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub modes: Vec<String>,
    /// Text of the region option to click before sweeping, if any.
    pub region_label: Option<String>,
    pub selectors: SweepSelectors,
    /// Where every pan drag starts.
    pub pan_origin: (f64, f64),
    /// Points to bring under the origin, one drag each.
    pub pan_points: Vec<(f64, f64)>,
    pub drag_steps: u32,
    /// Zoom changes in wheel ticks; positive zooms in.
    pub zoom_deltas: Vec<i32>,
    pub wheel_delta: f64,
    pub delays: SweepDelays,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            modes: vec!["hot".into(), "age".into(), "gender".into()],
            region_label: Some("New York".into()),
            selectors: SweepSelectors::default(),
            pan_origin: (400.0, 300.0),
            pan_points: vec![
                (400.0, 300.0),
                (200.0, 200.0),
                (600.0, 200.0),
                (200.0, 400.0),
                (600.0, 400.0),
                (400.0, 100.0),
                (400.0, 500.0),
            ],
            drag_steps: 10,
            zoom_deltas: vec![2, 1, 0, -1],
            wheel_delta: 100.0,
            delays: SweepDelays::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

pub struct DrivenSweep<'a> {
    config: &'a SweepConfig,
    driver: &'a dyn DomDriver,
}

impl<'a> DrivenSweep<'a> {
    pub fn new(config: &'a SweepConfig, driver: &'a dyn DomDriver) -> Self {
        Self { config, driver }
    }

    pub async fn run(&self) -> RecordSet {
        let mut found = RecordSet::new();

        self.select_region().await;

        for mode in &self.config.modes {
            let before = found.len();
            self.switch_mode(mode).await;

            self.harvest(&mut found).await;
            self.pan_sweep(&mut found).await;
            self.zoom_sweep(&mut found).await;

            info!(
                mode = mode.as_str(),
                new = found.len() - before,
                total = found.len(),
                "Mode sweep complete"
            );
        }

        found
    }

    async fn select_region(&self) {
        let Some(label) = self.config.region_label.as_deref() else {
            return;
        };
        match self.find_by_text(&self.config.selectors.region_option, label).await {
            Ok(Some(option)) => {
                if let Err(e) = self.driver.click(option).await {
                    warn!(region = label, error = %e, "Could not select region");
                    return;
                }
                info!(region = label, "Selected region");
                pause(self.config.delays.region_select).await;
            }
            Ok(None) => warn!(region = label, "Region option not found"),
            Err(e) => warn!(region = label, error = %e, "Region lookup failed"),
        }
    }

    async fn switch_mode(&self, mode: &str) {
        let selector = self.config.selectors.mode_button.replace("{mode}", mode);
        let button = match self.driver.query(&selector).await {
            Ok(Some(button)) => button,
            Ok(None) => {
                warn!(mode, "Mode button not found");
                return;
            }
            Err(e) => {
                warn!(mode, error = %e, "Mode button lookup failed");
                return;
            }
        };
        if let Err(e) = self.driver.click(button).await {
            warn!(mode, error = %e, "Could not switch mode");
            return;
        }
        info!(mode, "Switched mode");
        pause(self.config.delays.mode_switch).await;
    }

    // --- Pan / zoom ---

    async fn pan_sweep(&self, found: &mut RecordSet) {
        for (i, &point) in self.config.pan_points.iter().enumerate() {
            debug!(step = i + 1, x = point.0, y = point.1, "Panning");
            if let Err(e) = self.pan_to(point).await {
                warn!(step = i + 1, error = %e, "Pan failed");
                continue;
            }
            pause(self.config.delays.settle).await;
            self.harvest(found).await;
        }
    }

    /// Drag from the origin by `origin - point` so `point` ends up under the origin.
    async fn pan_to(&self, point: (f64, f64)) -> DriverResult<()> {
        if self.driver.query(&self.config.selectors.canvas).await?.is_none() {
            warn!("Map canvas not found, skipping pan");
            return Ok(());
        }

        let (ox, oy) = self.config.pan_origin;
        let (tx, ty) = (ox + (ox - point.0), oy + (oy - point.1));
        let steps = self.config.drag_steps.max(1);

        self.driver.mouse_move(ox, oy).await?;
        self.driver.mouse_down().await?;
        for step in 1..=steps {
            let t = f64::from(step) / f64::from(steps);
            self.driver
                .mouse_move(ox + (tx - ox) * t, oy + (ty - oy) * t)
                .await?;
        }
        self.driver.mouse_up().await
    }

    async fn zoom_sweep(&self, found: &mut RecordSet) {
        for &delta in &self.config.zoom_deltas {
            debug!(delta, "Zooming");
            if let Err(e) = self.zoom(delta).await {
                warn!(delta, error = %e, "Zoom failed");
                continue;
            }
            pause(self.config.delays.settle).await;
            self.harvest(found).await;
        }
    }

    async fn zoom(&self, delta: i32) -> DriverResult<()> {
        if delta == 0 {
            return Ok(());
        }
        let Some(canvas) = self.driver.query(&self.config.selectors.canvas).await? else {
            warn!("Map canvas not found, skipping zoom");
            return Ok(());
        };
        let (cx, cy) = self.driver.bounds(canvas).await?.center();
        // Wheel up (negative delta) zooms in.
        let tick = if delta > 0 {
            -self.config.wheel_delta
        } else {
            self.config.wheel_delta
        };

        for _ in 0..delta.unsigned_abs() {
            self.driver.mouse_move(cx, cy).await?;
            self.driver.mouse_wheel(0.0, tick).await?;
            pause(self.config.delays.wheel_tick).await;
        }
        Ok(())
    }

    // --- Markers ---

    /// Read every visible marker, merging unseen names. Returns how many were new.
    /// Every element handle taken during the harvest is released at the end.
    async fn harvest(&self, found: &mut RecordSet) -> usize {
        let added = self.harvest_markers(found).await;
        if let Err(e) = self.driver.release_all().await {
            warn!(error = %e, "Could not release element handles");
        }
        added
    }

    async fn harvest_markers(&self, found: &mut RecordSet) -> usize {
        let markers = match self.driver.query_all(&self.config.selectors.marker).await {
            Ok(markers) => markers,
            Err(e) => {
                warn!(error = %e, "Marker lookup failed");
                return 0;
            }
        };
        debug!(markers = markers.len(), "Found visible markers");

        // Read lazily, at most once per harvest.
        let mut listing: Option<Vec<ListingEntry>> = None;
        let mut added = 0;
        for (i, marker) in markers.into_iter().enumerate() {
            match self.read_marker(marker, found).await {
                Ok(Some(mut record)) => {
                    if listing.is_none() {
                        listing = Some(self.read_listing().await);
                    }
                    let hood = listing
                        .as_deref()
                        .and_then(|entries| listed_neighborhood(entries, &record.name));
                    record.hood = Some(hood.unwrap_or(UNKNOWN_NEIGHBORHOOD).to_string());

                    let name = record.name.clone();
                    if found.insert(record) {
                        added += 1;
                        debug!(name = name.as_str(), "Added restaurant");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(marker = i + 1, error = %e, "Error processing marker"),
            }
            self.close_popup().await;
        }

        if added > 0 {
            info!(added, total = found.len(), "Harvested markers");
        }
        added
    }

    async fn read_marker(
        &self,
        marker: ElementHandle,
        found: &RecordSet,
    ) -> DriverResult<Option<Record>> {
        self.driver.scroll_into_view(marker).await?;
        pause(self.config.delays.scroll).await;
        self.driver.click(marker).await?;
        pause(self.config.delays.popup_open).await;

        let sel = &self.config.selectors;
        let Some(popup) = self.driver.query(&sel.popup).await? else {
            debug!("No popup after marker click");
            return Ok(None);
        };

        let Some(name) = self.text_within(popup, &sel.popup_name).await? else {
            warn!("Popup has no restaurant name, skipping marker");
            return Ok(None);
        };
        let Some(mut record) = Record::new(&name) else {
            return Ok(None);
        };
        if found.contains_name(&record.name) {
            return Ok(None);
        }

        record.cuisine = self.text_within(popup, &sel.popup_cuisine).await?;
        record.score = Some(
            self.text_within(popup, &sel.popup_score)
                .await?
                .and_then(|text| score_out_of_ten(&text))
                .unwrap_or_else(|| DEFAULT_SCORE.to_string()),
        );
        record.reviewers = Some(
            self.text_within(popup, &sel.popup_reviewers)
                .await?
                .unwrap_or_else(|| DEFAULT_REVIEWERS.to_string()),
        );

        let [attractive, age, gender] = self.metric_scores(popup).await?;
        record.attractive_score = Some(attractive);
        record.age_score = Some(age);
        record.gender_score = Some(gender);
        Ok(Some(record))
    }

    /// Attractive/age/gender from the first three indicator positions.
    async fn metric_scores(&self, popup: ElementHandle) -> DriverResult<[RawScore; 3]> {
        let mut scores = [
            RawScore::from(DEFAULT_SCORE),
            RawScore::from(DEFAULT_SCORE),
            RawScore::from(DEFAULT_SCORE),
        ];

        let indicators = self
            .driver
            .query_all_within(popup, &self.config.selectors.metric_indicator)
            .await?;
        if indicators.len() < 3 {
            debug!(indicators = indicators.len(), "Too few metric indicators, using defaults");
            return Ok(scores);
        }

        for (slot, indicator) in scores.iter_mut().zip(indicators) {
            let style = self.driver.attribute(indicator, "style").await?;
            if let Some(score) = style.as_deref().and_then(percent_to_score) {
                *slot = RawScore::Number(score);
            }
        }
        Ok(scores)
    }

    /// Snapshot of the results sidebar. A failed read yields an empty listing,
    /// so every record of this harvest gets the unknown neighborhood.
    async fn read_listing(&self) -> Vec<ListingEntry> {
        match self.try_read_listing().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Results listing lookup failed");
                Vec::new()
            }
        }
    }

    async fn try_read_listing(&self) -> DriverResult<Vec<ListingEntry>> {
        let sel = &self.config.selectors;
        let mut entries = Vec::new();
        for item in self.driver.query_all(&sel.result_item).await? {
            let Some(name) = self.text_within(item, &sel.result_name).await? else {
                continue;
            };
            let hood = self.text_within(item, &sel.result_hood).await?;
            entries.push(ListingEntry {
                name: name.to_lowercase(),
                hood,
            });
        }
        debug!(entries = entries.len(), "Read results listing");
        Ok(entries)
    }

    async fn close_popup(&self) {
        let result = async {
            if let Some(close) = self.driver.query(&self.config.selectors.popup_close).await? {
                self.driver.click(close).await?;
                pause(self.config.delays.popup_close).await;
            }
            Ok::<_, crate::error::DriverError>(())
        }
        .await;
        if let Err(e) = result {
            debug!(error = %e, "Could not close popup");
        }
    }

    // --- Helpers ---

    async fn text_within(&self, scope: ElementHandle, selector: &str) -> DriverResult<Option<String>> {
        let Some(element) = self.driver.query_within(scope, selector).await? else {
            return Ok(None);
        };
        Ok(self
            .driver
            .text(element)
            .await?
            .map(|text| clean_text(&text))
            .filter(|text| !text.is_empty()))
    }

    async fn find_by_text(&self, selector: &str, needle: &str) -> DriverResult<Option<ElementHandle>> {
        for element in self.driver.query_all(selector).await? {
            if let Some(text) = self.driver.text(element).await? {
                if text.contains(needle) {
                    return Ok(Some(element));
                }
            }
        }
        Ok(None)
    }
}

struct ListingEntry {
    /// Lowercased.
    name: String,
    hood: Option<String>,
}

/// Neighborhood of the first listing entry whose name contains `name`,
/// ignoring case.
fn listed_neighborhood<'e>(entries: &'e [ListingEntry], name: &str) -> Option<&'e str> {
    let needle = name.to_lowercase();
    entries
        .iter()
        .find(|entry| entry.name.contains(&needle))?
        .hood
        .as_deref()
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// `"8.5/10"` → `"8.5"`.
fn score_out_of_ten(text: &str) -> Option<String> {
    SCORE_OUT_OF_TEN
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// `"left: 85%;"` → `8.5`, rounded to one decimal.
fn percent_to_score(style: &str) -> Option<f64> {
    let caps = LEFT_PERCENT.captures(style)?;
    let percent: f64 = caps[1].parse().ok()?;
    let score = percent / 10.0;
    Some((score * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_badge_is_parsed() {
        assert_eq!(score_out_of_ten("8.5/10").as_deref(), Some("8.5"));
        assert_eq!(score_out_of_ten("Score: 7 / 10").as_deref(), Some("7"));
        assert_eq!(score_out_of_ten("great"), None);
    }

    #[test]
    fn indicator_percent_becomes_tenths() {
        assert_eq!(percent_to_score("left: 85%;"), Some(8.5));
        assert_eq!(percent_to_score("position: absolute; left: 67.3%"), Some(6.7));
        assert_eq!(percent_to_score("left: 100%"), Some(10.0));
        assert_eq!(percent_to_score("top: 4px"), None);
    }

    #[test]
    fn listing_match_is_case_insensitive_substring() {
        let entries = vec![
            ListingEntry {
                name: "joe's pizza (carmine st)".into(),
                hood: Some("West Village".into()),
            },
            ListingEntry {
                name: "katz's delicatessen".into(),
                hood: None,
            },
        ];
        assert_eq!(listed_neighborhood(&entries, "Joe's Pizza"), Some("West Village"));
        assert_eq!(listed_neighborhood(&entries, "KATZ'S"), None);
        assert_eq!(listed_neighborhood(&entries, "Lucali"), None);
    }

    #[test]
    fn default_pan_points_drag_mirror_image() {
        let config = SweepConfig::default();
        let (ox, oy) = config.pan_origin;
        let (px, py) = config.pan_points[1];
        assert_eq!((ox + (ox - px), oy + (oy - py)), (600.0, 400.0));
    }
}
