use log::Level;
use serde::Deserialize;
use web_sys::Document;

use crate::error::EnhanceError;

/// Id of the optional `<script type="application/json">` element holding overrides.
pub const CONFIG_ELEMENT_ID: &str = "landing-config";

#[cfg(debug_assertions)]
pub fn log_level() -> Level {
    Level::Debug // Verbose output while developing locally
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> Level {
    Level::Info
}

/// Hosts where the scroll diagnostics monitor reports to the console.
pub fn is_dev_host(hostname: &str) -> bool {
    matches!(hostname, "localhost" | "127.0.0.1")
}

/// Every tunable the controllers read. Missing keys in the page override fall back to these defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    pub nav_threshold: f64,
    pub anchor_gutter: f64,
    pub loading_delay_ms: u32,
    pub success_hold_ms: u32,
    pub announce_clear_ms: u32,
    pub ripple_ms: u32,
    pub counter_duration_ms: f64,
    pub counter_stagger_ms: u32,
    pub accordion_focus_ms: u32,
    pub entrance_delays_ms: Vec<u32>,
    pub input_debounce_ms: u32,
    pub resize_debounce_ms: u32,
    pub pointer_throttle_ms: u32,
    pub scroll_throttle_ms: u32,
    pub parallax_speed: f64,
    pub follow_smoothing: f64,
    pub follow_magnitude: f64,
    pub magnetic_factor: f64,
    pub loading_label: String,
    pub success_label: String,
    pub form_error_message: String,
    pub diagnostics_interval_ms: u32,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            nav_threshold: 100.0,
            anchor_gutter: 20.0,
            loading_delay_ms: 2000,
            success_hold_ms: 3000,
            announce_clear_ms: 1000,
            ripple_ms: 600,
            counter_duration_ms: 1500.0,
            counter_stagger_ms: 200,
            accordion_focus_ms: 400,
            entrance_delays_ms: vec![0, 200, 400, 600],
            input_debounce_ms: 300,
            resize_debounce_ms: 250,
            pointer_throttle_ms: 16,
            scroll_throttle_ms: 16,
            parallax_speed: 0.5,
            follow_smoothing: 0.1,
            follow_magnitude: 10.0,
            magnetic_factor: 0.1,
            loading_label: "Sending Analysis...".to_string(),
            success_label: "Analysis Sent! ✓".to_string(),
            form_error_message: "Please correct the errors above".to_string(),
            diagnostics_interval_ms: 5000,
        }
    }
}

impl LandingConfig {
    pub fn from_json(raw: &str) -> Result<Self, EnhanceError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads overrides embedded in the page, falling back to defaults when absent or invalid.
    pub fn from_document(document: &Document) -> Self {
        let Some(raw) = document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|el| el.text_content())
        else {
            return Self::default();
        };

        match Self::from_json(&raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring landing config overrides: {}", e);
                Self::default()
            }
        }
    }
}
