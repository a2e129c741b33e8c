//! Bulk-transfer engine configuration.

use serde::{Deserialize, Serialize};

/// Engine adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine adapter to construct. Only `"simulated"` ships in-tree.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Announce URLs handed to the engine with every admission.
    #[serde(default = "default_trackers")]
    pub trackers: Vec<String>,
    /// Progress step (percent) at which quota is re-checked and progress logged.
    #[serde(default = "default_step")]
    pub progress_check_step_percent: u8,
    /// Capacity of each per-session notification channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Simulated engine: bytes written per tick.
    #[serde(default = "default_sim_chunk")]
    pub simulated_chunk_bytes: u64,
    /// Simulated engine: milliseconds between ticks.
    #[serde(default = "default_sim_tick")]
    pub simulated_tick_millis: u64,
    /// Simulated engine: payload size when the descriptor has no `xl` hint.
    #[serde(default = "default_sim_length")]
    pub simulated_default_length: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            trackers: default_trackers(),
            progress_check_step_percent: default_step(),
            event_buffer: default_event_buffer(),
            simulated_chunk_bytes: default_sim_chunk(),
            simulated_tick_millis: default_sim_tick(),
            simulated_default_length: default_sim_length(),
        }
    }
}

fn default_provider() -> String {
    "simulated".to_string()
}

fn default_trackers() -> Vec<String> {
    vec![
        "udp://tracker.opentrackr.org:1337/announce".to_string(),
        "udp://tracker.torrent.eu.org:451/announce".to_string(),
        "udp://open.stealth.si:80/announce".to_string(),
        "udp://exodus.desync.com:6969/announce".to_string(),
        "http://tracker.opentrackr.org:1337/announce".to_string(),
    ]
}

fn default_step() -> u8 {
    5
}

fn default_event_buffer() -> usize {
    64
}

fn default_sim_chunk() -> u64 {
    256 * 1024
}

fn default_sim_tick() -> u64 {
    250
}

fn default_sim_length() -> u64 {
    8 * 1024 * 1024
}
