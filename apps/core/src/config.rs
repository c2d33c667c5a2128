use std::time::Duration;

use crate::domain::DATE_RANGE_DAYS;

const DEFAULT_SNAPSHOT_PATH: &str = "data/last_check.json";
const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
const DEFAULT_WORKER_SCRIPT: &str = "/sw.js";
const DEFAULT_CACHE_NAME: &str = "dmv-monitor-v15";
const DEFAULT_RELOAD_DELAY_MS: u64 = 1_000;
const DEFAULT_ALERT_DURATION_MS: u64 = 4_000;
const DEFAULT_DONATE_URL: &str = "https://ko-fi.com/gizred";
const PRECACHE_ASSETS: &[&str] = &["/app.js", "/manifest.json"];

/// Runtime settings shared by the page and the background worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Origin of the subscription API. Empty means "same origin as the page".
    pub api_base: String,
    /// Static availability snapshot, fetched relative to the page.
    pub snapshot_path: String,
    pub poll_interval: Duration,
    pub worker_script: String,
    /// Versioned cache name; bumping it evicts every older cache on activation.
    pub cache_name: String,
    pub precache_assets: Vec<String>,
    pub reload_delay: Duration,
    pub alert_duration: Duration,
    pub donate_url: String,
    pub date_range_days: u32,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            worker_script: DEFAULT_WORKER_SCRIPT.to_string(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            precache_assets: PRECACHE_ASSETS.iter().map(|s| (*s).to_string()).collect(),
            reload_delay: Duration::from_millis(DEFAULT_RELOAD_DELAY_MS),
            alert_duration: Duration::from_millis(DEFAULT_ALERT_DURATION_MS),
            donate_url: DEFAULT_DONATE_URL.to_string(),
            date_range_days: DATE_RANGE_DAYS,
            debug: false,
        }
    }
}

impl AppConfig {
    /// Reads overrides baked in at build time.
    ///
    /// There is no process environment inside a browser, so `DMV_*` variables
    /// are captured when the wasm module is compiled.
    pub fn from_build_env() -> Self {
        Self::from_lookup(|key| match key {
            "DMV_API_URL" => option_env!("DMV_API_URL"),
            "DMV_SNAPSHOT_PATH" => option_env!("DMV_SNAPSHOT_PATH"),
            "DMV_POLL_INTERVAL_MS" => option_env!("DMV_POLL_INTERVAL_MS"),
            "DMV_WORKER_SCRIPT" => option_env!("DMV_WORKER_SCRIPT"),
            "DMV_CACHE_NAME" => option_env!("DMV_CACHE_NAME"),
            "DMV_DONATE_URL" => option_env!("DMV_DONATE_URL"),
            "DMV_DEBUG" => option_env!("DMV_DEBUG"),
            _ => None,
        })
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    /// for anything missing or malformed.
    pub fn from_lookup<'a, F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            lookup(key)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map_or(fallback, str::to_string)
        };

        Self {
            api_base: text("DMV_API_URL", defaults.api_base),
            snapshot_path: text("DMV_SNAPSHOT_PATH", defaults.snapshot_path),
            poll_interval: parse_millis(
                "DMV_POLL_INTERVAL_MS",
                lookup("DMV_POLL_INTERVAL_MS"),
                defaults.poll_interval,
            ),
            worker_script: text("DMV_WORKER_SCRIPT", defaults.worker_script),
            cache_name: text("DMV_CACHE_NAME", defaults.cache_name),
            donate_url: text("DMV_DONATE_URL", defaults.donate_url),
            debug: lookup("DMV_DEBUG").is_some_and(is_truthy),
            ..defaults
        }
    }

    /// Uses `origin` as the API base unless one was configured explicitly.
    pub fn with_origin(mut self, origin: &str) -> Self {
        if self.api_base.is_empty() {
            self.api_base = origin.to_string();
        }
        self
    }

    /// Joins an API path onto the configured base.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Snapshot URL with a cache-busting query parameter.
    pub fn snapshot_url(&self, cache_buster: u64) -> String {
        format!("{}?t={cache_buster}", self.snapshot_path)
    }
}

fn parse_millis(key: &str, raw: Option<&str>, fallback: Duration) -> Duration {
    let Some(raw) = raw else {
        return fallback;
    };

    match raw.trim().parse::<u64>() {
        Ok(millis) if millis > 0 => Duration::from_millis(millis),
        _ => {
            log::warn!("Ignoring invalid {key}={raw:?}, using {}ms", fallback.as_millis());
            fallback
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
