//! Background worker policy: cache versioning, fetch strategy and
//! notification-click routing. The worker shares no memory with the page;
//! it only sees push deliveries and the list of open clients.

use std::fmt;

use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Parsed,
    Installing,
    Installed,
    Activating,
    Active,
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed => write!(f, "Parsed"),
            Self::Installing => write!(f, "Installing"),
            Self::Installed => write!(f, "Installed"),
            Self::Activating => write!(f, "Activating"),
            Self::Active => write!(f, "Active"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    Install,
    Precached,
    Activate,
    Claimed,
}

impl fmt::Display for WorkerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "Install"),
            Self::Precached => write!(f, "Precached"),
            Self::Activate => write!(f, "Activate"),
            Self::Claimed => write!(f, "Claimed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid worker transition from {from} with event {event}")]
pub struct WorkerTransitionError {
    pub from: WorkerPhase,
    pub event: WorkerEvent,
}

impl WorkerPhase {
    pub const fn next(self, event: WorkerEvent) -> Result<Self, WorkerTransitionError> {
        match (self, event) {
            (Self::Parsed, WorkerEvent::Install) => Ok(Self::Installing),
            (Self::Installing, WorkerEvent::Precached) => Ok(Self::Installed),
            // skipWaiting lets a fresh worker activate straight from installing
            (Self::Installing | Self::Installed, WorkerEvent::Activate) => Ok(Self::Activating),
            (Self::Activating, WorkerEvent::Claimed) => Ok(Self::Active),
            (from, event) => Err(WorkerTransitionError { from, event }),
        }
    }
}

/// Versioned asset cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub name: String,
    pub assets: Vec<String>,
}

impl CachePolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            name: config.cache_name.clone(),
            assets: config.precache_assets.clone(),
        }
    }

    /// Caches left behind by earlier versions, to be deleted on activation.
    pub fn stale_caches<'a>(&self, existing: &'a [String]) -> Vec<&'a str> {
        existing
            .iter()
            .map(String::as_str)
            .filter(|name| *name != self.name)
            .collect()
    }
}

/// Cache-first: a cached response is always served, the network is only
/// consulted on a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
}

pub const fn fetch_source(cache_hit: bool) -> FetchSource {
    if cache_hit {
        FetchSource::Cache
    } else {
        FetchSource::Network
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Focus the open window at this index.
    Focus(usize),
    OpenWindow(String),
}

/// Focuses a window already showing `target`, or opens a new one.
pub fn route_click<S: AsRef<str>>(client_urls: &[S], target: &str) -> ClickAction {
    client_urls
        .iter()
        .position(|url| urls_match(url.as_ref(), target))
        .map_or_else(|| ClickAction::OpenWindow(target.to_string()), ClickAction::Focus)
}

// Client URLs are absolute while notification targets are usually paths.
fn urls_match(client_url: &str, target: &str) -> bool {
    if client_url == target {
        return true;
    }
    if !target.starts_with('/') {
        return false;
    }

    client_url
        .split_once("://")
        .and_then(|(_, rest)| rest.find('/').map(|index| &rest[index..]))
        .map_or(target == "/", |path| path == target)
}
