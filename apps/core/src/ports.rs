//! Seams between the notifier's policy and the browser.
//!
//! The page runs on a single thread, so async ports are `?Send` and shared
//! through `Rc`. The web crate implements each of them against `web-sys`;
//! tests implement them in memory.

use std::time::Duration;

use async_trait::async_trait;

use crate::availability::AvailabilityListing;
use crate::domain::{AvailabilityEntry, Category, Platform, SubscriptionRecord, SubscriptionRequest};
use crate::error::Result;
use crate::push::NotificationContent;

/// Browser notification permission, plus the "no Notification API" case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Unsupported,
    /// Never asked; prompting is allowed.
    Default,
    Granted,
    /// Refused earlier; browsers do not allow prompting again.
    Denied,
}

/// A live push subscription as handed out by the push service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushHandle {
    pub endpoint: String,
    /// `JSON.stringify` of the subscription (endpoint and keys).
    pub serialized: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The server answered 404; the subscription was already gone.
    AlreadyGone,
}

#[async_trait(?Send)]
pub trait RemoteService {
    async fn categories(&self) -> Result<Vec<Category>>;
    async fn vapid_public_key(&self) -> Result<String>;
    async fn create_subscription(&self, request: &SubscriptionRequest) -> Result<()>;
    /// `Ok(None)` when the server has no subscription for `user_id`.
    async fn fetch_subscription(&self, user_id: &str) -> Result<Option<SubscriptionRecord>>;
    async fn delete_subscription(&self, user_id: &str) -> Result<DeleteOutcome>;
    async fn fetch_snapshot(&self, cache_buster: u64) -> Result<Vec<AvailabilityEntry>>;
}

#[async_trait(?Send)]
pub trait NotificationBridge {
    fn permission(&self) -> PermissionState;
    /// Shows the browser prompt. Only meaningful in the `Default` state.
    async fn request_permission(&self) -> Result<PermissionState>;
    async fn show_local(&self, content: &NotificationContent) -> Result<()>;
}

#[async_trait(?Send)]
pub trait PushBridge {
    /// Background worker and push manager are both available.
    fn is_supported(&self) -> bool;
    /// Registers the background worker and waits until it is ready.
    async fn register_worker(&self) -> Result<()>;
    /// Requests a user-visible subscription scoped to `application_server_key`.
    async fn subscribe(&self, application_server_key: &[u8]) -> Result<PushHandle>;
    /// Drops whatever subscription the browser currently holds.
    /// Returns `false` when there was none.
    async fn unsubscribe_existing(&self) -> Result<bool>;
}

/// Durable browser-local string storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

impl AlertKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// One selectable tile on the category or location screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceItem {
    pub key: String,
    pub title: String,
    pub detail: Option<String>,
    pub selected: bool,
}

/// What the success screen echoes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessSummary {
    pub categories: String,
    pub locations: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub key: String,
    pub label: String,
}

/// Rendering surface of the page. Implementations silently ignore elements
/// that are missing from the document.
pub trait View {
    /// Deactivates every screen, then activates `element_id` if it exists.
    fn activate_screen(&self, element_id: &str);
    fn scroll_to_top(&self);
    fn show_setup_instructions(&self, platform: Platform);

    fn render_categories(&self, items: &[ChoiceItem]);
    fn set_category_selected(&self, key: &str, selected: bool);
    fn set_next_enabled(&self, enabled: bool);

    fn render_locations(&self, items: &[ChoiceItem]);
    fn set_location_selected(&self, name: &str, selected: bool);
    fn set_location_visible(&self, name: &str, visible: bool);

    fn subscribe_label(&self) -> String;
    fn set_subscribe_label(&self, label: &str);
    fn set_subscribe_enabled(&self, enabled: bool);
    fn show_inline_error(&self, message: &str);
    fn hide_inline_error(&self);

    /// Transient banner; hides itself after the configured duration.
    fn show_alert(&self, message: &str, kind: AlertKind);
    fn render_success(&self, summary: &SuccessSummary);
    fn set_donate_popup(&self, visible: bool);
    fn open_external(&self, url: &str);
    fn confirm(&self, message: &str) -> bool;
    fn schedule_reload(&self, delay: Duration);

    fn set_availability_open(&self, open: bool);
    fn render_availability_categories(&self, options: &[CategoryOption], selected: Option<&str>);
    fn render_availability(&self, listing: &AvailabilityListing);
}
