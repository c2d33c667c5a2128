//! In-memory stand-ins for every port, shared by the flow tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{App, Services};
use crate::availability::AvailabilityListing;
use crate::config::AppConfig;
use crate::domain::{AvailabilityEntry, Category, Platform, SubscriptionRecord, SubscriptionRequest};
use crate::error::{AppError, Result};
use crate::ports::{
    AlertKind, CategoryOption, ChoiceItem, Clock, DeleteOutcome, KeyValueStore,
    NotificationBridge, PermissionState, PushBridge, PushHandle, RemoteService, SuccessSummary,
    View,
};
use crate::push::NotificationContent;

pub const NOW: u64 = 1_714_000_000_000;

pub struct FakeRemote {
    pub categories: Vec<Category>,
    pub categories_error: Option<AppError>,
    pub vapid_key: Result<String>,
    pub create_error: Option<AppError>,
    pub record: Result<Option<SubscriptionRecord>>,
    pub delete: Result<DeleteOutcome>,
    pub snapshots: RefCell<VecDeque<Result<Vec<AvailabilityEntry>>>>,
    pub calls: RefCell<Vec<String>>,
    pub posted: RefCell<Vec<SubscriptionRequest>>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            categories_error: None,
            vapid_key: Ok("AQI".to_string()),
            create_error: None,
            record: Ok(None),
            delete: Ok(DeleteOutcome::Deleted),
            snapshots: RefCell::new(VecDeque::new()),
            calls: RefCell::new(Vec::new()),
            posted: RefCell::new(Vec::new()),
        }
    }
}

impl FakeRemote {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record_call(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

#[async_trait(?Send)]
impl RemoteService for FakeRemote {
    async fn categories(&self) -> Result<Vec<Category>> {
        self.record_call("GET /categories");
        match &self.categories_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.categories.clone()),
        }
    }

    async fn vapid_public_key(&self) -> Result<String> {
        self.record_call("GET /vapid-public-key");
        self.vapid_key.clone()
    }

    async fn create_subscription(&self, request: &SubscriptionRequest) -> Result<()> {
        self.record_call("POST /subscriptions");
        self.posted.borrow_mut().push(request.clone());
        self.create_error.clone().map_or(Ok(()), Err)
    }

    async fn fetch_subscription(&self, user_id: &str) -> Result<Option<SubscriptionRecord>> {
        self.record_call(format!("GET /subscriptions/{user_id}"));
        self.record.clone()
    }

    async fn delete_subscription(&self, user_id: &str) -> Result<DeleteOutcome> {
        self.record_call(format!("DELETE /subscriptions/{user_id}"));
        self.delete.clone()
    }

    async fn fetch_snapshot(&self, cache_buster: u64) -> Result<Vec<AvailabilityEntry>> {
        self.record_call(format!("GET snapshot?t={cache_buster}"));
        self.snapshots
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Network("no snapshot scripted".to_string())))
    }
}

pub struct FakeNotifications {
    pub state: Cell<PermissionState>,
    pub prompt_answer: PermissionState,
    pub prompts: Cell<u32>,
    pub shown: RefCell<Vec<NotificationContent>>,
    pub show_error: Option<AppError>,
}

impl FakeNotifications {
    pub const fn with_state(state: PermissionState) -> Self {
        Self {
            state: Cell::new(state),
            prompt_answer: PermissionState::Granted,
            prompts: Cell::new(0),
            shown: RefCell::new(Vec::new()),
            show_error: None,
        }
    }
}

impl Default for FakeNotifications {
    fn default() -> Self {
        Self::with_state(PermissionState::Granted)
    }
}

#[async_trait(?Send)]
impl NotificationBridge for FakeNotifications {
    fn permission(&self) -> PermissionState {
        self.state.get()
    }

    async fn request_permission(&self) -> Result<PermissionState> {
        self.prompts.set(self.prompts.get() + 1);
        self.state.set(self.prompt_answer);
        Ok(self.prompt_answer)
    }

    async fn show_local(&self, content: &NotificationContent) -> Result<()> {
        if let Some(error) = &self.show_error {
            return Err(error.clone());
        }
        self.shown.borrow_mut().push(content.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePush {
    pub supported: bool,
    pub register_error: Option<AppError>,
    pub handle: Option<PushHandle>,
    pub existing: Cell<bool>,
    pub keys: RefCell<Vec<Vec<u8>>>,
    pub calls: RefCell<Vec<&'static str>>,
}

impl FakePush {
    pub fn working(endpoint: &str) -> Self {
        Self {
            supported: true,
            handle: Some(PushHandle {
                endpoint: endpoint.to_string(),
                serialized: format!(r#"{{"endpoint":"{endpoint}"}}"#),
            }),
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl PushBridge for FakePush {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn register_worker(&self) -> Result<()> {
        self.calls.borrow_mut().push("register");
        self.register_error.clone().map_or(Ok(()), Err)
    }

    async fn subscribe(&self, application_server_key: &[u8]) -> Result<PushHandle> {
        self.calls.borrow_mut().push("subscribe");
        self.keys.borrow_mut().push(application_server_key.to_vec());
        self.handle
            .clone()
            .ok_or_else(|| AppError::Network("push service unavailable".to_string()))
    }

    async fn unsubscribe_existing(&self) -> Result<bool> {
        self.calls.borrow_mut().push("unsubscribe");
        Ok(self.existing.replace(false))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        let values = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Self {
            values: RefCell::new(values),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Screen(String),
    ScrollTop,
    Setup(Platform),
    Categories(Vec<ChoiceItem>),
    CategorySelected(String, bool),
    NextEnabled(bool),
    Locations(Vec<ChoiceItem>),
    LocationSelected(String, bool),
    LocationVisible(String, bool),
    SubscribeLabel(String),
    SubscribeEnabled(bool),
    InlineError(String),
    HideInlineError,
    Alert(String, AlertKind),
    Success(SuccessSummary),
    Donate(bool),
    OpenExternal(String),
    Confirm(String),
    Reload(Duration),
    AvailabilityOpen(bool),
    AvailabilityCategories(Vec<CategoryOption>, Option<String>),
    Availability(AvailabilityListing),
}

pub struct RecordingView {
    pub events: RefCell<Vec<ViewEvent>>,
    pub label: RefCell<String>,
    pub confirm_answer: Cell<bool>,
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            label: RefCell::new("Subscribe".to_string()),
            confirm_answer: Cell::new(true),
        }
    }
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.borrow().clone()
    }

    pub fn saw(&self, event: &ViewEvent) -> bool {
        self.events.borrow().contains(event)
    }

    pub fn last_subscribe_enabled(&self) -> Option<bool> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            ViewEvent::SubscribeEnabled(enabled) => Some(*enabled),
            _ => None,
        })
    }

    fn push(&self, event: ViewEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl View for RecordingView {
    fn activate_screen(&self, element_id: &str) {
        self.push(ViewEvent::Screen(element_id.to_string()));
    }

    fn scroll_to_top(&self) {
        self.push(ViewEvent::ScrollTop);
    }

    fn show_setup_instructions(&self, platform: Platform) {
        self.push(ViewEvent::Setup(platform));
    }

    fn render_categories(&self, items: &[ChoiceItem]) {
        self.push(ViewEvent::Categories(items.to_vec()));
    }

    fn set_category_selected(&self, key: &str, selected: bool) {
        self.push(ViewEvent::CategorySelected(key.to_string(), selected));
    }

    fn set_next_enabled(&self, enabled: bool) {
        self.push(ViewEvent::NextEnabled(enabled));
    }

    fn render_locations(&self, items: &[ChoiceItem]) {
        self.push(ViewEvent::Locations(items.to_vec()));
    }

    fn set_location_selected(&self, name: &str, selected: bool) {
        self.push(ViewEvent::LocationSelected(name.to_string(), selected));
    }

    fn set_location_visible(&self, name: &str, visible: bool) {
        self.push(ViewEvent::LocationVisible(name.to_string(), visible));
    }

    fn subscribe_label(&self) -> String {
        self.label.borrow().clone()
    }

    fn set_subscribe_label(&self, label: &str) {
        *self.label.borrow_mut() = label.to_string();
        self.push(ViewEvent::SubscribeLabel(label.to_string()));
    }

    fn set_subscribe_enabled(&self, enabled: bool) {
        self.push(ViewEvent::SubscribeEnabled(enabled));
    }

    fn show_inline_error(&self, message: &str) {
        self.push(ViewEvent::InlineError(message.to_string()));
    }

    fn hide_inline_error(&self) {
        self.push(ViewEvent::HideInlineError);
    }

    fn show_alert(&self, message: &str, kind: AlertKind) {
        self.push(ViewEvent::Alert(message.to_string(), kind));
    }

    fn render_success(&self, summary: &SuccessSummary) {
        self.push(ViewEvent::Success(summary.clone()));
    }

    fn set_donate_popup(&self, visible: bool) {
        self.push(ViewEvent::Donate(visible));
    }

    fn open_external(&self, url: &str) {
        self.push(ViewEvent::OpenExternal(url.to_string()));
    }

    fn confirm(&self, message: &str) -> bool {
        self.push(ViewEvent::Confirm(message.to_string()));
        self.confirm_answer.get()
    }

    fn schedule_reload(&self, delay: Duration) {
        self.push(ViewEvent::Reload(delay));
    }

    fn set_availability_open(&self, open: bool) {
        self.push(ViewEvent::AvailabilityOpen(open));
    }

    fn render_availability_categories(&self, options: &[CategoryOption], selected: Option<&str>) {
        self.push(ViewEvent::AvailabilityCategories(
            options.to_vec(),
            selected.map(str::to_string),
        ));
    }

    fn render_availability(&self, listing: &AvailabilityListing) {
        self.push(ViewEvent::Availability(listing.clone()));
    }
}

/// Fakes to wire into an [`App`]; tweak fields before calling `build`.
#[derive(Default)]
pub struct Fakes {
    pub remote: FakeRemote,
    pub notifications: FakeNotifications,
    pub push: FakePush,
    pub store: MemoryStore,
    pub view: RecordingView,
}

pub struct Harness {
    pub app: App,
    pub remote: Rc<FakeRemote>,
    pub notifications: Rc<FakeNotifications>,
    pub push: Rc<FakePush>,
    pub store: Rc<MemoryStore>,
    pub view: Rc<RecordingView>,
}

impl Fakes {
    pub fn build(self) -> Harness {
        let remote = Rc::new(self.remote);
        let notifications = Rc::new(self.notifications);
        let push = Rc::new(self.push);
        let store = Rc::new(self.store);
        let view = Rc::new(self.view);

        let services = Services {
            remote: remote.clone(),
            notifications: notifications.clone(),
            push: push.clone(),
            store: store.clone(),
            clock: Rc::new(FixedClock(NOW)),
            view: view.clone(),
        };

        Harness {
            app: App::new(AppConfig::default(), services),
            remote,
            notifications,
            push,
            store,
            view,
        }
    }
}

pub fn category(key: &str, name: &str) -> Category {
    Category {
        key: key.to_string(),
        name: name.to_string(),
        description: format!("{name} appointments"),
    }
}
