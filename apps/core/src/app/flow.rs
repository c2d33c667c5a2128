use std::fmt;

use thiserror::Error;

use crate::app::state::{App, Screen, USER_ID_KEY};
use crate::domain::SubscriptionRequest;
use crate::ports::{PermissionState, PushHandle, SuccessSummary};
use crate::push::{decode_application_server_key, derive_user_id};

const BUSY_LABEL: &str = "⏳ Setting up...";
const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one category.";
const PERMISSION_REQUIRED_MESSAGE: &str = "Notifications are required.";
const UNSUPPORTED_MESSAGE: &str = "Browser does not support notifications";
const BLOCKED_MESSAGE: &str = "Notifications are blocked in settings.";

// States of a single subscribe attempt
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubscribeStage {
    Idle,
    Validating,
    RequestingPermission,
    RegisteringPush,
    Submitting,
    Success,
    Error,
}

impl fmt::Display for SubscribeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Validating => write!(f, "Validating"),
            Self::RequestingPermission => write!(f, "RequestingPermission"),
            Self::RegisteringPush => write!(f, "RegisteringPush"),
            Self::Submitting => write!(f, "Submitting"),
            Self::Success => write!(f, "Success"),
            Self::Error => write!(f, "Error"),
        }
    }
}

impl SubscribeStage {
    /// Whether the subscribe control is disabled and shows the busy label.
    pub const fn control_busy(self) -> bool {
        matches!(
            self,
            Self::RequestingPermission | Self::RegisteringPush | Self::Submitting
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscribeEvent {
    Start,
    SelectionValid,
    SelectionEmpty,
    PermissionGranted,
    PermissionRefused(String),
    /// Push registration finished, with or without a subscription.
    PushSettled,
    Accepted,
    Failed(String),
}

impl fmt::Display for SubscribeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::SelectionValid => write!(f, "SelectionValid"),
            Self::SelectionEmpty => write!(f, "SelectionEmpty"),
            Self::PermissionGranted => write!(f, "PermissionGranted"),
            Self::PermissionRefused(msg) => write!(f, "PermissionRefused({msg})"),
            Self::PushSettled => write!(f, "PushSettled"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Failed(msg) => write!(f, "Failed({msg})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid transition from {from} with event {event}")]
pub struct StateTransitionError {
    pub from: SubscribeStage,
    pub event: SubscribeEvent,
}

#[derive(Debug)]
pub struct SubscribeMachine {
    stage: SubscribeStage,
}

impl SubscribeMachine {
    pub const fn new() -> Self {
        Self {
            stage: SubscribeStage::Idle,
        }
    }

    pub const fn stage(&self) -> SubscribeStage {
        self.stage
    }

    pub fn process(&mut self, event: &SubscribeEvent) -> Result<SubscribeStage, StateTransitionError> {
        let next = match (self.stage, event) {
            // Error is not terminal: the same control can start a new attempt
            (SubscribeStage::Idle | SubscribeStage::Error, SubscribeEvent::Start) => {
                SubscribeStage::Validating
            }
            (SubscribeStage::Validating, SubscribeEvent::SelectionValid) => {
                SubscribeStage::RequestingPermission
            }
            (SubscribeStage::RequestingPermission, SubscribeEvent::PermissionGranted) => {
                SubscribeStage::RegisteringPush
            }
            (SubscribeStage::RegisteringPush, SubscribeEvent::PushSettled) => {
                SubscribeStage::Submitting
            }
            (SubscribeStage::Submitting, SubscribeEvent::Accepted) => SubscribeStage::Success,
            (SubscribeStage::Validating, SubscribeEvent::SelectionEmpty)
            | (SubscribeStage::RequestingPermission, SubscribeEvent::PermissionRefused(_))
            | (SubscribeStage::Submitting, SubscribeEvent::Failed(_)) => SubscribeStage::Error,
            _ => {
                return Err(StateTransitionError {
                    from: self.stage,
                    event: event.clone(),
                })
            }
        };

        log::debug!("Subscribe flow: {} --{event}--> {next}", self.stage);
        self.stage = next;
        Ok(next)
    }
}

impl Default for SubscribeMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of asking for notification permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOutcome {
    pub granted: bool,
    pub error: Option<String>,
}

impl PermissionOutcome {
    const fn granted() -> Self {
        Self {
            granted: true,
            error: None,
        }
    }

    fn refused(error: Option<&str>) -> Self {
        Self {
            granted: false,
            error: error.map(str::to_string),
        }
    }
}

impl App {
    /// Granted: answers immediately. Never asked: prompts. Denied or
    /// unsupported: refuses without prompting.
    pub async fn request_notification_permission(&self) -> PermissionOutcome {
        let notifications = &self.services.notifications;
        match notifications.permission() {
            PermissionState::Granted => PermissionOutcome::granted(),
            PermissionState::Unsupported => PermissionOutcome::refused(Some(UNSUPPORTED_MESSAGE)),
            PermissionState::Denied => PermissionOutcome::refused(Some(BLOCKED_MESSAGE)),
            PermissionState::Default => match notifications.request_permission().await {
                Ok(PermissionState::Granted) => PermissionOutcome::granted(),
                Ok(answer) => {
                    log::info!("Notification prompt answered with {answer:?}");
                    PermissionOutcome::refused(None)
                }
                Err(error) => {
                    log::error!("Notification permission request failed: {error}");
                    PermissionOutcome::refused(Some(&error.user_message()))
                }
            },
        }
    }

    /// Runs the subscribe flow end to end and returns the stage it stopped in.
    pub async fn subscribe(&self) -> SubscribeStage {
        let mut machine = SubscribeMachine::new();
        if let Err(error) = self.run_subscribe(&mut machine).await {
            log::error!("Subscribe flow aborted: {error}");
        }
        machine.stage()
    }

    async fn run_subscribe(&self, machine: &mut SubscribeMachine) -> Result<(), StateTransitionError> {
        let view = self.services.view.clone();
        view.hide_inline_error();
        machine.process(&SubscribeEvent::Start)?;

        if self.state.borrow().categories.is_empty() {
            machine.process(&SubscribeEvent::SelectionEmpty)?;
            view.show_inline_error(EMPTY_SELECTION_MESSAGE);
            return Ok(());
        }
        machine.process(&SubscribeEvent::SelectionValid)?;

        let original_label = view.subscribe_label();
        view.set_subscribe_enabled(false);
        view.set_subscribe_label(BUSY_LABEL);
        let release_control = || {
            view.set_subscribe_label(&original_label);
            view.set_subscribe_enabled(true);
        };

        let permission = self.request_notification_permission().await;
        if !permission.granted {
            let message = permission
                .error
                .unwrap_or_else(|| PERMISSION_REQUIRED_MESSAGE.to_string());
            log::warn!("Subscribe halted, notification permission missing: {message}");
            machine.process(&SubscribeEvent::PermissionRefused(message.clone()))?;
            view.show_inline_error(&message);
            release_control();
            return Ok(());
        }
        machine.process(&SubscribeEvent::PermissionGranted)?;

        let handle = self.register_push().await;
        let user_id = derive_user_id(
            handle.as_ref().map(|handle| handle.endpoint.as_str()),
            self.services.clock.now_millis(),
        );
        let request = {
            let mut state = self.state.borrow_mut();
            state.subscription.clone_from(&handle);
            state.user_id = Some(user_id.clone());
            SubscriptionRequest {
                user_id: user_id.clone(),
                push_subscription: handle.map(|handle| handle.serialized),
                categories: state.categories.to_vec(),
                locations: state.locations.to_vec(),
                date_range_days: self.config.date_range_days,
            }
        };
        machine.process(&SubscribeEvent::PushSettled)?;

        if let Err(error) = self.services.remote.create_subscription(&request).await {
            log::error!("Subscribe error: {error}");
            let message = format!("Failed: {}", error.user_message());
            machine.process(&SubscribeEvent::Failed(message.clone()))?;
            view.show_inline_error(&message);
            release_control();
            return Ok(());
        }
        machine.process(&SubscribeEvent::Accepted)?;

        log::info!("Subscribed {user_id} to {} categories", request.categories.len());
        if let Err(error) = self.services.store.set(USER_ID_KEY, &user_id) {
            log::warn!("Could not persist user id, restore will not work: {error}");
        }
        self.show_success_screen().await;
        self.show_donate_popup_once();
        Ok(())
    }

    /// Best-effort: any failure is logged and the flow continues without a
    /// push subscription. Browser-level notifications still work.
    async fn register_push(&self) -> Option<PushHandle> {
        let push = &self.services.push;
        if !push.is_supported() {
            log::info!("Push messaging unsupported, subscribing without a push handle");
            return None;
        }

        let attempt = async {
            push.register_worker().await?;
            let key = self.services.remote.vapid_public_key().await?;
            let key = decode_application_server_key(&key)?;
            push.subscribe(&key).await
        };

        match attempt.await {
            Ok(handle) => Some(handle),
            Err(error) => {
                log::warn!("Push registration failed, continuing without it: {error}");
                None
            }
        }
    }

    pub(crate) fn success_summary(&self) -> SuccessSummary {
        let state = self.state.borrow();
        let categories = state
            .categories
            .as_slice()
            .iter()
            .map(|key| self.category_name(key))
            .collect::<Vec<_>>()
            .join(", ");
        let locations = state.locations.as_slice().join(", ");

        SuccessSummary {
            categories: if categories.is_empty() {
                "All categories".to_string()
            } else {
                categories
            },
            locations: if locations.is_empty() {
                "All NC locations".to_string()
            } else {
                locations
            },
        }
    }

    pub(crate) async fn show_success_screen(&self) {
        let summary = self.success_summary();
        self.services.view.render_success(&summary);
        self.show_screen(Screen::Success.as_str()).await;
    }
}
