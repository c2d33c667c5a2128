//! Notification permission, local notifications and push subscription.

use async_trait::async_trait;
use dmv_notify_core::ports::{NotificationBridge, PermissionState, PushBridge, PushHandle};
use dmv_notify_core::push::NotificationContent;
use dmv_notify_core::{AppError, Result};
use js_sys::Uint8Array;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Notification, NotificationOptions, NotificationPermission, PushSubscription,
    ServiceWorkerContainer, ServiceWorkerRegistration, Window,
};

use crate::js;

/// Maps the string a permission prompt resolves to.
pub fn permission_from_str(value: &str) -> PermissionState {
    match value {
        "granted" => PermissionState::Granted,
        "denied" => PermissionState::Denied,
        _ => PermissionState::Default,
    }
}

/// Notification options as the browser expects them. The camelCase field
/// names of [`NotificationContent`] line up with the dictionary members.
pub fn notification_options(content: &NotificationContent) -> Result<NotificationOptions> {
    serde_wasm_bindgen::to_value(content)
        .map(JsCast::unchecked_into)
        .map_err(|error| AppError::Parse(error.to_string()))
}

fn service_worker(window: &Window) -> Option<ServiceWorkerContainer> {
    let navigator = window.navigator();
    js::has(&navigator, "serviceWorker").then(|| navigator.service_worker())
}

async fn ready_registration(container: &ServiceWorkerContainer) -> Result<ServiceWorkerRegistration> {
    js::resolve(container.ready())
        .await
        .map_err(|error| js::unsupported("waiting for worker", &error))?
        .dyn_into::<ServiceWorkerRegistration>()
        .map_err(|_| AppError::Unsupported("worker registration missing".to_string()))
}

pub struct BrowserNotifications {
    window: Window,
}

impl BrowserNotifications {
    pub const fn new(window: Window) -> Self {
        Self { window }
    }
}

#[async_trait(?Send)]
impl NotificationBridge for BrowserNotifications {
    fn permission(&self) -> PermissionState {
        if !js::has(&self.window, "Notification") {
            return PermissionState::Unsupported;
        }
        match Notification::permission() {
            NotificationPermission::Granted => PermissionState::Granted,
            NotificationPermission::Denied => PermissionState::Denied,
            _ => PermissionState::Default,
        }
    }

    async fn request_permission(&self) -> Result<PermissionState> {
        let answer = js::resolve(Notification::request_permission())
            .await
            .map_err(|error| AppError::PermissionDenied(js::describe(&error)))?;
        let state = permission_from_str(&answer.as_string().unwrap_or_default());
        log::info!("Notification permission answered: {state:?}");
        Ok(state)
    }

    async fn show_local(&self, content: &NotificationContent) -> Result<()> {
        let options = notification_options(content)?;

        if let Some(container) = service_worker(&self.window) {
            let registration = ready_registration(&container).await?;
            js::resolve(registration.show_notification_with_options(&content.title, &options))
                .await
                .map_err(|error| AppError::Unsupported(js::describe(&error)))?;
            return Ok(());
        }

        Notification::new_with_options(&content.title, &options)
            .map(drop)
            .map_err(|error| AppError::Unsupported(js::describe(&error)))
    }
}

pub struct BrowserPush {
    window: Window,
    worker_script: String,
}

impl BrowserPush {
    pub const fn new(window: Window, worker_script: String) -> Self {
        Self {
            window,
            worker_script,
        }
    }

    fn container(&self) -> Result<ServiceWorkerContainer> {
        service_worker(&self.window)
            .ok_or_else(|| AppError::Unsupported("service workers unavailable".to_string()))
    }
}

#[async_trait(?Send)]
impl PushBridge for BrowserPush {
    fn is_supported(&self) -> bool {
        service_worker(&self.window).is_some() && js::has(&self.window, "PushManager")
    }

    async fn register_worker(&self) -> Result<()> {
        let container = self.container()?;
        wasm_bindgen_futures::JsFuture::from(container.register(&self.worker_script))
            .await
            .map_err(|error| js::unsupported("registering worker", &error))?;
        ready_registration(&container).await?;
        log::info!("Worker {} ready", self.worker_script);
        Ok(())
    }

    async fn subscribe(&self, application_server_key: &[u8]) -> Result<PushHandle> {
        let registration = ready_registration(&self.container()?).await?;
        let manager = registration
            .push_manager()
            .map_err(|error| js::unsupported("push manager", &error))?;

        let key = Uint8Array::from(application_server_key);
        let options = js::object(&[
            ("userVisibleOnly", JsValue::TRUE),
            ("applicationServerKey", key.into()),
        ])
        .map_err(|error| js::unsupported("push options", &error))?;

        let subscription = js::resolve(manager.subscribe_with_options(options.unchecked_ref()))
            .await
            .map_err(|error| js::network("push subscribe", &error))?
            .dyn_into::<PushSubscription>()
            .map_err(|_| AppError::Unsupported("push subscription missing".to_string()))?;

        let serialized = js_sys::JSON::stringify(&subscription)
            .map(String::from)
            .map_err(|error| AppError::Parse(js::describe(&error)))?;

        Ok(PushHandle {
            endpoint: subscription.endpoint(),
            serialized,
        })
    }

    async fn unsubscribe_existing(&self) -> Result<bool> {
        let Some(container) = service_worker(&self.window) else {
            return Ok(false);
        };

        let registration = wasm_bindgen_futures::JsFuture::from(container.get_registration())
            .await
            .map_err(|error| js::network("looking up registration", &error))?;
        let Ok(registration) = registration.dyn_into::<ServiceWorkerRegistration>() else {
            return Ok(false);
        };

        let manager = registration
            .push_manager()
            .map_err(|error| js::unsupported("push manager", &error))?;
        let subscription = js::resolve(manager.get_subscription())
            .await
            .map_err(|error| js::network("looking up push subscription", &error))?;
        let Ok(subscription) = subscription.dyn_into::<PushSubscription>() else {
            return Ok(false);
        };

        let dropped = js::resolve(subscription.unsubscribe())
            .await
            .map_err(|error| js::network("push unsubscribe", &error))?;
        Ok(dropped.as_bool().unwrap_or(false))
    }
}
