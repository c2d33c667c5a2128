//! Background worker handlers: asset cache, push display and click routing.
//!
//! `sw.js` attaches the browser listeners and forwards each event to the
//! matching export here.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dmv_notify_core::push::{should_navigate, NotificationContent};
use dmv_notify_core::worker::{
    fetch_source, route_click, CachePolicy, ClickAction, FetchSource, WorkerEvent, WorkerPhase,
};
use dmv_notify_core::AppConfig;
use js_sys::{Array, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    Cache, CacheStorage, Client, ExtendableEvent, FetchEvent, NotificationEvent, PushEvent,
    Response, ServiceWorkerGlobalScope, WindowClient,
};

use crate::js;
use crate::notify::notification_options;

#[derive(Clone)]
struct Worker {
    scope: ServiceWorkerGlobalScope,
    cache: Rc<CachePolicy>,
    phase: Rc<Cell<WorkerPhase>>,
}

thread_local! {
    static WORKER: RefCell<Option<Worker>> = const { RefCell::new(None) };
}

impl Worker {
    fn current() -> Result<Self, JsValue> {
        WORKER
            .with(|slot| slot.borrow().clone())
            .ok_or_else(|| JsValue::from_str("worker state is not initialised"))
    }

    fn advance(&self, event: WorkerEvent) {
        match self.phase.get().next(event) {
            Ok(next) => {
                log::info!("Worker {} -> {next}", self.phase.get());
                self.phase.set(next);
            }
            Err(error) => log::warn!("{error}"),
        }
    }

    fn caches(&self) -> Result<CacheStorage, JsValue> {
        self.scope.caches()
    }
}

/// Prepares the state the exported handlers share. The listeners themselves
/// are attached by the bootstrap script, which hands each event over here
/// once the module has been instantiated.
pub fn init(scope: ServiceWorkerGlobalScope, config: &AppConfig) {
    let worker = Worker {
        scope,
        cache: Rc::new(CachePolicy::from_config(config)),
        phase: Rc::new(Cell::new(WorkerPhase::Parsed)),
    };
    WORKER.with(|slot| *slot.borrow_mut() = Some(worker));
}

#[wasm_bindgen]
pub fn on_install(_event: ExtendableEvent) -> Result<Promise, JsValue> {
    let worker = Worker::current()?;
    worker.advance(WorkerEvent::Install);
    log::info!("Worker installing, precaching into {}", worker.cache.name);

    // Take over without waiting for old pages to close.
    let _ = worker.scope.skip_waiting()?;

    Ok(future_to_promise(async move {
        if let Err(error) = precache(&worker).await {
            log::error!("Failed to cache some resources: {}", js::describe(&error));
        }
        worker.advance(WorkerEvent::Precached);
        Ok(JsValue::UNDEFINED)
    }))
}

async fn precache(worker: &Worker) -> Result<(), JsValue> {
    let cache: Cache = JsFuture::from(worker.caches()?.open(&worker.cache.name))
        .await?
        .dyn_into()?;
    let assets: Array = worker
        .cache
        .assets
        .iter()
        .map(|asset| JsValue::from_str(asset))
        .collect();
    JsFuture::from(cache.add_all_with_str_sequence(&assets)).await?;
    Ok(())
}

#[wasm_bindgen]
pub fn on_activate(_event: ExtendableEvent) -> Result<Promise, JsValue> {
    let worker = Worker::current()?;
    worker.advance(WorkerEvent::Activate);

    Ok(future_to_promise(async move {
        if let Err(error) = evict_stale_caches(&worker).await {
            log::error!("Cache cleanup failed: {}", js::describe(&error));
        }
        JsFuture::from(worker.scope.clients().claim()).await?;
        worker.advance(WorkerEvent::Claimed);
        Ok(JsValue::UNDEFINED)
    }))
}

async fn evict_stale_caches(worker: &Worker) -> Result<(), JsValue> {
    let caches = worker.caches()?;
    let names: Vec<String> = JsFuture::from(caches.keys())
        .await?
        .dyn_into::<Array>()?
        .iter()
        .filter_map(|name| name.as_string())
        .collect();

    for stale in worker.cache.stale_caches(&names) {
        log::info!("Deleting old cache: {stale}");
        JsFuture::from(caches.delete(stale)).await?;
    }
    Ok(())
}

/// Cache-first lookup; resolves to the response handed to `respondWith`.
#[wasm_bindgen]
pub fn on_fetch(event: FetchEvent) -> Result<Promise, JsValue> {
    let worker = Worker::current()?;
    let request = event.request();
    Ok(future_to_promise(async move {
        let cached = JsFuture::from(worker.caches()?.match_with_request(&request)).await?;
        match fetch_source(cached.is_instance_of::<Response>()) {
            FetchSource::Cache => Ok(cached),
            FetchSource::Network => JsFuture::from(worker.scope.fetch_with_request(&request)).await,
        }
    }))
}

#[wasm_bindgen]
pub fn on_push(event: PushEvent) -> Result<Promise, JsValue> {
    let worker = Worker::current()?;
    let payload = event.data().map(|data| data.text());
    let content = NotificationContent::from_push(payload.as_deref());
    log::info!("Push received, showing {:?}", content.title);

    let options = notification_options(&content).map_err(|error| JsValue::from_str(&error.to_string()))?;
    let shown = worker
        .scope
        .registration()
        .show_notification_with_options(&content.title, &options)?;

    Ok(future_to_promise(async move {
        match JsFuture::from(shown).await {
            Ok(_) => log::info!("Notification shown"),
            Err(error) => log::error!("Error showing notification: {}", js::describe(&error)),
        }
        Ok(JsValue::UNDEFINED)
    }))
}

#[wasm_bindgen]
pub fn on_notification_click(event: NotificationEvent) -> Result<Promise, JsValue> {
    let worker = Worker::current()?;
    let notification = event.notification();
    notification.close();

    let action = js_sys::Reflect::get(&event, &JsValue::from_str("action"))
        .ok()
        .and_then(|action| action.as_string())
        .unwrap_or_default();
    if !should_navigate(&action) {
        log::debug!("Notification action {action:?} does not navigate");
        return Ok(Promise::resolve(&JsValue::UNDEFINED));
    }

    let target = js_sys::Reflect::get(&notification.data(), &JsValue::from_str("url"))
        .ok()
        .and_then(|url| url.as_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| "/".to_string());

    let clients = worker.scope.clients();
    let query = js::object(&[
        ("type", JsValue::from_str("window")),
        ("includeUncontrolled", JsValue::TRUE),
    ])?;

    Ok(future_to_promise(async move {
        let open: Vec<Client> = JsFuture::from(clients.match_all_with_options(query.unchecked_ref()))
            .await?
            .dyn_into::<Array>()?
            .iter()
            .filter_map(|client| client.dyn_into::<Client>().ok())
            .collect();
        let urls: Vec<String> = open.iter().map(Client::url).collect();

        match route_click(&urls, &target) {
            ClickAction::Focus(index) => {
                let window = open[index].clone().dyn_into::<WindowClient>()?;
                JsFuture::from(window.focus()?).await
            }
            ClickAction::OpenWindow(url) => JsFuture::from(clients.open_window(&url)).await,
        }
    }))
}

#[cfg(test)]
mod tests {
    const BOOTSTRAP: &str = include_str!("../sw.js");

    #[test]
    fn bootstrap_attaches_every_handler_on_first_evaluation() {
        let handlers = [
            ("install", "on_install"),
            ("activate", "on_activate"),
            ("fetch", "on_fetch"),
            ("push", "on_push"),
            ("notificationclick", "on_notification_click"),
        ];
        for (event, export) in handlers {
            let listener = format!("self.addEventListener('{event}'");
            let start = BOOTSTRAP
                .find(&listener)
                .unwrap_or_else(|| panic!("no listener for {event}"));
            let body = &BOOTSTRAP[start..];
            let body = &body[..body.find("});").unwrap_or(body.len())];
            assert!(
                body.contains(&format!("ready.then(() => wasm_bindgen.{export}(event))")),
                "{event} is not handed to {export}"
            );
        }
    }

    #[test]
    fn fetch_is_answered_through_respond_with() {
        let start = BOOTSTRAP.find("addEventListener('fetch'").unwrap_or(0);
        let body = &BOOTSTRAP[start..];
        assert!(body.contains("event.respondWith(ready.then("));
        assert!(!body[..body.find("});").unwrap_or(body.len())].contains("waitUntil"));
    }

    #[test]
    fn listeners_are_not_deferred_behind_module_load() {
        // Every listener sits at the top level, never inside the ready chain.
        for line in BOOTSTRAP.lines().filter(|line| line.contains("addEventListener")) {
            assert!(line.starts_with("self.addEventListener("), "nested listener: {line}");
        }
    }
}
