//! `fetch`-backed client for the subscription API and the availability
//! snapshot.

use async_trait::async_trait;
use dmv_notify_core::domain::{
    AvailabilityEntry, Category, SubscriptionRecord, SubscriptionRequest, VapidKeyResponse,
};
use dmv_notify_core::ports::{DeleteOutcome, RemoteService};
use dmv_notify_core::{AppConfig, AppError, Result};
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Request, RequestInit, RequestMode, Response, Window};

use crate::js;

pub struct FetchRemote {
    window: Window,
    config: AppConfig,
}

impl FetchRemote {
    pub const fn new(window: Window, config: AppConfig) -> Self {
        Self { window, config }
    }

    fn subscription_url(&self, user_id: &str) -> String {
        let encoded = String::from(js_sys::encode_uri_component(user_id));
        self.config.api_url(&format!("subscriptions/{encoded}"))
    }

    async fn send(&self, method: &str, url: &str, json_body: Option<&str>) -> Result<Response> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = json_body {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(url, &opts)
            .map_err(|error| js::network("building request", &error))?;
        if json_body.is_some() {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(|error| js::network("setting headers", &error))?;
        }

        log::debug!("{method} {url}");
        let value = wasm_bindgen_futures::JsFuture::from(self.window.fetch_with_request(&request))
            .await
            .map_err(|error| js::network(&format!("{method} {url}"), &error))?;

        value
            .dyn_into::<Response>()
            .map_err(|_| AppError::Network(format!("{method} {url}: not a response")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send("GET", url, None).await?;
        if !response.ok() {
            return Err(AppError::from_status(response.status()));
        }
        read_json(&response).await
    }
}

// Bodies are read as text and parsed with serde_json so integer fields keep
// their exact types.
async fn read_json<T: DeserializeOwned>(response: &Response) -> Result<T> {
    let text = js::resolve(response.text())
        .await
        .map_err(|error| js::network("reading body", &error))?;
    let text = text
        .as_string()
        .ok_or_else(|| AppError::Parse("response body is not text".to_string()))?;
    Ok(serde_json::from_str(&text)?)
}

/// Any 2xx counts as accepted.
pub fn accepted(status: u16) -> Result<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(AppError::from_status(status))
    }
}

/// Deleting something that is already gone is not a failure.
pub fn delete_outcome(status: u16) -> Result<DeleteOutcome> {
    if status == 404 {
        return Ok(DeleteOutcome::AlreadyGone);
    }
    accepted(status).map(|()| DeleteOutcome::Deleted)
}

#[async_trait(?Send)]
impl RemoteService for FetchRemote {
    async fn categories(&self) -> Result<Vec<Category>> {
        self.get_json(&self.config.api_url("categories")).await
    }

    async fn vapid_public_key(&self) -> Result<String> {
        let body: VapidKeyResponse = self.get_json(&self.config.api_url("vapid-public-key")).await?;
        Ok(body.public_key)
    }

    async fn create_subscription(&self, request: &SubscriptionRequest) -> Result<()> {
        let body = serde_json::to_string(request)?;
        let response = self
            .send("POST", &self.config.api_url("subscriptions"), Some(&body))
            .await?;
        accepted(response.status())
    }

    async fn fetch_subscription(&self, user_id: &str) -> Result<Option<SubscriptionRecord>> {
        match self.get_json(&self.subscription_url(user_id)).await {
            Ok(record) => Ok(Some(record)),
            Err(AppError::NotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn delete_subscription(&self, user_id: &str) -> Result<DeleteOutcome> {
        let response = self
            .send("DELETE", &self.subscription_url(user_id), None)
            .await?;
        delete_outcome(response.status())
    }

    async fn fetch_snapshot(&self, cache_buster: u64) -> Result<Vec<AvailabilityEntry>> {
        self.get_json(&self.config.snapshot_url(cache_buster)).await
    }
}
