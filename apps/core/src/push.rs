use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Length of an endpoint-derived user id.
const USER_ID_LEN: usize = 50;
const DEFAULT_ICON: &str = "/icon-192.png";

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Decodes a server-issued public key from URL-safe base64 (padded or not)
/// into the raw bytes the push manager expects. Keys in the standard
/// alphabet are still accepted.
pub fn decode_application_server_key(key: &str) -> Result<Vec<u8>> {
    let key = key.trim();
    Ok(URL_SAFE_LENIENT
        .decode(key)
        .or_else(|_| STANDARD_LENIENT.decode(key))?)
}

/// Stable identifier for a subscriber.
///
/// With a push endpoint it is the first 50 characters of the endpoint's
/// base64 form, so re-subscribing the same browser yields the same id.
/// Without one it falls back to `user_<millis>`.
pub fn derive_user_id(endpoint: Option<&str>, now_millis: u64) -> String {
    match endpoint {
        Some(endpoint) => STANDARD
            .encode(endpoint.as_bytes())
            .chars()
            .take(USER_ID_LEN)
            .collect(),
        None => format!("user_{now_millis}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for NotificationData {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

fn default_url() -> String {
    "/".to_string()
}

/// Everything needed to render one system notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    #[serde(default)]
    pub data: NotificationData,
}

impl Default for NotificationContent {
    fn default() -> Self {
        Self {
            title: "DMV Appointment Available!".to_string(),
            body: "New appointments have been found.".to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_ICON.to_string(),
            tag: "dmv-appointment".to_string(),
            require_interaction: true,
            data: NotificationData::default(),
        }
    }
}

impl NotificationContent {
    /// Builds the notification for an incoming push message.
    ///
    /// A JSON object payload is laid over the defaults key by key. Anything
    /// that is not JSON becomes the body. A payload that is JSON but cannot be
    /// shaped into a notification keeps the defaults; nothing is dropped.
    pub fn from_push(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(overlay)) => Self::merged(overlay),
            Ok(other) => {
                log::warn!("Push payload is not an object, using defaults: {other}");
                Self::default()
            }
            Err(error) => {
                log::warn!("Push payload is not JSON ({error}), showing it as text");
                Self {
                    body: raw.to_string(),
                    ..Self::default()
                }
            }
        }
    }

    fn merged(overlay: Map<String, Value>) -> Self {
        let defaults = Self::default();
        let Ok(Value::Object(mut base)) = serde_json::to_value(&defaults) else {
            return defaults;
        };

        for (key, value) in overlay {
            if !value.is_null() {
                base.insert(key, value);
            }
        }

        serde_json::from_value(Value::Object(base)).unwrap_or_else(|error| {
            log::warn!("Push payload has unexpected field types, using defaults: {error}");
            defaults
        })
    }

    /// Local notification used to check that the whole chain works.
    pub fn test() -> Self {
        Self {
            title: "🧪 Test notification".to_string(),
            body: "Notifications working!".to_string(),
            tag: "test-notification".to_string(),
            require_interaction: false,
            ..Self::default()
        }
    }
}

/// Only the default click and the explicit "view" action navigate.
pub fn should_navigate(action: &str) -> bool {
    action.is_empty() || action == "view"
}
