//! Small helpers for crossing the `JsValue` boundary.

use dmv_notify_core::AppError;
use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// Awaits a promise-returning web API call, folding the synchronous and the
/// asynchronous failure into one error.
pub async fn resolve(promise: Result<Promise, JsValue>) -> Result<JsValue, JsValue> {
    JsFuture::from(promise?).await
}

/// Best readable form of a thrown value.
pub fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{value:?}")
}

pub fn network(context: &str, value: &JsValue) -> AppError {
    AppError::Network(format!("{context}: {}", describe(value)))
}

pub fn unsupported(context: &str, value: &JsValue) -> AppError {
    AppError::Unsupported(format!("{context}: {}", describe(value)))
}

/// Plain object literal, for dictionaries whose generated setters vary
/// between `web-sys` releases.
pub fn object(fields: &[(&str, JsValue)]) -> Result<Object, JsValue> {
    let object = Object::new();
    for (key, value) in fields {
        Reflect::set(&object, &JsValue::from_str(key), value)?;
    }
    Ok(object)
}

/// `key in target`, false when the lookup itself throws.
pub fn has(target: &JsValue, key: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(key)).unwrap_or(false)
}
