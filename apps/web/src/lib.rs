//! Browser side of the DMV appointment notifier.
//!
//! One wasm module serves both execution contexts: loaded by the page it
//! binds the DOM and starts polling, loaded by the background worker it
//! prepares the state behind the exported event handlers that `sw.js`
//! forwards to.

mod dom;
mod http;
mod js;
mod logging;
mod notify;
mod page;
mod poller;
mod storage;
mod worker;

use dmv_notify_core::AppConfig;
use wasm_bindgen::prelude::*;
use web_sys::ServiceWorkerGlobalScope;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let config = AppConfig::from_build_env();
    logging::init(config.debug);

    let global = js_sys::global();
    if let Some(scope) = global.dyn_ref::<ServiceWorkerGlobalScope>() {
        worker::init(scope.clone(), &config);
        return Ok(());
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window or worker scope"))?;
    page::boot(window, config)
}
