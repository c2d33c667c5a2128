use std::rc::Rc;
use std::time::Duration;

use dmv_notify_core::App;
use gloo_timers::callback::Interval;
use wasm_bindgen_futures::spawn_local;

/// Fires one poll right away, then one per `period`. Dropping the returned
/// handle stops the timer.
pub fn start(app: &Rc<App>, period: Duration) -> Interval {
    tick(Rc::clone(app));

    let app = Rc::clone(app);
    let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
    log::info!("Polling availability every {millis}ms");
    Interval::new(millis, move || tick(Rc::clone(&app)))
}

// Ticks are not serialized; the board drops responses that arrive late.
fn tick(app: Rc<App>) {
    spawn_local(async move { app.poll_availability().await });
}
