//! Page entry: wires the browser adapters into an [`App`], exposes the
//! handlers the markup calls, restores a saved subscription and starts the
//! availability poller.

use std::cell::RefCell;
use std::rc::Rc;

use dmv_notify_core::domain::Platform;
use dmv_notify_core::{App, AppConfig, Services};
use gloo_timers::callback::Interval;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::Window;

use crate::dom::DomView;
use crate::http::FetchRemote;
use crate::notify::{BrowserNotifications, BrowserPush};
use crate::storage::{BrowserClock, LocalStore};

struct Page {
    app: Rc<App>,
    view: Rc<DomView>,
}

thread_local! {
    // Keeps the poll timer alive for the lifetime of the page.
    static POLLER: RefCell<Option<Interval>> = const { RefCell::new(None) };
}

type Handler = fn(&Rc<Page>, Option<String>);

/// Global names the markup's inline handlers call.
const HANDLERS: &[(&str, Handler)] = &[
    ("showScreen", show_screen),
    ("selectPlatform", select_platform),
    ("subscribe", subscribe),
    ("unsubscribe", unsubscribe),
    ("testNotification", test_notification),
    ("filterLocations", filter_locations),
    ("skipLocations", skip_locations),
    ("openAvailabilityModal", open_availability),
    ("closeAvailabilityModal", close_availability),
    ("onAvailabilityCategoryChange", change_availability_category),
    ("closeDonatePopup", close_donate_popup),
    ("handleDonateClick", donate),
];

pub fn boot(window: Window, config: AppConfig) -> Result<(), JsValue> {
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("page has no document"))?;
    let config = config.with_origin(&window.location().origin()?);
    log::info!("Starting notifier against {}", config.api_base);

    let mut view = None;
    let app = Rc::new_cyclic(|app| {
        let dom = Rc::new(DomView::new(
            window.clone(),
            document,
            app.clone(),
            config.alert_duration,
        ));
        view = Some(Rc::clone(&dom));

        let services = Services {
            remote: Rc::new(FetchRemote::new(window.clone(), config.clone())),
            notifications: Rc::new(BrowserNotifications::new(window.clone())),
            push: Rc::new(BrowserPush::new(window.clone(), config.worker_script.clone())),
            store: Rc::new(LocalStore::new(&window)),
            clock: Rc::new(BrowserClock),
            view: dom,
        };
        App::new(config.clone(), services)
    });
    let view = view.ok_or_else(|| JsValue::from_str("view was not constructed"))?;
    let page = Rc::new(Page {
        app: Rc::clone(&app),
        view,
    });

    for (name, handler) in HANDLERS {
        expose(&window, name, &page, *handler)?;
    }

    {
        let app = Rc::clone(&app);
        spawn_local(async move {
            if app.restore().await {
                log::info!("Restored saved subscription");
            }
        });
    }

    let poller = crate::poller::start(&app, config.poll_interval);
    POLLER.with(|slot| *slot.borrow_mut() = Some(poller));
    Ok(())
}

fn expose(window: &Window, name: &str, page: &Rc<Page>, handler: Handler) -> Result<(), JsValue> {
    let page = Rc::clone(page);
    let callback = Closure::<dyn Fn(JsValue)>::new(move |argument: JsValue| {
        handler(&page, argument.as_string());
    })
    .into_js_value();
    js_sys::Reflect::set(window, &JsValue::from_str(name), &callback)?;
    Ok(())
}

fn show_screen(page: &Rc<Page>, name: Option<String>) {
    let app = Rc::clone(&page.app);
    let name = name.unwrap_or_default();
    spawn_local(async move { app.show_screen(&name).await });
}

fn select_platform(page: &Rc<Page>, name: Option<String>) {
    let Some(platform) = name.as_deref().and_then(Platform::parse) else {
        log::warn!("Unknown platform {name:?}");
        return;
    };
    let app = Rc::clone(&page.app);
    spawn_local(async move { app.select_platform(platform).await });
}

fn subscribe(page: &Rc<Page>, _: Option<String>) {
    let app = Rc::clone(&page.app);
    spawn_local(async move {
        let stage = app.subscribe().await;
        log::debug!("Subscribe finished in {stage}");
    });
}

fn unsubscribe(page: &Rc<Page>, _: Option<String>) {
    let app = Rc::clone(&page.app);
    spawn_local(async move {
        let outcome = app.unsubscribe().await;
        log::debug!("Unsubscribe finished: {outcome:?}");
    });
}

fn test_notification(page: &Rc<Page>, _: Option<String>) {
    let app = Rc::clone(&page.app);
    spawn_local(async move { app.send_test_notification().await });
}

fn filter_locations(page: &Rc<Page>, _: Option<String>) {
    page.app.filter_locations(&page.view.search_query());
}

fn skip_locations(page: &Rc<Page>, _: Option<String>) {
    page.app.toggle_all_locations();
}

fn open_availability(page: &Rc<Page>, _: Option<String>) {
    page.app.open_availability();
}

fn close_availability(page: &Rc<Page>, _: Option<String>) {
    page.app.close_availability();
}

fn change_availability_category(page: &Rc<Page>, _: Option<String>) {
    page.app
        .change_availability_category(&page.view.availability_choice());
}

fn close_donate_popup(page: &Rc<Page>, _: Option<String>) {
    page.app.close_donate_popup();
}

fn donate(page: &Rc<Page>, _: Option<String>) {
    page.app.donate();
}
