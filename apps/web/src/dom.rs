//! [`View`] over the static page markup.
//!
//! Every lookup tolerates a missing element: the page variants do not all
//! carry every panel, and a missing panel must not break the flow.

use std::cell::RefCell;
use std::rc::Weak;
use std::time::Duration;

use dmv_notify_core::availability::AvailabilityListing;
use dmv_notify_core::domain::Platform;
use dmv_notify_core::ports::{AlertKind, CategoryOption, ChoiceItem, SuccessSummary, View};
use dmv_notify_core::App;
use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlOptionElement,
    HtmlSelectElement, Window,
};

use crate::js;

const CATEGORY_LIST: &str = "categoryList";
const CATEGORY_NEXT: &str = "categoryNextBtn";
const LOCATION_GRID: &str = "locationGrid";
const LOCATION_SEARCH: &str = "locationSearch";
const SUBSCRIBE_BUTTON: &str = "subscribeBtn";
const SUBSCRIBE_ERROR: &str = "subscribeError";
const SUCCESS_CATEGORY: &str = "successCategory";
const SUCCESS_LOCATIONS: &str = "successLocations";
const ALERT: &str = "alert";
const DONATE_POPUP: &str = "donatePopup";
const AVAILABILITY_MODAL: &str = "availabilityModal";
const AVAILABILITY_LIST: &str = "availabilityList";
const AVAILABILITY_SELECT: &str = "availabilityCategorySelect";
const MODAL_OPEN_BODY_CLASS: &str = "availability-modal-open";

type DomResult = Result<(), JsValue>;

pub struct DomView {
    window: Window,
    document: Document,
    app: Weak<App>,
    alert_duration: Duration,
    alert_timer: RefCell<Option<Timeout>>,
}

impl DomView {
    pub fn new(window: Window, document: Document, app: Weak<App>, alert_duration: Duration) -> Self {
        Self {
            window,
            document,
            app,
            alert_duration,
            alert_timer: RefCell::new(None),
        }
    }

    /// Current text of the location search box.
    pub fn search_query(&self) -> String {
        self.typed::<HtmlInputElement>(LOCATION_SEARCH)
            .map(|input| input.value())
            .unwrap_or_default()
    }

    /// Category currently picked in the availability selector.
    pub fn availability_choice(&self) -> String {
        self.typed::<HtmlSelectElement>(AVAILABILITY_SELECT)
            .map(|select| select.value())
            .unwrap_or_default()
    }

    fn typed<T: JsCast>(&self, id: &str) -> Option<T> {
        self.document.get_element_by_id(id)?.dyn_into::<T>().ok()
    }

    fn html(&self, id: &str) -> Option<HtmlElement> {
        self.typed::<HtmlElement>(id)
    }

    fn report(what: &str, result: DomResult) {
        if let Err(error) = result {
            log::warn!("Could not update {what}: {}", js::describe(&error));
        }
    }

    fn each(&self, selector: &str, apply: impl Fn(&HtmlElement) -> DomResult) -> DomResult {
        let nodes = self.document.query_selector_all(selector)?;
        for index in 0..nodes.length() {
            if let Some(element) = nodes.item(index).and_then(|node| node.dyn_into::<HtmlElement>().ok()) {
                apply(&element)?;
            }
        }
        Ok(())
    }

    fn item(&self, container: &str, key: &str) -> Option<HtmlElement> {
        let nodes = self
            .document
            .get_element_by_id(container)?
            .query_selector_all("[data-key]")
            .ok()?;
        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
            .find(|element| element.get_attribute("data-key").as_deref() == Some(key))
    }

    fn element(&self, tag: &str, class: &str, text: Option<&str>) -> Result<HtmlElement, JsValue> {
        let element = self.document.create_element(tag)?.dyn_into::<HtmlElement>()?;
        element.set_class_name(class);
        element.set_text_content(text);
        Ok(element)
    }

    fn tile(&self, class: &str, item: &ChoiceItem, on_click: fn(&App, &str)) -> Result<HtmlElement, JsValue> {
        let tile = self.element("div", class, None)?;
        tile.set_attribute("data-key", &item.key)?;
        tile.class_list().toggle_with_force("selected", item.selected)?;

        let app = self.app.clone();
        let key = item.key.clone();
        let handler = Closure::<dyn Fn()>::new(move || {
            if let Some(app) = app.upgrade() {
                on_click(&app, &key);
            }
        })
        .into_js_value();
        tile.set_onclick(Some(handler.unchecked_ref()));
        Ok(tile)
    }

    fn fill_categories(&self, items: &[ChoiceItem]) -> DomResult {
        let Some(container) = self.document.get_element_by_id(CATEGORY_LIST) else {
            return Ok(());
        };
        container.set_inner_html("");

        for item in items {
            let tile = self.tile("category-item", item, App::toggle_category)?;
            tile.append_child(&self.element("h4", "", Some(&item.title))?.into())?;
            if let Some(detail) = &item.detail {
                tile.append_child(&self.element("p", "", Some(detail))?.into())?;
            }
            container.append_child(&tile)?;
        }
        Ok(())
    }

    fn fill_locations(&self, items: &[ChoiceItem]) -> DomResult {
        let Some(grid) = self.document.get_element_by_id(LOCATION_GRID) else {
            return Ok(());
        };
        grid.set_inner_html("");

        for item in items {
            let tile = self.tile("location-item", item, App::toggle_location)?;
            tile.set_text_content(Some(&item.title));
            grid.append_child(&tile)?;
        }
        Ok(())
    }

    fn fill_availability_categories(&self, options: &[CategoryOption], selected: Option<&str>) -> DomResult {
        let Some(select) = self.typed::<HtmlSelectElement>(AVAILABILITY_SELECT) else {
            return Ok(());
        };
        select.set_inner_html("");

        for option in options {
            let element = HtmlOptionElement::new_with_text_and_value(&option.label, &option.key)?;
            select.append_child(&element)?;
        }
        select.set_value(selected.unwrap_or_default());
        Ok(())
    }

    fn fill_availability(&self, listing: &AvailabilityListing) -> DomResult {
        let Some(list) = self.document.get_element_by_id(AVAILABILITY_LIST) else {
            return Ok(());
        };
        list.set_inner_html("");

        let AvailabilityListing::Rows(rows) = listing else {
            let message = listing.message().unwrap_or_default();
            list.append_child(&self.element("div", "availability-empty", Some(message))?.into())?;
            return Ok(());
        };

        for row in rows {
            let line = self.element("div", "availability-row", None)?;
            let main = self.element("div", "availability-main", None)?;
            main.append_child(&self.element("div", "availability-location", Some(&row.location))?.into())?;
            let checked = format!("Last checked: {}", row.last_checked);
            main.append_child(&self.element("div", "availability-meta", Some(&checked))?.into())?;
            line.append_child(&main)?;

            let slots_class = if row.has_slots {
                "availability-slots"
            } else {
                "availability-slots availability-slots-empty"
            };
            line.append_child(&self.element("div", slots_class, Some(&row.slots_label))?.into())?;
            list.append_child(&line)?;
        }
        Ok(())
    }

    fn set_class(element: &Element, class: &str, on: bool) -> DomResult {
        element.class_list().toggle_with_force(class, on).map(drop)
    }

    fn set_display(element: &HtmlElement, value: &str) -> DomResult {
        element.style().set_property("display", value)
    }

    fn set_button_enabled(&self, id: &str, enabled: bool) {
        if let Some(button) = self.typed::<HtmlButtonElement>(id) {
            button.set_disabled(!enabled);
        }
    }
}

impl View for DomView {
    fn activate_screen(&self, element_id: &str) {
        let result = self
            .each(".screen", |screen| screen.class_list().remove_1("active"))
            .and_then(|()| match self.document.get_element_by_id(element_id) {
                Some(screen) => screen.class_list().add_1("active"),
                None => Ok(()),
            });
        Self::report("screens", result);
    }

    fn scroll_to_top(&self) {
        self.window.scroll_to_with_x_and_y(0.0, 0.0);
    }

    fn show_setup_instructions(&self, platform: Platform) {
        let result = self
            .each(".setup-instructions", |block| Self::set_display(block, "none"))
            .and_then(|()| match self.html(&format!("setup-{}", platform.as_str())) {
                Some(block) => Self::set_display(&block, "block"),
                None => Ok(()),
            });
        Self::report("setup instructions", result);
    }

    fn render_categories(&self, items: &[ChoiceItem]) {
        Self::report("category list", self.fill_categories(items));
    }

    fn set_category_selected(&self, key: &str, selected: bool) {
        if let Some(tile) = self.item(CATEGORY_LIST, key) {
            Self::report("category tile", Self::set_class(&tile, "selected", selected));
        }
    }

    fn set_next_enabled(&self, enabled: bool) {
        self.set_button_enabled(CATEGORY_NEXT, enabled);
    }

    fn render_locations(&self, items: &[ChoiceItem]) {
        Self::report("location grid", self.fill_locations(items));
    }

    fn set_location_selected(&self, name: &str, selected: bool) {
        if let Some(tile) = self.item(LOCATION_GRID, name) {
            Self::report("location tile", Self::set_class(&tile, "selected", selected));
        }
    }

    fn set_location_visible(&self, name: &str, visible: bool) {
        if let Some(tile) = self.item(LOCATION_GRID, name) {
            let display = if visible { "" } else { "none" };
            Self::report("location tile", Self::set_display(&tile, display));
        }
    }

    fn subscribe_label(&self) -> String {
        self.html(SUBSCRIBE_BUTTON)
            .and_then(|button| button.text_content())
            .unwrap_or_default()
    }

    fn set_subscribe_label(&self, label: &str) {
        if let Some(button) = self.html(SUBSCRIBE_BUTTON) {
            button.set_text_content(Some(label));
        }
    }

    fn set_subscribe_enabled(&self, enabled: bool) {
        self.set_button_enabled(SUBSCRIBE_BUTTON, enabled);
    }

    fn show_inline_error(&self, message: &str) {
        if let Some(error) = self.html(SUBSCRIBE_ERROR) {
            error.set_text_content(Some(message));
            Self::report("inline error", Self::set_class(&error, "show", true));
        }
    }

    fn hide_inline_error(&self) {
        if let Some(error) = self.html(SUBSCRIBE_ERROR) {
            Self::report("inline error", Self::set_class(&error, "show", false));
        }
    }

    fn show_alert(&self, message: &str, kind: AlertKind) {
        let Some(alert) = self.html(ALERT) else {
            log::info!("Alert ({}): {message}", kind.as_str());
            return;
        };
        alert.set_text_content(Some(message));
        alert.set_class_name(&format!("alert {}", kind.as_str()));
        Self::report("alert", Self::set_display(&alert, "block"));

        let millis = u32::try_from(self.alert_duration.as_millis()).unwrap_or(u32::MAX);
        let hide = Timeout::new(millis, move || {
            Self::report("alert", Self::set_display(&alert, "none"));
        });
        // Replacing the handle cancels the previous banner's timer.
        *self.alert_timer.borrow_mut() = Some(hide);
    }

    fn render_success(&self, summary: &SuccessSummary) {
        if let Some(categories) = self.html(SUCCESS_CATEGORY) {
            categories.set_text_content(Some(&summary.categories));
        }
        if let Some(locations) = self.html(SUCCESS_LOCATIONS) {
            locations.set_text_content(Some(&summary.locations));
        }
    }

    fn set_donate_popup(&self, visible: bool) {
        if let Some(popup) = self.html(DONATE_POPUP) {
            Self::report("donate popup", Self::set_class(&popup, "show", visible));
        }
    }

    fn open_external(&self, url: &str) {
        if let Err(error) = self.window.open_with_url_and_target(url, "_blank") {
            log::warn!("Could not open {url}: {}", js::describe(&error));
        }
    }

    fn confirm(&self, message: &str) -> bool {
        self.window.confirm_with_message(message).unwrap_or(false)
    }

    fn schedule_reload(&self, delay: Duration) {
        let location = self.window.location();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, move || {
            if let Err(error) = location.reload() {
                log::error!("Reload failed: {}", js::describe(&error));
            }
        })
        .forget();
    }

    fn set_availability_open(&self, open: bool) {
        let Some(modal) = self.html(AVAILABILITY_MODAL) else {
            log::error!("Availability modal elements not found");
            return;
        };
        Self::report("availability modal", Self::set_class(&modal, "open", open));
        if let Some(body) = self.document.body() {
            Self::report("page body", Self::set_class(&body, MODAL_OPEN_BODY_CLASS, open));
        }
    }

    fn render_availability_categories(&self, options: &[CategoryOption], selected: Option<&str>) {
        Self::report(
            "availability categories",
            self.fill_availability_categories(options, selected),
        );
    }

    fn render_availability(&self, listing: &AvailabilityListing) {
        Self::report("availability list", self.fill_availability(listing));
    }
}
