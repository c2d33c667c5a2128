use crate::app::state::{App, Screen, DONATE_SHOWN_KEY};
use crate::availability::AvailabilityListing;
use crate::domain::{Platform, NC_LOCATIONS};
use crate::ports::{AlertKind, ChoiceItem, PermissionState};
use crate::push::NotificationContent;

/// Case-insensitive substring match used by the location search box.
pub fn location_matches(query: &str, name: &str) -> bool {
    name.to_lowercase().contains(&query.trim().to_lowercase())
}

impl App {
    /// Switches the visible panel. Entering the category or location screen
    /// (re)loads its list.
    pub async fn show_screen(&self, name: &str) {
        let view = &self.services.view;
        view.activate_screen(&Screen::element_id(name));
        view.scroll_to_top();

        match Screen::parse(name) {
            Some(Screen::Category) => self.load_categories().await,
            Some(Screen::Locations) => self.load_locations(),
            _ => {}
        }
    }

    pub async fn select_platform(&self, platform: Platform) {
        self.state.borrow_mut().platform = Some(platform);
        self.services.view.show_setup_instructions(platform);
        self.show_screen(Screen::Setup.as_str()).await;
    }

    pub async fn load_categories(&self) {
        let categories = match self.services.remote.categories().await {
            Ok(categories) => categories,
            Err(error) => {
                log::error!("Category load error: {error}");
                self.services
                    .view
                    .show_alert("Failed to load categories", AlertKind::Error);
                return;
            }
        };

        let items: Vec<ChoiceItem> = {
            let state = self.state.borrow();
            categories
                .iter()
                .map(|category| ChoiceItem {
                    key: category.key.clone(),
                    title: category.name.clone(),
                    detail: Some(category.description.clone()),
                    selected: state.categories.contains(&category.key),
                })
                .collect()
        };
        *self.categories.borrow_mut() = categories;

        let view = &self.services.view;
        view.render_categories(&items);
        view.set_next_enabled(!self.state.borrow().categories.is_empty());
    }

    pub fn toggle_category(&self, key: &str) {
        let (selected, any) = {
            let mut state = self.state.borrow_mut();
            let selected = state.categories.toggle(key);
            (selected, !state.categories.is_empty())
        };

        let view = &self.services.view;
        view.set_category_selected(key, selected);
        view.set_next_enabled(any);
    }

    pub fn load_locations(&self) {
        let (items, any) = {
            let state = self.state.borrow();
            let items: Vec<ChoiceItem> = NC_LOCATIONS
                .iter()
                .map(|name| ChoiceItem {
                    key: (*name).to_string(),
                    title: (*name).to_string(),
                    detail: None,
                    selected: state.locations.contains(name),
                })
                .collect();
            (items, !state.locations.is_empty())
        };

        let view = &self.services.view;
        view.render_locations(&items);
        view.set_subscribe_enabled(any);
    }

    pub fn toggle_location(&self, name: &str) {
        let (selected, any) = {
            let mut state = self.state.borrow_mut();
            let selected = state.locations.toggle(name);
            (selected, !state.locations.is_empty())
        };

        let view = &self.services.view;
        view.set_location_selected(name, selected);
        view.set_subscribe_enabled(any);
    }

    /// Selects every location, or clears them all when every one is
    /// already selected.
    pub fn toggle_all_locations(&self) {
        let all = self.state.borrow_mut().locations.toggle_all(NC_LOCATIONS);

        let view = &self.services.view;
        for name in NC_LOCATIONS {
            view.set_location_selected(name, all);
            if all {
                view.set_location_visible(name, true);
            }
        }
        view.set_subscribe_enabled(all);
    }

    pub fn filter_locations(&self, query: &str) {
        let view = &self.services.view;
        for name in NC_LOCATIONS {
            view.set_location_visible(name, location_matches(query, name));
        }
    }

    pub async fn send_test_notification(&self) {
        let view = &self.services.view;
        let notifications = &self.services.notifications;
        if notifications.permission() != PermissionState::Granted {
            view.show_alert("Enable notifications first", AlertKind::Error);
            return;
        }

        match notifications.show_local(&NotificationContent::test()).await {
            Ok(()) => view.show_alert("Test sent!", AlertKind::Success),
            Err(error) => {
                log::error!("Test notification error: {error}");
                view.show_alert(&format!("Error: {}", error.user_message()), AlertKind::Error);
            }
        }
    }

    pub fn show_donate_popup_once(&self) {
        if self.services.store.get(DONATE_SHOWN_KEY).as_deref() == Some("1") {
            return;
        }
        self.services.view.set_donate_popup(true);
    }

    pub fn close_donate_popup(&self) {
        self.services.view.set_donate_popup(false);
        if let Err(error) = self.services.store.set(DONATE_SHOWN_KEY, "1") {
            log::warn!("Could not remember donate popup dismissal: {error}");
        }
    }

    pub fn donate(&self) {
        self.close_donate_popup();
        self.services.view.open_external(&self.config.donate_url);
    }

    pub fn open_availability(&self) {
        self.board.borrow_mut().set_open(true);
        self.services.view.set_availability_open(true);

        if !self.board.borrow().is_loaded() {
            self.services
                .view
                .render_availability(&AvailabilityListing::Loading);
            return;
        }
        self.refresh_availability_view();
    }

    /// Hides the modal; polling keeps running.
    pub fn close_availability(&self) {
        self.board.borrow_mut().set_open(false);
        self.services.view.set_availability_open(false);
    }

    pub fn change_availability_category(&self, category: &str) {
        self.board.borrow_mut().select(category);
        let listing = self.board.borrow().listing();
        self.services.view.render_availability(&listing);
    }

    /// One poll tick: fetch the snapshot, replace the board, re-render if
    /// the modal is open. Late responses from older ticks are dropped.
    pub async fn poll_availability(&self) {
        let ticket = self.board.borrow_mut().issue_ticket();
        let cache_buster = self.services.clock.now_millis();

        let entries = match self.services.remote.fetch_snapshot(cache_buster).await {
            Ok(entries) => entries,
            Err(error) => {
                log::error!("Failed to update availability data: {error}");
                return;
            }
        };

        let applied = self.board.borrow_mut().apply(ticket, entries);
        if applied && self.board.borrow().is_open() {
            self.refresh_availability_view();
        }
    }

    fn refresh_availability_view(&self) {
        let (options, selected, listing) = {
            let mut board = self.board.borrow_mut();
            let selected = board.reconcile_selection().map(str::to_string);
            let listing = if selected.is_some() {
                board.listing()
            } else {
                AvailabilityListing::NoCategories
            };
            (board.category_options(), selected, listing)
        };

        let view = &self.services.view;
        view.render_availability_categories(&options, selected.as_deref());
        view.render_availability(&listing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::AvailabilityRow;
    use crate::domain::AvailabilityEntry;
    use crate::error::AppError;
    use crate::ports::CategoryOption;
    use crate::testing::{category, Fakes, MemoryStore, ViewEvent, NOW};

    fn entry(category: &str, location: &str, slots: u64) -> AvailabilityEntry {
        AvailabilityEntry {
            category: category.to_string(),
            location_name: location.to_string(),
            last_checked: None,
            slots_count: slots,
        }
    }

    #[tokio::test]
    async fn entering_category_screen_loads_categories() {
        let mut fakes = Fakes::default();
        fakes.remote.categories = vec![
            category("driver_license", "Driver License"),
            category("road_test", "Road Test"),
        ];
        let harness = fakes.build();
        harness.app.toggle_category("road_test");

        harness.app.show_screen("category").await;

        let events = harness.view.events();
        assert!(events.contains(&ViewEvent::Screen("screen-category".to_string())));
        let rendered = events.iter().find_map(|event| match event {
            ViewEvent::Categories(items) => Some(items.clone()),
            _ => None,
        });
        let rendered = rendered.unwrap_or_default();
        assert_eq!(rendered.len(), 2);
        assert!(!rendered[0].selected);
        assert!(rendered[1].selected);
        assert_eq!(events.last(), Some(&ViewEvent::NextEnabled(true)));
    }

    #[tokio::test]
    async fn category_load_failure_shows_alert() {
        let mut fakes = Fakes::default();
        fakes.remote.categories_error = Some(AppError::Network("offline".to_string()));
        let harness = fakes.build();

        harness.app.show_screen("category").await;
        assert!(harness.view.saw(&ViewEvent::Alert(
            "Failed to load categories".to_string(),
            AlertKind::Error
        )));
    }

    #[tokio::test]
    async fn unknown_screen_loads_nothing() {
        let harness = Fakes::default().build();
        harness.app.show_screen("nowhere").await;

        assert_eq!(
            harness.view.events(),
            vec![ViewEvent::Screen("screen-nowhere".to_string()), ViewEvent::ScrollTop]
        );
        assert!(harness.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn selecting_platform_shows_setup() {
        let harness = Fakes::default().build();
        harness.app.select_platform(Platform::Android).await;

        assert_eq!(harness.app.state().platform, Some(Platform::Android));
        assert_eq!(
            harness.view.events()[..2],
            [
                ViewEvent::Setup(Platform::Android),
                ViewEvent::Screen("screen-setup".to_string())
            ]
        );
    }

    #[test]
    fn toggling_category_tracks_next_button() {
        let harness = Fakes::default().build();
        harness.app.toggle_category("road_test");
        harness.app.toggle_category("road_test");

        assert_eq!(
            harness.view.events(),
            vec![
                ViewEvent::CategorySelected("road_test".to_string(), true),
                ViewEvent::NextEnabled(true),
                ViewEvent::CategorySelected("road_test".to_string(), false),
                ViewEvent::NextEnabled(false),
            ]
        );
    }

    #[test]
    fn locations_screen_marks_existing_selection() {
        let harness = Fakes::default().build();
        harness.app.toggle_location("Cary");
        harness.view.events.borrow_mut().clear();

        harness.app.load_locations();

        let events = harness.view.events();
        let ViewEvent::Locations(items) = &events[0] else {
            panic!("expected location list");
        };
        assert_eq!(items.len(), NC_LOCATIONS.len());
        assert_eq!(items.iter().filter(|item| item.selected).count(), 1);
        assert_eq!(events[1], ViewEvent::SubscribeEnabled(true));
    }

    #[test]
    fn select_all_then_clear_all() {
        let harness = Fakes::default().build();
        harness.app.toggle_location("Cary");

        harness.app.toggle_all_locations();
        assert!(harness.app.state().locations.same_members(NC_LOCATIONS));
        assert_eq!(harness.view.last_subscribe_enabled(), Some(true));
        assert!(harness
            .view
            .saw(&ViewEvent::LocationVisible("Boone".to_string(), true)));

        harness.app.toggle_all_locations();
        assert!(harness.app.state().locations.is_empty());
        assert_eq!(harness.view.last_subscribe_enabled(), Some(false));
    }

    #[test]
    fn location_filter_is_case_insensitive() {
        assert!(location_matches("raleigh", "Raleigh North"));
        assert!(location_matches(" NORTH ", "Charlotte North"));
        assert!(!location_matches("cary", "Boone"));
        assert!(location_matches("", "Boone"));

        let harness = Fakes::default().build();
        harness.app.filter_locations("wilm");
        assert!(harness
            .view
            .saw(&ViewEvent::LocationVisible("Wilmington North".to_string(), true)));
        assert!(harness
            .view
            .saw(&ViewEvent::LocationVisible("Cary".to_string(), false)));
    }

    #[tokio::test]
    async fn test_notification_requires_permission() {
        let fakes = Fakes::default();
        fakes.notifications.state.set(PermissionState::Default);
        let harness = fakes.build();

        harness.app.send_test_notification().await;
        assert!(harness.view.saw(&ViewEvent::Alert(
            "Enable notifications first".to_string(),
            AlertKind::Error
        )));
        assert!(harness.notifications.shown.borrow().is_empty());
        assert_eq!(harness.notifications.prompts.get(), 0);
    }

    #[tokio::test]
    async fn test_notification_reports_outcome() {
        let harness = Fakes::default().build();
        harness.app.send_test_notification().await;
        assert_eq!(harness.notifications.shown.borrow()[0].tag, "test-notification");
        assert!(harness
            .view
            .saw(&ViewEvent::Alert("Test sent!".to_string(), AlertKind::Success)));

        let mut fakes = Fakes::default();
        fakes.notifications.show_error = Some(AppError::Unsupported("no worker".to_string()));
        let harness = fakes.build();
        harness.app.send_test_notification().await;
        assert!(harness
            .view
            .saw(&ViewEvent::Alert("Error: no worker".to_string(), AlertKind::Error)));
    }

    #[test]
    fn donate_popup_is_remembered() {
        let harness = Fakes::default().build();
        harness.app.show_donate_popup_once();
        assert!(harness.view.saw(&ViewEvent::Donate(true)));

        harness.app.donate();
        assert!(harness.view.saw(&ViewEvent::Donate(false)));
        assert!(harness
            .view
            .saw(&ViewEvent::OpenExternal("https://ko-fi.com/gizred".to_string())));

        harness.view.events.borrow_mut().clear();
        harness.app.show_donate_popup_once();
        assert!(harness.view.events().is_empty());
    }

    #[test]
    fn donate_flag_from_earlier_visit_suppresses_popup() {
        let mut fakes = Fakes::default();
        fakes.store = MemoryStore::with(&[(DONATE_SHOWN_KEY, "1")]);
        let harness = fakes.build();

        harness.app.show_donate_popup_once();
        assert!(harness.view.events().is_empty());
    }

    #[test]
    fn availability_modal_shows_loading_before_first_snapshot() {
        let harness = Fakes::default().build();
        harness.app.open_availability();

        assert_eq!(
            harness.view.events(),
            vec![
                ViewEvent::AvailabilityOpen(true),
                ViewEvent::Availability(AvailabilityListing::Loading)
            ]
        );
    }

    #[tokio::test]
    async fn poll_tick_rerenders_open_modal_and_keeps_selection() {
        let harness = Fakes::default().build();
        harness.remote.snapshots.borrow_mut().extend([
            Ok(vec![entry("road_test", "Cary", 2), entry("permits", "Boone", 0)]),
            Ok(vec![entry("road_test", "Wilson", 1), entry("id_card", "Cary", 3)]),
        ]);

        harness.app.poll_availability().await;
        harness.app.open_availability();
        harness.app.change_availability_category("road_test");
        harness.view.events.borrow_mut().clear();

        harness.app.poll_availability().await;

        assert_eq!(
            harness.remote.calls().last().map(String::as_str),
            Some(format!("GET snapshot?t={NOW}").as_str())
        );
        assert_eq!(
            harness.view.events(),
            vec![
                ViewEvent::AvailabilityCategories(
                    vec![
                        CategoryOption {
                            key: "id_card".to_string(),
                            label: "Id Card".to_string()
                        },
                        CategoryOption {
                            key: "road_test".to_string(),
                            label: "Road Test".to_string()
                        },
                    ],
                    Some("road_test".to_string())
                ),
                ViewEvent::Availability(AvailabilityListing::Rows(vec![AvailabilityRow {
                    location: "Wilson".to_string(),
                    slots_label: "1 slots".to_string(),
                    has_slots: true,
                    last_checked: "Unknown".to_string(),
                }])),
            ]
        );
    }

    #[tokio::test]
    async fn poll_tick_falls_back_to_first_category() {
        let harness = Fakes::default().build();
        harness.remote.snapshots.borrow_mut().extend([
            Ok(vec![entry("road_test", "Cary", 2)]),
            Ok(vec![entry("permits", "Boone", 0), entry("id_card", "Cary", 3)]),
        ]);

        harness.app.poll_availability().await;
        harness.app.open_availability();
        assert_eq!(harness.app.board().selected(), Some("road_test"));

        harness.app.poll_availability().await;
        assert_eq!(harness.app.board().selected(), Some("id_card"));
    }

    #[tokio::test]
    async fn closed_modal_is_not_rendered_and_failures_are_quiet() {
        let harness = Fakes::default().build();
        harness
            .remote
            .snapshots
            .borrow_mut()
            .push_back(Ok(vec![entry("road_test", "Cary", 2)]));

        harness.app.poll_availability().await;
        harness.app.poll_availability().await;

        assert!(harness.view.events().is_empty());
        assert!(harness.app.board().is_loaded());
    }

    #[tokio::test]
    async fn empty_snapshot_reports_no_categories() {
        let harness = Fakes::default().build();
        harness.remote.snapshots.borrow_mut().push_back(Ok(Vec::new()));
        harness.app.poll_availability().await;
        harness.app.open_availability();

        assert!(harness
            .view
            .saw(&ViewEvent::Availability(AvailabilityListing::NoCategories)));
    }

    #[test]
    fn closing_availability_keeps_board() {
        let harness = Fakes::default().build();
        harness.app.open_availability();
        harness.app.close_availability();
        assert!(!harness.app.board().is_open());
        assert!(harness.view.saw(&ViewEvent::AvailabilityOpen(false)));
    }
}
