use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::app::selection::Selection;
use crate::availability::AvailabilityBoard;
use crate::config::AppConfig;
use crate::domain::{Category, Platform};
use crate::ports::{
    Clock, KeyValueStore, NotificationBridge, PushBridge, PushHandle, RemoteService, View,
};

/// Persisted id of the current subscriber.
pub const USER_ID_KEY: &str = "dmv_user_id";
/// Set to `"1"` once the donate popup has been dismissed on this device.
pub const DONATE_SHOWN_KEY: &str = "dmv_donate_popup_shown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Setup,
    Category,
    Locations,
    Success,
}

impl Screen {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Setup => "setup",
            Self::Category => "category",
            Self::Locations => "locations",
            Self::Success => "success",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "welcome" => Some(Self::Welcome),
            "setup" => Some(Self::Setup),
            "category" => Some(Self::Category),
            "locations" => Some(Self::Locations),
            "success" => Some(Self::Success),
            _ => None,
        }
    }

    /// Document id of the panel for a screen name.
    pub fn element_id(name: &str) -> String {
        format!("screen-{name}")
    }
}

/// Everything the user has chosen during this page session.
#[derive(Debug, Default)]
pub struct SelectionState {
    pub platform: Option<Platform>,
    pub categories: Selection,
    pub locations: Selection,
    pub user_id: Option<String>,
    pub subscription: Option<PushHandle>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Browser capabilities the app drives, injected by the host.
#[derive(Clone)]
pub struct Services {
    pub remote: Rc<dyn RemoteService>,
    pub notifications: Rc<dyn NotificationBridge>,
    pub push: Rc<dyn PushBridge>,
    pub store: Rc<dyn KeyValueStore>,
    pub clock: Rc<dyn Clock>,
    pub view: Rc<dyn View>,
}

/// The page controller. Owns the selection state and the availability board;
/// every user action and timer tick goes through one of its methods.
///
/// State lives in `RefCell`s and borrows never span an `.await`, so a poll
/// tick can interleave with a running subscribe flow without panicking.
pub struct App {
    pub config: AppConfig,
    pub(crate) services: Services,
    pub(crate) state: RefCell<SelectionState>,
    pub(crate) categories: RefCell<Vec<Category>>,
    pub(crate) board: RefCell<AvailabilityBoard>,
}

impl App {
    pub fn new(config: AppConfig, services: Services) -> Self {
        Self {
            config,
            services,
            state: RefCell::new(SelectionState::new()),
            categories: RefCell::new(Vec::new()),
            board: RefCell::new(AvailabilityBoard::new()),
        }
    }

    pub fn state(&self) -> Ref<'_, SelectionState> {
        self.state.borrow()
    }

    pub fn board(&self) -> Ref<'_, AvailabilityBoard> {
        self.board.borrow()
    }

    /// Id in memory, else the one persisted by an earlier session.
    pub fn effective_user_id(&self) -> Option<String> {
        let in_memory = self.state.borrow().user_id.clone();
        in_memory.or_else(|| self.services.store.get(USER_ID_KEY))
    }

    /// Display name for a category key, when the category list is loaded.
    pub(crate) fn category_name(&self, key: &str) -> String {
        self.categories
            .borrow()
            .iter()
            .find(|category| category.key == key)
            .map_or_else(|| key.to_string(), |category| category.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_names_round_trip_to_element_ids() {
        assert_eq!(Screen::parse("category"), Some(Screen::Category));
        assert_eq!(Screen::parse("nowhere"), None);
        assert_eq!(Screen::element_id(Screen::Success.as_str()), "screen-success");
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = SelectionState::new();
        state.platform = Some(Platform::Android);
        state.categories.toggle("road_test");
        state.locations.toggle("Cary");
        state.user_id = Some("abc".to_string());
        state.subscription = Some(PushHandle {
            endpoint: "https://push.example.test/1".to_string(),
            serialized: "{}".to_string(),
        });

        state.clear();
        assert!(state.platform.is_none());
        assert!(state.categories.is_empty());
        assert!(state.locations.is_empty());
        assert!(state.user_id.is_none());
        assert!(state.subscription.is_none());
    }
}
