// App module for dmv_notify
// Holds the page controller: selection state, the subscribe flow and session handling

pub mod actions;
pub mod flow;
pub mod selection;
pub mod session;
pub mod state;

pub use actions::location_matches;
pub use flow::{
    PermissionOutcome, StateTransitionError, SubscribeEvent, SubscribeMachine, SubscribeStage,
};
pub use selection::Selection;
pub use session::UnsubscribeOutcome;
pub use state::{App, Screen, SelectionState, Services, DONATE_SHOWN_KEY, USER_ID_KEY};
