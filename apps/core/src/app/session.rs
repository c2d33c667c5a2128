use crate::app::state::{App, USER_ID_KEY};
use crate::ports::{AlertKind, DeleteOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Cancelled,
    Completed,
    Failed,
}

impl App {
    /// Deletes the subscription remotely, drops the browser push handle and
    /// wipes local state, then reloads back to the entry screen.
    pub async fn unsubscribe(&self) -> UnsubscribeOutcome {
        let view = self.services.view.clone();
        if !view.confirm("Unsubscribe?") {
            return UnsubscribeOutcome::Cancelled;
        }

        match self.effective_user_id() {
            Some(user_id) => match self.services.remote.delete_subscription(&user_id).await {
                Ok(DeleteOutcome::Deleted) => log::info!("Deleted subscription {user_id}"),
                Ok(DeleteOutcome::AlreadyGone) => {
                    log::info!("Subscription {user_id} was already gone");
                }
                Err(error) => {
                    log::error!("Unsubscribe error: {error}");
                    view.show_alert("Failed to unsubscribe", AlertKind::Error);
                    return UnsubscribeOutcome::Failed;
                }
            },
            None => log::warn!("No user id to unsubscribe, clearing local state only"),
        }

        match self.services.push.unsubscribe_existing().await {
            Ok(true) => log::info!("Dropped browser push subscription"),
            Ok(false) => {}
            Err(error) => log::warn!("Could not drop browser push subscription: {error}"),
        }

        self.state.borrow_mut().clear();
        if let Err(error) = self.services.store.remove(USER_ID_KEY) {
            log::warn!("Could not clear persisted user id: {error}");
        }

        view.show_alert("Unsubscribed", AlertKind::Success);
        view.schedule_reload(self.config.reload_delay);
        UnsubscribeOutcome::Completed
    }

    /// Brings back a subscription saved by an earlier visit. Returns whether
    /// the success screen is now showing.
    pub async fn restore(&self) -> bool {
        let Some(saved) = self.services.store.get(USER_ID_KEY) else {
            return false;
        };

        let record = match self.services.remote.fetch_subscription(&saved).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                log::info!("Saved subscription {saved} no longer exists on the server");
                return false;
            }
            Err(error) => {
                log::error!("Restore error: {error}");
                return false;
            }
        };

        {
            let mut state = self.state.borrow_mut();
            state.user_id = Some(saved);
            state.categories.replace(record.categories);
            state.locations.replace(record.locations);
        }

        self.show_success_screen().await;
        self.services
            .view
            .show_alert("Notifications already active", AlertKind::Success);
        true
    }
}
