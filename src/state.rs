use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::allocation::dialog::AllocationDialog;
use crate::api::client::{DirectoryApi, OrderApi};
use crate::board::OrderBoard;
use crate::notify::RecordingNotifier;
use crate::observability::metrics::Metrics;

const RECENT_NOTIFICATIONS: usize = 50;

pub type SharedDialog = Arc<Mutex<AllocationDialog>>;

pub struct DialogSession {
    pub dialog: SharedDialog,
    pub last_seen: Instant,
}

pub struct AppState {
    pub board: Arc<OrderBoard>,
    pub directory: Arc<dyn DirectoryApi>,
    pub dialogs: DashMap<Uuid, DialogSession>,
    pub notifications: Arc<RecordingNotifier>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        orders: Arc<dyn OrderApi>,
        directory: Arc<dyn DirectoryApi>,
        page_size: u32,
        event_buffer_size: usize,
    ) -> Self {
        let metrics = Metrics::new();
        let notifications = Arc::new(RecordingNotifier::new(RECENT_NOTIFICATIONS));
        let board = OrderBoard::new(
            orders,
            notifications.clone(),
            metrics.clone(),
            page_size,
            event_buffer_size,
        );

        Self {
            board: Arc::new(board),
            directory,
            dialogs: DashMap::new(),
            notifications,
            metrics,
        }
    }

    pub fn insert_dialog(&self, dialog: SharedDialog) -> Uuid {
        let dialog_id = Uuid::new_v4();
        self.dialogs.insert(
            dialog_id,
            DialogSession {
                dialog,
                last_seen: Instant::now(),
            },
        );
        self.metrics.open_dialogs.inc();
        dialog_id
    }

    /// Looks a session up and marks it as used.
    pub fn touch_dialog(&self, dialog_id: Uuid) -> Option<SharedDialog> {
        let mut session = self.dialogs.get_mut(&dialog_id)?;
        session.last_seen = Instant::now();
        Some(session.dialog.clone())
    }

    pub fn forget_dialog(&self, dialog_id: Uuid) -> bool {
        let removed = self.dialogs.remove(&dialog_id).is_some();
        if removed {
            self.metrics.open_dialogs.dec();
        }
        removed
    }

    /// Drops sessions nobody touched for `ttl`; returns how many went.
    pub fn sweep_idle_dialogs(&self, ttl: Duration) -> usize {
        let before = self.dialogs.len();
        self.dialogs
            .retain(|_, session| session.last_seen.elapsed() < ttl);
        let dropped = before.saturating_sub(self.dialogs.len());
        self.metrics.open_dialogs.set(self.dialogs.len() as i64);
        dropped
    }
}

/// Periodically drops dialog sessions whose page went away without closing them.
pub async fn run_dialog_sweeper(state: Arc<AppState>, ttl: Duration) {
    let period = ttl.min(Duration::from_secs(60)).max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);

    loop {
        ticker.tick().await;
        let dropped = state.sweep_idle_dialogs(ttl);
        if dropped > 0 {
            info!(dropped, remaining = state.dialogs.len(), "idle dialog sessions dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use tokio::sync::Mutex;

    use super::AppState;
    use crate::allocation::dialog::AllocationDialog;
    use crate::api::fake::FakeApi;

    fn app_state() -> AppState {
        let api = Arc::new(FakeApi::seeded());
        AppState::new(api.clone(), api, 50, 16)
    }

    #[test]
    fn idle_sessions_are_swept() {
        let state = app_state();
        let stale = state.insert_dialog(Arc::new(Mutex::new(AllocationDialog::new())));
        let fresh = state.insert_dialog(Arc::new(Mutex::new(AllocationDialog::new())));
        assert_eq!(state.metrics.open_dialogs.get(), 2);

        let long_ago = Instant::now()
            .checked_sub(Duration::from_secs(20))
            .unwrap();
        state.dialogs.get_mut(&stale).unwrap().last_seen = long_ago;

        assert_eq!(state.sweep_idle_dialogs(Duration::from_secs(10)), 1);
        assert!(state.touch_dialog(stale).is_none());
        assert!(state.touch_dialog(fresh).is_some());
        assert_eq!(state.metrics.open_dialogs.get(), 1);
    }

    #[test]
    fn touching_keeps_a_session_alive() {
        let state = app_state();
        let id = state.insert_dialog(Arc::new(Mutex::new(AllocationDialog::new())));
        let long_ago = Instant::now()
            .checked_sub(Duration::from_secs(20))
            .unwrap();
        state.dialogs.get_mut(&id).unwrap().last_seen = long_ago;

        assert!(state.touch_dialog(id).is_some());
        assert_eq!(state.sweep_idle_dialogs(Duration::from_secs(10)), 0);

        assert!(state.forget_dialog(id));
        assert!(!state.forget_dialog(id));
        assert_eq!(state.metrics.open_dialogs.get(), 0);
    }
}
