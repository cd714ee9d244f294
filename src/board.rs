use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex as AsyncMutex, RwLock};
use tracing::{info, warn};

use crate::allocation::dialog::OrderMutations;
use crate::api::client::OrderApi;
use crate::error::ConsoleError;
use crate::models::allocation::AllocationRequest;
use crate::models::order::{
    OrderStatus, OrderWithDetails, ScheduleDeliveryRequest, StatusHistoryEntry,
    UpdateOrderStatusRequest,
};
use crate::models::paging::PageRequest;
use crate::models::staff::StaffMember;
use crate::notify::{Notification, Notifier, Severity};
use crate::observability::metrics::Metrics;

/// Author recorded on history entries synthesized before the server echoes them.
pub const LOCAL_ACTOR: &str = "Manager";

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    pub orders: Vec<OrderWithDetails>,
    pub staff: Vec<StaffMember>,
    pub statuses: Vec<OrderStatus>,
    pub selected_order: Option<OrderWithDetails>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
    /// Bumped on every single-order replacement.
    #[serde(skip)]
    revision: u64,
    /// Revision at which each order was last replaced since the previous reload.
    #[serde(skip)]
    replaced: BTreeMap<i64, u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BoardEvent {
    Refreshed { orders: usize },
    OrderReplaced { order_id: i64 },
    Notification(Notification),
}

/// Owner of the page's order and staff lists.
///
/// Nothing else writes `BoardState`; dialogs request changes through the
/// mutation methods and read copies via [`snapshot`](Self::snapshot).
pub struct OrderBoard {
    api: Arc<dyn OrderApi>,
    state: RwLock<BoardState>,
    notifier: Arc<dyn Notifier>,
    events_tx: broadcast::Sender<BoardEvent>,
    metrics: Metrics,
    page_size: u32,
    refresh_gate: AsyncMutex<()>,
    writes_in_flight: Mutex<HashSet<i64>>,
}

/// Marks an order as having a write in flight until dropped.
struct WriteClaim<'a> {
    board: &'a OrderBoard,
    order_id: i64,
}

impl Drop for WriteClaim<'_> {
    fn drop(&mut self) {
        self.board
            .writes_in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.order_id);
    }
}

impl OrderBoard {
    pub fn new(
        api: Arc<dyn OrderApi>,
        notifier: Arc<dyn Notifier>,
        metrics: Metrics,
        page_size: u32,
        event_buffer_size: usize,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));
        Self {
            api,
            state: RwLock::new(BoardState::default()),
            notifier,
            events_tx,
            metrics,
            page_size,
            refresh_gate: AsyncMutex::new(()),
            writes_in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events_tx.subscribe()
    }

    pub async fn snapshot(&self) -> BoardState {
        self.state.read().await.clone()
    }

    pub async fn order(&self, order_id: i64) -> Option<OrderWithDetails> {
        self.state
            .read()
            .await
            .orders
            .iter()
            .find(|order| order.order_id == order_id)
            .cloned()
    }

    fn notify(&self, severity: Severity, message: impl Into<String>) {
        let notification = Notification::new(severity, message);
        self.notifier.notify(notification.clone());
        let _ = self.events_tx.send(BoardEvent::Notification(notification));
    }

    /// Reloads orders, statuses and staff together.
    ///
    /// Staff failures degrade to an empty roster. Order failures raise the
    /// page banner and keep whatever was loaded before. Reloads never overlap;
    /// a second caller waits for the first to finish. Orders replaced by a
    /// mutation while the lists were in flight keep their newer copy.
    pub async fn fetch_data(&self) -> bool {
        let _refresh = self.refresh_gate.lock().await;
        let started_at = {
            let mut state = self.state.write().await;
            state.loading = true;
            state.revision
        };

        let page = PageRequest::first(self.page_size);
        let (unallocated, pending, statuses, staff) = tokio::join!(
            self.api.unallocated_orders(page),
            self.api.pending_delivery_orders(),
            self.api.order_statuses(),
            self.api.staff_roster(),
        );

        let staff = staff.unwrap_or_else(|err| {
            warn!(error = %err, "staff roster unavailable; continuing without staff");
            Vec::new()
        });

        let orders = match (unallocated, pending) {
            (Ok(unallocated), Ok(pending)) => Ok(merge_orders(unallocated.items, pending)),
            (Err(err), _) | (_, Err(err)) => Err(err),
        };

        let mut state = self.state.write().await;
        state.loading = false;
        state.staff = staff;

        match statuses {
            Ok(statuses) => state.statuses = statuses,
            Err(err) => warn!(error = %err, "order statuses unavailable; keeping previous list"),
        }

        match orders {
            Ok(mut orders) => {
                let kept = keep_newer_replacements(&mut orders, &state, started_at);
                state.replaced.clear();
                if kept > 0 {
                    info!(kept, "kept orders replaced during the reload");
                }

                let count = orders.len();
                state.selected_order = state
                    .selected_order
                    .as_ref()
                    .and_then(|selected| {
                        orders
                            .iter()
                            .find(|order| order.order_id == selected.order_id)
                    })
                    .cloned();
                state.orders = orders;
                state.error = None;
                state.last_refreshed = Some(Utc::now());
                drop(state);

                self.metrics.orders_on_board.set(count as i64);
                self.metrics
                    .board_refresh_total
                    .with_label_values(&["success"])
                    .inc();
                info!(orders = count, "order board refreshed");
                let _ = self.events_tx.send(BoardEvent::Refreshed { orders: count });
                true
            }
            Err(err) => {
                let message = err.user_message("Failed to load orders");
                state.replaced.clear();
                state.error = Some(message.clone());
                drop(state);

                self.metrics
                    .board_refresh_total
                    .with_label_values(&["error"])
                    .inc();
                warn!(error = %err, "order board refresh failed");
                self.notify(Severity::Error, message);
                false
            }
        }
    }

    /// Replaces the order with `detail`, leaving exactly one entry for its id.
    async fn replace_order(&self, detail: OrderWithDetails) {
        let order_id = detail.order_id;
        let mut state = self.state.write().await;
        state.revision += 1;
        let revision = state.revision;
        state.replaced.insert(order_id, revision);

        match state
            .orders
            .iter()
            .position(|order| order.order_id == order_id)
        {
            Some(index) => {
                state.orders[index] = detail.clone();
                let mut seen = false;
                state.orders.retain(|order| {
                    if order.order_id != order_id {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => state.orders.push(detail.clone()),
        }

        if state
            .selected_order
            .as_ref()
            .is_some_and(|selected| selected.order_id == order_id)
        {
            state.selected_order = Some(detail);
        }
        let count = state.orders.len();
        drop(state);

        self.metrics.orders_on_board.set(count as i64);
        let _ = self.events_tx.send(BoardEvent::OrderReplaced { order_id });
    }

    pub async fn assign_staff(&self, request: AllocationRequest) -> bool {
        let order_id = request.order_id;
        let Some(_claim) = self.claim_write("assign_staff", order_id) else {
            self.metrics
                .allocations_total
                .with_label_values(&["busy"])
                .inc();
            return false;
        };
        let allocated = self
            .run_mutation(
                "assign_staff",
                order_id,
                "Failed to allocate staff",
                self.api.allocate_order(&request),
            )
            .await;

        let outcome = if allocated { "success" } else { "error" };
        self.metrics
            .allocations_total
            .with_label_values(&[outcome])
            .inc();
        if !allocated {
            return false;
        }

        info!(
            order_id,
            task_types = ?request.task_types,
            preparers = request.preparation_staff_ids.len(),
            shipper = ?request.shipping_staff_id,
            vehicle = ?request.vehicle_id,
            "staff allocated"
        );

        self.refetch_after(order_id, "assign_staff", |_| {}).await;
        self.notify(Severity::Success, "Staff allocated");
        true
    }

    pub async fn schedule_delivery(&self, order_id: i64, delivery_time: DateTime<Utc>) -> bool {
        let Some(_claim) = self.claim_write("schedule_delivery", order_id) else {
            return false;
        };
        let request = ScheduleDeliveryRequest { delivery_time };
        if !self
            .run_mutation(
                "schedule_delivery",
                order_id,
                "Failed to schedule delivery",
                self.api.schedule_delivery(order_id, &request),
            )
            .await
        {
            return false;
        }

        self.refetch_after(order_id, "schedule_delivery", |_| {}).await;
        self.notify(Severity::Success, "Delivery scheduled");
        true
    }

    /// Also appends a provisional history entry for immediate display; the
    /// next full reload replaces it with the server's timeline.
    pub async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        notes: Option<String>,
    ) -> bool {
        let Some(_claim) = self.claim_write("update_status", order_id) else {
            return false;
        };
        let request = UpdateOrderStatusRequest {
            status,
            notes: notes.clone(),
        };
        if !self
            .run_mutation(
                "update_status",
                order_id,
                "Failed to update order status",
                self.api.update_order_status(order_id, &request),
            )
            .await
        {
            return false;
        }

        self.refetch_after(order_id, "update_status", |detail| {
            detail.status_history.push(StatusHistoryEntry {
                status,
                updated_by: LOCAL_ACTOR.to_string(),
                updated_at: Utc::now(),
                notes,
                pending: true,
            });
        })
        .await;
        self.notify(Severity::Success, "Order status updated");
        true
    }

    /// One write per order at a time; a second one is refused, not queued.
    fn claim_write(&self, operation: &'static str, order_id: i64) -> Option<WriteClaim<'_>> {
        let claimed = self
            .writes_in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(order_id);
        if !claimed {
            warn!(operation, order_id, "write refused; another change to this order is in flight");
            self.notify(
                Severity::Warning,
                "Another change to this order is still being saved.",
            );
            return None;
        }
        Some(WriteClaim {
            board: self,
            order_id,
        })
    }

    async fn run_mutation<F>(
        &self,
        operation: &'static str,
        order_id: i64,
        fallback: &str,
        mutation: F,
    ) -> bool
    where
        F: std::future::Future<Output = Result<(), ConsoleError>>,
    {
        let started = Instant::now();
        let outcome = mutation.await;
        self.metrics
            .mutation_latency_seconds
            .with_label_values(&[operation])
            .observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok(()) => true,
            Err(err) => {
                warn!(operation, order_id, error = %err, "mutation failed");
                self.notify(Severity::Error, err.user_message(fallback));
                false
            }
        }
    }

    /// Sequenced strictly after a successful mutation.
    async fn refetch_after<F>(&self, order_id: i64, operation: &'static str, annotate: F)
    where
        F: FnOnce(&mut OrderWithDetails),
    {
        match self.api.order_detail(order_id).await {
            Ok(mut detail) => {
                annotate(&mut detail);
                self.replace_order(detail).await;
            }
            Err(err) => {
                warn!(operation, order_id, error = %err, "refetch after mutation failed");
                self.notify(
                    Severity::Warning,
                    "Saved, but the order could not be reloaded. Refresh to see the latest state.",
                );
            }
        }
    }

    pub async fn select_order(&self, order_id: i64) -> Option<OrderWithDetails> {
        let mut state = self.state.write().await;
        let selected = state
            .orders
            .iter()
            .find(|order| order.order_id == order_id)
            .cloned();
        state.selected_order = selected.clone();
        selected
    }

    pub async fn clear_selection(&self) {
        self.state.write().await.selected_order = None;
    }

    pub async fn dismiss_error(&self) {
        self.state.write().await.error = None;
    }
}

#[async_trait]
impl OrderMutations for OrderBoard {
    async fn assign_staff(&self, request: AllocationRequest) -> bool {
        OrderBoard::assign_staff(self, request).await
    }
}

/// Swaps in the board's copy of every order replaced after `since`, which is
/// newer than anything a list fetched from `since` can hold.
fn keep_newer_replacements(
    fetched: &mut Vec<OrderWithDetails>,
    state: &BoardState,
    since: u64,
) -> usize {
    let mut kept = 0;
    for (order_id, revision) in &state.replaced {
        if *revision <= since {
            continue;
        }
        let Some(current) = state.orders.iter().find(|order| order.order_id == *order_id) else {
            continue;
        };
        match fetched.iter_mut().find(|order| order.order_id == *order_id) {
            Some(stale) => *stale = current.clone(),
            None => fetched.push(current.clone()),
        }
        kept += 1;
    }
    kept
}

/// Unallocated orders first; an order listed twice keeps its first entry.
fn merge_orders(
    unallocated: Vec<OrderWithDetails>,
    pending: Vec<OrderWithDetails>,
) -> Vec<OrderWithDetails> {
    let mut merged: Vec<OrderWithDetails> = Vec::with_capacity(unallocated.len() + pending.len());
    for order in unallocated.into_iter().chain(pending) {
        if !merged
            .iter()
            .any(|existing| existing.order_id == order.order_id)
        {
            merged.push(order);
        }
    }
    merged
}
