use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::allocation::dialog::{AllocationDialog, AllocationDialogView, DialogState};
use crate::allocation::selection::VehicleSelectValue;
use crate::directory;
use crate::error::ConsoleError;
use crate::models::allocation::TaskType;
use crate::state::{AppState, SharedDialog};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dialogs", post(open_dialog))
        .route("/dialogs/:id", get(get_dialog).delete(close_dialog))
        .route("/dialogs/:id/task-types", post(toggle_task_type))
        .route("/dialogs/:id/preparation-staff", put(set_preparation_staff))
        .route("/dialogs/:id/shipping-staff", put(set_shipping_staff))
        .route("/dialogs/:id/vehicle", put(set_vehicle))
        .route("/dialogs/:id/allocate", post(allocate))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDialogRequest {
    pub order_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTypeRequest {
    pub task_type: TaskType,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparationStaffRequest {
    pub staff_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct ShippingStaffRequest {
    pub value: i64,
}

#[derive(Deserialize)]
pub struct VehicleRequest {
    pub value: VehicleSelectValue,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogResponse {
    pub dialog_id: Uuid,
    pub view: AllocationDialogView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateResponse {
    pub allocated: bool,
    pub view: AllocationDialogView,
}

fn find_dialog(state: &AppState, id: Uuid) -> Result<SharedDialog, ConsoleError> {
    state
        .touch_dialog(id)
        .ok_or_else(|| ConsoleError::NotFound(format!("dialog {id} not found")))
}

async fn open_dialog(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OpenDialogRequest>,
) -> Result<Json<DialogResponse>, ConsoleError> {
    let order = state
        .board
        .order(payload.order_id)
        .await
        .ok_or_else(|| ConsoleError::NotFound(format!("order {} not found", payload.order_id)))?;

    let dialog: SharedDialog = Arc::new(Mutex::new(AllocationDialog::new()));
    let ticket = dialog.lock().await.open(order);
    let dialog_id = state.insert_dialog(dialog.clone());
    info!(%dialog_id, order_id = payload.order_id, "dialog session started");

    let load = directory::load_candidates(state.directory.as_ref(), ticket.order_id()).await;

    let mut guard = dialog.lock().await;
    guard.apply_candidates(ticket, load);
    Ok(Json(DialogResponse {
        dialog_id,
        view: guard.view(),
    }))
}

async fn get_dialog(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AllocationDialogView>, ConsoleError> {
    let dialog = find_dialog(&state, id)?;
    let view = dialog.lock().await.view();
    Ok(Json(view))
}

async fn close_dialog(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ConsoleError> {
    let dialog = find_dialog(&state, id)?;
    dialog.lock().await.close();
    state.forget_dialog(id);
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_task_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskTypeRequest>,
) -> Result<Json<AllocationDialogView>, ConsoleError> {
    let dialog = find_dialog(&state, id)?;
    let ticket = {
        let mut guard = dialog.lock().await;
        guard.ensure_editable()?;
        guard.on_task_type_change(payload.task_type)
    };

    // the lock is not held while the estimate is in flight
    if let Some(ticket) = ticket {
        let estimate =
            directory::estimate_order_size(state.directory.as_ref(), ticket.order_id()).await;
        dialog.lock().await.apply_order_size(ticket, estimate);
    }

    let view = dialog.lock().await.view();
    Ok(Json(view))
}

async fn set_preparation_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PreparationStaffRequest>,
) -> Result<Json<AllocationDialogView>, ConsoleError> {
    let dialog = find_dialog(&state, id)?;
    let mut guard = dialog.lock().await;
    guard.ensure_editable()?;
    guard.on_prep_staff_change(payload.staff_ids);
    Ok(Json(guard.view()))
}

async fn set_shipping_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShippingStaffRequest>,
) -> Result<Json<AllocationDialogView>, ConsoleError> {
    let dialog = find_dialog(&state, id)?;
    let mut guard = dialog.lock().await;
    guard.ensure_editable()?;
    guard.on_shipping_staff_change(payload.value);
    Ok(Json(guard.view()))
}

async fn set_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VehicleRequest>,
) -> Result<Json<AllocationDialogView>, ConsoleError> {
    let dialog = find_dialog(&state, id)?;
    let mut guard = dialog.lock().await;
    guard.ensure_editable()?;
    guard.on_vehicle_change(payload.value);
    Ok(Json(guard.view()))
}

async fn allocate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AllocateResponse>, ConsoleError> {
    let dialog = find_dialog(&state, id)?;
    let (ticket, request) = dialog.lock().await.begin_allocation()?;

    let allocated = state.board.assign_staff(request).await;

    let mut guard = dialog.lock().await;
    guard.finish_allocation(ticket, allocated);
    let view = guard.view();
    let closed = guard.state() == DialogState::Closed;
    drop(guard);

    if closed {
        state.forget_dialog(id);
    }

    Ok(Json(AllocateResponse { allocated, view }))
}
