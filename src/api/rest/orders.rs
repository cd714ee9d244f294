use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::BoardState;
use crate::error::ConsoleError;
use crate::models::order::{OrderStatus, OrderWithDetails};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/refresh", post(refresh_orders))
        .route("/banner/dismiss", post(dismiss_banner))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/select", post(select_order))
        .route("/orders/:id/status", post(update_status))
        .route("/orders/:id/delivery", post(schedule_delivery))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDeliveryRequest {
    pub delivery_time: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub order: Option<OrderWithDetails>,
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Json<BoardState> {
    Json(state.board.snapshot().await)
}

async fn refresh_orders(State(state): State<Arc<AppState>>) -> Json<BoardState> {
    state.board.fetch_data().await;
    Json(state.board.snapshot().await)
}

async fn dismiss_banner(State(state): State<Arc<AppState>>) -> Json<BoardState> {
    state.board.dismiss_error().await;
    Json(state.board.snapshot().await)
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderWithDetails>, ConsoleError> {
    state
        .board
        .order(id)
        .await
        .map(Json)
        .ok_or_else(|| ConsoleError::NotFound(format!("order {id} not found")))
}

async fn select_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderWithDetails>, ConsoleError> {
    state
        .board
        .select_order(id)
        .await
        .map(Json)
        .ok_or_else(|| ConsoleError::NotFound(format!("order {id} not found")))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Json<MutationResponse> {
    let success = state
        .board
        .update_status(id, payload.status, payload.notes)
        .await;
    Json(MutationResponse {
        success,
        order: state.board.order(id).await,
    })
}

async fn schedule_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<ScheduleDeliveryRequest>,
) -> Json<MutationResponse> {
    let success = state
        .board
        .schedule_delivery(id, payload.delivery_time)
        .await;
    Json(MutationResponse {
        success,
        order: state.board.order(id).await,
    })
}
