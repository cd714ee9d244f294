use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::vehicle::VehicleType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Processing,
    Processed,
    Shipping,
    Delivered,
    Completed,
    Cancelled,
    Returning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignment {
    pub assignment_id: i64,
    pub staff_id: i64,
    pub staff_name: String,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub vehicle_id: i64,
    pub name: String,
    pub license_plate: String,
    pub vehicle_type: VehicleType,
}

/// One line of an order's status timeline.
///
/// `pending` is never sent by the backend; the board sets it on entries it
/// synthesizes for immediate display until the next refetch replaces them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithDetails {
    pub order_id: i64,
    pub status: OrderStatus,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub is_preparation_staff_assigned: bool,
    #[serde(default)]
    pub is_shipping_staff_assigned: bool,
    #[serde(default)]
    pub preparation_assignments: Vec<StaffAssignment>,
    #[serde(default)]
    pub shipping_assignment: Option<StaffAssignment>,
    #[serde(default)]
    pub vehicle_info: Option<VehicleInfo>,
    #[serde(default)]
    pub delivery_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status_history: Vec<StatusHistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDeliveryRequest {
    pub delivery_time: DateTime<Utc>,
}
