use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedPickup {
    pub rent_order_detail_id: i64,
    pub order_id: i64,
    pub customer_name: String,
    pub address: String,
    #[serde(default)]
    pub expected_return_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatePickupRequest {
    pub staff_id: i64,
    pub rent_order_detail_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementRequestDetail {
    pub replacement_request_id: i64,
    pub order_id: i64,
    pub equipment_name: String,
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub assigned_staff_id: Option<i64>,
    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignmentHistory {
    pub assignment_id: i64,
    pub staff_id: i64,
    pub staff_name: String,
    pub order_id: i64,
    pub task_type: String,
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentHistoryFilter {
    pub staff_id: Option<i64>,
    pub task_types: Vec<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page_number: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAssignment {
    pub staff_id: i64,
    pub staff_name: String,
    pub order_id: i64,
    pub task_type: String,
}
