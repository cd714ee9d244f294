use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskType {
    Preparation,
    Shipping,
    Pickup,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskType::Preparation => "Preparation",
            TaskType::Shipping => "Shipping",
            TaskType::Pickup => "Pickup",
        };
        f.write_str(label)
    }
}

/// Body of the order allocation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub order_id: i64,
    pub task_types: Vec<TaskType>,
    #[serde(default)]
    pub preparation_staff_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_staff_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
}
