use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::allocation::{AllocationRequest, TaskType};

/// Placeholder value of the shipping-staff select; never a real staff id.
pub const NO_STAFF: i64 = 0;

/// A vehicle pick as it arrives from the UI.
///
/// Quick-select buttons report the id as text, the dropdown reports a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VehicleSelectValue {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {
    Set(Option<i64>),
    Invalid,
}

impl VehicleSelectValue {
    pub fn normalize(&self) -> Normalized {
        match self {
            VehicleSelectValue::Number(id) if *id > 0 => Normalized::Set(Some(*id)),
            VehicleSelectValue::Number(_) => Normalized::Set(None),
            VehicleSelectValue::Text(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Normalized::Set(None);
                }
                match raw.parse::<i64>() {
                    Ok(id) if id > 0 => Normalized::Set(Some(id)),
                    Ok(_) => Normalized::Set(None),
                    Err(_) => Normalized::Invalid,
                }
            }
        }
    }
}

/// What is missing before an allocation can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionGap {
    NoTaskType,
    NoPreparationStaff,
    NoShippingStaff,
}

impl SelectionGap {
    pub fn message(&self) -> &'static str {
        match self {
            SelectionGap::NoTaskType => "select at least one task type",
            SelectionGap::NoPreparationStaff => "select at least one preparation staff member",
            SelectionGap::NoShippingStaff => "select a shipping staff member",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSelection {
    pub selected_task_types: BTreeSet<TaskType>,
    pub selected_prep_staff_ids: Vec<i64>,
    pub selected_shipping_staff_id: i64,
    pub selected_vehicle_id: Option<i64>,
}

impl AllocationSelection {
    /// Returns true when `task_type` is selected after the toggle.
    pub fn toggle_task_type(&mut self, task_type: TaskType) -> bool {
        if self.selected_task_types.remove(&task_type) {
            false
        } else {
            self.selected_task_types.insert(task_type);
            true
        }
    }

    pub fn has_task(&self, task_type: TaskType) -> bool {
        self.selected_task_types.contains(&task_type)
    }

    pub fn set_prep_staff(&mut self, staff_ids: Vec<i64>) {
        self.selected_prep_staff_ids = staff_ids;
    }

    pub fn set_shipping_staff(&mut self, staff_id: i64) {
        self.selected_shipping_staff_id = staff_id.max(NO_STAFF);
    }

    /// Single entry point for vehicle picks from either control.
    pub fn set_vehicle(&mut self, value: &VehicleSelectValue) -> bool {
        match value.normalize() {
            Normalized::Set(id) => {
                self.selected_vehicle_id = id;
                true
            }
            Normalized::Invalid => {
                warn!(?value, "ignoring unparseable vehicle id");
                false
            }
        }
    }

    pub fn gaps(&self) -> Vec<SelectionGap> {
        let mut gaps = Vec::new();
        if self.selected_task_types.is_empty() {
            gaps.push(SelectionGap::NoTaskType);
        }
        if self.has_task(TaskType::Preparation) && self.selected_prep_staff_ids.is_empty() {
            gaps.push(SelectionGap::NoPreparationStaff);
        }
        if self.has_task(TaskType::Shipping) && self.selected_shipping_staff_id == NO_STAFF {
            gaps.push(SelectionGap::NoShippingStaff);
        }
        gaps
    }

    pub fn is_submittable(&self) -> bool {
        self.gaps().is_empty()
    }

    /// Only the picks relevant to the selected task types are sent; picks for
    /// deselected tasks stay in the selection so re-enabling restores them.
    pub fn to_request(&self, order_id: i64) -> AllocationRequest {
        let preparation_staff_ids = if self.has_task(TaskType::Preparation) {
            self.selected_prep_staff_ids.clone()
        } else {
            Vec::new()
        };
        let shipping = self.has_task(TaskType::Shipping);

        AllocationRequest {
            order_id,
            task_types: self.selected_task_types.iter().copied().collect(),
            preparation_staff_ids,
            shipping_staff_id: shipping.then_some(self.selected_shipping_staff_id),
            vehicle_id: if shipping { self.selected_vehicle_id } else { None },
        }
    }
}
