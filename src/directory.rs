//! Read-only candidate lookups for the allocation dialog.
//!
//! Reads favor availability: every failure is logged and turned into an empty
//! result so the dialog can still render.

use tracing::warn;

use crate::api::client::DirectoryApi;
use crate::models::allocation::TaskType;
use crate::models::staff::{StaffAvailability, StaffAvailabilityDto};
use crate::models::vehicle::{OrderSizeDto, Vehicle, VehicleFilter, VehicleStatus, VehicleType};

const VEHICLE_PAGE_SIZE: u32 = 100;

/// Staff and vehicles offered by one dialog session.
#[derive(Debug, Clone, Default)]
pub struct CandidateLoad {
    pub staff: StaffAvailabilityDto,
    pub vehicles: Vec<Vehicle>,
}

pub async fn load_staff_availability(
    api: &dyn DirectoryApi,
    order_id: Option<i64>,
) -> StaffAvailabilityDto {
    match api.available_staff(order_id).await {
        Ok(dto) => dto,
        Err(err) => {
            warn!(?order_id, error = %err, "staff availability unavailable; showing none");
            StaffAvailabilityDto::default()
        }
    }
}

pub async fn load_available_vehicles(api: &dyn DirectoryApi, types: &[VehicleType]) -> Vec<Vehicle> {
    let filter = VehicleFilter {
        status: Some(VehicleStatus::Available),
        types: types.to_vec(),
        page_number: 1,
        page_size: VEHICLE_PAGE_SIZE,
    };

    match api.vehicles(&filter).await {
        Ok(page) => page
            .items
            .into_iter()
            .filter(|vehicle| vehicle.status == VehicleStatus::Available)
            .filter(|vehicle| types.is_empty() || types.contains(&vehicle.vehicle_type))
            .collect(),
        Err(err) => {
            warn!(error = %err, "vehicle list unavailable; showing none");
            Vec::new()
        }
    }
}

/// Staff and vehicle lookups race; neither result depends on the other.
pub async fn load_candidates(api: &dyn DirectoryApi, order_id: i64) -> CandidateLoad {
    let (staff, vehicles) = tokio::join!(
        load_staff_availability(api, Some(order_id)),
        load_available_vehicles(api, &[])
    );
    CandidateLoad { staff, vehicles }
}

/// `None` means "cannot estimate"; callers must not block on it.
pub async fn estimate_order_size(api: &dyn DirectoryApi, order_id: i64) -> Option<OrderSizeDto> {
    match api.order_size(order_id).await {
        Ok(dto) => Some(dto),
        Err(err) => {
            warn!(order_id, error = %err, "order size estimate failed");
            None
        }
    }
}

/// Available staff for `task_type`.
///
/// Shipping candidates who prepared this order come first, then the least
/// busy. Other lists keep the server order.
pub fn staff_for_task(dto: &StaffAvailabilityDto, task_type: TaskType) -> Vec<StaffAvailability> {
    match task_type {
        TaskType::Preparation => dto
            .preparation_staff
            .iter()
            .filter(|staff| staff.is_available)
            .cloned()
            .collect(),
        TaskType::Shipping | TaskType::Pickup => {
            let mut staff: Vec<StaffAvailability> = dto
                .shipping_staff
                .iter()
                .filter(|staff| staff.is_available)
                .cloned()
                .collect();
            staff.sort_by(|a, b| {
                b.prepared_this_order
                    .cmp(&a.prepared_this_order)
                    .then(a.assignment_count.cmp(&b.assignment_count))
            });
            staff
        }
    }
}
