use reqwest::Method;

use crate::api::envelope::Envelope;

/// Backend routes the console talks to.
///
/// Each route also fixes its response envelope; see [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    UnallocatedOrders,
    PendingDeliveryOrders,
    OrderStatuses,
    OrderDetail(i64),
    AllocateOrder,
    ScheduleDelivery(i64),
    UpdateOrderStatus(i64),
    OrderSize(i64),
    StaffRoster,
    AvailableStaff,
    Vehicles,
    CreateVehicle,
    UnassignedPickups,
    AllocatePickup,
    ReplacementById(i64),
    StaffAssignmentHistory,
    CurrentAssignments,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Self::UnallocatedOrders => "/manager/orders/unallocated".to_string(),
            Self::PendingDeliveryOrders => "/manager/orders/pending-delivery".to_string(),
            Self::OrderStatuses => "/manager/orders/statuses".to_string(),
            Self::OrderDetail(id) => format!("/manager/orders/{id}"),
            Self::AllocateOrder => "/manager/orders/allocate".to_string(),
            Self::ScheduleDelivery(id) => format!("/manager/orders/{id}/delivery-schedule"),
            Self::UpdateOrderStatus(id) => format!("/manager/orders/{id}/status"),
            Self::OrderSize(id) => format!("/manager/orders/{id}/size"),
            Self::StaffRoster => "/manager/staff".to_string(),
            Self::AvailableStaff => "/staff/available".to_string(),
            Self::Vehicles | Self::CreateVehicle => "/manager/vehicles".to_string(),
            Self::UnassignedPickups => "/manager/rentals/unassigned-pickups".to_string(),
            Self::AllocatePickup => "/manager/rentals/allocate-pickup".to_string(),
            Self::ReplacementById(id) => format!("/manager/replacement/id/{id}"),
            Self::StaffAssignmentHistory => "/manager/staff-assignment-history".to_string(),
            Self::CurrentAssignments => "/manager/staff/current-assignments".to_string(),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::AllocateOrder
            | Self::ScheduleDelivery(_)
            | Self::CreateVehicle
            | Self::AllocatePickup => Method::POST,
            Self::UpdateOrderStatus(_) => Method::PUT,
            _ => Method::GET,
        }
    }

    pub fn envelope(&self) -> Envelope {
        match self {
            Self::AvailableStaff | Self::ReplacementById(_) => Envelope::DataOnly,
            Self::Vehicles | Self::CreateVehicle | Self::StaffAssignmentHistory => Envelope::Bare,
            _ => Envelope::Standard,
        }
    }

    /// Short label used for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UnallocatedOrders => "unallocated_orders",
            Self::PendingDeliveryOrders => "pending_delivery_orders",
            Self::OrderStatuses => "order_statuses",
            Self::OrderDetail(_) => "order_detail",
            Self::AllocateOrder => "allocate_order",
            Self::ScheduleDelivery(_) => "schedule_delivery",
            Self::UpdateOrderStatus(_) => "update_order_status",
            Self::OrderSize(_) => "order_size",
            Self::StaffRoster => "staff_roster",
            Self::AvailableStaff => "available_staff",
            Self::Vehicles => "vehicles",
            Self::CreateVehicle => "create_vehicle",
            Self::UnassignedPickups => "unassigned_pickups",
            Self::AllocatePickup => "allocate_pickup",
            Self::ReplacementById(_) => "replacement_by_id",
            Self::StaffAssignmentHistory => "staff_assignment_history",
            Self::CurrentAssignments => "current_assignments",
        }
    }
}
