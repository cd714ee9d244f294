//! In-memory backend for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::api::client::{DirectoryApi, OrderApi};
use crate::error::ConsoleError;
use crate::models::allocation::{AllocationRequest, TaskType};
use crate::models::order::{
    OrderStatus, OrderWithDetails, ScheduleDeliveryRequest, StaffAssignment, StatusHistoryEntry,
    UpdateOrderStatusRequest,
};
use crate::models::paging::{PageRequest, PagedResult};
use crate::models::staff::{StaffAvailability, StaffAvailabilityDto, StaffMember};
use crate::models::vehicle::{
    OrderSize, OrderSizeDto, Vehicle, VehicleFilter, VehicleStatus, VehicleType,
};

pub fn sample_order(order_id: i64) -> OrderWithDetails {
    OrderWithDetails {
        order_id,
        status: OrderStatus::Pending,
        address: format!("{order_id} Lantern Street"),
        customer_name: Some("Quynh".to_string()),
        is_preparation_staff_assigned: false,
        is_shipping_staff_assigned: false,
        preparation_assignments: Vec::new(),
        shipping_assignment: None,
        vehicle_info: None,
        delivery_time: None,
        status_history: Vec::new(),
    }
}

fn candidate(staff_id: i64, name: &str, prepared: bool) -> StaffAvailability {
    StaffAvailability {
        staff_id,
        name: name.to_string(),
        assignment_count: 0,
        prepared_this_order: prepared,
        is_available: true,
    }
}

fn vehicle(vehicle_id: i64, vehicle_type: VehicleType, status: VehicleStatus) -> Vehicle {
    Vehicle {
        vehicle_id,
        name: format!("vehicle-{vehicle_id}"),
        license_plate: format!("51-F{vehicle_id:03}"),
        vehicle_type,
        status,
    }
}

fn rejected(message: &str) -> ConsoleError {
    ConsoleError::Rejected(Some(message.to_string()))
}

#[derive(Default)]
pub struct FakeApi {
    pub unallocated: Mutex<Vec<OrderWithDetails>>,
    pub pending: Mutex<Vec<OrderWithDetails>>,
    pub staff: Mutex<Vec<StaffMember>>,
    pub availability: Mutex<StaffAvailabilityDto>,
    pub fleet: Mutex<Vec<Vehicle>>,
    pub size: Mutex<Option<OrderSizeDto>>,
    pub allocate_rejection: Mutex<Option<String>>,
    pub fail_orders: AtomicBool,
    pub fail_staff: AtomicBool,
    pub fail_detail: AtomicBool,
    pub size_calls: AtomicUsize,
    pub allocate_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub allocations: Mutex<Vec<AllocationRequest>>,
    /// Signalled whenever a held call parks.
    pub entered: Notify,
    hold_lists: Mutex<Option<Arc<Notify>>>,
    hold_writes: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    pub fn seeded() -> Self {
        let api = Self::default();
        *api.unallocated.lock().unwrap() = vec![sample_order(11), sample_order(12)];
        *api.pending.lock().unwrap() = vec![{
            let mut order = sample_order(20);
            order.status = OrderStatus::Processed;
            order.is_preparation_staff_assigned = true;
            order
        }];
        *api.staff.lock().unwrap() = vec![
            StaffMember {
                staff_id: 5,
                name: "Mai".to_string(),
                role: Some("Staff".to_string()),
                assignment_count: 1,
            },
            StaffMember {
                staff_id: 42,
                name: "Tuan".to_string(),
                role: Some("Staff".to_string()),
                assignment_count: 0,
            },
        ];
        *api.availability.lock().unwrap() = StaffAvailabilityDto {
            preparation_staff: vec![candidate(5, "Mai", false), candidate(9, "Khoa", false)],
            shipping_staff: vec![candidate(42, "Tuan", false), candidate(5, "Mai", true)],
        };
        *api.fleet.lock().unwrap() = vec![
            vehicle(7, VehicleType::Car, VehicleStatus::Available),
            vehicle(8, VehicleType::Scooter, VehicleStatus::Available),
            vehicle(10, VehicleType::Car, VehicleStatus::InUse),
        ];
        *api.size.lock().unwrap() = Some(OrderSizeDto {
            size: OrderSize::Large,
            suggested_vehicle_type: VehicleType::Car,
        });
        api
    }

    pub fn set_order_size(&self, size: Option<OrderSizeDto>) {
        *self.size.lock().unwrap() = size;
    }

    pub fn reject_allocations(&self, message: &str) {
        *self.allocate_rejection.lock().unwrap() = Some(message.to_string());
    }

    /// The next unallocated-orders read copies its data, then waits for the
    /// returned handle.
    pub fn hold_order_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold_lists.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// The next status or delivery write waits for the returned handle.
    pub fn hold_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold_writes.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn park(&self, hold: &Mutex<Option<Arc<Notify>>>) {
        let gate = hold.lock().unwrap().take();
        if let Some(gate) = gate {
            self.entered.notify_one();
            gate.notified().await;
        }
    }

    fn with_order<R>(
        &self,
        order_id: i64,
        edit: impl FnOnce(&mut OrderWithDetails) -> R,
    ) -> Option<R> {
        for list in [&self.unallocated, &self.pending] {
            let mut orders = list.lock().unwrap();
            if let Some(order) = orders.iter_mut().find(|order| order.order_id == order_id) {
                return Some(edit(order));
            }
        }
        None
    }

    fn staff_name(&self, staff_id: i64) -> String {
        self.staff
            .lock()
            .unwrap()
            .iter()
            .find(|member| member.staff_id == staff_id)
            .map(|member| member.name.clone())
            .unwrap_or_else(|| format!("staff-{staff_id}"))
    }
}

#[async_trait]
impl OrderApi for FakeApi {
    async fn unallocated_orders(
        &self,
        page: PageRequest,
    ) -> Result<PagedResult<OrderWithDetails>, ConsoleError> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(ConsoleError::Transport("connection refused".to_string()));
        }
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.unallocated.lock().unwrap().clone();
        self.park(&self.hold_lists).await;
        Ok(PagedResult {
            total_count: items.len() as u64,
            items,
            page_number: page.page_number,
            page_size: page.page_size,
        })
    }

    async fn pending_delivery_orders(&self) -> Result<Vec<OrderWithDetails>, ConsoleError> {
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn order_statuses(&self) -> Result<Vec<OrderStatus>, ConsoleError> {
        Ok(vec![
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipping,
        ])
    }

    async fn order_detail(&self, order_id: i64) -> Result<OrderWithDetails, ConsoleError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_detail.load(Ordering::SeqCst) {
            return Err(ConsoleError::Transport("timed out".to_string()));
        }
        self.with_order(order_id, |order| order.clone())
            .ok_or_else(|| ConsoleError::NotFound(format!("order {order_id}")))
    }

    async fn staff_roster(&self) -> Result<Vec<StaffMember>, ConsoleError> {
        if self.fail_staff.load(Ordering::SeqCst) {
            return Err(ConsoleError::Server {
                status: 500,
                message: None,
            });
        }
        Ok(self.staff.lock().unwrap().clone())
    }

    async fn allocate_order(&self, request: &AllocationRequest) -> Result<(), ConsoleError> {
        self.allocate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.allocate_rejection.lock().unwrap().clone() {
            return Err(rejected(&message));
        }
        self.allocations.lock().unwrap().push(request.clone());

        let preparers: Vec<StaffAssignment> = request
            .preparation_staff_ids
            .iter()
            .enumerate()
            .map(|(index, staff_id)| StaffAssignment {
                assignment_id: 100 + index as i64,
                staff_id: *staff_id,
                staff_name: self.staff_name(*staff_id),
                assigned_at: Some(Utc::now()),
                completed_at: None,
            })
            .collect();
        let shipper = request.shipping_staff_id.map(|staff_id| StaffAssignment {
            assignment_id: 200,
            staff_id,
            staff_name: self.staff_name(staff_id),
            assigned_at: Some(Utc::now()),
            completed_at: None,
        });

        self.with_order(request.order_id, |order| {
            if request.task_types.contains(&TaskType::Preparation) {
                order.preparation_assignments.extend(preparers);
                order.is_preparation_staff_assigned = true;
            }
            if request.task_types.contains(&TaskType::Shipping) {
                order.shipping_assignment = shipper;
                order.is_shipping_staff_assigned = true;
            }
        })
        .ok_or_else(|| rejected("Order not found"))
    }

    async fn schedule_delivery(
        &self,
        order_id: i64,
        request: &ScheduleDeliveryRequest,
    ) -> Result<(), ConsoleError> {
        self.park(&self.hold_writes).await;
        self.with_order(order_id, |order| order.delivery_time = Some(request.delivery_time))
            .ok_or_else(|| rejected("Order not found"))
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        request: &UpdateOrderStatusRequest,
    ) -> Result<(), ConsoleError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.park(&self.hold_writes).await;
        self.with_order(order_id, |order| {
            order.status = request.status;
            order.status_history.push(StatusHistoryEntry {
                status: request.status,
                updated_by: "server".to_string(),
                updated_at: Utc::now(),
                notes: request.notes.clone(),
                pending: false,
            });
        })
        .ok_or_else(|| rejected("Order not found"))
    }
}

#[async_trait]
impl DirectoryApi for FakeApi {
    async fn available_staff(
        &self,
        _order_id: Option<i64>,
    ) -> Result<StaffAvailabilityDto, ConsoleError> {
        Ok(self.availability.lock().unwrap().clone())
    }

    async fn vehicles(&self, filter: &VehicleFilter) -> Result<PagedResult<Vehicle>, ConsoleError> {
        let items: Vec<Vehicle> = self
            .fleet
            .lock()
            .unwrap()
            .iter()
            .filter(|v| filter.status.is_none_or(|status| v.status == status))
            .cloned()
            .collect();
        Ok(PagedResult {
            total_count: items.len() as u64,
            items,
            page_number: filter.page_number,
            page_size: filter.page_size,
        })
    }

    async fn order_size(&self, order_id: i64) -> Result<OrderSizeDto, ConsoleError> {
        self.size_calls.fetch_add(1, Ordering::SeqCst);
        self.size
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ConsoleError::Server {
                status: 500,
                message: Some(format!("cannot size order {order_id}")),
            })
    }
}
