use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::allocation::selection::{
    AllocationSelection, NO_STAFF, Normalized, SelectionGap, VehicleSelectValue,
};
use crate::allocation::vehicle_select::{GroupedVehicleSelection, VehicleSelectorView};
use crate::api::client::DirectoryApi;
use crate::directory::{self, CandidateLoad};
use crate::error::ConsoleError;
use crate::models::allocation::{AllocationRequest, TaskType};
use crate::models::order::OrderWithDetails;
use crate::models::staff::{StaffAvailability, StaffAvailabilityDto};
use crate::models::vehicle::OrderSizeDto;

/// Mutations the dialog asks its owner to perform.
///
/// The dialog only looks at the returned flag; reporting the failure is the
/// owner's job.
#[async_trait]
pub trait OrderMutations: Send + Sync {
    async fn assign_staff(&self, request: AllocationRequest) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DialogState {
    Closed,
    Loading,
    Ready,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "estimate")]
pub enum SizeEstimate {
    NotRequested,
    Loading,
    Ready(OrderSizeDto),
    Unavailable,
}

/// Identifies the dialog session a request was issued for.
///
/// Responses carrying a ticket from an earlier session are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogTicket {
    epoch: u64,
    order_id: i64,
}

impl DialogTicket {
    pub fn order_id(&self) -> i64 {
        self.order_id
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffOption {
    pub staff_id: i64,
    pub label: String,
    pub prepared_this_order: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationDialogView {
    pub state: DialogState,
    pub order_id: Option<i64>,
    pub selection: AllocationSelection,
    pub preparation_staff_options: Vec<StaffOption>,
    pub shipping_staff_options: Vec<StaffOption>,
    pub vehicle_selector: VehicleSelectorView,
    pub size_estimate: SizeEstimate,
    pub allocating: bool,
    pub can_allocate: bool,
    pub missing: Vec<SelectionGap>,
    pub error: Option<String>,
}

/// State of one allocation attempt for one order.
#[derive(Debug)]
pub struct AllocationDialog {
    state: DialogState,
    epoch: u64,
    order: Option<OrderWithDetails>,
    selection: AllocationSelection,
    staff: StaffAvailabilityDto,
    size_estimate: SizeEstimate,
    vehicle_selector: GroupedVehicleSelection,
    error: Option<String>,
}

impl Default for AllocationDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationDialog {
    pub fn new() -> Self {
        Self {
            state: DialogState::Closed,
            epoch: 0,
            order: None,
            selection: AllocationSelection::default(),
            staff: StaffAvailabilityDto::default(),
            size_estimate: SizeEstimate::NotRequested,
            vehicle_selector: GroupedVehicleSelection::default(),
            error: None,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn selection(&self) -> &AllocationSelection {
        &self.selection
    }

    pub fn size_estimate(&self) -> &SizeEstimate {
        &self.size_estimate
    }

    pub fn order_id(&self) -> Option<i64> {
        self.order.as_ref().map(|order| order.order_id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_allocating(&self) -> bool {
        self.state == DialogState::Submitting
    }

    fn ticket(&self) -> Option<DialogTicket> {
        self.order.as_ref().map(|order| DialogTicket {
            epoch: self.epoch,
            order_id: order.order_id,
        })
    }

    /// Selections only change while the dialog is loading or ready; a
    /// submitted request must stay equal to what the operator sees afterwards.
    pub fn is_editable(&self) -> bool {
        matches!(self.state, DialogState::Loading | DialogState::Ready)
    }

    pub fn ensure_editable(&self) -> Result<(), ConsoleError> {
        match self.state {
            DialogState::Loading | DialogState::Ready => Ok(()),
            DialogState::Submitting => Err(ConsoleError::Conflict(
                "allocation in progress; selection is locked".to_string(),
            )),
            DialogState::Closed => Err(ConsoleError::BadRequest("dialog is closed".to_string())),
        }
    }

    fn refuse_edit(&self, field: &'static str) -> bool {
        if self.is_editable() {
            return false;
        }
        debug!(order_id = ?self.order_id(), state = ?self.state, field, "ignoring selection change");
        true
    }

    fn is_current(&self, ticket: DialogTicket) -> bool {
        let current = self.ticket() == Some(ticket) && self.state != DialogState::Closed;
        if !current {
            debug!(
                order_id = ticket.order_id,
                epoch = ticket.epoch,
                current_epoch = self.epoch,
                "dropping stale dialog response"
            );
        }
        current
    }

    /// Starts a fresh session; the caller loads candidates for the ticket.
    pub fn open(&mut self, order: OrderWithDetails) -> DialogTicket {
        self.epoch += 1;
        self.state = DialogState::Loading;
        self.selection = AllocationSelection::default();
        self.staff = StaffAvailabilityDto::default();
        self.size_estimate = SizeEstimate::NotRequested;
        self.vehicle_selector = GroupedVehicleSelection::default();
        self.error = None;

        let ticket = DialogTicket {
            epoch: self.epoch,
            order_id: order.order_id,
        };
        info!(order_id = order.order_id, "allocation dialog opened");
        self.order = Some(order);
        ticket
    }

    pub fn close(&mut self) {
        if self.state != DialogState::Closed {
            debug!(order_id = ?self.order_id(), "allocation dialog closed");
        }
        self.epoch += 1;
        self.state = DialogState::Closed;
        self.order = None;
    }

    pub fn apply_candidates(&mut self, ticket: DialogTicket, load: CandidateLoad) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.staff = load.staff;
        self.vehicle_selector.set_vehicles(load.vehicles);
        self.vehicle_selector
            .sync_selected(self.selection.selected_vehicle_id);
        if self.state == DialogState::Loading {
            self.state = DialogState::Ready;
        }
        true
    }

    /// Toggles `task_type`.
    ///
    /// Returns a ticket when the order size should now be fetched: Shipping is
    /// selected and no estimate was requested in this session yet.
    pub fn on_task_type_change(&mut self, task_type: TaskType) -> Option<DialogTicket> {
        if self.refuse_edit("task_types") {
            return None;
        }
        let selected = self.selection.toggle_task_type(task_type);
        if task_type == TaskType::Shipping
            && selected
            && self.size_estimate == SizeEstimate::NotRequested
        {
            let ticket = self.ticket()?;
            self.size_estimate = SizeEstimate::Loading;
            return Some(ticket);
        }
        None
    }

    pub fn apply_order_size(&mut self, ticket: DialogTicket, estimate: Option<OrderSizeDto>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.vehicle_selector.set_order_size(estimate.clone());
        self.size_estimate = match estimate {
            Some(dto) => SizeEstimate::Ready(dto),
            None => SizeEstimate::Unavailable,
        };
        true
    }

    /// Replaces the whole preparation list; callers pass it already edited.
    pub fn on_prep_staff_change(&mut self, staff_ids: Vec<i64>) -> bool {
        if self.refuse_edit("preparation_staff") {
            return false;
        }
        self.selection.set_prep_staff(staff_ids);
        true
    }

    pub fn on_shipping_staff_change(&mut self, staff_id: i64) -> bool {
        if self.refuse_edit("shipping_staff") {
            return false;
        }
        self.selection.set_shipping_staff(staff_id);
        true
    }

    /// Ids that are not among the loaded candidates are ignored.
    pub fn on_vehicle_change(&mut self, value: VehicleSelectValue) -> bool {
        if self.refuse_edit("vehicle") {
            return false;
        }
        if let Normalized::Set(Some(vehicle_id)) = value.normalize() {
            if !self.vehicle_selector.offers(vehicle_id) {
                warn!(order_id = ?self.order_id(), vehicle_id, "ignoring vehicle that is not offered");
                return false;
            }
        }
        let applied = self.selection.set_vehicle(&value);
        self.vehicle_selector
            .sync_selected(self.selection.selected_vehicle_id);
        applied
    }

    pub fn select_vehicle_from_dropdown(&mut self, vehicle_id: i64) {
        let mut picked = None;
        self.vehicle_selector
            .select_from_dropdown(vehicle_id, |value| picked = Some(value));
        if let Some(value) = picked {
            self.on_vehicle_change(value);
        }
    }

    pub fn click_vehicle_button(&mut self, vehicle_id: i64) {
        let mut picked = None;
        self.vehicle_selector
            .click_quick_select(vehicle_id, |value| picked = Some(value));
        if let Some(value) = picked {
            self.on_vehicle_change(value);
        }
    }

    pub fn can_allocate(&self) -> bool {
        self.state == DialogState::Ready && self.selection.is_submittable()
    }

    /// Moves to Submitting and returns the request to send.
    pub fn begin_allocation(&mut self) -> Result<(DialogTicket, AllocationRequest), ConsoleError> {
        match self.state {
            DialogState::Ready => {}
            DialogState::Submitting => {
                return Err(ConsoleError::Conflict("allocation already in progress".to_string()));
            }
            DialogState::Closed | DialogState::Loading => {
                return Err(ConsoleError::BadRequest("dialog is not ready".to_string()));
            }
        }

        if let Some(gap) = self.selection.gaps().first() {
            return Err(ConsoleError::BadRequest(gap.message().to_string()));
        }

        let ticket = self
            .ticket()
            .ok_or_else(|| ConsoleError::Internal("ready dialog has no order".to_string()))?;
        let request = self.selection.to_request(ticket.order_id);

        self.state = DialogState::Submitting;
        self.error = None;
        self.vehicle_selector.set_disabled(true);
        Ok((ticket, request))
    }

    /// Applies the owner's verdict. Selections survive a failure.
    pub fn finish_allocation(&mut self, ticket: DialogTicket, succeeded: bool) -> bool {
        if !self.is_current(ticket) || self.state != DialogState::Submitting {
            return false;
        }
        self.vehicle_selector.set_disabled(false);

        if succeeded {
            info!(order_id = ticket.order_id, "allocation submitted");
            self.close();
        } else {
            warn!(order_id = ticket.order_id, "allocation failed; dialog stays open");
            self.state = DialogState::Ready;
            self.error = Some("Allocation failed. Review the selection and try again.".to_string());
        }
        true
    }

    pub async fn open_with(&mut self, api: &dyn DirectoryApi, order: OrderWithDetails) {
        let order_id = order.order_id;
        let ticket = self.open(order);
        let load = directory::load_candidates(api, order_id).await;
        self.apply_candidates(ticket, load);
    }

    pub async fn toggle_task_type(&mut self, api: &dyn DirectoryApi, task_type: TaskType) {
        if let Some(ticket) = self.on_task_type_change(task_type) {
            let estimate = directory::estimate_order_size(api, ticket.order_id).await;
            self.apply_order_size(ticket, estimate);
        }
    }

    /// Submits through `mutations`; returns whether the dialog closed.
    pub async fn on_allocate(&mut self, mutations: &dyn OrderMutations) -> bool {
        let (ticket, request) = match self.begin_allocation() {
            Ok(started) => started,
            Err(err) => {
                debug!(error = %err, "allocation not submitted");
                return false;
            }
        };
        let succeeded = mutations.assign_staff(request).await;
        self.finish_allocation(ticket, succeeded);
        succeeded
    }

    fn staff_options(staff: Vec<StaffAvailability>) -> Vec<StaffOption> {
        staff
            .into_iter()
            .map(|member| StaffOption {
                staff_id: member.staff_id,
                label: format!("{} ({} assignments)", member.name, member.assignment_count),
                prepared_this_order: member.prepared_this_order,
                disabled: false,
            })
            .collect()
    }

    /// Available preparers not already picked.
    pub fn preparation_staff_options(&self) -> Vec<StaffOption> {
        let remaining = directory::staff_for_task(&self.staff, TaskType::Preparation)
            .into_iter()
            .filter(|staff| !self.selection.selected_prep_staff_ids.contains(&staff.staff_id))
            .collect();
        Self::staff_options(remaining)
    }

    /// Shipping candidates, led by the disabled "none" placeholder.
    pub fn shipping_staff_options(&self) -> Vec<StaffOption> {
        let mut options = vec![StaffOption {
            staff_id: NO_STAFF,
            label: "Select shipping staff".to_string(),
            prepared_this_order: false,
            disabled: true,
        }];
        options.extend(Self::staff_options(directory::staff_for_task(
            &self.staff,
            TaskType::Shipping,
        )));
        options
    }

    pub fn view(&self) -> AllocationDialogView {
        AllocationDialogView {
            state: self.state,
            order_id: self.order_id(),
            selection: self.selection.clone(),
            preparation_staff_options: self.preparation_staff_options(),
            shipping_staff_options: self.shipping_staff_options(),
            vehicle_selector: self.vehicle_selector.view(),
            size_estimate: self.size_estimate.clone(),
            allocating: self.is_allocating(),
            can_allocate: self.can_allocate(),
            missing: self.selection.gaps(),
            error: self.error.clone(),
        }
    }
}
