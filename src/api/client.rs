use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};

use crate::api::endpoints::Endpoint;
use crate::api::envelope::ErrorBody;
use crate::config::Config;
use crate::error::ConsoleError;
use crate::models::allocation::AllocationRequest;
use crate::models::order::{
    OrderStatus, OrderWithDetails, ScheduleDeliveryRequest, UpdateOrderStatusRequest,
};
use crate::models::paging::{PageRequest, PagedResult};
use crate::models::rental::{
    AllocatePickupRequest, AssignmentHistoryFilter, CurrentAssignment, ReplacementRequestDetail,
    StaffAssignmentHistory, UnassignedPickup,
};
use crate::models::staff::{StaffAvailabilityDto, StaffMember};
use crate::models::vehicle::{CreateVehicleRequest, OrderSizeDto, Vehicle, VehicleFilter};

/// Order reads and mutations used by the order board.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn unallocated_orders(
        &self,
        page: PageRequest,
    ) -> Result<PagedResult<OrderWithDetails>, ConsoleError>;
    async fn pending_delivery_orders(&self) -> Result<Vec<OrderWithDetails>, ConsoleError>;
    async fn order_statuses(&self) -> Result<Vec<OrderStatus>, ConsoleError>;
    async fn order_detail(&self, order_id: i64) -> Result<OrderWithDetails, ConsoleError>;
    async fn staff_roster(&self) -> Result<Vec<StaffMember>, ConsoleError>;
    async fn allocate_order(&self, request: &AllocationRequest) -> Result<(), ConsoleError>;
    async fn schedule_delivery(
        &self,
        order_id: i64,
        request: &ScheduleDeliveryRequest,
    ) -> Result<(), ConsoleError>;
    async fn update_order_status(
        &self,
        order_id: i64,
        request: &UpdateOrderStatusRequest,
    ) -> Result<(), ConsoleError>;
}

/// Candidate lookups used by the allocation dialog.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn available_staff(
        &self,
        order_id: Option<i64>,
    ) -> Result<StaffAvailabilityDto, ConsoleError>;
    async fn vehicles(&self, filter: &VehicleFilter) -> Result<PagedResult<Vehicle>, ConsoleError>;
    async fn order_size(&self, order_id: i64) -> Result<OrderSizeDto, ConsoleError>;
}

/// Rental, replacement and staff-history routes.
#[async_trait]
pub trait RentalApi: Send + Sync {
    async fn unassigned_pickups(
        &self,
        page: PageRequest,
    ) -> Result<PagedResult<UnassignedPickup>, ConsoleError>;
    async fn allocate_pickup(&self, request: &AllocatePickupRequest) -> Result<(), ConsoleError>;
    async fn replacement_by_id(&self, id: i64) -> Result<ReplacementRequestDetail, ConsoleError>;
    async fn staff_assignment_history(
        &self,
        filter: &AssignmentHistoryFilter,
    ) -> Result<PagedResult<StaffAssignmentHistory>, ConsoleError>;
    async fn current_assignments(&self) -> Result<Vec<CurrentAssignment>, ConsoleError>;
    async fn create_vehicle(&self, request: &CreateVehicleRequest) -> Result<Vehicle, ConsoleError>;
}

#[derive(Clone)]
pub struct HttpConsoleApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpConsoleApi {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, ConsoleError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| ConsoleError::Config(format!("invalid API_TOKEN: {err}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| ConsoleError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConsoleError> {
        Self::new(&config.api_base_url, config.api_token.as_deref())
    }

    fn request(&self, endpoint: Endpoint) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!(endpoint = endpoint.name(), %url, "backend request");
        self.http.request(endpoint.method(), url)
    }

    /// Sends the request and unwraps the body the way `endpoint` wraps it.
    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
    ) -> Result<Option<T>, ConsoleError> {
        let response = builder.send().await.map_err(|err| {
            warn!(endpoint = endpoint.name(), error = %err, "backend unreachable");
            ConsoleError::from(err)
        })?;
        let response = check_status(endpoint, response).await?;
        let body = response.bytes().await.map_err(ConsoleError::from)?;

        endpoint.envelope().decode(&body).inspect_err(|err| {
            if let ConsoleError::Decode(reason) = err {
                warn!(endpoint = endpoint.name(), error = %reason, "malformed backend response");
            }
        })
    }

    /// A payload the caller cannot do without.
    async fn required<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
    ) -> Result<T, ConsoleError> {
        self.call(endpoint, builder).await?.ok_or_else(|| {
            warn!(endpoint = endpoint.name(), "backend response has no data");
            ConsoleError::Decode(format!("{} response has no data", endpoint.name()))
        })
    }

    /// Lists where a missing payload means "nothing".
    async fn listed<T: DeserializeOwned + Default>(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
    ) -> Result<T, ConsoleError> {
        Ok(self.call(endpoint, builder).await?.unwrap_or_default())
    }

    /// Writes: only the success flag matters.
    async fn acknowledged<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<(), ConsoleError> {
        self.call::<IgnoredAny>(endpoint, self.request(endpoint).json(body))
            .await?;
        Ok(())
    }
}

async fn check_status(endpoint: Endpoint, response: Response) -> Result<Response, ConsoleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message);

    warn!(
        endpoint = endpoint.name(),
        status = status.as_u16(),
        message = message.as_deref().unwrap_or(""),
        "backend returned error status"
    );

    if status == reqwest::StatusCode::NOT_FOUND && message.is_none() {
        return Err(ConsoleError::NotFound(endpoint.path()));
    }

    Err(ConsoleError::Server {
        status: status.as_u16(),
        message,
    })
}

fn page_query(page: PageRequest) -> Vec<(&'static str, String)> {
    vec![
        ("pageNumber", page.page_number.to_string()),
        ("pageSize", page.page_size.to_string()),
    ]
}

/// Array filters repeat the key: `type=Car&type=Scooter`.
pub fn vehicle_query(filter: &VehicleFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(status) = filter.status {
        query.push(("status", status.as_str().to_string()));
    }
    for vehicle_type in &filter.types {
        query.push(("type", vehicle_type.as_str().to_string()));
    }
    if filter.page_number > 0 {
        query.push(("pageNumber", filter.page_number.to_string()));
    }
    if filter.page_size > 0 {
        query.push(("pageSize", filter.page_size.to_string()));
    }
    query
}

pub fn history_query(filter: &AssignmentHistoryFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(staff_id) = filter.staff_id {
        query.push(("staffId", staff_id.to_string()));
    }
    for task_type in &filter.task_types {
        query.push(("taskType", task_type.clone()));
    }
    if let Some(from) = filter.from {
        query.push(("fromDate", from.to_rfc3339()));
    }
    if let Some(to) = filter.to {
        query.push(("toDate", to.to_rfc3339()));
    }
    if filter.page_number > 0 {
        query.push(("pageNumber", filter.page_number.to_string()));
    }
    if filter.page_size > 0 {
        query.push(("pageSize", filter.page_size.to_string()));
    }
    query
}

#[async_trait]
impl OrderApi for HttpConsoleApi {
    async fn unallocated_orders(
        &self,
        page: PageRequest,
    ) -> Result<PagedResult<OrderWithDetails>, ConsoleError> {
        let endpoint = Endpoint::UnallocatedOrders;
        self.required(endpoint, self.request(endpoint).query(&page_query(page)))
            .await
    }

    async fn pending_delivery_orders(&self) -> Result<Vec<OrderWithDetails>, ConsoleError> {
        let endpoint = Endpoint::PendingDeliveryOrders;
        self.listed(endpoint, self.request(endpoint)).await
    }

    async fn order_statuses(&self) -> Result<Vec<OrderStatus>, ConsoleError> {
        let endpoint = Endpoint::OrderStatuses;
        self.listed(endpoint, self.request(endpoint)).await
    }

    async fn order_detail(&self, order_id: i64) -> Result<OrderWithDetails, ConsoleError> {
        let endpoint = Endpoint::OrderDetail(order_id);
        self.required(endpoint, self.request(endpoint)).await
    }

    async fn staff_roster(&self) -> Result<Vec<StaffMember>, ConsoleError> {
        let endpoint = Endpoint::StaffRoster;
        self.listed(endpoint, self.request(endpoint)).await
    }

    async fn allocate_order(&self, request: &AllocationRequest) -> Result<(), ConsoleError> {
        self.acknowledged(Endpoint::AllocateOrder, request).await
    }

    async fn schedule_delivery(
        &self,
        order_id: i64,
        request: &ScheduleDeliveryRequest,
    ) -> Result<(), ConsoleError> {
        self.acknowledged(Endpoint::ScheduleDelivery(order_id), request)
            .await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        request: &UpdateOrderStatusRequest,
    ) -> Result<(), ConsoleError> {
        self.acknowledged(Endpoint::UpdateOrderStatus(order_id), request)
            .await
    }
}

#[async_trait]
impl DirectoryApi for HttpConsoleApi {
    async fn available_staff(
        &self,
        order_id: Option<i64>,
    ) -> Result<StaffAvailabilityDto, ConsoleError> {
        let endpoint = Endpoint::AvailableStaff;
        let query: Vec<(&str, String)> = order_id
            .map(|id| vec![("orderId", id.to_string())])
            .unwrap_or_default();
        self.required(endpoint, self.request(endpoint).query(&query))
            .await
    }

    async fn vehicles(&self, filter: &VehicleFilter) -> Result<PagedResult<Vehicle>, ConsoleError> {
        let endpoint = Endpoint::Vehicles;
        self.required(endpoint, self.request(endpoint).query(&vehicle_query(filter)))
            .await
    }

    async fn order_size(&self, order_id: i64) -> Result<OrderSizeDto, ConsoleError> {
        let endpoint = Endpoint::OrderSize(order_id);
        self.required(endpoint, self.request(endpoint)).await
    }
}

#[async_trait]
impl RentalApi for HttpConsoleApi {
    async fn unassigned_pickups(
        &self,
        page: PageRequest,
    ) -> Result<PagedResult<UnassignedPickup>, ConsoleError> {
        let endpoint = Endpoint::UnassignedPickups;
        self.required(endpoint, self.request(endpoint).query(&page_query(page)))
            .await
    }

    async fn allocate_pickup(&self, request: &AllocatePickupRequest) -> Result<(), ConsoleError> {
        self.acknowledged(Endpoint::AllocatePickup, request).await
    }

    async fn replacement_by_id(&self, id: i64) -> Result<ReplacementRequestDetail, ConsoleError> {
        let endpoint = Endpoint::ReplacementById(id);
        self.required(endpoint, self.request(endpoint)).await
    }

    async fn staff_assignment_history(
        &self,
        filter: &AssignmentHistoryFilter,
    ) -> Result<PagedResult<StaffAssignmentHistory>, ConsoleError> {
        let endpoint = Endpoint::StaffAssignmentHistory;
        self.required(endpoint, self.request(endpoint).query(&history_query(filter)))
            .await
    }

    async fn current_assignments(&self) -> Result<Vec<CurrentAssignment>, ConsoleError> {
        let endpoint = Endpoint::CurrentAssignments;
        self.listed(endpoint, self.request(endpoint)).await
    }

    async fn create_vehicle(&self, request: &CreateVehicleRequest) -> Result<Vehicle, ConsoleError> {
        let endpoint = Endpoint::CreateVehicle;
        self.required(endpoint, self.request(endpoint).json(request))
            .await
    }
}
