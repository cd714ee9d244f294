use serde::{Deserialize, Serialize};

/// A staff candidate as returned by the availability endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffAvailability {
    #[serde(rename = "id", alias = "staffId")]
    pub staff_id: i64,
    pub name: String,
    #[serde(default)]
    pub assignment_count: u32,
    /// Shipping candidates only: this person already prepared the same order.
    #[serde(default)]
    pub prepared_this_order: bool,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffAvailabilityDto {
    #[serde(default)]
    pub preparation_staff: Vec<StaffAvailability>,
    #[serde(default)]
    pub shipping_staff: Vec<StaffAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    #[serde(rename = "id", alias = "staffId")]
    pub staff_id: i64,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub assignment_count: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::StaffAvailability;

    #[test]
    fn accepts_either_id_spelling() {
        let by_id: StaffAvailability =
            serde_json::from_value(json!({ "id": 4, "name": "Lan" })).unwrap();
        let by_staff_id: StaffAvailability =
            serde_json::from_value(json!({ "staffId": 4, "name": "Lan" })).unwrap();

        assert_eq!(by_id, by_staff_id);
        assert!(by_id.is_available);
        assert!(!by_id.prepared_this_order);
    }
}
