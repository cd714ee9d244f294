use serde::Serialize;
use tracing::warn;

use crate::allocation::selection::{Normalized, VehicleSelectValue};
use crate::models::vehicle::{OrderSize, OrderSizeDto, Vehicle, VehicleType};

/// Vehicles of one type, rendered as a row of quick-select buttons.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleGroup {
    pub vehicle_type: VehicleType,
    pub buttons: Vec<QuickSelectButton>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuickSelectButton {
    pub vehicle_id: i64,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DropdownOption {
    pub vehicle_id: i64,
    pub label: String,
}

/// Read-only chip with the server's suggestion. Never applied automatically.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionHint {
    pub size: OrderSize,
    pub suggested_vehicle_type: VehicleType,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSelectorView {
    pub dropdown_value: Option<i64>,
    pub options: Vec<DropdownOption>,
    pub groups: Vec<VehicleGroup>,
    pub hint: Option<SuggestionHint>,
    pub disabled: bool,
}

/// One vehicle pick shown through a dropdown and per-type button rows.
///
/// The local value only exists to drive the dropdown; the owner's value wins
/// and is pushed back in with [`sync_selected`](Self::sync_selected).
#[derive(Debug, Clone, Default)]
pub struct GroupedVehicleSelection {
    vehicles: Vec<Vehicle>,
    local_selected: Option<i64>,
    order_size: Option<OrderSizeDto>,
    disabled: bool,
}

impl GroupedVehicleSelection {
    pub fn new(vehicles: Vec<Vehicle>, selected_vehicle_id: Option<i64>) -> Self {
        Self {
            vehicles,
            local_selected: selected_vehicle_id,
            order_size: None,
            disabled: false,
        }
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) {
        self.vehicles = vehicles;
    }

    pub fn set_order_size(&mut self, order_size: Option<OrderSizeDto>) {
        self.order_size = order_size;
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn sync_selected(&mut self, selected_vehicle_id: Option<i64>) {
        self.local_selected = selected_vehicle_id;
    }

    pub fn dropdown_value(&self) -> Option<i64> {
        self.local_selected
    }

    /// Whether `vehicle_id` is one of the listed options.
    pub fn offers(&self, vehicle_id: i64) -> bool {
        self.vehicles
            .iter()
            .any(|vehicle| vehicle.vehicle_id == vehicle_id)
    }

    pub fn select_from_dropdown<F>(&mut self, vehicle_id: i64, on_change: F)
    where
        F: FnOnce(VehicleSelectValue),
    {
        self.forward(VehicleSelectValue::Number(vehicle_id), on_change);
    }

    /// Buttons report the id as text, the same way a DOM event target would.
    pub fn click_quick_select<F>(&mut self, vehicle_id: i64, on_change: F)
    where
        F: FnOnce(VehicleSelectValue),
    {
        self.forward(VehicleSelectValue::Text(vehicle_id.to_string()), on_change);
    }

    fn forward<F>(&mut self, value: VehicleSelectValue, on_change: F)
    where
        F: FnOnce(VehicleSelectValue),
    {
        if self.disabled {
            return;
        }
        match value.normalize() {
            Normalized::Set(Some(id)) if !self.offers(id) => {
                warn!(vehicle_id = id, "vehicle is not among the options");
                return;
            }
            Normalized::Set(id) => self.local_selected = id,
            Normalized::Invalid => {}
        }
        on_change(value);
    }

    pub fn options(&self) -> Vec<DropdownOption> {
        self.vehicles
            .iter()
            .map(|vehicle| DropdownOption {
                vehicle_id: vehicle.vehicle_id,
                label: format!(
                    "{} ({}) - {}",
                    vehicle.name,
                    vehicle.license_plate,
                    vehicle.vehicle_type.as_str()
                ),
            })
            .collect()
    }

    /// Scooters first, then cars; types with no vehicles are left out.
    pub fn groups(&self) -> Vec<VehicleGroup> {
        [VehicleType::Scooter, VehicleType::Car]
            .into_iter()
            .filter_map(|vehicle_type| {
                let buttons: Vec<QuickSelectButton> = self
                    .vehicles
                    .iter()
                    .filter(|vehicle| vehicle.vehicle_type == vehicle_type)
                    .map(|vehicle| QuickSelectButton {
                        vehicle_id: vehicle.vehicle_id,
                        label: vehicle.license_plate.clone(),
                        selected: self.local_selected == Some(vehicle.vehicle_id),
                    })
                    .collect();

                if buttons.is_empty() {
                    None
                } else {
                    Some(VehicleGroup {
                        vehicle_type,
                        buttons,
                    })
                }
            })
            .collect()
    }

    pub fn hint(&self) -> Option<SuggestionHint> {
        self.order_size.as_ref().map(|dto| {
            let size = match dto.size {
                OrderSize::Small => "Small",
                OrderSize::Large => "Large",
            };
            SuggestionHint {
                size: dto.size,
                suggested_vehicle_type: dto.suggested_vehicle_type,
                label: format!(
                    "{size} order, suggested vehicle: {}",
                    dto.suggested_vehicle_type.as_str()
                ),
            }
        })
    }

    pub fn view(&self) -> VehicleSelectorView {
        VehicleSelectorView {
            dropdown_value: self.dropdown_value(),
            options: self.options(),
            groups: self.groups(),
            hint: self.hint(),
            disabled: self.disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GroupedVehicleSelection;
    use crate::allocation::selection::{AllocationSelection, VehicleSelectValue};
    use crate::models::vehicle::{OrderSize, OrderSizeDto, Vehicle, VehicleStatus, VehicleType};

    fn vehicle(id: i64, vehicle_type: VehicleType) -> Vehicle {
        Vehicle {
            vehicle_id: id,
            name: format!("vehicle-{id}"),
            license_plate: format!("59-X{id}"),
            vehicle_type,
            status: VehicleStatus::Available,
        }
    }

    fn selected_buttons(selector: &GroupedVehicleSelection) -> Vec<i64> {
        selector
            .groups()
            .into_iter()
            .flat_map(|group| group.buttons)
            .filter(|button| button.selected)
            .map(|button| button.vehicle_id)
            .collect()
    }

    #[test]
    fn dropdown_and_buttons_never_disagree() {
        let vehicles = vec![
            vehicle(1, VehicleType::Scooter),
            vehicle(2, VehicleType::Car),
            vehicle(3, VehicleType::Scooter),
        ];
        let mut parent = AllocationSelection::default();
        let mut selector = GroupedVehicleSelection::new(vehicles, parent.selected_vehicle_id);

        let events: [(bool, i64); 5] = [(true, 1), (false, 2), (true, 3), (false, 3), (true, 2)];
        for (from_dropdown, id) in events {
            if from_dropdown {
                selector.select_from_dropdown(id, |value| {
                    parent.set_vehicle(&value);
                });
            } else {
                selector.click_quick_select(id, |value| {
                    parent.set_vehicle(&value);
                });
            }
            selector.sync_selected(parent.selected_vehicle_id);

            assert_eq!(parent.selected_vehicle_id, Some(id));
            assert_eq!(selector.dropdown_value(), parent.selected_vehicle_id);
            assert_eq!(selected_buttons(&selector), vec![id]);
        }
    }

    #[test]
    fn both_paths_forward_the_same_parent_state() {
        let vehicles = vec![vehicle(7, VehicleType::Car)];
        let mut via_dropdown = AllocationSelection::default();
        let mut via_button = AllocationSelection::default();
        let mut selector = GroupedVehicleSelection::new(vehicles, None);

        selector.select_from_dropdown(7, |value| {
            via_dropdown.set_vehicle(&value);
        });
        selector.click_quick_select(7, |value| {
            via_button.set_vehicle(&value);
        });

        assert_eq!(via_dropdown, via_button);
    }

    #[test]
    fn parent_value_overrides_local_mirror() {
        let mut selector = GroupedVehicleSelection::new(vec![vehicle(1, VehicleType::Car)], None);
        selector.select_from_dropdown(1, |_| {});
        selector.sync_selected(None);
        assert_eq!(selector.dropdown_value(), None);
        assert!(selected_buttons(&selector).is_empty());
    }

    #[test]
    fn empty_groups_are_omitted() {
        let selector = GroupedVehicleSelection::new(vec![vehicle(2, VehicleType::Car)], None);
        let groups = selector.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].vehicle_type, VehicleType::Car);

        let empty = GroupedVehicleSelection::new(Vec::new(), None);
        assert!(empty.groups().is_empty());
    }

    #[test]
    fn hint_is_advisory_only() {
        let mut selector = GroupedVehicleSelection::new(
            vec![vehicle(1, VehicleType::Scooter), vehicle(2, VehicleType::Car)],
            None,
        );
        selector.set_order_size(Some(OrderSizeDto {
            size: OrderSize::Large,
            suggested_vehicle_type: VehicleType::Car,
        }));

        let hint = selector.hint().unwrap();
        assert_eq!(hint.suggested_vehicle_type, VehicleType::Car);
        assert_eq!(selector.dropdown_value(), None);
    }

    #[test]
    fn unknown_vehicle_is_not_forwarded() {
        let mut selector = GroupedVehicleSelection::new(vec![vehicle(1, VehicleType::Car)], Some(1));

        let mut forwarded: Option<VehicleSelectValue> = None;
        selector.select_from_dropdown(10, |value| forwarded = Some(value));
        selector.click_quick_select(10, |value| forwarded = Some(value));

        assert!(forwarded.is_none());
        assert_eq!(selector.dropdown_value(), Some(1));
        assert_eq!(selected_buttons(&selector), vec![1]);
    }

    #[test]
    fn disabled_selector_forwards_nothing() {
        let mut selector = GroupedVehicleSelection::new(vec![vehicle(1, VehicleType::Car)], None);
        selector.set_disabled(true);

        let mut forwarded: Option<VehicleSelectValue> = None;
        selector.click_quick_select(1, |value| forwarded = Some(value));

        assert!(forwarded.is_none());
        assert_eq!(selector.dropdown_value(), None);
    }
}
