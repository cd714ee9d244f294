pub mod dialog;
pub mod selection;
pub mod vehicle_select;
