pub mod allocation;
pub mod order;
pub mod paging;
pub mod rental;
pub mod staff;
pub mod vehicle;
