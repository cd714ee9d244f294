pub mod client;
pub mod endpoints;
pub mod envelope;
pub mod rest;

#[cfg(test)]
pub(crate) mod fake;
