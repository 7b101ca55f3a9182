pub mod api_types;
pub mod board;
pub mod client;
pub mod draft;
pub mod html;
pub mod store;
pub mod types;

#[cfg(test)]
pub mod memory;
