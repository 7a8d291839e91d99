//! Task backend port and request/response model.

pub mod port;
pub mod types;
