//! Inbound/outbound message model and the delivery port.

pub mod port;
pub mod types;
