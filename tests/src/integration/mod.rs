//! Cross-crate integration: the gateway, the bus, and the responders
//! exercised together.

pub mod http_e2e;
pub mod rpc_flows;
