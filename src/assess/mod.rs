//! Fleet assessment: intent extraction, reconciliation and classification,
//! plus the orchestrator that runs them across every device.

pub mod bgp;
pub mod fleet;
pub mod mlag;
pub mod topology;

pub use fleet::FleetAssessor;
