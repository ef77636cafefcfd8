mod assessments;
mod bgp;
mod config_tree;
mod devices;
mod mlag;
mod report;
mod topology;

pub use assessments::{run_status, triggered_by, AssessmentRun};
pub use bgp::*;
pub use config_tree::ConfigNode;
pub use devices::Device;
pub use mlag::*;
pub use report::{FleetReport, ValidatorReport};
pub use topology::{LldpNeighbor, TopologyLink, TopologyReport};
