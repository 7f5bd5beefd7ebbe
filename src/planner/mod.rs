//! Pure planning: selector cascade, fragment math and transcode parameters
//!
//! Nothing in here touches the filesystem or spawns a process.

pub mod fragment;
pub mod selector;
pub mod transcode;

pub use fragment::FragmentPlan;
pub use selector::{CascadeStep, CascadeTier, FormatSelector, SelectorPlanner};
pub use transcode::{PlannerSettings, TranscodePlanner};
