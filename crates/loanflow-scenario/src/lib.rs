//! Loanflow Scenarios
//!
//! Each scenario is a static `(initial graph, timeline script)` pair compiled
//! into the binary. Nothing is loaded at run time.
//!
//! - [`main_workflow`]: intake, validation, human review on failure, risk
//!   analysis, approval and notification.
//! - [`validation_subflow`]: what happens inside the validation agent, three
//!   validators fanning out from the intake and converging on an aggregator.
//!
//! [`ScenarioCatalog`] ties them together: it knows the main scenario and
//! which main-graph node each sub-flow drills down from.

mod catalog;
mod error;
mod main_workflow;
mod scenario;
mod validation;

pub use catalog::ScenarioCatalog;
pub use error::ScenarioError;
pub use main_workflow::{MAIN_SCENARIO, main_workflow};
pub use scenario::Scenario;
pub use validation::{VALIDATION_PARENT, VALIDATION_SCENARIO, validation_subflow};
