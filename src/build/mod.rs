//! Building, verifying and packaging ICU4C for one platform/arch pair

pub mod container;
pub mod executor;
pub mod package;
pub mod plan;
pub mod source;
pub mod target;
pub mod unix;
pub mod verify;
pub mod windows;

pub use executor::PlanExecutor;
pub use plan::{BuildLayout, BuildPlan, PlanOptions};
pub use target::{BuildTarget, Platform};
