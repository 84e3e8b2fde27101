//! Build pipeline stage that provisions a VM through a [`vm_driver::VmDriver`]
//! and rolls it back when the build does not complete.

pub mod config;
pub mod error;
pub mod interrupt;
pub mod pipeline;
pub mod step_create;
pub mod ui;

#[cfg(test)]
mod testing;

pub use config::{BuildConfig, ConfigError, CreateConfig, LocationConfig};
pub use error::StepError;
pub use pipeline::{RunContext, RunStatus, Runner, Step, StepAction};
pub use step_create::StepCreateVm;
pub use ui::{TracingUi, Ui};
pub use vm_driver::types::Firmware;
