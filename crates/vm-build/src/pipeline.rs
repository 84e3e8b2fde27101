//! Per-run context and a sequential step runner.
//!
//! Every run owns a [`RunContext`] that steps read from and write to. Steps
//! that were started get their `cleanup` called in reverse order once the run
//! ends, whatever the outcome; each step decides from [`RunContext::status`]
//! whether there is anything to undo.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;
use vm_driver::VmDriver;
use vm_driver::types::VmHandle;

use crate::error::StepError;
use crate::ui::Ui;

/// What the runner should do after a step returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Continue,
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Halted,
}

impl RunStatus {
    /// True when the run ended without completing, so created resources must
    /// be released.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Halted)
    }
}

/// State shared by the steps of a single run.
pub struct RunContext {
    ui: Arc<dyn Ui>,
    driver: Arc<dyn VmDriver>,
    vm: Option<VmHandle>,
    error: Option<StepError>,
    status: RunStatus,
}

impl RunContext {
    pub fn new(ui: Arc<dyn Ui>, driver: Arc<dyn VmDriver>) -> Self {
        Self {
            ui,
            driver,
            vm: None,
            error: None,
            status: RunStatus::Running,
        }
    }

    pub fn ui(&self) -> &dyn Ui {
        &*self.ui
    }

    pub fn driver(&self) -> &dyn VmDriver {
        &*self.driver
    }

    /// The VM created during this run, if any.
    pub fn vm(&self) -> Option<&VmHandle> {
        self.vm.as_ref()
    }

    pub fn put_vm(&mut self, vm: VmHandle) {
        self.vm = Some(vm);
    }

    pub fn take_vm(&mut self) -> Option<VmHandle> {
        self.vm.take()
    }

    /// The error that made the run halt.
    pub fn error(&self) -> Option<&StepError> {
        self.error.as_ref()
    }

    pub fn put_error(&mut self, error: StepError) {
        self.error = Some(error);
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }
}

/// A unit of work executed by the [`Runner`].
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    /// Do the work. A `Halt` must be paired with [`RunContext::put_error`].
    async fn run(&self, ctx: &mut RunContext) -> StepAction;

    /// Undo the work if the run did not complete. Must tolerate `run` having
    /// halted early or never produced anything.
    async fn cleanup(&self, ctx: &mut RunContext);
}

/// Runs steps in order, observing cancellation only between steps.
pub struct Runner {
    steps: Vec<Box<dyn Step>>,
}

impl Runner {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// Run every step, then clean up the started ones in reverse order.
    ///
    /// Returns the terminal status, also readable from `ctx`.
    pub async fn run(&self, ctx: &mut RunContext, cancel: &watch::Receiver<bool>) -> RunStatus {
        let run_id = Uuid::new_v4();

        async {
            let mut started = 0;

            for step in &self.steps {
                if *cancel.borrow() {
                    ctx.status = RunStatus::Cancelled;
                    break;
                }

                started += 1;
                let action = step
                    .run(ctx)
                    .instrument(info_span!("step", name = step.name()))
                    .await;

                if action == StepAction::Halt {
                    ctx.status = RunStatus::Halted;
                    break;
                }
            }

            if ctx.status == RunStatus::Running {
                ctx.status = if *cancel.borrow() {
                    RunStatus::Cancelled
                } else {
                    RunStatus::Completed
                };
            }

            match ctx.status {
                RunStatus::Halted => match &ctx.error {
                    Some(e) => error!(error = %e, "build halted"),
                    None => error!("build halted without an error"),
                },
                RunStatus::Cancelled => warn!("build cancelled"),
                _ => info!("build completed"),
            }

            for step in self.steps[..started].iter().rev() {
                step.cleanup(ctx)
                    .instrument(info_span!("cleanup", name = step.name()))
                    .await;
            }

            ctx.status
        }
        .instrument(info_span!("run", %run_id))
        .await
    }
}
