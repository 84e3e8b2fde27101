use async_trait::async_trait;
use tracing::info;
use vm_driver::types::CreateVmRequest;

use crate::config::{CreateConfig, LocationConfig};
use crate::error::StepError;
use crate::pipeline::{RunContext, Step, StepAction};

/// Creates the build VM, replacing an existing one of the same name when
/// `force` is set, and destroys it again if the run is cancelled or halts.
pub struct StepCreateVm {
    pub config: CreateConfig,
    pub location: LocationConfig,
    pub force: bool,
}

impl StepCreateVm {
    pub fn new(config: CreateConfig, location: LocationConfig, force: bool) -> Self {
        Self {
            config,
            location,
            force,
        }
    }

    fn request(&self) -> CreateVmRequest {
        let (config, location) = (&self.config, &self.location);

        CreateVmRequest {
            name: location.vm_name.clone(),
            folder: location.folder.clone(),
            cluster: location.cluster.clone(),
            host: location.host.clone(),
            resource_pool: location.resource_pool.clone(),
            datastore: location.datastore.clone(),

            guest_os: config.guest_os_type.clone(),
            version: config.vm_version,
            firmware: config.firmware.clone(),

            disk_controller_type: config.disk_controller_type.clone(),
            disk_size: config.disk_size,
            disk_thin_provisioned: config.disk_thin_provisioned,
            global_disk_type: config.disk_type.clone(),
            storage: config.storage.clone(),

            network: config.network.clone(),
            network_card: config.network_card.clone(),
            networks: config.networks.clone(),

            usb_controller: config.usb_controller,
            annotation: config.notes.clone(),
        }
    }
}

#[async_trait]
impl Step for StepCreateVm {
    fn name(&self) -> &'static str {
        "create-vm"
    }

    async fn run(&self, ctx: &mut RunContext) -> StepAction {
        let name = &self.location.vm_name;

        let existing = match ctx.driver().find_vm(name).await {
            Ok(existing) => existing,
            Err(source) => {
                ctx.put_error(StepError::Lookup {
                    name: name.clone(),
                    source,
                });
                return StepAction::Halt;
            }
        };

        if let Some(vm) = existing {
            if !self.force {
                ctx.put_error(StepError::AlreadyExists { name: name.clone() });
                return StepAction::Halt;
            }

            ctx.ui().say(&format!(
                "the vm/template {name} already exists, but deleting it due to --force flag"
            ));
            if let Err(source) = ctx.driver().destroy_vm(&vm).await {
                ctx.put_error(StepError::Destroy {
                    name: name.clone(),
                    source,
                });
                return StepAction::Halt;
            }
            info!(vm = %name, vm_id = %vm.id, "replaced vm destroyed");
        }

        ctx.ui().say("Creating VM...");
        match ctx.driver().create_vm(&self.request()).await {
            Ok(vm) => {
                info!(vm = %name, vm_id = %vm.id, "vm created");
                ctx.put_vm(vm);
                StepAction::Continue
            }
            Err(source) => {
                ctx.put_error(StepError::Create(source));
                StepAction::Halt
            }
        }
    }

    async fn cleanup(&self, ctx: &mut RunContext) {
        if !ctx.status().is_aborted() {
            return;
        }

        let Some(vm) = ctx.take_vm() else {
            return;
        };

        ctx.ui().say("Destroying VM...");
        if let Err(e) = ctx.driver().destroy_vm(&vm).await {
            ctx.ui().error(&e.to_string());
        }
    }
}
