use async_trait::async_trait;
use tracing::{info, warn};
use vsphere_api::{
    BootCreateSpec, DiskCreateSpec, DiskVmdkCreateSpec, EthernetBackingSpec, EthernetCreateSpec,
    PlacementSpec, PowerState, StatusCode, VmCreateSpec, VsphereClient,
};

use crate::types::{CreateVmRequest, Firmware, VmHandle, VmId};
use crate::{Error, Result, VmDriver};

const MB: i64 = 1024 * 1024;

/// vCenter driver backed by `vsphere_api::VsphereClient`.
///
/// All configuration is loaded from environment variables via `from_env()`.
pub struct VsphereDriver {
    client: VsphereClient,
}

impl VsphereDriver {
    pub fn new(client: VsphereClient) -> Self {
        Self { client }
    }

    /// Create from env vars:
    ///
    /// - `VSPHERE_URL` (required, e.g. `https://vcenter.example.com`)
    /// - `VSPHERE_USERNAME` (required)
    /// - `VSPHERE_PASSWORD` (required)
    /// - `VSPHERE_INSECURE` (optional, `true`/`1` skips TLS verification)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let url = std::env::var("VSPHERE_URL")
            .map_err(|_| Error::MissingEnv("VSPHERE_URL".into()))?;
        let username = std::env::var("VSPHERE_USERNAME")
            .map_err(|_| Error::MissingEnv("VSPHERE_USERNAME".into()))?;
        let password = std::env::var("VSPHERE_PASSWORD")
            .map_err(|_| Error::MissingEnv("VSPHERE_PASSWORD".into()))?;
        let insecure = std::env::var("VSPHERE_INSECURE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self::new(VsphereClient::new(url, username, password, insecure)?))
    }

    pub fn url(&self) -> &str {
        self.client.base_url()
    }

    /// Map a vim guest identifier (`ubuntu64Guest`) to the REST enum
    /// (`UBUNTU_64`). Values without lowercase letters pass through.
    fn guest_os(id: &str) -> String {
        if !id.chars().any(|c| c.is_ascii_lowercase()) {
            return id.to_string();
        }

        let base = match id.strip_suffix("Guest") {
            Some(base) if base != "other" => base,
            _ => id,
        };

        let mut out = String::with_capacity(base.len() + 4);
        let mut prev: Option<char> = None;
        for c in base.chars() {
            if let Some(p) = prev {
                let boundary = (c.is_ascii_uppercase()
                    && (p.is_ascii_lowercase() || p.is_ascii_digit()))
                    || (c.is_ascii_digit() && p.is_ascii_alphabetic());
                if boundary {
                    out.push('_');
                }
            }
            out.push(c.to_ascii_uppercase());
            prev = Some(c);
        }
        out
    }

    fn boot(firmware: &str) -> Result<Option<BootCreateSpec>> {
        if firmware.is_empty() {
            return Ok(None);
        }
        let boot_type = match firmware.parse::<Firmware>()? {
            Firmware::Bios => "BIOS",
            Firmware::Efi => "EFI",
        };
        Ok(Some(BootCreateSpec {
            boot_type: boot_type.into(),
        }))
    }

    /// Map a controller type to the disk bus it implies.
    fn disk_bus(controller: &str) -> Option<String> {
        match controller {
            "" => None,
            "nvme" => Some("NVME".into()),
            "sata" => Some("SATA".into()),
            "ide" => Some("IDE".into()),
            // pvscsi, lsilogic, lsilogic-sas, buslogic, scsi
            _ => Some("SCSI".into()),
        }
    }

    fn adapter_type(card: &str) -> Option<String> {
        if card.is_empty() {
            None
        } else {
            Some(card.to_ascii_uppercase())
        }
    }

    /// `dvportgroup-*` ids are distributed port groups, anything else is a
    /// standard port group.
    fn backing_type(network: &str) -> &'static str {
        if network.starts_with("dvportgroup-") {
            "DISTRIBUTED_PORTGROUP"
        } else {
            "STANDARD_PORTGROUP"
        }
    }

    fn capacity(size_mb: i64) -> Result<i64> {
        if size_mb <= 0 {
            return Err(Error::InvalidRequest(format!("disk size must be positive, got {size_mb}")));
        }
        size_mb
            .checked_mul(MB)
            .ok_or_else(|| Error::InvalidRequest(format!("disk size too large: {size_mb} MB")))
    }

    fn non_empty(value: &str) -> Option<String> {
        (!value.is_empty()).then(|| value.to_string())
    }

    fn create_spec(req: &CreateVmRequest) -> Result<VmCreateSpec> {
        if req.name.is_empty() {
            return Err(Error::InvalidRequest("vm name is empty".into()));
        }

        if !req.annotation.is_empty() {
            warn!(vm = %req.name, "vsphere: annotation is not supported on create, ignoring");
        }
        if req.usb_controller {
            warn!(vm = %req.name, "vsphere: usb controller is not supported on create, ignoring");
        }
        if !req.global_disk_type.is_empty() {
            warn!(vm = %req.name, disk_type = %req.global_disk_type, "vsphere: disk type is not supported on create, ignoring");
        }
        if req.disk_thin_provisioned || req.storage.iter().any(|d| d.disk_thin_provisioned) {
            warn!(vm = %req.name, "vsphere: thin provisioning follows the datastore default");
        }

        let bus = Self::disk_bus(&req.disk_controller_type);
        let sizes: Vec<i64> = if req.storage.is_empty() {
            vec![req.disk_size]
        } else {
            req.storage.iter().map(|d| d.disk_size).collect()
        };
        let disks = sizes
            .into_iter()
            .map(|size| -> Result<DiskCreateSpec> {
                Ok(DiskCreateSpec {
                    bus: bus.clone(),
                    new_vmdk: DiskVmdkCreateSpec {
                        capacity: Self::capacity(size)?,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let adapter_type = Self::adapter_type(&req.network_card);
        let nics = std::iter::once(&req.network)
            .chain(req.networks.iter())
            .filter(|n| !n.is_empty())
            .map(|network| EthernetCreateSpec {
                adapter_type: adapter_type.clone(),
                backing: EthernetBackingSpec {
                    backing_type: Self::backing_type(network).into(),
                    network: network.clone(),
                },
            })
            .collect();

        Ok(VmCreateSpec {
            name: req.name.clone(),
            guest_os: Self::guest_os(&req.guest_os),
            placement: PlacementSpec {
                folder: Self::non_empty(&req.folder),
                cluster: Self::non_empty(&req.cluster),
                host: Self::non_empty(&req.host),
                resource_pool: Self::non_empty(&req.resource_pool),
                datastore: Self::non_empty(&req.datastore),
            },
            hardware_version: (req.version > 0).then(|| format!("VMX_{:02}", req.version)),
            boot: Self::boot(&req.firmware)?,
            disks,
            nics,
        })
    }
}

#[async_trait]
impl VmDriver for VsphereDriver {
    async fn find_vm(&self, name: &str) -> Result<Option<VmHandle>> {
        let vms = self.client.list_vms_by_name(name).await?;

        Ok(vms.into_iter().find(|vm| vm.name == name).map(|vm| VmHandle {
            id: VmId(vm.vm),
            name: vm.name,
        }))
    }

    async fn create_vm(&self, req: &CreateVmRequest) -> Result<VmHandle> {
        let spec = Self::create_spec(req)?;
        let id = self.client.create_vm(&spec).await?;

        info!(vm_id = %id, vm = %req.name, "vsphere: vm created");

        Ok(VmHandle {
            id: VmId(id),
            name: req.name.clone(),
        })
    }

    async fn destroy_vm(&self, vm: &VmHandle) -> Result<()> {
        match self.client.get_power(&vm.id.0).await {
            Ok(power) if power.state == PowerState::PoweredOn => {
                self.client.stop_vm(&vm.id.0).await?;
                info!(vm_id = %vm.id, "vsphere: vm powered off");
            }
            Ok(_) => {}
            Err(vsphere_api::Error::Api { status, .. }) if status == StatusCode::NOT_FOUND => {
                warn!(vm_id = %vm.id, "vsphere: vm already destroyed");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        self.client.delete_vm(&vm.id.0).await?;

        info!(vm_id = %vm.id, vm = %vm.name, "vsphere: vm destroyed");
        Ok(())
    }
}
