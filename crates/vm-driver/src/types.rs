use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Opaque hypervisor-side VM identifier (e.g. a vCenter `vm-42` moref).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VmId(pub String);

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a VM or template returned by a find or create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmHandle {
    pub id: VmId,
    pub name: String,
}

/// Firmware a VM boots with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Firmware {
    Bios,
    Efi,
}

impl Firmware {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bios => "bios",
            Self::Efi => "efi",
        }
    }
}

impl fmt::Display for Firmware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Firmware {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bios" => Ok(Self::Bios),
            "efi" => Ok(Self::Efi),
            other => Err(Error::InvalidRequest(format!("unsupported firmware: {other}"))),
        }
    }
}

/// One entry of an explicit disk list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiskConfig {
    /// Size in MB.
    pub disk_size: i64,
    pub disk_thin_provisioned: bool,
}

/// Everything the driver needs to materialize a VM: hardware settings and
/// placement in one flat value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateVmRequest {
    pub name: String,
    pub folder: String,
    pub cluster: String,
    pub host: String,
    pub resource_pool: String,
    pub datastore: String,

    pub guest_os: String,
    pub version: u32,
    /// `bios`, `efi`, or empty for the hypervisor default.
    pub firmware: String,

    pub disk_controller_type: String,
    /// Primary disk size in MB. Zero when `storage` is used instead.
    pub disk_size: i64,
    pub disk_thin_provisioned: bool,
    pub global_disk_type: String,
    pub storage: Vec<DiskConfig>,

    pub network: String,
    pub network_card: String,
    pub networks: Vec<String>,

    pub usb_controller: bool,
    pub annotation: String,
}
