use serde::{Deserialize, Serialize};

// ── VM create types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct VmCreateSpec {
    pub name: String,
    #[serde(rename = "guest_OS")]
    pub guest_os: String,
    pub placement: PlacementSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot: Option<BootCreateSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<DiskCreateSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nics: Vec<EthernetCreateSpec>,
}

/// Where the VM is placed. Values are managed-object identifiers
/// (e.g. `group-v3`, `domain-c8`), not display names.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlacementSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_pool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datastore: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BootCreateSpec {
    #[serde(rename = "type")]
    pub boot_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskCreateSpec {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub bus: Option<String>,
    pub new_vmdk: DiskVmdkCreateSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskVmdkCreateSpec {
    /// Capacity in bytes.
    pub capacity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EthernetCreateSpec {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub adapter_type: Option<String>,
    pub backing: EthernetBackingSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct EthernetBackingSpec {
    #[serde(rename = "type")]
    pub backing_type: String,
    pub network: String,
}

// ── VM query types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct VmSummary {
    pub vm: String,
    pub name: String,
    pub power_state: PowerState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PowerInfo {
    pub state: PowerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
}
