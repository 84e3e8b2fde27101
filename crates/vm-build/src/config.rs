use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vm_driver::types::{DiskConfig, Firmware};

/// Guest OS identifier used when none is configured.
pub const DEFAULT_GUEST_OS_TYPE: &str = "otherGuest";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("'disk_size' and 'storage' are mutually exclusive")]
    DiskSizeAndStorage,

    #[error("either 'disk_size' or 'storage' is required")]
    DiskSizeOrStorageRequired,

    #[error("'disk_size' must be positive, got {0}")]
    InvalidDiskSize(i64),

    #[error("'storage[{index}].disk_size' must be positive, got {size}")]
    InvalidStorageDiskSize { index: usize, size: i64 },

    #[error("'firmware' must be 'bios' or 'efi', got '{0}'")]
    InvalidFirmware(String),

    #[error("'vm_name' is required")]
    VmNameRequired,

    #[error("'host' or 'cluster' is required")]
    HostOrClusterRequired,

    #[error("failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config:\n{}", join_errors(.0))]
    Invalid(Vec<ConfigError>),
}

fn join_errors(errs: &[ConfigError]) -> String {
    errs.iter()
        .map(|e| format!("  * {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hardware description of the VM to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateConfig {
    pub vm_version: u32,
    pub guest_os_type: String,
    pub firmware: String,

    pub disk_controller_type: String,
    /// Primary disk size in MB. Mutually exclusive with `storage`.
    pub disk_size: i64,
    pub disk_thin_provisioned: bool,

    pub network: String,
    pub network_card: String,
    pub usb_controller: bool,

    pub notes: String,

    /// Default disk type applied to every disk.
    pub disk_type: String,
    pub networks: Vec<String>,
    pub storage: Vec<DiskConfig>,
}

impl CreateConfig {
    /// Normalize the config and collect every validation problem.
    ///
    /// An empty `guest_os_type` is set to [`DEFAULT_GUEST_OS_TYPE`] even when
    /// other checks fail.
    pub fn prepare(&mut self) -> Vec<ConfigError> {
        let mut errs = Vec::new();

        if self.disk_size != 0 && !self.storage.is_empty() {
            errs.push(ConfigError::DiskSizeAndStorage);
        } else if self.disk_size == 0 && self.storage.is_empty() {
            errs.push(ConfigError::DiskSizeOrStorageRequired);
        }

        if self.disk_size < 0 {
            errs.push(ConfigError::InvalidDiskSize(self.disk_size));
        }
        for (index, disk) in self.storage.iter().enumerate() {
            if disk.disk_size <= 0 {
                errs.push(ConfigError::InvalidStorageDiskSize {
                    index,
                    size: disk.disk_size,
                });
            }
        }

        if self.guest_os_type.is_empty() {
            self.guest_os_type = DEFAULT_GUEST_OS_TYPE.to_string();
        }

        if !self.firmware.is_empty() && self.firmware.parse::<Firmware>().is_err() {
            errs.push(ConfigError::InvalidFirmware(self.firmware.clone()));
        }

        errs
    }
}

/// Where the VM lives. Values are forwarded to the driver untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub vm_name: String,
    pub folder: String,
    pub cluster: String,
    pub host: String,
    pub resource_pool: String,
    pub datastore: String,
}

impl LocationConfig {
    pub fn prepare(&self) -> Vec<ConfigError> {
        let mut errs = Vec::new();

        if self.vm_name.is_empty() {
            errs.push(ConfigError::VmNameRequired);
        }
        if self.cluster.is_empty() && self.host.is_empty() {
            errs.push(ConfigError::HostOrClusterRequired);
        }

        errs
    }
}

/// Complete build configuration as read from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(flatten)]
    pub create: CreateConfig,
    #[serde(flatten)]
    pub location: LocationConfig,
}

impl BuildConfig {
    /// Read, decode, normalize and validate a build config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut errs = config.create.prepare();
        errs.extend(config.location.prepare());
        if !errs.is_empty() {
            return Err(ConfigError::Invalid(errs));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn disk(size: i64) -> DiskConfig {
        DiskConfig {
            disk_size: size,
            disk_thin_provisioned: false,
        }
    }

    #[test]
    fn disk_size_and_storage_are_mutually_exclusive() {
        let mut config = CreateConfig {
            disk_size: 1024,
            storage: vec![disk(2048)],
            ..Default::default()
        };

        let errs = config.prepare();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], ConfigError::DiskSizeAndStorage));
        assert!(errs[0].to_string().contains("mutually exclusive"));
    }

    #[test]
    fn disk_size_or_storage_is_required() {
        let mut config = CreateConfig::default();

        let errs = config.prepare();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], ConfigError::DiskSizeOrStorageRequired));
        assert!(errs[0].to_string().contains("is required"));
    }

    #[test]
    fn exactly_one_disk_source_is_accepted() {
        let mut sized = CreateConfig {
            disk_size: 1024,
            ..Default::default()
        };
        assert!(sized.prepare().is_empty());

        let mut listed = CreateConfig {
            storage: vec![disk(1024), disk(4096)],
            ..Default::default()
        };
        assert!(listed.prepare().is_empty());
    }

    #[test]
    fn empty_guest_os_defaults_even_with_errors() {
        let mut config = CreateConfig {
            firmware: "uefi".into(),
            ..Default::default()
        };

        let errs = config.prepare();
        assert_eq!(errs.len(), 2);
        assert_eq!(config.guest_os_type, DEFAULT_GUEST_OS_TYPE);
    }

    #[test]
    fn configured_guest_os_is_kept() {
        let mut config = CreateConfig {
            disk_size: 1024,
            guest_os_type: "ubuntu64Guest".into(),
            ..Default::default()
        };

        assert!(config.prepare().is_empty());
        assert_eq!(config.guest_os_type, "ubuntu64Guest");
    }

    #[test]
    fn firmware_accepts_only_bios_and_efi() {
        for firmware in ["", "bios", "efi"] {
            let mut config = CreateConfig {
                disk_size: 1024,
                firmware: firmware.into(),
                ..Default::default()
            };
            assert!(config.prepare().is_empty(), "{firmware:?} should be accepted");
        }

        for firmware in ["uefi", "BIOS", "efi-secure"] {
            let mut config = CreateConfig {
                disk_size: 1024,
                firmware: firmware.into(),
                ..Default::default()
            };
            let errs = config.prepare();
            assert_eq!(errs.len(), 1, "{firmware:?} should be rejected once");
            assert!(matches!(&errs[0], ConfigError::InvalidFirmware(f) if f == firmware));
            assert!(errs[0].to_string().contains("'bios' or 'efi'"));
        }
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = CreateConfig {
            disk_size: 1024,
            storage: vec![disk(1024)],
            firmware: "coreboot".into(),
            ..Default::default()
        };

        let errs = config.prepare();
        assert!(matches!(errs[0], ConfigError::DiskSizeAndStorage));
        assert!(matches!(errs[1], ConfigError::InvalidFirmware(_)));
    }

    #[test]
    fn location_requires_name_and_host_or_cluster() {
        let errs = LocationConfig::default().prepare();
        assert!(matches!(errs[..], [ConfigError::VmNameRequired, ConfigError::HostOrClusterRequired]));

        let location = LocationConfig {
            vm_name: "web01".into(),
            host: "host-21".into(),
            ..Default::default()
        };
        assert!(location.prepare().is_empty());
    }

    #[test]
    fn load_reads_flat_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "vm_name": "web01",
                "cluster": "domain-c8",
                "datastore": "datastore-11",
                "vm_version": 13,
                "firmware": "efi",
                "storage": [{{ "disk_size": 4096, "disk_thin_provisioned": true }}],
                "networks": ["network-12"]
            }}"#
        )
        .unwrap();

        let config = BuildConfig::load(file.path()).unwrap();
        assert_eq!(config.location.vm_name, "web01");
        assert_eq!(config.location.cluster, "domain-c8");
        assert_eq!(config.create.vm_version, 13);
        assert_eq!(config.create.guest_os_type, DEFAULT_GUEST_OS_TYPE);
        assert_eq!(config.create.storage[0].disk_size, 4096);
        assert!(config.create.storage[0].disk_thin_provisioned);
    }

    #[test]
    fn load_reports_every_problem() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "firmware": "uefi" }}"#).unwrap();

        let err = BuildConfig::load(file.path()).unwrap_err();
        let ConfigError::Invalid(errs) = &err else {
            panic!("expected invalid config, got {err}");
        };
        assert_eq!(errs.len(), 4);

        let message = err.to_string();
        assert!(message.contains("'disk_size' or 'storage'"));
        assert!(message.contains("'firmware'"));
        assert!(message.contains("'vm_name'"));
        assert!(message.contains("'host' or 'cluster'"));
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = BuildConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn non_positive_disk_sizes_are_rejected() {
        let mut listed = CreateConfig {
            storage: vec![disk(1024), disk(0), disk(-5)],
            ..Default::default()
        };
        let errs = listed.prepare();
        assert_eq!(errs.len(), 2);
        assert!(matches!(errs[0], ConfigError::InvalidStorageDiskSize { index: 1, size: 0 }));
        assert!(matches!(errs[1], ConfigError::InvalidStorageDiskSize { index: 2, size: -5 }));
        assert!(errs[0].to_string().contains("'storage[1].disk_size'"));

        let mut sized = CreateConfig {
            disk_size: -1,
            ..Default::default()
        };
        let errs = sized.prepare();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], ConfigError::InvalidDiskSize(-1)));
    }

    #[test]
    fn load_rejects_unknown_disk_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "vm_name": "web01", "cluster": "domain-c8", "storage": [{{ "size": 4096 }}] }}"#
        )
        .unwrap();

        let err = BuildConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("unknown field `size`"));
    }

    #[test]
    fn load_rejects_empty_disk_entry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "vm_name": "web01", "cluster": "domain-c8", "storage": [{{}}] }}"#
        )
        .unwrap();

        let err = BuildConfig::load(file.path()).unwrap_err();
        let ConfigError::Invalid(errs) = &err else {
            panic!("expected invalid config, got {err}");
        };
        assert!(matches!(errs[..], [ConfigError::InvalidStorageDiskSize { index: 0, size: 0 }]));
    }
}
