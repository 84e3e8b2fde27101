pub mod types;
pub mod vsphere;

use std::sync::Arc;

use async_trait::async_trait;
use types::{CreateVmRequest, VmHandle};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vsphere driver error: {0}")]
    Vsphere(#[from] vsphere_api::Error),

    #[error("invalid create request: {0}")]
    InvalidRequest(String),

    #[error("missing env var: {0}")]
    MissingEnv(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Hypervisor control-plane operations needed to provision a build VM.
///
/// Every call is a remote operation that completes (or fails) before it
/// returns; callers never issue them concurrently for the same VM.
#[async_trait]
pub trait VmDriver: Send + Sync + 'static {
    /// Look up a VM or template by name.
    ///
    /// `Ok(None)` means no such VM exists. `Err` is reserved for transport,
    /// permission and other failures where existence is unknown.
    async fn find_vm(&self, name: &str) -> Result<Option<VmHandle>>;

    /// Create a VM and return a handle to it.
    async fn create_vm(&self, req: &CreateVmRequest) -> Result<VmHandle>;

    /// Destroy a VM permanently.
    async fn destroy_vm(&self, vm: &VmHandle) -> Result<()>;
}

/// Build the driver configured through environment variables.
pub fn build_driver() -> Result<Arc<dyn VmDriver>> {
    dotenvy::dotenv().ok();

    let driver = vsphere::VsphereDriver::from_env()?;
    tracing::info!(url = driver.url(), "registered vSphere driver");
    Ok(Arc::new(driver))
}
