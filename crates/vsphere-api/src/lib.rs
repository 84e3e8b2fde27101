//! Typed Rust client for the vCenter automation REST API.
//!
//! Covers the subset needed for provisioning build VMs:
//! session login and VMs (list by name, create, power, delete).

mod types;

use std::sync::Arc;

use tokio::sync::OnceCell;

pub use reqwest::StatusCode;
pub use types::*;

const SESSION_HEADER: &str = "vmware-api-session-id";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vsphere api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vsphere api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the vCenter REST API.
///
/// A session is created lazily on the first call and reused afterwards.
#[derive(Clone)]
pub struct VsphereClient {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
    session: Arc<OnceCell<String>>,
}

impl VsphereClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        insecure: bool,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            http,
            session: Arc::new(OnceCell::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    /// Like `check` but also treats 404 as success (for delete idempotency).
    async fn check_allow_404(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    // ── Session ──────────────────────────────────────────────────────

    async fn create_session(&self) -> Result<String> {
        let resp = self
            .http
            .post(self.url("/session"))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        Self::check(resp, "create session")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    async fn session(&self) -> Result<&str> {
        let token = self
            .session
            .get_or_try_init(|| self.create_session())
            .await?;
        Ok(token.as_str())
    }

    // ── VMs ──────────────────────────────────────────────────────────

    /// List VMs and templates whose name matches exactly.
    pub async fn list_vms_by_name(&self, name: &str) -> Result<Vec<VmSummary>> {
        let resp = self
            .http
            .get(self.url("/vcenter/vm"))
            .header(SESSION_HEADER, self.session().await?)
            .query(&[("names", name)])
            .send()
            .await?;

        Self::check(resp, "list vms")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    /// Create a VM and return its identifier.
    pub async fn create_vm(&self, spec: &VmCreateSpec) -> Result<String> {
        let resp = self
            .http
            .post(self.url("/vcenter/vm"))
            .header(SESSION_HEADER, self.session().await?)
            .json(spec)
            .send()
            .await?;

        Self::check(resp, "create vm")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn get_power(&self, vm: &str) -> Result<PowerInfo> {
        let resp = self
            .http
            .get(self.url(&format!("/vcenter/vm/{vm}/power")))
            .header(SESSION_HEADER, self.session().await?)
            .send()
            .await?;

        Self::check(resp, "get power")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn stop_vm(&self, vm: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url(&format!("/vcenter/vm/{vm}/power")))
            .header(SESSION_HEADER, self.session().await?)
            .query(&[("action", "stop")])
            .send()
            .await?;

        Self::check(resp, "stop vm").await?;
        Ok(())
    }

    pub async fn delete_vm(&self, vm: &str) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/vcenter/vm/{vm}")))
            .header(SESSION_HEADER, self.session().await?)
            .send()
            .await?;

        Self::check_allow_404(resp, "delete vm").await?;
        Ok(())
    }
}
