//! The structs
//!
use std::time::Duration;

/// Connection settings for the BOSH director.
#[derive(Debug, Clone)]
pub struct BoshConfig {
    pub uri: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub skip_ssl_validation: bool,
    /// use http instead of https.
    pub insecure_transport: bool,
    pub task_poll_interval: Duration,
    pub task_poll_attempts: u32,
    /// timeout of a single director request.
    pub request_timeout: Duration,
}

/// A single deployment, as listed by `/deployments`:
/// ```json
/// [
///   {
///     "name": "cf-12345",
///     "releases": [{"name": "cf", "version": "231"}],
///     "stemcells": [{"name": "bosh-aws-xen-hvm-ubuntu-trusty-go_agent", "version": "3215"}]
///   }
/// ]
/// ```
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct Deployment {
    pub name: String,
    #[serde(default)]
    pub releases: Vec<NameVersion>,
    #[serde(default)]
    pub stemcells: Vec<NameVersion>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct NameVersion {
    pub name: String,
    pub version: String,
}

/// The single deployment from `/deployments/<name>`, only the manifest is used.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct DeploymentManifest {
    #[serde(default)]
    pub manifest: String,
}

/// A VM from the `/deployments/<name>/vms?format=full` task result:
/// ```json
/// {"vm_cid":"11","ips":["30.30.30.30"],"agent_id":"11","job_name":"etcd_server-d284104a9345228c01e2","index":0}
/// ```
/// The first ip address is the one used to reach the VM.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct DeploymentVm {
    pub job_name: String,
    pub index: u32,
    #[serde(default)]
    pub vm_cid: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub ips: Vec<String>,
}

/// This struct is a wrapper for the DeploymentVm struct.
///
/// In this way, the struct can be used with functions in impl.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AllDeploymentVms {
    pub vms: Vec<DeploymentVm>,
}

/// The state of a director task, from `/tasks/<id>`:
/// ```json
/// {"id":1,"state":"queued","description":"retrieve vm-stats","timestamp":1460639781,"result":"","user":"admin"}
/// ```
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct TaskState {
    pub id: u64,
    pub state: String,
}
