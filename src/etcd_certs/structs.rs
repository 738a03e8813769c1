//! The structs
//!

/// The etcd TLS material. Every field is PEM text, or empty when not set.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct EtcdCerts {
    #[serde(default)]
    pub ca_cert: String,
    #[serde(default)]
    pub client_cert: String,
    #[serde(default)]
    pub client_key: String,
}

/// The parts of a BOSH manifest that can carry the etcd properties.
/// Everything else in the manifest is ignored.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Manifest {
    #[serde(default)]
    pub instance_groups: Vec<InstanceGroup>,
    /// only present in legacy manifests.
    #[serde(default)]
    pub jobs: Vec<ManifestJob>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InstanceGroup {
    pub name: String,
    #[serde(default)]
    pub jobs: Vec<ManifestJob>,
    #[serde(default)]
    pub properties: Option<JobProperties>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ManifestJob {
    pub name: String,
    #[serde(default)]
    pub properties: Option<JobProperties>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct JobProperties {
    #[serde(default)]
    pub etcd: Option<EtcdCerts>,
}
