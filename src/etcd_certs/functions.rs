//! The impls and functions
//!
use std::time::Duration;
use log::*;
use regex::Regex;
use reqwest::{blocking::Client, Certificate, Identity};
use crate::error::{MonitorError, Result};
use crate::etcd_certs::{EtcdCerts, Manifest};

type CertLocator = fn(&Manifest, &Regex) -> Option<EtcdCerts>;

/// The places in a manifest the etcd properties are looked up, in order.
/// The first place that returns certificates is used.
const CERT_LOCATIONS: [(&str, CertLocator); 3] = [
    ("instance_groups.jobs.properties.etcd", instance_group_job_certs),
    ("instance_groups.properties.etcd", instance_group_certs),
    ("jobs.properties.etcd", legacy_job_certs),
];

impl EtcdCerts {
    pub fn is_blank(&self) -> bool {
        self.ca_cert.is_empty() && self.client_cert.is_empty() && self.client_key.is_empty()
    }
    pub fn validate(
        &self,
        skip_verification: bool,
    ) -> Result<()>
    {
        if self.client_key.is_empty() {
            return Err(MonitorError::ClientKeyBlank);
        }
        if self.client_cert.is_empty() {
            return Err(MonitorError::ClientCertBlank);
        }
        if !skip_verification && self.ca_cert.is_empty() {
            return Err(MonitorError::CaCertBlank);
        }
        Ok(())
    }
}

// a job inside a matching instance group, skipping jobs without certificates.
fn instance_group_job_certs(
    manifest: &Manifest,
    job_name_filter: &Regex,
) -> Option<EtcdCerts>
{
    manifest.instance_groups.iter()
        .filter(|group| job_name_filter.is_match(&group.name))
        .flat_map(|group| group.jobs.iter())
        .filter_map(|job| job.properties.as_ref().and_then(|properties| properties.etcd.clone()))
        .find(|certs| !certs.is_blank())
}

// the properties of a matching instance group, even if they are empty.
fn instance_group_certs(
    manifest: &Manifest,
    job_name_filter: &Regex,
) -> Option<EtcdCerts>
{
    manifest.instance_groups.iter()
        .filter(|group| job_name_filter.is_match(&group.name))
        .find_map(|group| group.properties.as_ref().and_then(|properties| properties.etcd.clone()))
}

// legacy manifests: the first matching job wins, whatever it carries.
fn legacy_job_certs(
    manifest: &Manifest,
    job_name_filter: &Regex,
) -> Option<EtcdCerts>
{
    manifest.jobs.iter()
        .find(|job| job_name_filter.is_match(&job.name))
        .map(|job| job.properties.as_ref().and_then(|properties| properties.etcd.clone()).unwrap_or_default())
}

/// Finds the etcd certificates in a manifest. No matching job results in blank certificates.
pub fn find_certs(
    manifest_text: &str,
    job_name_filter: &Regex,
) -> Result<EtcdCerts>
{
    let manifest: Manifest = serde_yaml::from_str(manifest_text)?;
    for (location, locator) in CERT_LOCATIONS {
        if let Some(certs) = locator(&manifest, job_name_filter) {
            debug!("etcd certificates found at: {}", location);
            return Ok(certs);
        }
    }
    warn!("no etcd certificates found for job: {}", job_name_filter);
    Ok(EtcdCerts::default())
}

/// Reads and checks the etcd certificates from the manifest.
pub fn load_certs(
    manifest_text: &str,
    job_name_filter: &Regex,
    skip_verification: bool,
) -> Result<EtcdCerts>
{
    let certs = find_certs(manifest_text, job_name_filter)?;
    certs.validate(skip_verification)?;
    Ok(certs)
}

/// Builds a new http client that uses the certificates for mutual TLS.
///
/// The CA certificates replace the built in roots, unless verification is skipped.
pub fn build_client(
    certs: &EtcdCerts,
    skip_verification: bool,
    timeout: Duration,
) -> Result<Client>
{
    certs.validate(skip_verification)?;

    let mut builder = Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .danger_accept_invalid_certs(skip_verification);

    if !skip_verification {
        let ca_certs = Certificate::from_pem_bundle(certs.ca_cert.as_bytes())
            .map_err(|e| MonitorError::InvalidCaCert(e.to_string()))?;
        if ca_certs.is_empty() {
            return Err(MonitorError::InvalidCaCert("no certificates found in ca_cert".to_string()));
        }
        builder = builder.tls_built_in_root_certs(false);
        for ca_cert in ca_certs {
            builder = builder.add_root_certificate(ca_cert);
        }
    }

    let identity = Identity::from_pem(format!("{}\n{}", certs.client_cert, certs.client_key).as_bytes())
        .map_err(MonitorError::InvalidKeyPair)?;

    builder.identity(identity)
        .build()
        .map_err(MonitorError::InvalidKeyPair)
}
