//! The impls and functions.
//!
use chrono::Local;
use reqwest::blocking::Client;
use crate::config::Opts;
use crate::error::{MonitorError, Result};
use crate::etcd_certs::{self, EtcdCerts};
use crate::leader_stats::{EtcdLeaderStats, LeaderSnapshot};
use crate::utility;

/// Anything that can tell how a node sees the leadership of the cluster.
pub trait LeaderStatsSource: Sync {
    fn leader_stats(&self, address: &str) -> Result<LeaderSnapshot>;
}

impl LeaderSnapshot {
    pub fn new(is_leader: bool, follower_count: usize) -> Self {
        LeaderSnapshot {
            timestamp: Local::now(),
            is_leader,
            follower_count,
        }
    }
}

impl EtcdLeaderStats {
    /// A node that names a leader in its stats is the leader; followers do not return the stats.
    pub fn snapshot(&self) -> LeaderSnapshot {
        match self.leader.as_deref() {
            Some(leader) if !leader.is_empty() => {
                LeaderSnapshot::new(true, self.followers.as_ref().map(|followers| followers.len()).unwrap_or_default())
            }
            _ => LeaderSnapshot::new(false, 0),
        }
    }
}

/// Reads the leader stats of etcd nodes with one http client.
///
/// The client is created for a single health check, either plain or with the mutual TLS
/// material from the deployment manifest.
pub struct EtcdClient {
    http: Client,
    protocol: &'static str,
    port: u16,
}

impl EtcdClient {
    pub fn new(
        http: Client,
        protocol: &'static str,
        port: u16,
    ) -> Self
    {
        EtcdClient { http, protocol, port }
    }
    pub fn from_opts(
        opts: &Opts,
        certs: Option<EtcdCerts>,
    ) -> Result<Self>
    {
        let http = match certs {
            Some(certs) => etcd_certs::build_client(&certs, opts.skip_ssl_verification, opts.probe_timeout())?,
            None => Client::builder().timeout(opts.probe_timeout()).build()?,
        };
        Ok(EtcdClient::new(http, opts.etcd_protocol(), opts.etcd_port))
    }
    fn read_http(
        &self,
        address: &str,
    ) -> Result<EtcdLeaderStats>
    {
        let url = format!("{}://{}:{}/v2/stats/leader", self.protocol, address, self.port);
        let data_from_http = utility::http_get(self.http.get(&url), &url)?;
        parse_leader_stats(&data_from_http, address)
    }
}

impl LeaderStatsSource for EtcdClient {
    fn leader_stats(&self, address: &str) -> Result<LeaderSnapshot> {
        Ok(self.read_http(address)?.snapshot())
    }
}

// This function parses the http output.
// This is a separate function in order to allow tests to use it.
pub fn parse_leader_stats(
    http_data: &str,
    address: &str,
) -> Result<EtcdLeaderStats>
{
    serde_json::from_str(http_data)
        .map_err(|e| MonitorError::ParseError(format!("({}) could not parse /v2/stats/leader json data, error: {}", address, e)))
}
