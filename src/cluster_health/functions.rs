//! The impls and functions
//!
use std::{collections::BTreeMap, time::Instant};
use axum::http::StatusCode;
use log::*;
use rayon::prelude::*;
use crate::bosh::AllDeploymentVms;
use crate::cluster_health::{ClusterHealth, Verdict};
use crate::error::{MonitorError, Result};
use crate::leader_stats::{LeaderSnapshot, LeaderStatsSource};

impl Verdict {
    /// The snapshots only count towards the leaders, the expected number of followers comes from
    /// the number of nodes.
    pub fn from_snapshots<'a, I>(
        total_nodes: usize,
        snapshots: I,
    ) -> Verdict
    where
        I: IntoIterator<Item = &'a LeaderSnapshot>,
    {
        let leaders: Vec<&LeaderSnapshot> = snapshots.into_iter().filter(|snapshot| snapshot.is_leader).collect();
        match leaders.as_slice() {
            [] => Verdict::NotEnoughLeaders,
            [leader] if leader.follower_count + 1 == total_nodes => Verdict::Healthy,
            [_] => Verdict::WrongFollowerCount,
            leaders => Verdict::TooManyLeaders(leaders.len()),
        }
    }
    pub fn is_healthy(&self) -> bool {
        matches!(self, Verdict::Healthy)
    }
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Healthy => "Everything is healthy",
            Verdict::TooManyLeaders(_) => "Too many leaders",
            Verdict::NotEnoughLeaders => "Not enough leaders",
            Verdict::WrongFollowerCount => "Incorrect number of followers",
        }
    }
    /// Every verdict is a successful health check, only errors are not.
    pub fn encode(&self) -> (StatusCode, String) {
        (StatusCode::OK, format!(r#"{{"healthy": {}, "message": "{}"}}"#, self.is_healthy(), self.message()))
    }
}

/// Reads the leader stats of the first ip address of every VM, and judges the cluster.
///
/// Any node that cannot be read fails the whole evaluation.
pub fn evaluate<S: LeaderStatsSource>(
    vms: &AllDeploymentVms,
    source: &S,
    parallel: usize,
) -> Result<ClusterHealth>
{
    let addresses = vms.vms.iter()
        .map(|vm| vm.canonical_ip()
            .map(str::to_string)
            .ok_or_else(|| MonitorError::ParseError(format!("VM {}/{} has no ip address", vm.job_name, vm.index))))
        .collect::<Result<Vec<String>>>()?;

    info!("begin parallel leader stats read");
    let timer = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new().num_threads(parallel).build()?;
    let nodes: BTreeMap<String, LeaderSnapshot> = pool.install(|| {
        addresses.par_iter()
            .map(|address| source.leader_stats(address).map(|snapshot| (address.clone(), snapshot)))
            .collect::<Result<BTreeMap<String, LeaderSnapshot>>>()
    })?;

    info!("end parallel leader stats read {:?}", timer.elapsed());
    for (address, snapshot) in &nodes {
        debug!("{} leader: {} followers: {} read at: {}",
            address,
            snapshot.is_leader,
            snapshot.follower_count,
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        );
    }

    let verdict = Verdict::from_snapshots(vms.vms.len(), nodes.values());
    match verdict {
        Verdict::Healthy => info!("etcd cluster healthy, {} nodes", vms.vms.len()),
        Verdict::TooManyLeaders(leaders) => warn!("More than one etcd leader detected, number of leaders: {}", leaders),
        Verdict::NotEnoughLeaders => warn!("Not enough etcd leaders detected, number of nodes: {}", vms.vms.len()),
        Verdict::WrongFollowerCount => warn!("etcd leader does not have {} followers", vms.vms.len().saturating_sub(1)),
    }
    Ok(ClusterHealth { verdict, nodes })
}
