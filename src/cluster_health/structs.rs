//! The structs
//!
use std::collections::BTreeMap;
use crate::leader_stats::LeaderSnapshot;

/// The health of the cluster as a whole.
///
/// A leader count other than one always wins over a wrong follower count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    TooManyLeaders(usize),
    NotEnoughLeaders,
    WrongFollowerCount,
}

/// The verdict, and the leader snapshot of every node it is based on, by ip address.
#[derive(Debug, Clone)]
pub struct ClusterHealth {
    pub verdict: Verdict,
    pub nodes: BTreeMap<String, LeaderSnapshot>,
}
