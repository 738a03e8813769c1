//! etcd_leader_monitor
//!
//! A health check for the etcd cluster of a BOSH deployment. The etcd VMs are looked up in the
//! BOSH director on every request, every etcd node is asked for its leader stats, and the cluster
//! is reported healthy when exactly one node is leader and all other nodes follow it.
extern crate serde;
extern crate serde_json;
#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod error;
pub mod utility;
pub mod bosh;
pub mod leader_stats;
pub mod etcd_certs;
pub mod cluster_health;
pub mod web_server;
