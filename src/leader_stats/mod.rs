//! Module for reading `/v2/stats/leader` on the etcd nodes.
//!
//! The `/v2/stats/leader` endpoint reports the view of a node on the leadership of the cluster.
//! This returns:
//! - on the leader: the leader id, and a `followers` map with an entry for every follower.
//! - on the followers: an error document without a leader, such as
//!   `{"message":"not current leader"}`.
//!
//! The endpoint is available on the etcd client port, default 4001.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
