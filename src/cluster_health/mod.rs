//! Module for judging the health of the etcd cluster.
//!
//! Every etcd node of the deployment is asked for its leader stats. A healthy cluster has exactly
//! one node that considers itself the leader, and that leader is followed by all other nodes.
//! The result is reported as a fixed JSON document:
//! ```json
//! {"healthy": true, "message": "Everything is healthy"}
//! ```
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
