//! The structs
//!
use std::collections::BTreeMap;
use chrono::{DateTime, Local};

/// The struct that is used to parse the JSON returned from /v2/stats/leader using serde.
///
/// The leader returns:
/// ```json
/// {
///   "leader": "924e2e83e93f2560",
///   "followers": {
///     "6e3bd23ae5f1eae0": {"latency": {"current": 0.001, "average": 0.002}, "counts": {"fail": 0, "success": 745}},
///     "a8266ecf031671f3": {"latency": {"current": 0.001, "average": 0.002}, "counts": {"fail": 0, "success": 735}}
///   }
/// }
/// ```
/// The contents of a follower entry are not used, only the number of followers.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct EtcdLeaderStats {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub leader: Option<String>,
    #[serde(default)]
    pub followers: Option<BTreeMap<String, serde_json::Value>>,
}

/// The view of a single node on the leadership of the cluster, at the time it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderSnapshot {
    pub timestamp: DateTime<Local>,
    pub is_leader: bool,
    /// only meaningful when is_leader is true.
    pub follower_count: usize,
}
