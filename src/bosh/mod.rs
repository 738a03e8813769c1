//! Module for reading the deployments and VMs from the BOSH director.
//!
//! The director endpoints used are:
//! - `/deployments`: all deployments, as a JSON array.
//! - `/deployments/<name>`: a single deployment, with the manifest as a YAML string.
//! - `/deployments/<name>/vms?format=full`: starts a task that collects the VM details, and
//!   redirects to the task.
//! - `/tasks/<id>`: the state of a task.
//! - `/tasks/<id>/output?type=result`: the result of the VMs task, one JSON document per line.
//!
//! All requests use basic authentication.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
