//! Utilities
use std::time::Instant;
use log::*;
use regex::Regex;
use reqwest::blocking::RequestBuilder;
use crate::error::{MonitorError, Result};

/// Performs a GET and returns the body, whatever the http status.
///
/// A non success status is only logged: etcd followers answer the leader stats request with a
/// JSON error document, which still has to be parsed.
pub fn http_get(
    request: RequestBuilder,
    url: &str,
) -> Result<String>
{
    let data_from_web_request = request.send()?;
    if ! &data_from_web_request.status().is_success()
    {
        debug!("Non success response: {} = {}", url, &data_from_web_request.status());
    }
    else
    {
        debug!("Success response: {} = {}", url, &data_from_web_request.status());
    }
    Ok(data_from_web_request.text()?)
}

/// Compiles a name pattern that must match from the start of the name.
pub fn set_regex(
    pattern: &str,
) -> Result<Regex>
{
    Regex::new(&format!("^{}", pattern))
        .map_err(|source| MonitorError::InvalidPattern { pattern: pattern.to_string(), source })
}

/// Fails once the deadline of the health check has passed.
pub fn check_deadline(
    deadline: Instant,
) -> Result<()>
{
    if Instant::now() >= deadline {
        Err(MonitorError::DeadlineExceeded)
    } else {
        Ok(())
    }
}
