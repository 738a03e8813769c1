//! Command line and environment options.
//!
//! Every option can be set as an argument or as an environment variable, and a `.env` file in the
//! working directory is read before parsing (see main.rs). The options are parsed once at startup
//! and shared read-only with every request.
use std::time::Duration;
use clap::{builder::BoolishValueParser, ArgAction, Parser};
use crate::bosh::BoshConfig;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Reports if the etcd cluster of a BOSH deployment has exactly one leader with all other nodes following it")]
pub struct Opts {
    /// port the health check endpoint listens on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
    /// hostname or ip address of the BOSH director
    #[arg(long, env = "BOSH_URI")]
    pub bosh_uri: String,
    /// port of the BOSH director
    #[arg(long, env = "BOSH_PORT", default_value_t = 25555)]
    pub bosh_port: u16,
    #[arg(long, env = "BOSH_USERNAME", default_value = "")]
    pub bosh_username: String,
    #[arg(long, env = "BOSH_PASSWORD", default_value = "", hide_env_values = true)]
    pub bosh_password: String,
    /// do not validate the certificate of the BOSH director
    #[arg(long, env = "BOSH_SKIP_SSL_VALIDATION", default_value = "true", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub bosh_skip_ssl_validation: bool,
    /// talk plain http to the BOSH director
    #[arg(long, env = "BOSH_INSECURE_TRANSPORT", default_value = "false", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub bosh_insecure_transport: bool,
    /// deployment name prefix (regex, anchored at the start of the name)
    #[arg(long, env = "CF_DEPLOYMENT_NAME", default_value = "cf-")]
    pub cf_deployment_name: String,
    /// etcd job name prefix (regex, anchored at the start of the name)
    #[arg(long, env = "ETCD_JOB_NAME", default_value = "etcd_server")]
    pub etcd_job_name: String,
    /// use mutual TLS towards etcd, with the certificates from the deployment manifest
    #[arg(long, env = "SSL_ENABLED", default_value = "false", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub ssl_enabled: bool,
    /// do not verify the etcd server certificates when ssl is enabled
    #[arg(long, env = "SKIP_SSL_VERIFICATION", default_value = "false", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub skip_ssl_verification: bool,
    /// port of the etcd client endpoint
    #[arg(long, env = "ETCD_PORT", default_value_t = 4001)]
    pub etcd_port: u16,
    /// number of etcd nodes queried at the same time
    #[arg(long, env = "PARALLEL", default_value_t = 3)]
    pub parallel: usize,
    /// timeout in seconds for a single etcd request
    #[arg(long, env = "PROBE_TIMEOUT", default_value_t = 5)]
    pub probe_timeout: u64,
    /// timeout in seconds for a complete health check
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,
    /// milliseconds between polls of a BOSH task
    #[arg(long, env = "TASK_POLL_INTERVAL", default_value_t = 500)]
    pub task_poll_interval: u64,
    /// number of polls of a BOSH task before giving up, polling also stops at the request timeout
    #[arg(long, env = "TASK_POLL_ATTEMPTS", default_value_t = 50)]
    pub task_poll_attempts: u32,
}

impl Opts {
    pub fn bosh_config(&self) -> BoshConfig {
        BoshConfig {
            uri: self.bosh_uri.clone(),
            port: self.bosh_port,
            username: self.bosh_username.clone(),
            password: self.bosh_password.clone(),
            skip_ssl_validation: self.bosh_skip_ssl_validation,
            insecure_transport: self.bosh_insecure_transport,
            task_poll_interval: Duration::from_millis(self.task_poll_interval),
            task_poll_attempts: self.task_poll_attempts,
            request_timeout: self.request_timeout(),
        }
    }
    pub fn etcd_protocol(&self) -> &'static str {
        if self.ssl_enabled { "https" } else { "http" }
    }
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
