//! The router, handler and the health check pipeline.
//!
use std::{net::SocketAddr, sync::Arc, time::Instant};
use anyhow::{Context, Result as AnyResult};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use log::*;
use crate::bosh::{self, BoshClient, Director};
use crate::cluster_health::{self, ClusterHealth};
use crate::config::Opts;
use crate::error::{MonitorError, Result};
use crate::etcd_certs::{self, EtcdCerts};
use crate::leader_stats::{EtcdClient, LeaderStatsSource};
use crate::utility;

#[derive(Clone)]
pub struct AppState {
    pub opts: Arc<Opts>,
}

pub fn router(opts: Opts) -> Router {
    Router::new()
        .route("/", get(health_check))
        .with_state(AppState { opts: Arc::new(opts) })
}

pub async fn serve(opts: Opts) -> AnyResult<()> {
    let address = SocketAddr::from(([0, 0, 0, 0], opts.port));
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Unable to listen on: {}", address))?;
    info!("Listening on: {}", address);
    axum::serve(listener, router(opts))
        .await
        .with_context(|| "Health check server stopped")?;
    Ok(())
}

/// Runs the health check on a blocking thread, bounded by the request timeout.
///
/// The blocking thread stops at the same deadline.
/// Every request creates its own director and etcd http clients.
async fn health_check(State(state): State<AppState>) -> Response {
    let opts = state.opts.clone();
    let timeout = opts.request_timeout();
    let deadline = Instant::now() + timeout;
    let worker = tokio::task::spawn_blocking(move || -> Result<ClusterHealth> {
        let director = BoshClient::new(opts.bosh_config(), deadline)?;
        check_leaders(&director, &opts, deadline, |certs| EtcdClient::from_opts(&opts, certs))
    });
    let result = match tokio::time::timeout(timeout, worker).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(MonitorError::from(join_error)),
        Err(_) => Err(MonitorError::DeadlineExceeded),
    };
    health_response(result)
}

/// Turns the outcome of a health check into the http response.
pub fn health_response(result: Result<ClusterHealth>) -> Response {
    match result {
        Ok(health) => {
            let (status, body) = health.verdict.encode();
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Err(e) => {
            error!("An error occurred: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// The health check: find the deployment, read the etcd certificates when ssl is enabled, find
/// the etcd VMs and judge the leader stats of every etcd node.
///
/// `etcd_source` creates the leader stats source, with the certificates if ssl is enabled.
/// The etcd nodes are not read anymore once the deadline has passed.
pub fn check_leaders<D, S, F>(
    director: &D,
    opts: &Opts,
    deadline: Instant,
    etcd_source: F,
) -> Result<ClusterHealth>
where
    D: Director + ?Sized,
    S: LeaderStatsSource,
    F: FnOnce(Option<EtcdCerts>) -> Result<S>,
{
    info!("Checking leaders");
    let timer = Instant::now();

    let deployment_name_filter = utility::set_regex(&opts.cf_deployment_name)?;
    let job_name_filter = utility::set_regex(&opts.etcd_job_name)?;

    let deployment = bosh::find_deployment(director, &deployment_name_filter)?;

    let certs = if opts.ssl_enabled {
        info!("Fetching etcd certificates");
        let manifest = director.get_manifest(&deployment)?;
        Some(etcd_certs::load_certs(&manifest, &job_name_filter, opts.skip_ssl_verification)?)
    } else {
        None
    };
    let source = etcd_source(certs)?;

    let vms = bosh::find_vms(director, &deployment, &job_name_filter)?;
    utility::check_deadline(deadline)?;
    let health = cluster_health::evaluate(&vms, &source, opts.parallel)?;

    info!("Checked leaders: {} {:?}", health.verdict.message(), timer.elapsed());
    Ok(health)
}
