use clap::Parser;
use log::*;
use anyhow::Result;

use etcd_leader_monitor::config::Opts;
use etcd_leader_monitor::web_server;

#[tokio::main]
async fn main() -> Result<()>
{
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Opts::parse();
    info!("BOSH director: {}:{}, deployment: {}, etcd job: {}, ssl: {}",
        options.bosh_uri,
        options.bosh_port,
        options.cf_deployment_name,
        options.etcd_job_name,
        options.ssl_enabled,
    );

    web_server::serve(options).await
}
