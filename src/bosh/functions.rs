//! The impls and functions
//!
use std::{thread, time::{Duration, Instant}};
use itertools::Itertools;
use log::*;
use regex::Regex;
use reqwest::{blocking::Client, redirect};
use crate::bosh::{AllDeploymentVms, BoshConfig, Deployment, DeploymentManifest, DeploymentVm, TaskState};
use crate::error::{MonitorError, Result};
use crate::utility;

const REDIRECT_LIMIT: usize = 30;

/// The director calls a health check needs.
pub trait Director {
    fn list_deployments(&self) -> Result<Vec<Deployment>>;
    fn list_vms(&self, deployment_name: &str) -> Result<AllDeploymentVms>;
    fn get_manifest(&self, deployment_name: &str) -> Result<String>;
}

impl DeploymentVm {
    pub fn canonical_ip(&self) -> Option<&str> {
        self.ips.first().map(String::as_str)
    }
}

impl AllDeploymentVms {
    pub fn new() -> Self {
        Default::default()
    }
    /// All ip addresses of all VMs, every address once.
    pub fn all_ips(&self) -> Vec<String> {
        self.vms.iter()
            .flat_map(|vm| vm.ips.iter().cloned())
            .unique()
            .collect()
    }
    /// Keeps the VMs in director order.
    pub fn filter_job(
        self,
        job_name_filter: &Regex,
    ) -> AllDeploymentVms
    {
        AllDeploymentVms {
            vms: self.vms.into_iter().filter(|vm| job_name_filter.is_match(&vm.job_name)).collect(),
        }
    }
}

impl TaskState {
    pub fn is_done(&self) -> bool {
        self.state == "done"
    }
    pub fn is_failed(&self) -> bool {
        matches!(self.state.as_str(), "error" | "cancelled" | "timeout")
    }
}

/// A director client for a single health check. Task polling stops at the deadline.
pub struct BoshClient {
    config: BoshConfig,
    http: Client,
    deadline: Instant,
}

impl BoshClient {
    pub fn new(
        config: BoshConfig,
        deadline: Instant,
    ) -> Result<Self>
    {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.skip_ssl_validation)
            .redirect(redirect::Policy::limited(REDIRECT_LIMIT))
            .timeout(config.request_timeout)
            .build()?;
        Ok(BoshClient { config, http, deadline })
    }
    fn url(&self, path: &str) -> String {
        let transport = if self.config.insecure_transport { "http" } else { "https" };
        format!("{}://{}:{}{}", transport, self.config.uri, self.config.port, path)
    }
    fn get(
        &self,
        path: &str,
    ) -> Result<String>
    {
        let url = self.url(path);
        let response = self.http.get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()?
            .error_for_status()?;
        debug!("Success response: {} = {}", url, response.status());
        Ok(response.text()?)
    }
    fn task_state(
        &self,
        task: &TaskState,
    ) -> Result<TaskState>
    {
        let task_state = parse_task_state(&self.get(&format!("/tasks/{}", task.id))?)?;
        debug!("task {}: {}", task_state.id, task_state.state);
        Ok(task_state)
    }
}

impl Director for BoshClient {
    fn list_deployments(&self) -> Result<Vec<Deployment>> {
        parse_deployments(&self.get("/deployments")?)
    }
    fn list_vms(&self, deployment_name: &str) -> Result<AllDeploymentVms> {
        let task = parse_task_state(&self.get(&format!("/deployments/{}/vms?format=full", deployment_name))?)?;
        let task = wait_for_task(task, self.config.task_poll_interval, self.config.task_poll_attempts, self.deadline, |task| self.task_state(task))?;
        parse_deployment_vms(&self.get(&format!("/tasks/{}/output?type=result", task.id))?)
    }
    fn get_manifest(&self, deployment_name: &str) -> Result<String> {
        let deployment: DeploymentManifest = serde_json::from_str(&self.get(&format!("/deployments/{}", deployment_name))?)?;
        Ok(deployment.manifest)
    }
}

/// Returns the name of the first deployment, in director order, that matches the filter.
pub fn find_deployment<D: Director + ?Sized>(
    director: &D,
    deployment_name_filter: &Regex,
) -> Result<String>
{
    let deployments = director.list_deployments()?;
    let deployment = deployments.iter()
        .find(|deployment| deployment_name_filter.is_match(&deployment.name))
        .ok_or_else(|| MonitorError::DeploymentNotFound(deployment_name_filter.to_string()))?;
    info!("Found deployment: {} releases: {} stemcells: {}",
        deployment.name,
        deployment.releases.iter().map(|release| format!("{}/{}", release.name, release.version)).join(","),
        deployment.stemcells.iter().map(|stemcell| format!("{}/{}", stemcell.name, stemcell.version)).join(","),
    );
    Ok(deployment.name.clone())
}

/// Returns the VMs of a deployment that belong to the job. No matching VM is not an error.
pub fn find_vms<D: Director + ?Sized>(
    director: &D,
    deployment_name: &str,
    job_name_filter: &Regex,
) -> Result<AllDeploymentVms>
{
    info!("begin fetching VMs of deployment {}", deployment_name);
    let timer = Instant::now();

    let vms = director.list_vms(deployment_name)?.filter_job(job_name_filter);

    info!("end fetching VMs: {} {} VMs found {:?}", vms.vms.len(), job_name_filter, timer.elapsed());
    debug!("ips: {:?}", vms.all_ips());
    Ok(vms)
}

/// Polls a task until it is done, with a fixed interval and a bounded number of polls.
///
/// A poll that fails is logged and counted, the last known state is kept.
/// No poll is done after the deadline: the wait ends with `DeadlineExceeded`.
pub fn wait_for_task<F>(
    mut task: TaskState,
    interval: Duration,
    max_attempts: u32,
    deadline: Instant,
    mut poll: F,
) -> Result<TaskState>
where
    F: FnMut(&TaskState) -> Result<TaskState>,
{
    let mut attempts = 0;
    loop {
        if task.is_done() {
            return Ok(task);
        }
        if task.is_failed() {
            return Err(MonitorError::TaskFailed { id: task.id, state: task.state });
        }
        if attempts >= max_attempts {
            return Err(MonitorError::TaskTimeout { id: task.id, attempts });
        }
        utility::check_deadline(deadline)?;
        attempts += 1;
        thread::sleep(interval.min(deadline.saturating_duration_since(Instant::now())));
        utility::check_deadline(deadline)?;
        match poll(&task) {
            Ok(task_state) => task = task_state,
            Err(e) => warn!("poll {} of task {} failed: {}", attempts, task.id, e),
        }
    }
}

pub fn parse_deployments(
    http_data: &str,
) -> Result<Vec<Deployment>>
{
    serde_json::from_str(http_data)
        .map_err(|e| MonitorError::ParseError(format!("could not parse /deployments json data, error: {}", e)))
}

pub fn parse_task_state(
    http_data: &str,
) -> Result<TaskState>
{
    serde_json::from_str(http_data)
        .map_err(|e| MonitorError::ParseError(format!("could not parse task json data, error: {}", e)))
}

/// The VMs task result is not a JSON array, but a JSON document per line.
pub fn parse_deployment_vms(
    http_data: &str,
) -> Result<AllDeploymentVms>
{
    let mut alldeploymentvms = AllDeploymentVms::new();
    for line in http_data.lines().filter(|line| !line.trim().is_empty()) {
        let vm: DeploymentVm = serde_json::from_str(line)
            .map_err(|e| MonitorError::ParseError(format!("could not parse VM json data: {}, error: {}", line.trim(), e)))?;
        alldeploymentvms.vms.push(vm);
    }
    Ok(alldeploymentvms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use crate::utility::set_regex;

    const VMS_TASK_RESULT: &str = r#"{"vm_cid":"1","ips":["1.1.1.1"],"agent_id":"1","job_name":"not_dea-partition-d284104a9345228c01e2","index":0}
          {"vm_cid":"2","ips":["2.2.2.2"],"agent_id":"2","job_name":"dea-partition-d284104a9345228c01e2","index":1}
          {"vm_cid":"4","ips":["4.4.4.4"],"agent_id":"4","job_name":"diego_cell-partition-d284104a9345228c01e2","index":0}

          {"vm_cid":"11","ips":["30.30.30.30"],"agent_id":"11","job_name":"etcd_server-d284104a9345228c01e2","index":0}
          {"vm_cid":"2","ips":["31.31.31.31"],"agent_id":"2","job_name":"etcd_server-d284104a9345228c01e2","index":1}
          {"vm_cid":"6","ips":["32.32.32.32","32.32.32.33"],"agent_id":"6","job_name":"etcd_server-d284104a9345228c01e2","index":2}
"#;

    struct FakeDirector {
        deployments: &'static str,
        vms: &'static str,
    }

    impl Director for FakeDirector {
        fn list_deployments(&self) -> Result<Vec<Deployment>> {
            parse_deployments(self.deployments)
        }
        fn list_vms(&self, _deployment_name: &str) -> Result<AllDeploymentVms> {
            parse_deployment_vms(self.vms)
        }
        fn get_manifest(&self, _deployment_name: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn fake_director() -> FakeDirector {
        FakeDirector {
            deployments: r#"[
   {"name":"test-deployment-12345","releases":[{"name":"example_release","version":"2"}],"stemcells":[{"name":"example_stemcell","version":"1"}]},
   {"name":"cf-12345","releases":[],"stemcells":[]},
   {"name":"cf-67890"}
]"#,
            vms: VMS_TASK_RESULT,
        }
    }

    #[test]
    fn unit_parse_deployment_vms() {
        let result = parse_deployment_vms(VMS_TASK_RESULT).unwrap();
        assert_eq!(result.vms.len(), 6);
        assert_eq!(result.vms[3], DeploymentVm {
            job_name: "etcd_server-d284104a9345228c01e2".to_string(),
            index: 0,
            vm_cid: "11".to_string(),
            agent_id: "11".to_string(),
            ips: vec!["30.30.30.30".to_string()],
        });
    }

    #[test]
    fn unit_parse_deployment_vms_bad_line() {
        let vms = r#"{"vm_cid":"2","ips":["31.31.31.31"],"agent_id":"2","job_name":"etcd_server-d284104a9345228c01e2","index":1}
":["30.30.30_id""11","job_name":"etcd_server-d284104a9345228c01e2","index":0}
"#;
        let result = parse_deployment_vms(vms);
        assert!(matches!(result, Err(MonitorError::ParseError(_))));
    }

    #[test]
    fn unit_parse_deployment_vms_empty() {
        let result = parse_deployment_vms("\n\n").unwrap();
        assert!(result.vms.is_empty());
    }

    #[test]
    fn unit_parse_task_state() {
        let task = r#"{"id":1,"state":"queued","description":"retrieve vm-stats","timestamp":1460639781,"result":"","user":"example_user"}"#;
        let result = parse_task_state(task).unwrap();
        assert_eq!(result.id, 1);
        assert_eq!(result.state, "queued");
        assert!(!result.is_done());
        assert!(!result.is_failed());
    }

    #[test]
    fn unit_filter_job_keeps_director_order() {
        let result = parse_deployment_vms(VMS_TASK_RESULT).unwrap()
            .filter_job(&set_regex("etcd_server").unwrap());
        assert_eq!(result.vms.iter().map(|vm| vm.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(result.vms[2].canonical_ip(), Some("32.32.32.32"));
    }

    #[test]
    fn unit_all_ips_unique() {
        let mut vms = parse_deployment_vms(VMS_TASK_RESULT).unwrap();
        vms.vms.push(vms.vms[0].clone());
        let ips = vms.all_ips();
        assert_eq!(ips.len(), 7);
        assert!(ips.contains(&"32.32.32.33".to_string()));
        assert_eq!(ips.iter().filter(|ip| *ip == "1.1.1.1").count(), 1);
    }

    #[test]
    fn unit_canonical_ip_missing() {
        let vm = DeploymentVm { job_name: "etcd_server-z1".to_string(), ..Default::default() };
        assert_eq!(vm.canonical_ip(), None);
    }

    #[test]
    fn unit_find_deployment_first_match() {
        let result = find_deployment(&fake_director(), &set_regex("cf-").unwrap()).unwrap();
        assert_eq!(result, "cf-12345");
    }

    #[test]
    fn unit_find_deployment_regex() {
        let result = find_deployment(&fake_director(), &set_regex("test-deployment.+").unwrap()).unwrap();
        assert_eq!(result, "test-deployment-12345");
    }

    #[test]
    fn unit_find_deployment_not_found() {
        let result = find_deployment(&fake_director(), &set_regex("not_exist-.+").unwrap());
        assert!(matches!(result, Err(MonitorError::DeploymentNotFound(_))));
    }

    #[test]
    fn unit_find_vms() {
        let result = find_vms(&fake_director(), "cf-12345", &set_regex("etcd_server").unwrap()).unwrap();
        assert_eq!(result.vms.len(), 3);
        assert!(result.vms.iter().all(|vm| vm.job_name.starts_with("etcd_server")));
    }

    #[test]
    fn unit_find_vms_none_matching() {
        let result = find_vms(&fake_director(), "cf-12345", &set_regex("consul_server").unwrap()).unwrap();
        assert!(result.vms.is_empty());
    }

    #[test]
    fn unit_resolve_is_idempotent() {
        let director = fake_director();
        let deployment_filter = set_regex("cf-").unwrap();
        let job_filter = set_regex("etcd_server").unwrap();
        let first = find_vms(&director, &find_deployment(&director, &deployment_filter).unwrap(), &job_filter).unwrap();
        let second = find_vms(&director, &find_deployment(&director, &deployment_filter).unwrap(), &job_filter).unwrap();
        assert_eq!(first, second);
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[test]
    fn unit_wait_for_task_polls_until_done() {
        let polls = Cell::new(0);
        let task = TaskState { id: 7, state: "queued".to_string() };
        let result = wait_for_task(task, Duration::ZERO, 10, far_deadline(), |task| {
            polls.set(polls.get() + 1);
            let state = if polls.get() < 3 { "processing" } else { "done" };
            Ok(TaskState { id: task.id, state: state.to_string() })
        }).unwrap();
        assert!(result.is_done());
        assert_eq!(result.id, 7);
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn unit_wait_for_task_already_done() {
        let task = TaskState { id: 1, state: "done".to_string() };
        let result = wait_for_task(task, Duration::ZERO, 0, far_deadline(), |_| panic!("no poll expected")).unwrap();
        assert_eq!(result.id, 1);
    }

    #[test]
    fn unit_wait_for_task_gives_up() {
        let polls = Cell::new(0);
        let task = TaskState { id: 3, state: "queued".to_string() };
        let result = wait_for_task(task, Duration::ZERO, 5, far_deadline(), |task| {
            polls.set(polls.get() + 1);
            Ok(task.clone())
        });
        assert!(matches!(result, Err(MonitorError::TaskTimeout { id: 3, attempts: 5 })));
        assert_eq!(polls.get(), 5);
    }

    #[test]
    fn unit_wait_for_task_failed_state() {
        let task = TaskState { id: 4, state: "queued".to_string() };
        let result = wait_for_task(task, Duration::ZERO, 5, far_deadline(), |task| Ok(TaskState { id: task.id, state: "error".to_string() }));
        assert!(matches!(result, Err(MonitorError::TaskFailed { id: 4, .. })));
    }

    #[test]
    fn unit_wait_for_task_keeps_state_on_poll_error() {
        let polls = Cell::new(0);
        let task = TaskState { id: 5, state: "queued".to_string() };
        let result = wait_for_task(task, Duration::ZERO, 5, far_deadline(), |task| {
            polls.set(polls.get() + 1);
            if polls.get() == 1 {
                Err(MonitorError::ParseError("garbage".to_string()))
            } else {
                Ok(TaskState { id: task.id, state: "done".to_string() })
            }
        }).unwrap();
        assert!(result.is_done());
        assert_eq!(polls.get(), 2);
    }

    #[test]
    fn unit_wait_for_task_stops_at_deadline() {
        let polls = Cell::new(0);
        let task = TaskState { id: 6, state: "queued".to_string() };
        let started = Instant::now();
        let result = wait_for_task(task, Duration::from_millis(20), 1000, started + Duration::from_millis(100), |task| {
            polls.set(polls.get() + 1);
            Ok(TaskState { id: task.id, state: "processing".to_string() })
        });
        assert!(matches!(result, Err(MonitorError::DeadlineExceeded)));
        assert!(polls.get() <= 5);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn unit_wait_for_task_past_deadline_does_not_poll() {
        let task = TaskState { id: 8, state: "processing".to_string() };
        let result = wait_for_task(task, Duration::ZERO, 10, Instant::now(), |_| panic!("no poll expected"));
        assert!(matches!(result, Err(MonitorError::DeadlineExceeded)));
    }

    #[test]
    fn unit_unreachable_director_is_network_error() {
        let client = BoshClient::new(BoshConfig {
            uri: "127.0.0.1".to_string(),
            port: 1,
            username: "example_user".to_string(),
            password: "example_password".to_string(),
            skip_ssl_validation: true,
            insecure_transport: true,
            task_poll_interval: Duration::ZERO,
            task_poll_attempts: 1,
            request_timeout: Duration::from_secs(5),
        }, far_deadline()).unwrap();
        let result = client.list_deployments();
        assert!(matches!(result, Err(MonitorError::NetworkError(_))));
    }
}
