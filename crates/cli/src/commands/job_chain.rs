// job-chain - run Jobs from a YAML file, one after the other
//
// ---
// - name: Job A
//   wait_time_m: 45.0
//   specification:
//     collection: im-test
//     job: event-test
//     version: '1.0.0'
// - name: Job B
//   specification:
//     collection: im-test
//     job: coin-test
//     version: '1.0.0'
//
// Without `wait_time_m` a Job is waited on until it finishes.

use anyhow::{bail, ensure, Context, Result};
use clap::{ArgGroup, Args};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use squonk2_core::application::constants::DEFAULT_POLL_INTERVAL;
use squonk2_sdk::{
    get_access_token, wait_for_instance, DmClient, Environment, InstanceOptions, JobOutcome,
    JobSpecification, PollPolicy,
};

use super::{dm_client, ok, step};

#[derive(Args)]
#[command(group(ArgGroup::new("auth").required(true).args(["environment", "token"])))]
pub struct JobChainArgs {
    /// The project the Jobs run in
    project: String,

    /// YAML file with a list of Jobs (name, wait_time_m and specification)
    job_file: PathBuf,

    /// Environment name (from the environments file)
    #[arg(short = 'e', long)]
    environment: Option<String>,

    /// Access token (requires --dm-api-url)
    #[arg(short = 't', long, requires = "dm_api_url")]
    token: Option<String>,

    /// Data Manager API URL, used with --token
    #[arg(short = 'd', long)]
    dm_api_url: Option<String>,

    /// Leave the Job instances in the Data Manager
    #[arg(long)]
    keep_instances: bool,
}

/// One entry of the job file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChainJob {
    pub name: String,
    /// Minutes to wait for the Job to finish
    #[serde(default)]
    pub wait_time_m: Option<f64>,
    pub specification: JobSpecification,
}

impl ChainJob {
    /// The longest wait, `None` to wait until the Job finishes
    fn max_wait(&self) -> Result<Option<Duration>> {
        let Some(minutes) = self.wait_time_m else {
            return Ok(None);
        };
        ensure!(
            minutes.is_finite() && minutes > 0.0,
            "Job '{}' has an invalid wait_time_m ({})",
            self.name,
            minutes
        );
        let max_wait = Duration::try_from_secs_f64(minutes * 60.0).with_context(|| {
            format!("Job '{}' has an invalid wait_time_m ({})", self.name, minutes)
        })?;
        Ok(Some(max_wait))
    }

    fn poll_policy(&self) -> Result<PollPolicy> {
        Ok(PollPolicy::new(DEFAULT_POLL_INTERVAL, self.max_wait()?))
    }
}

/// Read and check a job file
pub fn load_jobs(path: &Path) -> Result<Vec<ChainJob>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("File '{}' does not exist", path.display()))?;
    let jobs: Vec<ChainJob> = serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid job file '{}'", path.display()))?;

    for job in &jobs {
        ensure!(!job.name.trim().is_empty(), "A job has no name");
        job.max_wait()?;
        job.specification
            .validate()
            .with_context(|| format!("Job '{}'", job.name))?;
    }
    Ok(jobs)
}

pub async fn run(args: JobChainArgs) -> Result<()> {
    let jobs = load_jobs(&args.job_file)?;

    let (dm, token) = match (&args.environment, &args.token, &args.dm_api_url) {
        (Some(name), _, _) => {
            let env = Environment::load(Some(name))
                .with_context(|| format!("Failed to load environment '{}'", name))?;
            let dm = dm_client(&env.dm_api_url()?, true)?;
            let token = get_access_token(&env.dm_credentials()?)
                .await
                .with_context(|| format!("Failed to get a token for '{}'", name))?;
            (dm, token)
        }
        (None, Some(token), Some(url)) => (dm_client(url, true)?, token.clone()),
        _ => bail!("Provide an environment name, or a token and a DM API URL"),
    };

    let mut instances = Vec::with_capacity(jobs.len());
    for job in &jobs {
        step(format!("Running Job \"{}\"...", job.name));
        let instance_id = run_job(&dm, &token, &args.project, job).await?;
        ok(format!("Completed Job instance \"{}\"", instance_id));
        instances.push(instance_id);
    }

    if !args.keep_instances {
        step("Deleting Job instances...");
        for instance_id in &instances {
            dm.delete_instance(&token, instance_id)
                .await
                .with_context(|| format!("delete_instance({})", instance_id))?;
            ok(format!("Deleted Job instance \"{}\"", instance_id));
        }
    }

    ok("Done [SUCCESS]");
    Ok(())
}

/// Start a Job and block until it completes, returning its instance ID
async fn run_job(dm: &DmClient, token: &str, project: &str, job: &ChainJob) -> Result<String> {
    let started = dm
        .start_job_instance(
            token,
            project,
            &job.name,
            &job.specification,
            &InstanceOptions::default(),
        )
        .await
        .with_context(|| format!("start_job_instance({})", job.name))?;

    match job.wait_time_m {
        Some(minutes) => step(format!("Waiting {} minutes...", minutes)),
        None => step("Waiting until completed..."),
    }

    let policy = job.poll_policy()?;
    let outcome = wait_for_instance(&dm.probe(token), &started.instance_id, &policy)
        .await
        .with_context(|| format!("get_instance({})", started.instance_id))?;

    match outcome {
        JobOutcome::Completed(_) => {
            info!(instance_id = %started.instance_id, job = %job.name, "Job completed");
            Ok(started.instance_id)
        }
        JobOutcome::Failed { phase } => bail!("Job '{}' stopped with phase {}", job.name, phase),
        JobOutcome::TimedOut { waited, .. } => bail!(
            "Job '{}' waited too long ({}s)",
            job.name,
            waited.as_secs()
        ),
    }
}
