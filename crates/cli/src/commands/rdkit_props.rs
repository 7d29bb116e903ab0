// rdkit-props - calculate molecular properties with the rdkit-molprops Job

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

use squonk2_core::application::constants::{TASK_MAX_POLLS, TASK_POLL_INTERVAL};
use squonk2_sdk::config::{is_yes, DM_API_URL_ENV};
use squonk2_sdk::{wait_for_task, InstanceOptions, JobSpecification, PollPolicy, TaskOutcome};

use super::{dm_client, ok, step};

/// Project directory the input is uploaded to (and the output written to)
const WORK_PATH: &str = "/work";

#[derive(Args)]
pub struct RdkitPropsArgs {
    #[arg(long, env = "KEYCLOAK_TOKEN", hide_env_values = true)]
    token: String,

    #[arg(long, env = "PROJECT_ID")]
    project_id: String,

    /// Local SMILES file to calculate properties for
    #[arg(long, env = "JOB_INPUT")]
    job_input: PathBuf,

    /// Name of the output file written to the project's work directory
    #[arg(long, default_value = "foo.smi")]
    output_file: String,

    /// Where to save the output (defaults to the output file name)
    #[arg(long)]
    download_to: Option<PathBuf>,

    #[arg(long, env = DM_API_URL_ENV)]
    dm_api_url: String,

    #[arg(long, env = "SQUONK2_DMAPI_VERIFY_SSL_CERT", default_value = "yes")]
    verify_ssl_cert: String,
}

pub async fn run(args: RdkitPropsArgs) -> Result<()> {
    let dm = dm_client(&args.dm_api_url, is_yes(&args.verify_ssl_cert))?;
    let token = args.token.as_str();

    dm.ping(token).await.context("API not responding")?;
    ok("API OK");

    // The input keeps its name in the project's work directory
    dm.upload_unmanaged_project_files(token, &args.project_id, &[&args.job_input], WORK_PATH, false)
        .await
        .context("FILE UPLOAD FAILED")?;
    ok("FILE UPLOAD OK");

    let input_name = args
        .job_input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("JOB_INPUT is not a file")?;
    let specification = JobSpecification::new("rdkit", "rdkit-molprops", "1.0.0")
        .with_variable("separator", "tab")
        .with_variable("outputFile", format!("work/{}", args.output_file))
        .with_variable("inputFile", format!("work/{}", input_name));

    let started = dm
        .start_job_instance(
            token,
            &args.project_id,
            "My Job",
            &specification,
            &InstanceOptions::default(),
        )
        .await
        .context("JOB FAILED")?;
    ok(format!("JOB STARTED (instance_id={})", started.instance_id));

    step("waiting ...");
    let policy = PollPolicy::with_max_polls(TASK_POLL_INTERVAL, TASK_MAX_POLLS);
    match wait_for_task(&dm.probe(token), &started.task_id, &policy)
        .await
        .with_context(|| format!("get_task({})", started.task_id))?
    {
        TaskOutcome::Succeeded(_) => ok("DONE"),
        TaskOutcome::Failed(status) => bail!("Job task failed (exit_code={:?})", status.exit_code),
        TaskOutcome::TimedOut { .. } => bail!("TIMEOUT"),
    }

    let local_file = args
        .download_to
        .clone()
        .unwrap_or_else(|| PathBuf::from(&args.output_file));
    match dm
        .download_unmanaged_project_file(
            token,
            &args.project_id,
            WORK_PATH,
            &args.output_file,
            &local_file,
        )
        .await
    {
        Ok(()) => ok(format!("DOWNLOAD OK ({})", local_file.display())),
        // The instance is still removed below
        Err(e) => eprintln!("DOWNLOAD FAILED ({})", e),
    }

    dm.delete_instance(token, &started.instance_id)
        .await
        .context("CLEANUP FAILED")?;
    ok("CLEANUP OK");
    Ok(())
}
