//! Data Manager API client
//!
//! One method per Data Manager REST operation. Every call takes the
//! caller's access token and makes a single request, except uploads
//! (an optional listing plus one PUT per file), file deletes (one DELETE
//! per file) and job launches (operator lookup plus the POST).
//!
//! # Example
//!
//! ```no_run
//! use squonk2_sdk::{ClientConfig, DmClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dm = DmClient::new(ClientConfig::new("https://example.com/data-manager-api"))?;
//!     dm.ping("token").await?;
//!     println!("DM-API version={}", dm.get_version("token").await?.version);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use squonk2_core::domain::{JobSpecification, DM_JOB_APPLICATION_ID};
use squonk2_core::port::{InstanceProbe, InstanceStatus, TaskStatus};

use crate::config::ClientConfig;
use crate::error::{require, require_project_path, ApiError, Result};
use crate::executor::{ApiRequest, RequestExecutor};
use crate::types::{
    InstanceInfo, InstanceStarted, JobApplication, JobInfo, ProjectCreated, ProjectFiles,
    ProjectsList, TaskInfo, Version,
};

/// The Account Server test product, usable by admin users to create projects
pub const TEST_PRODUCT_ID: &str = "product-11111111-1111-1111-1111-111111111111";

/// Optional job instance settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceOptions {
    /// URL the Data Manager calls as the instance progresses
    pub callback_url: Option<String>,
    /// Sent with callbacks (ignored without a callback URL)
    pub callback_context: Option<String>,
    /// Data Manager debug mode
    pub debug: Option<String>,
}

/// Data Manager API client
///
/// Clones share the same endpoint configuration.
#[derive(Debug, Clone)]
pub struct DmClient {
    executor: Arc<RequestExecutor>,
}

impl DmClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            executor: Arc::new(RequestExecutor::new(config)?),
        })
    }

    /// Client configured from `SQUONK2_DMAPI_URL` and
    /// `SQUONK2_DMAPI_VERIFY_SSL_CERT`
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::dm_from_env())
    }

    /// Replace the API URL, typically `https://example.com/data-manager-api`
    pub fn set_api_url(&self, url: &str, verify_tls: bool) -> Result<()> {
        self.executor.set_api_url(url, verify_tls)
    }

    /// The API URL (if set) and whether TLS certificates are verified
    pub fn api_url(&self) -> (Option<String>, bool) {
        self.executor.api_url()
    }

    /// Adapt the client to an [`InstanceProbe`] using the given token
    pub fn probe(&self, token: impl Into<String>) -> DmProbe {
        DmProbe {
            client: self.clone(),
            token: token.into(),
        }
    }

    // ========================================================================
    // Service
    // ========================================================================

    /// Check the Data Manager is responding
    pub async fn ping(&self, token: &str) -> Result<()> {
        self.executor
            .execute(
                Some(token),
                ApiRequest::get("/account-server/namespace").label("Failed ping"),
            )
            .await?;
        Ok(())
    }

    pub async fn get_version(&self, token: &str) -> Result<Version> {
        self.executor
            .execute(
                Some(token),
                ApiRequest::get("/version").label("Failed getting version"),
            )
            .await?
            .into_typed()
    }

    // ========================================================================
    // Projects
    // ========================================================================

    /// Create a project using an Account Server tier product.
    ///
    /// # Arguments
    /// * `name` - The project name
    /// * `tier_product_id` - i.e. [`TEST_PRODUCT_ID`]
    pub async fn create_project(
        &self,
        token: &str,
        name: &str,
        tier_product_id: &str,
    ) -> Result<ProjectCreated> {
        require("project name", name)?;
        require("tier_product_id", tier_product_id)?;

        self.executor
            .execute(
                Some(token),
                ApiRequest::post("/project")
                    .label("Failed creating project")
                    .expecting(&[StatusCode::CREATED])
                    .form("name", name)
                    .form("tier_product_id", tier_product_id),
            )
            .await?
            .into_typed()
    }

    pub async fn delete_project(&self, token: &str, project_id: &str) -> Result<()> {
        require("project_id", project_id)?;

        self.executor
            .execute(
                Some(token),
                ApiRequest::delete(format!("/project/{}", project_id))
                    .label("Failed deleting project"),
            )
            .await?;
        Ok(())
    }

    /// Projects available to the token's user
    pub async fn get_available_projects(&self, token: &str) -> Result<ProjectsList> {
        self.executor
            .execute(
                Some(token),
                ApiRequest::get("/project").label("Failed to get projects"),
            )
            .await?
            .into_typed()
    }

    pub async fn get_project(&self, token: &str, project_id: &str) -> Result<serde_json::Value> {
        require("project_id", project_id)?;

        Ok(self
            .executor
            .execute(
                Some(token),
                ApiRequest::get(format!("/project/{}", project_id))
                    .label("Failed to get project"),
            )
            .await?
            .payload)
    }

    // ========================================================================
    // Project files
    // ========================================================================

    /// Files (and sub-directories) on a project path
    pub async fn list_project_files(
        &self,
        token: &str,
        project_id: &str,
        project_path: &str,
        include_hidden: bool,
    ) -> Result<ProjectFiles> {
        require("project_id", project_id)?;
        require_project_path(project_path)?;

        self.executor
            .execute(
                Some(token),
                ApiRequest::get("/file")
                    .label("Failed to list project files")
                    .query("project_id", project_id)
                    .query("path", project_path)
                    .query("include_hidden", include_hidden)
                    .timeout(self.executor.timeouts().listing),
            )
            .await?
            .into_typed()
    }

    /// Upload local files to a project path.
    ///
    /// Unless `force` is set, files whose name already exists on the path
    /// are skipped. Every local file must exist, whether it is sent or not.
    /// Stops at the first failed upload.
    ///
    /// # Arguments
    /// * `files` - Local files, written to `project_path` by file name
    /// * `project_path` - Destination, i.e. `/work`
    /// * `force` - Send files even if they appear to exist
    pub async fn upload_unmanaged_project_files<P: AsRef<Path>>(
        &self,
        token: &str,
        project_id: &str,
        files: &[P],
        project_path: &str,
        force: bool,
    ) -> Result<()> {
        require("project_id", project_id)?;
        require_project_path(project_path)?;
        if files.is_empty() {
            return Err(ApiError::invalid("no files to upload"));
        }
        if self.api_url().0.is_none() {
            return Err(ApiError::NoApiUrl);
        }

        let existing = if force {
            warn!(project_id = %project_id, "Putting files (force=true)");
            Vec::new()
        } else {
            self.existing_file_names(token, project_id, project_path)
                .await?
        };

        for file in files {
            let file = file.as_ref();
            if !tokio::fs::metadata(file).await.map(|m| m.is_file()).unwrap_or(false) {
                return Err(ApiError::NoSuchFile(file.to_path_buf()));
            }
        }

        for file in files {
            let file = file.as_ref();
            let file_name = file_name_of(file)?;
            if existing.iter().any(|name| name == &file_name) {
                debug!(file = %file.display(), "Skipping existing project file");
                continue;
            }
            if let Err(e) = self
                .put_unmanaged_project_file(token, project_id, file, file_name, project_path)
                .await
            {
                warn!(
                    project_id = %project_id,
                    file = %file.display(),
                    project_path = %project_path,
                    error = %e,
                    "Failed putting file"
                );
                return Err(e);
            }
        }

        Ok(())
    }

    /// Download one file from a project path to a local file
    pub async fn download_unmanaged_project_file(
        &self,
        token: &str,
        project_id: &str,
        project_path: &str,
        file_name: &str,
        local_file: impl AsRef<Path>,
    ) -> Result<()> {
        require("project_id", project_id)?;
        require_project_path(project_path)?;
        require("file", file_name)?;
        let local_file = local_file.as_ref();

        let mut response = self
            .executor
            .send(
                Some(token),
                ApiRequest::get(format!("/project/{}/file", project_id))
                    .label("Failed to get file")
                    .query("path", project_path)
                    .query("file", file_name)
                    .timeout(self.executor.timeouts().transfer),
            )
            .await?;

        // The body lands in a sibling file that only replaces `local_file`
        // once it is complete
        let partial = partial_path(local_file);
        let written = match stream_to_file(&mut response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };
        if let Err(e) = tokio::fs::rename(&partial, local_file).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        debug!(
            project_id = %project_id,
            file = %file_name,
            local_file = %local_file.display(),
            bytes = written,
            "Downloaded project file"
        );
        Ok(())
    }

    /// Delete files from a project path, stopping at the first failure
    pub async fn delete_unmanaged_project_files<S: AsRef<str>>(
        &self,
        token: &str,
        project_id: &str,
        project_path: &str,
        files: &[S],
    ) -> Result<()> {
        require("project_id", project_id)?;
        require_project_path(project_path)?;

        for file in files {
            self.executor
                .execute(
                    Some(token),
                    ApiRequest::delete("/file")
                        .label("Failed to delete project file")
                        .expecting(&[StatusCode::NO_CONTENT])
                        .query("project_id", project_id)
                        .query("path", project_path)
                        .query("file", file.as_ref()),
                )
                .await?;
        }
        Ok(())
    }

    // ========================================================================
    // Job instances and tasks
    // ========================================================================

    /// Start a Job, using the latest Job operator the Data Manager has.
    ///
    /// # Errors
    /// * `OperatorLookupFailed` - the operator version query failed
    /// * `NoOperatorInstalled` - the Data Manager cannot run Jobs
    pub async fn start_job_instance(
        &self,
        token: &str,
        project_id: &str,
        name: &str,
        specification: &JobSpecification,
        options: &InstanceOptions,
    ) -> Result<InstanceStarted> {
        require("project_id", project_id)?;
        require("instance name", name)?;
        specification.validate()?;

        let application_version = self.latest_job_operator_version(token).await?;

        let mut request = ApiRequest::post("/instance")
            .label("Failed to start instance")
            .expecting(&[StatusCode::CREATED])
            .form("application_id", DM_JOB_APPLICATION_ID)
            .form("application_version", &application_version)
            .form("as_name", name)
            .form("project_id", project_id)
            .form("specification", specification.to_json_string());
        if let Some(debug) = &options.debug {
            request = request.form("debug", debug);
        }
        if let Some(callback_url) = &options.callback_url {
            request = request.form("callback_url", callback_url);
            if let Some(callback_context) = &options.callback_context {
                request = request.form("callback_context", callback_context);
            }
        }

        let started: InstanceStarted = self
            .executor
            .execute(Some(token), request)
            .await?
            .into_typed()?;

        info!(
            instance_id = %started.instance_id,
            task_id = %started.task_id,
            job = %specification.job,
            "Started job instance"
        );
        Ok(started)
    }

    pub async fn get_instance(&self, token: &str, instance_id: &str) -> Result<InstanceInfo> {
        require("instance_id", instance_id)?;

        self.executor
            .execute(
                Some(token),
                ApiRequest::get(format!("/instance/{}", instance_id))
                    .label("Failed to get instance"),
            )
            .await?
            .into_typed()
    }

    pub async fn get_project_instances(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<serde_json::Value> {
        require("project_id", project_id)?;

        Ok(self
            .executor
            .execute(
                Some(token),
                ApiRequest::get("/instance")
                    .label("Failed to get project instances")
                    .query("project_id", project_id),
            )
            .await?
            .payload)
    }

    pub async fn delete_instance(&self, token: &str, instance_id: &str) -> Result<()> {
        require("instance_id", instance_id)?;

        self.executor
            .execute(
                Some(token),
                ApiRequest::delete(format!("/instance/{}", instance_id))
                    .label("Failed to delete instance"),
            )
            .await?;
        Ok(())
    }

    /// Get a Task and (a page of) its events.
    ///
    /// # Arguments
    /// * `event_prior_ordinal` - Only events before this ordinal (0 for all)
    /// * `event_limit` - Maximum number of events (0 for the server default)
    pub async fn get_task(
        &self,
        token: &str,
        task_id: &str,
        event_prior_ordinal: u64,
        event_limit: u64,
    ) -> Result<TaskInfo> {
        require("task_id", task_id)?;

        let mut request = ApiRequest::get(format!("/task/{}", task_id)).label("Failed to get task");
        if event_prior_ordinal > 0 {
            request = request.query("event_prior_ordinal", event_prior_ordinal);
        }
        if event_limit > 0 {
            request = request.query("event_limit", event_limit);
        }

        self.executor
            .execute(Some(token), request)
            .await?
            .into_typed()
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    pub async fn get_available_jobs(&self, token: &str) -> Result<serde_json::Value> {
        Ok(self
            .executor
            .execute(
                Some(token),
                ApiRequest::get("/job").label("Failed to get available jobs"),
            )
            .await?
            .payload)
    }

    pub async fn get_job(&self, token: &str, job_id: u64) -> Result<JobInfo> {
        if job_id == 0 {
            return Err(ApiError::invalid("job_id must be greater than zero"));
        }

        self.executor
            .execute(
                Some(token),
                ApiRequest::get(format!("/job/{}", job_id)).label("Failed to get job"),
            )
            .await?
            .into_typed()
    }

    pub async fn get_job_by_version(
        &self,
        token: &str,
        collection: &str,
        job: &str,
        version: &str,
    ) -> Result<JobInfo> {
        require("collection", collection)?;
        require("job", job)?;
        require("version", version)?;

        self.executor
            .execute(
                Some(token),
                ApiRequest::get("/job/get-by-version")
                    .label("Failed to get job")
                    .query("collection", collection)
                    .query("job", job)
                    .query("version", version),
            )
            .await?
            .into_typed()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn latest_job_operator_version(&self, token: &str) -> Result<String> {
        let response = self
            .executor
            .execute(
                Some(token),
                ApiRequest::get(format!("/application/{}", DM_JOB_APPLICATION_ID))
                    .label("Failed getting Job application info"),
            )
            .await
            .map_err(|e| {
                error!(error = %e, "Failed getting Job application info");
                ApiError::OperatorLookupFailed(Box::new(e))
            })?;

        let application: JobApplication = response
            .into_typed()
            .map_err(|e| ApiError::OperatorLookupFailed(Box::new(e)))?;

        match application.versions.into_iter().next() {
            Some(version) => Ok(version),
            None => {
                warn!("No versions returned for Job application info - no operator?");
                Err(ApiError::NoOperatorInstalled)
            }
        }
    }

    async fn existing_file_names(
        &self,
        token: &str,
        project_id: &str,
        project_path: &str,
    ) -> Result<Vec<String>> {
        let response = self
            .executor
            .execute(
                Some(token),
                ApiRequest::get("/file")
                    .label("Failed getting existing project files")
                    .expecting(&[StatusCode::OK, StatusCode::NOT_FOUND])
                    .query("project_id", project_id)
                    .query("path", project_path)
                    .timeout(self.executor.timeouts().listing),
            )
            .await?;

        if response.status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let listing: ProjectFiles = response.into_typed()?;
        Ok(listing.files.into_iter().map(|f| f.file_name).collect())
    }

    async fn put_unmanaged_project_file(
        &self,
        token: &str,
        project_id: &str,
        file: &Path,
        file_name: String,
        project_path: &str,
    ) -> Result<()> {
        let content = tokio::fs::read(file).await?;
        let part = Part::bytes(content).file_name(file_name);
        let form = Form::new().text("path", project_path.to_string()).part("file", part);

        self.executor
            .execute(
                Some(token),
                ApiRequest::put(format!("/project/{}/file", project_id))
                    .label(format!(
                        "Failed putting file {}/{}",
                        project_path,
                        file.display()
                    ))
                    .expecting(&[StatusCode::CREATED])
                    .multipart(form)
                    .timeout(self.executor.timeouts().transfer),
            )
            .await?;
        Ok(())
    }
}

/// `dir/.name.part` for `dir/name`
fn partial_path(local_file: &Path) -> PathBuf {
    let name = local_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    local_file.with_file_name(format!(".{}.part", name))
}

async fn stream_to_file(response: &mut reqwest::Response, path: &Path) -> Result<usize> {
    let mut output = tokio::fs::File::create(path).await?;
    let mut written = 0usize;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| ApiError::Transport {
            label: "Failed to get file".to_string(),
            source,
        })?
    {
        output.write_all(&chunk).await?;
        written += chunk.len();
    }
    output.flush().await?;
    Ok(written)
}

fn file_name_of(file: &Path) -> Result<String> {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ApiError::NoSuchFile(PathBuf::from(file)))
}

/// [`InstanceProbe`] backed by the Data Manager
#[derive(Debug, Clone)]
pub struct DmProbe {
    client: DmClient,
    token: String,
}

#[async_trait]
impl InstanceProbe for DmProbe {
    type Error = ApiError;

    async fn instance_status(&self, instance_id: &str) -> Result<InstanceStatus> {
        let info = self.client.get_instance(&self.token, instance_id).await?;
        Ok(info.into())
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus> {
        let info = self.client.get_task(&self.token, task_id, 0, 0).await?;
        Ok(info.into())
    }
}
