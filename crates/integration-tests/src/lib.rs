//! Shared fixtures for the Squonk2 client integration tests
//!
//! Fake Data Manager behaviour mounted on a `wiremock::MockServer`.

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use squonk2_core::application::PollPolicy;
use squonk2_sdk::{AsClient, ClientConfig, DmClient};

pub const TOKEN: &str = "test-token";
pub const PROJECT_ID: &str = "project-00000000-0000-0000-0000-000000000001";

pub fn dm_client(server: &MockServer) -> DmClient {
    DmClient::new(ClientConfig::new(server.uri())).unwrap()
}

pub fn as_client(server: &MockServer) -> AsClient {
    AsClient::new(ClientConfig::new(server.uri())).unwrap()
}

/// Millisecond polling for tests
pub fn fast_policy() -> PollPolicy {
    PollPolicy::bounded(Duration::from_millis(5), Duration::from_secs(5))
}

/// The `filename` of the first file part of a multipart body
pub fn multipart_file_name(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let start = text.find("filename=\"")? + "filename=\"".len();
    let end = text[start..].find('"')?;
    Some(text[start..start + end].to_string())
}

/// The content of the first file part of a multipart body
pub fn multipart_file_content(body: &[u8], boundary: &str) -> Option<Vec<u8>> {
    let part = find(body, b"filename=\"")?;
    let start = part + find(&body[part..], b"\r\n\r\n")? + 4;
    let delimiter = format!("\r\n--{}", boundary);
    let end = start + find(&body[start..], delimiter.as_bytes())?;
    Some(body[start..end].to_vec())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn multipart_boundary(request: &Request) -> Option<String> {
    let content_type = request.headers.get("content-type")?.to_str().ok()?;
    let boundary = content_type.split("boundary=").nth(1)?;
    Some(boundary.trim_matches('"').to_string())
}

/// A project's files, kept in memory by the fake Data Manager
#[derive(Clone, Default)]
pub struct FakeProjectFiles {
    files: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl FakeProjectFiles {
    pub fn names(&self) -> Vec<String> {
        let files = self.files.lock().unwrap();
        files.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn content(&self, name: &str) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files
            .iter()
            .find(|(stored, _)| stored == name)
            .map(|(_, content)| content.clone())
    }

    /// Mount `GET /file` plus `PUT` and `GET /project/{id}/file` for
    /// `PROJECT_ID`. With `reject_uploads` every PUT answers 500 and
    /// stores nothing.
    pub async fn mount(&self, server: &MockServer, reject_uploads: bool) {
        Mock::given(method("GET"))
            .and(path("/file"))
            .and(query_param("project_id", PROJECT_ID))
            .respond_with(ListFiles(self.clone()))
            .mount(server)
            .await;

        Mock::given(method("PUT"))
            .and(path(format!("/project/{}/file", PROJECT_ID)))
            .respond_with(PutFile {
                files: self.clone(),
                reject: reject_uploads,
            })
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/project/{}/file", PROJECT_ID)))
            .respond_with(GetFile(self.clone()))
            .mount(server)
            .await;
    }
}

struct ListFiles(FakeProjectFiles);

impl Respond for ListFiles {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let files: Vec<_> = self
            .0
            .names()
            .into_iter()
            .map(|name| json!({"file_name": name}))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({"files": files, "paths": []}))
    }
}

struct PutFile {
    files: FakeProjectFiles,
    reject: bool,
}

impl Respond for PutFile {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if self.reject {
            return ResponseTemplate::new(500).set_body_string("storage unavailable");
        }
        let Some(name) = multipart_file_name(&request.body) else {
            return ResponseTemplate::new(400);
        };
        let Some(content) = multipart_boundary(request)
            .and_then(|boundary| multipart_file_content(&request.body, &boundary))
        else {
            return ResponseTemplate::new(400);
        };

        let mut files = self.files.files.lock().unwrap();
        match files.iter_mut().find(|(stored, _)| *stored == name) {
            Some(file) => file.1 = content,
            None => files.push((name, content)),
        }
        ResponseTemplate::new(201)
    }
}

struct GetFile(FakeProjectFiles);

impl Respond for GetFile {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let name = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "file")
            .map(|(_, value)| value.into_owned());
        match name.and_then(|name| self.0.content(&name)) {
            Some(content) => ResponseTemplate::new(200).set_body_bytes(content),
            None => ResponseTemplate::new(404),
        }
    }
}

/// Answers `GET /instance/{id}` with each phase in turn, repeating the last
pub struct PhaseSequence {
    phases: Vec<&'static str>,
    calls: AtomicUsize,
}

impl PhaseSequence {
    pub fn new(phases: &[&'static str]) -> Self {
        Self {
            phases: phases.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for PhaseSequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let phase = self.phases[call.min(self.phases.len() - 1)];

        let mut body = json!({"phase": phase});
        if phase != "PENDING" {
            body["started"] = json!("2022-01-01T10:00:00Z");
        }
        if phase != "PENDING" && phase != "RUNNING" {
            body["stopped"] = json!("2022-01-01T10:00:05Z");
        }
        ResponseTemplate::new(200).set_body_json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_file_name() {
        let body = b"--x\r\nContent-Disposition: form-data; name=\"file\"; filename=\"100.smi\"\r\n";
        assert_eq!(multipart_file_name(body), Some("100.smi".to_string()));
        assert_eq!(multipart_file_name(b"no file"), None);
    }

    #[test]
    fn test_multipart_file_content() {
        let body = b"--xyz\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\n/work\r\n\
--xyz\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.smi\"\r\n\r\nC\r\nCC\r\n--xyz--\r\n";
        assert_eq!(
            multipart_file_content(body, "xyz"),
            Some(b"C\r\nCC".to_vec())
        );
    }
}
