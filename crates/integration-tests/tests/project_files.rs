// Unmanaged project file upload, listing, download and delete

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use squonk2_integration_tests::{
    dm_client, multipart_file_name, FakeProjectFiles, PROJECT_ID, TOKEN,
};
use squonk2_sdk::ErrorKind;

const CONTENT: &str = "CCO\tethanol\nc1ccccc1\tbenzene\n";

fn local_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let file = dir.path().join(name);
    std::fs::write(&file, content).unwrap();
    file
}

#[tokio::test]
async fn test_upload_download_round_trip() {
    let server = MockServer::start().await;
    let files = FakeProjectFiles::default();
    files.mount(&server, false).await;
    Mock::given(method("DELETE"))
        .and(path("/file"))
        .and(query_param("file", "mols.smi"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let upload = local_file(&dir, "mols.smi", CONTENT);
    let dm = dm_client(&server);

    dm.upload_unmanaged_project_files(TOKEN, PROJECT_ID, &[&upload], "/work", false)
        .await
        .unwrap();
    assert_eq!(files.names(), vec!["mols.smi".to_string()]);
    assert_eq!(files.content("mols.smi").unwrap(), CONTENT.as_bytes());

    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body = String::from_utf8_lossy(&put.body);
    assert!(body.contains(CONTENT));
    assert!(body.contains("name=\"path\""));
    assert!(body.contains("/work"));

    // The fake serves back exactly the bytes it received
    let download = dir.path().join("downloaded.smi");
    dm.download_unmanaged_project_file(TOKEN, PROJECT_ID, "/work", "mols.smi", &download)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&download).unwrap(), std::fs::read(&upload).unwrap());

    dm.delete_unmanaged_project_files(TOKEN, PROJECT_ID, "/work", &["mols.smi"])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_upload_leaves_listing_unchanged() {
    let server = MockServer::start().await;
    let files = FakeProjectFiles::default();
    files.mount(&server, true).await;

    let dir = tempfile::tempdir().unwrap();
    let upload = local_file(&dir, "mols.smi", CONTENT);
    let dm = dm_client(&server);

    let before = dm
        .list_project_files(TOKEN, PROJECT_ID, "/work", false)
        .await
        .unwrap();
    let err = dm
        .upload_unmanaged_project_files(TOKEN, PROJECT_ID, &[&upload], "/work", false)
        .await
        .unwrap_err();
    let after = dm
        .list_project_files(TOKEN, PROJECT_ID, "/work", false)
        .await
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::UnexpectedStatus);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(before.file_names().count(), after.file_names().count());
    assert!(!after.contains("mols.smi"));
}

#[tokio::test]
async fn test_repeated_upload_lists_file_once() {
    let server = MockServer::start().await;
    let files = FakeProjectFiles::default();
    files.mount(&server, false).await;

    let dir = tempfile::tempdir().unwrap();
    let upload = local_file(&dir, "mols.smi", CONTENT);
    let dm = dm_client(&server);

    for _ in 0..2 {
        dm.upload_unmanaged_project_files(TOKEN, PROJECT_ID, &[&upload], "/work", false)
            .await
            .unwrap();
    }

    let listing = dm
        .list_project_files(TOKEN, PROJECT_ID, "/work", false)
        .await
        .unwrap();
    assert_eq!(listing.file_names().filter(|n| *n == "mols.smi").count(), 1);

    // The second upload found the file and sent nothing
    let puts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT")
        .count();
    assert_eq!(puts, 1);
}

#[tokio::test]
async fn test_force_sends_existing_files() {
    let server = MockServer::start().await;
    let files = FakeProjectFiles::default();
    files.mount(&server, false).await;

    let dir = tempfile::tempdir().unwrap();
    let first = local_file(&dir, "a.smi", "C");
    let second = local_file(&dir, "b.smi", "CC");
    let dm = dm_client(&server);

    dm.upload_unmanaged_project_files(TOKEN, PROJECT_ID, &[&first], "/", false)
        .await
        .unwrap();
    dm.upload_unmanaged_project_files(TOKEN, PROJECT_ID, &[&first, &second], "/", true)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let sent: Vec<String> = requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .filter_map(|r| multipart_file_name(&r.body))
        .collect();
    assert_eq!(sent, vec!["a.smi", "a.smi", "b.smi"]);

    // A forced upload does not list the project first
    let listings = requests
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(listings, 1);
    assert_eq!(files.names(), vec!["a.smi", "b.smi"]);
}

#[tokio::test]
async fn test_listing_sends_include_hidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("project_id", PROJECT_ID))
        .and(query_param("path", "/"))
        .and(query_param("include_hidden", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{"file_name": ".hidden"}, {"file_name": "visible.txt"}],
            "paths": ["work"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let listing = dm_client(&server)
        .list_project_files(TOKEN, PROJECT_ID, "/", true)
        .await
        .unwrap();
    assert!(listing.contains(".hidden"));
    assert_eq!(listing.paths, vec!["work".to_string()]);
}

#[tokio::test]
async fn test_binary_round_trip() {
    let server = MockServer::start().await;
    let files = FakeProjectFiles::default();
    files.mount(&server, false).await;

    let content: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let dir = tempfile::tempdir().unwrap();
    let upload = dir.path().join("data.bin");
    std::fs::write(&upload, &content).unwrap();
    let dm = dm_client(&server);

    dm.upload_unmanaged_project_files(TOKEN, PROJECT_ID, &[&upload], "/", true)
        .await
        .unwrap();
    let download = dir.path().join("data.out");
    dm.download_unmanaged_project_file(TOKEN, PROJECT_ID, "/", "data.bin", &download)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&download).unwrap(), content);
}
