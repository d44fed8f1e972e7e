use mockito::Server;
use serde_json::json;

use reqm::services::pypi_client::{PypiClient, PypiError};

/// PyPI JSON API client against a mock index

fn numpy_body() -> String {
    json!({
        "info": { "name": "numpy", "version": "2.0.0", "summary": "Fundamental package for array computing" },
        "releases": {
            "1.26.4": [{ "filename": "numpy-1.26.4.tar.gz", "packagetype": "sdist", "yanked": false }],
            "2.0.0": [{ "filename": "numpy-2.0.0.tar.gz", "packagetype": "sdist", "yanked": false }],
            "1.25.0": [{ "filename": "numpy-1.25.0.tar.gz", "packagetype": "sdist", "yanked": true }],
            "2.1.0rc1": [{ "filename": "numpy-2.1.0rc1.tar.gz", "packagetype": "sdist", "yanked": false }]
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_get_package_info() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/pypi/numpy/json")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(numpy_body())
        .expect(2)
        .create_async()
        .await;

    let client = PypiClient::with_registry_url(server.url());
    let info = client.get_package_info("numpy").await.unwrap();
    assert_eq!(info.info.name, "numpy");
    assert_eq!(info.releases.len(), 4);
    assert_eq!(client.get_latest_version("numpy").await.unwrap(), "2.0.0");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_requests_use_normalized_name() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/pypi/opencv-python/json")
        .with_status(200)
        .with_body(json!({ "info": { "name": "opencv-python", "version": "4.9.0.80" } }).to_string())
        .create_async()
        .await;

    let client = PypiClient::with_registry_url(format!("{}/", server.url()));
    let info = client.get_package_info("OpenCV_Python").await.unwrap();
    assert!(info.releases.is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_available_versions_skip_yanked() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/pypi/numpy/json")
        .with_status(200)
        .with_body(numpy_body())
        .create_async()
        .await;

    let client = PypiClient::with_registry_url(server.url());
    let versions: Vec<String> = client
        .get_available_versions("numpy")
        .await
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(versions, vec!["1.26.4", "2.0.0", "2.1.0rc1"]);
}

#[tokio::test]
async fn test_error_statuses() {
    let mut server = Server::new_async().await;
    let _missing = server
        .mock("GET", "/pypi/missing/json")
        .with_status(404)
        .create_async()
        .await;
    let _limited = server
        .mock("GET", "/pypi/busy/json")
        .with_status(429)
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/pypi/broken/json")
        .with_status(500)
        .create_async()
        .await;
    let _garbage = server
        .mock("GET", "/pypi/garbage/json")
        .with_status(200)
        .with_body("<html>")
        .create_async()
        .await;

    let client = PypiClient::with_registry_url(server.url());

    assert!(matches!(
        client.get_package_info("missing").await,
        Err(PypiError::PackageNotFound(_))
    ));
    assert!(!client.package_exists("missing").await.unwrap());
    assert!(matches!(
        client.get_package_info("busy").await,
        Err(PypiError::RateLimited)
    ));
    assert!(matches!(
        client.get_package_info("broken").await,
        Err(PypiError::UnexpectedStatus { status: 500, .. })
    ));
    assert!(matches!(
        client.get_package_info("garbage").await,
        Err(PypiError::ParseError(_))
    ));
}

#[tokio::test]
async fn test_invalid_name_is_rejected_before_request() {
    let client = PypiClient::with_registry_url("http://127.0.0.1:9".to_string());
    assert!(matches!(
        client.get_package_info("not a name").await,
        Err(PypiError::InvalidPackageName(_))
    ));
}
