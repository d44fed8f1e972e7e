use mockito::{Server, ServerGuard};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

use reqm::services::manifest_loader::ManifestLoader;
use reqm::services::manifest_parser::ManifestParser;
use reqm::services::pypi_client::PypiClient;
use reqm::services::resolver::Resolver;
use reqm::utils::lock_file::{hash_manifest, render_pinned, LockFileManager};

/// Resolution of whole manifests against a mock index

async fn mock_package(server: &mut ServerGuard, name: &str, versions: &[&str]) -> mockito::Mock {
    let releases: serde_json::Map<String, serde_json::Value> = versions
        .iter()
        .map(|v| (v.to_string(), json!([{ "filename": format!("{name}-{v}.tar.gz") }])))
        .collect();
    server
        .mock("GET", format!("/pypi/{name}/json").as_str())
        .with_status(200)
        .with_body(json!({ "info": { "name": name, "version": "0" }, "releases": releases }).to_string())
        .create_async()
        .await
}

fn resolver(server: &ServerGuard, concurrency: usize) -> Resolver {
    Resolver::new(PypiClient::with_registry_url(server.url()), concurrency)
}

#[tokio::test]
async fn test_resolve_in_manifest_order() {
    let mut server = Server::new_async().await;
    let names = ["h5py", "numpy", "opencv-python", "torch", "torchvision"];
    for name in names {
        mock_package(&mut server, name, &["1.0.0", "1.5.0", "2.0.0b1"]).await;
    }

    let manifest = ManifestParser::parse(
        "requirements.txt",
        "# Base\nh5py\nnumpy<1.5\nopencv-python\ntorch==1.0.*\ntorchvision>=2.0.0b1\n",
    );
    let resolution = resolver(&server, 2).resolve(&manifest).await;

    assert!(resolution.is_complete());
    let pins: Vec<(String, String)> = resolution
        .resolved
        .iter()
        .map(|p| (p.requirement.name.raw.clone(), p.version.clone()))
        .collect();
    assert_eq!(
        pins,
        vec![
            ("h5py".to_string(), "1.5.0".to_string()),
            ("numpy".to_string(), "1.0.0".to_string()),
            ("opencv-python".to_string(), "1.5.0".to_string()),
            ("torch".to_string(), "1.0.0".to_string()),
            ("torchvision".to_string(), "2.0.0b1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_duplicate_names_fetched_once() {
    let mut server = Server::new_async().await;
    let mock = mock_package(&mut server, "opencv-python", &["4.9.0.80"]).await;

    let manifest = ManifestParser::parse("requirements.txt", "opencv-python\nOpenCV_Python>=4\n");
    let resolution = resolver(&server, 4).resolve(&manifest).await;

    assert_eq!(resolution.resolved.len(), 2);
    assert_eq!(resolution.version_of("opencv_python"), Some("4.9.0.80"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_repeated_names_share_one_version() {
    let mut server = Server::new_async().await;
    mock_package(&mut server, "numpy", &["1.26.4", "2.0.0"]).await;

    let manifest = ManifestParser::parse("requirements.txt", "numpy>=1.20\nnumpy<2\n");
    let resolution = resolver(&server, 2).resolve(&manifest).await;

    assert!(resolution.is_complete());
    let versions: Vec<_> = resolution.resolved.iter().map(|r| r.version.as_str()).collect();
    assert_eq!(versions, vec!["1.26.4", "1.26.4"]);
    assert_eq!(render_pinned(&manifest, &resolution), "numpy==1.26.4\nnumpy==1.26.4\n");
}

#[tokio::test]
async fn test_conflicting_repeated_names_fail() {
    let mut server = Server::new_async().await;
    mock_package(&mut server, "numpy", &["1.26.4", "2.0.0"]).await;

    let manifest = ManifestParser::parse("requirements.txt", "numpy>=2\nnumpy<2\n");
    let resolution = resolver(&server, 2).resolve(&manifest).await;

    assert!(!resolution.is_complete());
    assert!(resolution.resolved.is_empty());
    assert_eq!(resolution.failures.len(), 2);
    assert_eq!(resolution.failures[0].reason, "no available version satisfies '>=2,<2'");
}

#[tokio::test]
async fn test_unparseable_included_line_fails_resolution() {
    let mut server = Server::new_async().await;
    mock_package(&mut server, "numpy", &["1.26.4"]).await;

    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("requirements.txt"), "numpy\n-r base.txt\n").unwrap();
    fs::write(temp_dir.path().join("base.txt"), "torch>=\n").unwrap();

    let manifest = ManifestLoader::new(true)
        .load(&temp_dir.path().join("requirements.txt"))
        .unwrap();
    let resolution = resolver(&server, 2).resolve(&manifest).await;

    assert!(!resolution.is_complete());
    assert_eq!(resolution.version_of("numpy"), Some("1.26.4"));
    assert_eq!(resolution.failures.len(), 1);
    assert!(resolution.failures[0].source.ends_with("base.txt"));
    assert_eq!(resolution.failures[0].name, "torch>=");
}

#[tokio::test]
async fn test_failure_is_isolated_to_its_package() {
    let mut server = Server::new_async().await;
    mock_package(&mut server, "numpy", &["1.26.4"]).await;
    let _down = server
        .mock("GET", "/pypi/torch/json")
        .with_status(503)
        .create_async()
        .await;

    let manifest = ManifestParser::parse("requirements.txt", "numpy\ntorch\n");
    let resolution = resolver(&server, 1).resolve(&manifest).await;

    assert!(!resolution.is_complete());
    assert_eq!(resolution.version_of("numpy"), Some("1.26.4"));
    assert_eq!(resolution.failures.len(), 1);
    assert_eq!(resolution.failures[0].name, "torch");
    assert_eq!(resolution.failures[0].line, 2);
}

#[tokio::test]
async fn test_resolve_includes_and_lock() {
    let mut server = Server::new_async().await;
    mock_package(&mut server, "numpy", &["1.26.4"]).await;
    mock_package(&mut server, "tensorboard", &["2.16.2"]).await;

    let temp_dir = TempDir::new().unwrap();
    let text = "# Base\n-r base.txt\n\n# Logging\ntensorboard\n";
    fs::write(temp_dir.path().join("requirements.txt"), text).unwrap();
    fs::write(temp_dir.path().join("base.txt"), "numpy\n").unwrap();

    let manifest = ManifestLoader::new(true)
        .load(&temp_dir.path().join("requirements.txt"))
        .unwrap();
    let resolution = resolver(&server, 4).resolve(&manifest).await;
    assert!(resolution.is_complete());
    assert!(resolution.resolved[0].source.ends_with("base.txt"));

    let lock = LockFileManager::generate(text, &server.url(), &resolution).unwrap();
    assert_eq!(lock.packages.len(), 2);
    assert_eq!(lock.get("tensorboard").unwrap().section.as_deref(), Some("Logging"));
    assert!(lock.matches_manifest(&hash_manifest(text)));

    assert_eq!(
        render_pinned(&manifest, &resolution),
        "# Base\n-r base.txt\n\n# Logging\ntensorboard==2.16.2\n"
    );
}
