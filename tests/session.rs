use std::path::PathBuf;

use approx::assert_relative_eq;
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use objectviewer::catalog::ModelCatalog;
use objectviewer::progress::LoadStatus;
use objectviewer::routing::{ModelConfig, ViewerRoute};
use objectviewer::units::UnitScale;
use objectviewer::{FormatVersion, ModelSource, ViewerConfig, ViewerError, ViewerSession};

#[derive(Debug, Default)]
struct RecordedStatus {
    labels: Vec<String>,
    progress: Vec<Option<u8>>,
}

impl LoadStatus for RecordedStatus {
    fn set_label(&mut self, label: &str) {
        self.labels.push(label.to_string());
    }

    fn set_progress(&mut self, percent: Option<u8>) {
        self.progress.push(percent);
    }
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_bytes(name: &str) -> Vec<u8> {
    std::fs::read(fixture(name)).unwrap()
}

/// Answers a single request with `status_line` and `body`, optionally
/// without a Content-Length header.
async fn serve_once(status_line: &'static str, body: Vec<u8>, content_length: bool) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;

        let mut head = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status_line);
        if content_length {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        head.push_str("\r\n");

        socket.write_all(head.as_bytes()).await.unwrap();
        for chunk in body.chunks(97) {
            socket.write_all(chunk).await.unwrap();
        }
        let _ = socket.shutdown().await;
    });

    Url::parse(&format!("http://{}/models/model.gltf", addr)).unwrap()
}

fn direct(source: ModelSource, scale: Option<UnitScale>) -> ModelConfig {
    ModelConfig::direct(
        source,
        &ViewerRoute {
            scale,
            ..ViewerRoute::default()
        },
    )
}

#[tokio::test]
async fn not_found_is_a_network_error() {
    let url = serve_once("404 Not Found", b"{ not json".to_vec(), true).await;
    let mut status = RecordedStatus::default();

    let result = ViewerSession::open(
        direct(ModelSource::Http(url), None),
        ViewerConfig::default(),
        &mut status,
    )
    .await;

    assert!(matches!(result, Err(ViewerError::Network { status: 404 })));
    assert_eq!(
        status.labels,
        vec!["Object could not be loaded. HTTP error status: 404".to_string()]
    );
    assert!(status.progress.is_empty());
}

#[tokio::test]
async fn downloads_and_frames_a_current_model() {
    let url = serve_once("200 OK", fixture_bytes("cube_v2.gltf"), true).await;
    let mut status = RecordedStatus::default();

    let session = ViewerSession::open(
        direct(ModelSource::Http(url), Some(UnitScale::Meters)),
        ViewerConfig::default(),
        &mut status,
    )
    .await
    .unwrap();

    assert_eq!(session.version(), FormatVersion::Current);
    assert_eq!(session.header.generator.as_deref(), Some("objectviewer fixtures"));

    assert_relative_eq!(session.bounds.min.y, 1.0, epsilon = 1e-5);
    assert_relative_eq!(session.bounds.max.y, 5.0, epsilon = 1e-5);
    assert_relative_eq!(session.box_size(), 21.0_f32.sqrt(), epsilon = 1e-5);

    let report = session.debug_report();
    assert_relative_eq!(report.camera_near, session.box_size() / 100.0);
    assert_relative_eq!(report.camera_far, session.box_size() * 100.0);
    assert_eq!(session.camera.target, session.bounds.center());

    for label in [
        "Downloading object ...",
        "Reading object as glTF v.2 ...",
        "Loading object resources ...",
        "Loaded",
    ] {
        assert!(status.labels.iter().any(|l| l == label), "missing label {label}");
    }

    let download_end = status
        .progress
        .iter()
        .position(|p| *p == Some(75))
        .expect("download reaches the ceiling");
    assert!(status.progress[..download_end]
        .iter()
        .all(|p| p.is_some_and(|p| p <= 75)));
    assert_eq!(status.progress.last(), Some(&Some(100)));
}

#[tokio::test]
async fn missing_content_length_is_indeterminate() {
    let url = serve_once("200 OK", fixture_bytes("cube_v1.gltf"), false).await;
    let mut status = RecordedStatus::default();

    let session = ViewerSession::open(
        direct(ModelSource::Http(url), None),
        ViewerConfig::default(),
        &mut status,
    )
    .await
    .unwrap();

    assert_eq!(session.version(), FormatVersion::Legacy);
    assert_eq!(status.progress.first(), Some(&None));
    assert!(session.measurements.is_none());
}

#[tokio::test]
async fn legacy_and_current_files_frame_identically() {
    let mut status = RecordedStatus::default();
    let current = ViewerSession::open(
        direct(ModelSource::File(fixture("cube_v2.gltf")), None),
        ViewerConfig::default(),
        &mut status,
    )
    .await
    .unwrap();
    let legacy = ViewerSession::open(
        direct(ModelSource::File(fixture("cube_v1.gltf")), None),
        ViewerConfig::default(),
        &mut status,
    )
    .await
    .unwrap();

    for (a, b) in [
        (current.bounds.min, legacy.bounds.min),
        (current.bounds.max, legacy.bounds.max),
        (current.camera.eye, legacy.camera.eye),
    ] {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }
}

#[tokio::test]
async fn model_without_geometry_is_a_format_error() {
    let mut status = RecordedStatus::default();
    let result = ViewerSession::open(
        direct(ModelSource::File(fixture("empty_v2.gltf")), None),
        ViewerConfig::default(),
        &mut status,
    )
    .await;

    assert!(matches!(result, Err(ViewerError::Format(_))));
    assert_eq!(status.labels.last().map(String::as_str), Some("Error loading object."));
}

#[tokio::test]
async fn catalog_route_drives_measurements() {
    let catalog = ModelCatalog::from_path(fixture("models.json")).unwrap();
    let base = ModelSource::File(fixture(""));
    let url = Url::parse("https://example.org/currentviewer.html?model=1&debug=true").unwrap();
    let route = ViewerRoute::from_url(&url);

    let model = ModelConfig::resolve(&catalog, &route, &base).unwrap();
    assert_eq!(model.scale, UnitScale::Centimeters);
    assert!(model.debug);

    let mut status = RecordedStatus::default();
    let mut session = ViewerSession::open(model, ViewerConfig::default(), &mut status)
        .await
        .unwrap();

    let measurements = session.measurements.unwrap();
    let mm = measurements.display(UnitScale::Millimeters).unwrap();
    assert_relative_eq!(mm.width, 20.0, epsilon = 1e-4);
    assert_relative_eq!(mm.height, 40.0, epsilon = 1e-4);
    assert_relative_eq!(mm.depth, 10.0, epsilon = 1e-4);

    let feet_direct = measurements.display(UnitScale::Feet).unwrap();
    let _ = measurements.display(UnitScale::Inches);
    assert_eq!(measurements.display(UnitScale::Feet).unwrap(), feet_direct);

    let eye = session.camera.eye;
    session.reset_camera();
    assert_relative_eq!(session.camera.eye.x, eye.x, epsilon = 1e-5);
    assert_relative_eq!(session.camera.eye.z, eye.z, epsilon = 1e-5);

    let unmeasured = ModelConfig::resolve(
        &catalog,
        &ViewerRoute {
            model: Some(3),
            ..ViewerRoute::default()
        },
        &base,
    )
    .unwrap();
    let session = ViewerSession::open(unmeasured, ViewerConfig::default(), &mut status)
        .await
        .unwrap();
    assert!(session.measurements.is_none());
}
