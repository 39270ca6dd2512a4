use std::net::IpAddr;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use log::{debug, error, info};
use reqwest::Url;
use tokio_util::io::ReaderStream;

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::format::{inspect_header, FormatVersion, ModelHeader};
use crate::progress::{DownloadProgress, LoadStatus};

/// Upper bound on the buffer reserved from a declared content length. Larger
/// bodies grow as chunks arrive.
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Where a model's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Http(Url),
    File(PathBuf),
}

impl ModelSource {
    /// Accepts `http(s)://` and `file://` URLs or a plain path.
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => ModelSource::Http(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => ModelSource::File(path),
                Err(()) => ModelSource::File(PathBuf::from(location)),
            },
            _ => ModelSource::File(PathBuf::from(location)),
        }
    }

    /// Resolves `path` against this source's location, as a page would
    /// resolve a relative link.
    pub fn join(&self, path: &str) -> Self {
        if let Ok(url) = Url::parse(path) {
            if url.scheme().len() > 1 {
                return ModelSource::parse(path);
            }
        }

        match self {
            ModelSource::Http(base) => match base.join(path) {
                Ok(url) => ModelSource::Http(url),
                Err(_) => ModelSource::File(PathBuf::from(path)),
            },
            ModelSource::File(base) => ModelSource::File(base.join(path)),
        }
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::Http(url) => write!(f, "{}", url),
            ModelSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Downloaded model bytes together with the header that decided the loader.
#[derive(Debug, Clone)]
pub struct FetchedModel {
    pub bytes: Vec<u8>,
    pub header: ModelHeader,
}

impl FetchedModel {
    pub fn version(&self) -> FormatVersion {
        self.header.version
    }
}

/// Appends every chunk of `stream` in arrival order and reports download
/// progress against `total`.
pub async fn read_body<S, E>(
    stream: S,
    total: Option<u64>,
    ceiling: u8,
    status: &mut dyn LoadStatus,
) -> Result<Vec<u8>, ViewerError>
where
    S: Stream<Item = Result<Bytes, E>>,
    ViewerError: From<E>,
{
    let mut stream = std::pin::pin!(stream);
    let mut progress = DownloadProgress::new(total);
    let reserve = progress
        .total_bytes
        .map_or(0, |total| usize::try_from(total).unwrap_or(usize::MAX))
        .min(MAX_PREALLOCATION);
    let mut body = Vec::with_capacity(reserve);

    if progress.total_bytes.is_none() {
        status.set_progress(None);
    }

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        body.extend_from_slice(&chunk);
        progress.add_chunk(chunk.len());

        status.set_label("Downloading object ...");
        if let Some(percent) = progress.percent(ceiling) {
            status.set_progress(Some(percent));
        }

        debug!(
            "Received {} of {:?} bytes",
            progress.received_bytes, progress.total_bytes
        );
    }

    Ok(body)
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|addr| addr.is_loopback()),
        None => false,
    }
}

async fn fetch_http(
    url: &Url,
    config: &ViewerConfig,
    status: &mut dyn LoadStatus,
) -> Result<Vec<u8>, ViewerError> {
    let mut builder = reqwest::Client::builder();
    if is_loopback(url) {
        builder = builder.no_proxy();
    }
    let client = builder.build()?;
    let response = client.get(url.clone()).send().await?;

    if !response.status().is_success() {
        return Err(ViewerError::Network {
            status: response.status().as_u16(),
        });
    }

    let total = response.content_length();
    read_body(
        response.bytes_stream(),
        total,
        config.download_phase_ceiling,
        status,
    )
    .await
}

async fn fetch_file(
    path: &Path,
    config: &ViewerConfig,
    status: &mut dyn LoadStatus,
) -> Result<Vec<u8>, ViewerError> {
    let file = tokio::fs::File::open(path).await?;
    let total = file.metadata().await?.len();
    let stream = ReaderStream::with_capacity(file, config.chunk_size.max(1));

    read_body(stream, Some(total), config.download_phase_ceiling, status).await
}

async fn fetch_bytes(
    source: &ModelSource,
    config: &ViewerConfig,
    status: &mut dyn LoadStatus,
) -> Result<Vec<u8>, ViewerError> {
    match source {
        ModelSource::Http(url) => fetch_http(url, config, status).await,
        ModelSource::File(path) => fetch_file(path, config, status).await,
    }
}

async fn fetch_and_inspect(
    source: &ModelSource,
    config: &ViewerConfig,
    status: &mut dyn LoadStatus,
) -> Result<FetchedModel, ViewerError> {
    let bytes = fetch_bytes(source, config, status).await?;
    let header = inspect_header(&bytes)?;
    Ok(FetchedModel { bytes, header })
}

/// Downloads a model and detects its glTF version. Failures are written to
/// the status label before being returned.
pub async fn fetch_model(
    source: &ModelSource,
    config: &ViewerConfig,
    status: &mut dyn LoadStatus,
) -> Result<FetchedModel, ViewerError> {
    info!("Fetching model from {}", source);

    match fetch_and_inspect(source, config, status).await {
        Ok(model) => {
            status.set_label(match model.version() {
                FormatVersion::Legacy => "Reading object as glTF v.1 ...",
                FormatVersion::Current => "Reading object as glTF v.2 ...",
            });
            info!(
                "Fetched {} bytes, detected {}",
                model.bytes.len(),
                model.version()
            );
            Ok(model)
        }
        Err(err) => {
            error!("{}", err);
            status.set_label(&err.status_message());
            Err(err)
        }
    }
}
