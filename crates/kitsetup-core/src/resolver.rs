use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::entry::SourceDescriptor;

/// File name used when a link has no usable final path segment.
const FALLBACK_FILE_NAME: &str = "installer";

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Transport failure or non-success HTTP status.
    #[error("download of {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("package not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid download link '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("entry has no installable source")]
    Unresolvable,
}

/// Turns a source descriptor into the path of a runnable installer.
pub trait Resolve {
    /// Produce a local artifact for `source`, staging downloads in `work_dir`.
    fn resolve(
        &self,
        source: &SourceDescriptor,
        work_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf, ResolveError>> + Send;
}

/// Byte accounting for one download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub bytes: u64,
    pub chunks: usize,
    /// Size of the biggest chunk held in memory at once
    pub largest_chunk: usize,
}

impl DownloadStats {
    fn record(&mut self, len: usize) {
        self.bytes += len as u64;
        self.chunks += 1;
        self.largest_chunk = self.largest_chunk.max(len);
    }
}

/// Resolves links by streaming them to disk and packages by checking that
/// they exist.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    client: reqwest::Client,
}

impl SourceResolver {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("kitsetup/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Download `url` into `work_dir`, named after the URL's last path segment.
    pub async fn download(&self, url: &str, work_dir: &Path) -> Result<PathBuf, ResolveError> {
        let parsed = Url::parse(url).map_err(|source| ResolveError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let dest = work_dir.join(file_name_from_url(&parsed));
        self.download_to(parsed, &dest).await?;
        mark_executable(&dest).await?;
        Ok(dest)
    }

    /// Stream the body of `url` into `dest` chunk by chunk.
    ///
    /// Only one chunk is in memory at a time, so installer size does not
    /// affect memory use.
    pub async fn download_to(&self, url: Url, dest: &Path) -> Result<DownloadStats, ResolveError> {
        let url_text = url.to_string();
        let network = |source: reqwest::Error| ResolveError::Network {
            url: url_text.clone(),
            source,
        };
        let io_error = |source: io::Error| ResolveError::Io {
            path: dest.to_path_buf(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(network)?;

        let mut file = tokio::fs::File::create(dest).await.map_err(io_error)?;
        let mut body = response.bytes_stream();
        let mut stats = DownloadStats::default();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(network)?;
            file.write_all(&chunk).await.map_err(io_error)?;
            stats.record(chunk.len());
        }
        file.flush().await.map_err(io_error)?;

        Ok(stats)
    }
}

impl Resolve for SourceResolver {
    async fn resolve(
        &self,
        source: &SourceDescriptor,
        work_dir: &Path,
    ) -> Result<PathBuf, ResolveError> {
        match source {
            SourceDescriptor::Link { url } => self.download(url, work_dir).await,
            SourceDescriptor::Package { path } => resolve_package(Path::new(path)).await,
            SourceDescriptor::Unknown => Err(ResolveError::Unresolvable),
        }
    }
}

/// A local package is used in place, no copy is made.
///
/// The returned path is absolute: spawning a bare relative name would search
/// `PATH` instead of running the file checked here.
async fn resolve_package(path: &Path) -> Result<PathBuf, ResolveError> {
    let not_found = || ResolveError::NotFound {
        path: path.to_path_buf(),
    };
    let absolute = std::path::absolute(path).map_err(|_| not_found())?;
    match tokio::fs::try_exists(&absolute).await {
        Ok(true) => Ok(absolute),
        _ => Err(not_found()),
    }
}

/// Last non-empty path segment of `url`; query and fragment are ignored.
pub fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.rev().find(|s| !s.is_empty()))
        .map(|s| s.replace(['\\', ':'], "_"))
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> Result<(), ResolveError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> Result<(), ResolveError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid url")
    }

    fn link(url: String) -> SourceDescriptor {
        SourceDescriptor::Link { url }
    }

    // -- file_name_from_url tests --

    #[test]
    fn test_file_name_is_last_segment() {
        assert_eq!(file_name_from_url(&url("http://x/a.exe")), "a.exe");
        assert_eq!(
            file_name_from_url(&url("https://cdn.example.com/dl/v2/setup-x64.msi")),
            "setup-x64.msi"
        );
    }

    #[test]
    fn test_file_name_ignores_query_and_trailing_slash() {
        assert_eq!(
            file_name_from_url(&url("https://example.com/get/tool.exe?token=abc#frag")),
            "tool.exe"
        );
        assert_eq!(file_name_from_url(&url("https://example.com/tools/")), "tools");
    }

    #[test]
    fn test_file_name_falls_back_without_segments() {
        assert_eq!(file_name_from_url(&url("https://example.com")), "installer");
        assert_eq!(file_name_from_url(&url("https://example.com/")), "installer");
    }

    // -- resolve tests --

    #[tokio::test]
    async fn test_resolve_link_downloads_into_work_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/a.exe"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MZ fake installer".to_vec()))
            .mount(&server)
            .await;

        let work = TempDir::new().expect("tempdir");
        let resolver = SourceResolver::new().expect("client");
        let artifact = resolver
            .resolve(&link(format!("{}/files/a.exe", server.uri())), work.path())
            .await
            .expect("download should succeed");

        assert_eq!(artifact, work.path().join("a.exe"));
        let content = std::fs::read(&artifact).expect("read artifact");
        assert_eq!(content, b"MZ fake installer");
    }

    #[tokio::test]
    async fn test_with_client_uses_the_given_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b.exe"))
            .and(header("user-agent", "kitsetup-mirror/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .user_agent("kitsetup-mirror/1")
            .build()
            .expect("client");
        let work = TempDir::new().expect("tempdir");
        let artifact = SourceResolver::with_client(client)
            .resolve(&link(format!("{}/b.exe", server.uri())), work.path())
            .await
            .expect("request should carry the custom user agent");

        assert_eq!(std::fs::read(&artifact).expect("read"), b"ok");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_downloaded_artifact_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#!/bin/sh\n"))
            .mount(&server)
            .await;

        let work = TempDir::new().expect("tempdir");
        let resolver = SourceResolver::new().expect("client");
        let artifact = resolver
            .download(&format!("{}/setup.sh", server.uri()), work.path())
            .await
            .expect("download should succeed");

        let mode = std::fs::metadata(&artifact).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[tokio::test]
    async fn test_resolve_link_error_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let work = TempDir::new().expect("tempdir");
        let resolver = SourceResolver::new().expect("client");
        let result = resolver
            .resolve(&link(format!("{}/missing.exe", server.uri())), work.path())
            .await;

        assert!(
            matches!(result, Err(ResolveError::Network { .. })),
            "expected Network error, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_resolve_link_connection_refused_is_network_error() {
        // Bind then drop a listener so the port is closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };

        let work = TempDir::new().expect("tempdir");
        let resolver = SourceResolver::new().expect("client");
        let result = resolver
            .resolve(&link(format!("http://127.0.0.1:{port}/a.exe")), work.path())
            .await;

        assert!(matches!(result, Err(ResolveError::Network { .. })));
    }

    #[tokio::test]
    async fn test_resolve_invalid_link() {
        let work = TempDir::new().expect("tempdir");
        let resolver = SourceResolver::new().expect("client");
        let result = resolver
            .resolve(&link("not a url".to_string()), work.path())
            .await;

        assert!(matches!(result, Err(ResolveError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_large_body_is_streamed_in_chunks() {
        const BODY_LEN: usize = 8 * 1024 * 1024;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xA5u8; BODY_LEN]))
            .mount(&server)
            .await;

        let work = TempDir::new().expect("tempdir");
        let dest = work.path().join("big.bin");
        let resolver = SourceResolver::new().expect("client");
        let stats = resolver
            .download_to(url(&format!("{}/big.bin", server.uri())), &dest)
            .await
            .expect("download should succeed");

        assert_eq!(stats.bytes, BODY_LEN as u64);
        assert!(stats.chunks > 1, "body arrived in a single chunk");
        assert!(
            stats.largest_chunk < BODY_LEN / 4,
            "largest chunk {} is not bounded",
            stats.largest_chunk
        );
        let written = std::fs::metadata(&dest).expect("metadata").len();
        assert_eq!(written, BODY_LEN as u64);
    }

    #[tokio::test]
    async fn test_resolve_existing_package_is_used_in_place() {
        let dir = TempDir::new().expect("tempdir");
        let pkg = dir.path().join("setup.exe");
        std::fs::write(&pkg, b"installer").expect("write");

        let work = TempDir::new().expect("tempdir");
        let resolver = SourceResolver::new().expect("client");
        let source = SourceDescriptor::Package {
            path: pkg.display().to_string(),
        };
        let artifact = resolver
            .resolve(&source, work.path())
            .await
            .expect("package exists");

        assert_eq!(artifact, pkg);
        let staged = std::fs::read_dir(work.path()).expect("read work dir").count();
        assert_eq!(staged, 0, "package must not be copied");
    }

    #[tokio::test]
    async fn test_relative_package_resolves_against_current_dir() {
        // cargo runs unit tests from the crate root
        let cwd = std::env::current_dir().expect("cwd");
        let work = TempDir::new().expect("tempdir");
        let resolver = SourceResolver::new().expect("client");
        let source = SourceDescriptor::Package {
            path: "Cargo.toml".to_string(),
        };
        let artifact = resolver
            .resolve(&source, work.path())
            .await
            .expect("package exists");

        assert!(artifact.is_absolute());
        assert_eq!(artifact, cwd.join("Cargo.toml"));
    }

    #[tokio::test]
    async fn test_resolve_missing_package_is_not_found() {
        let work = TempDir::new().expect("tempdir");
        let resolver = SourceResolver::new().expect("client");
        let source = SourceDescriptor::Package {
            path: "/no/such/file".to_string(),
        };
        let result = resolver.resolve(&source, work.path()).await;

        match result {
            Err(ResolveError::NotFound { path }) => assert_eq!(path, PathBuf::from("/no/such/file")),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_unknown_is_rejected() {
        let work = TempDir::new().expect("tempdir");
        let resolver = SourceResolver::new().expect("client");
        let result = resolver.resolve(&SourceDescriptor::Unknown, work.path()).await;
        assert!(matches!(result, Err(ResolveError::Unresolvable)));
    }
}
