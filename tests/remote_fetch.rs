use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::OnceLock;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use rust_table_extract::ingestion::{ExtractOptions, SourceFormat};
use rust_table_extract::remote::{FetchConfig, Fetcher};
use rust_table_extract::{ErrorKind, Table};
use tracing_subscriber::EnvFilter;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

fn reports_zip() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("summary.csv", options).unwrap();
    zip.write_all(b"Summary\nAAA,10\n\nFooter\n").unwrap();
    zip.start_file("trades.txt", options).unwrap();
    zip.write_all(b"CCC|5\n").unwrap();
    zip.start_file("README.md", options).unwrap();
    zip.write_all(b"# not data").unwrap();
    zip.finish().unwrap().into_inner()
}

async fn echo_headers(headers: HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };
    format!(
        "user-agent|{}\naccept|{}\nx-tenant|{}\n",
        header("user-agent"),
        header("accept"),
        header("x-tenant")
    )
}

fn router() -> Router {
    Router::new()
        .route("/reports.zip", get(|| async { reports_zip() }))
        .route("/broken.zip", get(|| async { "this is not a zip".to_string() }))
        .route(
            "/missing.zip",
            get(|| async { (StatusCode::NOT_FOUND, "no such report") }),
        )
        .route("/people.csv", get(|| async { "id,name\n1,Ada\n" }))
        .route("/headers.txt", get(echo_headers))
}

/// Start one server for the whole test binary and return its address.
fn server() -> SocketAddr {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();
    *ADDR.get_or_init(|| {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, router()).await.unwrap();
            });
        });
        addr
    })
}

fn url(path: &str) -> String {
    format!("http://{}{path}", server())
}

fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

fn opts_in(dir: &Path) -> ExtractOptions {
    ExtractOptions {
        scratch_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn fetch_archive_decodes_entries_and_removes_download() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Fetcher::new(FetchConfig::default()).unwrap();

    let contents = fetcher
        .fetch_archive(&url("/reports.zip"), "reports.zip", &opts_in(dir.path()))
        .unwrap();

    assert_eq!(contents.len(), 2);
    assert_eq!(contents.skipped, vec!["README.md".to_string()]);
    let summary = contents.table("summary.csv").unwrap();
    assert_eq!(summary.row_count(), 3);
    assert_eq!(summary.leading_cell(2), Some("Footer"));
    assert_eq!(
        contents.table("trades.txt").map(Table::rows),
        Some(&[vec!["CCC".to_string(), "5".to_string()]][..])
    );
    assert_eq!(entries_in(dir.path()), 0);
}

#[test]
fn corrupt_archive_fails_and_still_removes_download() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Fetcher::new(FetchConfig::default()).unwrap();

    let err = fetcher
        .fetch_archive(&url("/broken.zip"), "broken.zip", &opts_in(dir.path()))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ArchiveOpen);
    assert_eq!(entries_in(dir.path()), 0);
}

#[test]
fn non_success_status_is_rejected_before_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Fetcher::new(FetchConfig::default()).unwrap();

    let err = fetcher
        .fetch_archive(&url("/missing.zip"), "missing.zip", &opts_in(dir.path()))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnexpectedStatus);
    assert_eq!(err.stage(), "fetch:003");
    assert!(err.to_string().contains("404"));
    assert_eq!(entries_in(dir.path()), 0);
}

#[test]
fn fetch_table_decodes_body_in_requested_format() {
    let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
    let t = fetcher
        .fetch_table(&url("/people.csv"), SourceFormat::Csv, &ExtractOptions::default())
        .unwrap();
    assert_eq!(t.row_count(), 2);
    assert_eq!(t.rows()[1], vec!["1", "Ada"]);
}

#[test]
fn configured_headers_are_sent() {
    let cfg = FetchConfig::from_json_str(
        r#"{ "user_agent": "table-extract-tests/1.0", "timeout_secs": 5,
             "headers": { "Accept": "text/plain", "X-Tenant": "acme" } }"#,
    )
    .unwrap();
    let fetcher = Fetcher::new(cfg).unwrap();

    let t = fetcher
        .fetch_table(&url("/headers.txt"), SourceFormat::Text, &ExtractOptions::default())
        .unwrap();

    assert_eq!(t.rows()[0], vec!["user-agent", "table-extract-tests/1.0"]);
    assert_eq!(t.rows()[1], vec!["accept", "text/plain"]);
    assert_eq!(t.rows()[2], vec!["x-tenant", "acme"]);
}

#[test]
fn default_headers_are_sent() {
    let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
    let bytes = fetcher.fetch(&url("/headers.txt")).unwrap();
    let body = String::from_utf8(bytes).unwrap();

    assert!(body.contains("user-agent|PostmanRuntime/7.26.10\n"));
    assert!(body.contains("accept|*/*\n"));
}

#[test]
fn connection_refused_is_a_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let fetcher = Fetcher::new(FetchConfig::default()).unwrap();

    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{port}/x.zip"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
