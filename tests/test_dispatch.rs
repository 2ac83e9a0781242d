use std::path::PathBuf;

use gemlet::capsule::{Capsule, RegistryBuilder};
use gemlet::dispatch::{Dispatcher, Rejection};
use gemlet::files::StaticFiles;
use gemlet::gemini::request::Request;
use gemlet::gemini::response::{Response, StatusCode};

struct Failing;

impl Capsule for Failing {
    fn handle(&self, _request: &Request) -> anyhow::Result<Response> {
        anyhow::bail!("database unavailable")
    }
}

struct Panicking;

impl Capsule for Panicking {
    fn handle(&self, _request: &Request) -> anyhow::Result<Response> {
        panic!("capsule bug")
    }
}

fn document_root(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("gemlet-dispatch-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("index.gmi"), "# Index\n").unwrap();
    std::fs::write(root.join("app.gmi"), "file, not capsule").unwrap();
    root
}

fn dispatcher(hostname: Option<&str>, root: Option<PathBuf>) -> Dispatcher {
    let mut builder = RegistryBuilder::new();
    builder
        .register("/app", |_: &Request| -> anyhow::Result<Response> {
            Ok(Response::success("from capsule"))
        })
        .unwrap()
        .register("/fail", Failing)
        .unwrap()
        .register("/panic", Panicking)
        .unwrap();

    Dispatcher::new(
        hostname.map(str::to_string),
        builder.build(),
        root.map(StaticFiles::new),
    )
}

#[test]
fn test_validate_rejects_unparseable_line() {
    let d = dispatcher(None, None);

    assert_eq!(d.validate(&Request::parse("not a url")), Err(Rejection::Unparseable));
    assert_eq!(d.validate(&Request::parse("")), Err(Rejection::Unparseable));
}

#[test]
fn test_validate_rejects_dot_dot_anywhere() {
    let d = dispatcher(None, None);

    for line in [
        "gemini://localhost/../secret",
        "gemini://localhost/a/..",
        "gemini://localhost/a..b",
        "https://other.host/..",
    ] {
        assert_eq!(d.validate(&Request::parse(line)), Err(Rejection::PathTraversal));
    }
}

#[test]
fn test_validate_virtual_host() {
    let d = dispatcher(Some("example.org"), None);

    assert_eq!(d.validate(&Request::parse("gemini://example.org/")), Ok(()));
    assert_eq!(
        d.validate(&Request::parse("gemini://example.com/")),
        Err(Rejection::HostMismatch)
    );
    assert_eq!(
        d.validate(&Request::parse("gemini://example.orgx/")),
        Err(Rejection::HostMismatch)
    );
    assert_eq!(
        d.validate(&Request::parse("gemini://www.example.org/")),
        Err(Rejection::HostMismatch)
    );
}

#[test]
fn test_validate_any_host_without_filter() {
    let d = dispatcher(None, None);

    assert_eq!(d.validate(&Request::parse("gemini://anything.at.all/")), Ok(()));
    assert_eq!(dispatcher(Some(""), None).hostname(), None);
}

#[tokio::test]
async fn test_dispatch_prefers_capsule_over_file() {
    let d = dispatcher(None, Some(document_root("capsule")));

    let resp = d.dispatch(Request::parse("gemini://localhost/app")).await;
    assert_eq!(resp.body, b"from capsule".to_vec());

    let resp = d.dispatch(Request::parse("gemini://localhost/app/")).await;
    assert_eq!(resp.body, b"from capsule".to_vec());
}

#[tokio::test]
async fn test_dispatch_falls_back_to_files() {
    let d = dispatcher(None, Some(document_root("fallback")));

    let resp = d.dispatch(Request::parse("gemini://localhost/")).await;
    assert_eq!(resp.status, StatusCode::Success);
    assert_eq!(resp.media_type, "text/gemini");
    assert_eq!(resp.language, "en");
    assert_eq!(resp.charset, "utf-8");
    assert_eq!(resp.body, b"# Index\n".to_vec());

    let resp = d.dispatch(Request::parse("gemini://localhost")).await;
    assert_eq!(resp.body, b"# Index\n".to_vec());
}

#[tokio::test]
async fn test_dispatch_not_found() {
    let d = dispatcher(None, Some(document_root("missing")));

    let resp = d.dispatch(Request::parse("gemini://localhost/apps")).await;
    assert_eq!(resp.status, StatusCode::NotFound);
    assert!(resp.body.is_empty());
    assert!(resp.meta.is_empty());
}

#[tokio::test]
async fn test_dispatch_without_document_root() {
    let d = dispatcher(None, None);

    let resp = d.dispatch(Request::parse("gemini://localhost/")).await;
    assert_eq!(resp.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_dispatch_capsule_error_is_temporary_failure() {
    let d = dispatcher(None, None);

    let resp = d.dispatch(Request::parse("gemini://localhost/fail")).await;
    assert_eq!(resp, Response::temporary_failure());
}

#[tokio::test]
async fn test_dispatch_capsule_panic_is_temporary_failure() {
    let d = dispatcher(None, None);

    let resp = d.dispatch(Request::parse("gemini://localhost/panic")).await;
    assert_eq!(resp.status, StatusCode::TemporaryFailure);

    // The dispatcher keeps working afterwards
    let resp = d.dispatch(Request::parse("gemini://localhost/app")).await;
    assert_eq!(resp.status, StatusCode::Success);
}
