use std::sync::Arc;
use std::time::Duration;

use gemlet::capsule::RegistryBuilder;
use gemlet::capsule::builtin::Echo;
use gemlet::dispatch::Dispatcher;
use gemlet::gemini::connection::Connection;
use gemlet::gemini::parser::MAX_REQUEST_LINE;
use gemlet::gemini::request::Request;
use gemlet::gemini::response::Response;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

fn dispatcher(hostname: Option<&str>) -> Arc<Dispatcher> {
    let mut builder = RegistryBuilder::new();
    builder
        .register("/app", |req: &Request| -> anyhow::Result<Response> {
            Ok(Response::success(format!("path={}", req.path)))
        })
        .unwrap()
        .register("/echo", Echo)
        .unwrap();
    Arc::new(Dispatcher::new(hostname.map(str::to_string), builder.build(), None))
}

/// Sends `input` on a fresh connection and collects everything the server
/// writes until it closes.
async fn exchange(dispatcher: Arc<Dispatcher>, input: &[u8], timeout: Option<Duration>) -> Vec<u8> {
    let (mut client, server) = duplex(8192);
    let task = tokio::spawn(async move {
        let mut connection = Connection::new(server, dispatcher).with_read_timeout(timeout);
        connection.run().await
    });

    client.write_all(input).await.unwrap();
    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();

    task.await.unwrap().unwrap();
    out
}

#[tokio::test]
async fn test_capsule_exchange() {
    let out = exchange(dispatcher(None), b"gemini://localhost/app/\r\n", None).await;

    assert_eq!(out, b"20 text/gemini; lang=en; charset=utf-8\r\npath=/app/".to_vec());
}

#[tokio::test]
async fn test_bare_newline_terminates_request() {
    let out = exchange(dispatcher(None), b"gemini://localhost/app\n", None).await;

    assert!(out.starts_with(b"20 "));
}

#[tokio::test]
async fn test_input_prompt() {
    let out = exchange(dispatcher(None), b"gemini://localhost/echo\r\n", None).await;

    assert_eq!(out, b"10 Say something\r\n".to_vec());
}

#[tokio::test]
async fn test_echo_with_query() {
    let out = exchange(dispatcher(None), b"gemini://localhost/echo?hi%21\r\n", None).await;

    assert!(out.ends_with(b"> hi!\n"));
}

#[tokio::test]
async fn test_not_found() {
    let out = exchange(dispatcher(None), b"gemini://localhost/missing\r\n", None).await;

    assert_eq!(out, b"51 \r\n".to_vec());
}

#[tokio::test]
async fn test_unparseable_line_is_bad_request() {
    let out = exchange(dispatcher(None), b"not a url\r\n", None).await;

    assert_eq!(out, b"59 \r\n".to_vec());
}

#[tokio::test]
async fn test_path_traversal_is_bad_request() {
    let out = exchange(dispatcher(None), b"gemini://localhost/../etc/passwd\r\n", None).await;

    assert_eq!(out, b"59 \r\n".to_vec());
}

#[tokio::test]
async fn test_wrong_host_is_bad_request() {
    let d = dispatcher(Some("example.org"));

    let out = exchange(Arc::clone(&d), b"gemini://example.com/app\r\n", None).await;
    assert_eq!(out, b"59 \r\n".to_vec());

    let out = exchange(d, b"gemini://example.org/app\r\n", None).await;
    assert!(out.starts_with(b"20 "));
}

#[tokio::test]
async fn test_bytes_after_request_line_are_ignored() {
    let out = exchange(
        dispatcher(None),
        b"gemini://localhost/app\r\ngemini://localhost/echo\r\n",
        None,
    )
    .await;

    assert!(out.ends_with(b"path=/app"));
}

#[tokio::test]
async fn test_longest_allowed_request_line() {
    let prefix = "gemini://localhost/";
    let line = format!("{prefix}{}\r\n", "a".repeat(MAX_REQUEST_LINE - prefix.len()));

    let out = exchange(dispatcher(None), line.as_bytes(), None).await;
    assert_eq!(out, b"51 \r\n".to_vec());
}

#[tokio::test]
async fn test_oversized_request_line() {
    let prefix = "gemini://localhost/";
    let line = format!("{prefix}{}\r\n", "a".repeat(MAX_REQUEST_LINE + 1 - prefix.len()));

    let out = exchange(dispatcher(None), line.as_bytes(), None).await;
    assert_eq!(out, b"59 \r\n".to_vec());
}

#[tokio::test]
async fn test_longest_allowed_request_line_with_bare_newline() {
    let prefix = "gemini://localhost/";
    let line = format!("{prefix}{}\n", "a".repeat(MAX_REQUEST_LINE - prefix.len()));

    let out = exchange(dispatcher(None), line.as_bytes(), None).await;
    assert_eq!(out, b"51 \r\n".to_vec());
}

#[tokio::test]
async fn test_oversized_request_line_with_bare_newline() {
    let prefix = "gemini://localhost/";
    let line = format!("{prefix}{}\n", "a".repeat(MAX_REQUEST_LINE + 1 - prefix.len()));

    let out = exchange(dispatcher(None), line.as_bytes(), None).await;
    assert_eq!(out, b"59 \r\n".to_vec());
}

#[tokio::test]
async fn test_oversized_line_without_terminator() {
    let junk = vec![b'x'; MAX_REQUEST_LINE * 2];

    let out = exchange(dispatcher(None), &junk, None).await;
    assert_eq!(out, b"59 \r\n".to_vec());
}

#[tokio::test]
async fn test_disconnect_before_line_end() {
    let (mut client, server) = duplex(8192);
    let task = tokio::spawn(async move {
        let mut connection = Connection::new(server, dispatcher(None));
        connection.run().await
    });

    client.write_all(b"gemini://localhost/app").await.unwrap();
    client.shutdown().await.unwrap();

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();

    assert!(out.is_empty());
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_read_timeout_closes_silently() {
    let (mut client, server) = duplex(8192);
    let task = tokio::spawn(async move {
        let mut connection =
            Connection::new(server, dispatcher(None)).with_read_timeout(Some(Duration::from_millis(50)));
        connection.run().await
    });

    let mut out = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut out)).await;

    assert!(read.is_ok());
    assert!(out.is_empty());
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_split_request_line() {
    let (mut client, server) = duplex(8192);
    let task = tokio::spawn(async move {
        let mut connection = Connection::new(server, dispatcher(None));
        connection.run().await
    });

    client.write_all(b"gemini://local").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    client.write_all(b"host/app\r\n").await.unwrap();

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();

    assert!(out.ends_with(b"path=/app"));
    assert!(task.await.unwrap().is_ok());
}
