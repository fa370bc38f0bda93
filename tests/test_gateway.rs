use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tinyweb::http::response::{Body, ChunkStream, ResponseBuilder};
use tinyweb::http::writer::ResponseWriter;
use tinyweb::{Application, Envelope, Error, Reply, Route, Settings, Status};

#[derive(Debug, thiserror::Error)]
#[error("boom")]
struct Boom;

fn app() -> Application {
    let mut app = Application::new(Settings::from_yaml("debug: false").unwrap());
    app.route_with(
        Route::new("GET", r"/hello/(\w+)").unwrap().query("greeting"),
        |_req, args| {
            Ok(format!(
                "{} {}",
                args.keyword_or("greeting", "Hello"),
                args.positional[0]
            ))
        },
    );
    app.post("/echo", |req, _args| Ok(req.form()?.get_str("msg").unwrap_or("").to_string()))
        .unwrap();
    app.get("/stream", |_req, _args| {
        Ok(Reply::stream(["ab", "cde"].into_iter().map(Ok::<_, Error>)))
    })
    .unwrap();
    app.head("/stream", |_req, _args| {
        Ok(Reply::stream(["ab", "cde"].into_iter().map(Ok::<_, Error>)))
    })
    .unwrap();
    app.get("/boom", |_req, _args| -> Result<(), Error> { Err(Error::fault(Boom)) })
        .unwrap();
    app.get("/away", |_req, _args| -> Result<(), Error> { Err(Status::see_other("/").into()) })
        .unwrap();
    app
}

async fn roundtrip(raw: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(tinyweb::server::listener::serve(Arc::new(app()), listener));

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(raw.as_bytes()).await.unwrap();

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_gateway_serves_routed_request() {
    let out = roundtrip("GET /hello/ann?greeting=Hi HTTP/1.1\r\nConnection: close\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.ends_with("\r\n\r\nHi ann"));
}

#[tokio::test]
async fn test_gateway_decodes_posted_form() {
    let out = roundtrip(concat!(
        "POST /echo HTTP/1.1\r\n",
        "Connection: close\r\n",
        "Content-Type: application/x-www-form-urlencoded\r\n",
        "Content-Length: 13\r\n",
        "\r\n",
        "msg=hi+there",
        "!",
    ))
    .await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.ends_with("hi there!"));
}

#[tokio::test]
async fn test_gateway_streams_chunked() {
    let out = roundtrip("GET /stream HTTP/1.1\r\nConnection: close\r\n\r\n").await;

    assert!(out.contains("Transfer-Encoding: chunked\r\n"));
    assert!(out.ends_with("\r\n\r\n2\r\nab\r\n3\r\ncde\r\n0\r\n\r\n"));
}

#[tokio::test]
async fn test_gateway_answers_statuses() {
    let out = roundtrip("DELETE /hello/x HTTP/1.1\r\nConnection: close\r\n\r\n").await;
    assert!(out.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));

    let out = roundtrip("GET /away HTTP/1.1\r\nConnection: close\r\n\r\n").await;
    assert!(out.starts_with("HTTP/1.1 303 See Other\r\n"));
    assert!(out.contains("Location: /\r\n"));
}

#[tokio::test]
async fn test_gateway_turns_fault_into_bare_500() {
    let out = roundtrip("GET /boom HTTP/1.1\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(out.ends_with("500 Internal Server Error"));
}

#[tokio::test]
async fn test_writer_full_body() {
    let response = app().dispatch(Envelope::new("GET", "/hello/bo")).unwrap();
    let mut out = Vec::new();

    ResponseWriter::new(response)
        .write_to_stream(&mut out)
        .await
        .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert_eq!(out, "HTTP/1.1 200 OK\r\nContent-Length: 8\r\n\r\nHello bo");
}

#[tokio::test]
async fn test_gateway_head_has_no_body() {
    let out = roundtrip("HEAD /stream HTTP/1.1\r\nConnection: close\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.ends_with("\r\n\r\n"));
    assert!(!out.contains("cde"));
}

#[tokio::test]
async fn test_writer_pulls_blocking_chunks_off_the_runtime() {
    let (tx, rx) = mpsc::channel::<&'static str>();
    let rest: ChunkStream = Box::new(std::iter::from_fn(move || {
        rx.recv().ok().map(|part| Ok(Bytes::from_static(part.as_bytes())))
    }));
    let response = ResponseBuilder::new(200, "OK")
        .body(Body::Stream { first: None, rest })
        .build();

    // The chunks are fed from a task on the same runtime the writer runs on.
    tokio::spawn(async move {
        for part in ["a", "b"] {
            tokio::task::yield_now().await;
            tx.send(part).unwrap();
        }
    });

    let mut out = Vec::new();
    tokio::time::timeout(
        Duration::from_secs(5),
        ResponseWriter::new(response).write_to_stream(&mut out),
    )
    .await
    .unwrap()
    .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.ends_with("\r\n\r\n1\r\na\r\n1\r\nb\r\n0\r\n\r\n"));
}
