use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tinyweb::http::content;
use tinyweb::http::cookie::Cookie;
use tinyweb::{Application, Envelope, Error, Reply, Settings, Status};

fn app(debug: bool) -> Application {
    let yaml = format!("debug: {debug}");
    Application::new(Settings::from_yaml(&yaml).unwrap())
}

fn body_text(response: tinyweb::Response) -> String {
    String::from_utf8(response.body.collect().unwrap().to_vec()).unwrap()
}

#[derive(Debug, thiserror::Error)]
#[error("my fault")]
struct MyFault;

#[test]
fn test_status_raised_by_handler() {
    let mut app = app(true);
    app.get("/", |_req, _args| -> Result<(), Error> { Err(Status::bad_request().into()) })
        .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();

    assert_eq!(response.status_line(), "400 Bad Request");
    assert_eq!(
        response.header("content-type"),
        Some("text/plain; charset=utf-8")
    );
    assert!(body_text(response).starts_with("400 Bad Request\r\n"));
}

#[test]
fn test_status_body_without_debug_has_no_trace() {
    let mut app = app(false);
    app.get("/", |_req, _args| -> Result<(), Error> { Err(Status::forbidden().into()) })
        .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();
    assert_eq!(body_text(response), "403 Forbidden");
}

#[test]
fn test_status_with_explicit_body() {
    let mut app = app(true);
    app.get("/", |_req, _args| -> Result<(), Error> {
        Err(Status::new(409, "Already There").with_body("see /items/1").into())
    })
    .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();
    assert_eq!(response.status_line(), "409 Already There");
    assert_eq!(body_text(response), "see /items/1");
}

#[test]
fn test_unhandled_fault_propagates() {
    let mut app = app(true);
    app.get("/", |_req, _args| -> Result<(), Error> { Err(Error::fault(MyFault)) })
        .unwrap();

    let err = app.dispatch(Envelope::new("GET", "/")).unwrap_err();
    assert!(err.downcast_ref::<MyFault>().is_some());
}

#[test]
fn test_redirect() {
    let mut app = app(true);
    app.get("/", |_req, _args| -> Result<(), Error> {
        Err(Status::found("http://example.com").into())
    })
    .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();
    assert_eq!(response.code, 302);
    assert_eq!(response.header("location"), Some("http://example.com"));
    assert_eq!(body_text(response), "");
}

#[test]
fn test_streamed_reply() {
    let mut app = app(true);
    app.get("/", |_req, _args| {
        Ok(Reply::stream(["a", "b", "c"].into_iter().map(Ok::<_, Error>)))
    })
    .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();
    assert!(response.body.is_stream());
    assert!(response.header("content-length").is_none());
    assert_eq!(body_text(response), "abc");
}

#[test]
fn test_stream_first_chunk_is_pulled_eagerly() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pulled);

    let mut app = app(true);
    app.get("/", move |_req, _args| {
        let counter = Arc::clone(&counter);
        Ok(Reply::stream((0..3).map(move |i| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Error>(i.to_string())
        })))
    })
    .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();
    assert_eq!(pulled.load(Ordering::SeqCst), 1);

    assert_eq!(body_text(response), "012");
    assert_eq!(pulled.load(Ordering::SeqCst), 3);
}

#[test]
fn test_stream_failing_on_first_chunk_becomes_status() {
    let mut app = app(false);
    app.get("/", |_req, _args| {
        let chunks: Vec<Result<&'static str, Error>> = vec![Err(Status::not_found().into())];
        Ok(Reply::stream(chunks))
    })
    .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();
    assert_eq!(response.status_line(), "404 Not Found");
    assert_eq!(body_text(response), "404 Not Found");
}

#[test]
fn test_empty_stream() {
    let mut app = app(true);
    app.get("/", |_req, _args| {
        Ok(Reply::stream(std::iter::empty::<Result<&'static str, Error>>()))
    })
    .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();
    assert_eq!(body_text(response), "");
}

#[test]
fn test_cookies_are_merged_into_headers() {
    let mut app = app(true);
    app.get("/", |req, _args| {
        req.response_cookies.set(Cookie::new("a", "1").path("/"));
        req.response_cookies.set(Cookie::new("b", "2").http_only(true));
        Ok("ok")
    })
    .unwrap();
    app.get("/denied", |req, _args| -> Result<(), Error> {
        req.response_cookies.set(Cookie::new("seen", "yes"));
        Err(Status::unauthorized().into())
    })
    .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();
    let cookies: Vec<&str> = response.headers.get_all("set-cookie").collect();
    assert_eq!(cookies, vec!["a=1; Path=/", "b=2; HttpOnly"]);

    let response = app.dispatch(Envelope::new("GET", "/denied")).unwrap();
    assert_eq!(response.code, 401);
    assert_eq!(response.header("Set-Cookie"), Some("seen=yes"));
}

#[test]
fn test_request_cookies_are_parsed() {
    let mut app = app(true);
    app.get("/", |req, _args| {
        Ok(req.cookies.get("session").cloned().unwrap_or_default())
    })
    .unwrap();

    let envelope = Envelope::new("GET", "/").header("Cookie", "theme=dark; session=abc");
    assert_eq!(body_text(app.dispatch(envelope).unwrap()), "abc");
}

#[test]
fn test_handler_sets_response_head() {
    let mut app = app(true);
    app.post("/", |req, _args| {
        req.response.code = Some(201);
        req.response.headers.append("X-Item", "7");
        Ok("created")
    })
    .unwrap();

    let response = app.dispatch(Envelope::new("POST", "/")).unwrap();
    assert_eq!(response.status_line(), "201 Created");
    assert_eq!(response.header("x-item"), Some("7"));
    assert_eq!(response.header("content-length"), Some("7"));
}

#[test]
fn test_json_content_adapter() {
    let mut app = app(true);
    app.get("/", content::json(|_req, _args| Ok(serde_json::json!({"foo": "bar"}))))
        .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/")).unwrap();
    assert_eq!(response.code, 200);
    assert_eq!(
        response.header("Content-Type"),
        Some("application/json; charset=utf-8")
    );
    let body: serde_json::Value = serde_json::from_str(&body_text(response)).unwrap();
    assert_eq!(body, serde_json::json!({"foo": "bar"}));
}

#[test]
fn test_text_and_binary_adapters() {
    let mut app = app(true);
    app.get("/text", content::text(|_req, _args| Ok("hi"))).unwrap();
    app.get("/bin", content::binary(|_req, _args| Ok(vec![0u8, 1, 2])))
        .unwrap();

    let response = app.dispatch(Envelope::new("GET", "/text")).unwrap();
    assert_eq!(response.header("content-type"), Some("text/plain; charset=utf-8"));

    let response = app.dispatch(Envelope::new("GET", "/bin")).unwrap();
    assert_eq!(response.header("content-type"), Some("application/octet-stream"));
    assert_eq!(&response.body.collect().unwrap()[..], &[0u8, 1, 2]);
}

#[test]
fn test_hooks() {
    let ready = Arc::new(AtomicUsize::new(0));
    let ended = Arc::new(AtomicUsize::new(0));

    let mut app = app(true);
    app.get("/", |_req, _args| Ok("ok")).unwrap();
    {
        let ready = Arc::clone(&ready);
        app.when_ready(move |_app| {
            ready.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let ended = Arc::clone(&ended);
        app.when_endresponse(move |response| {
            assert!(response.code == 200 || response.code == 404);
            ended.fetch_add(1, Ordering::SeqCst);
        });
    }

    app.ready();
    app.dispatch(Envelope::new("GET", "/")).unwrap();
    app.dispatch(Envelope::new("GET", "/missing")).unwrap();

    assert_eq!(ready.load(Ordering::SeqCst), 1);
    assert_eq!(ended.load(Ordering::SeqCst), 2);
}

#[test]
fn test_debug_status_body_carries_a_trace() {
    let app = Application::default();
    assert!(app.settings.debug);

    let response = app.dispatch(Envelope::new("GET", "/nowhere")).unwrap();
    let body = body_text(response);
    let trace = body.strip_prefix("404 Not Found\r\n").unwrap();

    assert!(!trace.trim().is_empty());
    assert_ne!(trace.trim(), "disabled backtrace");
}
