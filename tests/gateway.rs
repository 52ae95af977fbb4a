//! End-to-end tests: client → proxy → upstream over real sockets.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header::CONTENT_ENCODING, Request},
    routing::{any, get},
    Router,
};
use flate2::{write::GzEncoder, Compression};
use gatekeeper_proxy::config::{MatchType, RouteConfig};

mod common;
use common::Event;

fn route(method: &str, path: &str, match_type: MatchType) -> RouteConfig {
    RouteConfig {
        method: method.into(),
        path: path.into(),
        match_type,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn test_health_status_scenario() {
    let backend = common::start_axum_backend(
        Router::new().route("/status", get(|| async { r#"{"ok":true}"# })),
    )
    .await;

    let mut config = common::proxy_config(backend);
    config.upstream.ignored_paths = vec!["/health".into()];
    config.routes.push(route("GET", "/status", MatchType::Exact));

    let (hooks, events) = common::recording_hooks();
    let (proxy, shutdown) = common::start_proxy(config, hooks).await;
    let client = client();

    let res = client.get(format!("http://{proxy}/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.bytes().await.unwrap().is_empty());
    assert!(events.lock().unwrap().is_empty(), "ignored paths fire no hooks");

    let res = client
        .get(format!("http://{proxy}/status"))
        .header("x-request-id", "scenario-1")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);
    assert_eq!(
        events.lock().unwrap().clone(),
        vec![
            ("scenario-1".to_string(), Event::RequestBody(vec![])),
            (
                "scenario-1".to_string(),
                Event::ResponseBody(br#"{"ok":true}"#.to_vec())
            ),
        ]
    );

    let res = client.post(format!("http://{proxy}/status")).send().await.unwrap();
    assert_eq!(res.status(), 401);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(res.text().await.unwrap(), r#"{"message":"unauthorized call"}"#);

    let errors = events
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, e)| *e == Event::Error("unauthorized"))
        .count();
    assert_eq!(errors, 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_error_status_is_relayed() {
    let backend =
        common::start_programmable_backend(|| async { (503, "maintenance".to_string()) }).await;

    let mut config = common::proxy_config(backend);
    config.routes.push(route("GET", "/*", MatchType::Template));

    let (hooks, events) = common::recording_hooks();
    let (proxy, shutdown) = common::start_proxy(config, hooks).await;

    let res = client()
        .get(format!("http://{proxy}/anything/at/all"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    assert_eq!(res.text().await.unwrap(), "maintenance");
    assert!(
        !events
            .lock()
            .unwrap()
            .iter()
            .any(|(_, e)| matches!(e, Event::Error(_))),
        "a non-200 upstream status is not a proxy error"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_answers_json_500() {
    let dead = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let mut config = common::proxy_config(dead);
    config.routes.push(route("POST", "/orders", MatchType::Exact));

    let (hooks, events) = common::recording_hooks();
    let (proxy, shutdown) = common::start_proxy(config, hooks).await;

    let res = client()
        .post(format!("http://{proxy}/orders"))
        .body("order")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), r#"{"message":"internal error"}"#);

    let kinds: Vec<Event> = events.lock().unwrap().iter().map(|(_, e)| e.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            Event::RequestBody(b"order".to_vec()),
            Event::Error("upstream"),
            Event::ResponseBody(br#"{"message":"internal error"}"#.to_vec()),
        ]
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_gzip_passthrough() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"plain text payload").unwrap();
    let gzipped = encoder.finish().unwrap();
    let wire = gzipped.clone();

    let backend = common::start_axum_backend(Router::new().route(
        "/report",
        get(move || {
            let wire = wire.clone();
            async move { ([(CONTENT_ENCODING, "gzip")], wire) }
        }),
    ))
    .await;

    let mut config = common::proxy_config(backend);
    config.routes.push(route("GET", "/report", MatchType::Template));

    let (hooks, events) = common::recording_hooks();
    let (proxy, shutdown) = common::start_proxy(config, hooks).await;

    let res = client()
        .get(format!("http://{proxy}/report"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers().get("content-encoding").unwrap(), "gzip");
    assert_eq!(res.bytes().await.unwrap().to_vec(), gzipped);

    let last = events.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last.1, Event::ResponseBody(b"plain text payload".to_vec()));

    shutdown.trigger();
}

#[tokio::test]
async fn test_chunked_upstream_response() {
    let backend = common::start_raw_backend(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
          5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
    )
    .await;

    let mut config = common::proxy_config(backend);
    config.routes.push(route("GET", "/", MatchType::Prefix));

    let (hooks, events) = common::recording_hooks();
    let (proxy, shutdown) = common::start_proxy(config, hooks).await;
    let client = client();

    for i in 0..3 {
        let res = client
            .get(format!("http://{proxy}/stream"))
            .header("x-request-id", format!("chunked-{i}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "hello world");
    }

    let errors = events
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, e)| matches!(e, Event::Error(_)))
        .count();
    assert_eq!(errors, 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_sessions_stay_correlated() {
    let backend = common::start_axum_backend(Router::new().route(
        "/echo",
        any(|req: Request<Body>| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            axum::body::to_bytes(req.into_body(), usize::MAX)
                .await
                .unwrap()
        }),
    ))
    .await;

    let mut config = common::proxy_config(backend);
    config.routes.push(route("POST", "/echo", MatchType::Exact));

    let (hooks, events) = common::recording_hooks();
    let (proxy, shutdown) = common::start_proxy(config, hooks).await;
    let client = client();

    let mut tasks = Vec::new();
    for i in 0..10 {
        let client = client.clone();
        let url = format!("http://{proxy}/echo");
        tasks.push(tokio::spawn(async move {
            client
                .post(&url)
                .header("x-request-id", format!("session-{i}"))
                .body(format!("body-{i}"))
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap()
        }));
    }
    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap(), format!("body-{i}"));
    }

    let mut by_session: HashMap<String, Vec<Event>> = HashMap::new();
    for (id, event) in events.lock().unwrap().iter() {
        by_session.entry(id.clone()).or_default().push(event.clone());
    }
    assert_eq!(by_session.len(), 10);
    for i in 0..10 {
        let body = format!("body-{i}").into_bytes();
        assert_eq!(
            by_session[&format!("session-{i}")],
            vec![Event::RequestBody(body.clone()), Event::ResponseBody(body)]
        );
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_generated_session_id_without_header() {
    let backend = common::start_mock_backend("hello").await;

    let mut config = common::proxy_config(backend);
    config.routes.push(route("GET", "/", MatchType::Prefix));

    let (hooks, events) = common::recording_hooks();
    let (proxy, shutdown) = common::start_proxy(config, hooks).await;

    let res = client().get(format!("http://{proxy}/")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "hello");

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, events[1].0);
    assert!(uuid::Uuid::parse_str(&events[0].0).is_ok());

    shutdown.trigger();
}
