//! End-to-end API tests over the assembled router.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use ipkvm_backends::memory::{
    MemoryAtx, MemoryAuth, MemoryHid, MemoryInfo, MemoryLog, MemoryMsd, MemoryStreamer,
};
use ipkvm_backends::{Msd, MsdHandle};
use ipkvm_core::StreamerParams;
use ipkvm_server::config::ServerConfig;
use ipkvm_server::server::{AppState, Collaborators, Server};
use serde_json::{Value, json};
use tower::ServiceExt;

struct Bench {
    state: AppState,
    router: Router,
    msd: Arc<MemoryMsd>,
    log: Arc<MemoryLog>,
}

fn make_bench_with_config(config: ServerConfig) -> Bench {
    let msd = Arc::new(MemoryMsd::new());
    let log = Arc::new(MemoryLog::new());
    let collaborators = Collaborators {
        hid: Arc::new(MemoryHid::new()),
        atx: Arc::new(MemoryAtx::new()),
        msd: Arc::new(MsdHandle::new(Arc::clone(&msd) as Arc<dyn Msd>)),
        streamer: Arc::new(MemoryStreamer::new(Duration::from_secs(2))),
        auth: Arc::new(MemoryAuth::single("admin", "admin")),
        log: log.clone(),
        info: Arc::new(MemoryInfo::new(json!({"server": {"host": "bench"}}), json!({}))),
    };
    let state = AppState::new(config, collaborators);
    let router = Server::new(state.clone()).router();
    Bench {
        state,
        router,
        msd,
        log,
    }
}

fn make_bench() -> Bench {
    make_bench_with_config(ServerConfig::default())
}

fn authed(request: Request<Body>) -> Request<Body> {
    let (mut parts, body) = request.into_parts();
    let _ = parts
        .headers
        .insert("x-kvmd-user", "admin".parse().unwrap());
    let _ = parts
        .headers
        .insert("x-kvmd-passwd", "admin".parse().unwrap());
    Request::from_parts(parts, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_credentials_get_401() {
    let bench = make_bench();
    let response = bench.router.oneshot(get("/atx")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn bad_credentials_get_403() {
    let bench = make_bench();
    let request = Request::builder()
        .uri("/atx")
        .header("x-kvmd-user", "admin")
        .header("x-kvmd-passwd", "wrong")
        .body(Body::empty())
        .unwrap();
    let response = bench.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Forbidden");
}

#[tokio::test]
async fn header_credentials_pass_the_gate() {
    let bench = make_bench();
    let response = bench.router.oneshot(authed(get("/auth/check"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"ok": true, "result": {}}));
}

#[tokio::test]
async fn login_issues_a_working_cookie() {
    let bench = make_bench();
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("user=admin&passwd=admin"))
        .unwrap();
    let response = bench.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(set_cookie.starts_with("auth_token="));

    let cookie_pair = set_cookie.split(';').next().unwrap().to_owned();
    let request = Request::builder()
        .uri("/auth/check")
        .header(header::COOKIE, cookie_pair)
        .body(Body::empty())
        .unwrap();
    let response = bench.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let bench = make_bench();
    let token = bench.state.auth.login("admin", "admin").await.unwrap();
    let cookie = format!("auth_token={token}");

    let request = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::COOKIE, cookie.clone())
        .body(Body::empty())
        .unwrap();
    let response = bench.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/auth/check")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = bench.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bad_login_gets_403_and_no_cookie() {
    let bench = make_bench();
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("user=admin&passwd=wrong"))
        .unwrap();
    let response = bench.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn info_aggregates_versions_and_meta() {
    let bench = make_bench();
    let response = bench.router.oneshot(authed(get("/info"))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["result"]["streamer"], "memstream");
    assert_eq!(body["result"]["meta"]["server"]["host"], "bench");
    assert!(body["result"]["version"]["kvmd"].is_string());
}

#[tokio::test]
async fn atx_power_reports_processing() {
    let bench = make_bench();
    let response = bench
        .router
        .clone()
        .oneshot(authed(post("/atx/power?action=on")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["result"]["processing"], true);

    // Already on: nothing left to process.
    let response = bench
        .router
        .oneshot(authed(post("/atx/power?action=on")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["result"]["processing"], false);
}

#[tokio::test]
async fn atx_rejects_unknown_action() {
    let bench = make_bench();
    let response = bench
        .router
        .oneshot(authed(post("/atx/power?action=explode")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "ValidationError");
}

const BOUNDARY: &str = "ipkvm-test-boundary";

fn multipart_upload(name: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image_name\"\r\n\r\n{name}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image_data\"; \
             filename=\"blob\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/msd/write")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn upload_accumulates_chunks_and_finalizes_once() {
    let config = ServerConfig {
        sync_chunk_size: 1024,
        ..ServerConfig::default()
    };
    let bench = make_bench_with_config(config);
    let data = vec![7u8; 1536];
    let response = bench
        .router
        .oneshot(authed(multipart_upload("disk.img", &data)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["image"]["name"], "disk.img");
    assert_eq!(body["result"]["image"]["size"], 1536);
    assert_eq!(bench.msd.finalize_count(), 1);
    assert_eq!(bench.msd.image_size("disk.img"), Some(1536));
}

#[tokio::test]
async fn upload_rejects_bad_image_name() {
    let bench = make_bench();
    let response = bench
        .router
        .oneshot(authed(multipart_upload(".hidden", b"data")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(bench.msd.finalize_count(), 0);
}

#[tokio::test]
async fn failed_upload_still_releases_the_claim() {
    let bench = make_bench();
    // Body ends after the name field, so the data field is missing.
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; \
             name=\"image_name\"\r\n\r\ndisk.img\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/msd/write")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = bench.router.oneshot(authed(request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(bench.msd.finalize_count(), 0);
    // The claim must be free again for the next operation.
    assert!(bench.state.msd.claim().is_ok());
}

#[tokio::test]
async fn storage_operation_while_claimed_is_busy() {
    let bench = make_bench();
    let _claim = bench.state.msd.claim().unwrap();
    let response = bench
        .router
        .oneshot(authed(post("/msd/connect")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Busy");
}

#[tokio::test]
async fn msd_reads_stay_available_while_claimed() {
    let bench = make_bench();
    let _claim = bench.state.msd.claim().unwrap();
    let response = bench.router.oneshot(authed(get("/msd"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn streamer_params_mutate_desired_state() {
    let bench = make_bench();
    let response = bench
        .router
        .clone()
        .oneshot(authed(post("/streamer/set_params?quality=55&desired_fps=20")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        bench.state.control.desired(),
        StreamerParams {
            quality: 55,
            desired_fps: 20,
        }
    );

    let response = bench
        .router
        .oneshot(authed(post("/streamer/reset")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(bench.state.control.reset_armed());
}

#[tokio::test]
async fn hid_reset_clears_pressed_keys() {
    let bench = make_bench();
    bench.state.hid.send_key_event("KeyQ", true).await.unwrap();
    let response = bench
        .router
        .clone()
        .oneshot(authed(post("/hid/reset")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = bench.router.oneshot(authed(get("/hid"))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["result"]["keyboard"]["pressed"], json!([]));
}

#[tokio::test]
async fn log_endpoint_streams_formatted_backlog() {
    let bench = make_bench();
    bench.log.push("ipkvmd", "daemon started");
    let response = bench
        .router
        .oneshot(authed(get("/log?seek=3600")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("ipkvmd] --- daemon started"));
    assert!(text.ends_with("\r\n"));
}

#[tokio::test]
async fn log_rejects_bad_seek() {
    let bench = make_bench();
    let response = bench
        .router
        .oneshot(authed(get("/log?seek=soon")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn msd_select_unknown_image_is_an_operation_error() {
    let bench = make_bench();
    let response = bench
        .router
        .oneshot(authed(post("/msd/select?image_name=ghost.iso")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "OperationError");
}
