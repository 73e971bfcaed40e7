//! Cloudinary uploads against a local tiny_http server

use qrshare_lib::host::{CloudinaryHost, ImageHost};
use qrshare_lib::Error;
use std::io::Read;
use std::sync::mpsc;
use tiny_http::{Header, Response, Server};

struct Captured {
    method: String,
    url: String,
    content_type: String,
    body: Vec<u8>,
}

/// Serve exactly one request with `status` and `body`, reporting what arrived.
fn serve_once(status: u16, body: &'static str) -> (String, mpsc::Receiver<Captured>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let mut payload = Vec::new();
            request.as_reader().read_to_end(&mut payload).unwrap();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.to_string())
                .unwrap_or_default();
            let _ = tx.send(Captured {
                method: request.method().to_string(),
                url: request.url().to_string(),
                content_type,
                body: payload,
            });

            let resp = Response::from_string(body)
                .with_status_code(status)
                .with_header("Content-Type: application/json".parse::<Header>().unwrap());
            let _ = request.respond(resp);
        }
    });

    (
        format!("http://{}/v1_1/demo/image/upload", addr),
        rx,
    )
}

fn png() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0u8; 32]);
    bytes
}

#[tokio::test]
async fn upload_posts_multipart_and_returns_secure_url() {
    let (endpoint, rx) = serve_once(
        200,
        r#"{"public_id":"qr1","secure_url":"https://res.cloudinary.com/demo/image/upload/qr1.png"}"#,
    );
    let host = CloudinaryHost::with_endpoint(endpoint, "demo", "qr code generator");

    let url = host.upload(png()).await.unwrap();
    assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/qr1.png");

    let req = rx.recv().unwrap();
    assert_eq!(req.method, "POST");
    assert_eq!(req.url, "/v1_1/demo/image/upload");
    assert!(req.content_type.starts_with("multipart/form-data; boundary="));

    let body = String::from_utf8_lossy(&req.body);
    assert!(body.contains(r#"name="file"; filename="qr-code.png""#));
    assert!(body.contains("Content-Type: image/png"));
    assert!(body.contains("name=\"upload_preset\"\r\n\r\nqr code generator"));
    assert!(body.contains("name=\"cloud_name\"\r\n\r\ndemo"));
    assert!(req.body.windows(4).any(|w| w == b"\x89PNG"));
}

#[tokio::test]
async fn server_error_is_upstream() {
    let (endpoint, _rx) = serve_once(500, r#"{"error":{"message":"boom"}}"#);
    let host = CloudinaryHost::with_endpoint(endpoint, "demo", "qr code generator");

    match host.upload(png()).await {
        Err(Error::Upstream(msg)) => assert!(msg.contains("500"), "{msg}"),
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_secure_url_is_upstream() {
    let (endpoint, _rx) = serve_once(200, r#"{"public_id":"qr1"}"#);
    let host = CloudinaryHost::with_endpoint(endpoint, "demo", "qr code generator");

    assert!(matches!(host.upload(png()).await, Err(Error::Upstream(_))));
}

#[tokio::test]
async fn unreachable_host_is_upstream() {
    // Bind then drop to get a port nobody listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let host = CloudinaryHost::with_endpoint(
        format!("http://127.0.0.1:{}/v1_1/demo/image/upload", port),
        "demo",
        "qr code generator",
    );

    assert!(matches!(host.upload(png()).await, Err(Error::Upstream(_))));
}

#[test]
fn default_endpoint_uses_cloud_name() {
    let host = CloudinaryHost::new("dlvjvskje", "qr code generator");
    assert_eq!(
        host.endpoint(),
        "https://api.cloudinary.com/v1_1/dlvjvskje/image/upload"
    );
}
