//! Gemini backend against a canned local HTTP server

use nutrivision_types::{Error, ImagePayload, InvocationError, Technique};
use nutrivision_vision::{
    response_schema, Analyzer, AnalyzerConfig, GeminiBackend, InferenceBackend, InferenceRequest,
    ANALYSIS_PROMPT,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const MODEL: &str = "test-model";

/// Serve one canned response; resolves to the raw request text
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/v1beta", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (base, handle)
}

/// Read headers plus a Content-Length body
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn image() -> ImagePayload {
    ImagePayload::from_data_uri("data:image/jpeg;base64,/9j/4AAQSkZJRg==").unwrap()
}

async fn generate(base: &str, timeout: Duration) -> Result<Option<String>, InvocationError> {
    let backend = GeminiBackend::new(base, timeout).unwrap();
    let image = image();
    let request = InferenceRequest {
        technique: Technique::DeepAnalysis,
        model: MODEL,
        api_key: "secret-key",
        image: &image,
        prompt: ANALYSIS_PROMPT,
        system_instruction: Technique::DeepAnalysis.instruction(),
        response_schema: response_schema(),
        temperature: 0.4,
    };
    backend.generate(&request).await
}

#[tokio::test]
async fn test_success_returns_candidate_text() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"candidates":[{"content":{"parts":[{"text":"{\"foodName\":\"Soup\"}"}]}}]}"#,
    )
    .await;

    let text = generate(&base, Duration::from_secs(5)).await.unwrap();
    assert_eq!(text.as_deref(), Some(r#"{"foodName":"Soup"}"#));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1beta/models/test-model:generateContent "));
    assert!(request.to_ascii_lowercase().contains("x-goog-api-key: secret-key"));
    assert!(request.contains(r#""mimeType":"image/jpeg""#));
    assert!(request.contains(r#""responseMimeType":"application/json""#));
}

#[tokio::test]
async fn test_quota_status_maps_to_service_error() {
    let (base, _server) = serve_once(
        "429 Too Many Requests",
        r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#,
    )
    .await;

    let err = generate(&base, Duration::from_secs(5)).await.unwrap_err();
    assert!(err.is_quota_exhausted());
    match err {
        InvocationError::Service { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_garbage_envelope_is_malformed() {
    let (base, _server) = serve_once("200 OK", "<html>gateway</html>").await;

    let err = generate(&base, Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, InvocationError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_blocked_prompt_is_empty_response() {
    let (base, _server) =
        serve_once("200 OK", r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).await;

    let backend = GeminiBackend::new(base, Duration::from_secs(5)).unwrap();
    let config = AnalyzerConfig::default()
        .with_api_key(Some("secret-key".to_string()))
        .with_model(Some(MODEL.to_string()));
    let analyzer = Analyzer::new(Arc::new(backend), config);

    let err = analyzer.invoke(&image(), Technique::RapidScan).await.unwrap_err();
    assert!(matches!(err, Error::Invocation(InvocationError::EmptyResponse)));
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/v1beta", listener.local_addr().unwrap());
    drop(listener);

    let err = generate(&base, Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, InvocationError::Transport(_)));
}

#[tokio::test]
async fn test_silent_server_hits_configured_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/v1beta", listener.local_addr().unwrap());
    let _hold = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });

    let err = generate(&base, Duration::from_millis(300)).await.unwrap_err();
    match err {
        InvocationError::Transport(message) => assert!(message.contains("timed out")),
        other => panic!("expected transport error, got {:?}", other),
    }
}
