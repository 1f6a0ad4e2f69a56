use std::path::PathBuf;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use recallguard_core::{ContentKind, OriginId};
use recallguard_platform::{Destination, ForwardNode, OutboundMessage, Platform, PlatformError};

use crate::config::OneBotConfig;
use crate::error::OneBotError;
use crate::types::{ApiResponse, FileData, WireNode, id_value, wire_segments};

/// OneBot v11 platform that talks to the HTTP API of a OneBot implementation.
///
/// Implements the [`Platform`] trait so the shadow cache can fetch files and
/// deliver forwards through it.
pub struct OneBotPlatform {
    config: OneBotConfig,
    client: Client,
}

impl std::fmt::Debug for OneBotPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneBotPlatform")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OneBotPlatform {
    /// Create a platform with an HTTP client using the configured timeout.
    pub fn new(config: OneBotConfig) -> Result<Self, OneBotError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Call an API action and return its `data` field.
    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, OneBotError> {
        let mut request = self.client.post(self.config.endpoint(action)).json(&params);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OneBotError::from_transport(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OneBotError::Api(format!("{action}: HTTP {status}: {body}")));
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| OneBotError::InvalidResponse(format!("{action}: {e}")))?;
        if !envelope.is_ok() {
            return Err(OneBotError::Api(format!(
                "{action} failed with retcode {}: {}",
                envelope.retcode,
                envelope.error_message()
            )));
        }
        Ok(envelope.data)
    }

    async fn fetch(&self, kind: ContentKind, file_ref: &str) -> Result<PathBuf, OneBotError> {
        let (action, params) = match kind {
            ContentKind::Image => ("get_image", serde_json::json!({ "file": file_ref })),
            ContentKind::Audio => (
                "get_record",
                serde_json::json!({ "file": file_ref, "out_format": self.config.audio_format }),
            ),
            ContentKind::Text => {
                return Err(OneBotError::InvalidResponse(
                    "text components have no file".into(),
                ));
            }
        };

        let data: FileData = self
            .call(action, params)
            .await?
            .ok_or_else(|| OneBotError::InvalidResponse(format!("{action} returned no data")))?;
        if data.file.is_empty() {
            return Err(OneBotError::InvalidResponse(format!(
                "{action} returned an empty path"
            )));
        }
        let path = data.file.strip_prefix("file://").unwrap_or(&data.file);
        Ok(PathBuf::from(path))
    }
}

impl Platform for OneBotPlatform {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "onebot"
    }

    #[instrument(skip(self), fields(platform = "onebot"))]
    async fn fetch_remote_file(
        &self,
        kind: ContentKind,
        file_ref: &str,
    ) -> Result<PathBuf, PlatformError> {
        debug!("resolving remote file");
        Ok(self.fetch(kind, file_ref).await?)
    }

    #[instrument(skip(self, message), fields(platform = "onebot", destination = %destination))]
    async fn send_message(
        &self,
        destination: &Destination,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError> {
        let segments = wire_segments(&message.segments);
        let (action, params) = match destination {
            Destination::Group(group) => (
                "send_group_msg",
                serde_json::json!({ "group_id": id_value(group.as_str()), "message": segments }),
            ),
            Destination::Private(user) => (
                "send_private_msg",
                serde_json::json!({ "user_id": id_value(user.as_str()), "message": segments }),
            ),
        };

        self.call::<serde_json::Value>(action, params).await?;
        debug!("message sent");
        Ok(())
    }

    #[instrument(skip(self, nodes), fields(platform = "onebot", group = %group, nodes = nodes.len()))]
    async fn send_group_forward(
        &self,
        group: &OriginId,
        nodes: &[ForwardNode],
    ) -> Result<(), PlatformError> {
        let messages: Vec<WireNode> = nodes.iter().map(WireNode::from).collect();
        let params = serde_json::json!({
            "group_id": id_value(group.as_str()),
            "messages": messages,
        });

        self.call::<serde_json::Value>("send_group_forward_msg", params)
            .await?;
        debug!("combined forward sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use recallguard_core::UserId;
    use recallguard_platform::Segment;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    /// A captured HTTP request.
    struct CapturedRequest {
        head: String,
        body: serde_json::Value,
    }

    struct MockOneBotServer {
        listener: tokio::net::TcpListener,
        base_url: String,
    }

    impl MockOneBotServer {
        async fn start() -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind mock server");
            let port = listener.local_addr().unwrap().port();
            let base_url = format!("http://127.0.0.1:{port}");
            Self { listener, base_url }
        }

        async fn respond_once(self, status_code: u16, body: &str) -> CapturedRequest {
            let (mut stream, _) = self.listener.accept().await.unwrap();

            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let header_end = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while buf.len() < header_end + content_length {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before body");
                buf.extend_from_slice(&chunk[..n]);
            }
            let request_body =
                serde_json::from_slice(&buf[header_end..header_end + content_length])
                    .unwrap_or(serde_json::Value::Null);

            let response = format!(
                "HTTP/1.1 {status_code} OK\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            CapturedRequest {
                head,
                body: request_body,
            }
        }

        async fn respond_ok(self, data: serde_json::Value) -> CapturedRequest {
            let body = serde_json::json!({"status": "ok", "retcode": 0, "data": data}).to_string();
            self.respond_once(200, &body).await
        }
    }

    fn platform(base_url: &str) -> OneBotPlatform {
        OneBotPlatform::new(OneBotConfig::new(base_url).with_access_token("tok")).unwrap()
    }

    #[test]
    fn platform_name() {
        assert_eq!(platform("http://localhost:1").name(), "onebot");
    }

    #[tokio::test]
    async fn fetch_image_calls_get_image() {
        let server = MockOneBotServer::start().await;
        let platform = platform(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_ok(serde_json::json!({"file": "/data/cache/abc.png", "size": 10}))
                .await
        });

        let path = platform
            .fetch_remote_file(ContentKind::Image, "abc.image")
            .await
            .unwrap();
        let request = server_handle.await.unwrap();

        assert_eq!(path, PathBuf::from("/data/cache/abc.png"));
        assert!(request.head.starts_with("POST /get_image "));
        assert!(request.head.to_ascii_lowercase().contains("authorization: bearer tok"));
        assert_eq!(request.body["file"], "abc.image");
    }

    #[tokio::test]
    async fn fetch_audio_requests_out_format() {
        let server = MockOneBotServer::start().await;
        let platform = platform(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_ok(serde_json::json!({"file": "file:///data/record/v.mp3"}))
                .await
        });

        let path = platform
            .fetch_remote_file(ContentKind::Audio, "v.amr")
            .await
            .unwrap();
        let request = server_handle.await.unwrap();

        assert_eq!(path, PathBuf::from("/data/record/v.mp3"));
        assert!(request.head.starts_with("POST /get_record "));
        assert_eq!(request.body["out_format"], "mp3");
    }

    #[tokio::test]
    async fn failed_retcode_is_api_error() {
        let server = MockOneBotServer::start().await;
        let platform = platform(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(
                    200,
                    r#"{"status":"failed","retcode":100,"data":null,"wording":"file not found"}"#,
                )
                .await
        });

        let err = platform
            .fetch_remote_file(ContentKind::Image, "missing")
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, PlatformError::Api(ref msg) if msg.contains("file not found")));
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn http_error_is_api_error() {
        let server = MockOneBotServer::start().await;
        let platform = platform(&server.base_url);

        let server_handle =
            tokio::spawn(async move { server.respond_once(401, r#"{"message":"no"}"#).await });

        let err = platform
            .send_message(&"group:1".parse().unwrap(), &OutboundMessage::text("x"))
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, PlatformError::Api(_)));
    }

    #[tokio::test]
    async fn slow_api_is_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let platform = OneBotPlatform::new(
            OneBotConfig::new(format!("http://127.0.0.1:{port}"))
                .with_timeout(Duration::from_millis(100)),
        )
        .unwrap();

        let server_handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(stream);
        });

        let err = platform
            .fetch_remote_file(ContentKind::Image, "slow")
            .await
            .unwrap_err();
        server_handle.abort();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn send_group_message() {
        let server = MockOneBotServer::start().await;
        let platform = platform(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server.respond_ok(serde_json::json!({"message_id": 7})).await
        });

        let message = OutboundMessage::from_segments(vec![
            Segment::Text("hello".into()),
            Segment::Image(PathBuf::from("/cache/1.png")),
        ]);
        platform
            .send_message(&"group:20002".parse().unwrap(), &message)
            .await
            .unwrap();
        let request = server_handle.await.unwrap();

        assert!(request.head.starts_with("POST /send_group_msg "));
        assert_eq!(request.body["group_id"], 20002);
        assert_eq!(request.body["message"][0]["data"]["text"], "hello");
        assert_eq!(
            request.body["message"][1]["data"]["file"],
            "file:///cache/1.png"
        );
    }

    #[tokio::test]
    async fn send_private_message() {
        let server = MockOneBotServer::start().await;
        let platform = platform(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server.respond_ok(serde_json::json!({"message_id": 8})).await
        });

        platform
            .send_message(&"private:10001".parse().unwrap(), &OutboundMessage::text("hi"))
            .await
            .unwrap();
        let request = server_handle.await.unwrap();

        assert!(request.head.starts_with("POST /send_private_msg "));
        assert_eq!(request.body["user_id"], 10001);
    }

    #[tokio::test]
    async fn send_group_forward_builds_nodes() {
        let server = MockOneBotServer::start().await;
        let platform = platform(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server.respond_ok(serde_json::json!({"message_id": 9})).await
        });

        let nodes = [
            ForwardNode::new(UserId::new("10"), "guard", vec![Segment::Text("prompt".into())]),
            ForwardNode::new(
                UserId::new("10"),
                "guard",
                vec![Segment::Audio(PathBuf::from("/cache/2.mp3"))],
            ),
        ];
        platform
            .send_group_forward(&OriginId::new("20002"), &nodes)
            .await
            .unwrap();
        let request = server_handle.await.unwrap();

        assert!(request.head.starts_with("POST /send_group_forward_msg "));
        let messages = request.body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["type"], "node");
        assert_eq!(messages[0]["data"]["nickname"], "guard");
        assert_eq!(messages[1]["data"]["content"][0]["type"], "record");
    }

    #[tokio::test]
    async fn connection_refused_is_retryable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = platform(&format!("http://127.0.0.1:{port}"))
            .send_message(&"group:1".parse().unwrap(), &OutboundMessage::text("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Connection(_)));
    }
}
