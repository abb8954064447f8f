//! Matrix Client-Server API HTTP client.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use urlencoding::encode;
use uuid::Uuid;

use super::dto::{
    Annotation, ErrorResponse, NoticeContent, ReactionContent, SendResponse, SyncResponse,
};
use crate::domain::entities::{EventId, MxcUri, RoomId, Secret};
use crate::domain::errors::ProtocolError;
use crate::domain::ports::{MessagingPort, Reply};

const CLIENT_API: &str = "/_matrix/client/v3";
const AUTHENTICATED_MEDIA_API: &str = "/_matrix/client/v1/media";
const LEGACY_MEDIA_API: &str = "/_matrix/media/v3";
const HTML_FORMAT: &str = "org.matrix.custom.html";
const DEFAULT_RETRY_AFTER_MS: u64 = 5000;

/// Extra time allowed on top of the server-side long-poll timeout.
const SYNC_GRACE: Duration = Duration::from_secs(15);

/// Authenticated client for one Matrix account.
pub struct MatrixClient {
    client: Client,
    homeserver: String,
    access_token: Secret,
}

impl MatrixClient {
    /// Creates new client for the given homeserver base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(
        homeserver: impl Into<String>,
        access_token: Secret,
        timeout: Duration,
    ) -> Result<Self, ProtocolError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ProtocolError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            homeserver: homeserver.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn client_url(&self, path: &str) -> String {
        format!("{}{CLIENT_API}{path}", self.homeserver)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.access_token.expose())
    }

    /// Performs one `/sync` long-poll.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be parsed.
    pub async fn sync(
        &self,
        since: Option<&str>,
        timeout: Duration,
    ) -> Result<SyncResponse, ProtocolError> {
        let timeout_ms = timeout.as_millis().to_string();
        let mut query = vec![("timeout", timeout_ms.as_str())];
        if let Some(since) = since {
            query.push(("since", since));
        }

        let request = self
            .client
            .get(self.client_url("/sync"))
            .query(&query)
            .timeout(timeout + SYNC_GRACE);

        let response = send(self.authorized(request)).await?;
        response
            .json()
            .await
            .map_err(|e| ProtocolError::unexpected(format!("failed to parse sync response: {e}")))
    }

    /// Joins a room the account was invited to.
    ///
    /// # Errors
    /// Returns error if the homeserver refuses the join.
    pub async fn join_room(&self, room_id: &RoomId) -> Result<(), ProtocolError> {
        let url = self.client_url(&format!("/join/{}", encode(room_id.as_str())));
        let request = self.client.post(url).json(&serde_json::json!({}));
        send(self.authorized(request)).await?;
        debug!(room_id = %room_id, "Joined room");
        Ok(())
    }

    async fn send_event<T: Serialize + Sync>(
        &self,
        room_id: &RoomId,
        event_type: &str,
        content: &T,
    ) -> Result<EventId, ProtocolError> {
        let txn_id = Uuid::new_v4().to_string();
        let url = self.client_url(&format!(
            "/rooms/{}/send/{}/{}",
            encode(room_id.as_str()),
            encode(event_type),
            txn_id
        ));

        let response = send(self.authorized(self.client.put(url).json(content))).await?;
        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| ProtocolError::unexpected(format!("failed to parse send response: {e}")))?;

        debug!(room_id = %room_id, event_type, event_id = %sent.event_id, "Event sent");
        Ok(EventId::new(sent.event_id))
    }

    async fn download(&self, api: &str, uri: &MxcUri) -> Result<Response, ProtocolError> {
        let url = format!(
            "{}{api}/download/{}/{}",
            self.homeserver,
            encode(uri.server_name()),
            encode(uri.media_id())
        );
        send(self.authorized(self.client.get(url))).await
    }
}

#[async_trait]
impl MessagingPort for MatrixClient {
    async fn mark_read(&self, room_id: &RoomId, event_id: &EventId) -> Result<(), ProtocolError> {
        let url = self.client_url(&format!(
            "/rooms/{}/receipt/m.read/{}",
            encode(room_id.as_str()),
            encode(event_id.as_str())
        ));
        let request = self.client.post(url).json(&serde_json::json!({}));
        send(self.authorized(request)).await?;
        Ok(())
    }

    async fn react(
        &self,
        room_id: &RoomId,
        event_id: &EventId,
        key: &str,
    ) -> Result<EventId, ProtocolError> {
        let content = ReactionContent {
            relates_to: Annotation {
                rel_type: "m.annotation",
                event_id: event_id.as_str(),
                key,
            },
        };
        self.send_event(room_id, "m.reaction", &content).await
    }

    async fn respond(&self, room_id: &RoomId, reply: &Reply) -> Result<EventId, ProtocolError> {
        let plain;
        let content = if reply.allow_html {
            plain = html_to_plain(&reply.body);
            NoticeContent {
                msgtype: "m.notice",
                body: &plain,
                format: Some(HTML_FORMAT),
                formatted_body: Some(&reply.body),
            }
        } else {
            NoticeContent {
                msgtype: "m.notice",
                body: &reply.body,
                format: None,
                formatted_body: None,
            }
        };

        self.send_event(room_id, "m.room.message", &content).await
    }

    async fn redact(&self, room_id: &RoomId, event_id: &EventId) -> Result<(), ProtocolError> {
        let url = self.client_url(&format!(
            "/rooms/{}/redact/{}/{}",
            encode(room_id.as_str()),
            encode(event_id.as_str()),
            Uuid::new_v4()
        ));
        let request = self.client.put(url).json(&serde_json::json!({}));
        send(self.authorized(request)).await?;
        debug!(room_id = %room_id, event_id = %event_id, "Event redacted");
        Ok(())
    }

    async fn download_media(&self, uri: &MxcUri) -> Result<Bytes, ProtocolError> {
        let response = match self.download(AUTHENTICATED_MEDIA_API, uri).await {
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND.as_u16()) => {
                debug!(uri = %uri, "Authenticated media unavailable, using legacy endpoint");
                self.download(LEGACY_MEDIA_API, uri).await?
            }
            other => other?,
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProtocolError::network(format!("failed to read media body: {e}")))?;
        debug!(uri = %uri, size = bytes.len(), "Media downloaded");
        Ok(bytes)
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ProtocolError> {
    let response = request.send().await.map_err(|e| {
        warn!(error = %e, "Failed to reach homeserver");
        if e.is_timeout() {
            ProtocolError::network("request timed out")
        } else if e.is_connect() {
            ProtocolError::network("failed to connect to homeserver")
        } else {
            ProtocolError::network(e.to_string())
        }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error = response.json::<ErrorResponse>().await.ok();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_ms = error
            .and_then(|e| e.retry_after_ms)
            .unwrap_or(DEFAULT_RETRY_AFTER_MS);
        return Err(ProtocolError::RateLimited { retry_after_ms });
    }

    Err(match error {
        Some(error) => ProtocolError::rejected(status.as_u16(), error.errcode, error.error),
        None => ProtocolError::rejected(status.as_u16(), "M_UNKNOWN", format!("HTTP {status}")),
    })
}

/// Builds the plain-text fallback body for an HTML message.
fn html_to_plain(html: &str) -> String {
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

    TAG_RE
        .replace_all(html, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, path_regex, query_param},
    };

    fn client_for(server: &MockServer) -> MatrixClient {
        MatrixClient::new(server.uri(), Secret::new("syt_token"), Duration::from_secs(5)).unwrap()
    }

    fn room() -> RoomId {
        RoomId::new("!room:server")
    }

    #[test]
    fn test_html_to_plain() {
        let html = "<p><strong>Text:</strong></p>\n<pre><code>a &lt; b</code></pre>\n";
        assert_eq!(html_to_plain(html), "Text:\na < b");
    }

    #[test]
    fn test_homeserver_trailing_slash_trimmed() {
        let client =
            MatrixClient::new("https://matrix.test/", Secret::new("t"), Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.client_url("/sync"),
            "https://matrix.test/_matrix/client/v3/sync"
        );
    }

    #[tokio::test]
    async fn test_respond_sends_html_notice() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path_regex(r"^/_matrix/client/v3/rooms/[^/]+/send/m\.room\.message/[^/]+$"))
            .and(header("authorization", "Bearer syt_token"))
            .and(body_json(serde_json::json!({
                "msgtype": "m.notice",
                "body": "x^2",
                "format": "org.matrix.custom.html",
                "formatted_body": "<pre><code>x^2</code></pre>\n"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "event_id": "$sent" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let event_id = client_for(&server)
            .respond(&room(), &Reply::html("<pre><code>x^2</code></pre>\n"))
            .await
            .unwrap();

        assert_eq!(event_id, EventId::new("$sent"));
    }

    #[tokio::test]
    async fn test_respond_plain_text_has_no_format() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(body_json(serde_json::json!({
                "msgtype": "m.notice",
                "body": "hello"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "event_id": "$sent" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .respond(&room(), &Reply::text("hello"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_react_sends_annotation() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path_regex(r"^/_matrix/client/v3/rooms/[^/]+/send/m\.reaction/[^/]+$"))
            .and(body_json(serde_json::json!({
                "m.relates_to": {
                    "rel_type": "m.annotation",
                    "event_id": "$event",
                    "key": "👌"
                }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "event_id": "$r" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .react(&room(), &EventId::new("$event"), "👌")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_mark_read_posts_receipt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/_matrix/client/v3/rooms/[^/]+/receipt/m\.read/[^/]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .mark_read(&room(), &EventId::new("$event"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_redact_puts_redaction() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path_regex(r"^/_matrix/client/v3/rooms/[^/]+/redact/[^/]+/[^/]+$"))
            .and(header("authorization", "Bearer syt_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "event_id": "$x" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .redact(&room(), &EventId::new("$reply"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_download_uses_authenticated_media() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/_matrix/client/v1/media/download/server/abc"))
            .and(header("authorization", "Bearer syt_token"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = client_for(&server)
            .download_media(&MxcUri::parse("mxc://server/abc").unwrap())
            .await
            .unwrap();

        assert_eq!(bytes, Bytes::from_static(b"png"));
    }

    #[tokio::test]
    async fn test_download_falls_back_to_legacy_media() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/_matrix/client/v1/media/download/server/abc"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "errcode": "M_UNRECOGNIZED",
                "error": "Unrecognized request"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/_matrix/media/v3/download/server/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"legacy".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = client_for(&server)
            .download_media(&MxcUri::parse("mxc://server/abc").unwrap())
            .await
            .unwrap();

        assert_eq!(bytes, Bytes::from_static(b"legacy"));
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "errcode": "M_FORBIDDEN",
                "error": "Access denied"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .download_media(&MxcUri::parse("mxc://server/abc").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProtocolError::Rejected { status: 403, ref errcode, .. } if errcode == "M_FORBIDDEN"
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "errcode": "M_LIMIT_EXCEEDED",
                "error": "Too many requests",
                "retry_after_ms": 1234
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .respond(&room(), &Reply::text("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::RateLimited { retry_after_ms: 1234 }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_sync_parses_timeline_and_invites() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/_matrix/client/v3/sync"))
            .and(query_param("since", "s1"))
            .and(query_param("timeout", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "next_batch": "s2",
                "rooms": {
                    "join": {
                        "!room:server": {
                            "timeline": {
                                "events": [{
                                    "type": "m.room.message",
                                    "sender": "@alice:server",
                                    "event_id": "$e1",
                                    "content": { "msgtype": "m.image", "url": "mxc://server/abc" }
                                }]
                            }
                        }
                    },
                    "invite": { "!other:server": { "invite_state": { "events": [] } } }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sync = client_for(&server)
            .sync(Some("s1"), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(sync.next_batch, "s2");
        let rooms = sync.rooms.unwrap();
        assert!(rooms.invite.contains_key("!other:server"));
        let events = &rooms.join["!room:server"].timeline.as_ref().unwrap().events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id.as_deref(), Some("$e1"));
    }
}
