use std::time::Duration;

use serde::de::DeserializeOwned;

use trajview_api::*;

/// Typed HTTP client for a trajview server.
///
/// Implements [`TrajectoryStore`] so the replay engine can load trajectories
/// over the network exactly as it loads them from disk.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    // ── Health ────────────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<HealthResponse, StoreError> {
        let url = self.url("/health");
        let resp = self.client.get(&url).send().await.map_err(transport)?;
        parse_response(&url, resp).await
    }

    // ── Catalog ───────────────────────────────────────────────────────────

    pub async fn files(&self) -> Result<FilesResponse, StoreError> {
        let url = self.url("/files");
        let resp = self.client.get(&url).send().await.map_err(transport)?;
        parse_response(&url, resp).await
    }

    pub async fn models(&self) -> Result<ModelsResponse, StoreError> {
        let url = self.url("/models");
        let resp = self.client.get(&url).send().await.map_err(transport)?;
        parse_response(&url, resp).await
    }

    // ── Trajectories ──────────────────────────────────────────────────────

    /// Raw trajectory bytes. A 404 is decoded into [`StoreError::NotFound`]
    /// carrying the paths the server tried.
    pub async fn trajectory_raw(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.url(&format!("/trajectory/{}", urlencoding::encode(id)));
        let resp = self.client.get(&url).send().await.map_err(transport)?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<TrajectoryNotFound>(&body) {
                Ok(not_found) => StoreError::NotFound {
                    id: not_found.id,
                    tried: not_found.tried,
                },
                Err(_) => StoreError::Http {
                    status: status.as_u16(),
                    url,
                    body,
                },
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                url,
                body,
            });
        }
        let bytes = resp.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

impl TrajectoryStore for ApiClient {
    async fn list_files(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.files().await?.files)
    }

    async fn catalog(&self) -> Result<Catalog, StoreError> {
        Ok(self.models().await?.models)
    }

    async fn fetch(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        self.trajectory_raw(id).await
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    tracing::debug!("request failed: {err}");
    StoreError::Transport(err.to_string())
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or an error containing the status and body text.
async fn parse_response<T: DeserializeOwned>(
    url: &str,
    resp: reqwest::Response,
) -> Result<T, StoreError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(StoreError::Http {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        });
    }
    resp.json()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the request line it received.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.expect("read request");
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{addr}/"), handle)
    }

    #[tokio::test]
    async fn catalog_comes_from_models_endpoint() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"models":{"gpt-5":[{"filename":"gpt-5_a.json","task":"a"}]}}"#,
        )
        .await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).expect("client");
        let catalog = client.catalog().await.expect("catalog");
        assert_eq!(
            catalog.find_task("gpt-5", "a").map(|e| e.filename.as_str()),
            Some("gpt-5_a.json")
        );
        let request_line = server.await.expect("server task");
        assert!(request_line.starts_with("GET /api/models "), "{request_line}");
    }

    #[tokio::test]
    async fn not_found_carries_tried_paths() {
        let (base, server) = serve_once(
            "404 Not Found",
            r#"{"error":"trajectory not found","id":"m_t","tried":["/srv/trajs/m_t.json","/srv/m_t.json"]}"#,
        )
        .await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).expect("client");
        match client.fetch("m_t").await {
            Err(StoreError::NotFound { id, tried }) => {
                assert_eq!(id, "m_t");
                assert_eq!(tried.len(), 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let request_line = server.await.expect("server task");
        assert!(request_line.starts_with("GET /api/trajectory/m_t "), "{request_line}");
    }

    #[tokio::test]
    async fn server_errors_map_to_http_errors() {
        let (base, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).expect("client");
        match client.list_files().await {
            Err(StoreError::Http { status, body, .. }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let client =
            ApiClient::new(&format!("http://{addr}"), Duration::from_secs(2)).expect("client");
        assert!(matches!(
            client.fetch("m_t").await,
            Err(StoreError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn separator_characters_stay_inside_the_id_segment() {
        let (base, server) = serve_once("200 OK", "[]").await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).expect("client");
        client.fetch("m_a\\b/c d").await.expect("fetch");
        let request_line = server.await.expect("server task");
        assert!(
            request_line.starts_with("GET /api/trajectory/m_a%5Cb%2Fc%20d "),
            "{request_line}"
        );
    }

    #[test]
    fn url_joins_base_and_api_prefix() {
        let client = ApiClient::with_client(reqwest::Client::new(), "http://h/");
        assert_eq!(client.url("/files"), "http://h/api/files");
    }
}
