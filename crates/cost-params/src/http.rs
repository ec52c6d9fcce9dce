//! Client for the remote cost parameter settings endpoints.

use std::time::Duration;

use fleet_core::{CostParameterHistory, CostParameters};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::backend::{ParamsError, SettingsBackend};

const RESOURCE: &str = "api/settings/cost-parameters";

/// Body of a full replacement: exactly the four rates.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RatesBody {
    inflation_rate: f64,
    tariff_rate: f64,
    small_to_ev_ratio: f64,
    big_to_ev_ratio: f64,
}

impl From<&CostParameters> for RatesBody {
    fn from(p: &CostParameters) -> Self {
        Self {
            inflation_rate: p.inflation_rate,
            tariff_rate: p.tariff_rate,
            small_to_ev_ratio: p.small_to_ev_ratio,
            big_to_ev_ratio: p.big_to_ev_ratio,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpSettingsBackend {
    base_url: String,
    auth_bearer: Option<String>,
    client: Client,
}

impl HttpSettingsBackend {
    pub fn new(
        base_url: &str,
        auth_bearer: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ParamsError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_bearer: auth_bearer.filter(|t| !t.is_empty()),
            client,
        })
    }

    /// `{base}/api/settings/cost-parameters[/suffix]`.
    pub fn endpoint(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("{}/{RESOURCE}", self.base_url)
        } else {
            format!("{}/{RESOURCE}/{suffix}", self.base_url)
        }
    }

    pub(crate) fn auth_headers(&self) -> Result<HeaderMap, ParamsError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.auth_bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ParamsError::InvalidHeader(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn check(resp: Response, url: &str) -> Result<Response, ParamsError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(ParamsError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            })
        }
    }
}

impl SettingsBackend for HttpSettingsBackend {
    #[instrument(name = "settings_get_current", skip(self))]
    async fn fetch_current(&self) -> Result<CostParameters, ParamsError> {
        let url = self.endpoint("");
        let resp = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        Ok(Self::check(resp, &url)?.json().await?)
    }

    #[instrument(name = "settings_put_current", skip(self, params))]
    async fn put_current(
        &self,
        params: &CostParameters,
        updated_by: &str,
    ) -> Result<CostParameters, ParamsError> {
        let url = self.endpoint("");
        let resp = self
            .client
            .put(&url)
            .headers(self.auth_headers()?)
            .json(&RatesBody::from(params))
            .send()
            .await?;
        let stored: CostParameters = Self::check(resp, &url)?.json().await?;
        debug!(id = ?stored.id, %updated_by, "remote parameters updated");
        Ok(stored)
    }

    #[instrument(name = "settings_get_history", skip(self))]
    async fn fetch_history(&self) -> Result<Vec<CostParameterHistory>, ParamsError> {
        let url = self.endpoint("history");
        let resp = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        Ok(Self::check(resp, &url)?.json().await?)
    }

    #[instrument(name = "settings_revert", skip(self))]
    async fn post_revert(&self, history_id: &str) -> Result<CostParameters, ParamsError> {
        let url = self.endpoint(&format!("revert/{history_id}"));
        let resp = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        Ok(Self::check(resp, &url)?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::ParameterStore;
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[derive(Clone, Debug)]
    struct Received {
        method: String,
        path: String,
        auth: Option<String>,
        body: String,
    }

    type Log = Arc<Mutex<Vec<Received>>>;

    fn params_json(id: &str) -> Value {
        json!({
            "inflationRate": 4.0,
            "tariffRate": 1.5,
            "smallToEvRatio": 30.0,
            "bigToEvRatio": 20.0,
            "id": id,
            "updatedBy": "ops"
        })
    }

    fn reply(method: &str, path: &str) -> (&'static str, Value) {
        if path.starts_with("/broken/") {
            return ("500 Internal Server Error", json!({ "error": "boom" }));
        }
        match (method, path) {
            ("GET", "/api/settings/cost-parameters") => ("200 OK", params_json("p-1")),
            ("PUT", "/api/settings/cost-parameters") => ("200 OK", params_json("p-2")),
            ("GET", "/api/settings/cost-parameters/history") => (
                "200 OK",
                json!([{
                    "id": "h-1",
                    "parameters": params_json("p-1"),
                    "updatedBy": "ops",
                    "updatedAt": "2025-01-01T00:00:00Z"
                }]),
            ),
            ("POST", "/api/settings/cost-parameters/revert/h-1") => ("200 OK", params_json("h-1")),
            _ => ("404 Not Found", json!({})),
        }
    }

    async fn handle(mut sock: TcpStream, log: Log) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next().unwrap().split_whitespace();
        let method = request_line.next().unwrap().to_string();
        let path = request_line.next().unwrap().to_string();
        let mut auth = None;
        let mut content_length = 0;
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                match name.trim().to_ascii_lowercase().as_str() {
                    "authorization" => auth = Some(value.trim().to_string()),
                    "content-length" => content_length = value.trim().parse().unwrap(),
                    _ => {}
                }
            }
        }
        while buf.len() < head_end + content_length {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[head_end..]).to_string();

        let (status, payload) = reply(&method, &path);
        log.lock().unwrap().push(Received {
            method,
            path,
            auth,
            body,
        });
        let payload = payload.to_string();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{payload}",
            payload.len()
        );
        sock.write_all(response.as_bytes()).await.unwrap();
        let _ = sock.shutdown().await;
    }

    /// Serve canned settings responses on a loopback port; returns its base URL.
    async fn settings_service() -> (String, Log) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let log: Log = Arc::default();
        let requests = log.clone();
        tokio::spawn(async move {
            while let Ok((sock, _)) = listener.accept().await {
                tokio::spawn(handle(sock, requests.clone()));
            }
        });
        (base, log)
    }

    fn backend(token: Option<&str>) -> HttpSettingsBackend {
        HttpSettingsBackend::new(
            "http://127.0.0.1:9/",
            token.map(str::to_string),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn endpoints_follow_resource_layout() {
        let b = backend(None);
        assert_eq!(b.endpoint(""), "http://127.0.0.1:9/api/settings/cost-parameters");
        assert_eq!(
            b.endpoint("history"),
            "http://127.0.0.1:9/api/settings/cost-parameters/history"
        );
        assert_eq!(
            b.endpoint("revert/h-1"),
            "http://127.0.0.1:9/api/settings/cost-parameters/revert/h-1"
        );
    }

    #[test]
    fn bearer_header_only_with_token() {
        assert!(backend(None).auth_headers().unwrap().is_empty());
        assert!(backend(Some("")).auth_headers().unwrap().is_empty());
        let headers = backend(Some("abc")).auth_headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn put_body_carries_only_rates() {
        let mut p = CostParameters::default();
        p.id = Some("x".into());
        let body = serde_json::to_value(RatesBody::from(&p)).unwrap();
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["smallToEvRatio"], 25.0);
    }

    #[tokio::test]
    async fn endpoints_use_expected_methods_and_auth() {
        let (base, log) = settings_service().await;
        let b =
            HttpSettingsBackend::new(&base, Some("tok".into()), Duration::from_secs(5)).unwrap();

        let current = b.fetch_current().await.unwrap();
        assert!(current.same_rates(&CostParameters::with_rates(4.0, 1.5, 30.0, 20.0)));
        assert_eq!(current.id.as_deref(), Some("p-1"));

        let stored = b
            .put_current(&CostParameters::with_rates(5.0, 2.0, 35.0, 25.0), "ops")
            .await
            .unwrap();
        assert_eq!(stored.id.as_deref(), Some("p-2"));

        let history = b.fetch_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "h-1");
        assert_eq!(history[0].updated_by, "ops");

        let restored = b.post_revert("h-1").await.unwrap();
        assert_eq!(restored.id.as_deref(), Some("h-1"));

        let received = log.lock().unwrap().clone();
        let calls: Vec<(&str, &str)> = received
            .iter()
            .map(|r| (r.method.as_str(), r.path.as_str()))
            .collect();
        assert_eq!(
            calls,
            [
                ("GET", "/api/settings/cost-parameters"),
                ("PUT", "/api/settings/cost-parameters"),
                ("GET", "/api/settings/cost-parameters/history"),
                ("POST", "/api/settings/cost-parameters/revert/h-1"),
            ]
        );
        assert!(received.iter().all(|r| r.auth.as_deref() == Some("Bearer tok")));
        let put_body: Value = serde_json::from_str(&received[1].body).unwrap();
        assert_eq!(
            put_body,
            json!({
                "inflationRate": 5.0,
                "tariffRate": 2.0,
                "smallToEvRatio": 35.0,
                "bigToEvRatio": 25.0
            })
        );
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (base, log) = settings_service().await;
        let b = HttpSettingsBackend::new(&format!("{base}/broken"), None, Duration::from_secs(5))
            .unwrap();

        match b.fetch_history().await {
            Err(ParamsError::Status { status, url }) => {
                assert_eq!(status, 500);
                assert!(url.ends_with("/broken/api/settings/cost-parameters/history"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            b.put_current(&CostParameters::default(), "ops").await,
            Err(ParamsError::Status { status: 500, .. })
        ));

        let store = ParameterStore::new(b, "ops");
        assert_eq!(store.get_current().await, CostParameters::default());
        assert!(log.lock().unwrap().iter().all(|r| r.auth.is_none()));
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let b = backend(Some("abc"));
        assert!(matches!(b.fetch_history().await, Err(ParamsError::Http(_))));
    }
}
