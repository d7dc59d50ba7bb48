//! HTTP implementation of [`ScheduleNotifier`].
//!
//! Opens one HTTP/1.1 connection per notification, sends a single request
//! and reads the status. The whole exchange is bounded by the configured
//! timeout; a timeout is reported like any other failure.

use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use tracing::{debug, warn};
use url::{Position, Url};

use crate::error::{NotifyError, NotifyResult};
use crate::notifier::{NotifyFuture, ScheduleNotification, ScheduleNotifier, ScheduleOperation};

/// Notifier that talks to the scheduler's `/v2/schedules` endpoint.
#[derive(Debug, Clone)]
pub struct HttpScheduleNotifier {
    base: Url,
    timeout: Duration,
}

impl HttpScheduleNotifier {
    /// Create a notifier for the scheduler at `base_url` (an `http://` URL).
    pub fn new(base_url: &str, timeout: Duration) -> NotifyResult<Self> {
        let base =
            Url::parse(base_url).map_err(|e| NotifyError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.scheme() != "http" || base.cannot_be_a_base() || base.host_str().is_none() {
            return Err(NotifyError::InvalidUrl(format!(
                "{base_url}: expected an http:// base url"
            )));
        }
        Ok(Self { base, timeout })
    }

    /// `{base}/v2/schedules/{app_id}`, plus `?guid=` on activate.
    fn endpoint(&self, notification: &ScheduleNotification<'_>) -> NotifyResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| NotifyError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(["v2", "schedules", notification.app_id]);
        if let (ScheduleOperation::Activate, Some(guid)) =
            (notification.operation, notification.policy_guid)
        {
            url.query_pairs_mut().append_pair("guid", guid);
        }
        Ok(url)
    }

    async fn dispatch(&self, notification: ScheduleNotification<'_>) -> NotifyResult<()> {
        let url = self.endpoint(&notification)?;
        let (method, body) = match notification.operation {
            ScheduleOperation::Activate => {
                let policy = notification.policy.ok_or_else(|| {
                    NotifyError::Encode("activate requires a policy document".to_string())
                })?;
                let json =
                    serde_json::to_vec(policy).map_err(|e| NotifyError::Encode(e.to_string()))?;
                (Method::PUT, Bytes::from(json))
            }
            ScheduleOperation::Deactivate => (Method::DELETE, Bytes::new()),
        };
        let endpoint = format!("{method} {url}");

        let (status, body) =
            match tokio::time::timeout(self.timeout, send(method, &url, body, &endpoint)).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(%endpoint, timeout = ?self.timeout, "scheduler call timed out");
                    return Err(NotifyError::Timeout {
                        endpoint,
                        timeout: self.timeout,
                    });
                }
            };

        if status.is_success() {
            debug!(%endpoint, %status, app_id = %notification.app_id, "scheduler notified");
            return Ok(());
        }
        if notification.operation == ScheduleOperation::Deactivate && status == StatusCode::NOT_FOUND
        {
            debug!(%endpoint, app_id = %notification.app_id, "no schedules registered, nothing to deactivate");
            return Ok(());
        }

        warn!(%endpoint, %status, "scheduler refused notification");
        Err(NotifyError::Status {
            endpoint,
            status: status.as_u16(),
            body,
        })
    }
}

impl ScheduleNotifier for HttpScheduleNotifier {
    fn notify<'a>(&'a self, notification: ScheduleNotification<'a>) -> NotifyFuture<'a> {
        Box::pin(self.dispatch(notification))
    }
}

/// Send one request over a fresh connection; returns status and body text.
async fn send(
    method: Method,
    url: &Url,
    body: Bytes,
    endpoint: &str,
) -> NotifyResult<(StatusCode, String)> {
    let invalid = || NotifyError::InvalidUrl(url.to_string());
    let host = url.host_str().ok_or_else(invalid)?;
    let port = url.port_or_known_default().ok_or_else(invalid)?;
    let authority = format!("{host}:{port}");

    let connect_err = |e: &dyn std::fmt::Display| NotifyError::Connect {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    };
    let request_err = |e: &dyn std::fmt::Display| NotifyError::Request {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    };

    let stream = tokio::net::TcpStream::connect(&authority)
        .await
        .map_err(|e| connect_err(&e))?;
    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| connect_err(&e))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "scheduler connection closed with error");
        }
    });

    let mut builder = Request::builder()
        .method(method)
        .uri(&url[Position::BeforePath..])
        .header(HOST, authority.as_str())
        .header(USER_AGENT, "policygrid-notify/0.1");
    if !body.is_empty() {
        builder = builder.header(CONTENT_TYPE, "application/json");
    }
    let req = builder.body(Full::new(body)).map_err(|e| request_err(&e))?;

    let resp = sender.send_request(req).await.map_err(|e| request_err(&e))?;
    let status = resp.status();
    let text = match resp.into_body().collect().await {
        Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
        Err(e) => {
            debug!(error = %e, %endpoint, "failed to read scheduler response body");
            String::new()
        }
    };
    Ok((status, text))
}
