use crate::error::{CasicsError, IsRetryable};
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::warn;

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Build a client whose requests give up after `timeout`.
/// With `verify` off, server certificates are not checked.
pub fn timed_client(timeout: Duration, verify: bool) -> Result<reqwest::Client, CasicsError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("casics-common/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(timeout)
        .timeout(timeout)
        .danger_accept_invalid_certs(!verify)
        .build()?)
}

/// GET `url` with a request timeout.
pub async fn timed_get(
    url: &str,
    timeout: Duration,
    verify: bool,
) -> Result<reqwest::Response, CasicsError> {
    let client = timed_client(timeout, verify)?;
    Ok(client.get(url).send().await?)
}

/// Like `timed_get`, but retries connect failures, timeouts and 5xx replies.
pub async fn timed_get_with_retry(
    url: &str,
    timeout: Duration,
    verify: bool,
) -> Result<reqwest::Response, CasicsError> {
    let client = timed_client(timeout, verify)?;
    (|| async {
        let resp = client.get(url).send().await?;
        if resp.status().is_server_error() {
            resp.error_for_status_ref()?;
        }
        Ok(resp)
    })
    .retry(default_retry_policy())
    .when(|e: &CasicsError| e.is_retryable())
    .notify(|err, dur: Duration| {
        warn!("GET {} retrying after error {}, sleeping {:?}", url, err, dur);
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn client_builds_with_and_without_verification() {
        assert!(timed_client(Duration::from_secs(10), true).is_ok());
        assert!(timed_client(Duration::from_secs(10), false).is_ok());
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        // Port 9 on localhost (discard) is closed on test machines.
        let err = timed_get("http://127.0.0.1:9/", Duration::from_secs(2), true)
            .await
            .unwrap_err();
        assert!(matches!(err, CasicsError::Reqwest(_)));
        assert!(err.is_retryable());
    }

    /// Serve one canned response per connection, in order, then stop.
    async fn serve(responses: Vec<&'static str>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            for response in responses {
                let (mut sock, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = sock.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                counter.fetch_add(1, Ordering::SeqCst);
                sock.write_all(response.as_bytes()).await.unwrap();
                sock.shutdown().await.ok();
            }
        });
        (url, hits)
    }

    const UNAVAILABLE: &str =
        "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
    const OK: &str = "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok";

    #[tokio::test]
    async fn server_error_is_retried_until_success() {
        let (url, hits) = serve(vec![UNAVAILABLE, OK]).await;
        let resp = timed_get_with_retry(&url, Duration::from_secs(5), true)
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.text().await.unwrap(), "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn plain_get_does_not_retry_server_error() {
        let (url, hits) = serve(vec![UNAVAILABLE]).await;
        let resp = timed_get(&url, Duration::from_secs(5), true).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_url_is_not_retried() {
        let err = timed_get_with_retry("not a url", Duration::from_secs(1), true)
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }
}
