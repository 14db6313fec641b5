//! reqwest plumbing shared by the HTTP transports.

use std::time::Duration;

use crate::error::ChannelError;

/// Longest provider error body kept in a `Rejected` error.
const MAX_ERROR_BODY: usize = 512;

/// Build a client whose every request is bounded by `timeout`.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ChannelError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ChannelError::ConfigError(format!("failed to build HTTP client: {e}")))
}

/// Classify a reqwest failure, reporting timeouts as such.
pub(crate) fn request_error(e: reqwest::Error, timeout: Duration) -> ChannelError {
    if e.is_timeout() {
        ChannelError::Timeout {
            ms: timeout.as_millis() as u64,
        }
    } else {
        ChannelError::SendFailed(e.to_string())
    }
}

/// Turn a non-2xx response into `Rejected`, keeping a bounded slice of the body.
pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, ChannelError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ChannelError::Rejected {
        status: status.as_u16(),
        body: truncate(&body, MAX_ERROR_BODY),
    })
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ओडिशा", 2), "ओड…");
    }
}
