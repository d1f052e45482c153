use std::thread;
use std::time::Duration;

/// Per-request knobs for the blocking resolver calls.
#[derive(Debug, Clone)]
pub(crate) struct RequestPolicy {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
    pub(crate) attempts: usize,
    pub(crate) retry_delay: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(6),
            attempts: 3,
            retry_delay: Duration::from_millis(400),
        }
    }
}

fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

/// GET with bounded retries on transient failures (408/429/5xx and
/// transport errors). Errors are plain strings: callers downgrade them to
/// warnings instead of propagating.
pub(crate) fn get_with_retries(
    url: &str,
    query: &[(&str, &str)],
    policy: &RequestPolicy,
) -> Result<String, String> {
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(policy.connect_timeout)
            .timeout_read(policy.read_timeout)
            .timeout_write(policy.read_timeout)
            .build();

        let mut request = agent.get(url);
        for (key, value) in query {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(response) => {
                return response
                    .into_string()
                    .map_err(|err| format!("request failed: response decode failed: {err}"));
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                let detail = summarize_status(status, body.trim());
                if is_retryable_status(status) {
                    if attempt < attempts {
                        thread::sleep(policy.retry_delay);
                        continue;
                    }
                    return Err(format!("request failed after {attempts} attempt(s): {detail}"));
                }
                return Err(format!("request failed: {detail}"));
            }
            Err(ureq::Error::Transport(err)) => {
                if attempt < attempts {
                    thread::sleep(policy.retry_delay);
                    continue;
                }
                return Err(format!(
                    "request failed after {attempts} attempt(s): transport error: {err}"
                ));
            }
        }
    }

    Err("request failed: exhausted attempts without a concrete error".to_string())
}

fn summarize_status(status: u16, body: &str) -> String {
    if body.is_empty() {
        format!("HTTP status {status}")
    } else {
        let truncated = body.chars().take(240).collect::<String>();
        format!("HTTP status {status} ({truncated})")
    }
}
