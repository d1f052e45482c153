use std::env;
use std::path::Path;

use serde_json::Value;

use crate::http::{RequestPolicy, get_with_retries};

/// Outcome of a resolve attempt. Failures never surface as errors, only as
/// a missing URL plus warnings the caller can show or log.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolveOutcome {
    pub(crate) url: Option<String>,
    pub(crate) duration_secs: Option<f64>,
    pub(crate) warnings: Vec<String>,
}

/// Maps a stored video path to a playable URL. Absolute URLs and existing
/// local files pass through; everything else goes to the configured
/// resolver endpoint.
pub(crate) struct StreamResolver {
    endpoint: Option<String>,
    policy: RequestPolicy,
}

impl StreamResolver {
    pub(crate) fn from_env() -> Self {
        let endpoint = env::var("SEEKGUARD_RESOLVER_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self {
            endpoint,
            policy: RequestPolicy::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_endpoint(endpoint: &str, policy: RequestPolicy) -> Self {
        Self {
            endpoint: Some(endpoint.to_string()),
            policy,
        }
    }

    pub(crate) fn resolve(&self, video_path: &str) -> ResolveOutcome {
        if video_path.starts_with("http://") || video_path.starts_with("https://") {
            return ResolveOutcome {
                url: Some(video_path.to_string()),
                ..ResolveOutcome::default()
            };
        }
        if Path::new(video_path).is_file() {
            return ResolveOutcome {
                url: Some(video_path.to_string()),
                ..ResolveOutcome::default()
            };
        }

        let Some(endpoint) = self.endpoint.as_deref() else {
            return ResolveOutcome {
                warnings: vec![format!(
                    "no resolver endpoint configured (set SEEKGUARD_RESOLVER_URL) and {video_path} is not a local file"
                )],
                ..ResolveOutcome::default()
            };
        };

        match get_with_retries(endpoint, &[("path", video_path)], &self.policy) {
            Ok(body) => parse_resolve_response(&body, video_path),
            Err(err) => ResolveOutcome {
                warnings: vec![format!("resolver unreachable for {video_path}: {err}")],
                ..ResolveOutcome::default()
            },
        }
    }
}

pub(crate) fn parse_resolve_response(raw: &str, video_path: &str) -> ResolveOutcome {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            return ResolveOutcome {
                warnings: vec![format!("resolver sent malformed JSON for {video_path}: {err}")],
                ..ResolveOutcome::default()
            };
        }
    };

    let url = parsed
        .pointer("/url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    let duration_secs = parsed
        .pointer("/duration_secs")
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite() && *value > 0.0);

    let warnings = if url.is_none() {
        // The resolver answers null for paths outside its size/duration
        // limits; that is a decline, not a failure.
        vec![format!("resolver declined to serve {video_path}")]
    } else {
        Vec::new()
    };

    ResolveOutcome {
        url,
        duration_secs,
        warnings,
    }
}
