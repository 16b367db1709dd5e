//! Widget configuration, read from the iframe URL query string.
//!
//! Recognized parameters:
//! - `origin=<origin>` (repeatable): only accept host messages from these origins
//! - `sample_delay_ms=<n>`: delay before the standalone sample table is shown
//! - `target_origin=<origin>`: target origin for outbound requests (default `*`)
//!
//! Unknown parameters and unparseable values are ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_DELAY_MS: u64 = 150;

/// Which senders the bridge accepts inbound messages from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "origins", rename_all = "snake_case")]
pub enum OriginPolicy {
    /// Accept every sender. The embedding host is trusted to be the only party
    /// able to post into the iframe.
    #[default]
    Any,
    AllowList(Vec<String>),
}

impl OriginPolicy {
    pub fn allows(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::AllowList(origins) => origins
                .iter()
                .any(|allowed| allowed.trim_end_matches('/') == origin.trim_end_matches('/')),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WidgetConfig {
    pub origin_policy: OriginPolicy,
    pub sample_delay_ms: u64,
    pub request_target_origin: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            origin_policy: OriginPolicy::Any,
            sample_delay_ms: DEFAULT_SAMPLE_DELAY_MS,
            request_target_origin: "*".to_string(),
        }
    }
}

impl WidgetConfig {
    pub fn sample_delay(&self) -> Duration {
        Duration::from_millis(self.sample_delay_ms)
    }

    /// Build a config from a `location.search` style string (leading `?` optional).
    pub fn from_query(query: &str) -> Self {
        let mut config = Self::default();
        let mut allowed = Vec::new();

        for pair in query.trim_start_matches('?').split('&') {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_component(raw);
            match key {
                "origin" if !value.is_empty() => allowed.push(value),
                "sample_delay_ms" => match value.parse() {
                    Ok(ms) => config.sample_delay_ms = ms,
                    Err(_) => tracing::warn!(value = %value, "ignoring invalid sample_delay_ms"),
                },
                "target_origin" if !value.is_empty() => config.request_target_origin = value,
                _ => {}
            }
        }

        if !allowed.is_empty() {
            config.origin_policy = OriginPolicy::AllowList(allowed);
        }
        config
    }
}

/// Decode one query component; `+` is a space, invalid UTF-8 is replaced.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}
