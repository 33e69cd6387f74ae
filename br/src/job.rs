//! Job definitions and the validated Job value
//!
//! A [`JobDefinition`] is the stored JSON shape; [`Job`] is the validated,
//! immutable value that travels through the pipeline.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::JobError;

/// Stored job definition
///
/// Unknown keys are ignored and missing keys fall back to zero values.
/// `payload` is a string holding an embedded JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDefinition {
    pub delay: f64,
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub payload: Option<String>,
}

impl JobDefinition {
    /// Parse a definition from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, JobError> {
        serde_json::from_slice(bytes).map_err(JobError::Definition)
    }
}

/// One fully specified HTTP call
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    delay_ms: f64,
    url: String,
    method: Method,
    headers: BTreeMap<String, String>,
    payload: Option<Map<String, Value>>,
}

impl Job {
    /// Create a job with no delay, headers or payload
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            delay_ms: 0.0,
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            payload: None,
        }
    }

    pub fn with_delay_ms(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Parse and validate a job from raw JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, JobError> {
        Self::try_from(JobDefinition::from_slice(bytes)?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.payload.as_ref()
    }

    /// Delay to apply before sending, if any
    pub fn delay(&self) -> Option<Duration> {
        delay_duration(self.delay_ms).filter(|d| !d.is_zero())
    }

    /// Only POST and PUT carry a body
    pub fn carries_body(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT
    }

    /// Serialize the request body
    ///
    /// Returns `None` for methods without a body and for POST/PUT jobs that
    /// have no payload.
    pub fn body(&self) -> Result<Option<Vec<u8>>, serde_json::Error> {
        match (&self.payload, self.carries_body()) {
            (Some(payload), true) => serde_json::to_vec(payload).map(Some),
            _ => Ok(None),
        }
    }
}

/// Milliseconds to a `Duration`; `None` when negative, non-finite or too large
fn delay_duration(delay_ms: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(delay_ms / 1000.0).ok()
}

impl TryFrom<JobDefinition> for Job {
    type Error = JobError;

    fn try_from(def: JobDefinition) -> Result<Self, Self::Error> {
        debug!(url = %def.url, method = %def.method, "Job::try_from: called");

        let method = match def.method.trim() {
            "" => Method::GET,
            m => Method::from_bytes(m.to_uppercase().as_bytes()).map_err(|_| JobError::InvalidMethod(m.to_string()))?,
        };

        if delay_duration(def.delay).is_none() {
            return Err(JobError::InvalidDelay(def.delay));
        }

        let payload = match def.payload.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(serde_json::from_str::<Map<String, Value>>(raw).map_err(JobError::Payload)?),
        };

        Ok(Self {
            delay_ms: def.delay,
            url: def.url,
            method,
            headers: def.headers,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_definition_round_trip() {
        let raw = br#"{"url":"http://x/y","method":"POST","payload":"{\"k\":\"v\"}","headers":{"H":"V"}}"#;
        let job = Job::from_json(raw).unwrap();

        assert_eq!(job.method(), &Method::POST);
        assert_eq!(job.url(), "http://x/y");
        assert_eq!(job.headers().get("H").map(String::as_str), Some("V"));
        assert_eq!(job.body().unwrap().unwrap(), br#"{"k":"v"}"#.to_vec());
    }

    #[test]
    fn test_missing_keys_use_zero_values() {
        let job = Job::from_json(b"{}").unwrap();
        assert_eq!(job.method(), &Method::GET);
        assert_eq!(job.url(), "");
        assert!(job.headers().is_empty());
        assert!(job.payload().is_none());
        assert!(job.delay().is_none());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let job = Job::from_json(br#"{"url":"http://a","extra":[1,2,3]}"#).unwrap();
        assert_eq!(job.url(), "http://a");
    }

    #[test]
    fn test_method_is_normalized() {
        let job = Job::from_json(br#"{"method":"put"}"#).unwrap();
        assert_eq!(job.method(), &Method::PUT);
        assert!(job.carries_body());
    }

    #[test]
    fn test_custom_method_passes_through() {
        let job = Job::from_json(br#"{"method":"PURGE"}"#).unwrap();
        assert_eq!(job.method().as_str(), "PURGE");
        assert!(!job.carries_body());
    }

    #[test]
    fn test_invalid_method_rejected() {
        let err = Job::from_json(br#"{"method":"GE T"}"#).unwrap_err();
        assert!(matches!(err, JobError::InvalidMethod(_)));
    }

    #[test]
    fn test_get_ignores_payload() {
        for method in ["GET", "DELETE", "HEAD"] {
            let raw = format!(r#"{{"method":"{}","payload":"{{\"a\":1}}"}}"#, method);
            let job = Job::from_json(raw.as_bytes()).unwrap();
            assert!(job.payload().is_some());
            assert_eq!(job.body().unwrap(), None, "{} must not carry a body", method);
        }
    }

    #[test]
    fn test_post_without_payload_has_no_body() {
        let job = Job::from_json(br#"{"method":"POST"}"#).unwrap();
        assert_eq!(job.body().unwrap(), None);
    }

    #[test]
    fn test_non_string_header_rejected() {
        let err = Job::from_json(br#"{"headers":{"X-Count":5}}"#).unwrap_err();
        assert!(matches!(err, JobError::Definition(_)));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = Job::from_json(br#"{"delay":"soon"}"#).unwrap_err();
        assert!(matches!(err, JobError::Definition(_)));
    }

    #[test]
    fn test_bad_payload_rejected() {
        let err = Job::from_json(br#"{"method":"POST","payload":"{not json"}"#).unwrap_err();
        assert!(matches!(err, JobError::Payload(_)));
    }

    #[test]
    fn test_payload_must_be_object() {
        let err = Job::from_json(br#"{"method":"POST","payload":"[1,2]"}"#).unwrap_err();
        assert!(matches!(err, JobError::Payload(_)));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = Job::from_json(br#"{"delay":-5}"#).unwrap_err();
        assert!(matches!(err, JobError::InvalidDelay(_)));
    }

    #[test]
    fn test_unrepresentable_delay_rejected() {
        let err = Job::from_json(br#"{"url":"http://x","delay":1e300}"#).unwrap_err();
        assert!(matches!(err, JobError::InvalidDelay(_)));
    }

    #[test]
    fn test_delay_never_panics_on_built_job() {
        let job = Job::new(Method::GET, "http://x").with_delay_ms(f64::MAX);
        assert!(job.delay().is_none());
    }

    #[test]
    fn test_delay_converted_to_duration() {
        let job = Job::from_json(br#"{"delay":250}"#).unwrap();
        assert_eq!(job.delay(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = JobDefinition::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, JobError::Definition(_)));
    }
}
