//! Response validation pipeline
//!
//! A [`Check`] list is evaluated against one response. Status and
//! cache-control checks accumulate; body checks only run once the status
//! matched, and a body that fails to decode replaces every other failure
//! with a single decode failure. A transport error short-circuits the same
//! way. Every failure except cancellation is recorded in the ledger.

use crate::ledger::ErrorLedger;
use listenbench_core::ErrorKind;
use listenbench_http::responses::{ApiResponse, BaseResponse};
use listenbench_http::{AgentError, AgentResponse};
use listenbench_logging::ADMIN;
use std::fmt;
use tracing::info;

/// Characters of the body kept in decode failures
pub const BODY_PREFIX_CHARS: usize = 256;

type BodyCheck<'a> = Box<dyn FnOnce(&AgentResponse) -> Result<(), FailureDetail> + Send + 'a>;

/// One expectation about a response
pub enum Check<'a> {
    Status(Vec<u16>),
    CacheControlPrivate,
    Body(BodyCheck<'a>),
}

impl fmt::Debug for Check<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Status(codes) => f.debug_tuple("Status").field(codes).finish(),
            Check::CacheControlPrivate => f.write_str("CacheControlPrivate"),
            Check::Body(_) => f.write_str("Body(..)"),
        }
    }
}

impl<'a> Check<'a> {
    /// Status code must be one of `codes`
    pub fn status(codes: &[u16]) -> Self {
        Check::Status(codes.to_vec())
    }

    /// `Cache-Control` must carry `private`
    pub fn cache_control_private() -> Self {
        Check::CacheControlPrivate
    }

    /// Body decodes as `T` with `result: true` and `status: 200`, then
    /// satisfies `predicate`
    pub fn success<T, F>(predicate: F) -> Self
    where
        T: ApiResponse,
        F: FnOnce(T) -> Result<(), String> + Send + 'a,
    {
        Check::Body(Box::new(move |response: &AgentResponse| {
            let body: T = decode(response)?;
            let base = body.base();
            if !base.result {
                return Err(FailureDetail::ResultFlag { expected: true });
            }
            if base.status != 200 {
                return Err(FailureDetail::StatusField {
                    expected: 200,
                    actual: base.status,
                });
            }
            predicate(body).map_err(FailureDetail::Predicate)
        }))
    }

    /// Success envelope with no payload checks
    pub fn success_base() -> Self {
        Self::success::<BaseResponse, _>(|_| Ok(()))
    }

    /// Body decodes as `T` with `result: false`
    pub fn error<T: ApiResponse>() -> Self {
        Check::Body(Box::new(|response: &AgentResponse| {
            let body: T = decode(response)?;
            if body.base().result {
                return Err(FailureDetail::ResultFlag { expected: false });
            }
            Ok(())
        }))
    }
}

fn decode<T: ApiResponse>(response: &AgentResponse) -> Result<T, FailureDetail> {
    response.json::<T>().map_err(|e| FailureDetail::Decode {
        error: e.to_string(),
        body_prefix: response.body_prefix(BODY_PREFIX_CHARS),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDetail {
    Transport(String),
    StatusMismatch { expected: Vec<u16>, actual: u16 },
    CacheControl { actual: Option<String> },
    Decode { error: String, body_prefix: String },
    ResultFlag { expected: bool },
    StatusField { expected: i64, actual: i64 },
    Predicate(String),
    Cancelled,
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureDetail::Transport(msg) => write!(f, "request failed: {}", msg),
            FailureDetail::StatusMismatch { expected, actual } => {
                write!(f, "status code {}, expected one of {:?}", actual, expected)
            }
            FailureDetail::CacheControl { actual } => write!(
                f,
                "cache-control {:?}, expected private",
                actual.as_deref().unwrap_or("")
            ),
            FailureDetail::Decode { error, body_prefix } => {
                write!(f, "failed to decode body: {} (body: {:?})", error, body_prefix)
            }
            FailureDetail::ResultFlag { expected } => {
                write!(f, "result is {}, expected {}", !expected, expected)
            }
            FailureDetail::StatusField { expected, actual } => {
                write!(f, "status field is {}, expected {}", actual, expected)
            }
            FailureDetail::Predicate(msg) => f.write_str(msg),
            FailureDetail::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub label: String,
    pub detail: FailureDetail,
}

impl Failure {
    fn new(label: &str, kind: ErrorKind, detail: FailureDetail) -> Self {
        Self {
            kind,
            label: label.to_string(),
            detail,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.detail == FailureDetail::Cancelled
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.detail)
    }
}

/// Outcome of validating one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    label: String,
    failures: Vec<Failure>,
}

impl Validation {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// The request was cancelled before it produced a response
    pub fn is_cancelled(&self) -> bool {
        !self.failures.is_empty() && self.failures.iter().all(Failure::is_cancelled)
    }

    pub fn into_result(self) -> Result<(), Validation> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "{}: ok", self.label);
        }
        let messages: Vec<String> = self.failures.iter().map(|fail| fail.to_string()).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Evaluate `checks` against `response` without recording anything
pub fn evaluate<'a>(
    label: &str,
    response: &Result<AgentResponse, AgentError>,
    checks: impl IntoIterator<Item = Check<'a>>,
) -> Validation {
    let single = |failure: Failure| Validation {
        label: label.to_string(),
        failures: vec![failure],
    };

    let response = match response {
        Ok(response) => response,
        Err(AgentError::Cancelled) => {
            return single(Failure::new(label, ErrorKind::Request, FailureDetail::Cancelled))
        }
        Err(e) => {
            return single(Failure::new(
                label,
                e.kind(),
                FailureDetail::Transport(e.to_string()),
            ))
        }
    };

    let mut failures = Vec::new();
    let mut bodies = Vec::new();
    let mut status_matched = true;

    for check in checks {
        match check {
            Check::Status(expected) => {
                let actual = response.status_code();
                if !expected.contains(&actual) {
                    status_matched = false;
                    failures.push(Failure::new(
                        label,
                        ErrorKind::Request,
                        FailureDetail::StatusMismatch { expected, actual },
                    ));
                }
            }
            Check::CacheControlPrivate => {
                if !response.is_cache_private() {
                    failures.push(Failure::new(
                        label,
                        ErrorKind::Request,
                        FailureDetail::CacheControl {
                            actual: response.cache_control().map(str::to_string),
                        },
                    ));
                }
            }
            Check::Body(body) => bodies.push(body),
        }
    }

    if status_matched {
        for body in bodies {
            match body(response) {
                Ok(()) => {}
                Err(detail @ FailureDetail::Decode { .. }) => {
                    return single(Failure::new(label, ErrorKind::Request, detail));
                }
                Err(detail) => failures.push(Failure::new(label, ErrorKind::Request, detail)),
            }
        }
    }

    Validation {
        label: label.to_string(),
        failures,
    }
}

/// Evaluate `checks` and record every non-cancellation failure in `ledger`
pub fn validate<'a>(
    label: &str,
    ledger: &ErrorLedger,
    response: &Result<AgentResponse, AgentError>,
    checks: impl IntoIterator<Item = Check<'a>>,
) -> Validation {
    let validation = evaluate(label, response, checks);
    for failure in validation.failures().iter().filter(|f| !f.is_cancelled()) {
        info!(target: ADMIN, "{}", failure);
        ledger.record(failure.kind, failure.to_string());
    }
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use listenbench_http::responses::AddPlaylistResponse;
    use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
    use reqwest::StatusCode;

    fn response(status: u16, cache: Option<&str>, body: &str) -> Result<AgentResponse, AgentError> {
        let mut headers = HeaderMap::new();
        if let Some(cache) = cache {
            headers.insert(CACHE_CONTROL, HeaderValue::from_str(cache).unwrap());
        }
        Ok(AgentResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: Bytes::from(body.to_string()),
        })
    }

    #[test]
    fn test_all_checks_pass() {
        let res = response(200, Some("private"), r#"{"result":true,"status":200,"playlist_ulid":"X"}"#);
        let validation = evaluate(
            "add",
            &res,
            vec![
                Check::status(&[200]),
                Check::cache_control_private(),
                Check::success(|body: AddPlaylistResponse| {
                    if body.playlist_ulid.is_empty() {
                        return Err("empty ulid".to_string());
                    }
                    Ok(())
                }),
            ],
        );
        assert!(validation.is_ok(), "{}", validation);
    }

    #[test]
    fn test_status_and_cache_failures_accumulate() {
        let res = response(500, Some("public, max-age=60"), "oops");
        let validation = evaluate(
            "detail",
            &res,
            vec![Check::status(&[200]), Check::cache_control_private(), Check::success_base()],
        );
        let details: Vec<_> = validation.failures().iter().map(|f| &f.detail).collect();
        assert_eq!(details.len(), 2);
        assert!(matches!(details[0], FailureDetail::StatusMismatch { actual: 500, .. }));
        assert!(matches!(details[1], FailureDetail::CacheControl { .. }));
    }

    #[test]
    fn test_decode_failure_collapses_to_one() {
        let res = response(200, None, "<html>not json</html>");
        let validation = evaluate(
            "recent",
            &res,
            vec![Check::status(&[200]), Check::cache_control_private(), Check::success_base()],
        );
        assert_eq!(validation.failures().len(), 1);
        match &validation.failures()[0].detail {
            FailureDetail::Decode { body_prefix, .. } => assert!(body_prefix.starts_with("<html>")),
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    #[test]
    fn test_result_and_status_fields() {
        let res = response(200, None, r#"{"result":false,"status":200}"#);
        let validation = evaluate("login", &res, vec![Check::success_base()]);
        assert_eq!(
            validation.failures()[0].detail,
            FailureDetail::ResultFlag { expected: true }
        );

        let res = response(200, None, r#"{"result":true,"status":500}"#);
        let validation = evaluate("login", &res, vec![Check::success_base()]);
        assert_eq!(
            validation.failures()[0].detail,
            FailureDetail::StatusField { expected: 200, actual: 500 }
        );
    }

    #[test]
    fn test_error_body_expects_false_result() {
        let res = response(401, None, r#"{"result":false,"status":401,"error":"banned"}"#);
        let validation = evaluate(
            "banned login",
            &res,
            vec![Check::status(&[401]), Check::error::<BaseResponse>()],
        );
        assert!(validation.is_ok());
    }

    #[test]
    fn test_predicate_failure_is_reported() {
        let res = response(200, None, r#"{"result":true,"status":200,"playlist_ulid":""}"#);
        let validation = evaluate(
            "add",
            &res,
            vec![Check::success(|body: AddPlaylistResponse| {
                if body.playlist_ulid.is_empty() {
                    return Err("playlist_ulid is empty".to_string());
                }
                Ok(())
            })],
        );
        assert_eq!(validation.to_string(), "add: playlist_ulid is empty");
    }

    #[test]
    fn test_transport_error_is_single_failure_and_recorded() {
        let ledger = ErrorLedger::default();
        let res: Result<AgentResponse, AgentError> =
            Err(AgentError::InvalidUrl("bad".to_string()));
        let validation = validate("root", &ledger, &res, vec![Check::status(&[200])]);
        assert_eq!(validation.failures().len(), 1);
        assert_eq!(validation.failures()[0].kind, ErrorKind::Agent);
        assert_eq!(ledger.count(ErrorKind::Agent), 1);
    }

    #[test]
    fn test_cancellation_is_not_recorded() {
        let ledger = ErrorLedger::default();
        let res: Result<AgentResponse, AgentError> = Err(AgentError::Cancelled);
        let validation = validate("root", &ledger, &res, vec![Check::status(&[200])]);
        assert!(validation.is_cancelled());
        assert_eq!(ledger.total(), 0);
    }

    #[test]
    fn test_failures_are_recorded() {
        let ledger = ErrorLedger::default();
        let res = response(404, None, "");
        let validation = validate("detail", &ledger, &res, vec![Check::status(&[200])]);
        assert!(validation.into_result().is_err());
        assert_eq!(ledger.count(ErrorKind::Request), 1);
    }
}
