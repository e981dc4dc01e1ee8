//! Shared query parameter types for API handlers.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use songtailor_core::types::Timestamp;

use crate::error::AppError;

/// `?now=` override for time-relative views. Defaults to the server clock.
#[derive(Debug, Default, Deserialize)]
pub struct ReferenceTimeParams {
    pub now: Option<String>,
}

impl ReferenceTimeParams {
    /// Parse the override as RFC 3339, falling back to the current instant.
    pub fn resolve(&self) -> Result<Timestamp, AppError> {
        match self.now.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Utc::now()),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| AppError::BadRequest(format!("Invalid 'now' timestamp '{raw}': {e}"))),
        }
    }
}

/// `?token=` on the WebSocket upgrade; browsers cannot set headers there.
#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn explicit_now_is_parsed() {
        let params = ReferenceTimeParams {
            now: Some("2026-03-10T12:00:00Z".into()),
        };
        assert_eq!(
            params.resolve().unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn bad_now_is_rejected() {
        let params = ReferenceTimeParams {
            now: Some("yesterday".into()),
        };
        assert!(matches!(params.resolve(), Err(AppError::BadRequest(_))));
        assert!(ReferenceTimeParams::default().resolve().is_ok());
    }
}
