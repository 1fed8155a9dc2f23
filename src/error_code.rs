//! Public outcome codes for retrieval queries.
//!
//! Every query ends in exactly one of these outcomes. Internal failures are
//! never surfaced raw; [`crate::Error::outcome_code`] folds them into this set.
//!
//! | Prefix | Category    | Description                         |
//! |--------|-------------|-------------------------------------|
//! | R0xxx  | success     | Results returned as ranked          |
//! | R1xxx  | client      | Request-side problems               |
//! | R2xxx  | degraded    | Results returned, with a caveat     |
//! | R3xxx  | dependency  | Backing store presumed unhealthy    |
//! | R9xxx  | internal    | Catch-all                           |
//!
//! ## Example
//!
//! ```rust
//! use rag_retrieval::error_code::OutcomeCode;
//!
//! let code = OutcomeCode::Unavailable;
//! assert_eq!(code.code(), "R3001");
//! assert!(code.retryable());
//! assert_eq!(code.category(), "dependency");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCode {
    /// R0000: Ranked results returned normally
    Ok,
    /// R1001: Malformed query parameters (e.g. weight outside [0, 1])
    InvalidRequest,
    /// R2001: The query matched nothing
    NoResults,
    /// R2002: Reranking failed; results are in first-pass order
    DegradedRanking,
    /// R3001: Dependency unhealthy or circuit open; retry after cooldown
    Unavailable,
    /// R9999: Unclassified internal failure
    Internal,
}

impl OutcomeCode {
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ok => "R0000",
            Self::InvalidRequest => "R1001",
            Self::NoResults => "R2001",
            Self::DegradedRanking => "R2002",
            Self::Unavailable => "R3001",
            Self::Internal => "R9999",
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidRequest => "invalid_request",
            Self::NoResults => "no_results",
            Self::DegradedRanking => "degraded_ranking",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }

    /// Stable human-readable description, safe for end users.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ok => "Results returned",
            Self::InvalidRequest => "Invalid request",
            Self::NoResults => "No matching documents were found",
            Self::DegradedRanking => "Results returned without refined ranking",
            Self::Unavailable => "Search is temporarily unavailable; please retry later",
            Self::Internal => "Search failed due to an internal error",
        }
    }

    /// Whether the caller may retry later (after the advertised cooldown).
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Whether the query produced a usable result list.
    #[inline]
    pub fn has_results(&self) -> bool {
        matches!(self, Self::Ok | Self::DegradedRanking)
    }

    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::InvalidRequest => "client",
            Self::NoResults | Self::DegradedRanking => "degraded",
            Self::Unavailable => "dependency",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let all = [
            OutcomeCode::Ok,
            OutcomeCode::InvalidRequest,
            OutcomeCode::NoResults,
            OutcomeCode::DegradedRanking,
            OutcomeCode::Unavailable,
            OutcomeCode::Internal,
        ];
        let mut codes: Vec<&str> = all.iter().map(|c| c.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(OutcomeCode::Unavailable.retryable());
        assert!(!OutcomeCode::NoResults.retryable());
        assert!(!OutcomeCode::InvalidRequest.retryable());
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&OutcomeCode::DegradedRanking).unwrap();
        assert_eq!(json, "\"degraded_ranking\"");
    }
}
