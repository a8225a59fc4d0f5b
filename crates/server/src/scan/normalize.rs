//! Raw scan normalization and code kind classification.
//!
//! Scanners hand us whatever the camera saw: a bare code, a tracking link
//! wrapping a code, or the structured JSON payload embedded in printed QR
//! labels. Everything here is pure string work; store lookups happen later.

use serde::Deserialize;
use url::Url;

use scantrace_core::CodeKind;

/// Case code prefixes used by the label printer.
const CASE_PREFIXES: [&str; 2] = ["MC-", "CASE-"];
/// Unit code prefixes used by the label printer.
const UNIT_PREFIXES: [&str; 2] = ["PROD-", "UNIT-"];

/// Errors rejecting a raw scan before any lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// Nothing left after trimming whitespace.
    #[error("scanned value is empty")]
    Empty,
    /// A tracking link with no code in its path.
    #[error("tracking link contains no code")]
    EmptyLink,
}

/// A normalized code with its resolved kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCode {
    /// The code string to look up.
    pub code: String,
    /// Case or unit, as far as classification can tell.
    pub kind: CodeKind,
}

/// Structured payload embedded in printed QR labels.
#[derive(Debug, Deserialize)]
struct QrPayload {
    kind: CodeKind,
    code: String,
}

/// Normalize a raw scanned value into a code candidate.
///
/// Trims surrounding whitespace. If the value is an http(s) tracking link,
/// the last non-empty path segment is taken as the code.
///
/// # Errors
///
/// Returns [`NormalizeError`] when nothing scannable remains.
pub fn normalize(raw: &str) -> Result<String, NormalizeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NormalizeError::Empty);
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        if let Ok(url) = Url::parse(trimmed) {
            return url
                .path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                .map(ToOwned::to_owned)
                .ok_or(NormalizeError::EmptyLink);
        }
    }

    Ok(trimmed.to_owned())
}

/// Classify a normalized value as a case or unit code.
///
/// Precedence: an explicit caller hint wins; a structured QR payload is
/// honored next (and its embedded code replaces the scanned token); prefix
/// heuristics follow; anything else defaults to a case code, since case
/// scanning is the dominant flow at the warehouse.
#[must_use]
pub fn classify(normalized: String, hint: Option<CodeKind>) -> ClassifiedCode {
    // Printed QR labels may wrap the code in a JSON payload.
    let (code, payload_kind) = match decode_payload(&normalized) {
        Some(payload) => (payload.code, Some(payload.kind)),
        None => (normalized, None),
    };

    let kind = hint
        .or(payload_kind)
        .unwrap_or_else(|| kind_from_prefix(&code));

    ClassifiedCode { code, kind }
}

fn decode_payload(value: &str) -> Option<QrPayload> {
    if !value.starts_with('{') {
        return None;
    }
    serde_json::from_str(value).ok()
}

fn kind_from_prefix(code: &str) -> CodeKind {
    let upper = code.to_ascii_uppercase();
    if UNIT_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        return CodeKind::Unit;
    }
    if CASE_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        return CodeKind::Case;
    }
    CodeKind::Case
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        assert_eq!(normalize("  MC-000042  \n").unwrap(), "MC-000042");
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(normalize("   "), Err(NormalizeError::Empty));
        assert_eq!(normalize(""), Err(NormalizeError::Empty));
    }

    #[test]
    fn extracts_code_from_tracking_link() {
        assert_eq!(
            normalize("https://track.example.com/t/MC-000042").unwrap(),
            "MC-000042"
        );
        // Trailing slash still resolves to the last real segment.
        assert_eq!(
            normalize("http://track.example.com/scan/PROD-7742/").unwrap(),
            "PROD-7742"
        );
    }

    #[test]
    fn rejects_link_without_code() {
        assert_eq!(
            normalize("https://track.example.com"),
            Err(NormalizeError::EmptyLink)
        );
        assert_eq!(
            normalize("https://track.example.com///"),
            Err(NormalizeError::EmptyLink)
        );
    }

    #[test]
    fn hint_overrides_everything() {
        let classified = classify("MC-000042".to_owned(), Some(CodeKind::Unit));
        assert_eq!(classified.kind, CodeKind::Unit);
        assert_eq!(classified.code, "MC-000042");
    }

    #[test]
    fn payload_supplies_kind_and_code() {
        let classified = classify(
            r#"{"kind":"unit","code":"PROD-7742"}"#.to_owned(),
            None,
        );
        assert_eq!(classified.kind, CodeKind::Unit);
        assert_eq!(classified.code, "PROD-7742");
    }

    #[test]
    fn hint_still_wins_over_payload_kind() {
        let classified = classify(
            r#"{"kind":"unit","code":"PROD-7742"}"#.to_owned(),
            Some(CodeKind::Case),
        );
        assert_eq!(classified.kind, CodeKind::Case);
        assert_eq!(classified.code, "PROD-7742");
    }

    #[test]
    fn malformed_payload_falls_through_to_prefixes() {
        let classified = classify(r#"{"kind":"unit""#.to_owned(), None);
        assert_eq!(classified.kind, CodeKind::Case);
        assert_eq!(classified.code, r#"{"kind":"unit""#);
    }

    #[test]
    fn prefixes_decide_kind() {
        assert_eq!(classify("MC-000001".to_owned(), None).kind, CodeKind::Case);
        assert_eq!(
            classify("CASE-000001".to_owned(), None).kind,
            CodeKind::Case
        );
        assert_eq!(classify("PROD-7742".to_owned(), None).kind, CodeKind::Unit);
        assert_eq!(
            classify("unit-000199".to_owned(), None).kind,
            CodeKind::Unit
        );
    }

    #[test]
    fn unknown_shapes_default_to_case() {
        assert_eq!(classify("X9-TRAY-7".to_owned(), None).kind, CodeKind::Case);
    }
}
