//! Claim records and the Active Claims splicer.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document;
use crate::error::BoardError;
use crate::sections::{parse, Section, SectionSet};

/// Every claimable task id starts with this prefix.
pub const TASK_ID_PREFIX: &str = "CP-";

/// Instructional line sitting in an empty Active Claims section.
pub const PLACEHOLDER: &str = "(Empty — agents must add entries here before starting work)";

// ---------------------------------------------------------------------------
// Request / record
// ---------------------------------------------------------------------------

/// Claim submission as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClaimRequest {
    pub token: String,
    pub task_id: String,
    pub agent: String,
    pub start_utc: String,
    pub eta: String,
    pub scope: String,
    pub branch: String,
}

/// A validated claim, ready to be written as one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    pub task_id: String,
    pub agent: String,
    pub start_utc: String,
    pub eta: String,
    pub scope: String,
    pub branch: String,
}

impl ClaimRecord {
    /// Validate `request` into a record whose fields each fit in one column
    /// of one line: line breaks and `|` inside a field become spaces.
    ///
    /// Fields must not carry section marker text, which would move the
    /// section boundaries of the file the line is written into.
    pub fn from_request(request: &ClaimRequest) -> Result<Self, ClaimError> {
        let task_id = single_field(&request.task_id);
        if !task_id.starts_with(TASK_ID_PREFIX) || names_a_section(&task_id) {
            return Err(ClaimError::InvalidTaskId);
        }

        let record = Self {
            task_id,
            agent: single_field(&request.agent),
            start_utc: single_field(&request.start_utc),
            eta: single_field(&request.eta),
            scope: single_field(&request.scope),
            branch: single_field(&request.branch),
        };
        let fields = [
            &record.agent,
            &record.start_utc,
            &record.eta,
            &record.scope,
            &record.branch,
        ];
        if fields
            .iter()
            .any(|field| field.is_empty() || names_a_section(field))
        {
            return Err(ClaimError::MissingFields);
        }
        Ok(record)
    }

    /// Read back a line previously written by [`ClaimRecord`]'s `Display`.
    ///
    /// Hand-written lines with a different shape yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        let [task_id, agent, start_utc, eta, scope, branch] = fields.as_slice() else {
            return None;
        };
        if !task_id.starts_with(TASK_ID_PREFIX) {
            return None;
        }
        Some(Self {
            task_id: task_id.to_string(),
            agent: agent.to_string(),
            start_utc: start_utc.to_string(),
            eta: eta.to_string(),
            scope: scope.to_string(),
            branch: branch.to_string(),
        })
    }
}

fn single_field(raw: &str) -> String {
    raw.replace(['\r', '\n', '|'], " ").trim().to_string()
}

fn names_a_section(field: &str) -> bool {
    Section::ALL
        .iter()
        .any(|section| field.contains(section.marker()))
}

/// Claim lines currently listed in the Active Claims section.
pub fn listed_claims(sections: &SectionSet) -> Vec<ClaimRecord> {
    sections
        .active_claims
        .lines()
        .filter_map(ClaimRecord::parse_line)
        .collect()
}

impl fmt::Display for ClaimRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} | {} | {}",
            self.task_id, self.agent, self.start_utc, self.eta, self.scope, self.branch
        )
    }
}

// ---------------------------------------------------------------------------
// ClaimError
// ---------------------------------------------------------------------------

/// Why a claim submission was rejected. Display strings are the wire messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid taskId")]
    InvalidTaskId,

    #[error("missing fields")]
    MissingFields,

    #[error("task already claimed")]
    AlreadyClaimed,

    /// Failure while loading, splicing or writing; nothing was written.
    #[error("{0}")]
    Internal(String),
}

impl From<BoardError> for ClaimError {
    fn from(err: BoardError) -> Self {
        ClaimError::Internal(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// authorize
// ---------------------------------------------------------------------------

/// Check the caller's token against the configured secret.
///
/// An unset or empty secret rejects every token.
pub fn authorize(secret: Option<&str>, token: &str) -> Result<(), ClaimError> {
    match secret {
        Some(secret) if !secret.is_empty() && constant_time_eq(secret, token) => Ok(()),
        _ => Err(ClaimError::Unauthorized),
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// ---------------------------------------------------------------------------
// insert_claim
// ---------------------------------------------------------------------------

/// Append `line` to the Active Claims section of `text`.
///
/// Everything before the Active Claims marker and from the Blockers marker
/// onward is returned byte-for-byte. The placeholder line is dropped on the
/// first insertion.
pub fn insert_claim(text: &str, line: &str) -> Result<String, BoardError> {
    let start = text
        .find(Section::ActiveClaims.marker())
        .ok_or(BoardError::SectionNotFound {
            marker: Section::ActiveClaims.marker(),
        })?;
    let blockers_start = text[start..]
        .find(Section::Blockers.marker())
        .map(|offset| start + offset)
        .ok_or(BoardError::SectionNotFound {
            marker: Section::Blockers.marker(),
        })?;

    let mut claims = text[start..blockers_start].to_string();
    if claims.contains(PLACEHOLDER) {
        claims = claims.replace(PLACEHOLDER, "");
    }
    claims.truncate(claims.trim_end().len());
    claims.push('\n');
    claims.push_str(&line.trim().replace(['\r', '\n'], " "));
    claims.push('\n');

    let mut updated = String::with_capacity(text.len() + line.len() + 2);
    updated.push_str(&text[..start]);
    updated.push_str(&claims);
    updated.push_str(&text[blockers_start..]);
    Ok(updated)
}

// ---------------------------------------------------------------------------
// apply_claim
// ---------------------------------------------------------------------------

/// Authorize, validate and persist a claim against the file at `path`.
///
/// Returns the sections of the text just written. The read-check-write is not
/// locked: a concurrent writer can race it and the last write wins.
pub fn apply_claim(
    path: &Path,
    request: &ClaimRequest,
    secret: Option<&str>,
) -> Result<SectionSet, ClaimError> {
    authorize(secret, &request.token)?;
    let record = ClaimRecord::from_request(request)?;

    let text = document::load(path)?;
    if parse(&text).active_claims.contains(&record.task_id) {
        return Err(ClaimError::AlreadyClaimed);
    }

    let updated = insert_claim(&text, &record.to_string())?;
    document::write(path, &updated)?;

    tracing::info!(
        "claimed {} for {} in {}",
        record.task_id,
        record.agent,
        path.display()
    );
    Ok(parse(&updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request(task_id: &str) -> ClaimRequest {
        ClaimRequest {
            token: "s3cret".to_string(),
            task_id: task_id.to_string(),
            agent: "alice".to_string(),
            start_utc: "2024-01-01T00:00Z".to_string(),
            eta: "2024-01-01T02:00Z".to_string(),
            scope: "build".to_string(),
            branch: "feature/x".to_string(),
        }
    }

    #[test]
    fn record_renders_pipe_delimited_line() {
        let record = ClaimRecord::from_request(&request("  CP-42 ")).unwrap();
        assert_eq!(
            record.to_string(),
            "CP-42 | alice | 2024-01-01T00:00Z | 2024-01-01T02:00Z | build | feature/x"
        );
    }

    #[rstest]
    #[case("42")]
    #[case("cp-42")]
    #[case("")]
    #[case(" X-CP-1")]
    fn task_id_without_prefix_is_rejected(#[case] task_id: &str) {
        assert_eq!(
            ClaimRecord::from_request(&request(task_id)),
            Err(ClaimError::InvalidTaskId)
        );
    }

    #[rstest]
    #[case::agent(|r: &mut ClaimRequest| r.agent = "   ".into())]
    #[case::start(|r: &mut ClaimRequest| r.start_utc.clear())]
    #[case::eta(|r: &mut ClaimRequest| r.eta.clear())]
    #[case::scope(|r: &mut ClaimRequest| r.scope = "\t".into())]
    #[case::branch(|r: &mut ClaimRequest| r.branch.clear())]
    fn blank_field_is_rejected(#[case] blank: fn(&mut ClaimRequest)) {
        let mut req = request("CP-1");
        blank(&mut req);
        assert_eq!(
            ClaimRecord::from_request(&req),
            Err(ClaimError::MissingFields)
        );
    }

    #[test]
    fn line_breaks_and_pipes_stay_inside_their_field() {
        let mut req = request("CP-1");
        req.agent = "alice\nbob".into();
        req.scope = "a\r\nb".into();
        req.branch = "d|e".into();

        let record = ClaimRecord::from_request(&req).unwrap();
        let line = record.to_string();
        assert_eq!(
            line,
            "CP-1 | alice bob | 2024-01-01T00:00Z | 2024-01-01T02:00Z | a  b | d e"
        );
        assert_eq!(ClaimRecord::parse_line(&line), Some(record));
    }

    #[test]
    fn field_of_only_line_breaks_is_missing() {
        let mut req = request("CP-1");
        req.eta = "\r\n".into();
        assert_eq!(
            ClaimRecord::from_request(&req),
            Err(ClaimError::MissingFields)
        );
    }

    #[rstest]
    #[case::agent(|r: &mut ClaimRequest| r.agent = "alice\nBlockers\nfake".into())]
    #[case::scope(|r: &mut ClaimRequest| r.scope = "see Activity Log".into())]
    #[case::branch(|r: &mut ClaimRequest| r.branch = "Active Claims".into())]
    fn field_carrying_section_marker_is_rejected(#[case] inject: fn(&mut ClaimRequest)) {
        let mut req = request("CP-1");
        inject(&mut req);
        assert_eq!(
            ClaimRecord::from_request(&req),
            Err(ClaimError::MissingFields)
        );
    }

    #[test]
    fn task_id_carrying_section_marker_is_invalid() {
        assert_eq!(
            ClaimRecord::from_request(&request("CP-7\nBlockers\nfake")),
            Err(ClaimError::InvalidTaskId)
        );
    }

    #[test]
    fn insert_keeps_multiline_input_on_one_line() {
        let updated =
            insert_claim("Active Claims\nBlockers\n", "CP-3 | a\nb | c | d | e | f").unwrap();
        assert_eq!(updated, "Active Claims\nCP-3 | a b | c | d | e | f\nBlockers\n");
    }

    #[test]
    fn task_id_is_checked_before_fields() {
        let mut req = request("nope");
        req.agent.clear();
        assert_eq!(
            ClaimRecord::from_request(&req),
            Err(ClaimError::InvalidTaskId)
        );
    }

    #[rstest]
    #[case(Some("s3cret"), "s3cret", true)]
    #[case(Some("s3cret"), "s3cret ", false)]
    #[case(Some("s3cret"), "", false)]
    #[case(Some(""), "", false)]
    #[case(None, "anything", false)]
    fn authorize_requires_configured_matching_secret(
        #[case] secret: Option<&str>,
        #[case] token: &str,
        #[case] allowed: bool,
    ) {
        assert_eq!(authorize(secret, token).is_ok(), allowed);
    }

    #[test]
    fn insert_removes_placeholder_on_first_claim() {
        let text = format!("Task Board\nCP-42\n\nActive Claims\n{PLACEHOLDER}\n\nBlockers\nnone\n");
        let updated = insert_claim(&text, "CP-42 | alice | a | b | c | d").unwrap();

        assert!(!updated.contains(PLACEHOLDER));
        assert_eq!(
            updated,
            "Task Board\nCP-42\n\nActive Claims\nCP-42 | alice | a | b | c | d\nBlockers\nnone\n"
        );
    }

    #[test]
    fn insert_appends_after_existing_claims() {
        let text = "Active Claims\nCP-1 | bob | a | b | c | d\n\n\nBlockers\n";
        let updated = insert_claim(text, "  CP-2 | eve | a | b | c | d  \n").unwrap();
        assert_eq!(
            updated,
            "Active Claims\nCP-1 | bob | a | b | c | d\nCP-2 | eve | a | b | c | d\nBlockers\n"
        );
    }

    #[test]
    fn insert_preserves_prefix_and_suffix_bytes() {
        let text = "Title\r\n  Task Board \t\nx\nActive Claims\ny\nBlockers\n\tb\r\nActivity Log\nz";
        let updated = insert_claim(text, "CP-9 | a | b | c | d | e").unwrap();

        let start = text.find("Active Claims").unwrap();
        let blk = text.find("Blockers").unwrap();
        assert_eq!(&updated[..start], &text[..start]);
        assert!(updated.ends_with(&text[blk..]));
    }

    #[test]
    fn insert_without_active_claims_fails() {
        let err = insert_claim("Task Board\nBlockers\n", "CP-1 | a | b | c | d | e").unwrap_err();
        assert!(matches!(
            err,
            BoardError::SectionNotFound {
                marker: "Active Claims"
            }
        ));
    }

    #[test]
    fn insert_with_blockers_only_before_claims_fails() {
        let err =
            insert_claim("Blockers\nActive Claims\nx\n", "CP-1 | a | b | c | d | e").unwrap_err();
        assert!(matches!(
            err,
            BoardError::SectionNotFound { marker: "Blockers" }
        ));
    }

    #[test]
    fn listed_claims_skips_header_and_free_text() {
        let sections = SectionSet {
            active_claims: "Active Claims\nCP-1 | bob | a | b | c | d\nnote: ask eve\nCP-2|eve|a|b|c|d"
                .to_string(),
            ..SectionSet::default()
        };
        let claims = listed_claims(&sections);
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].agent, "bob");
        assert_eq!(claims[1].task_id, "CP-2");
        assert_eq!(claims[1].branch, "d");
    }

    #[test]
    fn written_line_parses_back() {
        let record = ClaimRecord::from_request(&request("CP-42")).unwrap();
        assert_eq!(ClaimRecord::parse_line(&record.to_string()), Some(record));
        assert_eq!(ClaimRecord::parse_line("CP-1 | too | few"), None);
    }

    #[test]
    fn error_messages_match_wire_strings() {
        assert_eq!(ClaimError::Unauthorized.to_string(), "unauthorized");
        assert_eq!(ClaimError::InvalidTaskId.to_string(), "invalid taskId");
        assert_eq!(ClaimError::MissingFields.to_string(), "missing fields");
        assert_eq!(ClaimError::AlreadyClaimed.to_string(), "task already claimed");
        assert_eq!(
            ClaimError::from(BoardError::SectionNotFound { marker: "Blockers" }).to_string(),
            "section not found: Blockers"
        );
    }

    #[test]
    fn request_deserializes_camel_case_and_defaults_missing_fields() {
        let req: ClaimRequest =
            serde_json::from_str(r#"{"token":"t","taskId":"CP-1","startUtc":"now"}"#).unwrap();
        assert_eq!(req.task_id, "CP-1");
        assert_eq!(req.start_utc, "now");
        assert!(req.branch.is_empty());
    }
}
