//! Splits the coordination file into its four logical sections.
//!
//! A section starts at the first occurrence of its marker and runs up to the
//! next section's marker, searched from the current section's start. A marker
//! that shows up early inside free text therefore truncates the preceding
//! section; that is accepted behaviour.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// One of the four logical sections, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    TaskBoard,
    ActiveClaims,
    Blockers,
    ActivityLog,
}

impl Section {
    /// All sections in the order their markers appear in the file.
    pub const ALL: [Section; 4] = [
        Section::TaskBoard,
        Section::ActiveClaims,
        Section::Blockers,
        Section::ActivityLog,
    ];

    /// Literal text whose first occurrence starts this section.
    pub fn marker(self) -> &'static str {
        match self {
            Section::TaskBoard => "Task Board",
            Section::ActiveClaims => "Active Claims",
            Section::Blockers => "Blockers",
            Section::ActivityLog => "Activity Log",
        }
    }

    /// Key used on the wire.
    pub fn key(self) -> &'static str {
        match self {
            Section::TaskBoard => "task_board",
            Section::ActiveClaims => "active_claims",
            Section::Blockers => "blockers",
            Section::ActivityLog => "activity_log",
        }
    }

    /// The section that follows this one, `None` for the last.
    pub fn next(self) -> Option<Section> {
        match self {
            Section::TaskBoard => Some(Section::ActiveClaims),
            Section::ActiveClaims => Some(Section::Blockers),
            Section::Blockers => Some(Section::ActivityLog),
            Section::ActivityLog => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

// ---------------------------------------------------------------------------
// SectionSet
// ---------------------------------------------------------------------------

/// Trimmed text of each section at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSet {
    pub task_board: String,
    pub active_claims: String,
    pub blockers: String,
    pub activity_log: String,
}

impl SectionSet {
    /// State shown to viewers while the coordination file does not exist.
    pub fn missing(path: &Path) -> Self {
        Self {
            task_board: format!("{} not found", display_name(path)),
            ..Self::default()
        }
    }

    /// State shown when the file exists but cannot be inspected.
    pub fn unavailable(path: &Path, err: &std::io::Error) -> Self {
        Self {
            task_board: format!("ERROR reading {}: {err}", display_name(path)),
            ..Self::default()
        }
    }

    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::TaskBoard => &self.task_board,
            Section::ActiveClaims => &self.active_claims,
            Section::Blockers => &self.blockers,
            Section::ActivityLog => &self.activity_log,
        }
    }

    fn slot(&mut self, section: Section) -> &mut String {
        match section {
            Section::TaskBoard => &mut self.task_board,
            Section::ActiveClaims => &mut self.active_claims,
            Section::Blockers => &mut self.blockers,
            Section::ActivityLog => &mut self.activity_log,
        }
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

/// Parse the full document text into a [`SectionSet`].
pub fn parse(text: &str) -> SectionSet {
    let mut sections = SectionSet::default();
    for section in Section::ALL {
        let block = extract_block(text, section.marker(), section.next().map(Section::marker));
        *sections.slot(section) = block.trim().to_string();
    }
    sections
}

/// Text from the first `start` marker up to `end` (searched from the start
/// marker's index), or to end of document when `end` is absent or not found.
fn extract_block<'a>(text: &'a str, start: &str, end: Option<&str>) -> &'a str {
    let Some(start_idx) = text.find(start) else {
        return "";
    };
    let Some(end) = end else {
        return &text[start_idx..];
    };
    match text[start_idx..].find(end) {
        Some(offset) => &text[start_idx..start_idx + offset],
        None => &text[start_idx..],
    }
}
