//! Violations: rule findings and stage failures, in source coordinates.

use serde::Serialize;
use squill_core::PositionMarker;

use crate::diagnostics::DiagnosticKind;
use crate::segments::Segment;

use super::fix::{EditType, LintFix};

/// Where a violation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Lint,
    Parse,
    Lex,
    Template,
    Noqa,
    /// A rule panicked.
    Critical,
}

impl ViolationKind {
    /// Pseudo rule code used by directives and filters.
    pub fn pseudo_code(&self) -> Option<&'static str> {
        match self {
            ViolationKind::Lint => None,
            ViolationKind::Parse => Some("PRS"),
            ViolationKind::Lex => Some("LXR"),
            ViolationKind::Template => Some("TMP"),
            ViolationKind::Noqa => Some("NOQA"),
            ViolationKind::Critical => Some("CRITICAL"),
        }
    }

    /// The `ignore` class that suppresses this kind.
    pub fn ignore_class(&self) -> Option<&'static str> {
        match self {
            ViolationKind::Parse => Some("parsing"),
            ViolationKind::Lex => Some("lexing"),
            ViolationKind::Template => Some("templating"),
            ViolationKind::Critical => Some("linting"),
            ViolationKind::Lint | ViolationKind::Noqa => None,
        }
    }

    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            ViolationKind::Lint => DiagnosticKind::RuleViolation,
            ViolationKind::Parse => DiagnosticKind::ParseFailed,
            ViolationKind::Lex => DiagnosticKind::LexFailed,
            ViolationKind::Template => DiagnosticKind::TemplateFailed,
            ViolationKind::Noqa => DiagnosticKind::MalformedNoqa,
            ViolationKind::Critical => DiagnosticKind::InternalError,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Violation {
    pub kind: ViolationKind,
    pub code: String,
    pub name: String,
    pub description: String,
    pub line_no: usize,
    pub line_pos: usize,
    pub end_line_no: usize,
    pub end_line_pos: usize,
    pub start_file_pos: usize,
    pub end_file_pos: usize,
    pub warning: bool,
    pub fixes: Vec<LintFix>,
    /// Segment the violation points at, when there is one.
    pub anchor: Option<Segment>,
}

impl Violation {
    /// Violation covering `marker`.
    pub fn at_marker(
        kind: ViolationKind,
        code: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        marker: &PositionMarker,
    ) -> Self {
        let (line_no, line_pos) = marker.source_position();
        let (end_line_no, end_line_pos) = marker.end_point_marker().source_position();
        let source = marker.source_slice();
        Self {
            kind,
            code: code.into(),
            name: name.into(),
            description: description.into(),
            line_no,
            line_pos,
            end_line_no,
            end_line_pos,
            start_file_pos: source.start,
            end_file_pos: source.end,
            warning: false,
            fixes: Vec::new(),
            anchor: None,
        }
    }

    /// Violation at a line and column, with no span.
    pub fn at_position(
        kind: ViolationKind,
        code: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        line_no: usize,
        line_pos: usize,
    ) -> Self {
        Self {
            kind,
            code: code.into(),
            name: name.into(),
            description: description.into(),
            line_no,
            line_pos,
            end_line_no: line_no,
            end_line_pos: line_pos,
            start_file_pos: 0,
            end_file_pos: 0,
            warning: false,
            fixes: Vec::new(),
            anchor: None,
        }
    }

    /// A stage failure reported under its pseudo code.
    pub fn stage(kind: ViolationKind, description: impl Into<String>, marker: &PositionMarker) -> Self {
        let code = kind.pseudo_code().unwrap_or("????");
        Self::at_marker(kind, code, stage_name(kind), description, marker)
    }

    pub fn with_anchor(mut self, anchor: Segment) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_fixes(mut self, fixes: Vec<LintFix>) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn as_warning(mut self) -> Self {
        self.warning = true;
        self
    }

    pub fn rule_code(&self) -> &str {
        &self.code
    }

    pub fn is_fixable(&self) -> bool {
        !self.fixes.is_empty()
    }

    /// `CODE: description`, as shown to users.
    pub fn message(&self) -> String {
        format!("{}: {}", self.code, self.description)
    }

    pub fn record(&self) -> ViolationRecord {
        ViolationRecord {
            code: self.code.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            line_no: self.line_no,
            line_pos: self.line_pos,
            end_line_no: self.end_line_no,
            end_line_pos: self.end_line_pos,
            start_file_pos: self.start_file_pos,
            end_file_pos: self.end_file_pos,
            warning: self.warning,
            fixes: self.fixes.iter().map(FixRecord::from_fix).collect(),
        }
    }
}

fn stage_name(kind: ViolationKind) -> &'static str {
    match kind {
        ViolationKind::Lint => "lint",
        ViolationKind::Parse => "parsing",
        ViolationKind::Lex => "lexing",
        ViolationKind::Template => "templating",
        ViolationKind::Noqa => "noqa",
        ViolationKind::Critical => "critical",
    }
}

/// Serialisable form of a [`Violation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViolationRecord {
    pub code: String,
    pub name: String,
    pub description: String,
    pub line_no: usize,
    pub line_pos: usize,
    pub end_line_no: usize,
    pub end_line_pos: usize,
    pub start_file_pos: usize,
    pub end_file_pos: usize,
    pub warning: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<FixRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixRecord {
    #[serde(rename = "type")]
    pub edit_type: EditType,
    pub start_file_pos: usize,
    pub end_file_pos: usize,
    pub edit: String,
}

impl FixRecord {
    fn from_fix(fix: &LintFix) -> Self {
        let source = fix.anchor.marker().source_slice();
        let (start, end) = match fix.edit_type {
            EditType::CreateBefore => (source.start, source.start),
            EditType::CreateAfter => (source.end, source.end),
            EditType::Delete | EditType::Replace => (source.start, source.end),
        };
        Self {
            edit_type: fix.edit_type,
            start_file_pos: start,
            end_file_pos: end,
            edit: fix.edit.iter().map(Segment::raw).collect(),
        }
    }
}
