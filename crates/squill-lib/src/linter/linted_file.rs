//! Results of linting: one [`LintedFile`] per input, aggregated in a
//! [`LintingResult`].

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use squill_core::TemplatedFile;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::segments::Segment;
use crate::{Error, Result};

use super::encoding::encode;
use super::patch::{FixPatch, apply_patches, generate_source_patches};
use super::violation::{Violation, ViolationKind, ViolationRecord};

/// Narrows [`LintedFile::get_violations`]. The default keeps everything.
#[derive(Debug, Clone, Default)]
pub struct ViolationFilter {
    /// Keep only these codes.
    pub rules: Option<Vec<String>>,
    /// Keep only these kinds.
    pub kinds: Option<Vec<ViolationKind>>,
    /// Drop warnings.
    pub filter_warning: bool,
    /// Keep only fixable (`Some(true)`) or unfixable (`Some(false)`) violations.
    pub fixable: Option<bool>,
}

impl ViolationFilter {
    pub fn matches(&self, violation: &Violation) -> bool {
        self.rules
            .as_ref()
            .is_none_or(|rules| rules.iter().any(|r| r == &violation.code))
            && self
                .kinds
                .as_ref()
                .is_none_or(|kinds| kinds.contains(&violation.kind))
            && !(self.filter_warning && violation.warning)
            && self.fixable.is_none_or(|f| f == violation.is_fixable())
    }
}

#[derive(Debug, Clone)]
pub struct LintedFile {
    pub path: String,
    /// Sorted by position.
    pub violations: Vec<Violation>,
    /// The fixed tree when fixing, else the parsed tree. `None` if the file
    /// could not be templated.
    pub tree: Option<Segment>,
    pub templated_file: Option<Arc<TemplatedFile>>,
    /// Non-violation messages: dropped fixes, loop limits, conflicts.
    pub warnings: Diagnostics,
    /// Encoding used to read the file, and to write it back.
    pub encoding: String,
}

impl LintedFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            violations: Vec::new(),
            tree: None,
            templated_file: None,
            warnings: Diagnostics::new(),
            encoding: "utf-8".to_string(),
        }
    }

    pub fn get_violations(&self, filter: &ViolationFilter) -> Vec<&Violation> {
        self.violations.iter().filter(|v| filter.matches(v)).collect()
    }

    /// Violations that are not warnings.
    pub fn num_violations(&self) -> usize {
        self.violations.iter().filter(|v| !v.warning).count()
    }

    pub fn is_clean(&self) -> bool {
        self.num_violations() == 0
    }

    pub fn has_parse_errors(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v.kind, ViolationKind::Parse | ViolationKind::Lex | ViolationKind::Template))
    }

    /// Patches turning the source into the text of the tree.
    pub fn patches(&self) -> Vec<FixPatch> {
        match (&self.tree, &self.templated_file) {
            (Some(tree), Some(file)) => generate_source_patches(tree, file).patches,
            _ => Vec::new(),
        }
    }

    /// The fixed source, and whether it could be produced.
    pub fn fix_string(&self) -> (String, bool) {
        let Some(file) = &self.templated_file else {
            return (String::new(), false);
        };
        if self.tree.is_none() {
            return (file.source_str().to_string(), false);
        }
        let patches = self.patches();
        tracing::debug!(path = %self.path, patches = patches.len(), "fixing");
        (apply_patches(file.source_str(), &patches), true)
    }

    /// Write the fixed source back to `path` if it differs. Returns whether
    /// the file was written.
    pub fn persist_tree(&self) -> Result<bool> {
        let (fixed, ok) = self.fix_string();
        let Some(file) = &self.templated_file else {
            return Ok(false);
        };
        if !ok || fixed == file.source_str() {
            return Ok(false);
        }
        let path = Path::new(&self.path);
        let bytes = encode(&fixed, &self.encoding).map_err(|e| Error::io(path, e))?;
        std::fs::write(path, bytes).map_err(|e| Error::io(path, e))?;
        tracing::info!(path = %self.path, "fixed file written");
        Ok(true)
    }

    /// Violations and warnings as diagnostics over the source.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut out = Diagnostics::new();
        for violation in &self.violations {
            let kind = if violation.warning {
                DiagnosticKind::UnusedNoqa
            } else {
                violation.kind.diagnostic_kind()
            };
            let range = violation.start_file_pos..violation.end_file_pos.max(violation.start_file_pos);
            let detail = if violation.warning {
                violation.description.trim_start_matches("Unused noqa: ").trim_matches('\'').to_string()
            } else {
                violation.message()
            };
            out.report(kind, range).message(detail).emit();
        }
        out.extend(self.warnings.clone());
        out
    }

    pub fn record(&self) -> FileRecord {
        FileRecord {
            filepath: self.path.clone(),
            violations: self.violations.iter().map(Violation::record).collect(),
        }
    }
}

/// Serialisable form of a [`LintedFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub filepath: String,
    pub violations: Vec<ViolationRecord>,
}

/// Totals over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LintingStats {
    pub files: usize,
    pub clean: usize,
    pub unclean: usize,
    pub violations: usize,
}

/// Every file of one run, in input order.
#[derive(Debug, Clone, Default)]
pub struct LintingResult {
    pub files: Vec<LintedFile>,
}

impl LintingResult {
    pub fn new(files: Vec<LintedFile>) -> Self {
        Self { files }
    }

    pub fn num_violations(&self) -> usize {
        self.files.iter().map(LintedFile::num_violations).sum()
    }

    pub fn stats(&self) -> LintingStats {
        let clean = self.files.iter().filter(|f| f.is_clean()).count();
        LintingStats {
            files: self.files.len(),
            clean,
            unclean: self.files.len() - clean,
            violations: self.num_violations(),
        }
    }

    pub fn records(&self) -> Vec<FileRecord> {
        self.files.iter().map(LintedFile::record).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.records())
            .map_err(|e| Error::Internal(format!("cannot serialise results: {e}")))
    }

    /// `0` when every file is clean, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.num_violations() == 0 { 0 } else { 1 }
    }
}
