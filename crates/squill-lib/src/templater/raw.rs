use squill_core::{TemplateError, TemplatedFile};

use super::Templater;

/// The identity templater: the source is the templated string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTemplater;

impl Templater for RawTemplater {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn process(&self, source: &str, fname: &str) -> Result<TemplatedFile, TemplateError> {
        Ok(TemplatedFile::from_string(source).with_fname(fname))
    }
}
