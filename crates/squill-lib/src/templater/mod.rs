//! Templaters: turn a source string into a [`TemplatedFile`].
//!
//! The parser only ever sees the templated string. The slice maps built here
//! are what let fixes find their way back into the source.

mod placeholder;
mod raw;

#[cfg(test)]
mod tests;

use indexmap::IndexMap;
use squill_core::{TemplateError, TemplatedFile};

use crate::linter::LinterConfig;
use crate::{Result, UserError};

pub use placeholder::{PlaceholderStyle, PlaceholderTemplater};
pub use raw::RawTemplater;

/// Renders one source file.
pub trait Templater: Send + Sync {
    fn name(&self) -> &'static str;

    fn process(&self, source: &str, fname: &str) -> std::result::Result<TemplatedFile, TemplateError>;
}

/// Names accepted by [`templater_selector`].
pub const TEMPLATER_NAMES: &[&str] = &["raw", "placeholder"];

/// Build the templater named in `config`.
pub fn templater_selector(config: &LinterConfig) -> Result<Box<dyn Templater>> {
    match config.templater.as_str() {
        "raw" => Ok(Box::new(RawTemplater)),
        "placeholder" => {
            let style_name = config.placeholder_style.as_deref().ok_or_else(|| {
                UserError::InvalidConfig {
                    key: "placeholder_style".to_string(),
                    reason: "required by the placeholder templater".to_string(),
                }
            })?;
            let style = PlaceholderStyle::from_name(style_name).ok_or_else(|| {
                UserError::InvalidConfig {
                    key: "placeholder_style".to_string(),
                    reason: format!(
                        "unknown style `{style_name}`, expected one of: {}",
                        PlaceholderStyle::NAMES.join(", ")
                    ),
                }
            })?;
            Ok(Box::new(PlaceholderTemplater::new(
                style,
                context_with_defaults(&config.template_context),
            )?))
        }
        other => Err(UserError::UnknownTemplater(other.to_string()).into()),
    }
}

fn context_with_defaults(context: &IndexMap<String, String>) -> IndexMap<String, String> {
    let mut live = IndexMap::new();
    live.insert("test_value".to_string(), "__test__".to_string());
    live.extend(context.iter().map(|(k, v)| (k.clone(), v.clone())));
    live
}
