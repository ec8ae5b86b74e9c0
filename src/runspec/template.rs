//! Placeholder substitution for runspec strings.
//!
//! The supported set is fixed: `{ROOT}`, `{RESOLVE_BASE}` and `{INPUT}`. Placeholders are resolved
//! lazily, so a runspec that never mentions `{ROOT}` never needs a root to exist. Unknown `{...}`
//! tokens pass through untouched.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{HarnessError, HarnessResult};

/// Environment variables consulted for `{RESOLVE_BASE}`, in order.
pub const RESOLVE_BASE_VARS: &[&str] = &["RESOLVE_BASE", "EOD_BASE"];

/// Directory name that marks the `{ROOT}` ancestor when the runspec does not override it.
pub const DEFAULT_ROOT_MARKER: &str = "xplat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Root,
    ResolveBase,
    Input,
}

impl Placeholder {
    pub const ALL: [Placeholder; 3] = [Placeholder::Root, Placeholder::ResolveBase, Placeholder::Input];

    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Root => "{ROOT}",
            Placeholder::ResolveBase => "{RESOLVE_BASE}",
            Placeholder::Input => "{INPUT}",
        }
    }
}

/// Where each placeholder's value comes from. `None` means "no source": using the placeholder
/// is a configuration error, except `{INPUT}` which is left for the per-test pass.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub root: Option<PathBuf>,
    pub resolve_base: Option<PathBuf>,
    pub input: Option<PathBuf>,
}

impl TemplateContext {
    /// Context for the runspec-level pass: `{ROOT}` is searched upward from `start`,
    /// `{RESOLVE_BASE}` comes from the environment, `{INPUT}` is deferred.
    pub fn for_runspec(start: &Path, root_marker: &str) -> Self {
        Self {
            root: find_root(start, root_marker),
            resolve_base: resolve_base_from_env(),
            input: None,
        }
    }

    /// Context for a single test case's arguments.
    pub fn for_input(input: impl Into<PathBuf>) -> Self {
        Self {
            input: Some(input.into()),
            ..Self::default()
        }
    }

    fn source(&self, placeholder: Placeholder) -> Option<&Path> {
        match placeholder {
            Placeholder::Root => self.root.as_deref(),
            Placeholder::ResolveBase => self.resolve_base.as_deref(),
            Placeholder::Input => self.input.as_deref(),
        }
    }

    /// Substitute every supported placeholder in `text` in a single left-to-right scan.
    ///
    /// Substituted values are never rescanned, so a value that itself contains a token stays as is.
    pub fn render(&self, text: &str) -> HarnessResult<String> {
        let mut rendered = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(pos) = rest.find('{') {
            rendered.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            let Some(placeholder) = Placeholder::ALL.into_iter().find(|p| tail.starts_with(p.token())) else {
                rendered.push('{');
                rest = &tail[1..];
                continue;
            };

            match self.source(placeholder) {
                Some(value) => rendered.push_str(&value.to_string_lossy()),
                None if placeholder == Placeholder::Input => rendered.push_str(placeholder.token()),
                None => {
                    return Err(HarnessError::Configuration(format!(
                        "'{}' uses {} but no value is available for it",
                        text,
                        placeholder.token()
                    )));
                }
            }
            rest = &tail[placeholder.token().len()..];
        }

        rendered.push_str(rest);
        Ok(rendered)
    }

    /// Apply [`TemplateContext::render`] to every string inside a JSON document.
    pub fn render_value(&self, value: &mut Value) -> HarnessResult<()> {
        match value {
            Value::String(text) => {
                *text = self.render(text)?;
            }
            Value::Array(items) => {
                for item in items {
                    self.render_value(item)?;
                }
            }
            Value::Object(map) => {
                for item in map.values_mut() {
                    self.render_value(item)?;
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
        Ok(())
    }
}

/// Walk upward from `start` to the nearest directory named `marker` (including `start` itself).
pub fn find_root(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.file_name().is_some_and(|name| name == marker))
        .map(Path::to_path_buf)
}

fn resolve_base_from_env() -> Option<PathBuf> {
    resolve_base_with(|var| env::var_os(var))
}

/// First non-empty value among [`RESOLVE_BASE_VARS`], looked up through `lookup`.
pub fn resolve_base_with(lookup: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    RESOLVE_BASE_VARS
        .iter()
        .find_map(|var| lookup(var).filter(|v| !v.is_empty()))
        .map(PathBuf::from)
}
