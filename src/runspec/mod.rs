//! Runspec loading
//!
//! A runspec is a JSON document with a `general` block (where the tool lives, where inputs and
//! outputs go) and a list of `tests`. Loading runs the placeholder pass over the raw JSON first
//! and then deserializes into typed structs.

pub mod template;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{HarnessError, HarnessResult};
use template::{DEFAULT_ROOT_MARKER, TemplateContext};

/// A parsed runspec document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runspec {
    pub general: GeneralConfig,
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

/// The `general` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory searched for the executable (and its packages).
    #[serde(alias = "tool_path")]
    pub base_path: String,
    pub input_folder: String,
    pub output_folder: String,
    /// File name of the executable under test.
    pub tool_name: String,
    /// License file that test cases may detach to simulate unauthorized runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_key: Option<String>,
    /// Delete generated outputs after each test case.
    #[serde(default)]
    pub cleanup: bool,
    /// Directory name that identifies the `{ROOT}` ancestor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_marker: Option<String>,
    /// Traceability sync folder written into generated test scripts.
    #[serde(rename = "jama_Sync_folder", default, skip_serializing_if = "Option::is_none")]
    pub sync_folder: Option<String>,
}

/// One declarative test case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub inputs: OneOrMany,
    #[serde(default)]
    pub output: OneOrMany,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub expect_error: bool,
    #[serde(default = "default_true")]
    pub check_output_exist: bool,
    #[serde(default = "default_true")]
    pub create_output_dir: bool,
    #[serde(rename = "dettach_license", alias = "detach_license", default)]
    pub detach_license: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jama_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jama_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl TestCase {
    /// A case with the given name and runspec defaults for everything else.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            check_output_exist: true,
            create_output_dir: true,
            ..Self::default()
        }
    }

    /// Input entries, skipping empty strings.
    pub fn input_entries(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().filter(|s| !s.is_empty())
    }

    /// Output entries, skipping empty strings.
    pub fn output_entries(&self) -> impl Iterator<Item = &str> {
        self.output.iter().filter(|s| !s.is_empty())
    }
}

/// A JSON value that may be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let items: &[String] = match self {
            OneOrMany::One(item) => std::slice::from_ref(item),
            OneOrMany::Many(items) => items,
        };
        items.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(str::is_empty)
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(value: Vec<String>) -> Self {
        OneOrMany::Many(value)
    }
}

/// Read a runspec file into raw JSON.
pub fn read_runspec_file(path: &Path) -> HarnessResult<Value> {
    tracing::info!("Reading configuration file: {}", path.display());
    let text = fs::read_to_string(path)
        .map_err(|err| HarnessError::io(format!("reading runspec {}", path.display()), err))?;
    serde_json::from_str(&text).map_err(|err| {
        tracing::error!("Invalid JSON format in {}: {err}", path.display());
        HarnessError::Configuration(format!("Invalid JSON format: {err}"))
    })
}

/// Load, template and deserialize a runspec file.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_runspec(path: &Path) -> HarnessResult<Runspec> {
    if !path.is_file() {
        return Err(HarnessError::not_found("runspec file", path));
    }
    tracing::info!("Loading configuration from {}", path.display());

    let mut raw = read_runspec_file(path)?;
    let start = runspec_dir(path);
    let marker = raw
        .pointer("/general/root_marker")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ROOT_MARKER)
        .to_string();
    TemplateContext::for_runspec(&start, &marker).render_value(&mut raw)?;

    parse_runspec(raw)
}

/// Deserialize an already-templated runspec document.
pub fn parse_runspec(raw: Value) -> HarnessResult<Runspec> {
    serde_json::from_value(raw).map_err(|err| HarnessError::Configuration(format!("invalid runspec: {err}")))
}

/// Directory holding the runspec; a bare file name lives in the current directory.
fn runspec_dir(path: &Path) -> PathBuf {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}
