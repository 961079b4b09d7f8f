//! # Override ("fixit") descriptions
//!
//! Some files in circulation carry known-bad metadata: an axis attribute placed on
//! the wrong field, a link name that does not match the detector subtree, a missing
//! flight path. Rather than special-casing those files in the pipeline, a host can
//! attach a [`Fixit`] to the [`FileState`](crate::state::FileState). Every fix is a
//! plain `path → attribute → value` replacement.
//!
//! ## Document layout
//!
//! ```xml
//! <Fixit>
//!   <Common>
//!     <Fix path="/entry/data" attribute="axis1" value="time_of_flight"/>
//!   </Common>
//!   <Runs>
//!     <Run filename="SCD_001.nxs">
//!       <Fix path="/entry/bank1" attribute="link" value="bank1" expected="bank_1"/>
//!     </Run>
//!   </Runs>
//! </Fixit>
//! ```
//!
//! * `Common` fixes apply to every file.
//! * `Run` fixes apply to the file whose base name equals `filename`, and take
//!   precedence over the common ones.
//! * A fix with an `expected` value applies only when the value currently found in
//!   the file equals it.
//!
//! The attribute keys the pipeline consults are listed in
//! [`constants`](crate::constants) (`axis1`..`axis4`, `link`, `initial_path`).
use camino::Utf8Path;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest_errors::IngestError;

#[derive(Debug, Deserialize)]
struct FixitDocument {
    #[serde(rename = "Common", default)]
    common: Option<FixList>,

    #[serde(rename = "Runs", default)]
    runs: Option<RunList>,
}

#[derive(Debug, Default, Deserialize)]
struct FixList {
    #[serde(rename = "Fix", default)]
    fixes: Vec<FixRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct RunList {
    #[serde(rename = "Run", default)]
    runs: Vec<RunRecord>,
}

#[derive(Debug, Deserialize)]
struct RunRecord {
    #[serde(rename = "@filename")]
    filename: String,

    #[serde(rename = "Fix", default)]
    fixes: Vec<FixRecord>,
}

/// One `path → attribute → value` replacement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixRecord {
    #[serde(rename = "@path")]
    pub path: String,

    #[serde(rename = "@attribute")]
    pub attribute: String,

    #[serde(rename = "@value")]
    pub value: String,

    #[serde(rename = "@expected", default)]
    pub expected: Option<String>,
}

impl FixRecord {
    pub fn new(
        path: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        FixRecord {
            path: path.into(),
            attribute: attribute.into(),
            value: value.into(),
            expected: None,
        }
    }

    /// Restrict the fix to files whose current value equals `expected`.
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    fn matches(&self, path: &str, attribute: &str, current: Option<&str>) -> bool {
        normalize_path(&self.path) == normalize_path(path)
            && self.attribute.trim() == attribute
            && match &self.expected {
                None => true,
                Some(expected) => current.map(str::trim) == Some(expected.trim()),
            }
    }

    fn validate(&self) -> Result<(), IngestError> {
        if normalize_path(&self.path).is_empty() {
            return Err(IngestError::InvalidFixitEntry(format!(
                "fix for attribute '{}' has an empty path",
                self.attribute
            )));
        }
        if self.attribute.trim().is_empty() {
            return Err(IngestError::InvalidFixitEntry(format!(
                "fix for path '{}' has an empty attribute",
                self.path
            )));
        }
        Ok(())
    }
}

fn normalize_path(path: &str) -> &str {
    path.trim().trim_end_matches('/')
}

fn base_name(file_name: &str) -> &str {
    Utf8Path::new(file_name.trim())
        .file_name()
        .unwrap_or(file_name)
}

/// A parsed override description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixit {
    common: Vec<FixRecord>,
    runs: Vec<(String, Vec<FixRecord>)>,
}

impl Fixit {
    /// Parse an override description from its XML text.
    ///
    /// Return
    /// ------
    /// * The parsed description, [`IngestError::FixitParse`] for malformed XML, or
    ///   [`IngestError::InvalidFixitEntry`] for a fix with an empty path or attribute.
    pub fn from_xml_str(xml: &str) -> Result<Self, IngestError> {
        let document: FixitDocument = from_str(xml)?;

        let fixit = Fixit {
            common: document.common.unwrap_or_default().fixes,
            runs: document
                .runs
                .unwrap_or_default()
                .runs
                .into_iter()
                .map(|run| (run.filename, run.fixes))
                .collect(),
        };

        fixit
            .common
            .iter()
            .chain(fixit.runs.iter().flat_map(|(_, fixes)| fixes.iter()))
            .try_for_each(FixRecord::validate)?;

        Ok(fixit)
    }

    /// Read and parse an override description file.
    pub fn from_file(path: &Utf8Path) -> Result<Self, IngestError> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml_str(&xml)
    }

    pub fn with_common_fix(mut self, fix: FixRecord) -> Self {
        self.common.push(fix);
        self
    }

    pub fn with_run_fix(mut self, file_name: impl Into<String>, fix: FixRecord) -> Self {
        let file_name = file_name.into();
        match self.runs.iter_mut().find(|(name, _)| *name == file_name) {
            Some((_, fixes)) => fixes.push(fix),
            None => self.runs.push((file_name, vec![fix])),
        }
        self
    }

    /// Replacement value for `attribute` of the node at `path`.
    ///
    /// Arguments
    /// ---------
    /// * `file_name`: name of the file being interpreted, if known; enables the run-specific fixes
    /// * `path`: slash-separated node path, e.g. `"/entry/data"`
    /// * `attribute`: the fix key, e.g. `"axis1"`
    /// * `current`: the value currently found in the file, compared against `expected`
    ///
    /// Return
    /// ------
    /// * The replacement value of the first matching run fix, else of the first matching common fix
    pub fn lookup(
        &self,
        file_name: Option<&str>,
        path: &str,
        attribute: &str,
        current: Option<&str>,
    ) -> Option<&str> {
        let run_fixes = file_name
            .map(base_name)
            .into_iter()
            .flat_map(|file| {
                self.runs
                    .iter()
                    .filter(move |(name, _)| base_name(name) == file)
                    .flat_map(|(_, fixes)| fixes.iter())
            });

        run_fixes
            .chain(self.common.iter())
            .find(|fix| fix.matches(path, attribute, current))
            .map(|fix| fix.value.trim())
    }

    pub fn is_empty(&self) -> bool {
        self.common.is_empty() && self.runs.iter().all(|(_, fixes)| fixes.is_empty())
    }
}
