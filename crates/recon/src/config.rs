use std::collections::HashSet;

use serde::Deserialize;

use crate::authority::DirectoryColumns;
use crate::compose::ComposeOptions;
use crate::error::ReconError;
use crate::record::Identifier;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CensusConfig {
    pub name: String,
    #[serde(default)]
    pub merge: MergePolicy,
    #[serde(default)]
    pub report_url: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub identifier: Identifier,
    #[serde(default)]
    pub directory: DirectoryColumns,
    pub sources: Vec<SourceConfig>,
}

/// How reference sources are folded into the combined view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Later sources overwrite earlier ones field by field.
    #[default]
    Overlay,
    /// First source is primary; later sources only fill missing columns.
    FillMissing,
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overlay => write!(f, "overlay"),
            Self::FillMissing => write!(f, "fill_missing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub role: SourceRole,
    pub file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    /// Folded into the combined view.
    Reference,
    /// The week's census compared against the combined view.
    Current,
    /// Roster used to resolve managers.
    Directory,
}

impl std::fmt::Display for SourceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Current => write!(f, "current"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

impl CensusConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: CensusConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        if self.identifier.column.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "identifier.column must not be empty".into(),
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            if source.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{}': file must not be empty",
                    source.name
                )));
            }
        }

        let count = |role: SourceRole| self.sources.iter().filter(|s| s.role == role).count();

        if count(SourceRole::Reference) == 0 {
            return Err(ReconError::ConfigValidation(
                "at least 1 reference source is required".into(),
            ));
        }

        let current = count(SourceRole::Current);
        if current != 1 {
            return Err(ReconError::ConfigValidation(format!(
                "exactly 1 current source is required, found {current}"
            )));
        }

        if count(SourceRole::Directory) > 1 {
            return Err(ReconError::ConfigValidation(
                "at most 1 directory source is allowed".into(),
            ));
        }

        Ok(())
    }

    pub fn sources_with_role(&self, role: SourceRole) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(move |s| s.role == role)
    }

    pub fn compose_options(&self) -> ComposeOptions {
        let mut options = ComposeOptions {
            report_url: self.report_url.clone(),
            ..ComposeOptions::default()
        };
        if let Some(ref signature) = self.signature {
            options.signature = signature.clone();
        }
        options
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
