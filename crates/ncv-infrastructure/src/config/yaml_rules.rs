//! YAML rule files
//!
//! A rules directory holds `*.yml` / `*.yaml` files, read recursively in
//! sorted path order. Each file is either a bare list of rules or a
//! document with optional `rules` and `classes` lists:
//!
//! ```yaml
//! classes:
//!   - name: Texture2D
//!     parent: Texture
//! rules:
//!   - id: texture
//!     target: Texture
//!     pattern: "{PREFIX:T_}{ALPHANUM}"
//! ```

use std::path::{Path, PathBuf};

use ncv_validate::RuleDefinition;
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ClassDeclaration;
use crate::constants::RULE_FILE_EXTENSIONS;
use crate::error::{Error, IoContext, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleFile {
    List(Vec<RuleDefinition>),
    Document(RuleDocument),
}

/// Unknown top-level keys are rejected so a misspelt `rules:` cannot load as empty
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDocument {
    #[serde(default)]
    classes: Vec<ClassDeclaration>,
    #[serde(default)]
    rules: Vec<RuleDefinition>,
}

/// Rules and classes gathered from a rules directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleFileSet {
    pub rules: Vec<RuleDefinition>,
    pub classes: Vec<ClassDeclaration>,
    /// Files read, in load order
    pub files: Vec<PathBuf>,
}

/// Loads rule definitions from YAML files
pub struct YamlRuleLoader;

impl YamlRuleLoader {
    /// Load every rule file under `dir`
    pub fn load_dir(dir: &Path) -> Result<RuleFileSet> {
        if !dir.is_dir() {
            return Err(Error::configuration(format!(
                "Rules directory not found: {}",
                dir.display()
            )));
        }

        let mut set = RuleFileSet::default();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io {
                message: format!("Failed to walk {}", dir.display()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() || !is_rule_file(entry.path()) {
                continue;
            }

            let (rules, classes) = Self::load_file(entry.path())?;
            debug!(
                file = %entry.path().display(),
                rules = rules.len(),
                classes = classes.len(),
                "Rule file loaded"
            );
            set.rules.extend(rules);
            set.classes.extend(classes);
            set.files.push(entry.into_path());
        }

        info!(
            dir = %dir.display(),
            files = set.files.len(),
            rules = set.rules.len(),
            "Rule files loaded"
        );
        Ok(set)
    }

    /// Parse one rule file; a blank, comment-only or null document holds no
    /// rules
    pub fn load_file(path: &Path) -> Result<(Vec<RuleDefinition>, Vec<ClassDeclaration>)> {
        let content = std::fs::read_to_string(path)
            .io_context(format!("Failed to read rule file {}", path.display()))?;
        Self::parse(&content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(
        content: &str,
    ) -> std::result::Result<(Vec<RuleDefinition>, Vec<ClassDeclaration>), serde_yaml::Error> {
        let blank = content.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#')
        });
        if blank {
            return Ok((Vec::new(), Vec::new()));
        }
        Ok(match serde_yaml::from_str::<Option<RuleFile>>(content)? {
            Some(RuleFile::List(rules)) => (rules, Vec::new()),
            Some(RuleFile::Document(RuleDocument { classes, rules })) => (rules, classes),
            None => (Vec::new(), Vec::new()),
        })
    }
}

fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            RULE_FILE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}
