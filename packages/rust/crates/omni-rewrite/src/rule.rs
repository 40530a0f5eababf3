//! Rewrite rules and rule files.
//!
//! A rule pairs one or more ast-grep patterns (alternatives, any of which may
//! match) with a rewrite template. Rules live in TOML files:
//!
//! ```toml
//! [[rule]]
//! name = "python/len-zero"
//! language = "python"
//! patterns = ["len($X) == 0", "0 == len($X)"]
//! rewrite = "not $X"
//! description = "Use the falsiness of empty containers"
//! ```
//!
//! A single `pattern = "..."` is accepted as a shorthand for `patterns`.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use ast_grep_core::Pattern;
use ast_grep_language::SupportLang;
use regex::Regex;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{Result, RewriteError};

/// Canonical lowercase name of a language, used as the per-language key.
#[must_use]
pub fn language_key(lang: SupportLang) -> String {
    format!("{lang:?}").to_lowercase()
}

/// Resolve a language name such as `"python"` or `"rs"`.
///
/// # Errors
///
/// Returns [`RewriteError::UnsupportedLanguage`] for names ast-grep does not know.
pub fn parse_language(language: &str) -> Result<SupportLang> {
    SupportLang::from_str(language)
        .map_err(|_| RewriteError::UnsupportedLanguage(language.to_string()))
}

/// One compiled pattern together with its source text.
#[derive(Clone)]
pub struct RulePattern {
    source: String,
    pattern: Pattern,
}

impl RulePattern {
    /// Pattern text as written in the rule.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled ast-grep pattern.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

/// A named structural rewrite for one language.
#[derive(Clone)]
pub struct RewriteRule {
    name: String,
    language: SupportLang,
    patterns: Vec<RulePattern>,
    rewrite: String,
    description: Option<String>,
}

impl fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRule")
            .field("name", &self.name)
            .field("language", &self.language)
            .field(
                "patterns",
                &self.patterns.iter().map(RulePattern::source).collect::<Vec<_>>(),
            )
            .field("rewrite", &self.rewrite)
            .finish_non_exhaustive()
    }
}

impl RewriteRule {
    /// Compile a rule.
    ///
    /// # Errors
    ///
    /// Fails when the language is unknown, no pattern is given, or a pattern
    /// does not parse.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        language: &str,
        patterns: impl IntoIterator<Item = S>,
        rewrite: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let language = parse_language(language)?;

        let patterns = patterns
            .into_iter()
            .map(|source| {
                let source = source.into();
                Pattern::try_new(&source, language)
                    .map(|pattern| RulePattern { source, pattern })
                    .map_err(|e| RewriteError::Pattern {
                        rule: name.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        if patterns.is_empty() {
            return Err(RewriteError::InvalidRule {
                rule: name,
                message: "no pattern given".to_string(),
            });
        }

        Ok(Self {
            name,
            language,
            patterns,
            rewrite: rewrite.into(),
            description: None,
        })
    }

    /// Attach a human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Unique rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Language the patterns are written in.
    #[must_use]
    pub fn language(&self) -> SupportLang {
        self.language
    }

    /// Compiled patterns, any of which may match.
    #[must_use]
    pub fn patterns(&self) -> &[RulePattern] {
        &self.patterns
    }

    /// Pattern texts as written in the rule.
    pub fn pattern_sources(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(RulePattern::source)
    }

    /// Rewrite template with `$NAME` / `$$$NAME` captures.
    #[must_use]
    pub fn rewrite(&self) -> &str {
        &self.rewrite
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// TOML structure of a rule file.
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleEntry>,
}

/// Single `[[rule]]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    name: String,
    language: String,
    pattern: Option<String>,
    #[serde(default)]
    patterns: Vec<String>,
    rewrite: String,
    description: Option<String>,
}

impl RuleEntry {
    fn compile(self) -> Result<RewriteRule> {
        let patterns = self.pattern.into_iter().chain(self.patterns);
        let rule = RewriteRule::new(self.name, &self.language, patterns, self.rewrite)?;
        Ok(match self.description {
            Some(description) => rule.with_description(description),
            None => rule,
        })
    }
}

/// An ordered collection of rules with unique names.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rules from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on invalid TOML, invalid rules or duplicate names.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::parse(text, "<inline>")
    }

    /// Load rules from a TOML file, or from every `*.toml` file below a
    /// directory (visited in file-name order).
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, invalid files, invalid rules or duplicate names.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut set = Self::new();

        if path.is_file() {
            set.extend(Self::load_file(path)?)?;
        } else {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|e| RewriteError::Io(e.into()))?;
                let file = entry.path();
                if file.is_file() && file.extension().is_some_and(|ext| ext == "toml") {
                    set.extend(Self::load_file(file)?)?;
                }
            }
        }

        log::debug!("Loaded {} rewrite rules from {:?}", set.len(), path);
        Ok(set)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(text: &str, origin: &str) -> Result<Self> {
        let file: RuleFile = toml::from_str(text).map_err(|source| RewriteError::RuleFile {
            path: origin.to_string(),
            source,
        })?;

        let mut set = Self::new();
        for entry in file.rules {
            set.push(entry.compile()?)?;
        }
        Ok(set)
    }

    /// Add a rule.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::DuplicateRule`] if the name is taken.
    pub fn push(&mut self, rule: RewriteRule) -> Result<()> {
        if self.rules.iter().any(|r| r.name == rule.name) {
            return Err(RewriteError::DuplicateRule(rule.name));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Add every rule of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::DuplicateRule`] on the first name clash.
    pub fn extend(&mut self, other: RuleSet) -> Result<()> {
        let mut names: HashSet<String> = self.rules.iter().map(|r| r.name.clone()).collect();
        for rule in other.rules {
            if !names.insert(rule.name.clone()) {
                return Err(RewriteError::DuplicateRule(rule.name));
            }
            self.rules.push(rule);
        }
        Ok(())
    }

    /// Keep only the rules whose whole name matches the regex `pattern`.
    ///
    /// The pattern is anchored at both ends, so `a|ab` keeps a rule named
    /// `ab` even though `a` alone would match first.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Filter`] if `pattern` is not a valid regex.
    pub fn filter_by_name(self, pattern: &str) -> Result<Self> {
        let filter = Regex::new(&format!("^(?:{pattern})$"))?;
        let rules = self
            .rules
            .into_iter()
            .filter(|rule| filter.is_match(&rule.name))
            .collect();
        Ok(Self { rules })
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in load order.
    pub fn iter(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter()
    }

    /// Take the rules out of the set.
    #[must_use]
    pub fn into_rules(self) -> Vec<RewriteRule> {
        self.rules
    }
}
