//! Rewrite engine: candidate selection, matching, conflict resolution and
//! application for one unit at a time.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use ast_grep_core::Language as _;
use ast_grep_core::matcher::MatcherExt;
use ast_grep_language::{LanguageExt, SupportLang};
use omni_rules::{ExhaustiveSelector, Replacement, RuleIndex, RuleSelector, partition_conflicts};

use crate::apply::apply_replacements;
use crate::capture::substitute_captures;
use crate::diff::generate_unified_diff;
use crate::error::{Result, RewriteError};
use crate::identifiers::{rule_alternatives, source_identifiers};
use crate::rule::{RewriteRule, RuleSet, language_key, parse_language};
use crate::types::{EditLocation, EngineConfig, RewriteResult, RuleMatch, SelectionStrategy};

type Selector = Box<dyn RuleSelector<RewriteRule> + Send + Sync>;

/// Applies a rule library to source units.
///
/// Holds one immutable selector per language, so a single engine can be
/// shared across threads.
///
/// # Example
///
/// ```rust,ignore
/// use omni_rewrite::{EngineConfig, RewriteEngine, RuleSet, SupportLang};
///
/// let rules = RuleSet::load("rules/")?;
/// let engine = RewriteEngine::new(rules, EngineConfig::default())?;
/// let result = engine.rewrite("if len(items) == 0: pass", SupportLang::Python)?;
/// println!("{}", result.summary(None));
/// ```
pub struct RewriteEngine {
    config: EngineConfig,
    selectors: HashMap<String, Selector>,
    rule_count: usize,
}

impl std::fmt::Debug for RewriteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut languages: Vec<&String> = self.selectors.keys().collect();
        languages.sort();
        f.debug_struct("RewriteEngine")
            .field("config", &self.config)
            .field("languages", &languages)
            .field("rule_count", &self.rule_count)
            .finish()
    }
}

impl RewriteEngine {
    /// Build the per-language selectors for `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Filter`] if `config.rule_filter` is not a
    /// valid regex.
    pub fn new(rules: RuleSet, config: EngineConfig) -> Result<Self> {
        let rules = match config.rule_filter.as_deref() {
            Some(filter) => {
                let before = rules.len();
                let kept = rules.filter_by_name(filter)?;
                log::info!(
                    "Rule filter '{filter}' kept {} of {before} rules",
                    kept.len()
                );
                kept
            }
            None => rules,
        };

        let mut by_language: HashMap<String, Vec<RewriteRule>> = HashMap::new();
        for rule in rules.into_rules() {
            by_language
                .entry(language_key(rule.language()))
                .or_default()
                .push(rule);
        }

        let mut rule_count = 0;
        let mut selectors: HashMap<String, Selector> = HashMap::with_capacity(by_language.len());
        for (language, rules) in by_language {
            rule_count += rules.len();
            let selector: Selector = match config.selection {
                SelectionStrategy::Indexed => {
                    let index = RuleIndex::build_with(rules, rule_alternatives);
                    if log::log_enabled!(log::Level::Debug) {
                        log::debug!("Indexed {language} rules: {:?}", index.stats());
                    }
                    Box::new(index)
                }
                SelectionStrategy::Exhaustive => Box::new(ExhaustiveSelector::build(
                    rules.into_iter().map(|rule| {
                        let alternatives = rule_alternatives(&rule);
                        (rule, alternatives)
                    }),
                )),
            };
            selectors.insert(language, selector);
        }

        log::info!(
            "Rewrite engine ready: {rule_count} rules across {} languages ({:?} selection)",
            selectors.len(),
            config.selection
        );

        Ok(Self {
            config,
            selectors,
            rule_count,
        })
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Total number of loaded rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    /// Whether any rule targets `lang`.
    #[must_use]
    pub fn has_rules_for(&self, lang: SupportLang) -> bool {
        self.selectors.contains_key(&language_key(lang))
    }

    /// Rules that could apply to `content`, in load order.
    #[must_use]
    pub fn candidates(&self, content: &str, lang: SupportLang) -> Vec<&RewriteRule> {
        let Some(selector) = self.selectors.get(&language_key(lang)) else {
            return Vec::new();
        };

        let identifiers = source_identifiers(content);
        let sorted: Vec<&str> = identifiers.iter().map(String::as_str).collect();
        let handles = selector.handles();

        selector
            .select_sorted(&sorted)
            .into_iter()
            .filter_map(|id| handles.get(id.index()))
            .collect()
    }

    /// Every match of every candidate rule in `content`.
    ///
    /// The unit is parsed once. A node matched by several patterns of the
    /// same rule yields one match.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Rules`] if the matcher reports an inverted range.
    pub fn find_matches(&self, content: &str, lang: SupportLang) -> Result<Vec<RuleMatch>> {
        let candidates = self.candidates(content, lang);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let root = lang.ast_grep(content);
        let root_node = root.root();
        let mut matches = Vec::new();

        for rule in candidates {
            let before = matches.len();
            let mut seen: HashSet<(usize, usize)> = HashSet::new();

            for node in root_node.dfs() {
                let Some(m) = rule
                    .patterns()
                    .iter()
                    .find_map(|p| p.pattern().match_node(node.clone()))
                else {
                    continue;
                };

                let range = m.range();
                if !seen.insert((range.start, range.end)) {
                    continue;
                }

                let new_text = substitute_captures(rule.rewrite(), m.get_env(), content);
                let (line, column) = line_column(content, range.start);
                matches.push(RuleMatch {
                    rule: rule.name().to_string(),
                    line,
                    column,
                    original_text: m.text().to_string(),
                    replacement: Replacement::new(range, new_text)?,
                });
            }

            if matches.len() == before {
                log::debug!("Candidate rule '{}' did not match", rule.name());
            }
        }

        Ok(matches)
    }

    /// Rewrite one unit: select, match, resolve conflicts, apply and diff.
    ///
    /// # Errors
    ///
    /// Fails only when an accepted replacement cannot be applied.
    pub fn rewrite(&self, content: &str, lang: SupportLang) -> Result<RewriteResult> {
        self.rewrite_named(content, lang, "source")
    }

    fn rewrite_named(&self, content: &str, lang: SupportLang, path: &str) -> Result<RewriteResult> {
        let matches = self.find_matches(content, lang)?;
        if matches.is_empty() {
            return Ok(RewriteResult::unchanged(content));
        }

        let (accepted, rejected) = partition_conflicts(matches);
        if log::log_enabled!(log::Level::Debug) {
            for m in &rejected {
                log::debug!(
                    "Dropped overlapping match of '{}' at L{}:{}",
                    m.rule,
                    m.line,
                    m.column
                );
            }
        }

        let modified = apply_replacements(content, accepted.iter().map(|m| &m.replacement))?;

        let mut edits: Vec<EditLocation> = accepted.into_iter().map(EditLocation::from).collect();
        edits.sort_by_key(|e| (e.start, e.end));

        let diff = generate_unified_diff(content, &modified, path);

        Ok(RewriteResult {
            original: content.to_string(),
            modified,
            edits,
            rejected: rejected.len(),
            diff,
        })
    }

    /// Rewrite a file, writing the result back unless `dry_run` is set.
    ///
    /// The language is taken from `language` when given, otherwise detected
    /// from the file extension.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, files above `max_file_size`, unknown languages
    /// and unapplicable replacements.
    pub fn rewrite_file<P: AsRef<Path>>(
        &self,
        path: P,
        language: Option<&str>,
    ) -> Result<RewriteResult> {
        let path = path.as_ref();
        let lang = match language {
            Some(name) => parse_language(name)?,
            None => detect_language(path)?,
        };

        let size = fs::metadata(path)?.len();
        if size > self.config.max_file_size {
            return Err(RewriteError::FileTooLarge {
                path: path.display().to_string(),
                size,
                limit: self.config.max_file_size,
            });
        }

        let content = fs::read_to_string(path)?;
        let result = self.rewrite_named(&content, lang, &path.display().to_string())?;

        if !self.config.dry_run && !result.is_unchanged() {
            fs::write(path, &result.modified)?;
            log::debug!("Wrote {} edits to {}", result.count(), path.display());
        }

        Ok(result)
    }
}

/// Language of a file, from its extension.
pub(crate) fn detect_language(path: &Path) -> Result<SupportLang> {
    SupportLang::from_path(path).ok_or_else(|| {
        let ext = path
            .extension()
            .map_or_else(|| "unknown".to_string(), |e| e.to_string_lossy().to_string());
        RewriteError::UnsupportedLanguage(ext)
    })
}

/// 1-indexed line and byte column of `offset`.
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let last_newline = before.rfind('\n').map_or(0, |i| i + 1);
    (line, offset - last_newline + 1)
}
