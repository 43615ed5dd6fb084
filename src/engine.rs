//! Core linter engine
//!
//! One pre-order walk per document: every unit is handed to each enabled rule
//! that targets its kind. Rule panics are contained per rule and per file, and
//! whole files run in parallel on a rayon pool.

use crate::catalog::Catalog;
use crate::config::ResolvedConfig;
use crate::diagnostic::{Diagnostic, Location, Severity, INTERNAL_RULE_ERROR};
use crate::plugin::{Document, Plugin};
use crate::plugins::css::CssPlugin;
use crate::plugins::html::HtmlPlugin;
use crate::reporter::{self, Summary};
use crate::rule::{Emitter, Rule, RuleContext, Unit};
use crate::span::{Position, Span};
use crate::suppress::Suppressions;
use log::{debug, warn};
use rayon::prelude::*;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Fatal per-file conditions
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("no plugin handles files like {}", path.display())]
    UnsupportedFile { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CheckError {
    pub fn path(&self) -> &Path {
        match self {
            CheckError::UnsupportedFile { path } | CheckError::Io { path, .. } => path,
        }
    }
}

/// A file that could not be checked at all
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: CheckError,
}

/// In-memory file handed to [`Engine::check_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    pub path: PathBuf,
    pub text: String,
}

impl SourceInput {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Per-rule timing statistics
#[derive(Debug, Clone, Default)]
pub struct RuleTiming {
    /// Rule ID
    pub rule_id: String,
    /// Total time spent on this rule
    pub total_time: Duration,
    /// Number of units the rule was evaluated on
    pub evaluation_count: usize,
    /// Number of diagnostics it produced
    pub match_count: usize,
}

impl RuleTiming {
    /// Create a new timing entry
    pub fn new(rule_id: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            ..Default::default()
        }
    }

    /// Average time per evaluation
    pub fn avg_time(&self) -> Duration {
        if self.evaluation_count > 0 {
            self.total_time / self.evaluation_count as u32
        } else {
            Duration::ZERO
        }
    }

    fn absorb(&mut self, other: &RuleTiming) {
        self.total_time += other.total_time;
        self.evaluation_count += other.evaluation_count;
        self.match_count += other.match_count;
    }
}

/// Result of checking a set of files
#[derive(Debug, Default)]
pub struct LintResult {
    /// All diagnostics, in report order
    pub diagnostics: Vec<Diagnostic>,

    /// Files that could not be checked
    pub failures: Vec<FileFailure>,

    /// Counts by file and severity
    pub summary: Summary,

    /// Processing duration
    pub duration: Duration,

    /// Per-rule timing statistics (rule_id -> timing)
    pub rule_timings: HashMap<String, RuleTiming>,
}

impl LintResult {
    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.summary.error_count > 0
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.summary.warning_count > 0
    }

    /// Check if result is clean (no diagnostics and no failures)
    pub fn is_clean(&self) -> bool {
        self.summary.is_clean()
    }

    /// Get exit code (0 = success, 1 = warnings, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        self.summary.exit_code()
    }

    /// Get rule timings sorted by total time (descending)
    pub fn sorted_timings(&self) -> Vec<&RuleTiming> {
        let mut timings: Vec<_> = self.rule_timings.values().collect();
        timings.sort_by(|a, b| {
            b.total_time
                .cmp(&a.total_time)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        timings
    }

    /// Format timing statistics as a string
    pub fn format_timings(&self) -> String {
        let timings = self.sorted_timings();
        if timings.is_empty() {
            return "No timing data available".to_string();
        }

        let mut output = String::new();
        output.push_str("Rule Timing Statistics:\n");
        output.push_str(&format!(
            "{:<32} {:>12} {:>12} {:>10} {:>10}\n",
            "Rule ID", "Total", "Avg", "Evals", "Matches"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for timing in timings {
            let total_ms = timing.total_time.as_secs_f64() * 1000.0;
            let avg_us = timing.avg_time().as_secs_f64() * 1_000_000.0;
            output.push_str(&format!(
                "{:<32} {:>10.2}ms {:>10.2}µs {:>10} {:>10}\n",
                timing.rule_id, total_ms, avg_us, timing.evaluation_count, timing.match_count
            ));
        }

        output
    }
}

/// Outcome of a single file that was checked
struct FileReport {
    diagnostics: Vec<Diagnostic>,
    timings: HashMap<String, RuleTiming>,
}

/// Mutable state of one document walk
struct Walk<'r> {
    diagnostics: Vec<Diagnostic>,
    timings: HashMap<String, RuleTiming>,
    /// Rules that panicked on this file and are skipped from then on
    faulted: HashSet<&'r str>,
}

/// The main linter engine
pub struct Engine {
    catalog: Arc<Catalog>,

    config: ResolvedConfig,

    /// Registered plugins (keyed by extension)
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl Engine {
    /// Create an engine with the built-in catalog and plugins
    pub fn new(config: ResolvedConfig) -> Self {
        Self::with_catalog(config, Catalog::shared())
    }

    /// Create an engine over a custom catalog, with the built-in plugins
    pub fn with_catalog(config: ResolvedConfig, catalog: Arc<Catalog>) -> Self {
        let mut engine = Self {
            catalog,
            config,
            plugins: HashMap::new(),
        };
        engine.register_plugin(Arc::new(HtmlPlugin::new()));
        engine.register_plugin(Arc::new(CssPlugin::new()));
        engine
    }

    /// Register a plugin, replacing any plugin that claimed the same extensions
    pub fn register_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        for ext in plugin.extensions() {
            debug!("registering plugin '{}' for .{}", plugin.id(), ext);
            self.plugins.insert(ext.to_ascii_lowercase(), Arc::clone(&plugin));
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Get plugin for a file
    fn plugin_for(&self, path: &Path) -> Result<Arc<dyn Plugin>, CheckError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.plugins.get(&ext.to_ascii_lowercase()))
            .cloned()
            .ok_or_else(|| CheckError::UnsupportedFile {
                path: path.to_path_buf(),
            })
    }

    /// Check one file's text; diagnostics come back in report order
    pub fn check_file(&self, path: &Path, text: &str) -> Result<Vec<Diagnostic>, CheckError> {
        let plugin = self.plugin_for(path)?;
        Ok(self.evaluate(plugin.as_ref(), path, text).diagnostics)
    }

    /// Check in-memory files, in parallel unless the config says otherwise
    pub fn check_files(&self, inputs: &[SourceInput]) -> LintResult {
        self.run(inputs, |input| {
            let outcome = self
                .plugin_for(&input.path)
                .map(|plugin| self.evaluate(plugin.as_ref(), &input.path, &input.text));
            (input.path.clone(), outcome)
        })
    }

    /// Read and check files from disk
    pub fn check_paths(&self, paths: &[PathBuf]) -> LintResult {
        self.run(paths, |path| (path.clone(), self.check_path(path)))
    }

    fn check_path(&self, path: &Path) -> Result<FileReport, CheckError> {
        let plugin = self.plugin_for(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| CheckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.evaluate(plugin.as_ref(), path, &text))
    }

    fn run<T, F>(&self, items: &[T], check: F) -> LintResult
    where
        T: Sync,
        F: Fn(&T) -> (PathBuf, Result<FileReport, CheckError>) + Sync + Send,
    {
        let start = Instant::now();

        let outcomes: Vec<_> = match self.thread_pool(items.len()) {
            Some(pool) => pool.install(|| items.par_iter().map(&check).collect()),
            None => items.iter().map(&check).collect(),
        };

        let mut result = LintResult::default();
        let mut diagnostics = Vec::new();
        let mut processed = 0;
        for (path, outcome) in outcomes {
            match outcome {
                Ok(report) => {
                    processed += 1;
                    diagnostics.extend(report.diagnostics);
                    for (rule_id, timing) in &report.timings {
                        result
                            .rule_timings
                            .entry(rule_id.clone())
                            .or_insert_with(|| RuleTiming::new(rule_id))
                            .absorb(timing);
                    }
                }
                Err(error) => {
                    warn!("skipping {}: {}", path.display(), error);
                    result.failures.push(FileFailure { path, error });
                }
            }
        }

        result.diagnostics = reporter::report(diagnostics);
        result.summary = Summary::new(processed, &result.diagnostics, result.failures.len());
        result.duration = start.elapsed();
        result
    }

    /// Pool for a batch, `None` when the batch runs on the calling thread
    fn thread_pool(&self, batch: usize) -> Option<rayon::ThreadPool> {
        if !self.config.engine.parallel || batch < 2 {
            return None;
        }
        let threads = if self.config.engine.jobs > 0 {
            self.config.engine.jobs
        } else {
            num_cpus::get()
        };
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("falling back to sequential checking: {}", e);
                None
            }
        }
    }

    /// Parse and walk one document
    fn evaluate(&self, plugin: &dyn Plugin, path: &Path, text: &str) -> FileReport {
        debug!("checking {} with the {} plugin", path.display(), plugin.id());
        let parsed = plugin.parse(text, path);
        let document = parsed.as_ref();

        let rules: Vec<&Rule> = self
            .catalog
            .rules()
            .iter()
            .filter(|rule| self.config.is_rule_enabled(&rule.id))
            .collect();

        let mut walk = Walk {
            diagnostics: document
                .parse_issues()
                .iter()
                .map(|issue| Diagnostic::parse_error(path, issue.span, &issue.message))
                .collect(),
            timings: HashMap::new(),
            faulted: HashSet::new(),
        };

        let cx = RuleContext::new(path, document);
        self.visit(&rules, &cx, &Unit::Source, &mut walk);
        document.walk(&mut |unit: &Unit<'_>| self.visit(&rules, &cx, unit, &mut walk));

        let suppressions = Suppressions::from_document(document);
        let diagnostics = walk
            .diagnostics
            .into_iter()
            .filter(|diag| {
                let suppressed = suppressions.is_suppressed(&diag.rule_id, diag.line());
                if suppressed {
                    debug!(
                        "suppressed {} at {}:{}{}",
                        diag.rule_id,
                        path.display(),
                        diag.line(),
                        suppressions
                            .reason(&diag.rule_id, diag.line())
                            .map(|r| format!(" ({})", r))
                            .unwrap_or_default()
                    );
                }
                !suppressed
            })
            .map(|diag| self.decorate(diag, document))
            .collect();

        FileReport {
            diagnostics: reporter::report(diagnostics),
            timings: walk.timings,
        }
    }

    /// Run every applicable rule on one unit
    fn visit<'r>(
        &self,
        rules: &[&'r Rule],
        cx: &RuleContext<'_>,
        unit: &Unit<'_>,
        walk: &mut Walk<'r>,
    ) {
        let target = unit.target();
        for &rule in rules {
            if !rule.applies_to(target, cx.language()) || walk.faulted.contains(rule.id.as_str()) {
                continue;
            }

            let severity = self
                .config
                .get_severity_override(&rule.id)
                .unwrap_or(rule.severity);
            let mut out = Emitter::new(rule, cx.file(), severity);

            let start = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(cx, unit, &mut out)));
            let elapsed = start.elapsed();

            let timing = walk
                .timings
                .entry(rule.id.clone())
                .or_insert_with(|| RuleTiming::new(&rule.id));
            timing.total_time += elapsed;
            timing.evaluation_count += 1;

            match outcome {
                Ok(()) => {
                    let found = out.into_diagnostics();
                    timing.match_count += found.len();
                    walk.diagnostics.extend(found);
                }
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    warn!(
                        "rule '{}' failed on {}: {}",
                        rule.id,
                        cx.file().display(),
                        reason
                    );
                    walk.faulted.insert(rule.id.as_str());
                    let span = unit
                        .span()
                        .unwrap_or_else(|| Span::empty_at(Position::start()));
                    walk.diagnostics.push(
                        Diagnostic::new(
                            INTERNAL_RULE_ERROR,
                            Severity::Error,
                            &format!("rule '{}' failed while checking this file", rule.id),
                            Location::new(cx.file(), span),
                        )
                        .with_note(&reason),
                    );
                }
            }
        }
    }

    /// Attach the source line and the rule's description
    fn decorate(&self, mut diag: Diagnostic, document: &dyn Document) -> Diagnostic {
        if let Some(line) = document.source().line(diag.line()) {
            diag = diag.with_source_line(line);
        }
        if let Some(desc) = self
            .catalog
            .get(&diag.rule_id)
            .and_then(|rule| rule.description.as_deref())
        {
            diag = diag.with_help(desc);
        }
        diag
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}
