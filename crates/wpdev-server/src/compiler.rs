//! Compiler collaborator contract.
//!
//! The module bundler is an external engine; the orchestrator only taps
//! two lifecycle events on it: `invalid` (a compile started) and `done`
//! (a compile finished, successfully or not). The payload of `done`
//! carries the diagnostics the orchestrator turns into formatted
//! error/warning messages.

use serde::{Deserialize, Serialize};

/// Hook fired when a compile starts.
pub type InvalidHook = Box<dyn FnMut() + Send>;

/// Hook fired when a compile finishes.
pub type DoneHook = Box<dyn FnMut(&BuildStats) + Send>;

/// External module-bundling engine, single or multi-target.
///
/// Implementations run their own event loop; hooks registered here are
/// invoked from it. Both hooks exist on single and multi-target
/// compilers alike.
pub trait Compiler: Send {
    /// Register a hook for the "compile started" event.
    fn on_invalid(&mut self, hook: InvalidHook);

    /// Register a hook for the "compile finished" event.
    fn on_done(&mut self, hook: DoneHook);
}

/// Outcome of one compile, as reported by the `done` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Compilation hash, when the compiler produces one.
    pub hash: Option<String>,

    /// Wall-clock build duration.
    pub duration_ms: u64,

    /// Raw error diagnostics.
    pub errors: Vec<String>,

    /// Raw warning diagnostics.
    pub warnings: Vec<String>,
}

impl BuildStats {
    /// Formatted error/warning messages for callback delivery.
    ///
    /// Blank diagnostics are dropped and the rest trimmed, so "has any
    /// messages" checks downstream are meaningful.
    pub fn messages(&self) -> BuildMessages {
        BuildMessages {
            errors: format_diagnostics(&self.errors),
            warnings: format_diagnostics(&self.warnings),
        }
    }
}

/// Formatted diagnostics extracted from a build result.
///
/// A build with errors or warnings is a normal outcome, reported through
/// the `on_error`/`on_warn` callbacks rather than as a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMessages {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl BuildMessages {
    /// True when there are neither errors nor warnings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

fn format_diagnostics(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .collect()
}

/// Compiler configuration payload, resolved once at construction.
///
/// A project with one entry point produces a single-target compiler; more
/// entries produce a multi-target one. The payload itself is opaque to the
/// orchestrator and handed to the toolchain as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerTargets {
    Single(serde_json::Value),
    Multi(Vec<serde_json::Value>),
}

impl CompilerTargets {
    /// Build from a non-empty list of target configurations.
    ///
    /// An empty list still yields `Multi(vec![])`; configuration
    /// validation upstream guarantees at least one entry in practice.
    pub fn from_targets(mut targets: Vec<serde_json::Value>) -> Self {
        if targets.len() == 1 {
            CompilerTargets::Single(targets.remove(0))
        } else {
            CompilerTargets::Multi(targets)
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, CompilerTargets::Multi(_))
    }

    pub fn len(&self) -> usize {
        match self {
            CompilerTargets::Single(_) => 1,
            CompilerTargets::Multi(targets) => targets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
