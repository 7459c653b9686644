//! Diagnostic rendering for operation results.
//!
//! Every outcome, success included, renders through one fixed template:
//!
//! ```text
//! [PSE Runtime] <summary>. Argument: <context>.
//! ```
//!
//! `context` is caller-supplied (usually a variable name or id) and defaults
//! to `none`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{PseResult, OK_CODE};

const PREFIX: &str = "[PSE Runtime]";
const SUCCESS: &str = "Operation successful";
const NO_CONTEXT: &str = "none";

/// One rendered outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Numeric code, `0` for success.
    pub code: i32,
    /// Fixed sentence for the code.
    pub summary: String,
    /// Caller-supplied context.
    pub context: String,
}

impl Diagnostic {
    /// True for the success diagnostic.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == OK_CODE
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{PREFIX} {}. Argument: {}.",
            self.summary, self.context
        )
    }
}

/// Renders results into diagnostics and log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    /// Numeric code of `result`; `0` for success.
    #[must_use]
    pub fn code<T>(result: &PseResult<T>) -> i32 {
        result.as_ref().map_or_else(|e| e.code(), |_| OK_CODE)
    }

    /// Builds the diagnostic for `result`.
    #[must_use]
    pub fn diagnose<T>(result: &PseResult<T>, context: Option<&str>) -> Diagnostic {
        let summary = match result {
            Ok(_) => SUCCESS,
            Err(e) => e.summary(),
        };
        Diagnostic {
            code: Self::code(result),
            summary: summary.to_string(),
            context: context.unwrap_or(NO_CONTEXT).to_string(),
        }
    }

    /// Renders `result` with the fixed template, newline included.
    #[must_use]
    pub fn render<T>(result: &PseResult<T>, context: Option<&str>) -> String {
        Self::diagnose(result, context).to_string()
    }

    /// Emits the diagnostic as a tracing event: success at trace, failure at
    /// warn with the full error attached.
    pub fn log<T>(result: &PseResult<T>, context: Option<&str>) {
        let diagnostic = Self::diagnose(result, context);
        match result {
            Ok(_) => trace!(code = diagnostic.code, "{}", diagnostic.to_string().trim_end()),
            Err(e) => warn!(
                code = diagnostic.code,
                error = %e,
                "{}",
                diagnostic.to_string().trim_end()
            ),
        }
    }
}
