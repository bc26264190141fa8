//! Diagnostic records, hints, trace frames, and the process-wide error
//! counter with its consumer/hint hooks (spec §4.2, §6, §7).

use crate::diag::loc::Loc;

/// Diagnostic severity (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Note,
    Warning,
    Error,
    Fatal,
}

/// A hint attached to a diagnostic: a location, optional text, and a
/// priority used to order hints that share a `(file, line)` (spec §4.2).
#[derive(Debug, Clone)]
pub struct Hint {
    pub loc: Loc,
    pub text: Option<String>,
    pub priority: i32,
}

impl Hint {
    pub fn new(loc: Loc) -> Self {
        Self {
            loc,
            text: None,
            priority: 0,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// A trace frame: a location plus a one-line description of how
/// rewriting got there (spec §4.2), e.g. "inside generic instantiation of
/// X".
#[derive(Debug, Clone)]
pub struct TraceFrame {
    pub loc: Loc,
    pub text: String,
}

/// A fully-populated diagnostic record (spec §4.2, §6 "Diagnostic consumer
/// hook").
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub primary_loc: Loc,
    pub message: String,
    pub hints: Vec<Hint>,
    pub trace: Vec<TraceFrame>,
}

impl Diagnostic {
    pub fn new(level: Level, primary_loc: Loc, message: impl Into<String>) -> Self {
        Self {
            level,
            primary_loc,
            message: message.into(),
            hints: Vec::new(),
            trace: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn with_trace(mut self, frame: TraceFrame) -> Self {
        self.trace.push(frame);
        self
    }

    /// Drop any trace frame that merely repeats the primary location
    /// (spec §4.2: "a single trace frame that merely repeats the primary
    /// location is suppressed").
    pub fn suppress_redundant_trace(&mut self) {
        self.trace.retain(|f| f.loc != self.primary_loc);
    }

    /// Sort hints by `(file, line, priority)` for fancy rendering
    /// (spec §4.2).
    pub fn sort_hints(&mut self) {
        self.hints.sort_by(|a, b| {
            (a.loc.file_ref, a.loc.first_line, a.priority).cmp(&(
                b.loc.file_ref,
                b.loc.first_line,
                b.priority,
            ))
        });
    }
}

/// Hook invoked at diagnostic construction time to add context-dependent
/// hints (spec §6 "Hint hook"), e.g. "this error arose inside generic
/// instantiation of X".
pub type HintHook = Box<dyn Fn(&mut Diagnostic) + Send + Sync>;

/// Hook the host installs to receive fully-populated diagnostics instead
/// of rendered text (spec §6 "Diagnostic consumer hook").
pub type ConsumerHook = Box<dyn FnMut(&Diagnostic) + Send>;

/// Process-wide diagnostic state: the error counter, the abort threshold,
/// and the two hooks (spec §4.2, §5, §7, §9 "Global error counter and
/// consumer hook").
///
/// Modeled as an explicit value the caller owns and threads through a
/// compilation run — not a literal global — for the same reason
/// [`crate::ast::arena::Arena`] is: spec §5 says this state is
/// process-wide only in the sense that one compilation thread owns it,
/// not that Rust `static` mutable state is required to express that.
pub struct Diagnostics {
    count: u32,
    /// Counts notes/warnings toward the limit too, matching `unit_test`
    /// (spec §4.2).
    count_all_levels: bool,
    error_limit: u32,
    hint_hook: Option<HintHook>,
    consumer_hook: Option<ConsumerHook>,
    log: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(error_limit: u32, count_all_levels: bool) -> Self {
        Self {
            count: 0,
            count_all_levels,
            error_limit,
            hint_hook: None,
            consumer_hook: None,
            log: Vec::new(),
        }
    }

    pub fn set_hint_hook(&mut self, hook: HintHook) {
        self.hint_hook = Some(hook);
    }

    pub fn set_consumer(&mut self, hook: ConsumerHook) {
        self.consumer_hook = Some(hook);
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.log.clear();
    }

    pub fn error_count(&self) -> u32 {
        self.count
    }

    /// Emit a diagnostic: run the hint hook, normalise hints/trace, hand
    /// it to the consumer if one is installed (else buffer it), and bump
    /// the error counter. Returns `Err` once the counter reaches
    /// `error_limit` — the driver propagates that as an abort (spec §4.2,
    /// §7).
    pub fn emit(&mut self, mut diag: Diagnostic) -> crate::error::Result<()> {
        if let Some(hook) = &self.hint_hook {
            hook(&mut diag);
        }
        diag.suppress_redundant_trace();
        diag.sort_hints();

        let line = diag.primary_loc.first_line;
        match diag.level {
            Level::Note => tracing::debug!(line, "{}", diag.message),
            Level::Warning => tracing::warn!(line, "{}", diag.message),
            Level::Error | Level::Fatal => tracing::error!(line, "{}", diag.message),
        }

        let counts = self.count_all_levels || matches!(diag.level, Level::Error | Level::Fatal);
        if counts {
            self.count += 1;
        }

        if let Some(consumer) = &mut self.consumer_hook {
            consumer(&diag);
        } else {
            self.log.push(diag);
        }

        if self.count >= self.error_limit {
            return Err(crate::error::SimpError::ErrorLimitReached {
                limit: self.error_limit,
            });
        }
        Ok(())
    }

    /// Buffered diagnostics, when no consumer hook was installed — used
    /// by tests and by [`crate::diag::render`].
    pub fn buffered(&self) -> &[Diagnostic] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::loc::Loc;

    #[test]
    fn error_counter_trips_limit() {
        let mut diags = Diagnostics::new(2, false);
        diags
            .emit(Diagnostic::new(Level::Error, Loc::unknown(), "one"))
            .unwrap();
        let result = diags.emit(Diagnostic::new(Level::Error, Loc::unknown(), "two"));
        assert!(result.is_err());
    }

    #[test]
    fn unit_test_flag_counts_notes() {
        let mut diags = Diagnostics::new(1, true);
        let result = diags.emit(Diagnostic::new(Level::Note, Loc::unknown(), "note"));
        assert!(result.is_err());
    }

    #[test]
    fn redundant_trace_is_suppressed() {
        let loc = Loc::unknown();
        let mut diag = Diagnostic::new(Level::Error, loc, "boom")
            .with_trace(TraceFrame {
                loc,
                text: "here".into(),
            })
            .with_trace(TraceFrame {
                loc: Loc {
                    first_line: 99,
                    ..loc
                },
                text: "elsewhere".into(),
            });
        diag.suppress_redundant_trace();
        assert_eq!(diag.trace.len(), 1);
    }

    #[test]
    fn hints_sort_by_file_then_line_then_priority() {
        let mut diag = Diagnostic::new(Level::Warning, Loc::unknown(), "msg");
        diag.hints.push(
            Hint::new(Loc {
                first_line: 10,
                ..Loc::unknown()
            })
            .with_priority(5),
        );
        diag.hints.push(
            Hint::new(Loc {
                first_line: 2,
                ..Loc::unknown()
            })
            .with_priority(1),
        );
        diag.sort_hints();
        assert_eq!(diag.hints[0].loc.first_line, 2);
    }
}
