//! Diagnostic rendering: the *classic* source-snippet style and the
//! *compact* one-liner (spec §4.2 "Rendering"), grounded on `diag.c`'s
//! `diag_femit`/`diag_emit_hints`/`diag_emit_trace`/`diag_compar`.
//!
//! No ANSI colour: the source only uses it cosmetically (`color_fprintf`
//! wrapping literal escape codes), and nothing in spec §4.2 makes colour
//! part of the contract.

use crate::config::MessageStyle;
use crate::diag::diagnostic::{Diagnostic, Level};
use crate::diag::loc::FileRegistry;
use std::fmt::Write as _;

const DEFAULT_TERMINAL_WIDTH: usize = 80;

fn level_word(level: Level) -> &'static str {
    match level {
        Level::Note => "note",
        Level::Warning => "warning",
        Level::Error => "error",
        Level::Fatal => "fatal",
    }
}

fn level_prefix(level: Level) -> &'static str {
    match level {
        Level::Note => "Note:",
        Level::Warning => "Warning:",
        Level::Error => "Error:",
        Level::Fatal => "Fatal:",
    }
}

/// Render `diag` per the configured style (spec §4.2). `files` is used to
/// resolve file names and, for the classic style, to load the primary
/// hint's source line for the gutter snippet.
pub fn render(diag: &Diagnostic, style: MessageStyle, files: &mut FileRegistry) -> String {
    match style {
        MessageStyle::Compact => render_compact(diag, files),
        MessageStyle::Classic => render_classic(diag, files),
    }
}

/// `file:line:col: kind: msg` (spec §4.2 "compact").
fn render_compact(diag: &Diagnostic, files: &mut FileRegistry) -> String {
    let mut out = String::new();
    if let Some(hint) = diag.hints.first() {
        if hint.loc.is_known() {
            let name = files.name(hint.loc.file_ref);
            let _ = write!(
                out,
                "{}:{}:{}: ",
                name,
                hint.loc.first_line,
                hint.loc.first_column + 1
            );
        }
    }
    let _ = writeln!(out, "{}: {}", level_word(diag.level), diag.message);
    out
}

/// One-line-per-location with an optional source gutter (spec §4.2
/// "classic").
fn render_classic(diag: &Diagnostic, files: &mut FileRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", level_prefix(diag.level), diag.message);

    if let Some(first) = diag.hints.first() {
        if first.loc.is_known() {
            let name = files.name(first.loc.file_ref).to_string();
            let _ = writeln!(out, " --> {}:{}", name, first.loc.first_line);
        }
    }

    render_hints(diag, files, &mut out);
    render_trace(diag, &mut out);
    out
}

fn render_hints(diag: &Diagnostic, files: &mut FileRegistry, out: &mut String) {
    if diag.hints.is_empty() {
        return;
    }

    let loc0 = diag.hints[0].loc;
    let same_file: Vec<_> = diag.hints.iter().filter(|h| h.loc.file_ref == loc0.file_ref).collect();
    let line_max = same_file.iter().map(|h| h.loc.first_line).max().unwrap_or(0);
    let fwidth = if loc0.is_known() {
        line_max.to_string().len().max(1)
    } else {
        1
    };

    let mut printed_primary = false;
    if loc0.is_known() {
        if let Some(line_text) = files.line(loc0.file_ref, loc0.first_line).map(str::to_string) {
            let _ = writeln!(out, "{:>w$} |", "", w = fwidth);
            let _ = writeln!(out, "{:>w$} | {}", loc0.first_line, line_text, w = fwidth);

            let hint = &diag.hints[0];
            let ncarets = if hint.loc.line_delta == 0 {
                hint.loc.column_delta as usize + 1
            } else {
                1
            };
            let caret_line = format!(
                "{:>w$} | {:>col$}{}",
                "",
                "",
                "^".repeat(ncarets),
                w = fwidth,
                col = hint.loc.first_column as usize
            );
            match &hint.text {
                Some(text) => {
                    let line_width = caret_line.len() + 1 + text.len();
                    if line_width >= DEFAULT_TERMINAL_WIDTH.max(80) {
                        let _ = writeln!(out, "{}", caret_line);
                        let _ = writeln!(out, "{:>w$} |{:>col$} {}", "", "", text, w = fwidth, col = hint.loc.first_column as usize);
                    } else {
                        let _ = writeln!(out, "{} {}", caret_line, text);
                    }
                }
                None => {
                    let _ = writeln!(out, "{}", caret_line);
                }
            }
            printed_primary = true;
        }
    }

    // Every hint not already shown above the snippet (spec §4.2: "hints in
    // other files are rendered as `= Note:` blocks").
    for hint in &diag.hints {
        if printed_primary && hint.loc.file_ref == loc0.file_ref {
            continue;
        }
        let Some(text) = &hint.text else { continue };
        let prefix = if printed_primary { " = Note: " } else { "Note: " };
        let _ = writeln!(out, "{:>w$}{}{}", "", prefix, text, w = fwidth);
        if hint.loc.is_known() {
            let name = files.name(hint.loc.file_ref).to_string();
            let _ = writeln!(out, "{:>w$}  --> {}:{}", "", name, hint.loc.first_line, w = fwidth);
        }
    }
}

fn render_trace(diag: &Diagnostic, out: &mut String) {
    // `Diagnostic::suppress_redundant_trace` already drops a trace frame
    // that merely repeats the primary location; `diag_emit_trace` goes
    // further and also skips a *single* remaining frame that shares either
    // the file or the line of the first hint (spec §4.2).
    if diag.trace.len() == 1 && !diag.hints.is_empty() {
        let hloc0 = diag.hints[0].loc;
        let tloc0 = diag.trace[0].loc;
        if tloc0.file_ref == hloc0.file_ref || tloc0.first_line == hloc0.first_line {
            return;
        }
    }

    for frame in &diag.trace {
        let _ = writeln!(out, "   {}", frame.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::diagnostic::{Diagnostic, Hint, Level};
    use crate::diag::loc::Loc;

    #[test]
    fn compact_style_is_one_line() {
        let mut files = FileRegistry::new();
        let fref = files.file_ref_for("a.vhd", Some("signal x : bit;\n".into()));
        let loc = Loc {
            first_line: 1,
            first_column: 7,
            ..Loc::unknown()
        };
        let loc = Loc { file_ref: fref, ..loc };
        let diag = Diagnostic::new(Level::Error, loc, "undefined reference")
            .with_hint(Hint::new(loc));
        let text = render(&diag, MessageStyle::Compact, &mut files);
        assert_eq!(text, "a.vhd:1:8: error: undefined reference\n");
    }

    #[test]
    fn classic_style_renders_a_source_snippet() {
        let mut files = FileRegistry::new();
        let fref = files.file_ref_for("a.vhd", Some("signal x : bit;\n".into()));
        let loc = Loc {
            first_line: 1,
            first_column: 7,
            column_delta: 0,
            ..Loc::unknown()
        };
        let loc = Loc { file_ref: fref, ..loc };
        let diag = Diagnostic::new(Level::Error, loc, "bad signal")
            .with_hint(Hint::new(loc).with_text("declared here"));
        let text = render(&diag, MessageStyle::Classic, &mut files);
        assert!(text.contains("Error: bad signal"));
        assert!(text.contains("signal x : bit;"));
        assert!(text.contains('^'));
        assert!(text.contains("declared here"));
    }

    #[test]
    fn classic_style_falls_back_without_a_loaded_file() {
        let mut files = FileRegistry::new();
        let diag = Diagnostic::new(Level::Warning, Loc::unknown(), "no location");
        let text = render(&diag, MessageStyle::Classic, &mut files);
        assert_eq!(text, "Warning: no location\n");
    }

    #[test]
    fn single_trace_frame_sharing_the_hint_file_is_suppressed() {
        use crate::diag::diagnostic::TraceFrame;
        let loc = Loc {
            first_line: 5,
            ..Loc::unknown()
        };
        let diag = Diagnostic::new(Level::Error, loc, "boom")
            .with_hint(Hint::new(loc))
            .with_trace(TraceFrame {
                loc: Loc { first_line: 5, ..Loc::unknown() },
                text: "inside foo".into(),
            });
        let mut out = String::new();
        render_trace(&diag, &mut out);
        assert!(out.is_empty());
    }
}
