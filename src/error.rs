//! Crate-wide error type.
//!
//! Mirrors the teacher's `models/error.rs`: one `thiserror` enum per
//! failure band rather than a single stringly-typed variant, with
//! `anyhow` reserved for the outermost pipeline API (see [`crate::Driver`]).

use thiserror::Error;

/// Errors the simplifier can report to a caller.
///
/// Per spec §7, user-band errors (unresolved reference, non-foldable
/// expression required to be static) are *not* represented here — those
/// are reported through the diagnostic emitter ([`crate::diag`]) and do not
/// interrupt the rewrite. `SimpError` covers only the bands that actually
/// stop the process: I/O failure, a corrupt serialized stream, or a
/// contract violation.
#[derive(Error, Debug)]
pub enum SimpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt tree stream: {reason}")]
    Corrupt { reason: String },

    #[error("fatal: {message}")]
    Fatal { message: String },

    #[error("diagnostic error limit reached ({limit} errors)")]
    ErrorLimitReached { limit: u32 },
}

pub type Result<T> = std::result::Result<T, SimpError>;

/// Raise a contract violation: log it and panic.
///
/// Per spec §7, contract violations (wrong-kind accessor, corrupt
/// back-reference, sensitivity-list builder reaching an unsupported kind,
/// ...) are fatal with a single-line diagnostic and a short trace; the
/// simplifier never attempts to recover from one. A Rust panic is the
/// natural analogue of the source's `process exits`.
#[track_caller]
pub fn fatal(message: impl Into<String>) -> ! {
    let message = message.into();
    tracing::error!(location = %std::panic::Location::caller(), "{message}");
    panic!("{message}");
}
