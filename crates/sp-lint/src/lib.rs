//! Static checks over a [`sp_core::Story`] before it is played.
//!
//! Validation never fails; it returns every finding in a fixed order and
//! leaves the decision to block playback with the caller.

mod diagnostic;
mod step_checks;
mod validate;

pub use diagnostic::{has_errors, has_warnings, report, Diagnostic, Severity};
pub use validate::validate;
