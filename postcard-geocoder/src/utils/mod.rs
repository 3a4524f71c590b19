//! Utility modules.

/// Log sanitization for response bodies.
pub mod log_sanitizer;
