//! Standard exit codes for CLI operations
//!
//! Argument errors are reported by clap with its own exit code (2).

/// General error, also used when linting finds template errors
pub const ERROR: i32 = 1;

/// Value synthesis failed (depth or document limit exceeded)
pub const SYNTHESIS_ERROR: i32 = 3;

/// Invalid module structure, Chart.yaml or schema
pub const MODULE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
