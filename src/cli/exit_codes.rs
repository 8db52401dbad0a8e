//! exit codes for qtree commands
//!
//! these follow Unix conventions where 0 = success and non-zero = error
//! specific codes help scripts distinguish between failure types

/// command completed successfully
pub const SUCCESS: i32 = 0;

/// general or unknown error
pub const ERROR: i32 = 1;

/// invalid command-line arguments (same code clap uses)
pub const INVALID_ARGS: i32 = 2;

/// payload parsed but the filter has validation issues
pub const INVALID_FILTER: i32 = 3;

/// payload could not be parsed into a tree
pub const MALFORMED_PAYLOAD: i32 = 4;

/// an edit intent was rejected by the tree
pub const EDIT_REJECTED: i32 = 5;

/// configuration file error
pub const CONFIG_ERROR: i32 = 6;
