//! Backend pipeline stages.
//!
//! IEW (dispatch, issue, execute, writeback) -> Commit.

/// Commit stage and trap handling.
pub mod commit;

/// Issue/execute/writeback stage, including load execution and store drain.
pub mod iew;
