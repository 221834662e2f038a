//! Workflow execution modules.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `registry` | Bounded in-memory store of workflow records |
//! | `executor` | Drives a workflow's stage graph to a terminal state |

pub mod executor;
pub mod registry;
