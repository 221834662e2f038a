//! Agent execution modules.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `state` | Lock-guarded observable state per agent (status, bounded buffers) |
//! | `agent` | One invocation: status lifecycle, prompt build, retry loop, events |
//! | `roster` | Process-wide set of the six agents, shared across workflows |
//!
//! ## Data Flow
//!
//! executor → `roster` lookup → `agent::invoke` → provider → `state` update + events

pub mod agent;
pub mod roster;
pub mod state;
