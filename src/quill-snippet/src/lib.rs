//! # Quill Snippet
//!
//! Sandboxed execution of script snippets captured from rendered documents.
//!
//! A snippet runs in a fresh, isolated interpreter that only sees an
//! enumerated set of capabilities:
//! - a `console` object whose methods append structured [`OutputRecord`]s
//!   instead of touching real I/O
//! - pure built-ins (`math`, `string`, `table`, `utf8`, `json`, `date`)
//!
//! Filesystem, environment, module loading, code loading and scheduling
//! primitives are not reachable; touching one fails immediately with a
//! descriptive `SandboxError`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   SnippetExecutor                     │
//! │        (default timeout, capabilities, async)         │
//! └──────────────────────────┬───────────────────────────┘
//!                            │ evaluate(source, caps, timeout)
//!                            ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                 Interpreter (trait)                   │
//! ├──────────────────────────────────────────────────────┤
//! │  LuaInterpreter: fresh VM per run, instruction hook   │
//! │  deadline, memory limit, guarded globals              │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Safety Guarantees
//!
//! - **Preemptive timeout**: the VM is interrupted from an instruction hook,
//!   so infinite loops abort without the snippet's cooperation; the caller
//!   stops waiting shortly after the deadline even when the snippet is stuck
//!   inside a single library call
//! - **No escaping errors**: syntax errors, runtime errors, memory exhaustion
//!   and timeouts all become `error` records with `success = false`
//! - **Isolated runs**: every run builds its own VM; runs never share state
//!
//! ## Example
//!
//! ```rust,ignore
//! use quill_snippet::SnippetExecutor;
//!
//! let executor = SnippetExecutor::new();
//! let result = executor.run("1+1");
//! assert!(result.success);
//! assert_eq!(result.records[0].text, "→ 2");
//! ```

pub mod capabilities;
pub mod error;
pub mod executor;
pub mod format;
pub mod interpreter;
pub mod lua;
pub mod result;


pub use capabilities::{Capabilities, Capability, DeniedGlobal, DENIED_GLOBALS};
pub use error::{Result, SnippetError};
pub use executor::SnippetExecutor;
pub use format::{DeadlineExceeded, OBJECT_CHAR_BUDGET, format_result, format_value};
pub use interpreter::Interpreter;
pub use lua::{DEFAULT_MEMORY_LIMIT, INSTRUCTION_HOOK_INTERVAL, LuaInterpreter, WORKER_GRACE};
pub use result::{ErrorCategory, ExecutionResult, OutputKind, OutputRecord};

/// Default wall-clock budget for one snippet run, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Canonical fence tag for executable snippets.
pub const PRIMARY_TAG: &str = "lua";

/// Default case-insensitive fence tags whose blocks are executable.
pub const DEFAULT_EXECUTABLE_TAGS: [&str; 4] = ["lua", "lua5.4", "lua54", "luajit"];
