//! Lua 5.4 implementation of the [`Interpreter`] contract.
//!
//! Each run gets a fresh VM with only the granted libraries loaded, a memory
//! limit, and an instruction hook that aborts the run at its deadline.
//!
//! The VM lives on a worker thread. Time spent inside a single C or Rust
//! call never reaches the hook, so the caller waits at most the timeout plus
//! [`WORKER_GRACE`] and then returns a timeout result; a worker stuck in such
//! a call is left to finish on its own and aborts at its next instruction.

mod builtins;
mod console;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use mlua::{
    Error, Function, HookTriggers, Lua, LuaOptions, MultiValue, StdLib, Value, VmState,
};
use tracing::{debug, warn};

use crate::capabilities::{Capabilities, Capability, DeniedGlobal};
use crate::error::{Result, SnippetError};
use crate::format::{DeadlineExceeded, format_result};
use crate::interpreter::Interpreter;
use crate::result::{ErrorCategory, ExecutionResult, OutputRecord};

use console::RecordLog;

/// Default VM memory limit (64 MiB).
pub const DEFAULT_MEMORY_LIMIT: usize = 64 * 1024 * 1024;

/// The deadline is checked every this many VM instructions.
pub const INSTRUCTION_HOOK_INTERVAL: u32 = 1_000;

/// How long the caller waits past the deadline before abandoning a worker.
pub const WORKER_GRACE: Duration = Duration::from_millis(250);

const CHUNK_NAME: &str = "=snippet";

/// Base-library functions removed from every sandbox.
const REMOVED_BASE: &[&str] = &[
    "dofile",
    "loadfile",
    "load",
    "loadstring",
    "collectgarbage",
    "require",
    "warn",
    "print",
];

/// Sandboxed Lua interpreter.
#[derive(Debug, Clone)]
pub struct LuaInterpreter {
    memory_limit: usize,
}

impl LuaInterpreter {
    pub fn new() -> Self {
        Self {
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }

    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = bytes;
        self
    }

    pub fn memory_limit(&self) -> usize {
        self.memory_limit
    }

    fn create_vm(&self, capabilities: &Capabilities, run: &RunState) -> Result<Lua> {
        let mut libs = StdLib::NONE;
        for (capability, lib) in [
            (Capability::Math, StdLib::MATH),
            (Capability::String, StdLib::STRING),
            (Capability::Table, StdLib::TABLE),
            (Capability::Utf8, StdLib::UTF8),
        ] {
            if capabilities.allows(capability) {
                libs = libs | lib;
            }
        }

        let lua = Lua::new_with(libs, LuaOptions::default())?;
        lua.set_memory_limit(self.memory_limit)?;

        lua.set_app_data(run.clock.clone());
        let clock = run.clock.clone();
        let _ = lua.set_hook(
            HookTriggers::new().every_nth_instruction(INSTRUCTION_HOOK_INTERVAL),
            move |_lua, _debug| {
                if clock.timed_out() || clock.expired() {
                    return Err(clock.abort());
                }
                Ok(VmState::Continue)
            },
        );

        install_sandbox(&lua, capabilities, run)?;
        Ok(lua)
    }
}

impl Default for LuaInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter for LuaInterpreter {
    fn name(&self) -> &str {
        "lua"
    }

    fn evaluate(
        &self,
        source: &str,
        capabilities: &Capabilities,
        timeout: Duration,
    ) -> ExecutionResult {
        let started = Instant::now();
        let (sender, receiver) = mpsc::channel();
        let interpreter = self.clone();
        let source = source.to_string();
        let capabilities = capabilities.clone();

        let spawned = thread::Builder::new()
            .name("quill-snippet".to_string())
            .spawn(move || {
                let result = interpreter.run_in_place(&source, &capabilities, started, timeout);
                let _ = sender.send(result);
            });
        if let Err(err) = spawned {
            return ExecutionResult::failed(
                Vec::new(),
                ErrorCategory::Runtime,
                &format!("failed to start interpreter thread: {err}"),
                started.elapsed(),
            );
        }

        match receiver.recv_timeout(timeout.saturating_add(WORKER_GRACE)) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_ms = %timeout.as_millis(),
                    "snippet stuck outside the VM, abandoning its worker"
                );
                ExecutionResult::failed(
                    Vec::new(),
                    ErrorCategory::Timeout,
                    &timeout_detail(timeout),
                    started.elapsed(),
                )
            }
            Err(RecvTimeoutError::Disconnected) => ExecutionResult::failed(
                Vec::new(),
                ErrorCategory::Runtime,
                "interpreter thread stopped unexpectedly",
                started.elapsed(),
            ),
        }
    }
}

impl LuaInterpreter {
    /// One run on the current thread; the hook enforces the deadline.
    fn run_in_place(
        &self,
        source: &str,
        capabilities: &Capabilities,
        started: Instant,
        timeout: Duration,
    ) -> ExecutionResult {
        let run = RunState::new(started, timeout);

        let lua = match self.create_vm(capabilities, &run) {
            Ok(lua) => lua,
            Err(err) => {
                return ExecutionResult::failed(
                    Vec::new(),
                    ErrorCategory::Runtime,
                    &err.to_string(),
                    started.elapsed(),
                );
            }
        };

        let outcome = compile(&lua, source)
            .and_then(|f| f.call::<MultiValue>(()))
            .and_then(|values| {
                match values.into_iter().next().filter(|v| !v.is_nil()) {
                    Some(value) => format_result(&lua, &value)
                        .map(Some)
                        .map_err(|DeadlineExceeded| run.clock.abort()),
                    None => Ok(None),
                }
            });
        let mut records = std::mem::take(&mut *run.records.borrow_mut());

        match outcome {
            Ok(result_text) => {
                records.extend(result_text.map(OutputRecord::result));
                let result = ExecutionResult::completed(records, started.elapsed());
                debug!(duration_ms = %result.duration_ms(), "snippet completed");
                result
            }
            Err(_) if run.clock.timed_out() => {
                let result = ExecutionResult::failed(
                    records,
                    ErrorCategory::Timeout,
                    &timeout_detail(timeout),
                    started.elapsed(),
                );
                warn!(timeout_ms = %timeout.as_millis(), "snippet timed out");
                result
            }
            Err(err) => {
                let (category, message) = categorize(&err);
                let result =
                    ExecutionResult::failed(records, category, &message, started.elapsed());
                debug!(category = %category, "snippet failed");
                result
            }
        }
    }
}

/// Deadline bookkeeping shared by the hook, guarded calls and callbacks.
///
/// Stored in the VM's app data so built-ins doing their own work in Rust can
/// check it.
#[derive(Debug, Clone)]
pub(crate) struct RunClock {
    deadline: Instant,
    timed_out: Rc<Cell<bool>>,
    message: String,
}

impl RunClock {
    pub(crate) fn new(started: Instant, timeout: Duration) -> Self {
        Self {
            deadline: started
                .checked_add(timeout)
                .unwrap_or_else(|| started + Duration::from_secs(u32::MAX as u64)),
            timed_out: Rc::new(Cell::new(false)),
            message: ErrorCategory::Timeout.describe(&timeout_detail(timeout)),
        }
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }

    pub(crate) fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub(crate) fn timed_out(&self) -> bool {
        self.timed_out.get()
    }

    /// Marks the run as timed out and returns the error that unwinds it.
    pub(crate) fn abort(&self) -> Error {
        self.timed_out.set(true);
        Error::runtime(self.message.clone())
    }
}

/// The error a built-in raises when it notices the deadline has passed.
pub(crate) fn deadline_error(lua: &Lua) -> Error {
    match lua.app_data_ref::<RunClock>() {
        Some(clock) => clock.abort(),
        None => Error::runtime(DeadlineExceeded.to_string()),
    }
}

fn timeout_detail(timeout: Duration) -> String {
    format!("execution exceeded {}ms timeout", timeout.as_millis())
}

/// Per-run state captured by the hook and the console.
struct RunState {
    clock: RunClock,
    records: RecordLog,
}

impl RunState {
    fn new(started: Instant, timeout: Duration) -> Self {
        Self {
            clock: RunClock::new(started, timeout),
            records: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

/// Expression first, then a statement chunk.
fn compile(lua: &Lua, source: &str) -> mlua::Result<Function> {
    let expression = format!("return {source}");
    match lua.load(expression.as_str()).set_name(CHUNK_NAME).into_function() {
        Ok(function) => Ok(function),
        Err(_) => lua.load(source).set_name(CHUNK_NAME).into_function(),
    }
}

fn install_sandbox(lua: &Lua, capabilities: &Capabilities, run: &RunState) -> Result<()> {
    let globals = lua.globals();

    for name in REMOVED_BASE {
        globals
            .raw_set(*name, Value::Nil)
            .map_err(|e| SnippetError::capability_install("base", e.to_string()))?;
    }
    if capabilities.allows(Capability::String) {
        let string: mlua::Table = globals
            .get("string")
            .map_err(|e| SnippetError::capability_install("string", e.to_string()))?;
        string
            .raw_set("dump", Value::Nil)
            .map_err(|e| SnippetError::capability_install("string", e.to_string()))?;
    }

    guard_protected_calls(lua, run)
        .map_err(|e| SnippetError::capability_install("base", e.to_string()))?;

    if capabilities.allows(Capability::Console) {
        console::install(lua, &run.records)
            .map_err(|e| SnippetError::capability_install("console", e.to_string()))?;
    }
    if capabilities.allows(Capability::Json) {
        builtins::install_json(lua)
            .map_err(|e| SnippetError::capability_install("json", e.to_string()))?;
    }
    if capabilities.allows(Capability::Date) {
        builtins::install_date(lua)
            .map_err(|e| SnippetError::capability_install("date", e.to_string()))?;
    }

    deny_globals(lua).map_err(|e| SnippetError::capability_install("sandbox", e.to_string()))
}

/// `pcall`/`xpcall` must not swallow a timeout.
fn guard_protected_calls(lua: &Lua, run: &RunState) -> mlua::Result<()> {
    let globals = lua.globals();
    for name in ["pcall", "xpcall"] {
        let inner: Function = globals.get(name)?;
        let clock = run.clock.clone();
        let guarded = lua.create_function(move |_, args: MultiValue| {
            let out = inner.call::<MultiValue>(args);
            if clock.timed_out() {
                return Err(clock.abort());
            }
            out
        })?;
        globals.raw_set(name, guarded)?;
    }
    Ok(())
}

/// Reading a denied global raises instead of yielding `nil`.
fn deny_globals(lua: &Lua) -> mlua::Result<()> {
    let meta = lua.create_table()?;
    meta.set(
        "__index",
        lua.create_function(|_, (_globals, key): (Value, Value)| {
            let denied = match &key {
                Value::String(name) => DeniedGlobal::find(&name.to_string_lossy()),
                _ => None,
            };
            match denied {
                Some(denied) => Err(Error::runtime(
                    ErrorCategory::Sandbox.describe(&denied.message()),
                )),
                None => Ok(Value::Nil),
            }
        })?,
    )?;
    meta.set("__metatable", false)?;
    let _ = lua.globals().set_metatable(Some(meta));
    Ok(())
}

/// Maps an mlua error onto a category and a clean message.
fn categorize(err: &Error) -> (ErrorCategory, String) {
    match err {
        Error::CallbackError { cause, .. } => categorize(cause),
        Error::WithContext { cause, .. } => categorize(cause),
        Error::SyntaxError { message, .. } => (ErrorCategory::Syntax, message.clone()),
        Error::MemoryError(message) => (ErrorCategory::Memory, message.clone()),
        Error::RuntimeError(message) => categorize_message(message),
        other => categorize_message(&other.to_string()),
    }
}

fn categorize_message(raw: &str) -> (ErrorCategory, String) {
    let message = raw
        .split("\nstack traceback:")
        .next()
        .unwrap_or(raw)
        .trim();

    for category in [
        ErrorCategory::Sandbox,
        ErrorCategory::Timeout,
        ErrorCategory::Assertion,
        ErrorCategory::Memory,
    ] {
        let prefix = format!("{}: ", category.as_str());
        if let Some(idx) = message.find(&prefix) {
            return (category, message[idx + prefix.len()..].to_string());
        }
    }
    if message.ends_with("assertion failed!") {
        return (ErrorCategory::Assertion, message.to_string());
    }
    (ErrorCategory::Runtime, message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_strips_traceback() {
        let (category, message) =
            categorize_message("snippet:1: boom\nstack traceback:\n\t[C]: in ?");
        assert_eq!(category, ErrorCategory::Runtime);
        assert_eq!(message, "snippet:1: boom");
    }

    #[test]
    fn test_categorize_finds_embedded_category() {
        let (category, message) =
            categorize_message("snippet:2: SandboxError: 'io' is not available in the sandbox (filesystem)");
        assert_eq!(category, ErrorCategory::Sandbox);
        assert_eq!(message, "'io' is not available in the sandbox (filesystem)");
    }

    #[test]
    fn test_builtin_assert_is_assertion() {
        let (category, _) = categorize_message("snippet:1: assertion failed!");
        assert_eq!(category, ErrorCategory::Assertion);
    }

    #[test]
    fn test_timeout_detail() {
        assert_eq!(
            timeout_detail(Duration::from_millis(250)),
            "execution exceeded 250ms timeout"
        );
    }

    #[test]
    fn test_clock_abort_marks_timeout() {
        let clock = RunClock::new(Instant::now(), Duration::from_secs(60));
        assert!(!clock.expired());
        assert!(!clock.timed_out());
        let err = clock.abort();
        assert!(clock.timed_out());
        assert_eq!(
            categorize(&err),
            (ErrorCategory::Timeout, "execution exceeded 60000ms timeout".to_string())
        );
    }

    #[test]
    fn test_run_in_place_honours_deadline() {
        let interpreter = LuaInterpreter::new();
        let result = interpreter.run_in_place(
            "while true do end",
            &Capabilities::standard(),
            Instant::now(),
            Duration::from_millis(50),
        );
        assert!(result.timed_out());
    }
}
