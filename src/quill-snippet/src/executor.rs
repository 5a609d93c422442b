//! Snippet executor.
//!
//! Wraps a shared [`Interpreter`] with a capability set and a default
//! timeout. Runs are independent: the executor holds no per-run state, so one
//! executor can serve concurrent runs from several tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::DEFAULT_TIMEOUT_MS;
use crate::capabilities::Capabilities;
use crate::error::{Result, SnippetError};
use crate::interpreter::Interpreter;
use crate::lua::LuaInterpreter;
use crate::result::ExecutionResult;

/// Runs snippets against an interpreter.
#[derive(Clone)]
pub struct SnippetExecutor {
    interpreter: Arc<dyn Interpreter>,
    capabilities: Capabilities,
    timeout: Duration,
}

impl SnippetExecutor {
    /// Lua interpreter, standard capabilities, default timeout.
    pub fn new() -> Self {
        Self::with_interpreter(Arc::new(LuaInterpreter::new()))
    }

    pub fn with_interpreter(interpreter: Arc<dyn Interpreter>) -> Self {
        Self {
            interpreter,
            capabilities: Capabilities::standard(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_ms(self, timeout_ms: u64) -> Self {
        self.with_timeout(Duration::from_millis(timeout_ms))
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Run with the default timeout.
    pub fn run(&self, source: &str) -> ExecutionResult {
        self.run_with_timeout(source, self.timeout)
    }

    /// Run with an explicit timeout.
    pub fn run_with_timeout(&self, source: &str, timeout: Duration) -> ExecutionResult {
        debug!(
            interpreter = self.interpreter.name(),
            timeout_ms = %timeout.as_millis(),
            bytes = source.len(),
            "running snippet"
        );
        let started = Instant::now();
        let mut result = self
            .interpreter
            .evaluate(source, &self.capabilities, timeout);
        // Include VM setup and teardown in the reported duration.
        result.duration = result.duration.max(started.elapsed());
        debug!(
            success = result.success,
            duration_ms = %result.duration_ms(),
            records = result.records.len(),
            "snippet finished"
        );
        result
    }

    /// Run on Tokio's blocking pool so the calling task stays responsive.
    pub async fn run_async(&self, source: impl Into<String>) -> Result<ExecutionResult> {
        let executor = self.clone();
        let source = source.into();
        tokio::task::spawn_blocking(move || executor.run(&source))
            .await
            .map_err(|e| SnippetError::TaskFailed(e.to_string()))
    }
}

impl Default for SnippetExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SnippetExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetExecutor")
            .field("interpreter", &self.interpreter.name())
            .field("capabilities", &self.capabilities)
            .field("timeout", &self.timeout)
            .finish()
    }
}
