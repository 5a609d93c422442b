//! The capability-gated interpreter contract.

use std::time::Duration;

use crate::capabilities::Capabilities;
use crate::result::ExecutionResult;

/// An isolated evaluator for snippet source.
///
/// Implementations must:
/// - expose nothing beyond `capabilities` to the snippet
/// - abort the run once `timeout` has elapsed, without the snippet's cooperation
/// - report every snippet failure (syntax, runtime, memory, timeout, sandbox
///   violation) inside the returned [`ExecutionResult`], never by panicking
/// - leave no state behind; two calls never observe each other
pub trait Interpreter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Evaluate `source` and collect its output.
    fn evaluate(
        &self,
        source: &str,
        capabilities: &Capabilities,
        timeout: Duration,
    ) -> ExecutionResult;
}
