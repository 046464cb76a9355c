//! Integration test harness for mtx.
//!
//! This crate provides utilities for end-to-end testing of the instruction
//! pipeline: Bind inputs → Parse → Execute → Verify values, pins and lineage.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mtx_foundation::{matrix_ops, AppendAxis, MatrixBlock, NaryFn, ScalarValue, Value};
use mtx_runtime::{ExecutionError, LineageItem, LineageMode, MatrixLibrary, Runtime, RuntimeConfig};
use mtx_tools::{Program, ProgramReport};

/// Dense library that counts how often it is called.
#[derive(Debug, Default)]
pub struct CountingLibrary {
    calls: AtomicUsize,
}

impl CountingLibrary {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MatrixLibrary for CountingLibrary {
    fn append(&self, first: &MatrixBlock, rest: &[&MatrixBlock], axis: AppendAxis) -> MatrixBlock {
        self.calls.fetch_add(1, Ordering::SeqCst);
        matrix_ops::append(first, rest, axis)
    }

    fn nary_reduce(
        &self,
        func: NaryFn,
        matrices: &[&MatrixBlock],
        scalars: &[ScalarValue],
    ) -> MatrixBlock {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scalars: Vec<f64> = scalars.iter().map(ScalarValue::as_f64).collect();
        matrix_ops::nary_reduce(func, matrices, &scalars)
    }
}

/// Test harness wrapping a [`Runtime`] over a [`CountingLibrary`].
pub struct TestHarness {
    runtime: Runtime,
    library: Arc<CountingLibrary>,
}

impl TestHarness {
    /// Create a harness with the given lineage mode.
    pub fn new(mode: LineageMode) -> Self {
        Self::with_config(RuntimeConfig {
            lineage: mode,
            ..RuntimeConfig::default()
        })
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let library = Arc::new(CountingLibrary::default());
        let runtime = Runtime::with_library(config, library.clone());
        Self { runtime, library }
    }

    /// Bind a matrix input given as rows.
    pub fn matrix(&self, name: &str, rows: &[&[f64]]) -> &Self {
        self.runtime.set_input(name, MatrixBlock::from_rows(rows));
        self
    }

    pub fn scalar(&self, name: &str, value: ScalarValue) -> &Self {
        self.runtime.set_input(name, value);
        self
    }

    /// Execute one instruction string.
    ///
    /// # Panics
    ///
    /// Panics if parsing or execution fails.
    pub fn exec(&self, instruction: &str) -> Value {
        match self.runtime.execute_str(instruction) {
            Ok(value) => value,
            Err(err) => panic!("'{instruction}' failed: {err}"),
        }
    }

    /// Execute one instruction string, returning the error.
    pub fn try_exec(&self, instruction: &str) -> Result<Value, ExecutionError> {
        self.runtime.execute_str(instruction)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.runtime.get(name)
    }

    pub fn get_matrix(&self, name: &str) -> Option<MatrixBlock> {
        self.get(name).and_then(|v| v.as_matrix().cloned())
    }

    pub fn get_scalar(&self, name: &str) -> Option<ScalarValue> {
        self.get(name).and_then(|v| v.as_scalar())
    }

    pub fn pin_count(&self, name: &str) -> Option<usize> {
        self.runtime.context().pin_count(name)
    }

    /// Assert that no bound matrix is pinned.
    ///
    /// # Panics
    ///
    /// Panics naming the first variable with outstanding pins.
    pub fn assert_unpinned(&self) {
        for name in self.runtime.context().names() {
            if let Some(pins) = self.pin_count(name.as_str()) {
                assert_eq!(pins, 0, "'{name}' still pinned");
            }
        }
    }

    pub fn lineage(&self, name: &str) -> Option<LineageItem> {
        self.runtime.lineage_of(name)
    }

    pub fn explain(&self, name: &str) -> Option<String> {
        self.runtime.explain(name)
    }

    /// Number of calls made into the matrix library so far.
    pub fn library_calls(&self) -> usize {
        self.library.calls()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

/// Run a JSON program end to end.
///
/// # Panics
///
/// Panics if the program is malformed or fails.
pub fn run_program(json: &str) -> ProgramReport {
    let program = match Program::from_json(json) {
        Ok(program) => program,
        Err(err) => panic!("invalid program: {err}"),
    };
    match program.run() {
        Ok(report) => report,
        Err(err) => panic!("program failed: {err}"),
    }
}
