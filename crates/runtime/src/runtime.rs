//! Runtime facade.
//!
//! [`Runtime`] owns one execution context together with the lineage of every
//! variable in it and, in reuse mode, a cache of earlier results. It is the
//! entry point for callers that want lineage kept in step with bindings; the
//! bare [`InstructionExecutor`] stays available for callers that do not.
//!
//! Binding and lineage updates happen back to back but not atomically: a
//! concurrent rebind of an input between recording and binding can leave an
//! output whose lineage names the superseded input value.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mtx_foundation::{Value, VarName};
use tracing::{debug, info, trace};

use crate::config::{LineageMode, RuntimeConfig};
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::executor::InstructionExecutor;
use crate::instruction::Instruction;
use crate::library::{DenseLibrary, MatrixLibrary};
use crate::lineage::{record_lineage, LineageItem, LineageMap};
use crate::operand::Operand;
use crate::reuse::{CacheStats, ReuseCache};

/// Execution context plus lineage and reuse.
#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    /// Variable bindings
    context: ExecutionContext,
    /// Lineage of every bound variable, when lineage is enabled
    lineage: RwLock<LineageMap>,
    /// Results keyed by lineage, used in reuse mode
    cache: ReuseCache,
    executor: InstructionExecutor,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Runtime {
    /// Create a runtime computing with the dense in-memory library.
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_library(config, Arc::new(DenseLibrary))
    }

    /// Create a runtime computing through `library`.
    pub fn with_library(config: RuntimeConfig, library: Arc<dyn MatrixLibrary>) -> Self {
        info!(
            lineage = %config.lineage,
            max_cache_entries = ?config.max_cache_entries,
            "runtime created"
        );
        let cache = match config.max_cache_entries {
            Some(capacity) => ReuseCache::with_capacity(capacity),
            None => ReuseCache::new(),
        };
        Self {
            config,
            context: ExecutionContext::new(),
            lineage: RwLock::new(LineageMap::new()),
            cache,
            executor: InstructionExecutor::new(library),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The underlying context.
    ///
    /// Bindings made directly on the context get no lineage; instructions
    /// reading them fail in lineage modes.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    fn lineage_read(&self) -> RwLockReadGuard<'_, LineageMap> {
        self.lineage.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lineage_write(&self) -> RwLockWriteGuard<'_, LineageMap> {
        self.lineage.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bind an external input, recording a creation leaf as its lineage.
    pub fn set_input(&self, name: impl Into<VarName>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if self.config.lineage.records() {
            self.lineage_write().set_input(name.clone(), &value);
        }
        self.context.set_variable(name, value);
    }

    /// Execute one instruction and bind its output.
    ///
    /// In reuse mode an output whose lineage is equivalent to an earlier
    /// result is bound to that result without calling the matrix library.
    ///
    /// # Errors
    ///
    /// Any [`crate::ExecutionError`] from lineage recording or execution.
    /// Nothing is bound on error.
    pub fn execute(&self, instruction: &Instruction) -> Result<Value> {
        let mode = self.config.lineage;
        if !mode.records() {
            return self.executor.execute(instruction, &self.context);
        }

        let record = record_lineage(instruction, &*self.lineage_read())?;
        let output = instruction.output();

        if mode.reuses() {
            if let Some(value) = self.cache.probe(&record.item) {
                if matches_output(&value, output) {
                    debug!(
                        opcode = %instruction.opcode(),
                        output = %output.name,
                        id = %record.item.id(),
                        "reused cached result"
                    );
                    self.context.bind_output(&output.name, value.clone());
                    self.lineage_write().insert(record);
                    return Ok(value);
                }
                trace!(output = %output.name, "cached result has a different output type");
            }
        }

        let value = self.executor.execute(instruction, &self.context)?;
        if mode.reuses() {
            self.cache.put(&record.item, value.clone());
        }
        self.lineage_write().insert(record);
        Ok(value)
    }

    /// Parse and execute one instruction string.
    pub fn execute_str(&self, text: &str) -> Result<Value> {
        self.execute(&Instruction::parse(text)?)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.context.get(name)
    }

    /// Remove a variable together with its lineage.
    pub fn remove_variable(&self, name: &str) -> Option<Value> {
        self.lineage_write().remove(name);
        self.context.remove_variable(name)
    }

    /// Lineage node bound to `name`; see [`LineageMap::get`] for why its
    /// `name()` may be another output's.
    pub fn lineage_of(&self, name: &str) -> Option<LineageItem> {
        self.lineage_read().get(name).cloned()
    }

    /// Lineage trace of `name`, see [`LineageMap::explain`].
    pub fn explain(&self, name: &str) -> Option<String> {
        self.lineage_read().explain_var(name)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn lineage_mode(&self) -> LineageMode {
        self.config.lineage
    }
}

/// Whether a cached value can be bound to `output` as is.
///
/// Lineage does not cover the declared output type, so a scalar cached for
/// an `INT64` output must not serve an `FP64` one.
fn matches_output(value: &Value, output: &Operand) -> bool {
    match value {
        Value::Matrix(_) => output.is_matrix(),
        Value::Scalar(scalar) => output.is_scalar() && scalar.value_type() == output.value_type,
    }
}
