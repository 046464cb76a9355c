//! Lineage node arena and name association.

use std::collections::HashSet;
use std::fmt::Write as _;

use indexmap::IndexMap;
use mtx_foundation::{Value, VarName};
use tracing::{debug, warn};

use super::item::{LineageId, LineageItem};
use super::{LineageLookup, LineageRecord};

/// Arena size below which unreachable nodes are never collected.
pub const COLLECT_THRESHOLD: usize = 1024;

/// Lineage of every live variable, kept in step with the context bindings.
///
/// Nodes are stored once per id in an arena; names point into it. Nodes no
/// longer reachable from any name are reclaimed by
/// [`LineageMap::retain_reachable`], which runs on its own whenever the
/// arena has doubled since the last pass.
#[derive(Debug)]
pub struct LineageMap {
    names: IndexMap<VarName, LineageId>,
    nodes: IndexMap<LineageId, LineageItem>,
    next_collect: usize,
}

impl Default for LineageMap {
    fn default() -> Self {
        Self {
            names: IndexMap::new(),
            nodes: IndexMap::new(),
            next_collect: COLLECT_THRESHOLD,
        }
    }
}

impl LineageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` as an externally provided input bound to `value`.
    pub fn set_input(&mut self, name: impl Into<VarName>, value: &Value) -> LineageId {
        let name = name.into();
        let id = self.intern(LineageItem::creation(name.clone(), value));
        self.names.insert(name, id);
        self.maybe_collect();
        id
    }

    /// Store a recorded item and point its output name at it.
    pub fn insert(&mut self, record: LineageRecord) -> LineageId {
        let LineageRecord { item, literals } = record;
        for literal in literals {
            self.intern(literal);
        }
        let name = item.name().clone();
        let id = self.intern(item);
        self.names.insert(name, id);
        self.maybe_collect();
        id
    }

    /// Associate `name` with a node already in the arena.
    ///
    /// Returns `false` and leaves the map unchanged if `id` is unknown.
    pub fn alias(&mut self, name: impl Into<VarName>, id: LineageId) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        self.names.insert(name.into(), id);
        true
    }

    fn intern(&mut self, item: LineageItem) -> LineageId {
        let id = item.id();
        match self.nodes.get(&id) {
            Some(existing) if !existing.is_equivalent(&item) => {
                warn!(
                    %id,
                    existing = existing.opcode(),
                    incoming = item.opcode(),
                    "lineage id collision; keeping the first node"
                );
            }
            Some(_) => {}
            None => {
                self.nodes.insert(id, item);
            }
        }
        id
    }

    /// Lineage node currently associated with `name`.
    ///
    /// Equivalent computations share one node, so the node's
    /// [`LineageItem::name`] is the output it was first recorded for, which
    /// need not be `name`.
    pub fn get(&self, name: &str) -> Option<&LineageItem> {
        self.names.get(name).and_then(|id| self.nodes.get(id))
    }

    pub fn node(&self, id: LineageId) -> Option<&LineageItem> {
        self.nodes.get(&id)
    }

    /// Drop the association of `name`.
    ///
    /// Its nodes stay in the arena until the next collection pass.
    pub fn remove(&mut self, name: &str) -> Option<LineageId> {
        let id = self.names.shift_remove(name);
        self.maybe_collect();
        id
    }

    fn maybe_collect(&mut self) {
        if self.nodes.len() >= self.next_collect {
            self.retain_reachable();
        }
    }

    /// Drop every node not reachable from a named variable.
    ///
    /// Returns the number of nodes removed.
    pub fn retain_reachable(&mut self) -> usize {
        let mut live: HashSet<LineageId> = HashSet::with_capacity(self.nodes.len());
        let mut stack: Vec<LineageId> = self.names.values().copied().collect();
        while let Some(id) = stack.pop() {
            if !live.insert(id) {
                continue;
            }
            if let Some(item) = self.nodes.get(&id) {
                stack.extend(item.inputs().iter().copied());
            }
        }

        let before = self.nodes.len();
        self.nodes.retain(|id, _| live.contains(id));
        let removed = before - self.nodes.len();
        self.next_collect = COLLECT_THRESHOLD.max(self.nodes.len().saturating_mul(2));
        debug!(removed, live = self.nodes.len(), "lineage nodes collected");
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of named variables.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of distinct nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deterministic textual trace of the DAG below `id`.
    ///
    /// One line per node in post-order, inputs before the nodes using them:
    /// `(<id>) (<opcode>) <data>` for leaves and `(<id>) (<opcode>) (<in1>) …`
    /// otherwise. A node reachable along several paths is printed once.
    /// Returns `None` if `id` is not in the arena.
    pub fn explain(&self, id: LineageId) -> Option<String> {
        self.nodes.get(&id)?;
        let mut out = String::new();
        let mut seen = HashSet::new();
        // (node, inputs already pushed)
        let mut stack = vec![(id, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                self.write_node(id, &mut out);
                continue;
            }
            if !seen.insert(id) {
                continue;
            }
            stack.push((id, true));
            if let Some(item) = self.nodes.get(&id) {
                for input in item.inputs().iter().rev() {
                    if !seen.contains(input) {
                        stack.push((*input, false));
                    }
                }
            }
        }
        Some(out)
    }

    /// Trace of the lineage of `name`, see [`LineageMap::explain`].
    pub fn explain_var(&self, name: &str) -> Option<String> {
        self.names.get(name).and_then(|id| self.explain(*id))
    }

    fn write_node(&self, id: LineageId, out: &mut String) {
        let Some(item) = self.nodes.get(&id) else {
            let _ = writeln!(out, "({id}) (missing)");
            return;
        };
        let _ = write!(out, "({}) ({})", id, item.opcode());
        if let Some(data) = item.data() {
            let _ = write!(out, " {data}");
        }
        for input in item.inputs() {
            let _ = write!(out, " ({input})");
        }
        out.push('\n');
    }
}

impl LineageLookup for LineageMap {
    fn lineage(&self, name: &str) -> Option<LineageId> {
        self.names.get(name).copied()
    }
}
