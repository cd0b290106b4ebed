//! Graph Components
//!
//! This module defines the components that live in the dependency graph.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::PortAddr;
use crate::error::ComputeError;
use crate::props::Properties;

/// Unique identifier for a component in the dependency graph.
///
/// IDs are never reused, so a handle kept past its component's removal
/// simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Generate a new unique component ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Dirty state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// The cached outputs are up-to-date.
    Clean,

    /// An upstream component is pending. Recompute only if one of the
    /// direct dependencies actually produced different outputs.
    MaybeDirty,

    /// The component's own inputs, wiring or properties changed.
    Dirty,
}

/// The computation a component performs.
///
/// `inputs` has one slot per input port. A slot is `None` when the port is
/// unconnected or the upstream component failed.
pub trait Operator<P> {
    fn execute(&mut self, inputs: &[Option<P>], props: &Properties) -> Result<Vec<P>, ComputeError>;
}

impl<P, F> Operator<P> for F
where
    F: FnMut(&[Option<P>], &Properties) -> Result<Vec<P>, ComputeError>,
{
    fn execute(&mut self, inputs: &[Option<P>], props: &Properties) -> Result<Vec<P>, ComputeError> {
        self(inputs, props)
    }
}

/// A node in the dependency graph.
pub struct Component<P> {
    /// Unique identifier for this component.
    id: ComponentId,

    /// Canonical name. The engine may suffix it on insertion to keep
    /// names unique.
    name: String,

    /// Source of each input port, by position.
    inputs: SmallVec<[Option<PortAddr>; 4]>,

    /// Whether connecting past the last input adds ports.
    variadic: bool,

    /// Number of output ports.
    outputs: usize,

    props: Properties,

    operator: Box<dyn Operator<P>>,

    dirty: DirtyState,

    /// Last computation result. `None` until the first update.
    result: Option<Result<Vec<P>, ComputeError>>,

    /// Components reading from this one, with the number of edges each.
    dependents: HashMap<ComponentId, usize>,
}

impl<P> Component<P> {
    /// Create a new component. It starts dirty so the first update
    /// computes it.
    pub fn new<O>(name: impl Into<String>, inputs: usize, outputs: usize, operator: O) -> Self
    where
        O: Operator<P> + 'static,
    {
        Self {
            id: ComponentId::new(),
            name: name.into(),
            inputs: SmallVec::from_elem(None, inputs),
            variadic: false,
            outputs,
            props: Properties::new(),
            operator: Box::new(operator),
            dirty: DirtyState::Dirty,
            result: None,
            dependents: HashMap::new(),
        }
    }

    /// Create a component from a closure.
    pub fn from_fn<F>(name: impl Into<String>, inputs: usize, outputs: usize, f: F) -> Self
    where
        F: FnMut(&[Option<P>], &Properties) -> Result<Vec<P>, ComputeError> + 'static,
    {
        Self::new(name, inputs, outputs, f)
    }

    /// Allow the input list to grow when connected past its end.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn props(&self) -> &Properties {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut Properties {
        &mut self.props
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    pub fn is_clean(&self) -> bool {
        self.dirty == DirtyState::Clean
    }

    pub fn mark_clean(&mut self) {
        self.dirty = DirtyState::Clean;
    }

    /// Only upgrades a clean component; never downgrades `Dirty`.
    pub fn mark_maybe_dirty(&mut self) {
        if self.dirty == DirtyState::Clean {
            self.dirty = DirtyState::MaybeDirty;
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = DirtyState::Dirty;
    }

    /// Outputs of the last successful computation.
    pub fn outputs(&self) -> Option<&[P]> {
        match &self.result {
            Some(Ok(values)) => Some(values),
            _ => None,
        }
    }

    /// Error recorded by the last computation, if it failed.
    pub fn error(&self) -> Option<&ComputeError> {
        match &self.result {
            Some(Err(err)) => Some(err),
            _ => None,
        }
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    pub(crate) fn input_source(&self, port: usize) -> Option<PortAddr> {
        self.inputs.get(port).copied().flatten()
    }

    pub(crate) fn input_sources(&self) -> impl Iterator<Item = (usize, PortAddr)> + '_ {
        self.inputs
            .iter()
            .enumerate()
            .filter_map(|(port, src)| src.map(|addr| (port, addr)))
    }

    /// Whether `port` can take a connection. Variadic components accept
    /// any index and grow on [`set_input`](Self::set_input).
    pub(crate) fn accepts_input(&self, port: usize) -> bool {
        port < self.inputs.len() || self.variadic
    }

    pub(crate) fn set_input(&mut self, port: usize, source: Option<PortAddr>) {
        if port >= self.inputs.len() {
            self.inputs.resize(port + 1, None);
        }
        self.inputs[port] = source;
    }

    pub(crate) fn clear_inputs(&mut self) {
        for slot in self.inputs.iter_mut() {
            *slot = None;
        }
    }

    /// Components this one reads from.
    pub fn dependencies(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.inputs.iter().flatten().map(|addr| addr.component)
    }

    /// Components that read from this one.
    pub fn dependents(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.dependents.keys().copied()
    }

    pub(crate) fn add_dependent(&mut self, id: ComponentId) {
        *self.dependents.entry(id).or_insert(0) += 1;
    }

    pub(crate) fn remove_dependent(&mut self, id: ComponentId) {
        if let Some(count) = self.dependents.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.dependents.remove(&id);
            }
        }
    }

    pub(crate) fn forget_dependent(&mut self, id: ComponentId) {
        self.dependents.remove(&id);
    }

    pub(crate) fn clear_dependents(&mut self) {
        self.dependents.clear();
    }
}

impl<P: PartialEq> Component<P> {
    /// Run the operator and store the result.
    ///
    /// Returns whether the result differs from the previous one.
    pub(crate) fn execute(&mut self, inputs: &[Option<P>]) -> bool {
        let result = self.operator.execute(inputs, &self.props);
        let changed = self.result.as_ref() != Some(&result);
        self.result = Some(result);
        self.dirty = DirtyState::Clean;
        changed
    }
}

impl<P> fmt::Debug for Component<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("dirty", &self.dirty)
            .finish()
    }
}
