//! Update Scheduler
//!
//! [`DagEngine`] owns the components and their wiring and decides the order
//! in which dirty components recompute.
//!
//! # Algorithm
//!
//! 1. A changed component is marked `Dirty`; everything downstream of it is
//!    marked `MaybeDirty`.
//! 2. On update, collect every component that is not clean.
//! 3. Sort them topologically (dependencies before dependents).
//! 4. Process each in order:
//!    - `Dirty` components always recompute
//!    - `MaybeDirty` components recompute only if a direct dependency
//!      produced a different result during this pass, otherwise they are
//!      marked clean with their cached outputs
//!
//! Structural edits (connect, disconnect, removal, rebuild) mark the
//! components whose inputs changed as `Dirty`.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use super::component::{Component, ComponentId, DirtyState};
use super::{DependencyGraph, Link, PortAddr};
use crate::error::{EngineError, EngineResult};

/// Summary of the last [`DependencyGraph::update`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Components whose operator ran.
    pub computed: usize,
    /// Maybe-dirty components whose inputs turned out unchanged.
    pub skipped: usize,
    /// Components whose operator returned an error.
    pub failed: usize,
}

/// The reference dependency graph engine.
pub struct DagEngine<P> {
    /// All components in the graph, indexed by ID.
    components: IndexMap<ComponentId, Component<P>>,

    /// Names currently in use.
    names: HashSet<String>,

    /// Next suffix to try for each base name.
    next_suffix: HashMap<String, usize>,

    last_report: UpdateReport,
}

impl<P> DagEngine<P> {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            components: IndexMap::new(),
            names: HashSet::new(),
            next_suffix: HashMap::new(),
            last_report: UpdateReport::default(),
        }
    }

    /// Get a reference to a component.
    pub fn component(&self, id: ComponentId) -> Option<&Component<P>> {
        self.components.get(&id)
    }

    /// All components, in insertion order.
    pub fn components(&self) -> impl Iterator<Item = &Component<P>> {
        self.components.values()
    }

    /// Get the total number of components in the graph.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn find_by_name(&self, name: &str) -> Option<ComponentId> {
        self.components
            .values()
            .find(|c| c.name() == name)
            .map(Component::id)
    }

    /// The current connection set, grouped by target component.
    pub fn links(&self) -> Vec<Link> {
        self.components
            .values()
            .flat_map(|component| {
                let id = component.id();
                component
                    .input_sources()
                    .map(move |(port, src)| Link::new(src, PortAddr::new(id, port)))
            })
            .collect()
    }

    pub fn last_report(&self) -> UpdateReport {
        self.last_report
    }

    /// Output value at a port, if its component has computed successfully.
    pub fn output(&self, addr: PortAddr) -> Option<&P> {
        self.components
            .get(&addr.component)?
            .outputs()?
            .get(addr.index)
    }

    /// Reserve a name derived from `base` that no other component uses.
    fn unique_name(&mut self, base: &str) -> String {
        if self.names.insert(base.to_string()) {
            return base.to_string();
        }
        let next = self.next_suffix.entry(base.to_string()).or_insert(1);
        loop {
            let candidate = format!("{base}_{next}");
            *next += 1;
            if self.names.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    fn validate_link(&self, link: &Link) -> EngineResult<()> {
        let from = self
            .components
            .get(&link.from.component)
            .ok_or(EngineError::UnknownComponent(link.from.component))?;
        let to = self
            .components
            .get(&link.to.component)
            .ok_or(EngineError::UnknownComponent(link.to.component))?;

        if link.from.index >= from.output_count() {
            return Err(EngineError::PortOutOfRange {
                component: from.id(),
                port: link.from.index,
                available: from.output_count(),
            });
        }
        if !to.accepts_input(link.to.index) {
            return Err(EngineError::PortOutOfRange {
                component: to.id(),
                port: link.to.index,
                available: to.input_count(),
            });
        }
        Ok(())
    }

    /// Whether `target` is reachable from `start` by following dependents.
    fn reaches(&self, start: ComponentId, target: ComponentId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(component) = self.components.get(&id) {
                stack.extend(component.dependents());
            }
        }
        false
    }

    /// Remove whatever feeds the input port at `to`.
    fn detach_input(&mut self, to: PortAddr) -> Option<PortAddr> {
        let source = self.components.get(&to.component)?.input_source(to.index)?;
        if let Some(target) = self.components.get_mut(&to.component) {
            target.set_input(to.index, None);
        }
        if let Some(upstream) = self.components.get_mut(&source.component) {
            upstream.remove_dependent(to.component);
        }
        Some(source)
    }

    /// Mark every component downstream of `roots` as maybe dirty.
    fn propagate_dirty(&mut self, roots: impl IntoIterator<Item = ComponentId>) {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        for root in roots {
            if let Some(component) = self.components.get(&root) {
                queue.extend(component.dependents());
            }
        }

        // BFS to propagate maybe-dirty status
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(component) = self.components.get_mut(&id) {
                component.mark_maybe_dirty();
                queue.extend(component.dependents());
            }
        }
    }

    /// Perform a topological sort of the given components.
    ///
    /// Returns components in order such that dependencies come before
    /// dependents.
    fn topological_sort(&self, ids: Vec<ComponentId>) -> Vec<ComponentId> {
        let id_set: HashSet<_> = ids.iter().copied().collect();
        let mut in_degree: HashMap<ComponentId, usize> = HashMap::new();
        let mut result = Vec::with_capacity(ids.len());
        let mut queue = VecDeque::new();

        // Count distinct dependencies within the set
        for &id in &ids {
            if let Some(component) = self.components.get(&id) {
                let degree = component
                    .dependencies()
                    .filter(|dep| id_set.contains(dep))
                    .collect::<HashSet<_>>()
                    .len();
                in_degree.insert(id, degree);
                if degree == 0 {
                    queue.push_back(id);
                }
            }
        }

        // Kahn's algorithm
        while let Some(id) = queue.pop_front() {
            result.push(id);

            if let Some(component) = self.components.get(&id) {
                for dependent in component.dependents() {
                    if let Some(degree) = in_degree.get_mut(&dependent) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(dependent);
                        }
                    }
                }
            }
        }

        result
    }

    /// Reject a candidate wiring if it contains a cycle.
    fn check_acyclic(&self, wiring: &IndexMap<PortAddr, PortAddr>) -> EngineResult<()> {
        let mut in_degree: HashMap<ComponentId, usize> =
            self.components.keys().map(|id| (*id, 0)).collect();
        let mut downstream: HashMap<ComponentId, HashSet<ComponentId>> = HashMap::new();

        for (to, from) in wiring {
            if downstream
                .entry(from.component)
                .or_default()
                .insert(to.component)
            {
                *in_degree.entry(to.component).or_insert(0) += 1;
            }
        }

        let mut queue: VecDeque<_> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut visited = 0;

        while let Some(id) = queue.pop_front() {
            visited += 1;
            for next in downstream.get(&id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*next);
                    }
                }
            }
        }

        if visited == in_degree.len() {
            return Ok(());
        }

        let stuck = |id: &ComponentId| in_degree.get(id).copied().unwrap_or(0) > 0;
        let culprit = wiring
            .iter()
            .find(|(to, from)| stuck(&to.component) && stuck(&from.component))
            .or_else(|| wiring.iter().find(|(to, _)| stuck(&to.component)));

        match culprit {
            Some((to, from)) => Err(EngineError::CycleDetected {
                from: from.component,
                to: to.component,
            }),
            None => Ok(()),
        }
    }
}

impl<P> Default for DagEngine<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone + PartialEq> DependencyGraph for DagEngine<P> {
    type Component = Component<P>;

    fn add_component(&mut self, mut component: Component<P>) -> ComponentId {
        let name = self.unique_name(component.name());
        component.set_name(name);

        let id = component.id();
        debug!(component = ?id, name = component.name(), "component added");
        self.components.insert(id, component);
        id
    }

    fn remove_component(&mut self, id: ComponentId) -> bool {
        let Some(component) = self.components.shift_remove(&id) else {
            return false;
        };

        // Remove this component from its sources' dependent lists
        for (_, src) in component.input_sources() {
            if let Some(upstream) = self.components.get_mut(&src.component) {
                upstream.forget_dependent(id);
            }
        }

        // Unplug its dependents; their inputs changed
        let dependents: Vec<_> = component.dependents().collect();
        for dependent_id in &dependents {
            if let Some(dependent) = self.components.get_mut(dependent_id) {
                let ports: Vec<_> = dependent
                    .input_sources()
                    .filter(|(_, src)| src.component == id)
                    .map(|(port, _)| port)
                    .collect();
                for port in ports {
                    dependent.set_input(port, None);
                }
                dependent.mark_dirty();
            }
        }
        self.propagate_dirty(dependents);

        self.names.remove(component.name());
        debug!(component = ?id, name = component.name(), "component removed");
        true
    }

    fn clear_all_components(&mut self) {
        if !self.components.is_empty() {
            debug!(count = self.components.len(), "clearing all components");
        }
        self.components.clear();
        self.names.clear();
        self.next_suffix.clear();
    }

    fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    fn component_name(&self, id: ComponentId) -> Option<&str> {
        self.components.get(&id).map(Component::name)
    }

    fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component<P>> {
        self.components.get_mut(&id)
    }

    fn connect(&mut self, from: PortAddr, to: PortAddr) -> EngineResult<()> {
        self.validate_link(&Link::new(from, to))?;

        if from.component == to.component || self.reaches(to.component, from.component) {
            return Err(EngineError::CycleDetected {
                from: from.component,
                to: to.component,
            });
        }

        let current = self
            .components
            .get(&to.component)
            .and_then(|c| c.input_source(to.index));
        if current == Some(from) {
            return Ok(());
        }

        self.detach_input(to);
        if let Some(target) = self.components.get_mut(&to.component) {
            target.set_input(to.index, Some(from));
            target.mark_dirty();
        }
        if let Some(source) = self.components.get_mut(&from.component) {
            source.add_dependent(to.component);
        }
        self.propagate_dirty([to.component]);

        trace!(?from, ?to, "connected");
        Ok(())
    }

    fn disconnect(&mut self, from: PortAddr, to: PortAddr) -> EngineResult<()> {
        if !self.components.contains_key(&from.component) {
            return Err(EngineError::UnknownComponent(from.component));
        }
        let target = self
            .components
            .get(&to.component)
            .ok_or(EngineError::UnknownComponent(to.component))?;

        if target.input_source(to.index) != Some(from) {
            trace!(?from, ?to, "disconnect of absent link ignored");
            return Ok(());
        }

        self.detach_input(to);
        if let Some(target) = self.components.get_mut(&to.component) {
            target.mark_dirty();
        }
        self.propagate_dirty([to.component]);

        trace!(?from, ?to, "disconnected");
        Ok(())
    }

    fn rebuild_connections(&mut self, links: &[Link]) -> EngineResult<()> {
        // Later links win when two target the same input
        let mut wiring: IndexMap<PortAddr, PortAddr> = IndexMap::new();
        let mut skipped = 0;
        for link in links {
            if let Err(err) = self.validate_link(link) {
                warn!(from = ?link.from, to = ?link.to, %err, "invalid link left out of rebuild");
                skipped += 1;
                continue;
            }
            wiring.insert(link.to, link.from);
        }
        self.check_acyclic(&wiring)?;

        let mut new_inputs: HashMap<ComponentId, Vec<(usize, PortAddr)>> = HashMap::new();
        for (to, from) in &wiring {
            new_inputs
                .entry(to.component)
                .or_default()
                .push((to.index, *from));
        }

        let mut rewired = Vec::new();
        for (id, component) in self.components.iter_mut() {
            let mut inputs = new_inputs.remove(id).unwrap_or_default();
            inputs.sort_by_key(|(port, _)| *port);

            let previous: Vec<_> = component.input_sources().collect();
            if previous != inputs {
                component.mark_dirty();
                rewired.push(*id);
            }

            component.clear_inputs();
            component.clear_dependents();
            for (port, src) in inputs {
                component.set_input(port, Some(src));
            }
        }

        for (to, from) in &wiring {
            if let Some(source) = self.components.get_mut(&from.component) {
                source.add_dependent(to.component);
            }
        }

        debug!(
            links = wiring.len(),
            skipped,
            rewired = rewired.len(),
            "connections rebuilt"
        );
        self.propagate_dirty(rewired);
        Ok(())
    }

    fn mark_dirty(&mut self, id: ComponentId) {
        if let Some(component) = self.components.get_mut(&id) {
            component.mark_dirty();
            self.propagate_dirty([id]);
        }
    }

    fn update(&mut self) {
        let pending: Vec<ComponentId> = self
            .components
            .values()
            .filter(|c| !c.is_clean())
            .map(Component::id)
            .collect();

        let mut report = UpdateReport::default();
        if pending.is_empty() {
            self.last_report = report;
            trace!("update skipped, graph is clean");
            return;
        }

        let order = self.topological_sort(pending);
        let mut changed = HashSet::new();

        for id in order {
            let Some(component) = self.components.get(&id) else {
                continue;
            };

            let must_run = component.dirty_state() == DirtyState::Dirty
                || component.dependencies().any(|dep| changed.contains(&dep));
            if !must_run {
                if let Some(component) = self.components.get_mut(&id) {
                    component.mark_clean();
                }
                report.skipped += 1;
                continue;
            }

            let inputs: Vec<Option<P>> = (0..component.input_count())
                .map(|port| {
                    component
                        .input_source(port)
                        .and_then(|src| self.output(src))
                        .cloned()
                })
                .collect();

            let Some(component) = self.components.get_mut(&id) else {
                continue;
            };
            if component.execute(&inputs) {
                changed.insert(id);
            }
            report.computed += 1;

            if let Some(err) = component.error() {
                report.failed += 1;
                debug!(component = ?id, name = component.name(), error = %err, "component failed");
            }
        }

        debug!(
            computed = report.computed,
            skipped = report.skipped,
            failed = report.failed,
            "update finished"
        );
        self.last_report = report;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComputeError;
    use crate::props::Properties;
    use std::cell::Cell;
    use std::rc::Rc;

    fn constant(value: f64) -> Component<f64> {
        Component::from_fn("const", 0, 1, move |_, _| {
            Ok(vec![value])
        })
    }

    fn sum(runs: Rc<Cell<usize>>) -> Component<f64> {
        Component::from_fn("sum", 2, 1, move |inputs: &[Option<f64>], _| {
            runs.set(runs.get() + 1);
            Ok(vec![inputs.iter().flatten().sum()])
        })
    }

    fn clamp() -> Component<f64> {
        Component::from_fn("clamp", 1, 1, |inputs: &[Option<f64>], _| {
            Ok(vec![inputs[0].unwrap_or(0.0).min(1.0)])
        })
    }

    fn out(engine: &DagEngine<f64>, id: ComponentId) -> Option<f64> {
        engine.output(PortAddr::new(id, 0)).copied()
    }

    #[test]
    fn add_and_remove_components() {
        let mut engine = DagEngine::new();

        let id1 = engine.add_component(constant(1.0));
        let id2 = engine.add_component(constant(2.0));
        assert_eq!(engine.component_count(), 2);

        assert!(engine.remove_component(id1));
        assert!(!engine.remove_component(id1));
        assert_eq!(engine.component_count(), 1);
        assert!(!engine.contains(id1));
        assert!(engine.contains(id2));
    }

    #[test]
    fn names_are_made_unique() {
        let mut engine = DagEngine::new();

        let a = engine.add_component(constant(1.0));
        let b = engine.add_component(constant(2.0));
        let c = engine.add_component(constant(3.0));

        assert_eq!(engine.component_name(a), Some("const"));
        assert_eq!(engine.component_name(b), Some("const_1"));
        assert_eq!(engine.component_name(c), Some("const_2"));
    }

    #[test]
    fn names_skip_suffixes_already_taken() {
        let mut engine = DagEngine::new();

        let taken = engine.add_component(Component::from_fn("const_1", 0, 1, |_, _| Ok(vec![0.0])));
        let a = engine.add_component(constant(1.0));
        let b = engine.add_component(constant(2.0));
        assert_eq!(engine.component_name(taken), Some("const_1"));
        assert_eq!(engine.component_name(a), Some("const"));
        assert_eq!(engine.component_name(b), Some("const_2"));

        // A freed name can be handed out again
        engine.remove_component(a);
        let c = engine.add_component(constant(3.0));
        assert_eq!(engine.component_name(c), Some("const"));

        engine.clear_all_components();
        let d = engine.add_component(constant(4.0));
        assert_eq!(engine.component_name(d), Some("const"));
    }

    #[test]
    fn update_computes_in_dependency_order() {
        let mut engine = DagEngine::new();
        let runs = Rc::new(Cell::new(0));

        let a = engine.add_component(constant(2.0));
        let b = engine.add_component(constant(3.0));
        let s = engine.add_component(sum(runs.clone()));
        let c = engine.add_component(clamp());

        // Wire the downstream end first so insertion order is not topological
        engine.connect(PortAddr::new(s, 0), PortAddr::new(c, 0)).unwrap();
        engine.connect(PortAddr::new(a, 0), PortAddr::new(s, 0)).unwrap();
        engine.connect(PortAddr::new(b, 0), PortAddr::new(s, 1)).unwrap();

        engine.update();
        assert_eq!(out(&engine, s), Some(5.0));
        assert_eq!(out(&engine, c), Some(1.0));
        assert_eq!(runs.get(), 1);
        assert_eq!(engine.last_report().computed, 4);
    }

    #[test]
    fn update_on_clean_graph_is_noop() {
        let mut engine = DagEngine::new();
        let runs = Rc::new(Cell::new(0));
        engine.add_component(sum(runs.clone()));

        engine.update();
        engine.update();
        assert_eq!(runs.get(), 1);
        assert_eq!(engine.last_report(), UpdateReport::default());
    }

    #[test]
    fn maybe_dirty_skips_when_inputs_unchanged() {
        let mut engine = DagEngine::new();
        let runs = Rc::new(Cell::new(0));

        let a = engine.add_component(constant(2.0));
        let s = engine.add_component(sum(runs.clone()));
        engine.connect(PortAddr::new(a, 0), PortAddr::new(s, 0)).unwrap();
        engine.update();
        assert_eq!(runs.get(), 1);

        // Constant recomputes to the same value
        engine.mark_dirty(a);
        assert_eq!(
            engine.component(s).unwrap().dirty_state(),
            DirtyState::MaybeDirty
        );
        engine.update();
        assert_eq!(runs.get(), 1);
        assert_eq!(engine.last_report().skipped, 1);
        assert!(engine.component(s).unwrap().is_clean());
    }

    #[test]
    fn property_change_reaches_downstream() {
        let mut engine = DagEngine::new();
        let source = Component::from_fn("param", 0, 1, |_, props: &Properties| {
            Ok(vec![props.get("value").and_then(|v| v.as_float()).unwrap_or(0.0)])
        });
        let p = engine.add_component(source);
        let c = engine.add_component(clamp());
        engine.connect(PortAddr::new(p, 0), PortAddr::new(c, 0)).unwrap();
        engine.update();
        assert_eq!(out(&engine, c), Some(0.0));

        engine
            .component_mut(p)
            .unwrap()
            .props_mut()
            .insert("value".into(), 0.5.into());
        engine.mark_dirty(p);
        engine.update();
        assert_eq!(out(&engine, c), Some(0.5));
    }

    #[test]
    fn connect_rejects_cycles() {
        let mut engine = DagEngine::new();
        let a = engine.add_component(clamp());
        let b = engine.add_component(clamp());

        engine.connect(PortAddr::new(a, 0), PortAddr::new(b, 0)).unwrap();
        let err = engine
            .connect(PortAddr::new(b, 0), PortAddr::new(a, 0))
            .unwrap_err();
        assert_eq!(err, EngineError::CycleDetected { from: b, to: a });

        let err = engine
            .connect(PortAddr::new(a, 0), PortAddr::new(a, 0))
            .unwrap_err();
        assert!(matches!(err, EngineError::CycleDetected { .. }));
    }

    #[test]
    fn connect_validates_ports() {
        let mut engine = DagEngine::new();
        let a = engine.add_component(constant(1.0));
        let b = engine.add_component(clamp());

        let err = engine
            .connect(PortAddr::new(a, 1), PortAddr::new(b, 0))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::PortOutOfRange {
                component: a,
                port: 1,
                available: 1
            }
        );

        let ghost = ComponentId::new();
        let err = engine
            .connect(PortAddr::new(ghost, 0), PortAddr::new(b, 0))
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownComponent(ghost));
    }

    #[test]
    fn variadic_component_grows_inputs() {
        let mut engine = DagEngine::new();
        let runs = Rc::new(Cell::new(0));
        let s = engine.add_component(sum(runs).variadic());
        let consts: Vec<_> = (1..=4)
            .map(|v| engine.add_component(constant(v as f64)))
            .collect();

        for (port, c) in consts.iter().enumerate() {
            engine
                .connect(PortAddr::new(*c, 0), PortAddr::new(s, port))
                .unwrap();
        }
        engine.update();

        assert_eq!(engine.component(s).unwrap().input_count(), 4);
        assert_eq!(out(&engine, s), Some(10.0));
    }

    #[test]
    fn connecting_occupied_input_replaces_source() {
        let mut engine = DagEngine::new();
        let a = engine.add_component(constant(0.25));
        let b = engine.add_component(constant(0.75));
        let c = engine.add_component(clamp());

        engine.connect(PortAddr::new(a, 0), PortAddr::new(c, 0)).unwrap();
        engine.connect(PortAddr::new(b, 0), PortAddr::new(c, 0)).unwrap();
        engine.update();

        assert_eq!(engine.links().len(), 1);
        assert_eq!(engine.component(a).unwrap().dependents().count(), 0);
        assert_eq!(out(&engine, c), Some(0.75));
    }

    #[test]
    fn disconnect_unplugs_and_dirties() {
        let mut engine = DagEngine::new();
        let a = engine.add_component(constant(0.5));
        let c = engine.add_component(clamp());
        engine.connect(PortAddr::new(a, 0), PortAddr::new(c, 0)).unwrap();
        engine.update();

        // Disconnecting a link that does not exist is harmless
        engine
            .disconnect(PortAddr::new(c, 0), PortAddr::new(a, 0))
            .unwrap();

        engine
            .disconnect(PortAddr::new(a, 0), PortAddr::new(c, 0))
            .unwrap();
        assert_eq!(engine.component(c).unwrap().dirty_state(), DirtyState::Dirty);
        engine.update();
        assert_eq!(out(&engine, c), Some(0.0));
        assert!(engine.links().is_empty());
    }

    #[test]
    fn removing_a_component_unplugs_dependents() {
        let mut engine = DagEngine::new();
        let a = engine.add_component(constant(0.5));
        let c = engine.add_component(clamp());
        engine.connect(PortAddr::new(a, 0), PortAddr::new(c, 0)).unwrap();
        engine.update();

        engine.remove_component(a);
        assert!(engine.links().is_empty());
        assert_eq!(engine.component(c).unwrap().dirty_state(), DirtyState::Dirty);

        engine.update();
        assert_eq!(out(&engine, c), Some(0.0));
    }

    #[test]
    fn rebuild_replaces_all_links() {
        let mut engine = DagEngine::new();
        let a = engine.add_component(constant(0.1));
        let b = engine.add_component(clamp());
        let c = engine.add_component(constant(0.2));
        let d = engine.add_component(clamp());

        engine.connect(PortAddr::new(a, 0), PortAddr::new(b, 0)).unwrap();
        engine.connect(PortAddr::new(c, 0), PortAddr::new(d, 0)).unwrap();
        engine.update();

        let keep = Link::new(PortAddr::new(a, 0), PortAddr::new(b, 0));
        engine.rebuild_connections(&[keep]).unwrap();

        assert_eq!(engine.links(), vec![keep]);
        assert_eq!(engine.component(c).unwrap().dependents().count(), 0);
        // b kept its wiring, d lost its source
        assert!(engine.component(b).unwrap().is_clean());
        assert_eq!(engine.component(d).unwrap().dirty_state(), DirtyState::Dirty);
    }

    #[test]
    fn rebuild_leaves_out_invalid_links() {
        let mut engine = DagEngine::new();
        let a = engine.add_component(constant(0.1));
        let b = engine.add_component(clamp());
        let c = engine.add_component(constant(0.2));
        let d = engine.add_component(clamp());

        engine.connect(PortAddr::new(a, 0), PortAddr::new(b, 0)).unwrap();
        engine.connect(PortAddr::new(c, 0), PortAddr::new(d, 0)).unwrap();

        // b has a single input, and the last link names a removed component
        let keep = Link::new(PortAddr::new(a, 0), PortAddr::new(b, 0));
        engine
            .rebuild_connections(&[
                keep,
                Link::new(PortAddr::new(a, 0), PortAddr::new(b, 1)),
                Link::new(PortAddr::new(ComponentId::new(), 0), PortAddr::new(d, 0)),
            ])
            .unwrap();

        assert_eq!(engine.links(), vec![keep]);
        assert_eq!(engine.component(c).unwrap().dependents().count(), 0);
    }

    #[test]
    fn rebuild_with_cycle_keeps_previous_links() {
        let mut engine = DagEngine::new();
        let a = engine.add_component(clamp());
        let b = engine.add_component(clamp());
        engine.connect(PortAddr::new(a, 0), PortAddr::new(b, 0)).unwrap();
        let before = engine.links();

        let err = engine
            .rebuild_connections(&[
                Link::new(PortAddr::new(a, 0), PortAddr::new(b, 0)),
                Link::new(PortAddr::new(b, 0), PortAddr::new(a, 0)),
            ])
            .unwrap_err();

        assert!(matches!(err, EngineError::CycleDetected { .. }));
        assert_eq!(engine.links(), before);
    }

    #[test]
    fn failed_component_feeds_none_downstream() {
        let mut engine = DagEngine::new();
        let f = engine.add_component(Component::from_fn(
            "fail",
            0,
            1,
            |_, _| Err(ComputeError::new("no data")),
        ));
        let c = engine.add_component(clamp());
        engine.connect(PortAddr::new(f, 0), PortAddr::new(c, 0)).unwrap();

        engine.update();
        assert_eq!(engine.last_report().failed, 1);
        assert!(engine.component(f).unwrap().error().is_some());
        assert_eq!(out(&engine, c), Some(0.0));
    }
}
