//! Circuit assembled from a parsed netlist.

use std::collections::HashSet;

use super::types::{ComponentIndex, NodeId};
use crate::components::{Component, ComponentKind};
use crate::error::{Result, TranspiceError};
use crate::netlist::{Netlist, TranDirective};

/// A complete circuit ready for simulation.
///
/// Owns the component arena; everything downstream refers to components by
/// [`ComponentIndex`].
#[derive(Debug, Clone)]
pub struct Schematic {
    /// All components in netlist order
    components: Vec<Component>,

    /// Analysis window, if the netlist had one
    tran: Option<TranDirective>,

    /// Highest node number used (ground excluded)
    node_count: usize,

    /// Component index of each voltage source, in netlist order
    voltage_sources: Vec<ComponentIndex>,
}

impl Schematic {
    /// Build a schematic from a parsed netlist.
    pub fn from_netlist(netlist: Netlist) -> Result<Self> {
        let mut seen: HashSet<(ComponentKind, u32)> = HashSet::new();
        let mut components = Vec::with_capacity(netlist.entries.len());
        let mut voltage_sources = Vec::new();
        let mut node_count = 0;

        for entry in netlist.entries {
            let component = entry.component;
            if !seen.insert((component.kind(), component.designator())) {
                return Err(TranspiceError::DuplicateDesignator {
                    designator: component.name(),
                    line: entry.line,
                });
            }

            node_count = component
                .nodes()
                .iter()
                .map(|n| n.0)
                .fold(node_count, usize::max);

            if let Component::VoltageSource(_) = component {
                voltage_sources.push(ComponentIndex(components.len()));
            }
            components.push(component);
        }

        tracing::debug!(
            components = components.len(),
            nodes = node_count,
            voltage_sources = voltage_sources.len(),
            "assembled schematic"
        );

        Ok(Self {
            components,
            tran: netlist.tran,
            node_count,
            voltage_sources,
        })
    }

    /// All components, indexable by [`ComponentIndex`].
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Get a component by index.
    pub fn component(&self, index: ComponentIndex) -> Option<&Component> {
        self.components.get(index.0)
    }

    /// Iterate components with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentIndex, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(i, c)| (ComponentIndex(i), c))
    }

    /// The `.tran` directive.
    pub fn tran(&self) -> Option<&TranDirective> {
        self.tran.as_ref()
    }

    /// Number of non-ground nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of voltage sources (extra MNA unknowns).
    pub fn voltage_source_count(&self) -> usize {
        self.voltage_sources.len()
    }

    /// Unknowns in the MNA system.
    pub fn dimension(&self) -> usize {
        self.node_count + self.voltage_sources.len()
    }

    /// MNA row of a voltage source's branch current.
    pub fn branch_row(&self, index: ComponentIndex) -> Option<usize> {
        self.voltage_sources
            .iter()
            .position(|&i| i == index)
            .map(|k| self.node_count + k)
    }

    /// Check whether any component needs Newton-Raphson iteration.
    pub fn is_nonlinear(&self) -> bool {
        self.components.iter().any(Component::is_nonlinear)
    }

    /// Check if a node number is in range for this schematic.
    pub fn has_node(&self, node: NodeId) -> bool {
        node.0 <= self.node_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::parse;

    fn schematic(input: &str) -> Result<Schematic> {
        Schematic::from_netlist(parse(input)?)
    }

    #[test]
    fn test_counts() {
        let s = schematic("V1 N001 0 2\nR1 N001 N002 1\nR2 N002 0 1\nV2 N005 0 1\n.tran 1").unwrap();
        assert_eq!(s.node_count(), 5);
        assert_eq!(s.voltage_source_count(), 2);
        assert_eq!(s.dimension(), 7);
        assert_eq!(s.branch_row(ComponentIndex(0)), Some(5));
        assert_eq!(s.branch_row(ComponentIndex(3)), Some(6));
        assert_eq!(s.branch_row(ComponentIndex(1)), None);
        assert!(s.tran().is_some());
        assert!(!s.is_nonlinear());
    }

    #[test]
    fn test_duplicate_designator() {
        let err = schematic("R1 1 0 1k\nC1 1 0 1u\nr1 1 2 2k").unwrap_err();
        match err {
            TranspiceError::DuplicateDesignator { designator, line } => {
                assert_eq!(designator, "R1");
                assert_eq!(line, 3);
            }
            other => panic!("expected DuplicateDesignator, got {:?}", other),
        }
    }

    #[test]
    fn test_component_lookup() {
        let s = schematic("D1 1 0 D\nR1 1 0 1k").unwrap();
        assert!(s.is_nonlinear());
        assert_eq!(s.component(ComponentIndex(1)).map(Component::name), Some("R1".to_string()));
        assert!(s.component(ComponentIndex(2)).is_none());
        assert_eq!(s.iter().count(), 2);
        assert!(s.has_node(NodeId(1)));
        assert!(!s.has_node(NodeId(2)));
    }
}
