//! Statechart syntax tree.
//!
//! One [`Scope`] per source file. All machines and states of a scope live
//! in a single arena and address each other by [`NodeId`]; parent links
//! and resolved transition targets are indices, never owning references.

use std::path::PathBuf;

use crate::diag::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone)]
pub struct Scope {
    /// Absolute path of the file this scope was parsed from.
    pub file: PathBuf,
    pub imports: Vec<Import>,
    /// Top-level machines, in document order.
    pub machines: Vec<NodeId>,
    nodes: Vec<Node>,
}

impl Scope {
    pub fn new(file: PathBuf) -> Self {
        Scope {
            file,
            imports: Vec::new(),
            machines: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn machine_ids(&self) -> impl Iterator<Item = &str> {
        self.machines.iter().map(|&m| self.node(m).id.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Import {
    /// The path as written in the `@include`.
    pub file: String,
    /// Absolute path of the file that satisfied the import; set by the
    /// analyzer.
    pub resolved_file: Option<PathBuf>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Machine,
    State(StateKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Atomic,
    Compound,
    Parallel,
    Transient,
    Final,
}

impl StateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StateKind::Atomic => "atomic",
            StateKind::Compound => "compound",
            StateKind::Parallel => "parallel",
            StateKind::Transient => "transient",
            StateKind::Final => "final",
        }
    }
}

/// A machine or state. Machines are root nodes (`parent == None`) and
/// never carry the `initial` flag.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Child states, in document order.
    pub states: Vec<NodeId>,
    pub transitions: Vec<Transition>,
    pub event_protocols: Vec<EventProtocol>,
    pub use_directive: Option<UseDirective>,
    pub initial: bool,
    pub span: Span,
}

impl Node {
    pub fn new(id: String, kind: NodeKind, parent: Option<NodeId>, span: Span) -> Self {
        Node {
            id,
            kind,
            parent,
            states: Vec::new(),
            transitions: Vec::new(),
            event_protocols: Vec::new(),
            use_directive: None,
            initial: false,
            span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transition {
    /// Comma list of event names, as written.
    pub event: String,
    /// Dot-separated target path, as written.
    pub target: String,
    /// Opaque guard/action annotation text.
    pub guard: Option<String>,
    /// Concrete target state; set by the analyzer.
    pub resolved: Option<NodeId>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EventProtocol {
    /// Comma list of event names, as written.
    pub event: String,
    /// Opaque payload descriptor.
    pub payload: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UseDirective {
    pub machine_id: String,
    /// Where the machine was found; set by the analyzer.
    pub resolved: Option<UseTarget>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseTarget {
    /// A machine in the same scope.
    Local,
    /// A machine in the scope cached under this logical path.
    Imported(String),
}

/// Canonical form of a comma-list event: split on `,`, trim each part,
/// sort, rejoin. The only equality rule for transitions and event
/// protocols, shared by the analyzer and the JSON backend.
pub fn normalize_event(event: &str) -> String {
    let mut parts: Vec<&str> = event.split(',').map(str::trim).collect();
    parts.sort_unstable();
    parts.join(",")
}

#[cfg(test)]
#[path = "tests/t_tree.rs"]
mod tests;
