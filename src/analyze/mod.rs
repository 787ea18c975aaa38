//! Cross-file semantic analyzer.
//!
//! The analyzer drives the whole front half of the compile through the
//! import cache in two phases. Phase one discovers files breadth-first
//! from the root: each registration spawns a reader thread (file I/O
//! overlaps), and the driver thread joins reads, tokenizes, parses,
//! publishes the parsed scope on its cell, and registers the scope's
//! imports in document order. Phase two validates every discovered
//! scope in registration order and settles each cell with its single
//! result. Registration order is deterministic, which keeps generator
//! output byte-stable across runs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use log::debug;

use crate::cache::{ImportCache, ScopeCell};
use crate::diag::{CompileError, ImportOrigin, Span};
use crate::lexer::Lexer;
use crate::parse::Parser;
use crate::reader::{ReadError, SourceReader};
use crate::tree::{NodeId, NodeKind, Scope, StateKind, UseTarget, normalize_event};

mod errors;
pub mod resolve;

pub use errors::{SEK, SemanticError, SemanticErrorKind};

type ReadHandle = JoinHandle<Result<(PathBuf, String), ReadError>>;

pub struct Analyzer<'a> {
    reader: Arc<dyn SourceReader>,
    cache: &'a ImportCache,
}

impl<'a> Analyzer<'a> {
    pub fn new(reader: Arc<dyn SourceReader>, cache: &'a ImportCache) -> Self {
        Analyzer { reader, cache }
    }

    /// Compiles the front half of the pipeline from the root key and
    /// returns every analyzed scope in registration order, or the first
    /// error in that order.
    pub fn run(&self, root: &str) -> Result<Vec<(String, Arc<Scope>)>, Arc<CompileError>> {
        self.discover(root);
        self.validate_all();
        self.collect()
    }

    fn spawn_read(&self, key: &str, origin: Option<PathBuf>) -> ReadHandle {
        let reader = self.reader.clone();
        let logical = key.to_string();
        std::thread::spawn(move || reader.read(&logical, origin.as_deref()))
    }

    /// Phase one: read, tokenize, and parse every reachable file,
    /// publishing parsed scopes and registering imports as they are
    /// found. Cells whose file fails to read or parse are settled here.
    fn discover(&self, root: &str) {
        let mut queue: VecDeque<(String, Arc<ScopeCell>)> = VecDeque::new();
        let mut reads: HashMap<String, ReadHandle> = HashMap::new();
        let mut origins: HashMap<String, ImportOrigin> = HashMap::new();

        let (cell, newly) = self.cache.register(root);
        if newly {
            reads.insert(root.to_string(), self.spawn_read(root, None));
            queue.push_back((root.to_string(), cell));
        }

        while let Some((key, cell)) = queue.pop_front() {
            let Some(read) = reads.remove(&key) else {
                continue;
            };
            let (path, source) = match read.join().expect("reader thread panicked") {
                Ok(read) => read,
                Err(error) => {
                    cell.finish(Err(Arc::new(CompileError::Read {
                        from: origins.remove(&key),
                        error,
                    })));
                    continue;
                }
            };

            let tokens = match Lexer::new(&source).tokenize() {
                Ok(tokens) => tokens,
                Err(error) => {
                    cell.finish(Err(Arc::new(CompileError::Lex { path, error })));
                    continue;
                }
            };
            let scope = match Parser::new(&tokens).parse(&path) {
                Ok(scope) => scope,
                Err(error) => {
                    cell.finish(Err(Arc::new(CompileError::Parse { path, error })));
                    continue;
                }
            };

            debug!("parsed {key} ({} machines)", scope.machines.len());
            let scope = Arc::new(scope);
            cell.set_parsed(scope.clone());

            // Machine-ID uniqueness runs before import registration; a
            // duplicate stops this scope from pulling in its imports.
            if let Err(error) = check_machine_uniqueness(&scope) {
                cell.finish(Err(Arc::new(CompileError::Semantic { path, error })));
                continue;
            }

            for import in &scope.imports {
                let (dep_cell, newly) = self.cache.register(&import.file);
                if newly {
                    origins.insert(
                        import.file.clone(),
                        ImportOrigin {
                            path: scope.file.clone(),
                            span: import.span,
                        },
                    );
                    reads.insert(
                        import.file.clone(),
                        self.spawn_read(&import.file, Some(scope.file.clone())),
                    );
                    queue.push_back((import.file.clone(), dep_cell));
                }
            }
        }
    }

    /// Phase two: validate parsed scopes in registration order. Every
    /// machine list is published by now, so `@use` lookups never block.
    fn validate_all(&self) {
        for (key, cell) in self.cache.entries() {
            if cell.is_finished() {
                continue;
            }
            let Some(parsed) = cell.try_parsed() else {
                continue;
            };
            let result = self
                .validate_scope(&parsed, &key)
                .map(Arc::new)
                .map_err(Arc::new);
            cell.finish(result);
        }
    }

    fn collect(&self) -> Result<Vec<(String, Arc<Scope>)>, Arc<CompileError>> {
        let mut scopes = Vec::new();
        for (key, cell) in self.cache.entries() {
            match cell.result() {
                Ok(scope) => scopes.push((key, scope)),
                Err(error) => return Err(error),
            }
        }
        Ok(scopes)
    }

    /// Validates one scope on a fresh clone of its parsed tree,
    /// returning the clone with derived fields filled in, or the
    /// scope's single error.
    fn validate_scope(&self, parsed: &Scope, key: &str) -> Result<Scope, CompileError> {
        let mut scope = parsed.clone();

        for import in &mut scope.imports {
            if let Some(cell) = self.cache.get(&import.file)
                && let Some(dep) = cell.try_parsed()
            {
                import.resolved_file = Some(dep.file.clone());
            }
        }

        let path = scope.file.clone();
        for machine in scope.machines.clone() {
            if let Err(error) = self.validate_node(&mut scope, machine, machine, key) {
                return Err(CompileError::Semantic { path, error });
            }
        }
        Ok(scope)
    }

    /// Per-node checks, applied identically at machine and state level,
    /// then recursively to children in document order.
    fn validate_node(
        &self,
        scope: &mut Scope,
        node_id: NodeId,
        machine: NodeId,
        key: &str,
    ) -> Result<(), SemanticError> {
        let children = scope.node(node_id).states.clone();

        // State-ID uniqueness among siblings.
        let mut seen = HashSet::new();
        for &child in &children {
            let child_node = scope.node(child);
            if !seen.insert(child_node.id.clone()) {
                return Err(SEK::DuplicateState(child_node.id.clone()).at(child_node.span));
            }
        }

        // Transition and protocol uniqueness by normalized event.
        {
            let node = scope.node(node_id);
            let mut seen = HashSet::new();
            for transition in &node.transitions {
                let normalized = normalize_event(&transition.event);
                if !seen.insert(normalized.clone()) {
                    return Err(SEK::DuplicateTransition(normalized).at(transition.span));
                }
            }
            let mut seen = HashSet::new();
            for protocol in &node.event_protocols {
                let normalized = normalize_event(&protocol.event);
                if !seen.insert(normalized.clone()) {
                    return Err(SEK::DuplicateEventProtocol(normalized).at(protocol.span));
                }
            }
        }

        // Transition-target resolution.
        let targets: Vec<(String, Span)> = scope
            .node(node_id)
            .transitions
            .iter()
            .map(|t| (t.target.clone(), t.span))
            .collect();
        let mut found = Vec::with_capacity(targets.len());
        for (target, span) in &targets {
            match resolve::resolve_target(scope, machine, node_id, target) {
                Some(state) => found.push(state),
                None => return Err(SEK::UnresolvedTarget(target.clone()).at(*span)),
            }
        }
        for (transition, state) in scope
            .node_mut(node_id)
            .transitions
            .iter_mut()
            .zip(found)
        {
            transition.resolved = Some(state);
        }

        // At most one initial child; default to the first when none.
        let mut has_initial = false;
        for &child in &children {
            if scope.node(child).initial {
                if has_initial {
                    let parent_id = scope.node(node_id).id.clone();
                    return Err(SEK::MultipleInitial(parent_id).at(scope.node(child).span));
                }
                has_initial = true;
            }
        }
        if !has_initial && let Some(&first) = children.first() {
            scope.node_mut(first).initial = true;
        }

        // State-kind normalization.
        let node = scope.node(node_id);
        match node.kind {
            NodeKind::State(StateKind::Atomic) if !node.states.is_empty() => {
                scope.node_mut(node_id).kind = NodeKind::State(StateKind::Compound);
            }
            NodeKind::State(StateKind::Transient) if !node.states.is_empty() => {
                return Err(SEK::TransientWithChildren(node.id.clone()).at(node.span));
            }
            _ => {}
        }

        // `@use` resolution across the transitive import closure.
        if let Some(use_directive) = scope.node(node_id).use_directive.clone() {
            let target = self
                .resolve_use(scope, key, &use_directive.machine_id)
                .ok_or_else(|| {
                    SEK::UnresolvedUse(use_directive.machine_id.clone()).at(use_directive.span)
                })?;
            if let Some(slot) = scope.node_mut(node_id).use_directive.as_mut() {
                slot.resolved = Some(target);
            }
        }

        for child in children {
            self.validate_node(scope, child, machine, key)?;
        }
        Ok(())
    }

    /// Finds `machine_id` in this scope or in any transitively imported
    /// scope, breadth-first over parsed machine lists in import
    /// document order. Cycle-safe: each key is visited once.
    fn resolve_use(&self, scope: &Scope, key: &str, machine_id: &str) -> Option<UseTarget> {
        if scope.machine_ids().any(|id| id == machine_id) {
            return Some(UseTarget::Local);
        }

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(key.to_string());
        let mut queue: VecDeque<String> = scope.imports.iter().map(|i| i.file.clone()).collect();

        while let Some(dep_key) = queue.pop_front() {
            if !seen.insert(dep_key.clone()) {
                continue;
            }
            let Some(cell) = self.cache.get(&dep_key) else {
                continue;
            };
            let Some(dep) = cell.try_parsed() else {
                continue;
            };
            if dep.machine_ids().any(|id| id == machine_id) {
                return Some(UseTarget::Imported(dep_key));
            }
            queue.extend(dep.imports.iter().map(|i| i.file.clone()));
        }
        None
    }
}

fn check_machine_uniqueness(scope: &Scope) -> Result<(), SemanticError> {
    let mut seen = HashSet::new();
    for &machine in &scope.machines {
        let node = scope.node(machine);
        if !seen.insert(node.id.clone()) {
            return Err(SEK::DuplicateMachine(node.id.clone()).at(node.span));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/t_analyze.rs"]
mod tests;
