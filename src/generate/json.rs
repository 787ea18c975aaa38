//! Canonical JSON backend: a structural, ordered serialization of every
//! analyzed scope. Byte-stable for equal inputs — object keys follow
//! cache registration order and document order throughout.

use serde_json::{Map, Value};

use super::{AnalyzedScopes, GenerateOptions, Generator};
use crate::tree::{
    EventProtocol, Import, NodeId, NodeKind, Scope, Transition, UseDirective, UseTarget,
    normalize_event,
};

pub struct JsonGenerator;

impl Generator for JsonGenerator {
    fn generate(&self, scopes: &AnalyzedScopes, _opts: &GenerateOptions) -> String {
        let mut root = Map::new();
        for (key, scope) in scopes {
            root.insert(key.clone(), scope_value(scope));
        }
        Value::Object(root).to_string()
    }
}

fn scope_value(scope: &Scope) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "file".to_string(),
        Value::String(scope.file.display().to_string()),
    );
    obj.insert(
        "imports".to_string(),
        Value::Array(scope.imports.iter().map(import_value).collect()),
    );
    obj.insert(
        "machines".to_string(),
        Value::Array(
            scope
                .machines
                .iter()
                .map(|&machine| node_value(scope, machine))
                .collect(),
        ),
    );
    Value::Object(obj)
}

fn import_value(import: &Import) -> Value {
    let mut obj = Map::new();
    obj.insert("file".to_string(), Value::String(import.file.clone()));
    obj.insert(
        "resolvedFile".to_string(),
        match &import.resolved_file {
            Some(path) => Value::String(path.display().to_string()),
            None => Value::Null,
        },
    );
    Value::Object(obj)
}

fn node_value(scope: &Scope, id: NodeId) -> Value {
    let node = scope.node(id);
    let mut obj = Map::new();
    obj.insert("id".to_string(), Value::String(node.id.clone()));
    if let NodeKind::State(kind) = node.kind {
        obj.insert("kind".to_string(), Value::String(kind.as_str().to_string()));
        obj.insert("initial".to_string(), Value::Bool(node.initial));
    }
    if let Some(use_directive) = &node.use_directive {
        obj.insert("use".to_string(), use_value(use_directive));
    }
    obj.insert(
        "transitions".to_string(),
        Value::Array(node.transitions.iter().map(transition_value).collect()),
    );
    obj.insert(
        "eventProtocols".to_string(),
        Value::Array(node.event_protocols.iter().map(protocol_value).collect()),
    );
    obj.insert(
        "states".to_string(),
        Value::Array(
            node.states
                .iter()
                .map(|&state| node_value(scope, state))
                .collect(),
        ),
    );
    Value::Object(obj)
}

fn transition_value(transition: &Transition) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "event".to_string(),
        Value::String(normalize_event(&transition.event)),
    );
    obj.insert(
        "target".to_string(),
        Value::String(transition.target.clone()),
    );
    if let Some(guard) = &transition.guard {
        obj.insert("guard".to_string(), Value::String(guard.clone()));
    }
    Value::Object(obj)
}

fn protocol_value(protocol: &EventProtocol) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "event".to_string(),
        Value::String(normalize_event(&protocol.event)),
    );
    if let Some(payload) = &protocol.payload {
        obj.insert("payload".to_string(), Value::String(payload.clone()));
    }
    Value::Object(obj)
}

fn use_value(use_directive: &UseDirective) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "machine".to_string(),
        Value::String(use_directive.machine_id.clone()),
    );
    if let Some(UseTarget::Imported(key)) = &use_directive.resolved {
        obj.insert("from".to_string(), Value::String(key.clone()));
    }
    Value::Object(obj)
}
