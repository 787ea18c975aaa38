//! Glue-code backend for the external xstate interpreter.
//!
//! Emits a JavaScript module exporting one machine config per analyzed
//! machine. With callbacks enabled, transitions reference externally
//! provided guard/action functions by name; `disableCallbacks` reduces
//! each transition to its bare target.

use serde_json::{Map, Value};

use super::{AnalyzedScopes, GenerateOptions, Generator};
use crate::tree::{NodeId, NodeKind, Scope, StateKind, Transition, normalize_event};

pub struct XstateGenerator;

impl Generator for XstateGenerator {
    fn generate(&self, scopes: &AnalyzedScopes, opts: &GenerateOptions) -> String {
        let mut out = String::new();
        out.push_str("import { Machine } from 'xstate'\n");
        if !opts.disable_callbacks {
            out.push_str("import { actions, guards } from './callbacks'\n");
        }
        out.push_str("\nexport const machines = {\n");

        for (key, scope) in scopes {
            out.push_str(&format!("  {}: {{\n", Value::String(key.clone())));
            for &machine in &scope.machines {
                let id = Value::String(scope.node(machine).id.clone());
                let config = machine_config(scope, machine, opts);
                if opts.disable_callbacks {
                    out.push_str(&format!("    {id}: Machine({config}),\n"));
                } else {
                    out.push_str(&format!("    {id}: Machine({config}, {{ guards, actions }}),\n"));
                }
            }
            out.push_str("  },\n");
        }

        out.push_str("}\n");
        out
    }
}

fn machine_config(scope: &Scope, machine: NodeId, opts: &GenerateOptions) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "id".to_string(),
        Value::String(scope.node(machine).id.clone()),
    );
    state_config_into(scope, machine, opts, &mut obj);
    Value::Object(obj)
}

fn state_config_into(
    scope: &Scope,
    id: NodeId,
    opts: &GenerateOptions,
    obj: &mut Map<String, Value>,
) {
    let node = scope.node(id);

    match node.kind {
        NodeKind::State(StateKind::Parallel) => {
            obj.insert("type".to_string(), Value::String("parallel".to_string()));
        }
        NodeKind::State(StateKind::Final) => {
            obj.insert("type".to_string(), Value::String("final".to_string()));
        }
        _ => {}
    }

    if let Some(&initial) = node.states.iter().find(|&&state| scope.node(state).initial) {
        obj.insert(
            "initial".to_string(),
            Value::String(scope.node(initial).id.clone()),
        );
    }

    if !node.transitions.is_empty() {
        let mut on = Map::new();
        for transition in &node.transitions {
            on.insert(
                normalize_event(&transition.event),
                transition_config(scope, transition, opts),
            );
        }
        obj.insert("on".to_string(), Value::Object(on));
    }

    if !node.states.is_empty() {
        let mut states = Map::new();
        for &child in &node.states {
            let mut child_obj = Map::new();
            state_config_into(scope, child, opts, &mut child_obj);
            states.insert(scope.node(child).id.clone(), Value::Object(child_obj));
        }
        obj.insert("states".to_string(), Value::Object(states));
    }
}

fn transition_config(scope: &Scope, transition: &Transition, opts: &GenerateOptions) -> Value {
    let target = transition
        .resolved
        .map(|state| scope.node(state).id.clone())
        .unwrap_or_else(|| transition.target.clone());

    if opts.disable_callbacks {
        return Value::String(target);
    }

    let mut obj = Map::new();
    obj.insert("target".to_string(), Value::String(target));
    if let Some(guard) = &transition.guard {
        obj.insert("cond".to_string(), Value::String(guard.clone()));
    }
    obj.insert(
        "actions".to_string(),
        Value::Array(vec![Value::String(normalize_event(&transition.event))]),
    );
    Value::Object(obj)
}
