use super::*;

use indoc::indoc;

use crate::lexer::Lexer;

fn parse_source(source: &str) -> Result<Scope, ParseError> {
    let tokens = Lexer::new(source).tokenize().expect("tokenize failed");
    Parser::new(&tokens).parse(Path::new("app.state"))
}

fn parse_ok(source: &str) -> Scope {
    parse_source(source).expect("parse failed")
}

#[test]
fn test_parse_empty_file_is_empty_scope() {
    let scope = parse_ok("");
    assert!(scope.imports.is_empty());
    assert!(scope.machines.is_empty());
}

#[test]
fn test_parse_imports_only() {
    let scope = parse_ok(indoc! {r#"
        @include "./a.state"
        @include "./b.state"
    "#});
    assert_eq!(scope.imports.len(), 2);
    assert_eq!(scope.imports[0].file, "./a.state");
    assert_eq!(scope.imports[1].file, "./b.state");
    assert!(scope.imports[0].resolved_file.is_none());
    assert!(scope.machines.is_empty());
}

#[test]
fn test_parse_explicit_machine() {
    let scope = parse_ok(indoc! {"
        @machine App
          Home*
          About
    "});
    assert_eq!(scope.machines.len(), 1);
    let machine = scope.node(scope.machines[0]);
    assert_eq!(machine.id, "App");
    assert_eq!(machine.kind, NodeKind::Machine);
    assert_eq!(machine.states.len(), 2);

    let home = scope.node(machine.states[0]);
    assert_eq!(home.id, "Home");
    assert!(home.initial);
    assert_eq!(home.kind, NodeKind::State(StateKind::Atomic));
}

#[test]
fn test_parse_implicit_machine_takes_file_stem() {
    let scope = parse_ok("Home*\nSeven\n");
    assert_eq!(scope.machines.len(), 1);
    let machine = scope.node(scope.machines[0]);
    assert_eq!(machine.id, "app");
    assert_eq!(machine.states.len(), 2);
}

#[test]
fn test_parse_state_markers() {
    let scope = parse_ok(indoc! {"
        Idle*
        Gate?
        Done!
        Split&
    "});
    let machine = scope.node(scope.machines[0]);
    let kinds: Vec<_> = machine
        .states
        .iter()
        .map(|&state| (scope.node(state).kind, scope.node(state).initial))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (NodeKind::State(StateKind::Atomic), true),
            (NodeKind::State(StateKind::Transient), false),
            (NodeKind::State(StateKind::Final), false),
            (NodeKind::State(StateKind::Parallel), false),
        ]
    );
}

#[test]
fn test_parse_transition() {
    let scope = parse_ok(indoc! {"
        Home*
          about, home -> About
        About
    "});
    let machine = scope.node(scope.machines[0]);
    let home = scope.node(machine.states[0]);
    assert_eq!(home.transitions.len(), 1);
    assert_eq!(home.transitions[0].event, "about,home");
    assert_eq!(home.transitions[0].target, "About");
    assert!(home.transitions[0].guard.is_none());
    assert!(home.transitions[0].resolved.is_none());
}

#[test]
fn test_parse_transition_with_guard() {
    let scope = parse_ok(indoc! {"
        Home*
          submit -> Done : form is valid
        Done!
    "});
    let machine = scope.node(scope.machines[0]);
    let home = scope.node(machine.states[0]);
    assert_eq!(home.transitions[0].guard.as_deref(), Some("form is valid"));
}

#[test]
fn test_parse_wildcard_target() {
    let scope = parse_ok(indoc! {"
        Home*
          jump -> *.Modal
        Other
    "});
    let machine = scope.node(scope.machines[0]);
    let home = scope.node(machine.states[0]);
    assert_eq!(home.transitions[0].target, "*.Modal");
}

#[test]
fn test_parse_event_protocol() {
    let scope = parse_ok(indoc! {r#"
        Form*
          submit, cancel: "FormPayload"
          reset:
    "#});
    let machine = scope.node(scope.machines[0]);
    let form = scope.node(machine.states[0]);
    assert_eq!(form.event_protocols.len(), 2);
    assert_eq!(form.event_protocols[0].event, "submit,cancel");
    assert_eq!(form.event_protocols[0].payload.as_deref(), Some("FormPayload"));
    assert_eq!(form.event_protocols[1].event, "reset");
    assert!(form.event_protocols[1].payload.is_none());
}

#[test]
fn test_parse_use_directive() {
    let scope = parse_ok(indoc! {"
        Shell*
          @use Modal
    "});
    let machine = scope.node(scope.machines[0]);
    let shell = scope.node(machine.states[0]);
    let use_directive = shell.use_directive.as_ref().expect("missing @use");
    assert_eq!(use_directive.machine_id, "Modal");
    assert!(use_directive.resolved.is_none());
}

#[test]
fn test_parse_duplicate_use_rejected() {
    let result = parse_source(indoc! {"
        Shell*
          @use A
          @use B
    "});
    assert!(matches!(result, Err(ParseError::DuplicateUseDirective(_))));
}

#[test]
fn test_parse_nested_states_preserve_order() {
    let scope = parse_ok(indoc! {"
        A*
          B
            C
          D
        E
    "});
    let machine = scope.node(scope.machines[0]);
    let a = scope.node(machine.states[0]);
    assert_eq!(a.id, "A");
    let b = scope.node(a.states[0]);
    assert_eq!(b.id, "B");
    assert_eq!(scope.node(b.states[0]).id, "C");
    assert_eq!(scope.node(a.states[1]).id, "D");
    assert_eq!(scope.node(machine.states[1]).id, "E");
    assert_eq!(b.parent, Some(machine.states[0]));
}

#[test]
fn test_parse_unknown_directive_rejected() {
    let result = parse_source("@wat Foo\n");
    assert!(matches!(result, Err(ParseError::DirectiveNotAllowed(name, _)) if name == "wat"));
}

#[test]
fn test_parse_include_not_allowed_in_body() {
    let result = parse_source(indoc! {r#"
        Home*
          @include "./x.state"
    "#});
    assert!(matches!(result, Err(ParseError::DirectiveNotAllowed(name, _)) if name == "include"));
}

#[test]
fn test_parse_machine_requires_identifier() {
    let result = parse_source("@machine\n");
    assert!(matches!(result, Err(ParseError::ExpectedIdent(_))));
}

#[test]
fn test_parse_error_carries_location() {
    let error = parse_source("@machine\n").unwrap_err();
    assert_eq!(error.span().start.line, 1);
}
