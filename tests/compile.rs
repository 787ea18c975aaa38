//! End-to-end scenarios against real files on disk, plus the CLI
//! contract (exit codes, stdout/stderr split).

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

use wirestate::compile::{CompileOptions, compile};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

fn temp_project(name: &str, files: &[(&str, &str)]) -> PathBuf {
    let run_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let root = std::env::temp_dir().join(format!(
        "wirestate_e2e_{}_{}_{}",
        name,
        std::process::id(),
        run_id
    ));
    fs::create_dir_all(&root).expect("failed to create temp dir");
    for (file, source) in files {
        fs::write(root.join(file), source).expect("failed to write fixture");
    }
    root
}

fn compile_in(root: &PathBuf, input: &str) -> Result<String, String> {
    let opts = CompileOptions {
        src_dirs: vec![root.clone()],
        ..CompileOptions::default()
    };
    compile(input, &opts).map_err(|error| error.to_string())
}

fn run_cli(root: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wirestate"))
        .current_dir(root)
        .args(args)
        .output()
        .expect("failed to run wirestate")
}

#[test]
fn s1_smoke_single_file() {
    let root = temp_project("s1", &[("app.state", "Home*\n  one -> Seven\nSeven\n")]);

    let out = compile_in(&root, "app.state").expect("compile failed");
    let value: serde_json::Value = serde_json::from_str(&out).expect("invalid JSON");
    let machine = &value["app.state"]["machines"][0];
    assert_eq!(machine["id"], "app");
    assert_eq!(machine["states"][0]["id"], "Home");
    assert_eq!(machine["states"][0]["initial"], true);
    assert_eq!(machine["states"][0]["transitions"][0]["target"], "Seven");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn s2_marker_rewrite() {
    let root = temp_project("s2", &[("app.state", "A*\n  B\nC\n")]);

    let out = compile_in(&root, "app.state").expect("compile failed");
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let a = &value["app.state"]["machines"][0]["states"][0];
    assert_eq!(a["kind"], "compound");
    assert_eq!(a["initial"], true);
    assert_eq!(a["states"][0]["id"], "B");
    assert_eq!(a["states"][0]["initial"], true);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn s3_duplicate_transition() {
    let root = temp_project("s3", &[("app.state", "A*\n  x -> B\n  x -> B\nB\n")]);

    let error = compile_in(&root, "app.state").unwrap_err();
    assert!(error.contains("Duplicate transition"), "got: {error}");
    assert!(error.contains(":3:"), "got: {error}");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn s4_normalized_duplicate_transition() {
    let root = temp_project("s4", &[("app.state", "A*\n  x,y -> B\n  y, x -> B\nB\n")]);

    let error = compile_in(&root, "app.state").unwrap_err();
    assert!(error.contains("Duplicate transition for event `x,y`"), "got: {error}");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn s5_import_and_use() {
    let root = temp_project(
        "s5",
        &[
            ("app.state", "@include \"./m.state\"\nS\n  @use M\n"),
            ("m.state", "@machine M\n  Home*\n"),
        ],
    );

    let out = compile_in(&root, "app.state").expect("compile failed");
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let s = &value["app.state"]["machines"][0]["states"][0];
    assert_eq!(s["use"]["machine"], "M");
    assert_eq!(s["use"]["from"], "./m.state");
    assert!(value.get("./m.state").is_some());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn s6_unresolved_import() {
    let root = temp_project("s6", &[("app.state", "@include \"./missing.state\"\n")]);

    let error = compile_in(&root, "app.state").unwrap_err();
    assert!(error.contains("File not found: ./missing.state"), "got: {error}");
    assert!(error.contains(":1:"), "got: {error}");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn s7_import_cycle() {
    let root = temp_project(
        "s7",
        &[
            ("a.state", "@include \"./b.state\"\nA\n"),
            ("b.state", "@include \"./a.state\"\nB\n"),
        ],
    );

    let out = compile_in(&root, "./a.state").expect("cycle should compile");
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["./a.state", "./b.state"]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn identical_inputs_produce_identical_bytes() {
    let files = [
        ("app.state", "@include \"./m.state\"\nHome*\n  go -> Away\nAway\n"),
        ("m.state", "@machine M\n  One*\n  Two\n"),
    ];
    let root = temp_project("determinism", &files);

    let first = compile_in(&root, "app.state").expect("compile failed");
    let second = compile_in(&root, "app.state").expect("compile failed");
    assert_eq!(first, second);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_success_writes_artifact_to_stdout() {
    let root = temp_project("cli_ok", &[("app.state", "Home*\n")]);

    let output = run_cli(&root, &["app.state"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).expect("invalid JSON");
    assert!(value.get("app.state").is_some());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_compile_error_exits_10() {
    let root = temp_project("cli_err", &[("app.state", "A*\nA\n")]);

    let output = run_cli(&root, &["app.state"]);
    assert_eq!(output.status.code(), Some(10));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Duplicate state ID `A`"), "got: {stderr}");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_missing_input_exits_20() {
    let root = temp_project("cli_usage", &[]);

    let output = run_cli(&root, &[]);
    assert_eq!(output.status.code(), Some(20));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Usage"), "got: {stderr}");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_help_exits_0() {
    let root = temp_project("cli_help", &[]);

    let output = run_cli(&root, &["--help"]);
    assert_eq!(output.status.code(), Some(0));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_unknown_generator_exits_10() {
    let root = temp_project("cli_nogen", &[("app.state", "Home*\n")]);

    let output = run_cli(&root, &["app.state", "--generator", "nosuch"]);
    assert_eq!(output.status.code(), Some(10));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Unknown generator `nosuch`"), "got: {stderr}");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_accepts_equals_form_and_src_dir() {
    let project = temp_project("cli_srcdir", &[]);
    let src = project.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("app.state"), "Home*\n").unwrap();

    let output = run_cli(&project, &["app.state", &format!("--srcDir={}", src.display())]);
    assert_eq!(output.status.code(), Some(0));

    let _ = fs::remove_dir_all(&project);
}

#[test]
fn cli_xstate_generator_with_disabled_callbacks() {
    let root = temp_project(
        "cli_xstate",
        &[("app.state", "Home*\n  go -> Away\nAway\n")],
    );

    let output = run_cli(
        &root,
        &["app.state", "--generator", "xstate", "--disableCallbacks"],
    );
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("import { Machine } from 'xstate'"));
    assert!(!stdout.contains("./callbacks"));

    let _ = fs::remove_dir_all(&root);
}
