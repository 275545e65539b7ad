use std::env;
use std::path::PathBuf;
use std::process::Command;

/// Get the path to the source-refactor binary
fn bin_path() -> PathBuf {
    // During tests, CARGO_BIN_EXE_source-refactor provides the path to the
    // binary; fall back to the build directory when running outside cargo
    if let Ok(path) = env::var("CARGO_BIN_EXE_source-refactor") {
        return PathBuf::from(path);
    }

    let paths = vec![
        PathBuf::from("target/debug/source-refactor"),
        PathBuf::from("../target/debug/source-refactor"),
    ];

    paths
        .into_iter()
        .find(|p| p.exists())
        .expect("could not find source-refactor binary; run 'cargo build' first")
}

/// Get the path to the fixtures directory
fn fixtures_dir() -> PathBuf {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        PathBuf::from(manifest_dir).join("tests/fixtures")
    } else {
        PathBuf::from("tests/fixtures")
    }
}

/// Run the binary inside the fixtures directory so the model's relative
/// source paths resolve
fn run(args: &[&str]) -> std::process::Output {
    Command::new(bin_path())
        .current_dir(fixtures_dir())
        .args(args)
        .output()
        .expect("failed to execute binary")
}

#[test]
fn test_template_parameter_remove_rewrites_source() {
    let output = run(&[
        "--model",
        "model.json",
        "template-parameter-remove",
        "--position",
        "sample.cpp:1:20",
    ]);

    assert!(
        output.status.success(),
        "binary failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "\
template <int N>
struct ring {
    ? data[N];
    ? get(int i);
};

ring<8> r;
"
    );
}

#[test]
fn test_json_report_mode() {
    let output = run(&[
        "--model",
        "model.json",
        "--json",
        "template-parameter-remove",
        "--position",
        "sample.cpp:1:20",
    ]);

    assert!(
        output.status.success(),
        "binary failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"execution_id\""), "missing execution id: {}", stdout);
    assert!(stdout.contains("\"sample.cpp\""), "missing file entry: {}", stdout);
    assert!(
        stdout.contains("\"template-parameter-remove\""),
        "missing action name: {}",
        stdout
    );
}

#[test]
fn test_find_definition() {
    let output = run(&[
        "--model",
        "model.json",
        "find-definition",
        "--position",
        "sample.cpp:2:9",
    ]);

    assert!(
        output.status.success(),
        "binary failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "Symbol ring is defined at: sample.cpp:2:8\n");
}

#[test]
fn test_unknown_action_fails() {
    let output = run(&["--model", "model.json", "rename"]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("can't find refactor action"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn test_not_a_template_parameter_fails() {
    let output = run(&[
        "--model",
        "model.json",
        "template-parameter-remove",
        "--position",
        "sample.cpp:2:9",
    ]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("not a template parameter"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn test_missing_position_fails() {
    let output = run(&["--model", "model.json", "template-parameter-remove"]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--position"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn test_invalid_position_descriptor_fails() {
    let output = run(&[
        "--model",
        "model.json",
        "template-parameter-remove",
        "--position",
        "sample.cpp:nope",
    ]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid position descriptor"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn test_no_action_lists_available_actions() {
    let output = run(&["--model", "model.json"]);

    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("find-definition"), "missing action: {}", stdout);
    assert!(
        stdout.contains("template-parameter-remove"),
        "missing action: {}",
        stdout
    );
}
