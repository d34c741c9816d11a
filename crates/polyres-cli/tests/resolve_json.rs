//! Integration tests for `polyres --json` output.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-q", "-p", "polyres-cli", "--bin", "polyres", "--"]);
    // Keep the session deterministic regardless of the caller's environment.
    cmd.env_remove("POLYRES_TSCONFIG_PATHS")
        .env_remove("POLYRES_REACT_CANARY")
        .env_remove("POLYRES_NO_MAIN_FIELD_OVERRIDE")
        .env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "package.json", r#"{ "name": "app" }"#);
    write(root, "index.js", "");
    write(root, "src/App.js", "");
    write(
        root,
        "node_modules/react-native-web/package.json",
        r#"{ "name": "react-native-web", "main": "dist/index.js" }"#,
    );
    write(root, "node_modules/react-native-web/dist/index.js", "");
    dir
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("stdout should be valid JSON ({e}): {stdout}"))
}

#[test]
fn test_version_json() {
    let output = cargo_bin()
        .args(["--json", "version"])
        .output()
        .expect("Failed to run version command");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert!(json["version"].as_str().is_some_and(|v| !v.is_empty()));
    assert_eq!(json["schema_version"].as_u64(), Some(1));
}

#[test]
fn test_resolve_web_alias() {
    let dir = fixture();
    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "resolve", "react-native", "--platform", "web"])
        .output()
        .expect("Failed to run resolve command");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["platform"], "web");
    assert_eq!(json["resolution"]["type"], "sourceFile");
    let file_path = json["resolution"]["filePath"].as_str().unwrap();
    assert!(
        file_path.ends_with("react-native-web/dist/index.js"),
        "{file_path}"
    );
}

#[test]
fn test_resolve_node_builtin_on_server() {
    let dir = fixture();
    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "resolve", "node:fs", "--env", "node"])
        .output()
        .expect("Failed to run resolve command");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["resolution"]["filePath"], "\0node:fs");
    assert_eq!(
        json["contents"],
        "module.exports=$$require_external('node:fs');"
    );
}

#[test]
fn test_resolve_node_builtin_on_web_is_empty() {
    let dir = fixture();
    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "resolve", "fs", "--platform", "web"])
        .output()
        .expect("Failed to run resolve command");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["resolution"]["type"], "empty");
}

#[test]
fn test_resolve_failure_exit_code() {
    let dir = fixture();
    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "resolve", "./missing", "--platform", "ios"])
        .output()
        .expect("Failed to run resolve command");
    assert!(!output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "FAILED_TO_RESOLVE_PATH");
    assert!(json["error"]["tried"].as_array().is_some_and(|t| !t.is_empty()));
}

#[test]
fn test_invalid_environment_rejected() {
    let output = cargo_bin()
        .args(["resolve", "fs", "--env", "browser"])
        .output()
        .expect("Failed to run resolve command");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown environment"));
}

#[test]
fn test_session_resolves_stdin_lines() {
    let dir = fixture();
    let mut child = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "session", "--platform", "web"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn session");

    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, "src/App.js react-native").unwrap();
        writeln!(stdin, "# comments are skipped").unwrap();
        writeln!(stdin, "src/App.js node:path").unwrap();
    }

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["specifier"], "react-native");
    assert_eq!(lines[0]["resolution"]["type"], "sourceFile");
    assert_eq!(lines[1]["resolution"]["type"], "empty");
}

#[test]
fn test_polyfills_json() {
    let dir = fixture();
    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "polyfills", "--platform", "ios", "--host", "host.js"])
        .output()
        .expect("Failed to run polyfills command");
    assert!(output.status.success());

    let json = stdout_json(&output);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["id"], "host.js");
    assert!(entries[0].get("contents").is_none());
    assert_eq!(entries[1]["id"], "\0polyfill:external-require");
    assert!(entries[1]["contents"]
        .as_str()
        .unwrap()
        .contains("not available in this JavaScript environment"));
}
