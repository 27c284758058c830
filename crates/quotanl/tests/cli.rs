#![cfg(feature = "cli")]

use std::process::{Command, Output};

fn quotanl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quotanl"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("QUOTANL_FAMILY")
        .env_remove("QUOTANL_GROUP")
        .output()
        .expect("quotanl binary should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn version_prints_package_version() {
    let output = quotanl(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("quotanl {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_lists_provenance() {
    let output = quotanl(&["version", "--extended"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("name: quotanl"));
    assert!(text.contains("target_os: "));
    assert!(text.contains("family: VFS_DQUOT group: events"));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = quotanl(&["subscribe"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unrecognized subcommand"));
}

#[test]
fn invalid_format_is_rejected() {
    let output = quotanl(&["version", "--format", "xml"]);
    assert_eq!(output.status.code(), Some(2));
}

#[cfg(target_os = "linux")]
#[test]
fn bad_timeout_exits_with_usage_code() {
    let output = quotanl(&["watch", "--timeout", "soon"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr(&output).contains("invalid duration value: soon"));
}

#[cfg(target_os = "linux")]
#[test]
fn family_resolves_controller() {
    let output = quotanl(&["family", "nlctrl", "--format", "json"]);
    if !output.status.success() {
        // Sandboxes may forbid netlink sockets entirely.
        let err = stderr(&output);
        assert!(err.contains("dial failed"), "unexpected failure: {err}");
        eprintln!("skipping: {err}");
        return;
    }

    let value: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("family output should be JSON");
    assert_eq!(value["name"], "nlctrl");
    assert_eq!(value["id"], 16);
    assert!(value["groups"]
        .as_array()
        .is_some_and(|groups| groups.iter().any(|g| g["name"] == "notify")));
}

#[cfg(target_os = "linux")]
#[test]
fn unknown_family_is_transport_error() {
    let output = quotanl(&["family", "QUOTANL_NO_SUCH_FAMILY"]);
    let err = stderr(&output);
    if err.contains("dial failed") {
        eprintln!("skipping: {err}");
        return;
    }
    assert_eq!(output.status.code(), Some(3), "stderr: {err}");
    assert!(err.contains("not found"));
}
