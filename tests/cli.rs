#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

#[test]
fn get_reads_default_env_file() {
    let dir = make_temp_dir();
    write_file(dir.path(), ".env", "ENVKIT_CLI_DEFAULT=from_default\n");

    let output = run_envkit(dir.path(), &["get", "ENVKIT_CLI_DEFAULT"], None);

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "from_default");
}

#[test]
fn get_without_fallback_exits_naming_missing_key() {
    let dir = make_temp_dir();
    write_file(dir.path(), ".env", "OTHER=1\n");

    let output = run_envkit(dir.path(), &["get", "ENVKIT_CLI_MISSING"], None);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ENVKIT_CLI_MISSING environment variable is not set"),
        "unexpected stderr: {stderr:?}"
    );
}

#[test]
fn typed_getters_fall_back_on_unset_or_invalid_values() {
    let dir = make_temp_dir();
    write_file(
        dir.path(),
        ".env",
        "ENVKIT_CLI_PORT=9090\nENVKIT_CLI_BAD=abc\nENVKIT_CLI_FLAG=F\n",
    );

    let port = run_envkit(dir.path(), &["get-int", "ENVKIT_CLI_PORT", "80"], None);
    assert_success(&port);
    assert_eq!(stdout_trimmed(&port), "9090");

    let bad = run_envkit(dir.path(), &["get-int", "ENVKIT_CLI_BAD", "80"], None);
    assert_success(&bad);
    assert_eq!(stdout_trimmed(&bad), "80");

    let flag = run_envkit(dir.path(), &["get-bool", "ENVKIT_CLI_FLAG", "true"], None);
    assert_success(&flag);
    assert_eq!(stdout_trimmed(&flag), "false");

    let unset = run_envkit(dir.path(), &["get", "ENVKIT_CLI_UNSET", "fallback"], None);
    assert_success(&unset);
    assert_eq!(stdout_trimmed(&unset), "fallback");
}

#[test]
fn check_succeeds_only_when_all_keys_are_set() {
    let dir = make_temp_dir();
    write_file(dir.path(), ".env", "ENVKIT_CLI_A=1\nENVKIT_CLI_B=\n");

    let ok = run_envkit(dir.path(), &["check", "ENVKIT_CLI_A", "ENVKIT_CLI_B"], None);
    assert_success(&ok);

    let missing = run_envkit(
        dir.path(),
        &["check", "ENVKIT_CLI_A", "ENVKIT_CLI_C"],
        None,
    );
    assert_eq!(missing.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&missing.stderr).contains("ENVKIT_CLI_C"));
}

#[test]
fn later_files_take_precedence() {
    let dir = make_temp_dir();
    write_file(dir.path(), ".env.base", "ENVKIT_CLI_PRECEDENCE=base\n");
    write_file(dir.path(), ".env.local", "ENVKIT_CLI_PRECEDENCE=local\n");

    let output = run_envkit(
        dir.path(),
        &["-f", ".env.base,.env.local", "get", "ENVKIT_CLI_PRECEDENCE"],
        None,
    );

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "local");
}

#[test]
fn keep_existing_flag_controls_environment_precedence() {
    let dir = make_temp_dir();
    write_file(dir.path(), ".env", "ENVKIT_CLI_OVERRIDE=from_file\n");
    let inherited = Some(("ENVKIT_CLI_OVERRIDE", "from_env"));

    let overridden = run_envkit(dir.path(), &["get", "ENVKIT_CLI_OVERRIDE"], inherited);
    assert_success(&overridden);
    assert_eq!(stdout_trimmed(&overridden), "from_file");

    let kept = run_envkit(dir.path(), &["-k", "get", "ENVKIT_CLI_OVERRIDE"], inherited);
    assert_success(&kept);
    assert_eq!(stdout_trimmed(&kept), "from_env");
}

#[test]
fn missing_file_fails_unless_ignored() {
    let dir = make_temp_dir();
    write_file(dir.path(), ".env.real", "ENVKIT_CLI_IGNORE=loaded\n");

    let required = run_envkit(
        dir.path(),
        &["-f", "missing.env,.env.real", "get", "ENVKIT_CLI_IGNORE"],
        None,
    );
    assert_eq!(required.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&required.stderr).contains("missing.env"));

    let ignored = run_envkit(
        dir.path(),
        &["-i", "-f", "missing.env,.env.real", "get", "ENVKIT_CLI_IGNORE"],
        None,
    );
    assert_success(&ignored);
    assert_eq!(stdout_trimmed(&ignored), "loaded");
}

#[test]
fn malformed_lines_warn_without_failing() {
    let dir = make_temp_dir();
    write_file(dir.path(), ".env", "BROKEN LINE\nENVKIT_CLI_AFTER=ok\n");

    let output = run_envkit(dir.path(), &["get", "ENVKIT_CLI_AFTER"], None);

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "ok");
    assert!(String::from_utf8_lossy(&output.stderr).contains("line=1"));
}

#[test]
fn run_passes_loaded_environment_to_command() {
    let dir = make_temp_dir();
    write_file(dir.path(), ".env", "ENVKIT_CLI_RUN=\"from file\"\n");

    let output = run_envkit(
        dir.path(),
        &["run", "--", "printenv", "ENVKIT_CLI_RUN"],
        None,
    );

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "from file");
}

#[test]
fn usage_errors_exit_with_hint() {
    let dir = make_temp_dir();

    let output = run_envkit(dir.path(), &["get-int", "PORT", "eighty"], None);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Try `envkit --help`."));
}

fn run_envkit(dir: &Path, args: &[&str], env_pair: Option<(&str, &str)>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_envkit"));
    command
        .current_dir(dir)
        .args(args)
        .env_remove("ENVKIT_LOG");
    if let Some((key, value)) = env_pair {
        command.env(key, value);
    }
    command.output().expect("failed to run envkit binary")
}

fn stdout_trimmed(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout)
        .trim_end()
        .to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success: stdout={:?}, stderr={:?}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn make_temp_dir() -> TempDir {
    TempDir::new().expect("failed to create temp dir")
}

fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("failed to write fixture file");
}
