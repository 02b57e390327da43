use std::fs;
use std::path::Path;
use std::process::Output;

use assert_cmd::Command;
use tempfile::TempDir;

/// Runs `script` with HOME pointed at an empty directory so no user
/// configuration is picked up.
fn run_script(home: &TempDir, script: &str) -> Output {
    let path = home.path().join("script.msh");
    fs::write(&path, script).unwrap();
    Command::cargo_bin("myshell")
        .unwrap()
        .env("HOME", home.path())
        .env_remove("MYSHELL_LOG")
        .current_dir(home.path())
        .arg(&path)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_exit_stops_script() {
    let home = tempfile::tempdir().unwrap();
    let output = run_script(&home, "echo before\nexit\necho after\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "before\n");
}

#[test]
fn test_end_of_script_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = run_script(&home, "# nothing but a comment\n\nfalse\n");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_pipes_and_redirects() {
    let home = tempfile::tempdir().unwrap();
    let script = concat!(
        "echo b > in.txt\n",
        "echo a >> in.txt\n",
        "echo b >> in.txt\n",
        "sort < in.txt | uniq | wc -l > count.txt\n",
        "cat < count.txt\n",
    );
    let output = run_script(&home, script);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), "2");
    assert_eq!(fs::read_to_string(home.path().join("in.txt")).unwrap(), "b\na\nb\n");
}

#[test]
fn test_errors_are_reported_and_skipped() {
    let home = tempfile::tempdir().unwrap();
    let script = concat!(
        "ls |\n",
        "cat < missing.txt\n",
        "myshell-no-such-program\n",
        "cd\n",
        "echo still here\n",
    );
    let output = run_script(&home, script);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "still here\n");

    let err = stderr(&output);
    assert!(err.contains("myshell: "));
    assert!(err.contains("missing.txt"));
    assert!(err.contains("myshell-no-such-program: command not found"));
    assert!(err.contains("cd: missing argument"));
}

#[test]
fn test_cd_changes_directory_for_later_lines() {
    let home = tempfile::tempdir().unwrap();
    let sub = home.path().join("sub");
    fs::create_dir(&sub).unwrap();
    let output = run_script(&home, "cd sub\npwd\n");
    assert_eq!(output.status.code(), Some(0));
    let printed = stdout(&output);
    assert_eq!(
        Path::new(printed.trim()).canonicalize().unwrap(),
        sub.canonicalize().unwrap()
    );
}

#[test]
fn test_config_limits_apply() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".myshellrc"), "max_stages=1\n").unwrap();
    let output = run_script(&home, "echo one | cat\necho two\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "two\n");
}

#[test]
fn test_too_many_arguments() {
    Command::cargo_bin("myshell")
        .unwrap()
        .args(["a.msh", "b.msh"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_script() {
    let home = tempfile::tempdir().unwrap();
    Command::cargo_bin("myshell")
        .unwrap()
        .env("HOME", home.path())
        .arg(home.path().join("nope.msh"))
        .assert()
        .code(1);
}

#[test]
fn test_bad_config_is_fatal() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("bad.rc");
    fs::write(&config, "no_such_key=1\n").unwrap();
    let script = home.path().join("script.msh");
    fs::write(&script, "echo hi\n").unwrap();

    let output = Command::cargo_bin("myshell")
        .unwrap()
        .env("HOME", home.path())
        .arg("--config")
        .arg(&config)
        .arg(&script)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
}
