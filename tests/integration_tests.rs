use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::tempdir;

fn write_program(dir: &tempfile::TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(source.as_bytes()).unwrap();
    path
}

#[test]
fn test_help_output() {
    let mut cmd = Command::cargo_bin("tomasulo_rs").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Tomasulo"));
}

#[test]
fn test_runs_straight_line_program() {
    let dir = tempdir().unwrap();
    let program = write_program(
        &dir,
        "add.s",
        "ADDI R1, R0, 5\nADDI R2, R0, 7\nADD R3, R1, R2\nEOP\n",
    );

    let mut cmd = Command::cargo_bin("tomasulo_rs").unwrap();
    cmd.arg("--program").arg(&program).arg("--memory-size").arg("4096");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("R3  = 12"))
        .stdout(predicate::str::contains("statistics"));
}

#[test]
fn test_rejects_malformed_program() {
    let dir = tempdir().unwrap();
    let program = write_program(&dir, "bad.s", "FROB R1, R2, R3\n");

    let mut cmd = Command::cargo_bin("tomasulo_rs").unwrap();
    cmd.arg("--program").arg(&program);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown opcode"));
}

#[test]
fn test_log_file_is_written() {
    let dir = tempdir().unwrap();
    let program = write_program(&dir, "prog.s", "ADDI R1, R0, 1\nEOP\n");
    let log_path = dir.path().join("run.log");

    let mut cmd = Command::cargo_bin("tomasulo_rs").unwrap();
    cmd.arg("--program")
        .arg(&program)
        .arg("--log-file")
        .arg(&log_path);
    cmd.assert().success();

    assert!(log_path.exists());
    let contents = fs::read_to_string(&log_path).unwrap();
    assert!(contents.contains("run finished"));
}

#[test]
fn test_bounded_cycle_count_stops_early() {
    let dir = tempdir().unwrap();
    let program = write_program(
        &dir,
        "loop.s",
        "ADDI R1, R0, 1000\nloop: ADDI R1, R1, -1\nBNEZ R1, loop\nEOP\n",
    );

    let mut cmd = Command::cargo_bin("tomasulo_rs").unwrap();
    cmd.arg("--program").arg(&program).arg("--cycles").arg("3");
    cmd.assert().success().stdout(predicate::str::contains("cycles=3"));
}
