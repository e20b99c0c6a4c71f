use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_full_flag_surface() {
    let mut cmd = Command::cargo_bin("parroter").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("--team")
                .and(predicate::str::contains("--include-guests"))
                .and(predicate::str::contains("--include-flags"))
                .and(predicate::str::contains("--list-existing"))
                .and(predicate::str::contains("--list-available"))
                .and(predicate::str::contains("--list-new"))
                .and(predicate::str::contains("--refresh"))
                .and(predicate::str::contains("--quiet"))
                .and(predicate::str::contains("--browser")),
        );
}

#[test]
fn version_reports_the_release() {
    let mut cmd = Command::cargo_bin("parroter").expect("Binary exists");
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2.0"));
}

#[test]
fn unknown_browser_backend_is_rejected() {
    let mut cmd = Command::cargo_bin("parroter").expect("Binary exists");
    cmd.args(["--browser", "lynx"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--browser"));
}
