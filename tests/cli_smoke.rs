use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn deck_help_works() {
    Command::cargo_bin("deck")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("kanban task board"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = ["board", "ls", "add", "edit", "mv", "rm"];

    for cmd in subcommands {
        Command::cargo_bin("deck")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn empty_title_fails_validation_before_any_request() {
    Command::cargo_bin("deck")
        .expect("binary")
        .args(["add", ""])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Title is required."));
}

#[test]
fn unknown_column_is_rejected() {
    Command::cargo_bin("deck")
        .expect("binary")
        .args(["add", "Fix login", "--column", "doing"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown column"));
}
