use assert_cmd::Command;
use lapwatch::stopwatch::RECORDS_KEY;
use lapwatch::store::{KeyValueStore, SqliteStore};
use tempfile::tempdir;

// `--print` needs no TTY, so the binary can be driven directly.
fn lapwatch(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("lapwatch").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("LAPWATCH_LOG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn print_with_empty_store() {
    let home = tempdir().unwrap();
    let db = home.path().join("records.db");

    let output = lapwatch(home.path())
        .args(["--db", db.to_str().unwrap(), "--print"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "Average Time: N/A\nLast 5 Average: N/A\nSolve Count: 0\n"
    );
}

#[test]
fn print_lists_saved_records() {
    let home = tempdir().unwrap();
    let db = home.path().join("records.db");
    SqliteStore::open(&db)
        .unwrap()
        .set(RECORDS_KEY, r#"["00:03:000","00:02:000","00:01:000"]"#)
        .unwrap();

    let output = lapwatch(home.path())
        .args(["--db", db.to_str().unwrap(), "--print"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        &lines[..6],
        &[
            "00:03:000",
            "00:02:000",
            "00:01:000",
            "Average Time: 00:02:000",
            "Last 5 Average: N/A",
            "Solve Count: 3",
        ]
    );
    assert!(lines[6].starts_with("Last Saved: "));
}

#[test]
fn interactive_mode_requires_a_tty() {
    let home = tempdir().unwrap();
    let db = home.path().join("records.db");

    let output = lapwatch(home.path())
        .args(["--db", db.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("stdin must be a tty"));
}
