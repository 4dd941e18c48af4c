use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn xuproc() -> Command {
    Command::cargo_bin("xuproc").unwrap()
}

fn write_report(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_qualifies_names() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "xml_valid.xml",
        r#"
    <testsuite>
        <testcase classname="org.example" name="method" />
    </testsuite>
    "#,
    );

    let output = xuproc().arg("-j").arg(&path).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.replace("    ", "").replace('\n', ""),
        "<?xml version='1.0' encoding='utf-8'?>\
         <testsuite><testcase \
         classname=\"org.example\" name=\"org.example.method\" \
         /></testsuite>"
    );
}

#[test]
fn test_already_qualified_names_are_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "xml_acc.xml",
        r#"<testsuite><testcase classname="org.example" name="org.example.method" /></testsuite>"#,
    );

    xuproc()
        .arg("-j")
        .arg(&path)
        .assert()
        .success()
        .stdout(
            "<?xml version='1.0' encoding='utf-8'?>\n\
             <testsuite><testcase classname=\"org.example\" name=\"org.example.method\" /></testsuite>\n",
        );
}

#[test]
fn test_missing_classname_exits_14_without_output() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "xml_missing_classname.xml",
        "<testsuite>\n    <testcase name=\"method1\" />\n</testsuite>\n",
    );

    xuproc()
        .arg("-j")
        .arg(&path)
        .assert()
        .code(14)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Missing classname attribute"));
}

#[test]
fn test_missing_name_exits_15() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "xml_missing_name.xml",
        r#"<testsuite><testcase classname="org.example" /></testsuite>"#,
    );

    xuproc()
        .arg("-j")
        .arg(&path)
        .assert()
        .code(15)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Missing name attribute"));
}

#[test]
fn test_malformed_xml_exits_10() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "xml_invalid_file.xml",
        r#"<testsuite><<<testcase classname="org.example" name="method1" /></testsuite>"#,
    );

    xuproc()
        .arg("-j")
        .arg(&path)
        .assert()
        .code(10)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Cannot parse XML file"));
}

#[test]
fn test_missing_file_exits_11() {
    let dir = TempDir::new().unwrap();

    xuproc()
        .arg("-j")
        .arg(dir.path().join("unexisting.file"))
        .assert()
        .code(11)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_file_without_flag_exits_13() {
    let dir = TempDir::new().unwrap();
    let path = write_report(&dir, "report.xml", "<testsuite />");

    xuproc()
        .arg(&path)
        .assert()
        .code(13)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Missing -j option"));
}

#[test]
fn test_no_file_exits_13() {
    xuproc()
        .arg("-j")
        .assert()
        .code(13)
        .stderr(predicate::str::contains("Missing filepath"));

    xuproc().assert().code(13);
}

#[test]
fn test_unknown_flag_exits_13() {
    xuproc()
        .args(["-j", "--bogus", "report.xml"])
        .assert()
        .code(13)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn test_attribute_line_breaks_survive() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "report.xml",
        "<testsuite><testcase classname=\"A\" name=\"b\">\
         <failure message=\"expected 1&#10;got 2\" /></testcase></testsuite>",
    );

    xuproc()
        .arg("-j")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"message="expected 1&#10;got 2""#))
        .stdout(predicate::str::contains(r#"name="A.b""#));
}

#[test]
fn test_directory_exits_100() {
    let dir = TempDir::new().unwrap();

    xuproc()
        .arg("-j")
        .arg(dir.path())
        .assert()
        .code(100)
        .stderr(predicate::str::contains("Unexpected error"));
}

#[test]
fn test_verbose_logs_stay_off_stdout() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "report.xml",
        r#"<testsuite><testcase classname="A" name="b" /></testsuite>"#,
    );

    xuproc()
        .env_remove("RUST_LOG")
        .args(["-j", "-v"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "<?xml version='1.0' encoding='utf-8'?>",
        ))
        .stdout(predicate::str::contains(r#"name="A.b""#))
        .stderr(predicate::str::contains("Qualified 1 test case name(s)"));
}

#[test]
fn test_help_exits_0() {
    xuproc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Prepend classname"));
}
