use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const LIBRARY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<library>
    <book>
        <title> Dune </title>
        <author>Frank Herbert</author>
        <tag>sf</tag>
        <tag>classic</tag>
    </book>
    <book>
        <title>Emma, Revised</title>
        <author>Jane Austen</author>
    </book>
</library>
"#;

fn write_input(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn writes_delimited_file_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "library.xml", LIBRARY);
    let expected_output = dir.path().join("library-delimited.txt");

    let mut cmd = cargo_bin_cmd!("xml-delimit");
    cmd.arg(&input);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Delimited file written:").and(
            predicate::str::contains("library-delimited.txt"),
        ));

    let output = fs::read_to_string(expected_output).unwrap();
    assert_eq!(
        output,
        "library_author_1,library_tag_1,library_tag_2,library_title_1\r\n\
         Frank Herbert,sf,classic,Dune\r\n\
         Jane Austen,,,\"Emma, Revised\"\r\n"
    );
}

#[test]
fn honours_delimiter_output_and_row_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "library.xml", LIBRARY);
    let output = dir.path().join("books.tsv");

    let mut cmd = cargo_bin_cmd!("xml-delimit");
    cmd.arg(&input)
        .arg("--delimiter")
        .arg("\\t")
        .arg("--output")
        .arg(&output)
        .arg("--row-prefix");
    cmd.assert().success();

    let written = fs::read_to_string(output).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("book_author_1\tbook_tag_1\tbook_tag_2\tbook_title_1")
    );
    assert_eq!(lines.next(), Some("Frank Herbert\tsf\tclassic\tDune"));
    assert_eq!(lines.next(), Some("Jane Austen\t\t\tEmma, Revised"));
}

#[test]
fn tab_spelled_out_selects_tab_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "pair.xml", "<r><row><a>1</a><b>2</b></row></r>");
    let output = dir.path().join("pair.tsv");

    let mut cmd = cargo_bin_cmd!("xml-delimit");
    cmd.arg(&input)
        .arg("--delimiter")
        .arg("tab")
        .arg("-o")
        .arg(&output);
    cmd.assert().success();

    assert_eq!(
        fs::read_to_string(output).unwrap(),
        "r_a_1\tr_b_1\r\n1\t2\r\n"
    );
}

#[test]
fn writes_ndjson_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "small.xml", "<r><row><v>1</v></row></r>");
    let output = dir.path().join("small.jsonl");

    let mut cmd = cargo_bin_cmd!("xml-delimit");
    cmd.arg(&input).arg("--format").arg("ndjson").arg("-o").arg(&output);
    cmd.assert().success();

    assert_eq!(fs::read_to_string(output).unwrap(), "{\"r_v_1\":\"1\"}\n");
}

#[test]
fn missing_argument_is_a_usage_error() {
    let mut cmd = cargo_bin_cmd!("xml-delimit");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn extra_argument_is_a_usage_error() {
    let mut cmd = cargo_bin_cmd!("xml-delimit");
    cmd.arg("a.xml").arg("b.xml");
    cmd.assert().failure().code(1);
}

#[test]
fn malformed_xml_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "broken.xml", "<r><row></r>");

    let mut cmd = cargo_bin_cmd!("xml-delimit");
    cmd.arg(&input);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse XML"));

    assert!(!dir.path().join("broken-delimited.txt").exists());
}

#[test]
fn missing_input_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = cargo_bin_cmd!("xml-delimit");
    cmd.arg(dir.path().join("nope.xml"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}
