// CLI integration tests for `info` and `extract`.
mod common;

use std::path::Path;
use std::process::Command;

use common::{Item, item, quest};
use mastermem::api::{Codec, DatabaseBuilder};
use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_mastermem");
    Command::new(exe)
}

fn parse_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("valid json")
}

fn write_blob(dir: &Path) -> std::path::PathBuf {
    let mut builder = DatabaseBuilder::new();
    builder
        .append(vec![item(1, "Potion", 1, 10), item(2, "Ether", 1, 20)])
        .expect("items");
    builder.append(vec![quest(1, "Intro", 1)]).expect("quests");
    let path = dir.join("master.bin");
    std::fs::write(&path, builder.build().expect("build")).expect("write blob");
    path
}

#[test]
fn info_lists_tables_as_json() {
    let temp = tempfile::tempdir().expect("tempdir");
    let blob = write_blob(temp.path());

    let output = cmd()
        .args(["info", blob.to_str().expect("utf8 path"), "--json"])
        .output()
        .expect("info");
    assert!(output.status.success());
    let value = parse_json(&output.stdout);
    assert_eq!(value["version"], 1);
    let tables = value["tables"].as_array().expect("tables");
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0]["name"], "Item");
    assert_eq!(tables[1]["name"], "Quest");
    assert_eq!(tables[0]["compressed"], true);
    assert!(tables[0]["size"].as_u64().expect("size") > 0);
    assert!(tables[0].get("raw").is_none());
}

#[test]
fn info_text_has_one_line_per_table() {
    let temp = tempfile::tempdir().expect("tempdir");
    let blob = write_blob(temp.path());

    let output = cmd()
        .args(["info", blob.to_str().expect("utf8 path")])
        .output()
        .expect("info");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("TABLE"));
    assert!(lines[1].starts_with("Item"));
    assert!(lines[2].ends_with("zstd"));
}

#[test]
fn extract_writes_decodable_segment() {
    let temp = tempfile::tempdir().expect("tempdir");
    let blob = write_blob(temp.path());
    let out = temp.path().join("item.seg");

    let output = cmd()
        .args([
            "extract",
            blob.to_str().expect("utf8 path"),
            "Item",
            out.to_str().expect("utf8 path"),
        ])
        .output()
        .expect("extract");
    assert!(output.status.success());
    let summary = parse_json(&output.stdout);
    assert_eq!(summary["table"], "Item");

    let segment = std::fs::read(&out).expect("segment");
    assert_eq!(summary["bytes"].as_u64(), Some(segment.len() as u64));
    let items: Vec<Item> = Codec::decode(&segment).expect("decode");
    assert_eq!(items.len(), 2);
}

#[test]
fn errors_are_json_with_exit_codes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let blob = write_blob(temp.path());
    let out = temp.path().join("missing.seg");

    let output = cmd()
        .args([
            "extract",
            blob.to_str().expect("utf8 path"),
            "Monster",
            out.to_str().expect("utf8 path"),
        ])
        .output()
        .expect("extract");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
    assert_eq!(err["error"]["table"], "Monster");
    assert!(!out.exists());

    let garbage = temp.path().join("garbage.bin");
    std::fs::write(&garbage, b"not a container").expect("write garbage");
    let output = cmd()
        .args(["info", garbage.to_str().expect("utf8 path")])
        .output()
        .expect("info");
    assert_eq!(output.status.code(), Some(6));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "MalformedContainer");

    let output = cmd()
        .args(["info", temp.path().join("absent.bin").to_str().expect("utf8")])
        .output()
        .expect("info");
    assert_eq!(output.status.code(), Some(8));
}
