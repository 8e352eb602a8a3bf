use std::fs;

use serde_json::json;

mod common;

use common::{parse_json, reports_index, stderr_of, stdout_of, Sandbox};

#[test]
fn list_on_fresh_state_creates_the_index() {
    let sandbox = Sandbox::new();
    sandbox.cmd().arg("list").assert().success().stdout("");
    assert_eq!(
        sandbox.read_index(),
        json!({
            "drive_files": { "__gdrive_id": "root", "__gdrive_folder": true },
            "links": {}
        })
    );
}

#[test]
fn list_renders_tree_and_flat_views() {
    let sandbox = Sandbox::new();
    sandbox.write_index(&reports_index());

    sandbox
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout("Reports\n│ Q1.pdf\n");
    sandbox
        .cmd()
        .args(["list", "--no-tree"])
        .assert()
        .success()
        .stdout("gdrive:/Reports/\ngdrive:/Reports/Q1.pdf\n");
}

#[test]
fn link_shows_in_listing_and_unlink_removes_it() {
    let sandbox = Sandbox::new();
    sandbox.write_index(&reports_index());

    let assert = sandbox
        .cmd()
        .args(["link", "gdrive:/Reports/Q1.pdf", "q1.pdf"])
        .assert()
        .success();
    assert!(stdout_of(&assert).contains("syncker link: linked gdrive:/Reports/Q1.pdf with"));

    let document = sandbox.read_index();
    let links = document["links"].as_object().expect("links");
    assert_eq!(links.len(), 1);
    let (local, remote) = links.iter().next().expect("one link");
    assert!(local.ends_with("q1.pdf"));
    assert_eq!(remote, "gdrive:/Reports/Q1.pdf");
    assert_eq!(
        document["drive_files"]["Reports"]["Q1.pdf"]["link"].as_str(),
        Some(local.as_str())
    );

    let assert = sandbox
        .cmd()
        .args(["list", "-l"])
        .assert()
        .success();
    assert!(stdout_of(&assert).contains("gdrive:/Reports/Q1.pdf ["));
    sandbox
        .cmd()
        .args(["list", "-l", "-u"])
        .assert()
        .success()
        .stdout("gdrive:/Reports/\ngdrive:/Reports/Q1.pdf\n");

    sandbox
        .cmd()
        .args(["unlink", "q1.pdf"])
        .assert()
        .success();
    assert_eq!(sandbox.read_index()["links"], json!({}));

    let assert = sandbox
        .cmd()
        .args(["unlink", "gdrive:/Reports/Q1.pdf"])
        .assert()
        .code(1);
    assert!(stderr_of(&assert).contains("SK201"));
}

#[test]
fn unindex_cascades_links() {
    let sandbox = Sandbox::new();
    sandbox.write_index(&reports_index());
    sandbox
        .cmd()
        .args(["link", "gdrive:/Reports/Q1.pdf", "q1.pdf"])
        .assert()
        .success();
    sandbox
        .cmd()
        .args(["unindex", "gdrive:/Reports"])
        .assert()
        .success();
    assert_eq!(
        sandbox.read_index(),
        json!({
            "drive_files": { "__gdrive_id": "root", "__gdrive_folder": true },
            "links": {}
        })
    );
}

#[test]
fn unindexing_the_root_is_rejected() {
    let sandbox = Sandbox::new();
    let assert = sandbox
        .cmd()
        .args(["unindex", "gdrive:/"])
        .assert()
        .code(1);
    assert!(stderr_of(&assert).contains("SK106"));
}

#[test]
fn invalid_drive_path_is_a_user_error() {
    let sandbox = Sandbox::new();
    let assert = sandbox
        .cmd()
        .args(["link", "Reports/Q1.pdf", "q1.pdf"])
        .assert()
        .code(1);
    assert!(stderr_of(&assert).contains("SK101"));
    assert!(stderr_of(&assert).contains("gdrive:/"));
}

#[test]
fn operations_on_unindexed_paths_fail_before_touching_drive() {
    let sandbox = Sandbox::new();
    sandbox.write_index(&reports_index());
    let before = fs::read_to_string(sandbox.index_file()).expect("read");

    let assert = sandbox
        .cmd()
        .args(["download", "gdrive:/Reports/Q2.pdf"])
        .assert()
        .code(1);
    assert!(stderr_of(&assert).contains("SK104"));
    assert!(stderr_of(&assert).contains("Q2.pdf"));
    let assert = sandbox
        .cmd()
        .args(["link", "gdrive:/Archive/old.pdf", "old.pdf"])
        .assert()
        .code(1);
    assert!(stderr_of(&assert).contains("SK104"));

    assert_eq!(fs::read_to_string(sandbox.index_file()).expect("read"), before);
}

#[test]
fn sync_of_a_missing_local_file_is_reported() {
    let sandbox = Sandbox::new();
    sandbox.write_index(&reports_index());
    sandbox.write_token();
    sandbox
        .cmd()
        .args(["link", "gdrive:/Reports/Q1.pdf", "q1.pdf"])
        .assert()
        .success();
    let assert = sandbox
        .cmd()
        .args(["sync", "q1.pdf"])
        .assert()
        .code(1);
    assert!(stderr_of(&assert).contains("SK301"));
}

#[test]
fn json_envelope_for_errors() {
    let sandbox = Sandbox::new();
    sandbox.write_index(&reports_index());
    let assert = sandbox
        .cmd()
        .args(["--json", "unlink", "gdrive:/Reports/Q1.pdf"])
        .assert()
        .code(1);
    let payload = parse_json(&assert.get_output().stdout);
    assert_eq!(payload["status"], "user-error");
    assert_eq!(payload["details"]["code"], "SK201");
    assert!(payload["message"]
        .as_str()
        .is_some_and(|message| message.starts_with("syncker unlink: ")));
}

#[test]
fn json_envelope_for_list() {
    let sandbox = Sandbox::new();
    sandbox.write_index(&reports_index());
    let assert = sandbox.cmd().args(["list", "--json"]).assert().success();
    let payload = parse_json(&assert.get_output().stdout);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["details"]["count"], 2);
    assert_eq!(payload["details"]["lines"][1]["label"], "Q1.pdf");
}

#[test]
fn corrupt_index_is_left_alone() {
    let sandbox = Sandbox::new();
    fs::create_dir_all(&sandbox.state).expect("state dir");
    fs::write(sandbox.index_file(), "{ not json").expect("seed");
    let assert = sandbox.cmd().arg("list").assert().code(1);
    assert!(stderr_of(&assert).contains("SK502"));
    assert_eq!(
        fs::read_to_string(sandbox.index_file()).expect("read"),
        "{ not json"
    );
}

#[test]
fn state_dir_must_be_a_directory() {
    let sandbox = Sandbox::new();
    fs::create_dir_all(sandbox.state.parent().expect("parent")).expect("config dir");
    fs::write(&sandbox.state, "").expect("seed");
    let assert = sandbox.cmd().arg("list").assert().code(1);
    assert!(stderr_of(&assert).contains("SK501"));
}
