#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::assert::Assert;
use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A throwaway home with a state dir and a working dir.
pub struct Sandbox {
    _temp: TempDir,
    pub home: PathBuf,
    pub state: PathBuf,
    pub work: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let temp = tempfile::Builder::new()
            .prefix("syncker-cli")
            .tempdir()
            .expect("tempdir");
        let home = temp.path().join("home");
        let state = home.join(".config/syncker");
        let work = temp.path().join("work");
        fs::create_dir_all(&home).expect("home");
        fs::create_dir_all(&work).expect("work");
        Self {
            _temp: temp,
            home,
            state,
            work,
        }
    }

    /// `syncker` pointed at this sandbox. Drive endpoints default to a
    /// closed local port so nothing reaches the network by accident.
    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("syncker");
        cmd.current_dir(&self.work)
            .env("HOME", &self.home)
            .env("SYNCKER_DIR", &self.state)
            .env("SYNCKER_PROGRESS", "0")
            .env("SYNCKER_DRIVE_API", "http://127.0.0.1:9/drive/v3")
            .env("SYNCKER_UPLOAD_API", "http://127.0.0.1:9/upload/drive/v3")
            .env("SYNCKER_HTTP_TIMEOUT", "5")
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn index_file(&self) -> PathBuf {
        self.state.join("index.json")
    }

    pub fn write_index(&self, document: &Value) {
        fs::create_dir_all(&self.state).expect("state dir");
        fs::write(
            self.index_file(),
            serde_json::to_string_pretty(document).expect("serialize"),
        )
        .expect("write index");
    }

    pub fn read_index(&self) -> Value {
        let contents = fs::read_to_string(self.index_file()).expect("read index");
        serde_json::from_str(&contents).expect("index json")
    }

    pub fn write_token(&self) {
        fs::create_dir_all(&self.state).expect("state dir");
        fs::write(
            self.state.join("token.json"),
            json!({
                "token": "test-token",
                "refresh_token": "refresh-me",
                "token_uri": "http://127.0.0.1:9/token",
                "client_id": "client",
                "client_secret": "secret",
                "scopes": ["https://www.googleapis.com/auth/drive"]
            })
            .to_string(),
        )
        .expect("write token");
    }

    pub fn local(&self, name: &str) -> PathBuf {
        self.work.join(name)
    }
}

/// `Reports/Q1.pdf` indexed, nothing linked.
pub fn reports_index() -> Value {
    json!({
        "drive_files": {
            "__gdrive_id": "root",
            "__gdrive_folder": true,
            "Reports": {
                "__gdrive_id": "r1",
                "__gdrive_folder": true,
                "Q1.pdf": { "__gdrive_id": "f1", "__gdrive_folder": false }
            }
        },
        "links": {}
    })
}

pub fn parse_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("json envelope")
}

pub fn path_str(path: &Path) -> String {
    path.to_str().expect("utf-8 path").to_string()
}

pub fn stdout_of(assert: &Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("stdout")
}

pub fn stderr_of(assert: &Assert) -> String {
    String::from_utf8(assert.get_output().stderr.clone()).expect("stderr")
}
