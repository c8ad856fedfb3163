//! A throwaway workspace with fake `gh` and `hatch-registry` programs.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::{json, Value};
use tempfile::TempDir;

pub const REGISTRY: &str = r#"{
  "registry_schema_version": "1.1.0",
  "repositories": [
    { "name": "Hatching-Dev", "url": "https://github.com/CrackingShells/Hatching-Dev", "packages": [] }
  ]
}
"#;

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("fixture dir");
        let root = dir.path();
        let bin = root.join("bin");
        fs::create_dir_all(&bin).expect("bin dir");

        fs::write(root.join("registry.json"), REGISTRY).expect("registry");
        write_script(
            &bin.join("gh"),
            &format!(
                "echo \"$@\" >> '{root}/gh.log'\ncat >> '{root}/gh.stdin'\nexit 0",
                root = root.display()
            ),
        );
        write_script(
            &bin.join("hatch-registry"),
            &format!(
                "echo \"$@\" >> '{root}/registry.log'\n\
                 if [ \"$1\" = validate-package ]; then\n\
                 cat '{root}/validator-output' 2>/dev/null\n\
                 exit \"$(cat '{root}/validator-exit' 2>/dev/null || echo 0)\"\n\
                 fi\n\
                 exit 0",
                root = root.display()
            ),
        );
        fs::write(
            root.join("config.yaml"),
            format!(
                "registry_path: {root}/registry.json\n\
                 state_dir: {root}/state\n\
                 gh_program: {root}/bin/gh\n\
                 registry_cli: {root}/bin/hatch-registry\n",
                root = root.display()
            ),
        )
        .expect("config");

        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.path().join("state")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.path().join("registry.json")
    }

    /// `hatch-dispatch --config <fixture config>` with a clean environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hatch-dispatch"));
        cmd.env("HOME", self.path())
            .env("USERPROFILE", self.path())
            .env_remove("GITHUB_EVENT_PATH")
            .env_remove("HATCH_CONFIG")
            .env_remove("HATCH_STATE_DIR")
            .env_remove("HATCH_REGISTRY")
            .arg("--config")
            .arg(self.path().join("config.yaml"));
        cmd
    }

    /// Make the fake validator exit with `code`, printing `output`.
    pub fn validator(&self, code: i32, output: &str) {
        fs::write(self.path().join("validator-exit"), code.to_string()).expect("exit code");
        fs::write(self.path().join("validator-output"), format!("{output}\n")).expect("output");
    }

    pub fn write_event(&self, name: &str, event: &Value) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, serde_json::to_vec_pretty(event).expect("encode")).expect("event");
        path
    }

    pub fn gh_log(&self) -> String {
        fs::read_to_string(self.path().join("gh.log")).unwrap_or_default()
    }

    pub fn gh_stdin(&self) -> String {
        fs::read_to_string(self.path().join("gh.stdin")).unwrap_or_default()
    }

    pub fn registry_log(&self) -> String {
        fs::read_to_string(self.path().join("registry.log")).unwrap_or_default()
    }
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
}

pub fn scenario_payload() -> Value {
    json!({
        "repository": "CrackingShells/Hatching-Dev",
        "artifact_name": "foo-package",
        "workflow_id": "package-validation.yml",
        "run_id": 123456789,
        "pr_number": 42,
        "package_name": "foo",
        "version": "1.0.0",
    })
}

pub fn event(action: &str, payload: Value) -> Value {
    json!({ "action": action, "client_payload": payload })
}
