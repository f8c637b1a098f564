// Shared helpers for integration tests.
//
// Provides a temporary environment directory and a fluent builder so each
// integration test can lay out legacy sources and application files without
// repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tt_env::config::{self, Config};

/// An isolated environment directory backed by a [`tempfile::TempDir`].
///
/// The environment lives in `<tempdir>/<name>` so its directory name is
/// predictable (package names default to it). Everything is deleted when the
/// value is dropped.
pub struct EnvFixture {
    root: tempfile::TempDir,
    dir: PathBuf,
}

impl EnvFixture {
    /// Path to the environment directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// A scratch directory next to the environment (outside of it).
    pub fn sibling(&self, name: &str) -> PathBuf {
        let path = self.root.path().join(name);
        std::fs::create_dir_all(&path).expect("create sibling dir");
        path
    }

    /// Load the canonical config written into the environment.
    pub fn config(&self) -> Config {
        let (_, cfg) = config::load_from_dir(&self.dir).expect("load tt.yaml");
        cfg
    }

    /// Raw content of `rel` inside the environment.
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.join(rel)).expect("read file")
    }
}

/// Fluent builder for [`EnvFixture`].
pub struct EnvFixtureBuilder {
    fixture: EnvFixture,
}

impl EnvFixtureBuilder {
    /// Begin building an empty environment named `app`.
    pub fn new() -> Self {
        Self::named("app")
    }

    /// Begin building an empty environment with the given directory name.
    pub fn named(name: &str) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let dir = root.path().join(name);
        std::fs::create_dir(&dir).expect("create env dir");
        Self {
            fixture: EnvFixture { root, dir },
        }
    }

    /// Write `content` to `rel` inside the environment, creating parents.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        let path = self.fixture.dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write file");
        self
    }

    /// Make the environment a single application.
    pub fn with_app(self) -> Self {
        self.with_file("init.lua", "require('log').info('started')\n")
    }

    /// Add a `.cartridge.yml` legacy source.
    pub fn with_cartridge(self, yaml: &str) -> Self {
        self.with_file(".cartridge.yml", yaml)
    }

    /// Add a `.tarantoolctl` legacy source.
    pub fn with_tarantoolctl(self, lua: &str) -> Self {
        self.with_file(".tarantoolctl", lua)
    }

    /// Finish building and return the configured fixture.
    pub fn build(self) -> EnvFixture {
        self.fixture
    }
}

/// Write an executable shell script standing in for the interpreter.
///
/// The script drains stdin (the evaluation script) and then runs `body`.
#[cfg(unix)]
pub fn fake_tarantool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt as _;

    let path = dir.join("tarantool");
    std::fs::write(&path, format!("#!/bin/sh\ncat > /dev/null\n{body}\n")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("make script executable");
    path
}
