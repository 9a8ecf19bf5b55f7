#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use jarlift_core::prelude::{CommandOutput, DeployConfig, LocalRemote, Privilege, Remote};
use tempfile::TempDir;

/// Local remote that records each operation and the privilege it ran with.
#[derive(Debug, Default)]
pub struct RecordingRemote {
    inner: LocalRemote,
    calls: RefCell<Vec<String>>,
}

impl RecordingRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Recorded operation names, without arguments.
    pub fn ops(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.split(' ').next().unwrap_or_default().to_string())
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl Remote for RecordingRemote {
    fn describe(&self) -> String {
        "recording".to_string()
    }

    fn run(&self, privilege: &Privilege, script: &str) -> anyhow::Result<CommandOutput> {
        self.record(format!("run {privilege}"));
        self.inner.run(privilege, script)
    }

    fn upload(&self, local: &Path, temp_parent: &Path) -> anyhow::Result<PathBuf> {
        self.record("upload".to_string());
        self.inner.upload(local, temp_parent)
    }

    fn read_link(&self, path: &Path) -> anyhow::Result<Option<PathBuf>> {
        self.record("read_link".to_string());
        self.inner.read_link(path)
    }

    fn exists(&self, path: &Path) -> anyhow::Result<bool> {
        self.record("exists".to_string());
        self.inner.exists(path)
    }

    fn glob(
        &self,
        privilege: &Privilege,
        dir: &Path,
        pattern: &str,
    ) -> anyhow::Result<Vec<PathBuf>> {
        self.record(format!("glob {privilege}"));
        self.inner.glob(privilege, dir, pattern)
    }

    fn copy(&self, privilege: &Privilege, from: &Path, to: &Path) -> anyhow::Result<()> {
        self.record(format!("copy {privilege}"));
        self.inner.copy(privilege, from, to)
    }

    fn remove(&self, privilege: &Privilege, paths: &[PathBuf]) -> anyhow::Result<()> {
        self.record(format!("remove {privilege}"));
        self.inner.remove(privilege, paths)
    }

    fn remove_dir(&self, privilege: &Privilege, dir: &Path) -> anyhow::Result<()> {
        self.record(format!("remove_dir {privilege}"));
        self.inner.remove_dir(privilege, dir)
    }

    fn symlink(&self, privilege: &Privilege, target: &Path, link: &Path) -> anyhow::Result<()> {
        self.record(format!("symlink {privilege}"));
        self.inner.symlink(privilege, target, link)
    }
}

/// Scratch layout: an installation root, an upload area and a build dir.
pub struct Sandbox {
    pub temp: TempDir,
    pub root: PathBuf,
    pub uploads: PathBuf,
    pub build: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("opt").join("bouncer");
        let uploads = temp.path().join("tmp");
        let build = temp.path().join("build");
        for dir in [&root, &uploads, &build] {
            fs::create_dir_all(dir).unwrap();
        }
        Self {
            temp,
            root,
            uploads,
            build,
        }
    }

    /// Config for `bouncer` rooted in the sandbox, restarting by touching
    /// `restarted` in the temp dir.
    pub fn config(&self) -> DeployConfig {
        DeployConfig::for_app("bouncer")
            .with_root(&self.root)
            .with_temp_dir(&self.uploads)
            .with_restart_command(format!(
                "touch '{}'",
                self.restart_marker().display()
            ))
    }

    pub fn restart_marker(&self) -> PathBuf {
        self.temp.path().join("restarted")
    }

    /// Write `bouncer-<version>.jar` into the build dir.
    pub fn build_artifact(&self, version: &str) -> PathBuf {
        let path = self.build.join(format!("bouncer-{version}.jar"));
        fs::write(&path, format!("jar {version}")).unwrap();
        path
    }

    /// Write `bouncer-<version>.jar` straight into the root.
    pub fn install_file(&self, version: &str) -> PathBuf {
        let path = self.root.join(format!("bouncer-{version}.jar"));
        fs::write(&path, format!("jar {version}")).unwrap();
        path
    }

    pub fn point_current_at(&self, target: &Path) {
        let link = self.root.join("current.jar");
        let _ = fs::remove_file(&link);
        std::os::unix::fs::symlink(target, link).unwrap();
    }

    pub fn root_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.root)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}
