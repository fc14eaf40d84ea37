//! Fixtures shared by the plugin tests.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{HostError, Result};

use super::candidate::Candidate;

/// A candidate whose metadata is canned instead of produced by a process.
pub(crate) struct FakeCandidate {
    pub path: PathBuf,
    pub exec_fails: bool,
    pub meta: String,
}

impl FakeCandidate {
    pub fn new(path: &str, meta: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            exec_fails: false,
            meta: meta.to_string(),
        }
    }

    pub fn failing(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            exec_fails: true,
            meta: String::new(),
        }
    }
}

#[async_trait]
impl Candidate for FakeCandidate {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn metadata(&self) -> Result<Vec<u8>> {
        if self.exec_fails {
            return Err(HostError::MetadataCommand("faked failure to exec".into()));
        }
        Ok(self.meta.clone().into_bytes())
    }
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A script printing valid metadata for vendor `vendor`.
#[cfg(unix)]
pub(crate) fn write_plugin(dir: &Path, name: &str, vendor: &str) -> PathBuf {
    write_script(
        dir,
        &format!("docker-{}", name),
        &format!(
            r#"if [ "$1" = "docker-cli-plugin-metadata" ]; then
  echo '{{"SchemaVersion":"0.1.0","Vendor":"{}","Version":"v0.1.0","ShortDescription":"The {} plugin"}}'
  exit 0
fi
exit 0"#,
            vendor, name
        ),
    )
}

/// An empty directory tree standing in for `[extra..., user, system...]`.
pub(crate) fn mkdirs(root: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|n| {
            let dir = root.join(n);
            fs::create_dir_all(&dir).unwrap();
            dir
        })
        .collect()
}
