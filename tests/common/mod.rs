//! Common test utilities

#![allow(dead_code)]

use cmdkit::io::MemoryOutput;
use cmdkit::runner::{RegistrationPolicy, Runner};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Create a temporary directory with a cmdkit.yml file
pub fn create_test_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("cmdkit.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Write a manifest file into `dir`, creating it when needed
pub fn write_manifest(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// A runner writing to an in-memory buffer
pub fn memory_runner(policy: RegistrationPolicy) -> (Runner, Rc<RefCell<MemoryOutput>>) {
    let out = Rc::new(RefCell::new(MemoryOutput::new()));
    let mut runner = Runner::with_policy(policy);
    runner.set_output(out.clone());
    (runner, out)
}

/// Owned argument vector
pub fn argv(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}
