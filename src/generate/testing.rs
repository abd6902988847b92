//! Test doubles for the generation pipeline: scripted listers and a fake
//! Terraform that emits resource configuration into a mock filesystem.

#![cfg(test)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::process::Output;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::generate::catalog::{Lister, ListerData};
use crate::generate::error::ListerError;
use crate::grafana::Client;
use crate::traits::command::create_exit_status;
use crate::traits::{CommandExecutor, FileSystem, MockFileSystem};

/// Lister returning a fixed list of identifiers, optionally after a delay
pub struct StaticLister {
    ids: Vec<String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl StaticLister {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared counter of how often the lister ran
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Lister for StaticLister {
    async fn list_ids(
        &self,
        _cancel: &CancellationToken,
        _client: &Client,
        _data: &ListerData,
    ) -> Result<Vec<String>, ListerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.ids.clone())
    }
}

/// Lister that always fails, optionally after a delay
pub struct FailingLister {
    message: String,
    delay: Option<Duration>,
}

impl FailingLister {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Lister for FailingLister {
    async fn list_ids(
        &self,
        _cancel: &CancellationToken,
        _client: &Client,
        _data: &ListerData,
    ) -> Result<Vec<String>, ListerError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(self.message.clone().into())
    }
}

/// Lister that never finishes on its own
pub struct PendingLister;

#[async_trait]
impl Lister for PendingLister {
    async fn list_ids(
        &self,
        _cancel: &CancellationToken,
        _client: &Client,
        _data: &ListerData,
    ) -> Result<Vec<String>, ListerError> {
        std::future::pending::<()>().await;
        Ok(Vec::new())
    }
}

/// Lister that echoes the environment it was called for
pub struct EnvironmentLister;

#[async_trait]
impl Lister for EnvironmentLister {
    async fn list_ids(
        &self,
        _cancel: &CancellationToken,
        _client: &Client,
        data: &ListerData,
    ) -> Result<Vec<String>, ListerError> {
        let environment = if data.environment.is_empty() {
            "default".to_string()
        } else {
            data.environment.clone()
        };
        Ok(vec![environment])
    }
}

/// A client that is never dialled by the scripted listers
pub fn test_client() -> Client {
    Client::grafana("http://localhost:3000", "admin:admin").unwrap()
}

/// Fake `terraform` binary backed by a [`MockFileSystem`]
///
/// `plan -generate-config-out=<file>` reads every `*imports.tf` in the
/// working directory and writes a `resource` block for each import target
/// that has no configuration yet, in reverse order.
pub struct FakeTerraform {
    fs: MockFileSystem,
    fail_plan: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeTerraform {
    pub fn new(fs: MockFileSystem) -> Self {
        Self {
            fs,
            fail_plan: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_plan(mut self, stderr: &str) -> Self {
        self.fail_plan = Some(stderr.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn plan(&self, out_file: &str, working_dir: &Path) -> Result<Output> {
        if let Some(stderr) = &self.fail_plan {
            return Ok(output(1, "", stderr));
        }

        let out_path = working_dir.join(out_file);
        if self.fs.exists(&out_path) {
            return Ok(output(1, "", "Error: Target generated file already exists"));
        }

        let import_re = Regex::new(r#"to\s*=\s*([\w-]+)\.([\w-]+)\s*\n\s*id\s*=\s*"([^"]*)""#)?;
        let resource_re = Regex::new(r#"resource\s+"([^"]+)"\s+"([^"]+)""#)?;

        let mut declared = Vec::new();
        let mut targets = Vec::new();
        for path in self.fs.read_dir(working_dir)? {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if !name.ends_with(".tf") {
                continue;
            }
            let contents = self.fs.read_to_string(&path)?;
            for caps in resource_re.captures_iter(&contents) {
                declared.push((caps[1].to_string(), caps[2].to_string()));
            }
            if name.ends_with("imports.tf") {
                for caps in import_re.captures_iter(&contents) {
                    targets.push((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()));
                }
            }
        }

        let mut generated = String::from("# __generated__ by Terraform\n\n");
        for (resource_type, name, id) in targets.iter().rev() {
            if declared.contains(&(resource_type.clone(), name.clone())) {
                continue;
            }
            generated.push_str(&format!(
                "resource \"{}\" \"{}\" {{\n  remote_id = \"{}\"\n}}\n\n",
                resource_type, name, id
            ));
        }
        self.fs.write(&out_path, &generated)?;

        Ok(output(0, "Plan: 0 to add", ""))
    }
}

impl CommandExecutor for FakeTerraform {
    fn execute(&self, command: &str, args: &[&str], working_dir: &Path) -> Result<Output> {
        let mut call = vec![command];
        call.extend_from_slice(args);
        self.calls.lock().unwrap().push(call.join(" "));

        match args {
            ["version"] | ["init", ..] => Ok(output(0, "", "")),
            ["plan", rest @ ..] => {
                let Some(out_file) = rest
                    .iter()
                    .find_map(|a| a.strip_prefix("-generate-config-out="))
                else {
                    bail!("plan called without -generate-config-out");
                };
                self.plan(out_file, working_dir)
            }
            _ => bail!("unexpected terraform invocation: {}", args.join(" ")),
        }
    }
}

fn output(code: i32, stdout: &str, stderr: &str) -> Output {
    Output {
        status: create_exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}
