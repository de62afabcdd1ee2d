use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha512};
use tracing::{debug, info};

use crate::error::{MetadataError, Result};

/// Instance and project facts served from the static metadata paths.
/// Read-only once loaded.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MetadataSnapshot {
    #[serde(default)]
    pub instance: InstanceMetadata,
    #[serde(default)]
    pub project: ProjectMetadata,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct InstanceMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub numeric_project_id: String,
    #[serde(default)]
    pub project_id: String,
}

impl MetadataSnapshot {
    /// `projects/{numeric_project_id}/zones/{region}-1`
    pub fn zone(&self) -> String {
        format!(
            "projects/{}/zones/{}-1",
            self.project.numeric_project_id, self.instance.region
        )
    }
}

/// Load the metadata file. `.yaml`/`.yml` files go through the YAML parser,
/// everything else is read as JSON. A missing `instance.id` is replaced by a
/// digest of the load time.
pub fn load(path: &Path) -> Result<MetadataSnapshot> {
    if path.as_os_str().is_empty() {
        return Err(MetadataError::config("metadata file required"));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        MetadataError::config(format!("unable to read metadata file {}: {}", path.display(), e))
    })?;
    let content = expand_env_vars(&content);

    let mut snapshot = parse(path, &content)?;
    if snapshot.instance.id.is_empty() {
        snapshot.instance.id = generate_instance_id();
        info!("instance id not configured, generated {}", snapshot.instance.id);
    }
    debug!("metadata loaded: {:?}", snapshot);
    Ok(snapshot)
}

fn parse(path: &Path, content: &str) -> Result<MetadataSnapshot> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

/// Hex encoded SHA-512 of the current wall-clock time.
pub fn generate_instance_id() -> String {
    let now = chrono::Local::now().to_string();
    hex::encode(Sha512::digest(now.as_bytes()))
}

/// Replace `${VAR}` and `${VAR:default}` with values from the environment.
fn expand_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}
