//! `launch` request arguments.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;
use wgsl_exec::{bind_groups, BindGroups, BindingResource, ByteBuffer, ExecConfig};

/// What to debug: a shader file, and optionally one invocation of a
/// compute dispatch over host-supplied buffers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    /// Path to the `.wgsl` source.
    pub program: PathBuf,
    /// Compute entry point. Without one, module-scope declarations are
    /// stepped instead.
    #[serde(default)]
    pub entry: Option<String>,
    /// Workgroup counts of the simulated dispatch.
    #[serde(default = "one_workgroup")]
    pub dispatch: [u32; 3],
    /// Global invocation id to stop in.
    #[serde(default)]
    pub invocation: [u32; 3],
    /// Override values by name or `@id`.
    #[serde(default)]
    pub constants: IndexMap<String, f64>,
    #[serde(default)]
    pub buffers: Vec<BufferBinding>,
    #[serde(default = "default_true")]
    pub stop_on_entry: bool,
}

/// Initial contents of one `@group/@binding` buffer, as 32-bit words.
#[derive(Debug, Clone, Deserialize)]
pub struct BufferBinding {
    pub group: u32,
    pub binding: u32,
    #[serde(default)]
    pub uniform: bool,
    pub data: Vec<u32>,
}

fn one_workgroup() -> [u32; 3] {
    [1, 1, 1]
}

fn default_true() -> bool {
    true
}

impl LaunchConfig {
    pub fn from_value(value: &serde_json::Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }

    pub fn exec_config(&self) -> ExecConfig {
        ExecConfig {
            constants: self.constants.clone(),
        }
    }

    /// Fresh buffers holding the configured words.
    pub fn bind_groups(&self) -> BindGroups {
        bind_groups(self.buffers.iter().map(|b| {
            let buffer = ByteBuffer::from_slice(&b.data);
            let resource = if b.uniform {
                BindingResource::Uniform(buffer)
            } else {
                BindingResource::Buffer(buffer)
            };
            (b.group, b.binding, resource)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_launch() {
        let value = serde_json::json!({ "program": "shader.wgsl" });
        let config = LaunchConfig::from_value(&value).unwrap();
        assert_eq!(config.program, PathBuf::from("shader.wgsl"));
        assert_eq!(config.entry, None);
        assert_eq!(config.dispatch, [1, 1, 1]);
        assert!(config.stop_on_entry);
        assert!(config.bind_groups().is_empty());
    }

    #[test]
    fn test_dispatch_launch() {
        let value = serde_json::json!({
            "program": "k.wgsl",
            "entry": "main",
            "dispatch": [4, 1, 1],
            "invocation": [5, 0, 0],
            "constants": { "WG": 8 },
            "stopOnEntry": false,
            "buffers": [
                { "group": 0, "binding": 1, "data": [1, 2, 3] },
                { "group": 1, "binding": 0, "uniform": true, "data": [7] }
            ]
        });
        let config = LaunchConfig::from_value(&value).unwrap();
        assert_eq!(config.entry.as_deref(), Some("main"));
        assert_eq!(config.invocation, [5, 0, 0]);
        assert!(!config.stop_on_entry);
        assert_eq!(config.exec_config().constants.get("WG"), Some(&8.0));

        let groups = config.bind_groups();
        match &groups[&0][&1] {
            BindingResource::Buffer(buffer) => assert_eq!(buffer.read_as::<u32>(), vec![1, 2, 3]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(groups[&1][&0], BindingResource::Uniform(_)));
    }

    #[test]
    fn test_missing_program_is_rejected() {
        let value = serde_json::json!({ "entry": "main" });
        assert!(LaunchConfig::from_value(&value).is_err());
    }
}
