//! Run configuration and resource bindings.

use crate::data::{ByteBuffer, TextureDescriptor};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Options for [`WgslExec::execute`](crate::WgslExec::execute) and dispatch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Override values keyed by name or by the decimal `@id`.
    pub constants: IndexMap<String, f64>,
}

impl ExecConfig {
    pub fn with_constant(mut self, name: impl Into<String>, value: f64) -> Self {
        self.constants.insert(name.into(), value);
        self
    }
}

/// Resource bound to one `@group(g) @binding(b)` slot.
#[derive(Debug, Clone)]
pub enum BindingResource {
    /// Storage buffer.
    Buffer(ByteBuffer),
    Uniform(ByteBuffer),
    Texture {
        buffer: ByteBuffer,
        descriptor: TextureDescriptor,
    },
    Sampler,
}

/// `group -> binding -> resource`.
pub type BindGroups = BTreeMap<u32, BTreeMap<u32, BindingResource>>;

/// Build bind groups from `(group, binding, resource)` triples.
pub fn bind_groups(entries: impl IntoIterator<Item = (u32, u32, BindingResource)>) -> BindGroups {
    let mut groups = BindGroups::new();
    for (group, binding, resource) in entries {
        groups.entry(group).or_default().insert(binding, resource);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_json() {
        let config: ExecConfig =
            serde_json::from_str(r#"{"constants": {"WG": 8, "1": 0.5}}"#).unwrap();
        assert_eq!(config.constants.get("WG"), Some(&8.0));
        let keys: Vec<&str> = config.constants.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["WG", "1"]);
    }

    #[test]
    fn test_missing_fields_default() {
        let config: ExecConfig = serde_json::from_str("{}").unwrap();
        assert!(config.constants.is_empty());
    }

    #[test]
    fn test_bind_groups_builder() {
        let buffer = ByteBuffer::zeroed(16);
        let groups = bind_groups([
            (0, 0, BindingResource::Buffer(buffer.clone())),
            (1, 2, BindingResource::Sampler),
        ]);
        assert!(matches!(groups[&1][&2], BindingResource::Sampler));
        match &groups[&0][&0] {
            BindingResource::Buffer(b) => assert!(b.ptr_eq(&buffer)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
