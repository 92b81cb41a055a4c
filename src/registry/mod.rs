//! Registry loader for agent and tool descriptors
//!
//! Registries are YAML (or JSON) documents whose top-level keys name the
//! entity and whose values hold its fields:
//!
//! ```yaml
//! savings:
//!   description: Computes refinance savings
//!   tools: [calculate_savings]
//!   memory_turns: 6
//! ```
//!
//! A missing file is an empty registry. Any invalid entry fails the whole
//! load; there is no partial registry.

mod document;

use crate::error::PipelineError;
use crate::memory::DEFAULT_MEMORY_CAPACITY;
use crate::tools::ToolRegistry;
use crate::Result;
use document::RawDocument;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// What to do when a registry document repeats a top-level key
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the load
    Reject,
    /// Log a warning; the last entry wins
    #[default]
    WarnAndOverwrite,
}

impl FromStr for DuplicatePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(DuplicatePolicy::Reject),
            "warn" | "warn_and_overwrite" | "overwrite" => Ok(DuplicatePolicy::WarnAndOverwrite),
            other => Err(PipelineError::Config(format!(
                "unknown duplicate policy '{}' (expected 'reject' or 'warn')",
                other
            ))),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DuplicatePolicy::Reject => "reject",
            DuplicatePolicy::WarnAndOverwrite => "warn",
        };
        write!(f, "{}", s)
    }
}

fn default_memory_capacity() -> usize {
    DEFAULT_MEMORY_CAPACITY
}

/// A configured agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDescriptor {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "tools")]
    pub declared_capabilities: Vec<String>,
    #[serde(default = "default_memory_capacity", rename = "memory_turns")]
    pub memory_capacity: usize,
}

/// A configured tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(rename = "impl")]
    pub implementation_reference: String,
    #[serde(default)]
    pub input_schema: Map<String, JsonValue>,
    #[serde(default)]
    pub output_schema: Map<String, JsonValue>,
}

/// Descriptor types the loader knows how to build
trait Descriptor: DeserializeOwned {
    /// Field the map key is merged into
    const KEY_FIELD: &'static str;

    fn check(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

impl Descriptor for AgentDescriptor {
    const KEY_FIELD: &'static str = "id";

    fn check(&self) -> std::result::Result<(), String> {
        if self.memory_capacity == 0 {
            return Err("memory_turns must be at least 1".to_string());
        }
        if self.declared_capabilities.iter().any(|c| c.trim().is_empty()) {
            return Err("tools must not contain empty names".to_string());
        }
        Ok(())
    }
}

impl Descriptor for ToolDescriptor {
    const KEY_FIELD: &'static str = "name";

    fn check(&self) -> std::result::Result<(), String> {
        if self.implementation_reference.trim().is_empty() {
            return Err("impl must not be empty".to_string());
        }
        Ok(())
    }
}

pub type AgentRegistry = BTreeMap<String, AgentDescriptor>;
pub type ToolSpecs = BTreeMap<String, ToolDescriptor>;

pub fn parse_agents(source: &str, registry: &str, policy: DuplicatePolicy) -> Result<AgentRegistry> {
    parse_registry(source, registry, policy)
}

pub fn parse_tools(source: &str, registry: &str, policy: DuplicatePolicy) -> Result<ToolSpecs> {
    parse_registry(source, registry, policy)
}

pub fn load_agents(path: &Path, policy: DuplicatePolicy) -> Result<AgentRegistry> {
    load_registry(path, policy)
}

pub fn load_tools(path: &Path, policy: DuplicatePolicy) -> Result<ToolSpecs> {
    load_registry(path, policy)
}

fn registry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_registry<D: Descriptor>(path: &Path, policy: DuplicatePolicy) -> Result<BTreeMap<String, D>> {
    let name = registry_name(path);

    if !path.exists() {
        debug!(registry = %name, path = %path.display(), "Registry file absent, using empty registry");
        return Ok(BTreeMap::new());
    }

    let source = std::fs::read_to_string(path)?;
    let entries = parse_registry(&source, &name, policy)?;

    info!(registry = %name, entries = entries.len(), "Loaded registry");
    Ok(entries)
}

fn parse_registry<D: Descriptor>(
    source: &str,
    registry: &str,
    policy: DuplicatePolicy,
) -> Result<BTreeMap<String, D>> {
    if RawDocument::is_blank(source) {
        return Ok(BTreeMap::new());
    }

    let document: RawDocument =
        serde_yaml::from_str(source).map_err(|e| PipelineError::InvalidRegistry {
            registry: registry.to_string(),
            reason: e.to_string(),
        })?;

    let raw_entries = match document {
        RawDocument::Empty => return Ok(BTreeMap::new()),
        RawDocument::Entries(entries) => entries,
        RawDocument::Other(kind) => {
            return Err(PipelineError::InvalidRegistry {
                registry: registry.to_string(),
                reason: format!("top level must be a mapping, found {}", kind),
            })
        }
    };

    let mut out = BTreeMap::new();

    for (raw_key, raw_value) in raw_entries {
        let key = entry_key(registry, &raw_key)?;
        let descriptor = build_descriptor::<D>(registry, &key, raw_value)?;

        if out.contains_key(&key) {
            match policy {
                DuplicatePolicy::Reject => {
                    return Err(PipelineError::DuplicateEntry {
                        registry: registry.to_string(),
                        key,
                    })
                }
                DuplicatePolicy::WarnAndOverwrite => {
                    warn!(registry, key = %key, "Duplicate registry entry, keeping the last one");
                }
            }
        }

        out.insert(key, descriptor);
    }

    Ok(out)
}

fn entry_key(registry: &str, raw_key: &Value) -> Result<String> {
    match raw_key {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        Value::String(_) => Err(PipelineError::InvalidEntry {
            registry: registry.to_string(),
            key: String::new(),
            reason: "entry name must not be empty".to_string(),
        }),
        other => Err(PipelineError::InvalidEntry {
            registry: registry.to_string(),
            key: serde_yaml::to_string(other)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            reason: "entry name must be a string".to_string(),
        }),
    }
}

fn build_descriptor<D: Descriptor>(registry: &str, key: &str, raw_value: Value) -> Result<D> {
    let invalid = |reason: String| PipelineError::InvalidEntry {
        registry: registry.to_string(),
        key: key.to_string(),
        reason,
    };

    let mut fields = match raw_value {
        Value::Null => Mapping::new(),
        Value::Mapping(m) => m,
        other => {
            return Err(invalid(format!(
                "expected a mapping of fields, found {}",
                document::kind_of(&other)
            )))
        }
    };

    // the map key is authoritative for the identifier
    fields.insert(
        Value::String(D::KEY_FIELD.to_string()),
        Value::String(key.to_string()),
    );

    let descriptor: D =
        serde_yaml::from_value(Value::Mapping(fields)).map_err(|e| invalid(e.to_string()))?;
    descriptor.check().map_err(invalid)?;

    Ok(descriptor)
}

/// Agent and tool descriptors loaded together
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub agents: AgentRegistry,
    pub tools: ToolSpecs,
}

impl Registries {
    pub fn load(agents_path: &Path, tools_path: &Path, policy: DuplicatePolicy) -> Result<Self> {
        Ok(Self {
            agents: load_agents(agents_path, policy)?,
            tools: load_tools(tools_path, policy)?,
        })
    }

    pub fn agent(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.get(id)
    }

    /// Every agent capability must name a configured tool, and every tool's
    /// `impl` must resolve to a registered tool.
    pub fn cross_check(&self, registered: &ToolRegistry) -> Result<()> {
        let mut problems = Vec::new();

        for agent in self.agents.values() {
            for capability in &agent.declared_capabilities {
                if !self.tools.contains_key(capability) && !registered.contains(capability) {
                    problems.push(format!(
                        "agent '{}' declares unknown tool '{}'",
                        agent.id, capability
                    ));
                }
            }
        }

        for tool in self.tools.values() {
            if !registered.contains(implementation_name(&tool.implementation_reference)) {
                problems.push(format!(
                    "tool '{}' references unregistered implementation '{}'",
                    tool.name, tool.implementation_reference
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::UnresolvedReference {
                registry: "agents/tools".to_string(),
                details: problems.join("; "),
            })
        }
    }
}

/// Last path segment of an implementation reference (`finance::should_alert`
/// or `finance.should_alert` both resolve to `should_alert`)
fn implementation_name(reference: &str) -> &str {
    reference
        .rsplit(|c| c == '.' || c == ':')
        .find(|s| !s.is_empty())
        .unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::create_default_registry;
    use std::io::Write;

    const AGENTS: &str = r#"
rate_retriever:
  description: Picks the market rate
  tools: [load_rates]
savings:
  tools: [calculate_savings]
  memory_turns: 3
alert:
"#;

    #[test]
    fn test_parse_agents_with_defaults() {
        let agents = parse_agents(AGENTS, "agents.yml", DuplicatePolicy::Reject).unwrap();

        assert_eq!(agents.len(), 3);

        let savings = &agents["savings"];
        assert_eq!(savings.id, "savings");
        assert_eq!(savings.description, "");
        assert_eq!(savings.declared_capabilities, vec!["calculate_savings"]);
        assert_eq!(savings.memory_capacity, 3);

        let alert = &agents["alert"];
        assert!(alert.declared_capabilities.is_empty());
        assert_eq!(alert.memory_capacity, 6);
    }

    #[test]
    fn test_parse_tools() {
        let source = r#"
should_alert:
  impl: finance.should_alert
  input_schema: { monthly_savings: number }
"#;
        let tools = parse_tools(source, "tools.yml", DuplicatePolicy::Reject).unwrap();
        let tool = &tools["should_alert"];

        assert_eq!(tool.name, "should_alert");
        assert_eq!(tool.implementation_reference, "finance.should_alert");
        assert_eq!(tool.input_schema["monthly_savings"], "number");
        assert!(tool.output_schema.is_empty());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let agents = load_agents(&dir.path().join("agents.yml"), DuplicatePolicy::Reject).unwrap();
        assert!(agents.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(AGENTS.as_bytes()).unwrap();

        let agents = load_agents(&path, DuplicatePolicy::Reject).unwrap();
        assert_eq!(agents.len(), 3);
    }

    #[test]
    fn test_empty_document_is_empty() {
        assert!(parse_agents("", "agents.yml", DuplicatePolicy::Reject).unwrap().is_empty());
        assert!(parse_agents("~", "agents.yml", DuplicatePolicy::Reject).unwrap().is_empty());
    }

    #[test]
    fn test_non_mapping_top_level_names_registry() {
        for source in ["- a\n- b\n", "just a string", "42"] {
            let err = parse_agents(source, "agents.yml", DuplicatePolicy::Reject).unwrap_err();
            match err {
                PipelineError::InvalidRegistry { registry, .. } => assert_eq!(registry, "agents.yml"),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_tagged_top_level_rejected() {
        let source = "!agents\nsavings:\n  tools: [calculate_savings]\n";
        match parse_agents(source, "agents.yml", DuplicatePolicy::Reject).unwrap_err() {
            PipelineError::InvalidRegistry { reason, .. } => {
                assert_eq!(reason, "top level must be a mapping, found a tagged value")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mistyped_field_fails_whole_load() {
        let source = r#"
good:
  tools: [a]
bad:
  memory_turns: lots
"#;
        let err = parse_agents(source, "agents.yml", DuplicatePolicy::Reject).unwrap_err();
        match err {
            PipelineError::InvalidEntry { registry, key, .. } => {
                assert_eq!(registry, "agents.yml");
                assert_eq!(key, "bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_required_tool_impl() {
        let err = parse_tools("t:\n  input_schema: {}\n", "tools.yml", DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidEntry { ref key, .. } if key == "t"));
    }

    #[test]
    fn test_schema_must_be_mapping() {
        let err = parse_tools("t:\n  impl: x\n  input_schema: [1]\n", "tools.yml", DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidEntry { .. }));
    }

    #[test]
    fn test_zero_memory_turns_rejected() {
        let err = parse_agents("a:\n  memory_turns: 0\n", "agents.yml", DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidEntry { .. }));
    }

    #[test]
    fn test_entry_must_be_mapping() {
        let err = parse_agents("a: hello\n", "agents.yml", DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidEntry { .. }));
    }

    #[test]
    fn test_non_string_key_rejected() {
        let err = parse_agents("7:\n  tools: []\n", "agents.yml", DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidEntry { ref key, .. } if key == "7"));
    }

    #[test]
    fn test_map_key_overrides_inline_id() {
        let agents = parse_agents("a:\n  id: b\n", "agents.yml", DuplicatePolicy::Reject).unwrap();
        assert_eq!(agents["a"].id, "a");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let agents = parse_agents("a:\n  colour: blue\n", "agents.yml", DuplicatePolicy::Reject).unwrap();
        assert_eq!(agents["a"].description, "");
    }

    const DUPLICATED: &str = r#"
savings:
  description: first
savings:
  description: second
"#;

    #[test]
    fn test_duplicate_rejected() {
        let err = parse_agents(DUPLICATED, "agents.yml", DuplicatePolicy::Reject).unwrap_err();
        match err {
            PipelineError::DuplicateEntry { registry, key } => {
                assert_eq!(registry, "agents.yml");
                assert_eq!(key, "savings");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_last_write_wins() {
        let agents = parse_agents(DUPLICATED, "agents.yml", DuplicatePolicy::WarnAndOverwrite).unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents["savings"].description, "second");
    }

    #[test]
    fn test_duplicate_policy_from_str() {
        assert_eq!("reject".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Reject);
        assert_eq!("WARN".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::WarnAndOverwrite);
        assert!("maybe".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn test_cross_check() {
        let registered = create_default_registry();

        let ok = Registries {
            agents: parse_agents("s:\n  tools: [calculate_savings]\n", "agents.yml", DuplicatePolicy::Reject)
                .unwrap(),
            tools: parse_tools(
                "calculate_savings:\n  impl: finance::calculate_savings\n",
                "tools.yml",
                DuplicatePolicy::Reject,
            )
            .unwrap(),
        };
        assert!(ok.cross_check(&registered).is_ok());

        let bad = Registries {
            agents: parse_agents("s:\n  tools: [teleport]\n", "agents.yml", DuplicatePolicy::Reject).unwrap(),
            tools: parse_tools("x:\n  impl: finance.nothing\n", "tools.yml", DuplicatePolicy::Reject).unwrap(),
        };
        let err = bad.cross_check(&registered).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("teleport"));
        assert!(message.contains("finance.nothing"));
    }

    #[test]
    fn test_implementation_name() {
        assert_eq!(implementation_name("finance.should_alert"), "should_alert");
        assert_eq!(implementation_name("finance::should_alert"), "should_alert");
        assert_eq!(implementation_name("should_alert"), "should_alert");
    }
}
