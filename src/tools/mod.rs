//! Tool capability contract and the name-indexed tool repository

use std::{collections::BTreeMap, sync::Arc, sync::OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::errors::{RegistryError, ToolError};

pub mod builtin;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

/// Immutable once built; shared by reference across request handlers.
#[derive(Default, Clone)]
pub struct ToolRepository {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRepository {
    pub fn builder() -> ToolRepositoryBuilder {
        ToolRepositoryBuilder::default()
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tools in name order.
    pub fn tools(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Default)]
pub struct ToolRepositoryBuilder {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRepositoryBuilder {
    pub fn register(mut self, tool: impl Tool + 'static) -> Result<Self, RegistryError> {
        let name = tool.name().to_string();
        if !tool_name_pattern().is_match(&name) {
            return Err(RegistryError::InvalidToolName(name));
        }
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }

        self.tools.insert(name, Arc::new(tool));
        Ok(self)
    }

    pub fn build(self) -> ToolRepository {
        ToolRepository { tools: self.tools }
    }
}

fn tool_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").expect("valid tool name regex"))
}
