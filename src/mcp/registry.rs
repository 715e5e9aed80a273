//! Capability handler contract and the method routing table

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::ProtocolError;

/// A capability handler serving one or more JSON-RPC methods.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    fn methods(&self) -> &'static [&'static str];

    fn is_handle(&self, method: &str) -> bool {
        self.methods().contains(&method)
    }

    async fn execute(&self, method: &str, params: Map<String, Value>)
        -> Result<Value, ProtocolError>;
}

/// Method name to handler table, resolved once and read-only afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    routes: HashMap<&'static str, Arc<dyn RequestHandler>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    pub fn resolve(&self, method: &str) -> Option<&Arc<dyn RequestHandler>> {
        self.routes.get(method)
    }

    pub fn methods(&self) -> Vec<&'static str> {
        let mut methods = self.routes.keys().copied().collect::<Vec<_>>();
        methods.sort_unstable();
        methods
    }

    pub async fn dispatch(
        &self,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ProtocolError> {
        let handler = self.resolve(method).ok_or_else(|| {
            ProtocolError::method_not_found(format!("Method '{method}' not supported"))
        })?;
        handler.execute(method, params).await
    }
}

#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: Vec<Arc<dyn RequestHandler>>,
}

impl HandlerRegistryBuilder {
    pub fn handler(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Earlier registrations win when two handlers claim the same method.
    pub fn build(self) -> HandlerRegistry {
        let mut routes: HashMap<&'static str, Arc<dyn RequestHandler>> = HashMap::new();
        for handler in self.handlers {
            for &method in handler.methods() {
                if routes.contains_key(method) {
                    warn!(method, "method already claimed by an earlier handler");
                    continue;
                }
                routes.insert(method, Arc::clone(&handler));
            }
        }

        HandlerRegistry { routes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed {
        methods: &'static [&'static str],
        reply: &'static str,
    }

    #[async_trait]
    impl RequestHandler for Fixed {
        fn methods(&self) -> &'static [&'static str] {
            self.methods
        }

        async fn execute(
            &self,
            method: &str,
            _params: Map<String, Value>,
        ) -> Result<Value, ProtocolError> {
            Ok(json!({ "handler": self.reply, "method": method }))
        }
    }

    #[tokio::test]
    async fn routes_each_method_to_its_handler() {
        let registry = HandlerRegistry::builder()
            .handler(Fixed { methods: &["a", "b"], reply: "first" })
            .handler(Fixed { methods: &["c"], reply: "second" })
            .build();

        let value = registry.dispatch("b", Map::new()).await.expect("routed");
        assert_eq!(value, json!({"handler": "first", "method": "b"}));
        let value = registry.dispatch("c", Map::new()).await.expect("routed");
        assert_eq!(value["handler"], "second");
        assert_eq!(registry.methods(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn first_registration_wins_on_overlap() {
        let registry = HandlerRegistry::builder()
            .handler(Fixed { methods: &["shared"], reply: "first" })
            .handler(Fixed { methods: &["shared"], reply: "second" })
            .build();

        let value = registry.dispatch("shared", Map::new()).await.expect("routed");
        assert_eq!(value["handler"], "first");
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let registry = HandlerRegistry::builder().build();
        let error = registry
            .dispatch("resources/list", Map::new())
            .await
            .expect_err("no handler");
        assert!(matches!(error, ProtocolError::MethodNotFound(_)));
        assert_eq!(error.to_string(), "Method 'resources/list' not supported");
    }

    #[test]
    fn is_handle_follows_declared_methods() {
        let handler = Fixed { methods: &["tools/call"], reply: "" };
        assert!(handler.is_handle("tools/call"));
        assert!(!handler.is_handle("tools/list"));
    }
}
