pub mod mock;
pub mod ollama;
pub mod openrouter;

use std::collections::HashMap;
use std::sync::Arc;

use scanforge_core::PlanProvider;

/// Registry of planning providers, looked up by name.
pub struct PlanRegistry {
    providers: HashMap<String, Arc<dyn PlanProvider>>,
}

impl PlanRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn PlanProvider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PlanProvider>> {
        self.providers.get(name).cloned()
    }

    /// First provider following the configured preference order.
    pub fn first_of(&self, names: &[String]) -> Option<Arc<dyn PlanProvider>> {
        names.iter().find_map(|name| self.get(name))
    }

    pub fn list(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

impl Default for PlanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockPlanner;

    #[test]
    fn test_registry_preference_order() {
        let mut registry = PlanRegistry::new();
        registry.register("a", Arc::new(MockPlanner::new("a")));
        registry.register("b", Arc::new(MockPlanner::new("b")));

        let picked = registry
            .first_of(&["missing".into(), "b".into(), "a".into()])
            .unwrap();
        assert_eq!(picked.name(), "b");
    }
}
