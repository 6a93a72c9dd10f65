pub mod mock;
pub mod ollama;
pub mod openrouter;

use std::collections::HashMap;
use std::sync::Arc;

use scanforge_core::VisionProvider;

/// Registry of vision providers, looked up by name.
pub struct VisionRegistry {
    providers: HashMap<String, Arc<dyn VisionProvider>>,
}

impl VisionRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn VisionProvider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn VisionProvider>> {
        self.providers.get(name).cloned()
    }

    /// First provider following the configured preference order.
    pub fn first_of(&self, names: &[String]) -> Option<Arc<dyn VisionProvider>> {
        names.iter().find_map(|name| self.get(name))
    }

    pub fn list(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

impl Default for VisionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockVision;

    #[test]
    fn test_registry_lookup_and_order() {
        let mut registry = VisionRegistry::new();
        registry.register("mock", Arc::new(MockVision::new("mock")));

        assert!(registry.get("mock").is_some());
        assert!(registry.get("missing").is_none());

        let picked = registry
            .first_of(&["missing".into(), "mock".into()])
            .unwrap();
        assert_eq!(picked.name(), "mock");
    }
}
