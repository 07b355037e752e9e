use super::{PluginCatalog, PluginCategory, PluginDescriptor, PluginFactory, PluginInfo};
use crate::{ParleyError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// In-memory plugin catalog
#[derive(Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<(PluginCategory, String), Arc<PluginDescriptor>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, replacing any earlier one with the same slug
    pub fn register(&mut self, info: PluginInfo, factory: PluginFactory) -> Arc<PluginDescriptor> {
        let descriptor = Arc::new(PluginDescriptor::new(info, factory));
        let key = (descriptor.category(), descriptor.slug().to_string());
        debug!("Registered {} plugin '{}'", key.0, key.1);
        if self.plugins.insert(key, Arc::clone(&descriptor)).is_some() {
            warn!(
                "Replaced previously registered {} plugin '{}'",
                descriptor.category(),
                descriptor.slug()
            );
        }
        descriptor
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl PluginCatalog for PluginRegistry {
    fn lookup(&self, slug: &str, category: PluginCategory) -> Result<Arc<PluginDescriptor>> {
        self.plugins
            .get(&(category, slug.to_string()))
            .cloned()
            .ok_or_else(|| ParleyError::PluginNotFound {
                category,
                slug: slug.to_string(),
                available: self
                    .list(category)
                    .iter()
                    .map(|d| d.slug().to_string())
                    .collect(),
            })
    }

    fn list(&self, category: PluginCategory) -> Vec<Arc<PluginDescriptor>> {
        self.plugins
            .range((category, String::new())..)
            .take_while(|((c, _), _)| *c == category)
            .map(|(_, d)| Arc::clone(d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::{HandlerOutcome, SpeechHandler};
    use crate::mic::InputChannel;
    use crate::profile::Profile;

    struct Nop;

    impl SpeechHandler for Nop {
        fn phrases(&self) -> Vec<String> {
            vec!["HELLO".into()]
        }

        fn handle(&mut self, _text: &str, _mic: &mut dyn InputChannel) -> Result<HandlerOutcome> {
            Ok(HandlerOutcome::Continue)
        }
    }

    fn handler_factory() -> PluginFactory {
        PluginFactory::speech_handler(|_, _| Ok(Box::new(Nop)))
    }

    #[test]
    fn test_lookup_and_list() {
        let mut registry = PluginRegistry::new();
        registry.register(PluginInfo::new("hello", "Hello", "1.0", "Greets"), handler_factory());
        registry.register(PluginInfo::new("bye", "Bye", "1.0", "Parts"), handler_factory());

        let found = registry.lookup("hello", PluginCategory::SpeechHandler).unwrap();
        assert_eq!(found.name(), "Hello");

        let slugs: Vec<String> = registry
            .list(PluginCategory::SpeechHandler)
            .iter()
            .map(|d| d.slug().to_string())
            .collect();
        assert_eq!(slugs, vec!["bye".to_string(), "hello".to_string()]);
        assert!(registry.list(PluginCategory::Stt).is_empty());
        assert_eq!(registry.all().len(), 2);
    }

    #[test]
    fn test_lookup_is_scoped_by_category() {
        let mut registry = PluginRegistry::new();
        registry.register(PluginInfo::new("hello", "Hello", "1.0", ""), handler_factory());

        match registry.lookup("hello", PluginCategory::Tts) {
            Err(ParleyError::PluginNotFound {
                category,
                slug,
                available,
            }) => {
                assert_eq!(category, PluginCategory::Tts);
                assert_eq!(slug, "hello");
                assert!(available.is_empty());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_lookup_returns_shared_descriptor() {
        let mut registry = PluginRegistry::new();
        let registered =
            registry.register(PluginInfo::new("hello", "Hello", "1.0", ""), handler_factory());
        let a = registry.lookup("hello", PluginCategory::SpeechHandler).unwrap();
        let b = registry.lookup("hello", PluginCategory::SpeechHandler).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &registered));
        assert!(a.create_handler(&Profile::default()).is_ok());
        assert!(a.create_tts(&Profile::default()).is_err());
    }
}
