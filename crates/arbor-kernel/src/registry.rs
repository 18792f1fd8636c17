//! Kind tag → component factory table.
//!
//! Persisted documents name each node's kind; the registry is how the loader
//! turns that tag back into a live component without reflection.

use std::collections::BTreeMap;

use crate::component::Component;

pub type Factory = fn() -> Box<dyn Component>;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    factories: BTreeMap<&'static str, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component type under the kind its default value reports.
    pub fn register<C: Component + Default>(&mut self) -> &mut Self {
        fn make<C: Component + Default>() -> Box<dyn Component> {
            Box::new(C::default())
        }
        let kind = C::default().kind();
        self.register_factory(kind, make::<C>)
    }

    /// Registers an explicit factory. A later registration replaces an earlier one.
    pub fn register_factory(&mut self, kind: &'static str, factory: Factory) -> &mut Self {
        if self.factories.insert(kind, factory).is_some() {
            tracing::debug!(kind, "component kind re-registered");
        }
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Creates a fresh component of the given kind.
    pub fn create(&self, kind: &str) -> Option<Box<dyn Component>> {
        self.factories.get(kind).map(|factory| factory())
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}
