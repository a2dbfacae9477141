//! Configuration-driven element traversal
//!
//! A [`ConfigNode`] maps expected child element names to a [`ConfigEntry`]
//! holding an optional handler and the configuration for that child's own
//! children. [`traverse`] walks an element's children in document order and
//! runs the matching handlers before descending.

use std::collections::HashMap;

use tracing::trace;

use crate::documents::Element;
use crate::error::Result;

/// Handler invoked for a matched element
pub type Handler<A> = fn(&Element, &mut A) -> Result<()>;

/// How to process one expected child element
pub struct ConfigEntry<A> {
    handler: Option<Handler<A>>,
    children: ConfigNode<A>,
    include: Option<ConfigNode<A>>,
}

impl<A> ConfigEntry<A> {
    /// An entry that only descends into the element's children
    pub fn new() -> Self {
        Self {
            handler: None,
            children: ConfigNode::new(),
            include: None,
        }
    }

    /// An entry running `handler` on the element
    pub fn handler(handler: Handler<A>) -> Self {
        Self {
            handler: Some(handler),
            ..Self::new()
        }
    }

    /// Set the configuration for the element's children
    pub fn with_children(mut self, children: ConfigNode<A>) -> Self {
        self.children = children;
        self
    }

    /// Set an additional configuration the element's children are matched against
    pub fn with_include(mut self, include: ConfigNode<A>) -> Self {
        self.include = Some(include);
        self
    }
}

impl<A> Default for ConfigEntry<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Expected child element names and how to process each
pub struct ConfigNode<A> {
    entries: HashMap<&'static str, ConfigEntry<A>>,
}

impl<A> ConfigNode<A> {
    /// Create an empty configuration; every child is skipped
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add an entry for children with the given local name
    pub fn with(mut self, local_name: &'static str, entry: ConfigEntry<A>) -> Self {
        self.entries.insert(local_name, entry);
        self
    }

    /// Look up the entry for a local name
    pub fn get(&self, local_name: &str) -> Option<&ConfigEntry<A>> {
        self.entries.get(local_name)
    }

    /// Whether no child is expected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A> Default for ConfigNode<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk `element`'s children against `config`
///
/// For every child with a matching entry the entry's handler runs first,
/// then the child's own children are walked against the entry's child
/// configuration and, if present, its include configuration. Children
/// without an entry are skipped together with their subtree. The first
/// handler error aborts the walk.
pub fn traverse<A>(element: &Element, aggregate: &mut A, config: &ConfigNode<A>) -> Result<()> {
    traverse_configs(element, aggregate, &[config])
}

fn traverse_configs<A>(
    element: &Element,
    aggregate: &mut A,
    configs: &[&ConfigNode<A>],
) -> Result<()> {
    for child in &element.children {
        let mut matched = false;

        for config in configs {
            let Some(entry) = config.get(child.local_name()) else {
                continue;
            };
            matched = true;

            if let Some(handler) = entry.handler {
                handler(child, aggregate)?;
            }

            match &entry.include {
                Some(include) => traverse_configs(child, aggregate, &[&entry.children, include])?,
                None => traverse_configs(child, aggregate, &[&entry.children])?,
            }
        }

        if !matched {
            trace!(element = child.local_name(), parent = element.local_name(), "skipping element");
        }
    }

    Ok(())
}
