//! Navigation locator
//!
//! Finds the navigation container by a fixed structural signature: tag
//! name plus one attribute compared by exact string equality (not by class
//! token). The generator emits the same signature on every page, and
//! nested sub-menus use different class strings, so the first match in
//! document order is the top-level menu.

use dom::{Document, NodeId};

use crate::config::NavAsyncConfig;
use crate::placeholder::SPINNER_ID;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLocator {
    tag: String,
    attr: String,
    value: String,
}

impl NavLocator {
    pub fn new(tag: impl Into<String>, attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attr: attr.into().to_ascii_lowercase(),
            value: value.into(),
        }
    }

    pub fn from_config(config: &NavAsyncConfig) -> Self {
        Self::new(&config.nav_tag, &config.nav_attr, &config.nav_value)
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    /// First matching element in document order, or `None`
    pub fn locate(&self, doc: &Document) -> Option<NodeId> {
        doc.find_element(&self.tag, &self.attr, &self.value)
    }

    /// CSS selector matching the same element in the browser
    pub fn selector(&self) -> String {
        let value = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{}[{}=\"{}\"]", self.tag, self.attr, value)
    }

    /// Whether the container already holds the loading indicator from an
    /// earlier run
    pub fn is_placeholder(&self, doc: &Document, nav_id: NodeId) -> bool {
        doc.arena()
            .children(nav_id)
            .map(|children| {
                children
                    .iter()
                    .any(|child| child.is_element() && child.attr("id") == Some(SPINNER_ID))
            })
            .unwrap_or(false)
    }
}

impl Default for NavLocator {
    fn default() -> Self {
        Self::from_config(&NavAsyncConfig::default())
    }
}
