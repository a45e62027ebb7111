use crate::utils::error::{CarpeError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative view descriptor.
///
/// `el` names an existing element used as the root; otherwise `template`
/// names a template whose content is copied for every instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root selector. When several elements match, the first in document
    /// order is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub el: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Sub-element name to selector, looked up under the root.
    pub ui: IndexMap<String, String>,
    /// `"<event>[ <selector>]"` to handler name.
    pub events: IndexMap<String, String>,
}

impl ViewOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a descriptor held as JSON, e.g. one loaded from a manifest.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(CarpeError::invalid_argument("options argument is not an object"));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn el(mut self, selector: impl Into<String>) -> Self {
        self.el = Some(selector.into());
        self
    }

    pub fn template(mut self, selector: impl Into<String>) -> Self {
        self.template = Some(selector.into());
        self
    }

    pub fn ui(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
        self.ui.insert(name.into(), selector.into());
        self
    }

    pub fn event(mut self, binding: impl Into<String>, handler: impl Into<String>) -> Self {
        self.events.insert(binding.into(), handler.into());
        self
    }
}

/// A parsed `events` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub event: String,
    pub selector: Option<String>,
}

impl EventBinding {
    /// Everything before the first space is the event type, the rest is the
    /// delegation selector.
    pub fn parse(key: &str) -> Result<Self> {
        let (event, selector) = match key.split_once(' ') {
            Some((event, selector)) => (event, Some(selector.trim())),
            None => (key, None),
        };

        if event.is_empty() {
            return Err(CarpeError::InvalidEvent {
                binding: key.to_string(),
                reason: "missing event type".to_string(),
            });
        }

        Ok(Self {
            event: event.to_string(),
            selector: selector.filter(|s| !s.is_empty()).map(str::to_string),
        })
    }
}
