// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value types shared across the Tether workspace.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TetherError;

/// Identifies an API category a backing object implements.
///
/// The text form is `name/version` (e.g. `Instance/0.6.0`). It is serialized
/// as that string, which also makes it usable as a JSON object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct InterfaceSpec {
    /// Interface name.
    pub name: String,
    /// Interface version.
    pub version: String,
}

impl InterfaceSpec {
    /// Create a new interface spec.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for InterfaceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

impl FromStr for InterfaceSpec {
    type Err = TetherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('/') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(name, version))
            }
            _ => Err(TetherError::Config(format!(
                "interface spec `{s}` must have the form name/version"
            ))),
        }
    }
}

impl From<InterfaceSpec> for String {
    fn from(spec: InterfaceSpec) -> Self {
        spec.to_string()
    }
}

impl TryFrom<String> for InterfaceSpec {
    type Error = TetherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A hierarchical, path-like event category.
///
/// Leading, trailing, and repeated `/` are ignored, so `/y/evt/` and `y/evt`
/// are the same topic. The empty topic is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct Topic {
    segments: Vec<String>,
}

impl Topic {
    /// Parse a topic from its path form.
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// The root topic, which covers every other topic.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path segments of this topic.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true for the root topic.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true when `other` is this topic or one of its descendants.
    pub fn covers(&self, other: &Topic) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Append a child segment path.
    pub fn join(&self, child: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(Topic::new(child).segments);
        Self { segments }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl From<&str> for Topic {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Topic {
    fn from(path: String) -> Self {
        Self::new(&path)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.to_string()
    }
}

/// An event emitted by a publishing backing object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Topic the event is published under.
    pub topic: Topic,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Event body.
    pub payload: serde_json::Value,
}

impl Event {
    /// Create an event stamped with the current time.
    pub fn new(topic: impl Into<Topic>, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Description of a template function a plugin exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Function name as used in templates.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Usage example.
    #[serde(default)]
    pub usage: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn interface_spec_display_and_parse() {
        let spec = InterfaceSpec::new("Instance", "0.6.0");
        assert_eq!(spec.to_string(), "Instance/0.6.0");
        assert_eq!("Instance/0.6.0".parse::<InterfaceSpec>().unwrap(), spec);
    }

    #[test]
    fn interface_spec_parse_uses_last_slash() {
        let spec: InterfaceSpec = "infra/Group/1.0".parse().unwrap();
        assert_eq!(spec.name, "infra/Group");
        assert_eq!(spec.version, "1.0");
    }

    #[test]
    fn interface_spec_rejects_missing_version() {
        assert!("Instance".parse::<InterfaceSpec>().is_err());
        assert!("Instance/".parse::<InterfaceSpec>().is_err());
        assert!("/1.0".parse::<InterfaceSpec>().is_err());
    }

    #[test]
    fn interface_spec_serializes_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(InterfaceSpec::new("X", "1.0"), vec!["a".to_string()]);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({"X/1.0": ["a"]}));
    }

    #[test]
    fn topic_normalizes_slashes() {
        assert_eq!(Topic::new("/y/evt/"), Topic::new("y//evt"));
        assert_eq!(Topic::new("/y/evt/").to_string(), "y/evt");
        assert!(Topic::new("///").is_root());
    }

    #[test]
    fn topic_covers_descendants_only() {
        let parent = Topic::new("y");
        assert!(parent.covers(&Topic::new("y/evt")));
        assert!(parent.covers(&Topic::new("y")));
        assert!(!parent.covers(&Topic::new("yy/evt")));
        assert!(!Topic::new("y/evt").covers(&parent));
        assert!(Topic::root().covers(&Topic::new("anything/at/all")));
    }

    #[test]
    fn topic_join_appends_segments() {
        assert_eq!(Topic::new("a").join("/b/c"), Topic::new("a/b/c"));
    }

    #[test]
    fn event_serializes_topic_as_string() {
        let event = Event::new("y/evt", serde_json::json!({"k": 1}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["topic"], "y/evt");
        assert_eq!(json["payload"], serde_json::json!({"k": 1}));
    }

    proptest! {
        #[test]
        fn topic_covers_its_joined_children(
            parent in "[a-z]{1,4}(/[a-z]{1,4}){0,3}",
            child in "[a-z]{1,4}(/[a-z]{1,4}){0,3}",
        ) {
            let parent = Topic::new(&parent);
            let joined = parent.join(&child);
            prop_assert!(parent.covers(&joined));
            prop_assert!(Topic::root().covers(&joined));
        }

        #[test]
        fn topic_display_round_trips(path in "/?[a-z]{1,4}(/{1,2}[a-z]{1,4}){0,3}/?") {
            let topic = Topic::new(&path);
            prop_assert_eq!(Topic::new(&topic.to_string()), topic);
        }
    }
}
