//! Engine configuration.
//!
//! `RevealDefaults` is the base layer of every element's merged config. Only
//! `container` is interpreted by the engine; everything else passes through
//! to the style generator and initializer untouched.

use crate::error::{Result, RevealError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a revealed element travels from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Top,
    Right,
    Bottom,
    Left,
}

/// When an element's delay applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseDelay {
    Always,
    Once,
    Onload,
}

/// Rotation in degrees per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Insets (px) applied to the container when testing visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOffset {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Default presentation options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevealDefaults {
    pub delay: u64,
    pub distance: String,
    pub duration: u64,
    pub easing: String,
    pub opacity: f64,
    pub origin: Origin,
    pub rotate: Rotation,
    pub scale: f64,
    pub cleanup: bool,
    /// Container descriptor used when a call does not name one.
    pub container: String,
    pub desktop: bool,
    pub mobile: bool,
    pub reset: bool,
    pub use_delay: UseDelay,
    pub view_factor: f64,
    pub view_offset: ViewOffset,
    /// Additional pass-through keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for RevealDefaults {
    fn default() -> Self {
        Self {
            delay: 0,
            distance: "0".to_string(),
            duration: 600,
            easing: "cubic-bezier(0.5, 0, 0, 1)".to_string(),
            opacity: 0.0,
            origin: Origin::Bottom,
            rotate: Rotation::default(),
            scale: 1.0,
            cleanup: false,
            container: "html".to_string(),
            desktop: true,
            mobile: true,
            reset: false,
            use_delay: UseDelay::Always,
            view_factor: 0.0,
            view_offset: ViewOffset::default(),
            extra: Map::new(),
        }
    }
}

impl RevealDefaults {
    /// The defaults as a JSON object, ready to be used as a merge base.
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(RevealError::Config(format!(
                "defaults serialized to a non-object: {}",
                other
            ))),
        }
    }
}

/// Configuration for a reveal engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub defaults: RevealDefaults,
}

impl EngineConfig {
    /// Parse a configuration document. Missing keys keep their defaults.
    ///
    /// Accepts either `{ "defaults": { ... } }` or a bare defaults object.
    pub fn from_json(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        let config = if value.get("defaults").is_some() {
            serde_json::from_value::<EngineConfig>(value)?
        } else {
            EngineConfig {
                defaults: serde_json::from_value(value)?,
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let defaults = &self.defaults;
        if defaults.container.trim().is_empty() {
            return Err(RevealError::Config("container must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&defaults.opacity) {
            return Err(RevealError::Config(format!(
                "opacity must be within 0..=1, got {}",
                defaults.opacity
            )));
        }
        if !(0.0..=1.0).contains(&defaults.view_factor) {
            return Err(RevealError::Config(format!(
                "viewFactor must be within 0..=1, got {}",
                defaults.view_factor
            )));
        }
        Ok(())
    }
}

/// Builder for engine configuration.
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn container(mut self, descriptor: impl Into<String>) -> Self {
        self.config.defaults.container = descriptor.into();
        self
    }

    pub fn delay(mut self, ms: u64) -> Self {
        self.config.defaults.delay = ms;
        self
    }

    pub fn duration(mut self, ms: u64) -> Self {
        self.config.defaults.duration = ms;
        self
    }

    pub fn distance(mut self, distance: impl Into<String>) -> Self {
        self.config.defaults.distance = distance.into();
        self
    }

    pub fn easing(mut self, easing: impl Into<String>) -> Self {
        self.config.defaults.easing = easing.into();
        self
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.config.defaults.origin = origin;
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.config.defaults.opacity = opacity;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.config.defaults.scale = scale;
        self
    }

    pub fn reset(mut self, enabled: bool) -> Self {
        self.config.defaults.reset = enabled;
        self
    }

    pub fn view_factor(mut self, factor: f64) -> Self {
        self.config.defaults.view_factor = factor;
        self
    }

    /// Add an arbitrary pass-through option.
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.defaults.extra.insert(key.into(), value);
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_serialize_camel_case() {
        let map = RevealDefaults::default().to_map().unwrap();

        assert_eq!(map["duration"], json!(600));
        assert_eq!(map["container"], json!("html"));
        assert_eq!(map["origin"], json!("bottom"));
        assert_eq!(map["useDelay"], json!("always"));
        assert_eq!(map["viewOffset"], json!({ "top": 0.0, "right": 0.0, "bottom": 0.0, "left": 0.0 }));
        assert!(map.get("extra").is_none());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfigBuilder::new()
            .container("#scroller")
            .duration(1200)
            .origin(Origin::Left)
            .option("theme", json!("dark"))
            .build();

        assert_eq!(config.defaults.container, "#scroller");
        assert_eq!(config.defaults.duration, 1200);
        let map = config.defaults.to_map().unwrap();
        assert_eq!(map["origin"], json!("left"));
        assert_eq!(map["theme"], json!("dark"));
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(
            r#"{ "duration": 900, "viewOffset": { "top": 64 }, "theme": "dark" }"#,
        )
        .unwrap();

        assert_eq!(config.defaults.duration, 900);
        assert_eq!(config.defaults.view_offset.top, 64.0);
        assert_eq!(config.defaults.view_offset.bottom, 0.0);
        assert_eq!(config.defaults.easing, "cubic-bezier(0.5, 0, 0, 1)");
        assert_eq!(config.defaults.extra["theme"], json!("dark"));
    }

    #[test]
    fn test_from_json_wrapped() {
        let config =
            EngineConfig::from_json(r##"{ "defaults": { "container": "#main" } }"##).unwrap();
        assert_eq!(config.defaults.container, "#main");
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "container": "  " }"#),
            Err(RevealError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "opacity": 2 }"#),
            Err(RevealError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(RevealError::Config(_))
        ));
        assert!(EngineConfigBuilder::new().build().validate().is_ok());
    }
}
