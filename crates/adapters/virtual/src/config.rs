//! Virtual bridge configuration.

use serde::Deserialize;

/// Configuration for [`VirtualLights`](crate::VirtualLights).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VirtualLightsConfig {
    /// Light ids known from the start, all off.
    pub lights: Vec<String>,
    /// Create unknown lights on first use instead of failing.
    pub auto_register: bool,
}

impl Default for VirtualLightsConfig {
    fn default() -> Self {
        Self {
            lights: vec!["1".to_string(), "2".to_string(), "3".to_string()],
            auto_register: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = VirtualLightsConfig::default();
        assert_eq!(config.lights, ["1", "2", "3"]);
        assert!(config.auto_register);
    }
}
