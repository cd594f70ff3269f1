//! Config parser (verb module)
//!
//! Transforms YAML documents into a validated `BreakdownConfig`.

use std::path::Path;
use crate::config::BreakdownConfig;
use crate::error::ParseError;

/// Parse a config from a YAML file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<BreakdownConfig, ParseError> {
    let path_str = path.as_ref().display().to_string();
    let contents = std::fs::read_to_string(&path).map_err(|e| ParseError::Io {
        path: path_str,
        source: e,
    })?;
    parse_str(&contents)
}

/// Parse a config from a YAML string
pub fn parse_str(yaml: &str) -> Result<BreakdownConfig, ParseError> {
    // An empty document deserializes as unit, not as an empty map
    let config: BreakdownConfig = if yaml.trim().is_empty() {
        BreakdownConfig::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    config.validate()?;
    Ok(config)
}
