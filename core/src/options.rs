//! Conversion options.
//!
//! The complete configuration surface the core consumes. `no_backup` is
//! carried for the caller's writer; the core itself never reads it.

use crate::moniker::{MonikerError, TargetMoniker};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Target platform moniker to retarget to.
    pub target_moniker: String,
    /// Keep an explicit moniker property already present in the project
    /// instead of replacing it.
    pub keep_existing_moniker: bool,
    /// Treat the project as a web project regardless of detection.
    pub force_web_project: bool,
    /// Skip the backup copy before overwrite. Consumed by the file writer,
    /// not by the conversion pipeline.
    pub no_backup: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            // Matches the fallback target when none is requested.
            target_moniker: "netcoreapp3.1".to_string(),
            keep_existing_moniker: false,
            force_web_project: false,
            no_backup: false,
        }
    }
}

impl ConversionOptions {
    pub fn with_target(target: impl Into<String>) -> ConversionOptions {
        ConversionOptions {
            target_moniker: target.into(),
            ..ConversionOptions::default()
        }
    }

    /// Parse and validate the requested target moniker.
    pub fn target(&self) -> Result<TargetMoniker, MonikerError> {
        TargetMoniker::parse(&self.target_moniker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_is_valid() {
        let options = ConversionOptions::default();
        assert_eq!(options.target().unwrap().raw(), "netcoreapp3.1");
    }

    #[test]
    fn invalid_target_surfaces_moniker_error() {
        let options = ConversionOptions::with_target("not-a-tfm");
        assert!(options.target().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let options: ConversionOptions =
            serde_json::from_str(r#"{"target_moniker": "net5.0"}"#).unwrap();
        assert_eq!(options.target_moniker, "net5.0");
        assert!(!options.keep_existing_moniker);
        assert!(!options.no_backup);
    }
}
