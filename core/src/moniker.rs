//! Target framework moniker parsing.
//!
//! A moniker like `net5.0-windows` identifies the compilation target. The
//! converter only needs its *family* (which fact-table era applies) and an
//! optional OS suffix; the raw spelling is preserved verbatim for the
//! retargeted `TargetFramework` property.

use crate::error_codes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The platform family a moniker belongs to. Fact-table era selection keys
/// off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFamily {
    /// Classic .NET Framework (`net472`, `net48`).
    NetFramework,
    /// .NET Core up to 3.1 (`netcoreapp2.1`, `netcoreapp3.1`).
    NetCoreApp,
    /// .NET Standard (`netstandard2.0`).
    NetStandard,
    /// Unified .NET, 5.0 and later (`net5.0`, `net6.0-android`).
    Net,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MonikerError {
    #[error(
        "[SDKIFY_TFM_001] unknown target platform moniker '{moniker}'. Suggestion: use a moniker like 'net5.0', 'net5.0-windows', 'netcoreapp3.1', 'netstandard2.0', or 'net472'."
    )]
    UnknownPlatformMoniker { moniker: String },
}

impl MonikerError {
    pub fn code(&self) -> &'static str {
        match self {
            MonikerError::UnknownPlatformMoniker { .. } => error_codes::MONIKER_UNKNOWN,
        }
    }
}

/// A parsed target framework moniker.
///
/// `raw()` returns the spelling the caller supplied (trimmed, original
/// casing); comparisons between monikers are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMoniker {
    raw: String,
    family: TargetFamily,
    os_suffix: Option<String>,
}

impl TargetMoniker {
    pub fn parse(input: &str) -> Result<TargetMoniker, MonikerError> {
        let raw = input.trim();
        let lower = raw.to_ascii_lowercase();

        let unknown = || MonikerError::UnknownPlatformMoniker {
            moniker: raw.to_string(),
        };

        if lower.is_empty() {
            return Err(unknown());
        }

        let (base, os_suffix) = match lower.split_once('-') {
            Some((base, os)) if !os.is_empty() => (base, Some(os.to_string())),
            Some(_) => return Err(unknown()),
            None => (lower.as_str(), None),
        };

        let family = if let Some(version) = base.strip_prefix("netcoreapp") {
            if !is_dotted_version(version) {
                return Err(unknown());
            }
            TargetFamily::NetCoreApp
        } else if let Some(version) = base.strip_prefix("netstandard") {
            if !is_dotted_version(version) {
                return Err(unknown());
            }
            TargetFamily::NetStandard
        } else if let Some(version) = base.strip_prefix("net") {
            if is_dotted_version(version) {
                let major: u32 = version
                    .split('.')
                    .next()
                    .and_then(|major| major.parse().ok())
                    .ok_or_else(unknown)?;
                // Dotted spellings only exist from net5.0 onward.
                if major < 5 {
                    return Err(unknown());
                }
                TargetFamily::Net
            } else if (2..=3).contains(&version.len())
                && version.bytes().all(|b| b.is_ascii_digit())
            {
                TargetFamily::NetFramework
            } else {
                return Err(unknown());
            }
        } else {
            return Err(unknown());
        };

        // OS-specific monikers (`-windows`, `-android`, ...) only exist in
        // the unified .NET family.
        if os_suffix.is_some() && family != TargetFamily::Net {
            return Err(unknown());
        }

        Ok(TargetMoniker {
            raw: raw.to_string(),
            family,
            os_suffix,
        })
    }

    /// Map a legacy `TargetFrameworkVersion` value (`v4.7.2`) to its
    /// moniker equivalent (`net472`).
    pub fn from_legacy_version(version: &str) -> Option<TargetMoniker> {
        let digits: String = version
            .trim()
            .strip_prefix(['v', 'V'])?
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            return None;
        }
        TargetMoniker::parse(&format!("net{digits}")).ok()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn family(&self) -> TargetFamily {
        self.family
    }

    pub fn os_suffix(&self) -> Option<&str> {
        self.os_suffix.as_deref()
    }

    pub fn matches(&self, other: &str) -> bool {
        self.raw.eq_ignore_ascii_case(other.trim())
    }
}

fn is_dotted_version(s: &str) -> bool {
    match s.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.bytes().all(|b| b.is_ascii_digit())
                && minor.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family_of(input: &str) -> TargetFamily {
        TargetMoniker::parse(input).unwrap().family()
    }

    #[test]
    fn parses_known_families() {
        assert_eq!(family_of("net472"), TargetFamily::NetFramework);
        assert_eq!(family_of("net48"), TargetFamily::NetFramework);
        assert_eq!(family_of("net35"), TargetFamily::NetFramework);
        assert_eq!(family_of("netcoreapp3.1"), TargetFamily::NetCoreApp);
        assert_eq!(family_of("netstandard2.0"), TargetFamily::NetStandard);
        assert_eq!(family_of("net5.0"), TargetFamily::Net);
        assert_eq!(family_of("net6.0"), TargetFamily::Net);
    }

    #[test]
    fn parses_os_suffix() {
        let m = TargetMoniker::parse("net5.0-windows").unwrap();
        assert_eq!(m.family(), TargetFamily::Net);
        assert_eq!(m.os_suffix(), Some("windows"));
        assert_eq!(m.raw(), "net5.0-windows");

        let m = TargetMoniker::parse("net6.0-android").unwrap();
        assert_eq!(m.os_suffix(), Some("android"));
    }

    #[test]
    fn preserves_raw_spelling_and_trims() {
        let m = TargetMoniker::parse("  Net5.0-Windows ").unwrap();
        assert_eq!(m.raw(), "Net5.0-Windows");
        assert!(m.matches("net5.0-windows"));
    }

    #[test]
    fn rejects_unknown_monikers() {
        for bad in [
            "",
            "   ",
            "net",
            "net4.7.2",
            "net4.5",
            "netcoreapp",
            "netcoreappx",
            "net472-windows",
            "dotnet5",
            "net50000",
            "net5.0-",
        ] {
            let err = TargetMoniker::parse(bad).unwrap_err();
            assert_eq!(err.code(), "SDKIFY_TFM_001", "expected rejection of {bad:?}");
        }
    }

    #[test]
    fn maps_legacy_versions() {
        assert_eq!(
            TargetMoniker::from_legacy_version("v4.7.2").unwrap().raw(),
            "net472"
        );
        assert_eq!(
            TargetMoniker::from_legacy_version("v4.8").unwrap().raw(),
            "net48"
        );
        assert!(TargetMoniker::from_legacy_version("4.7.2").is_none());
        assert!(TargetMoniker::from_legacy_version("").is_none());
    }
}
