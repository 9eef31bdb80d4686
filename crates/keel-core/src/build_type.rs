//! Build maturity classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Release maturity of a build invocation.
///
/// Variants are declared in increasing order of stability, so the derived
/// `Ord` gives `Snapshot < Patch < Release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildType {
    /// Unstable, in-progress output.
    Snapshot,

    /// Stabilised fix on top of a release line.
    Patch,

    /// Fully stable output.
    Release,
}

/// A version token that does not name any [`BuildType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown build type: {token:?} (expected one of: snapshot, patch, release)")]
pub struct UnknownBuildType {
    pub token: String,
}

impl BuildType {
    /// All build types, least stable first.
    pub const ALL: [BuildType; 3] = [BuildType::Snapshot, BuildType::Patch, BuildType::Release];

    /// Classify a version token.
    ///
    /// Matching is exact after ASCII case folding: no trimming, no prefixes,
    /// no fallback. An empty token is rejected like any other unknown token.
    pub fn classify(token: &str) -> Result<Self, UnknownBuildType> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.name().eq_ignore_ascii_case(token))
            .ok_or_else(|| UnknownBuildType {
                token: token.to_string(),
            })
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            BuildType::Snapshot => "snapshot",
            BuildType::Patch => "patch",
            BuildType::Release => "release",
        }
    }

    /// Whether artifacts of this build type may be consumed as stable.
    pub fn is_stable(&self) -> bool {
        *self > BuildType::Snapshot
    }

    /// Suffix appended to the base version by the versioning convention.
    pub fn version_suffix(&self) -> Option<&'static str> {
        match self {
            BuildType::Snapshot => Some("-SNAPSHOT"),
            BuildType::Patch | BuildType::Release => None,
        }
    }
}

impl FromStr for BuildType {
    type Err = UnknownBuildType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::classify(s)
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_canonical_tokens_any_case() {
        let cases = [
            ("snapshot", BuildType::Snapshot),
            ("SNAPSHOT", BuildType::Snapshot),
            ("Snapshot", BuildType::Snapshot),
            ("patch", BuildType::Patch),
            ("PATCH", BuildType::Patch),
            ("release", BuildType::Release),
            ("RELEASE", BuildType::Release),
            ("ReLeAsE", BuildType::Release),
        ];

        for (token, expected) in cases {
            assert_eq!(BuildType::classify(token), Ok(expected), "token {token:?}");
        }
    }

    #[test]
    fn test_classify_rejects_unknown_tokens() {
        for token in ["beta", "", "1.0.0", "nightly", "snap", "releases", " release", "release\n"] {
            let err = BuildType::classify(token).unwrap_err();
            assert_eq!(err.token, token);
            assert!(err.to_string().contains("unknown build type"));
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let first = BuildType::classify("Patch");
        for _ in 0..10 {
            assert_eq!(BuildType::classify("Patch"), first);
        }
    }

    #[test]
    fn test_stability_order() {
        assert!(BuildType::Snapshot < BuildType::Patch);
        assert!(BuildType::Patch < BuildType::Release);
        assert!(!BuildType::Snapshot.is_stable());
        assert!(BuildType::Patch.is_stable());
        assert!(BuildType::Release.is_stable());
    }

    #[test]
    fn test_from_str_and_display_agree() {
        for build_type in BuildType::ALL {
            let parsed: BuildType = build_type.to_string().parse().unwrap();
            assert_eq!(parsed, build_type);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&BuildType::Snapshot).unwrap();
        assert_eq!(json, "\"snapshot\"");
    }
}
