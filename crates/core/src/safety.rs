//! Safety-tier derivation from script content flags.

use serde::{Deserialize, Serialize};

use crate::style::ContentFlags;

/// How aggressively the engine should filter generated content.
///
/// Serialized in snake_case; the string form is what lands in the
/// generation-plan snapshot and in vendor requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyTier {
    /// Least restrictive. No content flags set.
    Permissive,
    /// Middle tier. Exactly one flag set.
    Standard,
    /// Most restrictive. Two or more flags set.
    Strict,
}

impl SafetyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyTier::Permissive => "permissive",
            SafetyTier::Standard => "standard",
            SafetyTier::Strict => "strict",
        }
    }
}

/// Derive the safety tier from the three independent content flags.
///
/// Total over all 8 combinations:
/// - two or more flags -> [`SafetyTier::Strict`]
/// - exactly one flag (any of the three) -> [`SafetyTier::Standard`]
/// - none -> [`SafetyTier::Permissive`]
pub fn derive_safety_tier(flags: ContentFlags) -> SafetyTier {
    let count =
        u8::from(flags.violence) + u8::from(flags.nudity) + u8::from(flags.language);
    match count {
        0 => SafetyTier::Permissive,
        1 => SafetyTier::Standard,
        _ => SafetyTier::Strict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(violence: bool, nudity: bool, language: bool) -> ContentFlags {
        ContentFlags {
            violence,
            nudity,
            language,
        }
    }

    #[test]
    fn no_flags_is_permissive() {
        assert_eq!(derive_safety_tier(flags(false, false, false)), SafetyTier::Permissive);
    }

    #[test]
    fn single_flags_are_standard() {
        assert_eq!(derive_safety_tier(flags(true, false, false)), SafetyTier::Standard);
        assert_eq!(derive_safety_tier(flags(false, true, false)), SafetyTier::Standard);
        assert_eq!(derive_safety_tier(flags(false, false, true)), SafetyTier::Standard);
    }

    #[test]
    fn two_or_more_flags_are_strict() {
        assert_eq!(derive_safety_tier(flags(true, true, false)), SafetyTier::Strict);
        assert_eq!(derive_safety_tier(flags(true, false, true)), SafetyTier::Strict);
        assert_eq!(derive_safety_tier(flags(false, true, true)), SafetyTier::Strict);
        assert_eq!(derive_safety_tier(flags(true, true, true)), SafetyTier::Strict);
    }

    #[test]
    fn all_eight_combinations_are_mapped() {
        // Exhaustive sweep — every combination must produce exactly one tier.
        for v in [false, true] {
            for n in [false, true] {
                for l in [false, true] {
                    let tier = derive_safety_tier(flags(v, n, l));
                    let expected = match [v, n, l].iter().filter(|b| **b).count() {
                        0 => SafetyTier::Permissive,
                        1 => SafetyTier::Standard,
                        _ => SafetyTier::Strict,
                    };
                    assert_eq!(tier, expected, "flags ({v}, {n}, {l})");
                }
            }
        }
    }
}
