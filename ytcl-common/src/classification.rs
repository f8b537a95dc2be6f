//! Channel classification levels and hide-preference mapping
//!
//! The classification of a channel is a closed set. Keeping it as an enum
//! (rather than a free-form string) makes the hide decision an exhaustive
//! match: adding a variant forces every consumer to say what it means.

use serde::{Deserialize, Serialize};

/// Classification levels for YouTube channels
///
/// Serialized snake_case ("ai_generated", ...) in JSON responses, the
/// fallback dataset, and log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Content produced end-to-end by generative tools
    AiGenerated,
    /// Human-driven content with substantial AI assistance
    AiAssisted,
    /// Channel mixes AI-generated and human-created uploads
    Mixed,
    /// Human-created content
    HumanCreated,
    /// No signal from any source
    Unknown,
}

impl Classification {
    /// Stable string form, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::AiGenerated => "ai_generated",
            Classification::AiAssisted => "ai_assisted",
            Classification::Mixed => "mixed",
            Classification::HumanCreated => "human_created",
            Classification::Unknown => "unknown",
        }
    }

    /// Lenient parse for dataset entries; anything unrecognized is None
    pub fn parse_label(label: &str) -> Option<Classification> {
        match label.trim().to_ascii_lowercase().as_str() {
            "ai_generated" => Some(Classification::AiGenerated),
            "ai_assisted" => Some(Classification::AiAssisted),
            "mixed" => Some(Classification::Mixed),
            "human_created" => Some(Classification::HumanCreated),
            "unknown" => Some(Classification::Unknown),
            _ => None,
        }
    }

    /// Map a stored consensus verdict to a classification
    pub fn from_is_ai(is_ai: bool) -> Classification {
        if is_ai {
            Classification::AiGenerated
        } else {
            Classification::HumanCreated
        }
    }

    /// True when at least one tier produced a verdict
    pub fn is_known(&self) -> bool {
        !matches!(self, Classification::Unknown)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User preferences for hiding classified channels
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HidePreferences {
    pub hide_ai: bool,
    pub hide_ai_assisted: bool,
    pub hide_mixed: bool,
}

impl HidePreferences {
    pub fn new(hide_ai: bool, hide_ai_assisted: bool, hide_mixed: bool) -> Self {
        Self {
            hide_ai,
            hide_ai_assisted,
            hide_mixed,
        }
    }

    /// Whether content with the given classification should be hidden
    ///
    /// Human-created and unknown channels are never hidden, regardless of
    /// preference flags.
    pub fn hides(&self, classification: Classification) -> bool {
        match classification {
            Classification::AiGenerated => self.hide_ai,
            Classification::AiAssisted => self.hide_ai_assisted,
            Classification::Mixed => self.hide_mixed,
            Classification::HumanCreated => false,
            Classification::Unknown => false,
        }
    }
}

impl Default for HidePreferences {
    /// Matches the shipped client defaults: fully AI-generated channels are
    /// hidden, assisted/mixed channels are shown.
    fn default() -> Self {
        Self {
            hide_ai: true,
            hide_ai_assisted: false,
            hide_mixed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_round_trip() {
        for c in [
            Classification::AiGenerated,
            Classification::AiAssisted,
            Classification::Mixed,
            Classification::HumanCreated,
            Classification::Unknown,
        ] {
            assert_eq!(Classification::parse_label(c.as_str()), Some(c));
        }
    }

    #[test]
    fn test_parse_label_lenient() {
        assert_eq!(
            Classification::parse_label("  AI_Generated "),
            Some(Classification::AiGenerated)
        );
        assert_eq!(Classification::parse_label("robot_made"), None);
        assert_eq!(Classification::parse_label(""), None);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Classification::HumanCreated).unwrap();
        assert_eq!(json, "\"human_created\"");

        let parsed: Classification = serde_json::from_str("\"ai_assisted\"").unwrap();
        assert_eq!(parsed, Classification::AiAssisted);
    }

    #[test]
    fn test_hide_mapping_exhaustive() {
        let prefs = HidePreferences::new(true, true, true);
        assert!(prefs.hides(Classification::AiGenerated));
        assert!(prefs.hides(Classification::AiAssisted));
        assert!(prefs.hides(Classification::Mixed));
        // Never hidden, even with everything enabled
        assert!(!prefs.hides(Classification::HumanCreated));
        assert!(!prefs.hides(Classification::Unknown));
    }

    #[test]
    fn test_hide_mapping_respects_flags() {
        let prefs = HidePreferences::new(true, false, false);
        assert!(prefs.hides(Classification::AiGenerated));
        assert!(!prefs.hides(Classification::AiAssisted));
        assert!(!prefs.hides(Classification::Mixed));
    }
}
