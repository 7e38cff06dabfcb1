//! Holding categories and the narrative table.

use diagnosis_core::{CharacterTags, Tag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exposure category of a holding.
///
/// Exactly one category is assigned per holding, by [`Category::classify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Defensive holdings.
    Safety,
    /// Compounders with improving margins.
    Quality,
    /// Holdings priced on a story.
    Speculative,
    /// Holdings that should be avoided.
    Risk,
    /// Nothing notable.
    Neutral,
}

impl Category {
    /// All categories.
    pub const ALL: [Self; 5] = [
        Self::Safety,
        Self::Quality,
        Self::Speculative,
        Self::Risk,
        Self::Neutral,
    ];

    const RISK_TAGS: [Tag; 3] = [Tag::Zombie, Tag::Fragile, Tag::AccountingRisk];
    const SPECULATIVE_TAGS: [Tag; 3] = [Tag::SingleEngine, Tag::HighVolatility, Tag::Turnaround];
    const SAFETY_TAGS: [Tag; 3] = [Tag::SafetyShield, Tag::Institutional, Tag::CashCow];

    /// Assigns a category by priority: Risk, Speculative, Quality, Safety,
    /// then Neutral.
    #[must_use]
    pub fn classify(tags: &CharacterTags) -> Self {
        if tags.any(&Self::RISK_TAGS) {
            Self::Risk
        } else if tags.any(&Self::SPECULATIVE_TAGS) {
            Self::Speculative
        } else if tags.has(Tag::QualityGrowth) {
            Self::Quality
        } else if tags.any(&Self::SAFETY_TAGS) {
            Self::Safety
        } else {
            Self::Neutral
        }
    }

    /// Returns the category name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Safety => "Safety",
            Self::Quality => "Quality",
            Self::Speculative => "Speculative",
            Self::Risk => "Risk",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A macro assumption a portfolio can depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    /// Stable identifier.
    pub key: String,
    /// Short label.
    pub label: String,
    /// What the dependency means.
    pub description: String,
    /// Tags whose exposure counts toward this narrative.
    pub tags: Vec<Tag>,
    /// Multiplier applied to the summed exposure.
    pub weight: f64,
    /// Scenario under which the assumption breaks.
    pub risk_scenario: String,
}

impl Narrative {
    fn new(
        key: &str,
        label: &str,
        description: &str,
        tags: &[Tag],
        weight: f64,
        risk_scenario: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            tags: tags.to_vec(),
            weight,
            risk_scenario: risk_scenario.to_string(),
        }
    }

    /// Weighted dependency score, capped at 100.
    #[must_use]
    pub fn dependency_score(&self, exposure: impl Fn(Tag) -> f64) -> f64 {
        let raw: f64 = self.tags.iter().map(|tag| exposure(*tag)).sum();
        (raw * self.weight).min(100.0)
    }
}

/// The default narrative table, in tie-break order.
#[must_use]
pub fn default_narratives() -> Vec<Narrative> {
    vec![
        Narrative::new(
            "LowRate",
            "Low Rates & Easy Money",
            "Could become fragile as interest rates rise.",
            &[Tag::Zombie, Tag::HighVolatility, Tag::AccountingRisk],
            1.2,
            "rate spike / monetary tightening",
        ),
        Narrative::new(
            "HighGrowth",
            "Continued High Growth",
            "Could be badly damaged by slowing growth or fading expectations.",
            &[Tag::SingleEngine, Tag::Fragile],
            1.5,
            "growth story collapse / multiple compression",
        ),
        Narrative::new(
            "EconomicExpansion",
            "Economic Expansion & Easy Credit",
            "Vulnerable to a recession or a credit crunch.",
            &[Tag::Turnaround, Tag::SilentImprover],
            1.0,
            "economic downturn / recession",
        ),
        // Defensive traits, so the weight is light
        Narrative::new(
            "QualityPreference",
            "Continued Quality Premium",
            "May lag in speculative markets where the quality premium fades.",
            &[Tag::QualityGrowth, Tag::Institutional, Tag::CashCow],
            0.5,
            "quality ignored / speculative mania",
        ),
    ]
}
