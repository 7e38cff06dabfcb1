//! Value-weighted exposure aggregation.

use diagnosis_core::{AnalysisRecord, PortfolioItem, Symbol, Tag};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::narrative::{Category, Narrative, default_narratives};
use crate::report::{Holding, NarrativeDependency, PortfolioReport};

/// Tuning of the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Narrative table, in tie-break order.
    pub narratives: Vec<Narrative>,
    /// Starting health score (default: 80).
    pub base_health: f64,
    /// Points lost per percent in the Risk category (default: 1.5).
    pub risk_penalty: f64,
    /// Speculative percentage tolerated without penalty (default: 30).
    pub speculative_allowance: f64,
    /// Points lost per speculative percent above the allowance (default: 0.5).
    pub speculative_penalty: f64,
    /// Safety percentage above which the bonus applies (default: 50).
    pub safety_bonus_above: f64,
    /// Quality percentage above which the bonus applies (default: 30).
    pub quality_bonus_above: f64,
    /// Points for each bonus (default: 5).
    pub bonus: f64,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            narratives: default_narratives(),
            base_health: 80.0,
            risk_penalty: 1.5,
            speculative_allowance: 30.0,
            speculative_penalty: 0.5,
            safety_bonus_above: 50.0,
            quality_bonus_above: 30.0,
            bonus: 5.0,
        }
    }
}

impl ExposureConfig {
    /// Replaces the narrative table.
    #[must_use]
    pub fn with_narratives(mut self, narratives: Vec<Narrative>) -> Self {
        self.narratives = narratives;
        self
    }

    /// Health score for a category breakdown, clamped to `[0, 100]` and
    /// truncated.
    #[must_use]
    pub fn health_score(&self, categories: &BTreeMap<Category, f64>) -> u8 {
        let share = |category: Category| categories.get(&category).copied().unwrap_or(0.0);

        let mut score = self.base_health;
        score -= share(Category::Risk) * self.risk_penalty;
        let speculative = share(Category::Speculative);
        if speculative > self.speculative_allowance {
            score -= (speculative - self.speculative_allowance) * self.speculative_penalty;
        }
        if share(Category::Safety) > self.safety_bonus_above {
            score += self.bonus;
        }
        if share(Category::Quality) > self.quality_bonus_above {
            score += self.bonus;
        }

        score.clamp(0.0, 100.0) as u8
    }
}

/// Aggregates holdings into a portfolio report.
///
/// `latest` maps each symbol to its most recent analysis record. Holdings
/// without a record, or whose market value is not a positive finite number
/// (short or zero positions, bad prices), are listed in `excluded` and do
/// not count toward the total. A zero total yields [`PortfolioReport::empty`].
#[must_use]
pub fn analyze_portfolio(
    items: &[PortfolioItem],
    latest: &HashMap<Symbol, AnalysisRecord>,
    config: &ExposureConfig,
) -> PortfolioReport {
    let mut excluded = Vec::new();
    let mut priced = Vec::new();
    for item in items {
        let Some(record) = latest.get(&item.symbol) else {
            excluded.push(item.symbol.clone());
            continue;
        };
        let market_value = record.stock_price * item.quantity;
        if market_value.is_finite() && market_value > 0.0 {
            priced.push((item, record, market_value));
        } else {
            excluded.push(item.symbol.clone());
        }
    }

    let total_value: f64 = priced.iter().map(|(_, _, value)| value).sum();
    if total_value == 0.0 {
        debug!(
            items = items.len(),
            excluded = excluded.len(),
            "Portfolio has no value"
        );
        return PortfolioReport::empty(excluded);
    }

    let mut tag_exposure: BTreeMap<Tag, f64> = Tag::ALL.into_iter().map(|t| (t, 0.0)).collect();
    let mut category_exposure: BTreeMap<Category, f64> =
        Category::ALL.into_iter().map(|c| (c, 0.0)).collect();
    let mut holdings = Vec::with_capacity(priced.len());

    for (item, record, market_value) in priced {
        let weight = market_value / total_value * 100.0;
        let tags = &record.diagnosis.tags;

        for tag in tags.active() {
            *tag_exposure.entry(tag).or_insert(0.0) += weight;
        }
        let category = Category::classify(tags);
        *category_exposure.entry(category).or_insert(0.0) += weight;

        let cost_basis = item.average_price * item.quantity;
        holdings.push(Holding {
            symbol: item.symbol.clone(),
            quantity: item.quantity,
            average_price: item.average_price,
            price: record.stock_price,
            market_value,
            cost_basis,
            unrealized_pnl: market_value - cost_basis,
            weight,
            category,
            diagnosis: record.diagnosis.clone(),
        });
    }

    let exposure_of = |tag: Tag| tag_exposure.get(&tag).copied().unwrap_or(0.0);
    let mut narrative_dependency: Vec<NarrativeDependency> = config
        .narratives
        .iter()
        .map(|narrative| NarrativeDependency {
            key: narrative.key.clone(),
            label: narrative.label.clone(),
            dependency_score: narrative.dependency_score(exposure_of),
            description: narrative.description.clone(),
            risk_scenario: narrative.risk_scenario.clone(),
        })
        .collect();
    // Stable sort keeps table order on ties
    narrative_dependency.sort_by(|a, b| b.dependency_score.total_cmp(&a.dependency_score));

    let health_score = config.health_score(&category_exposure);
    let diagnosis_summary = summarize(health_score, narrative_dependency.first());

    debug!(
        total_value,
        health_score,
        holdings = holdings.len(),
        excluded = excluded.len(),
        "Portfolio aggregated"
    );

    PortfolioReport {
        total_value,
        health_score,
        diagnosis_summary,
        tag_exposure,
        category_exposure,
        narrative_dependency,
        holdings,
        excluded,
    }
}

/// One-sentence diagnosis for a health band, naming the top narrative when
/// the dependency on it is large for that band.
fn summarize(health: u8, top: Option<&NarrativeDependency>) -> String {
    let above = |threshold: f64| top.filter(|n| n.dependency_score > threshold);

    if health < 40 {
        match above(50.0) {
            Some(n) => format!(
                "Critical. The portfolio depends heavily on \"{}\" and could collapse under {}.",
                n.label, n.risk_scenario
            ),
            None => "Critical. Consider trimming zombie companies and holdings whose thesis \
                     could break down."
                .to_string(),
        }
    } else if health < 60 {
        match above(40.0) {
            Some(n) => format!(
                "Caution. {:.0}% of the portfolio depends on \"{}\". Are you prepared for {}?",
                n.dependency_score, n.label, n.risk_scenario
            ),
            None => "The balance is deteriorating. A few risky holdings are dragging down \
                     the whole portfolio."
                .to_string(),
        }
    } else if health < 80 {
        match above(30.0) {
            Some(n) => format!(
                "Mostly healthy, with a dependence on \"{}\". Plan for a scenario of {}.",
                n.label, n.risk_scenario
            ),
            None => "A well-balanced portfolio that avoids excessive risk.".to_string(),
        }
    } else {
        "An exceptionally healthy portfolio. Defense and quality are well balanced with no \
         excessive dependence on a single narrative."
            .to_string()
    }
}
