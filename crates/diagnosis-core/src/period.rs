//! Reporting period definitions.
//!
//! This module defines [`PeriodType`] for fundamental data periods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DiagnosisError;

/// Period type for fundamental financial data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    /// Annual reporting period.
    #[default]
    Annual,
    /// Quarterly reporting period.
    Quarterly,
}

impl PeriodType {
    /// Short code used as a storage key ("A" or "Q").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Annual => "A",
            Self::Quarterly => "Q",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual => write!(f, "annual"),
            Self::Quarterly => write!(f, "quarterly"),
        }
    }
}

impl FromStr for PeriodType {
    type Err = DiagnosisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "annual" => Ok(Self::Annual),
            "Q" | "quarterly" => Ok(Self::Quarterly),
            _ => Err(DiagnosisError::Parse(format!("Invalid period type: {}", s))),
        }
    }
}
