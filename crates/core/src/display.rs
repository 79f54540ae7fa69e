//! Rollup display modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classification::ClassificationField;
use crate::error::{Error, Result, ValidationErrorCode};

/// Selects the grouping depth and dimensions of a rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// network -> domain -> placement -> targeting -> campaign
    Network,
    /// domain -> placement -> targeting -> campaign
    Domain,
    /// placement -> targeting -> campaign
    Placement,
    /// targeting -> campaign
    Targeting,
    /// Flat list of campaigns
    Special,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 5] = [
        Self::Network,
        Self::Domain,
        Self::Placement,
        Self::Targeting,
        Self::Special,
    ];

    /// Grouping fields, outermost first. Empty for a flat list.
    pub fn levels(&self) -> &'static [ClassificationField] {
        use ClassificationField::*;
        match self {
            Self::Network => &[Network, Domain, Placement, Targeting],
            Self::Domain => &[Domain, Placement, Targeting],
            Self::Placement => &[Placement, Targeting],
            Self::Targeting => &[Targeting],
            Self::Special => &[],
        }
    }

    /// Total tree depth including the campaign leaf level.
    pub fn depth(&self) -> usize {
        self.levels().len() + 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Domain => "domain",
            Self::Placement => "placement",
            Self::Targeting => "targeting",
            Self::Special => "special",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| {
                Error::invalid(
                    ValidationErrorCode::UnknownDisplayMode,
                    format!("unknown display mode '{}'", s),
                )
            })
    }
}
