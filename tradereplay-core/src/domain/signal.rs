//! Per-bar signal classification.

use serde::{Deserialize, Serialize};

use super::position::Side;

/// Classification of a single bar by the peak/valley detector.
///
/// Valleys are buy signals, peaks are sell signals, everything else is neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    #[default]
    Neutral,
    Sell,
}

impl Signal {
    /// Numeric code used in tabular exports: Buy = 0, Neutral = 1, Sell = 2.
    pub fn code(self) -> u8 {
        match self {
            Signal::Buy => 0,
            Signal::Neutral => 1,
            Signal::Sell => 2,
        }
    }

    pub fn is_actionable(self) -> bool {
        self != Signal::Neutral
    }

    /// The position side this signal asks for. Neutral asks for nothing.
    pub fn implied_side(self) -> Option<Side> {
        match self {
            Signal::Buy => Some(Side::Long),
            Signal::Sell => Some(Side::Short),
            Signal::Neutral => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_export_convention() {
        assert_eq!(Signal::Buy.code(), 0);
        assert_eq!(Signal::Neutral.code(), 1);
        assert_eq!(Signal::Sell.code(), 2);
    }

    #[test]
    fn implied_sides() {
        assert_eq!(Signal::Buy.implied_side(), Some(Side::Long));
        assert_eq!(Signal::Sell.implied_side(), Some(Side::Short));
        assert_eq!(Signal::Neutral.implied_side(), None);
        assert!(!Signal::Neutral.is_actionable());
    }
}
