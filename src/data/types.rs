//! Index symbols and the per-index column bundle.
//!
//! Column names follow the joined dataset's `{IDX}_...` convention, but
//! callers never format them by hand: `IndexColumns::for_index` builds the
//! full bundle once and every stage reads its names from there.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Equity index covered by the spread engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexSymbol {
    /// S&P 500
    Spx,
    /// Nasdaq-100
    Ndx,
    /// Dow Jones Industrial Average
    Dji,
}

impl IndexSymbol {
    pub const ALL: [IndexSymbol; 3] = [Self::Spx, Self::Ndx, Self::Dji];

    /// Column-name prefix used in the joined dataset.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spx => "SPX",
            Self::Ndx => "NDX",
            Self::Dji => "DJI",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Spx => "S&P 500",
            Self::Ndx => "Nasdaq-100",
            Self::Dji => "Dow Jones Industrial Average",
        }
    }
}

impl fmt::Display for IndexSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every column the pipeline touches for one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumns {
    pub index: IndexSymbol,

    // Inputs
    /// Realized dividend paid on each date.
    pub dividend: String,
    /// Identifier of the active (near) futures contract.
    pub contract: String,
    /// Identifier of the deferred (far) futures contract.
    pub deferred_contract: String,
    /// OIS 3-month rate in basis points.
    pub ois_bps: String,
    /// Near-contract futures price.
    pub near_price: String,
    /// Far-contract futures price.
    pub far_price: String,

    // Outputs
    pub exp_tau1: String,
    pub exp_tau2: String,
    pub daily_div: String,
    pub annualized_forward_bps: String,
    pub arb_spread: String,
}

impl IndexColumns {
    pub fn for_index(index: IndexSymbol) -> Self {
        let p = index.as_str();
        Self {
            index,
            dividend: format!("{p}_Div"),
            contract: format!("{p}_Contract"),
            deferred_contract: format!("{p}_Contract2"),
            ois_bps: format!("{p}_OIS_bps"),
            near_price: format!("{p}_Fut_Near"),
            far_price: format!("{p}_Fut_Far"),
            exp_tau1: format!("{p}_exp_tau1"),
            exp_tau2: format!("{p}_exp_tau2"),
            daily_div: format!("{p}_daily_div"),
            annualized_forward_bps: format!("{p}_annualized_forward_bps"),
            arb_spread: format!("{p}_arb_spread"),
        }
    }

    /// Columns the joined dataset must supply.
    pub fn inputs(&self) -> [&str; 6] {
        [
            self.dividend.as_str(),
            self.contract.as_str(),
            self.deferred_contract.as_str(),
            self.ois_bps.as_str(),
            self.near_price.as_str(),
            self.far_price.as_str(),
        ]
    }

    /// Columns the pipeline adds.
    pub fn outputs(&self) -> [&str; 5] {
        [
            self.exp_tau1.as_str(),
            self.exp_tau2.as_str(),
            self.daily_div.as_str(),
            self.annualized_forward_bps.as_str(),
            self.arb_spread.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_bundle_names() {
        let cols = IndexColumns::for_index(IndexSymbol::Spx);
        assert_eq!(cols.dividend, "SPX_Div");
        assert_eq!(cols.contract, "SPX_Contract");
        assert_eq!(cols.deferred_contract, "SPX_Contract2");
        assert_eq!(cols.ois_bps, "SPX_OIS_bps");
        assert_eq!(cols.arb_spread, "SPX_arb_spread");
        assert_eq!(cols.annualized_forward_bps, "SPX_annualized_forward_bps");
    }

    #[test]
    fn test_inputs_and_outputs_disjoint() {
        let cols = IndexColumns::for_index(IndexSymbol::Dji);
        for input in cols.inputs() {
            assert!(!cols.outputs().contains(&input));
        }
        assert!(cols.outputs().iter().all(|c| c.starts_with("DJI_")));
    }

    #[test]
    fn test_serde_uses_uppercase_symbols() {
        let json = serde_json::to_string(&IndexSymbol::Ndx).unwrap();
        assert_eq!(json, "\"NDX\"");

        let parsed: IndexSymbol = serde_json::from_str("\"DJI\"").unwrap();
        assert_eq!(parsed, IndexSymbol::Dji);
        assert!(serde_json::from_str::<IndexSymbol>("\"MNX\"").is_err());
    }
}
