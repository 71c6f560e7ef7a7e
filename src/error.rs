use thiserror::Error;

/// Pipeline stage at which a ticker was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Technical,
    Fundamentals,
    OptionChain,
    IvRank,
    Greeks,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Technical => "technical",
            Stage::Fundamentals => "fundamentals",
            Stage::OptionChain => "option_chain",
            Stage::IvRank => "iv_rank",
            Stage::Greeks => "greeks",
        };
        write!(f, "{}", name)
    }
}

/// Typed rejection reasons for a single ticker's evaluation.
///
/// Every variant is a per-ticker condition: the screening batch absorbs all
/// of them and moves on to the next symbol. Nothing here is batch-fatal.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("insufficient price history: {got} points, need {need}")]
    InsufficientHistory { got: usize, need: usize },

    #[error("insufficient fundamentals: {0}")]
    InsufficientFundamentals(&'static str),

    #[error("no technical signal fired")]
    NoTechnicalSignal,

    #[error("beta {0:?} not above 1")]
    BetaTooLow(Option<f64>),

    #[error("neither revenue nor EPS growth is positive")]
    NoGrowth,

    #[error("no expiry within {min}..={max} days")]
    NoValidExpiry { min: i64, max: i64 },

    #[error("no liquid contract after {0} filter")]
    NoLiquidContract(&'static str),

    #[error("IV range is degenerate (max == min)")]
    DegenerateIvRange,

    #[error("IV rank {rank:.2} below floor {floor:.0}")]
    IvRankBelowFloor { rank: f64, floor: f64 },

    #[error("Black-Scholes domain error: {0}")]
    Domain(&'static str),

    #[error("delta {0:.4} outside acceptance band")]
    DeltaOutOfBand(f64),

    #[error("theta {theta:.4} exceeds {cap:.0}% of premium {premium:.2}")]
    ThetaTooLarge { theta: f64, premium: f64, cap: f64 },

    #[error("data unavailable: {0}")]
    DataUnavailable(String),
}

impl ScreenError {
    /// Wrap an arbitrary provider failure.
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        ScreenError::DataUnavailable(err.to_string())
    }
}
