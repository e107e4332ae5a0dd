use crate::extract::options::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    StrategyMiss,
    StrategyIneligible,
    LowConfidenceWords,
    UnalignableToken,
    CellOverwritten,
    SingleColumnFallback,
}

impl WarningCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrategyMiss => "strategy_miss",
            Self::StrategyIneligible => "strategy_ineligible",
            Self::LowConfidenceWords => "low_confidence_words",
            Self::UnalignableToken => "unalignable_token",
            Self::CellOverwritten => "cell_overwritten",
            Self::SingleColumnFallback => "single_column_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub strategy: Option<Strategy>,
    pub row: Option<usize>,
    pub column: Option<usize>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            strategy: None,
            row: None,
            column: None,
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    #[must_use]
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl std::fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)?;
        if let Some(strategy) = self.strategy {
            write!(f, " (strategy={})", strategy.as_str())?;
        }
        if let Some(row) = self.row {
            write!(f, " (row={row})")?;
        }
        if let Some(column) = self.column {
            write!(f, " (column={column})")?;
        }
        Ok(())
    }
}
