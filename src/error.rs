use thiserror::Error;

#[derive(Error, Debug)]
pub enum SellOutError {
    #[error("No history recorded for client: {0}")]
    UnknownClient(String),

    #[error("Invalid month code '{0}': expected one of ENE, FEB, MAR, ABR, MAY, JUN, JUL, AGO, SEP, OCT, NOV, DIC")]
    InvalidMonthCode(String),

    #[error("Input for {client} has no units column ({expected})")]
    MissingUnitsColumn { client: String, expected: String },

    #[error("Input for {client} is for {found} but {expected} is expected")]
    PeriodMismatch {
        client: String,
        found: String,
        expected: String,
        already_processed: bool,
    },

    #[error("Reshaping input for {client} ({period}) produced no rows")]
    EmptyReshapeResult { client: String, period: String },

    #[error("History has {count} rows for {client} in {period}")]
    DuplicatePeriod {
        client: String,
        period: String,
        count: usize,
    },

    #[error("Units for {client} in {period} exceed the representable range")]
    UnitsOverflow { client: String, period: String },

    #[error("Invalid input file name '{file_name}': {details}")]
    InvalidFileName { file_name: String, details: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SellOutError {
    /// Errors that only concern one client's contribution; the run skips the
    /// client and keeps going.
    pub fn is_client_scoped(&self) -> bool {
        matches!(
            self,
            Self::UnknownClient(_)
                | Self::InvalidMonthCode(_)
                | Self::MissingUnitsColumn { .. }
                | Self::PeriodMismatch { .. }
                | Self::EmptyReshapeResult { .. }
                | Self::DuplicatePeriod { .. }
                | Self::InvalidFileName { .. }
                | Self::UnitsOverflow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SellOutError>;
