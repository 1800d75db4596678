//! Checks on submitted client files before any reshaping: the `MES_CLIENTE`
//! naming convention and the month the history says is due.

use crate::error::{Result, SellOutError};
use crate::period::MonthCode;
use crate::schema::Client;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFileName {
    pub month: MonthCode,
    pub client: Client,
}

impl InputFileName {
    /// Parses `MES_CLIENTE[.ext]` and checks that the client part names
    /// `client`. Any extension is ignored; month and client are matched
    /// case-insensitively.
    pub fn parse(file_name: &str, client: Client) -> Result<Self> {
        let invalid = |details: String| SellOutError::InvalidFileName {
            file_name: file_name.to_string(),
            details,
        };

        let stem = Path::new(file_name.trim())
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| invalid(format!("expected format MES_{}.xlsx", client.file_code())))?;

        let (month_part, client_part) = stem
            .split_once('_')
            .ok_or_else(|| invalid(format!("expected format MES_{}.xlsx", client.file_code())))?;

        let month = MonthCode::parse(month_part)
            .map_err(|_| invalid(format!("'{}' is not a month code", month_part.to_uppercase())))?;

        let client_part = client_part.to_uppercase();
        if client_part != client.file_code() {
            return Err(invalid(format!(
                "client must be {}, found {}",
                client.file_code(),
                client_part
            )));
        }

        Ok(Self { month, client })
    }
}

/// Checks that a submitted month is the one due. On mismatch the error tells
/// whether the submitted month looks already processed or simply out of
/// sequence. A file from the second half of the year submitted while ENE is
/// due counts as already processed.
pub fn verify_expected_month(client: Client, found: MonthCode, expected: MonthCode) -> Result<()> {
    if found == expected {
        return Ok(());
    }

    let already_processed = found.number() < expected.number()
        || (expected == MonthCode::Ene && found.number() > MonthCode::Jul.number());

    Err(SellOutError::PeriodMismatch {
        client: client.legal_name().to_string(),
        found: found.code().to_string(),
        expected: expected.code().to_string(),
        already_processed,
    })
}
