use crate::error::{Result, SellOutError};
use crate::period::{MonthCode, Period};
use crate::schema::ClientPeriodSummary;
use log::debug;
use serde::{Deserialize, Serialize};

/// Most recent period recorded for a client and the period due next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPeriod {
    pub client: String,
    pub month: MonthCode,
    pub year: i32,
    pub units: i64,
    pub record_count: usize,
    pub next_month: MonthCode,
    pub next_year: i32,
}

impl LatestPeriod {
    pub fn period(&self) -> Period {
        Period::new(self.month, self.year)
    }

    pub fn next_period(&self) -> Period {
        Period::new(self.next_month, self.next_year)
    }
}

/// Finds the chronologically latest period recorded for `client_name`.
///
/// Row order in `history` is irrelevant. A client with no rows cannot be
/// extrapolated and yields `UnknownClient`; two rows for the same period
/// yield `DuplicatePeriod`.
pub fn latest_period(history: &[ClientPeriodSummary], client_name: &str) -> Result<LatestPeriod> {
    let mut rows: Vec<(Period, &ClientPeriodSummary)> = history
        .iter()
        .filter(|row| row.client == client_name)
        .map(|row| row.period().map(|period| (period, row)))
        .collect::<Result<_>>()?;

    if rows.is_empty() {
        return Err(SellOutError::UnknownClient(client_name.to_string()));
    }

    rows.sort_by_key(|(period, _)| *period);

    for pair in rows.windows(2) {
        if pair[0].0 == pair[1].0 {
            let count = rows.iter().filter(|(p, _)| *p == pair[0].0).count();
            return Err(SellOutError::DuplicatePeriod {
                client: client_name.to_string(),
                period: pair[0].0.to_string(),
                count,
            });
        }
    }

    let record_count = rows.len();
    let (latest, row) = rows[record_count - 1];
    let next = latest.next();

    debug!(
        "{}: {} recorded periods, latest {} ({} units), next {}",
        client_name, record_count, latest, row.units, next
    );

    Ok(LatestPeriod {
        client: client_name.to_string(),
        month: latest.month,
        year: latest.year,
        units: row.units,
        record_count,
        next_month: next.month,
        next_year: next.year,
    })
}
