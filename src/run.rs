use crate::error::{Result, SellOutError};
use crate::history::latest_period;
use crate::intake::{verify_expected_month, InputFileName};
use crate::period::Period;
use crate::reshape::{reshape, RawClientInput, ReshapeOutput};
use crate::schema::{Client, HistoricalTables, RunConfig};
use crate::storage;
use crate::table::RawTable;
use log::{debug, error, info, warn};
use std::path::Path;

/// What happened to one client during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientOutcome {
    /// A new period was appended to both tables.
    Appended {
        period: Period,
        units: i64,
        records: usize,
    },
    /// The input was valid but held nothing for the expected period.
    NothingToContribute { period: String },
    /// The input was rejected; history is unchanged for this client.
    Skipped { reason: String },
    /// No input was supplied for this client.
    Absent,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub tables: HistoricalTables,
    pub outcomes: Vec<(Client, ClientOutcome)>,
}

impl RunReport {
    pub fn outcome(&self, client: Client) -> Option<&ClientOutcome> {
        self.outcomes
            .iter()
            .find(|(c, _)| *c == client)
            .map(|(_, outcome)| outcome)
    }

    pub fn appended_clients(&self) -> Vec<Client> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ClientOutcome::Appended { .. }))
            .map(|(c, _)| *c)
            .collect()
    }
}

pub struct ConsolidationRun<'a> {
    config: &'a RunConfig,
}

impl<'a> ConsolidationRun<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Processes every known client against `tables` and appends what passes
    /// validation. Client failures never abort the run.
    ///
    /// Expected periods are always derived from the history as loaded, so one
    /// client's append cannot influence another's validation.
    pub fn execute(&self, tables: HistoricalTables, inputs: Vec<RawClientInput>) -> RunReport {
        info!(
            "Consolidating sell-out: {} summary rows, {} detail rows, {} client inputs",
            tables.summaries.len(),
            tables.records.len(),
            inputs.len()
        );

        let mut outputs = Vec::new();
        let mut outcomes = Vec::new();

        for client in Client::ALL {
            let mut submitted = inputs.iter().filter(|i| i.client == client);
            let Some(input) = submitted.next() else {
                if let Some(file) = self.config.client_file(client) {
                    warn!("{}: configured file {} was not supplied", client, file);
                } else {
                    debug!("{}: no input this run", client);
                }
                outcomes.push((client, ClientOutcome::Absent));
                continue;
            };
            if submitted.next().is_some() {
                warn!("{}: several inputs supplied, using {}", client, input.file_name);
            }

            let outcome = match Self::process_client(&tables, input) {
                Ok(output) => {
                    let outcome = ClientOutcome::Appended {
                        period: output.period,
                        units: output.summary.units,
                        records: output.records.len(),
                    };
                    info!(
                        "{}: appending {} ({} units, {} detail rows)",
                        client,
                        output.period,
                        output.summary.units,
                        output.records.len()
                    );
                    outputs.push(Some(output));
                    outcome
                }
                Err(SellOutError::EmptyReshapeResult { period, .. }) => {
                    info!("{}: nothing to contribute for {}", client, period);
                    ClientOutcome::NothingToContribute { period }
                }
                Err(e) => {
                    let reason = describe_skip(&e);
                    if e.is_client_scoped() {
                        warn!("{}: skipped: {}", client, reason);
                    } else {
                        error!("{}: skipped after unexpected failure: {}", client, reason);
                    }
                    ClientOutcome::Skipped { reason }
                }
            };
            outcomes.push((client, outcome));
        }

        let mut tables = tables;
        tables.append_all(outputs);

        RunReport { tables, outcomes }
    }

    fn process_client(tables: &HistoricalTables, input: &RawClientInput) -> Result<ReshapeOutput> {
        let file = InputFileName::parse(&input.file_name, input.client)?;
        let latest = latest_period(&tables.summaries, input.client.legal_name())?;
        verify_expected_month(input.client, file.month, latest.next_month)?;
        reshape(input, latest.next_period())
    }

    /// Full run against the configured directories: loads both historical
    /// tables, reads each configured client file with `read_table`, and
    /// writes the updated tables to the output directory.
    ///
    /// Only failures on the historical tables are returned as errors.
    pub fn run_from_disk<F>(&self, read_table: F) -> Result<RunReport>
    where
        F: Fn(&Path, Client) -> Result<RawTable>,
    {
        let tables = storage::load_tables(self.config)?;

        let mut inputs = Vec::new();
        let mut unreadable = Vec::new();
        for (client, file_name) in &self.config.client_files {
            let path = self.config.input_path(file_name);
            if !path.exists() {
                warn!("{}: input file not found ({})", client, path.display());
                continue;
            }
            match read_table(&path, *client) {
                Ok(table) => inputs.push(RawClientInput::new(*client, file_name.clone(), table)),
                Err(e) => {
                    warn!("{}: could not read {}: {}", client, path.display(), e);
                    unreadable.push((*client, e.to_string()));
                }
            }
        }

        let mut report = self.execute(tables, inputs);
        for (client, reason) in unreadable {
            if let Some((_, outcome)) = report.outcomes.iter_mut().find(|(c, _)| *c == client) {
                *outcome = ClientOutcome::Skipped { reason };
            }
        }

        storage::save_tables(self.config, &report.tables)?;
        Ok(report)
    }
}

fn describe_skip(error: &SellOutError) -> String {
    match error {
        SellOutError::PeriodMismatch {
            already_processed: true,
            ..
        } => format!("{} (already processed)", error),
        _ => error.to_string(),
    }
}
