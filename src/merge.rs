use crate::reshape::ReshapeOutput;
use crate::schema::{CanonicalSaleRecord, ClientPeriodSummary, HistoricalTables};

/// Appends `new` after the existing summary rows, preserving order. Existing
/// rows are never touched.
pub fn merge_summaries(
    mut history: Vec<ClientPeriodSummary>,
    new: impl IntoIterator<Item = ClientPeriodSummary>,
) -> Vec<ClientPeriodSummary> {
    history.extend(new);
    history
}

/// Detail-table counterpart of [`merge_summaries`].
pub fn merge_records(
    mut history: Vec<CanonicalSaleRecord>,
    new: impl IntoIterator<Item = CanonicalSaleRecord>,
) -> Vec<CanonicalSaleRecord> {
    history.extend(new);
    history
}

impl HistoricalTables {
    /// Appends one client's reshaped period to both tables.
    pub fn append(&mut self, output: ReshapeOutput) {
        self.summaries.push(output.summary);
        self.records.extend(output.records);
    }

    /// Appends every output in order; `None` entries (clients that did not
    /// run) contribute nothing.
    pub fn append_all(&mut self, outputs: impl IntoIterator<Item = Option<ReshapeOutput>>) {
        for output in outputs.into_iter().flatten() {
            self.append(output);
        }
    }
}
