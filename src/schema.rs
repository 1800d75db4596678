use crate::error::Result;
use crate::period::{MonthCode, Period};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Clients whose raw sell-out layouts are known. Each one has its own
/// hard-coded reshaper.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Client {
    #[schemars(description = "PROMOTORA DE COMERCIO SOCIAL: one row per sale line with a date column")]
    Promotora,

    #[schemars(description = "MAKRO SUPERMAYORISTA SAS: wide sheet with one units column per month")]
    Makro,

    #[schemars(description = "FARMATODO COLOMBIA SA: one row per store and item, store and city in separate columns")]
    Farmatodo,
}

impl Client {
    /// Processing order within a run.
    pub const ALL: [Client; 3] = [Client::Promotora, Client::Makro, Client::Farmatodo];

    /// Name under which the client is recorded in the consolidated tables.
    pub fn legal_name(self) -> &'static str {
        match self {
            Self::Promotora => "PROMOTORA DE COMERCIO SOCIAL",
            Self::Makro => "MAKRO SUPERMAYORISTA SAS",
            Self::Farmatodo => "FARMATODO COLOMBIA SA",
        }
    }

    /// Short code used in input file names (`JUL_MAKRO.xlsx`).
    pub fn file_code(self) -> &'static str {
        match self {
            Self::Promotora => "PROMOTORA",
            Self::Makro => "MAKRO",
            Self::Farmatodo => "FARMATODO",
        }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_code())
    }
}

/// One aggregated detail row: units of one product sold in one store during
/// one period. Field names on the wire are part of the downstream contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalSaleRecord {
    #[serde(rename = "EAN")]
    pub product_id: String,

    #[serde(rename = "cliente")]
    pub client: String,

    #[serde(rename = "Mes")]
    pub month: String,

    #[serde(rename = "año")]
    pub year: i32,

    #[serde(rename = "Tienda")]
    pub store: String,

    #[serde(rename = "Ciudad")]
    pub city: String,

    #[serde(rename = "Descripcion")]
    pub description: String,

    #[serde(rename = "Unidades")]
    pub units: i64,

    #[serde(rename = "NumMes")]
    pub month_number: u32,
}

/// Total units sold by one client in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClientPeriodSummary {
    #[serde(rename = "Mes")]
    pub month: String,

    #[serde(rename = "año")]
    pub year: i32,

    #[serde(rename = "cliente")]
    pub client: String,

    #[serde(rename = "Unidades")]
    pub units: i64,

    #[serde(rename = "NumMes")]
    pub month_number: u32,
}

impl ClientPeriodSummary {
    pub fn new(client: Client, period: Period, units: i64) -> Self {
        Self {
            month: period.month.code().to_string(),
            year: period.year,
            client: client.legal_name().to_string(),
            units,
            month_number: period.month.number(),
        }
    }

    pub fn period(&self) -> Result<Period> {
        Ok(Period::new(MonthCode::parse(&self.month)?, self.year))
    }
}

/// The two cumulative tables a run reads at start and rewrites at the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistoricalTables {
    #[schemars(description = "One row per client and period with the period's total units")]
    pub summaries: Vec<ClientPeriodSummary>,

    #[schemars(description = "One row per product, store and period")]
    pub records: Vec<CanonicalSaleRecord>,
}

impl HistoricalTables {
    pub fn new(summaries: Vec<ClientPeriodSummary>, records: Vec<CanonicalSaleRecord>) -> Self {
        Self { summaries, records }
    }
}

/// Explicit configuration for a consolidation run, built once by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunConfig {
    #[schemars(description = "Root directory every other directory is resolved against")]
    pub base_dir: PathBuf,

    #[serde(default = "default_input_dir")]
    #[schemars(description = "Directory holding the raw client inputs, relative to base_dir")]
    pub input_dir: PathBuf,

    #[serde(default = "default_consolidated_dir")]
    #[schemars(description = "Directory holding the historical tables, relative to base_dir")]
    pub consolidated_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    #[schemars(description = "Directory the updated tables are written to, relative to base_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_summary_file")]
    #[schemars(description = "File name of the per-client period summary table")]
    pub summary_file: String,

    #[serde(default = "default_detail_file")]
    #[schemars(description = "File name of the store and city detail table")]
    pub detail_file: String,

    #[serde(default)]
    #[schemars(
        description = "Raw input file per client, named MES_CLIENTE (e.g. JUL_MAKRO.xlsx). Clients without an entry are skipped."
    )]
    pub client_files: BTreeMap<Client, String>,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("datos/tablas_entrada")
}

fn default_consolidated_dir() -> PathBuf {
    PathBuf::from("datos/tablas_consolidados")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("salida")
}

fn default_summary_file() -> String {
    "tiendas_sell_out.json".to_string()
}

fn default_detail_file() -> String {
    "tiendas_sell_out_ciudad_descripcion.json".to_string()
}

impl RunConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            input_dir: default_input_dir(),
            consolidated_dir: default_consolidated_dir(),
            output_dir: default_output_dir(),
            summary_file: default_summary_file(),
            detail_file: default_detail_file(),
            client_files: BTreeMap::new(),
        }
    }

    pub fn with_client_file(mut self, client: Client, file_name: impl Into<String>) -> Self {
        self.client_files.insert(client, file_name.into());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn input_path(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(&self.input_dir).join(file_name)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.base_dir.join(&self.consolidated_dir).join(&self.summary_file)
    }

    pub fn detail_path(&self) -> PathBuf {
        self.base_dir.join(&self.consolidated_dir).join(&self.detail_file)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(&self.output_dir).join(file_name)
    }

    pub fn client_file(&self, client: Client) -> Option<&str> {
        self.client_files.get(&client).map(String::as_str)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RunConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
