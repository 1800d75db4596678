use crate::catalog::sell_through_units;
use crate::error::{Result, SellOutError};
use crate::period::Period;
use crate::resolver::{StoreCityResolver, StoreLocation, UNKNOWN_CITY};
use crate::schema::{CanonicalSaleRecord, Client, ClientPeriodSummary};
use crate::table::{Cell, Column, RawTable};
use log::debug;
use std::collections::BTreeMap;

const UNITS_CUBE_LABEL: &str = "Cde.";

/// A client's raw table as submitted for this run.
#[derive(Debug, Clone)]
pub struct RawClientInput {
    pub client: Client,
    pub file_name: String,
    pub table: RawTable,
}

impl RawClientInput {
    pub fn new(client: Client, file_name: impl Into<String>, table: RawTable) -> Self {
        Self {
            client,
            file_name: file_name.into(),
            table,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReshapeStats {
    pub input_rows: usize,
    pub dropped_without_store: usize,
    pub dropped_out_of_period: usize,
    pub dropped_without_units: usize,
    pub dropped_missing_ids: usize,
    pub output_rows: usize,
}

#[derive(Debug, Clone)]
pub struct ReshapeOutput {
    pub period: Period,
    pub summary: ClientPeriodSummary,
    pub records: Vec<CanonicalSaleRecord>,
    pub stats: ReshapeStats,
}

// Row after client-specific extraction, before aggregation
struct SaleLine {
    product_id: String,
    description: String,
    location: StoreLocation,
    units: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct AggregationKey {
    product_id: String,
    store: String,
    city: String,
    description: String,
}

/// Reshapes a client's raw table into canonical rows for `expected` and the
/// period's summary row.
pub fn reshape(input: &RawClientInput, expected: Period) -> Result<ReshapeOutput> {
    let mut stats = ReshapeStats {
        input_rows: input.table.len(),
        ..ReshapeStats::default()
    };

    let lines = match input.client {
        Client::Promotora => promotora_lines(&input.table, expected, &mut stats)?,
        Client::Makro => makro_lines(&input.table, expected, &mut stats)?,
        Client::Farmatodo => farmatodo_lines(&input.table, &mut stats)?,
    };

    let overflow = || SellOutError::UnitsOverflow {
        client: input.client.legal_name().to_string(),
        period: expected.to_string(),
    };

    let line_total = checked_total(lines.iter().map(|l| l.units)).ok_or_else(overflow)?;
    let records = aggregate(input.client, expected, lines).ok_or_else(overflow)?;
    stats.output_rows = records.len();

    if records.is_empty() {
        return Err(SellOutError::EmptyReshapeResult {
            client: input.client.legal_name().to_string(),
            period: expected.to_string(),
        });
    }

    let total = checked_total(records.iter().map(|r| r.units)).ok_or_else(overflow)?;
    debug_assert_eq!(line_total, total, "aggregation must not lose units");

    debug!(
        "{} {}: {} input rows -> {} records, {} units ({} without store, {} out of period, {} without units)",
        input.client,
        expected,
        stats.input_rows,
        stats.output_rows,
        total,
        stats.dropped_without_store,
        stats.dropped_out_of_period,
        stats.dropped_without_units
    );

    Ok(ReshapeOutput {
        period: expected,
        summary: ClientPeriodSummary::new(input.client, expected, total),
        records,
        stats,
    })
}

fn checked_total(units: impl IntoIterator<Item = i64>) -> Option<i64> {
    units.into_iter().try_fold(0i64, i64::checked_add)
}

/// Sums units per (product, store, city, description). Month and year are
/// fixed by `period`, so the key is the full canonical aggregation key.
/// `None` if a group's total overflows.
fn aggregate(
    client: Client,
    period: Period,
    lines: Vec<SaleLine>,
) -> Option<Vec<CanonicalSaleRecord>> {
    let mut groups: BTreeMap<AggregationKey, i64> = BTreeMap::new();

    for line in lines {
        let key = AggregationKey {
            product_id: line.product_id,
            store: line.location.store,
            city: line.location.city,
            description: line.description,
        };
        let units = groups.entry(key).or_default();
        *units = units.checked_add(line.units)?;
    }

    let records = groups
        .into_iter()
        .map(|(key, units)| CanonicalSaleRecord {
            product_id: key.product_id,
            client: client.legal_name().to_string(),
            month: period.month.code().to_string(),
            year: period.year,
            store: key.store,
            city: key.city,
            description: key.description,
            units,
            month_number: period.month.number(),
        })
        .collect();
    Some(records)
}

fn missing_units(client: Client, expected: &str) -> SellOutError {
    SellOutError::MissingUnitsColumn {
        client: client.legal_name().to_string(),
        expected: expected.to_string(),
    }
}

fn text_of(column: Option<Column>, row: &[Cell]) -> String {
    column
        .and_then(|c| c.get(row).as_text())
        .unwrap_or_default()
}

fn promotora_lines(
    table: &RawTable,
    expected: Period,
    stats: &mut ReshapeStats,
) -> Result<Vec<SaleLine>> {
    let units_col = table
        .column("Unidades")
        .ok_or_else(|| missing_units(Client::Promotora, "Unidades"))?;
    let store_col = table.column("Nomb. Dependencia");
    let date_col = table.column("Fecha");
    let ean_col = table.column("EAN");
    let desc_col = table.column("Descripción");

    let mut lines = Vec::new();
    for row in &table.rows {
        let Some(label) = store_col.and_then(|c| c.get(row).as_text()) else {
            stats.dropped_without_store += 1;
            continue;
        };

        let in_period = date_col
            .and_then(|c| c.get(row).as_date())
            .is_some_and(|date| expected.contains(date));
        if !in_period {
            stats.dropped_out_of_period += 1;
            continue;
        }

        let Some(units) = units_col.get(row).as_units() else {
            stats.dropped_without_units += 1;
            continue;
        };

        lines.push(SaleLine {
            product_id: text_of(ean_col, row),
            description: text_of(desc_col, row),
            location: StoreCityResolver::Promotora.resolve(&label),
            units,
        });
    }

    Ok(lines)
}

fn makro_lines(
    table: &RawTable,
    expected: Period,
    stats: &mut ReshapeStats,
) -> Result<Vec<SaleLine>> {
    if !table.has_sub_column(UNITS_CUBE_LABEL) {
        return Err(missing_units(
            Client::Makro,
            &format!("<mes> / {}", UNITS_CUBE_LABEL),
        ));
    }

    let month_label = expected.month.full_name();
    let Some(units_col) = table.nested_column(month_label, UNITS_CUBE_LABEL) else {
        debug!("MAKRO sheet has no {} column for {}", UNITS_CUBE_LABEL, month_label);
        return Ok(Vec::new());
    };

    let store_col = table.column("Tienda");
    let article_col = table.column("Número de artículo Makro");
    let desc_col = table.column("Descripción del artículo");
    let ean_col = table.column("Codigo de barras");

    let mut lines = Vec::new();
    for row in &table.rows {
        let Some(label) = store_col.and_then(|c| c.get(row).as_text()) else {
            stats.dropped_without_store += 1;
            continue;
        };

        // Every identifier column present in the sheet must be filled.
        let ids_filled = [article_col, desc_col, ean_col]
            .iter()
            .flatten()
            .all(|c| !c.get(row).is_blank());
        if !ids_filled {
            stats.dropped_missing_ids += 1;
            continue;
        }

        let units = match units_col.get(row).as_units() {
            Some(units) if units != 0 => units,
            _ => {
                stats.dropped_without_units += 1;
                continue;
            }
        };

        let description = text_of(desc_col, row);
        let units = sell_through_units(&description, units).ok_or_else(|| {
            SellOutError::UnitsOverflow {
                client: Client::Makro.legal_name().to_string(),
                period: expected.to_string(),
            }
        })?;
        lines.push(SaleLine {
            product_id: text_of(ean_col, row),
            units,
            description,
            location: StoreCityResolver::Makro.resolve(&label),
        });
    }

    Ok(lines)
}

fn farmatodo_lines(table: &RawTable, stats: &mut ReshapeStats) -> Result<Vec<SaleLine>> {
    let units_col = table
        .column("UNIDADES_VENDIDAS")
        .ok_or_else(|| missing_units(Client::Farmatodo, "UNIDADES_VENDIDAS"))?;
    let store_col = table.column("NOMBRE_TIENDA");
    let city_col = table.column("CIUDAD");
    let desc_col = table.column("DESCRIPCION_ITEM");
    let ean_col = table.column("UPC");

    let mut lines = Vec::new();
    for row in &table.rows {
        let Some(store) = store_col.and_then(|c| c.get(row).as_text()) else {
            stats.dropped_without_store += 1;
            continue;
        };

        let Some(units) = units_col.get(row).as_units() else {
            stats.dropped_without_units += 1;
            continue;
        };

        let city = city_col
            .and_then(|c| c.get(row).as_text())
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| UNKNOWN_CITY.to_string());

        lines.push(SaleLine {
            product_id: text_of(ean_col, row),
            description: text_of(desc_col, row),
            location: StoreLocation::new(store.to_uppercase(), city),
            units,
        });
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::MonthCode;
    use crate::table::ColumnHeader;
    use chrono::NaiveDate;

    fn jul_2025() -> Period {
        Period::new(MonthCode::Jul, 2025)
    }

    fn date(y: i32, m: u32, d: u32) -> Cell {
        Cell::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn promotora_table() -> RawTable {
        RawTable::new(vec![
            ColumnHeader::new("Fecha"),
            ColumnHeader::new("Nomb. Dependencia"),
            ColumnHeader::new("EAN"),
            ColumnHeader::new("Descripción"),
            ColumnHeader::new("Unidades"),
        ])
    }

    #[test]
    fn test_identical_keys_are_summed() {
        let table = promotora_table()
            .with_row(vec![
                date(2025, 7, 3),
                Cell::text("BOGOTA - UNICENTRO"),
                Cell::text("7701"),
                Cell::text("NAT CREMA"),
                Cell::Number(10.0),
            ])
            .with_row(vec![
                date(2025, 7, 21),
                Cell::text("BOGOTA - UNICENTRO"),
                Cell::text("7701"),
                Cell::text("NAT CREMA"),
                Cell::Number(15.0),
            ]);

        let input = RawClientInput::new(Client::Promotora, "JUL_PROMOTORA.xlsx", table);
        let output = reshape(&input, jul_2025()).unwrap();

        assert_eq!(output.records.len(), 1);
        let record = &output.records[0];
        assert_eq!(record.units, 25);
        assert_eq!(record.store, "BOGOTA");
        assert_eq!(record.city, "UNICENTRO");
        assert_eq!(record.month, "JUL");
        assert_eq!(record.month_number, 7);
        assert_eq!(record.client, "PROMOTORA DE COMERCIO SOCIAL");
        assert_eq!(output.summary.units, 25);
    }

    #[test]
    fn test_promotora_drops_blank_store_and_other_months() {
        let table = promotora_table()
            .with_row(vec![
                date(2025, 7, 3),
                Cell::text("  "),
                Cell::text("7701"),
                Cell::text("NAT CREMA"),
                Cell::Number(10.0),
            ])
            .with_row(vec![
                date(2025, 6, 30),
                Cell::text("CARULLA MANIZALES"),
                Cell::text("7701"),
                Cell::text("NAT CREMA"),
                Cell::Number(4.0),
            ])
            .with_row(vec![
                date(2025, 7, 30),
                Cell::text("CARULLA MANIZALES"),
                Cell::text("7702"),
                Cell::text("NAT JABON"),
                Cell::Number(6.0),
            ]);

        let input = RawClientInput::new(Client::Promotora, "JUL_PROMOTORA.xlsx", table);
        let output = reshape(&input, jul_2025()).unwrap();

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].city, "MANIZALES");
        assert_eq!(output.summary.units, 6);
        assert_eq!(output.stats.dropped_without_store, 1);
        assert_eq!(output.stats.dropped_out_of_period, 1);
    }

    #[test]
    fn test_missing_units_column() {
        let table = RawTable::new(vec![
            ColumnHeader::new("Fecha"),
            ColumnHeader::new("Nomb. Dependencia"),
        ]);
        let input = RawClientInput::new(Client::Promotora, "JUL_PROMOTORA.xlsx", table);
        let err = reshape(&input, jul_2025()).unwrap_err();
        assert!(matches!(err, SellOutError::MissingUnitsColumn { .. }));

        let input = RawClientInput::new(
            Client::Makro,
            "JUL_MAKRO.xlsx",
            RawTable::new(vec![ColumnHeader::new("Tienda")]),
        );
        let err = reshape(&input, jul_2025()).unwrap_err();
        assert!(matches!(err, SellOutError::MissingUnitsColumn { .. }));
    }

    fn makro_table() -> RawTable {
        RawTable::new(vec![
            ColumnHeader::new("Descripción del artículo"),
            ColumnHeader::new("Número de artículo Makro"),
            ColumnHeader::new("Codigo de barras"),
            ColumnHeader::new("Tienda"),
            ColumnHeader::nested("Junio", "Cde."),
            ColumnHeader::nested("Julio", "Cde."),
        ])
    }

    #[test]
    fn test_makro_projects_expected_month_only() {
        let table = makro_table()
            .with_row(vec![
                Cell::text("NAT SHAMPOO X 48UND"),
                Cell::Number(501.0),
                Cell::Number(7701.0),
                Cell::text("12 - Cali - Norte"),
                Cell::Number(9.0),
                Cell::Number(2.0),
            ])
            .with_row(vec![
                Cell::text("JDE SALES EFER"),
                Cell::Number(502.0),
                Cell::Number(7702.0),
                Cell::text("5 - Makro Calle 30"),
                Cell::Number(1.0),
                Cell::Number(0.0),
            ])
            .with_row(vec![
                Cell::text("JDE SALES EFER"),
                Cell::Empty,
                Cell::Number(7702.0),
                Cell::text("5 - Makro Calle 30"),
                Cell::Number(1.0),
                Cell::Number(3.0),
            ])
            .with_row(vec![
                Cell::text("JDE SALES EFER"),
                Cell::Number(502.0),
                Cell::Number(7702.0),
                Cell::text("40 - Pereira"),
                Cell::Empty,
                Cell::Number(5.0),
            ]);

        let input = RawClientInput::new(Client::Makro, "JUL_MAKRO.xlsx", table);
        let output = reshape(&input, jul_2025()).unwrap();

        assert_eq!(output.records.len(), 2);
        let cali = output.records.iter().find(|r| r.city == "CALI").unwrap();
        assert_eq!(cali.store, "NORTE");
        assert_eq!(cali.product_id, "7701");
        assert_eq!(cali.units, 96);

        let pereira = output.records.iter().find(|r| r.city == "PEREIRA").unwrap();
        assert_eq!(pereira.store, "Tienda Única");
        // no package quantity in the description: one case of 24
        assert_eq!(pereira.units, 120);

        assert_eq!(output.summary.units, 216);
        assert_eq!(output.summary.client, "MAKRO SUPERMAYORISTA SAS");
    }

    #[test]
    fn test_makro_without_expected_month_column_is_empty() {
        let table = makro_table().with_row(vec![
            Cell::text("JDE SALES EFER"),
            Cell::Number(502.0),
            Cell::Number(7702.0),
            Cell::text("40 - Pereira"),
            Cell::Number(1.0),
            Cell::Number(5.0),
        ]);
        let input = RawClientInput::new(Client::Makro, "AGO_MAKRO.xlsx", table);
        let err = reshape(&input, Period::new(MonthCode::Ago, 2025)).unwrap_err();
        assert!(matches!(err, SellOutError::EmptyReshapeResult { .. }));
    }

    #[test]
    fn test_farmatodo_summary_matches_records() {
        let table = RawTable::new(vec![
            ColumnHeader::new("UPC"),
            ColumnHeader::new("NOMBRE_TIENDA"),
            ColumnHeader::new("CIUDAD"),
            ColumnHeader::new("DESCRIPCION_ITEM"),
            ColumnHeader::new("UNIDADES_VENDIDAS"),
            ColumnHeader::new("SUP_NAME"),
        ])
        .with_row(vec![
            Cell::text("7701"),
            Cell::text("Farmatodo Andino"),
            Cell::text("Bogota"),
            Cell::text("NAT CREMA"),
            Cell::Number(3.0),
            Cell::text("NATURESSE"),
        ])
        .with_row(vec![
            Cell::text("7701"),
            Cell::text("FARMATODO ANDINO"),
            Cell::text("BOGOTA"),
            Cell::text("NAT CREMA"),
            Cell::Number(4.0),
            Cell::text("NATURESSE"),
        ])
        .with_row(vec![
            Cell::text("7702"),
            Cell::text("FARMATODO LAURELES"),
            Cell::Empty,
            Cell::text("NAT JABON"),
            Cell::text("8"),
            Cell::text("NATURESSE"),
        ]);

        let input = RawClientInput::new(Client::Farmatodo, "JUL_FARMATODO.xlsx", table);
        let output = reshape(&input, jul_2025()).unwrap();

        assert_eq!(output.records.len(), 2);
        let record_total: i64 = output.records.iter().map(|r| r.units).sum();
        assert_eq!(output.summary.units, record_total);
        assert_eq!(record_total, 15);
        assert!(output
            .records
            .iter()
            .any(|r| r.store == "FARMATODO LAURELES" && r.city == UNKNOWN_CITY));
    }

    #[test]
    fn test_unit_overflow_is_an_error() {
        let table = RawTable::new(vec![
            ColumnHeader::new("UPC"),
            ColumnHeader::new("NOMBRE_TIENDA"),
            ColumnHeader::new("CIUDAD"),
            ColumnHeader::new("DESCRIPCION_ITEM"),
            ColumnHeader::new("UNIDADES_VENDIDAS"),
        ]);
        let row = vec![
            Cell::text("7701"),
            Cell::text("FARMATODO ANDINO"),
            Cell::text("BOGOTA"),
            Cell::text("NAT CREMA"),
            Cell::Number(9.0e18),
        ];
        let table = table.with_row(row.clone()).with_row(row);

        let input = RawClientInput::new(Client::Farmatodo, "JUL_FARMATODO.xlsx", table);
        let err = reshape(&input, jul_2025()).unwrap_err();
        assert!(matches!(err, SellOutError::UnitsOverflow { .. }));
        assert!(err.is_client_scoped());
    }

    #[test]
    fn test_makro_case_conversion_overflow_is_an_error() {
        let table = makro_table().with_row(vec![
            Cell::text("NAT GEL DUCHA"),
            Cell::Number(502.0),
            Cell::Number(7702.0),
            Cell::text("40 - Pereira"),
            Cell::Empty,
            Cell::Number(1.0e18),
        ]);
        let input = RawClientInput::new(Client::Makro, "JUL_MAKRO.xlsx", table);
        let err = reshape(&input, jul_2025()).unwrap_err();
        assert!(matches!(err, SellOutError::UnitsOverflow { .. }));
    }
}
