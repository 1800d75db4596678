//! Package rules derived from item descriptions: the package label that
//! follows an `X` and the bulk-pack multipliers applied to MAKRO inventory
//! units.

use regex::Regex;
use std::sync::LazyLock;

/// Multiplier applied to a package label missing from
/// [`PACKAGE_MULTIPLIERS`]. MAKRO's standard case holds 24 units.
pub const DEFAULT_PACKAGE_MULTIPLIER: i64 = 24;

/// Label given to descriptions that carry no package quantity.
pub const UNLABELLED_PACKAGE: &str = "1UND";

/// Inventory units per sell-through unit, keyed by package label.
pub const PACKAGE_MULTIPLIERS: &[(&str, i64)] =
    &[("15GR X 12UND X 32PQ", 32), ("48UND", 48), ("6UND", 6)];

const LABEL_REPLACEMENTS: &[(&str, &str)] =
    &[("2 UND", "2UND"), ("500 ML", "500ML"), ("400 ML", "400ML")];

static QUANTITY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)X\s*(\d+\S*)").ok());

static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

static REPLACEMENTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    LABEL_REPLACEMENTS
        .iter()
        .filter_map(|(from, to)| {
            Regex::new(&format!(r"\b{}\b", regex::escape(from)))
                .ok()
                .map(|re| (re, *to))
        })
        .collect()
});

/// Quantity following the first `X` of a description, case-insensitive.
///
/// `"NAT SPLASH 250ML X 6UND"` yields `"6UND"`; `"NAT GEL DUCHA"` yields
/// `None`.
pub fn extract_quantity(description: &str) -> Option<&str> {
    QUANTITY
        .as_ref()?
        .captures(description)?
        .get(1)
        .map(|m| m.as_str())
}

/// Upper-cases a quantity, joins the known spaced units (`"2 UND"`,
/// `"500 ML"`, `"400 ML"`) and collapses whitespace. Blank input has no
/// label.
pub fn normalize_quantity(quantity: &str) -> Option<String> {
    let trimmed = quantity.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut label = trimmed.to_uppercase();
    for (pattern, to) in REPLACEMENTS.iter() {
        label = pattern.replace_all(&label, *to).into_owned();
    }
    if let Some(whitespace) = WHITESPACE.as_ref() {
        label = whitespace.replace_all(&label, " ").into_owned();
    }
    Some(label)
}

/// Package label of a description, falling back to [`UNLABELLED_PACKAGE`].
pub fn package_label(description: &str) -> String {
    extract_quantity(description)
        .and_then(normalize_quantity)
        .unwrap_or_else(|| UNLABELLED_PACKAGE.to_string())
}

pub fn package_multiplier(label: &str) -> i64 {
    PACKAGE_MULTIPLIERS
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(DEFAULT_PACKAGE_MULTIPLIER)
}

/// Converts MAKRO inventory units into sell-through units. `None` when the
/// product does not fit in an `i64`.
pub fn sell_through_units(description: &str, inventory_units: i64) -> Option<i64> {
    inventory_units.checked_mul(package_multiplier(&package_label(description)))
}
