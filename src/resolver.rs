use serde::{Deserialize, Serialize};

pub const UNKNOWN_CITY: &str = "CIUDAD DESCONOCIDA";
pub const SINGLE_STORE: &str = "Tienda Única";

const PROMOTORA_OVERRIDES: &[(&str, &str, &str)] = &[
    ("CARULLA PRADERA DE POTOSI", "CARULLA PRADERA DE POTOSI", "POTOSI"),
    ("CARULLA MANIZALES", "CARULLA MANIZALES", "MANIZALES"),
    ("CARULLA PLAZA CLARO", "CARULLA PLAZA CLARO", "BOGOTA"),
];

const MAKRO_OVERRIDES: &[(&str, &str, &str)] = &[
    ("MAKRO CALLE 30", "MAKRO CALLE 30", "SOLEDAD"),
    ("ESTACION POBLADO", "ESTACION POBLADO", "MEDELLIN"),
    ("CALI - NORTE", "NORTE", "CALI"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLocation {
    pub store: String,
    pub city: String,
}

impl StoreLocation {
    pub fn new(store: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            city: city.into(),
        }
    }
}

/// Splits a free-text store label into store and city following each
/// client's naming conventions. Resolution never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCityResolver {
    /// `STORE - CITY`; unknown layouts keep the label and an unknown city.
    Promotora,
    /// `CODE - STORE - CITY`, upper-cased; unknown layouts become a single
    /// store named after the city.
    Makro,
}

impl StoreCityResolver {
    pub fn resolve(&self, raw_label: &str) -> StoreLocation {
        match self {
            Self::Promotora => resolve_promotora(raw_label),
            Self::Makro => resolve_makro(raw_label),
        }
    }
}

fn lookup(overrides: &[(&str, &str, &str)], label: &str) -> Option<StoreLocation> {
    overrides
        .iter()
        .find(|(key, _, _)| *key == label)
        .map(|(_, store, city)| StoreLocation::new(*store, *city))
}

fn resolve_promotora(raw_label: &str) -> StoreLocation {
    let label = raw_label.trim();

    if let Some(location) = lookup(PROMOTORA_OVERRIDES, label) {
        return location;
    }

    if label.contains('-') {
        let parts: Vec<&str> = label.split('-').map(str::trim).collect();
        if let [store, city] = parts.as_slice() {
            if !store.is_empty() && !city.is_empty() {
                return StoreLocation::new(*store, *city);
            }
        }
    }

    StoreLocation::new(label, UNKNOWN_CITY)
}

fn resolve_makro(raw_label: &str) -> StoreLocation {
    // Leading segment before the first hyphen is the store code.
    let name = match raw_label.split_once('-') {
        Some((_, rest)) => rest.trim(),
        None => raw_label.trim(),
    }
    .to_uppercase();

    if let Some(location) = lookup(MAKRO_OVERRIDES, &name) {
        return location;
    }

    if let Some((store, city)) = name.rsplit_once(" - ") {
        let (store, city) = (store.trim(), city.trim());
        if !store.is_empty() && !city.is_empty() {
            return StoreLocation::new(store, city);
        }
    }

    StoreLocation::new(SINGLE_STORE, name.trim())
}
