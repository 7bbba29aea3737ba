//! Pattern-based mentions of climate topics and the figures quoted with a
//! unit, pulled from raw document text.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

lazy_static! {
    static ref MEASUREMENT: Regex =
        Regex::new(r"(\d+(?:[.,]\d+)?)\s*(%|derajat|celsius|cm|meter|ton|miliar|juta|ribu)").expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    GreenhouseGas,
    Energy,
    Impact,
    Location,
    Solution,
}

const PATTERNS: &[(EntityKind, &[&str])] = &[
    (
        EntityKind::GreenhouseGas,
        &["karbon dioksida", "co2", "metana", "ch4", "dinitrogen oksida", "n2o", "gas rumah kaca"],
    ),
    (
        EntityKind::Energy,
        &[
            "energi surya",
            "energi angin",
            "energi terbarukan",
            "energi hidro",
            "energi geotermal",
            "biomassa",
            "bahan bakar fosil",
            "batu bara",
            "minyak",
            "gas alam",
        ],
    ),
    (
        EntityKind::Impact,
        &[
            "pemanasan global",
            "perubahan iklim",
            "kenaikan suhu",
            "pencairan es",
            "kenaikan permukaan laut",
            "banjir",
            "kekeringan",
            "badai",
            "kebakaran hutan",
        ],
    ),
    (
        EntityKind::Location,
        &["arktik", "antartika", "greenland", "amazon", "kutub", "pesisir", "hutan tropis"],
    ),
    (
        EntityKind::Solution,
        &[
            "reboisasi",
            "aforestasi",
            "carbon capture",
            "kendaraan listrik",
            "transportasi umum",
            "paris agreement",
            "protokol kyoto",
            "green economy",
        ],
    ),
];

/// A number followed by a unit, as written (`"1,5"`, `"juta"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: String,
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub mentions: BTreeMap<EntityKind, Vec<String>>,
    pub statistics: Vec<Measurement>,
}

/// Known phrases occurring anywhere in the lowercased text, in list order.
/// Kinds with no mention are left out.
pub fn extract_entities(text: &str) -> BTreeMap<EntityKind, Vec<String>> {
    let lower = text.to_lowercase();
    PATTERNS
        .iter()
        .filter_map(|(kind, phrases)| {
            let found: Vec<String> =
                phrases.iter().filter(|p| lower.contains(*p)).map(|p| p.to_string()).collect();
            (!found.is_empty()).then_some((*kind, found))
        })
        .collect()
}

pub fn extract_numbers(text: &str) -> Vec<Measurement> {
    let lower = text.to_lowercase();
    MEASUREMENT
        .captures_iter(&lower)
        .map(|c| Measurement { value: c[1].to_string(), unit: c[2].to_string() })
        .collect()
}

pub fn extract(text: &str) -> Entities {
    Entities { mentions: extract_entities(text), statistics: extract_numbers(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_phrases_by_kind() {
        let found = extract_entities("Pemanasan Global memicu BANJIR di pesisir; emisi CO2 dari batu bara.");
        assert_eq!(found[&EntityKind::Impact], vec!["pemanasan global", "banjir"]);
        assert_eq!(found[&EntityKind::Location], vec!["pesisir"]);
        assert_eq!(found[&EntityKind::GreenhouseGas], vec!["co2"]);
        assert_eq!(found[&EntityKind::Energy], vec!["batu bara"]);
        assert!(!found.contains_key(&EntityKind::Solution));
    }

    #[test]
    fn numbers_keep_their_unit() {
        let stats = extract_numbers("Suhu naik 1,5 derajat dan emisi turun 12% pada 2020, sekitar 3.2 Juta ton.");
        let pairs: Vec<(&str, &str)> = stats.iter().map(|m| (m.value.as_str(), m.unit.as_str())).collect();
        assert_eq!(pairs, vec![("1,5", "derajat"), ("12", "%"), ("3.2", "juta")]);
    }

    #[test]
    fn plain_text_has_nothing() {
        assert_eq!(extract("Hari ini cerah."), Entities::default());
    }
}
