//! Credential-free ZIP code lookup backed by a fixed table.

use std::collections::HashMap;

use crate::{model::Coordinates, zip::ZipCode};

#[derive(Debug, Clone, PartialEq)]
pub struct ZipTable {
    entries: HashMap<String, Coordinates>,
    fallback: Coordinates,
}

fn coords(latitude: f64, longitude: f64, name: &str) -> Coordinates {
    Coordinates {
        latitude,
        longitude,
        resolved_name: name.to_string(),
    }
}

impl Default for ZipTable {
    fn default() -> Self {
        let entries = [
            ("90210", coords(34.0901, -118.4065, "Beverly Hills")),
            ("10001", coords(40.7501, -73.9996, "New York")),
            ("60601", coords(41.8841, -87.6277, "Chicago")),
            ("02108", coords(42.3581, -71.0636, "Boston")),
            ("94102", coords(37.7794, -122.4184, "San Francisco")),
            ("98101", coords(47.6097, -122.3331, "Seattle")),
            ("33101", coords(25.7743, -80.1937, "Miami")),
            ("75201", coords(32.7795, -96.8022, "Dallas")),
            ("77001", coords(29.7604, -95.3698, "Houston")),
            ("85001", coords(33.4484, -112.0740, "Phoenix")),
        ];

        Self::new(entries, coords(40.7128, -74.0060, "New York"))
    }
}

impl ZipTable {
    pub fn new<I, S>(entries: I, fallback: Coordinates) -> Self
    where
        I: IntoIterator<Item = (S, Coordinates)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            fallback,
        }
    }

    /// Never fails: unknown codes map to the table's default location.
    pub fn resolve(&self, zip: &ZipCode) -> Coordinates {
        match self.entries.get(zip.as_str()) {
            Some(found) => found.clone(),
            None => {
                tracing::debug!(%zip, "ZIP not in lookup table, using default location");
                self.fallback.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zip(s: &str) -> ZipCode {
        ZipCode::parse(s).unwrap()
    }

    #[test]
    fn default_table_has_ten_cities() {
        let table = ZipTable::default();
        assert_eq!(table.entries.len(), 10);
        assert!(table.entries.contains_key("02108"));
    }

    #[test]
    fn known_zip_resolves_to_its_entry() {
        let c = ZipTable::default().resolve(&zip("98101"));
        assert_eq!(c.resolved_name, "Seattle");
        assert_eq!(c.latitude, 47.6097);
        assert_eq!(c.longitude, -122.3331);
    }

    #[test]
    fn unknown_zips_share_the_default_location() {
        let table = ZipTable::default();
        let a = table.resolve(&zip("12345"));
        let b = table.resolve(&zip("99999"));
        assert_eq!(a, b);
        assert_eq!(a.resolved_name, "New York");
        assert_eq!(a.latitude, 40.7128);
        assert_eq!(a.longitude, -74.0060);
    }

    #[test]
    fn alternate_table_is_honoured() {
        let table = ZipTable::new(
            [("55401", coords(44.98, -93.27, "Minneapolis"))],
            coords(0.0, 0.0, "Nowhere"),
        );
        assert_eq!(table.resolve(&zip("55401")).resolved_name, "Minneapolis");
        assert_eq!(table.resolve(&zip("90210")).resolved_name, "Nowhere");
        assert_eq!(table.entries.len(), 1);
    }
}
