use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Country name → coordinates, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct GeoLookup {
    points: HashMap<String, GeoPoint>,
}

#[derive(Debug, Deserialize)]
struct GeoRecord {
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

impl GeoLookup {
    /// Load the reference CSV (`Country, Latitude, Longitude`, extra columns ignored)
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Cannot open geo lookup file {}", path.display()))?;
        let lookup = Self::from_reader(file)
            .with_context(|| format!("Cannot parse geo lookup file {}", path.display()))?;
        tracing::info!(
            "Geo lookup loaded: {} countries from {}",
            lookup.len(),
            path.display()
        );
        Ok(lookup)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut points = HashMap::new();
        for result in reader.deserialize::<GeoRecord>() {
            let record = result?;
            if points.contains_key(&record.country) {
                tracing::warn!("Duplicate country in geo lookup, keeping first: {}", record.country);
                continue;
            }
            points.insert(
                record.country,
                GeoPoint {
                    latitude: record.latitude,
                    longitude: record.longitude,
                },
            );
        }

        Ok(Self { points })
    }

    pub fn get(&self, country: &str) -> Option<GeoPoint> {
        self.points.get(country).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(String, GeoPoint)> for GeoLookup {
    fn from_iter<I: IntoIterator<Item = (String, GeoPoint)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader_ignores_extra_columns() {
        let csv = "Country,Alpha-2 code,Latitude,Longitude\n\
                   Denmark,DK,56,10\n\
                   Germany,DE,51,9\n";
        let lookup = GeoLookup::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(lookup.len(), 2);
        assert_eq!(
            lookup.get("Denmark"),
            Some(GeoPoint {
                latitude: 56.0,
                longitude: 10.0
            })
        );
        assert_eq!(lookup.get("denmark"), None);
    }

    #[test]
    fn test_duplicate_country_keeps_first() {
        let csv = "Country,Latitude,Longitude\nNorway,62,10\nNorway,0,0\n";
        let lookup = GeoLookup::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(lookup.get("Norway").unwrap().latitude, 62.0);
    }

    #[test]
    fn test_malformed_coordinates_fail() {
        let csv = "Country,Latitude,Longitude\nSweden,north,15\n";
        assert!(GeoLookup::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        let result = GeoLookup::load(Path::new("definitely/not/here.csv"));
        assert!(result.is_err());
    }
}
