//! Consolidated per-parcel statistics table.

use std::path::Path;

use crate::error::Result;
use crate::index::VegetationIndexResult;
use crate::stats::{BandSummary, summarize};

const ID_COLUMN: &str = "Parcela";
const CHANNELS: [&str; 4] = ["R", "G", "B", "NDVI"];

#[derive(Debug, Clone)]
pub struct ParcelStatsRow {
    pub parcel: String,
    pub red: BandSummary,
    pub green: BandSummary,
    pub blue: BandSummary,
    pub ndvi: BandSummary,
}

impl ParcelStatsRow {
    pub fn from_result(parcel: impl Into<String>, result: &VegetationIndexResult) -> Self {
        Self {
            parcel: parcel.into(),
            red: summarize(&result.red),
            green: summarize(&result.green),
            blue: summarize(&result.blue),
            ndvi: summarize(&result.ndvi),
        }
    }

    pub fn header() -> Vec<String> {
        let mut header = vec![ID_COLUMN.to_string()];
        for channel in CHANNELS {
            header.extend(
                BandSummary::NAMES
                    .iter()
                    .map(|stat| format!("{channel}_{stat}")),
            );
        }
        header
    }

    pub fn record(&self) -> Vec<String> {
        let mut record = vec![self.parcel.clone()];
        for summary in [&self.red, &self.green, &self.blue, &self.ndvi] {
            record.extend(summary.values().iter().map(|&v| format_value(v)));
        }
        record
    }
}

/// Six decimals; missing values are left empty.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:.6}")
    }
}

pub fn write_csv(path: &Path, rows: &[ParcelStatsRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(ParcelStatsRow::header())?;
    for row in rows {
        writer.write_record(row.record())?;
    }
    writer.flush()?;

    log::info!("Wrote {} parcel row(s) to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::GeoTransform;
    use ndarray::{Array2, array};
    use std::fs;
    use tempfile::tempdir;

    fn result(red: Array2<f64>) -> VegetationIndexResult {
        let transform = GeoTransform::new(0.0, 1.0, 1.0, -1.0);
        let (rows, cols) = red.dim();
        VegetationIndexResult {
            green: &red * 2.0,
            blue: &red + 1.0,
            nir: &red * 0.5,
            ndvi: red.mapv(|v| v / 100.0),
            extent: transform.extent(rows, cols),
            transform,
            red,
        }
    }

    #[test]
    fn test_header_layout() {
        let header = ParcelStatsRow::header();

        assert_eq!(header.len(), 1 + 4 * 7);
        assert_eq!(header[0], "Parcela");
        assert_eq!(header[1], "R_mean");
        assert_eq!(header[7], "R_p75");
        assert_eq!(header[8], "G_mean");
        assert_eq!(header[22], "NDVI_mean");
        assert_eq!(header[28], "NDVI_p75");
    }

    #[test]
    fn test_write_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parcel_statistics.csv");
        let rows = vec![
            ParcelStatsRow::from_result("Parcela 1", &result(array![[10.0, 20.0], [30.0, 40.0]])),
            ParcelStatsRow::from_result("Parcela 2", &result(Array2::from_elem((2, 2), f64::NAN))),
        ];

        write_csv(&path, &rows).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);

        assert_eq!(&records[0][0], "Parcela 1");
        assert_eq!(&records[0][1], "25.000000");
        assert_eq!(&records[0][4], "10.000000");
        assert_eq!(&records[0][22], "0.250000");

        assert_eq!(&records[1][0], "Parcela 2");
        assert!(records[1].iter().skip(1).all(|field| field.is_empty()));
    }

    #[test]
    fn test_fields_use_six_decimals() {
        let contents = {
            let dir = tempdir().unwrap();
            let path = dir.path().join("stats.csv");
            let row = ParcelStatsRow::from_result("p", &result(array![[1.0 / 3.0]]));
            write_csv(&path, &[row]).unwrap();
            fs::read_to_string(&path).unwrap()
        };

        let line = contents.lines().nth(1).unwrap();
        assert!(line.starts_with("p,0.333333,0.333333,0.000000,"));
    }
}
