//! CSV persistence of diameter series and summary rows.
//!
//! Floats are written with the shortest representation that parses back to
//! the same value, so a table read from disk compares equal to the rows it
//! was written from. Empty cells mean "absent".

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;
use tracing::debug;

use crate::batch::{ImageParams, RowError, RowStatus, SummaryRow};
use crate::error::{ErrorKind, FilamentError, Result};
use crate::fit::{FitResult, ViscosityRecord};
use crate::measure::{DiameterPoint, DiameterTimeSeries};

const NAME_COLUMN: &str = "name";

/// Fixed result columns, in the order they follow the tag columns.
const RESULT_COLUMNS: [&str; 20] = [
    "status",
    "frame_count",
    "valid_points",
    "fps_hz",
    "mm_per_pixel",
    "d0_mm",
    "relaxation_time_s",
    "r_squared",
    "converged",
    "iterations",
    "points_used",
    "window_start_s",
    "window_end_s",
    "fit_note",
    "strain_rate_per_s",
    "normalized_d0",
    "visc_over_surface_tension_s_per_m",
    "extensional_viscosity_pa_s",
    "error_kind",
    "error_message",
];

fn is_reserved(column: &str) -> bool {
    column == NAME_COLUMN || RESULT_COLUMNS.contains(&column)
}

/// Write a diameter series as
/// `frame_index,time_s,diameter_mm,normalized_diameter,strain_rate_per_s`.
///
/// Points without a finite strain rate are not written.
pub fn write_series_csv(series: &DiameterTimeSeries, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in series.extension_points() {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a series written by [`write_series_csv`]. Only the first three
/// columns are required.
pub fn read_series_csv(path: &Path) -> Result<DiameterTimeSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let points = reader
        .deserialize::<DiameterPoint>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(DiameterTimeSeries::from_points(points))
}

/// Write summary rows, one tag column per distinct tag key.
///
/// The column layout is `name`, the sorted tag keys, then the fixed result
/// columns. Tags that would shadow a fixed column are not written.
pub fn write_summary_csv(rows: &[SummaryRow], path: &Path) -> Result<()> {
    let tag_keys: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.tags.keys().map(String::as_str))
        .filter(|&k| {
            let reserved = is_reserved(k);
            if reserved {
                debug!(tag = k, "Tag shadows a summary column, not written");
            }
            !reserved
        })
        .collect();

    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![NAME_COLUMN];
    header.extend(tag_keys.iter().copied());
    header.extend(RESULT_COLUMNS);
    writer.write_record(&header)?;

    for row in rows {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        record.push(row.name.clone());
        for key in &tag_keys {
            record.push(row.tags.get(*key).cloned().unwrap_or_default());
        }
        record.push(row.status.to_string());
        record.push(row.frame_count.to_string());
        record.push(row.valid_points.to_string());
        record.push(opt(row.fps));
        record.push(opt(row.mm_per_pixel));

        match &row.fit {
            Some(fit) => {
                record.push(fit.d0.to_string());
                record.push(fit.relaxation_time.to_string());
                record.push(fit.r_squared.to_string());
                record.push(fit.converged.to_string());
                record.push(fit.iterations.to_string());
                record.push(fit.points_used.to_string());
                record.push(fit.window_start.to_string());
                record.push(fit.window_end.to_string());
                record.push(fit.reason.clone().unwrap_or_default());
            }
            None => record.extend(std::iter::repeat(String::new()).take(9)),
        }

        match &row.viscosity {
            Some(v) => {
                record.push(v.strain_rate.to_string());
                record.push(v.normalized_d0.to_string());
                record.push(v.viscosity_over_surface_tension.to_string());
                record.push(v.extensional_viscosity.to_string());
            }
            None => record.extend(std::iter::repeat(String::new()).take(4)),
        }

        match &row.error {
            Some(e) => {
                record.push(e.kind.to_string());
                record.push(e.message.clone());
            }
            None => {
                record.push(String::new());
                record.push(String::new());
            }
        }

        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read summary rows written by [`write_summary_csv`].
///
/// Columns that are not fixed result columns are read back as tags.
pub fn read_summary_csv(path: &Path) -> Result<Vec<SummaryRow>> {
    let mut reader = csv::ReaderBuilder::new().from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns = build_header_map(&headers);

    for required in [NAME_COLUMN, "status"] {
        if !columns.contains_key(required) {
            return Err(FilamentError::MalformedTable(format!(
                "{}: missing column '{required}'",
                path.display()
            )));
        }
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let row = parse_summary_row(&record, &headers, &columns).map_err(|reason| {
            FilamentError::MalformedTable(format!(
                "{} row {}: {reason}",
                path.display(),
                line + 1
            ))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write image parameters as a two-column `key,value` table.
pub fn write_params_csv(params: &ImageParams, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["key", "value"])?;
    for (key, value) in params.entries() {
        writer.write_record([key, value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a table written by [`write_params_csv`]; empty values are omitted.
pub fn read_params_csv(path: &Path) -> Result<BTreeMap<String, String>> {
    let mut reader = csv::ReaderBuilder::new().from_path(path)?;
    let mut params = BTreeMap::new();
    for record in reader.records() {
        let record = record?;
        match (record.get(0), record.get(1)) {
            (Some(key), Some(value)) if !value.is_empty() => {
                params.insert(key.to_string(), value.to_string());
            }
            (Some(_), Some(_)) => {}
            _ => {
                return Err(FilamentError::MalformedTable(format!(
                    "{}: expected key,value rows",
                    path.display()
                )))
            }
        }
    }
    Ok(params)
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_string(), i))
        .collect()
}

struct Cells<'a> {
    record: &'a StringRecord,
    columns: &'a HashMap<String, usize>,
}

impl Cells<'_> {
    /// Cell text, `None` when the column is absent or the cell empty.
    fn text(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .filter(|s| !s.is_empty())
    }

    fn parse<T: FromStr>(&self, column: &str) -> std::result::Result<Option<T>, String> {
        match self.text(column) {
            None => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| format!("invalid value '{s}' in column '{column}'")),
        }
    }

    fn required<T: FromStr>(&self, column: &str) -> std::result::Result<T, String> {
        self.parse(column)?
            .ok_or_else(|| format!("empty column '{column}'"))
    }
}

fn parse_summary_row(
    record: &StringRecord,
    headers: &StringRecord,
    columns: &HashMap<String, usize>,
) -> std::result::Result<SummaryRow, String> {
    let cells = Cells { record, columns };

    let name = cells.text(NAME_COLUMN).ok_or("empty name")?.to_string();
    let status_text = cells.text("status").ok_or("empty status")?;
    let status =
        RowStatus::parse(status_text).ok_or_else(|| format!("unknown status '{status_text}'"))?;

    let tags: BTreeMap<String, String> = headers
        .iter()
        .zip(record.iter())
        .filter(|(h, v)| !is_reserved(h) && !v.is_empty())
        .map(|(h, v)| (h.to_string(), v.to_string()))
        .collect();

    let fit = match cells.parse::<f64>("d0_mm")? {
        Some(d0) => Some(FitResult {
            d0,
            relaxation_time: cells.required("relaxation_time_s")?,
            r_squared: cells.required("r_squared")?,
            converged: cells.required("converged")?,
            iterations: cells.required("iterations")?,
            points_used: cells.required("points_used")?,
            window_start: cells.required("window_start_s")?,
            window_end: cells.required("window_end_s")?,
            reason: cells.text("fit_note").map(str::to_string),
        }),
        None => None,
    };

    let viscosity = match cells.parse::<f64>("strain_rate_per_s")? {
        Some(strain_rate) => Some(ViscosityRecord {
            strain_rate,
            normalized_d0: cells.required("normalized_d0")?,
            viscosity_over_surface_tension: cells.required("visc_over_surface_tension_s_per_m")?,
            extensional_viscosity: cells.required("extensional_viscosity_pa_s")?,
        }),
        None => None,
    };

    let error = match cells.text("error_kind") {
        Some(kind_text) => Some(RowError {
            kind: ErrorKind::parse(kind_text)
                .ok_or_else(|| format!("unknown error kind '{kind_text}'"))?,
            message: cells.text("error_message").unwrap_or_default().to_string(),
        }),
        None => None,
    };

    Ok(SummaryRow {
        name,
        tags,
        status,
        frame_count: cells.parse("frame_count")?.unwrap_or(0),
        valid_points: cells.parse("valid_points")?.unwrap_or(0),
        fps: cells.parse("fps_hz")?,
        mm_per_pixel: cells.parse("mm_per_pixel")?,
        fit,
        viscosity,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> SummaryRow {
        let mut tags = BTreeMap::new();
        tags.insert("sample".to_string(), "PEO, 1%".to_string());
        tags.insert("run".to_string(), "3".to_string());
        let fit = FitResult {
            d0: 1.25,
            relaxation_time: 0.0123,
            r_squared: 0.998,
            converged: true,
            iterations: 7,
            points_used: 42,
            window_start: 0.0,
            window_end: 0.041,
            reason: None,
        };
        SummaryRow {
            name: "20240101_PEO_25k_3".into(),
            tags,
            status: RowStatus::Converged,
            frame_count: 50,
            valid_points: 42,
            fps: Some(25_000.0),
            mm_per_pixel: Some(0.0123),
            viscosity: Some(ViscosityRecord {
                strain_rate: 54.2,
                normalized_d0: 1.74,
                viscosity_over_surface_tension: 14.76,
                extensional_viscosity: 1.06,
            }),
            fit: Some(fit),
            error: None,
        }
    }

    #[test]
    fn test_summary_reads_back_equal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let failed = SummaryRow::failed(
            "broken",
            BTreeMap::new(),
            &FilamentError::MissingInput("no background".into()),
        );
        let rows = vec![sample_row(), failed];
        write_summary_csv(&rows, &path).unwrap();

        let back = read_summary_csv(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_series_reads_back_equal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let series = DiameterTimeSeries::from_points(vec![
            DiameterPoint { frame_index: 0, time: 0.0, diameter: 1.1 },
            DiameterPoint { frame_index: 2, time: 8e-5, diameter: 0.9 },
        ]);
        write_series_csv(&series, &path).unwrap();
        assert_eq!(read_series_csv(&path).unwrap(), series);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "frame_index,time_s,diameter_mm,normalized_diameter,strain_rate_per_s\n"
        ));
    }

    #[test]
    fn test_series_reads_plain_three_column_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.csv");
        std::fs::write(&path, "frame_index,time_s,diameter_mm\n0,0,1.5\n1,0.001,1.2\n").unwrap();
        let series = read_series_csv(&path).unwrap();
        assert_eq!(series.diameters(), vec![1.5, 1.2]);
    }

    #[test]
    fn test_params_skip_absent_values() {
        use crate::io::crop::CropRect;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.csv");
        let params = ImageParams {
            frame_width: 80,
            frame_height: 40,
            crop: CropRect { x: 0, y: 2, width: 80, height: 30 },
            background_frames: 3,
            fps: 25_000.0,
            mm_per_pixel: 0.1,
            nozzle: None,
            window_top: Some(6),
        };
        write_params_csv(&params, &path).unwrap();
        let back = read_params_csv(&path).unwrap();
        assert_eq!(back["crop_y"], "2");
        assert_eq!(back["window_top"], "6");
        assert_eq!(back["fps_hz"], "25000");
        assert!(!back.contains_key("nozzle_width_px"));
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "name,status\nx,maybe\n").unwrap();
        let err = read_summary_csv(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Table);
    }
}
