use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, BooleanBuilder, Float32Array, Float64Array,
    Float64Builder, Int64Builder, LargeListArray, ListArray, ListBuilder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Float32Type, Float64Type, Int32Type, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use log::{debug, info, warn};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::model::{Experiment, FeatureMap, Metadata, MetadataValue, PeptideIdentification, Spectrum};
use crate::alignment::TransformationProvider;
use crate::transform::Transformation;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Load one run. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per spectrum (see [`load_parquet`])
/// * `.json`    – `{ "spectra": [{ "rt": 12.5, "mz": [...], "intensity": [...] }, ...] }`
pub fn load_experiment(path: &Path) -> Result<Experiment> {
    let exp = match extension(path).as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => {
            let mut exp: Experiment = read_json(path)?;
            exp.update_ranges();
            exp
        }
        other => bail!("Unsupported experiment extension: .{other}"),
    };
    if exp.spectra.windows(2).any(|w| w[0].rt > w[1].rt) {
        warn!("{}: spectra are not sorted by retention time", path.display());
    }
    info!("Loaded {} spectra from {}", exp.len(), path.display());
    Ok(exp)
}

/// Write one run in the format implied by the extension.
pub fn write_experiment(path: &Path, exp: &Experiment) -> Result<()> {
    match extension(path).as_str() {
        "parquet" | "pq" => write_parquet(path, exp),
        "json" => write_json(path, exp),
        other => bail!("Unsupported experiment extension: .{other}"),
    }
}

pub fn load_feature_map(path: &Path) -> Result<FeatureMap> {
    let mut map: FeatureMap = read_json(path)?;
    map.update_ranges();
    info!("Loaded {} features from {}", map.len(), path.display());
    Ok(map)
}

pub fn write_feature_map(path: &Path, map: &FeatureMap) -> Result<()> {
    write_json(path, map)
}

/// Identifications of one run: a JSON array, in the order they were reported.
pub fn load_identifications(path: &Path) -> Result<Vec<PeptideIdentification>> {
    let ids: Vec<PeptideIdentification> = read_json(path)?;
    info!("Loaded {} identifications from {}", ids.len(), path.display());
    Ok(ids)
}

pub fn write_identifications(path: &Path, ids: &[PeptideIdentification]) -> Result<()> {
    write_json(path, ids)
}

// ---------------------------------------------------------------------------
// Transformations
// ---------------------------------------------------------------------------

/// Load a transformation.
///
/// * `.json` – `{"model": "linear", "slope": 1.0, "intercept": 2.5}`,
///   `{"model": "interpolated", "points": [[x, y], ...]}` or `{"model": "identity"}`
/// * `.csv`  – header with `x` and `y` columns; rows are knots of a
///   piecewise-linear model
pub fn load_transformation(path: &Path) -> Result<Transformation> {
    match extension(path).as_str() {
        "json" => read_json(path),
        "csv" => load_knot_csv(path),
        other => bail!("Unsupported transformation extension: .{other}"),
    }
}

/// Transformation files, one per run, in run order.
#[derive(Debug, Clone)]
pub struct TransformationFiles(pub Vec<PathBuf>);

impl TransformationProvider for TransformationFiles {
    fn load_transformations(&self) -> Result<Vec<Transformation>> {
        self.0
            .iter()
            .map(|p| {
                load_transformation(p)
                    .with_context(|| format!("loading transformation {}", p.display()))
            })
            .collect()
    }
}

fn load_knot_csv(path: &Path) -> Result<Transformation> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let x_idx = headers
        .iter()
        .position(|h| h.trim() == "x")
        .context("CSV missing 'x' column")?;
    let y_idx = headers
        .iter()
        .position(|h| h.trim() == "y")
        .context("CSV missing 'y' column")?;

    let mut knots = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let x = parse_cell(record.get(x_idx), row_no, "x")?;
        let y = parse_cell(record.get(y_idx), row_no, "y")?;
        knots.push((x, y));
    }
    debug!("{}: {} knots", path.display(), knots.len());

    Transformation::interpolated(knots).with_context(|| format!("{}", path.display()))
}

fn parse_cell(cell: Option<&str>, row: usize, col: &str) -> Result<f64> {
    let tok = cell.unwrap_or("").trim();
    tok.parse::<f64>()
        .with_context(|| format!("Row {row}, {col}: '{tok}' is not a number"))
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing JSON {}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("writing JSON {}", path.display()))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one spectrum per row.
///
/// Expected schema:
/// - `rt`: Float64 or Float32 – retention time in seconds
/// - `ms_level`: Int64 or Int32 – optional, defaults to 1
/// - `mz`, `intensity`: List<Float64> or LargeList<Float64> – peak arrays
/// - Any other columns are treated as metadata (strings, ints, floats, bools)
fn load_parquet(path: &Path) -> Result<Experiment> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut spectra = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let index_of = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let rt_idx = index_of("rt")?;
        let mz_idx = index_of("mz")?;
        let int_idx = index_of("intensity")?;
        let level_idx = schema.index_of("ms_level").ok();

        let rt_col = batch.column(rt_idx);
        let meta_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| ![rt_idx, mz_idx, int_idx].contains(i) && Some(*i) != level_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let rt = extract_f64(rt_col, row).with_context(|| format!("Row {row}: 'rt'"))?;
            let mz = extract_f64_list(batch.column(mz_idx), row)
                .with_context(|| format!("Row {row}: failed to read 'mz'"))?;
            let intensity = extract_f64_list(batch.column(int_idx), row)
                .with_context(|| format!("Row {row}: failed to read 'intensity'"))?;

            if mz.len() != intensity.len() {
                bail!(
                    "Row {row}: mz has {} values but intensity has {}",
                    mz.len(),
                    intensity.len()
                );
            }

            let ms_level = match level_idx {
                Some(i) => match extract_metadata_value(batch.column(i), row) {
                    MetadataValue::Integer(level) => u8::try_from(level)
                        .with_context(|| format!("Row {row}: ms_level {level} out of range"))?,
                    other => bail!("Row {row}: ms_level is not an integer: {other}"),
                },
                None => 1,
            };

            let mut metadata = Metadata::new();
            for (col_idx, col_name) in &meta_cols {
                let value = extract_metadata_value(batch.column(*col_idx), row);
                metadata.insert(col_name.clone(), value);
            }

            spectra.push(Spectrum {
                rt,
                ms_level,
                mz,
                intensity,
                metadata,
            });
        }
    }

    Ok(Experiment::from_spectra(spectra))
}

// -- Parquet / Arrow helpers --

fn extract_f64(col: &ArrayRef, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null retention time");
    }
    match col.data_type() {
        DataType::Float64 => Ok(col.as_primitive::<Float64Type>().value(row)),
        DataType::Float32 => Ok(col.as_primitive::<Float32Type>().value(row) as f64),
        other => bail!("Expected Float64 or Float32 column, got {other:?}"),
    }
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &ArrayRef, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &ArrayRef, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => MetadataValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => MetadataValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => MetadataValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => MetadataValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => MetadataValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => MetadataValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => match col.as_any().downcast_ref::<BooleanArray>() {
            Some(arr) => MetadataValue::Bool(arr.value(row)),
            None => MetadataValue::Null,
        },
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            format_cell(col, row).map_or(MetadataValue::Null, MetadataValue::Date)
        }
        _ => format_cell(col, row).map_or(MetadataValue::Null, MetadataValue::String),
    }
}

/// Render one cell as text with arrow's formatter (ISO-8601 for temporal types).
fn format_cell(col: &ArrayRef, row: usize) -> Option<String> {
    match ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default()) {
        Ok(formatter) => Some(formatter.value(row).to_string()),
        Err(e) => {
            warn!("cannot format {:?} metadata value: {e}", col.data_type());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

/// Arrow type for a metadata column: the type shared by all non-null values,
/// falling back to text when they disagree.
fn metadata_column_type<'a>(values: impl Iterator<Item = &'a MetadataValue>) -> DataType {
    let mut kind: Option<DataType> = None;
    for value in values {
        let this = match value {
            MetadataValue::Null => continue,
            MetadataValue::Integer(_) => DataType::Int64,
            MetadataValue::Float(_) => DataType::Float64,
            MetadataValue::Bool(_) => DataType::Boolean,
            MetadataValue::String(_) | MetadataValue::Date(_) => DataType::Utf8,
        };
        match &kind {
            None => kind = Some(this),
            Some(k) if *k == this => {}
            Some(_) => return DataType::Utf8,
        }
    }
    kind.unwrap_or(DataType::Utf8)
}

fn metadata_column(exp: &Experiment, name: &str, data_type: &DataType) -> ArrayRef {
    let cells = exp.spectra.iter().map(|s| s.metadata.get(name));
    match data_type {
        DataType::Int64 => {
            let mut b = Int64Builder::new();
            for cell in cells {
                match cell {
                    Some(MetadataValue::Integer(i)) => b.append_value(*i),
                    _ => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        DataType::Float64 => {
            let mut b = Float64Builder::new();
            for cell in cells {
                match cell {
                    Some(MetadataValue::Float(v)) => b.append_value(*v),
                    _ => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        DataType::Boolean => {
            let mut b = BooleanBuilder::new();
            for cell in cells {
                match cell {
                    Some(MetadataValue::Bool(v)) => b.append_value(*v),
                    _ => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        _ => {
            let mut b = StringBuilder::new();
            for cell in cells {
                match cell {
                    None | Some(MetadataValue::Null) => b.append_null(),
                    Some(MetadataValue::String(s)) | Some(MetadataValue::Date(s)) => {
                        b.append_value(s)
                    }
                    Some(other) => b.append_value(other.to_string()),
                }
            }
            Arc::new(b.finish())
        }
    }
}

fn f64_list_column<'a>(rows: impl Iterator<Item = &'a Vec<f64>>) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        builder.values().append_slice(row);
        builder.append(true);
    }
    Arc::new(builder.finish())
}

/// Write an experiment in the layout [`load_parquet`] reads.
fn write_parquet(path: &Path, exp: &Experiment) -> Result<()> {
    let list_type = DataType::List(Arc::new(Field::new("item", DataType::Float64, true)));
    let mut fields = vec![
        Field::new("rt", DataType::Float64, false),
        Field::new("ms_level", DataType::Int64, false),
        Field::new("mz", list_type.clone(), false),
        Field::new("intensity", list_type, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from_iter_values(exp.spectra.iter().map(|s| s.rt))),
        Arc::new(arrow::array::Int64Array::from_iter_values(
            exp.spectra.iter().map(|s| s.ms_level as i64),
        )),
        f64_list_column(exp.spectra.iter().map(|s| &s.mz)),
        f64_list_column(exp.spectra.iter().map(|s| &s.intensity)),
    ];

    let names: BTreeSet<&String> = exp.spectra.iter().flat_map(|s| s.metadata.keys()).collect();
    let mut types = BTreeMap::new();
    for name in names {
        let data_type =
            metadata_column_type(exp.spectra.iter().filter_map(|s| s.metadata.get(name)));
        types.insert(name, data_type);
    }
    for (name, data_type) in &types {
        columns.push(metadata_column(exp, name, data_type));
        fields.push(Field::new(name.as_str(), data_type.clone(), true));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    info!("Wrote {} spectra to {}", exp.len(), path.display());
    Ok(())
}
