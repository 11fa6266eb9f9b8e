//! Row-level normalization of import files

use crate::import::reconcile::resolve_technician;
use crate::normalizer::{
    clean_client_name, clean_price_str, normalize_technician_name, parse_flexible_date,
};
use ptm_common::config::{ColumnConfig, ImportConfig};
use ptm_common::{Result, TechnicianRoster};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufWriter, Read, Write};
use tracing::{debug, info, warn};

/// Normalized columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ClientName,
    Technician,
    Price,
    Date,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientName => write!(f, "client_name"),
            Self::Technician => write!(f, "technician"),
            Self::Price => write!(f, "price"),
            Self::Date => write!(f, "date"),
        }
    }
}

/// How to read and normalize an import file
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub columns: ColumnConfig,
    /// Year for dates written without one; current year when `None`
    pub default_year: Option<i32>,
    pub delimiter: u8,
    /// Used to attach scheduling ids to technician tokens; may be empty
    pub roster: TechnicianRoster,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            columns: ColumnConfig::default(),
            default_year: None,
            delimiter: b',',
            roster: TechnicianRoster::default(),
        }
    }
}

impl ImportOptions {
    pub fn from_config(config: &ImportConfig, roster: TechnicianRoster) -> Result<Self> {
        Ok(Self {
            columns: config.columns.clone(),
            default_year: config.default_year,
            delimiter: config.delimiter_byte()?,
            roster,
        })
    }
}

/// One row after normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    /// 1-based data row (header excluded)
    pub row: usize,
    pub id: Option<String>,
    pub client_name: Option<String>,
    pub technician: Option<String>,
    pub technician_id: Option<String>,
    pub price: Option<f64>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// Fields that had a value which could not be normalized
    pub rejected_fields: Vec<Field>,
}

impl NormalizedRecord {
    pub fn is_clean(&self) -> bool {
        self.rejected_fields.is_empty()
    }
}

/// Batch counters for operator review
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub rows_read: usize,
    pub rows_clean: usize,
    /// Rows the CSV reader could not decode; skipped
    pub rows_unreadable: usize,
    /// Technician tokens with no roster entry (only counted with a roster)
    pub unresolved_technicians: usize,
    pub rejected: BTreeMap<Field, usize>,
}

impl ImportReport {
    fn record(&mut self, record: &NormalizedRecord) {
        self.rows_read += 1;
        if record.is_clean() {
            self.rows_clean += 1;
        }
        for field in &record.rejected_fields {
            *self.rejected.entry(*field).or_insert(0) += 1;
        }
    }
}

/// Normalized rows plus their report
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportBatch {
    pub records: Vec<NormalizedRecord>,
    pub report: ImportReport,
}

/// Run every normalizer over one row (header name → raw value)
///
/// Blank or absent values normalize to `None` without being counted as
/// rejected; a present value that normalizes to `None` is rejected.
pub fn normalize_record(
    row: usize,
    fields: &HashMap<String, String>,
    options: &ImportOptions,
) -> NormalizedRecord {
    let columns = &options.columns;
    let raw = |column: &str| {
        fields
            .get(column)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    };

    let mut rejected_fields = Vec::new();
    let mut check = |field: Field, input: Option<&str>, present: bool| {
        if input.is_some() && !present {
            rejected_fields.push(field);
        }
    };

    let client_name = clean_client_name(raw(&columns.client_name));
    check(
        Field::ClientName,
        raw(&columns.client_name),
        client_name.as_deref().is_some_and(|name| !name.is_empty()),
    );

    let technician = normalize_technician_name(raw(&columns.technician).map(str::trim));
    check(
        Field::Technician,
        raw(&columns.technician),
        technician.as_deref().is_some_and(|name| !name.is_empty()),
    );

    let price = raw(&columns.price).and_then(clean_price_str);
    check(Field::Price, raw(&columns.price), price.is_some());

    let date = parse_flexible_date(raw(&columns.date), options.default_year);
    check(Field::Date, raw(&columns.date), date.is_some());

    let technician_id = technician
        .as_deref()
        .and_then(|token| resolve_technician(&options.roster, token))
        .map(|t| t.id.clone());

    NormalizedRecord {
        row,
        id: raw(&columns.id).map(|id| id.trim().to_string()),
        client_name,
        technician,
        technician_id,
        price,
        date,
        rejected_fields,
    }
}

/// Normalize a whole delimited file
///
/// Rows that cannot be normalized are kept and counted. Rows the reader cannot
/// decode are skipped and counted. Only I/O failures and an unreadable header
/// abort the batch.
pub fn normalize_csv<R: Read>(reader: R, options: &ImportOptions) -> Result<ImportBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    debug!("Import headers: {:?}", headers);

    let mut batch = ImportBatch::default();
    for (index, result) in rdr.records().enumerate() {
        let row = index + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!(row, "Skipping unreadable row: {}", e);
                batch.report.rows_unreadable += 1;
                continue;
            }
        };

        let fields: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();

        let normalized = normalize_record(row, &fields, options);
        for field in &normalized.rejected_fields {
            let value = fields
                .get(field_column(&options.columns, *field))
                .map(String::as_str)
                .unwrap_or_default();
            warn!(row, field = %field, value = %value, "Value could not be normalized");
        }
        if !options.roster.is_empty()
            && normalized.technician.is_some()
            && normalized.technician_id.is_none()
        {
            batch.report.unresolved_technicians += 1;
            debug!(row, technician = ?normalized.technician, "Technician not in roster");
        }

        batch.report.record(&normalized);
        batch.records.push(normalized);
    }

    info!(
        rows_read = batch.report.rows_read,
        rows_clean = batch.report.rows_clean,
        rows_unreadable = batch.report.rows_unreadable,
        "Import batch normalized"
    );
    Ok(batch)
}

fn field_column(columns: &ColumnConfig, field: Field) -> &str {
    match field {
        Field::ClientName => &columns.client_name,
        Field::Technician => &columns.technician,
        Field::Price => &columns.price,
        Field::Date => &columns.date,
    }
}

/// Write normalized rows as a delimited file with a fixed header
pub fn write_normalized_csv<W: Write>(
    writer: W,
    records: &[NormalizedRecord],
    delimiter: u8,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    wtr.write_record([
        "row",
        "id",
        "client_name",
        "technician",
        "technician_id",
        "price",
        "date",
        "rejected_fields",
    ])?;

    for record in records {
        let rejected = record
            .rejected_fields
            .iter()
            .map(Field::to_string)
            .collect::<Vec<_>>()
            .join(";");
        wtr.write_record([
            record.row.to_string(),
            record.id.clone().unwrap_or_default(),
            record.client_name.clone().unwrap_or_default(),
            record.technician.clone().unwrap_or_default(),
            record.technician_id.clone().unwrap_or_default(),
            record.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
            record.date.clone().unwrap_or_default(),
            rejected,
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the batch report as pretty JSON; buffered output is flushed here
pub fn write_import_report<W: Write>(writer: W, report: &ImportReport) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}
