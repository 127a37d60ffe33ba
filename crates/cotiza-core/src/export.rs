//! # CSV Export
//!
//! Row formatting for the quote export consumed by the tabular-export
//! collaborator. The rendering engine itself is out of scope; this module
//! produces the exact textual rows and the download filename.
//!
//! ## Output Shape
//! ```text
//! ID,Fecha,Cliente,Total,Estado,Vendedor,Email Cliente
//! 12,2026-03-01,Comercial Andes,238000,Enviada,María Pérez,contacto@andes.cl
//! 13,2026-03-02,Frutera Sur,59500,Aceptada,N/A,N/A
//! ```
//!
//! An optional month/year filter narrows the export. Malformed filter
//! parameters are ignored (the export falls back to the full history) -
//! they are never an error.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;

use crate::types::{Quote, QuoteStatus};

// =============================================================================
// Constants
// =============================================================================

/// CSV header row, matching the historical export layout.
pub const CSV_HEADER: &str = "ID,Fecha,Cliente,Total,Estado,Vendedor,Email Cliente";

/// Spanish month names for export filenames (index 0 = enero).
const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

// =============================================================================
// Month Filter
// =============================================================================

/// A validated month/year export filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthFilter {
    pub month: u32,
    pub year: i32,
}

impl MonthFilter {
    /// Parses filter parameters as received from the caller.
    ///
    /// Returns `None` (meaning: no filter) when either parameter is
    /// absent, non-numeric, or out of range. Invalid input is defaulted,
    /// not propagated.
    pub fn parse(month: Option<&str>, year: Option<&str>) -> Option<MonthFilter> {
        let month: u32 = month?.trim().parse().ok()?;
        let year: i32 = year?.trim().parse().ok()?;

        if !(1..=12).contains(&month) || !(1970..=9999).contains(&year) {
            return None;
        }

        Some(MonthFilter { month, year })
    }

    /// Whether a timestamp falls inside the filtered month.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts.year() == self.year && ts.month() == self.month
    }

    /// Spanish name of the filtered month.
    fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }
}

// =============================================================================
// Records & Rendering
// =============================================================================

/// One quote row ready for export, with its denormalized display fields.
#[derive(Debug, Clone)]
pub struct QuoteExportRecord {
    pub sequence_number: i64,
    pub created_at: DateTime<Utc>,
    pub client_name: String,
    pub client_email: Option<String>,
    pub worker_name: Option<String>,
    pub status: QuoteStatus,
    pub total: Decimal,
}

impl QuoteExportRecord {
    /// Builds a record from a quote plus its display fields.
    pub fn new(
        quote: &Quote,
        client_name: &str,
        client_email: Option<&str>,
        worker_name: Option<&str>,
        total: Decimal,
    ) -> Self {
        QuoteExportRecord {
            sequence_number: quote.sequence_number,
            created_at: quote.created_at,
            client_name: client_name.to_string(),
            client_email: client_email.map(str::to_string),
            worker_name: worker_name.map(str::to_string),
            status: quote.status,
            total,
        }
    }
}

/// Renders the full CSV document (header + one row per record).
///
/// Records outside the filter, when one is given, are dropped.
pub fn render_csv(records: &[QuoteExportRecord], filter: Option<MonthFilter>) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for record in records {
        if let Some(f) = filter {
            if !f.contains(record.created_at) {
                continue;
            }
        }
        out.push_str(&render_row(record));
        out.push('\n');
    }

    out
}

/// Filename for the export download.
///
/// `cotizaciones-{mes}-{año}.csv` when filtered, otherwise
/// `cotizaciones-historico-{fecha}.csv`.
pub fn export_filename(filter: Option<MonthFilter>, now: DateTime<Utc>) -> String {
    match filter {
        Some(f) => format!("cotizaciones-{}-{}.csv", f.month_name(), f.year),
        None => format!("cotizaciones-historico-{}.csv", now.format("%Y-%m-%d")),
    }
}

fn render_row(record: &QuoteExportRecord) -> String {
    let fields = [
        record.sequence_number.to_string(),
        record.created_at.format("%Y-%m-%d").to_string(),
        record.client_name.clone(),
        record.total.to_string(),
        record.status.spanish_label().to_string(),
        record
            .worker_name
            .clone()
            .unwrap_or_else(|| "N/A".to_string()),
        record
            .client_email
            .clone()
            .unwrap_or_else(|| "N/A".to_string()),
    ];

    fields
        .iter()
        .map(|f| csv_escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Quotes a field when it contains a delimiter, quote or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn record(seq: i64, ts: DateTime<Utc>) -> QuoteExportRecord {
        QuoteExportRecord {
            sequence_number: seq,
            created_at: ts,
            client_name: "Comercial Andes".to_string(),
            client_email: Some("contacto@andes.cl".to_string()),
            worker_name: Some("María Pérez".to_string()),
            status: QuoteStatus::Sent,
            total: dec!(238000),
        }
    }

    #[test]
    fn test_render_csv_header_and_row() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let csv = render_csv(&[record(12, ts)], None);

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("12,2026-03-01,Comercial Andes,238000,Enviada,María Pérez,contacto@andes.cl")
        );
    }

    #[test]
    fn test_missing_worker_and_email_show_na() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut rec = record(13, ts);
        rec.worker_name = None;
        rec.client_email = None;

        let csv = render_csv(&[rec], None);
        assert!(csv.lines().nth(1).unwrap().ends_with(",N/A,N/A"));
    }

    #[test]
    fn test_field_with_comma_is_quoted() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut rec = record(14, ts);
        rec.client_name = "Pérez, Soto y Cía".to_string();

        let csv = render_csv(&[rec], None);
        assert!(csv.contains("\"Pérez, Soto y Cía\""));
    }

    #[test]
    fn test_month_filter_drops_other_months() {
        let march = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        let filter = MonthFilter::parse(Some("3"), Some("2026"));
        assert!(filter.is_some());

        let csv = render_csv(&[record(1, march), record(2, april)], filter);
        assert_eq!(csv.lines().count(), 2); // header + march row only
    }

    #[test]
    fn test_invalid_filter_params_are_ignored() {
        assert_eq!(MonthFilter::parse(Some("13"), Some("2026")), None);
        assert_eq!(MonthFilter::parse(Some("0"), Some("2026")), None);
        assert_eq!(MonthFilter::parse(Some("feb"), Some("2026")), None);
        assert_eq!(MonthFilter::parse(Some("2"), Some("year")), None);
        assert_eq!(MonthFilter::parse(None, Some("2026")), None);
        assert_eq!(MonthFilter::parse(Some("2"), None), None);
    }

    #[test]
    fn test_export_filename() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 10, 0, 0).unwrap();
        let filter = MonthFilter::parse(Some("1"), Some("2026"));
        assert_eq!(export_filename(filter, now), "cotizaciones-enero-2026.csv");
        assert_eq!(
            export_filename(None, now),
            "cotizaciones-historico-2026-08-06.csv"
        );
    }
}
