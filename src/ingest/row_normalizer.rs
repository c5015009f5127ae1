// ==========================================
// Order Flow - row normalizer & validator
// ==========================================
// Canonicalizes header keys and coerces one raw field map into a
// typed row. Failures here are per-row and non-fatal to the run:
// the caller records them and moves on. One malformed row never
// aborts the batch.
// ==========================================

use crate::domain::{RawRow, ValidatedRow};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Per-run normalization options, resolved from configuration
/// before the row loop starts.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Applied when qty_open is absent. Inherited default is 0.0,
    /// which derives a fresh order as completed; see
    /// IngestConfigReader::get_default_qty_open.
    pub default_qty_open: f64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            default_qty_open: 0.0,
        }
    }
}

/// Excel serial day 0. Serial 1 maps to 1899-12-31.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

pub struct RowNormalizer;

impl RowNormalizer {
    /// Canonical form of one header key: trim, lowercase, collapse
    /// separator runs (whitespace and hyphens) to a single
    /// underscore, strip parentheses, strip anything else outside
    /// [a-z0-9_]. Idempotent, so re-normalizing an already-canonical
    /// key is a no-op.
    pub fn canonical_key(key: &str) -> String {
        let lowered = key.trim().to_lowercase();

        let mut result = String::with_capacity(lowered.len());
        let mut in_separator = false;
        for ch in lowered.chars() {
            if ch.is_whitespace() || ch == '-' {
                if !in_separator {
                    result.push('_');
                    in_separator = true;
                }
                continue;
            }
            in_separator = false;
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
                result.push(ch);
            }
            // parentheses and any other punctuation are dropped
        }

        result.trim_matches('_').to_string()
    }

    /// Re-key a raw row onto canonical field names. When two source
    /// headers collapse onto the same key, the later one wins
    /// (source column order is preserved by the decoder only per
    /// row, which is sufficient: headers are expected distinct).
    pub fn normalize_keys(raw: &RawRow) -> RawRow {
        raw.iter()
            .map(|(key, value)| (Self::canonical_key(key), value.clone()))
            .collect()
    }

    /// Coerce and validate one normalized row.
    ///
    /// Required: non-empty doc_nr, numeric item_nr. Optional
    /// numerics default to zero when absent but fail validation
    /// when present and non-coercible. Dates never fail: an
    /// unparseable date string yields None.
    pub fn validate(normalized: &RawRow, opts: &NormalizeOptions) -> Result<ValidatedRow, Vec<String>> {
        let mut errors: Vec<String> = Vec::new();

        let doc_nr = match Self::opt_string(normalized, "doc_nr") {
            Some(value) => value,
            None => {
                errors.push("doc_nr: required field is missing or empty".to_string());
                String::new()
            }
        };

        let item_nr = match normalized.get("item_nr").map(|s| s.trim()) {
            Some(raw) if !raw.is_empty() => Self::parse_i64(raw).unwrap_or_else(|| {
                errors.push(format!("item_nr: not a number: '{}'", raw));
                0
            }),
            _ => {
                errors.push("item_nr: required field is missing or empty".to_string());
                0
            }
        };

        let row = ValidatedRow {
            doc_nr,
            item_nr,

            client_code: Self::opt_string(normalized, "client_code"),
            client_name: Self::opt_string(normalized, "client_name"),
            po: Self::opt_string(normalized, "po"),
            article: Self::opt_string(normalized, "article"),
            unit: Self::opt_string(normalized, "unit"),
            family: Self::opt_string(normalized, "family"),
            reference: Self::opt_string(normalized, "reference"),
            color_code: Self::opt_string(normalized, "color_code"),
            color_name: Self::opt_string(normalized, "color_name"),
            size_code: Self::opt_string(normalized, "size_code"),
            size_name: Self::opt_string(normalized, "size_name"),
            ean: Self::opt_string(normalized, "ean"),

            qty: Self::num_or_default(normalized, "qty", 0.0, &mut errors),
            qty_invoiced: Self::num_or_default(normalized, "qty_invoiced", 0.0, &mut errors),
            qty_open: Self::num_or_default(normalized, "qty_open", opts.default_qty_open, &mut errors),

            felpo_cru: Self::num_or_default(normalized, "felpo_cru", 0.0, &mut errors),
            tinturaria: Self::num_or_default(normalized, "tinturaria", 0.0, &mut errors),
            confeccao_roupoes: Self::num_or_default(normalized, "confeccao_roupoes", 0.0, &mut errors),
            confeccao_felpos: Self::num_or_default(normalized, "confeccao_felpos", 0.0, &mut errors),
            emb_acab: Self::num_or_default(normalized, "emb_acab", 0.0, &mut errors),
            stock_cx: Self::num_or_default(normalized, "stock_cx", 0.0, &mut errors),

            issue_date: Self::opt_date(normalized, "issue_date"),
            requested_date: Self::opt_date(normalized, "requested_date"),
            data_tec: Self::opt_date(normalized, "data_tec"),
            data_felpo_cru: Self::opt_date(normalized, "data_felpo_cru"),
            data_tint: Self::opt_date(normalized, "data_tint"),
            data_conf: Self::opt_date(normalized, "data_conf"),
            data_arm_exp: Self::opt_date(normalized, "data_arm_exp"),
            data_ent: Self::opt_date(normalized, "data_ent"),
            data_especial: Self::opt_date(normalized, "data_especial"),
            data_printer: Self::opt_date(normalized, "data_printer"),
            data_debuxo: Self::opt_date(normalized, "data_debuxo"),
            data_amostras: Self::opt_date(normalized, "data_amostras"),
            data_bordados: Self::opt_date(normalized, "data_bordados"),
        };

        if errors.is_empty() {
            Ok(row)
        } else {
            Err(errors)
        }
    }

    // ==========================================
    // Field coercion helpers
    // ==========================================

    fn opt_string(map: &RawRow, key: &str) -> Option<String> {
        map.get(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse_i64(raw: &str) -> Option<i64> {
        raw.parse::<i64>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
    }

    /// Numeric field: absent/empty uses the default without error,
    /// present-but-invalid is a validation failure.
    fn num_or_default(map: &RawRow, key: &str, default: f64, errors: &mut Vec<String>) -> f64 {
        match map.get(key).map(|s| s.trim()) {
            Some(raw) if !raw.is_empty() => match raw.parse::<f64>() {
                Ok(value) => value,
                Err(_) => {
                    errors.push(format!("{}: not a number: '{}'", key, raw));
                    default
                }
            },
            _ => default,
        }
    }

    /// Date field: absent/empty and unparseable both yield None.
    /// A numeric value is a spreadsheet serial day count.
    fn opt_date(map: &RawRow, key: &str) -> Option<DateTime<Utc>> {
        let raw = map.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())?;
        Self::parse_date_value(raw)
    }

    fn parse_date_value(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(serial) = raw.parse::<f64>() {
            return Self::from_excel_serial(serial);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        const FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
        for format in FORMATS {
            if format.contains("%H") {
                if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, format) {
                    return Some(naive.and_utc());
                }
            } else if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
            }
        }
        None
    }

    /// Spreadsheet serial day count anchored at 1899-12-30, whole
    /// day offsets (serial 1 -> 1899-12-31).
    fn from_excel_serial(serial: f64) -> Option<DateTime<Utc>> {
        let (y, m, d) = EXCEL_EPOCH;
        let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
        let date = epoch.checked_add_signed(Duration::days(serial.trunc() as i64))?;
        date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
    }
}
