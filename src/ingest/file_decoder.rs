// ==========================================
// Order Flow - file decoder
// ==========================================
// Turns raw bytes + original filename into an ordered sequence of
// raw field maps, one per data row. The extension selects the
// strategy: .xlsx/.xls open as workbooks (first sheet only), every
// other extension goes down the delimited-text path, matching the
// upstream export variants (tab, semicolon or comma separated,
// assorted legacy encodings).
//
// Failure here is fatal for the whole run; there is no partial
// output.
// ==========================================

use crate::domain::RawRow;
use crate::ingest::error::{IngestError, IngestResult};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use chardetng::EncodingDetector;
use csv::ReaderBuilder;
use std::io::Cursor;

pub struct FileDecoder;

impl FileDecoder {
    /// Decode an uploaded file into raw field maps, in source order.
    pub fn decode(bytes: &[u8], filename: &str) -> IngestResult<Vec<RawRow>> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" => {
                let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
                let range = Self::first_sheet_range(&mut workbook)?;
                Ok(Self::range_to_rows(&range))
            }
            "xls" => {
                let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))?;
                let range = Self::first_sheet_range(&mut workbook)?;
                Ok(Self::range_to_rows(&range))
            }
            _ => Self::decode_delimited(bytes),
        }
    }

    /// Data range of the first sheet. Workbooks without sheets are
    /// undecodable.
    fn first_sheet_range<RS, R>(workbook: &mut R) -> IngestResult<Range<Data>>
    where
        RS: std::io::Read + std::io::Seek,
        R: Reader<RS>,
        R::Error: std::fmt::Display,
    {
        let sheet_names = workbook.sheet_names();
        let first = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::ExcelDecodeError("workbook has no sheets".to_string()))?;

        workbook
            .worksheet_range(&first)
            .map_err(|e| IngestError::ExcelDecodeError(e.to_string()))
    }

    /// Convert a sheet range to field maps using the first row as
    /// headers. Missing cells become empty strings, never absent
    /// keys. Fully blank rows are skipped.
    fn range_to_rows(range: &Range<Data>) -> Vec<RawRow> {
        let mut rows_iter = range.rows();
        let headers: Vec<String> = match rows_iter.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            None => return Vec::new(),
        };

        let mut rows = Vec::new();
        for data_row in rows_iter {
            let mut row_map = RawRow::new();
            for (col_idx, header) in headers.iter().enumerate() {
                let value = data_row
                    .get(col_idx)
                    .map(|cell| cell.to_string().trim().to_string())
                    .unwrap_or_default();
                row_map.insert(header.clone(), value);
            }

            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(row_map);
        }
        rows
    }

    /// Decode delimited text: heuristic charset detection over the
    /// byte stream (UTF-8 fallback when inconclusive), then
    /// delimiter sniffing on the first line with fixed priority
    /// tab > semicolon > comma.
    fn decode_delimited(bytes: &[u8]) -> IngestResult<Vec<RawRow>> {
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        let encoding = detector.guess(None, true);
        let (text, _, _) = encoding.decode(bytes);

        let first_line = text.lines().next().unwrap_or("");
        let delimiter = Self::detect_delimiter(first_line);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = RawRow::new();
            for (col_idx, header) in headers.iter().enumerate() {
                let value = record
                    .get(col_idx)
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default();
                row_map.insert(header.clone(), value);
            }

            // The csv reader already skips blank lines; this guards
            // against delimiter-only lines.
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(row_map);
        }
        Ok(rows)
    }

    fn detect_delimiter(first_line: &str) -> u8 {
        if first_line.contains('\t') {
            b'\t'
        } else if first_line.contains(';') {
            b';'
        } else {
            b','
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_priority_tab_semicolon_comma() {
        assert_eq!(FileDecoder::detect_delimiter("a\tb;c,d"), b'\t');
        assert_eq!(FileDecoder::detect_delimiter("a;b,c"), b';');
        assert_eq!(FileDecoder::detect_delimiter("a,b"), b',');
        assert_eq!(FileDecoder::detect_delimiter("single"), b',');
    }

    #[test]
    fn test_decode_semicolon_csv() {
        let bytes = b"doc_nr;item_nr;qty\nA1;1;100\nA2;2;50\n";
        let rows = FileDecoder::decode(bytes, "export.csv").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("doc_nr"), Some(&"A1".to_string()));
        assert_eq!(rows[0].get("qty"), Some(&"100".to_string()));
        assert_eq!(rows[1].get("item_nr"), Some(&"2".to_string()));
    }

    #[test]
    fn test_decode_tab_separated_txt() {
        let bytes = b"doc_nr\titem_nr\nB7\t3\n";
        let rows = FileDecoder::decode(bytes, "export.txt").unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("doc_nr"), Some(&"B7".to_string()));
    }

    #[test]
    fn test_decode_skips_blank_and_delimiter_only_lines() {
        let bytes = b"doc_nr,qty\nA1,10\n\n,\nA2,20\n";
        let rows = FileDecoder::decode(bytes, "export.csv").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_decode_short_row_defaults_missing_cells_to_empty() {
        let bytes = b"doc_nr,item_nr,qty\nA1,1\n";
        let rows = FileDecoder::decode(bytes, "export.csv").unwrap();

        assert_eq!(rows[0].get("qty"), Some(&"".to_string()));
    }

    #[test]
    fn test_decode_latin1_bytes() {
        // "Confecção" in ISO-8859-1; undetectable as UTF-8.
        let mut bytes: Vec<u8> = Vec::new();
        bytes.extend_from_slice(b"client_name,qty\nConfec\xe7\xe3o Lda,5\n");
        let rows = FileDecoder::decode(&bytes, "legacy.csv").unwrap();

        assert_eq!(rows.len(), 1);
        let name = rows[0].get("client_name").unwrap();
        assert!(name.contains("Confec"));
        assert!(!name.contains('\u{FFFD}'), "no replacement chars expected");
    }

    #[test]
    fn test_decode_invalid_xlsx_is_fatal() {
        let bytes = b"this is not a zip container";
        let result = FileDecoder::decode(bytes, "orders.xlsx");
        assert!(matches!(result, Err(IngestError::ExcelDecodeError(_))));
    }
}
