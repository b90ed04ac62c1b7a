use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::model::{CellValue, Column, Dataset};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-separated, header row required
/// * `.tsv`          – tab-separated, header row required
pub fn load_file(path: &Path) -> Result<Dataset> {
    let delimiter = delimiter_for(path)?;
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    load_csv_reader(std::io::BufReader::new(file), delimiter)
}

/// Load a table from raw bytes, e.g. a file dropped onto the window on
/// platforms that hand over contents instead of a path.
pub fn load_bytes(name: &str, bytes: &[u8]) -> Result<Dataset> {
    let delimiter = delimiter_for(Path::new(name))?;
    load_csv_reader(bytes, delimiter)
}

fn delimiter_for(path: &Path) -> Result<u8> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => Ok(b','),
        "tsv" => Ok(b'\t'),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: a header row with column names, then one row per observation.
/// Every cell is typed on its own (number, text or empty); date detection
/// happens later, on whole columns.
pub fn load_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = unique_headers(
        reader
            .headers()
            .context("reading CSV headers")?
            .iter(),
    );
    if headers.is_empty() {
        bail!("CSV has no columns");
    }

    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, values) in columns.iter_mut().enumerate() {
            values.push(guess_cell_type(record.get(col_idx).unwrap_or("")));
        }
    }

    let columns = headers
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name, values))
        .collect();

    Ok(Dataset::from_columns(columns))
}

/// Blank headers become `Unnamed: {i}`; repeated headers get a `.{n}` suffix.
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.enumerate()
        .map(|(i, h)| {
            let base = if h.is_empty() {
                format!("Unnamed: {i}")
            } else {
                h.to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

/// Tokens read as missing values, on top of the empty cell.
const NA_TOKENS: &[&str] = &["NA", "N/A", "#N/A", "NaN", "nan", "null", "NULL", "None"];

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() || NA_TOKENS.contains(&s) {
        return CellValue::Null;
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Number(f);
    }
    CellValue::Text(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_typed_cells_in_file_order() {
        let text = "date,value,label\n2024-01-01,1.5,a\n2024-01-02,,b\n";
        let ds = load_csv_reader(text.as_bytes(), b',').unwrap();

        assert_eq!(ds.column_names(), vec!["date", "value", "label"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns[0].values[0], CellValue::Text("2024-01-01".into()));
        assert_eq!(ds.columns[1].values[0], CellValue::Number(1.5));
        assert_eq!(ds.columns[1].values[1], CellValue::Null);
    }

    #[test]
    fn missing_value_tokens_are_null() {
        assert_eq!(guess_cell_type("NaN"), CellValue::Null);
        assert_eq!(guess_cell_type("N/A"), CellValue::Null);
        assert_eq!(guess_cell_type("-3e2"), CellValue::Number(-300.0));
        assert_eq!(guess_cell_type("north"), CellValue::Text("north".into()));
    }

    #[test]
    fn tab_separated_and_whitespace() {
        let text = "when\tx\n 2024-03-01 \t 7 \n";
        let ds = load_csv_reader(text.as_bytes(), b'\t').unwrap();
        assert_eq!(ds.columns[0].values[0], CellValue::Text("2024-03-01".into()));
        assert_eq!(ds.columns[1].values[0], CellValue::Number(7.0));
    }

    #[test]
    fn duplicate_and_blank_headers_are_renamed() {
        let text = "a,a,\n1,2,3\n";
        let ds = load_csv_reader(text.as_bytes(), b',').unwrap();
        assert_eq!(ds.column_names(), vec!["a", "a.1", "Unnamed: 2"]);
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let text = "a,b\n1,2\n3\n";
        let err = load_csv_reader(text.as_bytes(), b',').unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 1"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_bytes("data.xlsx", b"a\n1\n").unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let ds = load_bytes("empty.csv", b"date,value\n").unwrap();
        assert_eq!(ds.columns.len(), 2);
        assert!(ds.is_empty());
    }
}
