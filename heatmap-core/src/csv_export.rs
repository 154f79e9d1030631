//! CSV rendition of the current view: visible rows in display order.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{HeatmapError, Result};
use crate::pipeline::LabelSet;
use crate::types::{Cell, CellId};

/// Header line plus one line per visible row, without line terminators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvView {
    pub header: String,
    pub rows: Vec<String>,
}

impl CsvView {
    /// Full document with `\n` terminators
    pub fn to_document(&self) -> String {
        let mut out = String::with_capacity(self.header.len() + self.rows.iter().map(|r| r.len() + 1).sum::<usize>() + 1);
        out.push_str(&self.header);
        out.push('\n');
        for row in &self.rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }
}

/// Neutralize spreadsheet formula injection in a text field.
pub fn sanitize_field(value: &str) -> String {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{}", value),
        _ => value.to_string(),
    }
}

fn encode_record(fields: &[String]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| HeatmapError::export(format!("CSV buffer error: {}", e)))?;
    let mut line = String::from_utf8(bytes).map_err(|e| HeatmapError::export(e.to_string()))?;
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

/// Build the CSV for the rows currently on screen.
///
/// `headers` lead the header line, followed by one column per column label.
/// A `Genus` header adds a genus column after the row label. Values come
/// from the drawn cells and default to 0 where no cell was drawn.
pub fn current_view_csv(labels: &LabelSet, cells: &[Cell], headers: &[String]) -> Result<CsvView> {
    let values: HashMap<CellId, f64> = cells
        .iter()
        .filter_map(|cell| cell.value.map(|v| (cell.id(), v)))
        .collect();
    let with_genus = headers.iter().any(|h| h == "Genus");

    let columns = labels.columns_by_pos();
    let mut header_fields: Vec<String> = headers.iter().map(|h| sanitize_field(h)).collect();
    header_fields.extend(columns.iter().map(|c| sanitize_field(&c.label)));
    let header = encode_record(&header_fields)?;

    let mut rows = Vec::new();
    for row in labels.rows_by_pos() {
        let mut fields = vec![sanitize_field(&row.label)];
        if with_genus {
            fields.push(sanitize_field(row.genus_name.as_deref().unwrap_or("")));
        }
        for column in &columns {
            let id = CellId {
                row_index: row.row_index,
                column_index: column.column_index,
            };
            fields.push(values.get(&id).copied().unwrap_or(0.0).to_string());
        }
        rows.push(encode_record(&fields)?);
    }

    log::debug!("Exported {} rows x {} columns to CSV", rows.len(), columns.len());
    Ok(CsvView { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{filter, parse};
    use crate::text::ApproxTextMeasure;
    use crate::types::{ColumnLabelInput, HeatmapData, RowLabelInput};
    use crate::HeatmapOptions;

    fn view(data: &HeatmapData, headers: &[String]) -> CsvView {
        let parsed = parse(data, &HeatmapOptions::default(), &ApproxTextMeasure).unwrap();
        let filtered = filter(&parsed);
        current_view_csv(&parsed.labels, &filtered.cells, headers).unwrap()
    }

    #[test]
    fn test_missing_values_export_as_zero() {
        let data = HeatmapData::new(
            vec![vec![Some(1.0), None], vec![Some(0.0), Some(3.0)]],
            vec![RowLabelInput::new("R1"), RowLabelInput::new("R2")],
            vec![ColumnLabelInput::new(1, "C1"), ColumnLabelInput::new(2, "C2")],
        );
        let csv = view(&data, &["Taxon".into()]);
        assert_eq!(csv.header, "Taxon,C1,C2");
        assert_eq!(csv.rows, vec!["R1,1,0", "R2,0,3"]);
        assert_eq!(csv.to_document(), "Taxon,C1,C2\nR1,1,0\nR2,0,3\n");
    }

    #[test]
    fn test_genus_column() {
        let mut row = RowLabelInput::new("Escherichia coli");
        row.genus_name = Some("Escherichia".into());
        let data = HeatmapData::new(vec![vec![Some(2.5)]], vec![row], vec![ColumnLabelInput::new(1, "S1")]);
        let csv = view(&data, &["Taxon".into(), "Genus".into()]);
        assert_eq!(csv.header, "Taxon,Genus,S1");
        assert_eq!(csv.rows, vec!["Escherichia coli,Escherichia,2.5"]);
    }

    #[test]
    fn test_hidden_rows_are_not_exported() {
        let mut hidden = RowLabelInput::new("R2");
        hidden.hidden = true;
        let data = HeatmapData::new(
            vec![vec![Some(1.0)], vec![Some(2.0)]],
            vec![RowLabelInput::new("R1"), hidden],
            vec![ColumnLabelInput::new(1, "C1")],
        );
        assert_eq!(view(&data, &[]).rows, vec!["R1,1"]);
    }

    #[test]
    fn test_formula_prefixes_are_neutralized() {
        assert_eq!(sanitize_field("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(sanitize_field("@cmd"), "'@cmd");
        assert_eq!(sanitize_field("Bacillus"), "Bacillus");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let data = HeatmapData::new(
            vec![vec![Some(1.0)]],
            vec![RowLabelInput::new("Virus, unclassified")],
            vec![ColumnLabelInput::new(1, "C1")],
        );
        assert_eq!(view(&data, &[]).rows, vec!["\"Virus, unclassified\",1"]);
    }

    #[test]
    fn test_caller_headers_lead_the_header_line() {
        let data = HeatmapData::new(
            vec![vec![Some(1.0), Some(2.0)]],
            vec![RowLabelInput::new("R1")],
            vec![ColumnLabelInput::new(1, "C1"), ColumnLabelInput::new(2, "=C2")],
        );
        assert_eq!(view(&data, &["Sample".into()]).header, "Sample,C1,'=C2");
        assert_eq!(view(&data, &[]).header, "C1,'=C2");
        assert_eq!(view(&data, &["+Taxon".into()]).header, "'+Taxon,C1,'=C2");
    }
}
