//! CSV rendering of a result set.
//!
//! Writes one heading row of display labels (optional) followed by the
//! data rows. Synthetic id columns, selected for linking but never
//! explicitly asked for, are suppressed.

use crate::processor::ResultSet;

/// Renders a [`ResultSet`] as RFC-4180-style CSV text.
pub struct CsvExporter<'a> {
    result: &'a ResultSet,
    headings: bool,
}

impl<'a> CsvExporter<'a> {
    pub fn new(result: &'a ResultSet) -> Self {
        Self {
            result,
            headings: true,
        }
    }

    /// Toggle the label heading row; on by default.
    pub fn headings(mut self, headings: bool) -> Self {
        self.headings = headings;
        self
    }

    pub fn export(&self) -> String {
        let kept: Vec<usize> = self
            .result
            .keys
            .iter()
            .enumerate()
            .filter(|(_, key)| !self.is_synthetic_id(key))
            .map(|(index, _)| index)
            .collect();

        let mut out = String::new();
        if self.headings {
            let labels: Vec<String> = self
                .result
                .labels
                .iter()
                .map(|(_, label)| label.clone())
                .collect();
            push_record(&mut out, &labels);
        }
        for row in &self.result.rows {
            let cells: Vec<String> = kept
                .iter()
                .filter_map(|&index| row.get(index))
                .map(|value| value.to_string())
                .collect();
            push_record(&mut out, &cells);
        }
        out
    }

    /// An id column is synthetic when it was not explicitly selected and
    /// therefore carries no label.
    fn is_synthetic_id(&self, key: &str) -> bool {
        let is_id = key == "id" || key.ends_with(".id");
        is_id && self.result.label(key).is_none()
    }
}

fn push_record(out: &mut String, cells: &[String]) {
    for (index, cell) in cells.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}
