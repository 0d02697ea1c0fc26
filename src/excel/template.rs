//! Blank import template - header row only

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::error::{IntakeError, IntakeResult};
use crate::excel::headers::HEADER_ALIASES;

/// Writer for an empty workbook carrying the expected header row
pub struct TemplateWriter {
    headers: Vec<&'static str>,
}

impl TemplateWriter {
    /// Template with the first accepted variant of every canonical field
    pub fn new() -> Self {
        Self {
            headers: HEADER_ALIASES
                .iter()
                .map(|(_, variants)| variants[0])
                .collect(),
        }
    }

    pub fn headers(&self) -> &[&'static str] {
        &self.headers
    }

    /// Build the template workbook
    fn build(&self) -> IntakeResult<Workbook> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name("Contribuables")
            .map_err(|e| IntakeError::Workbook(format!("Failed to name sheet: {}", e)))?;

        for (col, header) in self.headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *header, &header_format)
                .map_err(|e| IntakeError::Workbook(format!("Failed to write header: {}", e)))?;
            worksheet
                .set_column_width(col as u16, header.chars().count().max(12) as f64)
                .map_err(|e| IntakeError::Workbook(format!("Failed to size column: {}", e)))?;
        }

        Ok(workbook)
    }

    /// Write the template to `output_path`
    pub fn write(&self, output_path: &Path) -> IntakeResult<()> {
        let mut workbook = self.build()?;
        workbook
            .save(output_path)
            .map_err(|e| IntakeError::Workbook(format!("Failed to save template: {}", e)))
    }

    /// Render the template as .xlsx bytes
    pub fn to_bytes(&self) -> IntakeResult<Vec<u8>> {
        let mut workbook = self.build()?;
        workbook
            .save_to_buffer()
            .map_err(|e| IntakeError::Workbook(format!("Failed to render template: {}", e)))
    }
}

impl Default for TemplateWriter {
    fn default() -> Self {
        Self::new()
    }
}
