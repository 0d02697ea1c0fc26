use thiserror::Error;

pub type IntakeResult<T> = Result<T, IntakeError>;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("No file was uploaded")]
    MissingFile,

    #[error("Empty workbook: {0}")]
    EmptyWorkbook(String),

    #[error("Missing headers in workbook: {}", missing.join(", "))]
    MissingHeaders {
        /// Canonical fields with no matching header, in declaration order
        missing: Vec<String>,
        /// Literal headers found in the first row
        found: Vec<String>,
    },

    #[error("No valid rows to import (missing or empty NIF)")]
    NoValidRows,

    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    /// HTTP status the API layer reports for this error
    pub fn status_code(&self) -> u16 {
        match self {
            IntakeError::MissingFile
            | IntakeError::EmptyWorkbook(_)
            | IntakeError::MissingHeaders { .. }
            | IntakeError::NoValidRows
            | IntakeError::Workbook(_) => 400,
            IntakeError::Persistence(_) | IntakeError::Io(_) => 500,
        }
    }

    /// True for errors whose detail comes from storage or the filesystem
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_headers_message_lists_every_field() {
        let err = IntakeError::MissingHeaders {
            missing: vec!["NIF".to_string(), "REJET".to_string()],
            found: vec!["DATE DE DEPOT".to_string()],
        };
        assert_eq!(err.to_string(), "Missing headers in workbook: NIF, REJET");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(IntakeError::MissingFile.status_code(), 400);
        assert_eq!(IntakeError::NoValidRows.status_code(), 400);
        assert_eq!(
            IntakeError::EmptyWorkbook("no sheets".to_string()).status_code(),
            400
        );
        let io = IntakeError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.status_code(), 500);
        assert!(io.is_internal());
        assert!(!IntakeError::NoValidRows.is_internal());
    }
}
