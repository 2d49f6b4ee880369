pub mod file;

pub use file::{DocumentAnalysis, DocumentLanguage, FileRecord, ProcessingStatus};
