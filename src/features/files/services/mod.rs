pub mod analysis_service;
pub mod fallback_classifier;
pub mod file_service;
pub mod upload_service;

pub use analysis_service::{
    sanitize_analysis, AnalysisOutcome, AnalysisService, ClassificationError, RawAnalysis,
};
pub use fallback_classifier::FallbackClassifier;
pub use file_service::{FileListEntry, FileService};
pub use upload_service::{BatchOutcome, IncomingUpload, UploadService};
