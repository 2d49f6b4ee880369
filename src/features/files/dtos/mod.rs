pub mod file_dto;

pub use file_dto::{
    DeleteFileResponseDto, FileListQuery, FileResponseDto, FileUrlResponseDto, UploadBatchDto,
    UploadBatchResponseDto,
};
