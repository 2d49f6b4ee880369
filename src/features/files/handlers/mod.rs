pub mod file_handler;
pub mod upload_handler;

pub use file_handler::{delete_file, get_file_url, list_files};
pub use upload_handler::upload_files;
