//! HTTP surface of the certificate generator.
//!
//! - `GET /` and static assets: embedded pages served by [`pages::serve_embedded`].
//! - `POST /procesar`: multipart upload with the spreadsheet in the `excel_file` field.
//!   Responds with the success page, the nothing-pending page, or a plain-text error
//!   (400 for problems with the uploaded data or the template, 500 otherwise).

pub mod pages;
mod process;

use actix_web::web::{post, resource};
use actix_web::Resource;

const PROCESS_PATH: &str = "/procesar";

/// Multipart field carrying the spreadsheet.
pub const UPLOAD_FIELD: &str = "excel_file";

pub fn configure_routes() -> Resource {
    resource(PROCESS_PATH).route(post().to(process::process))
}
