use actix_web::{HttpRequest, HttpResponse};
use common::batch::BatchReport;
use include_dir::{include_dir, Dir};
use mime_guess::from_path;

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static");

const INDEX: &str = "index.html";
const SUCCESS: &str = "success.html";
const NOTHING_PENDING: &str = "nothing_pending.html";

fn page(name: &str) -> &'static str {
    STATIC_DIR
        .get_file(name)
        .and_then(|file| file.contents_utf8())
        .unwrap_or_default()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Success page filled with the batch counts and locations.
pub fn success(report: &BatchReport) -> HttpResponse {
    let body = page(SUCCESS)
        .replace("{{converted}}", &report.converted.to_string())
        .replace("{{degraded}}", &report.degraded.to_string())
        .replace("{{skipped}}", &report.skipped.to_string())
        .replace("{{output_dir}}", &escape_html(&report.output_dir.to_string_lossy()))
        .replace("{{spreadsheet}}", &escape_html(&report.spreadsheet.to_string_lossy()));
    html(body)
}

pub fn nothing_pending() -> HttpResponse {
    html(page(NOTHING_PENDING).to_string())
}

/// Serves the upload page for `/` and any other embedded file by path.
pub async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    let file_path = if path.is_empty() { INDEX } else { path };

    match STATIC_DIR.get_file(file_path) {
        Some(file) => {
            let mime = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => HttpResponse::NotFound().body("Not Found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use common::model::ledger::BatchLedger;
    use std::path::PathBuf;

    #[test]
    fn every_page_is_embedded() {
        for name in [INDEX, SUCCESS, NOTHING_PENDING] {
            assert!(!page(name).is_empty(), "{name} missing");
        }
        assert!(page(INDEX).contains(r#"name="excel_file""#));
    }

    #[actix_web::test]
    async fn success_page_shows_counts_and_escaped_paths() {
        let report = BatchReport {
            batch_id: "b".to_string(),
            converted: 3,
            degraded: 1,
            skipped: 2,
            output_dir: PathBuf::from("/tmp/<Certificados>"),
            spreadsheet: PathBuf::from("/tmp/lista.xlsx"),
            ledger: BatchLedger::new(),
        };
        let body = to_bytes(success(&report).into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();

        assert!(body.contains("PDF: 3"));
        assert!(body.contains("editable): 1"));
        assert!(body.contains("pendientes): 2"));
        assert!(body.contains("/tmp/&lt;Certificados&gt;"));
        assert!(!body.contains("{{"));
    }
}
