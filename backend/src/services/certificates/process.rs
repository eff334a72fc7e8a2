use super::{pages, UPLOAD_FIELD};
use crate::config::AppConfig;
use crate::error::BatchError;
use crate::services::convert::Converter;
use crate::services::merge::{run_batch, Upload};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::batch::BatchOutcome;
use futures_util::StreamExt;
use log::{error, info, warn};

/// `POST /procesar`: reads the upload, runs the batch on the blocking pool and renders
/// the result.
pub async fn process(cfg: web::Data<AppConfig>, payload: Multipart) -> HttpResponse {
    let limit = cfg.server.upload_limit_bytes;
    let result = match read_upload(payload, limit).await {
        Ok(upload) => {
            let cfg = cfg.into_inner();
            tokio::task::spawn_blocking(move || {
                let converter = Converter::from_config(&cfg.conversion);
                info!("Conversion cascade: {:?}", converter.strategy_names());
                run_batch(&cfg, upload, &converter)
            })
            .await
            .unwrap_or_else(|e| Err(BatchError::Internal(format!("batch worker failed: {e}"))))
        }
        Err(e) => Err(e),
    };
    respond(result)
}

fn respond(result: Result<BatchOutcome, BatchError>) -> HttpResponse {
    match result {
        Ok(BatchOutcome::Completed(report)) => pages::success(&report),
        Ok(BatchOutcome::NothingPending) => pages::nothing_pending(),
        Err(e) if e.is_client_error() => {
            warn!("Rejected upload: {}", e);
            HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(e.to_string())
        }
        Err(e) => {
            error!("Batch failed: {}", e);
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body(e.to_string())
        }
    }
}

/// First `excel_file` field of the form, buffered in memory up to `limit` bytes.
async fn read_upload(mut payload: Multipart, limit: usize) -> Result<Upload, BatchError> {
    let invalid = |e: actix_multipart::MultipartError| {
        BatchError::UnreadableSpreadsheet(format!("formulario inválido: {e}"))
    };

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(invalid)?;
        let disposition = field.content_disposition();
        if disposition.and_then(|cd| cd.get_name()) != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = disposition
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .unwrap_or_default();
        if file_name.trim().is_empty() {
            return Err(BatchError::MissingUpload);
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(invalid)?;
            if bytes.len() + chunk.len() > limit {
                return Err(BatchError::UnreadableSpreadsheet(format!(
                    "el archivo supera el límite de {limit} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Upload { file_name, bytes });
    }

    Err(BatchError::MissingUpload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn client_errors_map_to_400_and_others_to_500() {
        let missing = respond(Err(BatchError::MissingColumn {
            field: "horas".to_string(),
            available: vec!["nombre".to_string()],
        }));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let internal = respond(Err(BatchError::Internal("boom".to_string())));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(respond(Ok(BatchOutcome::NothingPending)).status(), StatusCode::OK);
    }
}
