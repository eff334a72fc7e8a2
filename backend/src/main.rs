use actix_web::{web, App, HttpServer};
use certificados::config;
use certificados::services::certificates::{self, pages};
use certificados::services::convert::pdf::FontSource;
use env_logger::Env;
use log::{error, info, warn};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let cfg = config::load().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let host = cfg.server.host.clone();
    let port = cfg.server.port;

    info!("Server running at http://{}:{}", host, port);
    info!("Certificates will be written to {}", cfg.output.output_root().display());

    let fonts = FontSource::new(cfg.conversion.fonts_dir.clone(), cfg.conversion.font_families.clone());
    if !fonts.has_candidates() {
        warn!(
            "No font family {:?} in {}; the layout and text-flow PDF fallbacks are disabled",
            fonts.families,
            fonts.dir.display()
        );
    }

    let cfg = web::Data::new(cfg);
    HttpServer::new(move || {
        App::new()
            .app_data(cfg.clone())
            .service(certificates::configure_routes())
            .default_service(web::route().to(pages::serve_embedded))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
