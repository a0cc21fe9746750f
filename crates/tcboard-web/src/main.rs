use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use tcboard_web::{dispatch, Relay, RelayConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("actix_web=info,tcboard_web=info"),
    )
    .init();

    let config = RelayConfig::from_env();
    let addr = config.addr.clone();
    info!(
        "relaying {}/* to {} on {addr}",
        config.prefix, config.upstream_host
    );
    let relay = web::Data::new(Relay::new(config).map_err(std::io::Error::other)?);

    // run server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(relay.clone())
            .default_service(web::to(dispatch))
    })
    .bind(addr)?
    .run()
    .await
}
