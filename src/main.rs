use std::net::SocketAddr;

use classwatchd::{api, config::Config, AppState};
use dotenv::dotenv;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::load();
    let state = match AppState::new(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[error] failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("classwatchd listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
