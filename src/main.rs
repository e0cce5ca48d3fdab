use sqlx::postgres::PgPoolOptions;
use warp::Filter;

use foodgram_sdk::{handle_rejection, routes::routes, Config};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::load();

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await
        .expect("Could not connect to the database");

    log::info!("listening on 0.0.0.0:{}", config.bind_port);
    warp::serve(routes(pool, config.page_size_limit).recover(handle_rejection))
        .run(([0, 0, 0, 0], config.bind_port))
        .await;
}
