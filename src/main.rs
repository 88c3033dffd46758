use std::sync::Arc;

use clap::Parser;
use log::{error, info};

mod appointment;
mod args;
mod backend;
mod clinic;
mod files;
mod pdf;
mod routes;
mod session;
mod user;
mod views;

use args::Args;
use clinic::Clinic;
use files::FileAreas;

#[tokio::main]
async fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let args = Args::parse();

    let addr = match args.addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("invalid address: {e}");
            std::process::exit(2);
        }
    };

    let files = FileAreas::new(args.data_dir());
    if let Err(e) = files.init().await {
        error!("couldn't prepare data directories in {:?}: {e}", args.data_dir());
        std::process::exit(1);
    }

    let clinic = Arc::new(Clinic::new(
        files,
        args.export_dir().clone(),
        args.secure(),
    ));

    info!("listening on {addr}");
    warp::serve(routes::routes(clinic)).run(addr).await;
}
