mod aggregate;
mod api;
mod cli;
mod date_range;
mod harvest;
mod prelude;
mod quantity;
mod settings;
mod sink;
mod tables;

use std::sync::Arc;

use chrono::Local;
use clap::{Parser, crate_version};
use tracing_subscriber::EnvFilter;

use crate::{
    api::fronius,
    cli::Args,
    harvest::harvest,
    prelude::*,
    settings::{Config, Settings},
    sink::render,
    tables::build_production_table,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let settings = Settings::load(args.settings.as_deref())?;
    let config = Config::resolve(args, settings, Local::now().date_naive())?;
    info!(
        range = %config.range,
        inverter = %config.inverter,
        max_days = config.max_days,
        timeout = ?config.timeout,
        "configured",
    );

    let client = Arc::new(fronius::Client::new(&config.inverter, config.timeout)?);
    let harvest = harvest(client, config.range.split(config.max_days)).await;
    println!("{}", build_production_table(&harvest.table, config.range));
    for date in harvest.table.missing_days(config.range) {
        warn!(%date, "no data");
    }

    if harvest.table.is_empty() {
        warn!(n_failed = harvest.n_failed, "nothing to deliver");
    } else {
        let text = render(&harvest.table, &config.date_format);
        config.sink().deliver(config.range.start, &text).context("failed to deliver the table")?;
    }

    info!(
        n_succeeded = harvest.n_succeeded,
        n_failed = harvest.n_failed,
        n_days = harvest.table.len(),
        total = %harvest.table.total(),
        "done!",
    );
    Ok(())
}
