//! Operator tools for the scheduling engine.

mod action;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    petshop_scheduling::logger::setup_simple_logger()?;

    let args = action::AppArgs::parse();

    args.run().await
}
