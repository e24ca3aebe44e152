use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use serde::Serialize;

use binflix::catalog::Catalog;
use binflix::cli::{Cli, Command};
use binflix::config::CatalogConfig;
use binflix::formats::PlaybackTarget;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    binflix::logging::init("warn").context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let config = CatalogConfig::from_env()
        .context("load configuration")?
        .with_fetch_concurrency(cli.fetch_concurrency);
    tracing::debug!(?config, "loaded configuration");
    let catalog = Catalog::from_config(&config).context("build catalog")?;

    match cli.command {
        Command::List => {
            let items = catalog.list_all().await.context("list")?;
            print_json(&items)?;
        }
        Command::Search(args) => {
            let items = catalog.search(&args.query).await.context("search")?;
            print_json(&items)?;
        }
        Command::Details(args) => {
            let details = catalog
                .details(args.id, args.kind)
                .await
                .context("details")?;
            print_json(&details)?;
        }
        Command::Url(args) => {
            let target = match (args.season, args.episode) {
                (Some(season), Some(episode)) => PlaybackTarget::Episode { season, episode },
                _ => PlaybackTarget::Movie,
            };
            let url = catalog
                .playable_url(args.id, target)
                .await
                .context("url")?;
            println!("{url}");
        }
        Command::Series(args) => {
            let record = catalog.series_episodes(args.id).await.context("series")?;
            print_json(&record)?;
        }
        Command::Season(args) => {
            let listing = catalog
                .season_listing(args.id, args.season)
                .await
                .context("season")?;
            print_json(&listing)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{rendered}");
    Ok(())
}
