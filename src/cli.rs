use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_FETCH_CONCURRENCY;
use crate::formats::MediaKind;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Maximum concurrent metadata requests while listing.
    #[arg(long, global = true, default_value_t = DEFAULT_FETCH_CONCURRENCY)]
    pub fetch_concurrency: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every catalog title, most recently added first.
    List,
    Search(SearchArgs),
    Details(DetailsArgs),
    /// Resolve a playable URL for a movie or a series episode.
    Url(UrlArgs),
    /// Print the raw season/episode record of a series.
    Series(SeriesArgs),
    Season(SeasonArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search text (fewer than 3 characters yields no results).
    #[arg(long)]
    pub query: String,
}

#[derive(Debug, Args)]
pub struct DetailsArgs {
    #[arg(long)]
    pub id: u64,

    /// `movie` or `series` (`tv` is accepted).
    #[arg(long, value_parser = parse_kind)]
    pub kind: MediaKind,
}

#[derive(Debug, Args)]
pub struct UrlArgs {
    #[arg(long)]
    pub id: u64,

    /// Season number; resolves a series episode when given.
    #[arg(long, requires = "episode")]
    pub season: Option<u32>,

    /// Episode number, starting at 1.
    #[arg(long, requires = "season")]
    pub episode: Option<u32>,
}

#[derive(Debug, Args)]
pub struct SeriesArgs {
    #[arg(long)]
    pub id: u64,
}

#[derive(Debug, Args)]
pub struct SeasonArgs {
    #[arg(long)]
    pub id: u64,

    #[arg(long)]
    pub season: u32,
}

fn parse_kind(raw: &str) -> Result<MediaKind, String> {
    raw.parse().map_err(|err| format!("{err}"))
}
