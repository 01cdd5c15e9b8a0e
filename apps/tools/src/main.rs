use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{ItemsClient, ResetTarget};
use serde::Serialize;
use shared::domain::ItemId;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "viewctl", about = "Drive a running item view server")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Health,
    Items {
        #[arg(long, default_value_t = 0)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value = "")]
        search: String,
    },
    InitialState,
    SaveOrder {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<i64>,
    },
    Move {
        dragged_id: i64,
        target_id: i64,
        #[arg(long, default_value = "")]
        search: String,
    },
    Reset {
        #[arg(long, conflicts_with = "all")]
        search: Option<String>,
        #[arg(long)]
        all: bool,
    },
    Select {
        ids: Vec<i64>,
    },
    SetSearch {
        term: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let client = ItemsClient::new(cli.server_url);

    match cli.command {
        Command::Health => {
            let status = client.health().await?;
            if status.trim() != "ok" {
                bail!("unexpected health response: {status}");
            }
            println!("{status}");
        }
        Command::Items {
            page,
            limit,
            search,
        } => print_json(&client.fetch_page(page, limit, &search).await?)?,
        Command::InitialState => print_json(&client.initial_state().await?)?,
        Command::SaveOrder { search, ids } => {
            let message = client.save_order(&search, to_ids(ids)).await?;
            println!("{message}");
        }
        Command::Move {
            dragged_id,
            target_id,
            search,
        } => {
            let message = client
                .move_item(&search, ItemId(dragged_id), ItemId(target_id))
                .await?;
            println!("{message}");
        }
        Command::Reset { search, all } => {
            let target = match (all, search) {
                (true, _) => ResetTarget::All,
                (false, Some(term)) => ResetTarget::Term(term),
                (false, None) => ResetTarget::Global,
            };
            println!("{}", client.reset_order(target).await?);
        }
        Command::Select { ids } => {
            println!("{}", client.save_selection(to_ids(ids)).await?);
        }
        Command::SetSearch { term } => {
            println!("{}", client.set_active_search_term(&term).await?);
        }
    }

    Ok(())
}

fn to_ids(raw: Vec<i64>) -> Vec<ItemId> {
    raw.into_iter().map(ItemId).collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
