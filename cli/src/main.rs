mod commands;
mod terminal;

use commands::{CommandLine, Commands, config, networks, node, reserve, scan, show};
use netmgmt_common::config::Config;
use netmgmt_core::inventory::Inventory;
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging()?;

    let cfg: Config = commands.options.config();
    let load = || Inventory::load(&cfg);

    match commands.command {
        Commands::Networks { scan } => networks::networks(&load()?, scan).await,
        Commands::Show { network } => show::show(&load()?, &network).await,
        Commands::Scan {
            network,
            managed,
            json,
        } => scan::scan(&load()?, &network, managed, json).await,
        Commands::Reserve {
            network,
            comment,
            owner,
            count,
            retries,
            json,
        } => {
            let request = reserve::Request {
                network: &network,
                comment: &comment,
                owner: &owner,
                count,
                retries,
            };
            reserve::reserve(&load()?, &request, json).await
        }
        Commands::Node { node } => node::node(&load()?, &node).await,
        Commands::Config => config::config(&cfg),
    }
}
