/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{path::PathBuf, process::exit};

use structopt_toml::{serde::Deserialize, structopt::StructOpt, StructOptToml};
use tracing::info;

use fhedex::{
    cli_desc,
    util::{
        cli::init_logger,
        path::{expand_path, get_config_path, spawn_config},
    },
    Error, Result,
};

use fdx::{config::load_network_config, registry::TaskRegistry, Fdx};

const CONFIG_FILE: &str = "fdx_config.toml";
const CONFIG_FILE_CONTENTS: &str = include_str!("../fdx_config.toml");

#[derive(Clone, Debug, Deserialize, StructOpt, StructOptToml)]
#[serde(default)]
#[structopt(name = "fdx", about = cli_desc!())]
struct Args {
    #[structopt(short, long)]
    /// Configuration file to use
    config: Option<String>,

    #[structopt(short, long, default_value = "localfhenix")]
    /// Network from the configuration file to operate on
    network: String,

    #[structopt(short, long, default_value = "0")]
    /// Index of the signer to use
    signer: usize,

    #[structopt(short, long)]
    /// Set log file to ouput into
    log: Option<String>,

    #[structopt(short, parse(from_occurrences))]
    /// Increase verbosity (-vvv supported)
    verbose: u8,

    /// `tasks` to list the available tasks, or
    /// `run <task> [name=value ...]` to execute one
    command: Vec<String>,
}

fn print_tasks(registry: &TaskRegistry) {
    println!("Available tasks:");
    for task in registry.iter() {
        println!("  {:<26}{}", task.name(), task.description());
        for param in task.params() {
            let default = match param.default {
                Some(d) => format!(" (default: {d})"),
                None => " (required)".to_string(),
            };
            println!("      {}={}{default}", param.name, param.description);
        }
    }
}

async fn realmain(args: Args, config_path: PathBuf) -> Result<()> {
    let registry = TaskRegistry::builtin()?;

    let (task, params) = match args.command.split_first() {
        Some((cmd, [])) if cmd == "tasks" => {
            print_tasks(&registry);
            return Ok(())
        }
        Some((cmd, rest)) if cmd == "run" => match rest.split_first() {
            Some((task, params)) => (task.clone(), params.to_vec()),
            None => return Err(Error::Custom("Missing task name, see `fdx tasks`".to_string())),
        },
        _ => return Err(Error::Custom("Expected `tasks` or `run <task> [name=value ...]`".into())),
    };

    let network = load_network_config(&config_path, &args.network)?;
    info!(target: "fdx", "Using network {} at {}", args.network, network.endpoint);

    let fdx = Fdx::new(&args.network, network);
    let output = fdx.dispatch(&registry, &task, &params, args.signer).await?;
    print!("{output}");

    Ok(())
}

fn run() -> Result<()> {
    let args = Args::from_args_with_toml("").map_err(|e| Error::Custom(e.to_string()))?;
    let config_path = get_config_path(args.config.clone(), CONFIG_FILE)?;
    spawn_config(&config_path, CONFIG_FILE_CONTENTS.as_bytes())?;

    let contents = std::fs::read_to_string(&config_path)?;
    let args = Args::from_args_with_toml(&contents).map_err(|e| Error::Custom(e.to_string()))?;

    let log_path = match &args.log {
        Some(l) => Some(expand_path(l)?),
        None => None,
    };
    let _guard = init_logger(args.verbose, log_path.as_deref())?;

    smol::block_on(realmain(args, config_path))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        exit(1);
    }
}
