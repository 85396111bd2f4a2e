use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

use commands::probe::TargetArgs;

#[derive(Parser, Debug)]
#[command(name = "aurora", version, about = "Aurora interception engine CLI")]
struct Cli {
    /// Plugin configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the availability zone of a host and compare it with the preferred AZ.
    ResolveAz {
        #[arg(long)]
        host: String,

        /// Explicit `host:az,host:az` map; overrides the config file
        #[arg(long = "host-az-map")]
        host_az_map: Option<String>,

        #[arg(long = "preferred-az")]
        preferred_az: Option<String>,
    },

    /// Parse a `version()` line the way connection probes do.
    ParseVersion { line: String },

    /// Open one connection through the plugin and report what the probes found.
    Probe {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run one SQL statement through the full interception pipeline.
    Exec {
        #[command(flatten)]
        target: TargetArgs,

        /// Turn strict-writer mode on before running the statement
        #[arg(long = "strict-writer", default_value_t = false)]
        strict_writer: bool,

        sql: String,
    },
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let output = match cli.cmd {
        Command::ResolveAz {
            host,
            host_az_map,
            preferred_az,
        } => commands::az::run_resolve_az(config, &host, host_az_map, preferred_az),

        Command::ParseVersion { line } => commands::version::run_parse_version(&line),

        Command::Probe { target } => commands::probe::run_probe(config, &target)?,

        Command::Exec {
            target,
            strict_writer,
            sql,
        } => commands::probe::run_exec(config, &target, strict_writer, &sql)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
