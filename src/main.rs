use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ttmprep::PrepConfig;
use ttmprep::io::{TravelTimeTable, read_places, snapped_places_geojson};
use ttmprep_core::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "ttmprep")]
#[command(about = "Prepares network extracts and snapped origins/destinations for travel time matrices")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute (or reuse) the date-accurate network extract and print its path
    Extract {
        #[arg(long, short)]
        config: PathBuf,
    },
    /// Snap origins/destinations to the network and record access times
    Prepare {
        #[arg(long, short)]
        config: PathBuf,
        /// GeoJSON output with the snapped points
        #[arg(long, default_value = "snapped.geojson")]
        snapped: PathBuf,
        /// CSV output with walking times per place
        #[arg(long, default_value = "access_times.csv")]
        access_times: PathBuf,
    },
    /// Add access times to raw travel times and zero identical pairs
    Correct {
        #[arg(long)]
        access_times: PathBuf,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Extract { config } => {
            let config = PrepConfig::from_file(&config)?;
            let places = read_places(&config.origins_destinations)?;
            let extent = config.computer_builder(places)?.resolve_extent()?;
            let extract = config.extract_cache()?.network_extract(
                &config.osm_history_file,
                config.date,
                &extent,
            )?;
            println!("{}", extract.display());
        }
        Command::Prepare {
            config,
            snapped,
            access_times,
        } => {
            let config = PrepConfig::from_file(&config)?;
            let places = read_places(&config.origins_destinations)?;
            info!("Read {} origins/destinations", places.len());

            let cache = config.extract_cache()?;
            let computer = config
                .computer_builder(places)?
                .build(&cache, &OsmStreetLoader)
                .context("Failed to prepare travel time matrix inputs")?;

            std::fs::write(&snapped, snapped_places_geojson(&computer)?.to_string())
                .with_context(|| format!("Failed to write {}", snapped.display()))?;
            computer
                .access_times()
                .write_csv(BufWriter::new(File::create(&access_times)?))?;

            info!(
                extract = %computer.osm_extract_file().display(),
                places = computer.places().len(),
                "Prepared inputs"
            );
        }
        Command::Correct {
            access_times,
            input,
            output,
        } => {
            let access_times = AccessTimes::read_csv(BufReader::new(
                File::open(&access_times)
                    .with_context(|| format!("Failed to open {}", access_times.display()))?,
            ))?;
            let mut table = TravelTimeTable::read_csv(BufReader::new(
                File::open(&input).with_context(|| format!("Failed to open {}", input.display()))?,
            ))?;

            table.records = correct_travel_times(std::mem::take(&mut table.records), &access_times);
            table.write_csv(BufWriter::new(File::create(&output)?))?;
            info!(records = table.records.len(), "Wrote {}", output.display());
        }
    }

    Ok(())
}
