use std::{path::PathBuf, sync::Arc};

use clap::{Args as ClapArgs, Parser, Subcommand};
use log::error;
use tunecraft::{
    BuildResolver, BuildStorage, EngineConfig, FileBasedStorage, TunecraftError, UpgradeCatalog,
    vehicle::find_vehicle,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Where to find the vehicle and the catalog to resolve against.
#[derive(ClapArgs, Debug)]
struct VehicleArgs {
    /// Vehicle profile file (.json or .jsonl)
    #[arg(short, long)]
    vehicle: PathBuf,

    /// Vehicle id, required when the file holds more than one vehicle
    #[arg(long)]
    id: Option<String>,

    /// Catalog document to use instead of the built-in catalog
    #[arg(short, long)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a selection of upgrade keys and print the build as JSON
    Resolve {
        #[command(flatten)]
        vehicle: VehicleArgs,

        #[arg(short, long, value_delimiter = ',')]
        select: Vec<String>,
    },
    /// List the catalog items that fit a vehicle
    Compatible {
        #[command(flatten)]
        vehicle: VehicleArgs,
    },
    /// Resolve a selection and store it under a name
    Save {
        #[command(flatten)]
        vehicle: VehicleArgs,

        #[arg(short, long, value_delimiter = ',')]
        select: Vec<String>,

        #[arg(short, long)]
        name: String,

        /// Build storage directory, defaults to the user data directory
        #[arg(long)]
        storage: Option<PathBuf>,
    },
    /// List saved builds
    Builds {
        #[arg(long)]
        vehicle_id: Option<String>,

        #[arg(long)]
        storage: Option<PathBuf>,
    },
    /// Delete a saved build
    Delete {
        #[arg(long)]
        vehicle_id: String,

        #[arg(short, long)]
        name: String,

        #[arg(long)]
        storage: Option<PathBuf>,
    },
}

fn resolver(catalog: Option<&PathBuf>) -> Result<BuildResolver, TunecraftError> {
    let catalog = match catalog {
        Some(path) => UpgradeCatalog::from_file(path)?,
        None => UpgradeCatalog::builtin(),
    };
    let config = EngineConfig::from_local_file()?.unwrap_or_default();
    BuildResolver::new(Arc::new(catalog), config)
}

fn storage(path: Option<&PathBuf>) -> Result<FileBasedStorage, TunecraftError> {
    match path {
        Some(path) => FileBasedStorage::new(path.clone()),
        None => FileBasedStorage::new_default(),
    }
}

fn resolve(args: &VehicleArgs, select: &[String]) -> Result<(), TunecraftError> {
    let vehicle = find_vehicle(&args.vehicle, args.id.as_deref())?;
    let build = resolver(args.catalog.as_ref())?.resolve(&vehicle, select)?;
    for warning in &build.warnings {
        eprintln!("warning: {warning}");
    }
    let output = serde_json::to_string_pretty(&build)
        .map_err(|e| TunecraftError::BuildSerializeError { source: e })?;
    println!("{output}");
    Ok(())
}

fn compatible(args: &VehicleArgs) -> Result<(), TunecraftError> {
    let vehicle = find_vehicle(&args.vehicle, args.id.as_deref())?;
    let resolver = resolver(args.catalog.as_ref())?;
    let items = resolver.compatible_items(&vehicle)?;

    println!("{} ({}, {})", vehicle.name, vehicle.layout, vehicle.architecture);
    for (category, group) in resolver.catalog().grouped_by_category(items) {
        println!("{category}");
        for item in group {
            let exclusive = item
                .conflict_group
                .as_deref()
                .map(|g| format!(" [{g}]"))
                .unwrap_or_default();
            println!(
                "  {:<28} {:?} ${}-{}{}",
                item.key, item.tier, item.base_cost.low, item.base_cost.high, exclusive
            );
        }
    }
    Ok(())
}

fn save(
    args: &VehicleArgs,
    select: &[String],
    name: &str,
    storage_path: Option<&PathBuf>,
) -> Result<(), TunecraftError> {
    let vehicle = find_vehicle(&args.vehicle, args.id.as_deref())?;
    let build = resolver(args.catalog.as_ref())?.resolve(&vehicle, select)?;
    for warning in &build.warnings {
        eprintln!("warning: {warning}");
    }
    let saved = build.to_saved_build(name);
    storage(storage_path)?.save_build(&saved)?;
    println!(
        "Saved '{}' for {}: +{:.0} hp, ${}-{} ({})",
        saved.name, saved.vehicle_id, saved.hp_gain, saved.cost.low, saved.cost.high, saved.confidence
    );
    Ok(())
}

fn builds(vehicle_id: Option<&str>, storage_path: Option<&PathBuf>) -> Result<(), TunecraftError> {
    for build in storage(storage_path)?.list_builds(vehicle_id)? {
        println!(
            "{:<24} {:<24} {} items, +{:.0} hp, ${}-{}",
            build.vehicle_id,
            build.name,
            build.selection.len(),
            build.hp_gain,
            build.cost.low,
            build.cost.high
        );
    }
    Ok(())
}

fn run(command: &Commands) -> Result<(), TunecraftError> {
    match command {
        Commands::Resolve { vehicle, select } => resolve(vehicle, select),
        Commands::Compatible { vehicle } => compatible(vehicle),
        Commands::Save {
            vehicle,
            select,
            name,
            storage,
        } => save(vehicle, select, name, storage.as_ref()),
        Commands::Builds {
            vehicle_id,
            storage,
        } => builds(vehicle_id.as_deref(), storage.as_ref()),
        Commands::Delete {
            vehicle_id,
            name,
            storage: storage_path,
        } => storage(storage_path.as_ref())?.delete_build(vehicle_id, name),
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = run(&cli.command) {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
