use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use ets2_mapper::config::DEFAULT_LUT_PREFIX;
use ets2_mapper::sii::SiiReader;
use ets2_mapper::{DecodeOptions, Mapper, MapperConfig, NodeSlotLayout, Prefab};

#[derive(Parser)]
#[command(name = "ets2-dump")]
#[command(about = "Inspect ETS2 prefabs, unit files and lookup tables")]
struct Cli {
    /// Read node output slots from their own offset instead of sharing the input slots
    #[arg(long, global = true)]
    distinct_node_slots: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a whole installation and print what was resolved
    Summary {
        /// Extracted base.scs (default ~/ets2/data/base_scs)
        #[arg(long)]
        base_dir: Option<PathBuf>,
        /// Extracted def.scs (default ~/ets2/data/def_scs)
        #[arg(long)]
        def_dir: Option<PathBuf>,
        /// Lookup table directory (default ~/ets2/ets2-map/LUT)
        #[arg(long)]
        lut_dir: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_LUT_PREFIX)]
        lut_prefix: String,
        /// Include every road look in the output
        #[arg(long)]
        road_looks: bool,
    },
    /// Decode one .ppd file
    Prefab { path: PathBuf },
    /// Parse one .sii file
    Sii { path: PathBuf },
}

type CliResult = Result<serde_json::Value, Box<dyn std::error::Error>>;

fn node_slots(distinct: bool) -> NodeSlotLayout {
    if distinct {
        NodeSlotLayout::Distinct
    } else {
        NodeSlotLayout::Shared
    }
}

fn summary(
    base_dir: Option<PathBuf>,
    def_dir: Option<PathBuf>,
    lut_dir: Option<PathBuf>,
    lut_prefix: String,
    road_looks: bool,
    layout: NodeSlotLayout,
) -> CliResult {
    let mut config = match (base_dir, def_dir, lut_dir) {
        (Some(base), Some(def), Some(lut)) => MapperConfig::new(base, def, lut),
        (base, def, lut) => {
            let mut config = MapperConfig::from_home()
                .ok_or("home directory unknown, pass --base-dir, --def-dir and --lut-dir")?;
            if let Some(base) = base {
                config.base_dir = base;
            }
            if let Some(def) = def {
                config.def_dir = def;
            }
            if let Some(lut) = lut {
                config.lut_dir = lut;
            }
            config
        }
    };
    config = config.with_lut_prefix(lut_prefix).with_node_slots(layout);

    let mapper = Mapper::load(config)?;
    let prefabs = mapper.prefabs();

    let mut out = json!({
        "prefabs": prefabs.len(),
        "resolved_prefabs": prefabs.iter().filter(|p| p.is_resolved()).count(),
        "curves": prefabs.iter().map(|p| p.curves().len()).sum::<usize>(),
        "nodes": prefabs.iter().map(|p| p.nodes().len()).sum::<usize>(),
        "sector_files": mapper.sector_files().len(),
        "companies": mapper.companies().len(),
        "linked_companies": mapper.companies().iter().filter(|c| c.prefab().is_some()).count(),
        "cities": mapper.city_count(),
        "road_looks": mapper.road_looks().count(),
    });
    if road_looks {
        out["road_look_list"] = serde_json::to_value(mapper.road_looks().collect::<Vec<_>>())?;
    }
    Ok(out)
}

fn run(cli: Cli) -> CliResult {
    let layout = node_slots(cli.distinct_node_slots);
    match cli.command {
        Commands::Summary { base_dir, def_dir, lut_dir, lut_prefix, road_looks } => {
            summary(base_dir, def_dir, lut_dir, lut_prefix, road_looks, layout)
        }
        Commands::Prefab { path } => {
            let prefab = Prefab::open(&path, DecodeOptions { node_slots: layout })?;
            Ok(serde_json::to_value(&prefab)?)
        }
        Commands::Sii { path } => {
            let file = File::open(&path)?;
            let blocks = SiiReader::from_reader(BufReader::new(file)).collect::<Result<Vec<_>, _>>()?;
            Ok(serde_json::to_value(&blocks)?)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
