// stay-forge: generate a synthetic hotel stay dataset or query one

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use stay_forge::config::{AppConfig, BuiltinProfile};
use stay_forge::{
    count_occupied, occupancy_by_room_type, predict_prices, read_stays, write_stays,
    PredictionRequest, RoomType, StayGenerator,
};

#[derive(Parser)]
#[command(name = "stay-forge", about = "Synthetic hotel stay dataset generator", version)]
struct Cli {
    /// Log filter, e.g. `debug` or `stay_forge=trace`. Defaults to RUST_LOG, then `info`.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate stays and write them to a CSV file
    Generate(GenerateArgs),
    /// Count stays covering a date
    Occupancy(OccupancyArgs),
    /// Predict nightly prices for future dates from a stay file
    Predict(PredictArgs),
    /// Print a built-in profile as JSON, ready to edit and pass to --profile-file
    Profile(ProfileArgs),
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long, value_enum)]
    profile: Option<BuiltinProfile>,
    #[arg(long)]
    profile_file: Option<PathBuf>,
    #[arg(long)]
    records: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// First possible check-in day (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,
    /// Last possible check-in day (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
}

#[derive(Args)]
struct OccupancyArgs {
    #[arg(long, short)]
    input: PathBuf,
    #[arg(long, required_unless_present = "all")]
    room_type: Option<RoomType>,
    #[arg(long)]
    date: NaiveDate,
    /// Report every room type
    #[arg(long, conflicts_with = "room_type")]
    all: bool,
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long, short)]
    input: PathBuf,
    #[arg(long)]
    room_type: RoomType,
    #[arg(long)]
    persons: u8,
    /// First day to predict (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,
    /// Last day to predict, defaults to --from
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Occupancy the hotel expects, in percent
    #[arg(long)]
    occupancy_rate: f64,
    /// Rooms of this type in the hotel
    #[arg(long)]
    total_rooms: u32,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(value_enum, default_value_t = BuiltinProfile::HotelCalendar)]
    profile: BuiltinProfile,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load configuration")?;

    init_tracing(cli.log_level.as_deref(), config.log_json);

    match cli.command {
        Commands::Generate(args) => {
            apply_overrides(&mut config, &args);
            generate(&config, &args)
        }
        Commands::Occupancy(args) => occupancy(&args),
        Commands::Predict(args) => predict(&args),
        Commands::Profile(args) => {
            println!("{}", args.profile.profile()?.to_json()?);
            Ok(())
        }
    }
}

fn init_tracing(level: Option<&str>, json: bool) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn apply_overrides(config: &mut AppConfig, args: &GenerateArgs) {
    if let Some(profile) = args.profile {
        config.profile = profile;
        // an explicit built-in choice beats a profile file from the environment
        config.profile_file = None;
    }
    if let Some(path) = &args.profile_file {
        config.profile_file = Some(path.clone());
    }
    if let Some(records) = args.records {
        config.record_count = Some(records);
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
}

fn generate(config: &AppConfig, args: &GenerateArgs) -> Result<()> {
    let mut profile = config
        .resolve_profile()
        .context("failed to resolve generator profile")?;
    if let (Some(from), Some(to)) = (args.from, args.to) {
        profile = profile.with_window(from, to);
    }

    let seed = config.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "seeding random source");
    let mut rng = StdRng::seed_from_u64(seed);

    let generator = StayGenerator::new(profile).context("invalid generator profile")?;
    let generation = generator.generate(&mut rng)?;

    write_stays(&config.output, &generation.records)
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    let report = &generation.report;
    println!(
        "Generated {} of {} stays ({} regenerated, {} skipped) into '{}'",
        report.produced,
        report.requested,
        report.regenerated,
        report.skipped,
        config.output.display()
    );
    Ok(())
}

fn occupancy(args: &OccupancyArgs) -> Result<()> {
    let stays = read_stays(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    if args.all {
        for (room_type, count) in occupancy_by_room_type(&stays, args.date) {
            println!("{}: {}", room_type, count);
        }
        return Ok(());
    }

    if let Some(room_type) = args.room_type {
        let count = count_occupied(&stays, room_type, args.date);
        println!(
            "Number of occupied '{}' rooms on {}: {}",
            room_type, args.date, count
        );
    }
    Ok(())
}

fn predict(args: &PredictArgs) -> Result<()> {
    let stays = read_stays(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let request = PredictionRequest {
        room_type: args.room_type,
        persons: args.persons,
        expected_occupancy_rate: args.occupancy_rate,
        total_rooms: args.total_rooms,
    };
    let to = args.to.unwrap_or(args.from);

    tracing::info!(
        room_type = %request.room_type,
        persons = request.persons,
        from = %args.from,
        %to,
        total_rooms = request.total_rooms,
        "predicting prices"
    );
    let predictions =
        predict_prices(&stays, &request, args.from, to).context("price prediction failed")?;

    for prediction in predictions {
        println!("{}: {:.2}", prediction.date, prediction.price);
    }
    Ok(())
}
