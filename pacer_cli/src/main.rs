mod player;

use clap::{Parser, Subcommand, ValueEnum};
use pacer_core::catalog::get_default_catalog;
use pacer_core::history::sessions_in_window;
use pacer_core::*;
use player::{play, PlayOptions, TerminalBell};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pacer")]
#[command(about = "Guided workout player with paced reps and audio cues", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Silence audio cues
    #[arg(long, global = true)]
    mute: bool,

    /// Length of one engine second in milliseconds
    #[arg(long, global = true)]
    tick_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in plans
    Plans,

    /// Print a plan's exercise blocks without running it
    Show {
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Run a workout session
    Run {
        #[command(flatten)]
        plan: PlanArgs,

        /// Drive the session automatically (start every set, advance every exercise)
        #[arg(long)]
        auto: bool,

        /// Save the session even when quitting early
        #[arg(long)]
        save_partial: bool,
    },

    /// Show recorded sessions, newest first
    History {
        #[arg(long, value_enum, default_value_t = WindowArg::All)]
        window: WindowArg,
    },
}

#[derive(clap::Args)]
struct PlanArgs {
    /// Built-in plan id (see `pacer plans`)
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    plan: Option<String>,

    /// Plan document (user-authored or generated JSON)
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    All,
    Today,
    Week,
    LastWeek,
}

fn main() {
    pacer_core::logging::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    if cli.mute {
        config.audio.muted = true;
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.engine.tick_millis = tick_ms;
    }
    config.validate()?;

    match cli.command {
        Commands::Plans => cmd_plans(),
        Commands::Show { plan } => cmd_show(&plan, &config),
        Commands::Run {
            plan,
            auto,
            save_partial,
        } => cmd_run(&plan, auto, save_partial, &config),
        Commands::History { window } => cmd_history(window, &config),
    }
}

fn load_sequence(args: &PlanArgs, config: &Config) -> Result<WorkoutBlockSequence> {
    let source = match (&args.plan, &args.file) {
        (_, Some(path)) => PlanSource::load(path)?,
        (Some(id), None) => {
            let catalog = get_default_catalog();
            catalog.ensure_valid()?;
            PlanSource::User(catalog.find(id)?.clone())
        }
        (None, None) => return Err(Error::Other("Give --plan or --file".into())),
    };
    build_sequence(&source, &config.block_policy())
}

fn cmd_plans() -> Result<()> {
    let catalog = get_default_catalog();
    for plan in &catalog.plans {
        println!(
            "{:<8} {:<24} {:>3} min  {:>4} kcal  {}",
            plan.id,
            plan.name,
            plan.duration,
            plan.calories_burned,
            plan.difficulty.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn cmd_show(args: &PlanArgs, config: &Config) -> Result<()> {
    let sequence = load_sequence(args, config)?;
    print_sequence(&sequence);
    Ok(())
}

fn cmd_run(args: &PlanArgs, auto: bool, save_partial: bool, config: &Config) -> Result<()> {
    let sequence = load_sequence(args, config)?;
    print_sequence(&sequence);

    let store = JsonlSessionStore::in_data_dir(&config.data.data_dir);
    let recorder = SessionRecorder::new(Arc::new(store));
    let cues = CueEmitter::new(Box::new(TerminalBell), config.audio.muted);
    let options = PlayOptions {
        auto,
        save_partial,
        announce: config.audio.announce,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(play(
        sequence,
        options,
        cues,
        recorder,
        config.tick_config(),
    ))
}

fn cmd_history(window: WindowArg, config: &Config) -> Result<()> {
    let sessions = load_history(&config.sessions_path())?;
    let now = chrono::Local::now();

    let shown: Vec<&SessionRecord> = match window {
        WindowArg::All => sessions.iter().collect(),
        WindowArg::Today => sessions_in_window(&sessions, TimeWindow::Today, &now).collect(),
        WindowArg::Week => sessions_in_window(&sessions, TimeWindow::ThisWeek, &now).collect(),
        WindowArg::LastWeek => sessions_in_window(&sessions, TimeWindow::LastWeek, &now).collect(),
    };

    if shown.is_empty() {
        println!("No sessions recorded.");
        return Ok(());
    }

    for session in shown {
        println!(
            "{}  {:<24} {:>3} min  {:>4} kcal  {} exercises",
            session.date.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
            session.plan_name,
            session.duration_minutes,
            session.calories_burned,
            session.completed_exercises.len()
        );
    }
    Ok(())
}

fn print_sequence(sequence: &WorkoutBlockSequence) {
    let plan = sequence.plan();
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", plan.plan_name.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  ~{} min · {} kcal · {} exercises",
        plan.estimated_minutes,
        plan.estimated_calories,
        sequence.len()
    );

    for kind in [BlockKind::WarmUp, BlockKind::Training, BlockKind::Stretching] {
        let mut exercises = sequence.block(kind).peekable();
        if exercises.peek().is_none() {
            continue;
        }
        println!("\n  {}", kind.label());
        for exercise in exercises {
            println!(
                "    → {} · {} × {} · rest {}s",
                exercise.name, exercise.sets_total, exercise.reps_label, exercise.rest_after_seconds
            );
        }
    }

    if !sequence.repairs().is_empty() {
        println!("\n  Repaired:");
        for repair in sequence.repairs() {
            println!("    ⚠ {}: {:?}", repair.name, repair.kind);
        }
    }
    println!();
}
