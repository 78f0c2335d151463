use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use vs_core::{
    ATTENDED, Bindings, ExtraTests, GridPainter, MatcherKind, Query, Value, VisionConfig,
    VisionModule, build_level,
};
use vs_store::{SceneLibrary, read_scene_file};

#[derive(Parser)]
#[command(name = "vs", about = "Visual-location search over stored scenes")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a scene file (.json or .toml)
    Import {
        /// Scene file path
        path: PathBuf,

        /// Store under this name instead of the document's
        #[arg(long)]
        name: Option<String>,
    },

    /// List stored scenes
    Scenes,

    /// Paint a scene as a character grid
    Show {
        /// Scene name
        scene: String,
    },

    /// Search a scene for a visual location
    Find {
        /// Scene name
        scene: String,

        /// Query as `slot value` pairs separated by `;` or newlines
        #[arg(long)]
        query: Option<String>,

        /// Variable binding, `name=value` (repeatable)
        #[arg(long = "bind", value_name = "NAME=VALUE")]
        bindings: Vec<String>,

        /// Restrict to attended (true) or unattended (false) stimuli
        #[arg(long)]
        attended: Option<bool>,

        /// Matcher strategy; defaults to the configured one
        #[arg(long)]
        matcher: Option<MatcherKind>,

        /// Move attention to the match and store the updated FINST list
        #[arg(long)]
        attend: bool,
    },

    /// Show recent searches against a scene
    Log {
        /// Scene name
        scene: String,
    },

    /// Place agents on a random grid and paint it
    Level {
        #[arg(long)]
        height: usize,

        #[arg(long)]
        width: usize,

        /// Agent labels, comma separated
        #[arg(long, value_delimiter = ',')]
        agents: Vec<String>,

        /// Seed for a reproducible layout
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn open_library() -> Result<SceneLibrary> {
    SceneLibrary::open(None).context("failed to open scene library")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Import { path, name } => cmd_import(path, name.as_deref()),
        Commands::Scenes => cmd_scenes(),
        Commands::Show { scene } => cmd_show(scene),
        Commands::Find {
            scene,
            query,
            bindings,
            attended,
            matcher,
            attend,
        } => cmd_find(
            scene,
            query.as_deref(),
            bindings,
            *attended,
            *matcher,
            *attend,
        ),
        Commands::Log { scene } => cmd_log(scene),
        Commands::Level {
            height,
            width,
            agents,
            seed,
        } => cmd_level(*height, *width, agents, *seed),
    }
}

fn cmd_import(path: &Path, name: Option<&str>) -> Result<()> {
    let library = open_library()?;
    let scene = read_scene_file(path, name, library.config().vision.finst)
        .with_context(|| format!("failed to read {}", path.display()))?;
    library
        .store()
        .save_scene(&scene)
        .with_context(|| format!("failed to save scene '{}'", scene.name))?;

    println!(
        "imported '{}': {} stimuli, {} attended",
        scene.name,
        scene.stimuli.len(),
        scene.history.len()
    );
    Ok(())
}

fn cmd_scenes() -> Result<()> {
    let library = open_library()?;
    let scenes = library
        .store()
        .list_scenes()
        .context("failed to list scenes")?;

    if scenes.is_empty() {
        println!("(no scenes)");
        return Ok(());
    }
    for s in scenes {
        println!(
            "{:<20} stimuli={:<4} attended={}/{}  updated={}",
            s.name, s.stimuli, s.attended, s.finst, s.updated_at
        );
    }
    Ok(())
}

fn cmd_show(name: &str) -> Result<()> {
    let library = open_library()?;
    let scene = library
        .store()
        .load_scene(name)
        .with_context(|| format!("failed to load scene '{name}'"))?;

    let grid = scene
        .to_grid()
        .with_context(|| format!("cannot draw scene '{name}'"))?;
    let frame = GridPainter::default().paint(&grid);
    print!("{}", frame.to_text());

    let attended: Vec<String> = scene
        .stimuli
        .iter()
        .filter(|s| scene.history.contains(&s.attributes))
        .map(|s| s.id.to_string())
        .collect();
    if !attended.is_empty() {
        println!("attended: {}", attended.join(", "));
    }
    Ok(())
}

fn parse_binding(raw: &str) -> Result<(String, Value)> {
    let Some((name, value)) = raw.split_once('=') else {
        bail!("binding '{raw}' must look like name=value");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("binding '{raw}' has an empty name");
    }
    Ok((name.to_string(), Value::from_token(value.trim())))
}

fn cmd_find(
    name: &str,
    query: Option<&str>,
    raw_bindings: &[String],
    attended: Option<bool>,
    matcher: Option<MatcherKind>,
    attend: bool,
) -> Result<()> {
    let library = open_library()?;
    let scene = library
        .store()
        .load_scene(name)
        .with_context(|| format!("failed to load scene '{name}'"))?;

    let query = match query {
        Some(text) => Query::parse(text).context("failed to parse query")?,
        None => Query::new(),
    };
    let bindings = raw_bindings
        .iter()
        .map(|raw| parse_binding(raw))
        .collect::<Result<Bindings>>()?;
    let mut extra_tests = ExtraTests::new();
    if let Some(flag) = attended {
        extra_tests.insert(ATTENDED.to_string(), Value::Bool(flag));
    }

    let config = VisionConfig {
        finst: scene.history.capacity(),
        matcher: matcher.unwrap_or(library.config().vision.matcher),
    };
    let mut vision = VisionModule::new(&config).with_history(scene.history.clone());
    let found = vision
        .find(&query, &bindings, &extra_tests, &scene.stimuli)
        .context("search failed")?;

    library
        .store()
        .record_search(name, &query, vision.matcher_name(), found.as_ref())
        .context("failed to record search")?;

    let Some(found) = found else {
        println!("(no match)");
        return Ok(());
    };

    let json =
        serde_json::to_string_pretty(&found.location).context("failed to serialize location")?;
    println!("{json}");

    if attend {
        vision.attend(found.stimulus);
        library
            .store()
            .save_history(name, vision.history())
            .context("failed to save attention history")?;
        println!("attended {}", found.stimulus_id);
    }
    Ok(())
}

fn cmd_log(name: &str) -> Result<()> {
    let library = open_library()?;
    let limit = library.config().store.log_limit;
    let entries = library
        .store()
        .recent_searches(name, limit)
        .with_context(|| format!("failed to read search log for '{name}'"))?;

    if entries.is_empty() {
        println!("(no searches)");
        return Ok(());
    }
    for entry in entries {
        let outcome = match (&entry.stimulus_id, &entry.location) {
            (Some(id), Some(loc)) => format!("{id} at ({}, {})", loc.screen_x, loc.screen_y),
            (Some(id), None) => id.clone(),
            _ => "(no match)".to_string(),
        };
        println!(
            "{}  [{}]  {}  -> {}",
            entry.created_at, entry.matcher, entry.query, outcome
        );
    }
    Ok(())
}

fn cmd_level(height: usize, width: usize, agents: &[String], seed: Option<u64>) -> Result<()> {
    let agents: Vec<String> = agents
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let grid = build_level(height, width, agents, &mut rng).context("failed to build level")?;
    let frame = GridPainter::default().paint(&grid);
    print!("{}", frame.to_text());
    Ok(())
}
