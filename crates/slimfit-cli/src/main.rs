//! `slimfit`: command-line front end for the SlimFit engine.
//!
//! Reads `config.toml` (or the path given with `--config`), layered with
//! `SLIMFIT_*` environment variables, and opens the SQLite store named by
//! `store_path`. Every command loads the engine, applies one operation and
//! exits; nothing is broadcast because no team transport is attached.
//!
//! # Usage
//!
//! ```text
//! slimfit init --age 30 --height 165 --weight 70 --target 60 --weeks 10
//! slimfit check-in --weight 69.4 --reason "Planned rest day"
//! slimfit team join ab12cd
//! ```

mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use slimfit_core::{
  checkin::ReflectionReason,
  profile::{Gender, PlanEdit, ProfileDraft},
};
use slimfit_engine::{Engine, EngineConfig, Error as EngineError, SystemClock};
use slimfit_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "slimfit", author, version, about = "Weight-loss plan tracker with team accountability")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the profile and start a plan today.
  Init {
    #[arg(long, default_value = "")]
    name:   String,
    #[arg(long, default_value = "")]
    avatar: String,
    #[arg(long, value_enum, default_value_t = Sex::Female)]
    gender: Sex,
    #[arg(long)]
    age:    u32,
    /// Height in centimetres.
    #[arg(long)]
    height: f64,
    /// Current weight in kilograms.
    #[arg(long)]
    weight: f64,
    /// Goal weight in kilograms.
    #[arg(long)]
    target: f64,
    /// Plan length; defaults to `default_plan_weeks` from the config.
    #[arg(long)]
    weeks:  Option<u32>,
  },

  /// Record today's weight.
  CheckIn {
    #[arg(long)]
    weight: f64,
    /// Photo reference to attach.
    #[arg(long)]
    photo:  Option<String>,
    /// Reflection, required when the weight is over target or up on the
    /// last weigh-in.
    #[arg(long)]
    reason: Option<String>,
  },

  /// Show the profile, today's target and progress.
  Status,

  /// Show today's diet and workout suggestion.
  Plan,

  /// Restart the plan from today's weight with new goals.
  Reset {
    #[arg(long)]
    target: f64,
    #[arg(long)]
    weeks:  u32,
  },

  /// Manage team membership.
  Team {
    #[command(subcommand)]
    action: TeamAction,
  },

  /// Show the chat history, or add a message to it.
  Chat {
    #[arg(long, value_name = "TEXT")]
    send: Option<String>,
  },
}

#[derive(Subcommand)]
enum TeamAction {
  /// Start a new team and print its code.
  Create,
  /// Join a team by its six-character code.
  Join { code: String },
  /// Leave the current team.
  Leave,
}

#[derive(Clone, Copy, ValueEnum)]
enum Sex {
  Male,
  Female,
}

impl From<Sex> for Gender {
  fn from(sex: Sex) -> Self {
    match sex {
      Sex::Male => Gender::Male,
      Sex::Female => Gender::Female,
    }
  }
}

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(default)]
struct CliConfig {
  store_path: PathBuf,
  engine:     EngineConfig,
}

impl Default for CliConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("~/.local/share/slimfit/slimfit.db"),
      engine:     EngineConfig::default(),
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("SLIMFIT")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;
  let cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mut engine: Engine<SqliteStore> = Engine::load(store, cfg.engine, SystemClock).await;
  run(&mut engine, cli.command).await
}

async fn run(engine: &mut Engine<SqliteStore>, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Init {
      name,
      avatar,
      gender,
      age,
      height,
      weight,
      target,
      weeks,
    } => {
      let draft = ProfileDraft {
        name,
        avatar,
        gender: gender.into(),
        age,
        height_cm: height,
        current_weight: weight,
        target_weight: target,
        plan_weeks: weeks.unwrap_or(engine.config().default_plan_weeks),
      };
      let profile = engine.onboard(draft).await.context("onboarding failed")?;
      println!(
        "Welcome, {}! {} weeks on the {} route, {} coins to start.",
        profile.name, profile.plan_weeks, profile.route, profile.coins
      );
      render::status(engine)?;
    }

    Command::CheckIn {
      weight,
      photo,
      reason,
    } => match engine.check_in(weight, photo, reason.as_deref()).await {
      Ok(report) => render::check_in(&report),
      Err(EngineError::Core(slimfit_core::Error::ReflectionRequired)) => {
        let target = engine.today_target()?;
        eprintln!("{weight} kg is above today's target of {target} kg or up on your last weigh-in.");
        eprintln!("Rerun with --reason. Common reasons:");
        for reason in ReflectionReason::ALL {
          eprintln!("  - {}", reason.label());
        }
        bail!("a reflection is required for this weight");
      }
      Err(e) => return Err(e).context("check-in failed"),
    },

    Command::Status => render::status(engine)?,

    Command::Plan => render::plan(engine)?,

    Command::Reset { target, weeks } => {
      engine
        .reset_plan(PlanEdit {
          target_weight: target,
          plan_weeks:    weeks,
        })
        .await
        .context("plan reset failed")?;
      println!("Plan restarted.");
      render::status(engine)?;
    }

    Command::Team { action } => match action {
      TeamAction::Create => {
        let code = engine.create_team().await?;
        println!("Created team {code}. Share this code with your teammates.");
      }
      TeamAction::Join { code } => {
        let code = engine
          .join_team(&code)
          .await
          .context("could not join team")?;
        println!("Joined team {code}.");
      }
      TeamAction::Leave => {
        engine.leave_team().await?;
        println!("Left the team.");
      }
    },

    Command::Chat { send } => {
      if let Some(text) = send
        && engine.send_chat(&text).await?.is_none()
      {
        bail!("message is empty");
      }
      render::chat(engine.chat());
    }
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
