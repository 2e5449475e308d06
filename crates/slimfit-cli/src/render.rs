//! Plain-text output for each command.

use anyhow::Context as _;
use chrono::{DateTime, Local};
use slimfit_core::{
  chat::{ChatLog, MessageKind},
  plan::{BmiCategory, Difficulty, bmi},
  progress::PointKind,
  store::KeyValueStore,
};
use slimfit_engine::{CheckInReport, Engine};

const NOT_ONBOARDED: &str = "no profile yet; run `slimfit init` first";

pub fn status<S: KeyValueStore>(engine: &Engine<S>) -> anyhow::Result<()> {
  let profile = engine.profile().context(NOT_ONBOARDED)?;
  let team = engine.team().map_or_else(|| "none".to_string(), ToString::to_string);
  let index = bmi(profile.current_weight, profile.height);

  println!("{} {}  |  {} coins  |  team {team}", profile.avatar, profile.name, profile.coins);
  println!(
    "Plan      {} kg -> {} kg over {} weeks ({}), started {}",
    profile.start_weight, profile.target_weight, profile.plan_weeks, profile.route, profile.start_date
  );
  println!(
    "Progress  {:.0}% of the weight, {:.0}% of the time, {} kg lost",
    engine.weight_progress()?,
    engine.time_progress()?,
    profile.weight_lost()
  );
  println!("BMI       {index} ({:?})", BmiCategory::of(index));
  println!("Today     target {} kg", engine.today_target()?);

  println!();
  for point in engine.chart_series()? {
    let weight = point
      .weight
      .map_or_else(|| "-".to_string(), |w| format!("{w:.1}"));
    let label = match point.kind {
      PointKind::Start => "start",
      PointKind::Log => "",
      PointKind::Today => "today",
      PointKind::End => "goal",
    };
    println!("  {}  {weight:>6}  {:>6.2}  {label}", point.date, point.target);
  }
  Ok(())
}

pub fn plan<S: KeyValueStore>(engine: &Engine<S>) -> anyhow::Result<()> {
  let profile = engine.profile().context(NOT_ONBOARDED)?;
  let difficulty = Difficulty::assess(profile.start_weight, profile.target_weight, profile.plan_weeks);
  let today = engine.daily_plan()?;

  println!("{:?} plan on the {} route", difficulty, profile.route);
  println!("Day {}: {}", today.day, today.title);
  println!("  Food     {}", today.food);
  println!("  Workout  {}", today.workout);
  Ok(())
}

pub fn check_in(report: &CheckInReport) {
  let log = &report.log;
  if log.is_target_met {
    println!("Checked in at {} kg. On target, well done!", log.weight);
  } else {
    println!("Checked in at {} kg. Missed today's target.", log.weight);
  }
  if let Some(penalty) = report.penalty {
    println!(
      "{} coins handed out to the team; {} left.",
      penalty.amount, penalty.balance
    );
  }
}

pub fn chat(log: &ChatLog) {
  if log.is_empty() {
    println!("No messages yet.");
    return;
  }
  for message in log.iter() {
    let at = DateTime::from_timestamp_millis(message.timestamp)
      .map(|t| t.with_timezone(&Local).format("%m-%d %H:%M").to_string())
      .unwrap_or_default();
    match message.kind {
      MessageKind::System => println!("[{at}] * {}", message.content),
      MessageKind::Text => println!("[{at}] {}: {}", message.user_name, message.content),
    }
  }
}
