//! Plan advice: route recommendation, the rotating daily suggestion, and BMI.

use serde::Serialize;

use crate::{profile::Route, trajectory::round_to};

// ─── Difficulty ──────────────────────────────────────────────────────────────

/// How demanding a plan is, judged by the required weekly loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Moderate,
  Hard,
  Extreme,
}

impl Difficulty {
  /// Classify the kilograms per week needed to go from `current` to `target`
  /// in `weeks` weeks. Zero weeks is treated as one.
  pub fn assess(current: f64, target: f64, weeks: u32) -> Self {
    let weekly_loss = (current - target) / f64::from(weeks.max(1));
    if weekly_loss > 1.2 {
      Self::Extreme
    } else if weekly_loss > 0.8 {
      Self::Hard
    } else if weekly_loss > 0.5 {
      Self::Moderate
    } else {
      Self::Easy
    }
  }
}

/// The aggressive route is only recommended for hard or extreme plans.
pub fn recommend_route(current: f64, target: f64, weeks: u32) -> Route {
  match Difficulty::assess(current, target, weeks) {
    Difficulty::Hard | Difficulty::Extreme => Route::Aggressive,
    Difficulty::Easy | Difficulty::Moderate => Route::Gentle,
  }
}

// ─── Daily suggestion ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyPlan {
  pub day:     u8,
  pub title:   &'static str,
  pub food:    &'static str,
  pub workout: &'static str,
}

const fn day(day: u8, title: &'static str, food: &'static str, workout: &'static str) -> DailyPlan {
  DailyPlan { day, title, food, workout }
}

pub const AGGRESSIVE_WEEK: [DailyPlan; 7] = [
  day(
    1,
    "Liquid day (kick-start metabolism)",
    "Liquids only: skim milk, unsweetened soy milk, black coffee, 2000ml+ of water.",
    "HIIT intervals, 40 minutes",
  ),
  day(
    2,
    "Low-carb eggs and dairy",
    "Breakfast: 2 boiled eggs. Lunch: steamed egg and cucumber. Dinner: protein shake or milk.",
    "Jog or incline walk, 5 km at around 140 bpm",
  ),
  day(
    3,
    "Protein day",
    "Lean meat only (steak, chicken breast, fish) with some leafy greens. No staples, no fruit.",
    "Core training 20 minutes plus plank",
  ),
  day(
    4,
    "High-fibre day",
    "Low-sugar fruit (apple, grapefruit, dragon fruit) and fibrous vegetables (celery, spinach).",
    "2000 rope skips in 5 sets",
  ),
  day(
    5,
    "Carb cycling",
    "Breakfast: 1 slice of wholemeal bread. Lunch: chicken breast and broccoli. Dinner: cucumber or tomato.",
    "Full-body burpee circuit, 30 minutes",
  ),
  day(
    6,
    "Light fasting",
    "Keep the whole day under 500 kcal: vegetable soup, tofu, konjac noodles.",
    "Yoga or pilates, 1 hour",
  ),
  day(
    7,
    "Cheat meal",
    "One meal of your choice, stop at 70% full; keep the rest of the day light.",
    "Full rest and a good night's sleep",
  ),
];

pub const GENTLE_WEEK: [DailyPlan; 7] = [
  day(
    1,
    "Balanced start",
    "Breakfast: oats, milk and an egg. Lunch: mixed grains, skinless chicken leg, greens. Dinner: big salad.",
    "Brisk walk, 30 minutes",
  ),
  day(
    2,
    "Good carbs",
    "Corn, sweet potato or purple yam as staples with lean fish or shrimp. Drink plenty of water.",
    "Cycling, 40 minutes",
  ),
  day(
    3,
    "Sugar control",
    "No refined rice, flour or sugar. Dark greens; a small handful (10g) of nuts as a snack.",
    "Home dumbbell workout, 25 minutes",
  ),
  day(
    4,
    "High protein",
    "Around 1.5g protein per kg of body weight: lean beef, shrimp, tofu.",
    "Jog 40 minutes and stretch",
  ),
  day(
    5,
    "Vitamins",
    "Rainbow plates: at least three colours of vegetables or fruit per meal, little oil or salt.",
    "Swimming or rowing, 40 minutes",
  ),
  day(
    6,
    "Light day",
    "Finish dinner before 18:00; porridge or a yoghurt salad.",
    "Hike or a long walk, 1 hour",
  ),
  day(
    7,
    "Rest and reset",
    "Three normal meals, each to 70% full. Eat when actually hungry.",
    "Meditation and foam rolling",
  ),
];

/// The suggestion for `day_index` days into the plan. The week rotates;
/// negative indexes are treated as day 0.
pub fn daily_plan(route: Route, day_index: i64) -> &'static DailyPlan {
  let week = match route {
    Route::Aggressive => &AGGRESSIVE_WEEK,
    Route::Gentle => &GENTLE_WEEK,
  };
  let index = day_index.max(0).rem_euclid(week.len() as i64) as usize;
  &week[index]
}

// ─── BMI ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
  Underweight,
  Normal,
  Overweight,
  Obese,
}

impl BmiCategory {
  pub fn of(bmi: f64) -> Self {
    if bmi < 18.5 {
      Self::Underweight
    } else if bmi < 24.9 {
      Self::Normal
    } else if bmi < 29.9 {
      Self::Overweight
    } else {
      Self::Obese
    }
  }
}

/// Body mass index, rounded to one decimal.
pub fn bmi(weight: f64, height_cm: f64) -> f64 {
  let height_m = height_cm / 100.0;
  round_to(weight / (height_m * height_m), 1)
}
