//! [`Engine`], the explicit state store.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use slimfit_core::{
  chat::{ChatLog, ChatMessage},
  checkin::{CheckIn, Step, Submission},
  log::{DailyLog, LogStore},
  plan::{DailyPlan, daily_plan},
  presence::{Merge, PresenceStatus, Roster, Teammate},
  profile::{PlanEdit, ProfileDraft, UserProfile},
  progress::{self, ChartPoint},
  store::{CHAT_KEY, KeyValueStore, LOGS_KEY, USER_KEY},
  team::TeamCode,
  trajectory::Trajectory,
};
use slimfit_sync::{ConnectOptions, Inbound, MemoryTransport, TeamChannel, Transport};
use tracing::{debug, info, warn};

use crate::{Error, Result, clock::{Clock, SystemClock}, config::EngineConfig};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Coins taken for a missed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Penalty {
  pub amount:  u32,
  /// Balance after the charge.
  pub balance: u32,
}

/// What a submitted check-in did.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInReport {
  pub log:     DailyLog,
  pub penalty: Option<Penalty>,
  /// The team notification appended for a penalty.
  pub notice:  Option<ChatMessage>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Owns all session state. Mutations go through the methods below only.
pub struct Engine<S, T = MemoryTransport, C = SystemClock>
where
  S: KeyValueStore,
  T: Transport,
  C: Clock,
{
  store:   S,
  config:  EngineConfig,
  clock:   C,
  profile: Option<UserProfile>,
  logs:    LogStore,
  chat:    ChatLog,
  roster:  Roster,
  channel: Option<TeamChannel<T>>,
}

impl<S, T, C> Engine<S, T, C>
where
  S: KeyValueStore,
  T: Transport,
  C: Clock,
{
  /// Read persisted state from `store`. Missing or undecodable keys start
  /// empty.
  pub async fn load(store: S, config: EngineConfig, clock: C) -> Self {
    let profile: Option<UserProfile> = read(&store, USER_KEY).await;
    let logs = read::<Vec<DailyLog>>(&store, LOGS_KEY)
      .await
      .map(LogStore::from_entries)
      .unwrap_or_default();
    let chat = ChatLog::from_messages(
      config.chat_window,
      read::<Vec<ChatMessage>>(&store, CHAT_KEY).await.unwrap_or_default(),
    );
    let roster = Roster::new(profile.as_ref().map(|p| p.user_id).unwrap_or_default());

    debug!(
      onboarded = profile.is_some(),
      logs = logs.len(),
      chat = chat.len(),
      "engine state loaded"
    );

    Self {
      store,
      config,
      clock,
      profile,
      logs,
      chat,
      roster,
      channel: None,
    }
  }

  // ─── Accessors ─────────────────────────────────────────────────────────────

  pub fn config(&self) -> &EngineConfig { &self.config }

  pub fn store(&self) -> &S { &self.store }

  pub fn profile(&self) -> Option<&UserProfile> { self.profile.as_ref() }

  pub fn logs(&self) -> &LogStore { &self.logs }

  pub fn chat(&self) -> &ChatLog { &self.chat }

  pub fn roster(&self) -> &Roster { &self.roster }

  pub fn team(&self) -> Option<&TeamCode> { self.profile.as_ref()?.team_id.as_ref() }

  pub fn is_connected(&self) -> bool { self.channel.as_ref().is_some_and(TeamChannel::is_connected) }

  fn require_profile(&self) -> Result<&UserProfile> { self.profile.as_ref().ok_or(Error::NotOnboarded) }

  // ─── Profile ───────────────────────────────────────────────────────────────

  /// Create the profile from onboarding answers, replacing any existing one
  /// along with its logs.
  pub async fn onboard(&mut self, draft: ProfileDraft) -> Result<&UserProfile> {
    let profile = draft.into_profile(self.clock.today(), self.config.starting_coins)?;
    info!(user_id = %profile.user_id, route = %profile.route, "profile created");

    self.disconnect().await;
    self.roster = Roster::new(profile.user_id);
    self.logs.clear();
    self.profile = Some(profile);

    self.persist_profile().await;
    self.persist_logs().await;
    self.require_profile()
  }

  /// Restart the plan from today at the current weight. Clears the log
  /// history and announces the restart to the team. Coins are untouched.
  pub async fn reset_plan(&mut self, edit: PlanEdit) -> Result<()> {
    let today = self.clock.today();
    let now = self.clock.now_millis();
    let profile = self.profile.as_mut().ok_or(Error::NotOnboarded)?;
    profile.reset_plan(&edit, today)?;
    info!(
      target_weight = profile.target_weight,
      plan_weeks = profile.plan_weeks,
      route = %profile.route,
      "plan reset"
    );
    let notice = ChatMessage::reset_notice(&profile.name, now);

    self.logs.clear();
    self.chat.merge(notice.clone());

    self.persist_profile().await;
    self.persist_logs().await;
    self.persist_chat().await;
    self.broadcast_chat(&notice).await;
    self.broadcast_presence().await;
    Ok(())
  }

  // ─── Trajectory and progress ───────────────────────────────────────────────

  pub fn trajectory(&self) -> Result<Trajectory> { Ok(Trajectory::for_profile(self.require_profile()?)) }

  /// Expected weight for today.
  pub fn today_target(&self) -> Result<f64> { Ok(self.trajectory()?.target_on(self.clock.today())) }

  pub fn weight_progress(&self) -> Result<f64> { Ok(progress::weight_progress(self.require_profile()?)) }

  pub fn time_progress(&self) -> Result<f64> {
    Ok(progress::time_progress(self.require_profile()?, self.clock.today()))
  }

  pub fn chart_series(&self) -> Result<Vec<ChartPoint>> {
    Ok(progress::chart_series(self.require_profile()?, &self.logs, self.clock.today()))
  }

  /// Today's diet and workout suggestion for the profile's route.
  pub fn daily_plan(&self) -> Result<&'static DailyPlan> {
    let profile = self.require_profile()?;
    let day = progress::days_passed(profile.start_date, self.clock.today());
    Ok(daily_plan(profile.route, day))
  }

  // ─── Check-in ──────────────────────────────────────────────────────────────

  /// Begin today's check-in. The previous weight is the most recently
  /// submitted log, or the start weight when there is none.
  pub fn start_check_in(&self) -> Result<CheckIn> {
    let profile = self.require_profile()?;
    let previous = self.logs.last().map_or(profile.start_weight, |log| log.weight);
    Ok(CheckIn::new(
      self.config.check_in,
      self.clock.today(),
      self.today_target()?,
      previous,
    ))
  }

  /// Apply a finished check-in: record the log, update the current weight,
  /// charge any penalty and broadcast the result.
  ///
  /// A second submission for the same day replaces the log but never refunds
  /// an earlier penalty.
  pub async fn submit(&mut self, submission: Submission) -> Result<CheckInReport> {
    let now = self.clock.now_millis();
    let profile = self.profile.as_mut().ok_or(Error::NotOnboarded)?;
    let Submission { log, penalty } = submission;

    profile.current_weight = log.weight;
    let penalty = penalty.map(|amount| Penalty {
      amount,
      balance: profile.charge(amount),
    });
    let notice = penalty.map(|p| ChatMessage::penalty_notice(&profile.name, p.amount, now));

    let replaced = self.logs.upsert(log.clone()).is_some();
    info!(
      date = %log.date,
      weight = log.weight,
      target_met = log.is_target_met,
      replaced,
      "check-in recorded"
    );
    if let Some(p) = penalty {
      info!(amount = p.amount, balance = p.balance, "penalty applied");
    }

    self.persist_profile().await;
    self.persist_logs().await;
    if let Some(notice) = &notice {
      self.chat.merge(notice.clone());
      self.persist_chat().await;
      self.broadcast_chat(notice).await;
    }
    self.broadcast_presence().await;

    Ok(CheckInReport { log, penalty, notice })
  }

  /// Run a whole check-in in one call. `reflection` is used only when the
  /// weight requires one, and its absence is then an error.
  pub async fn check_in(
    &mut self,
    weight: f64,
    photo: Option<String>,
    reflection: Option<&str>,
  ) -> Result<CheckInReport> {
    let mut check_in = self.start_check_in()?;
    let submission = match check_in.enter_weight(weight, photo)? {
      Step::Submitted(submission) => submission,
      Step::NeedsReflection => {
        let reason = reflection.ok_or(slimfit_core::Error::ReflectionRequired)?;
        check_in.reflect(reason)?
      }
    };
    self.submit(submission).await
  }

  // ─── Team ──────────────────────────────────────────────────────────────────

  /// Start a new team under a freshly generated code.
  pub async fn create_team(&mut self) -> Result<TeamCode> {
    let code = TeamCode::generate();
    self.set_team(Some(code.clone())).await?;
    Ok(code)
  }

  /// Join the team identified by `input`. Existence is not checked; an unused
  /// code simply has no other members.
  pub async fn join_team(&mut self, input: &str) -> Result<TeamCode> {
    let code = TeamCode::parse(input)?;
    self.set_team(Some(code.clone())).await?;
    Ok(code)
  }

  pub async fn leave_team(&mut self) -> Result<()> { self.set_team(None).await }

  async fn set_team(&mut self, team: Option<TeamCode>) -> Result<()> {
    let profile = self.profile.as_mut().ok_or(Error::NotOnboarded)?;
    if profile.team_id == team {
      return Ok(());
    }
    match &team {
      Some(code) => info!(team = %code, "joined team"),
      None => info!("left team"),
    }
    profile.team_id = team;

    self.disconnect().await;
    self.roster.clear();
    self.persist_profile().await;
    Ok(())
  }

  /// Open the team channel over `transport`, replacing any live one.
  pub async fn connect(&mut self, transport: T) -> Result<()> {
    let team = self.team().cloned().ok_or(Error::NoTeam)?;
    let presence = self.presence_snapshot()?;
    self.disconnect().await;

    let options = ConnectOptions::for_member(&self.config.transport, presence.user_id);
    let channel = TeamChannel::open(transport, team.clone(), options, presence).await?;
    info!(team = %team, "team channel connected");
    self.channel = Some(channel);
    Ok(())
  }

  /// Tear down the live team channel, if any.
  pub async fn disconnect(&mut self) {
    if let Some(channel) = self.channel.take() {
      debug!(team = %channel.team(), "closing team channel");
      channel.close().await;
    }
  }

  /// Wait for the next message from the team channel and merge it into the
  /// roster or the chat history. Returns `None` when there is no channel or
  /// the transport has closed it.
  pub async fn next_inbound(&mut self) -> Option<Inbound> {
    let channel = self.channel.as_mut()?;
    let Some(inbound) = channel.next_message().await else {
      warn!("team channel closed by transport");
      self.channel = None;
      return None;
    };

    match &inbound {
      Inbound::Presence(snapshot) => match self.roster.merge(snapshot.clone()) {
        Merge::Ignored => {}
        Merge::Inserted => debug!(user_id = %snapshot.user_id, "teammate appeared"),
        Merge::Replaced => debug!(user_id = %snapshot.user_id, "teammate updated"),
      },
      Inbound::Chat(message) => {
        if self.chat.merge(message.clone()) {
          self.persist_chat().await;
        }
      }
    }
    Some(inbound)
  }

  /// This member's presence as derived from today's log.
  pub fn presence_snapshot(&self) -> Result<Teammate> {
    let profile = self.require_profile()?;
    let status = match self.logs.get(self.clock.today()) {
      Some(log) if log.is_target_met => PresenceStatus::Success,
      Some(_) => PresenceStatus::Fail,
      None => PresenceStatus::Pending,
    };
    Ok(Teammate {
      user_id: profile.user_id,
      name: profile.name.clone(),
      avatar: profile.avatar.clone(),
      status,
      weight_lost: profile.weight_lost(),
      last_seen: self.clock.now_millis(),
    })
  }

  /// Re-publish this member's presence now.
  pub async fn publish_presence(&mut self) -> Result<()> {
    let snapshot = self.presence_snapshot()?;
    let channel = self.channel.as_mut().ok_or(Error::NotConnected)?;
    channel.publish_presence(snapshot).await?;
    Ok(())
  }

  // ─── Chat ──────────────────────────────────────────────────────────────────

  /// Post `text` to the team chat. Blank text is ignored. The message is
  /// kept locally even when it cannot be published.
  pub async fn send_chat(&mut self, text: &str) -> Result<Option<ChatMessage>> {
    let profile = self.require_profile()?;
    let content = text.trim();
    if content.is_empty() {
      return Ok(None);
    }
    let avatar = (!profile.avatar.is_empty()).then(|| profile.avatar.clone());
    let message = ChatMessage::text(
      profile.user_id,
      profile.name.clone(),
      avatar,
      content,
      self.clock.now_millis(),
    );

    self.chat.merge(message.clone());
    self.persist_chat().await;
    self.broadcast_chat(&message).await;
    Ok(Some(message))
  }

  // ─── Broadcast ─────────────────────────────────────────────────────────────

  async fn broadcast_presence(&mut self) {
    let Ok(snapshot) = self.presence_snapshot() else {
      return;
    };
    if let Some(channel) = self.channel.as_mut()
      && let Err(e) = channel.publish_presence(snapshot).await
    {
      warn!(error = %e, "presence publish failed");
    }
  }

  async fn broadcast_chat(&mut self, message: &ChatMessage) {
    if let Some(channel) = self.channel.as_mut()
      && let Err(e) = channel.publish_chat(message).await
    {
      warn!(id = %message.id, error = %e, "chat publish failed");
    }
  }

  // ─── Persistence ───────────────────────────────────────────────────────────

  async fn persist_profile(&self) {
    if let Some(profile) = &self.profile {
      self.save(USER_KEY, profile).await;
    }
  }

  async fn persist_logs(&self) { self.save(LOGS_KEY, &self.logs).await; }

  async fn persist_chat(&mut self) {
    self.chat.trim();
    self.save(CHAT_KEY, &self.chat.persisted()).await;
  }

  async fn save(&self, key: &str, value: &impl Serialize) {
    let value = match serde_json::to_value(value) {
      Ok(value) => value,
      Err(e) => {
        warn!(key, error = %e, "could not serialise state");
        return;
      }
    };
    if let Err(e) = self.store.set(key, value).await {
      warn!(key, error = %e, "persisting state failed; continuing in memory");
    }
  }
}

async fn read<V: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<V> {
  let value: Value = match store.get(key).await {
    Ok(value) => value?,
    Err(e) => {
      warn!(key, error = %e, "reading stored state failed");
      return None;
    }
  };
  serde_json::from_value(value)
    .inspect_err(|e| warn!(key, error = %e, "ignoring undecodable stored value"))
    .ok()
}
