//! Room state and authoritative tick loop

use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RoomSettings;
use crate::util::time::unix_millis;

use super::bot::{BotController, PlayerView};
use super::entities::{
    EventKind, MatchEvent, Pickup, PickupKind, Player, PlayerHandle, PlayerId, Projectile, Team,
    Vec2,
};
use super::error::{ClaimError, RoomError, UnknownMode};
use super::maps::MapLayout;
use super::physics::PhysicsSystem;
use super::snapshot::{SnapshotBuilder, SnapshotSink, WorldSnapshot};
use super::validator::{validate_aim_angle, validate_fire_rate, validate_hit_claim, HitClaim, KnownState};
use super::weapons::{self, Delivery, WeaponId};
use super::PlayerInput;

/// Hit radius for projectiles without a blast radius
pub const CONTACT_RADIUS: f32 = 0.6;
/// Distance within which a player collects a pickup
pub const PICKUP_RADIUS: f32 = 1.0;

/// Room lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomState {
    Waiting,
    Countdown,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameMode {
    #[serde(rename = "FFA")]
    FreeForAll,
    #[serde(rename = "TDM")]
    TeamDeathmatch,
}

impl GameMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FreeForAll => "FFA",
            Self::TeamDeathmatch => "TDM",
        }
    }

    /// Team for the n-th player to join
    fn team_for(self, join_index: usize) -> Team {
        match self {
            Self::FreeForAll => Team::None,
            Self::TeamDeathmatch if join_index % 2 == 0 => Team::Red,
            Self::TeamDeathmatch => Team::Blue,
        }
    }
}

impl FromStr for GameMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FFA" | "FREE_FOR_ALL" => Ok(Self::FreeForAll),
            "TDM" | "TEAM_DEATHMATCH" => Ok(Self::TeamDeathmatch),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// Lightweight room listing entry
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub id: Uuid,
    pub mode: GameMode,
    pub map_id: String,
    pub state: RoomState,
    pub tick: u64,
    pub players: usize,
    pub bots: usize,
    pub max_players: usize,
}

/// Projectile requested by an applied input
#[derive(Debug, Clone, Copy)]
struct Launch {
    owner_id: PlayerId,
    weapon: WeaponId,
    position: Vec2,
    velocity: Vec2,
}

/// Accepted hitscan claim awaiting the next combat step
#[derive(Debug, Clone, Copy)]
struct PendingHit {
    shooter_id: PlayerId,
    target_id: PlayerId,
    weapon: WeaponId,
    damage: i32,
}

/// Everything the room-level lock guards
struct World {
    state: RoomState,
    tick: u64,
    players: BTreeMap<PlayerId, PlayerHandle>,
    bots: Vec<BotController>,
    projectiles: Vec<Projectile>,
    pickups: Vec<Pickup>,
    events: Vec<MatchEvent>,
    pending_hits: Vec<PendingHit>,
    next_player_id: PlayerId,
    next_projectile_id: u32,
    started_at: Option<Instant>,
    countdown_ends_at: Option<Instant>,
    rng: ChaCha8Rng,
}

impl World {
    fn push_event(&mut self, kind: EventKind, actor_id: PlayerId, target_id: u32, weapon: Option<WeaponId>) {
        self.events.push(MatchEvent {
            tick: self.tick,
            kind,
            actor_id,
            target_id,
            weapon,
        });
    }

    /// Move forward to `to`; backward or repeated transitions are refused
    fn advance(&mut self, to: RoomState) -> bool {
        if to <= self.state {
            return false;
        }
        self.state = to;
        true
    }

    /// Enter FINISHED once, logging MATCH_END
    fn finish(&mut self) -> bool {
        if !self.advance(RoomState::Finished) {
            return false;
        }
        self.push_event(EventKind::MatchEnd, 0, 0, None);
        true
    }

    fn spawn_projectile(&mut self, launch: Launch, now: Instant) {
        self.next_projectile_id += 1;
        self.projectiles.push(Projectile {
            id: self.next_projectile_id,
            owner_id: launch.owner_id,
            weapon: launch.weapon,
            position: launch.position,
            velocity: launch.velocity,
            spawned_at: now,
            max_life: Projectile::MAX_LIFE,
            active: true,
        });
    }
}

/// One match: owns every entity and drives the tick loop
pub struct Room {
    id: Uuid,
    mode: GameMode,
    map: MapLayout,
    settings: RoomSettings,
    world: RwLock<World>,
    snapshots: Mutex<SnapshotBuilder>,
    sink: RwLock<Option<Arc<dyn SnapshotSink>>>,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Room {
    pub fn new(mode: GameMode, map: MapLayout, settings: RoomSettings) -> Self {
        Self::with_seed(mode, map, settings, rand::random())
    }

    /// Create a room whose bot randomness derives from `seed`
    pub fn with_seed(mode: GameMode, map: MapLayout, settings: RoomSettings, seed: u64) -> Self {
        let (stop_tx, _) = watch::channel(false);
        let world = World {
            state: RoomState::Waiting,
            tick: 0,
            players: BTreeMap::new(),
            bots: Vec::new(),
            projectiles: Vec::new(),
            pickups: map.instantiate_pickups(),
            events: Vec::new(),
            pending_hits: Vec::new(),
            next_player_id: 1,
            next_projectile_id: 0,
            started_at: None,
            countdown_ends_at: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        let snapshots = SnapshotBuilder::new(settings.snapshot_interval_ticks(), settings.event_window);

        Self {
            id: Uuid::new_v4(),
            mode,
            map,
            settings,
            world: RwLock::new(world),
            snapshots: Mutex::new(snapshots),
            sink: RwLock::new(None),
            stop_tx,
            task: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn map_id(&self) -> &str {
        &self.map.id
    }

    pub fn spawn_points(&self) -> &[Vec2] {
        &self.map.spawns
    }

    pub fn state(&self) -> RoomState {
        self.world.read().state
    }

    pub fn tick(&self) -> u64 {
        self.world.read().tick
    }

    pub fn player_count(&self) -> usize {
        self.world.read().players.len()
    }

    pub fn bot_count(&self) -> usize {
        self.world.read().bots.len()
    }

    /// Copy of one player's state
    pub fn player(&self, player_id: PlayerId) -> Option<Player> {
        let handle = self.world.read().players.get(&player_id).cloned();
        handle.map(|h| h.read().clone())
    }

    pub fn events(&self) -> Vec<MatchEvent> {
        self.world.read().events.clone()
    }

    pub fn active_projectiles(&self) -> usize {
        self.world.read().projectiles.iter().filter(|p| p.active).count()
    }

    pub fn summary(&self) -> RoomSummary {
        let w = self.world.read();
        RoomSummary {
            id: self.id,
            mode: self.mode,
            map_id: self.map.id.clone(),
            state: w.state,
            tick: w.tick,
            players: w.players.len(),
            bots: w.bots.len(),
            max_players: self.settings.max_players,
        }
    }

    /// Join a human player. Only possible while WAITING.
    pub fn add_player(&self, user_id: &str, display_name: &str) -> Result<Player, RoomError> {
        let mut w = self.world.write();
        let player = self.insert_player(&mut w, user_id, display_name, false)?;

        info!(
            room_id = %self.id,
            player_id = player.id,
            display_name = %player.display_name,
            player_count = w.players.len(),
            "Player joined room"
        );
        Ok(player)
    }

    fn insert_player(
        &self,
        w: &mut World,
        user_id: &str,
        display_name: &str,
        is_bot: bool,
    ) -> Result<Player, RoomError> {
        if w.players.len() >= self.settings.max_players {
            return Err(RoomError::RoomFull);
        }
        if w.state != RoomState::Waiting {
            return Err(RoomError::MatchInProgress);
        }

        let id = w.next_player_id;
        w.next_player_id += 1;

        let mut player = Player::new(
            id,
            user_id.to_string(),
            display_name.to_string(),
            self.mode.team_for(w.players.len()),
        );
        player.position = self.map.spawn_point(id as usize);
        player.is_bot = is_bot;

        let copy = player.clone();
        w.players.insert(id, player.into_handle());
        Ok(copy)
    }

    /// Remove a player and any bot controller driving it
    pub fn remove_player(&self, player_id: PlayerId) -> bool {
        let mut w = self.world.write();
        let removed = w.players.remove(&player_id).is_some();
        w.bots.retain(|b| b.player_id() != player_id);

        if removed {
            info!(
                room_id = %self.id,
                player_id,
                player_count = w.players.len(),
                "Player left room"
            );
        }
        removed
    }

    /// Add up to `count` bots with difficulty in [0.5, 1.0]. Returns their ids.
    pub fn spawn_bots(&self, count: usize) -> Vec<PlayerId> {
        let mut w = self.world.write();
        let mut spawned = Vec::new();

        for _ in 0..count {
            let name = format!("Bot_{}", w.bots.len() + 1);
            match self.insert_player(&mut w, "bot_uid", &name, true) {
                Ok(player) => {
                    let difficulty = 0.5 + w.rng.gen::<f32>() * 0.5;
                    let seed = w.rng.gen::<u64>();
                    w.bots.push(BotController::new(player.id, difficulty, seed));
                    spawned.push(player.id);
                }
                Err(e) => {
                    warn!(room_id = %self.id, error = %e, "Could not add bot");
                    break;
                }
            }
        }

        if !spawned.is_empty() {
            info!(room_id = %self.id, bots = spawned.len(), "Bots spawned");
        }
        spawned
    }

    /// Register where snapshots go
    pub fn set_snapshot_sink(&self, sink: impl SnapshotSink + 'static) {
        *self.sink.write() = Some(Arc::new(sink));
    }

    /// Leave WAITING and spawn the tick loop
    pub fn start(self: &Arc<Self>) -> Result<(), RoomError> {
        self.begin(Instant::now())?;

        let room = Arc::clone(self);
        let stop_rx = self.stop_tx.subscribe();
        let handle = tokio::spawn(async move { room.run(stop_rx).await });
        *self.task.lock() = Some(handle);
        Ok(())
    }

    fn begin(&self, now: Instant) -> Result<(), RoomError> {
        let mut w = self.world.write();
        if w.state != RoomState::Waiting {
            return Err(RoomError::AlreadyStarted(w.state));
        }
        if self.is_stopped() {
            return Err(RoomError::Stopped);
        }

        if self.settings.countdown.is_zero() {
            w.advance(RoomState::InProgress);
            w.started_at = Some(now);
        } else {
            w.advance(RoomState::Countdown);
            w.countdown_ends_at = Some(now + self.settings.countdown);
        }

        info!(
            room_id = %self.id,
            mode = self.mode.as_str(),
            map = %self.map.id,
            players = w.players.len(),
            state = ?w.state,
            "Match started"
        );
        Ok(())
    }

    /// Signal the tick loop to stop. Safe to call repeatedly.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Apply a network-delivered input immediately (last write wins)
    pub fn handle_player_input(&self, player_id: PlayerId, input: PlayerInput) -> Result<(), RoomError> {
        self.apply_player_input(player_id, input, Instant::now())
    }

    fn apply_player_input(&self, player_id: PlayerId, input: PlayerInput, now: Instant) -> Result<(), RoomError> {
        let handle = {
            let w = self.world.read();
            if w.state == RoomState::Finished {
                return Ok(());
            }
            w.players.get(&player_id).cloned()
        };
        let handle = handle.ok_or(RoomError::UnknownPlayer(player_id))?;

        let launch = apply_input(&mut handle.write(), &input, self.settings.tick_delta(), now);
        if let Some(launch) = launch {
            self.world.write().spawn_projectile(launch, now);
        }
        Ok(())
    }

    /// Validate a client's hitscan hit claim; accepted hits resolve on the next tick
    pub fn handle_hit_claim(&self, shooter_id: PlayerId, claim: HitClaim) -> Result<(), ClaimError> {
        self.apply_hit_claim(shooter_id, claim, Instant::now())
    }

    fn apply_hit_claim(&self, shooter_id: PlayerId, claim: HitClaim, now: Instant) -> Result<(), ClaimError> {
        let shooter = {
            let w = self.world.read();
            if w.state != RoomState::InProgress {
                return Err(ClaimError::NotInProgress);
            }
            let shooter = w
                .players
                .get(&shooter_id)
                .cloned()
                .ok_or(ClaimError::UnknownShooter(shooter_id))?;
            let target_alive = claim.target_id != shooter_id
                && w.players
                    .get(&claim.target_id)
                    .map_or(false, |t| t.read().is_alive());
            if !target_alive {
                return Err(ClaimError::InvalidTarget(claim.target_id));
            }
            shooter
        };

        let spec = weapons::lookup(claim.weapon)
            .filter(|spec| spec.is_hitscan())
            .ok_or(ClaimError::NotHitscan(claim.weapon))?;

        {
            let mut s = shooter.write();
            if !s.is_alive() {
                return Err(ClaimError::ShooterDead);
            }
            let elapsed_secs = s
                .last_input_at
                .map_or(0.0, |at| now.saturating_duration_since(at).as_secs_f32())
                .max(self.settings.tick_delta());
            let known = KnownState {
                position: s.position,
                fuel: s.fuel(),
                last_claim_at: s.last_claim_at,
                elapsed_secs,
            };
            if let Err(rejection) = validate_hit_claim(&claim, &known, now) {
                warn!(
                    room_id = %self.id,
                    player_id = shooter_id,
                    reason = %rejection,
                    "Hit claim rejected"
                );
                return Err(rejection.into());
            }
            s.last_claim_at = Some(now);
        }

        self.world.write().pending_hits.push(PendingHit {
            shooter_id,
            target_id: claim.target_id,
            weapon: spec.id,
            damage: claim.damage.min(spec.applied_damage()),
        });
        Ok(())
    }

    /// Run the authoritative tick loop until stopped or finished
    async fn run(self: Arc<Self>, mut stop_rx: watch::Receiver<bool>) {
        info!(room_id = %self.id, tick_rate = self.settings.tick_rate, "Room tick loop running");

        let mut tick_interval = interval(self.settings.tick_interval());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *stop_rx.borrow() {
                break;
            }

            tokio::select! {
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tick_interval.tick() => {
                    let state = self.step(Instant::now());

                    let due = self.snapshots.lock().should_send();
                    if due || state == RoomState::Finished {
                        self.broadcast();
                    }

                    if state == RoomState::Finished {
                        info!(room_id = %self.id, tick = self.tick(), "Match finished");
                        break;
                    }
                }
            }
        }

        info!(room_id = %self.id, "Room tick loop stopped");
    }

    /// Advance the simulation by one tick
    fn step(&self, now: Instant) -> RoomState {
        let dt = self.settings.tick_delta();
        let mut guard = self.world.write();
        let w = &mut *guard;
        w.tick += 1;

        match w.state {
            RoomState::Waiting | RoomState::Finished => return w.state,
            RoomState::Countdown => {
                if w.countdown_ends_at.map_or(true, |at| now >= at) {
                    w.advance(RoomState::InProgress);
                    w.started_at = Some(now);
                    info!(room_id = %self.id, tick = w.tick, "Countdown complete");
                }
                return w.state;
            }
            RoomState::InProgress => {}
        }

        self.run_bots(w, dt, now);
        Self::integrate_players(w, dt);
        self.respawn_players(w, now);
        Self::integrate_projectiles(w, dt, now);
        self.resolve_combat(w, now);
        self.check_match_end(w, now);
        Self::update_pickups(w, now);

        w.projectiles.retain(|p| p.active);
        w.state
    }

    fn run_bots(&self, w: &mut World, dt: f32, now: Instant) {
        if w.bots.is_empty() {
            return;
        }

        let views: Vec<PlayerView> = w
            .players
            .values()
            .map(|h| PlayerView::from(&*h.read()))
            .collect();

        for i in 0..w.bots.len() {
            let Some(input) = w.bots[i].decide(&views, now) else {
                continue;
            };
            let Some(handle) = w.players.get(&w.bots[i].player_id()).cloned() else {
                continue;
            };
            let launch = apply_input(&mut handle.write(), &input, dt, now);
            if let Some(launch) = launch {
                w.spawn_projectile(launch, now);
            }
        }
    }

    fn integrate_players(w: &mut World, dt: f32) {
        for handle in w.players.values() {
            let mut p = handle.write();
            if !p.is_alive() {
                continue;
            }
            PhysicsSystem::integrate_player(&mut p, dt);
            p.update_fuel(dt);
        }
    }

    fn respawn_players(&self, w: &mut World, now: Instant) {
        let due: Vec<PlayerId> = w
            .players
            .values()
            .filter_map(|h| {
                let p = h.read();
                p.respawn_due(now).then_some(p.id)
            })
            .collect();

        for id in due {
            let Some(handle) = w.players.get(&id).cloned() else {
                continue;
            };
            let team = handle.read().team;
            let spawn = self.safest_spawn(w, id, team);
            handle.write().respawn(spawn.x, spawn.y);
            debug!(room_id = %self.id, player_id = id, x = spawn.x, y = spawn.y, "Player respawned");
        }
    }

    /// Spawn point farthest from the nearest living enemy; first wins ties
    fn safest_spawn(&self, w: &World, player_id: PlayerId, team: Team) -> Vec2 {
        let enemies: Vec<Vec2> = w
            .players
            .values()
            .filter_map(|h| {
                let p = h.read();
                (p.id != player_id && p.is_alive() && team.is_enemy_of(p.team)).then_some(p.position)
            })
            .collect();

        let mut best = self.map.spawn_point(0);
        let mut best_dist = f32::NEG_INFINITY;
        for &spawn in &self.map.spawns {
            let nearest = enemies
                .iter()
                .map(|e| spawn.distance(*e))
                .fold(f32::INFINITY, f32::min);
            if nearest > best_dist {
                best_dist = nearest;
                best = spawn;
            }
        }
        best
    }

    fn integrate_projectiles(w: &mut World, dt: f32, now: Instant) {
        for proj in w.projectiles.iter_mut().filter(|p| p.active) {
            if proj.is_expired(now) {
                proj.active = false;
                continue;
            }
            PhysicsSystem::integrate_projectile(proj, dt);
        }
    }

    /// Projectile hits (first player in id order within radius), then queued hitscan hits
    fn resolve_combat(&self, w: &mut World, now: Instant) {
        for i in 0..w.projectiles.len() {
            if w.state == RoomState::Finished {
                return;
            }
            let proj = &w.projectiles[i];
            if !proj.active {
                continue;
            }

            let (owner_id, weapon, position) = (proj.owner_id, proj.weapon, proj.position);
            let spec = weapon.spec();
            let radius = if spec.blast_radius > 0.0 {
                spec.blast_radius
            } else {
                CONTACT_RADIUS
            };

            let target = w
                .players
                .values()
                .find(|h| {
                    let p = h.read();
                    p.is_alive() && p.id != owner_id && p.position.distance(position) <= radius
                })
                .cloned();

            if let Some(target) = target {
                w.projectiles[i].active = false;
                self.apply_hit(w, owner_id, &target, weapon, spec.applied_damage(), now);
            }
        }

        for hit in std::mem::take(&mut w.pending_hits) {
            if w.state == RoomState::Finished {
                return;
            }
            // A shooter killed earlier this tick loses its queued hits
            let shooter_alive = w
                .players
                .get(&hit.shooter_id)
                .map_or(false, |s| s.read().is_alive());
            if !shooter_alive {
                debug!(room_id = %self.id, player_id = hit.shooter_id, "Dropping hit from dead shooter");
                continue;
            }
            if let Some(target) = w.players.get(&hit.target_id).cloned() {
                self.apply_hit(w, hit.shooter_id, &target, hit.weapon, hit.damage, now);
            }
        }
    }

    fn apply_hit(
        &self,
        w: &mut World,
        shooter_id: PlayerId,
        target: &PlayerHandle,
        weapon: WeaponId,
        damage: i32,
        now: Instant,
    ) {
        let (target_id, lethal) = {
            let mut t = target.write();
            if !t.is_alive() {
                return;
            }
            t.take_damage(damage, now);
            (t.id, !t.is_alive())
        };
        if !lethal {
            return;
        }

        let Some(shooter) = w.players.get(&shooter_id).cloned() else {
            return;
        };
        let kills = {
            let mut s = shooter.write();
            s.kills += 1;
            s.damage_dealt += damage;
            s.kills
        };

        w.push_event(EventKind::Kill, shooter_id, target_id, Some(weapon));
        self.snapshots.lock().force_next();
        info!(
            room_id = %self.id,
            killer = shooter_id,
            victim = target_id,
            weapon = weapon.spec().name,
            "Player killed"
        );

        if kills >= self.settings.kill_limit && w.finish() {
            info!(room_id = %self.id, player_id = shooter_id, kills, "Kill limit reached");
        }
    }

    fn check_match_end(&self, w: &mut World, now: Instant) {
        if w.state != RoomState::InProgress {
            return;
        }
        if w.players.is_empty() {
            w.finish();
            info!(room_id = %self.id, "All players left, ending match");
            return;
        }
        let elapsed = w
            .started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();
        if elapsed >= self.settings.time_limit {
            w.finish();
            info!(room_id = %self.id, "Time limit reached");
        }
    }

    /// Collect touched pickups, then reactivate those whose timer elapsed
    fn update_pickups(w: &mut World, now: Instant) {
        let World {
            players,
            pickups,
            events,
            tick,
            ..
        } = w;

        for pickup in pickups.iter_mut().filter(|p| p.active) {
            for handle in players.values() {
                let mut p = handle.write();
                if !p.is_alive() || p.position.distance(pickup.position) > PICKUP_RADIUS {
                    continue;
                }

                let (collected, weapon) = match pickup.kind {
                    PickupKind::Weapon { weapon } => {
                        p.equip_primary(weapon);
                        (true, Some(weapon))
                    }
                    PickupKind::Health { amount } => (p.heal(amount) > 0, None),
                    PickupKind::Fuel => {
                        let needed = p.fuel() < p.max_fuel();
                        if needed {
                            p.refuel();
                        }
                        (needed, None)
                    }
                };

                if collected {
                    pickup.active = false;
                    pickup.respawn_at = Some(now + Pickup::RESPAWN_DELAY);
                    events.push(MatchEvent {
                        tick: *tick,
                        kind: EventKind::Pickup,
                        actor_id: p.id,
                        target_id: pickup.id,
                        weapon,
                    });
                    break;
                }
            }
        }

        for pickup in pickups.iter_mut().filter(|p| !p.active) {
            if pickup.respawn_at.map_or(true, |at| now >= at) {
                pickup.active = true;
                pickup.respawn_at = None;
            }
        }
    }

    /// Immutable copy of the world carrying the full event log
    pub fn snapshot(&self) -> WorldSnapshot {
        let w = self.world.read();
        self.copy_world(&w, w.events.clone())
    }

    fn copy_world(&self, w: &World, events: Vec<MatchEvent>) -> WorldSnapshot {
        WorldSnapshot {
            room_id: self.id,
            tick: w.tick,
            state: w.state,
            server_time_ms: unix_millis(),
            players: w.players.values().map(|h| h.read().clone()).collect(),
            pickups: w.pickups.clone(),
            events,
        }
    }

    /// Copy under the read lock, release, then hand off to the sink
    fn broadcast(&self) {
        let Some(sink) = self.sink.read().clone() else {
            return;
        };
        let snapshot = {
            let w = self.world.read();
            let events = self.snapshots.lock().select_events(&w.events);
            self.copy_world(&w, events)
        };
        sink.deliver(snapshot);
    }
}

/// Authoritative, simplified input application for one player
fn apply_input(player: &mut Player, input: &PlayerInput, step_secs: f32, now: Instant) -> Option<Launch> {
    if !player.is_alive() {
        return None;
    }

    let commanded = PhysicsSystem::commanded_velocity(input.horizontal, input.vertical);
    player.velocity.x = commanded.x;
    if input.flying && player.fuel() > 0.0 {
        player.velocity.y = commanded.y;
        player.flying = true;
    } else {
        player.flying = false;
    }

    // One fixed sub-step so the input is visible before the next tick
    player.position.x += player.velocity.x * step_secs;
    player.position.y += player.velocity.y * step_secs;
    player.last_input_seq = input.sequence;
    player.last_input_at = Some(now);

    if !validate_aim_angle(input.aim_angle_deg) {
        debug!(player_id = player.id, aim = input.aim_angle_deg, "Discarding out-of-range aim");
        return None;
    }
    player.aim_angle_deg = input.aim_angle_deg;

    if !input.firing {
        return None;
    }
    let spec = weapons::lookup(input.weapon)?;
    if !validate_fire_rate(input.weapon, player.last_fire_at, now) {
        debug!(player_id = player.id, weapon = spec.name, "Dropping shot above fire rate");
        return None;
    }
    player.last_fire_at = Some(now);

    match spec.delivery {
        // Resolved through hit claims
        Delivery::Hitscan => None,
        Delivery::Projectile { speed } => Some(Launch {
            owner_id: player.id,
            weapon: spec.id,
            position: player.position,
            velocity: PhysicsSystem::velocity_from_aim(player.aim_angle_deg, speed),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::snapshot::FnSink;
    use crate::game::validator::Rejection;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_test::{assert_err, assert_ok};

    fn line_map() -> MapLayout {
        MapLayout {
            id: "line".into(),
            spawns: vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)],
            pickups: Vec::new(),
        }
    }

    fn room_with(settings: RoomSettings) -> Room {
        Room::with_seed(GameMode::FreeForAll, line_map(), settings, 1)
    }

    fn room() -> Room {
        room_with(RoomSettings::default())
    }

    fn place(room: &Room, id: PlayerId, x: f32, y: f32) {
        let handle = room.world.read().players.get(&id).cloned().unwrap();
        let mut p = handle.write();
        p.position = Vec2::new(x, y);
        p.velocity = Vec2::ZERO;
    }

    fn fire(weapon: WeaponId, aim: f32) -> PlayerInput {
        PlayerInput {
            aim_angle_deg: aim,
            firing: true,
            weapon: weapon.as_u8(),
            sequence: 1,
            ..PlayerInput::default()
        }
    }

    fn tick_after(start: Instant, ticks: u32) -> Instant {
        start + Duration::from_secs_f32(ticks as f32 / 30.0)
    }

    #[test]
    fn players_get_sequential_ids_and_spawns() {
        let room = room();
        let a = room.add_player("u1", "Alice").unwrap();
        let b = room.add_player("u2", "Bob").unwrap();

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.position, Vec2::new(10.0, 0.0));
        assert_eq!(b.position, Vec2::new(20.0, 0.0));
        assert_eq!(a.team, Team::None);
    }

    #[test]
    fn team_deathmatch_alternates_teams() {
        let room = Room::with_seed(GameMode::TeamDeathmatch, line_map(), RoomSettings::default(), 1);
        let teams: Vec<Team> = (0..4)
            .map(|i| room.add_player("u", &format!("p{i}")).unwrap().team)
            .collect();
        assert_eq!(teams, vec![Team::Red, Team::Blue, Team::Red, Team::Blue]);
    }

    #[test]
    fn full_room_rejects_joins() {
        let room = room_with(RoomSettings {
            max_players: 2,
            ..RoomSettings::default()
        });
        assert_ok!(room.add_player("u1", "a"));
        assert_ok!(room.add_player("u2", "b"));
        assert_eq!(room.add_player("u3", "c").unwrap_err(), RoomError::RoomFull);
        assert_eq!(room.add_player("u3", "c").unwrap_err().to_string(), "room full");
    }

    #[test]
    fn joins_rejected_once_countdown_begins() {
        let room = room_with(RoomSettings {
            countdown: Duration::from_secs(3),
            ..RoomSettings::default()
        });
        room.add_player("u1", "a").unwrap();
        room.add_player("u2", "b").unwrap();
        room.begin(Instant::now()).unwrap();

        assert_eq!(room.state(), RoomState::Countdown);
        assert_eq!(room.add_player("u3", "c").unwrap_err(), RoomError::MatchInProgress);
    }

    #[test]
    fn countdown_promotes_to_in_progress() {
        let room = room_with(RoomSettings {
            countdown: Duration::from_secs(3),
            ..RoomSettings::default()
        });
        room.add_player("u1", "a").unwrap();
        let t0 = Instant::now();
        room.begin(t0).unwrap();

        assert_eq!(room.step(t0 + Duration::from_secs(1)), RoomState::Countdown);
        assert_eq!(room.step(t0 + Duration::from_secs(3)), RoomState::InProgress);
    }

    #[test]
    fn start_is_only_valid_from_waiting() {
        let room = room();
        let t0 = Instant::now();
        assert_ok!(room.begin(t0));
        assert_eq!(
            room.begin(t0).unwrap_err(),
            RoomError::AlreadyStarted(RoomState::InProgress)
        );
    }

    #[test]
    fn rocket_kills_full_health_target_in_one_hit() {
        let room = room();
        room.add_player("u1", "shooter").unwrap();
        room.add_player("u2", "target").unwrap();
        place(&room, 1, 0.0, 0.0);
        place(&room, 2, 2.0, 0.0);

        let t0 = Instant::now();
        room.begin(t0).unwrap();
        room.apply_player_input(1, fire(WeaponId::RocketLauncher, 0.0), t0).unwrap();
        assert_eq!(room.active_projectiles(), 1);

        room.step(tick_after(t0, 1));

        let target = room.player(2).unwrap();
        assert!(!target.is_alive());
        assert_eq!(target.health(), 0);

        let shooter = room.player(1).unwrap();
        assert_eq!(shooter.kills, 1);
        assert_eq!(shooter.damage_dealt, 120);

        let events = room.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Kill);
        assert_eq!((events[0].actor_id, events[0].target_id), (1, 2));
        assert_eq!(events[0].tick, 1);
        assert_eq!(room.active_projectiles(), 0);
        assert_eq!(room.state(), RoomState::InProgress);
    }

    #[test]
    fn projectile_hits_first_player_in_id_order() {
        let room = room();
        for i in 0..3 {
            room.add_player("u", &format!("p{i}")).unwrap();
        }
        place(&room, 1, -2.0, 0.0);
        place(&room, 2, 1.0, 0.0);
        place(&room, 3, 0.5, 0.0);

        let t0 = Instant::now();
        room.begin(t0).unwrap();
        room.apply_player_input(1, fire(WeaponId::RocketLauncher, 0.0), t0).unwrap();
        room.step(tick_after(t0, 1));

        assert!(!room.player(2).unwrap().is_alive());
        assert_eq!(room.player(3).unwrap().health(), 100);
    }

    #[test]
    fn projectile_times_out_strictly_after_five_seconds() {
        let room = room();
        room.add_player("u1", "miner").unwrap();
        let t0 = Instant::now();
        room.begin(t0).unwrap();
        room.apply_player_input(1, fire(WeaponId::ProximityMine, 0.0), t0).unwrap();

        room.step(t0 + Duration::from_secs(5));
        assert_eq!(room.active_projectiles(), 1);

        room.step(t0 + Duration::from_millis(5001));
        assert_eq!(room.active_projectiles(), 0);
    }

    #[test]
    fn fire_rate_gate_drops_rapid_shots() {
        let room = room();
        room.add_player("u1", "spammer").unwrap();
        let t0 = Instant::now();
        room.begin(t0).unwrap();

        room.apply_player_input(1, fire(WeaponId::RocketLauncher, 0.0), t0).unwrap();
        room.apply_player_input(1, fire(WeaponId::RocketLauncher, 0.0), t0 + Duration::from_millis(100)).unwrap();
        assert_eq!(room.active_projectiles(), 1);

        room.apply_player_input(1, fire(WeaponId::RocketLauncher, 0.0), t0 + Duration::from_secs(3)).unwrap();
        assert_eq!(room.active_projectiles(), 2);
    }

    #[test]
    fn out_of_range_aim_is_discarded_with_its_shot() {
        let room = room();
        room.add_player("u1", "p").unwrap();
        let t0 = Instant::now();
        room.begin(t0).unwrap();

        room.apply_player_input(1, fire(WeaponId::RocketLauncher, 500.0), t0).unwrap();
        assert_eq!(room.active_projectiles(), 0);
        assert_eq!(room.player(1).unwrap().aim_angle_deg, 0.0);
        assert_eq!(room.player(1).unwrap().last_input_seq, 1);
    }

    #[test]
    fn input_moves_player_one_substep() {
        let room = room();
        room.add_player("u1", "p").unwrap();
        place(&room, 1, 0.0, 5.0);
        let input = PlayerInput {
            horizontal: 1.0,
            vertical: 1.0,
            flying: true,
            sequence: 9,
            ..PlayerInput::default()
        };
        room.apply_player_input(1, input, Instant::now()).unwrap();

        let p = room.player(1).unwrap();
        assert!(p.flying);
        assert!((p.position.x - 12.0 / 30.0).abs() < 1e-5);
        assert!((p.position.y - (5.0 + 15.0 / 30.0)).abs() < 1e-5);
        assert_eq!(p.last_input_seq, 9);
    }

    #[test]
    fn unknown_player_input_is_an_error() {
        let room = room();
        assert_eq!(
            room.handle_player_input(42, PlayerInput::default()).unwrap_err(),
            RoomError::UnknownPlayer(42)
        );
    }

    #[test]
    fn kill_limit_finishes_match_and_state_is_terminal() {
        let room = room_with(RoomSettings {
            kill_limit: 1,
            ..RoomSettings::default()
        });
        room.add_player("u1", "a").unwrap();
        room.add_player("u2", "b").unwrap();
        place(&room, 1, 0.0, 0.0);
        place(&room, 2, 2.0, 0.0);

        let t0 = Instant::now();
        room.begin(t0).unwrap();
        room.apply_player_input(1, fire(WeaponId::RocketLauncher, 0.0), t0).unwrap();
        assert_eq!(room.step(tick_after(t0, 1)), RoomState::Finished);

        let kinds: Vec<EventKind> = room.events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Kill, EventKind::MatchEnd]);

        for n in 2..10 {
            assert_eq!(room.step(tick_after(t0, n)), RoomState::Finished);
        }
        assert_eq!(room.events().len(), 2);
        assert_err!(room.begin(t0));
        assert_eq!(room.state(), RoomState::Finished);
    }

    #[test]
    fn time_limit_finishes_match() {
        let room = room();
        room.add_player("u1", "a").unwrap();
        let t0 = Instant::now();
        room.begin(t0).unwrap();

        assert_eq!(room.step(t0 + Duration::from_secs(299)), RoomState::InProgress);
        assert_eq!(room.step(t0 + Duration::from_secs(300)), RoomState::Finished);

        let events = room.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::MatchEnd);
        assert_eq!(events[0].tick, 2);
    }

    #[test]
    fn emptied_room_finishes_on_next_tick() {
        let room = room();
        room.add_player("u1", "a").unwrap();
        let t0 = Instant::now();
        room.begin(t0).unwrap();

        assert!(room.remove_player(1));
        assert!(!room.remove_player(1));
        assert_eq!(room.state(), RoomState::InProgress);
        assert_eq!(room.step(tick_after(t0, 1)), RoomState::Finished);
    }

    #[test]
    fn dead_player_respawns_far_from_enemies() {
        let room = room();
        room.add_player("u1", "a").unwrap();
        room.add_player("u2", "b").unwrap();
        place(&room, 1, 18.0, 0.0);

        let t0 = Instant::now();
        room.begin(t0).unwrap();
        let victim = room.world.read().players.get(&2).cloned().unwrap();
        victim.write().take_damage(500, t0);

        room.step(t0 + Duration::from_secs(1));
        assert!(!room.player(2).unwrap().is_alive());

        room.step(t0 + Duration::from_millis(3100));
        let p = room.player(2).unwrap();
        assert!(p.is_alive());
        assert_eq!(p.health(), p.max_health());
        assert_eq!(p.position, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn bots_fill_room_up_to_capacity_and_are_pruned_on_removal() {
        let room = room_with(RoomSettings {
            max_players: 3,
            ..RoomSettings::default()
        });
        let ids = room.spawn_bots(5);
        assert_eq!(ids.len(), 3);
        assert_eq!(room.bot_count(), 3);
        assert!(room.player(ids[0]).unwrap().is_bot);

        room.remove_player(ids[1]);
        assert_eq!(room.bot_count(), 2);
        assert_eq!(room.player_count(), 2);
    }

    #[test]
    fn bot_ticks_run_without_humans() {
        let room = room();
        room.spawn_bots(3);
        let t0 = Instant::now();
        room.begin(t0).unwrap();
        for n in 1..=90 {
            room.step(tick_after(t0, n));
        }
        assert_eq!(room.state(), RoomState::InProgress);
        assert_eq!(room.tick(), 90);
    }

    #[test]
    fn health_pickup_heals_and_respawns() {
        let map = MapLayout {
            id: "medbay".into(),
            spawns: vec![Vec2::ZERO],
            pickups: vec![(PickupKind::Health { amount: 50 }, Vec2::new(5.0, 0.0))],
        };
        let room = Room::with_seed(GameMode::FreeForAll, map, RoomSettings::default(), 1);
        room.add_player("u1", "a").unwrap();
        place(&room, 1, 5.0, 0.0);

        let t0 = Instant::now();
        room.begin(t0).unwrap();
        let handle = room.world.read().players.get(&1).cloned().unwrap();
        handle.write().take_damage(40, t0);

        room.step(tick_after(t0, 1));
        assert_eq!(room.player(1).unwrap().health(), 100);
        let snap = room.snapshot();
        assert!(!snap.pickups[0].active);
        assert_eq!(snap.events[0].kind, EventKind::Pickup);
        assert_eq!(snap.events[0].target_id, 1);

        room.step(t0 + Duration::from_secs(16));
        assert!(room.snapshot().pickups[0].active);
        assert_eq!(room.events().len(), 1);
    }

    #[test]
    fn accepted_hit_claim_resolves_next_tick() {
        let room = room();
        room.add_player("u1", "sniper").unwrap();
        room.add_player("u2", "target").unwrap();
        place(&room, 1, 0.0, 0.0);
        place(&room, 2, 15.0, 0.0);
        let t0 = Instant::now();
        room.begin(t0).unwrap();

        let claim = HitClaim {
            target_id: 2,
            weapon: WeaponId::SniperRifle.as_u8(),
            damage: 80,
            shooter_position: Vec2::ZERO,
            fuel: 100.0,
            aim_angle_deg: 0.0,
        };
        assert_ok!(room.apply_hit_claim(1, claim, t0));
        assert_eq!(room.player(2).unwrap().health(), 100);

        room.step(tick_after(t0, 1));
        assert_eq!(room.player(2).unwrap().health(), 20);

        assert_eq!(
            room.apply_hit_claim(1, claim, t0 + Duration::from_millis(1000)),
            Err(ClaimError::Rejected(Rejection::FireRate))
        );
        assert_ok!(room.apply_hit_claim(1, claim, t0 + Duration::from_millis(2000)));
    }

    #[test]
    fn implausible_hit_claims_are_rejected() {
        let room = room();
        room.add_player("u1", "a").unwrap();
        room.add_player("u2", "b").unwrap();
        place(&room, 1, 0.0, 0.0);
        let t0 = Instant::now();

        let mut claim = HitClaim {
            target_id: 2,
            weapon: WeaponId::LaserGun.as_u8(),
            damage: 25,
            shooter_position: Vec2::ZERO,
            fuel: 100.0,
            aim_angle_deg: 0.0,
        };
        assert_eq!(room.apply_hit_claim(1, claim, t0), Err(ClaimError::NotInProgress));
        room.begin(t0).unwrap();

        claim.shooter_position = Vec2::new(30.0, 0.0);
        assert_eq!(
            room.apply_hit_claim(1, claim, t0),
            Err(ClaimError::Rejected(Rejection::Movement))
        );

        claim.shooter_position = Vec2::ZERO;
        claim.weapon = WeaponId::RocketLauncher.as_u8();
        assert_eq!(room.apply_hit_claim(1, claim, t0), Err(ClaimError::NotHitscan(4)));

        claim.weapon = WeaponId::LaserGun.as_u8();
        claim.target_id = 1;
        assert_eq!(room.apply_hit_claim(1, claim, t0), Err(ClaimError::InvalidTarget(1)));
    }

    #[test]
    fn since_last_window_sends_each_event_once() {
        let room = room_with(RoomSettings {
            event_window: crate::game::snapshot::EventWindow::SinceLastSnapshot,
            ..RoomSettings::default()
        });
        let (tx, mut rx) = mpsc::unbounded_channel::<WorldSnapshot>();
        room.set_snapshot_sink(tx);
        room.add_player("u1", "a").unwrap();
        let t0 = Instant::now();
        room.begin(t0).unwrap();

        room.step(t0 + Duration::from_secs(300));
        room.broadcast();
        room.broadcast();

        assert_eq!(rx.try_recv().unwrap().events.len(), 1);
        assert!(rx.try_recv().unwrap().events.is_empty());
    }

    #[test]
    fn snapshot_serializes_for_the_wire() {
        let room = room();
        room.add_player("u1", "a").unwrap();
        room.begin(Instant::now()).unwrap();

        let value = serde_json::to_value(room.snapshot()).unwrap();
        assert_eq!(value["state"], "IN_PROGRESS");
        assert_eq!(value["players"][0]["health"], 100);
        assert_eq!(value["players"][0]["team"], "NONE");
    }

    #[test]
    fn game_mode_parses_case_insensitively() {
        assert_eq!("ffa".parse::<GameMode>(), Ok(GameMode::FreeForAll));
        assert_eq!("TDM".parse::<GameMode>(), Ok(GameMode::TeamDeathmatch));
        assert!("ctf".parse::<GameMode>().is_err());
    }

    #[test]
    fn oversized_bot_request_is_capped_at_room_capacity() {
        let room = room();
        let ids = room.spawn_bots(usize::MAX);
        assert_eq!(ids.len(), room.settings.max_players);
        assert_eq!(room.player_count(), room.settings.max_players);
    }

    #[test]
    fn stopped_room_cannot_start() {
        let room = room();
        room.add_player("u1", "a").unwrap();
        room.stop();

        assert_eq!(room.begin(Instant::now()).unwrap_err(), RoomError::Stopped);
        assert_eq!(room.state(), RoomState::Waiting);
    }

    #[tokio::test]
    async fn start_after_stop_spawns_no_loop() {
        let room = Arc::new(room());
        room.stop();
        assert_eq!(room.start(), Err(RoomError::Stopped));
        assert!(room.task.lock().is_none());
    }

    #[test]
    fn kill_forces_the_next_snapshot() {
        let room = room_with(RoomSettings {
            snapshot_rate: 1,
            ..RoomSettings::default()
        });
        room.add_player("u1", "a").unwrap();
        room.add_player("u2", "b").unwrap();
        place(&room, 1, 0.0, 0.0);
        place(&room, 2, 2.0, 0.0);

        let t0 = Instant::now();
        room.begin(t0).unwrap();
        room.step(tick_after(t0, 1));
        assert!(!room.snapshots.lock().should_send());

        room.apply_player_input(1, fire(WeaponId::RocketLauncher, 0.0), t0).unwrap();
        room.step(tick_after(t0, 2));
        assert_eq!(room.events()[0].kind, EventKind::Kill);
        assert!(room.snapshots.lock().should_send());
    }

    #[test]
    fn queued_hit_from_shooter_killed_this_tick_is_dropped() {
        let room = room();
        for i in 0..3 {
            room.add_player("u", &format!("p{i}")).unwrap();
        }
        place(&room, 1, 0.0, 0.0);
        place(&room, 2, 15.0, 0.0);
        place(&room, 3, -2.0, 0.0);
        let t0 = Instant::now();
        room.begin(t0).unwrap();

        let claim = HitClaim {
            target_id: 2,
            weapon: WeaponId::SniperRifle.as_u8(),
            damage: 80,
            shooter_position: Vec2::ZERO,
            fuel: 100.0,
            aim_angle_deg: 0.0,
        };
        assert_ok!(room.apply_hit_claim(1, claim, t0));
        room.apply_player_input(3, fire(WeaponId::RocketLauncher, 0.0), t0).unwrap();

        room.step(tick_after(t0, 1));

        assert!(!room.player(1).unwrap().is_alive());
        assert_eq!(room.player(1).unwrap().kills, 0);
        assert_eq!(room.player(2).unwrap().health(), 100);
        assert_eq!(room.player(3).unwrap().kills, 1);
        assert_eq!(room.events().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn inputs_from_another_task_race_the_tick_loop() {
        let room = Arc::new(room_with(RoomSettings {
            tick_rate: 200,
            ..RoomSettings::default()
        }));
        let pilot = room.add_player("u1", "pilot").unwrap().id;
        room.spawn_bots(2);
        room.start().unwrap();

        let sender = Arc::clone(&room);
        let writer = tokio::spawn(async move {
            for seq in 1..=500u32 {
                let input = PlayerInput {
                    horizontal: if seq % 2 == 0 { 1.0 } else { -1.0 },
                    aim_angle_deg: (seq % 360) as f32,
                    sequence: seq,
                    ..PlayerInput::default()
                };
                sender.handle_player_input(pilot, input).unwrap();
                tokio::task::yield_now().await;
            }
        });
        tokio::time::timeout(Duration::from_secs(5), writer)
            .await
            .expect("no deadlock between input and tick")
            .unwrap();

        let before = room.tick();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(room.tick() > before, "tick loop keeps advancing");

        let p = room.player(pilot).unwrap();
        assert_eq!(p.last_input_seq, 500);
        assert_eq!(p.aim_angle_deg, 140.0);
        assert_eq!(p.velocity.x, 12.0);

        room.stop();
    }

    #[tokio::test]
    async fn tick_loop_delivers_snapshots_and_stops() {
        let room = Arc::new(room_with(RoomSettings {
            tick_rate: 100,
            snapshot_rate: 100,
            ..RoomSettings::default()
        }));
        let (tx, mut rx) = mpsc::unbounded_channel::<WorldSnapshot>();
        room.set_snapshot_sink(tx);
        room.spawn_bots(2);
        room.start().unwrap();

        let snapshot = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("snapshot within timeout")
            .expect("sink open");
        assert_eq!(snapshot.room_id, room.id());
        assert_eq!(snapshot.players.len(), 2);

        room.stop();
        room.stop();
        let task = room.task.lock().take().unwrap();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("loop exits after stop")
            .unwrap();
        assert!(room.is_stopped());
    }

    #[tokio::test]
    async fn finished_match_sends_final_snapshot() {
        let room = Arc::new(room_with(RoomSettings {
            tick_rate: 100,
            snapshot_rate: 1,
            time_limit: Duration::ZERO,
            ..RoomSettings::default()
        }));
        let (tx, mut rx) = mpsc::unbounded_channel::<RoomState>();
        room.set_snapshot_sink(FnSink(move |snap: WorldSnapshot| {
            let _ = tx.send(snap.state);
        }));
        room.add_player("u1", "a").unwrap();
        room.start().unwrap();

        let state = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state, RoomState::Finished);
    }
}
