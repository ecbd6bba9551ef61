//! Bot AI - patrol/chase/attack state machine producing player inputs

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

use super::entities::{Player, PlayerId, Team, Vec2};
use super::weapons::WeaponId;
use super::PlayerInput;

/// Enemies closer than this are perceived
pub const DETECTION_RADIUS: f32 = 20.0;
/// Chase turns into attack below this distance
pub const ENGAGE_DISTANCE: f32 = 8.0;
/// Attack falls back to chase beyond this distance
pub const DISENGAGE_DISTANCE: f32 = 12.0;
pub const WANDER_INTERVAL: Duration = Duration::from_secs(2);
pub const WANDER_RANGE: f32 = 5.0;
/// Fire probability per tick at difficulty 1.0
pub const BASE_FIRE_CHANCE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BotState {
    Patrol,
    Chase,
    Attack,
}

/// What a bot can perceive about a player
#[derive(Debug, Clone, Copy)]
pub struct PlayerView {
    pub id: PlayerId,
    pub team: Team,
    pub position: Vec2,
    pub alive: bool,
    pub fuel: f32,
    pub primary_weapon: WeaponId,
    pub last_input_seq: u32,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            team: p.team,
            position: p.position,
            alive: p.is_alive(),
            fuel: p.fuel(),
            primary_weapon: p.primary_weapon,
            last_input_seq: p.last_input_seq,
        }
    }
}

/// Per-bot decision state
#[derive(Debug)]
pub struct BotController {
    player_id: PlayerId,
    state: BotState,
    target: Option<PlayerId>,
    wander_target: Option<Vec2>,
    last_wander_at: Option<Instant>,
    difficulty: f32,
    rng: ChaCha8Rng,
}

impl BotController {
    pub fn new(player_id: PlayerId, difficulty: f32, seed: u64) -> Self {
        Self {
            player_id,
            state: BotState::Patrol,
            target: None,
            wander_target: None,
            last_wander_at: None,
            difficulty: difficulty.clamp(0.0, 1.0),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    pub fn target(&self) -> Option<PlayerId> {
        self.target
    }

    /// Perceive the world and produce this tick's input. `None` while dead.
    pub fn decide(&mut self, players: &[PlayerView], now: Instant) -> Option<PlayerInput> {
        let me = *players.iter().find(|p| p.id == self.player_id)?;
        if !me.alive {
            return None;
        }

        let mut input = PlayerInput {
            sequence: me.last_input_seq.wrapping_add(1),
            weapon: me.primary_weapon.as_u8(),
            ..PlayerInput::default()
        };

        let enemy = Self::nearest_enemy(&me, players);

        match self.state {
            BotState::Patrol => match enemy {
                Some(enemy) => {
                    self.state = BotState::Chase;
                    self.target = Some(enemy.id);
                }
                None => {
                    let due = self
                        .last_wander_at
                        .map_or(true, |at| now.saturating_duration_since(at) > WANDER_INTERVAL);
                    if due || self.wander_target.is_none() {
                        self.wander_target = Some(Vec2::new(
                            me.position.x + self.rng.gen_range(-WANDER_RANGE..WANDER_RANGE),
                            me.position.y + self.rng.gen_range(-WANDER_RANGE..WANDER_RANGE),
                        ));
                        self.last_wander_at = Some(now);
                    }
                    if let Some(goal) = self.wander_target {
                        Self::move_towards(&me, goal, &mut input);
                    }
                }
            },

            BotState::Chase => match enemy {
                None => {
                    self.state = BotState::Patrol;
                    self.target = None;
                }
                Some(enemy) => {
                    self.target = Some(enemy.id);
                    if me.position.distance(enemy.position) < ENGAGE_DISTANCE {
                        self.state = BotState::Attack;
                    } else {
                        Self::move_towards(&me, enemy.position, &mut input);
                    }
                }
            },

            BotState::Attack => match enemy {
                Some(enemy) if enemy.alive => {
                    self.target = Some(enemy.id);
                    if me.position.distance(enemy.position) > DISENGAGE_DISTANCE {
                        self.state = BotState::Chase;
                    } else {
                        let dx = enemy.position.x - me.position.x;
                        let dy = enemy.position.y - me.position.y;
                        input.aim_angle_deg = dy.atan2(dx).to_degrees();

                        if self.rng.gen::<f32>() < BASE_FIRE_CHANCE * self.difficulty {
                            input.firing = true;
                        }

                        if dy > 2.0 && me.fuel > 20.0 {
                            input.vertical = 1.0;
                            input.flying = true;
                        }
                    }
                }
                _ => {
                    self.state = BotState::Patrol;
                    self.target = None;
                }
            },
        }

        Some(input)
    }

    fn nearest_enemy(me: &PlayerView, players: &[PlayerView]) -> Option<PlayerView> {
        let mut best: Option<(f32, PlayerView)> = None;
        for p in players {
            if p.id == me.id || !p.alive || !me.team.is_enemy_of(p.team) {
                continue;
            }
            let dist = me.position.distance(p.position);
            if dist < DETECTION_RADIUS && best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, *p));
            }
        }
        best.map(|(_, p)| p)
    }

    fn move_towards(me: &PlayerView, goal: Vec2, input: &mut PlayerInput) {
        let dx = goal.x - me.position.x;
        if dx.abs() > 0.5 {
            input.horizontal = dx.signum();
        }

        let dy = goal.y - me.position.y;
        if dy > 1.0 && me.fuel > 30.0 {
            input.vertical = 1.0;
            input.flying = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: PlayerId, team: Team, x: f32, y: f32) -> PlayerView {
        PlayerView {
            id,
            team,
            position: Vec2::new(x, y),
            alive: true,
            fuel: 100.0,
            primary_weapon: WeaponId::AssaultRifle,
            last_input_seq: 0,
        }
    }

    #[test]
    fn patrol_without_enemies_never_transitions() {
        let mut bot = BotController::new(1, 0.75, 7);
        let mut now = Instant::now();
        let world = vec![view(1, Team::None, 0.0, 0.0), view(2, Team::None, 25.0, 0.0)];

        for _ in 0..200 {
            let input = bot.decide(&world, now).expect("alive bot decides");
            assert_eq!(bot.state(), BotState::Patrol);
            assert!(!input.firing);
            now += Duration::from_millis(100);
        }
    }

    #[test]
    fn patrol_spots_enemy_and_chases() {
        let mut bot = BotController::new(1, 1.0, 7);
        let world = vec![view(1, Team::None, 0.0, 0.0), view(2, Team::None, 15.0, 0.0)];

        bot.decide(&world, Instant::now());
        assert_eq!(bot.state(), BotState::Chase);
        assert_eq!(bot.target(), Some(2));

        let input = bot.decide(&world, Instant::now()).unwrap();
        assert_eq!(bot.state(), BotState::Chase);
        assert_eq!(input.horizontal, 1.0);
    }

    #[test]
    fn teammates_are_ignored() {
        let mut bot = BotController::new(1, 1.0, 7);
        let world = vec![view(1, Team::Red, 0.0, 0.0), view(2, Team::Red, 3.0, 0.0)];
        bot.decide(&world, Instant::now());
        assert_eq!(bot.state(), BotState::Patrol);
    }

    #[test]
    fn chase_engages_then_disengages() {
        let mut bot = BotController::new(1, 1.0, 7);
        let now = Instant::now();
        let mut world = vec![view(1, Team::None, 0.0, 0.0), view(2, Team::None, 5.0, 0.0)];

        bot.decide(&world, now);
        bot.decide(&world, now);
        assert_eq!(bot.state(), BotState::Attack);

        world[1].position = Vec2::new(15.0, 0.0);
        bot.decide(&world, now);
        assert_eq!(bot.state(), BotState::Chase);

        world[1].alive = false;
        bot.decide(&world, now);
        assert_eq!(bot.state(), BotState::Patrol);
        assert_eq!(bot.target(), None);
    }

    #[test]
    fn attack_aims_at_target_and_eventually_fires() {
        let mut bot = BotController::new(1, 1.0, 42);
        let now = Instant::now();
        let world = vec![view(1, Team::None, 0.0, 0.0), view(2, Team::None, 3.0, 3.0)];

        bot.decide(&world, now);
        bot.decide(&world, now);
        assert_eq!(bot.state(), BotState::Attack);

        let mut fired = false;
        for _ in 0..50 {
            let input = bot.decide(&world, now).unwrap();
            assert!((input.aim_angle_deg - 45.0).abs() < 1e-3);
            assert!(input.flying, "target is above, bot should hop");
            fired |= input.firing;
        }
        assert!(fired);
    }

    #[test]
    fn zero_difficulty_never_fires() {
        let mut bot = BotController::new(1, 0.0, 3);
        let now = Instant::now();
        let world = vec![view(1, Team::None, 0.0, 0.0), view(2, Team::None, 2.0, 0.0)];
        for _ in 0..50 {
            let input = bot.decide(&world, now).unwrap();
            assert!(!input.firing);
        }
    }

    #[test]
    fn dead_bot_produces_no_input() {
        let mut bot = BotController::new(1, 1.0, 7);
        let mut me = view(1, Team::None, 0.0, 0.0);
        me.alive = false;
        assert!(bot.decide(&[me], Instant::now()).is_none());
    }

    #[test]
    fn same_seed_same_decisions() {
        let world = vec![view(1, Team::None, 0.0, 0.0)];
        let now = Instant::now();
        let mut a = BotController::new(1, 0.5, 99);
        let mut b = BotController::new(1, 0.5, 99);
        for step in 0..20u64 {
            let t = now + Duration::from_secs(step * 3);
            assert_eq!(a.decide(&world, t), b.decide(&world, t));
        }
    }
}
