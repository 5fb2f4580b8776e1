//! Dark Armada Demo
//!
//! Runs one full engagement through the verification core: two players
//! found planets, arm them, fight one battle and settle one forfeit. The
//! witness store runs alongside and is checked against the core's roots
//! after every call.
//!
//! Configuration comes from a JSON file given as the first argument, or
//! from `ARMADA_*` environment variables. Set `RUST_LOG=debug` to see
//! rejected transitions.

use anyhow::{ensure, Context};
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use dark_armada::{
    VERSION,
    core::hash::short_hex,
    game::{
        rules::is_habitable, AttackFleet, Coordinate, ExecutionContext, Faction, FleetDefense, GameConfig,
        PlayerId, StateMachine, Transition, TransitionError, TransitionOutcome,
    },
    proof::location_hash,
    store::PlanetLedger,
};

fn main() -> anyhow::Result<()> {
    init_logging()?;

    info!("Dark Armada core v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::from_json_file(&path).with_context(|| format!("loading {}", path))?,
        None => GameConfig::from_env().context("reading ARMADA_* environment")?,
    };
    info!(
        "Grid {}x{}, capacity {}, tree depth {}",
        config.grid_size, config.grid_size, config.max_planets, config.details_tree_depth
    );

    demo_engagement(config)
}

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))
}

/// Core plus the store that feeds it.
struct Session {
    machine: StateMachine,
    ledger: PlanetLedger,
}

impl Session {
    fn submit(&mut self, ctx: &ExecutionContext, transition: Transition) -> Result<TransitionOutcome, TransitionError> {
        let outcome = self.machine.apply(ctx, &transition)?;
        self.ledger.absorb(&outcome.delta);
        Ok(outcome)
    }

    fn check_roots(&self) -> anyhow::Result<()> {
        ensure!(
            self.ledger.roots() == *self.machine.state(),
            "store diverged from core at {} planets",
            self.machine.planet_count()
        );
        Ok(())
    }
}

/// First `count` habitable, unclaimed coordinates scanning row by row.
fn scout(config: &GameConfig, ledger: &PlanetLedger, count: usize) -> Vec<Coordinate> {
    (0..config.grid_size)
        .flat_map(|y| (0..config.grid_size).map(move |x| Coordinate::new(x, y)))
        .filter(|c| {
            let location = location_hash(c);
            is_habitable(&location, config) && !ledger.is_location_taken(&location)
        })
        .take(count)
        .collect()
}

fn demo_engagement(config: GameConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Engagement ===");

    let mut session = Session {
        machine: StateMachine::new(config.clone())?,
        ledger: PlanetLedger::for_config(&config),
    };
    let mut now = Utc::now().timestamp_millis().max(0) as u64;

    let alice = PlayerId::from_account(&Uuid::new_v4());
    let bob = PlayerId::from_account(&Uuid::new_v4());

    let sites = scout(&config, &session.ledger, 2);
    ensure!(sites.len() == 2, "no habitable coordinates under the configured cutoff");

    // Found planets
    for (player, site, faction) in [(alice, sites[0], Faction::Vanguard), (bob, sites[1], Faction::Collective)] {
        let req = session.ledger.create_planet(&player, site.x, site.y, faction.index());
        let outcome = session.submit(&ExecutionContext::new(player, now), Transition::CreatePlanet(req))?;
        info!("{} founded ({}, {}): {}", player, site.x, site.y, outcome.event);
        session.check_roots()?;
    }

    let alice_planet = 0;
    let bob_planet = 1;

    // Arm both planets
    let alice_defense = FleetDefense::new(alice, 4, 4, 4);
    let bob_defense = FleetDefense::new(bob, 5, 5, 5);
    for (player, planet, defense) in [(alice, alice_planet, alice_defense), (bob, bob_planet, bob_defense)] {
        let req = session.ledger.set_defense(planet, defense)?;
        let outcome = session.submit(&ExecutionContext::new(player, now), Transition::SetDefense(req))?;
        info!("{} armed: {}", player, outcome.event);
    }
    session.check_roots()?;

    // Alice attacks, Bob resolves
    now += 1_000;
    let strike = AttackFleet {
        faction: Faction::Vanguard,
        attacker: alice,
        battleships: 10,
        destroyers: 0,
        carriers: 0,
        launch_timestamp: now,
    };
    let req = session.ledger.launch_attack(alice_planet, bob_planet, strike)?;
    let outcome = session.submit(&ExecutionContext::new(alice, now), Transition::LaunchAttack(req))?;
    info!("{} launched: {}", alice, outcome.event);

    // A second fleet cannot land while one is pending.
    let req = session.ledger.launch_attack(alice_planet, bob_planet, strike)?;
    if let Err(err) = session.submit(&ExecutionContext::new(alice, now), Transition::LaunchAttack(req)) {
        warn!("second launch rejected: {}", err);
    }

    now += 60_000;
    let req = session.ledger.resolve_attack(alice_planet, bob_planet, bob_defense, strike)?;
    let outcome = session.submit(&ExecutionContext::new(bob, now), Transition::ResolveAttack(req))?;
    if let Some(report) = outcome.battle {
        let verdict = if report.defender_won() { "defender held" } else { "attacker broke through" };
        info!("battle score {} -> {} ({})", report.score, verdict, report.winner);
    }
    session.check_roots()?;

    // Bob strikes back, Alice never answers
    let counter = AttackFleet {
        faction: Faction::Collective,
        attacker: bob,
        battleships: 0,
        destroyers: 3,
        carriers: 3,
        launch_timestamp: now,
    };
    let req = session.ledger.launch_attack(bob_planet, alice_planet, counter)?;
    session.submit(&ExecutionContext::new(bob, now), Transition::LaunchAttack(req))?;

    let window = session.machine.config().forfeit_claim_duration;
    let early = now + window / 2;
    let req = session.ledger.claim_forfeit(bob_planet, alice_planet, counter)?;
    if let Err(err) = session.submit(&ExecutionContext::new(bob, early), Transition::ClaimForfeit(req)) {
        warn!("early forfeit rejected: {}", err);
    }

    now += window;
    let req = session.ledger.claim_forfeit(bob_planet, alice_planet, counter)?;
    let outcome = session.submit(&ExecutionContext::new(bob, now), Transition::ClaimForfeit(req))?;
    info!("{} claimed: {}", bob, outcome.event);
    session.check_roots()?;

    info!("=== Final Standings ===");
    for (id, record) in session.ledger.records() {
        info!("planet {} owner {} points {}", id, record.owner, record.points);
    }
    let state = session.machine.state();
    info!("details root:   {}", short_hex(&state.details_root));
    info!("location root:  {}", short_hex(&state.location_nullifier_root));
    info!("player root:    {}", short_hex(&state.player_nullifier_root));

    Ok(())
}
