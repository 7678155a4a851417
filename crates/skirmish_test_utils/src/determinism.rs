//! Replay harness.
//!
//! A match is a pure function of its config and its command stream. The
//! helpers here replay the same match several times, on one thread or
//! many, and compare [`Simulation::state_hash`] values. A mismatch means
//! something leaked into the simulation that is not part of its input:
//! float math, unordered iteration, or an unseeded random draw.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use skirmish_core::commands::{Command, RejectedCommand};
use skirmish_core::factions::Faction;
use skirmish_core::simulation::Simulation;
use skirmish_core::snapshot::WorldSnapshot;

/// Timed command stream: `(tick, faction, command)`, sorted by tick.
pub type CommandScript = Vec<(u64, Faction, Command)>;

/// Final hashes of repeated replays of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRuns {
    /// One final hash per replay, in run order.
    pub hashes: Vec<u64>,
    /// Ticks each replay ran.
    pub ticks: u64,
}

impl HashRuns {
    /// Every replay ended in the same state.
    #[must_use]
    pub fn agree(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Distinct final hashes, ascending.
    #[must_use]
    pub fn distinct(&self) -> Vec<u64> {
        let mut distinct = self.hashes.clone();
        distinct.sort_unstable();
        distinct.dedup();
        distinct
    }

    /// # Panics
    ///
    /// Panics listing every hash if the replays disagree.
    pub fn assert_agree(&self) {
        assert!(
            self.agree(),
            "{} replays of {} ticks ended in {} different states: {:?}",
            self.hashes.len(),
            self.ticks,
            self.distinct().len(),
            self.hashes
        );
    }
}

/// Build `runs` fresh states with `setup`, step each `ticks` times, and
/// collect `hash` of the result.
///
/// ```
/// use skirmish_test_utils::determinism::verify_determinism;
///
/// verify_determinism(3, 10, || 0u64, |n| *n += 1, |n| *n).assert_agree();
/// ```
pub fn verify_determinism<S>(
    runs: usize,
    ticks: u64,
    setup: impl Fn() -> S,
    step: impl Fn(&mut S),
    hash: impl Fn(&S) -> u64,
) -> HashRuns {
    let hashes = (0..runs)
        .map(|_| {
            let mut state = setup();
            (0..ticks).for_each(|_| step(&mut state));
            hash(&state)
        })
        .collect();
    HashRuns { hashes, ticks }
}

/// Two replays of the match from `setup` end in the same state.
pub fn verify_simulation_determinism(setup: impl Fn() -> Simulation, ticks: u64) -> bool {
    verify_determinism(
        2,
        ticks,
        setup,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    )
    .agree()
}

/// Replay the match from `setup` on `threads` scoped threads at once.
///
/// # Panics
///
/// Panics if a replay thread panics.
pub fn run_parallel_simulations(
    setup: impl Fn() -> Simulation + Sync,
    threads: usize,
    ticks: u64,
) -> HashRuns {
    let setup = &setup;
    let hashes = thread::scope(|scope| {
        let replays: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(move || {
                    let mut sim = setup();
                    sim.run(ticks);
                    sim.state_hash()
                })
            })
            .collect();
        replays
            .into_iter()
            .map(|replay| replay.join().expect("replay thread panicked"))
            .collect()
    });
    HashRuns { hashes, ticks }
}

/// Run `ticks` ticks, feeding `script` in at the scheduled ticks, and
/// collect every rejection. Entries scheduled before the current tick are
/// skipped, so one script can be played in several calls.
pub fn play_script(
    sim: &mut Simulation,
    script: &[(u64, Faction, Command)],
    ticks: u64,
) -> Vec<RejectedCommand> {
    let start = sim.get_tick();
    let mut pending = script.iter().skip_while(|(at, _, _)| *at < start).peekable();
    let mut rejected = Vec::new();
    for _ in 0..ticks {
        let now = sim.get_tick();
        while let Some((_, faction, command)) = pending.next_if(|(at, _, _)| *at <= now) {
            sim.submit(*faction, command.clone());
        }
        rejected.extend(sim.tick().rejected);
    }
    rejected
}

/// State hash after every tick, starting with the initial state.
pub fn hash_trace(sim: &mut Simulation, ticks: u64) -> Vec<u64> {
    let mut trace = Vec::with_capacity(ticks as usize + 1);
    trace.push(sim.state_hash());
    for _ in 0..ticks {
        sim.tick();
        trace.push(sim.state_hash());
    }
    trace
}

/// First tick at which two replays of `setup` differ, or `None`.
pub fn find_first_divergence(setup: impl Fn() -> Simulation, ticks: u64) -> Option<u64> {
    let a = hash_trace(&mut setup(), ticks);
    let b = hash_trace(&mut setup(), ticks);
    let tick = a.iter().zip(&b).position(|(x, y)| x != y)? as u64;
    tracing::warn!(tick, left = a[tick as usize], right = b[tick as usize], "Replays diverged");
    Some(tick)
}

/// The snapshot taken after `ticks` ticks survives both encodings.
pub fn verify_snapshot_encoding(setup: impl Fn() -> Simulation, ticks: u64) -> bool {
    let mut sim = setup();
    sim.run(ticks);
    let snapshot = sim.snapshot();

    let via_json = snapshot.to_json().and_then(|text| WorldSnapshot::from_json(&text));
    let via_bincode = snapshot.to_bytes().and_then(|bytes| WorldSnapshot::from_bytes(&bytes));
    via_json.is_ok_and(|s| s == snapshot) && via_bincode.is_ok_and(|s| s == snapshot)
}

/// `DefaultHasher` digest of any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest generators for commands aimed at the standard layout.
///
/// Ids are drawn from the low range a standard match allocates early, so
/// scripts mix live ids, ids of the wrong kind or side, and ids that never
/// existed.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::commands::Command;
    use skirmish_core::components::{BuildingKind, EntityId, UnitKind};
    use skirmish_core::factions::Faction;
    use skirmish_core::math::Vec2Fixed;

    use super::CommandScript;

    /// A point on the 2000x2000 field, or just off its edge.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (-50i32..2050, -50i32..2050).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// Either side.
    pub fn arb_faction() -> impl Strategy<Value = Faction> {
        prop_oneof![Just(Faction::Player), Just(Faction::Opponent)]
    }

    /// Any unit kind.
    pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
        prop::sample::select(UnitKind::ALL.to_vec())
    }

    /// Any building kind.
    pub fn arb_building_kind() -> impl Strategy<Value = BuildingKind> {
        prop::sample::select(BuildingKind::ALL.to_vec())
    }

    /// An id below 80.
    pub fn arb_entity_id() -> impl Strategy<Value = EntityId> {
        0u64..80
    }

    /// Zero to three ids.
    pub fn arb_selection() -> impl Strategy<Value = Vec<EntityId>> {
        proptest::collection::vec(arb_entity_id(), 0..4)
    }

    /// Any command variant.
    pub fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            (arb_selection(), arb_position()).prop_map(|(units, to)| Command::Move { units, to }),
            (arb_selection(), arb_position()).prop_map(|(units, to)| Command::AttackMove { units, to }),
            (arb_selection(), arb_entity_id()).prop_map(|(units, target)| Command::Attack { units, target }),
            (arb_selection(), arb_entity_id()).prop_map(|(workers, node)| Command::Gather { workers, node }),
            (arb_entity_id(), arb_unit_kind()).prop_map(|(building, unit)| Command::Enqueue { building, unit }),
            (arb_entity_id(), arb_building_kind(), arb_position())
                .prop_map(|(worker, kind, at)| Command::Build { worker, kind, at }),
            (arb_entity_id(), arb_entity_id()).prop_map(|(worker, site)| Command::Construct { worker, site }),
            (arb_entity_id(), arb_entity_id()).prop_map(|(worker, target)| Command::Repair { worker, target }),
            arb_selection().prop_map(|units| Command::Stop { units }),
        ]
    }

    /// Up to `max_len` commands spread over `0..max_tick`, sorted by tick.
    pub fn arb_command_script(max_len: usize, max_tick: u64) -> impl Strategy<Value = CommandScript> {
        proptest::collection::vec((0..max_tick, arb_faction(), arb_command()), 0..max_len).prop_map(
            |mut script| {
                script.sort_by_key(|(tick, _, _)| *tick);
                script
            },
        )
    }
}
