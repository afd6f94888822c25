//! Threaded tests for the phase barrier.
//!
//! Each participant runs on its own OS thread and follows the
//! `wait_turn -> work -> done` loop. The work step appends to a shared log, so
//! the test can check afterwards that phases never overlapped.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tandem_phase::{PhaseBarrier, PhaseError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Role {
    Producer,
    A,
    B,
    C,
}

const CYCLES: usize = 50;

fn run_participant(fc: &PhaseBarrier<Role>, role: Role, turns: usize, log: &Mutex<Vec<Role>>) {
    for _ in 0..turns {
        fc.wait_turn(role).expect("turn should come before the timeout");
        log.lock().unwrap().push(role);
        fc.done(role).expect("participant follows the protocol");
    }
}

/// Phases `[Producer] -> [A, B] -> [C]`: in the resulting log every cycle must
/// read `Producer, {A, B in any order}, C`.
#[test]
fn phases_never_overlap_across_threads() {
    let fc = PhaseBarrier::new(
        vec![vec![Role::Producer], vec![Role::A, Role::B], vec![Role::C]],
        Duration::from_secs(5),
    )
    .unwrap();
    let log = Mutex::new(Vec::new());

    thread::scope(|s| {
        // Spawn in reverse phase order so late phases are already waiting.
        for role in [Role::C, Role::B, Role::A, Role::Producer] {
            let (fc, log) = (&fc, &log);
            s.spawn(move || run_participant(fc, role, CYCLES, log));
        }
    });

    let log = log.into_inner().unwrap();
    assert_eq!(log.len(), CYCLES * 4);
    for (cycle, chunk) in log.chunks(4).enumerate() {
        assert_eq!(chunk[0], Role::Producer, "cycle {cycle}: {chunk:?}");
        let mut middle = [chunk[1], chunk[2]];
        middle.sort_by_key(|r| *r as u8);
        assert_eq!(middle, [Role::A, Role::B], "cycle {cycle}: {chunk:?}");
        assert_eq!(chunk[3], Role::C, "cycle {cycle}: {chunk:?}");
    }

    let state = fc.state();
    assert_eq!(state.phase, 0);
    assert_eq!(state.cycles, CYCLES as u64);
}

/// A participant listed in every phase takes one turn per phase.
#[test]
fn producer_active_in_every_phase() {
    let fc = PhaseBarrier::new(
        vec![vec![Role::Producer, Role::A], vec![Role::Producer, Role::B]],
        Duration::from_secs(5),
    )
    .unwrap();
    let log = Mutex::new(Vec::new());

    thread::scope(|s| {
        let producer_turns = CYCLES * fc.turns_per_cycle(Role::Producer);
        let (fc_ref, log_ref) = (&fc, &log);
        s.spawn(move || run_participant(fc_ref, Role::Producer, producer_turns, log_ref));
        s.spawn(move || run_participant(fc_ref, Role::A, CYCLES, log_ref));
        s.spawn(move || run_participant(fc_ref, Role::B, CYCLES, log_ref));
    });

    let log = log.into_inner().unwrap();
    let producer = log.iter().filter(|r| **r == Role::Producer).count();
    assert_eq!(producer, CYCLES * 2);
    assert_eq!(fc.state().cycles, CYCLES as u64);
}

/// A waiter blocked on a later phase is woken as soon as the phase advances.
#[test]
fn waiter_is_woken_by_phase_advance() {
    let fc = PhaseBarrier::new(vec![vec![Role::A], vec![Role::C]], Duration::from_secs(5)).unwrap();

    thread::scope(|s| {
        let waiter = s.spawn(|| {
            let started = Instant::now();
            fc.wait_turn(Role::C).map(|()| started.elapsed())
        });

        thread::sleep(Duration::from_millis(20));
        fc.done(Role::A).unwrap();

        let waited = waiter.join().unwrap().expect("C gets its turn");
        assert!(waited < Duration::from_secs(5));
    });
}

/// When a peer never reports, everyone stuck behind it times out with the
/// phase index at which the cycle stalled.
#[test]
fn stalled_peer_makes_waiters_time_out() {
    let timeout = Duration::from_millis(80);
    let fc = PhaseBarrier::new(vec![vec![Role::A, Role::B], vec![Role::C]], timeout).unwrap();

    // A reports, B never does.
    fc.wait_turn(Role::A).unwrap();
    fc.done(Role::A).unwrap();

    let err = thread::scope(|s| s.spawn(|| fc.wait_turn(Role::C)).join().unwrap()).unwrap_err();
    match err {
        PhaseError::Timeout { id, phase, waited } => {
            assert_eq!(id, Role::C);
            assert_eq!(phase, 0);
            assert!(waited >= timeout);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}
