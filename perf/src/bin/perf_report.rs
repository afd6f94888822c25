use std::hint::black_box;
use std::mem::{align_of, size_of};
use std::thread;
use std::time::{Duration, Instant};

use tandem_events::{Message, MessagePtr, SignalHeader};
use tandem_icc::PubSubHub;
use tandem_perf::*;
use tandem_phase::PhaseBarrier;

const BATCHES: usize = 2_000;
const BATCH_SIZE: usize = 100;
const WARMUP: usize = 50;
const HANDOFF_CYCLES: usize = 20_000;

fn main() {
    let mut results: Vec<BenchResult> = Vec::new();

    section_header("Memory Layout");
    println!(
        "  {:<20} size={:>5}  align={}",
        "SignalHeader",
        size_of::<SignalHeader>(),
        align_of::<SignalHeader>()
    );
    println!(
        "  {:<20} size={:>5}  align={}",
        "Message",
        size_of::<Message>(),
        align_of::<Message>()
    );

    section_header("Latest-Value Buffer (single thread)");
    print_table_header();
    for &cap in &[1usize, 3, 16] {
        section_buffer(cap, &mut results);
    }

    section_header("Phase Barrier Handoff (two threads)");
    print_table_header();
    if let Some(r) = section_handoff() {
        print_result_row(&r);
        println!(
            "\n  median handoff: {}",
            format_ns(r.stats.p50 as f64)
        );
        results.push(r);
    }

    println!("\n  {} measurements", results.len());
}

fn section_buffer(cap: usize, results: &mut Vec<BenchResult>) {
    let Ok(hub) = PubSubHub::<MessagePtr>::new(cap) else {
        eprintln!("  skipping capacity {cap}: hub rejected it");
        return;
    };
    let tx = hub.make_publisher();
    let rx = hub.make_receiver();
    let msg = make_test_message(1);

    let runs = [
        measure_batched(&format!("publish (cap {cap})"), BATCHES, BATCH_SIZE, WARMUP, || {
            tx.publish(black_box(msg.clone()))
        }),
        measure_batched(
            &format!("try_get_latest (cap {cap})"),
            BATCHES,
            BATCH_SIZE,
            WARMUP,
            || {
                black_box(rx.try_get_latest());
            },
        ),
    ];
    for r in runs.into_iter().flatten() {
        print_result_row(&r);
        results.push(r);
    }
}

/// Time from one participant's `done` to the other's `wait_turn` returning,
/// sampled once per phase.
fn section_handoff() -> Option<BenchResult> {
    let barrier = PhaseBarrier::new(vec![vec![0u8], vec![1u8]], Duration::from_secs(5)).ok()?;
    let hub = PubSubHub::<Instant>::new(1).ok()?;

    let mut samples = thread::scope(|s| {
        let echo = s.spawn(|| {
            let rx = hub.make_receiver();
            let mut samples = Vec::with_capacity(HANDOFF_CYCLES);
            for _ in 0..HANDOFF_CYCLES {
                if barrier.wait_turn(1).is_err() {
                    break;
                }
                if let Some(sent) = rx.try_get_latest() {
                    samples.push(sent.elapsed().as_nanos() as u64);
                }
                if barrier.done(1).is_err() {
                    break;
                }
            }
            samples
        });

        let tx = hub.make_publisher();
        for _ in 0..HANDOFF_CYCLES {
            if barrier.wait_turn(0).is_err() {
                break;
            }
            tx.publish(Instant::now());
            if barrier.done(0).is_err() {
                break;
            }
        }
        echo.join().unwrap_or_default()
    });

    Some(BenchResult {
        name: "done -> wait_turn".to_string(),
        unit: "ns",
        stats: compute_stats(&mut samples)?,
    })
}
