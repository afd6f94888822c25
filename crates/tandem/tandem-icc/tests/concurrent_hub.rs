//! Multi-threaded tests for the latest-value hub.
//!
//! Several publisher threads hammer one hub while reader threads poll it.
//! Every message encodes `(publisher id, sequence)` in its header counters so
//! readers can check that whatever they observe was really published and that
//! no publisher's values ever appear to go backwards.
//!
//! ```bash
//! cargo test -p tandem-icc --test concurrent_hub
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tandem_events::{Message, MessagePtr};
use tandem_icc::PubSubHub;

const PUBLISHERS: u16 = 4;
const PUBLISHES_EACH: u16 = 5_000;
const READERS: usize = 3;
const CAPACITY: usize = 3;

#[test]
fn concurrent_publishers_and_readers_only_see_published_values() {
    let hub = PubSubHub::<MessagePtr>::new(CAPACITY).expect("valid capacity");
    let publishing = AtomicBool::new(true);

    let reader_results = thread::scope(|s| {
        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let rx = hub.make_receiver();
                let publishing = &publishing;
                s.spawn(move || {
                    // Highest sequence seen per publisher, for the monotonicity check.
                    let mut last_seen = vec![None::<u16>; PUBLISHERS as usize];
                    let mut observed = 0u64;
                    let mut empty = 0u64;

                    while publishing.load(Ordering::Acquire) {
                        let Some(msg) = rx.try_get_latest() else {
                            empty += 1;
                            std::hint::spin_loop();
                            continue;
                        };
                        let publisher = msg.header.measurement_counter;
                        let seq = msg.header.cycle_counter;
                        assert!(publisher < PUBLISHERS, "unknown publisher {publisher}");
                        assert!(seq < PUBLISHES_EACH, "never published seq {seq}");

                        let slot = &mut last_seen[publisher as usize];
                        if let Some(prev) = *slot {
                            assert!(
                                seq >= prev,
                                "publisher {publisher} went backwards: {prev} -> {seq}"
                            );
                        }
                        *slot = Some(seq);
                        observed += 1;
                    }
                    (observed, empty)
                })
            })
            .collect();

        let publishers: Vec<_> = (0..PUBLISHERS)
            .map(|id| {
                let tx = hub.make_publisher();
                s.spawn(move || {
                    for seq in 0..PUBLISHES_EACH {
                        tx.publish(Message::with_counters(seq, id).into_ptr());
                    }
                })
            })
            .collect();

        for p in publishers {
            p.join().expect("publisher panicked");
        }
        publishing.store(false, Ordering::Release);

        readers
            .into_iter()
            .map(|r| r.join().expect("reader panicked"))
            .collect::<Vec<_>>()
    });

    assert_eq!(reader_results.len(), READERS);

    // After every publisher finished, the latest value must be the final
    // publish of one of them.
    let last = hub
        .make_receiver()
        .try_get_latest()
        .expect("something was published");
    assert_eq!(last.header.cycle_counter, PUBLISHES_EACH - 1);

    let snap = hub.debug_snapshot();
    assert!(snap.has_value);
    assert_eq!(snap.write_index, (snap.latest_index + 1) % CAPACITY);
    assert!(snap.slots.iter().all(Option::is_some));
}

/// With a single publisher, once it has finished every reader converges on its
/// final value.
#[test]
fn single_publisher_final_value_is_visible_to_all_readers() {
    let hub = PubSubHub::<MessagePtr>::new(1).expect("valid capacity");

    thread::scope(|s| {
        let tx = hub.make_publisher();
        s.spawn(move || {
            for seq in 0..1_000 {
                tx.publish(Message::with_cycle(seq).into_ptr());
            }
        })
        .join()
        .expect("publisher panicked");

        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let rx = hub.make_receiver();
                s.spawn(move || rx.try_get_latest().map(|m| m.cycle_counter()))
            })
            .collect();

        for r in readers {
            assert_eq!(r.join().expect("reader panicked"), Some(999));
        }
    });
}
