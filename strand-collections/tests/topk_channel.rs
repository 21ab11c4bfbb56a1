//! Top-k selection fed by a producer thread over a channel.

use std::thread;

use crossbeam_channel::{bounded, unbounded};
use strand_collections::{TopK, Want, largest_n, smallest_n};

const PRIORITIES: [u32; 7] = [1, 3, 55, 2, 4441, 15555, 122];

fn spawn_producer(capacity: Option<usize>) -> crossbeam_channel::Receiver<(usize, u32)> {
    let (tx, rx) = match capacity {
        Some(cap) => bounded(cap),
        None => unbounded(),
    };
    thread::spawn(move || {
        for item in PRIORITIES.iter().copied().enumerate() {
            tx.send(item).unwrap();
        }
        // tx dropped here, closing the channel
    });
    rx
}

fn priorities(items: Vec<(usize, u32)>) -> Vec<u32> {
    items.into_iter().map(|(_, p)| p).collect()
}

#[test]
fn largest_from_channel() {
    let rx = spawn_producer(None);
    let top = largest_n(rx, 3).unwrap();
    assert_eq!(priorities(top), vec![15555, 4441, 122]);
}

#[test]
fn smallest_from_rendezvous_channel() {
    // Capacity 0 forces a hand-off per item
    let rx = spawn_producer(Some(0));
    let top = smallest_n(rx, 3).unwrap();
    assert_eq!(priorities(top), vec![1, 2, 3]);
}

#[test]
fn selection_ends_when_channel_closes() {
    let (tx, rx) = unbounded::<(usize, u32)>();
    let producer = thread::spawn(move || {
        for item in PRIORITIES.iter().copied().enumerate() {
            tx.send(item).unwrap();
        }
        tx
    });

    let tx = producer.join().unwrap();
    drop(tx);

    let top = TopK::new(2, Want::Largest).unwrap().select(rx);
    assert_eq!(priorities(top), vec![15555, 4441]);
}

#[test]
fn zero_k_leaves_channel_untouched() {
    let (tx, rx) = unbounded::<(usize, u32)>();
    tx.send((0, 1)).unwrap();

    assert!(largest_n(rx.clone(), 0).is_err());
    assert_eq!(rx.len(), 1);
}
