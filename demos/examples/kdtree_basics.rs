// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trickle Index k-d tree basics: build, linearize coarse-to-fine, and query neighbors.
//!
//! Run:
//! - `cargo run -p trickle_demos --example kdtree_basics`

use trickle_index::KdTree;

fn main() {
    // A 4x4 lattice of labeled points.
    let points: Vec<(char, [f64; 2])> = (0..16_u8)
        .map(|i| {
            let label = char::from(b'a' + i);
            (label, [f64::from(i % 4) * 10.0, f64::from(i / 4) * 10.0])
        })
        .collect();

    let tree = KdTree::from_items(points, |(_, p)| *p);
    println!("tree: len={} depth={}", tree.len(), tree.depth());

    // Breadth-first order: each prefix is a coarse sample of the whole set.
    let order = tree.linearize();
    let coarse: Vec<char> = order.iter().take(3).map(|(c, _)| *c).collect();
    println!("first layers: {:?}", coarse);
    assert_eq!(order.len(), 16);

    // Three nearest to (12, 12) within squared distance 200.
    let hits = tree.nearest([12.0, 12.0], 3, 200.0);
    for ((label, p), d2) in &hits {
        println!("  {label} at {:?}, d2={d2}", p);
    }
    assert_eq!(hits[0].0.0, 'f');
    assert_eq!(hits[0].1, 8.0);
}
