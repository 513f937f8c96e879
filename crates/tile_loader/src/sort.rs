//! Stable sort for job batches.
//!
//! Batches are small and usually close to ordered already (the viewport builds
//! them ring by ring), so a binary insertion sort over the tail of the longest
//! leading run beats a general-purpose sort here.

use std::cmp::Ordering;

/// Sort `items` ascending by `key`. Equal keys keep their relative order.
pub fn sort_by_key_f32<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> f32,
{
    if items.len() < 2 {
        return;
    }
    let run = leading_run(items, &key);
    insert_tail(items, run, &key);
}

/// Length of the run at the start of `items`. A strictly descending run is
/// reversed in place so the returned prefix is always ascending.
fn leading_run<T, F>(items: &mut [T], key: &F) -> usize
where
    F: Fn(&T) -> f32,
{
    let n = items.len();
    let less = |a: &T, b: &T| key(a).total_cmp(&key(b)) == Ordering::Less;

    let mut end = 2;
    if less(&items[1], &items[0]) {
        // Strict so that reversing cannot swap equal elements.
        while end < n && less(&items[end], &items[end - 1]) {
            end += 1;
        }
        items[..end].reverse();
    } else {
        while end < n && !less(&items[end], &items[end - 1]) {
            end += 1;
        }
    }
    end
}

fn insert_tail<T, F>(items: &mut [T], sorted: usize, key: &F)
where
    F: Fn(&T) -> f32,
{
    for i in sorted..items.len() {
        let pivot = key(&items[i]);
        let pos = items[..i].partition_point(|x| key(x).total_cmp(&pivot) != Ordering::Greater);
        items[pos..=i].rotate_right(1);
    }
}
