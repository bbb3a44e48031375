//! Deterministic least-cost path search.
//!
//! Plain Dijkstra over the territory graph. Labels compare by total cost,
//! then step count, then territory id, so equal-cost alternatives always
//! resolve the same way.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rust_decimal::Decimal;

use crate::board::{BoardState, Route, TerritoryId};

/// Finds the cheapest route from `start` to `end`.
///
/// `can_enter(from, to)` gates every edge; `step_cost(to)` is the price of
/// entering a territory. Returns `None` when `end` cannot be reached.
pub fn find_route(
    board: &BoardState,
    start: TerritoryId,
    end: TerritoryId,
    can_enter: impl Fn(TerritoryId, TerritoryId) -> bool,
    step_cost: impl Fn(TerritoryId) -> Decimal,
) -> Option<Route> {
    if start == end {
        return Some(Route::at(board, start));
    }

    let n = board.territories().len();
    let mut best: Vec<Option<(Decimal, usize)>> = vec![None; n];
    let mut prev: Vec<Option<TerritoryId>> = vec![None; n];
    let mut done = vec![false; n];
    let mut heap = BinaryHeap::new();

    best[start.0 as usize] = Some((Decimal::ZERO, 0));
    heap.push(Reverse((Decimal::ZERO, 0usize, start)));

    while let Some(Reverse((cost, steps, here))) = heap.pop() {
        let idx = here.0 as usize;
        if done[idx] {
            continue;
        }
        done[idx] = true;
        if here == end {
            break;
        }

        for &next in &board.territory(here).neighbors {
            let nidx = next.0 as usize;
            if done[nidx] || !can_enter(here, next) {
                continue;
            }
            let label = (cost + step_cost(next), steps + 1);
            let better = match best[nidx] {
                None => true,
                Some(current) => label < current,
            };
            if better {
                best[nidx] = Some(label);
                prev[nidx] = Some(here);
                heap.push(Reverse((label.0, label.1, next)));
            }
        }
    }

    if !done[end.0 as usize] {
        return None;
    }

    let mut steps = Vec::new();
    let mut at = end;
    while at != start {
        steps.push(at);
        at = prev[at.0 as usize]?;
    }
    steps.reverse();
    Route::new(board, start, steps)
}
