use criterion::{black_box, criterion_group, criterion_main, Criterion};

use landfall::board::{BoardState, DependentMap, Domain, PlayerId, Route, TerritoryId, UnitId, UnitType};
use landfall::config::RulesOptions;
use landfall::filter::{filter_movable, MoveContext, MoveType};
use landfall::pathing::{RouteCache, RouteKey, RouteRequest, RouteResolver};
use landfall::selection::{AcceptDefaults, ClickEvent, MoveEnv, SelectionMachine};
use landfall::transport::{exact_fit, plan_load};

const SIDE: usize = 12;

/// A SIDE x SIDE land grid with a coastal sea column on the right, a
/// scattering of enemy stacks, and a stack of armour in the top left.
struct Map {
    board: BoardState,
    me: PlayerId,
    cells: Vec<TerritoryId>,
    sea: Vec<TerritoryId>,
    stack: Vec<UnitId>,
}

fn build_map() -> Map {
    let mut board = BoardState::new();
    let me = board.add_player("Me");
    let enemy = board.add_player("Enemy");
    let cells: Vec<TerritoryId> = (0..SIDE * SIDE)
        .map(|i| board.add_territory(&format!("L{}", i), false))
        .collect();
    let sea: Vec<TerritoryId> = (0..SIDE).map(|r| board.add_territory(&format!("S{}", r), true)).collect();

    for r in 0..SIDE {
        for c in 0..SIDE {
            let here = cells[r * SIDE + c];
            board.set_owner(here, Some(if (r + c) % 7 == 3 { enemy } else { me }));
            if c + 1 < SIDE {
                board.connect(here, cells[r * SIDE + c + 1]);
            }
            if r + 1 < SIDE {
                board.connect(here, cells[(r + 1) * SIDE + c]);
            }
        }
        board.connect(cells[r * SIDE + SIDE - 1], sea[r]);
        if r + 1 < SIDE {
            board.connect(sea[r], sea[r + 1]);
        }
    }

    let infantry = board.add_unit_type(UnitType::new("infantry", Domain::Land, 1).with_transport_cost(2));
    let armour = board.add_unit_type(UnitType::new("armour", Domain::Land, 8).with_transport_cost(3));
    let fighter = board.add_unit_type(UnitType::new("fighter", Domain::Air, 10));
    let transport = board.add_unit_type(UnitType::new("transport", Domain::Sea, 2).with_capacity(5));

    for i in (5..SIDE * SIDE).step_by(11) {
        board.place_unit(infantry, enemy, cells[i]);
    }
    let mut stack = Vec::new();
    for _ in 0..6 {
        stack.push(board.place_unit(armour, me, cells[0]));
    }
    for _ in 0..2 {
        stack.push(board.place_unit(fighter, me, cells[0]));
    }
    for _ in 0..8 {
        board.place_unit(transport, me, sea[0]);
    }
    for _ in 0..10 {
        board.place_unit(infantry, me, cells[SIDE - 1]);
    }

    Map { board, me, cells, sea, stack }
}

fn bench_best_route(c: &mut Criterion) {
    let map = build_map();
    let options = RulesOptions::default();
    let resolver = RouteResolver::with_configured_policy(&map.board, &options);
    let request = RouteRequest { player: map.me, units: &map.stack, non_combat: false, skip_airborne_check: false };
    let end = map.cells[SIDE * SIDE - 1];
    c.bench_function("best_route_corner_to_corner", |b| {
        b.iter(|| resolver.best_route(black_box(map.cells[0]), black_box(end), &request))
    });
}

fn bench_waypoint_route(c: &mut Criterion) {
    let map = build_map();
    let options = RulesOptions::default();
    let resolver = RouteResolver::with_configured_policy(&map.board, &options);
    let request = RouteRequest { player: map.me, units: &map.stack, non_combat: false, skip_airborne_check: false };
    let waypoints = [map.cells[SIDE - 1], map.cells[SIDE * (SIDE - 1)]];
    let end = map.cells[SIDE * SIDE - 1];
    c.bench_function("resolve_route_two_waypoints", |b| {
        b.iter(|| resolver.resolve_route(map.cells[0], end, &request, black_box(&waypoints)))
    });
}

fn bench_route_cache_hit(c: &mut Criterion) {
    let map = build_map();
    let options = RulesOptions::default();
    let resolver = RouteResolver::with_configured_policy(&map.board, &options);
    let request = RouteRequest { player: map.me, units: &map.stack, non_combat: false, skip_airborne_check: false };
    let end = map.cells[SIDE * SIDE - 1];
    let mut cache = RouteCache::new();
    c.bench_function("route_cache_hit", |b| {
        b.iter(|| {
            let key = RouteKey::new(map.cells[0], end, &map.stack, &[]);
            cache.get_or_resolve(key, || resolver.best_route(map.cells[0], end, &request))
        })
    });
}

fn bench_filter(c: &mut Criterion) {
    let map = build_map();
    let deps = DependentMap::new();
    let ctx = MoveContext {
        player: map.me,
        non_combat: false,
        edit_mode: false,
        selectable_zero_movement_units: false,
        move_type: MoveType::Default,
        prior_moves: &[],
        dependents: &deps,
    };
    let steps: Vec<TerritoryId> = (1..SIDE).map(|c| map.cells[c]).collect();
    let route = Route::new(&map.board, map.cells[0], steps).unwrap();
    c.bench_function("filter_movable_stack", |b| {
        b.iter(|| filter_movable(&map.board, black_box(&map.stack), &route, &ctx))
    });
}

fn bench_plan_load(c: &mut Criterion) {
    let map = build_map();
    let route = Route::new(&map.board, map.cells[SIDE - 1], vec![map.sea[0]]).unwrap();
    let infantry: Vec<UnitId> = map.board.units_in(map.cells[SIDE - 1]).to_vec();
    let deps = DependentMap::new();
    c.bench_function("plan_load_ten_infantry", |b| {
        b.iter(|| plan_load(&map.board, &route, map.me, black_box(&infantry), true, false, &deps))
    });
}

fn bench_exact_fit(c: &mut Criterion) {
    let map = build_map();
    let infantry: Vec<UnitId> = map.board.units_in(map.cells[SIDE - 1]).to_vec();
    let carriers: Vec<UnitId> = map.board.units_in(map.sea[0]).to_vec();
    c.bench_function("exact_fit_ten_onto_eight", |b| {
        b.iter(|| exact_fit(&map.board, black_box(&infantry), black_box(&carriers)))
    });
}

fn bench_hover_sweep(c: &mut Criterion) {
    let map = build_map();
    let options = RulesOptions::default();
    let env = MoveEnv::new(&map.board, &options, map.me);
    let mut machine = SelectionMachine::new();
    machine.click(&env, &ClickEvent::left(map.cells[0]).on_units(&map.stack).with_shift(), &mut AcceptDefaults);
    c.bench_function("hover_sweep_first_row", |b| {
        b.iter(|| {
            for &t in &map.cells[1..SIDE] {
                machine.invalidate_routes();
                machine.hover(&env, black_box(t));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_best_route,
    bench_waypoint_route,
    bench_route_cache_hit,
    bench_filter,
    bench_plan_load,
    bench_exact_fit,
    bench_hover_sweep,
);
criterion_main!(benches);
