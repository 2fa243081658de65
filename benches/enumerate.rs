//! Benchmarks for candidate enumeration and search.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use build_forge::{
    compute::search::{
        BuildSearch, PageConstraints, expand_modifier_sets, item_combinations, level_permutations,
    },
    schema::{Catalog, CatalogProvider, EmblemOptions, EmblemPick, LevelSpec, SearchOptions},
};

fn bench_level_permutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_permutations");

    for size in [3, 5, 7] {
        let pool: Vec<u8> = (0..size).map(|i| 10 + (i % 3) as u8 * 10).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &pool, |b, pool| {
            b.iter(|| level_permutations(black_box(pool)));
        });
    }

    group.finish();
}

fn bench_item_combinations(c: &mut Criterion) {
    let catalog = Catalog::builtin();
    let pool: Vec<_> = catalog.items().iter().collect();

    c.bench_function("item_combinations", |b| {
        b.iter(|| item_combinations(&[], black_box(&pool), 20));
    });
}

fn bench_modifier_pages(c: &mut Criterion) {
    let mut group = c.benchmark_group("modifier_pages");
    let catalog = Catalog::builtin();

    for width in [3, 5, 7] {
        let palette: Vec<_> = catalog
            .modifiers()
            .iter()
            .take(width)
            .map(|m| (m, 10))
            .collect();
        let constraints = PageConstraints {
            min_family: vec![("yellow".to_string(), 2)],
            min_stat: Vec::new(),
        };

        group.bench_with_input(BenchmarkId::from_parameter(width), &palette, |b, palette| {
            b.iter(|| expand_modifier_sets(black_box(palette), &constraints));
        });
    }

    group.finish();
}

fn bench_ranked_search(c: &mut Criterion) {
    let catalog = Catalog::builtin();
    let search = BuildSearch::standard(&catalog);

    let mut options = SearchOptions::new("Cramorant");
    options.levels = LevelSpec::Text("5-15".to_string());
    options.emblems = EmblemOptions::Search {
        palette: ["SparkOrb", "LeafBlade", "GlimmerDust", "EmberScale"]
            .into_iter()
            .map(|name| EmblemPick::new(name, 6))
            .collect(),
        min_family: Default::default(),
        min_stat: Default::default(),
    };
    options.sort = vec!["dps".to_string(), "ehp".to_string()];

    c.bench_function("ranked_emblem_search", |b| {
        b.iter(|| search.run(black_box(&options)));
    });
}

criterion_group!(
    benches,
    bench_level_permutations,
    bench_item_combinations,
    bench_modifier_pages,
    bench_ranked_search
);
criterion_main!(benches);
