use cadence_core::compositor::Compositor;
use cadence_core::exclusions::ExclusionSet;
use cadence_core::models::{
    Frequency, Override, Recurrence, RecurrenceBound, Series, TimeWindow,
};
use cadence_core::overrides::OverrideIndex;
use cadence_core::recurrence::RecurrenceEvaluator;
use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap()
}

fn create_test_series(frequency: Frequency, count: u32) -> Series {
    Series {
        id: Uuid::now_v7(),
        title: "Benchmark Series".to_string(),
        description: None,
        start: origin(),
        end: origin() + Duration::hours(1),
        recurrence: Recurrence::repeating(frequency, RecurrenceBound::Count(count)),
        exclusions: ExclusionSet::new(),
        owner_id: Uuid::now_v7(),
        revision: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn whole_range() -> TimeWindow {
    TimeWindow::new(origin(), origin() + Duration::days(365 * 40)).unwrap()
}

fn bench_anchor_expansion(c: &mut Criterion) {
    let evaluator = RecurrenceEvaluator::default();
    let mut group = c.benchmark_group("anchor_expansion");

    for (name, frequency) in [
        ("daily", Frequency::Daily),
        ("weekly", Frequency::Weekly),
        ("monthly", Frequency::Monthly),
    ] {
        let series = create_test_series(frequency, 365);
        group.bench_with_input(BenchmarkId::from_parameter(name), &series, |b, series| {
            b.iter(|| evaluator.anchors_for(black_box(series), whole_range()).count())
        });
    }
    group.finish();
}

fn bench_narrow_window(c: &mut Criterion) {
    let evaluator = RecurrenceEvaluator::default();
    let series = create_test_series(Frequency::Daily, 365);
    let late = origin() + Duration::days(300);
    let window = TimeWindow::new(late, late + Duration::days(7)).unwrap();

    c.bench_function("narrow_window_late_in_series", |b| {
        b.iter(|| evaluator.anchors_for(black_box(&series), black_box(window)).count())
    });
}

fn bench_composition(c: &mut Criterion) {
    let compositor = Compositor::default();
    let mut group = c.benchmark_group("composition");

    for series_count in [1usize, 10, 50] {
        let mut series: Vec<Series> = (0..series_count)
            .map(|_| create_test_series(Frequency::Daily, 90))
            .collect();
        let mut overrides = OverrideIndex::new();

        // every seventh occurrence is moved by two hours
        for item in &mut series {
            for day in (0..90).step_by(7) {
                let anchor = item.start + Duration::days(day);
                item.exclusions.insert(anchor);
                let start = anchor + Duration::hours(2);
                overrides.insert(Override {
                    id: Uuid::now_v7(),
                    series_id: item.id,
                    anchor,
                    title: "Moved".to_string(),
                    description: None,
                    start,
                    end: start + Duration::hours(1),
                    owner_id: item.owner_id,
                    created_at: origin(),
                    updated_at: origin(),
                });
            }
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(series_count),
            &series,
            |b, series| {
                b.iter(|| compositor.compose(black_box(series), &overrides, whole_range()).len())
            },
        );
    }
    group.finish();
}

fn bench_exclusion_payload(c: &mut Criterion) {
    let set: ExclusionSet = (0..365)
        .map(|day| origin() + Duration::days(day))
        .collect();
    let payload = set.encode();

    c.bench_function("exclusion_decode_365", |b| {
        b.iter(|| ExclusionSet::decode(black_box(Some(payload.as_str()))).len())
    });
}

criterion_group!(
    benches,
    bench_anchor_expansion,
    bench_narrow_window,
    bench_composition,
    bench_exclusion_payload
);
criterion_main!(benches);
