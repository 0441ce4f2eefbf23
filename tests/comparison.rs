use appt_insights::compare::{compare, growth_percent, source_deltas};
use appt_insights::filter::filter;
use appt_insights::models::{FilterSpec, PeriodPreset, Record};
use chrono::NaiveDate;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn two_months() -> Vec<Record> {
    vec![
        Record::new("2024-01-03", "A", "Web"),
        Record::new("2024-01-09", "A", "Web"),
        Record::new("2024-01-20", "B", "Phone"),
        Record::new("2024-02-01", "A", "Phone"),
        Record::new("2024-02-05", "B", "Phone"),
        Record::new("2024-02-12", "A", "Web"),
        Record::new("2024-02-28", "B", "Referral"),
    ]
}

fn feb() -> FilterSpec {
    FilterSpec::new().between(Some(d("2024-02-01")), Some(d("2024-02-29")))
}

fn jan() -> FilterSpec {
    FilterSpec::new().between(Some(d("2024-01-01")), Some(d("2024-01-31")))
}

#[test]
fn growth_policy_has_three_cases() {
    assert_eq!(growth_percent(0, 0), 0.0);
    assert_eq!(growth_percent(5, 0), 100.0);
    assert_eq!(growth_percent(50, 100), -50.0);
    assert_eq!(growth_percent(150, 100), 50.0);
    assert!(growth_percent(0, 7).is_finite());
}

#[test]
fn compares_totals_and_ranks_sources_within_current_period() {
    let r = compare(&two_months(), &feb(), &jan());
    assert_eq!(r.total_current, 4);
    assert_eq!(r.total_previous, 3);
    assert!((r.growth_percent - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(r.best_source, "Phone");
    assert_eq!(r.worst_source, "Web");
    assert_eq!(r.current.total, 4);
    assert_eq!(r.previous.source.top, "Web");
}

#[test]
fn empty_periods_degrade_to_placeholders() {
    let r = compare(&[], &feb(), &jan());
    assert_eq!(r.total_current, 0);
    assert_eq!(r.growth_percent, 0.0);
    assert_eq!(r.best_source, "—");
    assert_eq!(r.worst_source, "—");
    assert!(r.weekly_current.is_empty());
}

#[test]
fn weekly_series_stay_chronological_over_new_year() {
    let recs = vec![
        Record::new("2024-01-03", "A", "Web"),
        Record::new("2023-12-28", "A", "Web"),
    ];
    let all = FilterSpec::new();
    let r = compare(&recs, &all, &all);
    let keys: Vec<&str> = r.weekly_current.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, vec!["2023-W52", "2024-W01"]);
}

#[test]
fn dimension_filters_apply_to_both_periods() {
    let base = FilterSpec::new().locations(["A"]);
    let (cur, prev) = PeriodPreset::Month.specs(&base, d("2024-02-14")).unwrap();
    let r = compare(&two_months(), &cur, &prev);
    assert_eq!(r.total_current, 2);
    assert_eq!(r.total_previous, 2);
    assert_eq!(r.growth_percent, 0.0);
}

#[test]
fn presets_resolve_current_and_previous_ranges() {
    let (cur, prev) = PeriodPreset::Month.ranges(d("2024-03-31")).unwrap();
    assert_eq!((cur.from, cur.to), (d("2024-03-01"), d("2024-03-31")));
    assert_eq!((prev.from, prev.to), (d("2024-02-01"), d("2024-02-29")));

    let (cur, prev) = PeriodPreset::Quarter.ranges(d("2024-02-10")).unwrap();
    assert_eq!((cur.from, cur.to), (d("2024-01-01"), d("2024-03-31")));
    assert_eq!((prev.from, prev.to), (d("2023-10-01"), d("2023-12-31")));

    let (cur, prev) = PeriodPreset::Year.ranges(d("2024-06-01")).unwrap();
    assert_eq!((cur.from, cur.to), (d("2024-01-01"), d("2024-12-31")));
    assert_eq!((prev.from, prev.to), (d("2023-01-01"), d("2023-12-31")));

    let (_, prev) = PeriodPreset::Month.ranges(d("2024-01-15")).unwrap();
    assert_eq!((prev.from, prev.to), (d("2023-12-01"), d("2023-12-31")));
}

#[test]
fn source_deltas_sort_by_change() {
    let recs = two_months();
    let deltas = source_deltas(&filter(&recs, &feb()), &filter(&recs, &jan()));
    let got: Vec<(&str, i64)> = deltas.iter().map(|d| (d.source.as_str(), d.delta)).collect();
    assert_eq!(got, vec![("Phone", 1), ("Referral", 1), ("Web", -1)]);
}
