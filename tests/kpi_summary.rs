use appt_insights::models::{Bucket, Dimension, LocationService, Record, EMPTY_LABEL};
use appt_insights::stats::{
    best_service_by_location, bottom_by, breakdown, options, rank_pairs, summarize, top_by,
};

#[test]
fn end_to_end_summary() {
    let recs = vec![
        Record::new("2024-01-05", "A", "Web"),
        Record::new("2024-02-10", "B", "Phone"),
        Record::new("2024-02-15", "A", "Web"),
    ];
    let s = summarize(&recs);
    assert_eq!(s.total, 3);
    assert_eq!(s.source.top, "Web");
    assert_eq!(s.source.bottom, "Phone");
    assert_eq!(s.location.top, "A");
    assert_eq!(s.service.top, EMPTY_LABEL);
    assert_eq!(top_by(&recs, Dimension::Source), "Web");
}

#[test]
fn empty_input_yields_zero_and_placeholders() {
    let s = summarize(&[]);
    assert_eq!(s.total, 0);
    for dim in Dimension::ALL {
        assert_eq!(s.ranked(dim).top, "—");
        assert_eq!(s.ranked(dim).bottom, "—");
    }
}

#[test]
fn ties_go_to_the_first_encountered_group() {
    let recs = vec![
        Record::new("2024-01-01", "A", "Phone"),
        Record::new("2024-01-02", "A", "Web"),
        Record::new("2024-01-03", "A", "Web"),
        Record::new("2024-01-04", "A", "Phone"),
    ];
    assert_eq!(top_by(&recs, Dimension::Source), "Phone");
    assert_eq!(bottom_by(&recs, Dimension::Source), "Phone");
}

#[test]
fn service_ranking_ignores_records_without_service() {
    let recs = vec![
        Record::new("2024-01-01", "A", "Web"),
        Record::new("2024-01-02", "A", "Web"),
        Record::new("2024-01-03", "A", "Web").with_service("Cleaning"),
    ];
    assert_eq!(top_by(&recs, Dimension::Service), "Cleaning");
}

#[test]
fn pairs_rank_by_count_then_encounter_order() {
    let recs = vec![
        Record::new("2024-01-01", "A", "Web").with_service("Checkup"),
        Record::new("2024-01-02", "A", "Phone").with_service("X-Ray"),
        Record::new("2024-01-03", "A", "Web").with_service("Checkup"),
        Record::new("2024-01-04", "A", "Phone").with_service("X-Ray"),
        Record::new("2024-01-05", "A", "Web").with_service("X-Ray"),
        Record::new("2024-01-06", "A", "Web"),
        Record::new("2024-01-07", "A", "Referral").with_service("Cleaning"),
        Record::new("2024-01-08", "A", "Referral").with_service("Cleaning"),
        Record::new("2024-01-09", "A", "Referral").with_service("Cleaning"),
    ];
    let ranked = rank_pairs(&recs, None);
    assert_eq!(
        ranked,
        vec![
            Bucket::new("Referral → Cleaning", 3),
            Bucket::new("Web → Checkup", 2),
            Bucket::new("Phone → X-Ray", 2),
            Bucket::new("Web → X-Ray", 1),
        ]
    );
    assert_eq!(rank_pairs(&recs, Some(2)).len(), 2);
}

#[test]
fn breakdown_counts_missing_service_as_unknown() {
    let recs = vec![
        Record::new("2024-01-01", "A", "Web").with_service("Checkup"),
        Record::new("2024-01-02", "B", "Web"),
        Record::new("2024-01-03", "A", "Web").with_service("Checkup"),
    ];
    assert_eq!(
        breakdown(&recs, Dimension::Service),
        vec![Bucket::new("Checkup", 2), Bucket::new("Unknown", 1)]
    );
    assert_eq!(
        breakdown(&recs, Dimension::Location),
        vec![Bucket::new("A", 2), Bucket::new("B", 1)]
    );
}

#[test]
fn best_service_per_location() {
    let recs = vec![
        Record::new("2024-01-01", "North", "Web").with_service("Checkup"),
        Record::new("2024-01-02", "South", "Web").with_service("X-Ray"),
        Record::new("2024-01-03", "North", "Web").with_service("X-Ray"),
        Record::new("2024-01-04", "North", "Web").with_service("X-Ray"),
        Record::new("2024-01-05", "East", "Web"),
    ];
    assert_eq!(
        best_service_by_location(&recs),
        vec![
            LocationService {
                location: "North".into(),
                service: "X-Ray".into(),
                count: 2
            },
            LocationService {
                location: "South".into(),
                service: "X-Ray".into(),
                count: 1
            },
        ]
    );
}

#[test]
fn options_list_distinct_values_and_newest_years_first() {
    let recs = vec![
        Record::new("2023-01-01", "North", "Web").with_service("Checkup"),
        Record::new("2024-01-02", "South", "Phone"),
        Record::new("2022-01-03", "North", "Web").with_service("X-Ray"),
    ];
    let o = options(&recs);
    assert_eq!(o.sources, vec!["Web", "Phone"]);
    assert_eq!(o.locations, vec!["North", "South"]);
    assert_eq!(o.services, vec!["Checkup", "X-Ray"]);
    assert_eq!(o.years, vec![2024, 2023, 2022]);
}
