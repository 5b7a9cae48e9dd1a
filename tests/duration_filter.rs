//! Property and scenario tests for the `Assessment Length:` grammar.

use assessrec::search::parse_duration_filter;
use assessrec::DurationFilter;
use proptest::prelude::*;

fn any_filter() -> impl Strategy<Value = DurationFilter> {
    prop_oneof![
        any::<u32>().prop_map(DurationFilter::Exact),
        any::<u32>().prop_map(DurationFilter::AtLeast),
        any::<u32>().prop_map(DurationFilter::AtMost),
        (any::<u32>(), any::<u32>()).prop_map(|(min, max)| DurationFilter::Range { min, max }),
    ]
}

proptest! {
    #[test]
    fn parse_never_panics(text in "\\PC*") {
        let _ = parse_duration_filter(&text);
    }

    #[test]
    fn constraint_line_is_recognized_inside_refined_text(
        filter in any_filter(),
        prefix in "[A-Za-z:,. \n]{0,40}",
        suffix in "(\n[A-Za-z ]{0,20}){0,3}",
    ) {
        let line = filter.constraint_line().unwrap();
        let text = format!("{prefix}\n{line}{suffix}");
        prop_assert_eq!(DurationFilter::parse(&text), filter);
    }

    #[test]
    fn missing_length_only_matches_no_filter(filter in any_filter()) {
        prop_assert!(!filter.matches(None));
        prop_assert!(DurationFilter::None.matches(None));
    }

    #[test]
    fn bounds_agree_with_comparisons(n in any::<u32>(), v in any::<u32>()) {
        prop_assert_eq!(DurationFilter::AtMost(n).matches(Some(v)), v <= n);
        prop_assert_eq!(DurationFilter::AtLeast(n).matches(Some(v)), v >= n);
        prop_assert_eq!(DurationFilter::Exact(n).matches(Some(v)), v == n);
    }

    #[test]
    fn range_is_closed_interval(a in 0u32..500, b in 0u32..500, v in 0u32..600) {
        let filter = DurationFilter::Range { min: a, max: b };
        prop_assert_eq!(filter.matches(Some(v)), a <= v && v <= b);
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_operator_forms() {
    assert_eq!(DurationFilter::parse("Assessment Length: <=60"), DurationFilter::AtMost(60));
    assert_eq!(DurationFilter::parse("Assessment Length: >=30"), DurationFilter::AtLeast(30));
    assert_eq!(
        DurationFilter::parse("Assessment Length: 30-40"),
        DurationFilter::Range { min: 30, max: 40 }
    );
    assert_eq!(DurationFilter::parse("Assessment Length: 17"), DurationFilter::Exact(17));
}

#[test]
fn test_operator_ignores_second_number() {
    assert_eq!(DurationFilter::parse("Assessment Length: <=30-40"), DurationFilter::AtMost(30));
}

#[test]
fn test_no_match_cases() {
    for text in [
        "",
        "Name: Java",
        "Assessment Length:",
        "Assessment Length: about an hour",
        "Assessment Length: <= 60",
        "assessment length: 60",
    ] {
        assert_eq!(DurationFilter::parse(text), DurationFilter::None, "input: {text:?}");
    }
}

#[test]
fn test_oversized_limit_keeps_filter_active() {
    let filter = DurationFilter::parse("Name: Java\nAssessment Length: <=99999999999");
    assert_eq!(filter, DurationFilter::AtMost(u32::MAX));
    assert!(!filter.matches(None));
    assert!(filter.matches(Some(45)));

    let exact = DurationFilter::parse("Assessment Length: 99999999999");
    assert_eq!(exact, DurationFilter::Exact(u32::MAX));
    assert!(!exact.matches(Some(45)));
}

#[test]
fn test_first_valid_occurrence_wins() {
    let text = "Assessment Length: unknown\nAssessment Length: 45\nAssessment Length: <=10";
    assert_eq!(DurationFilter::parse(text), DurationFilter::Exact(45));
}

#[test]
fn test_dangling_dash_is_exact() {
    assert_eq!(DurationFilter::parse("Assessment Length: 30- minutes"), DurationFilter::Exact(30));
}

#[test]
fn test_whitespace_before_operand() {
    assert_eq!(
        DurationFilter::parse("Assessment Length:\n\t <=45"),
        DurationFilter::AtMost(45)
    );
}

#[test]
fn test_scenario_lengths_with_at_most_sixty() {
    let filter = DurationFilter::AtMost(60);
    let kept: Vec<Option<u32>> = [Some(45), Some(60), Some(75), None]
        .into_iter()
        .filter(|length| filter.matches(*length))
        .collect();
    assert_eq!(kept, vec![Some(45), Some(60)]);
}

#[test]
fn test_inverted_range_matches_nothing() {
    let filter = DurationFilter::parse("Assessment Length: 40-30");
    assert_eq!(filter, DurationFilter::Range { min: 40, max: 30 });
    for v in [0, 30, 35, 40, 100] {
        assert!(!filter.matches(Some(v)));
    }
}
