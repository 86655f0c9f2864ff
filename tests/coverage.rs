//! Coverage expansion against synthetic backends.

mod common;

use capsweep::{
    coverage::{expand, Completeness, Plan},
    filter::QueryFilter,
    terms::TermSpace,
    Error,
};
use common::*;
use pretty_assertions::assert_eq;

fn plan(min_width: usize, max_width: usize, allow_partial: bool) -> Plan {
    Plan {
        cap: 3,
        alphabet: alphabet(),
        min_width,
        max_width,
        allow_partial,
    }
}

/// Three distinct ids per term, derived from its letters.
fn term_ids(term: &str) -> Vec<u64> {
    let base = term.bytes().fold(0u64, |acc, b| acc * 100 + b as u64);
    (0..3).map(|i| base * 10 + i).collect()
}

#[tokio::test]
async fn small_cell_is_exact_after_one_query() {
    let search = FakeSearch::new(
        5,
        vec![
            Doc::category(1, "ab", 10, &[1]),
            Doc::category(2, "cd", 10, &[1]),
            Doc::category(3, "ef", 10, &[1]),
            Doc::category(4, "ab", 20, &[1]),
        ],
    );
    let base = QueryFilter::category(10, 1);
    let plan = Plan {
        cap: 5,
        ..plan(1, 2, false)
    };

    let out = expand(&search, &base, &plan).await.unwrap();

    assert_eq!(out.completeness, Completeness::Exact);
    assert_eq!(out.queries, 1);
    assert_eq!(ids(&out.records), search.true_ids(&base));
    assert_eq!(search.calls(), vec![base]);
}

#[tokio::test]
async fn capped_term_aborts_width_and_moves_on() {
    let search = Scripted::new(|f: &QueryFilter| match f.text.as_deref() {
        None => vec![1, 2, 3],
        Some("a") => vec![10, 11, 12],
        Some("ab") => vec![20],
        Some(_) => vec![],
    });

    let out = expand(&search, &QueryFilter::category(10, 1), &plan(1, 2, false))
        .await
        .unwrap();

    // Nothing after "a" on width 1, then all of width 2.
    assert_eq!(
        search.terms(),
        vec!["", "a", "ab", "ac", "ad", "bc", "bd", "cd"]
    );
    assert_eq!(out.completeness, Completeness::Covered { width: 2 });
    assert_eq!(out.queries, 8);
    // Records seen before the abort are carried forward.
    assert_eq!(ids(&out.records), vec![1, 2, 3, 10, 11, 12, 20]);
}

#[tokio::test]
async fn scan_starts_at_min_width() {
    let search = Scripted::new(|f: &QueryFilter| match f.text {
        None => vec![1, 2, 3],
        Some(_) => vec![],
    });

    let out = expand(&search, &QueryFilter::category(10, 1), &plan(2, 3, false))
        .await
        .unwrap();

    assert_eq!(search.terms()[1], "ab");
    assert_eq!(out.completeness, Completeness::Covered { width: 2 });
}

#[tokio::test]
async fn partial_last_width_completes_as_best_effort() {
    let search = Scripted::new(|f: &QueryFilter| match f.text.as_deref() {
        None => vec![1, 2, 3],
        Some(t) => term_ids(t),
    });

    let out = expand(&search, &QueryFilter::category(10, 1), &plan(1, 2, true))
        .await
        .unwrap();

    assert_eq!(
        out.completeness,
        Completeness::BestEffort {
            width: 2,
            overflowing: 6
        }
    );
    assert!(!out.completeness.is_guaranteed());
    assert_eq!(out.queries, 1 + 1 + 6);

    let found = ids(&out.records);
    for term in TermSpace::new(&alphabet(), 2).iter() {
        for id in term_ids(&term) {
            assert!(found.contains(&id), "{term}: {id} missing");
        }
    }
}

#[tokio::test]
async fn disabled_brute_force_on_capped_root_is_a_config_error() {
    for disabled in [Plan::trusted(3), plan(0, 0, true)] {
        let search = Scripted::new(|_: &QueryFilter| vec![1, 2, 3]);

        let err = expand(&search, &QueryFilter::special("S_CAMP"), &disabled)
            .await
            .unwrap_err();

        assert!(
            matches!(&err, Error::BruteForceDisabled { cell, count: 3 } if cell.contains("S_CAMP")),
            "{err}"
        );
        assert_eq!(search.terms(), vec![""]);
    }
}

#[tokio::test]
async fn every_width_capped_is_capacity_exhaustion() {
    let search = Scripted::new(|_: &QueryFilter| vec![1, 2, 3]);

    let err = expand(&search, &QueryFilter::category(20, 2), &plan(1, 2, false))
        .await
        .unwrap_err();

    assert!(
        matches!(&err, Error::CapacityExhausted { cell, max_width: 2 } if cell.contains("category=20")),
        "{err}"
    );
    assert_eq!(search.terms(), vec!["", "a", "ab"]);
}

#[tokio::test]
async fn transport_failure_propagates() {
    let search = Scripted::new(|_: &QueryFilter| vec![1, 2, 3]);
    let plan = Plan {
        alphabet: vec!['f', 'a', 'i', 'l'],
        ..plan(4, 4, true)
    };

    let err = expand(&search, &QueryFilter::category(10, 1), &plan)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Status { .. }), "{err}");
}

#[tokio::test]
async fn wider_scan_finds_what_narrower_missed() {
    let docs = dense_docs(1, 2, 10, &[1]);
    let all: Vec<u64> = docs.iter().map(|d| d.id).collect();
    let base = QueryFilter::category(10, 1);
    let plan_for = |min_width, max_width| Plan {
        cap: 5,
        alphabet: ('a'..='f').collect(),
        min_width,
        max_width,
        allow_partial: true,
    };

    let narrow = expand(&FakeSearch::new(5, docs.clone()), &base, &plan_for(1, 1))
        .await
        .unwrap();
    let wide = expand(&FakeSearch::new(5, docs), &base, &plan_for(1, 2))
        .await
        .unwrap();

    assert!(!narrow.completeness.is_guaranteed());
    assert!(narrow.records.len() < all.len());
    assert_eq!(wide.completeness, Completeness::Covered { width: 2 });

    let mut wide_ids = ids(&wide.records);
    wide_ids.sort_unstable();
    assert_eq!(wide_ids, all);
    assert!(ids(&narrow.records).iter().all(|id| wide_ids.contains(id)));
}

#[tokio::test]
async fn unscannable_plan_fails_before_any_query() {
    let oversized = Plan {
        alphabet: vec!['a', 'b'],
        ..plan(3, 3, false)
    };
    let empty = Plan {
        alphabet: Vec::new(),
        ..plan(1, 2, false)
    };
    let inverted = plan(3, 2, false);

    for bad in [oversized, empty, inverted] {
        let search = Scripted::new(|_: &QueryFilter| vec![1, 2, 3]);

        let err = expand(&search, &QueryFilter::category(10, 1), &bad)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)), "{bad:?}: {err}");
        assert!(search.terms().is_empty(), "{bad:?} issued queries");
    }
}

#[tokio::test]
async fn narrowed_base_filter_is_rejected() {
    let search = Scripted::new(|_: &QueryFilter| vec![1]);

    let err = expand(
        &search,
        &QueryFilter::category(10, 1).with_text("ab"),
        &plan(1, 2, false),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Config(_)), "{err}");
    assert!(search.terms().is_empty());
}
