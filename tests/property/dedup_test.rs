// tests/property/dedup_test.rs

//! Properties of the completed-query watermark filter.

use crate::fixtures::{at, rfc_time};
use n1ql_exporter::core::dedup::dedup_completed;
use n1ql_exporter::core::model::RawCompletedRequest;
use n1ql_exporter::core::timefmt::DateLayout;
use proptest::prelude::*;

/// `None` produces a record whose timestamp cannot be parsed.
fn records(offsets: &[Option<i64>]) -> Vec<RawCompletedRequest> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, offset)| RawCompletedRequest {
            statement: format!("SELECT {i}"),
            request_time: offset.map(rfc_time).unwrap_or_else(|| "n/a".to_string()),
            ..Default::default()
        })
        .collect()
}

fn offsets_strategy() -> impl Strategy<Value = Vec<Option<i64>>> {
    prop::collection::vec(prop::option::weighted(0.9, 0i64..500), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_steady_scrape_emits_exactly_the_newer_records(
        offsets in offsets_strategy(),
        watermark in 0i64..500,
    ) {
        let batch = dedup_completed(
            records(&offsets),
            at(watermark),
            false,
            DateLayout::Rfc3339Nano,
        );

        let expected: Vec<Option<i64>> = offsets
            .iter()
            .copied()
            .filter(|offset| offset.is_none_or(|o| o > watermark))
            .collect();
        let emitted: Vec<Option<i64>> = batch
            .queries
            .iter()
            .map(|q| q.request_time.map(|t| (t - at(0)).num_seconds()))
            .collect();
        prop_assert_eq!(emitted, expected.clone());

        let newest = expected.iter().flatten().copied().max();
        let expected_watermark = newest.map_or(watermark, |n| n.max(watermark));
        prop_assert_eq!(batch.watermark, at(expected_watermark));
    }

    #[test]
    fn test_first_scrape_emits_everything(
        offsets in offsets_strategy(),
        baseline in 0i64..1000,
    ) {
        let batch = dedup_completed(records(&offsets), at(baseline), true, DateLayout::Rfc3339Nano);

        prop_assert_eq!(batch.queries.len(), offsets.len());
        let newest = offsets.iter().flatten().copied().max();
        prop_assert_eq!(batch.watermark, at(newest.unwrap_or(baseline)));
    }

    #[test]
    fn test_rerun_with_produced_watermark_emits_nothing(
        offsets in prop::collection::vec(0i64..500, 0..40),
        watermark in 0i64..500,
    ) {
        let offsets: Vec<Option<i64>> = offsets.into_iter().map(Some).collect();
        let first = dedup_completed(records(&offsets), at(watermark), false, DateLayout::Rfc3339Nano);
        let second = dedup_completed(records(&offsets), first.watermark, false, DateLayout::Rfc3339Nano);

        prop_assert!(second.queries.is_empty());
        prop_assert_eq!(second.watermark, first.watermark);
    }

    #[test]
    fn test_watermark_never_moves_backwards(
        offsets in offsets_strategy(),
        watermark in 0i64..500,
        is_first_scrape in any::<bool>(),
    ) {
        let batch = dedup_completed(records(&offsets), at(watermark), is_first_scrape, DateLayout::Rfc3339Nano);
        if !is_first_scrape {
            prop_assert!(batch.watermark >= at(watermark));
        }
    }
}
