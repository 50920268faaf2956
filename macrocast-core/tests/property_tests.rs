//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Contiguous calendar: aligned dates cover the observed min..max with no gaps
//! 2. Forward fill: once a macro/market column has a value it never reverts to missing
//! 3. Sentiment fill: from raw series, every date without an observed value
//!    becomes exactly 0.0 and observed values are untouched
//! 4. Temporal split: train is the first n - round(n*f) rows, partitions are disjoint

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use std::collections::BTreeMap;

use macrocast_core::data::{align_series, FillPolicyResolver};
use macrocast_core::model::temporal_split;
use macrocast_core::{Provenance, TimeSeries};

// ── Strategies (proptest) ────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

/// Sparse series: strictly increasing day offsets with optional values.
fn arb_series(name: &'static str) -> impl Strategy<Value = TimeSeries> {
    prop::collection::btree_map(0i64..400, prop::option::weighted(0.7, -50.0..50.0_f64), 1..40)
        .prop_map(move |points| {
            let points = points
                .into_iter()
                .map(|(offset, v)| (base_date() + Duration::days(offset), v))
                .collect();
            TimeSeries::new(name, Provenance::new("prop"), points).unwrap()
        })
}

// ── 1. Contiguous calendar ───────────────────────────────────────────

proptest! {
    #[test]
    fn aligned_calendar_is_contiguous(a in arb_series("S&P 500"), b in arb_series("CPI")) {
        let span = match (a.observed_span(), b.observed_span()) {
            (Some(x), Some(y)) => Some((x.0.min(y.0), x.1.max(y.1))),
            (x, y) => x.or(y),
        };
        let Some((min, max)) = span else {
            prop_assert!(align_series(vec![a, b]).is_err());
            return Ok(());
        };

        let aligned = align_series(vec![a, b]).unwrap();
        let dates = &aligned.frame.dates;

        prop_assert_eq!(dates[0], min);
        prop_assert_eq!(*dates.last().unwrap(), max);
        for pair in dates.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
        for column in &aligned.frame.columns {
            prop_assert_eq!(column.values.len(), dates.len());
        }
    }
}

// ── 2. Forward fill never reverts ────────────────────────────────────

proptest! {
    #[test]
    fn aligned_macro_column_never_reverts_to_missing(s in arb_series("CPI")) {
        prop_assume!(s.observed_count() > 0);
        let aligned = align_series(vec![s]).unwrap();
        let values = &aligned.frame.columns[0].values;
        if let Some(first) = values.iter().position(Option::is_some) {
            prop_assert!(values[first..].iter().all(Option::is_some));
        }
    }
}

// ── 3. Sentiment fill is non-destructive ─────────────────────────────

proptest! {
    #[test]
    fn sentiment_fill_is_zero_and_non_destructive(
        s in arb_series("inflation_sentiment"),
        anchor in arb_series("unemployment_sentiment"),
    ) {
        prop_assume!(s.observed_count() + anchor.observed_count() > 0);
        let observed: BTreeMap<NaiveDate, f64> = s
            .observations()
            .iter()
            .filter_map(|o| o.value.map(|v| (o.date, v)))
            .collect();

        let aligned = align_series(vec![s, anchor]).unwrap();
        let dates = aligned.frame.dates.clone();
        let (filled, _) = FillPolicyResolver::default().resolve(aligned.frame).unwrap();

        let after = &filled.column("inflation_sentiment").unwrap().values;
        prop_assert_eq!(after.len(), dates.len());
        for (date, a) in dates.iter().zip(after) {
            let expected = observed.get(date).copied().unwrap_or(0.0);
            prop_assert_eq!(*a, Some(expected));
        }
    }
}

// ── 4. Temporal split arithmetic ─────────────────────────────────────

proptest! {
    #[test]
    fn temporal_split_partitions_in_order(n in 2usize..5000, f in 0.05..0.95_f64) {
        let n_test = (n as f64 * f).round() as usize;
        let n_train = n - n_test.min(n);
        match temporal_split(n, f) {
            Ok(split) => {
                prop_assert_eq!(split.train.clone(), 0..n_train);
                prop_assert_eq!(split.test.clone(), n_train..n);
                prop_assert_eq!(split.train.end, split.test.start);
                prop_assert!(split.train_len() > 0 && split.test_len() > 0);
            }
            Err(_) => prop_assert!(n_train == 0 || n_test == 0),
        }
    }
}
