// src/core/dedup.rs

//! Filters a node's completed-request list against the cluster watermark so each
//! completed query is counted once across repeated polls.

use super::model::{CompletedQuery, RawCompletedRequest};
use super::timefmt::DateLayout;
use chrono::{DateTime, Utc};

/// The new completed queries of one node and the watermark they advance it to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedBatch {
    pub watermark: DateTime<Utc>,
    pub queries: Vec<CompletedQuery>,
}

/// Derives every record and keeps the ones newer than `watermark`.
///
/// On a bootstrap scrape (`is_first_scrape`) every record is kept. Records whose
/// request time is missing or unparseable are kept too but never move the
/// watermark. The returned watermark is the latest request time among the kept
/// records, tracked as a running maximum so an out-of-order list still advances it
/// correctly, or `watermark` unchanged when no kept record carries a timestamp.
pub fn dedup_completed(
    raw: Vec<RawCompletedRequest>,
    watermark: DateTime<Utc>,
    is_first_scrape: bool,
    layout: DateLayout,
) -> CompletedBatch {
    let mut newest_kept: Option<DateTime<Utc>> = None;
    let mut queries = Vec::with_capacity(raw.len());

    for entry in raw {
        let query = CompletedQuery::from_raw(entry, layout);

        let is_new = match query.request_time {
            _ if is_first_scrape => true,
            Some(requested_at) => requested_at > watermark,
            None => true,
        };
        if !is_new {
            continue;
        }

        if let Some(requested_at) = query.request_time {
            newest_kept = Some(newest_kept.map_or(requested_at, |cur| cur.max(requested_at)));
        }
        queries.push(query);
    }

    CompletedBatch {
        watermark: newest_kept.unwrap_or(watermark),
        queries,
    }
}
