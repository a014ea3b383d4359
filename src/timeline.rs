/**
 * Reference timeline and nearest-match search
 */

use std::cmp::Ordering;

use crate::error::{GeotagError, Result};
use crate::photo::PhotoRecord;
use crate::timestamp::CaptureTime;

/// Geotagged photos sorted by raw capture time (ties by path).
/// Never empty.
#[derive(Debug, Clone)]
pub struct ReferenceTimeline {
    records: Vec<PhotoRecord>,
}

impl ReferenceTimeline {
    pub fn new(mut records: Vec<PhotoRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(GeotagError::Precondition(
                "No base images were found".to_string(),
            ));
        }

        records.sort_by(|a, b| {
            a.capture_time_raw()
                .cmp(b.capture_time_raw())
                .then_with(|| a.path().cmp(b.path()))
        });

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PhotoRecord] {
        &self.records
    }

    /// Closest reference photo in time to `query`.
    pub fn find_nearest(&self, query: &CaptureTime) -> &PhotoRecord {
        let records = &self.records;
        let (mut min_index, mut max_index) = (0, records.len() - 1);

        loop {
            match max_index - min_index {
                0 => return &records[min_index],
                1 => {
                    let diff_min = records[min_index].capture_time().distance(query);
                    let diff_max = records[max_index].capture_time().distance(query);
                    return if diff_max < diff_min {
                        &records[max_index]
                    } else {
                        &records[min_index]
                    };
                }
                span => {
                    // ceil(span / 2)
                    let mid_index = min_index + (span + 1) / 2;
                    match query.raw().cmp(records[mid_index].capture_time_raw()) {
                        Ordering::Equal => return &records[mid_index],
                        Ordering::Greater => min_index = mid_index,
                        Ordering::Less => max_index = mid_index,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::GeoTag;
    use std::path::Path;

    fn record(path: &str, raw: &str) -> PhotoRecord {
        PhotoRecord::new(path, CaptureTime::parse(raw).unwrap(), GeoTag::Absent)
    }

    fn at(raw: &str) -> CaptureTime {
        CaptureTime::parse(raw).unwrap()
    }

    /// `2024:01:DD HH:00:00` for a running hour offset.
    fn hour_stamp(hours: u32) -> String {
        format!("2024:01:{:02} {:02}:00:00", hours / 24 + 1, hours % 24)
    }

    #[test]
    fn test_empty_timeline_is_precondition_failure() {
        let result = ReferenceTimeline::new(Vec::new());
        assert!(matches!(result, Err(GeotagError::Precondition(_))));
    }

    #[test]
    fn test_sorts_by_raw_time_then_path() {
        let timeline = ReferenceTimeline::new(vec![
            record("c.jpg", "2024:01:03 10:00:00"),
            record("b.jpg", "2024:01:01 10:00:00"),
            record("a.jpg", "2024:01:03 10:00:00"),
        ])
        .unwrap();

        let paths: Vec<&Path> = timeline.records().iter().map(|r| r.path()).collect();
        assert_eq!(paths, vec![Path::new("b.jpg"), Path::new("a.jpg"), Path::new("c.jpg")]);
    }

    #[test]
    fn test_single_element_always_matches() {
        let timeline = ReferenceTimeline::new(vec![record("only.jpg", "2024:06:01 12:00:00")]).unwrap();
        for raw in ["1999:01:01 00:00:00", "2024:06:01 12:00:00", "2099:12:31 23:59:59"] {
            assert_eq!(timeline.find_nearest(&at(raw)).path(), Path::new("only.jpg"));
        }
    }

    #[test]
    fn test_nearest_of_two_references() {
        let timeline = ReferenceTimeline::new(vec![
            record("a.jpg", "2024:01:01 10:00:00"),
            record("b.jpg", "2024:01:10 10:00:00"),
        ])
        .unwrap();

        assert_eq!(timeline.find_nearest(&at("2024:01:05 10:00:00")).path(), Path::new("a.jpg"));
        assert_eq!(timeline.find_nearest(&at("2024:02:01 10:00:00")).path(), Path::new("b.jpg"));
        assert_eq!(timeline.find_nearest(&at("2023:12:01 10:00:00")).path(), Path::new("a.jpg"));
    }

    #[test]
    fn test_equidistant_pair_prefers_earlier() {
        let timeline = ReferenceTimeline::new(vec![
            record("a.jpg", "2024:01:01 10:00:00"),
            record("b.jpg", "2024:01:01 12:00:00"),
        ])
        .unwrap();

        assert_eq!(timeline.find_nearest(&at("2024:01:01 11:00:00")).path(), Path::new("a.jpg"));
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let timeline = ReferenceTimeline::new(
            (0..9).map(|i| record(&format!("{}.jpg", i), &hour_stamp(i * 5))).collect(),
        )
        .unwrap();

        // Index 4 is the first midpoint probed in a 9-element window.
        let hit = timeline.find_nearest(&at(&hour_stamp(20)));
        assert_eq!(hit.path(), Path::new("4.jpg"));
    }

    #[test]
    fn test_matches_brute_force_minimum() {
        // Irregular gaps so the window narrows differently on each side.
        let offsets = [0u32, 1, 2, 7, 8, 30, 31, 33, 70, 71, 100, 250, 251, 400];

        for len in 1..=offsets.len() {
            let timeline = ReferenceTimeline::new(
                offsets[..len]
                    .iter()
                    .map(|&h| record(&format!("{:03}.jpg", h), &hour_stamp(h)))
                    .collect(),
            )
            .unwrap();

            for query_hour in 0..=420 {
                let query = at(&hour_stamp(query_hour));
                let found = timeline.find_nearest(&query);
                let best = timeline
                    .records()
                    .iter()
                    .map(|r| r.capture_time().distance(&query))
                    .min()
                    .unwrap();

                assert_eq!(
                    found.capture_time().distance(&query),
                    best,
                    "len {} query {} picked {}",
                    len,
                    query.raw(),
                    found.path().display()
                );
            }
        }
    }
}
