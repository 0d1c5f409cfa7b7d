//! Terminal classification of aggregated findings after summarize + filter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Disposition {
    Unmapped,
    Info,
    FilteredFp {
        fp_score: Option<u8>,
        reasoning: Option<String>,
    },
    FilteredExclude {
        reasoning: Option<String>,
    },
    Survived {
        group_title: Option<String>,
    },
}

/// A false-positive verdict carried alongside the source index it applies to.
#[derive(Debug, Clone)]
pub struct FpVerdict {
    pub source: usize,
    pub fp_score: Option<u8>,
    pub reasoning: Option<String>,
}

/// Builds the per-aggregated-index disposition map.
///
/// Layers are applied in the fixed order Info -> FilteredFp ->
/// FilteredExclude -> Survived; a later layer overwrites an earlier one, so
/// a source index ends up in the most specific layer that claims it.
pub fn build_dispositions(
    aggregated_count: usize,
    info: &[crate::grouping::FindingGroup],
    fp_removed: &[FpVerdict],
    excluded: &[usize],
    survivors: &[(usize, String)],
) -> HashMap<usize, Disposition> {
    let mut map: HashMap<usize, Disposition> = (0..aggregated_count)
        .map(|i| (i, Disposition::Unmapped))
        .collect();

    for group in info {
        for &source in &group.sources {
            if source < aggregated_count {
                map.insert(source, Disposition::Info);
            }
        }
    }

    for verdict in fp_removed {
        if verdict.source < aggregated_count {
            map.insert(
                verdict.source,
                Disposition::FilteredFp {
                    fp_score: verdict.fp_score,
                    reasoning: verdict.reasoning.clone(),
                },
            );
        }
    }

    for &source in excluded {
        if source < aggregated_count {
            map.insert(
                source,
                Disposition::FilteredExclude { reasoning: None },
            );
        }
    }

    for (source, title) in survivors {
        if *source < aggregated_count {
            map.insert(
                *source,
                Disposition::Survived {
                    group_title: Some(title.clone()),
                },
            );
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::FindingGroup;

    #[test]
    fn later_layers_win_over_earlier_ones() {
        let info = vec![FindingGroup {
            sources: vec![0, 1],
            ..Default::default()
        }];
        let fp_removed = vec![FpVerdict {
            source: 1,
            fp_score: Some(90),
            reasoning: Some("style".into()),
        }];
        let survivors = vec![(1, "group".to_string())];

        let dispositions = build_dispositions(2, &info, &fp_removed, &[], &survivors);

        // index 0 only claimed by Info.
        assert_eq!(dispositions[&0], Disposition::Info);
        // index 1 claimed by Info, then FilteredFp, then Survived -> Survived wins.
        assert!(matches!(dispositions[&1], Disposition::Survived { .. }));
    }

    #[test]
    fn unclaimed_indices_stay_unmapped() {
        let dispositions = build_dispositions(3, &[], &[], &[], &[]);
        assert_eq!(dispositions[&2], Disposition::Unmapped);
    }

    #[test]
    fn out_of_range_sources_are_ignored() {
        let info = vec![FindingGroup {
            sources: vec![99],
            ..Default::default()
        }];
        let dispositions = build_dispositions(1, &info, &[], &[], &[]);
        assert_eq!(dispositions.len(), 1);
        assert_eq!(dispositions[&0], Disposition::Unmapped);
    }
}
