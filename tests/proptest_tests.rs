//! Property-based tests using proptest.
//!
//! These check the invariants of the cluster-order plan and the MIME
//! policies over randomly generated inputs.

use proptest::prelude::*;
use zimrecreate::recreate::{OrderedIndexList, PlannedEntry, is_compressible_mime, is_indexable_mime};
use zimrecreate::write::EntryUrl;

/// Strategy for (index, cluster) pairs with unique, ascending indexes.
fn pairs_strategy() -> impl Strategy<Value = Vec<PlannedEntry>> {
    proptest::collection::vec(0u32..50, 0..300).prop_map(|clusters| {
        clusters
            .into_iter()
            .enumerate()
            .map(|(index, cluster)| PlannedEntry {
                index: index as u32,
                cluster,
            })
            .collect()
    })
}

proptest! {
    /// Planned clusters never decrease.
    #[test]
    fn plan_is_cluster_monotonic(pairs in pairs_strategy()) {
        let plan = OrderedIndexList::from_pairs(pairs);
        let clusters: Vec<u32> = plan.iter().map(|p| p.cluster).collect();
        prop_assert!(clusters.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Within a cluster, entries keep their source order.
    #[test]
    fn plan_is_stable(pairs in pairs_strategy()) {
        let plan = OrderedIndexList::from_pairs(pairs);
        for w in plan.iter().collect::<Vec<_>>().windows(2) {
            if w[0].cluster == w[1].cluster {
                prop_assert!(w[0].index < w[1].index);
            }
        }
    }

    /// Every entry is planned exactly once.
    #[test]
    fn plan_is_a_permutation(pairs in pairs_strategy()) {
        let count = pairs.len();
        let plan = OrderedIndexList::from_pairs(pairs);
        prop_assert_eq!(plan.len(), count);
        let mut indices = plan.indices();
        indices.sort_unstable();
        prop_assert!(indices.iter().enumerate().all(|(i, &index)| index as usize == i));
    }

    /// Every text type is compressible.
    #[test]
    fn text_is_compressible(subtype in "[a-z0-9.+-]{0,20}") {
        let mime = format!("text/{subtype}");
        prop_assert!(is_compressible_mime(&mime));
    }

    /// Indexable content is always compressible.
    #[test]
    fn indexable_implies_compressible(mime in "[a-z]{1,12}/[a-z0-9.+-]{1,20}") {
        if is_indexable_mime(&mime) {
            prop_assert!(is_compressible_mime(&mime));
        }
    }

    /// Image, audio, and video types are stored as-is, SVG excepted.
    #[test]
    fn media_is_not_compressible(
        major in prop::sample::select(vec!["image", "audio", "video"]),
        subtype in "[a-z0-9.-]{1,12}",
    ) {
        let mime = format!("{major}/{subtype}");
        prop_assume!(mime != "image/svg+xml");
        prop_assert!(!is_compressible_mime(&mime));
    }

    /// URLs order by namespace first.
    #[test]
    fn entry_urls_order_by_namespace(
        a in "[A-Z]", b in "[A-Z]", url_a in "[a-z]{1,8}", url_b in "[a-z]{1,8}",
    ) {
        let ns_a = a.chars().next().unwrap();
        let ns_b = b.chars().next().unwrap();
        let left = EntryUrl::new(ns_a, url_a.clone());
        let right = EntryUrl::new(ns_b, url_b.clone());
        if ns_a != ns_b {
            prop_assert_eq!(left < right, ns_a < ns_b);
        } else {
            prop_assert_eq!(left < right, url_a < url_b);
        }
    }
}
