//! TTL strings and cache key scopes

use awsnet::cache::{format_ttl, parse_ttl, CacheKey, CacheScope};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #[test]
    fn test_formatted_ttl_parses_back(secs in 1u64..10_000_000) {
        let ttl = Duration::from_secs(secs);
        prop_assert_eq!(parse_ttl(&format_ttl(ttl)).unwrap(), ttl);
    }

    #[test]
    fn test_region_order_does_not_change_keys(
        (regions, shuffled) in prop::collection::vec("[a-z]{2}-[a-z]{4}-[1-3]", 0..4)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        profile in proptest::option::of("[a-z]{1,8}"),
    ) {
        let a = CacheScope::new(profile.clone(), &regions);
        let b = CacheScope::new(profile, &shuffled);
        prop_assert_eq!(
            CacheKey::new("vpc", &a, "*"),
            CacheKey::new("vpc", &b, "*")
        );
    }
}
