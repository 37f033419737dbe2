//! Property tests for the tagged-pointer primitives, run across randomly
//! generated tags, flags and 8-byte-aligned addresses.

use graph_pool::tagged::{address_only, from_parts, get_flag, get_tag, with_flag, with_tag};
use proptest::prelude::*;

fn aligned_address() -> impl Strategy<Value = usize> {
    (0u64..(1u64 << 44)).prop_map(|a| (a as usize) << 3)
}

proptest! {
    #[test]
    fn from_parts_round_trips_all_three_fields(addr in aligned_address(), tag: u16, flag: bool) {
        let w = from_parts(addr, tag, flag);
        prop_assert_eq!(address_only(w), addr);
        prop_assert_eq!(get_tag(w), tag);
        prop_assert_eq!(get_flag(w), flag);
    }

    #[test]
    fn with_tag_never_disturbs_address_or_flag(addr in aligned_address(), tag: u16, flag: bool, new_tag: u16) {
        let w = from_parts(addr, tag, flag);
        let updated = with_tag(w, new_tag);
        prop_assert_eq!(get_tag(updated), new_tag);
        prop_assert_eq!(address_only(updated), addr);
        prop_assert_eq!(get_flag(updated), flag);
    }

    #[test]
    fn with_flag_never_disturbs_address_or_tag(addr in aligned_address(), tag: u16, flag: bool, new_flag: bool) {
        let w = from_parts(addr, tag, flag);
        let updated = with_flag(w, new_flag);
        prop_assert_eq!(get_flag(updated), new_flag);
        prop_assert_eq!(address_only(updated), addr);
        prop_assert_eq!(get_tag(updated), tag);
    }
}
