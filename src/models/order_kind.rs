use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Known order types. Order types live in a reference table, so an id outside
/// this list is still valid and simply numbers under the generic prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Service,
    Diagnostic,
    Repair,
    Warranty,
    Return,
}

/// Prefix for order types outside [`OrderKind`].
pub const GENERIC_ORDER_PREFIX: &str = "ORD";

impl OrderKind {
    pub fn from_id(order_type_id: i32) -> Option<Self> {
        match order_type_id {
            1 => Some(Self::Service),
            2 => Some(Self::Diagnostic),
            3 => Some(Self::Repair),
            4 => Some(Self::Warranty),
            5 => Some(Self::Return),
            _ => None,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Service => "SRV",
            Self::Diagnostic => "DIA",
            Self::Repair => "REP",
            Self::Warranty => "GAR",
            Self::Return => "RTO",
        }
    }
}

/// Order-number prefix for an order type id.
pub fn order_prefix(order_type_id: i32) -> &'static str {
    OrderKind::from_id(order_type_id)
        .map(OrderKind::prefix)
        .unwrap_or(GENERIC_ORDER_PREFIX)
}

pub fn is_service(order_type_id: i32) -> bool {
    OrderKind::from_id(order_type_id) == Some(OrderKind::Service)
}

pub fn is_warranty(order_type_id: i32) -> bool {
    OrderKind::from_id(order_type_id) == Some(OrderKind::Warranty)
}

/// Sequence part of an order number: everything after the first `-`.
/// Numbers that do not parse count as 0.
pub fn order_sequence(order_number: &str) -> u32 {
    order_number
        .split_once('-')
        .and_then(|(_, seq)| seq.parse().ok())
        .unwrap_or(0)
}

/// Next order number for `prefix` given the numbers already issued with it.
pub fn next_order_number<'a, I>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let next = existing.into_iter().map(order_sequence).max().unwrap_or(0) + 1;
    format!("{}-{:06}", prefix, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, "SRV")]
    #[case(2, "DIA")]
    #[case(3, "REP")]
    #[case(4, "GAR")]
    #[case(5, "RTO")]
    #[case(9, "ORD")]
    #[case(0, "ORD")]
    fn prefixes_by_order_type(#[case] order_type_id: i32, #[case] expected: &str) {
        assert_eq!(order_prefix(order_type_id), expected);
    }

    #[test]
    fn first_number_for_a_prefix() {
        assert_eq!(next_order_number("SRV", Vec::<&str>::new()), "SRV-000001");
    }

    #[test]
    fn next_number_skips_past_the_maximum_not_the_count() {
        let existing = ["SRV-000001", "SRV-000007", "SRV-000003"];
        assert_eq!(next_order_number("SRV", existing), "SRV-000008");
    }

    #[test]
    fn malformed_numbers_count_as_zero() {
        let existing = ["SRV-", "SRV-abc", "SRV"];
        assert_eq!(next_order_number("SRV", existing), "SRV-000001");
    }

    #[test]
    fn sequences_beyond_six_digits_keep_growing() {
        assert_eq!(next_order_number("REP", ["REP-999999"]), "REP-1000000");
    }

    proptest! {
        #[test]
        fn next_number_is_strictly_greater_than_every_existing(seqs in proptest::collection::vec(0u32..999_998, 0..20)) {
            let existing: Vec<String> = seqs.iter().map(|s| format!("SRV-{:06}", s)).collect();
            let next = next_order_number("SRV", existing.iter().map(String::as_str));

            prop_assert!(next.starts_with("SRV-"));
            prop_assert_eq!(next.len(), 10);
            let next_seq = order_sequence(&next);
            prop_assert!(seqs.iter().all(|s| *s < next_seq));
        }
    }
}
