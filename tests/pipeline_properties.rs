use proptest::prelude::*;

use image_variant_service::models::{params, OperationSet, Params};
use image_variant_service::utils::{hash_token, serialize, DigestAlgorithm, IntegrityHasher, Separators};

fn params_strategy() -> impl Strategy<Value = Params> {
    prop::collection::vec(("[a-z]{1,6}", 0i64..100_000), 0..4).prop_map(params)
}

fn operations_strategy() -> impl Strategy<Value = Vec<(String, Params)>> {
    prop::collection::btree_map("[a-z]{1,8}", params_strategy(), 1..5)
        .prop_map(|ops| ops.into_iter().collect())
}

fn hex_char_other_than(c: char) -> char {
    if c == '0' {
        '1'
    } else {
        '0'
    }
}

proptest! {
    #[test]
    fn serialization_is_deterministic(ops in operations_strategy()) {
        let set: OperationSet = ops.iter().cloned().collect();
        let separators = Separators::default();
        prop_assert_eq!(serialize(&set, &separators).unwrap(), serialize(&set.clone(), &separators).unwrap());
    }

    #[test]
    fn reordering_changes_output(ops in operations_strategy()) {
        let separators = Separators::default();
        let forward: OperationSet = ops.iter().cloned().collect();
        let reversed: OperationSet = ops.iter().rev().cloned().collect();

        let a = serialize(&forward, &separators).unwrap();
        let b = serialize(&reversed, &separators).unwrap();
        if ops.len() > 1 {
            prop_assert_ne!(a, b);
        } else {
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn issued_tokens_verify(canonical in "[ -~]{0,64}", salt in "[ -~]{1,32}", length in 1usize..=40) {
        let hasher = IntegrityHasher::new(salt, length, DigestAlgorithm::Sha1).unwrap();
        let token = hasher.hash(&canonical);
        prop_assert!(hasher.verify(&canonical, Some(&token)).is_ok());
    }

    #[test]
    fn any_single_character_change_is_rejected(
        canonical in "[a-z+.-]{1,40}",
        salt in "[a-z]{1,16}",
        index in 0usize..8,
    ) {
        let hasher = IntegrityHasher::new(salt, 8, DigestAlgorithm::Sha1).unwrap();
        let token = hasher.hash(&canonical);

        let mut tampered: Vec<char> = token.chars().collect();
        tampered[index] = hex_char_other_than(tampered[index]);
        let tampered: String = tampered.into_iter().collect();

        prop_assert!(!hasher.matches(&canonical, &tampered));
    }

    #[test]
    fn token_length_and_alphabet(canonical in "[ -~]{0,64}", salt in "[a-z]{1,16}") {
        for length in [1usize, 8, 40] {
            let token = hash_token(&canonical, &salt, length, DigestAlgorithm::Sha1).unwrap();
            prop_assert_eq!(token.len(), length);
            prop_assert!(token.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        }
    }
}

#[test]
fn pinned_token_for_thumbnail() {
    let ops = OperationSet::new().with("thumbnail", params([("width", 200), ("height", 150)]));
    let canonical = serialize(&ops, &Separators::default()).unwrap();
    assert_eq!(canonical, "thumbnail+width-200-height-150");

    let token = hash_token(&canonical, "this-is-a-nice-salt", 40, DigestAlgorithm::Sha1).unwrap();
    assert_eq!(token, "63385e727176545257a5863935594e5a5617ba6c");
}
