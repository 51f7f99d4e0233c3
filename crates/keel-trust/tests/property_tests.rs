//! Property-based tests for trust-token parsing using proptest

use proptest::prelude::*;

use keel_core::{base58, KeyType, SecretKey};
use keel_trust::tokens::parse_trust_tokens;

fn arb_pad() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just(' '), Just('\t')], 1..4)
        .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    // Whatever whitespace an operator sprinkles into a comment, the parsed
    // comment is the words joined by single spaces.
    #[test]
    fn comment_whitespace_normalizes(
        words in proptest::collection::vec("[A-Za-z0-9&,]{1,8}", 0..5),
        pad in arb_pad(),
        trailing in arb_pad(),
    ) {
        let key = SecretKey::generate(KeyType::Ed25519).public_key();
        let token = base58::encode_node_public(&key);

        let mut line = token.clone();
        for word in &words {
            line.push_str(&pad);
            line.push_str(word);
        }
        line.push_str(&trailing);

        let entries = parse_trust_tokens([line.as_str()]).unwrap();
        prop_assert_eq!(entries.len(), 1);
        prop_assert_eq!(&entries[0].public_key, &key);
        prop_assert_eq!(entries[0].comment.clone(), words.join(" "));
    }

    // One bad line anywhere in the batch rejects the whole batch.
    #[test]
    fn one_bad_line_rejects_batch(n_good in 1usize..6) {
        let mut lines = Vec::new();
        for _ in 0..n_good {
            let key = SecretKey::generate(KeyType::Ed25519).public_key();
            lines.push(base58::encode_node_public(&key));
        }
        lines.push("NotAPublicKey".to_string());
        prop_assert!(parse_trust_tokens(lines.iter().map(String::as_str)).is_err());
    }
}
