// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_ansi::serializer::{serialize, serialize_tokens, write_tokens};
use hex1b_ansi::token::AnsiToken;
use hex1b_ansi::tokenizer::{Tokenizer, tokenize};
use proptest::{
    prelude::any, prop_assert, prop_assert_eq, prop_oneof, proptest,
    strategy::{Just, Strategy},
};

/// Generates arbitrary strings that may contain printable data, control
/// characters, escape fragments, and full sequences.
fn arb_ansi_input() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            // printable ASCII
            (0x20u8..=0x7Eu8).prop_map(|b| (b as char).to_string()),
            // common controls
            proptest::sample::select(vec![
                "\x07".to_string(),
                "\x08".to_string(),
                "\r".to_string(),
                "\n".to_string(),
                "\t".to_string(),
            ]),
            // escape initiator
            Just("\x1b".to_string()),
            // complete common sequences
            proptest::sample::select(vec![
                "\x1b[1;31m".to_string(),
                "\x1b[2J".to_string(),
                "\x1b[10;20H".to_string(),
                "\x1b[?1049h".to_string(),
                "\x1b]0;title\x07".to_string(),
                "\x1b_HEX1BAPP:FRAME:BEGIN\x1b\\".to_string(),
                "\x1bP+q\x1b\\".to_string(),
                "\x1b[<32;4;5M".to_string(),
            ]),
            // arbitrary unicode
            any::<char>().prop_map(|c| c.to_string()),
        ],
        0..64,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    /// The tokenizer terminates without panicking on anything.
    #[test]
    fn tokenize_never_panics(input in arb_ansi_input()) {
        let tokens = tokenize(&input);
        prop_assert!(tokens.len() <= input.chars().count() + 1);
        for token in &tokens {
            let _ = format!("{token}");
        }
    }

    /// Chunking the input at any point yields the same byte stream after
    /// serialization (text runs may split differently, bytes may not).
    #[test]
    fn chunked_push_is_equivalent(input in arb_ansi_input(), split in any::<proptest::sample::Index>()) {
        let full = tokenize(&input);

        // split on a char boundary
        let indices: Vec<usize> = input.char_indices().map(|(i, _)| i).chain([input.len()]).collect();
        let at = indices[split.index(indices.len())];

        let mut tokenizer = Tokenizer::new();
        let mut chunked = tokenizer.push(&input[..at]);
        chunked.extend(tokenizer.push(&input[at..]));
        chunked.extend(tokenizer.finish());

        prop_assert_eq!(serialize_tokens(&chunked), serialize_tokens(&full));
    }

    /// Every token the tokenizer produces survives a serialize → tokenize
    /// round trip as the same single token.
    #[test]
    fn every_produced_token_round_trips(input in arb_ansi_input()) {
        for token in tokenize(&input) {
            let bytes = serialize(&token);
            let reparsed = tokenize(&bytes);
            prop_assert_eq!(
                reparsed.len(),
                1,
                "token {} serialized to {:?} which re-tokenized to {} tokens",
                token.clone(),
                bytes,
                reparsed.len()
            );
            prop_assert!(
                reparsed[0].semantic_eq(&token),
                "token {} came back as {}",
                token,
                reparsed[0]
            );
        }
    }

    /// Serialization is a fixed point: serializing the re-tokenized stream
    /// changes nothing further.
    #[test]
    fn serialization_is_idempotent(input in arb_ansi_input()) {
        let first = serialize_tokens(&tokenize(&input));
        let second = serialize_tokens(&tokenize(&first));
        prop_assert_eq!(first, second);
    }

    /// The string and byte back-ends agree for every produced token.
    #[test]
    fn serializer_backends_agree(input in arb_ansi_input()) {
        let tokens = tokenize(&input);
        let mut bytes = Vec::new();
        write_tokens(&mut bytes, &tokens).unwrap();
        prop_assert_eq!(bytes, serialize_tokens(&tokens).into_bytes());
    }
}

#[test_log::test]
fn closure_holds_for_canonical_streams() {
    // For streams written in canonical spellings, serialization
    // reconstitutes the exact input bytes.
    let inputs = [
        "plain text, nothing else",
        "\x1b[1;31mred\x1b[0m and \x1b[4munderlined\x1b[24m",
        "line one\r\nline two\ttabbed",
        "\x1b[2J\x1b[H\x1b[?25l\x1b[?1049h",
        "\x1b]0;window title\x07",
        "\x1b]8;;https://example.com\x1b\\link\x1b]8;;\x1b\\",
        "\x1b_HEX1BAPP:FRAME:BEGIN\x1b\\\x1b[H\x1b[31mX\x1b_HEX1BAPP:FRAME:END\x1b\\",
        "\x1b7\x1b[3;10r\x1bD\x1bM\x1b8",
        "\x1b(0lqqqk\x1b(B",
        "\x1bOA\x1bOB\x1b[3~\x1b[5;5~",
        "\x1b[<0;10;5M\x1b[<0;10;5m",
        "\x1bPq#0;2;0;0;0\x1b\\",
    ];

    for input in inputs {
        let tokens = tokenize(input);
        assert_eq!(
            serialize_tokens(&tokens),
            input,
            "closure failed for {input:?}"
        );
    }
}

#[test]
fn unrecognised_inputs_still_reconstitute() {
    let inputs = [
        "\x1b[7J",            // invalid clear mode
        "\x1b[99999999999999999999A", // overflowing parameter
        "\x1bz",              // unknown escape
        "\x1b_unknown apc\x1b\\",
        "\x1b[4q",            // DECSCUSR without the space
        "\x07\x08",           // bare control bytes
    ];

    for input in inputs {
        let tokens = tokenize(input);
        assert_eq!(
            serialize_tokens(&tokens),
            input,
            "reconstitution failed for {input:?}"
        );
        assert!(
            tokens
                .iter()
                .all(|t| matches!(t, AnsiToken::Unrecognised(_))),
            "expected only Unrecognised tokens for {input:?}"
        );
    }
}
