// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress,
    language_storage::{StructTag, TypeTag, MAX_TYPE_TAG_NESTING},
    parser::{
        parse_function_id, parse_module_id, parse_struct_tag, parse_type_tag,
        TypeTagParserErrorKind,
    },
};
use aptos_bcs_utils::{Deserializable, Serializable};
use claims::{assert_err, assert_ok, assert_ok_eq};

fn kind(s: &str, allow_generics: bool) -> TypeTagParserErrorKind {
    parse_type_tag(s, allow_generics).unwrap_err().kind
}

fn coin_of(inner: TypeTag) -> TypeTag {
    TypeTag::from(StructTag::new(
        AccountAddress::ONE,
        "coin".parse().unwrap(),
        "Coin".parse().unwrap(),
        vec![inner],
    ))
}

fn aptos_coin() -> TypeTag {
    TypeTag::from(StructTag::new(
        AccountAddress::ONE,
        "aptos_coin".parse().unwrap(),
        "AptosCoin".parse().unwrap(),
        vec![],
    ))
}

#[test]
fn test_primitives() {
    for (s, expected) in [
        ("bool", TypeTag::Bool),
        ("u8", TypeTag::U8),
        ("u16", TypeTag::U16),
        ("u32", TypeTag::U32),
        ("u64", TypeTag::U64),
        ("u128", TypeTag::U128),
        ("u256", TypeTag::U256),
        ("address", TypeTag::Address),
        ("signer", TypeTag::Signer),
        ("  u8  ", TypeTag::U8),
    ] {
        assert_ok_eq!(parse_type_tag(s, false), expected);
    }
    assert_ok_eq!(
        parse_type_tag("&signer", false),
        TypeTag::Reference(Box::new(TypeTag::Signer))
    );
}

#[test]
fn test_nested_struct_round_trips_through_display() {
    let expected = coin_of(aptos_coin());
    let parsed = parse_type_tag("0x1::coin::Coin<0x1::aptos_coin::AptosCoin>", false).unwrap();
    assert_eq!(parsed, expected);
    assert_eq!(parsed.to_string(), "0x1::coin::Coin<0x1::aptos_coin::AptosCoin>");
    assert_ok_eq!(parse_type_tag(&parsed.to_string(), false), parsed.clone());
    assert_ok_eq!(parse_type_tag(&parsed.to_canonical_string(), false), parsed);
}

#[test]
fn test_vectors_and_multiple_arguments() {
    assert_ok_eq!(
        parse_type_tag("vector<vector<u8>>", false),
        TypeTag::vector(TypeTag::vector(TypeTag::U8))
    );
    let pair = parse_struct_tag("0x1::pair::Pair<u8 , vector<u64>,0x1::coin::Coin<u8>>").unwrap();
    assert_eq!(pair.type_args, vec![
        TypeTag::U8,
        TypeTag::vector(TypeTag::U64),
        coin_of(TypeTag::U8),
    ]);
}

#[test]
fn test_generics() {
    assert_ok_eq!(parse_type_tag("T0", true), TypeTag::Generic(0));
    assert_ok_eq!(
        parse_type_tag("vector<T12>", true),
        TypeTag::vector(TypeTag::Generic(12))
    );
    assert_eq!(kind("T0", false), TypeTagParserErrorKind::UnexpectedGenericType);
    assert_eq!(kind("vector<T1>", false), TypeTagParserErrorKind::UnexpectedGenericType);
}

#[test]
fn test_bracket_errors() {
    assert_eq!(kind("u8>", false), TypeTagParserErrorKind::UnexpectedTypeArgumentClose);
    assert_eq!(kind("vector<u8", false), TypeTagParserErrorKind::MissingTypeArgumentClose);
    assert_eq!(kind("u8, u8", false), TypeTagParserErrorKind::UnexpectedComma);
    assert_eq!(kind("vector<>", false), TypeTagParserErrorKind::TypeArgumentCountMismatch);
    assert_eq!(
        kind("0x1::a::B<u8,>", false),
        TypeTagParserErrorKind::TypeArgumentCountMismatch
    );
}

#[test]
fn test_whitespace_between_tokens_is_rejected() {
    assert_eq!(kind("u8 u8", false), TypeTagParserErrorKind::UnexpectedWhitespaceCharacter);
    assert_eq!(
        kind("vector<u8 u8>", false),
        TypeTagParserErrorKind::UnexpectedWhitespaceCharacter
    );
}

#[test]
fn test_whitespace_before_type_arguments_is_rejected() {
    assert_eq!(
        kind("vector <u8>", false),
        TypeTagParserErrorKind::UnexpectedWhitespaceCharacter
    );
    assert_eq!(
        kind("0x1::coin::Coin <u8>", false),
        TypeTagParserErrorKind::UnexpectedWhitespaceCharacter
    );
    assert_ok_eq!(
        parse_type_tag(" vector<u8> ", false),
        TypeTag::vector(TypeTag::U8)
    );
}

#[test]
fn test_primitive_names_are_case_sensitive() {
    for s in ["U8", "Bool", "ADDRESS", "Signer", "U256"] {
        assert_eq!(kind(s, false), TypeTagParserErrorKind::InvalidTypeTag, "{}", s);
    }
    assert_eq!(kind("Vector<u8>", false), TypeTagParserErrorKind::InvalidTypeTag);
    assert_eq!(kind("vector<U8>", false), TypeTagParserErrorKind::InvalidTypeTag);
}

fn nested_vectors(depth: usize) -> String {
    format!("{}u8{}", "vector<".repeat(depth), ">".repeat(depth))
}

fn nested_coins(depth: usize) -> String {
    format!("{}u8{}", "0x1::coin::Coin<".repeat(depth), ">".repeat(depth))
}

#[test]
fn test_nesting_limit_round_trips_at_the_boundary() {
    for input in [
        nested_vectors(MAX_TYPE_TAG_NESTING),
        nested_coins(MAX_TYPE_TAG_NESTING),
    ] {
        let tag = parse_type_tag(&input, false).unwrap();
        assert_eq!(tag.nesting_depth(), MAX_TYPE_TAG_NESTING);
        let bytes = tag.bcs_to_bytes().unwrap();
        assert_ok_eq!(TypeTag::from_bcs_bytes(&bytes), tag);
    }
}

#[test]
fn test_nesting_beyond_limit_is_rejected() {
    assert_eq!(
        kind(&nested_vectors(MAX_TYPE_TAG_NESTING + 1), false),
        TypeTagParserErrorKind::NestingTooDeep
    );
    assert_eq!(
        kind(&nested_coins(MAX_TYPE_TAG_NESTING + 1), false),
        TypeTagParserErrorKind::NestingTooDeep
    );
    // A reference adds a level of its own.
    assert_ok!(parse_type_tag(
        &format!("&{}", nested_vectors(MAX_TYPE_TAG_NESTING - 1)),
        true
    ));
    assert_eq!(
        kind(&format!("&{}", nested_vectors(MAX_TYPE_TAG_NESTING)), true),
        TypeTagParserErrorKind::NestingTooDeep
    );
    assert_eq!(kind("&&signer", true), TypeTagParserErrorKind::InvalidTypeTag);
    // Fails fast instead of building the whole tree.
    assert_eq!(
        kind(&nested_vectors(100_000), false),
        TypeTagParserErrorKind::NestingTooDeep
    );
}

#[test]
fn test_encoding_beyond_limit_fails() {
    let mut tag = TypeTag::U8;
    for _ in 0..=MAX_TYPE_TAG_NESTING {
        tag = TypeTag::vector(tag);
    }
    assert_eq!(tag.nesting_depth(), MAX_TYPE_TAG_NESTING + 1);
    assert_err!(tag.bcs_to_bytes());
}

#[test]
fn test_arity_errors() {
    assert_eq!(
        kind("u8<u8>", false),
        TypeTagParserErrorKind::UnexpectedPrimitiveTypeArguments
    );
    assert_eq!(
        kind("vector<u8, u8>", false),
        TypeTagParserErrorKind::UnexpectedVectorTypeArgumentCount
    );
    assert_eq!(kind("vector", false), TypeTagParserErrorKind::UnexpectedVectorTypeArgumentCount);
}

#[test]
fn test_struct_format_errors() {
    assert_eq!(kind("u7", false), TypeTagParserErrorKind::InvalidTypeTag);
    assert_eq!(kind("0x1::coin", false), TypeTagParserErrorKind::UnexpectedStructFormat);
    assert_eq!(
        kind("0x1::co-in::Coin", false),
        TypeTagParserErrorKind::InvalidModuleNameCharacter
    );
    assert_eq!(
        kind("0x1::coin::Co$n", false),
        TypeTagParserErrorKind::InvalidStructNameCharacter
    );
    assert_eq!(kind("0xzz::coin::Coin", false), TypeTagParserErrorKind::InvalidAddress);
}

#[test]
fn test_error_names_the_input() {
    let err = parse_type_tag("vector<u8", false).unwrap_err();
    assert_eq!(err.input, "vector<u8");
    assert!(err.to_string().contains("vector<u8"));
}

#[test]
fn test_module_and_function_ids() {
    let module = parse_module_id("0x1::coin").unwrap();
    assert_eq!(module.address(), &AccountAddress::ONE);
    assert_eq!(module.name(), "coin");
    assert!(parse_module_id("0x1::coin::transfer").is_err());

    let (module, function) = parse_function_id("0x1::aptos_account::transfer").unwrap();
    assert_eq!(module.to_string(), "0x1::aptos_account");
    assert_eq!(function.as_str(), "transfer");
    assert!(parse_function_id("transfer").is_err());
}
