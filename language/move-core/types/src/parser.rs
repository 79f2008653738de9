// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parser for the textual type syntax, e.g. `0x1::coin::Coin<0x1::aptos_coin::AptosCoin>` or
//! `vector<u8>`.
//!
//! The scanner is a single pass over the input with an explicit stack of frames rather than
//! recursion. Each frame holds the identifier text accumulated before its `<`, the sibling type
//! arguments parsed so far at that depth, and the number of arguments expected there (one, plus
//! one per comma). The stack is capped at [`MAX_TYPE_TAG_NESTING`], so every parsed type can be
//! encoded and decoded again.

use crate::{
    account_address::AccountAddress,
    identifier::Identifier,
    language_storage::{ModuleId, StructTag, TypeTag, MAX_TYPE_TAG_NESTING},
};
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeTagParserErrorKind {
    InvalidTypeTag,
    UnexpectedGenericType,
    UnexpectedTypeArgumentClose,
    UnexpectedWhitespaceCharacter,
    UnexpectedComma,
    TypeArgumentCountMismatch,
    MissingTypeArgumentClose,
    UnexpectedPrimitiveTypeArguments,
    UnexpectedVectorTypeArgumentCount,
    UnexpectedStructFormat,
    InvalidModuleNameCharacter,
    InvalidStructNameCharacter,
    InvalidAddress,
    NestingTooDeep,
}

impl fmt::Display for TypeTagParserErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::InvalidTypeTag => "unknown type",
            Self::UnexpectedGenericType => "generic type parameters are not allowed here",
            Self::UnexpectedTypeArgumentClose => "unexpected '>'",
            Self::UnexpectedWhitespaceCharacter => "unexpected whitespace",
            Self::UnexpectedComma => "unexpected ','",
            Self::TypeArgumentCountMismatch => "type argument count does not match",
            Self::MissingTypeArgumentClose => "expected '>'",
            Self::UnexpectedPrimitiveTypeArguments => "primitive types take no type arguments",
            Self::UnexpectedVectorTypeArgumentCount => "vector takes exactly one type argument",
            Self::UnexpectedStructFormat => {
                "struct types must be of the form 'address::module::name'"
            },
            Self::InvalidModuleNameCharacter => "module name must only contain [A-Za-z0-9_]",
            Self::InvalidStructNameCharacter => "struct name must only contain [A-Za-z0-9_]",
            Self::InvalidAddress => "invalid address",
            Self::NestingTooDeep => "type arguments are nested too deeply",
        };
        f.write_str(reason)
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("failed to parse type '{input}': {kind}")]
pub struct TypeTagParserError {
    pub input: String,
    pub kind: TypeTagParserErrorKind,
}

impl TypeTagParserError {
    fn new(input: &str, kind: TypeTagParserErrorKind) -> Self {
        Self {
            input: input.to_string(),
            kind,
        }
    }
}

type Result<T> = std::result::Result<T, TypeTagParserErrorKind>;

/// Parser state saved when a `<` opens a nested argument list.
struct Frame {
    text: String,
    args: Vec<TypeTag>,
    expected_args: usize,
}

/// Parses a type. With `allow_generics`, placeholders `T0`, `T1`, ... are accepted as
/// [`TypeTag::Generic`]; otherwise they are an error.
pub fn parse_type_tag(
    input: &str,
    allow_generics: bool,
) -> std::result::Result<TypeTag, TypeTagParserError> {
    let tag = scan(input, allow_generics).map_err(|kind| TypeTagParserError::new(input, kind))?;
    if tag.nesting_depth() > MAX_TYPE_TAG_NESTING {
        return Err(TypeTagParserError::new(
            input,
            TypeTagParserErrorKind::NestingTooDeep,
        ));
    }
    Ok(tag)
}

pub fn parse_struct_tag(input: &str) -> std::result::Result<StructTag, TypeTagParserError> {
    match parse_type_tag(input, false)? {
        TypeTag::Struct(tag) => Ok(*tag),
        _ => Err(TypeTagParserError::new(
            input,
            TypeTagParserErrorKind::UnexpectedStructFormat,
        )),
    }
}

/// Parses `address::module`.
pub fn parse_module_id(input: &str) -> std::result::Result<ModuleId, TypeTagParserError> {
    let err = |kind| TypeTagParserError::new(input, kind);
    let parts: Vec<&str> = input.trim().split("::").collect();
    let [address, module] = parts.as_slice() else {
        return Err(err(TypeTagParserErrorKind::UnexpectedStructFormat));
    };
    Ok(ModuleId::new(
        parse_address(address).map_err(err)?,
        parse_name(module, TypeTagParserErrorKind::InvalidModuleNameCharacter).map_err(err)?,
    ))
}

/// Parses `address::module::function`.
pub fn parse_function_id(
    input: &str,
) -> std::result::Result<(ModuleId, Identifier), TypeTagParserError> {
    let err = |kind| TypeTagParserError::new(input, kind);
    let trimmed = input.trim();
    let (module, function) = trimmed
        .rsplit_once("::")
        .ok_or_else(|| err(TypeTagParserErrorKind::UnexpectedStructFormat))?;
    let module_id = parse_module_id(module).map_err(|e| err(e.kind))?;
    let function = parse_name(function, TypeTagParserErrorKind::InvalidStructNameCharacter)
        .map_err(err)?;
    Ok((module_id, function))
}

fn scan(input: &str, allow_generics: bool) -> Result<TypeTag> {
    let mut stack: Vec<Frame> = vec![];
    let mut text = String::new();
    // Arguments of the most recently closed `<...>`, owned by the identifier in `text`.
    let mut inner: Vec<TypeTag> = vec![];
    let mut args: Vec<TypeTag> = vec![];
    let mut expected_args = 1usize;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                stack.push(Frame {
                    text: std::mem::take(&mut text),
                    args: std::mem::take(&mut args),
                    expected_args,
                });
                if stack.len() > MAX_TYPE_TAG_NESTING {
                    return Err(TypeTagParserErrorKind::NestingTooDeep);
                }
                expected_args = 1;
            },
            '>' => {
                if !text.is_empty() {
                    args.push(finish(&mut text, &mut inner, allow_generics)?);
                }
                let frame = stack
                    .pop()
                    .ok_or(TypeTagParserErrorKind::UnexpectedTypeArgumentClose)?;
                if args.len() != expected_args {
                    return Err(TypeTagParserErrorKind::TypeArgumentCountMismatch);
                }
                inner = std::mem::replace(&mut args, frame.args);
                text = frame.text;
                expected_args = frame.expected_args;
            },
            ',' => {
                if stack.is_empty() {
                    return Err(TypeTagParserErrorKind::UnexpectedComma);
                }
                if !text.is_empty() {
                    args.push(finish(&mut text, &mut inner, allow_generics)?);
                }
                expected_args += 1;
            },
            c if c.is_whitespace() => {
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                if !text.is_empty() {
                    // A token may only be followed by a separator, never by another token or
                    // its own `<`.
                    if !matches!(chars.peek(), None | Some(',') | Some('>')) {
                        return Err(TypeTagParserErrorKind::UnexpectedWhitespaceCharacter);
                    }
                    args.push(finish(&mut text, &mut inner, allow_generics)?);
                }
            },
            c => text.push(c),
        }
    }

    if !stack.is_empty() {
        return Err(TypeTagParserErrorKind::MissingTypeArgumentClose);
    }
    match args.len() {
        0 => finish(&mut text, &mut inner, allow_generics),
        1 if text.is_empty() => Ok(args.remove(0)),
        _ => Err(TypeTagParserErrorKind::UnexpectedWhitespaceCharacter),
    }
}

/// Turns the accumulated identifier text plus the arguments of its `<...>` into a type.
fn finish(text: &mut String, inner: &mut Vec<TypeTag>, allow_generics: bool) -> Result<TypeTag> {
    let text = std::mem::take(text);
    let type_args = std::mem::take(inner);
    leaf(&text, type_args, allow_generics)
}

fn leaf(text: &str, mut type_args: Vec<TypeTag>, allow_generics: bool) -> Result<TypeTag> {
    let trimmed = text.trim();
    let primitive = match trimmed {
        "bool" => Some(TypeTag::Bool),
        "u8" => Some(TypeTag::U8),
        "u16" => Some(TypeTag::U16),
        "u32" => Some(TypeTag::U32),
        "u64" => Some(TypeTag::U64),
        "u128" => Some(TypeTag::U128),
        "u256" => Some(TypeTag::U256),
        "address" => Some(TypeTag::Address),
        "signer" => Some(TypeTag::Signer),
        "vector" => {
            if type_args.len() != 1 {
                return Err(TypeTagParserErrorKind::UnexpectedVectorTypeArgumentCount);
            }
            return Ok(TypeTag::vector(type_args.remove(0)));
        },
        _ => None,
    };
    if let Some(primitive) = primitive {
        if !type_args.is_empty() {
            return Err(TypeTagParserErrorKind::UnexpectedPrimitiveTypeArguments);
        }
        return Ok(primitive);
    }

    if let Some(referenced) = trimmed.strip_prefix('&') {
        if referenced.is_empty() || referenced.starts_with('&') {
            return Err(TypeTagParserErrorKind::InvalidTypeTag);
        }
        return Ok(TypeTag::Reference(Box::new(leaf(
            referenced,
            type_args,
            allow_generics,
        )?)));
    }

    if let Some(index) = generic_index(trimmed) {
        if !allow_generics {
            return Err(TypeTagParserErrorKind::UnexpectedGenericType);
        }
        if !type_args.is_empty() {
            return Err(TypeTagParserErrorKind::UnexpectedPrimitiveTypeArguments);
        }
        return Ok(TypeTag::Generic(index));
    }

    if !trimmed.contains(':') {
        return Err(TypeTagParserErrorKind::InvalidTypeTag);
    }
    let parts: Vec<&str> = trimmed.split("::").collect();
    let [address, module, name] = parts.as_slice() else {
        return Err(TypeTagParserErrorKind::UnexpectedStructFormat);
    };
    let module = parse_name(module, TypeTagParserErrorKind::InvalidModuleNameCharacter)?;
    let name = parse_name(name, TypeTagParserErrorKind::InvalidStructNameCharacter)?;
    Ok(TypeTag::from(StructTag::new(
        parse_address(address)?,
        module,
        name,
        type_args,
    )))
}

/// `T` followed by one or more decimal digits.
fn generic_index(text: &str) -> Option<u32> {
    let digits = text.strip_prefix('T')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_address(text: &str) -> Result<AccountAddress> {
    text.parse::<AccountAddress>()
        .map_err(|_| TypeTagParserErrorKind::InvalidAddress)
}

fn parse_name(text: &str, kind: TypeTagParserErrorKind) -> Result<Identifier> {
    Identifier::new(text).map_err(|_| kind)
}
