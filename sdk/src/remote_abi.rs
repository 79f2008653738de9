// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Builds entry function payloads from loosely typed arguments, using the function's ABI to
//! decide how each argument is encoded.
//!
//! Arguments may be JSON values (as an application or a REST client would hold them), raw bytes
//! for `vector<u8>` parameters, or already typed [`MoveValue`]s. Each one is converted against
//! the parameter type at the same position, with the caller's type arguments substituted for
//! the function's type parameters.

use crate::abi_cache::{AbiCache, ModuleAbiSource};
use anyhow::{ensure, format_err, Context, Result};
use aptos_bcs_utils::{BcsError, U256};
use aptos_types::transaction::EntryFunction;
use move_core_types::{
    account_address::AccountAddress,
    identifier::Identifier,
    language_storage::{ModuleId, StructTag, TypeTag},
    parser::{parse_function_id, parse_type_tag},
    value::MoveValue,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A module's ABI as served by the REST API.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct MoveModuleAbi {
    pub address: String,
    pub name: String,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub exposed_functions: Vec<MoveFunctionAbi>,
}

impl MoveModuleAbi {
    pub fn function(&self, name: &str) -> Option<&MoveFunctionAbi> {
        self.exposed_functions.iter().find(|f| f.name == name)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct MoveFunctionAbi {
    pub name: String,
    pub visibility: String,
    pub is_entry: bool,
    #[serde(default)]
    pub is_view: bool,
    pub generic_type_params: Vec<MoveFunctionGenericTypeParam>,
    /// Parameter types in the textual type syntax, e.g. `&signer` or `vector<u8>`.
    pub params: Vec<String>,
    #[serde(rename = "return")]
    pub return_: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct MoveFunctionGenericTypeParam {
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// The part of an entry function's ABI needed to encode a call to it. Leading signer
/// parameters are not included since they are supplied by the transaction's signers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryFunctionAbi {
    module: ModuleId,
    name: Identifier,
    type_param_count: usize,
    params: Vec<TypeTag>,
}

impl EntryFunctionAbi {
    pub fn new(
        module: ModuleId,
        name: Identifier,
        type_param_count: usize,
        params: Vec<TypeTag>,
    ) -> Self {
        Self {
            module,
            name,
            type_param_count,
            params,
        }
    }

    pub fn from_function_abi(module: ModuleId, function: &MoveFunctionAbi) -> Result<Self> {
        ensure!(
            function.is_entry,
            "{}::{} is not an entry function",
            module,
            function.name
        );
        let name = Identifier::new(function.name.as_str())?;
        let params = function
            .params
            .iter()
            .map(|param| {
                parse_type_tag(param, true)
                    .with_context(|| format!("invalid parameter type in {}::{}", module, name))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .skip_while(TypeTag::is_signer)
            .collect();
        Ok(Self::new(
            module,
            name,
            function.generic_type_params.len(),
            params,
        ))
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn type_param_count(&self) -> usize {
        self.type_param_count
    }

    pub fn params(&self) -> &[TypeTag] {
        &self.params
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("argument {position}: expected {expected}, got {found}")]
    TypeMismatch {
        position: usize,
        expected: String,
        found: String,
    },
    #[error(
        "argument {position}: type parameter T{index} is out of range, {available} type \
         arguments were given"
    )]
    UnresolvedGeneric {
        position: usize,
        index: u32,
        available: usize,
    },
    #[error("expected {expected} arguments, got {found}")]
    WrongArgumentCount { expected: usize, found: usize },
    #[error("expected {expected} type arguments, got {found}")]
    WrongTypeArgumentCount { expected: usize, found: usize },
    #[error("argument {position}: {source}")]
    Encoding {
        position: usize,
        #[source]
        source: BcsError,
    },
}

/// An argument to an entry function before it is checked against the ABI.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryFunctionArgument {
    Json(Value),
    /// Raw bytes, accepted for `vector<u8>` parameters.
    Bytes(Vec<u8>),
    Typed(MoveValue),
}

impl From<Value> for EntryFunctionArgument {
    fn from(value: Value) -> Self {
        EntryFunctionArgument::Json(value)
    }
}

impl From<Vec<u8>> for EntryFunctionArgument {
    fn from(bytes: Vec<u8>) -> Self {
        EntryFunctionArgument::Bytes(bytes)
    }
}

impl From<MoveValue> for EntryFunctionArgument {
    fn from(value: MoveValue) -> Self {
        EntryFunctionArgument::Typed(value)
    }
}

impl fmt::Display for EntryFunctionArgument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntryFunctionArgument::Json(value) => write!(f, "{}", value),
            EntryFunctionArgument::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            EntryFunctionArgument::Typed(value) => write!(f, "{}", value),
        }
    }
}

/// Fetches `module::function` from `source` and checks that it is an entry function.
pub async fn fetch_entry_function_abi(
    source: &dyn ModuleAbiSource,
    module: &ModuleId,
    function: &str,
) -> Result<EntryFunctionAbi> {
    let module_abi = source
        .get_module_abi(module)
        .await
        .with_context(|| format!("failed to fetch the ABI of module {}", module))?;
    let function_abi = module_abi
        .function(function)
        .ok_or_else(|| format_err!("function {} not found in module {}", function, module))?;
    EntryFunctionAbi::from_function_abi(module.clone(), function_abi)
}

/// Encodes a call to the function `abi` describes. Fails with an [`ArgumentError`] if the
/// number of type arguments or arguments does not match, or an argument does not fit its
/// parameter.
pub fn generate_entry_function_payload(
    abi: &EntryFunctionAbi,
    type_args: Vec<TypeTag>,
    args: Vec<EntryFunctionArgument>,
) -> Result<EntryFunction> {
    if type_args.len() != abi.type_param_count {
        return Err(ArgumentError::WrongTypeArgumentCount {
            expected: abi.type_param_count,
            found: type_args.len(),
        }
        .into());
    }
    if args.len() != abi.params.len() {
        return Err(ArgumentError::WrongArgumentCount {
            expected: abi.params.len(),
            found: args.len(),
        }
        .into());
    }

    let encoded_args = abi
        .params
        .iter()
        .zip(args.iter())
        .enumerate()
        .map(|(position, (param, arg))| {
            let value = convert_argument(position, param, &type_args, arg)?;
            value
                .simple_serialize()
                .map_err(|source| ArgumentError::Encoding { position, source })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(EntryFunction::new(
        abi.module.clone(),
        abi.name.clone(),
        type_args,
        encoded_args,
    ))
}

/// Like [`generate_entry_function_payload`], but looks the ABI of `function_id`
/// (`address::module::function`) up through `cache`.
pub async fn generate_entry_function_payload_with_cache(
    cache: &AbiCache,
    function_id: &str,
    type_args: Vec<TypeTag>,
    args: Vec<EntryFunctionArgument>,
) -> Result<EntryFunction> {
    let (module, function) = parse_function_id(function_id)?;
    let abi = cache
        .get_entry_function_abi(&module, function.as_str())
        .await?;
    generate_entry_function_payload(&abi, type_args, args)
}

/// Converts `arg` into a value of type `param`, substituting `type_args` for generic
/// placeholders. `position` is only used to report errors.
pub fn convert_argument(
    position: usize,
    param: &TypeTag,
    type_args: &[TypeTag],
    arg: &EntryFunctionArgument,
) -> std::result::Result<MoveValue, ArgumentError> {
    let ty = substitute(position, param, type_args)?;
    match arg {
        EntryFunctionArgument::Typed(value) => {
            if value.matches_type(&ty) {
                Ok(value.clone())
            } else {
                Err(mismatch(position, &ty, value))
            }
        },
        EntryFunctionArgument::Json(value) => convert_json(position, &ty, value),
        EntryFunctionArgument::Bytes(bytes) => convert_bytes(position, &ty, bytes),
    }
}

fn substitute(
    position: usize,
    ty: &TypeTag,
    type_args: &[TypeTag],
) -> std::result::Result<TypeTag, ArgumentError> {
    Ok(match ty {
        TypeTag::Generic(index) => type_args
            .get(*index as usize)
            .cloned()
            .ok_or(ArgumentError::UnresolvedGeneric {
                position,
                index: *index,
                available: type_args.len(),
            })?,
        TypeTag::Vector(inner) => TypeTag::vector(substitute(position, inner, type_args)?),
        TypeTag::Reference(inner) => {
            TypeTag::Reference(Box::new(substitute(position, inner, type_args)?))
        },
        TypeTag::Struct(tag) => {
            let type_args = tag
                .type_args
                .iter()
                .map(|arg| substitute(position, arg, type_args))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            TypeTag::Struct(Box::new(StructTag {
                type_args,
                ..tag.as_ref().clone()
            }))
        },
        _ => ty.clone(),
    })
}

fn mismatch(position: usize, expected: &TypeTag, found: impl fmt::Display) -> ArgumentError {
    ArgumentError::TypeMismatch {
        position,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn convert_bytes(
    position: usize,
    ty: &TypeTag,
    bytes: &[u8],
) -> std::result::Result<MoveValue, ArgumentError> {
    match ty {
        TypeTag::Vector(inner) if **inner == TypeTag::U8 => {
            Ok(MoveValue::vector_u8(bytes.to_vec()))
        },
        TypeTag::Struct(tag) if tag.is_option() => match tag.type_args.first() {
            Some(inner) => Ok(MoveValue::some(convert_bytes(position, inner, bytes)?)),
            None => Err(mismatch(position, ty, format!("0x{}", hex::encode(bytes)))),
        },
        _ => Err(mismatch(position, ty, format!("0x{}", hex::encode(bytes)))),
    }
}

fn convert_json(
    position: usize,
    ty: &TypeTag,
    value: &Value,
) -> std::result::Result<MoveValue, ArgumentError> {
    let err = || mismatch(position, ty, value);
    Ok(match ty {
        TypeTag::Bool => MoveValue::Bool(value.as_bool().ok_or_else(err)?),
        TypeTag::U8 => MoveValue::U8(small_uint(value).ok_or_else(err)?),
        TypeTag::U16 => MoveValue::U16(small_uint(value).ok_or_else(err)?),
        TypeTag::U32 => MoveValue::U32(small_uint(value).ok_or_else(err)?),
        TypeTag::U64 => MoveValue::U64(parse_uint(value).ok_or_else(err)?),
        TypeTag::U128 => MoveValue::U128(parse_uint(value).ok_or_else(err)?),
        TypeTag::U256 => MoveValue::U256(parse_uint::<U256>(value).ok_or_else(err)?),
        TypeTag::Address => MoveValue::Address(parse_address(value).ok_or_else(err)?),
        TypeTag::Vector(inner) => match (inner.as_ref(), value) {
            (TypeTag::U8, Value::String(s)) => MoveValue::vector_u8(s.as_bytes().to_vec()),
            (_, Value::Array(elements)) => MoveValue::Vector(
                elements
                    .iter()
                    .map(|element| convert_json(position, inner, element))
                    .collect::<std::result::Result<_, _>>()?,
            ),
            _ => return Err(err()),
        },
        TypeTag::Struct(tag) if tag.is_string() => {
            MoveValue::String(value.as_str().ok_or_else(err)?.to_string())
        },
        // The type argument of `Object<T>` has no bearing on the encoding.
        TypeTag::Struct(tag) if tag.is_object() => {
            MoveValue::Address(parse_address(value).ok_or_else(err)?)
        },
        TypeTag::Struct(tag) if tag.is_option() => match (value, tag.type_args.first()) {
            (Value::Null, _) => MoveValue::none(),
            (value, Some(inner)) => MoveValue::some(convert_json(position, inner, value)?),
            (_, None) => return Err(err()),
        },
        TypeTag::Struct(_)
        | TypeTag::Signer
        | TypeTag::Reference(_)
        | TypeTag::Generic(_) => return Err(err()),
    })
}

/// `u8`, `u16` and `u32` only accept JSON numbers.
fn small_uint<T: TryFrom<u64>>(value: &Value) -> Option<T> {
    value.as_u64().and_then(|n| T::try_from(n).ok())
}

/// Wider integers accept JSON numbers and decimal strings.
fn parse_uint<T: FromStr>(value: &Value) -> Option<T> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_address(value: &Value) -> Option<AccountAddress> {
    value.as_str().and_then(|s| AccountAddress::from_str(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_err, assert_matches, assert_ok};
    use serde_json::json;

    fn ty(s: &str) -> TypeTag {
        parse_type_tag(s, true).unwrap()
    }

    fn convert(
        param: &str,
        arg: impl Into<EntryFunctionArgument>,
    ) -> Result<MoveValue, ArgumentError> {
        convert_argument(0, &ty(param), &[], &arg.into())
    }

    fn transfer_abi_json() -> MoveFunctionAbi {
        serde_json::from_value(json!({
            "name": "transfer",
            "visibility": "public",
            "is_entry": true,
            "is_view": false,
            "generic_type_params": [{"constraints": []}],
            "params": ["&signer", "address", "u64"],
            "return": []
        }))
        .unwrap()
    }

    fn coin_module() -> ModuleId {
        ModuleId::new(AccountAddress::ONE, Identifier::new("coin").unwrap())
    }

    #[test]
    fn test_integers() {
        assert_eq!(convert("u64", json!("1")).unwrap(), MoveValue::U64(1));
        assert_eq!(convert("u64", json!(1)).unwrap(), MoveValue::U64(1));
        assert_eq!(convert("u8", json!(255)).unwrap(), MoveValue::U8(255));
        assert_eq!(convert("u16", json!(65535)).unwrap(), MoveValue::U16(65535));
        assert_eq!(convert("u32", json!(7)).unwrap(), MoveValue::U32(7));
        assert_eq!(
            convert("u128", json!("340282366920938463463374607431768211455")).unwrap(),
            MoveValue::U128(u128::MAX)
        );
        assert_eq!(
            convert(
                "u256",
                json!("115792089237316195423570985008687907853269984665640564039457584007913129639935")
            )
            .unwrap(),
            MoveValue::U256(U256::MAX)
        );

        assert_err!(convert("u8", json!(256)));
        assert_err!(convert("u8", json!("1")));
        assert_err!(convert("u64", json!(-1)));
        assert_err!(convert("u64", json!("18446744073709551616")));
        assert_err!(convert("u64", json!("one")));
        assert_err!(convert("u64", json!(1.5)));
    }

    #[test]
    fn test_option() {
        assert_eq!(
            convert("0x1::option::Option<u8>", Value::Null).unwrap(),
            MoveValue::none()
        );
        assert_eq!(
            convert("0x1::option::Option<u8>", json!(3)).unwrap(),
            MoveValue::some(MoveValue::U8(3))
        );
        assert_err!(convert("0x1::option::Option<u8>", json!(300)));
    }

    #[test]
    fn test_strings_addresses_and_objects() {
        assert_eq!(
            convert("0x1::string::String", json!("hello")).unwrap(),
            MoveValue::String("hello".to_string())
        );
        assert_eq!(
            convert("address", json!("0x1")).unwrap(),
            MoveValue::Address(AccountAddress::ONE)
        );
        assert_eq!(
            convert("0x1::object::Object<0x1::fungible_asset::Metadata>", json!("0xa")).unwrap(),
            MoveValue::Address(AccountAddress::TEN)
        );
        assert_err!(convert("address", json!("0xzz")));
        assert_err!(convert("0x1::coin::Coin<0x1::aptos_coin::AptosCoin>", json!("0x1")));
        assert_err!(convert("bool", json!("true")));
    }

    #[test]
    fn test_byte_vectors() {
        let expected = MoveValue::vector_u8(b"abc".to_vec());
        assert_eq!(convert("vector<u8>", json!("abc")).unwrap(), expected);
        assert_eq!(convert("vector<u8>", json!([97, 98, 99])).unwrap(), expected);
        assert_eq!(convert("vector<u8>", b"abc".to_vec()).unwrap(), expected);
        assert_eq!(
            convert("0x1::option::Option<vector<u8>>", vec![1u8]).unwrap(),
            MoveValue::some(MoveValue::vector_u8(vec![1]))
        );

        assert_eq!(
            convert("vector<address>", json!(["0x1", "0x3"])).unwrap(),
            MoveValue::vector_address(vec![AccountAddress::ONE, AccountAddress::THREE])
        );
        assert_err!(convert("vector<u64>", json!("abc")));
        assert_err!(convert("u64", vec![1u8]));
    }

    #[test]
    fn test_typed_values() {
        assert_ok!(convert("u64", MoveValue::U64(5)));
        assert_ok!(convert(
            "0x1::option::Option<vector<u8>>",
            MoveValue::some(MoveValue::vector_u8(vec![1]))
        ));
        assert_matches!(
            convert("u64", MoveValue::U8(5)),
            Err(ArgumentError::TypeMismatch { position: 0, .. })
        );
    }

    #[test]
    fn test_generics() {
        let type_args = vec![TypeTag::U64];
        assert_eq!(
            convert_argument(2, &ty("vector<T0>"), &type_args, &json!(["1", 2]).into()).unwrap(),
            MoveValue::Vector(vec![MoveValue::U64(1), MoveValue::U64(2)])
        );

        let err = convert_argument(2, &ty("T1"), &type_args, &json!(1).into()).unwrap_err();
        assert_eq!(err, ArgumentError::UnresolvedGeneric {
            position: 2,
            index: 1,
            available: 1,
        });
        assert!(err.to_string().starts_with("argument 2:"));
    }

    #[test]
    fn test_entry_function_abi_from_function_abi() {
        let abi = EntryFunctionAbi::from_function_abi(coin_module(), &transfer_abi_json()).unwrap();
        assert_eq!(abi.params(), &[TypeTag::Address, TypeTag::U64]);
        assert_eq!(abi.type_param_count(), 1);
        assert_eq!(abi.name().as_str(), "transfer");

        let mut view = transfer_abi_json();
        view.is_entry = false;
        assert_err!(EntryFunctionAbi::from_function_abi(coin_module(), &view));

        let mut bad_param = transfer_abi_json();
        bad_param.params.push("vector<u8".to_string());
        assert_err!(EntryFunctionAbi::from_function_abi(coin_module(), &bad_param));
    }

    struct StaticSource(MoveModuleAbi);

    #[async_trait::async_trait]
    impl ModuleAbiSource for StaticSource {
        async fn get_module_abi(&self, module: &ModuleId) -> Result<MoveModuleAbi> {
            ensure!(module == &coin_module(), "module {} not found", module);
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_generate_entry_function_payload_with_cache() {
        let module_abi = MoveModuleAbi {
            address: "0x1".to_string(),
            name: "coin".to_string(),
            friends: vec![],
            exposed_functions: vec![transfer_abi_json()],
        };
        let cache = AbiCache::new(
            crate::abi_cache::AbiCacheConfig::default(),
            std::sync::Arc::new(StaticSource(module_abi)),
        );

        let payload = generate_entry_function_payload_with_cache(
            &cache,
            "0x1::coin::transfer",
            vec![ty("0x1::aptos_coin::AptosCoin")],
            vec![json!("0x3").into(), json!(5).into()],
        )
        .await
        .unwrap();
        assert_eq!(payload.args()[1], 5u64.to_le_bytes().to_vec());

        assert_err!(
            generate_entry_function_payload_with_cache(&cache, "0x1::coin", vec![], vec![]).await
        );
        assert_err!(
            generate_entry_function_payload_with_cache(
                &cache,
                "0x1::account::create_account",
                vec![],
                vec![json!("0x3").into()],
            )
            .await
        );
    }

    #[test]
    fn test_generate_entry_function_payload() {
        let abi = EntryFunctionAbi::from_function_abi(coin_module(), &transfer_abi_json()).unwrap();
        let aptos_coin = ty("0x1::aptos_coin::AptosCoin");

        let payload = generate_entry_function_payload(
            &abi,
            vec![aptos_coin.clone()],
            vec![json!("0x3").into(), json!("1000").into()],
        )
        .unwrap();
        assert_eq!(payload.module(), &coin_module());
        assert_eq!(payload.function().as_str(), "transfer");
        assert_eq!(payload.ty_args(), &[aptos_coin.clone()]);
        assert_eq!(payload.args()[0], AccountAddress::THREE.to_vec());
        assert_eq!(payload.args()[1], 1000u64.to_le_bytes().to_vec());

        let err = generate_entry_function_payload(&abi, vec![], vec![]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ArgumentError>(),
            Some(&ArgumentError::WrongTypeArgumentCount {
                expected: 1,
                found: 0
            })
        );
        let err = generate_entry_function_payload(&abi, vec![aptos_coin.clone()], vec![
            json!("0x3").into(),
        ])
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ArgumentError>(),
            Some(&ArgumentError::WrongArgumentCount {
                expected: 2,
                found: 1
            })
        );
        let err = generate_entry_function_payload(&abi, vec![aptos_coin], vec![
            json!("0x3").into(),
            json!(true).into(),
        ])
        .unwrap_err();
        assert_matches!(
            err.downcast_ref::<ArgumentError>(),
            Some(ArgumentError::TypeMismatch { position: 1, .. })
        );
    }
}
