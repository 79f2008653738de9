// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress,
    identifier::{Identifier, IdentifierError},
    parser::{parse_struct_tag, parse_type_tag, TypeTagParserError},
};
use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use std::{fmt, str::FromStr};

pub const CORE_CODE_ADDRESS: AccountAddress = AccountAddress::ONE;

/// Deepest nesting of a type tag. Every `vector<..>`, struct type argument list and reference
/// adds one level. Enforced by the parser, the encoder and the decoder alike.
pub const MAX_TYPE_TAG_NESTING: usize = 128;

fn nesting_too_deep() -> BcsError {
    BcsError::invalid_value(
        "TypeTag",
        format!("nesting deeper than {}", MAX_TYPE_TAG_NESTING),
    )
}

/// Variant indices of [`TypeTag`] on the wire. They are not contiguous: the integer types added
/// later were appended after `Struct`, and the ABI-only variants sit at the top of the range.
mod variant {
    pub const BOOL: u32 = 0;
    pub const U8: u32 = 1;
    pub const U64: u32 = 2;
    pub const U128: u32 = 3;
    pub const ADDRESS: u32 = 4;
    pub const SIGNER: u32 = 5;
    pub const VECTOR: u32 = 6;
    pub const STRUCT: u32 = 7;
    pub const U16: u32 = 8;
    pub const U32: u32 = 9;
    pub const U256: u32 = 10;
    pub const REFERENCE: u32 = 254;
    pub const GENERIC: u32 = 255;
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TypeTag {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    /// An unresolved type parameter of a function signature. Only meaningful in ABIs; never part
    /// of a submitted transaction.
    Generic(u32),
    /// A reference parameter such as `&signer`. Only meaningful in ABIs.
    Reference(Box<TypeTag>),
}

impl TypeTag {
    pub fn vector(element: TypeTag) -> Self {
        TypeTag::Vector(Box::new(element))
    }

    pub fn is_signer(&self) -> bool {
        match self {
            TypeTag::Signer => true,
            TypeTag::Reference(inner) => inner.is_signer(),
            _ => false,
        }
    }

    pub fn as_struct(&self) -> Option<&StructTag> {
        match self {
            TypeTag::Struct(tag) => Some(tag),
            _ => None,
        }
    }

    /// True if no `Generic` placeholder or `Reference` appears anywhere in the tree.
    pub fn is_concrete(&self) -> bool {
        match self {
            TypeTag::Generic(_) | TypeTag::Reference(_) => false,
            TypeTag::Vector(inner) => inner.is_concrete(),
            TypeTag::Struct(tag) => tag.type_args.iter().all(TypeTag::is_concrete),
            _ => true,
        }
    }

    /// Canonical textual form, with struct addresses in long form.
    pub fn to_canonical_string(&self) -> String {
        match self {
            TypeTag::Vector(inner) => format!("vector<{}>", inner.to_canonical_string()),
            TypeTag::Struct(tag) => tag.to_canonical_string(),
            TypeTag::Reference(inner) => format!("&{}", inner.to_canonical_string()),
            other => other.to_string(),
        }
    }

    fn deserialize_with_depth(
        deserializer: &mut Deserializer<'_>,
        depth: usize,
    ) -> aptos_bcs_utils::Result<Self> {
        if depth > MAX_TYPE_TAG_NESTING {
            return Err(nesting_too_deep());
        }
        let index = deserializer.deserialize_variant_index()?;
        Ok(match index {
            variant::BOOL => TypeTag::Bool,
            variant::U8 => TypeTag::U8,
            variant::U64 => TypeTag::U64,
            variant::U128 => TypeTag::U128,
            variant::ADDRESS => TypeTag::Address,
            variant::SIGNER => TypeTag::Signer,
            variant::VECTOR => {
                TypeTag::Vector(Box::new(Self::deserialize_with_depth(deserializer, depth + 1)?))
            },
            variant::STRUCT => TypeTag::Struct(Box::new(StructTag::deserialize_with_depth(
                deserializer,
                depth,
            )?)),
            variant::U16 => TypeTag::U16,
            variant::U32 => TypeTag::U32,
            variant::U256 => TypeTag::U256,
            variant::REFERENCE => TypeTag::Reference(Box::new(Self::deserialize_with_depth(
                deserializer,
                depth + 1,
            )?)),
            variant::GENERIC => TypeTag::Generic(deserializer.deserialize_u32()?),
            index => return Err(BcsError::unknown_variant("TypeTag", index)),
        })
    }
}

impl TypeTag {
    fn serialize_with_depth(
        &self,
        serializer: &mut Serializer,
        depth: usize,
    ) -> aptos_bcs_utils::Result<()> {
        if depth > MAX_TYPE_TAG_NESTING {
            return Err(nesting_too_deep());
        }
        match self {
            TypeTag::Bool => serializer.serialize_variant_index(variant::BOOL),
            TypeTag::U8 => serializer.serialize_variant_index(variant::U8),
            TypeTag::U16 => serializer.serialize_variant_index(variant::U16),
            TypeTag::U32 => serializer.serialize_variant_index(variant::U32),
            TypeTag::U64 => serializer.serialize_variant_index(variant::U64),
            TypeTag::U128 => serializer.serialize_variant_index(variant::U128),
            TypeTag::U256 => serializer.serialize_variant_index(variant::U256),
            TypeTag::Address => serializer.serialize_variant_index(variant::ADDRESS),
            TypeTag::Signer => serializer.serialize_variant_index(variant::SIGNER),
            TypeTag::Vector(inner) => {
                serializer.serialize_variant_index(variant::VECTOR);
                inner.serialize_with_depth(serializer, depth + 1)?;
            },
            TypeTag::Struct(tag) => {
                serializer.serialize_variant_index(variant::STRUCT);
                tag.serialize_with_depth(serializer, depth)?;
            },
            TypeTag::Generic(index) => {
                serializer.serialize_variant_index(variant::GENERIC);
                serializer.serialize_u32(*index);
            },
            TypeTag::Reference(inner) => {
                serializer.serialize_variant_index(variant::REFERENCE);
                inner.serialize_with_depth(serializer, depth + 1)?;
            },
        }
        Ok(())
    }

    /// Nesting depth as counted against [`MAX_TYPE_TAG_NESTING`]. Stops descending once the
    /// limit is exceeded.
    pub fn nesting_depth(&self) -> usize {
        fn depth_of(tag: &TypeTag, depth: usize) -> usize {
            if depth > MAX_TYPE_TAG_NESTING {
                return depth;
            }
            match tag {
                TypeTag::Vector(inner) | TypeTag::Reference(inner) => depth_of(inner, depth + 1),
                TypeTag::Struct(tag) => tag
                    .type_args
                    .iter()
                    .map(|arg| depth_of(arg, depth + 1))
                    .max()
                    .unwrap_or(depth),
                _ => depth,
            }
        }
        depth_of(self, 0)
    }
}

impl Serializable for TypeTag {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        self.serialize_with_depth(serializer, 0)
    }
}

impl Deserializable for TypeTag {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Self::deserialize_with_depth(deserializer, 0)
    }
}

impl FromStr for TypeTag {
    type Err = TypeTagParserError;

    /// Parses a concrete type; `T0`-style placeholders are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_type_tag(s, false)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::U8 => write!(f, "u8"),
            TypeTag::U16 => write!(f, "u16"),
            TypeTag::U32 => write!(f, "u32"),
            TypeTag::U64 => write!(f, "u64"),
            TypeTag::U128 => write!(f, "u128"),
            TypeTag::U256 => write!(f, "u256"),
            TypeTag::Address => write!(f, "address"),
            TypeTag::Signer => write!(f, "signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{}>", inner),
            TypeTag::Struct(tag) => write!(f, "{}", tag),
            TypeTag::Generic(index) => write!(f, "T{}", index),
            TypeTag::Reference(inner) => write!(f, "&{}", inner),
        }
    }
}

impl From<StructTag> for TypeTag {
    fn from(tag: StructTag) -> Self {
        TypeTag::Struct(Box::new(tag))
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StructTag {
    pub address: AccountAddress,
    pub module: Identifier,
    pub name: Identifier,
    pub type_args: Vec<TypeTag>,
}

impl StructTag {
    pub fn new(
        address: AccountAddress,
        module: Identifier,
        name: Identifier,
        type_args: Vec<TypeTag>,
    ) -> Self {
        Self {
            address,
            module,
            name,
            type_args,
        }
    }

    fn framework(module: &str, name: &str, type_args: Vec<TypeTag>) -> Result<Self, IdentifierError> {
        Ok(Self::new(
            CORE_CODE_ADDRESS,
            Identifier::new(module)?,
            Identifier::new(name)?,
            type_args,
        ))
    }

    /// `0x1::string::String`
    pub fn string() -> Result<Self, IdentifierError> {
        Self::framework("string", "String", vec![])
    }

    /// `0x1::option::Option<T>`
    pub fn option(inner: TypeTag) -> Result<Self, IdentifierError> {
        Self::framework("option", "Option", vec![inner])
    }

    /// `0x1::object::Object<T>`
    pub fn object(inner: TypeTag) -> Result<Self, IdentifierError> {
        Self::framework("object", "Object", vec![inner])
    }

    fn is_framework(&self, module: &str, name: &str) -> bool {
        self.address == CORE_CODE_ADDRESS
            && self.module.as_str() == module
            && self.name.as_str() == name
    }

    pub fn is_string(&self) -> bool {
        self.is_framework("string", "String")
    }

    pub fn is_option(&self) -> bool {
        self.is_framework("option", "Option")
    }

    pub fn is_object(&self) -> bool {
        self.is_framework("object", "Object")
    }

    pub fn module_id(&self) -> ModuleId {
        ModuleId::new(self.address, self.module.to_owned())
    }

    pub fn to_canonical_string(&self) -> String {
        let generics = if self.type_args.is_empty() {
            "".to_string()
        } else {
            format!(
                "<{}>",
                self.type_args
                    .iter()
                    .map(|t| t.to_canonical_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        format!(
            "{}::{}::{}{}",
            self.address.to_hex_literal(),
            self.module,
            self.name,
            generics
        )
    }

    fn deserialize_with_depth(
        deserializer: &mut Deserializer<'_>,
        depth: usize,
    ) -> aptos_bcs_utils::Result<Self> {
        let address = AccountAddress::deserialize(deserializer)?;
        let module = Identifier::deserialize(deserializer)?;
        let name = Identifier::deserialize(deserializer)?;
        let len = deserializer.deserialize_len()?;
        let mut type_args = Vec::with_capacity(len.min(deserializer.remaining()));
        for _ in 0..len {
            type_args.push(TypeTag::deserialize_with_depth(deserializer, depth + 1)?);
        }
        Ok(Self::new(address, module, name, type_args))
    }

    fn serialize_with_depth(
        &self,
        serializer: &mut Serializer,
        depth: usize,
    ) -> aptos_bcs_utils::Result<()> {
        self.address.serialize(serializer)?;
        self.module.serialize(serializer)?;
        self.name.serialize(serializer)?;
        serializer.serialize_len(self.type_args.len())?;
        for arg in &self.type_args {
            arg.serialize_with_depth(serializer, depth + 1)?;
        }
        Ok(())
    }
}

impl Serializable for StructTag {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        self.serialize_with_depth(serializer, 0)
    }
}

impl Deserializable for StructTag {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Self::deserialize_with_depth(deserializer, 0)
    }
}

impl FromStr for StructTag {
    type Err = TypeTagParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_struct_tag(s)
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if let Some(first_ty) = self.type_args.first() {
            write!(f, "<")?;
            write!(f, "{}", first_ty)?;
            for ty in self.type_args.iter().skip(1) {
                write!(f, ", {}", ty)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// Represents the initial key into global storage where we first index by the address, and then
/// the struct tag
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ModuleId {
    address: AccountAddress,
    name: Identifier,
}

impl ModuleId {
    pub fn new(address: AccountAddress, name: Identifier) -> Self {
        ModuleId { address, name }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    pub fn short_str_lossless(&self) -> String {
        format!("0x{}::{}", self.address.short_str_lossless(), self.name)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.address, self.name)
    }
}

impl FromStr for ModuleId {
    type Err = TypeTagParserError;

    /// Parses `address::module`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse_module_id(s)
    }
}

impl Serializable for ModuleId {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        self.address.serialize(serializer)?;
        self.name.serialize(serializer)
    }
}

impl Deserializable for ModuleId {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(Self::new(
            AccountAddress::deserialize(deserializer)?,
            Identifier::deserialize(deserializer)?,
        ))
    }
}
