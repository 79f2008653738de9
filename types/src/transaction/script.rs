// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::{ensure, Context, Result};
use aptos_bcs_utils::{Deserializable, Deserializer, Serializable, Serializer};
use move_core_types::{
    identifier::Identifier,
    language_storage::{ModuleId, TypeTag},
    transaction_argument::TransactionArgument,
    value::MoveValue,
};
use std::fmt;

/// Call a Move script.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Script {
    code: Vec<u8>,
    ty_args: Vec<TypeTag>,
    args: Vec<TransactionArgument>,
}

impl Script {
    pub fn new(code: Vec<u8>, ty_args: Vec<TypeTag>, args: Vec<TransactionArgument>) -> Self {
        Script {
            code,
            ty_args,
            args,
        }
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn ty_args(&self) -> &[TypeTag] {
        &self.ty_args
    }

    pub fn args(&self) -> &[TransactionArgument] {
        &self.args
    }

    pub fn into_inner(self) -> (Vec<u8>, Vec<TypeTag>, Vec<TransactionArgument>) {
        (self.code, self.ty_args, self.args)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("code", &hex::encode(&self.code))
            .field("ty_args", &self.ty_args)
            .field("args", &self.args)
            .finish()
    }
}

impl Serializable for Script {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_bytes(&self.code)?;
        serializer.serialize_vector(&self.ty_args)?;
        serializer.serialize_vector(&self.args)
    }
}

impl Deserializable for Script {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(Script {
            code: deserializer.deserialize_bytes()?,
            ty_args: deserializer.deserialize_vector()?,
            args: deserializer.deserialize_vector()?,
        })
    }
}

/// Call a Move entry function.
///
/// Each argument is kept as the BCS encoding of its value and written as a length-prefixed blob,
/// so a payload can be decoded without knowing the function's parameter types. Interpreting the
/// blobs is left to whoever holds the ABI, see [`EntryFunction::decode_args`].
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct EntryFunction {
    module: ModuleId,
    function: Identifier,
    ty_args: Vec<TypeTag>,
    args: Vec<Vec<u8>>,
}

impl EntryFunction {
    pub fn new(
        module: ModuleId,
        function: Identifier,
        ty_args: Vec<TypeTag>,
        args: Vec<Vec<u8>>,
    ) -> Self {
        EntryFunction {
            module,
            function,
            ty_args,
            args,
        }
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn function(&self) -> &Identifier {
        &self.function
    }

    pub fn ty_args(&self) -> &[TypeTag] {
        &self.ty_args
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    pub fn into_inner(self) -> (ModuleId, Identifier, Vec<TypeTag>, Vec<Vec<u8>>) {
        (self.module, self.function, self.ty_args, self.args)
    }

    /// Interprets the argument blobs against the function's parameter types.
    pub fn decode_args(&self, param_types: &[TypeTag]) -> Result<Vec<MoveValue>> {
        ensure!(
            param_types.len() == self.args.len(),
            "{}::{} takes {} arguments but {} were supplied",
            self.module,
            self.function,
            param_types.len(),
            self.args.len()
        );
        self.args
            .iter()
            .zip(param_types)
            .enumerate()
            .map(|(position, (arg, ty))| {
                MoveValue::simple_deserialize(arg, ty)
                    .with_context(|| format!("argument {} is not a valid {}", position, ty))
            })
            .collect()
    }
}

impl Serializable for EntryFunction {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        self.module.serialize(serializer)?;
        self.function.serialize(serializer)?;
        serializer.serialize_vector(&self.ty_args)?;
        serializer.serialize_len(self.args.len())?;
        for arg in &self.args {
            serializer.serialize_bytes(arg)?;
        }
        Ok(())
    }
}

impl Deserializable for EntryFunction {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let module = ModuleId::deserialize(deserializer)?;
        let function = Identifier::deserialize(deserializer)?;
        let ty_args = deserializer.deserialize_vector()?;
        let len = deserializer.deserialize_len()?;
        let mut args = Vec::with_capacity(len.min(deserializer.remaining()));
        for _ in 0..len {
            args.push(deserializer.deserialize_bytes()?);
        }
        Ok(EntryFunction {
            module,
            function,
            ty_args,
            args,
        })
    }
}
