pub use self::{
    asm::{Instruction, Operand, Width},
    function::{
        decode_mapping, encode_mapping, FlagMapping, ScriptFunction, ScriptFunctionTable,
        Statement, PICK_VALUE_BASED_ON_FLAGS,
    },
    progress::{ProgressFlags, GET_FLAG_PROGRESS, NO_FLAG},
};

pub mod asm;
mod function;
mod progress;
