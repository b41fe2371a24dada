#![allow(dead_code)]
#![warn(clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub use crate::{
    bits::{BitBarrel, BitBarrelWriter},
    dialogue::RoomDialogueTable,
    error::{Error, Result},
    flags::{
        flags_for_room, set_flags_for_room, EntityVisibilityFlag, FlagRecord, FlagTrigger,
        FlagType, OneTimeEventFlag, RoomClearFlag, SacredTreeFlag, TileSwapFlag, TreeWarpFlag,
    },
    labels::Labels,
    script::{ProgressFlags, ScriptFunctionTable},
};

#[macro_use]
mod macros;

pub mod bits;
pub mod dialogue;
mod error;
pub mod flags;
pub mod labels;
pub mod script;
pub mod table;
#[cfg(test)]
mod tests;
