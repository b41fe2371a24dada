//! Which characters can speak in which room.
//!
//! The ROM stores the table as big-endian words. Each room starts with a
//! header word `count << 11 | room`, followed by `count` run words
//! `length << 11 | first`, each standing for the characters
//! `first..first + length`. A `0xFFFF` word ends the table.

use crate::{
    error::{Error, Result},
    table::{read_words, write_words, WORD_TERMINATOR},
};
use std::collections::BTreeMap;
use tracing::trace;

pub type Character = u16;

const ID_BITS: u16 = 11;
const ID_MASK: u16 = (1 << ID_BITS) - 1;
const MAX_COUNT: u16 = 0x1f;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RoomDialogueTable {
    rooms: BTreeMap<u16, Vec<Character>>,
}

impl RoomDialogueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the flat word layout. Parsing stops at the terminator or at the
    /// end of the data. A room seen twice keeps its first entry.
    pub fn from_words(data: &[u16]) -> Result<Self> {
        let mut rooms = BTreeMap::new();
        let mut i = 0;
        while i < data.len() && data[i] != WORD_TERMINATOR {
            let room = data[i] & ID_MASK;
            let count = usize::from(data[i] >> ID_BITS);
            i += 1;
            let runs = data.get(i..i + count).ok_or(Error::TruncatedTable {
                offset: i * 2,
                trailing: (data.len() - i) * 2,
                record_size: count * 2,
            })?;
            i += count;

            let mut chars = Vec::with_capacity(count);
            for &run in runs {
                let first = run & ID_MASK;
                let length = run >> ID_BITS;
                chars.extend((0..length).map(|k| first + k));
            }
            trace!("room {room:#x}: {} characters in {count} runs", chars.len());
            rooms.entry(room).or_insert(chars);
        }
        Ok(Self { rooms })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_words(&read_words(bytes)?)
    }

    /// Flattens the table back into words, merging consecutive characters into
    /// runs and appending the terminator.
    pub fn get_data(&self) -> Result<Vec<u16>> {
        let mut data = Vec::with_capacity(self.rooms.len() * 3 + 1);
        for (&room, chars) in &self.rooms {
            if room > ID_MASK {
                return Err(Error::RoomOutOfRange { room });
            }
            let header = data.len();
            data.push(room);
            let mut runs = 0;
            for &c in chars {
                if c > ID_MASK {
                    return Err(Error::CharacterOutOfRange { room, character: c });
                }
                // the header word is never a run to extend
                if let Some(last) = data.last_mut().filter(|_| runs > 0) {
                    let length = *last >> ID_BITS;
                    if (*last & ID_MASK) + length == c && length < MAX_COUNT {
                        *last += 1 << ID_BITS;
                        continue;
                    }
                }
                data.push(1 << ID_BITS | c);
                runs += 1;
            }
            if runs > usize::from(MAX_COUNT) {
                return Err(Error::TooManyRuns { room, runs });
            }
            data[header] |= u16::try_from(runs).unwrap_or(MAX_COUNT) << ID_BITS;
        }
        data.push(WORD_TERMINATOR);
        Ok(data)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let words = self.get_data()?;
        let mut out = Vec::with_capacity(words.len() * 2);
        write_words(&mut out, &words)?;
        Ok(out)
    }

    pub fn room_characters(&self, room: u16) -> &[Character] {
        self.rooms.get(&room).map_or(&[][..], Vec::as_slice)
    }

    /// Replaces the characters for a room. An empty list removes the room.
    pub fn set_room_characters(&mut self, room: u16, chars: Vec<Character>) {
        if chars.is_empty() {
            self.rooms.remove(&room);
        } else {
            self.rooms.insert(room, chars);
        }
    }

    pub fn rooms(&self) -> impl Iterator<Item = (u16, &[Character])> + '_ {
        self.rooms.iter().map(|(&room, chars)| (room, chars.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
