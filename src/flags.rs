use crate::{
    bits::{BitBarrel, BitBarrelWriter},
    error::{Error, Result},
    labels::Labels,
    table::{decode_table, encode_table},
};
use std::{collections::VecDeque, fmt};
use tracing::trace;

/// A fixed-size flag record, packed MSB-first.
pub trait FlagRecord: Sized {
    const SIZE: usize;
    const KIND: &'static str;

    fn room(&self) -> u16;
    fn decode(r: &mut BitBarrel) -> Result<Self>;
    fn encode(&self, w: &mut BitBarrelWriter);

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(Error::RecordSize {
                kind: Self::KIND,
                expected: Self::SIZE,
                found: bytes.len(),
            });
        }
        Self::decode(&mut BitBarrel::new(bytes))
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = BitBarrelWriter::with_capacity(Self::SIZE);
        self.encode(&mut w);
        debug_assert_eq!(w.byte_count(), Self::SIZE);
        w.into_bytes()
    }
}

/// Shows or hides an entity depending on a game flag.
///
/// Layout: `room:16 set:1 flag:10 entity:5`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EntityVisibilityFlag {
    pub room: u16,
    pub flag: u16,
    pub entity: u8,
    pub set: bool,
}

impl EntityVisibilityFlag {
    pub fn new(room: u16) -> Self {
        Self {
            room,
            ..Self::default()
        }
    }
}

impl FlagRecord for EntityVisibilityFlag {
    const SIZE: usize = 4;
    const KIND: &'static str = "entity visibility";

    fn room(&self) -> u16 {
        self.room
    }

    fn decode(r: &mut BitBarrel) -> Result<Self> {
        let room = r.read_u16()?;
        let set = r.read_bit()?;
        let flag = r.read_bits_u16(10)?;
        let entity = r.read_bits_u8(5)?;
        Ok(Self {
            room,
            flag,
            entity,
            set,
        })
    }

    fn encode(&self, w: &mut BitBarrelWriter) {
        w.write_u16(self.room);
        w.set_next_bit(self.set);
        w.write_bits(self.flag.into(), 10);
        w.write_bits(self.entity.into(), 5);
    }
}

/// Layout: `room:16 on_set:1 flag_on:10 entity:5 off_set:1 flag_off_hi:7
/// pad:5 flag_off_lo:3`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct OneTimeEventFlag {
    pub room: u16,
    pub entity: u8,
    pub flag_on: u16,
    pub flag_on_set: bool,
    pub flag_off: u16,
    pub flag_off_set: bool,
}

impl OneTimeEventFlag {
    pub fn new(room: u16) -> Self {
        Self {
            room,
            ..Self::default()
        }
    }
}

impl FlagRecord for OneTimeEventFlag {
    const SIZE: usize = 6;
    const KIND: &'static str = "one-time event";

    fn room(&self) -> u16 {
        self.room
    }

    fn decode(r: &mut BitBarrel) -> Result<Self> {
        let room = r.read_u16()?;
        let flag_on_set = r.read_bit()?;
        let flag_on = r.read_bits_u16(10)?;
        let entity = r.read_bits_u8(5)?;
        let flag_off_set = r.read_bit()?;
        let hi = r.read_bits_u16(7)?;
        r.read_bits(5)?;
        let lo = r.read_bits_u16(3)?;
        Ok(Self {
            room,
            entity,
            flag_on,
            flag_on_set,
            flag_off: hi << 3 | lo,
            flag_off_set,
        })
    }

    fn encode(&self, w: &mut BitBarrelWriter) {
        w.write_u16(self.room);
        w.set_next_bit(self.flag_on_set);
        w.write_bits(self.flag_on.into(), 10);
        w.write_bits(self.entity.into(), 5);
        w.set_next_bit(self.flag_off_set);
        w.write_bits((self.flag_off >> 3).into(), 7);
        w.write_bits(0, 5);
        w.write_bits(self.flag_off.into(), 3);
    }
}

/// Shared by the room-clear, locked-door and permanent-switch tables.
///
/// Layout: `room:16 flag:11 entity:5`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RoomClearFlag {
    pub room: u16,
    pub flag: u16,
    pub entity: u8,
}

impl RoomClearFlag {
    pub fn new(room: u16) -> Self {
        Self {
            room,
            ..Self::default()
        }
    }
}

impl FlagRecord for RoomClearFlag {
    const SIZE: usize = 4;
    const KIND: &'static str = "room clear";

    fn room(&self) -> u16 {
        self.room
    }

    fn decode(r: &mut BitBarrel) -> Result<Self> {
        Ok(Self {
            room: r.read_u16()?,
            flag: r.read_bits_u16(11)?,
            entity: r.read_bits_u8(5)?,
        })
    }

    fn encode(&self, w: &mut BitBarrelWriter) {
        w.write_u16(self.room);
        w.write_bits(self.flag.into(), 11);
        w.write_bits(self.entity.into(), 5);
    }
}

/// Layout: `room:16 flag_hi:8 pad:5 flag_lo:3`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SacredTreeFlag {
    pub room: u16,
    pub flag: u16,
}

impl SacredTreeFlag {
    pub fn new(room: u16) -> Self {
        Self { room, flag: 0 }
    }
}

impl FlagRecord for SacredTreeFlag {
    const SIZE: usize = 4;
    const KIND: &'static str = "sacred tree";

    fn room(&self) -> u16 {
        self.room
    }

    fn decode(r: &mut BitBarrel) -> Result<Self> {
        let room = r.read_u16()?;
        let hi = u16::from(r.read_u8()?);
        r.read_bits(5)?;
        let lo = r.read_bits_u16(3)?;
        Ok(Self {
            room,
            flag: hi << 3 | lo,
        })
    }

    fn encode(&self, w: &mut BitBarrelWriter) {
        w.write_u16(self.room);
        w.write_bits((self.flag >> 3).into(), 8);
        w.write_bits(0, 5);
        w.write_bits(self.flag.into(), 3);
    }
}

/// Layout: `room:16 flag_hi:8 index:5 flag_lo:3`. A `flag_hi` of `0xFF`
/// marks a swap that always happens.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TileSwapFlag {
    pub room: u16,
    pub flag: u16,
    pub index: u8,
    pub always: bool,
}

impl TileSwapFlag {
    const ALWAYS: u16 = 0xff;

    pub fn new(room: u16) -> Self {
        Self {
            room,
            ..Self::default()
        }
    }
}

impl FlagRecord for TileSwapFlag {
    const SIZE: usize = 4;
    const KIND: &'static str = "tile swap";

    fn room(&self) -> u16 {
        self.room
    }

    fn decode(r: &mut BitBarrel) -> Result<Self> {
        let room = r.read_u16()?;
        let hi = r.read_bits_u16(8)?;
        let index = r.read_bits_u8(5)?;
        let lo = r.read_bits_u16(3)?;
        let always = hi == Self::ALWAYS;
        let flag = if always {
            0
        } else {
            hi << 3 | lo
        };
        Ok(Self {
            room,
            flag,
            index,
            always,
        })
    }

    fn encode(&self, w: &mut BitBarrelWriter) {
        w.write_u16(self.room);
        if self.always {
            w.write_bits(Self::ALWAYS.into(), 8);
            w.write_bits(self.index.into(), 5);
            w.write_bits(0, 3);
        } else {
            w.write_bits((self.flag >> 3).into(), 8);
            w.write_bits(self.index.into(), 5);
            w.write_bits(self.flag.into(), 3);
        }
    }
}

/// A pair of linked trees. Both halves repeat the flag bytes and only bits
/// 1-2 of the low byte are meaningful.
///
/// Layout: `room1:16 flag_hi:8 flag_lo:8 room2:16 flag_hi:8 flag_lo:8`.
#[derive(Copy, Clone, Debug, Default)]
pub struct TreeWarpFlag {
    pub room1: u16,
    pub room2: u16,
    pub flag: u16,
}

impl TreeWarpFlag {
    const LO_MASK: u16 = 0x06;
}

impl PartialEq for TreeWarpFlag {
    fn eq(&self, other: &Self) -> bool {
        let same_rooms = (self.room1 == other.room1 && self.room2 == other.room2)
            || (self.room1 == other.room2 && self.room2 == other.room1);
        same_rooms && self.flag == other.flag
    }
}

impl Eq for TreeWarpFlag {}

impl FlagRecord for TreeWarpFlag {
    const SIZE: usize = 8;
    const KIND: &'static str = "tree warp";

    fn room(&self) -> u16 {
        self.room1
    }

    fn decode(r: &mut BitBarrel) -> Result<Self> {
        let room1 = r.read_u16()?;
        let hi1 = u16::from(r.read_u8()?);
        let lo1 = u16::from(r.read_u8()?);
        let room2 = r.read_u16()?;
        let hi2 = u16::from(r.read_u8()?);
        let lo2 = u16::from(r.read_u8()?);
        if hi1 != hi2 || lo1 != lo2 {
            return Err(Error::InconsistentRecord {
                kind: Self::KIND,
                message: "halves carry different flags",
            });
        }
        if lo1 & 1 != 0 {
            return Err(Error::InconsistentRecord {
                kind: Self::KIND,
                message: "odd flag low byte",
            });
        }
        Ok(Self {
            room1,
            room2,
            flag: hi1 << 3 | (lo1 & Self::LO_MASK),
        })
    }

    fn encode(&self, w: &mut BitBarrelWriter) {
        for room in [self.room1, self.room2] {
            w.write_u16(room);
            w.write_bits((self.flag >> 3).into(), 8);
            w.write_bits((self.flag & Self::LO_MASK).into(), 8);
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FlagType {
    EntityVisibility,
    OneTimeEntityVisibility,
    HideMultipleEntities,
    LockedDoor,
    PermanentSwitch,
    SacredTree,
    TileSwap,
    TreeWarp,
}

impl FlagType {
    pub const ALL: [FlagType; 8] = [
        Self::EntityVisibility,
        Self::OneTimeEntityVisibility,
        Self::HideMultipleEntities,
        Self::LockedDoor,
        Self::PermanentSwitch,
        Self::SacredTree,
        Self::TileSwap,
        Self::TreeWarp,
    ];

    pub fn record_size(self) -> usize {
        match self {
            Self::EntityVisibility => EntityVisibilityFlag::SIZE,
            Self::OneTimeEntityVisibility => OneTimeEventFlag::SIZE,
            Self::HideMultipleEntities | Self::LockedDoor | Self::PermanentSwitch => {
                RoomClearFlag::SIZE
            }
            Self::SacredTree => SacredTreeFlag::SIZE,
            Self::TileSwap => TileSwapFlag::SIZE,
            Self::TreeWarp => TreeWarpFlag::SIZE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::EntityVisibility => "entity-visibility",
            Self::OneTimeEntityVisibility => "one-time",
            Self::HideMultipleEntities => "room-clear",
            Self::LockedDoor => "locked-door",
            Self::PermanentSwitch => "permanent-switch",
            Self::SacredTree => "sacred-tree",
            Self::TileSwap => "tile-swap",
            Self::TreeWarp => "tree-warp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// One decoded flag record of any kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FlagTrigger {
    EntityVisibility(EntityVisibilityFlag),
    OneTimeEvent(OneTimeEventFlag),
    RoomClear(RoomClearFlag),
    LockedDoor(RoomClearFlag),
    PermanentSwitch(RoomClearFlag),
    SacredTree(SacredTreeFlag),
    TileSwap(TileSwapFlag),
    TreeWarp(TreeWarpFlag),
}

impl FlagTrigger {
    pub fn kind(&self) -> FlagType {
        match self {
            Self::EntityVisibility(_) => FlagType::EntityVisibility,
            Self::OneTimeEvent(_) => FlagType::OneTimeEntityVisibility,
            Self::RoomClear(_) => FlagType::HideMultipleEntities,
            Self::LockedDoor(_) => FlagType::LockedDoor,
            Self::PermanentSwitch(_) => FlagType::PermanentSwitch,
            Self::SacredTree(_) => FlagType::SacredTree,
            Self::TileSwap(_) => FlagType::TileSwap,
            Self::TreeWarp(_) => FlagType::TreeWarp,
        }
    }

    pub fn room(&self) -> u16 {
        match self {
            Self::EntityVisibility(f) => f.room(),
            Self::OneTimeEvent(f) => f.room(),
            Self::RoomClear(f) | Self::LockedDoor(f) | Self::PermanentSwitch(f) => f.room(),
            Self::SacredTree(f) => f.room(),
            Self::TileSwap(f) => f.room(),
            Self::TreeWarp(f) => f.room(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::EntityVisibility(f) => f.to_bytes(),
            Self::OneTimeEvent(f) => f.to_bytes(),
            Self::RoomClear(f) | Self::LockedDoor(f) | Self::PermanentSwitch(f) => f.to_bytes(),
            Self::SacredTree(f) => f.to_bytes(),
            Self::TileSwap(f) => f.to_bytes(),
            Self::TreeWarp(f) => f.to_bytes(),
        }
    }

    /// Decodes a whole terminated table of records of one kind.
    pub fn decode_table(kind: FlagType, bytes: &[u8]) -> Result<Vec<Self>> {
        Ok(match kind {
            FlagType::EntityVisibility => wrap(decode_table(bytes)?, Self::EntityVisibility),
            FlagType::OneTimeEntityVisibility => wrap(decode_table(bytes)?, Self::OneTimeEvent),
            FlagType::HideMultipleEntities => wrap(decode_table(bytes)?, Self::RoomClear),
            FlagType::LockedDoor => wrap(decode_table(bytes)?, Self::LockedDoor),
            FlagType::PermanentSwitch => wrap(decode_table(bytes)?, Self::PermanentSwitch),
            FlagType::SacredTree => wrap(decode_table(bytes)?, Self::SacredTree),
            FlagType::TileSwap => wrap(decode_table(bytes)?, Self::TileSwap),
            FlagType::TreeWarp => wrap(decode_table(bytes)?, Self::TreeWarp),
        })
    }

    /// Encodes records as a terminated table. All records must share a kind.
    pub fn encode_table(records: &[Self]) -> Vec<u8> {
        debug_assert!(records.windows(2).all(|w| w[0].kind() == w[1].kind()));
        let size = records.first().map_or(0, |r| r.kind().record_size());
        let mut body = Vec::with_capacity(records.len() * size);
        for record in records {
            body.extend(record.to_bytes());
        }
        encode_table(&body)
    }

    pub fn describe<'a>(&'a self, labels: &'a Labels) -> Describe<'a> {
        Describe {
            trigger: self,
            labels,
        }
    }
}

fn wrap<T>(records: Vec<T>, f: impl Fn(T) -> FlagTrigger) -> Vec<FlagTrigger> {
    records.into_iter().map(f).collect()
}

pub struct Describe<'a> {
    trigger: &'a FlagTrigger,
    labels: &'a Labels,
}

impl fmt::Display for Describe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = self.labels;
        write!(f, "{}: ", labels.room_name(self.trigger.room()))?;
        match self.trigger {
            FlagTrigger::EntityVisibility(v) => write!(
                f,
                "entity {} {} when {} is {}",
                v.entity,
                if v.set { "shown" } else { "hidden" },
                labels.flag_name(v.flag),
                if v.set { "set" } else { "clear" },
            ),
            FlagTrigger::OneTimeEvent(v) => write!(
                f,
                "entity {} needs {}={} and {}={}",
                v.entity,
                labels.flag_name(v.flag_on),
                u8::from(v.flag_on_set),
                labels.flag_name(v.flag_off),
                u8::from(v.flag_off_set),
            ),
            FlagTrigger::RoomClear(v) => {
                write!(f, "defeating entity {} sets {}", v.entity, labels.flag_name(v.flag))
            }
            FlagTrigger::LockedDoor(v) => {
                write!(f, "door entity {} unlocked by {}", v.entity, labels.flag_name(v.flag))
            }
            FlagTrigger::PermanentSwitch(v) => {
                write!(f, "switch entity {} sets {}", v.entity, labels.flag_name(v.flag))
            }
            FlagTrigger::SacredTree(v) => write!(f, "tree sets {}", labels.flag_name(v.flag)),
            FlagTrigger::TileSwap(v) if v.always => write!(f, "tile swap {} always", v.index),
            FlagTrigger::TileSwap(v) => {
                write!(f, "tile swap {} on {}", v.index, labels.flag_name(v.flag))
            }
            FlagTrigger::TreeWarp(v) => write!(
                f,
                "warp to {} on {}",
                labels.room_name(v.room2),
                labels.flag_name(v.flag),
            ),
        }
    }
}

pub fn flags_for_room<T: FlagRecord + Clone>(room: u16, flags: &[T]) -> Vec<T> {
    flags.iter().filter(|f| f.room() == room).cloned().collect()
}

/// Replaces the records for `room` with `src`. Existing slots are reused in
/// order, surplus slots are removed and extra records go on the end.
pub fn set_flags_for_room<T: FlagRecord + Clone>(room: u16, src: &[T], dst: &mut Vec<T>) {
    let mut kept = 0;
    dst.retain(|f| {
        if f.room() != room {
            return true;
        }
        kept += 1;
        kept <= src.len()
    });

    let mut slots: VecDeque<usize> = dst
        .iter()
        .enumerate()
        .filter(|(_, f)| f.room() == room)
        .map(|(i, _)| i)
        .collect();
    for f in src {
        match slots.pop_front() {
            Some(i) => dst[i] = f.clone(),
            None => dst.push(f.clone()),
        }
    }
    trace!("room {room:#x}: {} {} records", src.len(), T::KIND);
}

#[cfg(test)]
mod tests {
    use super::{
        flags_for_room, set_flags_for_room, EntityVisibilityFlag, FlagRecord, FlagTrigger,
        FlagType, OneTimeEventFlag, RoomClearFlag, SacredTreeFlag, TileSwapFlag, TreeWarpFlag,
    };
    use crate::labels::Labels;
    use std::error::Error;

    #[test]
    fn entity_visibility_layout() -> Result<(), Box<dyn Error>> {
        let bytes = [0x00, 0x05, 0x03, 0x01];
        let flag = EntityVisibilityFlag::from_bytes(&bytes)?;
        assert_eq!(
            flag,
            EntityVisibilityFlag {
                room: 5,
                flag: 24,
                entity: 1,
                set: false,
            }
        );
        assert_eq!(flag.to_bytes(), bytes);
        Ok(())
    }

    #[test]
    fn entity_visibility_set_bit_is_msb_of_third_byte() -> Result<(), Box<dyn Error>> {
        let flag = EntityVisibilityFlag {
            room: 0x01ab,
            flag: 0x3ff,
            entity: 0x1f,
            set: true,
        };
        assert_eq!(flag.to_bytes(), [0x01, 0xab, 0xff, 0xff]);
        let flag = EntityVisibilityFlag {
            set: false,
            flag: 0x207,
            entity: 0x02,
            ..flag
        };
        assert_eq!(flag.to_bytes(), [0x01, 0xab, 0x40, 0xe2]);
        assert_eq!(EntityVisibilityFlag::from_bytes(&flag.to_bytes())?, flag);
        Ok(())
    }

    #[test]
    fn equality_is_field_wise() {
        let a = EntityVisibilityFlag::new(3);
        let mut b = a;
        assert_eq!(a, b);
        b.entity = 4;
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_size_is_rejected() {
        let err = EntityVisibilityFlag::from_bytes(&[0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::RecordSize {
                expected: 4,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn one_time_event_layout() -> Result<(), Box<dyn Error>> {
        let bytes = [0x02, 0x10, 0x85, 0x63, 0x12, 0x05];
        let flag = OneTimeEventFlag::from_bytes(&bytes)?;
        assert_eq!(
            flag,
            OneTimeEventFlag {
                room: 0x210,
                entity: 3,
                flag_on: 0x2b,
                flag_on_set: true,
                flag_off: 0x95,
                flag_off_set: false,
            }
        );
        assert_eq!(flag.to_bytes(), bytes);
        Ok(())
    }

    #[test]
    fn room_clear_layout() -> Result<(), Box<dyn Error>> {
        let bytes = [0x00, 0x2a, 0xf1, 0x65];
        let flag = RoomClearFlag::from_bytes(&bytes)?;
        assert_eq!(flag.flag, 0x78b);
        assert_eq!(flag.entity, 5);
        assert_eq!(flag.to_bytes(), bytes);
        Ok(())
    }

    #[test]
    fn sacred_tree_ignores_padding() -> Result<(), Box<dyn Error>> {
        let flag = SacredTreeFlag::from_bytes(&[0x01, 0x00, 0x12, 0xfd])?;
        assert_eq!(flag.flag, 0x12 << 3 | 5);
        assert_eq!(flag.to_bytes(), [0x01, 0x00, 0x12, 0x05]);
        Ok(())
    }

    #[test]
    fn tile_swap_always() -> Result<(), Box<dyn Error>> {
        let flag = TileSwapFlag::from_bytes(&[0x00, 0x10, 0xff, 0x18])?;
        assert!(flag.always);
        assert_eq!(flag.index, 3);
        assert_eq!(flag.flag, 0);
        assert_eq!(flag.to_bytes(), [0x00, 0x10, 0xff, 0x18]);

        let flag = TileSwapFlag::from_bytes(&[0x00, 0x10, 0x20, 0x1e])?;
        assert!(!flag.always);
        assert_eq!(flag.index, 3);
        assert_eq!(flag.flag, 0x106);
        Ok(())
    }

    #[test]
    fn tree_warp_round_trip() -> Result<(), Box<dyn Error>> {
        let bytes = [0x01, 0x20, 0x30, 0x04, 0x02, 0x40, 0x30, 0x04];
        let flag = TreeWarpFlag::from_bytes(&bytes)?;
        assert_eq!(flag.room1, 0x120);
        assert_eq!(flag.room2, 0x240);
        assert_eq!(flag.flag, 0x184);
        assert_eq!(flag.to_bytes(), bytes);
        Ok(())
    }

    #[test]
    fn tree_warp_rooms_are_unordered() {
        let a = TreeWarpFlag {
            room1: 1,
            room2: 2,
            flag: 8,
        };
        let b = TreeWarpFlag {
            room1: 2,
            room2: 1,
            flag: 8,
        };
        assert_eq!(a, b);
    }

    #[test]
    fn tree_warp_mismatched_halves() {
        let bytes = [0x01, 0x20, 0x30, 0x04, 0x02, 0x40, 0x31, 0x04];
        assert!(matches!(
            TreeWarpFlag::from_bytes(&bytes),
            Err(crate::Error::InconsistentRecord { .. })
        ));
    }

    #[test]
    fn tree_warp_low_byte_keeps_bits_1_and_2() -> Result<(), Box<dyn Error>> {
        let bytes = [0x01, 0x20, 0x30, 0x0c, 0x02, 0x40, 0x30, 0x0c];
        let flag = TreeWarpFlag::from_bytes(&bytes)?;
        assert_eq!(flag.flag, 0x30 << 3 | 0x04);
        assert_eq!(flag.to_bytes(), [0x01, 0x20, 0x30, 0x04, 0x02, 0x40, 0x30, 0x04]);

        let bytes = [0x01, 0x20, 0x30, 0x05, 0x02, 0x40, 0x30, 0x05];
        assert!(matches!(
            TreeWarpFlag::from_bytes(&bytes),
            Err(crate::Error::InconsistentRecord { .. })
        ));
        Ok(())
    }

    /// Sweeps bytes 2-3 behind a fixed room. `expected` maps the input to its
    /// re-encoding.
    fn sweep_four_bytes<T: FlagRecord>(
        expected: impl Fn([u8; 4]) -> [u8; 4],
    ) -> Result<(), Box<dyn Error>> {
        for word in 0..=u16::MAX {
            let [hi, lo] = word.to_be_bytes();
            let bytes = [0x12, 0x34, hi, lo];
            assert_eq!(T::from_bytes(&bytes)?.to_bytes(), expected(bytes), "{bytes:02x?}");
        }
        Ok(())
    }

    #[test]
    fn every_four_byte_record_re_encodes() -> Result<(), Box<dyn Error>> {
        sweep_four_bytes::<EntityVisibilityFlag>(|b| b)?;
        sweep_four_bytes::<RoomClearFlag>(|b| b)?;
        sweep_four_bytes::<SacredTreeFlag>(|[r0, r1, hi, lo]| [r0, r1, hi, lo & 0x07])?;
        sweep_four_bytes::<TileSwapFlag>(|[r0, r1, hi, lo]| {
            if hi == 0xff {
                [r0, r1, hi, lo & 0xf8]
            } else {
                [r0, r1, hi, lo]
            }
        })?;
        Ok(())
    }

    #[test]
    fn every_one_time_event_record_re_encodes() -> Result<(), Box<dyn Error>> {
        for word in 0..=u16::MAX {
            let [a, b] = word.to_be_bytes();
            let bytes = [0x02, 0x10, a, b, 0x12, 0x05];
            assert_eq!(OneTimeEventFlag::from_bytes(&bytes)?.to_bytes(), bytes);

            let bytes = [0x02, 0x10, 0x85, 0x63, a, b];
            let expected = [0x02, 0x10, 0x85, 0x63, a, b & 0x07];
            assert_eq!(OneTimeEventFlag::from_bytes(&bytes)?.to_bytes(), expected);
        }
        Ok(())
    }

    #[test]
    fn every_tree_warp_record_re_encodes() -> Result<(), Box<dyn Error>> {
        for hi in 0..=u8::MAX {
            for lo in (0..=u8::MAX).step_by(2) {
                let bytes = [0x01, 0x20, hi, lo, 0x02, 0x40, hi, lo];
                let expected = [0x01, 0x20, hi, lo & 0x06, 0x02, 0x40, hi, lo & 0x06];
                assert_eq!(TreeWarpFlag::from_bytes(&bytes)?.to_bytes(), expected);
            }
        }
        Ok(())
    }

    #[test]
    fn every_field_value_survives_encoding() -> Result<(), Box<dyn Error>> {
        fn check<T: FlagRecord + PartialEq + std::fmt::Debug>(
            record: T,
        ) -> Result<(), Box<dyn Error>> {
            assert_eq!(T::from_bytes(&record.to_bytes())?, record);
            Ok(())
        }

        for room in [0, 0x1ab, u16::MAX] {
            for entity in 0..1 << 5 {
                for flag in 0..1 << 10 {
                    for set in [false, true] {
                        check(EntityVisibilityFlag {
                            room,
                            flag,
                            entity,
                            set,
                        })?;
                        check(OneTimeEventFlag {
                            room,
                            entity,
                            flag_on: flag,
                            flag_on_set: set,
                            flag_off: 0x3ff - flag,
                            flag_off_set: !set,
                        })?;
                    }
                }
                for flag in 0..1 << 11 {
                    check(RoomClearFlag { room, flag, entity })?;
                }
                for flag in 0..0xff << 3 {
                    check(TileSwapFlag {
                        room,
                        flag,
                        index: entity,
                        always: false,
                    })?;
                }
                check(TileSwapFlag {
                    room,
                    flag: 0,
                    index: entity,
                    always: true,
                })?;
            }
            for flag in 0..1 << 11 {
                check(SacredTreeFlag { room, flag })?;
            }
            for flag in (0..1 << 11).step_by(2) {
                check(TreeWarpFlag {
                    room1: room,
                    room2: room ^ 0x0f0f,
                    flag,
                })?;
            }
        }
        Ok(())
    }

    #[test]
    fn decode_and_encode_table_by_kind() -> Result<(), Box<dyn Error>> {
        let bytes = [0x00, 0x05, 0x03, 0x01, 0x00, 0x06, 0x83, 0x02, 0xff, 0xff];
        let records = FlagTrigger::decode_table(FlagType::EntityVisibility, &bytes)?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].room(), 6);
        assert_eq!(records[1].kind(), FlagType::EntityVisibility);
        assert_eq!(FlagTrigger::encode_table(&records), bytes);
        Ok(())
    }

    #[test]
    fn kind_names_parse_back() {
        for kind in FlagType::ALL {
            assert_eq!(FlagType::from_name(kind.name()), Some(kind));
        }
        assert_eq!(FlagType::from_name("nope"), None);
    }

    #[test]
    fn describe_uses_labels() -> Result<(), Box<dyn Error>> {
        let labels = Labels::from_ini("[flags]\n24=MetNigel\n[rooms]\n5=Massan\n")?;
        let trigger = FlagTrigger::EntityVisibility(EntityVisibilityFlag::from_bytes(&[
            0x00, 0x05, 0x03, 0x01,
        ])?);
        assert_eq!(
            trigger.describe(&labels).to_string(),
            "Massan: entity 1 hidden when MetNigel is clear"
        );
        Ok(())
    }

    #[test]
    fn set_for_room_reuses_slots() {
        let flag = |room, entity| EntityVisibilityFlag {
            entity,
            ..EntityVisibilityFlag::new(room)
        };
        let mut all = vec![flag(1, 0), flag(2, 0), flag(1, 1), flag(3, 0), flag(1, 2)];

        set_flags_for_room(1, &[flag(1, 7), flag(1, 8)], &mut all);
        assert_eq!(all, [flag(1, 7), flag(2, 0), flag(1, 8), flag(3, 0)]);

        set_flags_for_room(2, &[flag(2, 4), flag(2, 5)], &mut all);
        assert_eq!(
            all,
            [flag(1, 7), flag(2, 4), flag(1, 8), flag(3, 0), flag(2, 5)]
        );
        assert_eq!(flags_for_room(2, &all), [flag(2, 4), flag(2, 5)]);

        set_flags_for_room(3, &[], &mut all);
        assert!(flags_for_room(3, &all).is_empty());
    }
}
