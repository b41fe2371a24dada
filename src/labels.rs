use crate::error::{Error, Result};
use std::collections::HashMap;

/// Human-readable names for game ids. Built once by the host and passed by
/// reference to anything that prints.
#[derive(Debug, Default)]
pub struct Labels {
    pub flags: HashMap<u16, String>,
    pub rooms: HashMap<u16, String>,
    pub characters: HashMap<u16, String>,
}

impl Labels {
    pub fn from_ini(ini: &str) -> Result<Self> {
        let data: HashMap<String, HashMap<String, String>> = serde_ini::from_str(ini)?;
        let mut result = Self::default();
        for (section, pairs) in data {
            let target = match section.as_str() {
                "flags" => &mut result.flags,
                "rooms" => &mut result.rooms,
                "characters" => &mut result.characters,
                _ => return Err(Error::UnexpectedSection(section.clone())),
            };
            for (key, value) in pairs {
                let id = parse_id(&key).ok_or_else(|| Error::BadLabel {
                    section: section.clone(),
                    key: key.clone(),
                })?;
                target.insert(id, value);
            }
        }
        Ok(result)
    }

    pub fn flag_name(&self, flag: u16) -> String {
        lookup(&self.flags, flag, "Flag")
    }

    pub fn room_name(&self, room: u16) -> String {
        lookup(&self.rooms, room, "Room")
    }

    pub fn character_name(&self, character: u16) -> String {
        lookup(&self.characters, character, "Character")
    }
}

fn parse_id(key: &str) -> Option<u16> {
    match key.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => key.parse().ok(),
    }
}

fn lookup(names: &HashMap<u16, String>, id: u16, fallback: &str) -> String {
    match names.get(&id) {
        Some(name) => name.clone(),
        None => format!("{fallback}{id:04X}"),
    }
}

#[cfg(test)]
mod tests {
    use super::Labels;
    use std::error::Error;

    #[test]
    fn reads_sections() -> Result<(), Box<dyn Error>> {
        let labels = Labels::from_ini(
            "[flags]\n24=TalkedToKayla\n0x1f=GotSword\n[rooms]\n5=MassanChurch\n",
        )?;
        assert_eq!(labels.flag_name(24), "TalkedToKayla");
        assert_eq!(labels.flag_name(0x1f), "GotSword");
        assert_eq!(labels.room_name(5), "MassanChurch");
        Ok(())
    }

    #[test]
    fn falls_back_to_hex() {
        let labels = Labels::default();
        assert_eq!(labels.flag_name(0x2a), "Flag002A");
        assert_eq!(labels.character_name(0x7ff), "Character07FF");
    }

    #[test]
    fn rejects_unknown_section() {
        let err = Labels::from_ini("[sprites]\n1=Nigel\n").unwrap_err();
        assert!(matches!(err, crate::Error::UnexpectedSection(s) if s == "sprites"));
    }

    #[test]
    fn debug_lists_names() -> Result<(), Box<dyn Error>> {
        let labels = Labels::from_ini("[characters]\n7=Friday\n")?;
        assert!(format!("{labels:?}").contains("Friday"));
        Ok(())
    }

    #[test]
    fn rejects_bad_key() {
        let err = Labels::from_ini("[rooms]\nnorth=Gumi\n").unwrap_err();
        assert!(matches!(err, crate::Error::BadLabel { .. }));
    }
}
