#![warn(clippy::pedantic, clippy::cargo)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(feature = "strict", deny(warnings))]

use clap::Parser;
use landstalker_rom::{
    FlagTrigger, FlagType, Labels, ProgressFlags, RoomDialogueTable, ScriptFunctionTable,
};
use memmap2::Mmap;
use std::{
    error::Error,
    fs,
    fs::File,
    path::{Path, PathBuf},
};
use tracing::info_span;

#[derive(Parser)]
enum Command {
    Flags(Flags),
    Dialogue(Dialogue),
    ProgressYaml(ProgressYaml),
    ProgressAsm(ProgressAsm),
}

fn main() {
    let r = match Command::parse() {
        Command::Flags(cmd) => cmd.run(),
        Command::Dialogue(cmd) => cmd.run(),
        Command::ProgressYaml(cmd) => cmd.run(),
        Command::ProgressAsm(cmd) => cmd.run(),
    };
    r.unwrap();
}

/// Print a flag table from a ROM image.
#[derive(Parser)]
struct Flags {
    rom: PathBuf,
    #[clap(short, long, value_parser = parse_kind)]
    kind: FlagType,
    #[clap(long, value_parser = parse_offset)]
    offset: usize,
    #[clap(short, long = "config")]
    config_path: Option<PathBuf>,
    #[clap(long)]
    room: Option<u16>,
}

impl Flags {
    fn run(self) -> Result<(), Box<dyn Error>> {
        let labels = read_labels(self.config_path.as_deref())?;
        let f = File::open(&self.rom)?;
        let rom = unsafe { Mmap::map(&f) }?;

        let _span = info_span!("flags", kind = self.kind.name(), offset = self.offset).entered();
        let data = rom.get(self.offset..).ok_or("offset is past the end of the ROM")?;
        let triggers = FlagTrigger::decode_table(self.kind, data)?;
        for trigger in &triggers {
            if self.room.map_or(true, |room| trigger.room() == room) {
                println!("{}", trigger.describe(&labels));
            }
        }
        Ok(())
    }
}

/// Print the room dialogue table from a ROM image.
#[derive(Parser)]
struct Dialogue {
    rom: PathBuf,
    #[clap(long, value_parser = parse_offset)]
    offset: usize,
    #[clap(short, long = "config")]
    config_path: Option<PathBuf>,
}

impl Dialogue {
    fn run(self) -> Result<(), Box<dyn Error>> {
        let labels = read_labels(self.config_path.as_deref())?;
        let f = File::open(&self.rom)?;
        let rom = unsafe { Mmap::map(&f) }?;

        let _span = info_span!("dialogue", offset = self.offset).entered();
        let data = rom.get(self.offset..).ok_or("offset is past the end of the ROM")?;
        // whole words only
        let data = &data[..data.len() & !1];
        let table = RoomDialogueTable::from_bytes(data)?;
        for (room, chars) in table.rooms() {
            let names: Vec<String> = chars.iter().map(|&c| labels.character_name(c)).collect();
            println!("{}: {}", labels.room_name(room), names.join(", "));
        }
        Ok(())
    }
}

/// Convert a `GetFlagProgress` assembler listing to YAML.
#[derive(Parser)]
struct ProgressYaml {
    input: PathBuf,
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl ProgressYaml {
    fn run(self) -> Result<(), Box<dyn Error>> {
        let _span = info_span!("progress_yaml").entered();
        let table = ScriptFunctionTable::from_asm(&fs::read_to_string(&self.input)?)?;
        let yaml = ProgressFlags::get_flags(&table).to_yaml()?;
        write_output(self.output.as_deref(), &yaml)
    }
}

/// Convert YAML progress flags back to assembler.
#[derive(Parser)]
struct ProgressAsm {
    input: PathBuf,
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl ProgressAsm {
    fn run(self) -> Result<(), Box<dyn Error>> {
        let _span = info_span!("progress_asm").entered();
        let flags = ProgressFlags::from_yaml(&fs::read_to_string(&self.input)?)?;
        write_output(self.output.as_deref(), &flags.make_asm().to_asm())
    }
}

fn read_labels(path: Option<&Path>) -> Result<Labels, Box<dyn Error>> {
    Ok(match path {
        Some(path) => Labels::from_ini(&fs::read_to_string(path)?)?,
        None => Labels::default(),
    })
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => fs::write(path, text)?,
        None => print!("{text}"),
    }
    Ok(())
}

fn parse_offset(s: &str) -> Result<usize, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("bad offset {s:?}: {e}"))
}

fn parse_kind(s: &str) -> Result<FlagType, String> {
    FlagType::from_name(s).ok_or_else(|| {
        let names: Vec<&str> = FlagType::ALL.iter().map(|k| k.name()).collect();
        format!("unknown flag kind {s:?}, expected one of {}", names.join(", "))
    })
}
