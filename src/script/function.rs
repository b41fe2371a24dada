use crate::{
    bits::{BitBarrel, BitBarrelWriter},
    error::{Error, Result},
    labels::Labels,
    script::asm::{parse_number, Instruction},
    table::WORD_TERMINATOR,
};
use indexmap::IndexMap;
use std::{collections::BTreeMap, fmt, fmt::Write as _};
use tracing::{debug, instrument};

pub const PICK_VALUE_BASED_ON_FLAGS: &str = "PickValueBasedOnFlags";

/// progress -> flag
pub type FlagMapping = BTreeMap<u8, u16>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Statement {
    /// A call to `PickValueBasedOnFlags` with its inline data.
    ProgressFlagMapping(FlagMapping),
    CustomAsm(Vec<Instruction>),
    /// A local `.name:` or `@name:` label inside the function.
    Label(String),
    Rts,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScriptFunction {
    pub name: String,
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScriptFunctionTable {
    functions: IndexMap<String, ScriptFunction>,
}

/// Reads mapping data: `flag, progress << 8` word pairs ending with `0xFFFF`.
/// A progress value seen twice keeps the later flag.
pub fn decode_mapping(barrel: &mut BitBarrel<'_>) -> Result<FlagMapping> {
    let mut mapping = FlagMapping::new();
    loop {
        let flag = barrel.read_u16()?;
        if flag == WORD_TERMINATOR {
            break;
        }
        let progress = barrel.read_u8()?;
        let _ = barrel.read_u8()?;
        mapping.insert(progress, flag);
    }
    Ok(mapping)
}

/// Entries are written highest progress first.
pub fn encode_mapping(mapping: &FlagMapping, writer: &mut BitBarrelWriter) {
    for (&progress, &flag) in mapping.iter().rev() {
        writer.write_u16(flag);
        writer.write_u8(progress);
        writer.write_u8(0);
    }
    writer.write_u16(WORD_TERMINATOR);
}

fn mapping_words(mapping: &FlagMapping) -> Vec<u16> {
    let mut writer = BitBarrelWriter::with_capacity(mapping.len() * 4 + 2);
    encode_mapping(mapping, &mut writer);
    writer
        .bytes()
        .chunks_exact(2)
        .map(|w| u16::from_be_bytes([w[0], w[1]]))
        .collect()
}

/// Index just past the terminator, if `words` holds one at a flag position.
fn mapping_end(words: &[u16]) -> Option<usize> {
    words
        .iter()
        .step_by(2)
        .position(|&w| w == WORD_TERMINATOR)
        .map(|i| i * 2 + 1)
}

impl ScriptFunction {
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            name: name.into(),
            statements,
        }
    }

    fn push_instruction(&mut self, ins: Instruction) {
        if let Some(Statement::CustomAsm(instructions)) = self.statements.last_mut() {
            instructions.push(ins);
        } else {
            self.statements.push(Statement::CustomAsm(vec![ins]));
        }
    }

    fn write_asm(&self, out: &mut String) {
        let _ = writeln!(out, "{}:", self.name);
        for statement in &self.statements {
            match statement {
                Statement::ProgressFlagMapping(mapping) => {
                    let _ = writeln!(out, "\t\tbsr.w\t{PICK_VALUE_BASED_ON_FLAGS}");
                    for pair in mapping_words(mapping).chunks(2) {
                        let values: Vec<String> =
                            pair.iter().map(|w| format!("${w:04X}")).collect();
                        let _ = writeln!(out, "\t\tdc.w\t{}", values.join(","));
                    }
                }
                Statement::CustomAsm(instructions) => {
                    for ins in instructions {
                        let _ = writeln!(out, "\t\t{ins}");
                    }
                }
                Statement::Label(label) => {
                    let _ = writeln!(out, "{label}:");
                }
                Statement::Rts => out.push_str("\t\trts\n"),
            }
        }
    }
}

impl ScriptFunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and leaves the table unchanged if the name is taken.
    pub fn add_function(&mut self, func: ScriptFunction) -> bool {
        if self.functions.contains_key(&func.name) {
            return false;
        }
        self.functions.insert(func.name.clone(), func);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ScriptFunction> {
        self.functions.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ScriptFunction> {
        self.functions.get_mut(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &ScriptFunction> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Parses assembler source. A line ending in `:` starts a function unless
    /// the label begins with `.` or `@`, which keeps it local to the current
    /// one. `;` starts a comment, and a call to `PickValueBasedOnFlags` takes
    /// the `dc.w` lines after it as mapping data.
    #[instrument(level = "debug", skip(source), fields(len = source.len()))]
    pub fn from_asm(source: &str) -> Result<Self> {
        let mut table = Self::new();
        let mut current: Option<(usize, ScriptFunction)> = None;
        let mut pending: Option<(usize, Vec<u16>)> = None;

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let text = raw.split(';').next().unwrap_or_default().trim();
            if text.is_empty() {
                continue;
            }

            if let Some((start, words)) = &mut pending {
                let data = text
                    .split_once(char::is_whitespace)
                    .filter(|(head, _)| head.eq_ignore_ascii_case("dc.w"))
                    .map(|(_, rest)| rest);
                let Some(data) = data else {
                    return Err(unterminated(*start));
                };
                for value in data.split(',') {
                    let word = parse_number(value)
                        .and_then(|n| u16::try_from(n).ok())
                        .ok_or_else(|| Error::Asm {
                            line,
                            message: format!("bad mapping word {:?}", value.trim()),
                        })?;
                    words.push(word);
                }
                if let Some(end) = mapping_end(words) {
                    if end != words.len() {
                        return Err(Error::Asm {
                            line,
                            message: "data after mapping terminator".into(),
                        });
                    }
                    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
                    let mapping = decode_mapping(&mut BitBarrel::new(&bytes))?;
                    if let Some((_, func)) = &mut current {
                        func.statements.push(Statement::ProgressFlagMapping(mapping));
                    }
                    pending = None;
                }
                continue;
            }

            if let Some(name) = text.strip_suffix(':') {
                let name = name.trim();
                if name.starts_with(|c| c == '.' || c == '@') {
                    let Some((_, func)) = &mut current else {
                        return Err(Error::Asm {
                            line,
                            message: format!("local label {name} outside a function"),
                        });
                    };
                    func.statements.push(Statement::Label(name.into()));
                    continue;
                }
                if let Some((start, func)) = current.take() {
                    table.push_parsed(start, func)?;
                }
                current = Some((line, ScriptFunction::new(name, Vec::new())));
                continue;
            }

            let ins = Instruction::parse(text, line)?;
            let Some((_, func)) = &mut current else {
                return Err(Error::Asm {
                    line,
                    message: "instruction outside a function".into(),
                });
            };
            if ins.is_call_to(PICK_VALUE_BASED_ON_FLAGS) {
                pending = Some((line, Vec::new()));
            } else if ins.mnemonic == "rts" && ins.operands.is_empty() {
                func.statements.push(Statement::Rts);
            } else {
                func.push_instruction(ins);
            }
        }

        if let Some((start, _)) = pending {
            return Err(unterminated(start));
        }
        if let Some((start, func)) = current {
            table.push_parsed(start, func)?;
        }
        debug!("{} functions", table.len());
        Ok(table)
    }

    fn push_parsed(&mut self, line: usize, func: ScriptFunction) -> Result<()> {
        let name = func.name.clone();
        if self.add_function(func) {
            Ok(())
        } else {
            Err(Error::Asm {
                line,
                message: format!("duplicate label {name}"),
            })
        }
    }

    pub fn to_asm(&self) -> String {
        let mut out = String::new();
        for (i, func) in self.functions.values().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            func.write_asm(&mut out);
        }
        out
    }

    pub fn describe<'a>(&'a self, labels: &'a Labels) -> Describe<'a> {
        Describe {
            table: self,
            labels,
        }
    }
}

fn unterminated(line: usize) -> Error {
    Error::Asm {
        line,
        message: "unterminated flag mapping".into(),
    }
}

pub struct Describe<'a> {
    table: &'a ScriptFunctionTable,
    labels: &'a Labels,
}

impl fmt::Display for Describe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in self.table.functions() {
            writeln!(f, "{}:", func.name)?;
            for statement in &func.statements {
                match statement {
                    Statement::ProgressFlagMapping(mapping) => {
                        writeln!(f, "  progress flag mapping:")?;
                        for (progress, &flag) in mapping {
                            let flag = self.labels.flag_name(flag);
                            writeln!(f, "    progress {progress} <- {flag}")?;
                        }
                    }
                    Statement::CustomAsm(instructions) => {
                        for ins in instructions {
                            writeln!(f, "  {ins}")?;
                        }
                    }
                    Statement::Label(label) => writeln!(f, "  {label}:")?,
                    Statement::Rts => writeln!(f, "  rts")?,
                }
            }
        }
        Ok(())
    }
}
