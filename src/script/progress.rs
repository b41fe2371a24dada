use crate::{
    error::{Error, Result},
    script::{
        asm::Operand,
        function::{FlagMapping, ScriptFunction, ScriptFunctionTable, Statement},
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

pub const GET_FLAG_PROGRESS: &str = "GetFlagProgress";

/// Marks a progress value with no flag.
pub const NO_FLAG: u16 = 0xffff;

const MAX_PROGRESS_VALUES: usize = 256;

/// Flags indexed by progress value, grouped by quest.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProgressFlags {
    quests: BTreeMap<u8, Vec<u16>>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct Document {
    progress_flags: Vec<QuestEntry>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct QuestEntry {
    quest: u8,
    flags: Vec<Option<u16>>,
}

impl ProgressFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quest(&self, quest: u8) -> &[u16] {
        self.quests.get(&quest).map_or(&[][..], Vec::as_slice)
    }

    /// An empty list removes the quest. Progress values are a byte, so at
    /// most 256 flags fit.
    pub fn set_quest(&mut self, quest: u8, flags: Vec<u16>) -> Result<()> {
        if flags.len() > MAX_PROGRESS_VALUES {
            return Err(Error::TooManyProgressValues {
                quest,
                count: flags.len(),
            });
        }
        if flags.is_empty() {
            self.quests.remove(&quest);
        } else {
            self.quests.insert(quest, flags);
        }
        Ok(())
    }

    pub fn quests(&self) -> impl Iterator<Item = (u8, &[u16])> + '_ {
        self.quests.iter().map(|(&q, flags)| (q, flags.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Recovers the flags from `GetFlagProgress`. Each `addq #n,a0` moves on
    /// `n` quests; each flag mapping fills in the current quest. The first
    /// mapping to set a progress value keeps it. A table without that
    /// function has no flags.
    pub fn get_flags(table: &ScriptFunctionTable) -> Self {
        let mut result = Self::new();
        let Some(func) = table.get(GET_FLAG_PROGRESS) else {
            debug!("no {GET_FLAG_PROGRESS} function");
            return result;
        };

        let mut quest = 0_u8;
        for statement in &func.statements {
            match statement {
                Statement::ProgressFlagMapping(mapping) => {
                    for (&progress, &flag) in mapping {
                        let flags = result.quests.entry(quest).or_default();
                        let index = usize::from(progress);
                        if flags.len() <= index {
                            flags.resize(index + 1, NO_FLAG);
                        }
                        if flags[index] == NO_FLAG {
                            flags[index] = flag;
                        }
                    }
                }
                Statement::CustomAsm(instructions) => {
                    for ins in instructions {
                        if ins.mnemonic != "addq" || ins.operands.len() != 2 {
                            continue;
                        }
                        if let (Operand::Immediate(n), reg) = (&ins.operands[0], &ins.operands[1]) {
                            if reg.is("a0") {
                                quest = quest.wrapping_add(n.to_le_bytes()[0]);
                            }
                        }
                    }
                }
                Statement::Label(_) | Statement::Rts => {}
            }
        }
        debug!("{} quests", result.quests.len());
        result
    }

    /// Builds a `GetFlagProgress` function that `get_flags` reads back.
    pub fn make_asm(&self) -> ScriptFunctionTable {
        let mut statements = vec![Statement::CustomAsm(vec![
            ins!("move", L; "a0", "-(sp)"),
            ins!("lea"; "(g_GameFlagProgress1).l", "a0"),
        ])];

        let last = self.quests.keys().next_back().copied().unwrap_or(0);
        for quest in 0..=last {
            let mapping: FlagMapping = self
                .quest(quest)
                .iter()
                .enumerate()
                .filter(|&(_, &flag)| flag != NO_FLAG)
                // set_quest and from_yaml keep at most 256 entries
                .map(|(progress, &flag)| (progress.try_into().unwrap(), flag))
                .collect();
            trace!("quest {quest}: {} flags", mapping.len());
            statements.push(Statement::ProgressFlagMapping(mapping));
            if quest < last {
                statements.push(Statement::CustomAsm(vec![ins!("addq", L; 1u32, "a0")]));
            }
        }

        statements.push(Statement::CustomAsm(vec![ins!("movea", L; "(sp)+", "a0")]));
        statements.push(Statement::Rts);

        let mut table = ScriptFunctionTable::new();
        table.add_function(ScriptFunction::new(GET_FLAG_PROGRESS, statements));
        table
    }

    pub fn to_yaml(&self) -> Result<String> {
        let doc = Document {
            progress_flags: self
                .quests
                .iter()
                .map(|(&quest, flags)| QuestEntry {
                    quest,
                    flags: flags
                        .iter()
                        .map(|&f| if f == NO_FLAG { None } else { Some(f) })
                        .collect(),
                })
                .collect(),
        };
        Ok(serde_yaml::to_string(&doc)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let doc: Document = serde_yaml::from_str(yaml)?;
        let mut result = Self::new();
        for entry in doc.progress_flags {
            let quest = entry.quest;
            if entry.flags.is_empty() {
                return Err(Error::EmptyQuest { quest });
            }
            if result.quests.contains_key(&quest) {
                return Err(Error::DuplicateQuest { quest });
            }
            let flags = entry.flags.into_iter().map(|f| f.unwrap_or(NO_FLAG)).collect();
            result.set_quest(quest, flags)?;
        }
        Ok(result)
    }
}
