use crate::error::{Error, Result};
use arrayvec::ArrayVec;
use std::fmt;

/// Operation size suffix.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Width {
    None,
    B,
    W,
    L,
    S,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    Immediate(u32),
    Text(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    pub mnemonic: String,
    pub width: Width,
    pub operands: ArrayVec<Operand, 2>,
}

impl Width {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "b" => Some(Self::B),
            "w" => Some(Self::W),
            "l" => Some(Self::L),
            "s" => Some(Self::S),
            _ => None,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::B => ".b",
            Self::W => ".w",
            Self::L => ".l",
            Self::S => ".s",
        }
    }
}

impl Operand {
    pub fn parse(text: &str) -> Self {
        text.strip_prefix('#')
            .and_then(parse_number)
            .map_or_else(|| Self::Text(text.to_string()), Self::Immediate)
    }

    pub fn is(&self, name: &str) -> bool {
        match self {
            Self::Text(text) => text.eq_ignore_ascii_case(name),
            Self::Immediate(_) => false,
        }
    }
}

impl From<u32> for Operand {
    fn from(n: u32) -> Self {
        Self::Immediate(n)
    }
}

impl From<&str> for Operand {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl Instruction {
    /// Parses one source line with comments already stripped. `line` is only
    /// used for error reporting.
    pub fn parse(text: &str, line: usize) -> Result<Self> {
        let err = |message: &str| Error::Asm {
            line,
            message: format!("{message}: {text:?}"),
        };

        let text = text.trim();
        let (head, rest) = text
            .split_once(char::is_whitespace)
            .map_or((text, ""), |(h, r)| (h, r.trim()));
        if head.is_empty() {
            return Err(err("missing mnemonic"));
        }
        let (mnemonic, width) = match head.split_once('.') {
            Some((m, suffix)) => (
                m,
                Width::from_suffix(suffix).ok_or_else(|| err("unknown size"))?,
            ),
            None => (head, Width::None),
        };

        let mut operands = ArrayVec::new();
        for op in split_operands(rest) {
            if op.is_empty() {
                return Err(err("empty operand"));
            }
            operands
                .try_push(Operand::parse(op))
                .map_err(|_| err("too many operands"))?;
        }
        Ok(Self {
            mnemonic: mnemonic.to_ascii_lowercase(),
            width,
            operands,
        })
    }

    pub fn is_call_to(&self, target: &str) -> bool {
        matches!(self.mnemonic.as_str(), "bsr" | "jsr")
            && self.operands.len() == 1
            && (self.operands[0].is(target)
                || self.operands[0].is(&format!("({target}).l"))
                || self.operands[0].is(&format!("({target}).w")))
    }
}

/// Splits on commas that are not inside parentheses.
fn split_operands(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    if text.is_empty() {
        return result;
    }
    let mut depth = 0_u32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                result.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    result.push(text[start..].trim());
    result
}

/// Accepts `$hex`, `0xhex` or decimal.
pub fn parse_number(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('$') {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(n) if *n < 10 => write!(f, "#{n}"),
            Self::Immediate(n) => write!(f, "#${n:X}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.mnemonic, self.width)?;
        for (i, op) in self.operands.iter().enumerate() {
            let sep = if i == 0 { '\t' } else { ',' };
            write!(f, "{sep}{op}")?;
        }
        Ok(())
    }
}
