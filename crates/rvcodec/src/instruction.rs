//! The uniform instruction result and the input-shape façade.

use alloc::string::String;
use alloc::vec::Vec;

use crate::decoder;
use crate::encoder;
use crate::error::CodecError;
use crate::fragment::Fragment;
use crate::isa::{BaseIsa, Format, Isa};

/// Codec configuration.
///
/// `isa` restricts which encodings are legal; `abi` selects ABI register
/// names (`sp`, `fa0`, …) instead of numeric ones (`x2`, `f10`, …) on
/// output. The default is RV32I with numeric names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// The configured base ISA.
    pub isa: BaseIsa,
    /// Render registers by ABI name.
    pub abi: bool,
}

impl Config {
    /// An RV64I configuration with numeric register names.
    #[must_use]
    pub fn rv64() -> Self {
        Config {
            isa: BaseIsa::Rv64i,
            abi: false,
        }
    }
}

/// The uniform result of both codec directions.
///
/// `bin_frags` partitions all 32 bits of the word exactly once, ordered
/// MSB→LSB; `asm_frags` holds the same fragments ordered as their tokens
/// appear in the assembly line. Concatenating `bin_frags[*].bits` yields
/// `bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Instruction {
    /// The word as 8 lowercase hex digits, without prefix.
    pub hex: String,
    /// The word as 32 binary digits, MSB first.
    pub bin: String,
    /// Canonical assembly rendering.
    pub asm: String,
    /// Instruction format.
    pub fmt: Format,
    /// ISA membership tag (possibly promoted to RV64I by a wide shift).
    pub isa: Isa,
    /// Fragments in binary-field order.
    pub bin_frags: Vec<Fragment>,
    /// Fragments in assembly-token order.
    pub asm_frags: Vec<Fragment>,
}

impl Instruction {
    /// Translate either direction, detecting the input shape lexically.
    ///
    /// A word is 8 hex digits (optionally `0x`-prefixed) or 32 binary digits
    /// (optionally `0b`-prefixed); anything else is treated as assembly.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedInput`] when the input is empty, looks
    /// like a word but is not one, or starts with a digit without being a
    /// word; otherwise whatever the selected direction reports.
    ///
    /// # Examples
    ///
    /// ```
    /// use rvcodec::{Config, Instruction};
    ///
    /// let insn = Instruction::parse("0x00c58533", &Config::default())?;
    /// assert_eq!(insn.asm, "add x10, x11, x12");
    ///
    /// let insn = Instruction::parse("lw x5, -4(x2)", &Config::default())?;
    /// assert_eq!(insn.hex, "ffc12283");
    /// # Ok::<(), rvcodec::CodecError>(())
    /// ```
    pub fn parse(input: &str, config: &Config) -> Result<Self, CodecError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(CodecError::MalformedInput {
                detail: String::from("empty input"),
            });
        }
        match classify(text)? {
            Some(word) => decoder::decode(word, config),
            None => encoder::encode(text, config),
        }
    }

    /// Decode a 32-bit word. See [`crate::decode`].
    ///
    /// # Errors
    ///
    /// Propagates decoder errors; see [`CodecError`].
    pub fn from_word(word: u32, config: &Config) -> Result<Self, CodecError> {
        decoder::decode(word, config)
    }

    /// Encode one assembly line. See [`crate::encode`].
    ///
    /// # Errors
    ///
    /// Propagates encoder errors; see [`CodecError`].
    pub fn from_asm(line: &str, config: &Config) -> Result<Self, CodecError> {
        encoder::encode(line, config)
    }
}

/// Lexical input-shape detection: `Ok(Some(word))` for an encoded word,
/// `Ok(None)` for assembly, `Err` for digit-led text that is neither.
fn classify(text: &str) -> Result<Option<u32>, CodecError> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return match parse_radix(hex, 8, 16) {
            Some(word) => Ok(Some(word)),
            None => Err(CodecError::MalformedInput {
                detail: String::from("expected 8 hex digits after '0x'"),
            }),
        };
    }
    if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        return match parse_radix(bin, 32, 2) {
            Some(word) => Ok(Some(word)),
            None => Err(CodecError::MalformedInput {
                detail: String::from("expected 32 binary digits after '0b'"),
            }),
        };
    }
    if let Some(word) = parse_radix(text, 32, 2) {
        return Ok(Some(word));
    }
    if let Some(word) = parse_radix(text, 8, 16) {
        return Ok(Some(word));
    }
    // Assembly mnemonics never start with a digit.
    if text.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(CodecError::MalformedInput {
            detail: String::from("expected an 8-digit hex or 32-digit binary word"),
        });
    }
    Ok(None)
}

fn parse_radix(text: &str, len: usize, radix: u32) -> Option<u32> {
    if text.len() != len || !text.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(text, radix).ok()
}
