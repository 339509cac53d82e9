//! The fragment model: one record per contiguous bit-field, tying the
//! field's slice of the encoded word to the assembly token it contributes to.
//!
//! Internally both codec directions describe an instruction as a list of
//! [`Piece`]s — named field slices with values and token bindings — produced
//! from a single per-format schema in `layout`. [`assemble_word`] folds the
//! pieces into the 32-bit word while proving they partition all 32 bits
//! exactly once, and [`fragments`] derives the two public orderings.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::bits;
use crate::error::CodecError;

/// One contiguous bit-field of an encoded instruction, tied to its role in
/// the rendered assembly.
// Serialize only: `field` borrows the static descriptor names.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fragment {
    /// The assembly token this slice contributes to. Non-operand slices
    /// (opcode, funct fields, fixed bits) carry the mnemonic.
    pub asm: String,
    /// Binary text of the slice, MSB first.
    pub bits: String,
    /// Field descriptor name (e.g. `"opcode"`, `"rs1"`, `"b_imm_10_5"`).
    pub field: &'static str,
    /// True iff this fragment renders as the base register of an
    /// `offset(base)` memory operand.
    pub mem: bool,
    /// Position of the slice's least-significant bit within the word.
    pub index: u8,
}

/// A named field slice with its value and assembly-token binding.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Piece {
    /// Field descriptor name.
    pub name: &'static str,
    /// Highest bit position of the slice (bit 0 = LSB of the word).
    pub hi: u8,
    /// Slice width in bits.
    pub width: u8,
    /// Field value, already range-checked to fit `width` bits.
    pub value: u32,
    /// Index of the assembly token this slice contributes to (0 = mnemonic).
    pub token: u8,
    /// Memory-base marker, forwarded to [`Fragment::mem`].
    pub mem: bool,
}

impl Piece {
    pub(crate) fn new(name: &'static str, hi: u8, width: u8, value: u32, token: u8) -> Self {
        Piece {
            name,
            hi,
            width,
            value,
            token,
            mem: false,
        }
    }

    pub(crate) fn mem(name: &'static str, hi: u8, width: u8, value: u32, token: u8) -> Self {
        Piece {
            mem: true,
            ..Piece::new(name, hi, width, value, token)
        }
    }
}

/// Fold the pieces into a 32-bit word, verifying that together they cover
/// every bit position exactly once and that every value fits its slice.
///
/// # Errors
///
/// Returns [`CodecError::Internal`] on any overlap, gap, or oversized value —
/// all of which indicate a schema bug rather than bad input.
pub(crate) fn assemble_word(pieces: &[Piece]) -> Result<u32, CodecError> {
    let mut word = 0u32;
    let mut covered = 0u32;
    for piece in pieces {
        let hi = u32::from(piece.hi);
        let width = u32::from(piece.width);
        if width == 0 || hi >= 32 || width > hi + 1 {
            return Err(CodecError::Internal {
                detail: format!("field {} has malformed slice", piece.name),
            });
        }
        if piece.value > bits::mask(width) {
            return Err(CodecError::Internal {
                detail: format!("field {} value exceeds {width} bits", piece.name),
            });
        }
        let lo = hi + 1 - width;
        let slice_mask = bits::mask(width) << lo;
        if covered & slice_mask != 0 {
            return Err(CodecError::Internal {
                detail: format!("field {} overlaps another field", piece.name),
            });
        }
        covered |= slice_mask;
        word |= piece.value << lo;
    }
    if covered != u32::MAX {
        return Err(CodecError::Internal {
            detail: String::from("fields do not cover all 32 bits"),
        });
    }
    Ok(word)
}

/// Derive the two public fragment orderings from one piece list.
///
/// `bin` is ordered MSB→LSB across the word; `asm` is ordered by assembly
/// token, preserving the schema's significance order for scattered
/// immediates. Both contain the same fragments.
pub(crate) fn fragments(pieces: &[Piece], tokens: &[String]) -> (Vec<Fragment>, Vec<Fragment>) {
    let make = |piece: &Piece| Fragment {
        asm: tokens[piece.token as usize].clone(),
        bits: bits::to_fixed_bin(piece.value, u32::from(piece.width)),
        field: piece.name,
        mem: piece.mem,
        index: piece.hi + 1 - piece.width,
    };

    let mut bin: Vec<&Piece> = pieces.iter().collect();
    bin.sort_by(|a, b| b.hi.cmp(&a.hi));
    let bin = bin.into_iter().map(make).collect();

    let mut asm: Vec<&Piece> = pieces.iter().collect();
    asm.sort_by_key(|p| p.token);
    let asm = asm.into_iter().map(make).collect();

    (bin, asm)
}
