//! # rvcodec — bidirectional RISC-V instruction codec
//!
//! `rvcodec` translates between 32-bit RISC-V instruction words and their
//! textual assembly form, in both directions, and decomposes every result
//! into *fragments*: one record per contiguous bit-field, tying the field's
//! slice of the word to the assembly token it contributes to. The fragment
//! view is what makes the crate useful for teaching and visualization on
//! top of plain assembling/disassembling.
//!
//! Covered encodings: RV32I/RV64I base plus the M, A, F, D, Zicsr, and
//! Zifencei extensions. Compressed (16-bit) instructions, the V extension,
//! labels, and multi-instruction programs are out of scope.
//!
//! ## Quick start
//!
//! ```rust
//! use rvcodec::{decode, encode, Config};
//!
//! let config = Config::default(); // RV32I, numeric register names
//!
//! let insn = decode(0x00c58533, &config)?;
//! assert_eq!(insn.asm, "add x10, x11, x12");
//! assert_eq!(insn.fmt.to_string(), "R-type");
//!
//! let insn = encode("lw x5, -4(x2)", &config)?;
//! assert_eq!(insn.hex, "ffc12283");
//!
//! // Fragments partition all 32 bits, MSB→LSB.
//! let bits: String = insn.bin_frags.iter().map(|f| f.bits.as_str()).collect();
//! assert_eq!(bits, insn.bin);
//! # Ok::<(), rvcodec::CodecError>(())
//! ```
//!
//! ## Features
//!
//! - **Pure codec** — no I/O, no global state; every call is a synchronous
//!   function over constant tables and is freely shareable across threads.
//! - **`no_std` + `alloc`** — the default `std` feature only adds
//!   `std::error::Error` on [`CodecError`].
//! - **`serde`** (optional) — `Serialize`/`Deserialize` on the public value
//!   types.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Lint policy ──────────────────────────────────────────────────────────
// An instruction codec shuffles small integers between field widths and is
// written against fixed binary layouts; these pedantic lints fire on that
// by nature of the domain.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::module_name_repetitions,
    clippy::too_many_lines
)]

extern crate alloc;

/// Bit-level primitives: slices, immediates, word text forms.
pub mod bits;
/// CSR address/name table.
pub mod csr;
pub(crate) mod decoder;
pub(crate) mod encoder;
/// Error types.
pub mod error;
/// The fragment value type.
pub mod fragment;
/// The uniform result type and input-shape façade.
pub mod instruction;
/// Format/ISA tags and the instruction tables.
pub(crate) mod isa;
pub(crate) mod layout;
/// Register name tables.
pub mod reg;

pub use error::{CodecError, ErrorKind};
pub use fragment::Fragment;
pub use instruction::{Config, Instruction};
pub use isa::{BaseIsa, Format, Isa};

/// Decode a 32-bit instruction word into assembly and fragments.
///
/// # Errors
///
/// Returns [`CodecError`] for unrecognized or malformed encodings and for
/// encodings outside the configured base ISA.
///
/// # Examples
///
/// ```
/// use rvcodec::{decode, Config, Isa};
///
/// let insn = decode(0x30529073, &Config::default())?;
/// assert_eq!(insn.asm, "csrrw x0, mtvec, x5");
/// assert_eq!(insn.isa, Isa::ExtZicsr);
/// # Ok::<(), rvcodec::CodecError>(())
/// ```
pub fn decode(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    decoder::decode(word, config)
}

/// Encode one assembly instruction into a word and fragments.
///
/// # Errors
///
/// Returns [`CodecError`] for unknown mnemonics, malformed operands,
/// out-of-range immediates, and encodings outside the configured base ISA.
///
/// # Examples
///
/// ```
/// use rvcodec::{encode, Config};
///
/// let insn = encode("jal x0, 0", &Config::default())?;
/// assert_eq!(insn.hex, "0000006f");
/// # Ok::<(), rvcodec::CodecError>(())
/// ```
pub fn encode(source: &str, config: &Config) -> Result<Instruction, CodecError> {
    encoder::encode(source, config)
}
