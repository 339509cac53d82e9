//! Per-format layout schema shared by the decoder and the encoder.
//!
//! Each operand pattern maps resolved field values to the same ordered set of
//! named pieces and rendered tokens, so the binary-field and assembly-operand
//! views of an instruction are always produced from one source of truth. The
//! decoder fills [`Operands`] from an existing word, the encoder from parsed
//! text; both then call [`build`].

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::bits;
use crate::csr;
use crate::error::CodecError;
use crate::fragment::{assemble_word, fragments, Piece};
use crate::instruction::{Config, Instruction};
use crate::isa::{fence_set_name, rm_name, InstrSpec, Isa, Pattern};
use crate::reg::{freg_name, xreg_name};

/// Resolved operand and sub-field values of one instruction.
///
/// Only the fields meaningful for the pattern are read; the rest stay at
/// their defaults.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Operands {
    pub rd: u32,
    pub rs1: u32,
    pub rs2: u32,
    pub rs3: u32,
    /// Signed immediate / offset, or the raw 20-bit value for U-type.
    pub imm: i64,
    /// CSR address (Zicsr).
    pub csr: u32,
    /// 5-bit zero-extended immediate (csrr?i).
    pub uimm: u32,
    /// Shift amount.
    pub shamt: u32,
    /// Whether the shamt field is the 6-bit variant.
    pub wide_shamt: bool,
    /// Fence predecessor/successor masks.
    pub pred: u32,
    pub succ: u32,
    /// Rounding mode (validated against the rm table).
    pub rm: u32,
    /// AMO ordering bits.
    pub aq: bool,
    pub rl: bool,
}

/// Resolve the ISA tag to report, enforcing the configured width.
///
/// `promote64` marks encodings that only exist at 64-bit width for reasons
/// outside the mnemonic table (a shift with `shamt[5]` set).
pub(crate) fn resolve_isa(
    spec: &InstrSpec,
    config: &Config,
    promote64: bool,
) -> Result<Isa, CodecError> {
    if (spec.rv64_only || promote64) && config.isa == crate::isa::BaseIsa::Rv32i {
        return Err(CodecError::IsaMismatch {
            needs: "RV64I",
            have: config.isa.name(),
        });
    }
    Ok(if promote64 && spec.isa == Isa::Rv32i {
        Isa::Rv64i
    } else {
        spec.isa
    })
}

/// Build the uniform result from a spec and resolved operands.
///
/// `isa` is the tag to report (usually the spec's own, possibly promoted to
/// RV64I by a wide shift).
pub(crate) fn build(
    spec: &InstrSpec,
    ops: &Operands,
    isa: Isa,
    config: &Config,
) -> Result<Instruction, CodecError> {
    let abi = config.abi;
    let mut tokens: Vec<String> = Vec::with_capacity(6);
    tokens.push(mnemonic_token(spec, ops));
    let mut pieces: Vec<Piece> = Vec::with_capacity(9);
    pieces.push(Piece::new("opcode", 6, 7, spec.opcode, 0));

    let xr = |n: u32| xreg_name(n, abi);
    let fr = |n: u32| freg_name(n, abi);
    let rd_name = if spec.pattern.rd_float() { fr(ops.rd) } else { xr(ops.rd) };
    let rs1_name = if spec.pattern.rs1_float() { fr(ops.rs1) } else { xr(ops.rs1) };
    let rs2_name = if spec.pattern.rs2_float() { fr(ops.rs2) } else { xr(ops.rs2) };

    let asm = match spec.pattern {
        Pattern::Reg3 => {
            tokens.extend([rd_name, rs1_name, rs2_name]);
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("funct7", 31, 7, spec.funct7, 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("rs1", 19, 5, ops.rs1, 2),
                Piece::new("rs2", 24, 5, ops.rs2, 3),
            ]);
            plain(&tokens)
        }

        Pattern::RegImm => {
            tokens.extend([rd_name, rs1_name, format!("{}", ops.imm)]);
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("rs1", 19, 5, ops.rs1, 2),
                Piece::new("imm_11_0", 31, 12, imm_bits(ops.imm, 0, 12), 3),
            ]);
            plain(&tokens)
        }

        Pattern::Shift | Pattern::ShiftW => {
            tokens.extend([rd_name, rs1_name, format!("{}", ops.shamt)]);
            let wide = ops.wide_shamt && spec.pattern == Pattern::Shift;
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                if wide {
                    Piece::new("shtyp", 31, 6, spec.shtyp >> 1, 0)
                } else {
                    Piece::new("shtyp", 31, 7, spec.shtyp, 0)
                },
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("rs1", 19, 5, ops.rs1, 2),
                if wide {
                    Piece::new("shamt", 25, 6, ops.shamt, 3)
                } else {
                    Piece::new("shamt", 24, 5, ops.shamt, 3)
                },
            ]);
            plain(&tokens)
        }

        Pattern::Load { .. } | Pattern::Jalr => {
            tokens.extend([rd_name, format!("{}", ops.imm), rs1_name]);
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("imm_11_0", 31, 12, imm_bits(ops.imm, 0, 12), 2),
                Piece::mem("rs1", 19, 5, ops.rs1, 3),
            ]);
            mem_form(&tokens)
        }

        Pattern::Store { .. } => {
            tokens.extend([rs2_name, format!("{}", ops.imm), rs1_name]);
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("rs2", 24, 5, ops.rs2, 1),
                Piece::new("s_imm_11_5", 31, 7, imm_bits(ops.imm, 5, 7), 2),
                Piece::new("s_imm_4_0", 11, 5, imm_bits(ops.imm, 0, 5), 2),
                Piece::mem("rs1", 19, 5, ops.rs1, 3),
            ]);
            mem_form(&tokens)
        }

        Pattern::Branch => {
            tokens.extend([rs1_name, rs2_name, format!("{}", ops.imm)]);
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("rs1", 19, 5, ops.rs1, 1),
                Piece::new("rs2", 24, 5, ops.rs2, 2),
                Piece::new("b_imm_12", 31, 1, imm_bits(ops.imm, 12, 1), 3),
                Piece::new("b_imm_11", 7, 1, imm_bits(ops.imm, 11, 1), 3),
                Piece::new("b_imm_10_5", 30, 6, imm_bits(ops.imm, 5, 6), 3),
                Piece::new("b_imm_4_1", 11, 4, imm_bits(ops.imm, 1, 4), 3),
            ]);
            plain(&tokens)
        }

        Pattern::Upper => {
            tokens.extend([rd_name, format!("{}", ops.imm)]);
            pieces.extend([
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("imm_31_12", 31, 20, imm_bits(ops.imm, 0, 20), 2),
            ]);
            plain(&tokens)
        }

        Pattern::Jump => {
            tokens.extend([rd_name, format!("{}", ops.imm)]);
            pieces.extend([
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("j_imm_20", 31, 1, imm_bits(ops.imm, 20, 1), 2),
                Piece::new("j_imm_19_12", 19, 8, imm_bits(ops.imm, 12, 8), 2),
                Piece::new("j_imm_11", 20, 1, imm_bits(ops.imm, 11, 1), 2),
                Piece::new("j_imm_10_1", 30, 10, imm_bits(ops.imm, 1, 10), 2),
            ]);
            plain(&tokens)
        }

        Pattern::Fence => {
            tokens.extend([fence_set_name(ops.pred), fence_set_name(ops.succ)]);
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("fm", 31, 4, 0, 0),
                Piece::new("rd", 11, 5, 0, 0),
                Piece::new("rs1", 19, 5, 0, 0),
                Piece::new("pred", 27, 4, ops.pred, 1),
                Piece::new("succ", 23, 4, ops.succ, 2),
            ]);
            plain(&tokens)
        }

        Pattern::FenceI => {
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("imm_11_0", 31, 12, 0, 0),
                Piece::new("rd", 11, 5, 0, 0),
                Piece::new("rs1", 19, 5, 0, 0),
            ]);
            tokens[0].clone()
        }

        Pattern::Trap => {
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("funct12", 31, 12, spec.funct12, 0),
                Piece::new("rd", 11, 5, 0, 0),
                Piece::new("rs1", 19, 5, 0, 0),
            ]);
            tokens[0].clone()
        }

        Pattern::Csr { imm } => {
            tokens.push(rd_name);
            tokens.push(csr::csr_render(ops.csr));
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("csr", 31, 12, ops.csr, 2),
            ]);
            if imm {
                tokens.push(format!("{}", ops.uimm));
                pieces.push(Piece::new("uimm", 19, 5, ops.uimm, 3));
            } else {
                tokens.push(rs1_name);
                pieces.push(Piece::new("rs1", 19, 5, ops.rs1, 3));
            }
            plain(&tokens)
        }

        Pattern::Amo { lr } => {
            tokens.push(rd_name);
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("funct5", 31, 5, spec.funct5, 0),
                Piece::new("aq", 26, 1, u32::from(ops.aq), 0),
                Piece::new("rl", 25, 1, u32::from(ops.rl), 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
            ]);
            if lr {
                tokens.push(rs1_name);
                pieces.push(Piece::new("rs2", 24, 5, 0, 0));
                pieces.push(Piece::mem("rs1", 19, 5, ops.rs1, 2));
                format!("{} {}, ({})", tokens[0], tokens[1], tokens[2])
            } else {
                tokens.push(rs2_name);
                tokens.push(rs1_name);
                pieces.push(Piece::new("rs2", 24, 5, ops.rs2, 2));
                pieces.push(Piece::mem("rs1", 19, 5, ops.rs1, 3));
                format!("{} {}, {}, ({})", tokens[0], tokens[1], tokens[2], tokens[3])
            }
        }

        Pattern::FpR4 => {
            let rs3_name = fr(ops.rs3);
            let rm = rm_token(ops.rm)?;
            tokens.extend([rd_name, rs1_name, rs2_name, rs3_name, rm]);
            pieces.extend([
                Piece::new("fmt", 26, 2, spec.fp_fmt, 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("rs1", 19, 5, ops.rs1, 2),
                Piece::new("rs2", 24, 5, ops.rs2, 3),
                Piece::new("rs3", 31, 5, ops.rs3, 4),
                Piece::new("rm", 14, 3, ops.rm, 5),
            ]);
            plain(&tokens)
        }

        Pattern::FpArith => {
            let rm = rm_token(ops.rm)?;
            tokens.extend([rd_name, rs1_name, rs2_name, rm]);
            pieces.extend([
                Piece::new("funct5", 31, 5, spec.funct5, 0),
                Piece::new("fmt", 26, 2, spec.fp_fmt, 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("rs1", 19, 5, ops.rs1, 2),
                Piece::new("rs2", 24, 5, ops.rs2, 3),
                Piece::new("rm", 14, 3, ops.rm, 4),
            ]);
            plain(&tokens)
        }

        Pattern::FpSqrt | Pattern::FpCvtToInt | Pattern::FpCvtFromInt | Pattern::FpCvtFp => {
            let rm = rm_token(ops.rm)?;
            tokens.extend([rd_name, rs1_name, rm]);
            pieces.extend([
                Piece::new("funct5", 31, 5, spec.funct5, 0),
                Piece::new("fmt", 26, 2, spec.fp_fmt, 0),
                Piece::new("rs2", 24, 5, spec.rs2_fixed, 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("rs1", 19, 5, ops.rs1, 2),
                Piece::new("rm", 14, 3, ops.rm, 3),
            ]);
            plain(&tokens)
        }

        Pattern::FpSgn | Pattern::FpCmp => {
            tokens.extend([rd_name, rs1_name, rs2_name]);
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("funct5", 31, 5, spec.funct5, 0),
                Piece::new("fmt", 26, 2, spec.fp_fmt, 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("rs1", 19, 5, ops.rs1, 2),
                Piece::new("rs2", 24, 5, ops.rs2, 3),
            ]);
            plain(&tokens)
        }

        Pattern::FpUnaryX | Pattern::FpUnaryF => {
            tokens.extend([rd_name, rs1_name]);
            pieces.extend([
                Piece::new("funct3", 14, 3, spec.funct3, 0),
                Piece::new("funct5", 31, 5, spec.funct5, 0),
                Piece::new("fmt", 26, 2, spec.fp_fmt, 0),
                Piece::new("rs2", 24, 5, spec.rs2_fixed, 0),
                Piece::new("rd", 11, 5, ops.rd, 1),
                Piece::new("rs1", 19, 5, ops.rs1, 2),
            ]);
            plain(&tokens)
        }
    };

    let word = assemble_word(&pieces)?;
    let (bin_frags, asm_frags) = fragments(&pieces, &tokens);
    Ok(Instruction {
        hex: bits::to_hex(word),
        bin: bits::to_bin(word),
        asm,
        fmt: spec.fmt,
        isa,
        bin_frags,
        asm_frags,
    })
}

/// The mnemonic token, with AMO ordering suffixes applied.
fn mnemonic_token(spec: &InstrSpec, ops: &Operands) -> String {
    let mut name = String::from(spec.mnemonic);
    if matches!(spec.pattern, Pattern::Amo { .. }) {
        match (ops.aq, ops.rl) {
            (true, true) => name.push_str(".aqrl"),
            (true, false) => name.push_str(".aq"),
            (false, true) => name.push_str(".rl"),
            (false, false) => {}
        }
    }
    name
}

/// `mnemonic op1, op2, …` for formats without memory syntax.
fn plain(tokens: &[String]) -> String {
    let mut out = tokens[0].clone();
    for (i, tok) in tokens[1..].iter().enumerate() {
        out.push_str(if i == 0 { " " } else { ", " });
        out.push_str(tok);
    }
    out
}

/// `mnemonic rd, imm(rs1)` for loads, stores, and JALR.
fn mem_form(tokens: &[String]) -> String {
    format!("{} {}, {}({})", tokens[0], tokens[1], tokens[2], tokens[3])
}

/// Slice `width` bits of `imm` starting at bit `lo`.
fn imm_bits(imm: i64, lo: u32, width: u32) -> u32 {
    ((imm as u32) >> lo) & bits::mask(width)
}

/// Render a rounding mode, rejecting the reserved encodings.
fn rm_token(rm: u32) -> Result<String, CodecError> {
    match rm_name(rm) {
        Some(name) => Ok(String::from(name)),
        None => Err(CodecError::InvalidFunct {
            detail: format!("reserved rounding mode 0b{rm:03b}"),
        }),
    }
}
