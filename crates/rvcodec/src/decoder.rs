//! Instruction decoder: 32-bit word → mnemonic, operands, and fragments.
//!
//! Dispatch is driven by the opcode, then by the nested sub-field tables in
//! [`crate::isa`]. Every handler resolves a mnemonic name, re-reads its full
//! spec through the shared mnemonic table, extracts the operand fields, and
//! hands off to the shared layout builder — so a decoded instruction is
//! literally re-encoded on the way out, and the result is checked against
//! the input word.

use alloc::format;
use alloc::string::String;

use crate::bits::{bit_slice, parse_imm, to_bin};
use crate::error::CodecError;
use crate::instruction::{Config, Instruction};
use crate::isa::{self, FpEntry, OpImmEntry, Pattern, SystemEntry};
use crate::layout::{self, Operands};

/// Decode a 32-bit instruction word under the given configuration.
///
/// # Errors
///
/// Returns a [`CodecError`] for unrecognized opcodes or sub-fields, invalid
/// fixed bits, reserved fields that are non-zero, and encodings outside the
/// configured base ISA. No partial result escapes on failure.
pub fn decode(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let insn = match opcode(word) {
        isa::OPC_OP | isa::OPC_OP_32 => dec_op(word, config),
        isa::OPC_OP_IMM | isa::OPC_OP_IMM_32 => dec_op_imm(word, config),
        isa::OPC_LOAD | isa::OPC_LOAD_FP => dec_load(word, config),
        isa::OPC_STORE | isa::OPC_STORE_FP => dec_store(word, config),
        isa::OPC_BRANCH => dec_branch(word, config),
        isa::OPC_JALR => dec_jalr(word, config),
        isa::OPC_JAL => dec_jal(word, config),
        isa::OPC_LUI | isa::OPC_AUIPC => dec_upper(word, config),
        isa::OPC_MISC_MEM => dec_misc_mem(word, config),
        isa::OPC_SYSTEM => dec_system(word, config),
        isa::OPC_AMO => dec_amo(word, config),
        isa::OPC_OP_FP => dec_op_fp(word, config),
        isa::OPC_MADD | isa::OPC_MSUB | isa::OPC_NMSUB | isa::OPC_NMADD => dec_r4(word, config),
        other => Err(CodecError::InvalidOpcode { opcode: other }),
    }?;

    // The layout builder re-assembled the word from its pieces; any mismatch
    // with the input means a table or handler bug.
    if insn.bin != to_bin(word) {
        return Err(CodecError::Internal {
            detail: format!("re-encoded word {} differs from input", insn.hex),
        });
    }
    Ok(insn)
}

// ── Field extraction ────────────────────────────────────────────────────

#[inline]
fn opcode(word: u32) -> u32 {
    word & 0x7f
}

#[inline]
fn rd(word: u32) -> u32 {
    (word >> 7) & 0x1f
}

#[inline]
fn funct3(word: u32) -> u32 {
    (word >> 12) & 0x7
}

#[inline]
fn rs1(word: u32) -> u32 {
    (word >> 15) & 0x1f
}

#[inline]
fn rs2(word: u32) -> u32 {
    (word >> 20) & 0x1f
}

#[inline]
fn funct7(word: u32) -> u32 {
    word >> 25
}

#[inline]
fn funct5(word: u32) -> u32 {
    word >> 27
}

#[inline]
fn fp_fmt(word: u32) -> u32 {
    (word >> 25) & 0x3
}

#[inline]
fn funct12(word: u32) -> u32 {
    word >> 20
}

/// I-type immediate: `imm[11:0]`, sign-extended.
fn imm_i(word: u32) -> Result<i64, CodecError> {
    Ok(parse_imm(&bit_slice(word, 31, 12)?, true))
}

/// S-type immediate: `imm[11:5] ‖ imm[4:0]`, sign-extended.
fn imm_s(word: u32) -> Result<i64, CodecError> {
    let text = format!("{}{}", bit_slice(word, 31, 7)?, bit_slice(word, 11, 5)?);
    Ok(parse_imm(&text, true))
}

/// B-type immediate: `imm[12] ‖ imm[11] ‖ imm[10:5] ‖ imm[4:1] ‖ 0`,
/// sign-extended as 13 bits.
fn imm_b(word: u32) -> Result<i64, CodecError> {
    let text = format!(
        "{}{}{}{}0",
        bit_slice(word, 31, 1)?,
        bit_slice(word, 7, 1)?,
        bit_slice(word, 30, 6)?,
        bit_slice(word, 11, 4)?
    );
    Ok(parse_imm(&text, true))
}

/// U-type immediate: the raw 20-bit field value, unsigned.
fn imm_u(word: u32) -> Result<i64, CodecError> {
    Ok(parse_imm(&bit_slice(word, 31, 20)?, false))
}

/// J-type immediate: `imm[20] ‖ imm[19:12] ‖ imm[11] ‖ imm[10:1] ‖ 0`,
/// sign-extended as 21 bits.
fn imm_j(word: u32) -> Result<i64, CodecError> {
    let text = format!(
        "{}{}{}{}0",
        bit_slice(word, 31, 1)?,
        bit_slice(word, 19, 8)?,
        bit_slice(word, 20, 1)?,
        bit_slice(word, 30, 10)?
    );
    Ok(parse_imm(&text, true))
}

// ── Shared plumbing ─────────────────────────────────────────────────────

/// Look up the full spec for a name produced by a dispatch table.
fn spec_of(name: &'static str) -> Result<isa::InstrSpec, CodecError> {
    isa::mnemonic_spec(name).ok_or_else(|| CodecError::Internal {
        detail: format!("dispatch produced unknown mnemonic '{name}'"),
    })
}

fn invalid_funct(detail: String) -> CodecError {
    CodecError::InvalidFunct { detail }
}

fn reserved(field: &'static str, value: u32) -> CodecError {
    CodecError::NonZeroReserved { field, value }
}

/// Resolve the reported ISA tag and enforce the width restriction.
fn finish(
    spec: isa::InstrSpec,
    ops: Operands,
    config: &Config,
    promote64: bool,
) -> Result<Instruction, CodecError> {
    let isa = layout::resolve_isa(&spec, config, promote64)?;
    layout::build(&spec, &ops, isa, config)
}

// ── Per-opcode handlers ─────────────────────────────────────────────────

fn dec_op(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let (f7, f3) = (funct7(word), funct3(word));
    let name = if opcode(word) == isa::OPC_OP {
        isa::op_lookup(f7, f3)
    } else {
        isa::op_32_lookup(f7, f3)
    }
    .ok_or_else(|| invalid_funct(format!("OP funct7=0b{f7:07b} funct3=0b{f3:03b}")))?;
    let ops = Operands {
        rd: rd(word),
        rs1: rs1(word),
        rs2: rs2(word),
        ..Operands::default()
    };
    finish(spec_of(name)?, ops, config, false)
}

fn dec_op_imm(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let f3 = funct3(word);
    let word_sized = opcode(word) == isa::OPC_OP_IMM_32;
    let entry = if word_sized {
        isa::op_imm_32_lookup(f3)
    } else {
        isa::op_imm_lookup(f3)
    }
    .ok_or_else(|| invalid_funct(format!("OP-IMM funct3=0b{f3:03b}")))?;

    let mut ops = Operands {
        rd: rd(word),
        rs1: rs1(word),
        ..Operands::default()
    };
    match entry {
        OpImmEntry::Direct(name) => {
            ops.imm = imm_i(word)?;
            finish(spec_of(name)?, ops, config, false)
        }
        OpImmEntry::ByShtyp(table) => {
            let imm12 = funct12(word);
            let shamt5_set = imm12 & 0x20 != 0;
            let mut promote = false;
            let name = if word_sized {
                // OP-IMM-32 shifts carry a 5-bit shamt; the sixth bit is part
                // of the fixed pattern and must be clear.
                if shamt5_set {
                    return Err(CodecError::ShiftOutOfRange {
                        shamt: imm12 & 0x3f,
                        max: 31,
                    });
                }
                ops.shamt = imm12 & 0x1f;
                find_shtyp(table, imm12 >> 5, 7)?
            } else if config.isa == crate::isa::BaseIsa::Rv64i || shamt5_set {
                if config.isa == crate::isa::BaseIsa::Rv32i {
                    return Err(CodecError::ShiftOutOfRange {
                        shamt: imm12 & 0x3f,
                        max: 31,
                    });
                }
                ops.shamt = imm12 & 0x3f;
                ops.wide_shamt = true;
                promote = shamt5_set;
                find_shtyp_wide(table, imm12 >> 6)?
            } else {
                ops.shamt = imm12 & 0x1f;
                find_shtyp(table, imm12 >> 5, 7)?
            };
            finish(spec_of(name)?, ops, config, promote)
        }
    }
}

fn find_shtyp(table: &[(u32, &'static str)], upper: u32, width: u32) -> Result<&'static str, CodecError> {
    table
        .iter()
        .find(|&&(shtyp, _)| shtyp == upper)
        .map(|&(_, name)| name)
        .ok_or_else(|| CodecError::BadShtyp {
            bits: crate::bits::to_fixed_bin(upper, width),
        })
}

fn find_shtyp_wide(table: &[(u32, &'static str)], upper: u32) -> Result<&'static str, CodecError> {
    table
        .iter()
        .find(|&&(shtyp, _)| shtyp >> 1 == upper)
        .map(|&(_, name)| name)
        .ok_or_else(|| CodecError::BadShtyp {
            bits: crate::bits::to_fixed_bin(upper, 6),
        })
}

fn dec_load(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let f3 = funct3(word);
    let name = if opcode(word) == isa::OPC_LOAD_FP {
        isa::load_fp_lookup(f3)
    } else {
        isa::load_lookup(f3)
    }
    .ok_or_else(|| invalid_funct(format!("LOAD funct3=0b{f3:03b}")))?;
    let ops = Operands {
        rd: rd(word),
        rs1: rs1(word),
        imm: imm_i(word)?,
        ..Operands::default()
    };
    finish(spec_of(name)?, ops, config, false)
}

fn dec_store(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let f3 = funct3(word);
    let name = if opcode(word) == isa::OPC_STORE_FP {
        isa::store_fp_lookup(f3)
    } else {
        isa::store_lookup(f3)
    }
    .ok_or_else(|| invalid_funct(format!("STORE funct3=0b{f3:03b}")))?;
    let ops = Operands {
        rs1: rs1(word),
        rs2: rs2(word),
        imm: imm_s(word)?,
        ..Operands::default()
    };
    finish(spec_of(name)?, ops, config, false)
}

fn dec_branch(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let f3 = funct3(word);
    let name = isa::branch_lookup(f3)
        .ok_or_else(|| invalid_funct(format!("BRANCH funct3=0b{f3:03b}")))?;
    let ops = Operands {
        rs1: rs1(word),
        rs2: rs2(word),
        imm: imm_b(word)?,
        ..Operands::default()
    };
    finish(spec_of(name)?, ops, config, false)
}

fn dec_jalr(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let f3 = funct3(word);
    if f3 != 0 {
        return Err(invalid_funct(format!("JALR funct3=0b{f3:03b}")));
    }
    let ops = Operands {
        rd: rd(word),
        rs1: rs1(word),
        imm: imm_i(word)?,
        ..Operands::default()
    };
    finish(spec_of("jalr")?, ops, config, false)
}

fn dec_jal(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let ops = Operands {
        rd: rd(word),
        imm: imm_j(word)?,
        ..Operands::default()
    };
    finish(spec_of("jal")?, ops, config, false)
}

fn dec_upper(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let name = if opcode(word) == isa::OPC_LUI { "lui" } else { "auipc" };
    let ops = Operands {
        rd: rd(word),
        imm: imm_u(word)?,
        ..Operands::default()
    };
    finish(spec_of(name)?, ops, config, false)
}

fn dec_misc_mem(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let f3 = funct3(word);
    let name = isa::misc_mem_lookup(f3)
        .ok_or_else(|| invalid_funct(format!("MISC-MEM funct3=0b{f3:03b}")))?;
    if rd(word) != 0 {
        return Err(reserved("rd", rd(word)));
    }
    if rs1(word) != 0 {
        return Err(reserved("rs1", rs1(word)));
    }

    if name == "fence" {
        let fm = word >> 28;
        if fm != 0 {
            return Err(invalid_funct(format!("fence fm=0b{fm:04b}")));
        }
        let pred = (word >> 24) & 0xf;
        let succ = (word >> 20) & 0xf;
        if pred == 0 || succ == 0 {
            return Err(CodecError::InvalidFence);
        }
        let ops = Operands {
            pred,
            succ,
            ..Operands::default()
        };
        finish(spec_of("fence")?, ops, config, false)
    } else {
        let f12 = funct12(word);
        if f12 != 0 {
            return Err(invalid_funct(format!("fence.i imm=0x{f12:03x}")));
        }
        finish(spec_of("fence.i")?, Operands::default(), config, false)
    }
}

fn dec_system(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let f3 = funct3(word);
    let entry = isa::system_lookup(f3)
        .ok_or_else(|| invalid_funct(format!("SYSTEM funct3=0b{f3:03b}")))?;
    match entry {
        SystemEntry::ByFunct12(table) => {
            let f12 = funct12(word);
            let name = table
                .iter()
                .find(|&&(key, _)| key == f12)
                .map(|&(_, name)| name)
                .ok_or_else(|| invalid_funct(format!("SYSTEM funct12=0x{f12:03x}")))?;
            if rd(word) != 0 {
                return Err(reserved("rd", rd(word)));
            }
            if rs1(word) != 0 {
                return Err(reserved("rs1", rs1(word)));
            }
            finish(spec_of(name)?, Operands::default(), config, false)
        }
        SystemEntry::Csr(name) => {
            let spec = spec_of(name)?;
            let mut ops = Operands {
                rd: rd(word),
                csr: funct12(word),
                ..Operands::default()
            };
            if matches!(spec.pattern, Pattern::Csr { imm: true }) {
                ops.uimm = rs1(word);
            } else {
                ops.rs1 = rs1(word);
            }
            finish(spec, ops, config, false)
        }
    }
}

fn dec_amo(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let (f5, f3) = (funct5(word), funct3(word));
    let name = isa::amo_lookup(f5, f3)
        .ok_or_else(|| invalid_funct(format!("AMO funct5=0b{f5:05b} funct3=0b{f3:03b}")))?;
    let spec = spec_of(name)?;
    let mut ops = Operands {
        rd: rd(word),
        rs1: rs1(word),
        aq: (word >> 26) & 1 == 1,
        rl: (word >> 25) & 1 == 1,
        ..Operands::default()
    };
    if matches!(spec.pattern, Pattern::Amo { lr: true }) {
        if rs2(word) != 0 {
            return Err(reserved("rs2", rs2(word)));
        }
    } else {
        ops.rs2 = rs2(word);
    }
    finish(spec, ops, config, false)
}

fn dec_op_fp(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let (f5, fmt) = (funct5(word), fp_fmt(word));
    let f3 = funct3(word);
    let entry = isa::op_fp_lookup(f5, fmt)
        .ok_or_else(|| invalid_funct(format!("OP-FP funct5=0b{f5:05b} fmt=0b{fmt:02b}")))?;
    let name = match entry {
        FpEntry::Direct(name) => name,
        FpEntry::ByFunct3(table) => table
            .iter()
            .find(|&&(key, _)| key == f3)
            .map(|&(_, name)| name)
            .ok_or_else(|| {
                invalid_funct(format!("OP-FP funct5=0b{f5:05b} funct3=0b{f3:03b}"))
            })?,
        FpEntry::ByRs2(table) => table
            .iter()
            .find(|&&(key, _)| key == rs2(word))
            .map(|&(_, name)| name)
            .ok_or_else(|| {
                invalid_funct(format!("OP-FP funct5=0b{f5:05b} rs2=0b{:05b}", rs2(word)))
            })?,
    };
    let spec = spec_of(name)?;
    let mut ops = Operands {
        rd: rd(word),
        rs1: rs1(word),
        ..Operands::default()
    };
    match spec.pattern {
        Pattern::FpArith | Pattern::FpSgn | Pattern::FpCmp => {
            ops.rs2 = rs2(word);
        }
        Pattern::FpSqrt | Pattern::FpUnaryX | Pattern::FpUnaryF => {
            if rs2(word) != spec.rs2_fixed {
                return Err(reserved("rs2", rs2(word)));
            }
        }
        // Conversions: rs2 was the dispatch key, already equal to the spec's.
        _ => {}
    }
    if matches!(
        spec.pattern,
        Pattern::FpArith
            | Pattern::FpSqrt
            | Pattern::FpCvtToInt
            | Pattern::FpCvtFromInt
            | Pattern::FpCvtFp
    ) {
        ops.rm = f3;
    }
    finish(spec, ops, config, false)
}

fn dec_r4(word: u32, config: &Config) -> Result<Instruction, CodecError> {
    let fmt = fp_fmt(word);
    let name = isa::r4_lookup(opcode(word), fmt)
        .ok_or_else(|| invalid_funct(format!("R4 fmt=0b{fmt:02b}")))?;
    let ops = Operands {
        rd: rd(word),
        rs1: rs1(word),
        rs2: rs2(word),
        rs3: funct5(word),
        rm: funct3(word),
        ..Operands::default()
    };
    finish(spec_of(name)?, ops, config, false)
}
