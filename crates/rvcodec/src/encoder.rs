//! Assembly encoder: one instruction line → 32-bit word and fragments.
//!
//! The line is split into a mnemonic and comma-separated operand tokens,
//! the mnemonic resolved through the shared table, and each operand parsed
//! under the format's syntax and range rules. The resolved values feed the
//! same layout builder the decoder uses, which also proves the placed fields
//! cover all 32 bits exactly once.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::bits::{emit_imm, parse_int};
use crate::error::CodecError;
use crate::instruction::{Config, Instruction};
use crate::isa::{fence_set_mask, mnemonic_spec, rm_by_name, BaseIsa, InstrSpec, Pattern};
use crate::layout::{self, Operands};
use crate::reg::{parse_freg, parse_xreg};

/// Encode one assembly instruction under the given configuration.
///
/// Mnemonics, register names, CSR names, and rounding modes are matched
/// case-insensitively. The only accepted pseudo-instructions are `nop`, `j`,
/// `jr`, `ret`, `mv`, `not`, and `neg`; they encode as their base
/// instruction.
///
/// # Errors
///
/// Returns a [`CodecError`] for unknown mnemonics, malformed operand lists,
/// out-of-range immediates, bad register or CSR names, and encodings outside
/// the configured base ISA.
pub fn encode(source: &str, config: &Config) -> Result<Instruction, CodecError> {
    let line = source.trim().to_ascii_lowercase();
    if line.is_empty() {
        return Err(CodecError::MalformedInput {
            detail: String::from("empty assembly line"),
        });
    }
    let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
        Some((m, r)) => (m, r),
        None => (line.as_str(), ""),
    };
    let operands = split_operands(rest)?;

    if let Some((name, expanded)) = expand_alias(mnemonic, &operands)? {
        let spec = lookup(name)?;
        return encode_spec(&spec, &expanded, false, false, config);
    }

    if let Some(spec) = mnemonic_spec(mnemonic) {
        return encode_spec(&spec, &operands, false, false, config);
    }

    // AMO ordering suffixes: `.aq`, `.rl`, `.aqrl` on the atomic mnemonics.
    if let Some((base, aq, rl)) = strip_amo_suffix(mnemonic) {
        if let Some(spec) = mnemonic_spec(base) {
            if matches!(spec.pattern, Pattern::Amo { .. }) {
                return encode_spec(&spec, &operands, aq, rl, config);
            }
        }
    }

    Err(CodecError::UnknownMnemonic {
        mnemonic: mnemonic.to_string(),
    })
}

/// Split the operand list on commas, dropping interior whitespace.
fn split_operands(rest: &str) -> Result<Vec<String>, CodecError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    rest.split(',')
        .map(|part| {
            let token: String = part.chars().filter(|c| !c.is_whitespace()).collect();
            if token.is_empty() {
                Err(CodecError::OperandSyntax {
                    detail: String::from("empty operand"),
                })
            } else {
                Ok(token)
            }
        })
        .collect()
}

/// The fixed alias set. Returns the base mnemonic and rewritten operand
/// list, or `None` when the mnemonic is not an alias.
fn expand_alias(
    mnemonic: &str,
    ops: &[String],
) -> Result<Option<(&'static str, Vec<String>)>, CodecError> {
    let arity = |n: usize, usage: &str| {
        if ops.len() == n {
            Ok(())
        } else {
            Err(CodecError::OperandSyntax {
                detail: format!("expected {usage}"),
            })
        }
    };
    let own = |tok: &String| tok.clone();
    Ok(Some(match mnemonic {
        "nop" => {
            arity(0, "no operands")?;
            ("addi", alloc::vec!["x0".into(), "x0".into(), "0".into()])
        }
        "j" => {
            arity(1, "offset")?;
            ("jal", alloc::vec!["x0".into(), own(&ops[0])])
        }
        "jr" => {
            arity(1, "rs")?;
            ("jalr", alloc::vec!["x0".into(), own(&ops[0]), "0".into()])
        }
        "ret" => {
            arity(0, "no operands")?;
            ("jalr", alloc::vec!["x0".into(), "x1".into(), "0".into()])
        }
        "mv" => {
            arity(2, "rd, rs")?;
            ("addi", alloc::vec![own(&ops[0]), own(&ops[1]), "0".into()])
        }
        "not" => {
            arity(2, "rd, rs")?;
            ("xori", alloc::vec![own(&ops[0]), own(&ops[1]), "-1".into()])
        }
        "neg" => {
            arity(2, "rd, rs")?;
            ("sub", alloc::vec![own(&ops[0]), "x0".into(), own(&ops[1])])
        }
        _ => return Ok(None),
    }))
}

fn strip_amo_suffix(mnemonic: &str) -> Option<(&str, bool, bool)> {
    if let Some(base) = mnemonic.strip_suffix(".aqrl") {
        return Some((base, true, true));
    }
    if let Some(base) = mnemonic.strip_suffix(".aq") {
        return Some((base, true, false));
    }
    if let Some(base) = mnemonic.strip_suffix(".rl") {
        return Some((base, false, true));
    }
    None
}

fn lookup(name: &str) -> Result<InstrSpec, CodecError> {
    mnemonic_spec(name).ok_or_else(|| CodecError::Internal {
        detail: format!("alias expanded to unknown mnemonic '{name}'"),
    })
}

// ── Operand parsing helpers ─────────────────────────────────────────────

fn xreg_tok(token: &str) -> Result<u32, CodecError> {
    parse_xreg(token).ok_or_else(|| CodecError::BadRegister {
        name: token.to_string(),
    })
}

fn freg_tok(token: &str) -> Result<u32, CodecError> {
    parse_freg(token).ok_or_else(|| CodecError::BadRegister {
        name: token.to_string(),
    })
}

fn reg_tok(token: &str, float: bool) -> Result<u32, CodecError> {
    if float {
        freg_tok(token)
    } else {
        xreg_tok(token)
    }
}

fn int_tok(token: &str) -> Result<i64, CodecError> {
    parse_int(token).ok_or_else(|| CodecError::OperandSyntax {
        detail: format!("expected integer literal, found '{token}'"),
    })
}

/// Range-check `value` against a `width`-bit field.
fn check_range(value: i64, width: u32, signed: bool) -> Result<(), CodecError> {
    emit_imm(value, width, signed).map(|_| ())
}

fn rm_tok(token: &str) -> Result<u32, CodecError> {
    rm_by_name(token).ok_or_else(|| CodecError::OperandSyntax {
        detail: format!("expected rounding mode, found '{token}'"),
    })
}

/// Split a memory operand `imm(reg)`; an absent offset reads as zero.
fn mem_tok(token: &str) -> Result<(i64, &str), CodecError> {
    let bad = || CodecError::OperandSyntax {
        detail: format!("expected offset(base), found '{token}'"),
    };
    let open = token.find('(').ok_or_else(bad)?;
    let close = token.rfind(')').ok_or_else(bad)?;
    if close != token.len() - 1 || close <= open {
        return Err(bad());
    }
    let offset = &token[..open];
    let base = &token[open + 1..close];
    let imm = if offset.is_empty() { 0 } else { int_tok(offset)? };
    Ok((imm, base))
}

fn expect(ops: &[String], n: usize, usage: &str) -> Result<(), CodecError> {
    if ops.len() == n {
        Ok(())
    } else {
        Err(CodecError::OperandSyntax {
            detail: format!("expected {usage}"),
        })
    }
}

/// Branch and jump offsets address 16-bit parcels: bit 0 has no encoding.
fn even_offset(value: i64) -> Result<(), CodecError> {
    if value % 2 != 0 {
        Err(CodecError::OperandSyntax {
            detail: format!("offset {value} must be even"),
        })
    } else {
        Ok(())
    }
}

// ── Per-format encoding ─────────────────────────────────────────────────

fn encode_spec(
    spec: &InstrSpec,
    tokens: &[String],
    aq: bool,
    rl: bool,
    config: &Config,
) -> Result<Instruction, CodecError> {
    // Reject RV64-only mnemonics before looking at operands.
    if spec.rv64_only && config.isa == BaseIsa::Rv32i {
        return Err(CodecError::IsaMismatch {
            needs: "RV64I",
            have: config.isa.name(),
        });
    }

    let mut ops = Operands {
        aq,
        rl,
        ..Operands::default()
    };
    let mut promote = false;

    match spec.pattern {
        Pattern::Reg3 => {
            expect(tokens, 3, "rd, rs1, rs2")?;
            ops.rd = xreg_tok(&tokens[0])?;
            ops.rs1 = xreg_tok(&tokens[1])?;
            ops.rs2 = xreg_tok(&tokens[2])?;
        }

        Pattern::RegImm => {
            expect(tokens, 3, "rd, rs1, imm")?;
            ops.rd = xreg_tok(&tokens[0])?;
            ops.rs1 = xreg_tok(&tokens[1])?;
            ops.imm = int_tok(&tokens[2])?;
            check_range(ops.imm, 12, true)?;
        }

        Pattern::Shift | Pattern::ShiftW => {
            expect(tokens, 3, "rd, rs1, shamt")?;
            ops.rd = xreg_tok(&tokens[0])?;
            ops.rs1 = xreg_tok(&tokens[1])?;
            let shamt = int_tok(&tokens[2])?;
            check_range(shamt, 6, false).map_err(|_| CodecError::ShiftOutOfRange {
                shamt: shamt.clamp(0, 63) as u32,
                max: if spec.pattern == Pattern::ShiftW || config.isa == BaseIsa::Rv32i {
                    31
                } else {
                    63
                },
            })?;
            let shamt = shamt as u32;
            if spec.pattern == Pattern::ShiftW {
                if shamt > 31 {
                    return Err(CodecError::ShiftOutOfRange { shamt, max: 31 });
                }
                ops.shamt = shamt;
            } else {
                if shamt > 31 && config.isa == BaseIsa::Rv32i {
                    return Err(CodecError::ShiftOutOfRange { shamt, max: 31 });
                }
                // Mirror the decoder: RV64I always reads the 6-bit variant.
                ops.wide_shamt = config.isa == BaseIsa::Rv64i || shamt > 31;
                ops.shamt = shamt;
                promote = shamt > 31;
            }
        }

        Pattern::Load { float } => {
            expect(tokens, 2, "rd, offset(rs1)")?;
            ops.rd = reg_tok(&tokens[0], float)?;
            let (imm, base) = mem_tok(&tokens[1])?;
            ops.imm = imm;
            ops.rs1 = xreg_tok(base)?;
            check_range(ops.imm, 12, true)?;
        }

        Pattern::Jalr => {
            // Accepts both `rd, offset(rs1)` and the plain `rd, rs1, imm`.
            if tokens.len() == 3 {
                ops.rd = xreg_tok(&tokens[0])?;
                ops.rs1 = xreg_tok(&tokens[1])?;
                ops.imm = int_tok(&tokens[2])?;
            } else {
                expect(tokens, 2, "rd, offset(rs1)")?;
                ops.rd = xreg_tok(&tokens[0])?;
                let (imm, base) = mem_tok(&tokens[1])?;
                ops.imm = imm;
                ops.rs1 = xreg_tok(base)?;
            }
            check_range(ops.imm, 12, true)?;
        }

        Pattern::Store { float } => {
            expect(tokens, 2, "rs2, offset(rs1)")?;
            ops.rs2 = reg_tok(&tokens[0], float)?;
            let (imm, base) = mem_tok(&tokens[1])?;
            ops.imm = imm;
            ops.rs1 = xreg_tok(base)?;
            check_range(ops.imm, 12, true)?;
        }

        Pattern::Branch => {
            expect(tokens, 3, "rs1, rs2, offset")?;
            ops.rs1 = xreg_tok(&tokens[0])?;
            ops.rs2 = xreg_tok(&tokens[1])?;
            ops.imm = int_tok(&tokens[2])?;
            even_offset(ops.imm)?;
            check_range(ops.imm, 13, true)?;
        }

        Pattern::Upper => {
            expect(tokens, 2, "rd, imm")?;
            ops.rd = xreg_tok(&tokens[0])?;
            ops.imm = int_tok(&tokens[1])?;
            check_range(ops.imm, 20, false)?;
        }

        Pattern::Jump => {
            expect(tokens, 2, "rd, offset")?;
            ops.rd = xreg_tok(&tokens[0])?;
            ops.imm = int_tok(&tokens[1])?;
            even_offset(ops.imm)?;
            check_range(ops.imm, 21, true)?;
        }

        Pattern::Fence => {
            expect(tokens, 2, "pred, succ")?;
            ops.pred = fence_tok(&tokens[0])?;
            ops.succ = fence_tok(&tokens[1])?;
        }

        Pattern::FenceI | Pattern::Trap => {
            expect(tokens, 0, "no operands")?;
        }

        Pattern::Csr { imm } => {
            expect(tokens, 3, if imm { "rd, csr, uimm" } else { "rd, csr, rs1" })?;
            ops.rd = xreg_tok(&tokens[0])?;
            ops.csr = csr_tok(&tokens[1])?;
            if imm {
                let value = int_tok(&tokens[2])?;
                check_range(value, 5, false)?;
                ops.uimm = value as u32;
            } else {
                ops.rs1 = xreg_tok(&tokens[2])?;
            }
        }

        Pattern::Amo { lr } => {
            if lr {
                expect(tokens, 2, "rd, (rs1)")?;
                ops.rd = xreg_tok(&tokens[0])?;
                ops.rs1 = amo_addr_tok(&tokens[1])?;
            } else {
                expect(tokens, 3, "rd, rs2, (rs1)")?;
                ops.rd = xreg_tok(&tokens[0])?;
                ops.rs2 = xreg_tok(&tokens[1])?;
                ops.rs1 = amo_addr_tok(&tokens[2])?;
            }
        }

        Pattern::FpR4 => {
            expect(tokens, 5, "rd, rs1, rs2, rs3, rm")?;
            ops.rd = freg_tok(&tokens[0])?;
            ops.rs1 = freg_tok(&tokens[1])?;
            ops.rs2 = freg_tok(&tokens[2])?;
            ops.rs3 = freg_tok(&tokens[3])?;
            ops.rm = rm_tok(&tokens[4])?;
        }

        Pattern::FpArith => {
            expect(tokens, 4, "rd, rs1, rs2, rm")?;
            ops.rd = freg_tok(&tokens[0])?;
            ops.rs1 = freg_tok(&tokens[1])?;
            ops.rs2 = freg_tok(&tokens[2])?;
            ops.rm = rm_tok(&tokens[3])?;
        }

        Pattern::FpSqrt | Pattern::FpCvtToInt | Pattern::FpCvtFromInt | Pattern::FpCvtFp => {
            expect(tokens, 3, "rd, rs1, rm")?;
            ops.rd = reg_tok(&tokens[0], spec.pattern.rd_float())?;
            ops.rs1 = reg_tok(&tokens[1], spec.pattern.rs1_float())?;
            ops.rm = rm_tok(&tokens[2])?;
        }

        Pattern::FpSgn | Pattern::FpCmp => {
            expect(tokens, 3, "rd, rs1, rs2")?;
            ops.rd = reg_tok(&tokens[0], spec.pattern.rd_float())?;
            ops.rs1 = freg_tok(&tokens[1])?;
            ops.rs2 = freg_tok(&tokens[2])?;
        }

        Pattern::FpUnaryX | Pattern::FpUnaryF => {
            expect(tokens, 2, "rd, rs1")?;
            ops.rd = reg_tok(&tokens[0], spec.pattern.rd_float())?;
            ops.rs1 = reg_tok(&tokens[1], spec.pattern.rs1_float())?;
        }
    }

    let isa = layout::resolve_isa(spec, config, promote)?;
    layout::build(spec, &ops, isa, config)
}

fn fence_tok(token: &str) -> Result<u32, CodecError> {
    fence_set_mask(token).ok_or_else(|| CodecError::OperandSyntax {
        detail: format!("expected fence set (subset of 'iorw'), found '{token}'"),
    })
}

fn csr_tok(token: &str) -> Result<u32, CodecError> {
    if let Some(addr) = crate::csr::csr_by_name(token) {
        return Ok(addr);
    }
    if let Some(value) = parse_int(token) {
        if (0..=0xfff).contains(&value) {
            return Ok(value as u32);
        }
    }
    Err(CodecError::BadCsr {
        name: token.to_string(),
    })
}

/// Atomic address operand: `(rs1)` or a zero-offset `0(rs1)`; a bare
/// register is also accepted.
fn amo_addr_tok(token: &str) -> Result<u32, CodecError> {
    if token.contains('(') {
        let (imm, base) = mem_tok(token)?;
        if imm != 0 {
            return Err(CodecError::OperandSyntax {
                detail: format!("atomic address must have zero offset, found {imm}"),
            });
        }
        xreg_tok(base)
    } else {
        xreg_tok(token)
    }
}
