//! Cross-validation tests: decode with rvcodec, decode with rrs-lib.
//!
//! Every RV32IM word generated below is decoded by both this crate and the
//! independent rrs-lib disassembler, and the resolved mnemonics must agree.
//! Operand rendering is deliberately not compared — the two crates format
//! operands differently — but the mnemonic pins down the dispatch tables
//! (opcode, funct3, funct7), which is where the decoders could drift.

use proptest::prelude::*;
use rrs_lib::instruction_string_outputter::InstructionStringOutputter;
use rrs_lib::process_instruction;
use rvcodec::{decode, Config};

/// First whitespace-delimited token of an assembly rendering.
fn mnemonic(asm: &str) -> &str {
    asm.split_whitespace().next().unwrap_or("")
}

/// Decode with rrs-lib; `None` when rrs-lib rejects the word.
fn rrs_decode(word: u32) -> Option<String> {
    let mut outputter = InstructionStringOutputter { insn_pc: 0 };
    process_instruction(&mut outputter, word)
}

fn check_agreement(word: u32) -> Result<(), TestCaseError> {
    let ours = decode(word, &Config::default());
    let theirs = rrs_decode(word);
    if let Some(theirs) = theirs {
        let ours = ours.unwrap_or_else(|e| panic!("rrs-lib accepts {word:#010x} but we reject: {e}"));
        prop_assert_eq!(
            mnemonic(&ours.asm),
            mnemonic(&theirs),
            "mnemonic disagreement for {:#010x}",
            word
        );
    }
    Ok(())
}

// ── Word strategies (RV32IM space shared with rrs-lib) ──────────────────

fn r_type_word() -> impl Strategy<Value = u32> {
    (0u32..32, 0u32..32, 0u32..32, 0u8..18).prop_map(|(rd, rs1, rs2, op)| {
        let (funct7, funct3) = match op {
            0 => (0b000_0000, 0b000),
            1 => (0b010_0000, 0b000),
            2 => (0b000_0000, 0b001),
            3 => (0b000_0000, 0b010),
            4 => (0b000_0000, 0b011),
            5 => (0b000_0000, 0b100),
            6 => (0b000_0000, 0b101),
            7 => (0b010_0000, 0b101),
            8 => (0b000_0000, 0b110),
            9 => (0b000_0000, 0b111),
            n => (0b000_0001, u32::from(n) - 10),
        };
        0b011_0011 | (rd << 7) | (funct3 << 12) | (rs1 << 15) | (rs2 << 20) | (funct7 << 25)
    })
}

fn i_type_word() -> impl Strategy<Value = u32> {
    (0u32..32, 0u32..32, -2048i32..2048, 0u8..6).prop_map(|(rd, rs1, imm, op)| {
        let funct3 = [0b000, 0b010, 0b011, 0b100, 0b110, 0b111][op as usize];
        0b001_0011 | (rd << 7) | (funct3 << 12) | (rs1 << 15) | (((imm as u32) & 0xfff) << 20)
    })
}

fn mem_word() -> impl Strategy<Value = u32> {
    (0u32..32, 0u32..32, -2048i32..2048, 0u8..8).prop_map(|(r, rs1, imm, op)| {
        let imm = imm as u32;
        match op {
            0..=4 => {
                let funct3 = [0b000, 0b001, 0b010, 0b100, 0b101][op as usize];
                0b000_0011 | (r << 7) | (funct3 << 12) | (rs1 << 15) | ((imm & 0xfff) << 20)
            }
            _ => {
                let funct3 = [0b000, 0b001, 0b010][(op - 5) as usize];
                0b010_0011
                    | ((imm & 0x1f) << 7)
                    | (funct3 << 12)
                    | (rs1 << 15)
                    | (r << 20)
                    | (((imm >> 5) & 0x7f) << 25)
            }
        }
    })
}

fn branch_word() -> impl Strategy<Value = u32> {
    (0u32..32, 0u32..32, -2048i32..2048, 0u8..6).prop_map(|(rs1, rs2, half, op)| {
        let funct3 = [0b000, 0b001, 0b100, 0b101, 0b110, 0b111][op as usize];
        let imm = (half * 2) as u32;
        0b110_0011
            | (((imm >> 11) & 1) << 7)
            | (((imm >> 1) & 0xf) << 8)
            | (funct3 << 12)
            | (rs1 << 15)
            | (rs2 << 20)
            | (((imm >> 5) & 0x3f) << 25)
            | (((imm >> 12) & 1) << 31)
    })
}

// ── Tests ───────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn r_type_mnemonics_agree(word in r_type_word()) {
        check_agreement(word)?;
    }

    #[test]
    fn i_type_mnemonics_agree(word in i_type_word()) {
        check_agreement(word)?;
    }

    #[test]
    fn mem_mnemonics_agree(word in mem_word()) {
        check_agreement(word)?;
    }

    #[test]
    fn branch_mnemonics_agree(word in branch_word()) {
        check_agreement(word)?;
    }
}

#[test]
fn fixed_words_agree() {
    let words = [
        0x00c58533, // add x10, x11, x12
        0x02a00093, // addi x1, x0, 42
        0xfff00093, // addi x1, x0, -1
        0xffc12283, // lw x5, -4(x2)
        0x0062a623, // sw x6, 12(x5)
        0xfe000ee3, // beq x0, x0, -4
        0x0000006f, // jal x0, 0
        0x123452b7, // lui x5, 0x12345
        0x022081b3, // mul x3, x1, x2
    ];
    for word in words {
        check_agreement(word).unwrap();
    }
}
