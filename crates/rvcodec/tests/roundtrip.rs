//! Property-based tests using proptest.
//!
//! Verifies the codec invariants across randomly generated input spaces:
//! word→assembly→word and assembly→word→assembly round trips, the fragment
//! partition property, and absence of panics on arbitrary input.

use proptest::prelude::*;
use rvcodec::{decode, encode, Config, Instruction};

// ── Strategies ──────────────────────────────────────────────────────────

/// R-type register-register words (RV32I base + M extension).
fn r_type_word() -> impl Strategy<Value = u32> {
    (0u32..32, 0u32..32, 0u32..32, 0u8..18).prop_map(|(rd, rs1, rs2, op)| {
        let (funct7, funct3) = match op {
            0 => (0b000_0000, 0b000), // add
            1 => (0b010_0000, 0b000), // sub
            2 => (0b000_0000, 0b001), // sll
            3 => (0b000_0000, 0b010), // slt
            4 => (0b000_0000, 0b011), // sltu
            5 => (0b000_0000, 0b100), // xor
            6 => (0b000_0000, 0b101), // srl
            7 => (0b010_0000, 0b101), // sra
            8 => (0b000_0000, 0b110), // or
            9 => (0b000_0000, 0b111), // and
            n => (0b000_0001, u32::from(n) - 10), // M extension
        };
        0b011_0011 | (rd << 7) | (funct3 << 12) | (rs1 << 15) | (rs2 << 20) | (funct7 << 25)
    })
}

/// I-type arithmetic words.
fn i_type_word() -> impl Strategy<Value = u32> {
    (0u32..32, 0u32..32, -2048i32..2048, 0u8..6).prop_map(|(rd, rs1, imm, op)| {
        let funct3 = match op {
            0 => 0b000, // addi
            1 => 0b010, // slti
            2 => 0b011, // sltiu
            3 => 0b100, // xori
            4 => 0b110, // ori
            _ => 0b111, // andi
        };
        0b001_0011 | (rd << 7) | (funct3 << 12) | (rs1 << 15) | (((imm as u32) & 0xfff) << 20)
    })
}

/// Shift-immediate words with a 5-bit shamt.
fn shift_word() -> impl Strategy<Value = u32> {
    (0u32..32, 0u32..32, 0u32..32, 0u8..3).prop_map(|(rd, rs1, shamt, op)| {
        let (funct7, funct3) = match op {
            0 => (0b000_0000, 0b001), // slli
            1 => (0b000_0000, 0b101), // srli
            _ => (0b010_0000, 0b101), // srai
        };
        0b001_0011 | (rd << 7) | (funct3 << 12) | (rs1 << 15) | (shamt << 20) | (funct7 << 25)
    })
}

/// Load and store words.
fn mem_word() -> impl Strategy<Value = u32> {
    (0u32..32, 0u32..32, -2048i32..2048, 0u8..8).prop_map(|(r, rs1, imm, op)| {
        let imm = imm as u32;
        match op {
            // loads: lb lh lw lbu lhu
            0..=4 => {
                let funct3 = [0b000, 0b001, 0b010, 0b100, 0b101][op as usize];
                0b000_0011 | (r << 7) | (funct3 << 12) | (rs1 << 15) | ((imm & 0xfff) << 20)
            }
            // stores: sb sh sw
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

/// Branch words with even, in-range offsets.
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

/// LUI / AUIPC / JAL / JALR words.
fn jump_upper_word() -> impl Strategy<Value = u32> {
    (0u32..32, 0u32..32, 0u32..0x100000, 0u8..4).prop_map(|(rd, rs1, imm20, op)| match op {
        0 => 0b011_0111 | (rd << 7) | (imm20 << 12),
        1 => 0b001_0111 | (rd << 7) | (imm20 << 12),
        2 => {
            // JAL: place an even 21-bit offset
            let imm = imm20 << 1;
            0b110_1111
                | (rd << 7)
                | (((imm >> 12) & 0xff) << 12)
                | (((imm >> 11) & 1) << 20)
                | (((imm >> 1) & 0x3ff) << 21)
                | (((imm >> 20) & 1) << 31)
        }
        _ => 0b110_0111 | (rd << 7) | (rs1 << 15) | ((imm20 & 0xfff) << 20),
    })
}

/// Any word from the valid pools above.
fn valid_word() -> impl Strategy<Value = u32> {
    prop_oneof![
        r_type_word(),
        i_type_word(),
        shift_word(),
        mem_word(),
        branch_word(),
        jump_upper_word(),
    ]
}

/// A pool of valid assembly lines covering every format.
fn valid_asm() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "add x10, x11, x12",
        "sub s0, s1, s2",
        "sltu x1, x2, x3",
        "addi x1, x0, -1",
        "andi t0, t1, 0xff",
        "slli x1, x1, 31",
        "srai x5, x6, 7",
        "lw x5, -4(x2)",
        "lh a0, 0(a1)",
        "sb x1, 127(x2)",
        "sw t0, -128(sp)",
        "beq x0, x0, -4",
        "bne a0, a1, 256",
        "jal ra, 4096",
        "jalr x1, 0(x5)",
        "lui x5, 74565",
        "auipc x1, 1",
        "fence iorw, iorw",
        "fence.i",
        "ecall",
        "ebreak",
        "csrrw x0, mtvec, x5",
        "csrrsi x1, cycle, 7",
        "mul x3, x1, x2",
        "remu x4, x5, x6",
        "lr.w x5, (x0)",
        "sc.w x5, x6, (x7)",
        "amoswap.w.aq x5, x6, (x7)",
        "fadd.s f1, f2, f3, rne",
        "fsqrt.d f1, f2, dyn",
        "fsgnj.s f1, f2, f3",
        "feq.d x1, f2, f3",
        "fclass.s x1, f2",
        "fmv.w.x f1, x5",
        "fcvt.w.s x1, f1, rtz",
        "fcvt.d.s f1, f2, rup",
        "fmadd.s f0, f1, f2, f3, rne",
        "flw f5, 16(x2)",
        "fsd f1, 8(x2)",
        "nop",
        "ret",
        "mv x1, x2",
    ])
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    /// Every valid word survives decode → encode unchanged, with equal
    /// fragments.
    #[test]
    fn word_round_trip(word in valid_word()) {
        let config = Config::default();
        let insn = decode(word, &config).unwrap();
        let back = encode(&insn.asm, &config).unwrap();
        prop_assert_eq!(&back.hex, &insn.hex);
        prop_assert_eq!(u32::from_str_radix(&back.hex, 16).unwrap(), word);
        prop_assert_eq!(&back.bin_frags, &insn.bin_frags);
        prop_assert_eq!(&back.asm_frags, &insn.asm_frags);
    }

    /// Every accepted assembly line survives encode → decode up to the
    /// canonical rendering.
    #[test]
    fn asm_round_trip(line in valid_asm()) {
        let config = Config::default();
        let insn = encode(line, &config).unwrap();
        let word = u32::from_str_radix(&insn.hex, 16).unwrap();
        let back = decode(word, &config).unwrap();
        prop_assert_eq!(&back.asm, &insn.asm);
        prop_assert_eq!(&back.hex, &insn.hex);
    }

    /// binFrags always partition the 32-bit word, MSB→LSB.
    #[test]
    fn fragments_partition_word(word in valid_word()) {
        let insn = decode(word, &Config::default()).unwrap();
        let joined: String = insn.bin_frags.iter().map(|f| f.bits.as_str()).collect();
        prop_assert_eq!(&joined, &insn.bin);
        let mut next = 32u32;
        for frag in &insn.bin_frags {
            let width = frag.bits.len() as u32;
            prop_assert_eq!(u32::from(frag.index), next - width);
            next -= width;
        }
        prop_assert_eq!(next, 0);
    }

    /// Flipping any single bit of a valid word either fails to decode or
    /// decodes to different assembly; it never panics and never aliases.
    #[test]
    fn single_bit_flip_never_aliases(word in valid_word(), bit in 0u32..32) {
        let config = Config::default();
        let original = decode(word, &config).unwrap();
        let flipped = word ^ (1 << bit);
        if let Ok(other) = decode(flipped, &config) {
            prop_assert_ne!(other.asm, original.asm);
        }
    }

    /// Arbitrary words never panic, and every successful decode re-encodes
    /// to the same word.
    #[test]
    fn arbitrary_words_never_panic(word in any::<u32>()) {
        for config in [Config::default(), Config::rv64()] {
            if let Ok(insn) = decode(word, &config) {
                let back = encode(&insn.asm, &config).unwrap();
                prop_assert_eq!(u32::from_str_radix(&back.hex, 16).unwrap(), word);
            }
        }
    }

    /// Arbitrary text never panics the façade.
    #[test]
    fn arbitrary_text_never_panics(input in "\\PC{0,40}") {
        let _ = Instruction::parse(&input, &Config::default());
        let _ = Instruction::parse(&input, &Config::rv64());
    }
}
