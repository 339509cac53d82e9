#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    for config in [rvcodec::Config::default(), rvcodec::Config::rv64()] {
        // The façade must never panic on arbitrary text.
        let _ = rvcodec::Instruction::parse(data, &config);

        if let Ok(insn) = rvcodec::encode(data, &config) {
            // Whatever encodes must decode back to the canonical rendering.
            let word = u32::from_str_radix(&insn.hex, 16).unwrap();
            let back = rvcodec::decode(word, &config).unwrap();
            assert_eq!(back.asm, insn.asm);
        }
    }
});
