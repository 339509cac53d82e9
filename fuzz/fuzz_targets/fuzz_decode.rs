#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);

    for config in [rvcodec::Config::default(), rvcodec::Config::rv64()] {
        if let Ok(insn) = rvcodec::decode(word, &config) {
            // Every decodable word must re-encode to itself.
            let back = rvcodec::encode(&insn.asm, &config).unwrap();
            assert_eq!(back.hex, insn.hex);

            // Fragments must partition the word.
            let joined: String = insn.bin_frags.iter().map(|f| f.bits.as_str()).collect();
            assert_eq!(joined, insn.bin);
        }
    }
});
