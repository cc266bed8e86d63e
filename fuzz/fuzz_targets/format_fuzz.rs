#![no_main]
use framekit::codec::format::{FormatArg, FormatBuffer, PrintFormat};
use framekit::element::Extended;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((raw, pattern)) = data.split_first_chunk::<8>() else {
        return;
    };
    let Ok(pattern) = std::str::from_utf8(pattern) else {
        return;
    };
    let Ok(format) = PrintFormat::parse(pattern) else {
        return;
    };
    let bits = u64::from_le_bytes(*raw);
    let mut buf = FormatBuffer::new();
    for arg in [
        FormatArg::Signed(bits as i64),
        FormatArg::Unsigned(bits),
        FormatArg::Float(f64::from_bits(bits)),
        FormatArg::Extended(Extended::from_f64(f64::from_bits(bits))),
    ] {
        if let Ok(text) = format.render(arg, &mut buf) {
            assert!(text.len() < buf.capacity());
        }
    }
});
