#![no_main]
use framekit::dispatch::{Dumper, Reshaper};
use framekit::element::{ElementKind, Encoding, TypeTag};
use framekit::transform::{BlockGeometry, DumpOptions, IndexWindow, ReshapeOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let tag = if data[1] & 1 == 0 {
        TypeTag::binary(ElementKind::ALL[data[0] as usize % ElementKind::ALL.len()])
    } else {
        TypeTag::ASCII_EXTENDED
    };
    let kind = tag.kind();
    let geometry = BlockGeometry {
        input_length: data[2] as usize % 16,
        input_start: data[3] as usize % 16,
        input_end: data[4] as usize % 16,
        output_start: data[5] as usize % 8,
        output_length: data[2].wrapping_add(data[5]) as usize % 32,
    };
    let input = &data[6..];

    let reshaper = Reshaper::new(
        &tag.to_string(),
        &ReshapeOptions {
            geometry,
            pad_value: -1.0,
        },
    );
    let mut output = Vec::new();
    if reshaper.run(input, &mut output) && tag.encoding() == Encoding::Binary {
        let copy = geometry.input_end - geometry.input_start + 1;
        let blocks = input.len() / (geometry.input_length * kind.width());
        assert!(copy <= geometry.output_length);
        assert_eq!(output.len(), blocks * geometry.output_length * kind.width());
    }

    let dumper = Dumper::new(
        &tag.to_string(),
        &DumpOptions {
            format: None,
            window: IndexWindow::bounded(0, i64::from(data[3])),
        },
    );
    let mut text = Vec::new();
    let _ = dumper.run(input, &mut text);
});
