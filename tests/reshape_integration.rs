use framekit::dispatch::Reshaper;
use framekit::element::{ElementKind, TypeTag};
use framekit::transform::{BlockGeometry, ReshapeOptions};

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

fn options(geometry: BlockGeometry, pad_value: f64) -> ReshapeOptions {
    ReshapeOptions {
        geometry,
        pad_value,
    }
}

fn reshape(tag: &str, options: &ReshapeOptions, input: &[u8]) -> Vec<u8> {
    let reshaper = Reshaper::new(tag, options);
    assert!(reshaper.is_valid(), "tag {tag}: {:?}", reshaper.config_error());
    let mut output = Vec::new();
    reshaper.try_run(input, &mut output).unwrap();
    output
}

#[test]
fn identity_is_byte_exact_for_every_binary_kind() {
    for kind in ElementKind::ALL {
        let tag = TypeTag::binary(kind).to_string();
        let block = 7;
        let input = gen_data(block * kind.width() * 5, kind.width() as u64);
        let output = reshape(&tag, &options(BlockGeometry::identity(block), 0.0), &input);
        assert_eq!(output, input, "kind {kind}");
    }
}

#[test]
fn identity_drops_partial_trailing_block() {
    let width = ElementKind::I24.width();
    let mut input = gen_data(4 * width * 3, 99);
    let whole = input.clone();
    input.extend_from_slice(&gen_data(2 * width, 5));

    let output = reshape("h", &options(BlockGeometry::identity(4), 0.0), &input);
    assert_eq!(output, whole);
}

#[test]
fn ascii_identity_reproduces_canonical_text() {
    let text = "1 -2.5 0.125\n3 4 0.0625\n";
    let output = reshape("a", &options(BlockGeometry::identity(3), 0.0), text.as_bytes());
    assert_eq!(String::from_utf8(output).unwrap(), text);
}

#[test]
fn ascii_identity_keeps_extended_precision() {
    let text = "12345.67890123456789\n-1.0000000000000000001\n";
    let output = reshape("a", &options(BlockGeometry::identity(1), 0.0), text.as_bytes());
    assert_eq!(String::from_utf8(output).unwrap(), text);
}

#[test]
fn ascii_regroups_tokens_into_lines() {
    let geometry = BlockGeometry {
        input_length: 2,
        input_start: 1,
        input_end: 1,
        output_start: 2,
        output_length: 4,
    };
    let output = reshape("a", &options(geometry, -1.0), b"1 2 3\n4\n5");
    assert_eq!(String::from_utf8(output).unwrap(), "-1 -1 2 -1\n-1 -1 4 -1\n");
}

#[test]
fn analysis_frame_into_wider_frame() {
    // 24-element frames carried into 32-element frames, padded on the right.
    let geometry = BlockGeometry {
        input_length: 24,
        input_start: 0,
        input_end: 23,
        output_start: 0,
        output_length: 32,
    };
    let frames: Vec<f64> = (0..48).map(f64::from).collect();
    let input: Vec<u8> = frames.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let output = reshape("d", &options(geometry, 0.0), &input);

    let values: Vec<f64> = output
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
        .collect();
    assert_eq!(values.len(), 64);
    assert_eq!(&values[..24], &frames[..24]);
    assert!(values[24..32].iter().all(|&v| v == 0.0));
    assert_eq!(&values[32..56], &frames[24..]);
    assert!(values[56..].iter().all(|&v| v == 0.0));
}

#[test]
fn reorder_two_halves() {
    // Two windows of the same block placed at different output offsets.
    let input: Vec<u8> = (1u8..=8).collect();
    let first = BlockGeometry {
        input_length: 4,
        input_start: 0,
        input_end: 1,
        output_start: 2,
        output_length: 4,
    };
    let second = BlockGeometry {
        input_start: 2,
        input_end: 3,
        output_start: 0,
        ..first
    };
    assert_eq!(
        reshape("C", &options(first, 0.0), &input),
        [0, 0, 1, 2, 0, 0, 5, 6]
    );
    assert_eq!(
        reshape("C", &options(second, 0.0), &input),
        [3, 4, 0, 0, 7, 8, 0, 0]
    );
}

#[test]
fn truncated_element_fails_after_whole_blocks() {
    let reshaper = Reshaper::new("I", &options(BlockGeometry::identity(1), 0.0));
    let mut output = Vec::new();
    assert!(!reshaper.run(&[1u8, 2, 3, 4, 5, 6][..], &mut output));
    assert_eq!(output, [1, 2, 3, 4]);
}

#[test]
fn malformed_ascii_token_fails() {
    let reshaper = Reshaper::new("a", &options(BlockGeometry::identity(2), 0.0));
    let mut output = Vec::new();
    assert!(!reshaper.run(&b"1 2\n3 nope\n"[..], &mut output));
    assert_eq!(output, b"1 2\n");
}
