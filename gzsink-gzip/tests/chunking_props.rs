//! However the input is split into writes, the stream decodes to the
//! concatenation and the trailer matches a reference CRC.

mod common;

use common::{RecordingChild, gunzip};
use gzsink_gzip::framer::FrameFooter;
use gzsink_gzip::{GzipSink, GzipSinkConfig};
use proptest::prelude::*;

fn compress_in_chunks(input: &[u8], cuts: &[usize], level: u8, capacity: usize) -> Vec<u8> {
    let child = RecordingChild::new();
    let config = GzipSinkConfig::default()
        .level(level)
        .buffer_capacity(capacity)
        .low_water_mark(capacity / 8);
    let mut sink = GzipSink::open(child.clone(), config).unwrap();

    let mut start = 0;
    for &cut in cuts {
        let end = cut.min(input.len()).max(start);
        assert_eq!(sink.write(&input[start..end]), (end - start) as i64);
        start = end;
    }
    assert_eq!(sink.write(&input[start..]), (input.len() - start) as i64);
    sink.finish().unwrap();
    child.bytes()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_any_chunking_roundtrips(
        input in proptest::collection::vec(any::<u8>(), 0..20_000),
        mut cuts in proptest::collection::vec(0usize..20_000, 0..16),
        level in 0u8..=9,
        capacity in 64usize..4096,
    ) {
        cuts.sort_unstable();
        let gz = compress_in_chunks(&input, &cuts, level, capacity);

        prop_assert_eq!(gunzip(&gz), input.clone());
        let footer = FrameFooter::parse_tail(&gz).unwrap();
        prop_assert_eq!(footer.crc, crc32fast::hash(&input));
        prop_assert_eq!(footer.isize, input.len() as u32);
    }

    #[test]
    fn prop_repetitive_input_shrinks(
        unit in proptest::collection::vec(any::<u8>(), 1..32),
        repeats in 200usize..2000,
    ) {
        let input: Vec<u8> = unit.iter().copied().cycle().take(unit.len() * repeats).collect();
        let gz = compress_in_chunks(&input, &[], 6, 1024);
        prop_assert!(gz.len() < input.len());
    }
}
