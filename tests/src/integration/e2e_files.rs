//! # File-level Scenarios
//!
//! Quadrant-granular writes and reads through the public API, cache
//! eviction observed through the service's obtain counter, and a model
//! check of arbitrary byte-range traffic.

#[cfg(test)]
mod tests {
    use crate::fixtures::{driver_with_capacity, patterned_quadrant, quiet_tracing};
    use proptest::prelude::*;
    use sg_driver::{DriverError, ScatterGatherApi, BLOCK_SIZE, QUADRANT_SIZE};

    #[test]
    fn test_quadrant_roundtrip_and_append() {
        quiet_tracing();
        let mut driver = driver_with_capacity(16, 100);
        let fh = driver.open("scenario.dat").unwrap();

        let first = patterned_quadrant(1);
        driver.write(fh, &first).unwrap();
        driver.seek(fh, 0).unwrap();
        let mut buf = [0u8; QUADRANT_SIZE];
        driver.read(fh, &mut buf).unwrap();
        assert_eq!(buf, first);

        // Cursor sits at the end of quadrant 0; append lands in quadrant 1
        let second = patterned_quadrant(2);
        driver.write(fh, &second).unwrap();
        assert_eq!(driver.transport().counters().create, 1);
        assert_eq!(driver.transport().counters().update, 1);

        driver.seek(fh, 0).unwrap();
        let mut both = [0u8; 2 * QUADRANT_SIZE];
        assert_eq!(driver.read(fh, &mut both).unwrap(), 2 * QUADRANT_SIZE);
        assert_eq!(&both[..QUADRANT_SIZE], &first[..]);
        assert_eq!(&both[QUADRANT_SIZE..], &second[..]);
    }

    #[test]
    fn test_full_blocks_written_quadrant_by_quadrant() {
        let mut driver = driver_with_capacity(16, 101);
        let fh = driver.open("blocks.dat").unwrap();

        let mut expected = Vec::new();
        for tag in 0..12u8 {
            let quadrant = patterned_quadrant(tag);
            driver.write(fh, &quadrant).unwrap();
            expected.extend_from_slice(&quadrant);
        }

        let info = driver.file_info(fh).unwrap();
        assert_eq!(info.size(), 3 * BLOCK_SIZE as u64);
        assert_eq!(info.block_count(), 3);
        assert_eq!(driver.transport().counters().create, 3);
        assert_eq!(driver.transport().counters().update, 9);

        driver.seek(fh, 0).unwrap();
        let mut actual = vec![0u8; expected.len()];
        for chunk in actual.chunks_mut(QUADRANT_SIZE) {
            assert_eq!(driver.read(fh, chunk).unwrap(), QUADRANT_SIZE);
        }
        assert_eq!(actual, expected);
        assert!(matches!(
            driver.read(fh, &mut [0u8; 1]),
            Err(DriverError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn test_capacity_plus_one_blocks_evicts_oldest() {
        let capacity = 4;
        let mut driver = driver_with_capacity(capacity, 102);
        let fh = driver.open("evict.dat").unwrap();

        for tag in 0..=capacity as u8 {
            driver.seek(fh, tag as u64 * BLOCK_SIZE as u64).unwrap();
            driver.write(fh, &patterned_quadrant(tag)).unwrap();
        }
        assert_eq!(driver.transport().obtain_count(), 0);

        // Block 0 was the least recently touched
        driver.seek(fh, 0).unwrap();
        let mut buf = [0u8; QUADRANT_SIZE];
        driver.read(fh, &mut buf).unwrap();
        assert_eq!(buf, patterned_quadrant(0));
        assert_eq!(driver.transport().obtain_count(), 1);

        // The most recent block is still resident
        driver.seek(fh, capacity as u64 * BLOCK_SIZE as u64).unwrap();
        driver.read(fh, &mut buf).unwrap();
        assert_eq!(driver.transport().obtain_count(), 1);
    }

    #[test]
    fn test_files_are_independent() {
        let mut driver = driver_with_capacity(8, 103);
        let a = driver.open("a.dat").unwrap();
        let b = driver.open("b.dat").unwrap();
        assert_ne!(a, b);

        driver.write(a, &patterned_quadrant(10)).unwrap();
        driver.write(b, &patterned_quadrant(20)).unwrap();
        driver.close(a).unwrap();

        driver.seek(b, 0).unwrap();
        let mut buf = [0u8; QUADRANT_SIZE];
        driver.read(b, &mut buf).unwrap();
        assert_eq!(buf, patterned_quadrant(20));

        // Reopening a closed path starts an empty file
        let again = driver.open("a.dat").unwrap();
        assert_eq!(driver.file_info(again).unwrap().size(), 0);
    }

    #[test]
    fn test_shutdown_statistics() {
        let mut driver = driver_with_capacity(8, 104);
        let fh = driver.open("stats.dat").unwrap();
        for tag in 0..4u8 {
            driver.write(fh, &patterned_quadrant(tag)).unwrap();
        }
        driver.seek(fh, 0).unwrap();
        let mut buf = [0u8; BLOCK_SIZE];
        driver.read(fh, &mut buf).unwrap();

        let stats = driver.shutdown().unwrap();
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hits, stats.lookups);
        assert_eq!(stats.hit_rate, 100.0);
        assert_eq!(stats.entries, 1);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Write { at: u16, len: u16, fill: u8 },
        Read { at: u16, len: u16 },
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            (any::<u16>(), 1u16..1500, any::<u8>())
                .prop_map(|(at, len, fill)| Step::Write { at, len, fill }),
            (any::<u16>(), 1u16..1500).prop_map(|(at, len)| Step::Read { at, len }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_driver_matches_byte_model(
            capacity in 1usize..4,
            steps in prop::collection::vec(step_strategy(), 1..24),
        ) {
            let mut driver = driver_with_capacity(capacity, 7);
            let fh = driver.open("model.dat").unwrap();
            let mut model: Vec<u8> = Vec::new();

            for step in steps {
                match step {
                    Step::Write { at, len, fill } => {
                        // Offsets stay within the file so the cursor always moves
                        let at = at as usize % (model.len() + 1);
                        let data = vec![fill; len as usize];
                        driver.seek(fh, at as u64).unwrap();
                        prop_assert_eq!(driver.write(fh, &data).unwrap(), data.len());

                        if model.len() < at + data.len() {
                            model.resize(at + data.len(), 0);
                        }
                        model[at..at + data.len()].copy_from_slice(&data);
                    }
                    Step::Read { at, len } => {
                        let at = at as usize % (model.len() + 1);
                        driver.seek(fh, at as u64).unwrap();
                        let mut buf = vec![0u8; len as usize];
                        match driver.read(fh, &mut buf) {
                            Ok(n) => {
                                let end = (at + len as usize).min(model.len());
                                prop_assert_eq!(n, end - at);
                                prop_assert_eq!(&buf[..n], &model[at..end]);
                            }
                            Err(DriverError::ReadPastEnd { .. }) => {
                                prop_assert_eq!(at, model.len());
                            }
                            Err(e) => prop_assert!(false, "unexpected error: {}", e),
                        }
                    }
                }
                prop_assert_eq!(driver.file_info(fh).unwrap().size(), model.len() as u64);
            }
            prop_assert_eq!(driver.transport().counters().rejected, 0);
        }
    }
}
