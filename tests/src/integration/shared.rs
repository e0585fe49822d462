//! # Shared Session
//!
//! Several threads driving one session through `SharedDriver`.

#[cfg(test)]
mod tests {
    use crate::fixtures::{driver_with_capacity, patterned_quadrant};
    use parking_lot::Mutex;
    use sg_driver::{ScatterGatherApi, SharedDriver, QUADRANT_SIZE};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_writers_each_see_their_own_file() {
        let shared = SharedDriver::new(driver_with_capacity(4, 300));
        let handles = Arc::new(Mutex::new(Vec::new()));

        let workers: Vec<_> = (0..6u8)
            .map(|tag| {
                let mut driver = shared.clone();
                let handles = Arc::clone(&handles);
                thread::spawn(move || {
                    let fh = driver.open(&format!("thread-{}.dat", tag)).unwrap();
                    for q in 0..4u8 {
                        driver.write(fh, &patterned_quadrant(tag * 4 + q)).unwrap();
                    }
                    handles.lock().push((tag, fh));
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let mut driver = shared.clone();
        for (tag, fh) in handles.lock().iter().copied() {
            driver.seek(fh, 0).unwrap();
            for q in 0..4u8 {
                let mut buf = [0u8; QUADRANT_SIZE];
                driver.read(fh, &mut buf).unwrap();
                assert_eq!(buf, patterned_quadrant(tag * 4 + q));
            }
        }

        let session = shared.lock();
        assert_eq!(session.transport().counters().create, 6);
        assert_eq!(session.transport().counters().rejected, 0);
    }

    #[test]
    fn test_guard_serializes_multi_step_sequences() {
        let shared = SharedDriver::new(driver_with_capacity(4, 301));
        let fh = shared.clone().open("guarded.dat").unwrap();

        {
            let mut session = shared.lock();
            session.write(fh, &patterned_quadrant(9)).unwrap();
            session.seek(fh, 0).unwrap();
            let mut buf = [0u8; QUADRANT_SIZE];
            session.read(fh, &mut buf).unwrap();
            assert_eq!(buf, patterned_quadrant(9));
        }

        let stats = shared.clone().shutdown().unwrap();
        assert_eq!(stats.entries, 1);
    }
}
