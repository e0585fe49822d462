//! # Wire-level Behaviour
//!
//! Inspects the frames the driver hands to its transport.

#[cfg(test)]
mod tests {
    use crate::fixtures::{patterned_quadrant, recording_driver};
    use sg_driver::domain::{BLOCK_UNKNOWN, INITIAL_SEQNO, NODE_UNKNOWN, SEQNO_UNKNOWN};
    use sg_driver::{Operation, ScatterGatherApi, QUADRANT_SIZE};

    #[test]
    fn test_session_frames() {
        let mut driver = recording_driver(200);
        let fh = driver.open("wire.dat").unwrap();
        let local = driver.local_node_id().unwrap();

        driver.write(fh, &patterned_quadrant(1)).unwrap();
        driver.write(fh, &patterned_quadrant(2)).unwrap();
        driver.shutdown().unwrap();

        let requests = &driver.transport().requests;
        let ops: Vec<Operation> = requests.iter().map(|p| p.op).collect();
        assert_eq!(
            ops,
            vec![
                Operation::InitEndpoint,
                Operation::CreateBlock,
                Operation::UpdateBlock,
                Operation::StopEndpoint,
            ]
        );

        let init = &requests[0];
        assert_eq!(init.local, NODE_UNKNOWN);
        assert_eq!(init.remote, NODE_UNKNOWN);
        assert_eq!(init.block, BLOCK_UNKNOWN);
        assert_eq!(init.sender_seq, INITIAL_SEQNO);
        assert_eq!(init.receiver_seq, SEQNO_UNKNOWN);

        // Sender sequence numbers increase by one per request
        for (i, request) in requests.iter().enumerate() {
            assert_eq!(request.sender_seq, INITIAL_SEQNO + i as u16);
        }

        let create = &requests[1];
        assert_eq!(create.local, local);
        assert_eq!(create.receiver_seq, SEQNO_UNKNOWN);
        let payload = create.payload.as_ref().unwrap();
        assert_eq!(&payload[..QUADRANT_SIZE], &patterned_quadrant(1)[..]);
        assert!(payload[QUADRANT_SIZE..].iter().all(|&b| b == 0));

        let stop = &requests[3];
        assert_eq!(stop.local, local);
        assert_eq!(stop.remote, NODE_UNKNOWN);
        assert!(stop.payload.is_none());
    }

    #[test]
    fn test_update_carries_successor_of_confirmed_sequence() {
        let mut driver = recording_driver(201);
        let fh = driver.open("wire.dat").unwrap();
        driver.write(fh, &patterned_quadrant(1)).unwrap();

        let identity = driver.file_info(fh).unwrap().block(0).unwrap();
        let confirmed = driver.peer_sequence(identity.remote).unwrap();
        assert_eq!(
            driver.transport().inner.node_sequence(identity.remote),
            Some(confirmed)
        );

        driver.write(fh, &patterned_quadrant(2)).unwrap();
        let update = driver.transport().requests.last().unwrap();
        assert_eq!(update.op, Operation::UpdateBlock);
        assert_eq!(update.remote, identity.remote);
        assert_eq!(update.block, identity.block);
        assert_eq!(update.receiver_seq, confirmed + 1);

        let payload = update.payload.as_ref().unwrap();
        assert_eq!(&payload[QUADRANT_SIZE..2 * QUADRANT_SIZE], &patterned_quadrant(2)[..]);
        assert_eq!(driver.peer_sequence(identity.remote), Some(confirmed + 1));
    }
}
