use rand::Rng;
use rtcm3::frame::{crc24, encode_frame, find_frame, Frame, FRAME_OVERHEAD};
use rtcm3::prelude::Error;

fn payload(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut payload = (0..len).map(|_| rng.gen::<u8>()).collect::<Vec<_>>();
    // 1005
    payload[0] = 0x3e;
    payload[1] = (payload[1] & 0x0f) | 0xd0;
    payload
}

#[test]
fn valid_frames() {
    for len in [2, 19, 250, 1023] {
        let payload = payload(len);
        let frame = encode_frame(&payload).unwrap();
        assert_eq!(frame.len(), len + FRAME_OVERHEAD);

        let parsed = Frame::parse(&frame).unwrap();
        assert_eq!(parsed.payload, payload.as_slice());
        assert_eq!(parsed.message_type(), 1005);
        assert_eq!(parsed.end(), frame.len());

        let crc = crc24(&frame[..frame.len() - 3]);
        assert_eq!(crc >> 16, frame[frame.len() - 3] as u32);
    }
    assert!(matches!(
        encode_frame(&vec![0; 1024]),
        Err(Error::MessageTooLong)
    ));
}

#[test]
fn payload_bit_flips_are_rejected() {
    let mut rng = rand::thread_rng();
    let payload = payload(64);
    let frame = encode_frame(&payload).unwrap();
    for _ in 0..512 {
        let bit = rng.gen_range(0..payload.len() * 8);
        let mut corrupt = frame.clone();
        corrupt[3 + bit / 8] ^= 0x80 >> (bit % 8);
        assert!(
            find_frame(&corrupt, 0).is_none(),
            "bit {} flip was not detected",
            bit
        );
    }
}

#[test]
fn crc_corruption_is_rejected() {
    let frame = encode_frame(&payload(32)).unwrap();
    for k in 1..=3 {
        let mut corrupt = frame.clone();
        let n = corrupt.len();
        corrupt[n - k] ^= 0x01;
        assert!(matches!(
            Frame::parse(&corrupt),
            Err(Error::ChecksumMismatch)
        ));
        assert!(find_frame(&corrupt, 0).is_none());
    }
}

#[test]
fn frames_within_noise() {
    let mut stream = vec![0xd3, 0xd3, 0x00, 0x00];
    let first = encode_frame(&payload(20)).unwrap();
    let second = encode_frame(&payload(40)).unwrap();
    stream.extend_from_slice(&first);
    stream.extend_from_slice(&[0x12, 0xd3, 0x34]);
    stream.extend_from_slice(&second);

    let frame = find_frame(&stream, 0).unwrap();
    assert_eq!(frame.offset, 4);
    assert_eq!(frame.payload, &first[3..first.len() - 3]);

    let frame = find_frame(&stream, frame.end()).unwrap();
    assert_eq!(frame.offset, 4 + first.len() + 3);
    assert_eq!(frame.end(), stream.len());

    // incomplete frame
    assert!(find_frame(&stream[..stream.len() - 1], 4 + first.len()).is_none());
}
