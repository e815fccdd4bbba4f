//! End-to-end codec tests: build, dump, patch, load across both size
//! classes.

use meshbuf::{
    Error, MessageBuffer, MessageQueue, MessageView, MessageViewMut, Priority, SizeClass,
    is_micro,
};

fn build(class: SizeClass) -> MessageBuffer {
    let mut msg = MessageBuffer::new(class);
    msg.header_mut().set_hop_limit(16);
    msg.header_mut().set_earmark(0b011);
    msg.header_mut().set_priority(Priority::Level1);
    msg.header_mut().set_heart_rate(30);
    msg.header_mut().set_src(0x0A);
    msg.header_mut().set_dst(0x0B);
    msg.push_block(0x01, b"primary content".as_slice()).unwrap();
    msg.push_block(0x02, b"secondary".as_slice()).unwrap();
    msg.push_block(0x03, b"".as_slice()).unwrap();
    msg
}

#[test]
fn roundtrip_preserves_structure() {
    for class in [SizeClass::Full, SizeClass::Micro] {
        let original = build(class);
        let wire = original.dump().unwrap();
        let loaded = MessageBuffer::load(&wire).unwrap();

        assert_eq!(loaded.class(), class);
        assert_eq!(loaded.header().hop_limit(), original.header().hop_limit());
        assert_eq!(loaded.header().earmark(), original.header().earmark());
        assert_eq!(loaded.header().priority(), original.header().priority());
        assert_eq!(loaded.header().heart_rate(), original.header().heart_rate());
        assert_eq!(loaded.header().src_id(), original.header().src_id());
        assert_eq!(loaded.header().dst_id(), original.header().dst_id());
        assert_eq!(loaded.header().len(), original.header().len());
        assert_eq!(loaded.chain(), original.chain());
    }
}

#[test]
fn every_single_bit_flip_is_detected() {
    // CRC-16 detects all single-bit errors, so this holds for every
    // position, not just a sampled few.
    for class in [SizeClass::Full, SizeClass::Micro] {
        let wire = build(class).dump().unwrap();
        for byte in 0..wire.len() {
            for bit in 0..8 {
                let mut corrupted = wire.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(
                    MessageBuffer::load(&corrupted).is_err(),
                    "{class} flip at byte {byte} bit {bit} went undetected"
                );
            }
        }
    }
}

#[test]
fn class_discrimination_from_wire() {
    let full = build(SizeClass::Full).dump().unwrap();
    let micro = build(SizeClass::Micro).dump().unwrap();
    assert!(!is_micro(&full).unwrap());
    assert!(is_micro(&micro).unwrap());

    // Accessors self-configure from cfg_hdr alone.
    assert_eq!(MessageView::new(&full).unwrap().class(), SizeClass::Full);
    assert_eq!(MessageView::new(&micro).unwrap().class(), SizeClass::Micro);
}

#[test]
fn routing_touch_up_then_forward() {
    // A routing collaborator bumps the hop limit and redirects the buffer
    // without a decode/encode round-trip.
    let mut wire = build(SizeClass::Full).dump().unwrap();

    let mut view = MessageViewMut::new(&mut wire).unwrap();
    let hops = view.add_hop_limit();
    assert_eq!(hops, 17);
    view.set_dst(0xFF).unwrap();
    view.restamp_checksum().unwrap();

    let forwarded = MessageBuffer::load(&wire).unwrap();
    assert_eq!(forwarded.header().hop_limit(), 17);
    assert_eq!(forwarded.header().dst_id(), 0xFF);
}

#[test]
fn routing_touch_up_on_padded_frame() {
    // A transport may hand the router a frame padded past the declared
    // total; patching and restamping must agree with load about the
    // checksummed region.
    let mut wire = build(SizeClass::Full).dump().unwrap();
    wire.extend_from_slice(&[0u8; 7]);

    meshbuf::protocol::verify(&wire).unwrap();

    let mut view = MessageViewMut::new(&mut wire).unwrap();
    view.set_dst(0x99).unwrap();
    view.restamp_checksum().unwrap();

    meshbuf::protocol::verify(&wire).unwrap();
    let forwarded = MessageBuffer::load(&wire).unwrap();
    assert_eq!(forwarded.header().dst_id(), 0x99);
}

#[test]
fn stale_checksum_rejected_until_restamped() {
    let mut wire = build(SizeClass::Micro).dump().unwrap();

    {
        let mut view = MessageViewMut::new(&mut wire).unwrap();
        view.set_priority(Priority::Level4);
    }
    assert!(matches!(
        MessageBuffer::load(&wire),
        Err(Error::ChecksumMismatch { .. })
    ));

    MessageViewMut::new(&mut wire)
        .unwrap()
        .restamp_checksum()
        .unwrap();
    let loaded = MessageBuffer::load(&wire).unwrap();
    assert_eq!(loaded.header().priority_level().unwrap(), Priority::Level4);
}

#[test]
fn pending_send_queue_flow() {
    let mut pending = MessageQueue::new();
    for dst in [1u32, 2, 3] {
        let mut msg = MessageBuffer::new(SizeClass::Full);
        msg.header_mut().set_dst(dst);
        msg.push_block(0x1, b"x".as_slice()).unwrap();
        pending.push_back(msg);
    }

    // Transport drains in FIFO order; each dequeued buffer serializes clean.
    let mut seen = Vec::new();
    while let Some(msg) = pending.pop_front() {
        let wire = msg.dump().unwrap();
        seen.push(MessageBuffer::load(&wire).unwrap().header().dst_id());
    }
    assert_eq!(seen, vec![1, 2, 3]);
}

#[test]
fn short_inputs_never_panic() {
    let wire = build(SizeClass::Full).dump().unwrap();
    for cut in 0..wire.len() {
        let result = MessageBuffer::load(&wire[..cut]);
        assert!(
            matches!(
                result,
                Err(Error::MalformedHeader { .. } | Error::TruncatedBlock { .. })
            ),
            "truncation to {cut} bytes produced {result:?}"
        );
    }
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn class_strategy() -> impl Strategy<Value = SizeClass> {
        prop_oneof![Just(SizeClass::Full), Just(SizeClass::Micro)]
    }

    // Blocks sized so even a micro chain stays within its 8-bit len field.
    fn blocks_strategy() -> impl Strategy<Value = Vec<(u8, Vec<u8>)>> {
        prop::collection::vec(
            (any::<u8>(), prop::collection::vec(any::<u8>(), 0..=40)),
            0..=3,
        )
    }

    fn build_message(class: SizeClass, blocks: &[(u8, Vec<u8>)]) -> MessageBuffer {
        let mut msg = MessageBuffer::new(class);
        for (block_type, data) in blocks {
            msg.push_block(u16::from(*block_type), data.clone()).unwrap();
        }
        msg
    }

    proptest! {
        /// Any valid message roundtrips structurally in either class
        #[test]
        fn prop_roundtrip(
            class in class_strategy(),
            hop in any::<u8>(),
            earmark in 0u8..8,
            priority in 0u8..8,
            heart in any::<u8>(),
            src in any::<u8>(),
            dst in any::<u8>(),
            blocks in blocks_strategy(),
        ) {
            let mut msg = build_message(class, &blocks);
            msg.header_mut().set_hop_limit(hop);
            msg.header_mut().set_earmark(earmark);
            msg.header_mut().set_priority_raw(priority);
            msg.header_mut().set_heart_rate(u16::from(heart));
            msg.header_mut().set_src(u32::from(src));
            msg.header_mut().set_dst(u32::from(dst));

            let wire = msg.dump().unwrap();
            let loaded = MessageBuffer::load(&wire).unwrap();

            prop_assert_eq!(loaded.header().hop_limit(), hop);
            prop_assert_eq!(loaded.header().earmark(), earmark);
            prop_assert_eq!(loaded.header().priority(), priority);
            prop_assert_eq!(loaded.chain(), msg.chain());
        }

        /// Corrupting any byte is caught by load
        #[test]
        fn prop_corruption_detected(
            class in class_strategy(),
            blocks in blocks_strategy(),
            offset_ratio in 0.0f64..1.0,
            mask in 1u8..=255,
        ) {
            let msg = build_message(class, &blocks);
            let mut wire = msg.dump().unwrap();

            let offset = ((wire.len() - 1) as f64 * offset_ratio) as usize;
            wire[offset] ^= mask;

            prop_assert!(MessageBuffer::load(&wire).is_err());
        }

        /// Stray high bits never reach the stored priority
        #[test]
        fn prop_priority_masked(raw in any::<u8>()) {
            let mut wire = MessageBuffer::new(SizeClass::Full).dump().unwrap();
            let mut view = MessageViewMut::new(&mut wire).unwrap();
            view.set_priority_raw(raw);

            prop_assert_eq!(view.as_view().priority(), raw & 0x7);
            // size class untouched by priority writes
            prop_assert_eq!(view.class(), SizeClass::Full);
        }
    }
}
