mod common;

use bplist_graph::{decode, decode_with_options, DecodeOptions, Error, Key, Object, TrailerDefect};

use std::rc::Rc;
use std::thread;

use common::{ascii, bplist};

/// Encodes a chain of one-element arrays `depth` levels deep ending in a null.
fn nested_arrays(depth: usize) -> Vec<u8> {
    let mut objects = (0 .. depth)
        .map(|index| vec![0xA1, 0x00, (index + 1) as u8])
        .collect::<Vec<_>>();
    objects.push(vec![0x00]);
    let objects = objects.iter().map(Vec::as_slice).collect::<Vec<_>>();
    common::bplist_with_reference_size(&objects, 0, 2)
}

fn elements(value: &bplist_graph::Value) -> Vec<bplist_graph::Value> {
    value.as_object()
        .and_then(Object::as_elements)
        .expect("array or set")
        .to_vec()
}

#[test]
fn test_null_root() {
    let root = decode(&bplist(&[&[0x00]], 0)).unwrap();
    assert_eq!(root.as_object(), Some(&Object::Null));
    assert_eq!(root.index(), 0);
}

#[test]
fn test_booleans_and_numbers() {
    let real = [&[0x23u8][..], &2.5f64.to_be_bytes()[..]].concat();
    let single = [&[0x22u8][..], &0.5f32.to_be_bytes()[..]].concat();
    let document = bplist(&[
        &[0xA6, 1, 2, 3, 4, 5, 6],
        &[0x08],
        &[0x09],
        &[0x11, 0xFF, 0xFF],
        &[0x13, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE],
        &real,
        &single,
    ], 0);
    let root = decode(&document).unwrap();
    let values = elements(&root);
    let objects = values.iter().map(|value| value.as_object().unwrap()).collect::<Vec<_>>();
    assert_eq!(objects[0].as_bool(), Some(false));
    assert_eq!(objects[1].as_bool(), Some(true));
    assert_eq!(objects[2].as_integer(), Some(65535));
    assert_eq!(objects[3].as_integer(), Some(-2));
    assert_eq!(objects[4].as_real(), Some(2.5));
    assert_eq!(objects[5].as_real(), Some(0.5));
}

#[test]
fn test_array_of_strings() {
    let document = bplist(&[&[0xA2, 1, 2], &ascii("a"), &ascii("b")], 0);
    let root = decode(&document).unwrap();
    let strings = elements(&root)
        .iter()
        .map(|value| value.as_object().and_then(Object::as_str).map(str::to_owned))
        .collect::<Vec<_>>();
    assert_eq!(strings, vec![Some("a".to_owned()), Some("b".to_owned())]);
}

#[test]
fn test_set_keeps_encoded_order() {
    let document = bplist(&[&[0xC2, 2, 1], &[0x10, 1], &[0x10, 2]], 0);
    let root = decode(&document).unwrap();
    assert!(matches!(root.as_object(), Some(Object::Set(_))));
    let indices = elements(&root).iter().map(|value| value.index()).collect::<Vec<_>>();
    assert_eq!(indices, vec![2, 1]);
}

#[test]
fn test_dictionary() {
    let document = bplist(&[&[0xD1, 1, 2], &ascii("k"), &[0x10, 1]], 0);
    let root = decode(&document).unwrap();
    let value = root.as_object().and_then(|object| object.get("k")).unwrap();
    assert_eq!(value.as_object().and_then(Object::as_integer), Some(1));
    assert_eq!(value.index(), 2);
    assert!(root.as_object().and_then(|object| object.get("missing")).is_none());
}

#[test]
fn test_non_string_keys() {
    let document = bplist(&[&[0xD2, 1, 2, 3, 3], &[0x10, 7], &[0x09], &ascii("v")], 0);
    let root = decode(&document).unwrap();
    let dictionary = root.as_object().and_then(Object::as_dictionary).unwrap();
    assert_eq!(dictionary.len(), 2);
    assert!(dictionary.contains_key(&bplist_graph::Key::Integer(7)));
    assert!(dictionary.contains_key(&bplist_graph::Key::Boolean(true)));
}

#[test]
fn test_duplicate_key_keeps_last_value() {
    common::init_logging();
    let document = bplist(&[&[0xD2, 1, 1, 2, 3], &ascii("k"), &[0x10, 1], &[0x10, 2]], 0);
    let root = decode(&document).unwrap();
    let value = root.as_object().and_then(|object| object.get("k")).unwrap();
    assert_eq!(value.as_object().and_then(Object::as_integer), Some(2));
}

#[test]
fn test_shared_objects_are_decoded_once() {
    let document = bplist(&[&[0xA2, 1, 1], &ascii("a")], 0);
    let root = decode(&document).unwrap();
    let values = elements(&root);
    assert!(values[0].same_object(&values[1]));
    assert!(!values[0].is_back_reference());

    let document = bplist(&[&[0xA2, 1, 1], &[0xA1, 2], &[0x10, 7]], 0);
    let root = decode(&document).unwrap();
    let values = elements(&root);
    assert!(values[0].same_object(&values[1]));
    assert!(elements(&values[0])[0].same_object(&elements(&values[1])[0]));
}

#[test]
fn test_shared_key_payload() {
    let mut key = vec![0x4F, 0x11, 0x10, 0x00];
    key.resize(key.len() + 4096, 0x5A);
    let document = bplist(&[&[0xA2, 2, 3], &key, &[0xD1, 1, 4], &[0xD1, 1, 4], &[0x10, 1]], 0);
    let root = decode(&document).unwrap();

    let payloads = elements(&root)
        .iter()
        .map(|value| {
            let dictionary = value.as_object().and_then(Object::as_dictionary).unwrap();
            match dictionary.keys().next() {
                Some(Key::Data(payload)) => Rc::clone(payload),
                other => panic!("expected a data key, found {:?}", other),
            }
        })
        .collect::<Vec<_>>();
    assert_eq!(payloads[0].len(), 4096);
    assert!(Rc::ptr_eq(&payloads[0], &payloads[1]));
}

#[test]
fn test_self_referencing_dictionary() {
    let document = bplist(&[&[0xD1, 1, 0], &ascii("self")], 0);
    let root = decode(&document).unwrap();
    let value = root.as_object().and_then(|object| object.get("self")).unwrap();
    assert!(value.is_back_reference());
    assert_eq!(value.index(), 0);
    assert!(value.same_object(&root));
    assert_eq!(value.as_object(), None);
    assert!(value.object().is_some());
}

#[test]
fn test_indirect_cycle() {
    let document = bplist(&[&[0xA1, 1], &[0xA1, 0]], 0);
    let root = decode(&document).unwrap();
    let inner = elements(&root).remove(0);
    assert!(!inner.is_back_reference());
    let back = elements(&inner).remove(0);
    assert!(back.is_back_reference());
    assert!(back.same_object(&root));
}

#[test]
fn test_cycle_does_not_outlive_root() {
    let document = bplist(&[&[0xD1, 1, 0], &ascii("self")], 0);
    let root = decode(&document).unwrap();
    let back = root.as_object().and_then(|object| object.get("self")).cloned().unwrap();
    drop(root);
    assert!(back.object().is_none());
}

#[test]
fn test_depth_limit() {
    let document = bplist(&[&[0xA1, 1], &[0xA1, 2], &[0xA1, 3], &[0x00]], 0);

    let options = DecodeOptions::default().max_depth(2);
    assert!(matches!(
        decode_with_options(&document, options),
        Err(Error::TooDeep { index: 3, limit: 2 })
    ));

    let options = DecodeOptions::default().max_depth(3);
    assert!(decode_with_options(&document, options).is_ok());
}

#[test]
fn test_default_depth_limit_fits_spawned_thread() {
    let limit = DecodeOptions::default().max_depth;
    assert!(limit < 255);

    let document = nested_arrays(limit);
    let decoded = thread::spawn(move || decode(&document).map(|root| root.index()))
        .join()
        .unwrap();
    assert!(matches!(decoded, Ok(0)));

    let document = nested_arrays(limit + 1);
    let decoded = thread::spawn(move || decode(&document).map(|root| root.index()))
        .join()
        .unwrap();
    match decoded {
        Err(Error::TooDeep { index, limit: reported }) => {
            assert_eq!(index, limit + 1);
            assert_eq!(reported, limit);
        }
        other => panic!("expected the depth limit, found {:?}", other),
    }
}

#[test]
fn test_dangling_reference() {
    let document = bplist(&[&[0xA1, 5]], 0);
    assert!(matches!(
        decode(&document),
        Err(Error::DanglingReference { index: 0, reference: 5 })
    ));
}

#[test]
fn test_container_key_is_rejected() {
    let document = bplist(&[&[0xD1, 1, 2], &[0xA0], &[0x10, 1]], 0);
    assert!(matches!(decode(&document), Err(Error::UnhashableKey { index: 1 })));

    let document = bplist(&[&[0xD1, 0, 1], &[0x10, 1]], 0);
    assert!(matches!(decode(&document), Err(Error::UnhashableKey { index: 0 })));
}

#[test]
fn test_utf16_string() {
    let document = bplist(&[&[0x62, 0x00, 0x68, 0x00, 0xE9]], 0);
    let root = decode(&document).unwrap();
    assert_eq!(root.as_object().and_then(Object::as_str), Some("hé"));

    let document = bplist(&[&[0x62, 0xD8, 0x3D, 0xDE, 0x00]], 0);
    let root = decode(&document).unwrap();
    assert_eq!(root.as_object().and_then(Object::as_str), Some("\u{1F600}"));
}

#[test]
fn test_unpaired_surrogate() {
    let document = bplist(&[&[0x61, 0xD8, 0x3D]], 0);
    assert!(matches!(decode(&document), Err(Error::InvalidEncoding { offset: 9 })));
}

#[test]
fn test_extended_length() {
    let mut data = vec![0x4F, 0x10, 20];
    data.extend(0u8 .. 20);
    let document = bplist(&[&data], 0);
    let root = decode(&document).unwrap();
    let payload = root.as_object().and_then(Object::as_data).unwrap();
    assert_eq!(payload.len(), 20);
    assert_eq!(payload[19], 19);
}

#[test]
fn test_unsupported_length_width() {
    let document = bplist(&[&[0x4F, 0x13, 0, 0, 0, 0, 0, 0, 0, 1, 0xAA]], 0);
    assert!(decode(&document).is_ok());

    let document = bplist(&[&[0x4F, 0x14, 0, 0]], 0);
    assert!(matches!(decode(&document), Err(Error::UnsupportedWidth { offset: 9, width: 16 })));
}

#[test]
fn test_unknown_tag() {
    let document = bplist(&[&[0x70]], 0);
    assert!(matches!(decode(&document), Err(Error::UnknownTag { offset: 8, marker: 0x70 })));
}

#[test]
fn test_invalid_singleton() {
    let document = bplist(&[&[0x0F]], 0);
    assert!(matches!(decode(&document), Err(Error::InvalidSingleton { offset: 8, marker: 0x0F })));
}

#[test]
fn test_date() {
    let epoch = [&[0x33u8][..], &0.0f64.to_be_bytes()[..]].concat();
    let root = decode(&bplist(&[&epoch], 0)).unwrap();
    let date = root.as_object().and_then(Object::as_date).unwrap();
    assert_eq!(date.absolute_time.into_inner(), 0.0);
    assert_eq!(date.to_utc().unwrap().to_rfc3339(), "2001-01-01T00:00:00+00:00");

    let single = [&[0x32u8][..], &0.0f32.to_be_bytes()[..]].concat();
    assert!(matches!(
        decode(&bplist(&[&single], 0)),
        Err(Error::UnsupportedEncoding { offset: 8, marker: 0x32 })
    ));
}

#[test]
fn test_uid_decodes_as_string() {
    let document = bplist(&[&[0x82, b'4', b'2']], 0);
    let root = decode(&document).unwrap();
    assert_eq!(root.as_object().and_then(Object::as_str), Some("42"));
}

#[test]
fn test_wide_references() {
    let document = common::bplist_with_reference_size(
        &[&[0xA2, 0x00, 0x01, 0x00, 0x02], &ascii("a"), &ascii("b")],
        0,
        2,
    );
    let root = decode(&document).unwrap();
    let indices = elements(&root).iter().map(|value| value.index()).collect::<Vec<_>>();
    assert_eq!(indices, vec![1, 2]);
}

#[test]
fn test_non_zero_root() {
    let document = bplist(&[&ascii("unused"), &[0xA1, 0]], 1);
    let root = decode(&document).unwrap();
    assert_eq!(root.index(), 1);
    assert_eq!(elements(&root)[0].as_object().and_then(Object::as_str), Some("unused"));
}

#[test]
fn test_decoding_is_deterministic() {
    let document = bplist(&[&[0xD2, 1, 2, 3, 0], &ascii("a"), &ascii("b"), &[0xA2, 1, 2]], 0);
    let first = decode(&document).unwrap();
    let second = decode(&document).unwrap();
    assert_eq!(first, second);
    assert!(!first.same_object(&second));
}

#[test]
fn test_separate_decodes_of_shared_containers_compare_equal() {
    // Each array holds the next one twice, so paths double at every level.
    let levels = 12;
    let mut objects = (0 .. levels)
        .map(|index| vec![0xA2, index as u8 + 1, index as u8 + 1])
        .collect::<Vec<_>>();
    objects.push(vec![0x10, 1]);
    let objects = objects.iter().map(Vec::as_slice).collect::<Vec<_>>();
    let document = bplist(&objects, 0);

    let first = decode(&document).unwrap();
    let second = decode(&document).unwrap();
    assert_eq!(first, second);

    let mut changed = document.clone();
    let leaf = changed.len() - 32 - (levels + 1) - 1;
    changed[leaf] = 2;
    assert_ne!(first, decode(&changed).unwrap());
}

#[test]
fn test_payload_may_not_extend_into_offset_table() {
    // A one-element array whose reference byte is the offset table.
    let document = bplist(&[&[0xA1]], 0);
    assert!(matches!(decode(&document), Err(Error::Truncated { offset: 9 })));
}

#[test]
fn test_removing_any_trailer_byte_is_detected() {
    let document = bplist(&[&[0xA2, 1, 2], &ascii("a"), &ascii("b")], 0);
    let trailer_start = document.len() - 32;
    for position in trailer_start .. document.len() {
        let mut truncated = document.clone();
        truncated.remove(position);
        match decode(&truncated) {
            Err(Error::TruncatedTrailer { .. }) | Err(Error::OffsetOutOfRange { .. }) => {}
            other => panic!("removing byte {} produced {:?}", position, other),
        }
    }
}

#[test]
fn test_every_prefix_is_rejected() {
    let document = bplist(&[&[0xA2, 1, 2], &ascii("a"), &ascii("b")], 0);
    for length in 0 .. document.len() {
        assert!(decode(&document[.. length]).is_err(), "prefix of {} bytes decoded", length);
    }
    assert!(matches!(
        decode(&document[.. 39]),
        Err(Error::TruncatedTrailer { defect: TrailerDefect::TooShort, length: 39 })
    ));
}

#[test]
fn test_bad_magic() {
    let mut document = bplist(&[&[0x00]], 0);
    document[6] = b'1';
    assert!(matches!(decode(&document), Err(Error::BadMagic)));
}
