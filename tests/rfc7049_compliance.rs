// Copyright 2026 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! RFC 7049 compliance tests
//! Encoding/decoding against the byte sequences of RFC 7049 Appendix A.
//!
//! Floats always encode as double precision, so the float vectors check the
//! 0xfb form on encode and the RFC's compact forms on decode only.

use cbor_codec::{CborError, Value, decode, from_slice, to_vec};

#[test]
fn test_rfc7049_integers() {
    assert_encode_decode(0u64, "00");
    assert_encode_decode(1u64, "01");
    assert_encode_decode(10u64, "0a");
    assert_encode_decode(23u64, "17");
    assert_encode_decode(24u64, "1818");
    assert_encode_decode(25u64, "1819");
    assert_encode_decode(100u64, "1864");
    assert_encode_decode(1000u64, "1903e8");
    assert_encode_decode(1000000u64, "1a000f4240");
    assert_encode_decode(1000000000000u64, "1b000000e8d4a51000");
    assert_encode_decode(18446744073709551615u64, "1bffffffffffffffff");

    assert_encode_decode(-1i64, "20");
    assert_encode_decode(-10i64, "29");
    assert_encode_decode(-100i64, "3863");
    assert_encode_decode(-1000i64, "3903e7");

    // -2^64 only fits the wire format
    assert_eq!(
        hex_from_bytes(&to_vec(&-18446744073709551616i128).unwrap()),
        "3bffffffffffffffff"
    );
    assert!(matches!(
        decode(&hex_to_bytes("3bffffffffffffffff")),
        Err(CborError::IntegerOverflow(_))
    ));
}

#[test]
fn test_rfc7049_simple_values() {
    assert_encode_decode(false, "f4");
    assert_encode_decode(true, "f5");

    let none: Option<u8> = None;
    assert_encode_decode(none, "f6");

    let some: Option<u8> = Some(42);
    assert_encode_decode(some, "182a");

    // undefined reads as null
    assert_eq!(decode(&hex_to_bytes("f7")).unwrap(), Some(Value::Null));

    // simple(16), simple(24) and simple(255) have no assigned meaning
    assert!(matches!(
        decode(&hex_to_bytes("f0")),
        Err(CborError::UnassignedSimple(16))
    ));
    assert!(matches!(
        decode(&hex_to_bytes("f818")),
        Err(CborError::UnassignedSimple(24))
    ));
    assert!(matches!(
        decode(&hex_to_bytes("f8ff")),
        Err(CborError::UnassignedSimple(255))
    ));
}

#[test]
fn test_rfc7049_floats_encode_as_double() {
    assert_encode_decode(0.0f64, "fb0000000000000000");
    assert_encode_decode(-0.0f64, "fb8000000000000000");
    assert_encode_decode(1.5f64, "fb3ff8000000000000");
    assert_encode_decode(65504.0f64, "fb40effc0000000000");
    assert_encode_decode(100000.0f64, "fb40f86a0000000000");
    assert_encode_decode(3.4028234663852886e+38f64, "fb47efffffe0000000");
    assert_encode_decode(1.0e+300f64, "fb7e37e43c8800759c");
    assert_encode_decode(-4.1f64, "fbc010666666666666");

    assert_eq!(
        hex_from_bytes(&to_vec(&f64::INFINITY).unwrap()),
        "fb7ff0000000000000"
    );
    assert_eq!(
        hex_from_bytes(&to_vec(&f64::NEG_INFINITY).unwrap()),
        "fbfff0000000000000"
    );
    assert_eq!(hex_from_bytes(&to_vec(&1.5f32).unwrap()), "fb3ff8000000000000");
}

#[test]
fn test_rfc7049_floats_decode_compact_forms() {
    let cases: &[(&str, f64)] = &[
        ("f90000", 0.0),
        ("f93c00", 1.0),
        ("f93e00", 1.5),
        ("f97bff", 65504.0),
        ("fa47c35000", 100000.0),
        ("fa7f7fffff", 3.4028234663852886e+38),
        ("f90001", 5.960464477539063e-8),
        ("f90400", 0.00006103515625),
        ("f9c400", -4.0),
        ("f97c00", f64::INFINITY),
        ("f9fc00", f64::NEG_INFINITY),
        ("fa7f800000", f64::INFINITY),
        ("faff800000", f64::NEG_INFINITY),
        ("fb7ff0000000000000", f64::INFINITY),
    ];

    for (hex, expected) in cases {
        let decoded: f64 = from_slice(&hex_to_bytes(hex)).unwrap();
        assert_eq!(decoded, *expected, "Decoding mismatch for {}", hex);
    }

    let negative_zero: f64 = from_slice(&hex_to_bytes("f98000")).unwrap();
    assert!(negative_zero == 0.0 && negative_zero.is_sign_negative());

    for hex in ["f97e00", "fa7fc00000", "fb7ff8000000000000"] {
        let nan: f64 = from_slice(&hex_to_bytes(hex)).unwrap();
        assert!(nan.is_nan(), "Expected NaN for {}", hex);
    }
}

#[test]
fn test_rfc7049_strings() {
    assert_encode_decode("".to_string(), "60");
    assert_encode_decode("a".to_string(), "6161");
    assert_encode_decode("IETF".to_string(), "6449455446");
    assert_encode_decode("\"\\".to_string(), "62225c");
    assert_encode_decode("\u{00fc}".to_string(), "62c3bc");
    assert_encode_decode("\u{6c34}".to_string(), "63e6b0b4");
    assert_encode_decode("\u{10151}".to_string(), "64f0908591");

    use serde_bytes::ByteBuf;
    assert_encode_decode(ByteBuf::from(vec![]), "40");
    assert_encode_decode(ByteBuf::from(vec![0x01, 0x02, 0x03, 0x04]), "4401020304");
}

#[test]
fn test_rfc7049_arrays() {
    let empty: Vec<u8> = vec![];
    assert_encode_decode(empty, "80");

    assert_encode_decode(vec![1, 2, 3], "83010203");

    // Heterogeneous nesting goes through Value
    let nested = vec![
        Value::Unsigned(1),
        Value::Array(vec![Value::Unsigned(2), Value::Unsigned(3)]),
        Value::Array(vec![Value::Unsigned(4), Value::Unsigned(5)]),
    ];
    assert_encode_decode(nested, "8301820203820405");

    assert_encode_decode(
        vec![
            1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
            25,
        ],
        "98190102030405060708090a0b0c0d0e0f101112131415161718181819",
    );
}

#[test]
fn test_rfc7049_maps() {
    use std::collections::BTreeMap;

    let empty: BTreeMap<String, u64> = BTreeMap::new();
    assert_encode_decode(empty, "a0");

    let mut map = BTreeMap::new();
    map.insert(1, 2);
    map.insert(3, 4);
    assert_encode_decode(map, "a201020304");

    let mut map2 = BTreeMap::new();
    map2.insert("a".to_string(), Value::Unsigned(1));
    map2.insert(
        "b".to_string(),
        Value::Array(vec![Value::Unsigned(2), Value::Unsigned(3)]),
    );
    assert_encode_decode(map2, "a26161016162820203");

    let mut letters = BTreeMap::new();
    for (k, v) in [("a", "A"), ("b", "B"), ("c", "C"), ("d", "D"), ("e", "E")] {
        letters.insert(k.to_string(), v.to_string());
    }
    assert_encode_decode(letters, "a56161614161626142616361436164614461656145");
}

#[test]
fn test_rfc7049_indefinite_lengths() {
    // Each indefinite form decodes to the same value as its definite twin
    let pairs = [
        ("5f42010243030405ff", "450102030405"),
        ("7f657374726561646d696e67ff", "6973747265616d696e67"),
        ("9fff", "80"),
        ("9f018202039f0405ffff", "8301820203820405"),
        ("9f01820203820405ff", "8301820203820405"),
        ("83018202039f0405ff", "8301820203820405"),
        ("83019f0203ff820405", "8301820203820405"),
        (
            "9f0102030405060708090a0b0c0d0e0f101112131415161718181819ff",
            "98190102030405060708090a0b0c0d0e0f101112131415161718181819",
        ),
        ("bf61610161629f0203ffff", "a26161016162820203"),
        ("826161bf61626163ff", "826161a161626163"),
        ("bf6346756ef563416d7421ff", "a26346756ef563416d7421"),
    ];

    for (indefinite, definite) in pairs {
        assert_eq!(
            decode(&hex_to_bytes(indefinite)).unwrap(),
            decode(&hex_to_bytes(definite)).unwrap(),
            "Indefinite mismatch for {}",
            indefinite
        );
    }
}

#[test]
fn test_rfc7049_tags() {
    use cbor_codec::tags::Tagged;

    // Tag 0: Standard date/time string
    let tagged = Tagged::new(Some(0), "2013-03-21T20:04:00Z".to_string());
    let cbor = to_vec(&tagged).unwrap();
    assert_eq!(
        hex_from_bytes(&cbor),
        "c074323031332d30332d32315432303a30343a30305a"
    );

    // Tag 1: Epoch-based date/time, integer and float forms
    let tagged_ts = Tagged::new(Some(1), 1363896240u64);
    let cbor_ts = to_vec(&tagged_ts).unwrap();
    assert_eq!(hex_from_bytes(&cbor_ts), "c11a514b67b0");
    let epoch: f64 = from_slice(&hex_to_bytes("c1fb41d452d9ec200000")).unwrap();
    assert_eq!(epoch, 1363896240.5);

    // Tag 23: expected conversion to base16, carried through as its content
    let data: serde_bytes::ByteBuf = from_slice(&hex_to_bytes("d74401020304")).unwrap();
    assert_eq!(data.into_vec(), vec![1, 2, 3, 4]);

    // Tag 32: URI
    let tagged_uri = Tagged::new(Some(32), "http://www.example.com".to_string());
    let cbor_uri = to_vec(&tagged_uri).unwrap();
    assert_eq!(
        hex_from_bytes(&cbor_uri),
        "d82076687474703a2f2f7777772e6578616d706c652e636f6d"
    );
}

#[test]
fn test_newtype_struct_encoding() {
    use serde::{Deserialize, Serialize};

    // Newtype structs encode as their inner value
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct UserId(u64);

    let user_id = UserId(42);
    let cbor = to_vec(&user_id).unwrap();
    assert_eq!(hex_from_bytes(&cbor), "182a");

    let decoded: UserId = from_slice(&cbor).unwrap();
    assert_eq!(decoded, user_id);
}

#[test]
fn test_tagged_value_encoding() {
    use cbor_codec::tags::Tagged;

    let tagged = Tagged::new(Some(32), "https://example.com".to_string());
    let cbor = to_vec(&tagged).unwrap();

    // Tag 32 uses a one-byte argument, never a two-entry map
    assert_eq!(cbor[0], 0xd8);
    assert_eq!(cbor[1], 0x20);

    let decoded = Tagged::<String>::from_tagged_slice(&cbor).unwrap();
    assert_eq!(decoded.tag, Some(32));
    assert_eq!(decoded.value, "https://example.com");
}

#[test]
fn test_value_roundtrip() {
    let test_cases = vec![
        "00",   // 0
        "01",   // 1
        "20",   // -1
        "f4",   // false
        "f5",   // true
        "f6",   // null
        "6161", // "a"
        "80",   // []
        "a0",   // {}
        "4101", // h'01'
        "fb3ff8000000000000",
    ];

    for hex in test_cases {
        let bytes = hex_to_bytes(hex);
        let value: Value = from_slice(&bytes).unwrap();
        let encoded = to_vec(&value).unwrap();
        assert_eq!(hex_from_bytes(&encoded), hex, "Failed roundtrip for {}", hex);
    }
}

// Helper functions

fn assert_encode_decode<T>(value: T, expected_hex: &str)
where
    T: serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug + PartialEq,
{
    let expected_bytes = hex_to_bytes(expected_hex);

    let encoded = to_vec(&value).unwrap();
    assert_eq!(
        hex_from_bytes(&encoded),
        expected_hex,
        "Encoding mismatch for {:?}",
        value
    );

    let decoded: T = from_slice(&expected_bytes).unwrap();
    assert_eq!(decoded, value, "Decoding mismatch for {}", expected_hex);
}

fn hex_to_bytes(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

fn hex_from_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
