use muon::prelude::*;

fn roundtrip(value: &Value) -> Value {
    roundtrip_with(value, &WriteOptions::default())
}

fn roundtrip_with(value: &Value, options: &WriteOptions) -> Value {
    let mut bytes = Vec::new();
    write_value(&mut bytes, value, options).unwrap();
    read_value(Cursor::new(bytes.as_slice())).unwrap()
}

fn doc_value() -> Value {
    let row = |id: i64, name: &str| {
        Value::Dict(Map::from_iter([
            ("identifier".to_string(), Value::from(id)),
            ("display_name".to_string(), Value::from(name)),
            ("enabled".to_string(), Value::Bool(id % 2 == 0)),
            ("weight".to_string(), Value::F64(id as f64 * 0.25)),
            ("annotations".to_string(), Value::Null),
        ]))
    };
    Value::Dict(Map::from_iter([
        (
            "records".to_string(),
            Value::List((0..24).map(|i| row(i, "shared-display-name")).collect()),
        ),
        (
            "samples".to_string(),
            Value::Array(TypedArray::U16(vec![0, 1, 512, 65535])),
        ),
        ("schema_version".to_string(), Value::Int(3)),
    ]))
}

#[test]
fn empty_dict_wire_bytes() {
    let mut bytes = Vec::new();
    let written = write_value(
        &mut bytes,
        &Value::Dict(Map::default()),
        &WriteOptions::default(),
    )
    .unwrap();
    assert_eq!(bytes, vec![0x8F, 0xB5, 0x30, 0x31, 0x92, 0x93]);
    assert_eq!(written, bytes.len());
    assert_eq!(
        read_value(Cursor::new(bytes.as_slice())).unwrap(),
        Value::Dict(Map::default())
    );
}

#[test]
fn small_int_list_wire_bytes() {
    let value = Value::List(vec![
        Value::Int(0),
        Value::Int(5),
        Value::Int(9),
        Value::Int(10),
    ]);
    let mut bytes = Vec::new();
    Writer::new(&mut bytes).add(&value).unwrap();
    assert_eq!(bytes, vec![0x90, 0xA0, 0xA5, 0xA9, 0xB4, 0x0A, 0x91]);
    assert_eq!(
        Reader::new(Cursor::new(bytes.as_slice())).read_object().unwrap(),
        value
    );
}

#[test]
fn string_wire_bytes() {
    let mut bytes = Vec::new();
    Writer::new(&mut bytes).add(&Value::from("ab")).unwrap();
    assert_eq!(bytes, vec![0x61, 0x62, 0x00]);

    let mut bytes = Vec::new();
    Writer::new(&mut bytes).add(&Value::from("ab\0c")).unwrap();
    assert_eq!(bytes, vec![0x82, 0x04, 0x61, 0x62, 0x00, 0x63]);
    assert_eq!(
        Reader::new(Cursor::new(bytes.as_slice())).read_object().unwrap(),
        Value::from("ab\0c")
    );
}

#[test]
fn backreference_soundness_through_the_preamble() {
    let mut bytes = Vec::new();
    let mut writer = Writer::new(&mut bytes);
    let preamble = writer.add_lru_list(&["hello".to_string()]).unwrap();
    writer.add(&Value::from("hello")).unwrap();
    drop(writer);
    assert_eq!(&bytes[preamble..], &[0x81, 0x00]);
    assert_eq!(
        Reader::new(Cursor::new(bytes.as_slice())).read_object().unwrap(),
        Value::from("hello")
    );
}

#[test]
fn typed_array_wire_bytes() {
    let value = Value::Array(TypedArray::U8(vec![1, 2, 3]));
    let mut bytes = Vec::new();
    Writer::new(&mut bytes).add(&value).unwrap();
    assert_eq!(bytes, vec![0x84, 0xB4, 0x03, 0x01, 0x02, 0x03]);
    assert_eq!(
        Reader::new(Cursor::new(bytes.as_slice())).read_object().unwrap(),
        value
    );
}

#[test]
fn chunked_typed_array_roundtrip() {
    let mut bytes = Vec::new();
    Writer::new(&mut bytes)
        .add_chunked(&[TypedArray::U8(vec![1, 2, 3]), TypedArray::U8(vec![4, 5])])
        .unwrap();
    assert_eq!(
        bytes,
        vec![0x85, 0xB4, 0x03, 0x01, 0x02, 0x03, 0x02, 0x04, 0x05, 0x00]
    );
    assert_eq!(
        Reader::new(Cursor::new(bytes.as_slice())).read_object().unwrap(),
        Value::Array(TypedArray::U8(vec![1, 2, 3, 4, 5]))
    );
}

#[test]
fn nan_encodes_to_its_own_tag() {
    let mut bytes = Vec::new();
    Writer::new(&mut bytes).add(&Value::F64(f64::NAN)).unwrap();
    assert_eq!(bytes, vec![0xAD]);
    match Reader::new(Cursor::new(&[0xADu8][..])).read_object().unwrap() {
        Value::F64(f) => assert!(f.is_nan()),
        other => panic!("unexpected value: {other:?}"),
    }
}

#[test]
fn padding_is_transparent_before_any_top_level_value() {
    let value = doc_value();
    let mut bytes = Vec::new();
    write_value(&mut bytes, &value, &WriteOptions::default()).unwrap();
    for pad in [1, 3, 17] {
        let mut padded = vec![0xFF; pad];
        padded.extend_from_slice(&bytes);
        assert_eq!(
            read_value(Cursor::new(padded.as_slice())).unwrap(),
            value,
            "with {pad} padding bytes"
        );
    }
}

#[test]
fn document_roundtrip_with_dynamic_staging() {
    let value = doc_value();
    let mut bytes = Vec::new();
    write_value(&mut bytes, &value, &WriteOptions::default()).unwrap();
    // repeated keys land in the dynamic table, so each is written once and
    // back-referenced ~23 times
    let needle: &[u8] = b"display_name";
    let occurrences = bytes.windows(needle.len()).filter(|w| *w == needle).count();
    assert_eq!(occurrences, 1);
    assert_eq!(read_value(Cursor::new(bytes.as_slice())).unwrap(), value);
}

#[test]
fn document_roundtrip_with_static_preamble() {
    // more than 128 worth-coding strings forces the preamble path
    let items: Vec<Value> = (0..200)
        .flat_map(|i| {
            let s = format!("entry-number-{i:04}");
            [Value::Str(s.clone()), Value::Str(s)]
        })
        .collect();
    let value = Value::List(items);
    let mut bytes = Vec::new();
    write_value(&mut bytes, &value, &WriteOptions::default()).unwrap();
    assert_eq!(bytes[4], 0x8C);
    assert_eq!(bytes[5], 0x90);
    assert_eq!(read_value(Cursor::new(bytes.as_slice())).unwrap(), value);
}

#[test]
fn explicit_static_dict_is_honored() {
    let options = WriteOptions {
        static_dict: Some(vec!["alpha".to_string(), "beta".to_string()]),
        ..WriteOptions::default()
    };
    let value = Value::List(vec![
        Value::from("alpha"),
        Value::from("beta"),
        Value::from("alpha"),
    ]);
    assert_eq!(roundtrip_with(&value, &options), value);
}

#[test]
fn scalar_values_roundtrip() {
    for v in [
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Int(0),
        Value::Int(9),
        Value::Int(10),
        Value::Int(-1),
        Value::Int(127),
        Value::Int(128),
        Value::Int(-128),
        Value::Int(-129),
        Value::Int(0x7FFF),
        Value::Int(0x8000),
        Value::Int(1_000_000),
        Value::Int(i64::MAX as i128),
        Value::Int(i64::MIN as i128),
        Value::Int(u64::MAX as i128),
        Value::Int(u64::MAX as i128 + 1),
        Value::Int(i128::MAX),
        Value::Int(i128::MIN),
        Value::F64(0.0),
        Value::F64(-0.0),
        Value::F64(1.5),
        Value::F64(f64::MIN),
        Value::F64(f64::MAX),
        Value::F32(core::f32::consts::E),
        Value::F16(half::f16::from_f64(0.5)),
        Value::Str(String::new()),
        Value::from("solo"),
    ] {
        assert_eq!(roundtrip(&v), v, "for {v:?}");
    }
}

#[test]
fn float_roundtrip_is_bit_identical() {
    use rand::RngExt;
    let mut rng = rand::rng();
    let mut checked = 0;
    while checked < 1000 {
        let f = f64::from_bits(rng.random::<u64>());
        if f.is_nan() {
            continue;
        }
        let Value::F64(back) = roundtrip(&Value::F64(f)) else {
            panic!("float width changed");
        };
        assert_eq!(back.to_bits(), f.to_bits());
        checked += 1;
    }
}

#[test]
fn int_roundtrip_range() {
    use rayon::prelude::*;
    (-70_000i64..=70_000).into_par_iter().for_each(|v| {
        let value = Value::Int(i128::from(v));
        let mut bytes = Vec::new();
        Writer::new(&mut bytes).add(&value).unwrap();
        let got = Reader::new(Cursor::new(bytes.as_slice()))
            .read_object()
            .unwrap();
        assert_eq!(got, value);
    });
}

#[test]
fn typed_arrays_of_every_element_type_roundtrip() {
    let arrays = [
        TypedArray::I8(vec![i8::MIN, -1, 0, 1, i8::MAX]),
        TypedArray::I16(vec![i16::MIN, -1, 0, 1, i16::MAX]),
        TypedArray::I32(vec![i32::MIN, -1, 0, 1, i32::MAX]),
        TypedArray::I64(vec![i64::MIN, -1, 0, 1, i64::MAX]),
        TypedArray::U8(vec![0, 1, u8::MAX]),
        TypedArray::U16(vec![0, 1, u16::MAX]),
        TypedArray::U32(vec![0, 1, u32::MAX]),
        TypedArray::U64(vec![0, 1, u64::MAX]),
        TypedArray::F16(vec![half::f16::from_f64(0.5), half::f16::from_f64(-2.0)]),
        TypedArray::F32(vec![0.0, -1.5, f32::MAX]),
        TypedArray::F64(vec![0.0, -1.5, f64::MAX]),
        TypedArray::Varint(vec![0, -1, 63, 64, i128::MIN, i128::MAX]),
    ];
    for arr in arrays {
        let value = Value::Array(arr);
        assert_eq!(roundtrip(&value), value, "for {value:?}");
    }
}

#[test]
fn i32_array_width_is_four_bytes() {
    let value = Value::Array(TypedArray::I32(vec![1]));
    let mut bytes = Vec::new();
    Writer::new(&mut bytes).add(&value).unwrap();
    assert_eq!(bytes, vec![0x84, 0xB2, 0x01, 0x01, 0x00, 0x00, 0x00]);
    let value = Value::Array(TypedArray::U32(vec![1]));
    let mut bytes = Vec::new();
    Writer::new(&mut bytes).add(&value).unwrap();
    assert_eq!(bytes, vec![0x84, 0xB6, 0x01, 0x01, 0x00, 0x00, 0x00]);
}

#[test]
fn wide_integer_survives_decode_and_reencode() {
    // 1 << 133
    let mut sleb = vec![0x80u8; 19];
    sleb.push(0x01);
    let mut bytes = vec![0xBB];
    bytes.extend_from_slice(&sleb);

    let value = read_value(Cursor::new(bytes.as_slice())).unwrap();
    let Value::Wide(ref wide) = value else {
        panic!("expected a wide integer, got {value:?}");
    };
    assert_eq!(wide.as_sleb128(), &sleb[..]);
    assert_eq!(wide.try_to_i128(), None);

    let mut reencoded = Vec::new();
    Writer::new(&mut reencoded).add(&value).unwrap();
    assert_eq!(reencoded, bytes);
}

#[test]
fn dict_key_order_survives_roundtrip() {
    let value = Value::Dict(Map::from_iter([
        ("zeta".to_string(), Value::Int(1)),
        ("alpha".to_string(), Value::Int(2)),
        ("mid".to_string(), Value::Int(3)),
    ]));
    let Value::Dict(back) = roundtrip(&value) else {
        panic!("dict did not come back as a dict");
    };
    let keys: Vec<&str> = back.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn long_string_uses_sized_form_and_roundtrips() {
    let value = Value::Str("y".repeat(4097));
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn arrays_lower_to_lists_when_detection_is_off() {
    let options = WriteOptions {
        detect_arrays: false,
        ..WriteOptions::default()
    };
    let value = Value::Array(TypedArray::U8(vec![1, 2, 3]));
    assert_eq!(
        roundtrip_with(&value, &options),
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn deeply_nested_structure_roundtrips() {
    let mut value = Value::Int(1);
    for _ in 0..64 {
        value = Value::List(vec![value]);
    }
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn window_saturation_keeps_both_sides_in_lockstep() {
    // 600 candidates overflow the 512-entry staging window: the overflow
    // stays literal on every use, the rest promote and back-reference, and
    // the reader tracks the same window state throughout
    let items: Vec<Value> = (0..600)
        .flat_map(|i| {
            let s = format!("window-entry-{i:04}");
            [Value::Str(s.clone()), Value::Str(s)]
        })
        .chain((0..600).map(|i| Value::Str(format!("window-entry-{i:04}"))))
        .collect();
    let value = Value::List(items);
    let mut bytes = Vec::new();
    let mut writer = Writer::new(&mut bytes);
    writer.tag_muon().unwrap();
    writer.add_lru_dynamic(
        &(0..600)
            .map(|i| format!("window-entry-{i:04}"))
            .collect::<Vec<_>>(),
    );
    writer.add(&value).unwrap();
    drop(writer);
    assert_eq!(read_value(Cursor::new(bytes.as_slice())).unwrap(), value);
}

#[test]
fn build_static_dict_scores_repeats_only() {
    let value = Value::List(vec![
        Value::from("repeated-key"),
        Value::from("repeated-key"),
        Value::from("once"),
    ]);
    let dict = build_static_dict(&value, 512);
    assert_eq!(dict, vec!["repeated-key".to_string()]);
}
