use bytecraft::{
    enumeration::EnumDomain,
    errors::{Error, ErrorKind},
    field::Field,
    record::RecordType,
    scalar::ScalarKind,
    settings::{self, ByteOrder, Endian, Settings},
    validator::{BitSize, Constant, Range},
    value::Value,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn opcode() -> EnumDomain {
    EnumDomain::builder("Opcode")
        .member("a")
        .member("b")
        .member_value("c", 10)
        .member("d")
        .build()
        .unwrap()
}

#[test]
fn test_validator_gating() {
    init();
    let ty = RecordType::builder("FalseValidated")
        .field("member", Field::u16().with_validator(Constant(false)))
        .build()
        .unwrap();

    let strict = Settings::default();
    let lax = strict.with_validate(false);

    for data in [[0u8, 0], [0xFF, 0xFF], [0x12, 0x34]] {
        let err = ty.deserialize_with(&data, &strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(ty.deserialize_with(&data, &lax).is_ok());
    }
}

#[test]
fn test_validation_toggled_by_scope() {
    init();
    let ty = RecordType::builder("FalseValidated")
        .field("member", Field::u8().with_validator(Constant(false)))
        .build()
        .unwrap();

    assert!(ty.deserialize(&[0]).is_err());
    {
        let scope = settings::scope();
        scope.set_validate(false);
        assert!(ty.deserialize(&[0]).is_ok());
        assert!(ty.instantiate().serialize().is_ok());
    }
    assert!(ty.deserialize(&[0]).is_err());
}

#[test]
fn test_range_validated_field() {
    init();
    let inclusive = RecordType::builder("Inclusive")
        .field("v", Field::i8().with_validator(Range::inclusive(-15, 15)))
        .build()
        .unwrap();
    let exclusive = RecordType::builder("Exclusive")
        .field("v", Field::i8().with_validator(Range::exclusive(-15, 15)))
        .build()
        .unwrap();
    let settings = Settings::default();

    for v in [-15i8, 0, 15] {
        assert!(inclusive.deserialize_with(&[v as u8], &settings).is_ok());
    }
    for v in [-16i8, 16] {
        assert!(inclusive.deserialize_with(&[v as u8], &settings).is_err());
    }

    for v in [-14i8, 0, 14] {
        assert!(exclusive.deserialize_with(&[v as u8], &settings).is_ok());
    }
    for v in [-15i8, 15] {
        assert!(exclusive.deserialize_with(&[v as u8], &settings).is_err());
    }
}

#[test]
fn test_bit_size_validated_field() {
    init();
    let ty = RecordType::builder("Ten")
        .field("v", Field::i16().with_validator(BitSize(10)))
        .build()
        .unwrap();
    let settings = Settings::default().with_endian(Endian::Little);

    assert!(ty.deserialize_with(&[0x00, 0x00], &settings).is_ok());
    assert!(ty.deserialize_with(&[0xFF, 0x03], &settings).is_ok());
    assert!(ty.deserialize_with(&[0xFF, 0xFF], &settings).is_err());
    assert!(ty.deserialize_with(&[0x00, 0x04], &settings).is_err());
}

#[test]
fn test_enum_member_byte() {
    init();
    let domain = opcode();
    let ty = RecordType::builder("OneByte")
        .field("opcode", Field::enumeration_with(&domain, ScalarKind::U8))
        .build()
        .unwrap();

    let mut record = ty.instantiate();
    record.set("opcode", domain.member("d").unwrap()).unwrap();
    assert_eq!(record.serialize().unwrap(), vec![0x0B]);

    record.set("opcode", 11).unwrap();
    assert_eq!(record.serialize().unwrap(), vec![0x0B]);

    let parsed = ty.deserialize(&[0x0B]).unwrap();
    assert_eq!(parsed.get("opcode"), Some(&Value::Int(11)));
    assert_eq!(parsed, record);
}

#[test]
fn test_nested_default_override() {
    init();
    let header = RecordType::builder("Header")
        .field("opcode", Field::enumeration(&opcode()))
        .field("length", Field::u16())
        .build()
        .unwrap();
    let message = RecordType::builder("Message")
        .field(
            "header",
            header
                .as_field_with([("opcode", Value::Int(3)), ("length", Value::Int(1024))])
                .unwrap(),
        )
        .field("body", Field::array(2, Field::u8()))
        .build()
        .unwrap();

    let settings = Settings::default().with_endian(Endian::Little);
    let record = message.instantiate();
    assert_eq!(
        record.serialize_with(&settings).unwrap(),
        vec![3, 0, 0, 0, 0x00, 0x04, 0, 0]
    );

    // The override only affects the nested default, not the header type itself.
    assert_eq!(
        header.instantiate().serialize_with(&settings).unwrap(),
        vec![0; 6]
    );
}

#[test]
fn test_array_bounds() {
    init();
    let ty = RecordType::builder("Arrays")
        .field("bytes", Field::array(4, Field::u8()))
        .field("words", Field::array(2, Field::u32()))
        .build()
        .unwrap();
    let mut record = ty.instantiate();

    for i in 0..4 {
        record.set_element("bytes", i, 0xA0 + i as u8).unwrap();
    }
    for i in 0..2 {
        record.set_element("words", i, u32::MAX).unwrap();
    }

    assert_eq!(
        record.set_element("bytes", 4, 0).unwrap_err().kind(),
        ErrorKind::Index
    );
    assert_eq!(
        record.set_element("words", 2, 0).unwrap_err(),
        Error::IndexOutOfBounds { index: 2, len: 2 }
    );

    let data = record
        .serialize_with(&Settings::default().with_endian(Endian::Big))
        .unwrap();
    assert_eq!(data, vec![0xA0, 0xA1, 0xA2, 0xA3, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn test_host_endian_default() {
    init();
    let ty = RecordType::builder("HostEndianStruct")
        .field("value", Field::u32().with_default(0x01020304u32))
        .build()
        .unwrap();

    let expected = match ByteOrder::native() {
        ByteOrder::Big => vec![1, 2, 3, 4],
        ByteOrder::Little => vec![4, 3, 2, 1],
    };
    assert_eq!(ty.instantiate().serialize().unwrap(), expected);
    assert_eq!(
        ty.instantiate()
            .serialize_with(&Settings::default().with_endian(Endian::Target))
            .unwrap(),
        expected
    );
}

#[test]
fn test_settings_priority() {
    init();
    let ty = RecordType::builder("SpecificStruct")
        .field("ambient", Field::u16().with_default(0x0102u16))
        .field("big", Field::u16().with_default(0x0304u16).with_endian(Endian::Big))
        .field(
            "little",
            Field::u16().with_default(0x0506u16).with_endian(Endian::Little),
        )
        .build()
        .unwrap();
    let record = ty.instantiate();

    let scope = settings::scope();
    scope.set_endian(Endian::Little);
    assert_eq!(record.serialize().unwrap(), vec![2, 1, 3, 4, 6, 5]);

    // Per-call settings win over the context; field overrides win over both.
    let call = Settings::default().with_endian(Endian::Big);
    assert_eq!(record.serialize_with(&call).unwrap(), vec![1, 2, 3, 4, 6, 5]);

    scope.set_endian(Endian::Big);
    assert_eq!(record.serialize().unwrap(), vec![1, 2, 3, 4, 6, 5]);
}

#[test]
fn test_scope_restored_after_error() {
    init();
    let ty = RecordType::builder("R")
        .field("v", Field::u8())
        .build()
        .unwrap();

    let before = settings::current();
    let run = || -> Result<(), Error> {
        let scope = settings::scope();
        scope.set_endian(Endian::Big);
        ty.deserialize(&[0, 0])?;
        Ok(())
    };

    assert_eq!(run().unwrap_err().kind(), ErrorKind::Decoding);
    assert_eq!(settings::current(), before);
}

#[test]
fn test_complicated_round_trip() {
    init();
    let small = RecordType::builder("SmallStruct")
        .field("only_element", Field::u8())
        .build()
        .unwrap();
    let simple = RecordType::builder("SimpleStruct")
        .field("b", Field::u8().with_default(0xDEu8))
        .field("a", Field::u16().with_default(0xCAFEu16))
        .field("x", Field::u8().with_default(0xADu8))
        .build()
        .unwrap();
    let complicated = RecordType::builder("ComplicatedStruct")
        .field("other_struct", small.as_field())
        .field("some_field", Field::array(3, simple.as_field()))
        .field("numeric", Field::u32())
        .field("ratio", Field::f32())
        .field("_pad", Field::pad(2))
        .build()
        .unwrap();

    let mut record = complicated.instantiate();
    record.record_mut("other_struct").unwrap().set("only_element", 7).unwrap();
    record.set("numeric", 0xAEAEAEAEu32).unwrap();
    record.set("ratio", 0.5f32).unwrap();

    let settings = Settings::default().with_endian(Endian::Little);
    let data = record.serialize_with(&settings).unwrap();
    assert_eq!(data.len(), complicated.size());
    assert_eq!(&data[..5], &[0x07, 0xDE, 0xFE, 0xCA, 0xAD]);

    let parsed = complicated.deserialize_with(&data, &settings).unwrap();
    assert_eq!(parsed, record);
    assert_eq!(parsed.get("ratio"), Some(&Value::Float(0.5)));
}

#[test]
fn test_sequence_hook_and_type_endian() {
    init();
    let packet = RecordType::builder("Packet")
        .endian(Endian::Big)
        .field("sequence", Field::u16())
        .field("payload", Field::array(2, Field::u8().with_validator(Range::inclusive(0, 9))))
        .before_serialize(|record| {
            if let Some(Value::Int(n)) = record.get_mut("sequence") {
                *n += 1;
            }
        })
        .build()
        .unwrap();

    let scope = settings::scope();
    scope.set_endian(Endian::Little);

    let mut record = packet.instantiate();
    assert_eq!(record.serialize_mut().unwrap(), vec![0, 1, 0, 0]);
    assert_eq!(record.serialize_mut().unwrap(), vec![0, 2, 0, 0]);

    scope.set_dry_run(true);
    assert_eq!(record.serialize_mut().unwrap(), vec![0, 2, 0, 0]);

    record.set_element("payload", 1, 10).unwrap();
    assert_eq!(record.validate().unwrap_err().kind(), ErrorKind::Validation);
}
