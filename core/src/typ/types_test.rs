#[cfg(test)]
mod tests {
    use crate::typ::{ConstError, Kind, NumericClass, NumericHierarchy, RType, UntypedConst, UntypedKind, convert_typed};
    use crate::val::{Complex, Value};

    #[test]
    fn test_predeclared_aliases() {
        assert_eq!(RType::predeclared("byte"), Some(RType::Uint8));
        assert_eq!(RType::predeclared("rune"), Some(RType::Int32));
        assert_eq!(RType::predeclared("float64"), Some(RType::Float64));
        assert_eq!(RType::predeclared("Int"), None);
    }

    #[test]
    fn test_type_display() {
        let ty = RType::map(RType::String, RType::slice(RType::pointer(RType::array(3, RType::Int))));
        assert_eq!(ty.to_string(), "map[string][]*[3]int");
        assert_eq!(RType::Untyped(UntypedKind::Rune).to_string(), "untyped rune");
        assert_eq!(RType::func(vec![RType::Int, RType::String], RType::Bool).to_string(), "func(int, string) bool");
    }

    #[test]
    fn test_elem_and_key() {
        let m = RType::map(RType::Int, RType::Bool);
        assert_eq!(m.key(), Some(&RType::Int));
        assert_eq!(m.elem(), Some(&RType::Bool));
        assert_eq!(RType::pointer(RType::String).elem(), Some(&RType::String));
        assert_eq!(RType::String.elem(), None);
    }

    #[test]
    fn test_comparable() {
        assert!(RType::array(2, RType::Float64).is_comparable());
        assert!(RType::pointer(RType::slice(RType::Int)).is_comparable());
        assert!(!RType::slice(RType::Int).is_comparable());
        assert!(!RType::array(1, RType::map(RType::Int, RType::Int)).is_comparable());
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(RType::Uint16.zero(), Value::Uint16(0));
        assert_eq!(RType::String.zero(), Value::string(""));
        assert_eq!(RType::array(2, RType::Bool).zero(), Value::array(vec![Value::Bool(false); 2]));
        assert_eq!(RType::map(RType::Int, RType::Int).zero(), Value::Map(None));
        assert_eq!(RType::Complex64.zero(), Value::Complex64(Complex::default()));
    }

    #[test]
    fn test_kind_classes() {
        assert!(Kind::Uintptr.is_unsigned());
        assert!(Kind::Int.is_signed());
        assert!(!Kind::Float32.is_integer());
        assert!(Kind::Complex128.is_numeric());
        assert_eq!(RType::pointer(RType::Int).kind().name(), "ptr");
    }

    #[test]
    fn test_int_ranges() {
        assert_eq!(Value::from_integer(Kind::Int8, -128), Some(Value::Int8(-128)));
        assert_eq!(Value::from_integer(Kind::Int8, 128), None);
        assert_eq!(Value::from_integer(Kind::Uint32, -1), None);
        assert_eq!(NumericHierarchy::classify(Kind::Uintptr), Some(NumericClass::Integer));
        assert_eq!(NumericHierarchy::classify(Kind::String), None);
        assert_eq!(NumericHierarchy::integral(2.0), Some(2));
        assert_eq!(NumericHierarchy::integral(2.5), None);
    }

    #[test]
    fn test_untyped_defaults() {
        assert_eq!(UntypedConst::int(5).default_value(), Ok(Value::Int(5)));
        assert_eq!(UntypedConst::rune('a').default_value(), Ok(Value::Int32(97)));
        assert_eq!(UntypedConst::float(0.5).default_value(), Ok(Value::Float64(0.5)));
        assert_eq!(UntypedConst::string("s").default_type(), RType::String);
        assert_eq!(
            UntypedConst::complex(0.0, 1.0).default_value(),
            Ok(Value::Complex128(Complex::new(0.0, 1.0)))
        );
    }

    #[test]
    fn test_untyped_convert() {
        assert_eq!(UntypedConst::int(200).convert(&RType::Uint8), Ok(Value::Uint8(200)));
        assert_eq!(UntypedConst::float(3.0).convert(&RType::Int), Ok(Value::Int(3)));
        assert_eq!(UntypedConst::int(3).convert(&RType::Float32), Ok(Value::Float32(3.0)));

        let err = UntypedConst::int(256).convert(&RType::Uint8).unwrap_err();
        assert_eq!(err.to_string(), "constant 256 overflows uint8");
        let err = UntypedConst::float(1.5).convert(&RType::Int).unwrap_err();
        assert_eq!(err.to_string(), "constant 1.5 truncated to integer");
        let err = UntypedConst::string("x").convert(&RType::Int).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert \"x\" (untyped string constant) to int");
        assert!(UntypedConst::bool(true).convert(&RType::String).is_err());
    }

    #[test]
    fn test_untyped_negate() {
        assert_eq!(UntypedConst::int(3).negate(), Some(UntypedConst::int(-3)));
        assert_eq!(UntypedConst::string("x").negate(), None);
    }

    #[test]
    fn test_from_value_roundtrip() {
        let c = UntypedConst::from_value(UntypedKind::Int, &Value::Int(20));
        assert_eq!(c, Some(UntypedConst::int(20)));
        assert_eq!(UntypedConst::from_value(UntypedKind::String, &Value::Int(1)), None);
    }

    #[test]
    fn test_convert_typed() {
        assert_eq!(convert_typed(&Value::Uint8(7), &RType::Uint8, &RType::Int), Ok(Value::Int(7)));
        assert_eq!(
            convert_typed(&Value::Int(300), &RType::Int, &RType::Uint8),
            Err(ConstError::new("constant 300 overflows uint8".to_string()))
        );
        assert!(convert_typed(&Value::string("a"), &RType::String, &RType::Int).is_err());
    }
}
