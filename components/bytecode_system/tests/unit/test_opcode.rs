//! Tests for InsCode and InsType

use bytecode_system::{InsCode, InsType};
use core_types::ValueType;

#[test]
fn test_member_access_codes() {
    assert!(InsCode::GetProperty.is_member_access());
    assert!(InsCode::InvokeMethod.is_member_access());
    assert!(InsCode::AttachEvent.is_member_access());
    assert!(InsCode::DetachEvent.is_member_access());
    assert!(!InsCode::Invoke.is_member_access());
    assert!(!InsCode::InvokeProxy.is_member_access());
}

#[test]
fn test_label_codes() {
    assert!(InsCode::Jump.has_label());
    assert!(InsCode::JumpIf.has_label());
    assert!(InsCode::InstallTry.has_label());
    assert!(!InsCode::UninstallTry.has_label());
}

#[test]
fn test_every_concrete_ins_type_has_a_value_type() {
    let types = [
        (InsType::Bool, ValueType::Bool),
        (InsType::I1, ValueType::I8),
        (InsType::I2, ValueType::I16),
        (InsType::I4, ValueType::I32),
        (InsType::I8, ValueType::I64),
        (InsType::U1, ValueType::U8),
        (InsType::U2, ValueType::U16),
        (InsType::U4, ValueType::U32),
        (InsType::U8, ValueType::U64),
        (InsType::F4, ValueType::F32),
        (InsType::F8, ValueType::F64),
        (InsType::String, ValueType::String),
    ];
    for (ins_type, value_type) in types {
        assert_eq!(ins_type.value_type(), Some(value_type));
    }
}

#[test]
fn test_ins_type_serde() {
    let json = serde_json::to_string(&InsType::U4).unwrap();
    assert_eq!(json, "\"U4\"");
    let restored: InsType = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, InsType::U4);
}
