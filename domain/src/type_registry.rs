//! Runtime type identity for the public enumerations.
//!
//! Binding generators and other tooling look types up by a stable name and
//! enumerate their values without relying on Rust type information.

use crate::memory_format::MemoryFormat;
use crate::memory_format_selection::MemoryFormatSelection;
use crate::sandbox::SandboxSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Exactly one value at a time
    Enum,
    /// Values are bits that combine
    Flags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub value: i64,
    pub name: &'static str,
    pub nick: &'static str,
}

impl EnumValue {
    const fn new(value: i64, name: &'static str, nick: &'static str) -> Self {
        Self { value, name, nick }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: &'static str,
    pub kind: TypeKind,
    pub values: &'static [EnumValue],
}

impl TypeInfo {
    #[must_use]
    pub fn value(&self, value: i64) -> Option<&'static EnumValue> {
        self.values.iter().find(|v| v.value == value)
    }

    #[must_use]
    pub fn value_by_nick(&self, nick: &str) -> Option<&'static EnumValue> {
        self.values.iter().find(|v| v.nick == nick)
    }

    /// Splits a flags value into its registered members.
    #[must_use]
    pub fn flags(&self, bits: i64) -> Vec<&'static EnumValue> {
        self.values
            .iter()
            .filter(|v| v.value != 0 && bits & v.value == v.value)
            .collect()
    }
}

pub trait RegisteredType {
    const TYPE_INFO: &'static TypeInfo;

    fn type_name() -> &'static str {
        Self::TYPE_INFO.name
    }

    fn type_info() -> &'static TypeInfo {
        Self::TYPE_INFO
    }
}

static SANDBOX_SELECTOR_VALUES: [EnumValue; 4] = [
    EnumValue::new(0, "GLY_SANDBOX_SELECTOR_AUTO", "auto"),
    EnumValue::new(1, "GLY_SANDBOX_SELECTOR_BWRAP", "bwrap"),
    EnumValue::new(2, "GLY_SANDBOX_SELECTOR_FLATPAK_SPAWN", "flatpak-spawn"),
    EnumValue::new(3, "GLY_SANDBOX_SELECTOR_NOT_SANDBOXED", "not-sandboxed"),
];

static MEMORY_FORMAT_VALUES: [EnumValue; 23] = [
    EnumValue::new(0, "GLY_MEMORY_FORMAT_B8G8R8A8_PREMULTIPLIED", "b8g8r8a8_premultiplied"),
    EnumValue::new(1, "GLY_MEMORY_FORMAT_A8R8G8B8_PREMULTIPLIED", "a8r8g8b8_premultiplied"),
    EnumValue::new(2, "GLY_MEMORY_FORMAT_R8G8B8A8_PREMULTIPLIED", "r8g8b8a8_premultiplied"),
    EnumValue::new(3, "GLY_MEMORY_FORMAT_B8G8R8A8", "b8g8r8a8"),
    EnumValue::new(4, "GLY_MEMORY_FORMAT_A8R8G8B8", "a8r8g8b8"),
    EnumValue::new(5, "GLY_MEMORY_FORMAT_R8G8B8A8", "r8g8b8a8"),
    EnumValue::new(6, "GLY_MEMORY_FORMAT_A8B8G8R8", "a8b8g8r8"),
    EnumValue::new(7, "GLY_MEMORY_FORMAT_R8G8B8", "r8g8b8"),
    EnumValue::new(8, "GLY_MEMORY_FORMAT_B8G8R8", "b8g8r8"),
    EnumValue::new(9, "GLY_MEMORY_FORMAT_R16G16B16", "r16g16b16"),
    EnumValue::new(10, "GLY_MEMORY_FORMAT_R16G16B16A16_PREMULTIPLIED", "r16g16b16a16_premultiplied"),
    EnumValue::new(11, "GLY_MEMORY_FORMAT_R16G16B16A16", "r16g16b16a16"),
    EnumValue::new(12, "GLY_MEMORY_FORMAT_R16G16B16_FLOAT", "r16g16b16_float"),
    EnumValue::new(13, "GLY_MEMORY_FORMAT_R16G16B16A16_FLOAT", "r16g16b16a16_float"),
    EnumValue::new(14, "GLY_MEMORY_FORMAT_R32G32B32_FLOAT", "r32g32b32_float"),
    EnumValue::new(15, "GLY_MEMORY_FORMAT_R32G32B32A32_FLOAT_PREMULTIPLIED", "r32g32b32a32_float_premultiplied"),
    EnumValue::new(16, "GLY_MEMORY_FORMAT_R32G32B32A32_FLOAT", "r32g32b32a32_float"),
    EnumValue::new(17, "GLY_MEMORY_FORMAT_G8A8_PREMULTIPLIED", "g8a8_premultiplied"),
    EnumValue::new(18, "GLY_MEMORY_FORMAT_G8A8", "g8a8"),
    EnumValue::new(19, "GLY_MEMORY_FORMAT_G8", "g8"),
    EnumValue::new(20, "GLY_MEMORY_FORMAT_G16A16_PREMULTIPLIED", "g16a16_premultiplied"),
    EnumValue::new(21, "GLY_MEMORY_FORMAT_G16A16", "g16a16"),
    EnumValue::new(22, "GLY_MEMORY_FORMAT_G16", "g16"),
];

static MEMORY_FORMAT_SELECTION_VALUES: [EnumValue; 23] = [
    EnumValue::new(1 << 0, "GLY_MEMORY_FORMAT_SELECTION_B8G8R8A8_PREMULTIPLIED", "b8g8r8a8_premultiplied"),
    EnumValue::new(1 << 1, "GLY_MEMORY_FORMAT_SELECTION_A8R8G8B8_PREMULTIPLIED", "a8r8g8b8_premultiplied"),
    EnumValue::new(1 << 2, "GLY_MEMORY_FORMAT_SELECTION_R8G8B8A8_PREMULTIPLIED", "r8g8b8a8_premultiplied"),
    EnumValue::new(1 << 3, "GLY_MEMORY_FORMAT_SELECTION_B8G8R8A8", "b8g8r8a8"),
    EnumValue::new(1 << 4, "GLY_MEMORY_FORMAT_SELECTION_A8R8G8B8", "a8r8g8b8"),
    EnumValue::new(1 << 5, "GLY_MEMORY_FORMAT_SELECTION_R8G8B8A8", "r8g8b8a8"),
    EnumValue::new(1 << 6, "GLY_MEMORY_FORMAT_SELECTION_A8B8G8R8", "a8b8g8r8"),
    EnumValue::new(1 << 7, "GLY_MEMORY_FORMAT_SELECTION_R8G8B8", "r8g8b8"),
    EnumValue::new(1 << 8, "GLY_MEMORY_FORMAT_SELECTION_B8G8R8", "b8g8r8"),
    EnumValue::new(1 << 9, "GLY_MEMORY_FORMAT_SELECTION_R16G16B16", "r16g16b16"),
    EnumValue::new(1 << 10, "GLY_MEMORY_FORMAT_SELECTION_R16G16B16A16_PREMULTIPLIED", "r16g16b16a16_premultiplied"),
    EnumValue::new(1 << 11, "GLY_MEMORY_FORMAT_SELECTION_R16G16B16A16", "r16g16b16a16"),
    EnumValue::new(1 << 12, "GLY_MEMORY_FORMAT_SELECTION_R16G16B16_FLOAT", "r16g16b16_float"),
    EnumValue::new(1 << 13, "GLY_MEMORY_FORMAT_SELECTION_R16G16B16A16_FLOAT", "r16g16b16a16_float"),
    EnumValue::new(1 << 14, "GLY_MEMORY_FORMAT_SELECTION_R32G32B32_FLOAT", "r32g32b32_float"),
    EnumValue::new(1 << 15, "GLY_MEMORY_FORMAT_SELECTION_R32G32B32A32_FLOAT_PREMULTIPLIED", "r32g32b32a32_float_premultiplied"),
    EnumValue::new(1 << 16, "GLY_MEMORY_FORMAT_SELECTION_R32G32B32A32_FLOAT", "r32g32b32a32_float"),
    EnumValue::new(1 << 17, "GLY_MEMORY_FORMAT_SELECTION_G8A8_PREMULTIPLIED", "g8a8_premultiplied"),
    EnumValue::new(1 << 18, "GLY_MEMORY_FORMAT_SELECTION_G8A8", "g8a8"),
    EnumValue::new(1 << 19, "GLY_MEMORY_FORMAT_SELECTION_G8", "g8"),
    EnumValue::new(1 << 20, "GLY_MEMORY_FORMAT_SELECTION_G16A16_PREMULTIPLIED", "g16a16_premultiplied"),
    EnumValue::new(1 << 21, "GLY_MEMORY_FORMAT_SELECTION_G16A16", "g16a16"),
    EnumValue::new(1 << 22, "GLY_MEMORY_FORMAT_SELECTION_G16", "g16"),
];

static SANDBOX_SELECTOR_TYPE: TypeInfo = TypeInfo {
    name: "GlySandboxSelector",
    kind: TypeKind::Enum,
    values: &SANDBOX_SELECTOR_VALUES,
};

static MEMORY_FORMAT_TYPE: TypeInfo = TypeInfo {
    name: "GlyMemoryFormat",
    kind: TypeKind::Enum,
    values: &MEMORY_FORMAT_VALUES,
};

static MEMORY_FORMAT_SELECTION_TYPE: TypeInfo = TypeInfo {
    name: "GlyMemoryFormatSelection",
    kind: TypeKind::Flags,
    values: &MEMORY_FORMAT_SELECTION_VALUES,
};

static REGISTRY: [&TypeInfo; 3] = [
    &SANDBOX_SELECTOR_TYPE,
    &MEMORY_FORMAT_TYPE,
    &MEMORY_FORMAT_SELECTION_TYPE,
];

impl RegisteredType for SandboxSelector {
    const TYPE_INFO: &'static TypeInfo = &SANDBOX_SELECTOR_TYPE;
}

impl RegisteredType for MemoryFormat {
    const TYPE_INFO: &'static TypeInfo = &MEMORY_FORMAT_TYPE;
}

impl RegisteredType for MemoryFormatSelection {
    const TYPE_INFO: &'static TypeInfo = &MEMORY_FORMAT_SELECTION_TYPE;
}

#[must_use]
pub fn registered_types() -> &'static [&'static TypeInfo] {
    &REGISTRY
}

#[must_use]
pub fn lookup_type(name: &str) -> Option<&'static TypeInfo> {
    REGISTRY.iter().copied().find(|info| info.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_type_names() {
        assert_eq!(SandboxSelector::type_name(), "GlySandboxSelector");
        assert_eq!(MemoryFormat::type_name(), "GlyMemoryFormat");
        assert_eq!(MemoryFormatSelection::type_name(), "GlyMemoryFormatSelection");
    }

    #[test]
    fn lookup_by_name() {
        let info = lookup_type("GlyMemoryFormatSelection").unwrap();
        assert_eq!(info.kind, TypeKind::Flags);
        assert!(lookup_type("GlyLoader").is_none());
        assert_eq!(registered_types().len(), 3);
    }

    #[test]
    fn tables_agree_with_enums() {
        for format in MemoryFormat::ALL {
            let entry = MemoryFormat::type_info().value(i64::from(format.value())).unwrap();
            assert_eq!(entry.nick, format.nick());

            let flag = MemoryFormatSelection::type_info()
                .value(i64::from(MemoryFormatSelection::of(format).bits()))
                .unwrap();
            assert_eq!(flag.nick, entry.nick);
        }

        for selector in SandboxSelector::ALL {
            let entry = SandboxSelector::type_info().value(i64::from(selector.value())).unwrap();
            assert_eq!(entry.nick, selector.nick());
        }
    }

    #[test]
    fn nicks_round_trip_through_the_registry() {
        for format in MemoryFormat::ALL {
            let entry = MemoryFormat::type_info().value_by_nick(format.nick()).unwrap();
            assert_eq!(MemoryFormat::from_value(i32::try_from(entry.value).unwrap()), Ok(format));
            assert_eq!(entry.nick.parse::<MemoryFormat>(), Ok(format));
        }

        let entry = MemoryFormatSelection::type_info()
            .value_by_nick("r8g8b8a8_premultiplied")
            .unwrap();
        assert_eq!(
            i64::from(MemoryFormatSelection::R8G8B8A8_PREMULTIPLIED.bits()),
            entry.value
        );
    }

    #[test]
    fn splits_flag_values() {
        let selection = MemoryFormatSelection::G8 | MemoryFormatSelection::R8G8B8;
        let members = MemoryFormatSelection::type_info().flags(i64::from(selection.bits()));
        let nicks: Vec<&str> = members.iter().map(|v| v.nick).collect();
        assert_eq!(nicks, vec!["r8g8b8", "g8"]);
    }
}
