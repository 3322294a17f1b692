use quill_core::ConstValue;

use crate::error::{Error, Result};
use crate::reader::Reader;

#[derive(Debug, Clone)]
pub enum CpInfo {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl CpInfo {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String { .. } => "String",
            CpInfo::Fieldref { .. } => "Fieldref",
            CpInfo::Methodref { .. } => "Methodref",
            CpInfo::InterfaceMethodref { .. } => "InterfaceMethodref",
            CpInfo::NameAndType { .. } => "NameAndType",
            CpInfo::MethodHandle { .. } => "MethodHandle",
            CpInfo::MethodType { .. } => "MethodType",
            CpInfo::Dynamic { .. } => "Dynamic",
            CpInfo::InvokeDynamic { .. } => "InvokeDynamic",
            CpInfo::Module { .. } => "Module",
            CpInfo::Package { .. } => "Package",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<Option<CpInfo>>,
}

impl ConstantPool {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        if count == 0 {
            return Err(Error::Other("constant_pool_count must be >= 1"));
        }

        let mut entries = vec![None; count];
        let mut i = 1usize;
        while i < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    CpInfo::Utf8(decode_modified_utf8(reader.read_bytes(len)?)?)
                }
                3 => CpInfo::Integer(reader.read_i4()?),
                4 => CpInfo::Float(f32::from_bits(reader.read_u4()?)),
                5 => CpInfo::Long(reader.read_i8()?),
                6 => CpInfo::Double(f64::from_bits(reader.read_i8()? as u64)),
                7 => CpInfo::Class {
                    name_index: reader.read_u2()?,
                },
                8 => CpInfo::String {
                    string_index: reader.read_u2()?,
                },
                9 => CpInfo::Fieldref {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                10 => CpInfo::Methodref {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                11 => CpInfo::InterfaceMethodref {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                12 => CpInfo::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => CpInfo::MethodHandle {
                    reference_kind: reader.read_u1()?,
                    reference_index: reader.read_u2()?,
                },
                16 => CpInfo::MethodType {
                    descriptor_index: reader.read_u2()?,
                },
                17 => CpInfo::Dynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                18 => CpInfo::InvokeDynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                19 => CpInfo::Module {
                    name_index: reader.read_u2()?,
                },
                20 => CpInfo::Package {
                    name_index: reader.read_u2()?,
                },
                other => return Err(Error::InvalidConstantPoolTag(other)),
            };

            // Long and Double occupy two slots.
            let wide = matches!(entry, CpInfo::Long(_) | CpInfo::Double(_));
            entries[i] = Some(entry);
            if wide {
                if i + 1 >= count {
                    return Err(Error::Other("malformed constant pool"));
                }
                i += 2;
            } else {
                i += 1;
            }
        }

        Ok(Self { entries })
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo> {
        let idx = index as usize;
        if idx == 0 || idx >= self.entries.len() {
            return Err(Error::InvalidConstantPoolIndex(index));
        }
        self.entries[idx]
            .as_ref()
            .ok_or(Error::InvalidConstantPoolIndex(index))
    }

    pub fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            CpInfo::Utf8(s) => Ok(s.as_str()),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Utf8",
                found: other.kind(),
            }),
        }
    }

    pub fn get_class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpInfo::Class { name_index } => Ok(self.get_utf8(*name_index)?.to_string()),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Class",
                found: other.kind(),
            }),
        }
    }

    /// Resolves a loadable constant as referenced by a `ConstantValue`
    /// attribute. The integer variant covers `int` and the narrower kinds;
    /// the caller narrows by field descriptor.
    pub fn get_constant(&self, index: u16) -> Result<ConstValue> {
        Ok(match self.get(index)? {
            CpInfo::Integer(v) => ConstValue::Int(*v),
            CpInfo::Long(v) => ConstValue::Long(*v),
            CpInfo::Float(v) => ConstValue::Float(*v),
            CpInfo::Double(v) => ConstValue::Double(*v),
            CpInfo::String { string_index } => {
                ConstValue::String(self.get_utf8(*string_index)?.to_string())
            }
            other => {
                return Err(Error::ConstantPoolTypeMismatch {
                    index,
                    expected: "loadable constant",
                    found: other.kind(),
                })
            }
        })
    }
}

/// Modified UTF-8 (JVMS 4.4.7): UTF-8 for the BMP, NUL as `0xC0 0x80`, and
/// supplementary characters as CESU-8 surrogate pairs. Decoded via UTF-16
/// code units; unpaired surrogates are replaced rather than rejected since
/// Java identifiers may legally contain them.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            _ if b & 0x80 == 0 => {
                units.push(b as u16);
                i += 1;
            }
            _ if b & 0xE0 == 0xC0 => {
                let b2 = *bytes.get(i + 1).ok_or(Error::InvalidModifiedUtf8)?;
                if b == 0xC0 && b2 == 0x80 {
                    units.push(0);
                } else if b2 & 0xC0 == 0x80 {
                    units.push((((b & 0x1F) as u16) << 6) | (b2 & 0x3F) as u16);
                } else {
                    return Err(Error::InvalidModifiedUtf8);
                }
                i += 2;
            }
            _ if b & 0xF0 == 0xE0 => {
                if i + 2 >= bytes.len() {
                    return Err(Error::InvalidModifiedUtf8);
                }
                let (b2, b3) = (bytes[i + 1], bytes[i + 2]);
                if b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
                    return Err(Error::InvalidModifiedUtf8);
                }
                units.push(
                    (((b & 0x0F) as u16) << 12) | (((b2 & 0x3F) as u16) << 6) | (b3 & 0x3F) as u16,
                );
                i += 3;
            }
            // Modified UTF-8 never uses 4-byte sequences.
            _ => return Err(Error::InvalidModifiedUtf8),
        }
    }
    Ok(String::from_utf16_lossy(&units))
}
