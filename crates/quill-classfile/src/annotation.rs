use quill_core::ConstValue;

use crate::constant_pool::{ConstantPool, CpInfo};
use crate::error::{Error, Result};
use crate::reader::Reader;

/// A `RuntimeVisibleAnnotations` / `RuntimeInvisibleAnnotations` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// The annotation type in descriptor form, e.g. `Ljava/lang/annotation/Target;`.
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    /// The annotation type's internal name, when the descriptor is a class type.
    pub fn type_internal_name(&self) -> Option<&str> {
        self.type_descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
    }

    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();

        let num_pairs = reader.read_u2()? as usize;
        let mut elements = Vec::with_capacity(num_pairs);
        for _ in 0..num_pairs {
            let name = cp.get_utf8(reader.read_u2()?)?.to_string();
            elements.push((name, ElementValue::parse(reader, cp)?));
        }

        Ok(Self {
            type_descriptor,
            elements,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let tag = reader.read_u1()? as char;
        match tag {
            'B' | 'C' | 'I' | 'S' | 'Z' => {
                let idx = reader.read_u2()?;
                let value = match cp.get(idx)? {
                    CpInfo::Integer(v) => *v,
                    other => {
                        return Err(Error::ConstantPoolTypeMismatch {
                            index: idx,
                            expected: "Integer",
                            found: other.kind(),
                        })
                    }
                };
                // Narrow by tag. A Java `char` is a UTF-16 code unit and may
                // be an unpaired surrogate, so keep the raw u16.
                let cv = match tag {
                    'B' => ConstValue::Byte(value as i8),
                    'C' => ConstValue::Char(value as u16),
                    'I' => ConstValue::Int(value),
                    'S' => ConstValue::Short(value as i16),
                    'Z' => ConstValue::Boolean(value != 0),
                    _ => unreachable!(),
                };
                Ok(ElementValue::Const(cv))
            }
            'J' | 'D' | 'F' => {
                let idx = reader.read_u2()?;
                let value = cp.get_constant(idx)?;
                match (tag, &value) {
                    ('J', ConstValue::Long(_))
                    | ('D', ConstValue::Double(_))
                    | ('F', ConstValue::Float(_)) => Ok(ElementValue::Const(value)),
                    _ => Err(Error::MalformedAttribute("RuntimeVisibleAnnotations")),
                }
            }
            's' => {
                let idx = reader.read_u2()?;
                // JVMS uses CONSTANT_Utf8_info here; some producers emit
                // CONSTANT_String_info. Accept both.
                let value = match cp.get(idx)? {
                    CpInfo::Utf8(s) => s.clone(),
                    CpInfo::String { string_index } => cp.get_utf8(*string_index)?.to_string(),
                    other => {
                        return Err(Error::ConstantPoolTypeMismatch {
                            index: idx,
                            expected: "Utf8",
                            found: other.kind(),
                        })
                    }
                };
                Ok(ElementValue::Const(ConstValue::String(value)))
            }
            'e' => {
                let type_name_index = reader.read_u2()?;
                let const_name_index = reader.read_u2()?;
                Ok(ElementValue::Enum {
                    type_descriptor: cp.get_utf8(type_name_index)?.to_string(),
                    const_name: cp.get_utf8(const_name_index)?.to_string(),
                })
            }
            'c' => Ok(ElementValue::Class(
                cp.get_utf8(reader.read_u2()?)?.to_string(),
            )),
            '@' => Ok(ElementValue::Annotation(Box::new(Annotation::parse(
                reader, cp,
            )?))),
            '[' => {
                let num_values = reader.read_u2()? as usize;
                let mut values = Vec::with_capacity(num_values);
                for _ in 0..num_values {
                    values.push(ElementValue::parse(reader, cp)?);
                }
                Ok(ElementValue::Array(values))
            }
            _ => Err(Error::MalformedAttribute("RuntimeVisibleAnnotations")),
        }
    }
}
