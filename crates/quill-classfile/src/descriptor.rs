//! Field and method descriptor parsing (JVMS 4.3.2, 4.3.3).

use quill_core::PrimKind;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Prim(PrimKind),
    /// A class type by internal name, e.g. `java/lang/String`.
    Object(String),
    Array(Box<FieldType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    /// `None` means `void`.
    pub ret: Option<FieldType>,
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let bytes = desc.as_bytes();
    let mut pos = 0;
    let ty = parse_field_type(bytes, &mut pos).ok_or_else(|| invalid(desc))?;
    if pos != bytes.len() {
        return Err(invalid(desc));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let bytes = desc.as_bytes();
    let mut pos = 0;
    if bytes.first() != Some(&b'(') {
        return Err(invalid(desc));
    }
    pos += 1;

    let mut params = Vec::new();
    loop {
        match bytes.get(pos) {
            Some(b')') => {
                pos += 1;
                break;
            }
            Some(_) => params.push(parse_field_type(bytes, &mut pos).ok_or_else(|| invalid(desc))?),
            None => return Err(invalid(desc)),
        }
    }

    let ret = match bytes.get(pos) {
        Some(b'V') => {
            pos += 1;
            None
        }
        Some(_) => Some(parse_field_type(bytes, &mut pos).ok_or_else(|| invalid(desc))?),
        None => return Err(invalid(desc)),
    };

    if pos != bytes.len() {
        return Err(invalid(desc));
    }
    Ok(MethodDescriptor { params, ret })
}

pub(crate) fn prim_kind(tag: u8) -> Option<PrimKind> {
    Some(match tag {
        b'B' => PrimKind::Byte,
        b'C' => PrimKind::Char,
        b'D' => PrimKind::Double,
        b'F' => PrimKind::Float,
        b'I' => PrimKind::Int,
        b'J' => PrimKind::Long,
        b'S' => PrimKind::Short,
        b'Z' => PrimKind::Boolean,
        _ => return None,
    })
}

fn parse_field_type(bytes: &[u8], pos: &mut usize) -> Option<FieldType> {
    let tag = *bytes.get(*pos)?;
    if let Some(kind) = prim_kind(tag) {
        *pos += 1;
        return Some(FieldType::Prim(kind));
    }
    match tag {
        b'[' => {
            *pos += 1;
            let elem = parse_field_type(bytes, pos)?;
            Some(FieldType::Array(Box::new(elem)))
        }
        b'L' => {
            *pos += 1;
            let start = *pos;
            while *bytes.get(*pos)? != b';' {
                *pos += 1;
            }
            let name = std::str::from_utf8(&bytes[start..*pos]).ok()?.to_string();
            *pos += 1;
            if name.is_empty() {
                None
            } else {
                Some(FieldType::Object(name))
            }
        }
        _ => None,
    }
}

fn invalid(desc: &str) -> Error {
    Error::InvalidDescriptor(desc.to_string())
}
