//! A minimal classfile emitter for tests.
//!
//! Emits just the structures the binder reads: the constant pool, member
//! stubs, and the `ConstantValue`, `Signature`, `InnerClasses`,
//! `Deprecated`, and `RuntimeVisibleAnnotations` attributes. Methods carry
//! no `Code`; these classes are binder food, not runnable.

use std::collections::HashMap;

use quill_core::ConstValue;

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;

#[derive(Debug, Clone)]
pub struct AnnoSpec {
    pub type_descriptor: String,
    pub elements: Vec<(String, AnnoElem)>,
}

impl AnnoSpec {
    pub fn new(type_descriptor: &str) -> Self {
        Self {
            type_descriptor: type_descriptor.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn element(mut self, name: &str, value: AnnoElem) -> Self {
        self.elements.push((name.to_string(), value));
        self
    }

    /// `@Target({...})` with the given `ElementType` constant names.
    pub fn target(element_types: &[&str]) -> Self {
        AnnoSpec::new("Ljava/lang/annotation/Target;").element(
            "value",
            AnnoElem::Array(
                element_types
                    .iter()
                    .map(|name| AnnoElem::EnumConst {
                        type_descriptor: "Ljava/lang/annotation/ElementType;".to_string(),
                        const_name: name.to_string(),
                    })
                    .collect(),
            ),
        )
    }
}

#[derive(Debug, Clone)]
pub enum AnnoElem {
    Const(ConstValue),
    EnumConst {
        type_descriptor: String,
        const_name: String,
    },
    Class(String),
    Array(Vec<AnnoElem>),
    Nested(AnnoSpec),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub constant: Option<ConstValue>,
    pub signature: Option<String>,
    pub annotations: Vec<AnnoSpec>,
}

impl FieldSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            access_flags: 0x0019, // public static final
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            constant: None,
            signature: None,
            annotations: Vec::new(),
        }
    }

    pub fn flags(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn constant(mut self, value: ConstValue) -> Self {
        self.constant = Some(value);
        self
    }

    pub fn annotation(mut self, anno: AnnoSpec) -> Self {
        self.annotations.push(anno);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<AnnoSpec>,
}

impl MethodSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            access_flags: ACC_PUBLIC,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InnerSpec {
    pub inner: String,
    pub outer: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

/// Builds the bytes of one class file.
#[derive(Debug, Clone)]
pub struct ClassBytes {
    name: String,
    access_flags: u16,
    super_class: Option<String>,
    interfaces: Vec<String>,
    signature: Option<String>,
    deprecated: bool,
    annotations: Vec<AnnoSpec>,
    inner_classes: Vec<InnerSpec>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
}

impl ClassBytes {
    pub fn new(internal_name: &str) -> Self {
        Self {
            name: internal_name.to_string(),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            signature: None,
            deprecated: false,
            annotations: Vec::new(),
            inner_classes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn internal_name(&self) -> &str {
        &self.name
    }

    pub fn flags(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn super_class(mut self, name: Option<&str>) -> Self {
        self.super_class = name.map(str::to_string);
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn signature(mut self, sig: &str) -> Self {
        self.signature = Some(sig.to_string());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn annotation(mut self, anno: AnnoSpec) -> Self {
        self.annotations.push(anno);
        self
    }

    pub fn inner_class(mut self, inner: &str, outer: &str, inner_name: &str, flags: u16) -> Self {
        self.inner_classes.push(InnerSpec {
            inner: inner.to_string(),
            outer: Some(outer.to_string()),
            inner_name: Some(inner_name.to_string()),
            access_flags: flags,
        });
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::default();

        // Resolve every pool entry up front; the pool is serialized before
        // the structures that reference it.
        let this_class = pool.class(&self.name);
        let super_class = self.super_class.as_deref().map(|s| pool.class(s));
        let interfaces: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();

        let fields: Vec<Vec<u8>> = self
            .fields
            .iter()
            .map(|f| {
                let mut attrs = Attrs::default();
                if let Some(constant) = &f.constant {
                    let index = pool.constant(constant);
                    attrs.push(&mut pool, "ConstantValue", u16_bytes(index));
                }
                member_bytes(&mut pool, f.access_flags, &f.name, &f.descriptor, f.signature.as_deref(), &f.annotations, attrs)
            })
            .collect();
        let methods: Vec<Vec<u8>> = self
            .methods
            .iter()
            .map(|m| {
                member_bytes(&mut pool, m.access_flags, &m.name, &m.descriptor, m.signature.as_deref(), &m.annotations, Attrs::default())
            })
            .collect();

        let mut class_attrs = Attrs::default();
        if let Some(sig) = &self.signature {
            let index = pool.utf8(sig);
            class_attrs.push(&mut pool, "Signature", u16_bytes(index));
        }
        if self.deprecated {
            class_attrs.push(&mut pool, "Deprecated", Vec::new());
        }
        if !self.annotations.is_empty() {
            let bytes = annotations_bytes(&mut pool, &self.annotations);
            class_attrs.push(&mut pool, "RuntimeVisibleAnnotations", bytes);
        }
        if !self.inner_classes.is_empty() {
            let mut bytes = u16_bytes(self.inner_classes.len() as u16);
            for inner in &self.inner_classes {
                let inner_index = pool.class(&inner.inner);
                let outer_index = inner.outer.as_deref().map_or(0, |o| pool.class(o));
                let name_index = inner.inner_name.as_deref().map_or(0, |n| pool.utf8(n));
                bytes.extend(u16_bytes(inner_index));
                bytes.extend(u16_bytes(outer_index));
                bytes.extend(u16_bytes(name_index));
                bytes.extend(u16_bytes(inner.access_flags));
            }
            class_attrs.push(&mut pool, "InnerClasses", bytes);
        }

        let mut out = Vec::new();
        out.extend(0xCAFEBABEu32.to_be_bytes());
        out.extend(u16_bytes(0)); // minor
        out.extend(u16_bytes(52)); // major: class file version 52 (Java 8)
        pool.serialize(&mut out);
        out.extend(u16_bytes(self.access_flags));
        out.extend(u16_bytes(this_class));
        out.extend(u16_bytes(super_class.unwrap_or(0)));
        out.extend(u16_bytes(interfaces.len() as u16));
        for index in interfaces {
            out.extend(u16_bytes(index));
        }
        out.extend(u16_bytes(fields.len() as u16));
        for field in fields {
            out.extend(field);
        }
        out.extend(u16_bytes(methods.len() as u16));
        for method in methods {
            out.extend(method);
        }
        class_attrs.serialize(&mut out);
        out
    }
}

fn member_bytes(
    pool: &mut Pool,
    access_flags: u16,
    name: &str,
    descriptor: &str,
    signature: Option<&str>,
    annotations: &[AnnoSpec],
    mut attrs: Attrs,
) -> Vec<u8> {
    let name_index = pool.utf8(name);
    let desc_index = pool.utf8(descriptor);
    if let Some(sig) = signature {
        let index = pool.utf8(sig);
        attrs.push(pool, "Signature", u16_bytes(index));
    }
    if !annotations.is_empty() {
        let bytes = annotations_bytes(pool, annotations);
        attrs.push(pool, "RuntimeVisibleAnnotations", bytes);
    }

    let mut out = Vec::new();
    out.extend(u16_bytes(access_flags));
    out.extend(u16_bytes(name_index));
    out.extend(u16_bytes(desc_index));
    attrs.serialize(&mut out);
    out
}

fn annotations_bytes(pool: &mut Pool, annotations: &[AnnoSpec]) -> Vec<u8> {
    let mut out = u16_bytes(annotations.len() as u16);
    for anno in annotations {
        annotation_bytes(pool, anno, &mut out);
    }
    out
}

fn annotation_bytes(pool: &mut Pool, anno: &AnnoSpec, out: &mut Vec<u8>) {
    out.extend(u16_bytes(pool.utf8(&anno.type_descriptor)));
    out.extend(u16_bytes(anno.elements.len() as u16));
    for (name, value) in &anno.elements {
        out.extend(u16_bytes(pool.utf8(name)));
        element_bytes(pool, value, out);
    }
}

fn element_bytes(pool: &mut Pool, value: &AnnoElem, out: &mut Vec<u8>) {
    match value {
        AnnoElem::Const(value) => {
            let (tag, index) = match value {
                ConstValue::Boolean(b) => (b'Z', pool.int(i32::from(*b))),
                ConstValue::Byte(b) => (b'B', pool.int(i32::from(*b))),
                ConstValue::Char(c) => (b'C', pool.int(i32::from(*c))),
                ConstValue::Short(s) => (b'S', pool.int(i32::from(*s))),
                ConstValue::Int(i) => (b'I', pool.int(*i)),
                ConstValue::Long(l) => (b'J', pool.long(*l)),
                ConstValue::Float(f) => (b'F', pool.float(*f)),
                ConstValue::Double(d) => (b'D', pool.double(*d)),
                ConstValue::String(s) => (b's', pool.utf8(s)),
            };
            out.push(tag);
            out.extend(u16_bytes(index));
        }
        AnnoElem::EnumConst {
            type_descriptor,
            const_name,
        } => {
            out.push(b'e');
            out.extend(u16_bytes(pool.utf8(type_descriptor)));
            out.extend(u16_bytes(pool.utf8(const_name)));
        }
        AnnoElem::Class(descriptor) => {
            out.push(b'c');
            out.extend(u16_bytes(pool.utf8(descriptor)));
        }
        AnnoElem::Array(values) => {
            out.push(b'[');
            out.extend(u16_bytes(values.len() as u16));
            for v in values {
                element_bytes(pool, v, out);
            }
        }
        AnnoElem::Nested(anno) => {
            out.push(b'@');
            annotation_bytes(pool, anno, out);
        }
    }
}

fn u16_bytes(value: u16) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8(String),
    Class(String),
    Int(i32),
    Long(i64),
    Float(u32),
    Double(u64),
    Str(String),
}

#[derive(Debug, Clone, Default)]
struct Pool {
    entries: Vec<(PoolKey, Vec<u8>)>,
    index: HashMap<PoolKey, u16>,
    next: u16,
}

impl Pool {
    fn add(&mut self, key: PoolKey, bytes: Vec<u8>, wide: bool) -> u16 {
        if let Some(index) = self.index.get(&key) {
            return *index;
        }
        if self.next == 0 {
            self.next = 1;
        }
        let index = self.next;
        self.next += if wide { 2 } else { 1 };
        self.index.insert(key.clone(), index);
        self.entries.push((key, bytes));
        index
    }

    fn utf8(&mut self, text: &str) -> u16 {
        // Plain UTF-8 is valid modified UTF-8 for everything the tests emit
        // (no NUL, no supplementary characters).
        let mut bytes = vec![1u8];
        bytes.extend(u16_bytes(text.len() as u16));
        bytes.extend(text.as_bytes());
        self.add(PoolKey::Utf8(text.to_string()), bytes, false)
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        let name_index = self.utf8(internal_name);
        let mut bytes = vec![7u8];
        bytes.extend(u16_bytes(name_index));
        self.add(PoolKey::Class(internal_name.to_string()), bytes, false)
    }

    fn int(&mut self, value: i32) -> u16 {
        let mut bytes = vec![3u8];
        bytes.extend(value.to_be_bytes());
        self.add(PoolKey::Int(value), bytes, false)
    }

    fn long(&mut self, value: i64) -> u16 {
        let mut bytes = vec![5u8];
        bytes.extend(value.to_be_bytes());
        self.add(PoolKey::Long(value), bytes, true)
    }

    fn float(&mut self, value: f32) -> u16 {
        let mut bytes = vec![4u8];
        bytes.extend(value.to_bits().to_be_bytes());
        self.add(PoolKey::Float(value.to_bits()), bytes, false)
    }

    fn double(&mut self, value: f64) -> u16 {
        let mut bytes = vec![6u8];
        bytes.extend(value.to_bits().to_be_bytes());
        self.add(PoolKey::Double(value.to_bits()), bytes, true)
    }

    fn string(&mut self, text: &str) -> u16 {
        let utf8_index = self.utf8(text);
        let mut bytes = vec![8u8];
        bytes.extend(u16_bytes(utf8_index));
        self.add(PoolKey::Str(text.to_string()), bytes, false)
    }

    /// A loadable constant for a `ConstantValue` attribute.
    fn constant(&mut self, value: &ConstValue) -> u16 {
        match value {
            ConstValue::Boolean(b) => self.int(i32::from(*b)),
            ConstValue::Byte(b) => self.int(i32::from(*b)),
            ConstValue::Char(c) => self.int(i32::from(*c)),
            ConstValue::Short(s) => self.int(i32::from(*s)),
            ConstValue::Int(i) => self.int(*i),
            ConstValue::Long(l) => self.long(*l),
            ConstValue::Float(f) => self.float(*f),
            ConstValue::Double(d) => self.double(*d),
            ConstValue::String(s) => self.string(s),
        }
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        let count = if self.next == 0 { 1 } else { self.next };
        out.extend(u16_bytes(count));
        for (_, bytes) in &self.entries {
            out.extend(bytes);
        }
    }
}

#[derive(Debug, Default)]
struct Attrs {
    attrs: Vec<(u16, Vec<u8>)>,
}

impl Attrs {
    fn push(&mut self, pool: &mut Pool, name: &str, bytes: Vec<u8>) {
        let name_index = pool.utf8(name);
        self.attrs.push((name_index, bytes));
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        out.extend(u16_bytes(self.attrs.len() as u16));
        for (name_index, bytes) in &self.attrs {
            out.extend(u16_bytes(*name_index));
            out.extend((bytes.len() as u32).to_be_bytes());
            out.extend(bytes);
        }
    }
}
