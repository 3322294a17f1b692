//! Generic `Signature` attribute parsing (JVMS 4.7.9.1).

use quill_core::PrimKind;

use crate::descriptor::prim_kind;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSig {
    pub ty_params: Vec<TyParamSig>,
    pub superclass: ClassTySig,
    pub interfaces: Vec<ClassTySig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub ty_params: Vec<TyParamSig>,
    pub params: Vec<TySig>,
    /// `None` means `void`.
    pub ret: Option<TySig>,
    pub thrown: Vec<TySig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TyParamSig {
    pub name: String,
    /// Class bound first when present, then interface bounds.
    pub bounds: Vec<TySig>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TySig {
    Prim(PrimKind),
    Class(ClassTySig),
    TyVar(String),
    Array(Box<TySig>),
}

/// A class type as written in a signature: the first segment carries the
/// `/`-qualified outer name, subsequent segments are `.`-separated member
/// names. The binary name joins the segments with `$`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTySig {
    pub segments: Vec<ClassTySegSig>,
}

impl ClassTySig {
    pub fn binary_name(&self) -> String {
        let mut out = String::new();
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('$');
            }
            out.push_str(&seg.name);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassTySegSig {
    pub name: String,
    pub args: Vec<TyArgSig>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TyArgSig {
    /// `*`
    Unbounded,
    /// `+X`
    Extends(Box<TySig>),
    /// `-X`
    Super(Box<TySig>),
    Exact(Box<TySig>),
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSig> {
    let mut cur = Cursor::new(sig);
    let ty_params = cur.type_params()?;
    let superclass = cur.class_type()?;
    let mut interfaces = Vec::new();
    while cur.peek().is_some() {
        interfaces.push(cur.class_type()?);
    }
    Ok(ClassSig {
        ty_params,
        superclass,
        interfaces,
    })
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSig> {
    let mut cur = Cursor::new(sig);
    let ty_params = cur.type_params()?;
    cur.expect(b'(')?;
    let mut params = Vec::new();
    while cur.peek() != Some(b')') {
        params.push(cur.ty()?);
    }
    cur.expect(b')')?;
    let ret = if cur.peek() == Some(b'V') {
        cur.bump();
        None
    } else {
        Some(cur.ty()?)
    };
    let mut thrown = Vec::new();
    while cur.peek() == Some(b'^') {
        cur.bump();
        thrown.push(match cur.peek() {
            Some(b'T') => cur.ty_var()?,
            _ => TySig::Class(cur.class_type()?),
        });
    }
    cur.finish()?;
    Ok(MethodSig {
        ty_params,
        params,
        ret,
        thrown,
    })
}

/// A field signature is a single reference type.
pub fn parse_field_signature(sig: &str) -> Result<TySig> {
    let mut cur = Cursor::new(sig);
    let ty = cur.ty()?;
    cur.finish()?;
    Ok(ty)
}

struct Cursor<'a> {
    sig: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(sig: &'a str) -> Self {
        Self {
            sig,
            bytes: sig.as_bytes(),
            pos: 0,
        }
    }

    fn err(&self) -> Error {
        Error::InvalidSignature(self.sig.to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, b: u8) -> Result<()> {
        if self.peek() == Some(b) {
            self.bump();
            Ok(())
        } else {
            Err(self.err())
        }
    }

    fn finish(&self) -> Result<()> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.err())
        }
    }

    /// An identifier: any run of characters excluding the signature
    /// punctuation (JVMS "unqualified name" minus `.;[/<>:`).
    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'.' | b';' | b'[' | b'/' | b'<' | b'>' | b':') {
                break;
            }
            self.bump();
        }
        if self.pos == start {
            return Err(self.err());
        }
        Ok(self.sig[start..self.pos].to_string())
    }

    fn type_params(&mut self) -> Result<Vec<TyParamSig>> {
        let mut out = Vec::new();
        if self.peek() != Some(b'<') {
            return Ok(out);
        }
        self.bump();
        while self.peek() != Some(b'>') {
            let name = self.ident()?;
            self.expect(b':')?;
            let mut bounds = Vec::new();
            // The class bound may be empty: `T::Liface;`.
            if !matches!(self.peek(), Some(b':')) {
                bounds.push(self.ty()?);
            }
            while self.peek() == Some(b':') {
                self.bump();
                bounds.push(self.ty()?);
            }
            out.push(TyParamSig { name, bounds });
        }
        self.expect(b'>')?;
        Ok(out)
    }

    fn ty(&mut self) -> Result<TySig> {
        match self.peek().ok_or_else(|| self.err())? {
            b'L' => Ok(TySig::Class(self.class_type()?)),
            b'T' => self.ty_var(),
            b'[' => {
                self.bump();
                Ok(TySig::Array(Box::new(self.ty()?)))
            }
            tag => {
                let kind = prim_kind(tag).ok_or_else(|| self.err())?;
                self.bump();
                Ok(TySig::Prim(kind))
            }
        }
    }

    fn ty_var(&mut self) -> Result<TySig> {
        self.expect(b'T')?;
        let name = self.ident()?;
        self.expect(b';')?;
        Ok(TySig::TyVar(name))
    }

    fn class_type(&mut self) -> Result<ClassTySig> {
        self.expect(b'L')?;

        // The outer name: identifiers joined by '/'.
        let mut name = self.ident()?;
        while self.peek() == Some(b'/') {
            self.bump();
            name.push('/');
            name.push_str(&self.ident()?);
        }

        let mut segments = vec![ClassTySegSig {
            name,
            args: self.type_args()?,
        }];

        while self.peek() == Some(b'.') {
            self.bump();
            let name = self.ident()?;
            segments.push(ClassTySegSig {
                name,
                args: self.type_args()?,
            });
        }

        self.expect(b';')?;
        Ok(ClassTySig { segments })
    }

    fn type_args(&mut self) -> Result<Vec<TyArgSig>> {
        let mut args = Vec::new();
        if self.peek() != Some(b'<') {
            return Ok(args);
        }
        self.bump();
        while self.peek() != Some(b'>') {
            args.push(match self.peek().ok_or_else(|| self.err())? {
                b'*' => {
                    self.bump();
                    TyArgSig::Unbounded
                }
                b'+' => {
                    self.bump();
                    TyArgSig::Extends(Box::new(self.ty()?))
                }
                b'-' => {
                    self.bump();
                    TyArgSig::Super(Box::new(self.ty()?))
                }
                _ => TyArgSig::Exact(Box::new(self.ty()?)),
            });
        }
        self.expect(b'>')?;
        Ok(args)
    }
}
