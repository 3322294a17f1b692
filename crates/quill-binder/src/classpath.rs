//! Classpath binding: registers archive classes with the top-level index and
//! wraps each in a lazy [`BytecodeBoundClass`] view.
//!
//! Entry *names* are scanned eagerly, since symbols must exist up front; the
//! class bytes are read and decoded only on first demand, and the archive
//! handles stay open until the binding result is dropped.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use thiserror::Error;

use quill_classfile::signature::{
    parse_class_signature, ClassSig, ClassTySig, TyArgSig, TySig,
};
use quill_classfile::{Annotation, ClassFile, ElementValue};
use quill_core::flags::{ACC_ANNOTATION, ACC_DEPRECATED, ACC_ENUM, ACC_INTERFACE};
use quill_core::{ClassKind, ConstValue, Name, PrimKind};

use crate::bound::{AnnotationMetadata, ElementType, FieldHandle, RetentionPolicy};
use crate::env::{CycleError, Env};
use crate::lookup::TopLevelIndexBuilder;
use crate::sym::{ClassSymbol, FieldSymbol, TyVarSymbol};
use crate::ty::{ClassTy, SimpleClassTy, Type, WildBound};

#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Binds the bootclasspath and then the classpath, in that order, so the
/// first registration of a short name wins. Source symbols must already be
/// in the index builder.
pub fn bind(
    bootclasspath: &[PathBuf],
    classpath: &[PathBuf],
    tli: &mut TopLevelIndexBuilder,
) -> Result<ClasspathEnv, ClasspathError> {
    let mut env = ClasspathEnv::default();
    for path in bootclasspath.iter().chain(classpath) {
        bind_entry(path, tli, &mut env)?;
    }
    tracing::debug!(classes = env.len(), "bound classpath");
    Ok(env)
}

fn bind_entry(
    path: &Path,
    tli: &mut TopLevelIndexBuilder,
    env: &mut ClasspathEnv,
) -> Result<(), ClasspathError> {
    if path.is_dir() {
        let mut class_files: Vec<PathBuf> = walkdir::WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension() == Some(std::ffi::OsStr::new("class")))
            .map(walkdir::DirEntry::into_path)
            .collect();
        class_files.sort();

        let source = Rc::new(ArchiveSource::Dir {
            root: path.to_path_buf(),
        });
        for file in class_files {
            let rel = file.strip_prefix(path).unwrap_or(&file);
            let internal = rel.to_string_lossy().replace('\\', "/");
            let Some(internal) = internal.strip_suffix(".class") else {
                continue;
            };
            register(
                internal,
                &source,
                file.to_string_lossy().into_owned(),
                tli,
                env,
            );
        }
    } else {
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            names.push(archive.by_index_raw(i)?.name().to_string());
        }
        let source = Rc::new(ArchiveSource::Jar {
            path: path.to_path_buf(),
            archive: RefCell::new(archive),
        });
        for name in names {
            if name.starts_with("META-INF/") {
                continue;
            }
            let Some(internal) = name.strip_suffix(".class") else {
                continue;
            };
            register(internal, &source, name.clone(), tli, env);
        }
    }
    Ok(())
}

fn register(
    internal: &str,
    source: &Rc<ArchiveSource>,
    entry: String,
    tli: &mut TopLevelIndexBuilder,
    env: &mut ClasspathEnv,
) {
    if is_ignored_class(internal) {
        return;
    }
    let sym = ClassSymbol::new(internal);
    let class = Arc::new(BytecodeBoundClass::new(sym.clone(), source.clone(), entry));
    if env.insert(sym.clone(), class) {
        tli.insert(&sym);
    }
}

fn is_ignored_class(internal_name: &str) -> bool {
    internal_name == "module-info"
        || internal_name == "package-info"
        || internal_name.ends_with("/package-info")
}

/// One open classpath entry. Jar handles stay open for the lifetime of the
/// binding; directories read individual files on demand.
pub enum ArchiveSource {
    Jar {
        path: PathBuf,
        archive: RefCell<zip::ZipArchive<File>>,
    },
    Dir {
        root: PathBuf,
    },
}

impl ArchiveSource {
    fn read(&self, entry: &str) -> io::Result<Vec<u8>> {
        match self {
            ArchiveSource::Jar { archive, .. } => {
                let mut archive = archive.borrow_mut();
                let mut file = archive
                    .by_name(entry)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
                let mut bytes = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
            ArchiveSource::Dir { .. } => std::fs::read(entry),
        }
    }
}

impl fmt::Debug for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveSource::Jar { path, .. } => write!(f, "Jar({})", path.display()),
            ArchiveSource::Dir { root } => write!(f, "Dir({})", root.display()),
        }
    }
}

/// A lazily-decoded classpath class.
///
/// The classfile is parsed on first access and every derived view (kind,
/// members, signature types, annotation metadata) is memoized. A class that
/// fails to decode poisons only itself: it behaves as an empty class and the
/// failure is logged.
#[derive(Debug)]
pub struct BytecodeBoundClass {
    sym: ClassSymbol,
    source: Rc<ArchiveSource>,
    entry: String,
    classfile: OnceCell<Option<Arc<ClassFile>>>,
    sig: OnceCell<Option<Arc<ClassSig>>>,
    children: OnceCell<HashMap<Name, ClassSymbol>>,
    ty_params: OnceCell<Vec<(Name, TyVarSymbol)>>,
    metadata: OnceCell<Option<AnnotationMetadata>>,
}

impl BytecodeBoundClass {
    fn new(sym: ClassSymbol, source: Rc<ArchiveSource>, entry: String) -> Self {
        Self {
            sym,
            source,
            entry,
            classfile: OnceCell::new(),
            sig: OnceCell::new(),
            children: OnceCell::new(),
            ty_params: OnceCell::new(),
            metadata: OnceCell::new(),
        }
    }

    pub fn sym(&self) -> &ClassSymbol {
        &self.sym
    }

    fn classfile(&self) -> Option<&Arc<ClassFile>> {
        self.classfile
            .get_or_init(|| match self.source.read(&self.entry) {
                Ok(bytes) => match ClassFile::parse(&bytes) {
                    Ok(cf) => Some(Arc::new(cf)),
                    Err(err) => {
                        tracing::error!(class = %self.sym, %err, "failed to decode classfile");
                        None
                    }
                },
                Err(err) => {
                    tracing::error!(class = %self.sym, %err, "failed to read classpath entry");
                    None
                }
            })
            .as_ref()
    }

    fn class_sig(&self) -> Option<&Arc<ClassSig>> {
        self.sig
            .get_or_init(|| {
                let cf = self.classfile()?;
                let sig = cf.signature.as_deref()?;
                match parse_class_signature(sig) {
                    Ok(parsed) => Some(Arc::new(parsed)),
                    Err(err) => {
                        tracing::warn!(class = %self.sym, %err, "unparseable class signature");
                        None
                    }
                }
            })
            .as_ref()
    }

    pub fn kind(&self) -> ClassKind {
        let Some(cf) = self.classfile() else {
            return ClassKind::Class;
        };
        let flags = cf.access_flags as u32;
        if flags & ACC_ANNOTATION != 0 {
            ClassKind::Annotation
        } else if flags & ACC_INTERFACE != 0 {
            ClassKind::Interface
        } else if flags & ACC_ENUM != 0 {
            ClassKind::Enum
        } else {
            ClassKind::Class
        }
    }

    pub fn access(&self) -> u32 {
        let Some(cf) = self.classfile() else {
            return 0;
        };
        let mut access = cf.access_flags as u32;
        if cf.deprecated {
            access |= ACC_DEPRECATED;
        }
        access
    }

    /// The declaring class, per the `InnerClasses` attribute.
    pub fn owner(&self) -> Option<ClassSymbol> {
        let cf = self.classfile()?;
        cf.inner_classes
            .iter()
            .find(|ic| ic.inner_class == self.sym.binary_name())
            .and_then(|ic| ic.outer_class.as_deref())
            .map(ClassSymbol::new)
    }

    fn children_map(&self) -> &HashMap<Name, ClassSymbol> {
        self.children.get_or_init(|| {
            let Some(cf) = self.classfile() else {
                return HashMap::new();
            };
            cf.inner_classes
                .iter()
                .filter(|ic| ic.outer_class.as_deref() == Some(self.sym.binary_name()))
                .filter_map(|ic| {
                    let inner_name = ic.inner_name.as_deref()?;
                    Some((Name::from(inner_name), ClassSymbol::new(&ic.inner_class)))
                })
                .collect()
        })
    }

    pub fn child(&self, name: &Name) -> Option<ClassSymbol> {
        self.children_map().get(name).cloned()
    }

    pub fn children(&self) -> Vec<(Name, ClassSymbol)> {
        self.children_map()
            .iter()
            .map(|(n, c)| (n.clone(), c.clone()))
            .collect()
    }

    pub fn superclass(&self) -> Option<ClassSymbol> {
        let cf = self.classfile()?;
        cf.super_class.as_deref().map(ClassSymbol::new)
    }

    pub fn interfaces(&self) -> Vec<ClassSymbol> {
        let Some(cf) = self.classfile() else {
            return Vec::new();
        };
        cf.interfaces.iter().map(ClassSymbol::new).collect()
    }

    pub fn ty_params(&self) -> Vec<(Name, TyVarSymbol)> {
        self.ty_params
            .get_or_init(|| {
                let Some(sig) = self.class_sig() else {
                    return Vec::new();
                };
                sig.ty_params
                    .iter()
                    .map(|tp| {
                        let name = Name::from(tp.name.as_str());
                        let sym = TyVarSymbol::of_class(self.sym.clone(), name.clone());
                        (name, sym)
                    })
                    .collect()
            })
            .clone()
    }

    pub fn ty_param(&self, name: &Name) -> Option<TyVarSymbol> {
        self.ty_params()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, sym)| sym)
    }

    /// The generic superclass instantiation when a signature is present,
    /// otherwise the raw constant-pool superclass.
    pub fn super_instantiation(&self) -> Option<(ClassSymbol, Vec<Type>)> {
        if let Some(sig) = self.class_sig() {
            let ty = self.sig_class_ty(&sig.superclass);
            let seg = ty.segments.last()?;
            return Some((seg.sym.clone(), seg.targs.clone()));
        }
        self.superclass().map(|sym| (sym, Vec::new()))
    }

    fn sig_class_ty(&self, sig: &ClassTySig) -> ClassTy {
        let mut segments = Vec::with_capacity(sig.segments.len());
        let mut binary = String::new();
        for (i, seg) in sig.segments.iter().enumerate() {
            if i > 0 {
                binary.push('$');
            }
            binary.push_str(&seg.name);
            segments.push(SimpleClassTy {
                sym: ClassSymbol::new(&binary),
                targs: seg.args.iter().map(|arg| self.sig_ty_arg(arg)).collect(),
                annos: Vec::new(),
            });
        }
        ClassTy { segments }
    }

    fn sig_ty_arg(&self, arg: &TyArgSig) -> Type {
        match arg {
            TyArgSig::Unbounded => Type::Wild {
                bound: WildBound::None,
                annos: Vec::new(),
            },
            TyArgSig::Extends(ty) => Type::Wild {
                bound: WildBound::Extends(Box::new(self.sig_ty(ty))),
                annos: Vec::new(),
            },
            TyArgSig::Super(ty) => Type::Wild {
                bound: WildBound::Super(Box::new(self.sig_ty(ty))),
                annos: Vec::new(),
            },
            TyArgSig::Exact(ty) => self.sig_ty(ty),
        }
    }

    fn sig_ty(&self, sig: &TySig) -> Type {
        match sig {
            TySig::Prim(kind) => Type::Prim {
                kind: *kind,
                annos: Vec::new(),
            },
            TySig::Class(c) => Type::Class(self.sig_class_ty(c)),
            TySig::TyVar(name) => Type::TyVar {
                sym: TyVarSymbol::of_class(self.sym.clone(), Name::from(name.as_str())),
                annos: Vec::new(),
            },
            TySig::Array(elem) => Type::Array {
                elem: Box::new(self.sig_ty(elem)),
                annos: Vec::new(),
            },
        }
    }

    pub fn field(&self, name: &Name) -> Option<FieldHandle> {
        let cf = self.classfile()?;
        let field = cf.fields.iter().find(|f| f.name == name.as_str())?;
        let mut access = field.access_flags as u32;
        if field.deprecated {
            access |= ACC_DEPRECATED;
        }
        Some(FieldHandle {
            sym: FieldSymbol::new(self.sym.clone(), name.clone()),
            access,
            value: field
                .constant_value
                .clone()
                .map(|v| narrow_constant(&field.descriptor, v)),
            from_source: false,
        })
    }

    pub fn annotation_metadata(&self) -> Option<AnnotationMetadata> {
        self.metadata
            .get_or_init(|| {
                if self.kind() != ClassKind::Annotation {
                    return None;
                }
                let cf = self.classfile()?;
                let targets = find_meta(&cf.runtime_visible_annotations, "java/lang/annotation/Target")
                    .map(|anno| {
                        element_values(anno, "value")
                            .filter_map(|value| match value {
                                ElementValue::Enum { const_name, .. } => {
                                    ElementType::from_name(const_name)
                                }
                                _ => None,
                            })
                            .collect()
                    });
                let retention =
                    find_meta(&cf.runtime_visible_annotations, "java/lang/annotation/Retention")
                        .and_then(|anno| {
                            element_values(anno, "value").find_map(|value| match value {
                                ElementValue::Enum { const_name, .. } => {
                                    RetentionPolicy::from_name(const_name)
                                }
                                _ => None,
                            })
                        });
                Some(AnnotationMetadata { targets, retention })
            })
            .clone()
    }
}

fn find_meta<'a>(annos: &'a [Annotation], internal_name: &str) -> Option<&'a Annotation> {
    annos
        .iter()
        .find(|a| a.type_internal_name() == Some(internal_name))
}

/// The values of a (possibly array-valued) annotation element.
fn element_values<'a>(
    anno: &'a Annotation,
    name: &str,
) -> Box<dyn Iterator<Item = &'a ElementValue> + 'a> {
    match anno.elements.iter().find(|(n, _)| n == name) {
        Some((_, ElementValue::Array(values))) => Box::new(values.iter()),
        Some((_, value)) => Box::new(std::iter::once(value)),
        None => Box::new(std::iter::empty()),
    }
}

/// `ConstantValue` entries store everything narrower than `int` as an
/// `Integer`; narrow to the field's declared kind on read.
fn narrow_constant(descriptor: &str, value: ConstValue) -> ConstValue {
    let narrowed = match descriptor {
        "Z" => value
            .int_value()
            .map(|v| ConstValue::Boolean(v != 0)),
        "B" => value.cast_to(PrimKind::Byte),
        "C" => value.cast_to(PrimKind::Char),
        "S" => value.cast_to(PrimKind::Short),
        _ => None,
    };
    narrowed.unwrap_or(value)
}

/// The retained classpath environment: every archive class by symbol, plus
/// the open archive handles. Dropping this releases the handles.
#[derive(Debug, Default)]
pub struct ClasspathEnv {
    map: HashMap<ClassSymbol, Arc<BytecodeBoundClass>>,
}

impl ClasspathEnv {
    fn insert(&mut self, sym: ClassSymbol, class: Arc<BytecodeBoundClass>) -> bool {
        use std::collections::hash_map::Entry;
        match self.map.entry(sym) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(class);
                true
            }
        }
    }

    pub fn get_class(&self, sym: &ClassSymbol) -> Option<&Arc<BytecodeBoundClass>> {
        self.map.get(sym)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The classpath env serves every stage view: a bytecode class is complete
/// from the moment it is registered.
impl<V: Clone + From<Arc<BytecodeBoundClass>>> Env<ClassSymbol, V> for ClasspathEnv {
    fn get(&self, sym: &ClassSymbol) -> Result<Option<V>, CycleError<ClassSymbol>> {
        Ok(self.map.get(sym).map(|class| V::from(class.clone())))
    }
}
