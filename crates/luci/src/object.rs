//! Runtime value model.
//!
//! Values live behind `Rc<RefCell<Object>>`: aggregates (arrays, dicts,
//! sets, user objects, captured environments) alias, scalars are cloned at
//! assignment sites. Every object carries a `frozen` counter gating
//! mutation and hashability, and optionally the declared-type handle of the
//! binding it was first assigned to.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use indexmap::{IndexMap, IndexSet};
use num_complex::Complex64;
use strum::Display;

use crate::ast::{BlockStatement, Identifier, TypeExpression};
use crate::builtins::BuiltinDef;
use crate::env::EnvRef;
use crate::errors::ErrorObj;
use crate::snapshot::SnapshotValue;
use crate::types::TypeMethodDef;

/// Objects constructed since process start, for `-s` statistics.
pub static OBJECTS_CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);
/// Objects destructed since process start, for `-s` statistics.
pub static OBJECTS_DESTRUCTED: AtomicUsize = AtomicUsize::new(0);
/// User objects dropped while their destructor was still attached. This is
/// a reportable anomaly, never a crash.
pub static USER_OBJECTS_WRONGLY_DESTRUCTED: AtomicUsize = AtomicUsize::new(0);

pub type ObjectRef = Rc<RefCell<Object>>;

pub type DictMap = IndexMap<HashKey, ObjectRef, ahash::RandomState>;
pub type SetData = IndexSet<HashKey, ahash::RandomState>;

/// Discriminant of an [`ObjectKind`], used for dispatch tables and
/// `internal_type_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Tag {
    Null,
    Integer,
    Double,
    Complex,
    Boolean,
    Char,
    String,
    Range,
    Array,
    ArrayDouble,
    ArrayComplex,
    Dictionary,
    Set,
    Function,
    Builtin,
    UserType,
    UserObject,
    BoundBuiltinTypeFunction,
    BoundBuiltinTypeProperty,
    BoundUserTypeFunction,
    BoundUserTypeProperty,
    IOObject,
    Iterator,
    Freezer,
    Module,
    Thread,
    Regex,
    Error,
}

pub struct Object {
    /// When larger than zero no updates are allowed to the object.
    pub frozen: i32,
    /// Set when the value was bound through a typed `let`; later
    /// assignments are checked against it.
    pub declared_type: Option<Arc<TypeExpression>>,
    pub kind: ObjectKind,
}

impl Object {
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        OBJECTS_CONSTRUCTED.fetch_add(1, Ordering::Relaxed);
        Self {
            frozen: 0,
            declared_type: None,
            kind,
        }
    }

    #[must_use]
    pub fn tag(&self) -> Tag {
        self.kind.tag()
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        OBJECTS_DESTRUCTED.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("tag", &self.tag())
            .field("frozen", &self.frozen)
            .finish_non_exhaustive()
    }
}

pub enum ObjectKind {
    Null,
    Integer(i64),
    Double(f64),
    Complex(Complex64),
    Boolean(bool),
    Char(u32),
    Str(String),
    Range(Range),
    Array(Vec<ObjectRef>),
    ArrayDouble(Vec<f64>),
    ArrayComplex(Vec<Complex64>),
    Dictionary(DictMap),
    Set(SetData),
    Function(Rc<FunctionObj>),
    Builtin(Rc<BuiltinDef>),
    UserType(Rc<UserTypeObj>),
    UserObject(UserInstance),
    BoundBuiltinTypeFunction(BoundBuiltinFunction),
    BoundBuiltinTypeProperty(BoundProperty),
    BoundUserTypeFunction(BoundUserFunction),
    BoundUserTypeProperty(BoundProperty),
    IOObject(IoObj),
    Iterator(IteratorObj),
    Freezer(Rc<FreezerGuard>),
    Module(ModuleObj),
    Thread(ThreadObj),
    Regex(Rc<regex::Regex>),
    Error(ErrorObj),
}

impl ObjectKind {
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Self::Null => Tag::Null,
            Self::Integer(_) => Tag::Integer,
            Self::Double(_) => Tag::Double,
            Self::Complex(_) => Tag::Complex,
            Self::Boolean(_) => Tag::Boolean,
            Self::Char(_) => Tag::Char,
            Self::Str(_) => Tag::String,
            Self::Range(_) => Tag::Range,
            Self::Array(_) => Tag::Array,
            Self::ArrayDouble(_) => Tag::ArrayDouble,
            Self::ArrayComplex(_) => Tag::ArrayComplex,
            Self::Dictionary(_) => Tag::Dictionary,
            Self::Set(_) => Tag::Set,
            Self::Function(_) => Tag::Function,
            Self::Builtin(_) => Tag::Builtin,
            Self::UserType(_) => Tag::UserType,
            Self::UserObject(_) => Tag::UserObject,
            Self::BoundBuiltinTypeFunction(_) => Tag::BoundBuiltinTypeFunction,
            Self::BoundBuiltinTypeProperty(_) => Tag::BoundBuiltinTypeProperty,
            Self::BoundUserTypeFunction(_) => Tag::BoundUserTypeFunction,
            Self::BoundUserTypeProperty(_) => Tag::BoundUserTypeProperty,
            Self::IOObject(_) => Tag::IOObject,
            Self::Iterator(_) => Tag::Iterator,
            Self::Freezer(_) => Tag::Freezer,
            Self::Module(_) => Tag::Module,
            Self::Thread(_) => Tag::Thread,
            Self::Regex(_) => Tag::Regex,
            Self::Error(_) => Tag::Error,
        }
    }
}

/// Allocates a fresh object.
#[must_use]
pub fn alloc(kind: ObjectKind) -> ObjectRef {
    Rc::new(RefCell::new(Object::new(kind)))
}

#[must_use]
pub fn null_obj() -> ObjectRef {
    alloc(ObjectKind::Null)
}

#[must_use]
pub fn boolean_obj(value: bool) -> ObjectRef {
    alloc(ObjectKind::Boolean(value))
}

#[must_use]
pub fn integer_obj(value: i64) -> ObjectRef {
    alloc(ObjectKind::Integer(value))
}

#[must_use]
pub fn double_obj(value: f64) -> ObjectRef {
    alloc(ObjectKind::Double(value))
}

#[must_use]
pub fn string_obj(value: impl Into<String>) -> ObjectRef {
    alloc(ObjectKind::Str(value.into()))
}

#[must_use]
pub fn error_value(error: ErrorObj) -> ObjectRef {
    alloc(ObjectKind::Error(error))
}

#[must_use]
pub fn tag_of(object: &ObjectRef) -> Tag {
    object.borrow().tag()
}

/// `lower:upper:stride` integer range. The stride is strictly positive,
/// enforced by the `range` builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub lower: i64,
    pub upper: i64,
    pub stride: i64,
}

impl Range {
    #[must_use]
    pub fn length(&self) -> i64 {
        if self.lower >= self.upper || self.stride <= 0 {
            return 0;
        }
        let span = self.upper - self.lower;
        (span + self.stride - 1) / self.stride
    }

    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        let stride = self.stride.max(1);
        (self.lower..self.upper).step_by(stride as usize)
    }
}

/// Property slot of a user type or instance: value, const flag and the
/// declared type it must stay compatible with.
#[derive(Clone)]
pub struct Property {
    pub value: ObjectRef,
    pub constant: bool,
    pub declared_type: Option<Arc<TypeExpression>>,
}

pub type PropertySlot = Rc<RefCell<Property>>;
pub type PropertyMap = IndexMap<String, PropertySlot, ahash::RandomState>;

pub struct FunctionObj {
    pub doc: Option<String>,
    pub arguments: Vec<Identifier>,
    pub argument_types: Vec<Option<Arc<TypeExpression>>>,
    pub return_type: Option<Arc<TypeExpression>>,
    pub body: Arc<BlockStatement>,
    /// The defining scope; a strong reference, the closure keeps it alive.
    pub env: EnvRef,
}

pub struct UserTypeObj {
    pub name: String,
    pub doc: Option<String>,
    pub functions: IndexMap<String, Rc<FunctionObj>, ahash::RandomState>,
    pub properties: PropertyMap,
}

pub struct UserInstance {
    pub user_type: Rc<UserTypeObj>,
    pub properties: PropertyMap,
    /// Attached at construction when the type defines `destruct`; detached
    /// when the destructor has run.
    pub destructor: Option<Rc<FunctionObj>>,
}

impl Drop for UserInstance {
    fn drop(&mut self) {
        if self.destructor.is_some() {
            USER_OBJECTS_WRONGLY_DESTRUCTED.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Scope-bound freeze: raises the target's freeze counter on construction
/// and lowers it (clamped at zero) when dropped.
pub struct FreezerGuard {
    target: ObjectRef,
}

impl FreezerGuard {
    #[must_use]
    pub fn new(target: ObjectRef) -> Self {
        target.borrow_mut().frozen += 1;
        Self { target }
    }
}

impl Drop for FreezerGuard {
    fn drop(&mut self) {
        let mut target = self.target.borrow_mut();
        if target.frozen > 0 {
            target.frozen -= 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Freshly allocated, source not yet evaluated.
    Unknown,
    /// A hierarchy placeholder on the path to a submodule.
    Defined,
    /// Fully evaluated; re-importing is a no-op.
    Loaded,
}

pub struct ModuleObj {
    pub state: ModuleState,
    pub env: EnvRef,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    ReadBinary,
    Write,
    WriteBinary,
    Append,
}

impl OpenMode {
    #[must_use]
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "r" => Some(Self::Read),
            "rb" => Some(Self::ReadBinary),
            "w" => Some(Self::Write),
            "wb" => Some(Self::WriteBinary),
            "a" => Some(Self::Append),
            _ => None,
        }
    }
}

pub struct IoObj {
    pub path: String,
    pub mode: OpenMode,
    pub file: Option<File>,
}

pub struct ThreadObj {
    pub function: Rc<FunctionObj>,
    pub argument: Option<ObjectRef>,
    pub handle: Option<JoinHandle<()>>,
    /// Written by the spawned thread when the function body finishes.
    pub result: Arc<Mutex<Option<SnapshotValue>>>,
}

/// A builtin method bound to its receiver by member access.
#[derive(Clone)]
pub struct BoundBuiltinFunction {
    pub receiver: ObjectRef,
    pub method: Rc<TypeMethodDef>,
}

/// A user-type method bound to its receiver (instance or type).
#[derive(Clone)]
pub struct BoundUserFunction {
    pub receiver: ObjectRef,
    pub function: Rc<FunctionObj>,
}

/// A property slot bound to its owner, produced by member access and
/// consumed by calls or member assignment.
#[derive(Clone)]
pub struct BoundProperty {
    pub receiver: ObjectRef,
    pub slot: PropertySlot,
}

/// Iterator variants over the ordered and keyed containers. Container
/// iterators hold a [`FreezerGuard`] so the iterable cannot be mutated
/// while the loop runs.
pub struct IteratorObj {
    pub target: IterTarget,
    pub index: usize,
    pub freezer: Option<Rc<FreezerGuard>>,
}

pub enum IterTarget {
    Array(ObjectRef),
    ArrayDouble(ObjectRef),
    ArrayComplex(ObjectRef),
    Dictionary(ObjectRef),
    Set(ObjectRef),
    Str(ObjectRef),
    Range(Range),
}

impl IteratorObj {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match &self.target {
            IterTarget::Array(target) => match &target.borrow().kind {
                ObjectKind::Array(items) => self.index < items.len(),
                _ => false,
            },
            IterTarget::ArrayDouble(target) => match &target.borrow().kind {
                ObjectKind::ArrayDouble(items) => self.index < items.len(),
                _ => false,
            },
            IterTarget::ArrayComplex(target) => match &target.borrow().kind {
                ObjectKind::ArrayComplex(items) => self.index < items.len(),
                _ => false,
            },
            IterTarget::Dictionary(target) => match &target.borrow().kind {
                ObjectKind::Dictionary(map) => self.index < map.len(),
                _ => false,
            },
            IterTarget::Set(target) => match &target.borrow().kind {
                ObjectKind::Set(set) => self.index < set.len(),
                _ => false,
            },
            IterTarget::Str(target) => match &target.borrow().kind {
                ObjectKind::Str(text) => self.index < text.chars().count(),
                _ => false,
            },
            IterTarget::Range(range) => (self.index as i64) < range.length(),
        }
    }

    /// Yields the next element, or `None` once exhausted. Dictionary
    /// iteration yields keys.
    pub fn next_value(&mut self) -> Option<ObjectRef> {
        if !self.is_valid() {
            return None;
        }
        let index = self.index;
        self.index += 1;
        match &self.target {
            IterTarget::Array(target) => match &target.borrow().kind {
                ObjectKind::Array(items) => items.get(index).cloned(),
                _ => None,
            },
            IterTarget::ArrayDouble(target) => match &target.borrow().kind {
                ObjectKind::ArrayDouble(items) => items.get(index).copied().map(double_obj),
                _ => None,
            },
            IterTarget::ArrayComplex(target) => match &target.borrow().kind {
                ObjectKind::ArrayComplex(items) => items
                    .get(index)
                    .copied()
                    .map(|value| alloc(ObjectKind::Complex(value))),
                _ => None,
            },
            IterTarget::Dictionary(target) => match &target.borrow().kind {
                ObjectKind::Dictionary(map) => {
                    map.get_index(index).map(|(key, _)| key.0.clone())
                }
                _ => None,
            },
            IterTarget::Set(target) => match &target.borrow().kind {
                ObjectKind::Set(set) => set.get_index(index).map(|key| key.0.clone()),
                _ => None,
            },
            IterTarget::Str(target) => match &target.borrow().kind {
                ObjectKind::Str(text) => text
                    .chars()
                    .nth(index)
                    .map(|ch| string_obj(ch.to_string())),
                _ => None,
            },
            IterTarget::Range(range) => Some(integer_obj(range.lower + (index as i64) * range.stride)),
        }
    }
}

// --- hashing and equality ---------------------------------------------

/// Key wrapper delegating hash/eq to the language's structural protocol.
#[derive(Clone)]
pub struct HashKey(pub ObjectRef);

impl PartialEq for HashKey {
    fn eq(&self, other: &Self) -> bool {
        object_eq(&self.0, &other.0)
    }
}

impl Eq for HashKey {}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(object_hash(&self.0.borrow()));
    }
}

/// Structural hash. Defined for every tag so map internals never panic;
/// whether a value may actually be used as a key is [`is_hashable`]'s call.
#[must_use]
pub fn object_hash(object: &Object) -> u64 {
    fn hash_one<T: Hash>(value: &T) -> u64 {
        let mut hasher = ahash::AHasher::default();
        value.hash(&mut hasher);
        hasher.finish()
    }

    match &object.kind {
        ObjectKind::Null => 0,
        ObjectKind::Integer(value) => hash_one(value),
        ObjectKind::Double(value) => hash_one(&value.to_bits()),
        ObjectKind::Complex(value) => hash_one(&value.re.to_bits()) ^ hash_one(&value.im.to_bits()),
        ObjectKind::Boolean(value) => hash_one(value),
        ObjectKind::Char(value) => hash_one(value),
        ObjectKind::Str(value) => hash_one(value),
        ObjectKind::Range(range) => {
            hash_one(&range.lower) ^ hash_one(&range.upper) ^ hash_one(&range.stride)
        }
        ObjectKind::Array(items) => items
            .iter()
            .fold(0, |acc, item| acc ^ object_hash(&item.borrow())),
        ObjectKind::ArrayDouble(items) => items
            .iter()
            .fold(0, |acc, item| acc ^ hash_one(&item.to_bits())),
        ObjectKind::ArrayComplex(items) => items
            .iter()
            .fold(0, |acc, item| acc ^ hash_one(&item.re.to_bits()) ^ hash_one(&item.im.to_bits())),
        ObjectKind::Dictionary(map) => map.iter().fold(0, |acc, (key, value)| {
            acc ^ object_hash(&key.0.borrow()) ^ object_hash(&value.borrow())
        }),
        ObjectKind::Set(set) => set
            .iter()
            .fold(0, |acc, key| acc ^ object_hash(&key.0.borrow())),
        _ => 0,
    }
}

/// Hashability: scalars always; containers only when frozen and every
/// transitively contained value is hashable; everything else never.
#[must_use]
pub fn is_hashable(object: &Object) -> bool {
    match &object.kind {
        ObjectKind::Null
        | ObjectKind::Integer(_)
        | ObjectKind::Double(_)
        | ObjectKind::Complex(_)
        | ObjectKind::Boolean(_)
        | ObjectKind::Char(_)
        | ObjectKind::Str(_) => true,
        ObjectKind::Array(items) => {
            object.frozen > 0 && items.iter().all(|item| is_hashable(&item.borrow()))
        }
        ObjectKind::ArrayDouble(_) | ObjectKind::ArrayComplex(_) => object.frozen > 0,
        ObjectKind::Dictionary(map) => {
            object.frozen > 0
                && map.iter().all(|(key, value)| {
                    is_hashable(&key.0.borrow()) && is_hashable(&value.borrow())
                })
        }
        ObjectKind::Set(set) => {
            object.frozen > 0 && set.iter().all(|key| is_hashable(&key.0.borrow()))
        }
        _ => false,
    }
}

/// Structural equality used by dictionary and set keys. Identity short
/// circuits; values of different tags are never equal.
#[must_use]
pub fn object_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    let a = a.borrow();
    let b = b.borrow();
    if a.tag() != b.tag() {
        return false;
    }
    match (&a.kind, &b.kind) {
        (ObjectKind::Null, ObjectKind::Null) => true,
        (ObjectKind::Integer(x), ObjectKind::Integer(y)) => x == y,
        (ObjectKind::Double(x), ObjectKind::Double(y)) => x == y,
        (ObjectKind::Complex(x), ObjectKind::Complex(y)) => x == y,
        (ObjectKind::Boolean(x), ObjectKind::Boolean(y)) => x == y,
        (ObjectKind::Char(x), ObjectKind::Char(y)) => x == y,
        (ObjectKind::Str(x), ObjectKind::Str(y)) => x == y,
        (ObjectKind::Range(x), ObjectKind::Range(y)) => x == y,
        (ObjectKind::Array(x), ObjectKind::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(m, n)| object_eq(m, n))
        }
        (ObjectKind::ArrayDouble(x), ObjectKind::ArrayDouble(y)) => x == y,
        (ObjectKind::ArrayComplex(x), ObjectKind::ArrayComplex(y)) => x == y,
        (ObjectKind::Dictionary(x), ObjectKind::Dictionary(y)) => {
            x.len() == y.len()
                && x.iter().all(|(key, value)| {
                    y.get(key).is_some_and(|other| object_eq(value, other))
                })
        }
        (ObjectKind::Set(x), ObjectKind::Set(y)) => {
            x.len() == y.len() && x.iter().all(|key| y.contains(key))
        }
        _ => false,
    }
}

// --- rendering ---------------------------------------------------------

/// Human-readable rendering of a value; strings keep their quotes (the
/// `print` builtin strips them).
#[must_use]
pub fn inspect(object: &ObjectRef) -> String {
    let object = object.borrow();
    inspect_inner(&object)
}

fn inspect_inner(object: &Object) -> String {
    match &object.kind {
        ObjectKind::Null => "null".to_string(),
        ObjectKind::Integer(value) => value.to_string(),
        ObjectKind::Double(value) => format!("{value:.6}"),
        ObjectKind::Complex(value) => format!("{:.6}{:+.6}j", value.re, value.im),
        ObjectKind::Boolean(value) => value.to_string(),
        ObjectKind::Char(value) => value.to_string(),
        ObjectKind::Str(value) => format!("\"{value}\""),
        ObjectKind::Range(range) => format!("{}:{}:{}", range.lower, range.upper, range.stride),
        ObjectKind::Array(items) => {
            let rendered: Vec<String> = items.iter().map(inspect).collect();
            format!("[{}]", rendered.join(", "))
        }
        ObjectKind::ArrayDouble(items) => {
            let rendered: Vec<String> = items.iter().map(|item| format!("{item:.6}")).collect();
            format!("[{}]", rendered.join(", "))
        }
        ObjectKind::ArrayComplex(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| format!("{:.6}{:+.6}j", item.re, item.im))
                .collect();
            format!("[{}]", rendered.join(", "))
        }
        ObjectKind::Dictionary(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}:{}", inspect(&key.0), inspect(value)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
        ObjectKind::Set(set) => {
            let rendered: Vec<String> = set.iter().map(|key| inspect(&key.0)).collect();
            format!("{{{}}}", rendered.join(", "))
        }
        ObjectKind::Function(function) => {
            let mut out = String::from("fn(");
            for (index, argument) in function.arguments.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                out.push_str(&argument.value);
                if let Some(ty) = &function.argument_types[index] {
                    let _ = write!(out, " : {}", ty.text());
                }
            }
            out.push(')');
            if let Some(ret) = &function.return_type {
                let _ = write!(out, " -> {}", ret.text());
            }
            out
        }
        ObjectKind::Builtin(builtin) => format!("builtin function {}", builtin.name),
        ObjectKind::UserType(user_type) => format!("type {}", user_type.name),
        ObjectKind::UserObject(instance) => format!("<{}>", instance.user_type.name),
        ObjectKind::BoundBuiltinTypeFunction(bound) => {
            format!("bound builtin function {}", bound.method.name)
        }
        ObjectKind::BoundUserTypeFunction(_) => "bound function".to_string(),
        ObjectKind::BoundBuiltinTypeProperty(bound)
        | ObjectKind::BoundUserTypeProperty(bound) => inspect(&bound.slot.borrow().value),
        ObjectKind::IOObject(io) => format!("<io {}>", io.path),
        ObjectKind::Iterator(_) => "Iterator()".to_string(),
        ObjectKind::Freezer(_) => "<freezer>".to_string(),
        ObjectKind::Module(module) => {
            if module.file_name.is_empty() {
                "module".to_string()
            } else {
                format!("module {}", module.file_name)
            }
        }
        ObjectKind::Thread(_) => "<thread>".to_string(),
        ObjectKind::Regex(pattern) => format!("<regex {}>", pattern.as_str()),
        ObjectKind::Error(error) => error.to_string(),
    }
}

// --- cloning -----------------------------------------------------------

/// Whether assignment copies the payload (scalars) or shares the
/// reference (aggregates).
#[must_use]
pub fn is_value_assigned(object: &ObjectRef) -> bool {
    matches!(
        object.borrow().kind,
        ObjectKind::Boolean(_)
            | ObjectKind::Integer(_)
            | ObjectKind::Str(_)
            | ObjectKind::Char(_)
            | ObjectKind::Double(_)
            | ObjectKind::Complex(_)
    )
}

/// Deep clone. The clone starts unfrozen and without a declared type;
/// dictionary and set keys keep their freeze counts so they remain valid
/// keys inside the cloned container.
#[must_use]
pub fn deep_clone(object: &ObjectRef) -> ObjectRef {
    let source = object.borrow();
    let kind = match &source.kind {
        ObjectKind::Null => ObjectKind::Null,
        ObjectKind::Integer(value) => ObjectKind::Integer(*value),
        ObjectKind::Double(value) => ObjectKind::Double(*value),
        ObjectKind::Complex(value) => ObjectKind::Complex(*value),
        ObjectKind::Boolean(value) => ObjectKind::Boolean(*value),
        ObjectKind::Char(value) => ObjectKind::Char(*value),
        ObjectKind::Str(value) => ObjectKind::Str(value.clone()),
        ObjectKind::Range(range) => ObjectKind::Range(*range),
        ObjectKind::Array(items) => ObjectKind::Array(items.iter().map(deep_clone).collect()),
        ObjectKind::ArrayDouble(items) => ObjectKind::ArrayDouble(items.clone()),
        ObjectKind::ArrayComplex(items) => ObjectKind::ArrayComplex(items.clone()),
        ObjectKind::Dictionary(map) => {
            let mut cloned = DictMap::default();
            for (key, value) in map {
                let cloned_key = deep_clone(&key.0);
                cloned_key.borrow_mut().frozen = key.0.borrow().frozen;
                cloned.insert(HashKey(cloned_key), deep_clone(value));
            }
            ObjectKind::Dictionary(cloned)
        }
        ObjectKind::Set(set) => {
            let mut cloned = SetData::default();
            for key in set {
                let cloned_key = deep_clone(&key.0);
                cloned_key.borrow_mut().frozen = key.0.borrow().frozen;
                cloned.insert(HashKey(cloned_key));
            }
            ObjectKind::Set(cloned)
        }
        ObjectKind::Function(function) => ObjectKind::Function(function.clone()),
        ObjectKind::Builtin(builtin) => ObjectKind::Builtin(builtin.clone()),
        ObjectKind::UserType(user_type) => ObjectKind::UserType(user_type.clone()),
        ObjectKind::UserObject(instance) => {
            let mut properties = PropertyMap::default();
            for (name, slot) in &instance.properties {
                let slot = slot.borrow();
                properties.insert(
                    name.clone(),
                    Rc::new(RefCell::new(Property {
                        value: deep_clone(&slot.value),
                        constant: slot.constant,
                        declared_type: slot.declared_type.clone(),
                    })),
                );
            }
            ObjectKind::UserObject(UserInstance {
                user_type: instance.user_type.clone(),
                properties,
                destructor: instance.destructor.clone(),
            })
        }
        ObjectKind::BoundBuiltinTypeFunction(bound) => {
            ObjectKind::BoundBuiltinTypeFunction(bound.clone())
        }
        ObjectKind::BoundBuiltinTypeProperty(bound) => {
            ObjectKind::BoundBuiltinTypeProperty(bound.clone())
        }
        ObjectKind::BoundUserTypeFunction(bound) => ObjectKind::BoundUserTypeFunction(bound.clone()),
        ObjectKind::BoundUserTypeProperty(bound) => ObjectKind::BoundUserTypeProperty(bound.clone()),
        ObjectKind::IOObject(io) => ObjectKind::IOObject(IoObj {
            path: io.path.clone(),
            mode: io.mode,
            file: None,
        }),
        ObjectKind::Iterator(iterator) => {
            let target = match &iterator.target {
                IterTarget::Array(target) => IterTarget::Array(target.clone()),
                IterTarget::ArrayDouble(target) => IterTarget::ArrayDouble(target.clone()),
                IterTarget::ArrayComplex(target) => IterTarget::ArrayComplex(target.clone()),
                IterTarget::Dictionary(target) => IterTarget::Dictionary(target.clone()),
                IterTarget::Set(target) => IterTarget::Set(target.clone()),
                IterTarget::Str(target) => IterTarget::Str(target.clone()),
                IterTarget::Range(range) => IterTarget::Range(*range),
            };
            ObjectKind::Iterator(IteratorObj {
                target,
                index: iterator.index,
                freezer: iterator.freezer.clone(),
            })
        }
        ObjectKind::Freezer(guard) => ObjectKind::Freezer(guard.clone()),
        ObjectKind::Module(module) => ObjectKind::Module(ModuleObj {
            state: module.state,
            env: module.env.clone(),
            file_name: module.file_name.clone(),
        }),
        ObjectKind::Thread(thread) => ObjectKind::Thread(ThreadObj {
            function: thread.function.clone(),
            argument: thread.argument.clone(),
            handle: None,
            result: Arc::new(Mutex::new(None)),
        }),
        ObjectKind::Regex(pattern) => ObjectKind::Regex(pattern.clone()),
        ObjectKind::Error(error) => ObjectKind::Error(error.clone()),
    };
    alloc(kind)
}

/// Truthiness is scalar only: null and false are falsy, a zero integer is
/// falsy, everything else is truthy.
#[must_use]
pub fn is_truthy(object: &ObjectRef) -> bool {
    match &object.borrow().kind {
        ObjectKind::Null => false,
        ObjectKind::Boolean(value) => *value,
        ObjectKind::Integer(value) => *value != 0,
        _ => true,
    }
}
