use parser::ast;
use std::{collections::HashMap, fmt, rc::Rc};
use strtab::Symbol;

#[derive(Debug)]
pub struct ClassAlreadyDeclared;
#[derive(Debug)]
pub struct MemberAlreadyDeclared;

/// Registry of every class and interface of a program, including the
/// builtin ones.
#[derive(Debug, Default)]
pub struct TypeSystem<'src> {
    defined_classes: HashMap<Symbol<'src>, ClassDef<'src>>,
}

impl<'src> TypeSystem<'src> {
    pub fn is_type_defined(&self, name: Symbol<'src>) -> bool {
        self.defined_classes.contains_key(&name)
    }

    pub fn add_class_def(
        &mut self,
        class_def: ClassDef<'src>,
    ) -> Result<ClassDefId<'src>, ClassAlreadyDeclared> {
        if self.defined_classes.contains_key(&class_def.name) {
            return Err(ClassAlreadyDeclared);
        }
        let id = ClassDefId { id: class_def.name };
        self.defined_classes.insert(class_def.name, class_def);
        Ok(id)
    }

    pub fn class(&self, id: ClassDefId<'src>) -> &ClassDef<'src> {
        self.defined_classes
            .get(&id.id)
            .expect("Ids always point to existing classes")
    }

    pub fn class_mut(&mut self, id: ClassDefId<'src>) -> &mut ClassDef<'src> {
        self.defined_classes
            .get_mut(&id.id)
            .expect("Ids always point to existing classes")
    }

    pub fn lookup_class(&self, name: Symbol<'src>) -> Option<(&ClassDef<'src>, ClassDefId<'src>)> {
        self.defined_classes
            .get(&name)
            .map(|class| (class, ClassDefId { id: name }))
    }

    /// The class itself followed by its ancestors, nearest first. Stops at
    /// the first class seen twice, so a cyclic hierarchy still terminates.
    pub fn parent_chain(&self, id: ClassDefId<'src>) -> Vec<ClassDefId<'src>> {
        let mut chain = vec![id];
        let mut current = self.class(id).parent;
        while let Some(parent) = current {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.class(parent).parent;
        }
        chain
    }

    /// Every interface implemented by `id`, directly, through an ancestor or
    /// through interface inheritance. For an interface this includes the
    /// interface itself.
    pub fn all_interfaces(&self, id: ClassDefId<'src>) -> Vec<ClassDefId<'src>> {
        let mut found = Vec::new();
        let mut worklist = Vec::new();
        for class in self.parent_chain(id) {
            let class_def = self.class(class);
            if class_def.kind == ast::ClassKind::Interface {
                worklist.push(class);
            }
            worklist.extend(class_def.interfaces.iter().cloned());
        }
        while let Some(interface) = worklist.pop() {
            if found.contains(&interface) {
                continue;
            }
            found.push(interface);
            worklist.extend(self.class(interface).interfaces.iter().cloned());
        }
        found
    }

    /// `sub` is `sup`, a descendant of `sup`, or implements the interface
    /// `sup`.
    pub fn is_subtype_of(&self, sub: ClassDefId<'src>, sup: ClassDefId<'src>) -> bool {
        if self.parent_chain(sub).contains(&sup) {
            return true;
        }
        self.class(sup).kind == ast::ClassKind::Interface
            && self.all_interfaces(sub).contains(&sup)
    }

    /// Fields are inherited along the parent chain.
    pub fn lookup_field(
        &self,
        id: ClassDefId<'src>,
        name: Symbol<'src>,
    ) -> Option<Rc<ClassFieldDef<'src>>> {
        self.parent_chain(id)
            .into_iter()
            .filter_map(|class| self.class(class).field(name))
            .next()
    }

    /// Look a method up along the parent chain, then in the implemented
    /// interfaces. The first hit is the most specific definition.
    pub fn lookup_method(
        &self,
        id: ClassDefId<'src>,
        name: Symbol<'src>,
    ) -> Option<Rc<ClassMethodDef<'src>>> {
        self.parent_chain(id)
            .into_iter()
            .chain(self.all_interfaces(id))
            .filter_map(|class| self.class(class).method(name))
            .next()
    }

    /// All fields of instances of `id`, the ones of the root class first.
    pub fn instance_fields(&self, id: ClassDefId<'src>) -> Vec<Rc<ClassFieldDef<'src>>> {
        let mut fields = Vec::new();
        for class in self.parent_chain(id).into_iter().rev() {
            fields.extend(self.class(class).fields().cloned());
        }
        fields
    }

    /// Names of all fields visible in `id`, used for "did you mean" hints.
    pub fn visible_field_names(&self, id: ClassDefId<'src>) -> Vec<Symbol<'src>> {
        self.instance_fields(id)
            .iter()
            .map(|field| field.name)
            .collect()
    }
}

/// A `ClassDefId` refers to a class definition.
///
/// Having an instance of this struct ensures that
/// the type system that issued this instance can
/// provide the definition of that class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassDefId<'src> {
    id: Symbol<'src>,
}

impl<'src> From<ClassDefId<'src>> for CheckedType<'src> {
    fn from(id: ClassDefId<'src>) -> CheckedType<'src> {
        CheckedType::TypeRef(id)
    }
}

impl<'src> fmt::Display for ClassDefId<'src> {
    fn fmt(&self, f: &'_ mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<'src> ClassDefId<'src> {
    pub fn as_str(&self) -> &'src str {
        self.id.as_str()
    }

    pub fn id(&self) -> Symbol<'src> {
        self.id
    }
}

#[derive(Debug)]
pub struct ClassDef<'src> {
    pub name: Symbol<'src>,
    pub kind: ast::ClassKind,
    pub is_abstract: bool,
    pub is_builtin: bool,
    pub parent: Option<ClassDefId<'src>>,
    pub interfaces: Vec<ClassDefId<'src>>,
    fields: Vec<Rc<ClassFieldDef<'src>>>,
    methods: Vec<Rc<ClassMethodDef<'src>>>,
}

impl<'src> ClassDef<'src> {
    pub fn new(name: Symbol<'src>, kind: ast::ClassKind) -> ClassDef<'src> {
        ClassDef {
            name,
            kind,
            is_abstract: false,
            is_builtin: false,
            parent: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn builtin(name: Symbol<'src>) -> ClassDef<'src> {
        ClassDef {
            is_builtin: true,
            ..ClassDef::new(name, ast::ClassKind::Class)
        }
    }

    pub fn id(&self) -> ClassDefId<'src> {
        ClassDefId { id: self.name }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ast::ClassKind::Interface
    }

    pub fn add_field(&mut self, field: ClassFieldDef<'src>) -> Result<(), MemberAlreadyDeclared> {
        if self.field(field.name).is_some() {
            return Err(MemberAlreadyDeclared);
        }
        self.fields.push(Rc::new(field));
        Ok(())
    }

    pub fn field(&self, name: Symbol<'src>) -> Option<Rc<ClassFieldDef<'src>>> {
        self.fields.iter().find(|f| f.name == name).map(Rc::clone)
    }

    /// In declaration order
    pub fn fields(&self) -> impl Iterator<Item = &Rc<ClassFieldDef<'src>>> {
        self.fields.iter()
    }

    pub fn add_method(&mut self, method: ClassMethodDef<'src>) -> Result<(), MemberAlreadyDeclared> {
        if self.method(method.name).is_some() {
            return Err(MemberAlreadyDeclared);
        }
        self.methods.push(Rc::new(method));
        Ok(())
    }

    pub fn method(&self, name: Symbol<'src>) -> Option<Rc<ClassMethodDef<'src>>> {
        self.methods.iter().find(|m| m.name == name).map(Rc::clone)
    }

    /// In declaration order
    pub fn methods(&self) -> impl Iterator<Item = &Rc<ClassMethodDef<'src>>> {
        self.methods.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinMethod {
    /// `System.out.println(x)`
    Println,
    /// `System.out.print(x)`
    Print,
}

#[derive(Debug)]
pub struct ClassMethodDef<'src> {
    pub name: Symbol<'src>,
    pub owner: ClassDefId<'src>,
    /// params does not include `this`
    pub params: Vec<Rc<MethodParamDef<'src>>>,
    pub return_ty: CheckedType<'src>,
    pub is_static: bool,
    /// Declared without a body (interface or abstract methods).
    pub is_abstract: bool,
    pub is_main: bool,
    pub builtin: Option<BuiltinMethod>,
}

impl<'src> ClassMethodDef<'src> {
    pub fn new(
        name: Symbol<'src>,
        owner: ClassDefId<'src>,
        params: Vec<MethodParamDef<'src>>,
        return_ty: CheckedType<'src>,
    ) -> ClassMethodDef<'src> {
        ClassMethodDef {
            name,
            owner,
            params: params.into_iter().map(Rc::new).collect(),
            return_ty,
            is_static: false,
            is_abstract: false,
            is_main: false,
            builtin: None,
        }
    }

    /// Same parameter types and return type.
    pub fn has_same_signature(&self, other: &ClassMethodDef<'src>) -> bool {
        self.return_ty == other.return_ty
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.ty == b.ty)
    }
}

#[derive(Debug)]
pub struct MethodParamDef<'src> {
    pub name: Symbol<'src>,
    pub ty: CheckedType<'src>,
}

impl<'src> MethodParamDef<'src> {
    pub fn new(name: Symbol<'src>, ty: CheckedType<'src>) -> MethodParamDef<'src> {
        MethodParamDef { name, ty }
    }
}

#[derive(Debug)]
pub struct ClassFieldDef<'src> {
    pub name: Symbol<'src>,
    pub owner: ClassDefId<'src>,
    pub ty: CheckedType<'src>,
    pub can_write: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckedType<'src> {
    Boolean,
    Char,
    Int,
    Long,
    String,
    Void,
    Null,
    TypeRef(ClassDefId<'src>),
    Array(Box<CheckedType<'src>>),
    /// The type of an expression whose checking failed. Compatible with
    /// everything so that one mistake yields one diagnostic.
    Error,
}

impl<'src> CheckedType<'src> {
    pub fn create_array_type(item_type: CheckedType<'src>, dimension: u64) -> CheckedType<'src> {
        (0..dimension).fold(item_type, |ty, _| CheckedType::Array(Box::new(ty)))
    }

    pub fn inner_type(&self) -> Option<&CheckedType<'src>> {
        match self {
            CheckedType::Array(ty) => Some(&*ty),
            _ => None,
        }
    }

    /// Position in the widening order `char < int < long`.
    fn numeric_rank(&self) -> Option<u8> {
        match self {
            CheckedType::Char => Some(0),
            CheckedType::Int => Some(1),
            CheckedType::Long => Some(2),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_reference(&self) -> bool {
        match self {
            CheckedType::String
            | CheckedType::Null
            | CheckedType::TypeRef(_)
            | CheckedType::Array(_) => true,
            _ => false,
        }
    }

    /// Types `System.out.println` accepts.
    pub fn is_printable(&self) -> bool {
        match self {
            CheckedType::Boolean
            | CheckedType::Char
            | CheckedType::Int
            | CheckedType::Long
            | CheckedType::String
            | CheckedType::Error => true,
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        *self == CheckedType::Error
    }

    /// Whether a value of type `other` can be used where `self` is
    /// expected, possibly after an implicit widening.
    pub fn is_super_of(&self, other: &CheckedType<'src>, ts: &TypeSystem<'src>) -> bool {
        use self::CheckedType::{Array, Null, TypeRef};

        if self == other || self.is_error() || other.is_error() {
            return true;
        }
        if let (Some(wide), Some(narrow)) = (self.numeric_rank(), other.numeric_rank()) {
            return wide >= narrow;
        }
        match (self, other) {
            (_, Null) => self.is_reference(),
            (TypeRef(sup), TypeRef(sub)) => ts.is_subtype_of(*sub, *sup),
            (Array(sup), Array(sub)) => {
                sup.is_reference() && sub.is_reference() && sup.is_super_of(sub, ts)
            }
            _ => false,
        }
    }

    /// The narrowest type two *distinct* numeric types can both be widened
    /// to. `None` for equal types and for anything non-numeric.
    pub fn mixed_class(&self, other: &CheckedType<'src>) -> Option<CheckedType<'src>> {
        let (a, b) = (self.numeric_rank()?, other.numeric_rank()?);
        if a == b {
            return None;
        }
        Some(if a > b { self.clone() } else { other.clone() })
    }

    /// The source level spelling of a numeric type, used when inserting
    /// implicit casts.
    pub fn numeric_basic_type(&self) -> Option<ast::BasicType<'src>> {
        match self {
            CheckedType::Char => Some(ast::BasicType::Char),
            CheckedType::Int => Some(ast::BasicType::Int),
            CheckedType::Long => Some(ast::BasicType::Long),
            _ => None,
        }
    }
}

impl<'src> fmt::Display for CheckedType<'src> {
    fn fmt(&self, f: &'_ mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckedType::Boolean => write!(f, "boolean"),
            CheckedType::Char => write!(f, "char"),
            CheckedType::Int => write!(f, "int"),
            CheckedType::Long => write!(f, "long"),
            CheckedType::String => write!(f, "String"),
            CheckedType::Void => write!(f, "void"),
            CheckedType::Null => write!(f, "null"),
            CheckedType::TypeRef(name) => write!(f, "{}", name),
            CheckedType::Array(item) => write!(f, "{}[]", item),
            CheckedType::Error => write!(f, "<error>"),
        }
    }
}
