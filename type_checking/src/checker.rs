use crate::{
    builtin_types::BuiltinTypes,
    method_body_type_checker::MethodBodyTypeChecker,
    semantics::{SemanticError, Unrecoverable},
    type_analysis::TypeAnalysis,
    type_system::*,
};
use asciifile::{Span, Spanned};
use compiler_shared::context::Context;
use parser::ast;
use std::collections::{HashMap, HashSet};
use strtab::{StringTable, Symbol};

/// Check `program` and return the class registry together with the type of
/// every expression.
///
/// All problems are reported to `context`, checking never stops early.
/// The only modification of the tree is the insertion of implicit casts, so
/// checking the same program a second time neither changes it further nor
/// reports anything new.
pub fn check<'src>(
    strtab: &mut StringTable<'src>,
    program: &mut ast::Program<'src>,
    context: &Context<'src>,
) -> (TypeSystem<'src>, TypeAnalysis<'src>) {
    let mut sem_context = SemanticContext::new(context, strtab);

    let mut type_system = TypeSystem::default();
    let mut type_analysis = TypeAnalysis::new();

    BuiltinTypes::add_to(&mut type_system, strtab, &mut sem_context);

    let ast::Program { classes, arena } = program;

    let class_ids = add_types_from_ast(&mut type_system, &sem_context, classes);
    check_inheritance(&type_system, &sem_context, classes, &class_ids);
    check_main_method(&type_system, &sem_context, classes, &class_ids);

    for (class_decl, class_id) in classes.iter().zip(&class_ids) {
        if let Some(class_id) = class_id {
            MethodBodyTypeChecker::check_methods(
                class_decl,
                *class_id,
                &type_system,
                &mut type_analysis,
                arena,
                &sem_context,
            );
        }
    }

    (type_system, type_analysis)
}

pub struct SemanticContext<'ctx, 'src> {
    pub context: &'ctx Context<'src>,
    pub global_vars: HashMap<Symbol<'src>, CheckedType<'src>>,
    /// `String` is not a class, but a type of its own.
    pub string: Symbol<'src>,
}

impl<'ctx, 'src> SemanticContext<'ctx, 'src> {
    pub fn new(
        context: &'ctx Context<'src>,
        strtab: &mut StringTable<'src>,
    ) -> SemanticContext<'ctx, 'src> {
        SemanticContext {
            context,
            global_vars: HashMap::new(),
            string: strtab.intern("String"),
        }
    }

    pub fn report_error(&self, span: Span<'src>, error: SemanticError) {
        self.context.error(span, error)
    }

    pub fn report(&self, unrecoverable: Unrecoverable<'src>) {
        let Spanned { span, data } = unrecoverable.error;
        self.context.error(span, data)
    }
}

/// Register every class and interface, then the supertypes and finally the
/// members. The result is parallel to `classes`, redefinitions are `None`.
fn add_types_from_ast<'src>(
    type_system: &mut TypeSystem<'src>,
    context: &SemanticContext<'_, 'src>,
    classes: &[Spanned<'src, ast::ClassDeclaration<'src>>],
) -> Vec<Option<ClassDefId<'src>>> {
    // first pass: find all types and add them to the type system
    let class_ids = classes
        .iter()
        .map(|class_decl| {
            let name = class_decl.name.data;
            let redefinition = || {
                context.report_error(
                    class_decl.name.span,
                    SemanticError::RedefinitionError {
                        kind: class_decl.kind.to_string(),
                        name: name.to_string(),
                    },
                )
            };
            if name == context.string {
                redefinition();
                return None;
            }

            let mut class_def = ClassDef::new(name, class_decl.kind);
            class_def.is_abstract = class_decl.is_abstract;
            match type_system.add_class_def(class_def) {
                Ok(id) => Some(id),
                Err(ClassAlreadyDeclared) => {
                    redefinition();
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    log::debug!("registered {} classes", class_ids.iter().flatten().count());

    // second pass: resolve the names of parents and interfaces
    for (class_decl, class_id) in classes.iter().zip(&class_ids) {
        if let Some(class_id) = class_id {
            add_supertypes(type_system, context, class_decl, *class_id);
        }
    }
    for (class_decl, class_id) in classes.iter().zip(&class_ids) {
        if let Some(class_id) = class_id {
            if inherits_from_itself(type_system, *class_id) {
                context.report_error(
                    class_decl.name.span,
                    SemanticError::CyclicInheritance {
                        name: class_decl.name.data.to_string(),
                    },
                );
                let class_def = type_system.class_mut(*class_id);
                class_def.parent = None;
                class_def.interfaces.clear();
            }
        }
    }

    // third pass: scan members of all types, check their type references
    // against the first pass
    for (class_decl, class_id) in classes.iter().zip(&class_ids) {
        if let Some(class_id) = class_id {
            for member in &class_decl.members {
                add_member(type_system, context, class_decl, *class_id, member);
            }
        }
    }

    class_ids
}

fn add_supertypes<'src>(
    type_system: &mut TypeSystem<'src>,
    context: &SemanticContext<'_, 'src>,
    class_decl: &ast::ClassDeclaration<'src>,
    class_id: ClassDefId<'src>,
) {
    let lookup = |name: &Spanned<'src, Symbol<'src>>| match type_system.lookup_class(name.data) {
        Some((class_def, id)) => Some((class_def.is_interface(), id)),
        None => {
            context.report_error(
                name.span,
                SemanticError::ClassDoesNotExist {
                    class_name: name.data.to_string(),
                },
            );
            None
        }
    };

    let parent = class_decl
        .parent
        .as_ref()
        .and_then(|parent| match lookup(parent)? {
            (true, _) => {
                context.report_error(
                    parent.span,
                    SemanticError::CannotExtendInterface {
                        name: parent.data.to_string(),
                    },
                );
                None
            }
            (false, id) => Some(id),
        });

    let interfaces = class_decl
        .interfaces
        .iter()
        .filter_map(|interface| match lookup(interface)? {
            (true, id) => Some(id),
            (false, _) => {
                context.report_error(
                    interface.span,
                    SemanticError::NotAnInterface {
                        name: interface.data.to_string(),
                    },
                );
                None
            }
        })
        .collect();

    let class_def = type_system.class_mut(class_id);
    class_def.parent = parent;
    class_def.interfaces = interfaces;
}

/// Whether `id` is reachable from its own parents or extended interfaces.
fn inherits_from_itself<'src>(type_system: &TypeSystem<'src>, id: ClassDefId<'src>) -> bool {
    let class_def = type_system.class(id);
    let mut worklist = class_def
        .parent
        .iter()
        .chain(&class_def.interfaces)
        .cloned()
        .collect::<Vec<_>>();
    let mut seen = HashSet::new();
    while let Some(current) = worklist.pop() {
        if current == id {
            return true;
        }
        if seen.insert(current) {
            let current_def = type_system.class(current);
            worklist.extend(current_def.parent.iter().chain(&current_def.interfaces));
        }
    }
    false
}

fn add_member<'src>(
    type_system: &mut TypeSystem<'src>,
    context: &SemanticContext<'_, 'src>,
    class_decl: &ast::ClassDeclaration<'src>,
    class_id: ClassDefId<'src>,
    member: &Spanned<'src, ast::ClassMember<'src>>,
) {
    use parser::ast::ClassMemberKind::*;
    let is_interface = class_decl.kind == ast::ClassKind::Interface;

    match &member.kind {
        Field(ty) => {
            if is_interface {
                context.report_error(member.span, SemanticError::FieldInInterface);
                return;
            }
            if member.modifiers.is_static {
                context.report_error(member.span, SemanticError::StaticFieldNotSupported);
            }

            let field_type = checked_type_from_ty(&ty.data, context, type_system, VoidIs::Forbidden);
            type_system
                .class_mut(class_id)
                .add_field(ClassFieldDef {
                    name: member.name,
                    owner: class_id,
                    ty: field_type,
                    can_write: true,
                })
                .unwrap_or_else(|_| {
                    context.report_error(
                        member.span,
                        SemanticError::RedefinitionError {
                            kind: "field".to_string(),
                            name: member.name.to_string(),
                        },
                    )
                });
        }
        Method(return_ty, params, body) => {
            let return_ty =
                checked_type_from_ty(&return_ty.data, context, type_system, VoidIs::Allowed);

            let mut previous_params = HashSet::new();
            let checked_params = params
                .iter()
                .filter_map(|p| {
                    if previous_params.insert(p.name) {
                        let ty =
                            checked_type_from_ty(&p.ty.data, context, type_system, VoidIs::Forbidden);
                        Some(MethodParamDef::new(p.name, ty))
                    } else {
                        context.report_error(
                            p.span,
                            SemanticError::RedefinitionError {
                                kind: "parameter".to_string(),
                                name: p.name.to_string(),
                            },
                        );
                        None
                    }
                })
                .collect::<Vec<_>>();

            let method_name = || member.name.to_string();
            let declared_abstract = member.modifiers.is_abstract;
            match body {
                Some(_) if is_interface => context.report_error(
                    member.span,
                    SemanticError::InterfaceMethodWithBody {
                        method_name: method_name(),
                    },
                ),
                Some(_) if declared_abstract => context.report_error(
                    member.span,
                    SemanticError::AbstractMethodWithBody {
                        method_name: method_name(),
                    },
                ),
                None if declared_abstract && !class_decl.is_abstract => context.report_error(
                    member.span,
                    SemanticError::AbstractMethodInConcreteClass {
                        class_name: class_decl.name.data.to_string(),
                        method_name: method_name(),
                    },
                ),
                None if !declared_abstract && !is_interface => context.report_error(
                    member.span,
                    SemanticError::MissingMethodBody {
                        method_name: method_name(),
                    },
                ),
                _ => {}
            }

            let is_static = member.modifiers.is_static;
            let is_main = is_static && member.name == *"main";
            let valid_main = is_main
                && member.modifiers.visibility == ast::Visibility::Public
                && return_ty == CheckedType::Void
                && match checked_params.as_slice() {
                    [] => true,
                    [param] => param.ty == CheckedType::create_array_type(CheckedType::String, 1),
                    _ => false,
                };
            if is_main && !valid_main {
                context.report_error(member.span, SemanticError::InvalidMainSignature);
            }

            let mut method = ClassMethodDef::new(member.name, class_id, checked_params, return_ty);
            method.is_static = is_static;
            method.is_abstract = is_interface || declared_abstract || body.is_none();
            method.is_main = valid_main;

            type_system
                .class_mut(class_id)
                .add_method(method)
                .unwrap_or_else(|_| {
                    context.report_error(
                        member.span,
                        SemanticError::RedefinitionError {
                            kind: "method".to_string(),
                            name: member.name.to_string(),
                        },
                    )
                });
        }
    }
}

/// Overriding keeps signatures, concrete classes implement everything that
/// their ancestors and interfaces leave abstract.
fn check_inheritance<'src>(
    type_system: &TypeSystem<'src>,
    context: &SemanticContext<'_, 'src>,
    classes: &[Spanned<'src, ast::ClassDeclaration<'src>>],
    class_ids: &[Option<ClassDefId<'src>>],
) {
    for (class_decl, class_id) in classes.iter().zip(class_ids) {
        let class_id = match class_id {
            Some(class_id) => *class_id,
            None => continue,
        };
        let supertypes = type_system
            .parent_chain(class_id)
            .into_iter()
            .chain(type_system.all_interfaces(class_id))
            .filter(|id| *id != class_id)
            .collect::<Vec<_>>();

        for member in class_decl.members.iter().filter(|m| m.kind.is_method()) {
            let method = match type_system.class(class_id).method(member.name) {
                Some(method) => method,
                None => continue,
            };
            let overridden = supertypes
                .iter()
                .filter_map(|id| type_system.class(*id).method(member.name))
                .find(|other| {
                    !method.has_same_signature(other) || method.is_static != other.is_static
                });
            if let Some(overridden) = overridden {
                context.report_error(
                    member.span,
                    SemanticError::OverrideSignatureMismatch {
                        method_name: member.name.to_string(),
                        overridden_in: overridden.owner.to_string(),
                    },
                );
            }
        }

        let class_def = type_system.class(class_id);
        if class_def.is_interface() || class_def.is_abstract {
            continue;
        }
        let mut reported = HashSet::new();
        for required in supertypes
            .iter()
            .flat_map(|id| type_system.class(*id).methods())
            .filter(|method| method.is_abstract)
        {
            let implemented = type_system
                .parent_chain(class_id)
                .into_iter()
                .filter_map(|id| type_system.class(id).method(required.name))
                .next()
                .map_or(false, |method| !method.is_abstract);
            if !implemented && reported.insert(required.name) {
                context.report_error(
                    class_decl.name.span,
                    SemanticError::MissingMethodImplementation {
                        class_name: class_decl.name.data.to_string(),
                        method_name: required.name.to_string(),
                        declared_in: required.owner.to_string(),
                    },
                );
            }
        }
    }
}

fn check_main_method<'src>(
    type_system: &TypeSystem<'src>,
    context: &SemanticContext<'_, 'src>,
    classes: &[Spanned<'src, ast::ClassDeclaration<'src>>],
    class_ids: &[Option<ClassDefId<'src>>],
) {
    let mut amount = 0;
    for (class_decl, class_id) in classes.iter().zip(class_ids) {
        let class_def = match class_id {
            Some(class_id) => type_system.class(*class_id),
            None => continue,
        };
        for member in &class_decl.members {
            let is_main = member.kind.is_method()
                && class_def
                    .method(member.name)
                    .map_or(false, |method| method.is_main);
            if is_main {
                amount += 1;
                if amount > 1 {
                    context.report_error(
                        member.span,
                        SemanticError::MultipleMainMethods { amount },
                    );
                }
            }
        }
    }

    if amount == 0 {
        context
            .context
            .diagnostics
            .error(Box::new(SemanticError::NoMainMethod));
    }
}

#[derive(Debug, Clone, Copy)]
pub enum VoidIs {
    Allowed,
    Forbidden,
}

pub fn checked_type_from_basic_ty<'src>(
    basic_ty: &Spanned<'src, ast::BasicType<'src>>,
    context: &SemanticContext<'_, 'src>,
    type_system: &TypeSystem<'src>,
    void_handling: VoidIs,
) -> CheckedType<'src> {
    use self::ast::BasicType::*;
    match &basic_ty.data {
        Int => CheckedType::Int,
        Long => CheckedType::Long,
        Char => CheckedType::Char,
        Boolean => CheckedType::Boolean,
        Void => match void_handling {
            VoidIs::Allowed => CheckedType::Void,
            VoidIs::Forbidden => {
                context.report_error(basic_ty.span, SemanticError::VoidNotAllowed);
                CheckedType::Error
            }
        },
        Custom(name) if *name == context.string => CheckedType::String,
        Custom(name) => match type_system.lookup_class(*name) {
            Some((_, class_id)) => CheckedType::TypeRef(class_id),
            None => {
                context.report_error(
                    basic_ty.span,
                    SemanticError::ClassDoesNotExist {
                        class_name: name.to_string(),
                    },
                );
                CheckedType::Error
            }
        },
    }
}

pub fn checked_type_from_ty<'src>(
    ty: &ast::Type<'src>,
    context: &SemanticContext<'_, 'src>,
    type_system: &TypeSystem<'src>,
    void_handling: VoidIs,
) -> CheckedType<'src> {
    let void_handling = if ty.array_depth > 0 {
        VoidIs::Forbidden
    } else {
        void_handling
    };

    let checked_ty = checked_type_from_basic_ty(&ty.basic, context, type_system, void_handling);
    CheckedType::create_array_type(checked_ty, ty.array_depth)
}
