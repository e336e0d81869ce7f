use crate::{checker::SemanticContext, type_system::*};
use strtab::StringTable;

/// The builtin classes are prefixed with `$` so that they cannot clash
/// with user defined classes.
pub struct BuiltinTypes<'src> {
    pub system: ClassDefId<'src>,
    pub writer: ClassDefId<'src>,
}

impl<'src> BuiltinTypes<'src> {
    pub fn add_to(
        type_system: &mut TypeSystem<'src>,
        strtab: &mut StringTable<'src>,
        context: &mut SemanticContext<'_, 'src>,
    ) -> BuiltinTypes<'src> {
        let writer = {
            let mut writer_class_def = ClassDef::builtin(strtab.intern("$Writer"));
            let writer = writer_class_def.id();
            let data = strtab.intern("data");

            let printers = [
                ("println", BuiltinMethod::Println),
                ("print", BuiltinMethod::Print),
            ];
            for (name, builtin) in &printers {
                // any printable argument is accepted, see `CheckedType::is_printable`
                let mut method = ClassMethodDef::new(
                    strtab.intern(*name),
                    writer,
                    vec![MethodParamDef::new(data, CheckedType::Error)],
                    CheckedType::Void,
                );
                method.builtin = Some(*builtin);
                writer_class_def
                    .add_method(method)
                    .expect("builtin methods have distinct names");
            }
            type_system
                .add_class_def(writer_class_def)
                .expect("builtin classes are added first")
        };

        let system = {
            let mut system_class_def = ClassDef::builtin(strtab.intern("$System"));
            let system = system_class_def.id();
            system_class_def
                .add_field(ClassFieldDef {
                    name: strtab.intern("out"),
                    owner: system,
                    ty: writer.into(),
                    can_write: false,
                })
                .expect("builtin fields have distinct names");
            type_system
                .add_class_def(system_class_def)
                .expect("builtin classes are added first")
        };

        context
            .global_vars
            .insert(strtab.intern("System"), system.into());

        BuiltinTypes {
            system,
            writer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use compiler_shared::context::Context;

    #[test]
    fn system_out_println_is_reachable() {
        let file = AsciiFile::new(b"").unwrap();
        let ctx = Context::dummy(&file);
        let mut strtab = StringTable::new();
        let mut type_system = TypeSystem::default();
        let mut sem_context = SemanticContext::new(&ctx, &mut strtab);

        let builtins = BuiltinTypes::add_to(&mut type_system, &mut strtab, &mut sem_context);

        let system_ty = &sem_context.global_vars[&strtab.intern("System")];
        assert_eq!(&CheckedType::TypeRef(builtins.system), system_ty);
        let out = type_system
            .lookup_field(builtins.system, strtab.intern("out"))
            .unwrap();
        assert!(!out.can_write);
        assert_eq!(CheckedType::TypeRef(builtins.writer), out.ty);
        let println = type_system
            .lookup_method(builtins.writer, strtab.intern("println"))
            .unwrap();
        assert_eq!(Some(BuiltinMethod::Println), println.builtin);
        assert!(type_system.class(builtins.system).is_builtin);
    }
}
