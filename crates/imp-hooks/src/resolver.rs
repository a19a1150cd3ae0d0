//! Symbol resolution across candidate names.
//!
//! Different host builds expose the same logical symbol under different
//! names, so every lookup takes an ordered list of candidates and stops at
//! the first one that resolves. Exhausting the list is an ordinary outcome.

use imp_core::{
    ClassHandle, FieldHandle, Introspect, LoaderId, MethodHandle, ResolvedSymbol, Signature,
    SymbolCandidates, SymbolDescriptor,
};

/// Stateless lookup over a host's [`Introspect`] capability.
pub struct Resolver<'h, H: Introspect + ?Sized> {
    host: &'h H,
}

impl<'h, H: Introspect + ?Sized> Resolver<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// First candidate that resolves in `loader`, if any.
    pub fn resolve(
        &self,
        candidates: &SymbolCandidates,
        loader: &LoaderId,
    ) -> Option<ResolvedSymbol> {
        candidates
            .iter()
            .find_map(|candidate| self.resolve_one(candidate, loader))
    }

    /// Class-only convenience over [`Self::resolve`]. Member candidates in the
    /// list are skipped.
    pub fn resolve_class(
        &self,
        candidates: &SymbolCandidates,
        loader: &LoaderId,
    ) -> Option<ClassHandle> {
        candidates
            .iter()
            .filter(|c| matches!(c, SymbolDescriptor::Class { .. }))
            .find_map(|c| self.load_class(c.class_name(), loader))
    }

    pub fn resolve_one(
        &self,
        descriptor: &SymbolDescriptor,
        loader: &LoaderId,
    ) -> Option<ResolvedSymbol> {
        let class = self.load_class(descriptor.class_name(), loader)?;
        match descriptor {
            SymbolDescriptor::Class { .. } => Some(ResolvedSymbol::Class(class)),
            SymbolDescriptor::Method {
                name, signature, ..
            } => self
                .find_method(&class, name, signature)
                .map(ResolvedSymbol::Method),
            SymbolDescriptor::Field { name, .. } => {
                self.find_field(&class, name).map(ResolvedSymbol::Field)
            }
        }
    }

    /// Declared method `name` whose parameters satisfy `signature`.
    ///
    /// Overloads that share the name but not the signature never match; with
    /// [`Signature::Any`] the first declared overload wins.
    pub fn find_method(
        &self,
        class: &ClassHandle,
        name: &str,
        signature: &Signature,
    ) -> Option<MethodHandle> {
        self.host
            .declared_methods(class)
            .into_iter()
            .find(|m| m.name == name && signature.matches(&m.params))
    }

    pub fn find_field(&self, class: &ClassHandle, name: &str) -> Option<FieldHandle> {
        self.host
            .declared_fields(class)
            .into_iter()
            .find(|f| f.name == name)
    }

    fn load_class(&self, name: &str, loader: &LoaderId) -> Option<ClassHandle> {
        match self.host.load_class(name, loader) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(class = name, %loader, "Class lookup rejected: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_host::MemoryHost;
    use imp_core::TypeName;

    fn boot() -> LoaderId {
        LoaderId::new("boot")
    }

    #[test]
    fn test_none_resolved_when_all_candidates_absent() {
        let host = MemoryHost::new();
        let resolver = Resolver::new(&host);
        let candidates = SymbolCandidates::classes(["a.Missing", "b.Missing"]);
        assert!(resolver.resolve(&candidates, &boot()).is_none());
        assert_eq!(host.lookups(), 2);
    }

    #[test]
    fn test_first_resolvable_candidate_wins_and_short_circuits() {
        let host = MemoryHost::new();
        host.class(&boot(), "b.Second");
        host.class(&boot(), "c.Third");
        let resolver = Resolver::new(&host);

        let candidates = SymbolCandidates::classes(["a.First", "b.Second", "c.Third"]);
        let resolved = resolver.resolve(&candidates, &boot()).unwrap();
        assert_eq!(resolved.as_class().unwrap().name, "b.Second");
        // "c.Third" is never looked up
        assert_eq!(host.lookups(), 2);
    }

    #[test]
    fn test_class_is_scoped_to_loader() {
        let host = MemoryHost::new();
        host.class(&LoaderId::new("dex-1"), "a.Only");
        let resolver = Resolver::new(&host);

        let candidates = SymbolCandidates::classes(["a.Only"]);
        assert!(resolver.resolve_class(&candidates, &boot()).is_none());
        assert!(
            resolver
                .resolve_class(&candidates, &LoaderId::new("dex-1"))
                .is_some()
        );
    }

    #[test]
    fn test_malformed_name_is_treated_as_absent() {
        let host = MemoryHost::new();
        host.class(&boot(), "a.Valid");
        let resolver = Resolver::new(&host);
        let candidates = SymbolCandidates::classes(["", "a.Valid"]);
        let class = resolver.resolve_class(&candidates, &boot()).unwrap();
        assert_eq!(class.name, "a.Valid");
    }

    #[test]
    fn test_method_exact_signature() {
        let host = MemoryHost::new();
        host.class(&boot(), "a.Window")
            .method("setColor", &["long"], "void")
            .method("setColor", &["int"], "void");
        let resolver = Resolver::new(&host);

        let d = SymbolDescriptor::method("a.Window", "setColor", Signature::exact(["int"]));
        let method = resolver.resolve_one(&d, &boot()).unwrap();
        assert_eq!(method.as_method().unwrap().params, vec![TypeName::int()]);
    }

    #[test]
    fn test_overloads_without_matching_signature_resolve_to_none() {
        let host = MemoryHost::new();
        host.class(&boot(), "a.Window")
            .method("setColor", &["long"], "void")
            .method("setColor", &["int", "int"], "void");
        let resolver = Resolver::new(&host);

        let d = SymbolDescriptor::method("a.Window", "setColor", Signature::exact(["int"]));
        assert!(resolver.resolve_one(&d, &boot()).is_none());
    }

    #[test]
    fn test_any_signature_takes_first_declared_overload() {
        let host = MemoryHost::new();
        host.class(&boot(), "a.View")
            .method("add", &["int"], "void")
            .method("add", &[], "void");
        let resolver = Resolver::new(&host);

        let d = SymbolDescriptor::method("a.View", "add", Signature::Any);
        let method = resolver.resolve_one(&d, &boot()).unwrap();
        assert_eq!(method.as_method().unwrap().params.len(), 1);
    }

    #[test]
    fn test_member_candidates_fall_back_in_order() {
        let host = MemoryHost::new();
        host.class(&boot(), "old.Api").method("check", &[], "boolean");
        let resolver = Resolver::new(&host);

        let candidates = SymbolCandidates::new(vec![
            SymbolDescriptor::method("new.Api", "check", Signature::exact(Vec::<TypeName>::new())),
            SymbolDescriptor::method("old.Api", "check", Signature::exact(Vec::<TypeName>::new())),
        ]);
        let method = resolver.resolve(&candidates, &boot()).unwrap();
        assert_eq!(method.as_method().unwrap().class.name, "old.Api");
    }

    #[test]
    fn test_field_resolution() {
        let host = MemoryHost::new();
        host.class(&boot(), "a.Injector")
            .static_field("sFlag", "int", imp_core::Value::Int(0));
        let resolver = Resolver::new(&host);

        let found = resolver.resolve_one(&SymbolDescriptor::field("a.Injector", "sFlag"), &boot());
        assert_eq!(found.unwrap().as_field().unwrap().name, "sFlag");
        let missing =
            resolver.resolve_one(&SymbolDescriptor::field("a.Injector", "sOther"), &boot());
        assert!(missing.is_none());
    }

    #[test]
    fn test_resolution_installs_nothing() {
        let host = MemoryHost::new();
        host.class(&boot(), "a.Api").method("check", &[], "boolean");
        let resolver = Resolver::new(&host);
        let d = SymbolDescriptor::method("a.Api", "check", Signature::Any);
        resolver.resolve_one(&d, &boot());
        assert_eq!(host.installs(), 0);
    }
}
