//! Kind-specific candidate filtering.
//!
//! Candidate production gathers broadly (all visible declarations, all
//! members of a class); this filter decides, per completion kind, which of
//! those a declaration is actually a sensible answer for.

use tracing::debug;

use crate::completion::context::{CompletionContext, CompletionKind};
use crate::config::ExceptionFallback;
use crate::symbols::{
    ClassModifier, Declaration, DeclarationId, DeclarationKind, SymbolIndex,
};

pub struct CandidateFilter<'a> {
    db: &'a SymbolIndex,
    exception_fallback: ExceptionFallback,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(db: &'a SymbolIndex, exception_fallback: ExceptionFallback) -> Self {
        Self {
            db,
            exception_fallback,
        }
    }

    /// Whether `declaration` may be offered for `ctx`.
    pub fn accepts(&self, ctx: &CompletionContext, id: DeclarationId) -> bool {
        let decl = self.db.declaration(id);
        if ctx.excluded().contains(&decl.qualified) {
            return false;
        }

        match ctx.kind() {
            CompletionKind::ExceptionChoose => self.accepts_exception_class(&decl, id),
            CompletionKind::ExceptionInstanceChoose => self.accepts_exception_instance(&decl),
            CompletionKind::NewClassChoose => {
                decl.kind == DeclarationKind::Class && decl.class_modifier != ClassModifier::Abstract
            }
            CompletionKind::ClassExtendsChoose => {
                decl.kind == DeclarationKind::Class && decl.class_modifier != ClassModifier::Final
            }
            CompletionKind::InterfaceChoose => decl.kind == DeclarationKind::Interface,
            CompletionKind::InstanceOfChoose => decl.is_class_like(),
            CompletionKind::NamespaceChoose => decl.kind == DeclarationKind::Namespace,
            CompletionKind::BackslashAccess => {
                decl.kind == DeclarationKind::Namespace || decl.is_class_like()
            }
            // Member access has its own visibility/staticness rules applied
            // at production time; everything else takes any declaration.
            _ => true,
        }
    }

    /// `catch (` and `throw new ` want concrete classes below the known
    /// exception root.
    fn accepts_exception_class(&self, decl: &Declaration, id: DeclarationId) -> bool {
        if decl.kind != DeclarationKind::Class || decl.class_modifier == ClassModifier::Abstract {
            return false;
        }
        match self.db.exception_base() {
            Some(base) => id == base || self.db.is_base_class(id, base),
            None => {
                debug!("no exception base class in index");
                self.exception_fallback == ExceptionFallback::ShowAll
            }
        }
    }

    /// `throw ` wants existing instances: variables typed as an exception.
    fn accepts_exception_instance(&self, decl: &Declaration) -> bool {
        if decl.kind != DeclarationKind::Variable {
            return false;
        }
        let Some(class_name) = decl.declared_type else {
            return false;
        };
        let Some(class) = self.db.find_class(class_name) else {
            return false;
        };
        match self.db.exception_base() {
            Some(base) => class == base || self.db.is_base_class(class, base),
            None => self.exception_fallback == ExceptionFallback::ShowAll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::SymbolExpressionEvaluator;
    use crate::symbols::QualifiedName;

    fn exception_db() -> SymbolIndex {
        let db = SymbolIndex::new();
        db.add_declaration(Declaration::new(
            "Exception",
            DeclarationKind::Class,
            db.global_scope(),
        ));
        let mut io = Declaration::new("IoError", DeclarationKind::Class, db.global_scope());
        io.base_classes = vec![QualifiedName::new("Exception")];
        db.add_declaration(io);
        let mut base = Declaration::new("AbstractError", DeclarationKind::Class, db.global_scope());
        base.base_classes = vec![QualifiedName::new("Exception")];
        base.class_modifier = ClassModifier::Abstract;
        db.add_declaration(base);
        db.add_declaration(Declaration::new(
            "Plain",
            DeclarationKind::Class,
            db.global_scope(),
        ));
        db
    }

    fn classify(db: &SymbolIndex, text: &str) -> CompletionContext {
        let evaluator = SymbolExpressionEvaluator::new(db);
        CompletionContext::classify(
            db,
            &evaluator,
            db.global_scope(),
            text,
            "",
            text.len() as u32,
        )
    }

    #[test]
    fn exception_choose_keeps_concrete_descendants_only() {
        let db = exception_db();
        let ctx = classify(&db, "<?php throw new ");
        let filter = CandidateFilter::new(&db, ExceptionFallback::ShowNone);
        let accepted: Vec<String> = (0..4)
            .filter(|&id| filter.accepts(&ctx, id))
            .map(|id| db.declaration(id).name)
            .collect();
        assert_eq!(accepted, ["Exception", "IoError"]);
    }

    #[test]
    fn missing_exception_base_honours_fallback() {
        let db = SymbolIndex::new();
        let plain = db.add_declaration(Declaration::new(
            "Plain",
            DeclarationKind::Class,
            db.global_scope(),
        ));
        let ctx = classify(&db, "<?php throw new ");

        let strict = CandidateFilter::new(&db, ExceptionFallback::ShowNone);
        assert!(!strict.accepts(&ctx, plain));
        let lenient = CandidateFilter::new(&db, ExceptionFallback::ShowAll);
        assert!(lenient.accepts(&ctx, plain));
    }

    #[test]
    fn extends_rejects_final_and_excluded() {
        let db = SymbolIndex::new();
        let mut sealed = Declaration::new("Sealed", DeclarationKind::Class, db.global_scope());
        sealed.class_modifier = ClassModifier::Final;
        let sealed = db.add_declaration(sealed);
        let a = db.add_declaration(Declaration::new(
            "A",
            DeclarationKind::Class,
            db.global_scope(),
        ));
        let open = db.add_declaration(Declaration::new(
            "Open",
            DeclarationKind::Class,
            db.global_scope(),
        ));

        let ctx = classify(&db, "<?php class A extends ");
        let filter = CandidateFilter::new(&db, ExceptionFallback::ShowNone);
        assert!(!filter.accepts(&ctx, sealed));
        assert!(!filter.accepts(&ctx, a));
        assert!(filter.accepts(&ctx, open));
    }
}
