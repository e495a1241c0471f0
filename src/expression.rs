//! Expression-type evaluation for completion subjects.
//!
//! The classifier hands over a bounded source-text fragment (`$user`,
//! `$this->repo`, `Factory::make()`, `new Builder()`); this module resolves
//! it to a class type and the matching declarations via the symbol database.
//! Resolution is deliberately shallow: declared types only, no control-flow
//! analysis. That is all the classifier asks for.

use crate::lexer::{TokenKind, tokenize};
use crate::symbols::{DeclarationId, QualifiedName, ScopeId, SymbolIndex};

/// A resolved class-valued type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    pub class: QualifiedName,
}

/// Outcome of evaluating an expression fragment. `ty` is absent when the
/// fragment did not resolve; `declarations` carries the declarations the
/// fragment denotes (the called function, the constructed class, …).
#[derive(Debug, Clone, Default)]
pub struct ExpressionEvaluationResult {
    pub ty: Option<ResolvedType>,
    pub declarations: Vec<DeclarationId>,
}

impl ExpressionEvaluationResult {
    /// Bind the result to a single declaration, deriving the type from it.
    pub fn set_declaration(&mut self, db: &SymbolIndex, id: DeclarationId) {
        let decl = db.declaration(id);
        self.ty = if decl.is_class_like() {
            Some(ResolvedType {
                class: decl.qualified,
            })
        } else {
            decl.declared_type.map(|class| ResolvedType { class })
        };
        self.declarations = vec![id];
    }

    pub fn first_declaration(&self) -> Option<DeclarationId> {
        self.declarations.first().copied()
    }
}

/// External collaborator interface: turn an expression fragment into a type.
pub trait ExpressionEvaluator {
    fn evaluate(
        &self,
        expression: &str,
        scope: ScopeId,
        position: u32,
    ) -> ExpressionEvaluationResult;
}

/// Symbol-table-backed evaluator. Resolves a head segment (variable, class
/// name, function call, `new` expression) and then follows `->` / `::`
/// member segments through declared types.
pub struct SymbolExpressionEvaluator<'a> {
    db: &'a SymbolIndex,
}

impl<'a> SymbolExpressionEvaluator<'a> {
    pub fn new(db: &'a SymbolIndex) -> Self {
        Self { db }
    }

    /// Resolve a member by name within a class, searching base classes too.
    fn member_of(&self, class: DeclarationId, name: &str) -> Option<DeclarationId> {
        let wanted = QualifiedName::new(name.trim_start_matches('$'));
        self.db
            .class_members(class)
            .into_iter()
            .map(|(id, _)| id)
            .find(|&id| self.db.declaration(id).qualified == wanted)
    }

    fn class_of(&self, result: &ExpressionEvaluationResult) -> Option<DeclarationId> {
        let ty = result.ty?;
        self.db.find_class(ty.class)
    }
}

impl ExpressionEvaluator for SymbolExpressionEvaluator<'_> {
    fn evaluate(
        &self,
        expression: &str,
        scope: ScopeId,
        _position: u32,
    ) -> ExpressionEvaluationResult {
        let source = format!("<?php {expression}");
        let stream = tokenize(&source);
        let tokens: Vec<_> = stream
            .tokens()
            .iter()
            .filter(|t| {
                !matches!(
                    t.kind,
                    TokenKind::OpenTag | TokenKind::Whitespace | TokenKind::Comment
                )
            })
            .copied()
            .collect();
        let text = |i: usize| -> &str {
            let t = tokens[i];
            &source[t.begin as usize..t.end as usize]
        };

        let mut result = ExpressionEvaluationResult::default();
        if tokens.is_empty() {
            return result;
        }

        let mut i = 0;

        // Head segment.
        match tokens[i].kind {
            TokenKind::New => {
                // `new Foo(...)`, the constructed class.
                i += 1;
                if i < tokens.len() && tokens[i].kind == TokenKind::Identifier {
                    if let Some(class) = self.db.find_class(QualifiedName::new(text(i))) {
                        result.set_declaration(self.db, class);
                    }
                    i += 1;
                } else {
                    return result;
                }
            }
            TokenKind::Variable => {
                let name = text(i);
                if name.eq_ignore_ascii_case("$this") {
                    if let Some(class) = self.db.enclosing_class_of(scope) {
                        result.set_declaration(self.db, class);
                    }
                } else if let Some(var) = self.db.find_variable(scope, name) {
                    result.set_declaration(self.db, var);
                }
                i += 1;
            }
            TokenKind::Identifier => {
                let name = text(i);
                let qualified = QualifiedName::new(name);
                let is_call = tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::LParen);
                if is_call {
                    // Function call: bind the function, type is its return.
                    let function = self
                        .db
                        .find_declarations(qualified)
                        .into_iter()
                        .find(|&id| self.db.declaration(id).is_function_like());
                    match function {
                        Some(id) => result.set_declaration(self.db, id),
                        // Constructor call without `new` does not exist in
                        // PHP, but a class name still makes call-tips work.
                        None => {
                            if let Some(class) = self.db.find_class(qualified) {
                                result.set_declaration(self.db, class);
                            }
                        }
                    }
                } else if let Some(class) = self.db.find_class(qualified) {
                    result.set_declaration(self.db, class);
                }
                i += 1;
            }
            _ => return result,
        }

        // Trailing member segments: `(...)` argument lists are skipped,
        // `->name` / `::name` re-resolve against the current class.
        while i < tokens.len() {
            match tokens[i].kind {
                TokenKind::LParen => {
                    let mut depth = 1;
                    i += 1;
                    while i < tokens.len() && depth > 0 {
                        match tokens[i].kind {
                            TokenKind::LParen => depth += 1,
                            TokenKind::RParen => depth -= 1,
                            _ => {}
                        }
                        i += 1;
                    }
                }
                TokenKind::Arrow | TokenKind::DoubleColon => {
                    i += 1;
                    if i >= tokens.len() {
                        break;
                    }
                    let name = text(i);
                    let Some(class) = self.class_of(&result) else {
                        return ExpressionEvaluationResult::default();
                    };
                    match self.member_of(class, name) {
                        Some(member) => {
                            result = ExpressionEvaluationResult::default();
                            result.set_declaration(self.db, member);
                        }
                        None => return ExpressionEvaluationResult::default(),
                    }
                    i += 1;
                }
                _ => {
                    i += 1;
                }
            }
        }

        result
    }
}
