//! Completion-context classification.
//!
//! This is the core of the engine: given the text leading up to the caret,
//! work backward over the token stream and decide what kind of completion is
//! being requested, which sub-expression (if any) must be type-evaluated,
//! and whether the caret sits inside an enclosing call expression that needs
//! argument hints (the parent-context chain).
//!
//! The classifier is a local heuristic, not a parser: it only understands
//! enough of the preceding tokens to answer "what is being typed right now".

use std::collections::HashSet;

use tracing::debug;

use crate::completion::cursor::TokenCursor;
use crate::expression::{ExpressionEvaluationResult, ExpressionEvaluator};
use crate::lexer::{TokenKind, tokenize};
use crate::symbols::{QualifiedName, ScopeId, SymbolIndex};

/// The classified intent of a completion request. Exactly one value is
/// active per context; `FunctionCallAccess` is transient on the primary
/// context; it is always resolved into `NoAccess` plus a parent context
/// before the context is considered settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// Plain completion: everything visible at the caret.
    NoAccess,
    /// After `->`.
    MemberAccess,
    /// After `::`.
    StaticMemberAccess,
    /// Inside a call's argument list; only ever settled on parent contexts.
    FunctionCallAccess,
    /// After `new `.
    NewClassChoose,
    /// After `class X extends `.
    ClassExtendsChoose,
    /// After `implements ` or `interface X extends `.
    InterfaceChoose,
    /// After `instanceof `.
    InstanceOfChoose,
    /// Inside `catch (` or after `throw new `.
    ExceptionChoose,
    /// After `throw `.
    ExceptionInstanceChoose,
    /// Member-definition position inside a class body.
    ClassMemberChoose,
    /// Inside the path literal of `require`/`include`.
    FileChoose,
    /// After the `namespace` keyword.
    NamespaceChoose,
    /// After a `\` path separator.
    BackslashAccess,
}

/// One classified completion request. Created fresh per request, discarded
/// after candidate production; the parent chain is exclusively owned.
pub struct CompletionContext {
    /// Normalized text window, trimmed to the last consumed token.
    pub(crate) text: String,
    /// Text immediately following the caret, used to disambiguate
    /// partially-typed tokens.
    pub(crate) following_text: String,
    /// Caret offset in the requesting document.
    pub(crate) position: u32,
    pub(crate) depth: u32,
    pub(crate) kind: CompletionKind,
    /// The bounded sub-expression to type-evaluate (or the partial path for
    /// `FileChoose`).
    pub(crate) expression: String,
    pub(crate) expression_result: ExpressionEvaluationResult,
    /// Whether a `FileChoose` path followed a `dirname(__FILE__) .` prefix.
    pub(crate) file_completion_after_dirname: bool,
    /// Identifiers that must not be offered as candidates.
    pub(crate) excluded: HashSet<QualifiedName>,
    /// Accumulated qualifier for namespace-path completion.
    pub(crate) namespace_qualifier: Option<QualifiedName>,
    /// Enclosing-call chain; `parent.depth == self.depth + 1`.
    pub(crate) parent: Option<Box<CompletionContext>>,
    /// `parent::` resolved to a concrete base class.
    pub(crate) parent_access: bool,
    pub(crate) valid: bool,
    pub(crate) scope: ScopeId,
}

impl CompletionContext {
    fn empty(scope: ScopeId, position: u32, depth: u32) -> Self {
        Self {
            text: String::new(),
            following_text: String::new(),
            position,
            depth,
            kind: CompletionKind::NoAccess,
            expression: String::new(),
            expression_result: ExpressionEvaluationResult::default(),
            file_completion_after_dirname: false,
            excluded: HashSet::new(),
            namespace_qualifier: None,
            parent: None,
            parent_access: false,
            valid: true,
            scope,
        }
    }

    /// Classify a completion request. `text` runs from the enclosing scope's
    /// start to the caret; `following_text` is the remainder of the caret's
    /// line. Always returns a context; an unusable one has `is_valid() ==
    /// false` and produces zero candidates.
    pub fn classify(
        db: &SymbolIndex,
        evaluator: &dyn ExpressionEvaluator,
        scope: ScopeId,
        text: &str,
        following_text: &str,
        position: u32,
    ) -> Self {
        let mut ctx = Self::empty(scope, position, 0);
        ctx.following_text = following_text.to_string();

        // Anchor the window so tokenization sees well-formed PHP even when
        // the scope starts mid-file.
        ctx.text = if text.starts_with("<?php") {
            text.to_string()
        } else {
            format!("<?php {text}")
        };

        if text.is_empty() {
            debug!("empty completion text");
            ctx.valid = false;
            return ctx;
        }

        let stream = tokenize(&ctx.text);
        if stream.is_empty() {
            ctx.valid = false;
            return ctx;
        }
        let source = ctx.text.clone();
        let mut cursor = TokenCursor::new(&stream, &source);

        // End of the very last token, whatever we later skip to.
        let last_token_end = cursor.end_offset();

        let last_was_whitespace = cursor.kind() == TokenKind::Whitespace;
        if last_was_whitespace {
            cursor.pop();
        }

        // When the text after the last token starts a block comment the
        // caret is inside an unterminated comment: no completion there.
        if source[last_token_end..].starts_with("/*") {
            debug!("no completion inside comments");
            ctx.valid = false;
            return ctx;
        }

        // These keywords need a trailing whitespace before completion makes
        // sense (`extends|` is still being typed, `extends |` is not).
        if !last_was_whitespace
            && matches!(
                cursor.kind(),
                TokenKind::Extends | TokenKind::Implements | TokenKind::New | TokenKind::Throw
            )
        {
            debug!("keyword requires whitespace before completion");
            ctx.valid = false;
            return ctx;
        }

        ctx.dispatch(db, &mut cursor, last_was_whitespace);
        debug!(kind = ?ctx.kind, valid = ctx.valid, "classified last token");

        if !ctx.valid {
            return ctx;
        }

        // Trim the window to the end of the last consumed token.
        let consumed_end = cursor.end_offset();
        ctx.text.truncate(consumed_end);
        let trimmed = ctx.text.trim_end().len();
        ctx.text.truncate(trimmed);

        match ctx.kind {
            // These kinds need no expression evaluation.
            CompletionKind::FileChoose
            | CompletionKind::ClassMemberChoose
            | CompletionKind::InterfaceChoose
            | CompletionKind::NewClassChoose
            | CompletionKind::ExceptionChoose
            | CompletionKind::ExceptionInstanceChoose
            | CompletionKind::ClassExtendsChoose
            | CompletionKind::NoAccess
            | CompletionKind::InstanceOfChoose
            | CompletionKind::NamespaceChoose
            | CompletionKind::BackslashAccess => ctx,
            CompletionKind::FunctionCallAccess => {
                // The primary context is never a call context itself: it
                // becomes plain completion, and the call (if it is one)
                // becomes the parent.
                ctx.kind = CompletionKind::NoAccess;
                debug_assert_eq!(cursor.kind(), TokenKind::LParen);
                let is_call = cursor
                    .prefixed_by(&[TokenKind::Identifier], true)
                    .or_else(|| cursor.prefixed_by(&[TokenKind::Variable], true))
                    .is_some();
                if is_call {
                    let parent =
                        Self::parent_for_call(db, evaluator, scope, position, &mut cursor, 1);
                    ctx.parent = Some(Box::new(parent));
                } else {
                    // `for (`, `while (` and friends: no call here.
                    debug!("open parenthesis without callee");
                }
                ctx
            }
            CompletionKind::MemberAccess | CompletionKind::StaticMemberAccess => {
                ctx.evaluate_expression(db, evaluator, &mut cursor);
                ctx
            }
        }
    }

    /// Construct a parent context for an enclosing call expression: the
    /// cursor must sit on the call's opening parenthesis.
    fn parent_for_call(
        db: &SymbolIndex,
        evaluator: &dyn ExpressionEvaluator,
        scope: ScopeId,
        position: u32,
        cursor: &mut TokenCursor,
        depth: u32,
    ) -> Self {
        let mut ctx = Self::empty(scope, position, depth);
        if cursor.kind() != TokenKind::LParen {
            debug!(kind = ?cursor.kind(), "unexpected token for parent call context");
            ctx.valid = false;
            return ctx;
        }
        ctx.kind = CompletionKind::FunctionCallAccess;
        ctx.evaluate_expression(db, evaluator, cursor);
        ctx
    }

    /// Last-token dispatch: the heart of the state machine.
    fn dispatch(&mut self, db: &SymbolIndex, cursor: &mut TokenCursor, last_was_whitespace: bool) {
        use TokenKind::*;

        let in_class_body = matches!(
            db.scope(self.scope).kind,
            crate::symbols::ScopeKind::Class
        );

        match cursor.kind() {
            Comment => {
                // Line comments that don't end in a newline mean the caret
                // is still inside the comment.
                let comment = cursor.text_at(0);
                if !last_was_whitespace
                    && !comment.ends_with('\n')
                    && !comment.starts_with("/*")
                {
                    debug!("no completion in comments");
                    self.valid = false;
                }
            }
            Extends => {
                if cursor
                    .prefixed_by(&[Whitespace, Identifier, Whitespace, Class], false)
                    .is_some()
                {
                    self.kind = CompletionKind::ClassExtendsChoose;
                    self.forbid_identifier(db, cursor.text_at(-2));
                } else if cursor
                    .prefixed_by(&[Whitespace, Identifier, Whitespace, Interface], false)
                    .is_some()
                {
                    self.kind = CompletionKind::InterfaceChoose;
                    self.forbid_identifier(db, cursor.text_at(-2));
                } else {
                    debug!("extends without class/interface head");
                    self.valid = false;
                }
            }
            Implements => {
                if cursor
                    .prefixed_by(&[Whitespace, Identifier, Whitespace, Class], false)
                    .is_some()
                {
                    self.kind = CompletionKind::InterfaceChoose;
                    self.forbid_identifier(db, cursor.text_at(-2));
                } else {
                    debug!("implements without class head");
                    self.valid = false;
                }
            }
            Comma => self.dispatch_comma(db, cursor),
            OpenTag => {
                // Avoid completing while the tag itself is still being typed
                // (`<?p` plus following text).
                if !last_was_whitespace && !self.following_text.is_empty() {
                    debug!("open tag still being typed");
                    self.valid = false;
                } else {
                    self.kind = CompletionKind::NoAccess;
                }
            }
            Arrow => {
                self.kind = CompletionKind::MemberAccess;
                cursor.pop();
            }
            DoubleColon => {
                self.kind = CompletionKind::StaticMemberAccess;
                cursor.pop();
            }
            LParen => {
                let mut rel = -1;
                cursor.skip_whitespace(&mut rel);
                match cursor.kind_at(rel) {
                    Catch => self.kind = CompletionKind::ExceptionChoose,
                    // Array literals never take call-style completion.
                    Array => self.kind = CompletionKind::NoAccess,
                    _ => self.kind = CompletionKind::FunctionCallAccess,
                }
            }
            New => {
                if cursor.prefixed_by(&[Whitespace, Throw], false).is_some() {
                    self.kind = CompletionKind::ExceptionChoose;
                } else {
                    self.kind = CompletionKind::NewClassChoose;
                }
            }
            Throw => self.kind = CompletionKind::ExceptionInstanceChoose,
            ConstantString => self.dispatch_string_literal(cursor),
            InstanceOf => self.kind = CompletionKind::InstanceOfChoose,
            Namespace | Backslash => {
                let mut qualifier = String::new();
                let mut rel = 0;
                while matches!(cursor.kind_at(rel), Identifier | Backslash) {
                    if cursor.kind_at(rel) == Backslash {
                        qualifier.insert(0, '\\');
                    } else {
                        qualifier.insert_str(0, cursor.text_at(rel));
                    }
                    rel -= 1;
                }
                cursor.skip_whitespace(&mut rel);
                self.kind = if cursor.kind_at(rel) == Namespace {
                    CompletionKind::NamespaceChoose
                } else {
                    CompletionKind::BackslashAccess
                };
                // A bare `namespace ` or leading `\` has no qualifier yet.
                let qualifier = qualifier.trim_matches('\\');
                self.namespace_qualifier =
                    (!qualifier.is_empty()).then(|| QualifiedName::new(qualifier));
            }
            kind if kind.is_expression_token() => {
                self.kind = if in_class_body {
                    // Inside a class body the sensible offers are member
                    // definitions (modifiers, overridable methods).
                    CompletionKind::ClassMemberChoose
                } else {
                    CompletionKind::NoAccess
                };
            }
            kind if kind.is_member_modifier() => {
                if in_class_body {
                    self.kind = CompletionKind::ClassMemberChoose;
                } else {
                    self.valid = false;
                }
            }
            _ => {
                debug!(kind = ?cursor.kind(), "no completion after this token");
                self.valid = false;
            }
        }
    }

    /// A trailing comma either continues an `extends`/`implements` list or
    /// sits inside a call's argument list.
    fn dispatch_comma(&mut self, db: &SymbolIndex, cursor: &mut TokenCursor) {
        use TokenKind::*;

        let mut rel: isize = -1;
        let mut identifier_positions: Vec<isize> = Vec::new();
        loop {
            cursor.skip_whitespace(&mut rel);
            if cursor.kind_at(rel) != Identifier {
                break;
            }
            identifier_positions.push(rel);
            rel -= 1;
            cursor.skip_whitespace(&mut rel);
            // Interfaces may extend, and classes implement, more than one
            // interface; both clause heads end the walk.
            let interface_extends = cursor.kind_at(rel) == Extends
                && cursor.kind_at(rel - 1) == Whitespace
                && cursor.kind_at(rel - 2) == Identifier
                && cursor.kind_at(rel - 3) == Whitespace
                && cursor.kind_at(rel - 4) == Interface;
            let class_implements = cursor.kind_at(rel) == Implements
                && cursor.kind_at(rel - 1) == Whitespace
                && cursor.kind_at(rel - 2) == Identifier
                && cursor.kind_at(rel - 3) == Whitespace
                && cursor.kind_at(rel - 4) == Class;
            if interface_extends || class_implements {
                identifier_positions.push(rel - 2);
                self.kind = CompletionKind::InterfaceChoose;
                break;
            } else if cursor.kind_at(rel) == Comma {
                rel -= 1;
                continue;
            }
            // Neither clause head nor another comma: fall out on the next
            // iteration's identifier check.
        }

        if self.kind == CompletionKind::InterfaceChoose {
            let names: Vec<String> = identifier_positions
                .iter()
                .map(|&pos| cursor.text_at(pos).to_string())
                .collect();
            for name in names {
                self.forbid_identifier(db, &name);
            }
        } else {
            // Otherwise the comma belongs to a call's argument list.
            self.kind = CompletionKind::FunctionCallAccess;
            cursor.remove_other_arguments();
            if cursor.kind() == Invalid {
                debug!("unbalanced argument list");
                self.valid = false;
            }
        }
    }

    /// Quoted string at the caret: only `require`/`include` path literals
    /// get completion, everything else aborts.
    fn dispatch_string_literal(&mut self, cursor: &mut TokenCursor) {
        use TokenKind::*;

        // Recognise `dirname(__FILE__) . '…` in front of the literal.
        let mut after_dirname = false;
        let mut rel: isize = match cursor.prefixed_by(
            &[Concat, RParen, FileConstant, LParen, Identifier],
            true,
        ) {
            Some(consumed) => {
                let rel = -(consumed as isize);
                if cursor.text_at(rel + 1).eq_ignore_ascii_case("dirname") {
                    after_dirname = true;
                }
                rel
            }
            None => -1,
        };
        cursor.skip_whitespace(&mut rel);
        if cursor.kind_at(rel) == LParen {
            rel -= 1;
        }
        cursor.skip_whitespace(&mut rel);

        match cursor.kind_at(rel) {
            Require | RequireOnce | Include | IncludeOnce => {
                self.kind = CompletionKind::FileChoose;
                let literal_begin = cursor
                    .token_at(0)
                    .map(|t| t.begin as usize)
                    .unwrap_or(self.text.len());
                // Everything after the opening quote, plus whatever the user
                // already typed past the caret, is the partial path.
                let mut path = self.text[literal_begin + 1..].to_string();
                path.push_str(&self.following_text);
                self.expression = path.trim().trim_matches('"').trim_matches('\'').to_string();
                self.file_completion_after_dirname = after_dirname;
            }
            _ => {
                // No completion in or after arbitrary string literals.
                self.valid = false;
            }
        }
    }

    /// Extract the expression preceding the access operator or call paren,
    /// evaluate it, and chain parent contexts for enclosing calls.
    fn evaluate_expression(
        &mut self,
        db: &SymbolIndex,
        evaluator: &dyn ExpressionEvaluator,
        cursor: &mut TokenCursor,
    ) {
        use TokenKind::*;

        let mut start: isize = 0;
        let mut open_parens: i32 = 0;

        if self.kind == CompletionKind::FunctionCallAccess {
            debug_assert_eq!(cursor.kind(), LParen);
            if let Some(consumed) = cursor.prefixed_by(&[Identifier, New], true) {
                // Constructor call: include `new Foo` in the expression.
                start = -(consumed as isize);
            } else {
                // Simple call: start from the callee expression.
                start = -1;
            }
        }

        // Walk backward to the expression start, balancing parentheses.
        loop {
            let kind = cursor.kind_at(start);
            if kind.is_expression_stop()
                || (self.kind != CompletionKind::FunctionCallAccess && kind == Comma)
            {
                break;
            }
            match kind {
                LParen => {
                    // An unmatched opening parenthesis encloses the
                    // expression; stop in front of it without counting it.
                    if open_parens + 1 > 0 {
                        break;
                    }
                    open_parens += 1;
                }
                RParen => open_parens -= 1,
                _ => {}
            }
            start -= 1;
        }

        if open_parens < 0 {
            debug!("too many closing parentheses");
            self.valid = false;
            return;
        }

        // The loop stopped on the first unwanted token; move past it.
        start += 1;

        if cursor.kind_at(start) == Whitespace {
            start += 1;
        }
        // `return foo()->` completes on the call result, not on `return`.
        if cursor.kind_at(start) == Return {
            start += 1;
            if cursor.kind_at(start) == Whitespace {
                start += 1;
            }
        }

        if self.kind == CompletionKind::StaticMemberAccess {
            if cursor.kind_at(start) != Identifier {
                debug!(kind = ?cursor.kind_at(start), "unsupported token before static access");
                self.valid = false;
                return;
            }

            let identifier = cursor.text_at(start).to_string();
            self.expression = identifier.clone();
            let lowered = identifier.to_ascii_lowercase();

            if lowered == "self" || lowered == "parent" || lowered == "static" {
                // Only meaningful inside a class body or one of its methods.
                if let Some(current_class) = db.enclosing_class_of(self.scope) {
                    if lowered == "parent" {
                        match db.concrete_base_class(current_class) {
                            Some(base) => {
                                // `parent::` may reach instance members too.
                                self.parent_access = true;
                                self.kind = CompletionKind::MemberAccess;
                                self.expression_result.set_declaration(db, base);
                            }
                            None => {
                                debug!("class has no accessible parent class");
                                self.valid = false;
                                return;
                            }
                        }
                    } else {
                        self.expression_result.set_declaration(db, current_class);
                    }
                }
            } else if let Some(class) = db.find_class(QualifiedName::new(&identifier)) {
                self.expression_result.set_declaration(db, class);
            }
        } else {
            // Concatenate the token texts into the expression fragment. For
            // call contexts the opening parenthesis itself stays out; the
            // fragment is completed with `()` below so it evaluates in
            // isolation.
            let last_included: isize = if self.kind == CompletionKind::FunctionCallAccess {
                -1
            } else {
                0
            };
            let mut expression = String::new();
            let mut i = start;
            while i <= last_included {
                expression.push_str(cursor.text_at(i));
                i += 1;
            }
            self.expression = expression.trim().to_string();

            let mut evaluable = self.expression.clone();
            if self.kind == CompletionKind::FunctionCallAccess {
                evaluable.push_str("()");
            }
            for _ in 0..open_parens {
                evaluable.push(')');
            }

            debug!(expression = %evaluable, "evaluating expression");

            if !evaluable.is_empty() {
                self.expression_result = evaluator.evaluate(&evaluable, self.scope, self.position);
            }

            if self.expression_result.ty.is_none() {
                if self.kind == CompletionKind::FunctionCallAccess {
                    // Tolerated: argument hints degrade to hints without a
                    // matched declaration.
                    debug!("call expression did not resolve");
                    return;
                }
                debug!("expression could not be evaluated");
                self.valid = false;
                return;
            }
        }

        cursor.move_to(start);

        // If the expression is itself an argument of an enclosing call,
        // chain a parent context for the argument hints.
        if matches!(cursor.kind_at(-1), LParen | Comma) {
            cursor.move_to(-1);
            if cursor.kind() == Comma {
                cursor.remove_other_arguments();
                if cursor.kind() == Invalid {
                    debug!("could not find enclosing call start");
                    self.valid = false;
                    return;
                }
            }

            if cursor
                .prefixed_by(&[Identifier], true)
                .is_none()
            {
                // `for (`, `while (`: parenthesis, but no call.
                debug!("enclosing parenthesis is not a call");
                return;
            }

            let parent = Self::parent_for_call(
                db,
                evaluator,
                self.scope,
                self.position,
                cursor,
                self.depth + 1,
            );
            if parent.valid {
                self.parent = Some(Box::new(parent));
            } else {
                self.valid = false;
            }
        }
    }

    /// Exclude `name` from the candidate set, along with every base class
    /// it already inherits from (re-listing an inherited interface is
    /// redundant, and a class cannot extend itself).
    fn forbid_identifier(&mut self, db: &SymbolIndex, name: &str) {
        let qualified = QualifiedName::new(name);
        self.excluded.insert(qualified);
        if let Some(class) = db.find_class(qualified) {
            self.forbid_class(db, class);
        }
    }

    fn forbid_class(&mut self, db: &SymbolIndex, class: crate::symbols::DeclarationId) {
        for base in db.declaration(class).base_classes {
            // The membership gate doubles as cycle protection.
            if self.excluded.insert(base)
                && let Some(base_class) = db.find_class(base)
            {
                self.forbid_class(db, base_class);
            }
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn kind(&self) -> CompletionKind {
        self.kind
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn expression_result(&self) -> &ExpressionEvaluationResult {
        &self.expression_result
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parent(&self) -> Option<&CompletionContext> {
        self.parent.as_deref()
    }

    pub fn excluded(&self) -> &HashSet<QualifiedName> {
        &self.excluded
    }

    pub fn namespace_qualifier(&self) -> Option<QualifiedName> {
        self.namespace_qualifier
    }

    pub fn is_file_completion_after_dirname(&self) -> bool {
        self.file_completion_after_dirname
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::SymbolExpressionEvaluator;
    use crate::symbols::{Declaration, DeclarationKind, ScopeKind};

    fn fixture() -> SymbolIndex {
        let db = SymbolIndex::new();
        let class_scope = db.add_scope(ScopeKind::Class, db.global_scope(), (6, 60));
        let mut user = Declaration::new("User", DeclarationKind::Class, db.global_scope());
        user.inner_scope = Some(class_scope);
        db.add_declaration(user);
        db.add_declaration(Declaration::new("name", DeclarationKind::Property, class_scope));
        let mut var = Declaration::new("$user", DeclarationKind::Variable, db.global_scope());
        var.declared_type = Some(QualifiedName::new("User"));
        db.add_declaration(var);
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
    fn arrow_triggers_member_access() {
        let db = fixture();
        let ctx = classify(&db, "<?php $user->");
        assert!(ctx.is_valid());
        assert_eq!(ctx.kind(), CompletionKind::MemberAccess);
        assert_eq!(ctx.expression(), "$user");
        let ty = ctx.expression_result().ty.unwrap();
        assert_eq!(ty.class, QualifiedName::new("User"));
    }

    #[test]
    fn double_colon_triggers_static_access() {
        let db = SymbolIndex::new();
        let ctx = classify(&db, "<?php Foo::");
        assert!(ctx.is_valid());
        assert_eq!(ctx.kind(), CompletionKind::StaticMemberAccess);
        assert_eq!(ctx.expression(), "Foo");
    }

    #[test]
    fn unresolvable_member_access_is_invalid() {
        let db = SymbolIndex::new();
        let ctx = classify(&db, "<?php $unknown->");
        assert!(!ctx.is_valid());
    }

    #[test]
    fn new_needs_trailing_whitespace() {
        let db = SymbolIndex::new();
        assert!(!classify(&db, "<?php new").is_valid());
        let ctx = classify(&db, "<?php new ");
        assert!(ctx.is_valid());
        assert_eq!(ctx.kind(), CompletionKind::NewClassChoose);
    }

    #[test]
    fn throw_new_chooses_exceptions() {
        let db = SymbolIndex::new();
        let ctx = classify(&db, "<?php throw new ");
        assert!(ctx.is_valid());
        assert_eq!(ctx.kind(), CompletionKind::ExceptionChoose);
    }

    #[test]
    fn open_call_builds_parent_context() {
        let db = SymbolIndex::new();
        let ctx = classify(&db, "<?php bar(");
        assert!(ctx.is_valid());
        assert_eq!(ctx.kind(), CompletionKind::NoAccess);
        let parent = ctx.parent().unwrap();
        assert_eq!(parent.kind(), CompletionKind::FunctionCallAccess);
        assert_eq!(parent.depth(), 1);
        assert_eq!(parent.expression(), "bar");
    }

    #[test]
    fn extends_excludes_own_class() {
        let db = SymbolIndex::new();
        let ctx = classify(&db, "<?php class A extends ");
        assert!(ctx.is_valid());
        assert_eq!(ctx.kind(), CompletionKind::ClassExtendsChoose);
        assert!(ctx.excluded().contains(&QualifiedName::new("A")));
    }

    #[test]
    fn no_completion_inside_comments() {
        let db = SymbolIndex::new();
        assert!(!classify(&db, "<?php // note").is_valid());
        assert!(!classify(&db, "<?php /* open").is_valid());
    }

    #[test]
    fn namespace_keyword_lists_namespaces() {
        let db = SymbolIndex::new();
        let ctx = classify(&db, "<?php namespace Foo\\");
        assert!(ctx.is_valid());
        assert_eq!(ctx.kind(), CompletionKind::NamespaceChoose);
        assert_eq!(ctx.namespace_qualifier(), Some(QualifiedName::new("Foo")));
    }

    #[test]
    fn require_literal_is_file_completion() {
        let db = SymbolIndex::new();
        let ctx = classify(&db, "<?php require 'sub/");
        assert!(ctx.is_valid());
        assert_eq!(ctx.kind(), CompletionKind::FileChoose);
        assert_eq!(ctx.expression(), "sub/");
        assert!(!ctx.is_file_completion_after_dirname());
    }
}
