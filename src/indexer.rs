//! Token-stream declaration indexer.
//!
//! Populates the symbol database from raw document text: namespaces,
//! classes and interfaces with their inheritance clauses, members with
//! modifiers, free functions, and `new`-typed variable assignments. It is a
//! flat scan over the token stream, not a parser; malformed code indexes as
//! much as it can and moves on.

use tracing::debug;

use crate::lexer::{Token, TokenKind, tokenize};
use crate::symbols::{
    ClassModifier, Declaration, DeclarationKind, QualifiedName, ScopeId, ScopeKind, SymbolIndex,
    Visibility,
};

/// PHP's built-in superglobals, visible from every scope.
const SUPERGLOBALS: [&str; 9] = [
    "$GLOBALS", "$_SERVER", "$_GET", "$_POST", "$_FILES", "$_COOKIE", "$_SESSION", "$_REQUEST",
    "$_ENV",
];

/// Register the superglobal variables once per database.
pub fn seed_superglobals(db: &SymbolIndex) {
    for name in SUPERGLOBALS {
        let mut decl = Declaration::new(name, DeclarationKind::Variable, db.global_scope());
        decl.is_superglobal = true;
        db.add_declaration(decl);
    }
}

/// Pending member modifiers, reset at every statement boundary.
#[derive(Default, Clone, Copy)]
struct Modifiers {
    visibility: Option<Visibility>,
    is_static: bool,
    is_abstract: bool,
    is_final: bool,
}

pub struct Indexer<'a> {
    db: &'a SymbolIndex,
}

impl<'a> Indexer<'a> {
    pub fn new(db: &'a SymbolIndex) -> Self {
        Self { db }
    }

    /// Scan one document and add its declarations to the database.
    pub fn index_document(&self, text: &str) {
        let stream = tokenize(text);
        let tokens: Vec<Token> = stream
            .tokens()
            .iter()
            .copied()
            .filter(|t| {
                !matches!(
                    t.kind,
                    TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
                )
            })
            .collect();

        let mut walker = Walker {
            db: self.db,
            text,
            tokens: &tokens,
            pos: 0,
            // Scopes paired with their body brace depth; 0 marks scopes
            // without a closing brace of their own.
            scope_stack: vec![(self.db.global_scope(), 0)],
            brace_depth: 0,
        };
        walker.run();
    }
}

struct Walker<'a> {
    db: &'a SymbolIndex,
    text: &'a str,
    tokens: &'a [Token],
    pos: usize,
    scope_stack: Vec<(ScopeId, usize)>,
    brace_depth: usize,
}

impl<'a> Walker<'a> {
    fn kind(&self, at: usize) -> TokenKind {
        self.tokens
            .get(at)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Invalid)
    }

    fn text_of(&self, at: usize) -> &'a str {
        self.tokens
            .get(at)
            .map(|t| &self.text[t.begin as usize..t.end as usize])
            .unwrap_or("")
    }

    fn begin_of(&self, at: usize) -> u32 {
        self.tokens.get(at).map(|t| t.begin).unwrap_or(0)
    }

    fn current_scope(&self) -> ScopeId {
        self.scope_stack[self.scope_stack.len() - 1].0
    }

    fn run(&mut self) {
        let mut modifiers = Modifiers::default();
        while self.pos < self.tokens.len() {
            match self.kind(self.pos) {
                TokenKind::LBrace => {
                    self.brace_depth += 1;
                    self.pos += 1;
                }
                TokenKind::RBrace => {
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    if let Some(&(scope, depth)) = self.scope_stack.last()
                        && self.scope_stack.len() > 1
                        && depth > 0
                        && self.brace_depth < depth
                    {
                        self.db.set_scope_end(scope, self.begin_of(self.pos));
                        self.scope_stack.pop();
                    }
                    modifiers = Modifiers::default();
                    self.pos += 1;
                }
                TokenKind::Semicolon => {
                    modifiers = Modifiers::default();
                    self.pos += 1;
                }
                TokenKind::Public => {
                    modifiers.visibility = Some(Visibility::Public);
                    self.pos += 1;
                }
                TokenKind::Protected => {
                    modifiers.visibility = Some(Visibility::Protected);
                    self.pos += 1;
                }
                TokenKind::Private => {
                    modifiers.visibility = Some(Visibility::Private);
                    self.pos += 1;
                }
                TokenKind::Var => {
                    modifiers.visibility = Some(Visibility::Public);
                    self.pos += 1;
                }
                TokenKind::Static => {
                    modifiers.is_static = true;
                    self.pos += 1;
                }
                TokenKind::Abstract => {
                    modifiers.is_abstract = true;
                    self.pos += 1;
                }
                TokenKind::Final => {
                    modifiers.is_final = true;
                    self.pos += 1;
                }
                TokenKind::Namespace => self.scan_namespace(),
                TokenKind::Class | TokenKind::Interface => {
                    self.scan_class_like(std::mem::take(&mut modifiers));
                }
                TokenKind::Function => {
                    self.scan_function(std::mem::take(&mut modifiers));
                }
                TokenKind::Const => {
                    self.scan_constant(std::mem::take(&mut modifiers));
                }
                TokenKind::Variable => {
                    self.scan_variable(std::mem::take(&mut modifiers));
                }
                // Type hints may sit between modifiers and the declared
                // name (`protected User $owner`); keep the modifiers alive.
                TokenKind::Identifier | TokenKind::Backslash | TokenKind::Question => {
                    self.pos += 1;
                }
                _ => {
                    modifiers = Modifiers::default();
                    self.pos += 1;
                }
            }
        }
    }

    /// `namespace Foo\Bar;` opens a namespace scope running to the end of
    /// the document (brace-form namespaces close at their `}`). Nested
    /// segments each get their own declaration so path completion can walk
    /// them one segment at a time.
    fn scan_namespace(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let mut segments = Vec::new();
        while self.kind(self.pos) == TokenKind::Identifier {
            segments.push(self.text_of(self.pos).to_string());
            self.pos += 1;
            if self.kind(self.pos) == TokenKind::Backslash {
                self.pos += 1;
            }
        }
        if segments.is_empty() {
            debug!("namespace keyword without name");
            return;
        }

        // A later `namespace` statement replaces the previous one.
        while self.scope_stack.len() > 1 {
            self.scope_stack.pop();
        }

        let braced = self.kind(self.pos) == TokenKind::LBrace;
        let mut parent = self.db.global_scope();
        let mut qualified = String::new();
        let mut innermost = parent;
        for segment in &segments {
            if !qualified.is_empty() {
                qualified.push('\\');
            }
            qualified.push_str(segment);
            let name = QualifiedName::new(&qualified);
            let existing = self
                .db
                .find_declarations(name)
                .into_iter()
                .map(|id| self.db.declaration(id))
                .find(|d| d.kind == DeclarationKind::Namespace);
            let scope = match existing.and_then(|d| d.inner_scope) {
                Some(scope) => scope,
                None => {
                    let scope = self.db.add_scope(
                        ScopeKind::Namespace,
                        parent,
                        (self.begin_of(start), self.text.len() as u32),
                    );
                    let mut decl =
                        Declaration::new(segment, DeclarationKind::Namespace, parent);
                    decl.qualified = name;
                    decl.inner_scope = Some(scope);
                    decl.position = self.begin_of(start);
                    self.db.add_declaration(decl);
                    scope
                }
            };
            parent = scope;
            innermost = scope;
        }
        let body_depth = if braced { self.brace_depth + 1 } else { 0 };
        self.scope_stack.push((innermost, body_depth));
    }

    fn scan_class_like(&mut self, modifiers: Modifiers) {
        let keyword = self.kind(self.pos);
        let keyword_pos = self.pos;
        self.pos += 1;
        if self.kind(self.pos) != TokenKind::Identifier {
            return;
        }
        let name = self.text_of(self.pos).to_string();
        self.pos += 1;

        let mut bases = Vec::new();
        loop {
            match self.kind(self.pos) {
                TokenKind::Extends | TokenKind::Implements => {
                    self.pos += 1;
                    loop {
                        if self.kind(self.pos) == TokenKind::Backslash {
                            self.pos += 1;
                            continue;
                        }
                        if self.kind(self.pos) != TokenKind::Identifier {
                            break;
                        }
                        let mut base = self.text_of(self.pos).to_string();
                        self.pos += 1;
                        while self.kind(self.pos) == TokenKind::Backslash
                            && self.kind(self.pos + 1) == TokenKind::Identifier
                        {
                            base = self.text_of(self.pos + 1).to_string();
                            self.pos += 2;
                        }
                        bases.push(QualifiedName::new(&base));
                        if self.kind(self.pos) == TokenKind::Comma {
                            self.pos += 1;
                        } else {
                            break;
                        }
                    }
                }
                TokenKind::LBrace => break,
                TokenKind::Invalid => return,
                _ => self.pos += 1,
            }
        }

        // Body scope opens at the `{`; the main loop sees the brace next.
        let body = self.db.add_scope(
            ScopeKind::Class,
            self.current_scope(),
            (self.begin_of(self.pos), self.text.len() as u32),
        );
        let mut decl = Declaration::new(
            &name,
            if keyword == TokenKind::Class {
                DeclarationKind::Class
            } else {
                DeclarationKind::Interface
            },
            self.current_scope(),
        );
        decl.class_modifier = if modifiers.is_abstract {
            ClassModifier::Abstract
        } else if modifiers.is_final {
            ClassModifier::Final
        } else {
            ClassModifier::None
        };
        decl.base_classes = bases;
        decl.inner_scope = Some(body);
        decl.position = self.begin_of(keyword_pos);
        self.db.add_declaration(decl);
        self.scope_stack.push((body, self.brace_depth + 1));
    }

    fn scan_function(&mut self, modifiers: Modifiers) {
        let keyword_pos = self.pos;
        self.pos += 1;
        if self.kind(self.pos) != TokenKind::Identifier {
            return;
        }
        let name = self.text_of(self.pos).to_string();
        self.pos += 1;

        let mut parameters = Vec::new();
        if self.kind(self.pos) == TokenKind::LParen {
            let open = self.tokens[self.pos];
            let mut depth = 0i32;
            let mut param_start = open.end;
            loop {
                let kind = self.kind(self.pos);
                match kind {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => {
                        depth -= 1;
                        if depth == 0 {
                            let end = self.begin_of(self.pos);
                            push_parameter(self.text, param_start, end, &mut parameters);
                            self.pos += 1;
                            break;
                        }
                    }
                    TokenKind::Comma if depth == 1 => {
                        push_parameter(self.text, param_start, self.begin_of(self.pos), &mut parameters);
                        param_start = self.tokens[self.pos].end;
                    }
                    TokenKind::Invalid => return,
                    _ => {}
                }
                self.pos += 1;
            }
        }

        // `function f(): Foo`
        let mut declared_type = None;
        if self.kind(self.pos) == TokenKind::Colon {
            self.pos += 1;
            while self.kind(self.pos) == TokenKind::Backslash {
                self.pos += 1;
            }
            if self.kind(self.pos) == TokenKind::Identifier {
                declared_type = Some(QualifiedName::new(self.text_of(self.pos)));
                self.pos += 1;
            }
        }

        let in_class = matches!(
            self.db.scope(self.current_scope()).kind,
            ScopeKind::Class
        );
        let mut decl = Declaration::new(
            &name,
            if in_class {
                DeclarationKind::Method
            } else {
                DeclarationKind::Function
            },
            self.current_scope(),
        );
        decl.visibility = modifiers.visibility.unwrap_or(Visibility::Public);
        decl.is_static = modifiers.is_static;
        decl.is_abstract = modifiers.is_abstract;
        decl.is_final = modifiers.is_final;
        decl.parameters = parameters.clone();
        decl.declared_type = declared_type;
        decl.position = self.begin_of(keyword_pos);

        if self.kind(self.pos) == TokenKind::LBrace {
            let body = self.db.add_scope(
                ScopeKind::Function,
                self.current_scope(),
                (self.begin_of(self.pos), self.text.len() as u32),
            );
            decl.inner_scope = Some(body);
            self.db.add_declaration(decl);
            self.scope_stack.push((body, self.brace_depth + 1));
            self.index_parameters(&parameters, body);
        } else {
            // Abstract or interface method: no body.
            self.db.add_declaration(decl);
        }
    }

    /// Typed parameters become variables of the function body scope.
    fn index_parameters(&self, parameters: &[String], scope: ScopeId) {
        for parameter in parameters {
            let mut words = parameter.split_whitespace();
            let (first, second) = (words.next(), words.next());
            let (ty, var) = match (first, second) {
                (Some(ty), Some(var)) if var.starts_with('$') => (Some(ty), var),
                (Some(var), None) if var.starts_with('$') => (None, var),
                _ => continue,
            };
            let var = var.trim_end_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_');
            let mut decl = Declaration::new(var, DeclarationKind::Variable, scope);
            decl.declared_type = ty.map(QualifiedName::new);
            self.db.add_declaration(decl);
        }
    }

    /// `const NAME = …` inside a class body.
    fn scan_constant(&mut self, _modifiers: Modifiers) {
        self.pos += 1;
        if self.kind(self.pos) != TokenKind::Identifier {
            return;
        }
        let in_class = matches!(
            self.db.scope(self.current_scope()).kind,
            ScopeKind::Class
        );
        if !in_class {
            self.pos += 1;
            return;
        }
        let mut decl = Declaration::new(
            self.text_of(self.pos),
            DeclarationKind::Constant,
            self.current_scope(),
        );
        decl.is_static = true;
        decl.position = self.begin_of(self.pos);
        self.db.add_declaration(decl);
        self.pos += 1;
    }

    /// Properties inside class bodies, and `$x = new Foo` assignments in
    /// function or global scope.
    fn scan_variable(&mut self, modifiers: Modifiers) {
        let name = self.text_of(self.pos);
        let at = self.pos;
        let scope_kind = self.db.scope(self.current_scope()).kind;
        self.pos += 1;

        if scope_kind == ScopeKind::Class {
            let mut decl = Declaration::new(
                name.trim_start_matches('$'),
                DeclarationKind::Property,
                self.current_scope(),
            );
            decl.visibility = modifiers.visibility.unwrap_or(Visibility::Public);
            decl.is_static = modifiers.is_static;
            // `public Foo $x` carries the type right before the variable.
            if at >= 1 && self.kind(at - 1) == TokenKind::Identifier {
                decl.declared_type = Some(QualifiedName::new(self.text_of(at - 1)));
            }
            decl.position = self.begin_of(at);
            self.db.add_declaration(decl);
            return;
        }

        // `$x = new Foo(…)` pins the variable's type.
        if self.kind(self.pos) == TokenKind::Assign
            && self.kind(self.pos + 1) == TokenKind::New
            && self.kind(self.pos + 2) == TokenKind::Identifier
        {
            if self.db.find_variable(self.current_scope(), name).is_some() {
                return;
            }
            let mut decl = Declaration::new(name, DeclarationKind::Variable, self.current_scope());
            decl.declared_type = Some(QualifiedName::new(self.text_of(self.pos + 2)));
            decl.position = self.begin_of(at);
            self.db.add_declaration(decl);
        }
    }
}

fn push_parameter(text: &str, start: u32, end: u32, parameters: &mut Vec<String>) {
    let raw = text[start as usize..end as usize].trim();
    if !raw.is_empty() {
        parameters.push(raw.to_string());
    }
}
