//! In-memory symbol database: declarations, scopes and qualified names.
//!
//! The completion engine only ever takes the read side of the lock; writes
//! happen when a document is (re)indexed. All queries the classifier and the
//! candidate production need are exposed here: visible declarations with
//! their scope depth, qualified-name lookup, base-class enumeration, and the
//! lazily cached "exception base class" lookup used for exception-kind
//! filtering.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use ustr::Ustr;

pub type DeclarationId = usize;
pub type ScopeId = usize;

/// Interned, lowercase-normalized qualified name (PHP identifiers are
/// case-insensitive). Segments are separated by `\`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualifiedName(pub Ustr);

impl QualifiedName {
    pub fn new(name: &str) -> Self {
        let normalized = name.trim_start_matches('\\').to_ascii_lowercase();
        Self(Ustr::from(&normalized))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Visibility of a class member. Members without an explicit modifier
/// default to `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Namespace,
    Class,
    Interface,
    Function,
    Method,
    Property,
    Constant,
    Variable,
}

/// Class-level modifier from the declaration head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassModifier {
    #[default]
    None,
    Abstract,
    Final,
}

/// One declaration in the symbol database.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Display name as written in source (`User`, `$logger`, `MAX_SIZE`).
    pub name: String,
    /// Normalized qualified name used for lookup and exclusion sets.
    pub qualified: QualifiedName,
    pub kind: DeclarationKind,
    pub class_modifier: ClassModifier,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Abstract member (method without a body).
    pub is_abstract: bool,
    /// Final member.
    pub is_final: bool,
    /// Superglobal variables (`$_GET`, …) stay visible across scopes.
    pub is_superglobal: bool,
    /// Qualified names from the `extends`/`implements` clauses.
    pub base_classes: Vec<QualifiedName>,
    /// Scope this declaration lives in.
    pub scope: ScopeId,
    /// Body scope for classes, interfaces, functions and namespaces.
    pub inner_scope: Option<ScopeId>,
    /// Byte offset of the declaration in its document.
    pub position: u32,
    /// Parameter list as written, for function-like declarations.
    pub parameters: Vec<String>,
    /// Class-valued declared type (property/variable type, function return).
    pub declared_type: Option<QualifiedName>,
}

impl Declaration {
    pub fn new(name: &str, kind: DeclarationKind, scope: ScopeId) -> Self {
        Self {
            name: name.to_string(),
            qualified: QualifiedName::new(name.trim_start_matches('$')),
            kind,
            class_modifier: ClassModifier::None,
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            is_final: false,
            is_superglobal: false,
            base_classes: Vec::new(),
            scope,
            inner_scope: None,
            position: 0,
            parameters: Vec::new(),
            declared_type: None,
        }
    }

    pub fn is_class_like(&self) -> bool {
        matches!(self.kind, DeclarationKind::Class | DeclarationKind::Interface)
    }

    pub fn is_function_like(&self) -> bool {
        matches!(self.kind, DeclarationKind::Function | DeclarationKind::Method)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Namespace,
    Class,
    Function,
}

#[derive(Debug, Clone, Copy)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// The declaration owning this scope (the class for a class body, …).
    pub owner: Option<DeclarationId>,
    /// Byte range of the scope body in its document.
    pub range: (u32, u32),
}

#[derive(Default)]
struct SymbolTable {
    scopes: Vec<Scope>,
    declarations: Vec<Declaration>,
    by_qualified: HashMap<QualifiedName, Vec<DeclarationId>>,
    generation: u64,
}

/// Thread-safe symbol database. Readers (completion requests) take the read
/// lock per query; the indexer takes the write lock.
pub struct SymbolIndex {
    inner: RwLock<SymbolTable>,
    /// Cached exception base class, keyed by table generation so index
    /// updates invalidate it. A miss is retried on the next request.
    exception_base: Mutex<Option<(u64, DeclarationId)>>,
}

impl Default for SymbolIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolIndex {
    pub fn new() -> Self {
        let mut table = SymbolTable::default();
        table.scopes.push(Scope {
            kind: ScopeKind::Global,
            parent: None,
            owner: None,
            range: (0, u32::MAX),
        });
        Self {
            inner: RwLock::new(table),
            exception_base: Mutex::new(None),
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        0
    }

    fn read(&self) -> RwLockReadGuard<'_, SymbolTable> {
        self.inner.read()
    }

    // ── Writes (indexing) ───────────────────────────────────────────────

    pub fn add_scope(&self, kind: ScopeKind, parent: ScopeId, range: (u32, u32)) -> ScopeId {
        let mut table = self.inner.write();
        table.generation += 1;
        table.scopes.push(Scope {
            kind,
            parent: Some(parent),
            owner: None,
            range,
        });
        table.scopes.len() - 1
    }

    pub fn add_declaration(&self, declaration: Declaration) -> DeclarationId {
        let mut table = self.inner.write();
        table.generation += 1;
        let id = table.declarations.len();
        let qualified = declaration.qualified;
        if let Some(inner) = declaration.inner_scope {
            table.scopes[inner].owner = Some(id);
        }
        table.declarations.push(declaration);
        table.by_qualified.entry(qualified).or_default().push(id);
        id
    }

    /// Close a scope's byte range once its end is known.
    pub fn set_scope_end(&self, id: ScopeId, end: u32) {
        let mut table = self.inner.write();
        table.scopes[id].range.1 = end;
    }

    /// Drop every scope and declaration, keeping only the global scope.
    pub fn clear(&self) {
        let mut table = self.inner.write();
        table.generation += 1;
        table.scopes.truncate(1);
        table.declarations.clear();
        table.by_qualified.clear();
    }

    // ── Read-locked queries ─────────────────────────────────────────────

    pub fn declaration(&self, id: DeclarationId) -> Declaration {
        self.read().declarations[id].clone()
    }

    pub fn scope(&self, id: ScopeId) -> Scope {
        self.read().scopes[id]
    }

    pub fn find_declarations(&self, qualified: QualifiedName) -> Vec<DeclarationId> {
        self.read()
            .by_qualified
            .get(&qualified)
            .cloned()
            .unwrap_or_default()
    }

    /// First class or interface declaration with the given qualified name.
    pub fn find_class(&self, qualified: QualifiedName) -> Option<DeclarationId> {
        let table = self.read();
        table.find_class(qualified)
    }

    /// All declarations visible from `scope`, innermost first, paired with
    /// the scope distance from the requesting scope. Variables declared
    /// after `position` are not visible yet; classes and functions hoist.
    pub fn declarations_visible_at(&self, scope: ScopeId, position: u32) -> Vec<(DeclarationId, u32)> {
        let table = self.read();
        let mut out = Vec::new();
        let mut depth = 0u32;
        let mut current = Some(scope);
        while let Some(id) = current {
            for (decl_id, decl) in table.declarations.iter().enumerate() {
                if decl.kind == DeclarationKind::Variable
                    && !decl.is_superglobal
                    && decl.position > position
                {
                    continue;
                }
                if decl.scope == id {
                    out.push((decl_id, depth));
                }
            }
            current = table.scopes[id].parent;
            depth += 1;
        }
        out
    }

    /// Declarations local to one scope.
    pub fn local_declarations(&self, scope: ScopeId) -> Vec<DeclarationId> {
        let table = self.read();
        table
            .declarations
            .iter()
            .enumerate()
            .filter(|(_, d)| d.scope == scope)
            .map(|(id, _)| id)
            .collect()
    }

    /// Members of a class including inherited ones; depth 0 are the class's
    /// own members, depth 1 its direct bases', and so on. Repeated classes in
    /// a diamond are visited once.
    pub fn class_members(&self, class: DeclarationId) -> Vec<(DeclarationId, u32)> {
        let table = self.read();
        let mut out = Vec::new();
        let mut visited = vec![class];
        let mut frontier = vec![class];
        let mut depth = 0u32;
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for class_id in frontier {
                if let Some(body) = table.declarations[class_id].inner_scope {
                    for (decl_id, decl) in table.declarations.iter().enumerate() {
                        if decl.scope == body {
                            out.push((decl_id, depth));
                        }
                    }
                }
                for base in table.base_class_ids(class_id) {
                    if !visited.contains(&base) {
                        visited.push(base);
                        next.push(base);
                    }
                }
            }
            frontier = next;
            depth += 1;
        }
        out
    }

    /// Direct base classes of a class declaration, resolved to ids.
    pub fn base_class_ids(&self, class: DeclarationId) -> Vec<DeclarationId> {
        self.read().base_class_ids(class)
    }

    /// Whether `base` appears anywhere in `derived`'s ancestry.
    pub fn is_base_class(&self, derived: DeclarationId, base: DeclarationId) -> bool {
        let table = self.read();
        let mut frontier = table.base_class_ids(derived);
        let mut visited = vec![derived];
        while let Some(current) = frontier.pop() {
            if current == base {
                return true;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            frontier.extend(table.base_class_ids(current));
        }
        false
    }

    /// First ancestor that is a concrete (non-abstract, non-interface)
    /// class. This is what `parent::` resolves against.
    pub fn concrete_base_class(&self, class: DeclarationId) -> Option<DeclarationId> {
        let table = self.read();
        for base in table.base_class_ids(class) {
            let decl = &table.declarations[base];
            if decl.kind == DeclarationKind::Class && decl.class_modifier != ClassModifier::Abstract
            {
                return Some(base);
            }
        }
        None
    }

    /// The class declaration owning the nearest enclosing class scope.
    pub fn enclosing_class_of(&self, scope: ScopeId) -> Option<DeclarationId> {
        let table = self.read();
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = table.scopes[id];
            if s.kind == ScopeKind::Class {
                return s.owner;
            }
            current = s.parent;
        }
        None
    }

    /// Innermost scope containing `offset`.
    pub fn scope_at(&self, offset: u32) -> ScopeId {
        let table = self.read();
        let mut best = 0;
        let mut best_len = u64::MAX;
        for (id, scope) in table.scopes.iter().enumerate() {
            let (begin, end) = scope.range;
            if offset >= begin && offset <= end {
                let len = (end - begin) as u64;
                if len < best_len {
                    best = id;
                    best_len = len;
                }
            }
        }
        best
    }

    /// Resolve a `$variable` by walking the scope chain outward.
    pub fn find_variable(&self, scope: ScopeId, name: &str) -> Option<DeclarationId> {
        let table = self.read();
        let wanted = QualifiedName::new(name.trim_start_matches('$'));
        let mut current = Some(scope);
        while let Some(id) = current {
            for (decl_id, decl) in table.declarations.iter().enumerate() {
                if decl.scope == id
                    && decl.kind == DeclarationKind::Variable
                    && decl.qualified == wanted
                {
                    return Some(decl_id);
                }
            }
            current = table.scopes[id].parent;
        }
        None
    }

    /// The designated exception base class, looked up once and cached until
    /// the index changes. A failed lookup is retried on the next call rather
    /// than pinning the miss.
    pub fn exception_base(&self) -> Option<DeclarationId> {
        let generation = self.read().generation;
        let mut cache = self.exception_base.lock();
        if let Some((cached_generation, id)) = *cache
            && cached_generation == generation
        {
            return Some(id);
        }
        let found = self.read().find_class(QualifiedName::new("Exception"));
        if let Some(id) = found {
            *cache = Some((generation, id));
        } else {
            tracing::warn!("exception base class not found; exception completion degraded");
            *cache = None;
        }
        found
    }
}

impl SymbolTable {
    fn find_class(&self, qualified: QualifiedName) -> Option<DeclarationId> {
        self.by_qualified
            .get(&qualified)?
            .iter()
            .copied()
            .find(|&id| self.declarations[id].is_class_like())
    }

    fn base_class_ids(&self, class: DeclarationId) -> Vec<DeclarationId> {
        self.declarations[class]
            .base_classes
            .iter()
            .filter_map(|&q| self.find_class(q))
            .collect()
    }
}
