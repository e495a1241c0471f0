//! Candidate production: turn a classified context into LSP completion
//! items.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, InsertTextFormat,
};
use tracing::debug;

use crate::completion::CancelToken;
use crate::completion::context::{CompletionContext, CompletionKind};
use crate::completion::filter::CandidateFilter;
use crate::config::CompletionConfig;
use crate::project::ProjectTree;
use crate::symbols::{
    Declaration, DeclarationId, DeclarationKind, ScopeKind, SymbolIndex, Visibility,
};

/// Everything candidate production needs besides the context itself.
pub struct CandidateRequest<'a> {
    pub db: &'a SymbolIndex,
    pub config: &'a CompletionConfig,
    pub project: Option<&'a dyn ProjectTree>,
    /// Absolute path of the requesting document, for path completion.
    pub document_path: Option<&'a Path>,
    pub cancel: CancelToken,
}

/// Produce the candidate list for a classified context. Cancellation is
/// checked between candidates; a cancelled request returns what it has.
pub fn completion_items(ctx: &CompletionContext, req: &CandidateRequest) -> Vec<CompletionItem> {
    if !ctx.is_valid() {
        return Vec::new();
    }

    let mut items = match ctx.kind() {
        CompletionKind::FileChoose => file_items(ctx, req),
        CompletionKind::ClassMemberChoose => class_member_items(ctx, req),
        CompletionKind::NamespaceChoose | CompletionKind::BackslashAccess => {
            namespace_items(ctx, req)
        }
        CompletionKind::MemberAccess | CompletionKind::StaticMemberAccess => {
            member_items(ctx, req)
        }
        _ => visible_items(ctx, req),
    };

    // Argument hints for every enclosing call the caret sits in.
    let mut parent = ctx.parent();
    while let Some(chain) = parent {
        if chain.is_valid() && chain.kind() == CompletionKind::FunctionCallAccess {
            for &id in &chain.expression_result().declarations {
                if let Some(item) = call_hint_item(req.db, id, chain.depth()) {
                    items.push(item);
                }
            }
        }
        parent = chain.parent();
    }

    if ctx.kind() == CompletionKind::NoAccess && req.config.keyword_items {
        items.extend(statement_keyword_items());
    }

    items.truncate(req.config.max_candidates);
    items
}

/// Statement and declaration keywords offered for plain completion, with
/// snippet bodies for the block-forming ones.
const STATEMENT_KEYWORDS: &[(&str, &str)] = &[
    ("abstract class", "abstract class ${1:Name}\n{\n\t$0\n}\n"),
    ("final class", "final class ${1:Name}\n{\n\t$0\n}\n"),
    ("class", "class ${1:Name}\n{\n\t$0\n}\n"),
    ("interface", "interface ${1:Name}\n{\n\t$0\n}\n"),
    ("function", "function ${1:name}($2)\n{\n\t$0\n}\n"),
    ("array", "array($0)"),
    ("break", "break;"),
    ("case", "case ${1:value}:\n\t$0\n\tbreak;"),
    ("catch", "catch ($1) {\n\t$0\n}"),
    ("clone", "clone $0;"),
    ("continue", "continue;"),
    ("declare", "declare($0);"),
    ("default", "default:\n\t$0\n\tbreak;"),
    ("do", "do {\n\t$0\n} while ();"),
    ("echo", "echo $0;"),
    ("else", "else {\n\t$0\n}"),
    ("elseif", "elseif ($1) {\n\t$0\n}"),
    ("empty", "empty($0)"),
    ("eval", "eval($0)"),
    ("exit", "exit($0);"),
    ("extends", "extends "),
    ("implements", "implements "),
    ("endif", "endif;"),
    ("endforeach", "endforeach;"),
    ("endswitch", "endswitch;"),
    ("endwhile", "endwhile;"),
    ("endfor", "endfor;"),
    ("for", "for ($1;;) {\n\t$0\n}"),
    ("foreach", "foreach ($1) {\n\t$0\n}"),
    ("global", "global $0;"),
    ("if", "if ($1) {\n\t$0\n}"),
    ("include", "include '$0';"),
    ("include_once", "include_once '$0';"),
    ("require", "require '$0';"),
    ("require_once", "require_once '$0';"),
    ("isset", "isset($0)"),
    ("list", "list($0)"),
    ("new", "new "),
    ("print", "print $0;"),
    ("return", "return $0;"),
    ("static", "static $0;"),
    ("switch", "switch ($1) {\n\t$0\n}"),
    ("throw", "throw $0;"),
    ("try", "try {\n\t$0\n} catch ($1) {\n}"),
    ("unset", "unset($0);"),
    ("while", "while ($1) {\n\t$0\n}"),
];

fn statement_keyword_items() -> Vec<CompletionItem> {
    STATEMENT_KEYWORDS
        .iter()
        .map(|&(label, snippet)| CompletionItem {
            label: label.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            insert_text: Some(snippet.to_string()),
            insert_text_format: Some(InsertTextFormat::SNIPPET),
            ..CompletionItem::default()
        })
        .collect()
}

/// All declarations visible at the caret, innermost scope first so local
/// names shadow outer ones, narrowed by the kind filter.
fn visible_items(ctx: &CompletionContext, req: &CandidateRequest) -> Vec<CompletionItem> {
    let filter = CandidateFilter::new(req.db, req.config.exception_fallback);
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for (id, depth) in req.db.declarations_visible_at(ctx.scope, ctx.position) {
        if req.cancel.is_cancelled() {
            debug!("completion request cancelled");
            break;
        }
        let decl = req.db.declaration(id);
        // Plain variables are scope-local, and class members want an
        // access operator in front of them.
        if depth > 0
            && ((decl.kind == DeclarationKind::Variable && !decl.is_superglobal)
                || req.db.scope(decl.scope).kind == ScopeKind::Class)
        {
            continue;
        }
        if seen.insert(decl.qualified) && filter.accepts(ctx, id) {
            items.push(declaration_item(&decl));
        }
    }
    items
}

/// Members of the resolved container class, honouring visibility from the
/// caret's enclosing class and the access operator's staticness rules.
fn member_items(ctx: &CompletionContext, req: &CandidateRequest) -> Vec<CompletionItem> {
    let Some(ty) = ctx.expression_result().ty else {
        return Vec::new();
    };
    let Some(class) = req.db.find_class(ty.class) else {
        debug!(class = %ty.class.as_str(), "container class not in index");
        return Vec::new();
    };

    let current_class = req.db.enclosing_class_of(ctx.scope);
    let static_access =
        ctx.kind() == CompletionKind::StaticMemberAccess && !ctx.parent_access;

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for (id, _) in req.db.class_members(class) {
        if req.cancel.is_cancelled() {
            debug!("completion request cancelled");
            break;
        }
        let decl = req.db.declaration(id);
        if !seen.insert(decl.qualified) {
            // Overridden in a nearer class.
            continue;
        }
        if !member_reachable(req.db, &decl, current_class) {
            continue;
        }
        let keep = match decl.kind {
            DeclarationKind::Constant => static_access || ctx.parent_access,
            DeclarationKind::Property => {
                if static_access {
                    decl.is_static
                } else {
                    !decl.is_static || ctx.parent_access
                }
            }
            DeclarationKind::Method => !static_access || decl.is_static || ctx.parent_access,
            _ => false,
        };
        if !keep {
            continue;
        }
        let mut item = declaration_item(&decl);
        if decl.kind == DeclarationKind::Property && decl.is_static {
            // `Foo::$prop` keeps the sigil, `$foo->prop` does not.
            item.label = format!("${}", decl.name);
            item.insert_text = Some(item.label.clone());
        }
        items.push(item);
    }
    items
}

/// Visibility check for a member against the class the caret is inside.
fn member_reachable(
    db: &SymbolIndex,
    member: &Declaration,
    current_class: Option<DeclarationId>,
) -> bool {
    let declaring = db.scope(member.scope).owner;
    match member.visibility {
        Visibility::Public => true,
        Visibility::Protected => match (current_class, declaring) {
            (Some(current), Some(owner)) => current == owner || db.is_base_class(current, owner),
            _ => false,
        },
        Visibility::Private => current_class.is_some() && current_class == declaring,
    }
}

/// Member-definition completion inside a class body: the modifier keywords
/// that may still be typed, plus inherited methods the class can override,
/// filtered by the modifiers already written.
fn class_member_items(ctx: &CompletionContext, req: &CandidateRequest) -> Vec<CompletionItem> {
    let Some(class) = req.db.enclosing_class_of(ctx.scope) else {
        return Vec::new();
    };
    let class_decl = req.db.declaration(class);
    let (has_function, used) = trailing_member_tokens(&ctx.text);
    let add_keywords = !has_function;

    let mut show_overridable = true;
    let mut filter_static = false;
    let mut filter_non_static = false;
    let mut filter_public = false;
    let mut keywords: Vec<&str> = Vec::new();

    if class_decl.class_modifier == crate::symbols::ClassModifier::Abstract {
        // `abstract` members only exist in abstract classes; once typed,
        // the member has no body to inherit.
        if used.contains(&"abstract") {
            show_overridable = false;
        } else if add_keywords {
            keywords.push("abstract");
        }
    } else if add_keywords && !used.contains(&"final") {
        keywords.push("final");
    }

    if used.contains(&"private") {
        // Private methods cannot override anything.
        show_overridable = false;
    } else if used.contains(&"protected") {
        filter_public = true;
    } else if add_keywords && !used.contains(&"public") {
        keywords.push("public");
        keywords.push("protected");
        keywords.push("private");
    }

    if used.contains(&"static") {
        filter_non_static = true;
    } else if add_keywords {
        keywords.push("static");
    } else {
        filter_static = true;
    }

    if add_keywords {
        keywords.push("function");
        if used.is_empty() {
            // `var` and `const` take no modifiers.
            keywords.push("var");
            keywords.push("const");
        }
    }

    if !req.config.keyword_items {
        keywords.clear();
    }
    let mut items: Vec<CompletionItem> = keywords
        .into_iter()
        .map(|kw| CompletionItem {
            label: kw.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            ..CompletionItem::default()
        })
        .collect();

    if show_overridable && !class_decl.base_classes.is_empty() {
        let own_names: HashSet<_> = req
            .db
            .class_members(class)
            .into_iter()
            .filter(|&(_, depth)| depth == 0)
            .map(|(id, _)| req.db.declaration(id).qualified)
            .collect();

        let mut seen = HashSet::new();
        for (id, depth) in req.db.class_members(class) {
            if req.cancel.is_cancelled() {
                break;
            }
            if depth == 0 {
                continue;
            }
            let decl = req.db.declaration(id);
            if decl.kind != DeclarationKind::Method
                || decl.is_final
                || decl.visibility == Visibility::Private
                || (filter_public && decl.visibility == Visibility::Public)
                || (filter_non_static && !decl.is_static)
                || (filter_static && decl.is_static)
                || own_names.contains(&decl.qualified)
                || !seen.insert(decl.qualified)
            {
                continue;
            }
            let params = decl.parameters.join(", ");
            items.push(CompletionItem {
                label: format!("{}({})", decl.name, params),
                kind: Some(CompletionItemKind::METHOD),
                detail: Some("override".to_string()),
                insert_text: Some(format!("{}({})\n{{\n\t$0\n}}", decl.name, params)),
                insert_text_format: Some(InsertTextFormat::SNIPPET),
                ..CompletionItem::default()
            });
        }
    }
    items
}

/// `namespace`/`\` path completion: members of the accumulated qualifier.
fn namespace_items(ctx: &CompletionContext, req: &CandidateRequest) -> Vec<CompletionItem> {
    let filter = CandidateFilter::new(req.db, req.config.exception_fallback);
    let scope = match ctx.namespace_qualifier() {
        Some(qualifier) if !qualifier.is_empty() => {
            let namespace = req
                .db
                .find_declarations(qualifier)
                .into_iter()
                .find(|&id| req.db.declaration(id).kind == DeclarationKind::Namespace);
            match namespace.and_then(|id| req.db.declaration(id).inner_scope) {
                Some(scope) => scope,
                None => {
                    debug!(qualifier = %qualifier.as_str(), "unknown namespace");
                    return Vec::new();
                }
            }
        }
        _ => req.db.global_scope(),
    };

    let mut items = Vec::new();
    for id in req.db.local_declarations(scope) {
        if req.cancel.is_cancelled() {
            break;
        }
        if filter.accepts(ctx, id) {
            items.push(declaration_item(&req.db.declaration(id)));
        }
    }
    items
}

/// Path completion inside `require`/`include` literals, rooted at the
/// requesting document's directory.
fn file_items(ctx: &CompletionContext, req: &CandidateRequest) -> Vec<CompletionItem> {
    let Some(project) = req.project else {
        return Vec::new();
    };

    let partial = ctx.expression();
    let (dir, prefix) = match partial.rfind('/') {
        Some(idx) => (&partial[..idx], &partial[idx + 1..]),
        None => ("", partial),
    };

    // `dirname(__FILE__) . '…` anchors at the requesting document's
    // directory; a bare literal anchors at the workspace root.
    let list_dir: PathBuf = if ctx.is_file_completion_after_dirname() {
        match req.document_path.and_then(Path::parent) {
            Some(parent) => parent.join(dir),
            None => return Vec::new(),
        }
    } else {
        PathBuf::from(dir)
    };

    let document_name = req
        .document_path
        .and_then(Path::file_name)
        .and_then(|n| n.to_str());
    let mut items = Vec::new();
    for entry in project.entries(&list_dir) {
        if req.cancel.is_cancelled() {
            break;
        }
        if !entry.name.starts_with(prefix) {
            continue;
        }
        // Including the file into itself is never the goal.
        if dir.is_empty() && !entry.is_dir && Some(entry.name.as_str()) == document_name {
            continue;
        }
        let (kind, insert) = if entry.is_dir {
            (CompletionItemKind::FOLDER, format!("{}/", entry.name))
        } else {
            (CompletionItemKind::FILE, entry.name.clone())
        };
        items.push(CompletionItem {
            label: entry.name,
            kind: Some(kind),
            insert_text: Some(insert),
            ..CompletionItem::default()
        });
    }

    // Navigating up is offered once, at the listing root.
    if partial.is_empty() {
        items.push(CompletionItem {
            label: "..".to_string(),
            kind: Some(CompletionItemKind::FOLDER),
            insert_text: Some("../".to_string()),
            ..CompletionItem::default()
        });
    }
    items
}

/// Argument hint for one enclosing call. Class declarations resolve through
/// their constructor.
fn call_hint_item(db: &SymbolIndex, id: DeclarationId, depth: u32) -> Option<CompletionItem> {
    let decl = db.declaration(id);
    let callee = if decl.is_class_like() {
        let constructor = db
            .class_members(id)
            .into_iter()
            .map(|(member, _)| db.declaration(member))
            .find(|member| {
                member.kind == DeclarationKind::Method && member.name.eq_ignore_ascii_case("__construct")
            })?;
        format!("{}({})", decl.name, constructor.parameters.join(", "))
    } else if decl.is_function_like() {
        format!("{}({})", decl.name, decl.parameters.join(", "))
    } else {
        return None;
    };
    Some(CompletionItem {
        label: callee,
        kind: Some(CompletionItemKind::FUNCTION),
        detail: Some(format!("argument hint (depth {depth})")),
        // Hints sort ahead of regular candidates.
        sort_text: Some(format!("0{depth}")),
        insert_text: Some(String::new()),
        ..CompletionItem::default()
    })
}

fn declaration_item(decl: &Declaration) -> CompletionItem {
    let kind = match decl.kind {
        DeclarationKind::Namespace => CompletionItemKind::MODULE,
        DeclarationKind::Class => CompletionItemKind::CLASS,
        DeclarationKind::Interface => CompletionItemKind::INTERFACE,
        DeclarationKind::Function => CompletionItemKind::FUNCTION,
        DeclarationKind::Method => CompletionItemKind::METHOD,
        DeclarationKind::Property => CompletionItemKind::PROPERTY,
        DeclarationKind::Constant => CompletionItemKind::CONSTANT,
        DeclarationKind::Variable => CompletionItemKind::VARIABLE,
    };
    let mut item = CompletionItem {
        label: decl.name.clone(),
        kind: Some(kind),
        detail: decl.declared_type.map(|t| t.as_str().to_string()),
        ..CompletionItem::default()
    };
    if decl.is_function_like() {
        item.insert_text = Some(format!("{}($0)", decl.name));
        item.insert_text_format = Some(InsertTextFormat::SNIPPET);
    }
    item
}

/// Scan the text tail before the caret for a member-definition head:
/// whether `function` was just typed, and which modifiers precede it. Each
/// modifier is consumed at most once, case-insensitively.
fn trailing_member_tokens(text: &str) -> (bool, Vec<&'static str>) {
    fn strip_word<'t>(text: &'t str, word: &str) -> Option<&'t str> {
        let trimmed = text.trim_end();
        if trimmed.len() < word.len() {
            return None;
        }
        let (head, tail) = trimmed.split_at(trimmed.len() - word.len());
        if !tail.eq_ignore_ascii_case(word) {
            return None;
        }
        // Word boundary: `myfunction` is not `function`.
        if head
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return None;
        }
        Some(head)
    }

    const MODIFIERS: [&str; 6] = [
        "private", "public", "protected", "static", "abstract", "final",
    ];

    // A partially-typed member name at the caret is not part of the head;
    // the client filters by it. Keywords stay in place.
    let mut rest = text.trim_end();
    if let Some(last) = rest
        .rfind(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .map(|idx| &rest[idx + 1..])
        .filter(|word| !word.is_empty())
        && !last.eq_ignore_ascii_case("function")
        && !MODIFIERS.iter().any(|m| last.eq_ignore_ascii_case(m))
        && !last.eq_ignore_ascii_case("var")
        && !last.eq_ignore_ascii_case("const")
    {
        rest = &rest[..rest.len() - last.len()];
    }

    let mut has_function = false;
    if let Some(head) = strip_word(rest, "function") {
        has_function = true;
        rest = head;
    }
    let mut used = Vec::new();
    loop {
        let mut matched = false;
        for modifier in MODIFIERS {
            if !used.contains(&modifier)
                && let Some(head) = strip_word(rest, modifier)
            {
                used.push(modifier);
                rest = head;
                matched = true;
                break;
            }
        }
        if !matched {
            break;
        }
    }
    (has_function, used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_head_scan_strips_function_and_modifiers() {
        let (function, used) = trailing_member_tokens("<?php class A { public static function");
        assert!(function);
        assert_eq!(used, ["static", "public"]);

        let (function, used) = trailing_member_tokens("<?php class A { final");
        assert!(!function);
        assert_eq!(used, ["final"]);

        let (function, used) = trailing_member_tokens("<?php class A { myfunction");
        assert!(!function);
        assert!(used.is_empty());
    }

    #[test]
    fn modifiers_are_consumed_once() {
        let (_, used) = trailing_member_tokens("public public");
        assert_eq!(used, ["public"]);
    }
}
