//! Access-operator classification: `->`, `::`, `self`, `parent`, `static`.

mod common;

use common::fixture;
use phocus::completion::CompletionKind;
use phocus::symbols::QualifiedName;

#[test]
fn member_access_on_typed_variable() {
    let fx = fixture(
        r#"<?php
class User {
    public $name;
    public function save() {}
}
$x = new User();
$x-><|>
"#,
    );
    let ctx = fx.classify();
    assert!(ctx.is_valid());
    assert_eq!(ctx.kind(), CompletionKind::MemberAccess);
    assert_eq!(ctx.expression(), "$x");

    let labels = fx.labels();
    assert!(labels.contains(&"name".to_string()));
    assert!(labels.contains(&"save".to_string()));
}

#[test]
fn member_access_shape_survives_unknown_variable() {
    let fx = fixture("<?php $x-><|>");
    let ctx = fx.classify();
    assert_eq!(ctx.kind(), CompletionKind::MemberAccess);
    assert_eq!(ctx.expression(), "$x");
    assert!(!ctx.is_valid());
    assert!(fx.items().is_empty());
}

#[test]
fn static_access_splits_members_by_staticness() {
    let fx = fixture(
        r#"<?php
class Counter {
    const MAX = 5;
    public static $count;
    public $value;
    public function reset() {}
    public static function bump() {}
}
Counter::<|>
"#,
    );
    let ctx = fx.classify();
    assert!(ctx.is_valid());
    assert_eq!(ctx.kind(), CompletionKind::StaticMemberAccess);
    assert_eq!(ctx.expression(), "Counter");

    let labels = fx.labels();
    assert!(labels.contains(&"MAX".to_string()));
    assert!(labels.contains(&"$count".to_string()));
    assert!(labels.contains(&"bump".to_string()));
    assert!(!labels.contains(&"reset".to_string()));
    assert!(!labels.contains(&"value".to_string()));
}

#[test]
fn instance_access_hides_constants_and_static_properties() {
    let fx = fixture(
        r#"<?php
class Counter {
    const MAX = 5;
    public static $count;
    public $value;
}
$c = new Counter();
$c-><|>
"#,
    );
    let labels = fx.labels();
    assert_eq!(labels, ["value"]);
}

#[test]
fn self_resolves_to_enclosing_class() {
    let fx = fixture(
        r#"<?php
class Box {
    const SIZE = 2;
    public static function make() {}
    public function init() {
        self::<|>
    }
}
"#,
    );
    let ctx = fx.classify();
    assert!(ctx.is_valid());
    assert_eq!(ctx.kind(), CompletionKind::StaticMemberAccess);
    let ty = ctx.expression_result().ty.unwrap();
    assert_eq!(ty.class, QualifiedName::new("Box"));

    let labels = fx.labels();
    assert!(labels.contains(&"SIZE".to_string()));
    assert!(labels.contains(&"make".to_string()));
}

#[test]
fn parent_widens_to_instance_members() {
    let fx = fixture(
        r#"<?php
class A {
    public function hello() {}
    protected $slot;
}
class B extends A {
    public function f() {
        parent::<|>
    }
}
"#,
    );
    let ctx = fx.classify();
    assert!(ctx.is_valid());
    // `parent::` reaches instance members of the base class too.
    assert_eq!(ctx.kind(), CompletionKind::MemberAccess);
    let ty = ctx.expression_result().ty.unwrap();
    assert_eq!(ty.class, QualifiedName::new("A"));

    let labels = fx.labels();
    assert!(labels.contains(&"hello".to_string()));
    assert!(labels.contains(&"slot".to_string()));
}

#[test]
fn parent_without_concrete_base_is_invalid() {
    let fx = fixture(
        r#"<?php
class B extends Missing {
    public function f() {
        parent::<|>
    }
}
"#,
    );
    assert!(!fx.classify().is_valid());
}

#[test]
fn abstract_base_does_not_satisfy_parent() {
    let fx = fixture(
        r#"<?php
abstract class A {}
class B extends A {
    public function f() {
        parent::<|>
    }
}
"#,
    );
    assert!(!fx.classify().is_valid());
}

#[test]
fn method_call_result_completes() {
    let fx = fixture(
        r#"<?php
class User {
    public $name;
}
function maker(): User {}
maker()-><|>
"#,
    );
    let ctx = fx.classify();
    assert!(ctx.is_valid());
    assert_eq!(ctx.kind(), CompletionKind::MemberAccess);
    assert_eq!(ctx.expression(), "maker()");
    assert_eq!(fx.labels(), ["name"]);
}

#[test]
fn classification_is_idempotent() {
    let fx = fixture(
        r#"<?php
class User { public $name; }
$x = new User();
$x-><|>
"#,
    );
    let first = fx.classify();
    let second = fx.classify();
    assert_eq!(first.kind(), second.kind());
    assert_eq!(first.is_valid(), second.is_valid());
    assert_eq!(first.expression(), second.expression());
    assert_eq!(fx.labels(), fx.labels());
}
