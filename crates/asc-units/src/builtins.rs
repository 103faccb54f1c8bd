//! Declarations of the builtin types, compiled as an ordinary library unit.
//!
//! `*`, `void`, `null` and `undefined` are synthesized by the project scope
//! and do not appear here.

/// Path the builtin unit is registered under.
pub const BUILTINS_PATH: &str = "<builtins>/builtins.as";

pub const BUILTINS_SOURCE: &str = r#"
package {
    public class Object {}
    public final class String {}
    public final class int {}
    public final class uint {}
    public final class Number {}
    public final class Boolean {}
    public dynamic class Array {}
    public dynamic class Class {}
    public final class Function {}
    public dynamic class Vector {}
    public final dynamic class XML {}
    public final dynamic class XMLList {}
    public dynamic class RegExp {}
    public final class Namespace {}
    public final class QName {}
}

package flash.events {
    public class Event {}
    public interface IEventDispatcher {}
    public class EventDispatcher implements IEventDispatcher {}
}
"#;

/// Qualified names declared by `BUILTINS_SOURCE`.
pub const BUILTIN_QNAMES: &[&str] = &[
    "Object",
    "String",
    "int",
    "uint",
    "Number",
    "Boolean",
    "Array",
    "Class",
    "Function",
    "Vector",
    "XML",
    "XMLList",
    "RegExp",
    "Namespace",
    "QName",
    "flash.events.Event",
    "flash.events.IEventDispatcher",
    "flash.events.EventDispatcher",
];
