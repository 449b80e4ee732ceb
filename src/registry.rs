//! Registry for rules that decide how types are constructed from command
//! line arguments.
//!
//! Two rule families drive everything. *Primitive rules* turn a normalized
//! type into a [`PrimitiveSpec`] that instantiates a value from string
//! tokens. *Struct rules* turn a normalized type plus a default into a
//! [`StructSpec`] that decomposes into named fields. Lookup walks
//! user-registered rules newest-first, then the built-ins newest-first; the
//! first rule returning `Some` wins.
//!
//! One registry is active at a time. Activation is scoped: the guard returned
//! by [`Registry::enter`] restores the previously active registry when it
//! drops, on unwind paths too.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SpecError;
use crate::normalize::NormalizedType;
use crate::primitive::{self, PrimitiveSpec};
use crate::strukt::{self, StructSpec};
use crate::value::FieldDefault;

/// Everything a primitive rule may look at.
#[derive(Debug, Clone)]
pub struct PrimitiveTypeInfo {
    pub norm: NormalizedType,
    /// The resolved field name; used for filesystem completion hints.
    pub field_name: String,
}

/// Everything a struct rule may look at.
#[derive(Debug, Clone)]
pub struct StructTypeInfo {
    pub norm: NormalizedType,
    pub default: FieldDefault,
    /// Display path of the field being resolved, for error messages.
    pub path: String,
}

/// A user-extensible constructor rule. Return `None` from either method when
/// the rule does not apply; rules must be pure.
pub trait ConstructorRule {
    fn try_primitive(&self, info: &PrimitiveTypeInfo, registry: &Registry) -> Option<PrimitiveSpec> {
        let _ = (info, registry);
        None
    }

    fn try_struct(&self, info: &StructTypeInfo, registry: &Registry) -> Option<StructSpec> {
        let _ = (info, registry);
        None
    }
}

pub(crate) type PrimitiveRuleFn = fn(&PrimitiveTypeInfo, &Registry) -> Option<PrimitiveSpec>;
pub(crate) type StructRuleFn = fn(&StructTypeInfo, &Registry) -> Option<StructSpec>;

pub struct Registry {
    builtin_primitive: Vec<PrimitiveRuleFn>,
    builtin_struct: Vec<StructRuleFn>,
    custom: Vec<Box<dyn ConstructorRule>>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            builtin_primitive: primitive::builtin_rules(),
            builtin_struct: strukt::builtin_rules(),
            custom: Vec::new(),
        }
    }

    /// Register a custom rule. The most recently added rule is tried first
    /// and takes precedence over every built-in.
    pub fn add_rule(&mut self, rule: Box<dyn ConstructorRule>) {
        self.custom.push(rule);
    }

    /// Find the primitive spec for a type.
    ///
    /// # Errors
    ///
    /// [`SpecError::UnsupportedTypeAnnotation`] when no rule matches.
    pub fn get_primitive_spec(&self, info: &PrimitiveTypeInfo) -> Result<PrimitiveSpec, SpecError> {
        for rule in self.custom.iter().rev() {
            if let Some(spec) = rule.try_primitive(info, self) {
                return Ok(spec);
            }
        }
        for rule in self.builtin_primitive.iter().rev() {
            if let Some(spec) = rule(info, self) {
                return Ok(spec);
            }
        }
        Err(SpecError::UnsupportedTypeAnnotation(info.norm.ty.describe()))
    }

    /// Find the struct spec for a type. `None` signals "treat this as a
    /// primitive instead".
    pub fn get_struct_spec(&self, info: &StructTypeInfo) -> Option<StructSpec> {
        for rule in self.custom.iter().rev() {
            if let Some(spec) = rule.try_struct(info, self) {
                return Some(spec);
            }
        }
        for rule in self.builtin_struct.iter().rev() {
            if let Some(spec) = rule(info, self) {
                return Some(spec);
            }
        }
        None
    }

    /// The active registry, creating a default one on first use.
    pub fn active() -> Rc<Registry> {
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.is_empty() {
                stack.push(Rc::new(Registry::new()));
            }
            stack.last().expect("non-empty after push").clone()
        })
    }

    /// Make this registry the active one until the guard drops.
    pub fn enter(self: &Rc<Self>) -> RegistryGuard {
        ACTIVE.with(|stack| stack.borrow_mut().push(self.clone()));
        RegistryGuard { _private: () }
    }
}

thread_local! {
    static ACTIVE: RefCell<Vec<Rc<Registry>>> = const { RefCell::new(Vec::new()) };
}

/// Restores the previously active registry on drop.
pub struct RegistryGuard {
    _private: (),
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("builtin_primitive", &self.builtin_primitive.len())
            .field("builtin_struct", &self.builtin_struct.len())
            .field("custom", &self.custom.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::MarkerSet;
    use crate::normalize::normalize;
    use crate::schema::TypeExpr;

    fn info_for(ty: TypeExpr) -> PrimitiveTypeInfo {
        PrimitiveTypeInfo {
            norm: normalize(&ty, MarkerSet::EMPTY),
            field_name: "x".to_string(),
        }
    }

    #[test]
    fn nested_activation_restores_previous() {
        let outer = Rc::new(Registry::new());
        let inner = Rc::new(Registry::new());
        let _g1 = outer.enter();
        assert!(Rc::ptr_eq(&Registry::active(), &outer));
        {
            let _g2 = inner.enter();
            assert!(Rc::ptr_eq(&Registry::active(), &inner));
        }
        assert!(Rc::ptr_eq(&Registry::active(), &outer));
    }

    #[test]
    fn custom_rules_take_precedence() {
        struct UppercaseStrings;
        impl ConstructorRule for UppercaseStrings {
            fn try_primitive(
                &self,
                info: &PrimitiveTypeInfo,
                _registry: &Registry,
            ) -> Option<PrimitiveSpec> {
                match info.norm.ty {
                    TypeExpr::Str => Some(PrimitiveSpec::scalar(
                        "SHOUT",
                        |tokens| Ok(crate::Value::Str(tokens[0].to_uppercase())),
                        |v| matches!(v, crate::Value::Str(_)),
                        |v| Some(vec![v.to_string()]),
                    )),
                    _ => None,
                }
            }
        }

        let mut registry = Registry::new();
        registry.add_rule(Box::new(UppercaseStrings));
        let spec = registry
            .get_primitive_spec(&info_for(TypeExpr::Str))
            .unwrap();
        assert_eq!(spec.metavar, "SHOUT");
        assert_eq!(
            spec.instantiate(&["hi".to_string()]).unwrap(),
            crate::Value::Str("HI".to_string())
        );
    }

    #[test]
    fn unsupported_types_are_reported() {
        let registry = Registry::new();
        let err = registry
            .get_primitive_spec(&info_for(TypeExpr::Any))
            .unwrap_err();
        assert!(matches!(err, SpecError::UnsupportedTypeAnnotation(_)));
    }
}
