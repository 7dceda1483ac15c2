use super::{
    Expr, ExprKind, FieldDecl, ImplementationDecl, InterfaceDecl, MessageExpr, MethodDecl,
    MethodKind, PropertyDecl, Receiver, TranslationUnit, TypeRef,
};
use std::collections::{HashMap, HashSet};

/// Name lookups over one translation unit.
///
/// Superclass chains are followed for properties, fields and declared
/// methods; cycles in malformed input are cut off.
#[derive(Debug)]
pub struct DeclIndex<'tu> {
    tu: &'tu TranslationUnit,
    interfaces: HashMap<&'tu str, &'tu InterfaceDecl>,
    implementations: HashMap<&'tu str, &'tu ImplementationDecl>,
}

impl<'tu> DeclIndex<'tu> {
    pub fn new(tu: &'tu TranslationUnit) -> Self {
        let interfaces = tu
            .interfaces
            .iter()
            .map(|decl| (decl.name.as_str(), decl))
            .collect();
        let implementations = tu
            .implementations
            .iter()
            .map(|decl| (decl.name.as_str(), decl))
            .collect();
        Self {
            tu,
            interfaces,
            implementations,
        }
    }

    pub fn translation_unit(&self) -> &'tu TranslationUnit {
        self.tu
    }

    pub fn interface(&self, name: &str) -> Option<&'tu InterfaceDecl> {
        self.interfaces.get(name).copied()
    }

    pub fn implementation(&self, name: &str) -> Option<&'tu ImplementationDecl> {
        self.implementations.get(name).copied()
    }

    pub fn superclass(&self, name: &str) -> Option<&'tu str> {
        self.interface(name)?.superclass.as_deref()
    }

    /// `name` followed by its ancestors.
    fn lineage(&self, name: &str) -> Vec<&'tu InterfaceDecl> {
        let mut seen = HashSet::new();
        let mut chain = Vec::new();
        let mut current = self.interface(name);
        while let Some(decl) = current {
            if !seen.insert(decl.name.as_str()) {
                break;
            }
            chain.push(decl);
            current = decl.superclass.as_deref().and_then(|s| self.interface(s));
        }
        chain
    }

    pub fn find_property(&self, class: &str, property: &str) -> Option<&'tu PropertyDecl> {
        self.lineage(class)
            .into_iter()
            .find_map(|decl| decl.properties.iter().find(|p| p.name == property))
    }

    /// Property whose setter is `selector`, on `class` or an ancestor.
    pub fn find_property_by_setter(
        &self,
        class: &str,
        selector: &str,
    ) -> Option<&'tu PropertyDecl> {
        self.lineage(class).into_iter().find_map(|decl| {
            decl.properties
                .iter()
                .find(|p| p.setter_selector() == selector)
        })
    }

    /// Fields declared in the implementation first, then along the interface
    /// chain.
    pub fn find_field(&self, class: &str, field: &str) -> Option<&'tu FieldDecl> {
        let in_impl = self
            .implementation(class)
            .and_then(|imp| imp.fields.iter().find(|f| f.name == field));
        in_impl.or_else(|| {
            self.lineage(class)
                .into_iter()
                .find_map(|decl| decl.fields.iter().find(|f| f.name == field))
        })
    }

    /// Explicit implementation of an instance method in `class` or an
    /// ancestor.
    pub fn find_method_impl(&self, class: &str, selector: &str) -> Option<&'tu MethodDecl> {
        let mut seen = HashSet::new();
        let mut current = Some(class);
        while let Some(name) = current {
            if !seen.insert(name.to_string()) {
                break;
            }
            let found = self.implementation(name).and_then(|imp| {
                imp.methods
                    .iter()
                    .find(|m| m.kind == MethodKind::Instance && m.selector == selector)
            });
            if found.is_some() {
                return found;
            }
            current = self.superclass(name);
        }
        None
    }

    /// Whether instances of `class` are known to respond to `selector`:
    /// declared methods, property accessors and implemented methods count.
    pub fn declares_instance_method(&self, class: &str, selector: &str) -> bool {
        let declared = self.lineage(class).into_iter().any(|decl| {
            decl.methods
                .iter()
                .any(|m| m.kind == MethodKind::Instance && m.selector == selector)
                || decl
                    .properties
                    .iter()
                    .any(|p| p.name == selector || p.setter_selector() == selector)
        });
        declared || self.find_method_impl(class, selector).is_some()
    }
}

/// A [`DeclIndex`] seen from inside the methods of one class, so that `self`
/// has a type.
#[derive(Debug, Clone, Copy)]
pub struct ClassScope<'a> {
    pub index: &'a DeclIndex<'a>,
    pub class: &'a str,
}

impl<'a> ClassScope<'a> {
    pub fn new(index: &'a DeclIndex<'a>, class: &'a str) -> Self {
        Self { index, class }
    }

    pub fn field(&self, field: &str) -> Option<&'a FieldDecl> {
        self.index.find_field(self.class, field)
    }

    /// Class of the object a message is sent to, when it can be resolved.
    pub fn receiver_class(&self, receiver: &Receiver) -> Option<String> {
        match receiver {
            Receiver::Instance { expr } => self.static_type(expr)?.class_name().map(str::to_string),
            Receiver::Super => self.index.superclass(self.class).map(str::to_string),
            Receiver::Class { .. } => None,
        }
    }

    /// Declared type of an expression, as far as the closed AST allows.
    pub fn static_type(&self, expr: &Expr) -> Option<TypeRef> {
        match &expr.kind {
            ExprKind::Paren { inner } => self.static_type(inner),
            ExprKind::Cast { ty, inner } => match ty {
                TypeRef::Object(_) => Some(ty.clone()),
                _ => self.static_type(inner),
            },
            ExprKind::SelfRef => Some(TypeRef::object(self.class)),
            ExprKind::FieldRef { field } => self.field(field).map(|f| f.ty.clone()),
            ExprKind::Var { ty, .. } => ty.clone(),
            ExprKind::Message(message) => self.resolve_getter(message).map(|p| p.ty.clone()),
            _ => None,
        }
    }

    /// Property written by a one-argument `setX:` message, looked up on the
    /// receiver's class.
    pub fn resolve_setter(&self, message: &MessageExpr) -> Option<&'a PropertyDecl> {
        if message.args.len() != 1 {
            return None;
        }
        let class = self.receiver_class(&message.receiver)?;
        self.index
            .find_property_by_setter(&class, &message.selector)
    }

    /// Property read by a zero-argument message named after it.
    pub fn resolve_getter(&self, message: &MessageExpr) -> Option<&'a PropertyDecl> {
        if !message.args.is_empty() || message.selector.contains(':') {
            return None;
        }
        let class = self.receiver_class(&message.receiver)?;
        self.index.find_property(&class, &message.selector)
    }
}
