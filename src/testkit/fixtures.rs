//! Translation units shared by unit and integration tests.

use super::helpers::{backed_property, property};
use crate::ast::{
    FieldDecl, ImplementationDecl, InterfaceDecl, LangOptions, MethodDecl, Ownership,
    SourceRange, TranslationUnit, TypeRef,
};

/// The canonical shape the dangling delegate checker looks for:
///
/// ```text
/// @interface Bar : NSObject
/// @property (assign) id delegate;
/// @end
/// @interface SubBar : Bar @end
/// @interface Foo : NSObject {
///   Bar *_bar;
/// }
/// @property (strong) Bar *bar;   // backed by _bar
/// @end
/// @implementation Foo <methods> @end
/// ```
///
/// Fields are released automatically.
pub fn delegate_pair(methods: Vec<MethodDecl>) -> TranslationUnit {
    TranslationUnit {
        path: "Foo.m".to_string(),
        lang: LangOptions {
            auto_release_fields: true,
        },
        interfaces: vec![
            InterfaceDecl {
                name: "Bar".to_string(),
                superclass: Some("NSObject".to_string()),
                properties: vec![
                    property("delegate", TypeRef::Id, Ownership::Assign),
                    property("dataSource", TypeRef::Id, Ownership::Assign),
                    property("owner", TypeRef::Id, Ownership::Weak),
                    property("title", TypeRef::object("NSString"), Ownership::Copy),
                ],
                ..Default::default()
            },
            InterfaceDecl {
                name: "SubBar".to_string(),
                superclass: Some("Bar".to_string()),
                ..Default::default()
            },
            InterfaceDecl {
                name: "Foo".to_string(),
                superclass: Some("NSObject".to_string()),
                fields: vec![FieldDecl {
                    name: "_bar".to_string(),
                    ty: TypeRef::object("Bar"),
                    range: SourceRange::line(4),
                }],
                properties: vec![backed_property(
                    "bar",
                    TypeRef::object("Bar"),
                    Ownership::Strong,
                )],
                ..Default::default()
            },
        ],
        implementations: vec![ImplementationDecl {
            name: "Foo".to_string(),
            fields: Vec::new(),
            methods,
            range: SourceRange::line(10),
        }],
        globals: Vec::new(),
    }
}

/// Like [`delegate_pair`] but with manual reference counting.
pub fn manual_release_pair(methods: Vec<MethodDecl>) -> TranslationUnit {
    TranslationUnit {
        lang: LangOptions {
            auto_release_fields: false,
        },
        ..delegate_pair(methods)
    }
}

/// [`delegate_pair`] plus a second field `_sub` of type `SubBar`, declared in
/// the implementation.
pub fn two_field_pair(methods: Vec<MethodDecl>) -> TranslationUnit {
    let mut tu = delegate_pair(methods);
    if let Some(implementation) = tu.implementations.first_mut() {
        implementation.fields.push(FieldDecl {
            name: "_sub".to_string(),
            ty: TypeRef::object("SubBar"),
            range: SourceRange::line(11),
        });
    }
    tu
}
