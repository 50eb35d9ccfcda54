//! Shape classification of resolved symbols

use syn::{GenericArgument, PathArguments, Type};

use crate::symbol::{Symbol, Underlying};

/// What the generated redaction can rely on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// The value is a string reachable through `depth` tuple hops
    Textual { depth: usize },
    Other,
}

impl Shape {
    pub fn is_textual(&self) -> bool {
        matches!(self, Shape::Textual { .. })
    }
}

/// Classify a symbol by its underlying representation
pub fn classify(symbol: &Symbol) -> Shape {
    match symbol.representation.underlying {
        Underlying::Textual if symbol.representation.depth > 0 => Shape::Textual {
            depth: symbol.representation.depth,
        },
        _ => Shape::Other,
    }
}

/// Whether `ty` spells one of the string primitives
pub fn is_textual_type(ty: &Type) -> bool {
    match ty {
        Type::Paren(paren) => is_textual_type(&paren.elem),
        Type::Group(group) => is_textual_type(&group.elem),
        Type::Reference(reference) => is_str(&reference.elem),
        Type::Path(type_path) if type_path.qself.is_none() => {
            let path = &type_path.path;
            let Some(last) = path.segments.last() else {
                return false;
            };
            let joined = path
                .segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect::<Vec<_>>()
                .join("::");

            match last.ident.to_string().as_str() {
                "String" => {
                    matches!(last.arguments, PathArguments::None)
                        && matches!(
                            joined.as_str(),
                            "String"
                                | "string::String"
                                | "std::string::String"
                                | "alloc::string::String"
                        )
                }
                "Box" | "Rc" | "Arc" | "Cow" => str_argument(&last.arguments),
                _ => false,
            }
        }
        _ => false,
    }
}

fn is_str(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path.qself.is_none() && type_path.path.is_ident("str"),
        Type::Paren(paren) => is_str(&paren.elem),
        Type::Group(group) => is_str(&group.elem),
        _ => false,
    }
}

/// `<str>` or `<'a, str>`
fn str_argument(arguments: &PathArguments) -> bool {
    let PathArguments::AngleBracketed(angle) = arguments else {
        return false;
    };
    let types: Vec<&Type> = angle
        .args
        .iter()
        .filter_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
        .collect();
    types.len() == 1 && is_str(types[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{ImplGenerics, Representation, SymbolKind};

    fn ty(src: &str) -> Type {
        syn::parse_str(src).unwrap()
    }

    fn symbol(depth: usize, underlying: Underlying) -> Symbol {
        Symbol {
            name: "Token".to_string(),
            ident: "Token".to_string(),
            module: Vec::new(),
            kind: SymbolKind::Newtype,
            generics: ImplGenerics::default(),
            derives_debug: false,
            representation: Representation { depth, underlying },
        }
    }

    #[test]
    fn test_textual_spellings() {
        for src in [
            "String",
            "std::string::String",
            "::std::string::String",
            "alloc::string::String",
            "&str",
            "&'static str",
            "&'a mut str",
            "Box<str>",
            "std::rc::Rc<str>",
            "Arc<str>",
            "Cow<'a, str>",
            "std::borrow::Cow<'static, str>",
            "(String)",
        ] {
            assert!(is_textual_type(&ty(src)), "{} should be textual", src);
        }
    }

    #[test]
    fn test_non_textual_spellings() {
        for src in [
            "i64",
            "Vec<u8>",
            "&[u8]",
            "Box<String>",
            "Option<String>",
            "my::String",
            "String<T>",
            "char",
            "(String, String)",
        ] {
            assert!(!is_textual_type(&ty(src)), "{} should not be textual", src);
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(&symbol(1, Underlying::Textual)),
            Shape::Textual { depth: 1 }
        );
        assert_eq!(
            classify(&symbol(2, Underlying::Textual)),
            Shape::Textual { depth: 2 }
        );
        assert_eq!(
            classify(&symbol(1, Underlying::Opaque("i64".to_string()))),
            Shape::Other
        );
        // An alias of String has no newtype to destructure
        assert_eq!(classify(&symbol(0, Underlying::Textual)), Shape::Other);
    }
}
