//! Attribute parsing shared by the derives.

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Expr, ExprLit, Field, Lit, LitStr, Meta, Path, Token, Type, Visibility,
};

/// Field attributes carried into the runtime tag table.
pub const TAG_ATTRS: &[&str] = &["http", "validate", "description"];

/// Container options from `#[daedalus(...)]`.
#[derive(Debug, Default)]
pub struct ContainerOpts {
    /// Path of the runtime crate.
    pub krate: Option<Path>,
    /// Skip the generated `Construct` impl.
    pub no_construct: bool,
    /// Generate an empty `Operations` impl.
    pub no_operations: bool,
}

impl ContainerOpts {
    /// Reads every `#[daedalus(...)]` on a container.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut opts = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("daedalus")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    let lit: LitStr = meta.value()?.parse()?;
                    opts.krate = Some(lit.parse()?);
                    Ok(())
                } else if meta.path.is_ident("no_construct") {
                    opts.no_construct = true;
                    Ok(())
                } else if meta.path.is_ident("no_operations") {
                    opts.no_operations = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown daedalus option"))
                }
            })?;
        }
        Ok(opts)
    }

    /// The runtime crate path, `::daedalus` by default.
    pub fn krate(&self) -> TokenStream {
        self.krate
            .as_ref()
            .map_or_else(|| quote!(::daedalus), ToTokens::to_token_stream)
    }
}

/// Arguments of `#[operations(...)]`.
#[derive(Debug, Default)]
pub struct OperationsArgs {
    /// Path of the runtime crate.
    pub krate: Option<Path>,
}

impl Parse for OperationsArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = Self::default();
        let metas: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;
        for meta in metas {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("crate") => {
                    let lit = string_value(&nv.value)?;
                    args.krate = Some(lit.parse()?);
                }
                other => return Err(syn::Error::new(other.span(), "expected `crate = \"path\"`")),
            }
        }
        Ok(args)
    }
}

impl OperationsArgs {
    /// The runtime crate path, `::daedalus` by default.
    pub fn krate(&self) -> TokenStream {
        self.krate
            .as_ref()
            .map_or_else(|| quote!(::daedalus), ToTokens::to_token_stream)
    }
}

fn string_value(expr: &Expr) -> syn::Result<LitStr> {
    match expr {
        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(s.clone()),
        _ => Err(syn::Error::new(expr.span(), "expected string literal")),
    }
}

/// Options and tags of one field.
#[derive(Debug, Default)]
pub struct FieldOpts {
    /// `(name, value)` pairs for the runtime tag table.
    pub tags: Vec<(String, String)>,
    /// `#[middleware]`.
    pub middleware: bool,
    /// `#[extender]`.
    pub extender: bool,
    /// `#[inject]` / `#[inject("name")]`.
    pub inject: Option<Option<String>>,
    /// `#[daedalus(no_schema)]`.
    pub no_schema: bool,
    /// `#[daedalus(nested)]`: the type's member rules apply.
    pub nested: bool,
    /// `#[serde(rename = "...")]`.
    pub rename: Option<String>,
}

impl FieldOpts {
    /// Reads the attributes of `field`.
    ///
    /// `#[http("...")]`, `#[validate("...")]` and `#[description("...")]`
    /// become tags of the same name; `#[tag(name = "...")]` adds any other.
    pub fn from_field(field: &Field) -> syn::Result<Self> {
        let mut opts = Self::default();
        for attr in &field.attrs {
            let path = attr.path();
            if let Some(name) = TAG_ATTRS.iter().find(|n| path.is_ident(n)) {
                opts.tags.push(((*name).to_string(), attr_text(attr)?));
            } else if path.is_ident("tag") {
                attr.parse_nested_meta(|meta| {
                    let name = meta
                        .path
                        .get_ident()
                        .ok_or_else(|| meta.error("expected tag name"))?
                        .to_string();
                    let value: LitStr = meta.value()?.parse()?;
                    opts.tags.push((name, value.value()));
                    Ok(())
                })?;
            } else if path.is_ident("middleware") {
                opts.middleware = true;
            } else if path.is_ident("extender") {
                opts.extender = true;
            } else if path.is_ident("inject") {
                opts.inject = Some(match &attr.meta {
                    Meta::Path(_) => None,
                    _ => Some(attr_text(attr)?),
                });
            } else if path.is_ident("daedalus") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("no_schema") {
                        opts.no_schema = true;
                        Ok(())
                    } else if meta.path.is_ident("nested") {
                        opts.nested = true;
                        Ok(())
                    } else {
                        Err(meta.error("unknown daedalus field option"))
                    }
                })?;
            } else if path.is_ident("serde") {
                // Serde checks its own attributes; only the rename matters here.
                let _ = attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                        let value: LitStr = meta.value()?.parse()?;
                        opts.rename = Some(value.value());
                    } else if meta.input.peek(Token![=]) {
                        meta.value()?.parse::<Expr>()?;
                    } else if meta.input.peek(syn::token::Paren) {
                        meta.parse_nested_meta(|inner| {
                            if inner.input.peek(Token![=]) {
                                inner.value()?.parse::<Expr>()?;
                            }
                            Ok(())
                        })?;
                    }
                    Ok(())
                });
            }
        }
        Ok(opts)
    }

    /// Whether validation reads the field's value.
    pub fn is_checked(&self) -> bool {
        self.nested || self.has_rule_tags()
    }

    /// Whether the field carries a tag that validation reads.
    pub fn has_rule_tags(&self) -> bool {
        self.tags
            .iter()
            .any(|(name, _)| name != "http" && name != "description")
    }

    /// The `&[("name", "value"), ...]` literal.
    pub fn tag_table(&self) -> TokenStream {
        let entries = self.tags.iter().map(|(name, value)| quote!((#name, #value)));
        quote!(&[#(#entries),*])
    }
}

/// Text of `#[name("text")]`, `#[name = "text"]` or `#[name]` (empty).
fn attr_text(attr: &Attribute) -> syn::Result<String> {
    match &attr.meta {
        Meta::Path(_) => Ok(String::new()),
        Meta::List(list) => Ok(list.parse_args::<LitStr>()?.value()),
        Meta::NameValue(nv) => Ok(string_value(&nv.value)?.value()),
    }
}

/// `true` for `pub` fields.
pub fn is_public(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

/// Compact source text of a type, for diagnostics.
pub fn type_text(ty: &Type) -> String {
    ty.to_token_stream().to_string().replace(' ', "")
}
