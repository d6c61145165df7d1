//! `#[operations]` expansion.

use crate::parse::OperationsArgs;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, ReturnType, Type, Visibility};

const VERBS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "head", "connect", "options", "trace", "handle",
];

const SETUP_ROUTER: &str = "setup_router";

/// Explicit registration marker on a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    /// `#[operation]`: register whatever the name.
    Include,
    /// `#[operation(skip)]`: never register.
    Skip,
}

/// Removes `#[operation]` attributes from `attrs` and returns the marker.
fn take_marker(attrs: &mut Vec<Attribute>) -> syn::Result<Option<Marker>> {
    let mut marker = None;
    let mut error = None;
    attrs.retain(|attr| {
        if !attr.path().is_ident("operation") {
            return true;
        }
        marker = Some(Marker::Include);
        if let syn::Meta::List(_) = attr.meta {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    marker = Some(Marker::Skip);
                    Ok(())
                } else {
                    Err(meta.error("expected `skip`"))
                }
            });
            if let Err(e) = parsed {
                error = Some(e);
            }
        }
        false
    });
    error.map_or(Ok(marker), Err)
}

/// Re-emits the impl block and registers its operation methods.
///
/// A method is registered when it is `pub`, takes `&self` or
/// `self: Arc<Self>` plus exactly one parameter, has no generics, and its
/// name starts with a verb once lowercased and stripped of underscores.
/// `#[operation]` registers a method whose verb comes from a `method=`
/// override instead, and `#[operation(skip)]` keeps a verb-named helper
/// out. A method named `setup_router` becomes the router hook.
pub fn expand_operations(args: OperationsArgs, mut item: ItemImpl) -> syn::Result<TokenStream> {
    if item.trait_.is_some() {
        return Err(syn::Error::new_spanned(
            &item.self_ty,
            "#[operations] must be placed on an inherent impl block",
        ));
    }
    let krate = args.krate();
    let mut markers = Vec::new();
    for method in item.items.iter_mut().filter_map(|i| match i {
        ImplItem::Fn(f) => Some(f),
        _ => None,
    }) {
        markers.push(take_marker(&mut method.attrs)?);
    }
    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    let mut defs = Vec::new();
    let mut setup = TokenStream::new();
    let methods = item.items.iter().filter_map(|i| match i {
        ImplItem::Fn(f) => Some(f),
        _ => None,
    });
    for (method, marker) in methods.zip(markers) {
        let name = method.sig.ident.to_string();
        if name == SETUP_ROUTER {
            setup = quote! {
                fn setup_router(
                    &self,
                    scope: &mut #krate::RouteScope<'_>,
                ) -> ::core::result::Result<(), #krate::SynthesisError> {
                    <#self_ty>::setup_router(self, scope)
                }
            };
            continue;
        }
        if marker == Some(Marker::Skip) {
            continue;
        }
        let named_for_verb = marker == Some(Marker::Include) || is_operation_name(&name);
        if !named_for_verb {
            continue;
        }
        if let Some(def) = operation_def(method, &name, &krate) {
            defs.push(def);
        }
    }

    Ok(quote! {
        #item

        impl #impl_generics #krate::Operations for #self_ty #where_clause {
            fn operations() -> ::std::vec::Vec<#krate::OperationDef<Self>> {
                ::std::vec![#(#defs),*]
            }

            #setup
        }
    })
}

fn is_operation_name(name: &str) -> bool {
    let normalized: String = name
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect();
    VERBS.iter().any(|verb| normalized.starts_with(verb))
}

fn has_shared_receiver(method: &ImplItemFn) -> bool {
    match method.sig.inputs.first() {
        Some(FnArg::Receiver(receiver)) => {
            if receiver.colon_token.is_some() {
                matches!(&*receiver.ty, Type::Path(p) if p.path.segments.last().is_some_and(|s| s.ident == "Arc"))
            } else {
                receiver.reference.is_some() && receiver.mutability.is_none()
            }
        }
        _ => false,
    }
}

fn operation_def(method: &ImplItemFn, name: &str, krate: &TokenStream) -> Option<TokenStream> {
    let sig = &method.sig;
    if !matches!(method.vis, Visibility::Public(_))
        || !sig.generics.params.is_empty()
        || sig.inputs.len() != 2
        || !has_shared_receiver(method)
    {
        return None;
    }
    let FnArg::Typed(param) = &sig.inputs[1] else {
        return None;
    };
    let input = &param.ty;
    let output = match &sig.output {
        ReturnType::Default => quote!(()),
        ReturnType::Type(_, ty) => quote!(#ty),
    };
    let ident = &sig.ident;
    let call = if sig.asyncness.is_some() {
        quote!(this.#ident(input).await)
    } else {
        quote!(this.#ident(input))
    };
    Some(quote! {
        #krate::OperationDef::new::<#input, #output>(
            #name,
            |this: ::std::sync::Arc<Self>, input: #input| -> #krate::__private::BoxFuture<'static, #output> {
                ::std::boxed::Box::pin(async move { #call })
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expanded(item: ItemImpl) -> String {
        let result = expand_operations(OperationsArgs::default(), item);
        assert!(result.is_ok(), "expansion failed: {:?}", result.err());
        result.unwrap().to_string()
    }

    #[test]
    fn test_registers_verb_methods() {
        let code = expanded(parse_quote! {
            impl Users {
                pub async fn get_user(&self, params: GetUser) -> UserResult {
                    todo!()
                }

                pub fn post_user(self: Arc<Self>, params: NewUser) {}

                pub fn helper(&self, x: i32) -> i32 { x }

                fn get_hidden(&self, params: GetUser) -> UserResult { todo!() }

                pub fn get_two(&self, a: A, b: B) -> UserResult { todo!() }
            }
        });
        assert!(code.contains("OperationDef :: new :: < GetUser , UserResult > (\"get_user\""));
        assert!(code.contains("this . get_user (input) . await"));
        assert!(code.contains("OperationDef :: new :: < NewUser , () > (\"post_user\""));
        assert!(!code.contains("\"helper\""));
        assert!(!code.contains("\"get_hidden\""));
        assert!(!code.contains("\"get_two\""));
    }

    #[test]
    fn test_middleware_handle_and_setup_router() {
        let code = expanded(parse_quote! {
            impl Log {
                pub async fn handle(&self, ctx: WebContext) {}

                pub fn setup_router(&self, scope: &mut RouteScope<'_>) -> Result<(), SynthesisError> {
                    Ok(())
                }
            }
        });
        assert!(code.contains("(\"handle\""));
        assert!(code.contains("fn setup_router"));
        assert!(code.contains("< Log > :: setup_router (self , scope)"));
        assert!(!code.contains("(\"setup_router\""));
    }

    #[test]
    fn test_mutable_receiver_is_skipped() {
        let code = expanded(parse_quote! {
            impl Users {
                pub fn get_user(&mut self, params: GetUser) -> UserResult { todo!() }
            }
        });
        assert!(!code.contains("\"get_user\""));
    }

    #[test]
    fn test_markers() {
        let code = expanded(parse_quote! {
            impl BasicAuth {
                #[operation]
                pub async fn authorize(&self, params: AuthParams) {}

                #[operation(skip)]
                pub fn get_realm(&self, params: Realm) -> String { todo!() }
            }
        });
        assert!(code.contains("(\"authorize\""));
        assert!(!code.contains("(\"get_realm\""));
        assert!(!code.contains("# [operation"));
    }

    #[test]
    fn test_trait_impl_is_rejected() {
        let item: ItemImpl = parse_quote! {
            impl Clone for Users {
                fn clone(&self) -> Self { todo!() }
            }
        };
        assert!(expand_operations(OperationsArgs::default(), item).is_err());
    }

    #[test]
    fn test_operation_names() {
        assert!(is_operation_name("GetUser"));
        assert!(is_operation_name("handle_log"));
        assert!(!is_operation_name("fetch"));
    }
}
