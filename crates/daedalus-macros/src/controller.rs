//! `#[derive(Controller)]` expansion.

use crate::class::{ends_with, single_argument};
use crate::field::{struct_fields, type_name, FieldInfo};
use crate::parse::ContainerOpts;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Type};

const PREDECESSORS: &[&str] = &["WebServer", "WebController", "WebMiddleware"];

/// Expands the derive into `Controller` and, unless disabled, `Construct`.
pub fn expand_controller(input: DeriveInput) -> syn::Result<TokenStream> {
    let opts = ContainerOpts::from_attrs(&input.attrs)?;
    let krate = opts.krate();
    let fields = struct_fields(&input, "Controller")?;
    let ident = &input.ident;
    let name = type_name(&input);
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut predecessors = Vec::new();
    let mut middlewares = Vec::new();
    let mut extenders = Vec::new();
    for field in &fields {
        let label = &field.name;
        let member = &field.member;
        if ends_with(&field.ty, PREDECESSORS) {
            let ty = &field.ty;
            let tags = field.opts.tag_table();
            predecessors.push(quote! {
                #krate::PredecessorSlot::of::<#ty>(#label, #krate::Tags::new(#tags))
            });
        } else if field.opts.middleware || field.opts.extender {
            mounted_type(field)?;
            let mount = quote!(#krate::Mount::new(#label, self.#member.clone()));
            if field.opts.middleware {
                middlewares.push(mount);
            } else {
                extenders.push(mount);
            }
        }
    }

    let construct = if opts.no_construct {
        TokenStream::new()
    } else {
        let body = construct_body(&input, &fields, &krate)?;
        quote! {
            impl #impl_generics #krate::Construct for #ident #ty_generics #where_clause {
                fn construct(refs: &#krate::Container) -> ::core::result::Result<Self, #krate::InjectionError> {
                    Ok(#body)
                }
            }
        }
    };

    let operations = if opts.no_operations {
        quote! {
            impl #impl_generics #krate::Operations for #ident #ty_generics #where_clause {
                fn operations() -> ::std::vec::Vec<#krate::OperationDef<Self>> {
                    ::std::vec::Vec::new()
                }
            }
        }
    } else {
        TokenStream::new()
    };

    Ok(quote! {
        impl #impl_generics #krate::Controller for #ident #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #name
            }

            fn layout(&self) -> #krate::ControllerLayout {
                #krate::ControllerLayout {
                    predecessors: ::std::vec![#(#predecessors),*],
                    middlewares: ::std::vec![#(#middlewares),*],
                    extenders: ::std::vec![#(#extenders),*],
                }
            }
        }

        #construct
        #operations
    })
}

/// The `T` of a mounted `Arc<T>` field.
fn mounted_type(field: &FieldInfo) -> syn::Result<&Type> {
    single_argument(&field.ty, "Arc").ok_or_else(|| {
        syn::Error::new_spanned(&field.ty, "mounted controllers must be declared as Arc<T>")
    })
}

fn construct_body(input: &DeriveInput, fields: &[FieldInfo], krate: &TokenStream) -> syn::Result<TokenStream> {
    let values = fields
        .iter()
        .map(|field| field_value(field, krate))
        .collect::<syn::Result<Vec<_>>>()?;
    let Data::Struct(data) = &input.data else {
        return Ok(quote!(Self));
    };
    Ok(match &data.fields {
        Fields::Named(_) => {
            let members = fields.iter().map(|f| &f.member);
            quote!(Self { #(#members: #values),* })
        }
        Fields::Unnamed(_) => quote!(Self(#(#values),*)),
        Fields::Unit => quote!(Self),
    })
}

fn field_value(field: &FieldInfo, krate: &TokenStream) -> syn::Result<TokenStream> {
    if ends_with(&field.ty, PREDECESSORS) {
        return Ok(quote!(::core::default::Default::default()));
    }
    if field.opts.middleware || field.opts.extender {
        let inner = mounted_type(field)?;
        return Ok(quote! {
            ::std::sync::Arc::new(<#inner as #krate::Construct>::construct(refs)?)
        });
    }
    let Some(key) = &field.opts.inject else {
        return Ok(quote!(::core::default::Default::default()));
    };
    let (optional, arc) = match single_argument(&field.ty, "Option") {
        Some(inner) => (true, inner),
        None => (false, &field.ty),
    };
    let target = single_argument(arc, "Arc").ok_or_else(|| {
        syn::Error::new_spanned(&field.ty, "injected references must be declared as Arc<T> or Option<Arc<T>>")
    })?;
    Ok(match (key, optional) {
        (None, false) => quote!(refs.resolve_required::<#target>()?),
        (Some(key), false) => quote!(refs.resolve_named_required::<#target>(#key)?),
        (None, true) => quote!(refs.resolve::<#target>()),
        (Some(key), true) => quote!(refs.resolve_named::<#target>(#key)),
    })
}
