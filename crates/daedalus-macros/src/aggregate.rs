//! `#[derive(Aggregate)]` expansion.

use crate::class::{rule_target, Class};
use crate::field::{struct_fields, type_name, FieldInfo};
use crate::parse::ContainerOpts;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

/// Expands the derive into an `Aggregate` impl, plus `Deref` to the
/// context when the struct has exactly one named, non-optional carrier.
pub fn expand_aggregate(input: DeriveInput) -> syn::Result<TokenStream> {
    let opts = ContainerOpts::from_attrs(&input.attrs)?;
    let krate = opts.krate();
    let fields = struct_fields(&input, "Aggregate")?;
    let ident = &input.ident;
    let name = type_name(&input);
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let entries = fields.iter().map(|field| input_field(field, &krate));

    let carriers: Vec<&FieldInfo> = fields
        .iter()
        .filter(|f| f.shape.class == Class::Context)
        .collect();
    let deref = match carriers.as_slice() {
        [carrier] if carrier.named && !carrier.shape.optional => {
            let member = &carrier.member;
            quote! {
                impl #impl_generics ::core::ops::Deref for #ident #ty_generics #where_clause {
                    type Target = #krate::WebContext;

                    fn deref(&self) -> &Self::Target {
                        &self.#member
                    }
                }
            }
        }
        _ => TokenStream::new(),
    };

    Ok(quote! {
        impl #impl_generics #krate::Aggregate for #ident #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #name
            }

            fn fields() -> ::std::vec::Vec<#krate::InputField<Self>> {
                ::std::vec![#(#entries),*]
            }
        }

        #deref
    })
}

fn input_field(field: &FieldInfo, krate: &TokenStream) -> TokenStream {
    let descriptor = field.descriptor(krate, true);
    let member = &field.member;
    let skipped = field.shape.class != Class::Context && field.is_ignored();
    let binder = if skipped || field.shape.class == Class::Unknown {
        quote!(#krate::Binder::Value(|_: &mut Self, _| Ok(())))
    } else {
        match field.shape.class {
            Class::Context => {
                let value = if field.shape.optional {
                    quote!(::core::option::Option::Some(ctx))
                } else {
                    quote!(ctx)
                };
                quote!(#krate::Binder::Context(|this: &mut Self, ctx| this.#member = #value))
            }
            Class::Struct => {
                let decoded = quote!(#krate::__private::decode_body(req, fallback)?);
                let value = if field.shape.optional {
                    quote!(::core::option::Option::Some(#decoded))
                } else {
                    decoded
                };
                quote! {
                    #krate::Binder::Whole(|this: &mut Self, req, fallback| {
                        this.#member = #value;
                        Ok(())
                    })
                }
            }
            _ => quote! {
                #krate::Binder::Value(|this: &mut Self, value| {
                    this.#member = #krate::__private::serde_json::from_value(value)?;
                    Ok(())
                })
            },
        }
    };
    let checked = field.opts.is_checked() && !skipped && field.shape.class != Class::Context;
    let read = if checked {
        quote!(.with_read(|this: &Self| #krate::__private::serde_json::to_value(&this.#member)))
    } else {
        TokenStream::new()
    };
    let members = if checked && field.opts.nested {
        let target = rule_target(&field.ty);
        quote!(.with_members(<#target as #krate::Validate>::member_rules()))
    } else {
        TokenStream::new()
    };
    quote!(#krate::InputField::new(#descriptor, #binder)#read #members)
}
