//! `#[derive(Outcome)]` expansion.

use crate::class::Class;
use crate::field::{struct_fields, type_name, FieldInfo};
use crate::parse::ContainerOpts;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

/// Expands the derive into an `Outcome` impl.
pub fn expand_outcome(input: DeriveInput) -> syn::Result<TokenStream> {
    let opts = ContainerOpts::from_attrs(&input.attrs)?;
    let krate = opts.krate();
    let fields = struct_fields(&input, "Outcome")?;
    let ident = &input.ident;
    let name = type_name(&input);
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let entries = fields.iter().map(|field| output_field(field, &krate));

    Ok(quote! {
        impl #impl_generics #krate::Outcome for #ident #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #name
            }

            fn fields() -> ::std::vec::Vec<#krate::OutputField<Self>> {
                ::std::vec![#(#entries),*]
            }
        }
    })
}

fn output_field(field: &FieldInfo, krate: &TokenStream) -> TokenStream {
    let descriptor = field.descriptor(krate, false);
    let member = &field.member;
    let value = quote!(#krate::OutputValue);
    let take = match (field.shape.class, field.shape.optional) {
        (Class::Text, true) => quote! {
            |this: &mut Self| Ok(this.#member.take().map(|v| #value::Text(::std::string::String::from(v))))
        },
        (Class::Scalar | Class::Struct, true) => quote! {
            |this: &mut Self| this.#member.take().map(|v| #value::data(&v)).transpose()
        },
        (Class::Fault, true) => quote! {
            |this: &mut Self| Ok(this.#member.take().map(#value::Error))
        },
        (Class::Bytes, true) => quote! {
            |this: &mut Self| Ok(this.#member.take().map(#value::bytes))
        },
        (Class::Bytes, false) => quote! {
            |this: &mut Self| {
                if this.#member.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(#value::bytes(::std::mem::take(&mut this.#member))))
                }
            }
        },
        (Class::Sequence | Class::Map, false) => quote! {
            |this: &mut Self| {
                if this.#member.is_empty() {
                    Ok(None)
                } else {
                    #value::data(&this.#member).map(Some)
                }
            }
        },
        _ => quote!(|_: &mut Self| Ok(None)),
    };
    quote!(#krate::OutputField::new(#descriptor, #take))
}
