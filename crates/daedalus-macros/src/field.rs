//! Per-field information shared by the derives.

use crate::class::{classify, Class, Shape};
use crate::parse::{is_public, type_text, FieldOpts};
use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::{Data, DeriveInput, Fields, Index, Member, Type};

/// One struct field with its options and shape.
pub struct FieldInfo {
    pub index: usize,
    pub member: Member,
    /// Identifier text; the position for tuple fields.
    pub name: String,
    pub named: bool,
    pub public: bool,
    pub ty: Type,
    pub shape: Shape,
    pub opts: FieldOpts,
}

impl FieldInfo {
    /// `true` for `_`-prefixed names.
    pub fn is_ignored(&self) -> bool {
        self.named && self.name.starts_with('_')
    }

    /// The common `FieldDescriptor` builder chain.
    pub fn descriptor(&self, krate: &TokenStream, carrier_role: bool) -> TokenStream {
        let index = self.index;
        let name = &self.name;
        let tags = self.opts.tag_table();
        let mut chain = if carrier_role && self.shape.class == Class::Context {
            quote!(#krate::FieldDescriptor::carrier(#index, #name))
        } else {
            let class = self.shape.class.tokens(krate);
            let type_name = type_text(&self.ty);
            quote!(#krate::FieldDescriptor::new(#index, #name, #class).type_name(#type_name))
        };
        if self.shape.optional {
            chain.extend(quote!(.optional()));
        }
        if !self.opts.tags.is_empty() {
            chain.extend(quote!(.tags(#krate::Tags::new(#tags))));
        }
        if !self.public {
            chain.extend(quote!(.private()));
        }
        if !self.named {
            chain.extend(quote!(.unnamed()));
        }
        if self.shape.class.has_schema() && !self.opts.no_schema {
            let inner = &self.shape.inner;
            chain.extend(quote! {
                .schema(|| #krate::__private::schemars::schema_for!(#inner).to_value())
            });
        }
        chain
    }
}

/// Collects the fields of a struct; enums and unions are rejected.
pub fn struct_fields(input: &DeriveInput, derive: &str) -> syn::Result<Vec<FieldInfo>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            format!("{derive} can only be derived for structs"),
        ));
    };
    let named = matches!(data.fields, Fields::Named(_));
    data.fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let (member, name) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
                None => (Member::Unnamed(Index::from(index)), index.to_string()),
            };
            Ok(FieldInfo {
                index,
                member,
                name,
                named,
                public: is_public(&field.vis),
                ty: field.ty.clone(),
                shape: classify(&field.ty),
                opts: FieldOpts::from_field(field)?,
            })
        })
        .collect()
}

/// Type name text of the deriving struct.
pub fn type_name(input: &DeriveInput) -> String {
    input.ident.to_token_stream().to_string()
}
