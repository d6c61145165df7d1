//! `#[derive(Validate)]` expansion.

use crate::class::rule_target;
use crate::field::struct_fields;
use crate::parse::ContainerOpts;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

/// Expands the derive into a `Validate` impl listing the member rules of
/// every named field, followed by the rules of `#[daedalus(nested)]`
/// fields under their member name.
pub fn expand_validate(input: DeriveInput) -> syn::Result<TokenStream> {
    let opts = ContainerOpts::from_attrs(&input.attrs)?;
    let krate = opts.krate();
    let fields = struct_fields(&input, "Validate")?;
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut rules = Vec::new();
    for field in fields.iter().filter(|f| f.named && f.opts.is_checked()) {
        let member = field.opts.rename.clone().unwrap_or_else(|| field.name.clone());
        if field.opts.has_rule_tags() {
            let tags = field.opts.tag_table();
            rules.push(quote! {
                rules.push(#krate::MemberRule::new(#member, #krate::Tags::new(#tags)));
            });
        }
        if field.opts.nested {
            let target = rule_target(&field.ty);
            rules.push(quote! {
                rules.extend(
                    <#target as #krate::Validate>::member_rules()
                        .into_iter()
                        .map(|rule| rule.under(#member)),
                );
            });
        }
    }

    Ok(quote! {
        impl #impl_generics #krate::Validate for #ident #ty_generics #where_clause {
            fn member_rules() -> ::std::vec::Vec<#krate::MemberRule> {
                #[allow(unused_mut)]
                let mut rules = ::std::vec::Vec::new();
                #(#rules)*
                rules
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expanded(input: DeriveInput) -> String {
        let result = expand_validate(input);
        assert!(result.is_ok(), "expansion failed: {:?}", result.err());
        result.unwrap().to_string()
    }

    #[test]
    fn test_tagged_members() {
        let code = expanded(parse_quote! {
            struct Account {
                #[validate("required,email")]
                pub email: String,
                #[serde(rename = "displayName")]
                #[validate("max=40")]
                pub display_name: String,
                pub note: String,
            }
        });
        assert!(code.contains("impl :: daedalus :: Validate for Account"));
        assert!(code.contains("MemberRule :: new (\"email\""));
        assert!(code.contains("(\"validate\" , \"required,email\")"));
        assert!(code.contains("MemberRule :: new (\"displayName\""));
        assert!(!code.contains("\"note\""));
    }

    #[test]
    fn test_nested_member() {
        let code = expanded(parse_quote! {
            #[daedalus(crate = "::daedalus_core")]
            struct Account {
                #[daedalus(nested)]
                pub addresses: Option<Vec<Address>>,
            }
        });
        assert!(code.contains("< Address as :: daedalus_core :: Validate > :: member_rules ()"));
        assert!(code.contains("rule . under (\"addresses\")"));
        assert!(!code.contains("MemberRule :: new"));
    }

    #[test]
    fn test_enum_is_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Account { A }
        };
        let err = expand_validate(input).unwrap_err();
        assert!(err.to_string().contains("only be derived for structs"));
    }
}
