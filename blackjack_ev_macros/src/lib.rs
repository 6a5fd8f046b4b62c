use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{self, DataStruct};

/// Derives the `Expectations` trait for a struct of expected values.
///
/// Every named field becomes one decision: the field `double` maps to
/// `Decision::Double`, `late_surrender` to `Decision::LateSurrender`. A field of
/// type `f64` is always available, a field of type `Option<f64>` only when it
/// is `Some`. Fields marked `#[expectation(skip)]` (side bets, for example) are
/// left out.
///
/// The generated code refers to `Expectations` and `Decision` unqualified, so
/// both have to be in scope where the macro is used.
#[proc_macro_derive(Expectations, attributes(expectation))]
pub fn expectations_derive(input: TokenStream1) -> TokenStream1 {
    let ast: syn::DeriveInput = syn::parse(input).unwrap();
    let struct_name = &ast.ident;
    let data_struct: DataStruct = match ast.data {
        syn::Data::Struct(x) => x,
        _ => panic!("Expectations can only be derived for a struct!"),
    };
    let named_fields = match data_struct.fields {
        syn::Fields::Named(x) => x,
        _ => panic!("No named fields"),
    };

    let lines: Vec<TokenStream2> = named_fields
        .named
        .iter()
        .filter(|field| !is_skipped(field))
        .map(generate_push)
        .collect();

    let ts2 = quote! {
        impl Expectations for #struct_name {
            fn expectations(&self) -> Vec<(Decision, f64)> {
                let mut ret = Vec::new();
                #(#lines)*
                ret
            }
        }
    };
    ts2.into()
}

fn generate_push(field: &syn::Field) -> TokenStream2 {
    let field_name = field.ident.as_ref().unwrap();
    let decision = format_ident!("{}", to_variant_name(&field_name.to_string()));
    if is_option(&field.ty) {
        quote! {
            if let Some(ex) = self.#field_name {
                ret.push((Decision::#decision, ex));
            }
        }
    } else {
        quote! {
            ret.push((Decision::#decision, self.#field_name));
        }
    }
}

fn is_skipped(field: &syn::Field) -> bool {
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("expectation") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("Only `skip` is supported"))
            }
        })
        .unwrap();
    }
    skip
}

fn is_option(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map_or(false, |segment| segment.ident == "Option"),
        _ => false,
    }
}

fn to_variant_name(field_name: &str) -> String {
    field_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
