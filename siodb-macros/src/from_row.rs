use proc_macro::TokenStream;
use quote::quote;
use syn::{ext::IdentExt, *};

macro_rules! error {
    ($($tt:tt)*) => {
        return Err(syn::Error::new(proc_macro::Span::call_site().into(), format!($($tt)*)))
    };
}

pub fn from_row(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput { attrs: _, vis: _, ident, mut generics, data } = input;
    let Data::Struct(data) = data else {
        error!("only struct are currently supported")
    };

    let output = match data.fields {
        Fields::Unnamed(FieldsUnnamed { unnamed, .. }) => {
            let body = (0..unnamed.len()).map(|i| quote! { row.try_get(#i)?, });
            quote! { (#(#body)*) }
        }
        Fields::Named(FieldsNamed { named, .. }) => {
            let mut body = quote! {};
            for field in named {
                let Some(id) = field.ident else {
                    error!("named field without identifier")
                };
                let name = id.unraw().to_string();
                body.extend(quote! { #id: row.try_get(#name)?, });
            }
            quote! { { #body } }
        }
        Fields::Unit => quote! {},
    };

    for ty in generics.type_params_mut() {
        ty.bounds.push(parse_quote!(::siodb::Decode));
    }

    let (g1, g2, g3) = generics.split_for_impl();

    Ok(quote! {
        impl #g1 ::siodb::FromRow for #ident #g2 #g3 {
            fn from_row(row: ::siodb::Row) -> Result<Self, ::siodb::DecodeError> {
                Ok(Self #output)
            }
        }
    }.into())
}
