use proc_macro::TokenStream;
use syn::DeriveInput;

mod from_row;

/// Derive `FromRow` for a struct.
///
/// Tuple struct fields are read by position, named fields by column name. Column names are
/// matched exactly first, then ignoring ASCII case, so `name` reads the `NAME` column.
#[proc_macro_derive(FromRow)]
pub fn from_row(input: TokenStream) -> TokenStream {
    match from_row::from_row(syn::parse_macro_input!(input as DeriveInput)) {
        Ok(ok) => ok,
        Err(err) => err.into_compile_error().into(),
    }
}
