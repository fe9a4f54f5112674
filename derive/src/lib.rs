use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_sections;

#[proc_macro_derive(FromSections, attributes(section))]
pub fn derive_from_sections(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match from_sections::expand_from_sections(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}
