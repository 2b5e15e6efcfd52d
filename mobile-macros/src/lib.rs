#![deny(unsafe_code)]
extern crate proc_macro;
extern crate proc_macro2;

mod extension;

/// Implements `mobile_core::extension::PackageInfo` from the deriving crate's Cargo metadata.
#[proc_macro_derive(Extension)]
pub fn derive_extension(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    extension::build(input)
}
