//! Derive macros shared by the 6502 workspace crates.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput};

/// Implement `std::fmt::Display` for an enum with only fieldless variants. Each variant displays
/// as its identifier.
///
/// ```
/// use nmos6502_proc_macros::EnumDisplay;
///
/// #[derive(EnumDisplay)]
/// enum Mode {
///     Latched,
///     PinLevel,
/// }
///
/// assert_eq!(Mode::Latched.to_string(), "Latched");
/// assert_eq!(Mode::PinLevel.to_string(), "PinLevel");
/// ```
///
/// # Panics
///
/// Panics if applied to a struct, a union, or an enum with a variant that has fields.
#[proc_macro_derive(EnumDisplay)]
pub fn enum_display(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let name = &ast.ident;

    let Data::Enum(data) = &ast.data else {
        panic!("EnumDisplay can only be derived for enums; {name} is not an enum");
    };

    let match_arms: Vec<_> = data
        .variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            assert!(
                variant.fields.is_empty(),
                "EnumDisplay requires fieldless variants; {name}::{variant_name} has fields"
            );

            let variant_name_str = variant_name.to_string();
            quote! {
                Self::#variant_name => f.write_str(#variant_name_str)
            }
        })
        .collect();

    let expanded = quote! {
        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#match_arms,)*
                }
            }
        }
    };

    expanded.into()
}
