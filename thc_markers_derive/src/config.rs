use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote, quote_spanned, ToTokens};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, Type};

/// Build a `FromServiceConfig` impl that starts from `Default` and overrides every field
/// present in the service's `configuration` map.
pub fn expand_derive_from_service_config(
    input: &DeriveInput,
) -> Result<TokenStream, Vec<syn::Error>> {
    let name = &input.ident;
    let setters = config_setters(input)?;
    let expanded = quote! {
        impl crate::config::FromServiceConfig for #name {
            fn from_config(
                config: &crate::config::ServiceConfig,
            ) -> ::std::result::Result<Self, crate::Error> {
                let mut base = Self::default();
                for key in config.parameters() {
                    match key.as_str() {
                        #setters
                        _ => log::warn!(
                            "unknown configuration parameter for {}: {}={:?}",
                            stringify!(#name),
                            key,
                            config.get_parameter(key)
                        ),
                    }
                }
                Ok(base)
            }
        }
    };

    Ok(expanded)
}

/// Generate a match arm for each field that isn't annotated with #[service_config(skip)]
fn config_setters(input: &DeriveInput) -> Result<TokenStream, Vec<syn::Error>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(vec![syn::Error::new(
                    input.span(),
                    "FromServiceConfig requires a struct with named fields",
                )])
            }
        },
        _ => {
            return Err(vec![syn::Error::new(
                input.span(),
                "FromServiceConfig can only be derived for structs",
            )])
        }
    };

    let mut errors = Vec::new();
    let mut arms = Vec::new();
    for field in fields {
        match skip_field(field) {
            Ok(true) => continue,
            Ok(false) => match generate_setter(field) {
                Ok(arm) => arms.push(arm),
                Err(e) => errors.push(e),
            },
            Err(e) => errors.push(e),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(quote! {
        #(#arms)*
    })
}

fn skip_field(field: &Field) -> syn::Result<bool> {
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("service_config") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported service_config option, expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}

fn generate_setter(field: &Field) -> syn::Result<TokenStream> {
    let name = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
    let key = name.to_string();
    let (get_fn, cast) = get_param_fn_ident(&field.ty)?;

    // generate assignment tokens w/wo casting type
    let assignment = match cast {
        Some(cast) => quote_spanned! { field.span() => base.#name = val? as #cast },
        None => quote_spanned! { field.span() => base.#name = val? },
    };

    Ok(quote_spanned! {
        field.span() => #key => {
            if let Some(val) = config.#get_fn(#key) {
                #assignment
            }
        }
    })
}

fn get_param_fn_ident(ty: &Type) -> syn::Result<(Ident, Option<&Type>)> {
    let type_str = ty.to_token_stream().to_string();
    match type_str.as_str() {
        "String" => Ok((format_ident!("get_parameter_as_string"), None)),
        "bool" => Ok((format_ident!("get_parameter_as_bool"), None)),
        "f32" | "f64" => Ok((format_ident!("get_parameter_as_f64"), Some(ty))),
        "u8" | "u16" | "u32" | "u64" | "usize" | "i8" | "i16" | "i32" | "i64" | "isize" => {
            Ok((format_ident!("get_parameter_as_i64"), Some(ty)))
        }
        _ => Err(syn::Error::new(
            ty.span(),
            format!("FromServiceConfig doesn't support fields of type {}", type_str),
        )),
    }
}
