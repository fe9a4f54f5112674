use std::collections::HashSet;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, ExprClosure, Field, Fields, Ident, LitStr, Result, Token, Type,
    parse::{Parse, ParseStream},
    spanned::Spanned,
};

pub(crate) fn expand_from_sections(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new(
            input.span(),
            "`FromSections` may only be derived on structs.",
        ));
    };

    let Fields::Named(fields) = &data.fields else {
        return Err(Error::new(
            input.span(),
            "`FromSections` may only be derived on structs with named fields.",
        ));
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .filter_map(Result::transpose) // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    let mut names = HashSet::new();
    let mut section_cases = Vec::new();
    let mut header_method = None;
    let mut bounding_box_method = None;

    for field in &fields {
        match &field.identifier {
            SectionIdentifier::Name(name) => {
                if !names.insert(name.value()) {
                    return Err(Error::new(name.span(), "Section names must be unique."));
                }

                let assignment = field.assignment(quote! { data });
                section_cases.push(quote! { #name => { #assignment; } });
            }
            SectionIdentifier::BoundingBox(ident) => {
                let assignment = field.assignment(quote! { bounding_box });
                let method = quote! {
                    fn add_bounding_box(
                        &mut self,
                        bounding_box: ::apt_transcoder::sans::data::BoundingBox,
                    ) {
                        #assignment;
                    }
                };

                if bounding_box_method.replace(method).is_some() {
                    return Err(Error::new(ident.span(), "Section identifiers must be unique."));
                }
            }
            SectionIdentifier::Header(ident) => {
                let assignment = if field.handler.is_some() {
                    field.assignment(quote! { header })
                } else {
                    let name = &field.name;
                    quote! { self.#name = Some(header.clone()) }
                };

                let method = quote! {
                    fn add_file_header(
                        &mut self,
                        header: &::apt_transcoder::sans::header::FileHeader,
                    ) {
                        #assignment;
                    }
                };

                if header_method.replace(method).is_some() {
                    return Err(Error::new(ident.span(), "Section identifiers must be unique."));
                }
            }
        }
    }

    let mut accepted: Vec<_> = fields
        .iter()
        .filter_map(|f| match &f.identifier {
            SectionIdentifier::Name(name) => Some(name.clone()),
            _ => None,
        })
        .collect();

    // The bounding box is only published for an accepted `Position` section.
    if let Some(field) = fields
        .iter()
        .find(|f| matches!(f.identifier, SectionIdentifier::BoundingBox(_)))
    {
        if !names.contains("Position") {
            accepted.push(LitStr::new("Position", field.name.span()));
        }
    }

    let accepts = if accepted.is_empty() {
        quote! { false }
    } else {
        quote! { matches!(header.section_type.as_str(), #(#accepted)|*) }
    };

    let name = &input.ident;

    let expanded = quote! {
        impl ::apt_transcoder::avec::FromSections for #name {
            #header_method
            #bounding_box_method

            #[allow(unused_variables)]
            fn accepts(&self, header: &::apt_transcoder::sans::section::SectionHeader) -> bool {
                #accepts
            }

            #[allow(unused_variables)]
            fn add_section(
                &mut self,
                header: ::apt_transcoder::sans::section::SectionHeader,
                data: ::apt_transcoder::avec::SectionData,
            ) {
                match header.section_type.as_str() {
                    #(#section_cases)*
                    _ => {}
                };
            }
        }
    };

    Ok(expanded.into())
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    identifier: SectionIdentifier,
    handler: Option<(Type, ExprClosure)>,
}

#[derive(Debug)]
enum SectionIdentifier {
    Name(LitStr),
    BoundingBox(Ident),
    Header(Ident),
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(name) = field.ident.clone() else {
            return Err(Error::new_spanned(field, "Field must be named."));
        };

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("section")) else {
            return Ok(None);
        };

        let SectionAttribute {
            identifier,
            handler,
        } = attr.meta.require_list()?.parse_args()?;

        if let Some(handler) = &handler {
            if handler.inputs.len() != 2 {
                return Err(Error::new_spanned(
                    handler,
                    "Handler closure must have two parameters.",
                ));
            }
        } else {
            let Type::Path(path) = &field.ty else {
                return Err(Error::new_spanned(
                    &field.ty,
                    "Field must have a type annotation.",
                ));
            };

            let is_option = path
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "Option");

            if !is_option {
                return Err(Error::new_spanned(
                    &field.ty,
                    "Field without a handler must have type `Option<T>`.",
                ));
            }
        }

        let handler = handler.map(|h| (field.ty.clone(), h));

        Ok(Some(Self {
            name,
            identifier,
            handler,
        }))
    }

    /// Store `value` into this field, through the handler if one was given.
    fn assignment(&self, value: TokenStream2) -> TokenStream2 {
        let name = &self.name;

        match &self.handler {
            Some((field_type, handler)) => {
                let body = &handler.body;
                let mut inputs = handler.inputs.iter();
                let (Some(acc), Some(val)) = (inputs.next(), inputs.next()) else {
                    return quote! {};
                };

                quote! {
                    (|#acc: &mut #field_type, #val| { #body })(&mut self.#name, #value)
                }
            }
            None => quote! { self.#name = Some(#value) },
        }
    }
}

#[derive(Debug)]
struct SectionAttribute {
    identifier: SectionIdentifier,
    handler: Option<ExprClosure>,
}

impl Parse for SectionAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let identifier = if input.peek(LitStr) {
            SectionIdentifier::Name(input.parse::<LitStr>()?)
        } else {
            let ident = input.parse::<Ident>()?;

            if ident == "bounding_box" {
                SectionIdentifier::BoundingBox(ident)
            } else if ident == "header" {
                SectionIdentifier::Header(ident)
            } else {
                return Err(Error::new_spanned(
                    ident,
                    "Section identifier must be a string literal, `bounding_box` or `header`.",
                ));
            }
        };

        let handler = if !input.is_empty() {
            input.parse::<Token![,]>()?;
            Some(input.parse::<ExprClosure>()?)
        } else {
            None
        };

        Ok(Self {
            identifier,
            handler,
        })
    }
}
