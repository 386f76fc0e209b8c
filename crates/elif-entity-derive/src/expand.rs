//! Code generation for `#[derive(Entity)]`

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{
    parse::Result, parse_macro_input, Data, DeriveInput, Error, Fields, GenericArgument, Ident,
    PathArguments, Type,
};

use crate::attrs::{EntityArgs, FieldAttrs};

/// Main implementation function for the Entity derive
pub fn entity_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_entity(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A `Property<T>` field that maps to a column
struct ColumnField {
    ident: Ident,
    name: String,
    /// `T` with any outer `Option` removed
    declared_type: String,
    nullable: bool,
}

/// A field that carries attributes, in declaration order
struct AnnotatedField {
    name: String,
    attrs: FieldAttrs,
    option_type: bool,
}

fn expand_entity(input: &DeriveInput) -> Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new_spanned(
                    input,
                    "#[derive(Entity)] requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new_spanned(
                input,
                "#[derive(Entity)] can only be applied to structs",
            ))
        }
    };

    // Metadata and factories are keyed by type path, which has no room for
    // generic arguments
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "#[derive(Entity)] does not support generic structs",
        ));
    }

    let entity_args = EntityArgs::from_attrs(&input.attrs)?;
    let mut columns = Vec::new();
    let mut annotated = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let name = ident.to_string().trim_start_matches("r#").to_string();
        let attrs = FieldAttrs::from_attrs(&field.attrs)?;

        if attrs.transient {
            continue;
        }

        if attrs.relationship.is_some() {
            annotated.push(AnnotatedField {
                name,
                attrs,
                option_type: false,
            });
            continue;
        }

        let inner = property_inner_type(&field.ty).ok_or_else(|| {
            Error::new_spanned(
                &field.ty,
                "entity columns must be declared as `Property<T>`; mark other fields #[transient]",
            )
        })?;
        let (declared, nullable) = match option_inner_type(inner) {
            Some(unwrapped) => (unwrapped, true),
            None => (inner, false),
        };

        if attrs.is_annotated() {
            annotated.push(AnnotatedField {
                name: name.clone(),
                attrs,
                option_type: nullable,
            });
        }

        columns.push(ColumnField {
            ident,
            name,
            declared_type: type_string(declared),
            nullable,
        });
    }

    let entity_object = generate_entity_object(input, &columns);
    let entity = generate_entity(input, &entity_args, &columns, &annotated);

    Ok(quote! {
        #entity_object

        #entity
    })
}

/// Generate the `EntityObject` dispatch by property name
fn generate_entity_object(input: &DeriveInput, columns: &[ColumnField]) -> TokenStream2 {
    let struct_name = &input.ident;

    let assign_arms = columns.iter().map(|column| {
        let ident = &column.ident;
        let name = &column.name;
        quote! {
            #name => self.#ident.assign(value).map(::elif_entity::Assignment::from),
        }
    });

    let read_arms = columns.iter().map(|column| {
        let ident = &column.ident;
        let name = &column.name;
        quote! {
            #name => self.#ident.read(),
        }
    });

    quote! {
        impl ::elif_entity::EntityObject for #struct_name {
            fn entity_type(&self) -> &'static str {
                <Self as ::elif_entity::Entity>::type_path()
            }

            #[allow(unused_variables)]
            fn assign(
                &mut self,
                property: &str,
                value: ::elif_entity::Value,
            ) -> ::std::result::Result<::elif_entity::Assignment, ::elif_entity::ValueError> {
                match property {
                    #(#assign_arms)*
                    _ => ::std::result::Result::Ok(::elif_entity::Assignment::UnknownProperty),
                }
            }

            fn read(&self, property: &str) -> ::std::option::Option<::elif_entity::Value> {
                match property {
                    #(#read_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }
    }
}

/// Generate the `Entity` declarations
fn generate_entity(
    input: &DeriveInput,
    entity_args: &EntityArgs,
    columns: &[ColumnField],
    annotated: &[AnnotatedField],
) -> TokenStream2 {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();

    let property_infos = columns.iter().map(|column| {
        let name = &column.name;
        let declared_type = &column.declared_type;
        let nullable = column.nullable;
        quote! {
            ::elif_entity::PropertyInfo {
                name: #name,
                declared_type: #declared_type,
                nullable: #nullable,
            }
        }
    });

    let table = match &entity_args.table {
        Some(table) => quote!(::std::option::Option::Some(#table)),
        None => quote!(::std::option::Option::None),
    };
    let abstract_entity = entity_args.abstract_entity;

    let property_annotations = annotated.iter().map(|field| {
        let name = &field.name;
        let id = field.attrs.id;
        let uuid = field.attrs.uuid;
        let field_attr = match &field.attrs.field {
            Some(args) => {
                let attr = args.to_attribute(field.option_type);
                quote!(::std::option::Option::Some(#attr))
            }
            None => quote!(::std::option::Option::None),
        };
        let relationship = match &field.attrs.relationship {
            Some(args) => {
                let attr = args.to_attribute();
                quote!(::std::option::Option::Some(#attr))
            }
            None => quote!(::std::option::Option::None),
        };

        quote! {
            ::elif_entity::PropertyAnnotations {
                property: #name,
                field: #field_attr,
                id: #id,
                uuid: #uuid,
                relationship: #relationship,
            }
        }
    });

    quote! {
        impl ::elif_entity::Entity for #struct_name {
            fn type_path() -> &'static str {
                ::std::concat!(::std::module_path!(), "::", #type_name)
            }

            fn type_name() -> &'static str {
                #type_name
            }

            fn properties() -> &'static [::elif_entity::PropertyInfo] {
                const PROPERTIES: &[::elif_entity::PropertyInfo] = &[#(#property_infos),*];
                PROPERTIES
            }

            fn annotations() -> ::elif_entity::EntityAnnotations {
                ::elif_entity::EntityAnnotations {
                    entity: ::std::option::Option::Some(::elif_entity::EntityAttribute {
                        table: #table,
                        abstract_entity: #abstract_entity,
                    }),
                    properties: ::std::vec![#(#property_annotations),*],
                }
            }
        }
    }
}

/// `T` for a field declared as `Property<T>`
fn property_inner_type(ty: &Type) -> Option<&Type> {
    single_generic_argument(ty, "Property")
}

/// `T` for `Option<T>`
fn option_inner_type(ty: &Type) -> Option<&Type> {
    single_generic_argument(ty, "Option")
}

fn single_generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

/// Rust type as written, without whitespace (`DateTime<Utc>`)
fn type_string(ty: &Type) -> String {
    ty.to_token_stream()
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
