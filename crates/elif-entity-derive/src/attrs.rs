//! Attribute parsing for `#[derive(Entity)]`

use proc_macro2::{Span, TokenStream};
use quote::{quote, ToTokens};
use syn::{
    meta::ParseNestedMeta, parse::Result, Attribute, Error, Expr, LitBool, LitInt, LitStr, Path,
    Token,
};

/// `#[entity(...)]` on the struct
#[derive(Default)]
pub struct EntityArgs {
    pub table: Option<LitStr>,
    pub abstract_entity: bool,
}

impl EntityArgs {
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut args = EntityArgs::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("entity")) {
            if let syn::Meta::Path(_) = attr.meta {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    args.table = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("abstract_entity") || meta.path.is_ident("abstract") {
                    args.abstract_entity = parse_flag(&meta)?;
                    Ok(())
                } else {
                    Err(meta.error("unknown `entity` key, expected `table` or `abstract_entity`"))
                }
            })?;
        }

        Ok(args)
    }
}

/// `#[field(...)]`
pub struct FieldArgs {
    pub type_tag: LitStr,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
    pub default: Option<Expr>,
    pub unique: bool,
    pub unsigned: bool,
    pub auto_increment: bool,
    pub comment: Option<LitStr>,
}

impl FieldArgs {
    fn parse(attr: &Attribute) -> Result<Self> {
        let mut type_tag = None;
        let mut args = FieldArgs {
            type_tag: LitStr::new("", Span::call_site()),
            length: None,
            precision: None,
            scale: None,
            nullable: false,
            default: None,
            unique: false,
            unsigned: false,
            auto_increment: false,
            comment: None,
        };

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("type") || meta.path.is_ident("ty") {
                type_tag = Some(meta.value()?.parse::<LitStr>()?);
            } else if meta.path.is_ident("length") {
                args.length = Some(parse_u32(&meta)?);
            } else if meta.path.is_ident("precision") {
                args.precision = Some(parse_u32(&meta)?);
            } else if meta.path.is_ident("scale") {
                args.scale = Some(parse_u32(&meta)?);
            } else if meta.path.is_ident("nullable") {
                args.nullable = parse_flag(&meta)?;
            } else if meta.path.is_ident("default") {
                args.default = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("unique") {
                args.unique = parse_flag(&meta)?;
            } else if meta.path.is_ident("unsigned") {
                args.unsigned = parse_flag(&meta)?;
            } else if meta.path.is_ident("auto_increment") {
                args.auto_increment = parse_flag(&meta)?;
            } else if meta.path.is_ident("comment") {
                args.comment = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unknown `field` key"));
            }
            Ok(())
        })?;

        args.type_tag = type_tag
            .ok_or_else(|| Error::new_spanned(attr, "#[field] requires `type = \"...\"`"))?;
        Ok(args)
    }

    /// Tokens building an `elif_entity::FieldAttribute`
    pub fn to_attribute(&self, option_type: bool) -> TokenStream {
        let type_tag = &self.type_tag;
        let length = option_tokens(self.length.map(|v| quote!(#v)));
        let precision = option_tokens(self.precision.map(|v| quote!(#v)));
        let scale = option_tokens(self.scale.map(|v| quote!(#v)));
        let nullable = self.nullable || option_type;
        let default = option_tokens(
            self.default
                .as_ref()
                .map(|expr| quote!(::elif_entity::__private::JsonValue::from(#expr))),
        );
        let unique = self.unique;
        let unsigned = self.unsigned;
        let auto_increment = self.auto_increment;
        let comment = option_tokens(self.comment.as_ref().map(ToTokens::to_token_stream));

        quote! {
            ::elif_entity::FieldAttribute {
                type_tag: #type_tag,
                length: #length,
                precision: #precision,
                scale: #scale,
                nullable: #nullable,
                default: #default,
                unique: #unique,
                unsigned: #unsigned,
                auto_increment: #auto_increment,
                comment: #comment,
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationKind {
    fn from_attr_name(attr: &Attribute) -> Option<Self> {
        let path = attr.path();
        if path.is_ident("one_to_one") {
            Some(Self::OneToOne)
        } else if path.is_ident("one_to_many") {
            Some(Self::OneToMany)
        } else if path.is_ident("many_to_one") {
            Some(Self::ManyToOne)
        } else if path.is_ident("many_to_many") {
            Some(Self::ManyToMany)
        } else {
            None
        }
    }
}

impl ToTokens for RelationKind {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let variant = match self {
            Self::OneToOne => quote!(OneToOne),
            Self::OneToMany => quote!(OneToMany),
            Self::ManyToOne => quote!(ManyToOne),
            Self::ManyToMany => quote!(ManyToMany),
        };
        tokens.extend(quote!(::elif_entity::RelationshipKind::#variant));
    }
}

/// Relationship target: an identifier string or an entity type
pub enum Target {
    Identifier(LitStr),
    Type(Path),
}

impl ToTokens for Target {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            Target::Identifier(lit) => lit.to_tokens(tokens),
            Target::Type(path) => {
                tokens.extend(quote!(<#path as ::elif_entity::Entity>::type_path()))
            }
        }
    }
}

pub struct JoinTableArgs {
    pub name: LitStr,
    pub join_column: LitStr,
    pub inverse_column: LitStr,
}

/// `#[one_to_one(...)]` and friends
pub struct RelationshipArgs {
    pub kind: RelationKind,
    pub target: Target,
    pub mapped_by: Option<LitStr>,
    pub inversed_by: Option<LitStr>,
    pub nullable: Option<bool>,
    pub join_table: Option<JoinTableArgs>,
}

impl RelationshipArgs {
    fn parse(kind: RelationKind, attr: &Attribute) -> Result<Self> {
        let mut target = None;
        let mut mapped_by = None;
        let mut inversed_by = None;
        let mut nullable = None;
        let mut join_table = None;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("target") {
                let value = meta.value()?;
                target = Some(if value.peek(LitStr) {
                    Target::Identifier(value.parse()?)
                } else {
                    Target::Type(value.parse()?)
                });
            } else if meta.path.is_ident("mapped_by") {
                mapped_by = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("inversed_by") {
                inversed_by = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("nullable") {
                nullable = Some(parse_flag(&meta)?);
            } else if meta.path.is_ident("join_table") {
                join_table = Some(parse_join_table(&meta)?);
            } else {
                return Err(meta.error("unknown relationship key"));
            }
            Ok(())
        })?;

        let target = target
            .ok_or_else(|| Error::new_spanned(attr, "relationship requires `target = ...`"))?;

        Ok(Self {
            kind,
            target,
            mapped_by,
            inversed_by,
            nullable,
            join_table,
        })
    }

    /// Tokens building an `elif_entity::RelationshipAttribute`
    pub fn to_attribute(&self) -> TokenStream {
        let kind = self.kind;
        let target = &self.target;
        let mapped_by = option_tokens(self.mapped_by.as_ref().map(ToTokens::to_token_stream));
        let inversed_by = option_tokens(self.inversed_by.as_ref().map(ToTokens::to_token_stream));
        let nullable = option_tokens(self.nullable.map(|v| quote!(#v)));
        let join_table = option_tokens(self.join_table.as_ref().map(|jt| {
            let JoinTableArgs {
                name,
                join_column,
                inverse_column,
            } = jt;
            quote! {
                ::elif_entity::JoinTableAttribute {
                    name: #name,
                    join_column: #join_column,
                    inverse_column: #inverse_column,
                }
            }
        }));

        quote! {
            ::elif_entity::RelationshipAttribute {
                kind: #kind,
                target: #target,
                mapped_by: #mapped_by,
                inversed_by: #inversed_by,
                nullable: #nullable,
                join_table: #join_table,
            }
        }
    }
}

fn parse_join_table(meta: &ParseNestedMeta) -> Result<JoinTableArgs> {
    let mut name = None;
    let mut join_column = None;
    let mut inverse_column = None;

    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("name") {
            name = Some(inner.value()?.parse::<LitStr>()?);
        } else if inner.path.is_ident("join_column") {
            join_column = Some(inner.value()?.parse::<LitStr>()?);
        } else if inner.path.is_ident("inverse_column") {
            inverse_column = Some(inner.value()?.parse::<LitStr>()?);
        } else {
            return Err(inner.error("unknown `join_table` key"));
        }
        Ok(())
    })?;

    match (name, join_column, inverse_column) {
        (Some(name), Some(join_column), Some(inverse_column)) => Ok(JoinTableArgs {
            name,
            join_column,
            inverse_column,
        }),
        _ => Err(meta.error("join_table requires `name`, `join_column` and `inverse_column`")),
    }
}

/// Everything declared on one struct field
#[derive(Default)]
pub struct FieldAttrs {
    pub field: Option<FieldArgs>,
    pub id: bool,
    pub uuid: bool,
    pub relationship: Option<RelationshipArgs>,
    pub transient: bool,
}

impl FieldAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut parsed = FieldAttrs::default();

        for attr in attrs {
            let path = attr.path();
            if path.is_ident("field") {
                if parsed.field.is_some() {
                    return Err(Error::new_spanned(attr, "duplicate #[field] attribute"));
                }
                parsed.field = Some(FieldArgs::parse(attr)?);
            } else if path.is_ident("id") {
                attr.meta.require_path_only()?;
                parsed.id = true;
            } else if path.is_ident("uuid") {
                attr.meta.require_path_only()?;
                parsed.uuid = true;
            } else if path.is_ident("transient") {
                attr.meta.require_path_only()?;
                parsed.transient = true;
            } else if let Some(kind) = RelationKind::from_attr_name(attr) {
                if parsed.relationship.is_some() {
                    return Err(Error::new_spanned(
                        attr,
                        "a field can declare only one relationship",
                    ));
                }
                parsed.relationship = Some(RelationshipArgs::parse(kind, attr)?);
            }
        }

        if parsed.transient && parsed.is_annotated() {
            return Err(Error::new(
                Span::call_site(),
                "#[transient] cannot be combined with mapping attributes",
            ));
        }

        Ok(parsed)
    }

    pub fn is_annotated(&self) -> bool {
        self.field.is_some() || self.id || self.uuid || self.relationship.is_some()
    }
}

fn parse_flag(meta: &ParseNestedMeta) -> Result<bool> {
    if meta.input.peek(Token![=]) {
        Ok(meta.value()?.parse::<LitBool>()?.value)
    } else {
        Ok(true)
    }
}

fn parse_u32(meta: &ParseNestedMeta) -> Result<u32> {
    meta.value()?.parse::<LitInt>()?.base10_parse::<u32>()
}

fn option_tokens(value: Option<TokenStream>) -> TokenStream {
    match value {
        Some(tokens) => quote!(::std::option::Option::Some(#tokens)),
        None => quote!(::std::option::Option::None),
    }
}
