use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Lit, parse_macro_input};

/// Check if a field has #[column(skip)]
fn has_column_skip(field: &syn::Field) -> syn::Result<bool> {
    let mut skip = false;
    for attr in &field.attrs {
        if attr.path().is_ident("column") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                } else if meta.path.is_ident("name") {
                    // handled by get_column_name
                    let _: Lit = meta.value()?.parse()?;
                } else {
                    return Err(meta.error("expected `skip` or `name = \"...\"`"));
                }
                Ok(())
            })?;
        }
    }
    Ok(skip)
}

/// Get custom column name from #[column(name = "...")] or None
fn get_column_name(field: &syn::Field) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in &field.attrs {
        if attr.path().is_ident("column") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    match meta.value()?.parse::<Lit>()? {
                        Lit::Str(s) => name = Some(s.value()),
                        other => return Err(syn::Error::new_spanned(other, "expected a string")),
                    }
                }
                Ok(())
            })?;
        }
    }
    Ok(name)
}

/// Parse #[table(schema = "...", name = "...")]
fn parse_table_attr(input: &DeriveInput) -> syn::Result<(Option<String>, String)> {
    let mut schema = None;
    let mut table = None;
    for attr in &input.attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                let lit: Lit = meta.value()?.parse()?;
                let Lit::Str(s) = lit else {
                    return Err(syn::Error::new_spanned(lit, "expected a string"));
                };
                if meta.path.is_ident("schema") {
                    schema = Some(s.value());
                } else if meta.path.is_ident("name") {
                    table = Some(s.value());
                } else {
                    return Err(meta.error("expected `schema` or `name`"));
                }
                Ok(())
            })?;
        }
    }
    let table = table.ok_or_else(|| {
        syn::Error::new(
            Span::call_site(),
            "Table derive requires #[table(name = \"...\")]",
        )
    })?;
    Ok((schema, table))
}

/// Derive macro for the `Table` trait.
///
/// Maps each named field to a column of the table given by
/// `#[table(schema = "...", name = "...")]`, in field order. Fields marked
/// `#[column(skip)]` are not mapped; `#[column(name = "...")]` overrides the
/// column name.
///
/// Besides the trait impl, generates one `<field>_column()` accessor per
/// mapped field.
///
/// ## Example
///
/// ```text
/// #[derive(Table, Deserialize)]
/// #[table(schema = "zitadel", name = "settings")]
/// struct SettingRow {
///     pub instance_id: String,
///     #[column(name = "type")]
///     pub r#type: String,
/// }
/// // SettingRow::instance_id_column(), SettingRow::type_column()
/// ```
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_table(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_table(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Table derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Table derive only supports structs",
            ));
        }
    };

    let (schema, table) = parse_table_attr(input)?;

    let mut columns = Vec::new();
    let mut accessors = Vec::new();
    for field in fields {
        if has_column_skip(field)? {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.to_string();
        let field_name = field_name.trim_start_matches("r#");
        let column_name = get_column_name(field)?.unwrap_or_else(|| field_name.to_string());
        let accessor = format_ident!("{}_column", field_name);

        columns.push(quote! { scoped_storage::Column::new(#table, #column_name) });
        accessors.push(quote! {
            pub const fn #accessor() -> scoped_storage::Column {
                scoped_storage::Column::new(#table, #column_name)
            }
        });
    }

    let schema_tokens = match schema {
        Some(schema) => quote! { Some(#schema) },
        None => quote! { None },
    };

    Ok(quote! {
        impl #impl_generics scoped_storage::Table for #name #ty_generics #where_clause {
            fn schema() -> Option<&'static str> {
                #schema_tokens
            }

            fn name() -> &'static str {
                #table
            }

            fn columns() -> &'static [scoped_storage::Column] {
                const COLUMNS: &[scoped_storage::Column] = &[#(#columns),*];
                COLUMNS
            }
        }

        impl #impl_generics #name #ty_generics #where_clause {
            #(#accessors)*
        }
    })
}
