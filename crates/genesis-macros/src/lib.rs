//! Build-time registration macro for §4.7 internal tool reflection.
//!
//! spec §9 redesign guidance: "replace runtime class-member reflection
//! with build-time code generation or a registration macro ... that emits
//! an in-memory table `{name, schema, fn-ptr}`." `syn`/`quote` already
//! appear in `crates/agent/Cargo.toml`, used there for Rust AST parsing
//! during function indexing; this crate reuses
//! them for the same purpose one layer up: parsing the agent's own
//! annotated methods instead of the user's source tree.
//!
//! A `proc-macro = true` crate can only export macros, so the runtime
//! support types the generated code relies on (`ToolRegistration`, the
//! `inventory` collection point, schema synthesis) live in
//! `genesis_agent::internal_tool` instead and are referenced here by path.
//! `genesis-agent` re-exports itself as `::genesis_agent` even for its own
//! built-in tools via `extern crate self as genesis_agent;` in its `lib.rs`,
//! so the same expansion works whether `#[genesis_tools]` is used inside
//! `genesis-agent` or in a downstream crate that depends on it.
//!
//! Usage:
//!
//! ```ignore
//! #[genesis_tools]
//! impl WeatherAgent {
//!     #[tool(description = "Look up current conditions for a city")]
//!     async fn get_conditions(&self, args: ConditionsArgs) -> Result<Value, String> {
//!         ...
//!     }
//! }
//! ```
//!
//! `ConditionsArgs` must derive `schemars::JsonSchema` — its generated
//! schema becomes the tool's `parameter_schema` (§4.7: "parameter schema is
//! synthesized from the method's declared parameter types"). The macro
//! strips the `#[tool(...)]` markers, leaves the methods otherwise
//! unchanged, and emits one `inventory::submit!` per annotated method so
//! the one-time reflection pass in `genesis_agent::internal_tool` is a
//! single `inventory::iter` rather than hand-maintained tables.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, FnArg, ImplItem, ItemImpl, Pat, Type};

#[proc_macro_attribute]
pub fn genesis_tools(_args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_impl = parse_macro_input!(input as ItemImpl);
    let self_ty = item_impl.self_ty.clone();

    let mut registrations = Vec::new();

    for item in &mut item_impl.items {
        let ImplItem::Fn(method) = item else { continue };

        let Some((description, idx)) = extract_tool_attr(&method.attrs) else {
            continue;
        };
        method.attrs.remove(idx);

        let method_name = method.sig.ident.clone();
        let tool_name = method_name.to_string();

        // Expect exactly one non-receiver argument: the schema-bearing
        // args struct (§4.7: "parameters lacking a default are required").
        let args_ty = method
            .sig
            .inputs
            .iter()
            .find_map(|arg| match arg {
                FnArg::Typed(pat_type) => match &*pat_type.pat {
                    Pat::Ident(_) => Some((*pat_type.ty).clone()),
                    _ => None,
                },
                FnArg::Receiver(_) => None,
            })
            .unwrap_or_else(|| syn::parse_str::<Type>("()").expect("unit type always parses"));

        let dispatch_fn_name = format_ident!("__genesis_dispatch_{}", method_name);
        let register_fn_name = format_ident!("__genesis_register_{}", method_name);

        registrations.push(quote! {
            #[doc(hidden)]
            fn #dispatch_fn_name<'a>(
                this: &'a dyn ::std::any::Any,
                args: ::genesis_agent::internal_tool::Value,
            ) -> ::genesis_agent::internal_tool::BoxFuture<'a, ::std::result::Result<::genesis_agent::internal_tool::Value, String>> {
                ::std::boxed::Box::pin(async move {
                    let this = this
                        .downcast_ref::<#self_ty>()
                        .expect("internal tool dispatch type mismatch");
                    let typed_args: #args_ty = ::genesis_agent::internal_tool::from_value(args)
                        .map_err(|e| format!("invalid arguments for '{}': {e}", #tool_name))?;
                    let result = #self_ty::#method_name(this, typed_args).await?;
                    ::genesis_agent::internal_tool::to_value(result)
                        .map_err(|e| format!("failed to serialize result of '{}': {e}", #tool_name))
                })
            }

            #[doc(hidden)]
            fn #register_fn_name() -> ::genesis_agent::internal_tool::ToolRegistration {
                ::genesis_agent::internal_tool::ToolRegistration {
                    type_id: ::std::any::TypeId::of::<#self_ty>,
                    tool_name: #tool_name,
                    description: #description,
                    parameter_schema: || ::genesis_agent::internal_tool::schema_for::<#args_ty>(),
                    dispatch: #dispatch_fn_name,
                }
            }

            ::genesis_agent::internal_tool::inventory::submit! {
                ::genesis_agent::internal_tool::ToolRegistrationFactory(#register_fn_name)
            }
        });
    }

    let expanded = quote! {
        #item_impl

        #(#registrations)*
    };

    expanded.into()
}

fn extract_tool_attr(attrs: &[Attribute]) -> Option<(String, usize)> {
    for (idx, attr) in attrs.iter().enumerate() {
        if !attr.path().is_ident("tool") {
            continue;
        }
        let mut description = String::new();
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("description") {
                let value = meta.value()?;
                let lit: syn::LitStr = value.parse()?;
                description = lit.value();
            }
            Ok(())
        });
        return Some((description, idx));
    }
    None
}
