//! Scopeprof Macros
//!
//! Procedural macros that insert line step calls for the scopeprof line
//! profilers.
//!
//! ## Macros
//!
//! - `#[traced]` - Step before every statement of a function body
//! - `trace_lines! { .. }` - Step before every statement of an inline block
//!
//! A step call reports `file!()` and `line!()` of the statement it precedes, so a
//! line profiler attributes the cost of that statement to its own line.
//! Nested blocks (loop bodies, `if` branches, closures with block bodies) are
//! instrumented too. Nested items and `const` blocks are left untouched.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::Parser;
use syn::spanned::Spanned;
use syn::visit_mut::VisitMut;
use syn::{parse_macro_input, Block, ExprConst, Item, ItemFn, Stmt};

/// Statement rewriter inserting one step call before every statement
struct StepInserter;

impl StepInserter {
    fn step_call(span: Span) -> Stmt {
        syn::parse_quote_spanned! {span=>
            ::scopeprof::trace::step(::scopeprof::SourceLocation::new(
                ::core::file!(),
                ::core::line!(),
            ));
        }
    }

    fn instrument(&mut self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        let mut stepped = Vec::with_capacity(stmts.len() * 2);
        for mut stmt in stmts {
            self.visit_stmt_mut(&mut stmt);
            if !matches!(stmt, Stmt::Item(_)) {
                stepped.push(Self::step_call(stmt.span()));
            }
            stepped.push(stmt);
        }
        stepped
    }
}

impl VisitMut for StepInserter {
    fn visit_block_mut(&mut self, block: &mut Block) {
        let stmts = std::mem::take(&mut block.stmts);
        block.stmts = self.instrument(stmts);
    }

    // Items declared inside a body are separate units and keep their code
    fn visit_item_mut(&mut self, _item: &mut Item) {}

    // `step` is not callable in const context
    fn visit_expr_const_mut(&mut self, _expr: &mut ExprConst) {}
}

fn traced_impl(attr: TokenStream2, mut function: ItemFn) -> syn::Result<TokenStream2> {
    if !attr.is_empty() {
        return Err(syn::Error::new(attr.span(), "#[traced] takes no arguments"));
    }
    if function.sig.constness.is_some() {
        return Err(syn::Error::new(
            function.sig.constness.span(),
            "#[traced] cannot be applied to a const fn",
        ));
    }

    StepInserter.visit_block_mut(&mut function.block);
    Ok(quote!(#function))
}

/// Insert a line step call before every statement of a function
///
/// The function behaves exactly as before; with no line profiler active on
/// the thread each step call is a single thread-local check.
///
/// # Example
/// ```ignore
/// use scopeprof::{ltimer, traced};
///
/// #[traced]
/// fn checksum(data: &[u8]) -> u32 {
///     let mut sum = 0u32;
///     for byte in data {
///         sum = sum.wrapping_add(*byte as u32);
///     }
///     sum
/// }
///
/// let checksum = ltimer().wrap(|data: Vec<u8>| checksum(&data));
/// checksum.call(vec![1; 4096]);
/// ```
#[proc_macro_attribute]
pub fn traced(attr: TokenStream, item: TokenStream) -> TokenStream {
    let function = parse_macro_input!(item as ItemFn);
    traced_impl(attr.into(), function)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn trace_lines_impl(input: TokenStream2) -> syn::Result<TokenStream2> {
    let stmts = Block::parse_within.parse2(input)?;
    let stmts = StepInserter.instrument(stmts);
    Ok(quote!(#(#stmts)*))
}

/// Insert a line step call before every statement of an inline block
///
/// Expands in place to the instrumented statements, so bindings made inside stay
/// visible after the macro.
///
/// # Example
/// ```ignore
/// let scope = scopeprof::ltimer().scope();
/// scopeprof::trace_lines! {
///     let mut total = 0;
///     for i in 0..10 {
///         total += i;
///     }
///     total *= 2;
/// }
/// scope.finish()?;
/// ```
#[proc_macro]
pub fn trace_lines(input: TokenStream) -> TokenStream {
    trace_lines_impl(input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
