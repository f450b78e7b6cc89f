use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::Token;
use syn::punctuated::Punctuated;
use syn::{
    Expr, ExprLit, ItemFn, Lit, Meta, Result as SynResult, parse::Parse, parse::ParseStream,
    parse_macro_input,
};

/// 为处理函数生成注解文档
///
/// 保留原函数，并生成同可见性的 `{name}_doc() -> ::restdoc::Doc`：
/// `///` 文档注释作为文档字符串（首句为摘要，`:raises Kind: text` 行引用错误响应），
/// 参数 `id`、`summary`、`description` 覆盖对应字段，`deprecated` 标记弃用。
#[proc_macro_attribute]
pub fn endpoint(attr: TokenStream, item: TokenStream) -> TokenStream {
    struct MetaArgs(Punctuated<Meta, Token![,]>);
    impl Parse for MetaArgs {
        fn parse(input: ParseStream) -> SynResult<Self> {
            Ok(MetaArgs(Punctuated::parse_terminated(input)?))
        }
    }
    let MetaArgs(args) = parse_macro_input!(attr as MetaArgs);

    let mut id_arg: Option<String> = None;
    let mut summary_arg: Option<String> = None;
    let mut description_arg: Option<String> = None;
    let mut deprecated = false;
    for meta in args {
        match meta {
            Meta::Path(path) if path.is_ident("deprecated") => deprecated = true,
            Meta::NameValue(nv) => {
                let Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) = &nv.value
                else {
                    return syn::Error::new_spanned(&nv.value, "expected a string literal")
                        .to_compile_error()
                        .into();
                };
                if nv.path.is_ident("id") {
                    id_arg = Some(s.value());
                } else if nv.path.is_ident("summary") {
                    summary_arg = Some(s.value());
                } else if nv.path.is_ident("description") {
                    description_arg = Some(s.value());
                } else {
                    return syn::Error::new_spanned(&nv.path, "unknown endpoint argument")
                        .to_compile_error()
                        .into();
                }
            }
            other => {
                return syn::Error::new_spanned(other, "unknown endpoint argument")
                    .to_compile_error()
                    .into();
            }
        }
    }

    let input = parse_macro_input!(item as ItemFn);
    let vis = &input.vis;
    let name = &input.sig.ident;

    // 收集文档注释，去掉 `///` 之后的单个空格
    let mut doc_lines: Vec<String> = Vec::new();
    for a in input.attrs.iter() {
        let Meta::NameValue(nv) = &a.meta else {
            continue;
        };
        if !nv.path.is_ident("doc") {
            continue;
        }
        if let Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) = &nv.value
        {
            let line = s.value();
            let trimmed = line.strip_prefix(' ').unwrap_or(&line).trim_end();
            doc_lines.push(trimmed.to_string());
        }
    }
    let docstring = doc_lines.join("\n").trim().to_string();

    let docstring_tokens = (!docstring.is_empty()).then(|| quote!(.docstring(#docstring)));
    let id_tokens = id_arg.map(|id| quote!(.id(#id)));
    let summary_tokens = summary_arg.map(|summary| quote!(.summary(#summary)));
    let description_tokens = description_arg.map(|description| quote!(.description(#description)));
    let deprecated_tokens = deprecated.then(|| quote!(.deprecated()));

    let doc_fn = format_ident!("{}_doc", name);
    let doc_comment = format!("`{name}` 的注解文档");

    let code = quote! {
        #input

        #[doc = #doc_comment]
        #vis fn #doc_fn() -> ::restdoc::Doc {
            ::restdoc::Doc::new()
                #docstring_tokens
                #id_tokens
                #summary_tokens
                #description_tokens
                #deprecated_tokens
        }
    };

    code.into()
}
