//! Rich text fields.
//!
//! The raw block list is kept verbatim under `raw`; `text` and `html` are
//! rendered from it once, at normalisation time, so the output depends only
//! on the document and the configured link resolver.

use serde_json::{Value, json};

use super::{DeclareContext, FieldResolver, NormalizeContext, link_target};
use crate::domain::custom_type::FieldSchema;
use crate::domain::ports::LinkResolver;
use crate::domain::{Error, FieldDefinition, FieldKind, TypeDescriptor, TypePath, TypePathEntry};

pub(super) struct RichTextField;

impl FieldResolver for RichTextField {
    fn declare(
        &self,
        ctx: &mut DeclareContext<'_>,
        _path: &TypePath,
        _field: &FieldSchema,
    ) -> Result<TypePathEntry, Error> {
        let type_name = ctx.naming.shared("StructuredTextType");
        ctx.schema.ensure(TypeDescriptor::object(
            type_name.clone(),
            vec![
                FieldDefinition::new("html", "String"),
                FieldDefinition::new("text", "String"),
                FieldDefinition::new("raw", "JSON"),
            ],
        ))?;
        Ok(TypePathEntry::leaf(FieldKind::RichText, type_name))
    }

    fn normalize(
        &self,
        ctx: &mut NormalizeContext<'_>,
        _path: &TypePath,
        _entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error> {
        let blocks: &[Value] = value.and_then(Value::as_array).map_or(&[], Vec::as_slice);
        Ok(json!({
            "html": as_html(blocks, ctx.link_resolver),
            "text": as_text(blocks),
            "raw": blocks,
        }))
    }
}

/// Plain text of every block, one line per block.
pub(crate) fn as_text(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

/// HTML rendering of a block list.
pub(crate) fn as_html(blocks: &[Value], resolver: Option<&dyn LinkResolver>) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;
    for block in blocks {
        let block_type = block.get("type").and_then(Value::as_str).unwrap_or_default();
        let list = match block_type {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{tag}>"));
            }
            if let Some(tag) = list {
                html.push_str(&format!("<{tag}>"));
            }
            open_list = list;
        }
        render_block(&mut html, block_type, block, resolver);
    }
    if let Some(tag) = open_list {
        html.push_str(&format!("</{tag}>"));
    }
    html
}

fn render_block(html: &mut String, block_type: &str, block: &Value, resolver: Option<&dyn LinkResolver>) {
    let tag = match block_type {
        "paragraph" => "p",
        "heading1" => "h1",
        "heading2" => "h2",
        "heading3" => "h3",
        "heading4" => "h4",
        "heading5" => "h5",
        "heading6" => "h6",
        "preformatted" => "pre",
        "list-item" | "o-list-item" => "li",
        "image" => {
            let url = block.get("url").and_then(Value::as_str).unwrap_or_default();
            let alt = block.get("alt").and_then(Value::as_str).unwrap_or_default();
            html.push_str(&format!(
                r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                escape(url),
                escape(alt)
            ));
            return;
        }
        "embed" => {
            let oembed = block.get("oembed").unwrap_or(&Value::Null);
            let attribute = |key: &str| escape(oembed.get(key).and_then(Value::as_str).unwrap_or_default());
            html.push_str(&format!(
                r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
                attribute("embed_url"),
                attribute("type"),
                attribute("provider_name"),
                oembed.get("html").and_then(Value::as_str).unwrap_or_default()
            ));
            return;
        }
        _ => "div",
    };
    let class = block
        .get("label")
        .and_then(Value::as_str)
        .map(|label| format!(r#" class="{}""#, escape(label)))
        .unwrap_or_default();
    let text = block.get("text").and_then(Value::as_str).unwrap_or_default();
    let spans = parse_spans(block.get("spans"));
    let inner = render_spans(text, &spans, resolver);
    html.push_str(&format!("<{tag}{class}>{inner}</{tag}>"));
}

#[derive(Debug, Clone)]
struct Span<'a> {
    start: usize,
    end: usize,
    kind: &'a str,
    data: &'a Value,
}

fn parse_spans(spans: Option<&Value>) -> Vec<Span<'_>> {
    let mut parsed: Vec<Span<'_>> = spans
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|span| {
            let offset = |key: &str| {
                span.get(key)
                    .and_then(Value::as_u64)
                    .and_then(|offset| usize::try_from(offset).ok())
            };
            Some(Span {
                start: offset("start")?,
                end: offset("end")?,
                kind: span.get("type").and_then(Value::as_str).unwrap_or_default(),
                data: span.get("data").unwrap_or(&Value::Null),
            })
        })
        .filter(|span| span.start < span.end)
        .collect();
    parsed.sort_by(|left, right| left.start.cmp(&right.start).then(right.end.cmp(&left.end)));
    parsed
}

/// Render text with inline spans.
///
/// Span offsets count UTF-16 code units, as the CMS reports them. Overlapping
/// spans that do not nest are closed and reopened so the output is always
/// well formed.
fn render_spans(text: &str, spans: &[Span<'_>], resolver: Option<&dyn LinkResolver>) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let length = units.len();
    let visible: Vec<Span<'_>> = spans
        .iter()
        .filter(|span| span.start < length)
        .map(|span| Span {
            end: span.end.min(length),
            ..span.clone()
        })
        .collect();

    let mut boundaries: Vec<usize> = visible
        .iter()
        .flat_map(|span| [span.start, span.end])
        .chain([0, length])
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut html = String::new();
    let mut stack: Vec<&Span<'_>> = Vec::new();
    let mut pending = visible.iter().peekable();
    let segment_ends = boundaries.iter().skip(1).map(Some).chain([None]);
    for (&position, until) in boundaries.iter().zip(segment_ends) {
        if let Some(first_closed) = stack.iter().position(|open| open.end <= position) {
            let closed = stack.split_off(first_closed);
            for open in closed.iter().rev() {
                html.push_str(close_tag(open.kind));
            }
            for open in closed {
                if open.end > position {
                    html.push_str(&open_tag(open, resolver));
                    stack.push(open);
                }
            }
        }
        while let Some(span) = pending.next_if(|span| span.start == position) {
            html.push_str(&open_tag(span, resolver));
            stack.push(span);
        }
        if let Some(segment) = until.and_then(|&end| units.get(position..end)) {
            html.push_str(&escape(&String::from_utf16_lossy(segment)).replace('\n', "<br />"));
        }
    }
    html
}

fn open_tag(span: &Span<'_>, resolver: Option<&dyn LinkResolver>) -> String {
    match span.kind {
        "strong" => "<strong>".to_owned(),
        "em" => "<em>".to_owned(),
        "hyperlink" => {
            let href = match link_target(span.data) {
                Some(target) => resolver.and_then(|resolver| resolver.resolve(&target)),
                None => span.data.get("url").and_then(Value::as_str).map(str::to_owned),
            }
            .unwrap_or_default();
            let target = span
                .data
                .get("target")
                .and_then(Value::as_str)
                .map(|target| format!(r#" target="{}" rel="noopener""#, escape(target)))
                .unwrap_or_default();
            format!(r#"<a href="{}"{target}>"#, escape(&href))
        }
        "label" => {
            let label = span.data.get("label").and_then(Value::as_str).unwrap_or_default();
            format!(r#"<span class="{}">"#, escape(label))
        }
        _ => "<span>".to_owned(),
    }
}

fn close_tag(kind: &str) -> &'static str {
    match kind {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
