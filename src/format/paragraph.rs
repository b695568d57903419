//! Paragraph line breaking.
//!
//! The measured words of every text child are packed into lines as one
//! stream, so a line may hold words of several texts. Each text then gets
//! one [`LinePart`] per line it appears on, and its boundary is rebuilt as
//! the polygon around those parts.
//!
//! Line height is the largest line height among the texts on the line;
//! smaller text sits on the line's bottom edge.

use crate::attribute::{self, AttributeValue};
use crate::error::Result;
use crate::style::TextAlign;
use crate::text::{alignment_offset, justify_spacing, pack_lines, Word, WordBox};
use crate::tree::{Line, LinePart, NodeId, NodeKind};

use super::dimension::nearest_inner_width;
use super::FormatContext;

/// One word of the paragraph stream.
struct StreamWord {
    text: usize,
    word: Word,
    /// Width of the word's trailing whitespace.
    trailing: f64,
}

pub fn paragraph_layout(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let texts: Vec<NodeId> = tree
        .children(id)
        .iter()
        .copied()
        .filter(|&c| matches!(tree[c].kind, NodeKind::Text { .. }))
        .collect();

    // Texts keep only their first point until their parts are known.
    let start = tree.start_drawing_point(id);
    for &text in &texts {
        let boundary = tree.boundary_mut(text);
        boundary.reset();
        boundary.set_next(start)?;
    }

    let mut available = tree.inner_width(id);
    if available <= 0.0 {
        available = nearest_inner_width(tree, id);
    }
    let align = tree
        .keyword(id, attribute::TEXT_ALIGN)
        .and_then(TextAlign::parse)
        .unwrap_or_default();
    let base_spacing = tree
        .recursive_attribute(id, attribute::WORD_SPACING)
        .and_then(AttributeValue::as_number)
        .unwrap_or(0.0);

    let mut stream = Vec::new();
    for (index, &text) in texts.iter().enumerate() {
        let font = ctx.fonts.resolve(tree.keyword(text, attribute::FONT_TYPE));
        let size = tree.font_size(text);
        let NodeKind::Text { words, .. } = &tree[text].kind else {
            continue;
        };
        for word in words {
            let trailing = &word.text[word.text.trim_end().len()..];
            stream.push(StreamWord {
                text: index,
                trailing: font.width_of_text(trailing, size),
                word: word.clone(),
            });
        }
    }

    let boxes: Vec<WordBox> = stream
        .iter()
        .map(|w| WordBox {
            width: w.word.width,
            break_before: false,
            break_after: w.word.forced_break,
        })
        .collect();
    let spans = pack_lines(&boxes, available, base_spacing);

    let line_heights: Vec<f64> = texts.iter().map(|&t| tree.line_height(t)).collect();
    let mut parts: Vec<Vec<LinePart>> = vec![Vec::new(); texts.len()];
    let mut lines = Vec::with_capacity(spans.len());
    let mut top = start.y;
    let mut widest: f64 = 0.0;

    for (line_index, span) in spans.iter().enumerate() {
        let words = &stream[span.start..span.end];
        let height = words
            .iter()
            .map(|w| line_heights[w.text])
            .fold(0.0, f64::max);
        let trailing = words.last().map_or(0.0, |w| w.trailing);
        let words_width = span.words_width - trailing;

        let is_last = line_index + 1 == spans.len();
        let ends_forced = words.last().is_some_and(|w| w.word.forced_break);
        let spacing = if align == TextAlign::Justify && !is_last && !ends_forced {
            justify_spacing(available, words_width, span.word_count()).max(base_spacing)
        } else {
            base_spacing
        };
        let line_width = words_width + spacing * span.word_count().saturating_sub(1) as f64;
        let x = start.x + alignment_offset(align, available, line_width).max(0.0);

        let mut cursor = x;
        let mut run: Option<(usize, LinePart)> = None;
        for (i, word) in words.iter().enumerate() {
            let width = if i + 1 == words.len() {
                word.word.width - word.trailing
            } else {
                word.word.width
            };
            let continues = matches!(&run, Some((owner, _)) if *owner == word.text);
            if continues {
                if let Some((_, part)) = &mut run {
                    part.text.push_str(&word.word.text);
                    part.width = cursor + width - part.x;
                }
            } else {
                if let Some((owner, part)) = run.take() {
                    parts[owner].push(part);
                }
                let text_height = line_heights[word.text];
                run = Some((
                    word.text,
                    LinePart {
                        line: line_index,
                        text: word.word.text.clone(),
                        x: cursor,
                        top: top - (height - text_height),
                        width,
                        height: text_height,
                        word_spacing: spacing,
                    },
                ));
            }
            cursor += width + spacing;
        }
        if let Some((owner, part)) = run {
            parts[owner].push(part);
        }

        widest = widest.max(line_width);
        lines.push(Line {
            top,
            height,
            x,
            width: line_width,
        });
        top -= height;
    }

    for (index, &text) in texts.iter().enumerate() {
        if let NodeKind::Text { parts: slot, .. } = &mut tree[text].kind {
            *slot = std::mem::take(&mut parts[index]);
        }
        tree.rebuild_text_boundary(text)?;
    }

    let paddings = tree.paddings(id);
    let content_height: f64 = lines.iter().map(|l| l.height).sum();
    log::debug!("Paragraph {} laid out in {} lines", id, lines.len());
    tree[id].kind = NodeKind::Paragraph { lines };

    let height = tree.height(id).max(content_height + paddings.vertical());
    tree.set_height(id, height);
    if tree.float(id).is_floating() {
        let width = tree.width(id).max(widest + paddings.horizontal());
        tree.set_width(id, width);
    }
    Ok(())
}
