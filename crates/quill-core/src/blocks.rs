//! Block-content codec: conversion between the block tree and flat text.
//!
//! The round trip is lossy: only text survives encoding, so
//! heading/list/style structure collapses to paragraphs. Decoding never
//! fails on malformed nodes; blocks without extractable text simply
//! contribute nothing.

use crate::defaults;
use crate::models::Block;

/// Lazily yield one line of plain text per block that carries inline
/// text content.
///
/// The returned iterator is finite and restartable (call again to
/// restart). Text runs within a block are joined by single spaces;
/// blocks with no text runs are skipped.
pub fn plain_text_lines(blocks: &[Block]) -> impl Iterator<Item = String> + '_ {
    blocks.iter().filter_map(|block| {
        let mut line = String::new();
        for run in &block.content {
            if run.text.is_empty() {
                continue;
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&run.text);
        }
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    })
}

/// Decode a block tree to a single newline-joined plain-text string.
pub fn plain_text(blocks: &[Block]) -> String {
    plain_text_lines(blocks).collect::<Vec<_>>().join("\n")
}

/// Encode flat text as block content.
///
/// Splits on line breaks, discards blank lines, and emits one paragraph
/// block per remaining line with a synthetic stable id
/// (`paragraph-<n>`, 1-based) and default formatting properties. A
/// level-1 heading block carrying `heading_label` is prepended.
pub fn blocks_from_plain_text(text: &str, heading_label: &str) -> Vec<Block> {
    let mut blocks = vec![Block::heading("heading-1", 1, heading_label)];

    for (idx, line) in text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
    {
        blocks.push(Block::paragraph(format!("paragraph-{}", idx + 1), line));
    }

    blocks
}

/// Derive a short preview from generated text: the first
/// [`defaults::PREVIEW_MAX_CHARS`] characters, with an ellipsis when
/// truncated.
pub fn preview_from_text(text: &str) -> String {
    let mut preview: String = text.chars().take(defaults::PREVIEW_MAX_CHARS).collect();
    if text.chars().count() > defaults::PREVIEW_MAX_CHARS {
        preview.push_str("...");
    }
    preview
}
