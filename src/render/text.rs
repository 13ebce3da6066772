// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Cow;

/// Average glyph advance relative to the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.6;

pub(crate) fn text_len(text: &str) -> usize {
    text.chars().count()
}

/// Estimated rendered width of `text`; no font metrics are available.
pub(crate) fn text_width(text: &str, font_size: f64) -> f64 {
    text_len(text) as f64 * font_size * CHAR_WIDTH_FACTOR
}

/// Escapes `text` for use in XML character data and attribute values.
pub(crate) fn escape_xml(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
