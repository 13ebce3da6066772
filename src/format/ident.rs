// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Cow;

const DOT_KEYWORDS: [&str; 6] = ["node", "edge", "graph", "digraph", "subgraph", "strict"];

/// Characters allowed in an unquoted identifier.
pub(super) fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '.'
}

/// Characters allowed in an unquoted attribute key.
pub(super) fn is_key_char(ch: char) -> bool {
    is_ident_char(ch) || ch == '-'
}

pub(super) fn is_bare_ident(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_ident_char)
}

/// Quotes `value` for DOT output unless it is a plain identifier that is not a keyword.
pub(super) fn quote_if_needed(value: &str) -> Cow<'_, str> {
    let is_keyword = DOT_KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(value));
    if is_bare_ident(value) && !is_keyword {
        return Cow::Borrowed(value);
    }
    Cow::Owned(quote(value))
}

/// Double-quotes `value`. Embedded double quotes and backslashes are escaped.
pub(super) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
