// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Text front-ends: the line-oriented dotflow DSL and a DOT subset (import and export).

mod cursor;
pub mod dot;
pub mod dsl;
mod ident;

pub use cursor::SourcePos;
pub use dot::{export_dot, parse_dot, DotParseError};
pub use dsl::{parse_dsl, parse_dsl_with, DslParseError, ParseOptions};
