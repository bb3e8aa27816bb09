// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_common::{
    attributes::CellAttributes,
    colors::{Rgb, lookup_16_color, lookup_256_color_by_index},
};

/// The current graphic-rendition state applied to newly written cells.
///
/// `None` colors mean the terminal default.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SgrState {
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
    pub attributes: CellAttributes,
}

/// Apply a raw SGR parameter body to the state.
///
/// The body is exactly what arrived on the wire (it is preserved verbatim on
/// the token); this interpreter parses a copy for state and tolerates
/// anything it does not understand.
pub fn apply_sgr_params(state: &mut SgrState, raw: &str) {
    let parts: Vec<&str> = if raw.is_empty() {
        vec![""]
    } else {
        raw.split(';').collect()
    };

    let mut idx = 0;
    while idx < parts.len() {
        let part = parts[idx];

        // Colon sub-parameter syntax keeps the whole item self-contained.
        if part.contains(':') {
            apply_colon_item(state, part);
            idx += 1;
            continue;
        }

        // An empty parameter position means 0 (reset).
        let code: usize = part.parse().unwrap_or(0);

        match code {
            0 => *state = SgrState::default(),
            1 => state.attributes |= CellAttributes::BOLD,
            2 => state.attributes |= CellAttributes::DIM,
            3 => state.attributes |= CellAttributes::ITALIC,
            4 => state.attributes |= CellAttributes::UNDERLINE,
            5 | 6 => state.attributes |= CellAttributes::BLINK,
            7 => state.attributes |= CellAttributes::REVERSE,
            8 => state.attributes |= CellAttributes::HIDDEN,
            9 => state.attributes |= CellAttributes::STRIKETHROUGH,
            21 => {
                state.attributes.remove(CellAttributes::BOLD);
            }
            22 => {
                state
                    .attributes
                    .remove(CellAttributes::BOLD | CellAttributes::DIM);
            }
            23 => {
                state.attributes.remove(CellAttributes::ITALIC);
            }
            24 => {
                state.attributes.remove(CellAttributes::UNDERLINE);
            }
            25 => {
                state.attributes.remove(CellAttributes::BLINK);
            }
            27 => {
                state.attributes.remove(CellAttributes::REVERSE);
            }
            28 => {
                state.attributes.remove(CellAttributes::HIDDEN);
            }
            29 => {
                state.attributes.remove(CellAttributes::STRIKETHROUGH);
            }
            30..=37 => state.fg = Some(lookup_16_color(code - 30)),
            38 => {
                let (consumed, color) = parse_extended_color(&parts[idx + 1..]);
                idx += consumed;
                if color.is_some() {
                    state.fg = color;
                }
            }
            39 => state.fg = None,
            40..=47 => state.bg = Some(lookup_16_color(code - 40)),
            48 => {
                let (consumed, color) = parse_extended_color(&parts[idx + 1..]);
                idx += consumed;
                if color.is_some() {
                    state.bg = color;
                }
            }
            49 => state.bg = None,
            53 => state.attributes |= CellAttributes::OVERLINE,
            55 => {
                state.attributes.remove(CellAttributes::OVERLINE);
            }
            90..=97 => state.fg = Some(lookup_16_color(code - 90 + 8)),
            100..=107 => state.bg = Some(lookup_16_color(code - 100 + 8)),
            other => debug!("ignoring SGR parameter {other}"),
        }

        idx += 1;
    }
}

/// Parse the semicolon-delimited tail of a 38/48: `5;<idx>` or `2;<r>;<g>;<b>`.
/// Returns how many extra positions were consumed.
fn parse_extended_color(rest: &[&str]) -> (usize, Option<Rgb>) {
    match rest.first().copied() {
        Some("5") => {
            let color = rest
                .get(1)
                .and_then(|v| v.parse::<usize>().ok())
                .map(lookup_256_color_by_index);
            (2, color)
        }
        Some("2") => {
            let channel = |i: usize| rest.get(i).and_then(|v| v.parse::<u8>().ok());
            let color = match (channel(1), channel(2), channel(3)) {
                (Some(r), Some(g), Some(b)) => Some(Rgb::new(r, g, b)),
                _ => None,
            };
            (4, color)
        }
        _ => {
            debug!("unknown extended color introducer: {rest:?}");
            (1, None)
        }
    }
}

/// Handle one colon-delimited item such as `38:5:196`, `38:2::10:20:30`,
/// or `4:3` (underline styles map onto plain underline).
fn apply_colon_item(state: &mut SgrState, item: &str) {
    let sub: Vec<&str> = item.split(':').collect();
    let code: usize = sub.first().and_then(|v| v.parse().ok()).unwrap_or(0);

    match code {
        4 => {
            let style: usize = sub.get(1).and_then(|v| v.parse().ok()).unwrap_or(1);
            if style == 0 {
                state.attributes.remove(CellAttributes::UNDERLINE);
            } else {
                state.attributes |= CellAttributes::UNDERLINE;
            }
        }
        38 | 48 => {
            let color = match sub.get(1).copied() {
                Some("5") => sub
                    .get(2)
                    .and_then(|v| v.parse::<usize>().ok())
                    .map(lookup_256_color_by_index),
                Some("2") => {
                    // ITU colorspace form carries an empty colorspace slot:
                    // 38:2::r:g:b. Accept both with and without it.
                    let tail: Vec<&str> = if sub.get(2).is_some_and(|v| v.is_empty()) {
                        sub[3..].to_vec()
                    } else {
                        sub[2..].to_vec()
                    };
                    let channel = |i: usize| tail.get(i).and_then(|v| v.parse::<u8>().ok());
                    match (channel(0), channel(1), channel(2)) {
                        (Some(r), Some(g), Some(b)) => Some(Rgb::new(r, g, b)),
                        _ => None,
                    }
                }
                _ => None,
            };

            if color.is_some() {
                if code == 38 {
                    state.fg = color;
                } else {
                    state.bg = color;
                }
            }
        }
        other => debug!("ignoring colon SGR item {other}"),
    }
}

/// Build the canonical SGR parameter body that reproduces `state` from a
/// reset terminal. Used when re-emitting minimal style runs.
#[must_use]
pub fn sgr_params_for(state: &SgrState) -> String {
    let mut params = vec!["0".to_string()];

    for flag in state.attributes.iter() {
        if let Some(code) = flag.sgr_enable_code() {
            params.push(code.to_string());
        }
    }

    if let Some(fg) = state.fg {
        params.push(format!("38;2;{};{};{}", fg.r, fg.g, fg.b));
    }
    if let Some(bg) = state.bg {
        params.push(format!("48;2;{};{};{}", bg.r, bg.g, bg.b));
    }

    params.join(";")
}
