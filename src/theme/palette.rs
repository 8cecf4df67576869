//! Tokyo Night palettes

use ratatui::style::Color;

use super::Theme;

/// Tokyo Night (dark)
pub const NIGHT: Theme = Theme {
    name: "Tokyo Night",

    bg_primary: Color::Rgb(26, 27, 38),   // #1a1b26
    bg_secondary: Color::Rgb(36, 40, 59), // #24283b
    bg_tertiary: Color::Rgb(65, 72, 104), // #414868

    fg_primary: Color::Rgb(169, 177, 214),   // #a9b1d6
    fg_secondary: Color::Rgb(192, 202, 245), // #c0caf5
    fg_muted: Color::Rgb(86, 95, 137),       // #565f89

    accent_primary: Color::Rgb(122, 162, 247),   // #7aa2f7
    accent_secondary: Color::Rgb(187, 154, 247), // #bb9af7

    success: Color::Rgb(158, 206, 106), // #9ece6a
    warning: Color::Rgb(224, 175, 104), // #e0af68
    error: Color::Rgb(247, 118, 142),   // #f7768e
    info: Color::Rgb(125, 207, 255),    // #7dcfff

    syntax_keyword: Color::Rgb(187, 154, 247),  // #bb9af7
    syntax_string: Color::Rgb(158, 206, 106),   // #9ece6a
    syntax_number: Color::Rgb(255, 158, 100),   // #ff9e64
    syntax_comment: Color::Rgb(86, 95, 137),    // #565f89
    syntax_function: Color::Rgb(122, 162, 247), // #7aa2f7
    syntax_type: Color::Rgb(42, 195, 222),      // #2ac3de
    syntax_operator: Color::Rgb(137, 221, 255), // #89ddff

    border: Color::Rgb(65, 72, 104),           // #414868
    border_focused: Color::Rgb(122, 162, 247), // #7aa2f7
    selection: Color::Rgb(40, 52, 87),         // #283457

    syntect_theme: "base16-ocean.dark",
};

/// Tokyo Night Day (light)
pub const DAY: Theme = Theme {
    name: "Tokyo Night Day",

    bg_primary: Color::Rgb(225, 226, 231),   // #e1e2e7
    bg_secondary: Color::Rgb(208, 213, 227), // #d0d5e3
    bg_tertiary: Color::Rgb(196, 200, 218),  // #c4c8da

    fg_primary: Color::Rgb(55, 96, 191),   // #3760bf
    fg_secondary: Color::Rgb(97, 114, 176), // #6172b0
    fg_muted: Color::Rgb(132, 140, 181),    // #848cb5

    accent_primary: Color::Rgb(46, 125, 233),   // #2e7de9
    accent_secondary: Color::Rgb(152, 84, 241), // #9854f1

    success: Color::Rgb(88, 117, 57),  // #587539
    warning: Color::Rgb(140, 108, 62), // #8c6c3e
    error: Color::Rgb(245, 42, 101),   // #f52a65
    info: Color::Rgb(0, 113, 151),     // #007197

    syntax_keyword: Color::Rgb(152, 84, 241),  // #9854f1
    syntax_string: Color::Rgb(88, 117, 57),    // #587539
    syntax_number: Color::Rgb(177, 92, 0),     // #b15c00
    syntax_comment: Color::Rgb(132, 140, 181), // #848cb5
    syntax_function: Color::Rgb(46, 125, 233), // #2e7de9
    syntax_type: Color::Rgb(17, 140, 116),     // #118c74
    syntax_operator: Color::Rgb(0, 108, 134),  // #006c86

    border: Color::Rgb(168, 174, 203),        // #a8aecb
    border_focused: Color::Rgb(46, 125, 233), // #2e7de9
    selection: Color::Rgb(183, 193, 227),     // #b7c1e3

    syntect_theme: "InspiredGitHub",
};
