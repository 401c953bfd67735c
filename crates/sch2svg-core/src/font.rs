//! Stroke font used to draw schematic text as polylines.
//!
//! Renderers only depend on the [`GlyphSource`] trait. [`StrokeFont`] is the
//! built-in implementation; [`StrokeFont::builtin`] parses the embedded
//! glyph table on first use and shares it for the rest of the process.
//!
//! # Glyph table format
//!
//! One glyph per line: the character (or `space`), its advance width, and
//! its strokes. Strokes are `|`-separated lists of `x,y` points on a grid
//! where `y = 0` is the cap line and `y = 6` the baseline. Lines starting
//! with `//` are comments.
//!
//! ```text
//! T 5 0,0 4,0 | 2,0 2,6
//! ```

use std::{collections::HashMap, sync::OnceLock};

use log::info;
use thiserror::Error;

/// Cap height of the built-in grid, in font units.
const CAP_HEIGHT: f64 = 6.0;

const BUILTIN_GLYPHS: &str = r#"// Built-in stroke glyphs
space 5
! 3 1,0 1,4 | 1,6 1,6
" 5 1,0 1,1 | 3,0 3,1
# 5 1,1 1,5 | 3,1 3,5 | 0,2 4,2 | 0,4 4,4
$ 5 4,1 3,0 1,0 0,1 0,2 1,3 3,3 4,4 4,5 3,6 1,6 0,5 | 2,0 2,6
% 5 0,6 4,0 | 0,0 1,0 1,1 0,1 0,0 | 3,5 4,5 4,6 3,6 3,5
& 5 4,6 1,2 1,1 2,0 3,1 3,2 0,4 0,5 1,6 2,6 4,4
' 3 1,0 1,1
( 4 2,0 1,1 1,5 2,6
) 4 1,0 2,1 2,5 1,6
* 5 2,1 2,5 | 0,2 4,4 | 4,2 0,4
+ 5 0,3 4,3 | 2,1 2,5
, 3 1,5 1,6 0,7
- 5 0,3 4,3
. 3 1,6 1,6
/ 5 0,6 4,0
0 5 1,0 3,0 4,1 4,5 3,6 1,6 0,5 0,1 1,0 | 4,1 0,5
1 5 1,1 2,0 2,6 | 1,6 3,6
2 5 0,1 1,0 3,0 4,1 4,2 0,6 4,6
3 5 0,1 1,0 3,0 4,1 4,2 3,3 1,3 | 3,3 4,4 4,5 3,6 1,6 0,5
4 5 3,6 3,0 0,4 4,4
5 5 4,0 0,0 0,3 3,3 4,4 4,5 3,6 0,6
6 5 3,0 1,0 0,1 0,5 1,6 3,6 4,5 4,4 3,3 0,3
7 5 0,0 4,0 1,6
8 5 1,0 3,0 4,1 4,2 3,3 1,3 0,4 0,5 1,6 3,6 4,5 4,4 3,3 | 1,3 0,2 0,1 1,0
9 5 4,3 1,3 0,2 0,1 1,0 3,0 4,1 4,5 3,6 1,6
: 3 1,2 1,2 | 1,6 1,6
; 3 1,2 1,2 | 1,5 1,6 0,7
< 5 4,1 0,3 4,5
= 5 0,2 4,2 | 0,4 4,4
> 5 0,1 4,3 0,5
? 5 0,1 1,0 3,0 4,1 4,2 2,3 2,4 | 2,6 2,6
@ 5 3,4 3,2 1,2 1,4 3,4 4,3 4,1 3,0 1,0 0,1 0,5 1,6 4,6
A 5 0,6 2,0 4,6 | 1,3 3,3
B 5 0,6 0,0 3,0 4,1 4,2 3,3 0,3 | 3,3 4,4 4,5 3,6 0,6
C 5 4,1 3,0 1,0 0,1 0,5 1,6 3,6 4,5
D 5 0,0 0,6 2,6 4,4 4,2 2,0 0,0
E 5 4,0 0,0 0,6 4,6 | 0,3 3,3
F 5 4,0 0,0 0,6 | 0,3 3,3
G 5 4,1 3,0 1,0 0,1 0,5 1,6 3,6 4,5 4,3 2,3
H 5 0,0 0,6 | 4,0 4,6 | 0,3 4,3
I 4 1,0 3,0 | 2,0 2,6 | 1,6 3,6
J 5 4,0 4,5 3,6 1,6 0,5
K 5 0,0 0,6 | 4,0 0,4 | 1,3 4,6
L 5 0,0 0,6 4,6
M 6 0,6 0,0 2,3 4,0 4,6
N 5 0,6 0,0 4,6 4,0
O 5 1,0 3,0 4,1 4,5 3,6 1,6 0,5 0,1 1,0
P 5 0,6 0,0 3,0 4,1 4,2 3,3 0,3
Q 5 1,0 3,0 4,1 4,5 3,6 1,6 0,5 0,1 1,0 | 2,4 4,6
R 5 0,6 0,0 3,0 4,1 4,2 3,3 0,3 | 2,3 4,6
S 5 4,1 3,0 1,0 0,1 0,2 1,3 3,3 4,4 4,5 3,6 1,6 0,5
T 5 0,0 4,0 | 2,0 2,6
U 5 0,0 0,5 1,6 3,6 4,5 4,0
V 5 0,0 2,6 4,0
W 6 0,0 1,6 2,3 3,6 4,0
X 5 0,0 4,6 | 4,0 0,6
Y 5 0,0 2,3 4,0 | 2,3 2,6
Z 5 0,0 4,0 0,6 4,6
[ 4 2,0 1,0 1,6 2,6
\ 5 0,0 4,6
] 4 1,0 2,0 2,6 1,6
^ 5 0,2 2,0 4,2
_ 5 0,7 4,7
` 4 1,0 2,1
a 5 4,2 4,6 | 4,3 3,2 1,2 0,3 0,5 1,6 3,6 4,5
b 5 0,0 0,6 | 0,3 1,2 3,2 4,3 4,5 3,6 1,6 0,5
c 5 4,3 3,2 1,2 0,3 0,5 1,6 3,6 4,5
d 5 4,0 4,6 | 4,3 3,2 1,2 0,3 0,5 1,6 3,6 4,5
e 5 0,4 4,4 4,3 3,2 1,2 0,3 0,5 1,6 4,6
f 4 3,0 2,0 1,1 1,6 | 0,2 3,2
g 5 4,2 4,7 3,8 1,8 | 4,3 3,2 1,2 0,3 0,5 1,6 3,6 4,5
h 5 0,0 0,6 | 0,3 1,2 3,2 4,3 4,6
i 3 1,2 1,6 | 1,0 1,0
j 4 2,2 2,7 1,8 0,8 | 2,0 2,0
k 5 0,0 0,6 | 4,2 0,5 | 1,4 4,6
l 4 1,0 2,0 2,6 | 1,6 3,6
m 6 0,6 0,2 | 0,3 1,2 2,3 2,6 | 2,3 3,2 4,3 4,6
n 5 0,6 0,2 | 0,3 1,2 3,2 4,3 4,6
o 5 1,2 3,2 4,3 4,5 3,6 1,6 0,5 0,3 1,2
p 5 0,2 0,8 | 0,3 1,2 3,2 4,3 4,5 3,6 1,6 0,5
q 5 4,2 4,8 | 4,3 3,2 1,2 0,3 0,5 1,6 3,6 4,5
r 5 0,2 0,6 | 0,4 2,2 4,2
s 5 4,2 1,2 0,3 1,4 3,4 4,5 3,6 0,6
t 4 1,0 1,5 2,6 3,6 | 0,2 3,2
u 5 0,2 0,5 1,6 3,6 4,5 | 4,2 4,6
v 5 0,2 2,6 4,2
w 6 0,2 1,6 2,4 3,6 4,2
x 5 0,2 4,6 | 4,2 0,6
y 5 0,2 2,6 | 4,2 1,8
z 5 0,2 4,2 0,6 4,6
{ 4 2,0 1,1 1,2 0,3 1,4 1,5 2,6
| 3 1,0 1,8
} 4 0,0 1,1 1,2 2,3 1,4 1,5 0,6
~ 5 0,3 1,2 3,4 4,3
"#;

/// Errors raised while parsing a glyph table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("glyph table line {line}: {message}")]
pub struct FontError {
    line: usize,
    message: String,
}

/// One glyph: its advance width and stroke polylines, in font units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    advance: f64,
    strokes: Vec<Vec<(f64, f64)>>,
}

impl Glyph {
    pub fn new(advance: f64, strokes: Vec<Vec<(f64, f64)>>) -> Self {
        Self { advance, strokes }
    }

    pub fn advance(&self) -> f64 {
        self.advance
    }

    pub fn strokes(&self) -> &[Vec<(f64, f64)>] {
        &self.strokes
    }
}

/// Provides glyph geometry for text rendering.
///
/// Implementations must be immutable once built so one instance can serve
/// every concurrent render.
pub trait GlyphSource: Send + Sync {
    /// Returns the glyph for `ch`, if the source has one.
    fn glyph(&self, ch: char) -> Option<&Glyph>;

    /// Returns the glyph drawn for characters without their own glyph.
    fn fallback(&self) -> &Glyph;

    /// Height of capital letters in font units.
    fn cap_height(&self) -> f64;

    /// Horizontal gap included at the end of every advance, in font units.
    fn spacing(&self) -> f64 {
        1.0
    }
}

/// A glyph table parsed from the text format described in the
/// [module documentation](self).
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeFont {
    glyphs: HashMap<char, Glyph>,
    fallback: Glyph,
}

impl StrokeFont {
    /// Parses a glyph table.
    ///
    /// # Errors
    ///
    /// Returns [`FontError`] for malformed lines, and when the table has no
    /// `?` glyph to fall back on.
    pub fn parse(table: &str) -> Result<Self, FontError> {
        let mut glyphs = HashMap::new();

        for (index, raw) in table.lines().enumerate() {
            let line = index + 1;
            let error = |message: String| FontError { line, message };

            let raw = raw.trim_end();
            if raw.is_empty() || raw.starts_with("//") {
                continue;
            }

            let mut parts = raw.splitn(3, ' ');
            let ch = match parts.next() {
                Some("space") => ' ',
                Some(name) => {
                    let mut chars = name.chars();
                    match (chars.next(), chars.next()) {
                        (Some(ch), None) => ch,
                        _ => return Err(error(format!("`{name}` is not a single character"))),
                    }
                }
                None => continue,
            };

            let advance = parts
                .next()
                .and_then(|advance| advance.parse::<f64>().ok())
                .ok_or_else(|| error(format!("glyph `{ch}` has no advance width")))?;

            let strokes = match parts.next() {
                Some(strokes) => parse_strokes(strokes).map_err(error)?,
                None => Vec::new(),
            };

            glyphs.insert(ch, Glyph::new(advance, strokes));
        }

        let fallback = glyphs.get(&'?').cloned().ok_or_else(|| FontError {
            line: 0,
            message: "glyph table has no `?` glyph".to_string(),
        })?;

        Ok(Self { glyphs, fallback })
    }

    /// Returns the built-in font, parsing it on first use.
    ///
    /// Concurrent first callers wait for the same initialization.
    pub fn builtin() -> &'static StrokeFont {
        static BUILTIN: OnceLock<StrokeFont> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let font = Self::parse(BUILTIN_GLYPHS).expect("built-in glyph table is well formed");
            info!(glyphs = font.glyphs.len(); "Loaded built-in stroke font");
            font
        })
    }

    /// Number of glyphs in the table.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl GlyphSource for StrokeFont {
    fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    fn fallback(&self) -> &Glyph {
        &self.fallback
    }

    fn cap_height(&self) -> f64 {
        CAP_HEIGHT
    }
}

fn parse_strokes(text: &str) -> Result<Vec<Vec<(f64, f64)>>, String> {
    text.split('|')
        .map(|stroke| {
            stroke
                .split_whitespace()
                .map(|point| {
                    let (x, y) = point
                        .split_once(',')
                        .ok_or_else(|| format!("`{point}` is not an x,y pair"))?;
                    let x = x.parse::<f64>().map_err(|err| format!("bad x in `{point}`: {err}"))?;
                    let y = y.parse::<f64>().map_err(|err| format!("bad y in `{point}`: {err}"))?;
                    Ok((x, y))
                })
                .collect::<Result<Vec<_>, String>>()
        })
        .filter(|stroke| !matches!(stroke, Ok(points) if points.is_empty()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_font_loads() {
        let font = StrokeFont::builtin();
        assert!(font.len() > 90);
        assert_eq!(font.cap_height(), 6.0);
    }

    #[test]
    fn test_builtin_is_shared() {
        let first = StrokeFont::builtin() as *const StrokeFont;
        let second = StrokeFont::builtin() as *const StrokeFont;
        assert_eq!(first, second);
    }

    #[test]
    fn test_builtin_covers_printable_ascii() {
        let font = StrokeFont::builtin();
        for ch in ' '..='~' {
            assert!(font.glyph(ch).is_some(), "missing glyph for {ch:?}");
        }
    }

    #[test]
    fn test_glyph_geometry() {
        let font = StrokeFont::builtin();
        let t = font.glyph('T').unwrap();
        assert_eq!(t.advance(), 5.0);
        assert_eq!(t.strokes(), &[vec![(0.0, 0.0), (4.0, 0.0)], vec![(2.0, 0.0), (2.0, 6.0)]]);

        let space = font.glyph(' ').unwrap();
        assert!(space.strokes().is_empty());
    }

    #[test]
    fn test_fallback_is_question_mark() {
        let font = StrokeFont::builtin();
        assert_eq!(font.fallback(), font.glyph('?').unwrap());
        assert!(font.glyph('Ω').is_none());
    }

    #[test]
    fn test_parse_errors() {
        let err = StrokeFont::parse("AB 5 0,0 1,1\n").unwrap_err();
        assert_eq!(err.line, 1);

        let err = StrokeFont::parse("? 5\nA x\n").unwrap_err();
        assert_eq!(err.line, 2);

        let err = StrokeFont::parse("A 5 0,0 1\n? 5\n").unwrap_err();
        assert!(err.message.contains("x,y"));

        assert!(StrokeFont::parse("A 5 0,0 1,1\n").is_err());
    }

    #[test]
    fn test_parse_skips_comments() {
        let font = StrokeFont::parse("// comment\n# 5 0,0 1,1\n? 5\n").unwrap();
        assert!(font.glyph('#').is_some());
    }
}
