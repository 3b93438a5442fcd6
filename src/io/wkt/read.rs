//! WKT reading operations (minimal implementation).
//!
//! Only the geometry kinds building footprints come in are supported:
//! `POLYGON` and `MULTIPOLYGON`, each optionally `EMPTY`.

use anyhow::{Result, anyhow, bail, ensure};
use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Parse a footprint polygon from WKT text.
/// Returns `None` for an `EMPTY` geometry.
pub(crate) fn multipolygon_from_wkt(text: &str) -> Result<Option<MultiPolygon<f64>>> {
    let mut parser = Parser::new(text);
    let tag = parser.word()?.to_ascii_uppercase();

    let geometry = match tag.as_str() {
        "POLYGON" => parser.optional_body(|p| p.polygon())?.map(|polygon| MultiPolygon::new(vec![polygon])),
        "MULTIPOLYGON" => parser.optional_body(|p| p.list(|p| p.polygon()))?.map(MultiPolygon::new),
        other => bail!("[io::wkt::read] Unsupported geometry type '{other}'"),
    };

    parser.skip_whitespace();
    ensure!(parser.at_end(), "[io::wkt::read] Trailing characters after geometry at offset {}", parser.pos);
    Ok(geometry)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self { Self { bytes: text.as_bytes(), pos: 0 } }

    #[inline] fn at_end(&self) -> bool { self.pos >= self.bytes.len() }

    fn skip_whitespace(&mut self) {
        while self.bytes.get(self.pos).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == byte => { self.pos += 1; Ok(()) }
            Some(b) => bail!("[io::wkt::read] Expected '{}' at offset {}, found '{}'", byte as char, self.pos, b as char),
            None => bail!("[io::wkt::read] Expected '{}' but reached end of input", byte as char),
        }
    }

    /// Alphabetic keyword such as `POLYGON` or `EMPTY`.
    fn word(&mut self) -> Result<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|b| b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        ensure!(self.pos > start, "[io::wkt::read] Expected geometry keyword at offset {start}");
        std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|e| anyhow!("[io::wkt::read] Invalid keyword: {e}"))
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_whitespace();
        let start = self.pos;
        while self.bytes.get(self.pos)
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
        {
            self.pos += 1;
        }
        let token = std::str::from_utf8(&self.bytes[start..self.pos])?;
        token.parse::<f64>()
            .map_err(|_| anyhow!("[io::wkt::read] Invalid number '{token}' at offset {start}"))
    }

    /// Either the keyword `EMPTY` or the body parsed by `f`, after an optional
    /// `Z`, `M` or `ZM` dimension tag.
    fn optional_body<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<Option<T>> {
        let mut word = if self.peek().is_some_and(|b| b.is_ascii_alphabetic()) { Some(self.word()?) } else { None };
        if word.is_some_and(|w| matches!(w.to_ascii_uppercase().as_str(), "Z" | "M" | "ZM")) {
            word = if self.peek().is_some_and(|b| b.is_ascii_alphabetic()) { Some(self.word()?) } else { None };
        }
        match word {
            Some(w) if w.eq_ignore_ascii_case("EMPTY") => Ok(None),
            Some(w) => bail!("[io::wkt::read] Unexpected keyword '{w}'"),
            None => f(self).map(Some),
        }
    }

    /// Parenthesised, comma-separated list of items parsed by `f`.
    fn list<T>(&mut self, mut f: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        self.expect(b'(')?;
        let mut items = vec![f(self)?];
        while self.peek() == Some(b',') {
            self.pos += 1;
            items.push(f(self)?);
        }
        self.expect(b')')?;
        Ok(items)
    }

    /// X and Y of one vertex; extra ordinates (Z, M) are skipped.
    fn coord(&mut self) -> Result<Coord<f64>> {
        let x = self.number()?;
        let y = self.number()?;
        while self.peek().is_some_and(|b| b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.') {
            self.number()?;
        }
        Ok(Coord { x, y })
    }

    fn ring(&mut self) -> Result<LineString<f64>> {
        let coords = self.list(|p| p.coord())?;
        ensure!(coords.len() >= 3, "[io::wkt::read] Ring needs at least 3 vertices, got {}", coords.len());
        Ok(LineString::from(coords))
    }

    fn polygon(&mut self) -> Result<Polygon<f64>> {
        let mut rings = self.list(|p| p.ring())?.into_iter();
        let exterior = rings.next()
            .ok_or_else(|| anyhow!("[io::wkt::read] Polygon must have at least one ring"))?;
        Ok(Polygon::new(exterior, rings.collect()))
    }
}
