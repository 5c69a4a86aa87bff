//! Statement boundary detection.
//!
//! A unit is complete when the session's own parser accepts it. A parse
//! failure that ran out of input means the unit is still open; any other
//! failure is a real syntax error.

use crate::session::{RuntimeSession, SyntaxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Complete,
    Incomplete,
}

impl Boundary {
    pub fn check<S: RuntimeSession>(session: &S, unit: &str) -> Result<Self, SyntaxError> {
        match session.compile(unit) {
            Ok(()) => Ok(Boundary::Complete),
            Err(e) if e.incomplete => Ok(Boundary::Incomplete),
            Err(e) => Err(e),
        }
    }
}

/// Blank lines and full-line comments neither start nor complete a unit.
pub fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("//")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementUnit {
    /// 0-based index of the unit's first line in the source buffer.
    pub first_line: usize,
    /// 0-based index of the unit's last line in the source buffer.
    pub last_line: usize,
    /// Byte offset of the first line in the source buffer.
    pub offset: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scanned {
    /// The unit compiled. `last_line` is the line that completed it.
    Complete(StatementUnit),
    /// The buffer ended while the unit was still open.
    Trailing(StatementUnit),
}

/// Walks a source buffer line by line, growing units until they compile.
pub struct UnitScanner<'src> {
    lines: std::iter::Enumerate<std::str::Split<'src, char>>,
    offset: u32,
    pending: Option<StatementUnit>,
}

impl<'src> UnitScanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lines: source.split('\n').enumerate(),
            offset: 0,
            pending: None,
        }
    }

    /// Returns the next unit, `None` once the buffer is exhausted, or the
    /// first genuine syntax error with its location shifted into the buffer.
    pub fn next_unit<S: RuntimeSession>(
        &mut self,
        session: &S,
    ) -> Result<Option<Scanned>, SyntaxError> {
        while let Some((index, line)) = self.lines.next() {
            let offset = self.offset;
            self.offset += line.len() as u32 + 1;

            let skippable = is_skippable(line);
            let unit = match self.pending {
                None if skippable => continue,
                None => self.pending.insert(StatementUnit {
                    first_line: index,
                    last_line: index,
                    offset,
                    text: line.to_string(),
                }),
                Some(ref mut unit) => {
                    unit.text.push('\n');
                    unit.text.push_str(line);
                    unit.last_line = index;
                    unit
                }
            };

            // Appended verbatim, e.g. inside a multi-line string literal.
            if skippable {
                continue;
            }

            match Boundary::check(session, &unit.text) {
                Ok(Boundary::Incomplete) => {
                    tracing::trace!(line = index, "unit still open");
                }
                Ok(Boundary::Complete) => return Ok(self.pending.take().map(Scanned::Complete)),
                Err(e) => return Err(e.shifted(unit.first_line, unit.offset)),
            }
        }

        Ok(self.pending.take().map(Scanned::Trailing))
    }
}

/// The end-of-input error for a unit the buffer left open.
pub fn trailing_error<S: RuntimeSession>(session: &S, unit: &StatementUnit) -> Option<SyntaxError> {
    session
        .compile(&unit.text)
        .err()
        .map(|e| e.shifted(unit.first_line, unit.offset))
}

/// Splits a whole buffer into units without executing anything. A unit left
/// open at the end of the buffer is reported as its end-of-input error.
pub fn split_units<S: RuntimeSession>(
    session: &S,
    source: &str,
) -> Result<Vec<StatementUnit>, SyntaxError> {
    let mut scanner = UnitScanner::new(source);
    let mut units = Vec::new();
    while let Some(scanned) = scanner.next_unit(session)? {
        match scanned {
            Scanned::Complete(unit) => units.push(unit),
            Scanned::Trailing(unit) => match trailing_error(session, &unit) {
                Some(e) => return Err(e),
                None => units.push(unit),
            },
        }
    }
    Ok(units)
}
