use crate::edit::FileEdits;
use crate::position::Position;
use std::io::{self, Write};

/// Error types for the rewrite pass
///
/// A missing start or end location means the text being rewritten does not
/// match the text the edit positions were computed against. The rewriter
/// fails loudly instead of clipping ranges or searching for them.
#[derive(Debug)]
pub enum RewriteError {
    /// An edit's start position was never reached in the input
    MissingStartLocation(Position),
    /// An edit's end position did not fall on a reachable character boundary
    MissingEndLocation(Position),
    /// Writing to the output sink failed
    Io(io::Error),
}

impl std::fmt::Display for RewriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewriteError::MissingStartLocation(pos) => {
                write!(f, "can't find edit start location in source text: {}", pos)
            }
            RewriteError::MissingEndLocation(pos) => {
                write!(f, "can't find edit end location in source text: {}", pos)
            }
            RewriteError::Io(e) => write!(f, "I/O error while rewriting: {}", e),
        }
    }
}

impl std::error::Error for RewriteError {}

impl From<io::Error> for RewriteError {
    fn from(err: io::Error) -> Self {
        RewriteError::Io(err)
    }
}

/// Byte cursor over input text that tracks the current source position
///
/// The line increments and the column resets when a `\n` is consumed;
/// otherwise the column increments. Columns count bytes.
struct Cursor<'a> {
    bytes: std::slice::Iter<'a, u8>,
    current: Option<u8>,
    pos: Position,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        let mut bytes = input.as_bytes().iter();
        let current = bytes.next().copied();
        Self {
            bytes,
            current,
            pos: Position::new(1, 1),
        }
    }

    /// Current byte, or `None` at end of input
    fn current(&self) -> Option<u8> {
        self.current
    }

    fn at_eof(&self) -> bool {
        self.current.is_none()
    }

    fn pos(&self) -> Position {
        self.pos
    }

    /// Consume the current byte and advance the position past it
    fn advance(&mut self) {
        if self.current == Some(b'\n') {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }

        self.current = self.bytes.next().copied();
    }
}

/// Rewrite `input` against an ordered edit set, streaming into `out`
///
/// Single forward pass: bytes outside every edit range are copied through
/// unchanged, bytes inside an edit range are dropped and the edit's
/// replacement is written in their place. Every edit boundary must fall on a
/// position actually visited by the pass, otherwise the rewrite fails with a
/// `RewriteError` naming the missing location.
///
/// # Arguments
/// * `edits` - Edit set for the file, in ascending start-position order
/// * `input` - The original source text the edit positions refer to
/// * `out` - Sink receiving the rewritten text
///
/// # Returns
/// * `Ok(())` - All edits applied, full output written
/// * `Err(RewriteError)` - An edit boundary was unreachable or a write failed
pub fn rewrite(edits: &FileEdits, input: &str, out: &mut dyn Write) -> Result<(), RewriteError> {
    let mut cursor = Cursor::new(input);
    let mut pending = edits.edits();
    let mut next_edit = pending.next();

    while !cursor.at_eof() {
        while let Some(edit) = next_edit {
            let range = edit.range();

            if cursor.pos() == range.start {
                // skip source bytes until the end of the edit range
                while cursor.pos() != range.end {
                    cursor.advance();

                    if cursor.at_eof() || cursor.pos() > range.end {
                        return Err(RewriteError::MissingEndLocation(range.end));
                    }
                }

                out.write_all(edit.replacement().as_bytes())?;
                next_edit = pending.next();
            } else if cursor.pos() > range.start {
                // the recorded start position never occurred in the input
                return Err(RewriteError::MissingStartLocation(range.start));
            } else {
                break;
            }
        }

        if let Some(byte) = cursor.current() {
            out.write_all(&[byte])?;
        }
        cursor.advance();
    }

    // every remaining edit names a position the input never reached
    if let Some(edit) = next_edit {
        return Err(RewriteError::MissingStartLocation(edit.range().start));
    }

    Ok(())
}

/// Rewrite `input` and collect the result into a `String`
pub fn rewrite_to_string(edits: &FileEdits, input: &str) -> Result<String, RewriteError> {
    let mut buf = Vec::with_capacity(input.len());
    rewrite(edits, input, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
