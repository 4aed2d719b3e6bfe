//! Path data (`d` attribute) interpreter
//!
//! Turns the SVG path mini-language into absolute [`PathSegment`]s. Relative
//! commands are resolved against the current point, shorthand curves get
//! their reflected control points, and every subpath begins with an
//! explicit `MoveTo`.

use super::number::Cursor;
use crate::error::ParseError;
use crate::model::geometry::{Point2, Vector2, approx_eq};
use crate::model::path::{ArcSegment, PathSegment};
use tracing::trace;

/// Parse path data into absolute segments
///
/// # Example
///
/// ```
/// use svg3d::parser::parse_path;
/// use svg3d::model::PathSegment;
///
/// let segments = parse_path("M0 0 h10 v10 z").unwrap();
/// assert!(matches!(segments.last(), Some(PathSegment::ClosePath)));
/// ```
pub fn parse_path(d: &str) -> Result<Vec<PathSegment>, ParseError> {
    let segments = PathInterpreter::new(d).run()?;
    trace!(segments = segments.len(), "parsed path data");
    Ok(segments)
}

/// Number of arguments in one group of each command
fn arity(command: u8) -> Option<usize> {
    match command.to_ascii_uppercase() {
        b'M' | b'L' | b'T' => Some(2),
        b'H' | b'V' => Some(1),
        b'C' => Some(6),
        b'S' | b'Q' => Some(4),
        b'A' => Some(7),
        b'Z' => Some(0),
        _ => None,
    }
}

struct PathInterpreter<'a> {
    cursor: Cursor<'a>,
    segments: Vec<PathSegment>,
    current: Point2,
    subpath_start: Point2,
    /// Second control point of the previous C/S, for S reflection
    last_cubic: Option<Point2>,
    /// Control point of the previous Q/T, for T reflection
    last_quad: Option<Point2>,
    /// Set after Z: the next drawing command opens a subpath at `current`
    reopen: bool,
}

impl<'a> PathInterpreter<'a> {
    fn new(d: &'a str) -> Self {
        Self {
            cursor: Cursor::new(d),
            segments: Vec::new(),
            current: Point2::origin(),
            subpath_start: Point2::origin(),
            last_cubic: None,
            last_quad: None,
            reopen: false,
        }
    }

    fn run(mut self) -> Result<Vec<PathSegment>, ParseError> {
        let mut command: Option<u8> = None;

        loop {
            self.cursor.skip_separators();
            let Some(byte) = self.cursor.peek() else {
                break;
            };
            let position = self.cursor.position();

            if byte.is_ascii_alphabetic() {
                if arity(byte).is_none() {
                    return Err(ParseError::UnknownCommand {
                        position,
                        command: self.cursor.peek_char().unwrap_or('?'),
                    });
                }
                if command.is_none() && !matches!(byte, b'M' | b'm') {
                    return Err(ParseError::MissingMoveTo {
                        position,
                        found: char::from(byte).to_string(),
                    });
                }
                self.cursor.advance();
                command = Some(self.execute(byte)?);
            } else if self.cursor.starts_number() {
                match command {
                    None => {
                        return Err(ParseError::MissingMoveTo {
                            position,
                            found: char::from(byte).to_string(),
                        });
                    }
                    // Numbers cannot follow a closepath
                    Some(b'Z' | b'z') => {
                        return Err(ParseError::UnknownCommand {
                            position,
                            command: char::from(byte),
                        });
                    }
                    Some(repeat) => command = Some(self.execute(repeat)?),
                }
            } else {
                return Err(ParseError::UnknownCommand {
                    position,
                    command: self.cursor.peek_char().unwrap_or('?'),
                });
            }
        }

        Ok(self.segments)
    }

    /// Run one argument group of `command`; returns the command an implicit
    /// repeat should use
    fn execute(&mut self, command: u8) -> Result<u8, ParseError> {
        let relative = command.is_ascii_lowercase();
        let mut cubic = None;
        let mut quad = None;

        match command.to_ascii_uppercase() {
            b'M' => {
                let p = self.point(command, relative)?;
                self.segments.push(PathSegment::MoveTo(p));
                self.current = p;
                self.subpath_start = p;
                self.reopen = false;
            }
            b'Z' => {
                self.close();
            }
            upper => {
                self.reopen_subpath();
                match upper {
                    b'L' => {
                        let p = self.point(command, relative)?;
                        self.line_to(p);
                    }
                    b'H' => {
                        let x = self.number(command)?;
                        let x = if relative { self.current.x + x } else { x };
                        self.line_to(Point2::new(x, self.current.y));
                    }
                    b'V' => {
                        let y = self.number(command)?;
                        let y = if relative { self.current.y + y } else { y };
                        self.line_to(Point2::new(self.current.x, y));
                    }
                    b'C' => {
                        let c1 = self.point(command, relative)?;
                        let c2 = self.point(command, relative)?;
                        let p1 = self.point(command, relative)?;
                        self.cubic_to(c1, c2, p1);
                        cubic = Some(c2);
                    }
                    b'S' => {
                        let c1 = reflect(self.last_cubic, self.current);
                        let c2 = self.point(command, relative)?;
                        let p1 = self.point(command, relative)?;
                        self.cubic_to(c1, c2, p1);
                        cubic = Some(c2);
                    }
                    b'Q' => {
                        let c = self.point(command, relative)?;
                        let p1 = self.point(command, relative)?;
                        self.quad_to(c, p1);
                        quad = Some(c);
                    }
                    b'T' => {
                        let c = reflect(self.last_quad, self.current);
                        let p1 = self.point(command, relative)?;
                        self.quad_to(c, p1);
                        quad = Some(c);
                    }
                    b'A' => self.arc(command, relative)?,
                    // arity() admits nothing else
                    _ => {}
                }
            }
        }

        self.last_cubic = cubic;
        self.last_quad = quad;

        Ok(match command {
            b'M' => b'L',
            b'm' => b'l',
            other => other,
        })
    }

    fn close(&mut self) {
        if self.reopen {
            return;
        }
        if !approx_eq(&self.current, &self.subpath_start) {
            self.segments.push(PathSegment::LineTo(self.subpath_start));
        }
        self.segments.push(PathSegment::ClosePath);
        self.current = self.subpath_start;
        self.reopen = true;
    }

    fn reopen_subpath(&mut self) {
        if self.reopen {
            self.segments.push(PathSegment::MoveTo(self.current));
            self.subpath_start = self.current;
            self.reopen = false;
        }
    }

    fn line_to(&mut self, p: Point2) {
        self.segments.push(PathSegment::LineTo(p));
        self.current = p;
    }

    fn cubic_to(&mut self, c1: Point2, c2: Point2, p1: Point2) {
        self.segments.push(PathSegment::CubicBezier {
            p0: self.current,
            c1,
            c2,
            p1,
        });
        self.current = p1;
    }

    fn quad_to(&mut self, c: Point2, p1: Point2) {
        self.segments.push(PathSegment::QuadraticBezier {
            p0: self.current,
            c,
            p1,
        });
        self.current = p1;
    }

    fn arc(&mut self, command: u8, relative: bool) -> Result<(), ParseError> {
        let rx = self.number(command)?;
        let ry = self.number(command)?;
        let rotation = self.number(command)?;
        let large_arc = self.flag(command)?;
        let sweep = self.flag(command)?;
        let end = self.point(command, relative)?;

        if approx_eq(&end, &self.current) {
            return Ok(());
        }
        if rx == 0.0 || ry == 0.0 {
            self.line_to(end);
            return Ok(());
        }
        let arc = ArcSegment::new(self.current, end, rx, ry, rotation, large_arc, sweep);
        self.segments.push(PathSegment::Arc(arc));
        self.current = end;
        Ok(())
    }

    fn point(&mut self, command: u8, relative: bool) -> Result<Point2, ParseError> {
        let x = self.number(command)?;
        let y = self.number(command)?;
        let p = Point2::new(x, y);
        Ok(if relative {
            self.current + Vector2::new(x, y)
        } else {
            p
        })
    }

    fn number(&mut self, command: u8) -> Result<f64, ParseError> {
        if self.cursor.at_end() || !self.cursor.starts_number() {
            return Err(self.missing_argument(command));
        }
        self.cursor.number()
    }

    fn flag(&mut self, command: u8) -> Result<bool, ParseError> {
        if self.cursor.at_end() {
            return Err(self.missing_argument(command));
        }
        self.cursor.flag()
    }

    fn missing_argument(&self, command: u8) -> ParseError {
        ParseError::MissingArgument {
            position: self.cursor.position(),
            command: char::from(command),
            expected: arity(command).unwrap_or(0),
        }
    }
}

/// Reflect `control` about `current`, or `current` itself when there is no
/// previous control point
fn reflect(control: Option<Point2>, current: Point2) -> Point2 {
    match control {
        Some(c) => current + (current - c),
        None => current,
    }
}
