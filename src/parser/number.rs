//! Number scanning shared by the path, points and transform grammars

use crate::error::ParseError;

/// Byte cursor over an attribute value
///
/// Numbers may be separated by whitespace or commas, or not at all when the
/// next number starts with a sign or a second decimal point.
pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    /// Next character, for error messages
    pub(crate) fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    pub(crate) fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    pub(crate) fn at_end(&mut self) -> bool {
        self.skip_separators();
        self.pos >= self.src.len()
    }

    pub(crate) fn skip_separators(&mut self) {
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_whitespace() || b == b',')
        {
            self.pos += 1;
        }
    }

    /// Whether the next non-separator byte can start a number
    pub(crate) fn starts_number(&mut self) -> bool {
        self.skip_separators();
        self.peek()
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+'))
    }

    /// Scan one number
    pub(crate) fn number(&mut self) -> Result<f64, ParseError> {
        self.skip_separators();
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let mut end = start;

        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let int_digits = count_digits(bytes, end);
        end += int_digits;
        let mut frac_digits = 0;
        if bytes.get(end) == Some(&b'.') {
            frac_digits = count_digits(bytes, end + 1);
            if int_digits > 0 || frac_digits > 0 {
                end += 1 + frac_digits;
            }
        }
        if int_digits == 0 && frac_digits == 0 {
            return Err(self.invalid_number(start));
        }
        // Exponent only when digits follow, so `2e` leaves the `e` unread
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_digits = count_digits(bytes, exp);
            if exp_digits > 0 {
                end = exp + exp_digits;
            }
        }

        let text = &self.src[start..end];
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                self.pos = end;
                Ok(value)
            }
            _ => Err(ParseError::InvalidNumber {
                position: start,
                token: text.to_string(),
            }),
        }
    }

    /// Scan an arc flag: a single `0` or `1`, separators optional
    pub(crate) fn flag(&mut self) -> Result<bool, ParseError> {
        self.skip_separators();
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(ParseError::InvalidFlag {
                position: self.pos,
                found: self.peek_char().unwrap_or(' '),
            }),
        }
    }

    fn invalid_number(&self, start: usize) -> ParseError {
        let token: String = self.src[start..].chars().take(1).collect();
        ParseError::InvalidNumber {
            position: start,
            token,
        }
    }
}

fn count_digits(bytes: &[u8], from: usize) -> usize {
    bytes
        .get(from..)
        .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
}

/// Read a whole list of numbers (`points`, transform arguments)
///
/// Stops at the first invalid token, returning what was read so far and the
/// error.
pub(crate) fn number_list(src: &str) -> (Vec<f64>, Option<ParseError>) {
    let mut cursor = Cursor::new(src);
    let mut values = Vec::new();
    while !cursor.at_end() {
        match cursor.number() {
            Ok(v) => values.push(v),
            Err(err) => return (values, Some(err)),
        }
    }
    (values, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(src: &str) -> Vec<f64> {
        let (values, err) = number_list(src);
        assert_eq!(err, None, "unexpected error for {:?}", src);
        values
    }

    #[test]
    fn test_separators() {
        assert_eq!(numbers("1, 2 ,3\t4\n5"), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_implicit_separators() {
        assert_eq!(numbers("1.5-2"), vec![1.5, -2.0]);
        assert_eq!(numbers("1.5.5"), vec![1.5, 0.5]);
        assert_eq!(numbers("-.5+.25"), vec![-0.5, 0.25]);
    }

    #[test]
    fn test_exponents() {
        assert_eq!(numbers("1e-3 2E2 3e+1"), vec![0.001, 200.0, 30.0]);
    }

    #[test]
    fn test_dangling_exponent_is_not_consumed() {
        let mut cursor = Cursor::new("2e");
        assert_eq!(cursor.number(), Ok(2.0));
        assert_eq!(cursor.peek(), Some(b'e'));
    }

    #[test]
    fn test_invalid_number_reports_position() {
        let (values, err) = number_list("1 2 x");
        assert_eq!(values, vec![1.0, 2.0]);
        assert_eq!(err.and_then(|e| e.position()), Some(4));
    }

    #[test]
    fn test_lone_sign_is_invalid() {
        let mut cursor = Cursor::new("- 3");
        assert!(cursor.number().is_err());
    }

    #[test]
    fn test_flags_without_separators() {
        let mut cursor = Cursor::new("011");
        assert_eq!(cursor.flag(), Ok(false));
        assert_eq!(cursor.flag(), Ok(true));
        assert_eq!(cursor.flag(), Ok(true));
        assert!(cursor.flag().is_err());
    }
}
