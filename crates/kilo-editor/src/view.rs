//! View: lays the line store out on the screen, one frame at a time.
//!
//! Row `y` of the screen shows line `y` of the store, cut at the screen
//! width. There is no scrolling: the first `rows` lines are all that is ever
//! visible. Rows with no line behind them show the placeholder glyph.
//!
//! An empty store gets the welcome banner, centered on the row one third of
//! the way down:
//!
//! ```text
//! |
//! |
//! |               Kilo Editor -- Version 0.0.1
//! |
//! ```

use kilo_term::output::Frame;
use kilo_term::terminal::Size;

use crate::buffer::LineStore;
use crate::options::Options;

/// Draw every row of the screen into `frame`.
///
/// Each row is terminated with an erase-to-end-of-line, and every row but
/// the last with `\r\n`, so nothing from the previous frame survives.
pub fn draw_rows(frame: &mut Frame, store: &impl LineStore, size: Size, options: &Options) {
    let cols = usize::from(size.cols);
    let banner_row = usize::from(size.rows / 3);
    let empty = store.is_empty();

    for y in 0..usize::from(size.rows) {
        if let Some(line) = store.line(y) {
            frame.push_bytes(&line[..line.len().min(cols)]);
        } else if empty && y == banner_row {
            draw_banner(frame, options.welcome.as_bytes(), cols, options.placeholder);
        } else {
            frame.push_bytes(&[options.placeholder]);
        }
        frame.end_row(y + 1 == usize::from(size.rows));
    }
}

/// The welcome text, centered in `cols`, led by the placeholder glyph when
/// there is room to pad.
fn draw_banner(frame: &mut Frame, text: &[u8], cols: usize, placeholder: u8) {
    let text = &text[..text.len().min(cols)];
    let mut padding = (cols - text.len()) / 2;
    if padding > 0 {
        frame.push_bytes(&[placeholder]);
        padding -= 1;
    }
    frame.push_repeated(b' ', padding);
    frame.push_bytes(text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use pretty_assertions::assert_eq;

    const PREAMBLE: &[u8] = b"\x1b[?25l\x1b[H";

    /// Render `store` and split the body back into rows (without `\x1b[K`).
    fn render(store: &Buffer, rows: u16, cols: u16, options: &Options) -> Vec<String> {
        let mut frame = Frame::begin();
        draw_rows(&mut frame, store, Size::new(rows, cols).unwrap(), options);
        let body = &frame.as_bytes()[PREAMBLE.len()..];
        let text = String::from_utf8_lossy(body).into_owned();
        let text = text.strip_suffix("\x1b[K").expect("last row erased");
        text.split("\x1b[K\r\n").map(str::to_owned).collect()
    }

    fn opts(welcome: &str) -> Options {
        Options {
            welcome: welcome.to_owned(),
            ..Options::default()
        }
    }

    // -- Empty store --------------------------------------------------------

    #[test]
    fn empty_24x80_banner_on_row_8() {
        let options = Options::default();
        let rows = render(&Buffer::new(), 24, 80, &options);
        assert_eq!(rows.len(), 24);

        let len = options.welcome.len();
        let padding = (80 - len) / 2;
        let expected = format!("|{}{}", " ".repeat(padding - 1), options.welcome);
        assert_eq!(rows[8], expected);

        for (y, row) in rows.iter().enumerate() {
            if y != 8 {
                assert_eq!(row, "|", "row {y}");
            }
        }
    }

    #[test]
    fn banner_truncated_to_width() {
        let rows = render(&Buffer::new(), 3, 5, &opts("Hello World"));
        assert_eq!(rows, vec!["|", "Hello", "|"]);
    }

    #[test]
    fn banner_with_one_spare_column_has_no_glyph() {
        // (5 - 4) / 2 == 0: no room for the glyph.
        let rows = render(&Buffer::new(), 1, 5, &opts("abcd"));
        assert_eq!(rows, vec!["abcd"]);
    }

    #[test]
    fn banner_with_two_spare_columns_is_just_the_glyph() {
        let rows = render(&Buffer::new(), 1, 6, &opts("abcd"));
        assert_eq!(rows, vec!["|abcd"]);
    }

    #[test]
    fn single_row_terminal_has_no_crlf() {
        let mut frame = Frame::begin();
        draw_rows(&mut frame, &Buffer::new(), Size::new(1, 10).unwrap(), &opts("hi"));
        assert!(!frame.as_bytes().windows(2).any(|w| w == b"\r\n"));
        assert!(frame.as_bytes().ends_with(b"\x1b[K"));
    }

    #[test]
    fn custom_placeholder() {
        let options = Options {
            placeholder: b'~',
            ..opts("x")
        };
        let rows = render(&Buffer::new(), 4, 10, &options);
        assert_eq!(rows[0], "~");
        assert_eq!(rows[1], "~   x");
    }

    // -- File contents ------------------------------------------------------

    #[test]
    fn lines_then_placeholders_and_no_banner() {
        let buf = Buffer::from_bytes(b"first\nsecond\n");
        let rows = render(&buf, 6, 80, &Options::default());
        assert_eq!(rows, vec!["first", "second", "|", "|", "|", "|"]);
    }

    #[test]
    fn long_lines_cut_at_width() {
        let buf = Buffer::from_bytes(b"0123456789\nab");
        let rows = render(&buf, 2, 4, &Options::default());
        assert_eq!(rows, vec!["0123", "ab"]);
    }

    #[test]
    fn lines_past_the_screen_are_not_drawn() {
        let buf = Buffer::from_bytes(b"a\nb\nc\nd");
        let rows = render(&buf, 2, 10, &Options::default());
        assert_eq!(rows, vec!["a", "b"]);
    }

    #[test]
    fn blank_file_line_is_blank_not_placeholder() {
        let buf = Buffer::from_bytes(b"\nx");
        let rows = render(&buf, 3, 10, &Options::default());
        assert_eq!(rows, vec!["", "x", "|"]);
    }
}
