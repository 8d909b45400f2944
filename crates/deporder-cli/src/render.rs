//! Fragment concatenation around each ordered source.
//!
//! Plain style:
//!
//! ```text
//!
//! # START name
//! # from /abs/path/name
//! <content>
//!
//! # END name
//! ```
//!
//! Timed style additionally wraps the content in `{ echo -n name; time ( ... ) }`
//! so a sourced shell script reports how long each fragment took.
//! Consecutive fragments are separated by a blank line.

use std::io::{self, Read, Write};
use std::path::Path;

use deporder_core::ErrorCode;
use deporder_core::config::RenderStyle;

/// Which side of a fragment copy failed.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot read fragment")]
    Read(#[source] io::Error),

    #[error("{code}: cannot write output", code = ErrorCode::RenderFailed)]
    Write(#[source] io::Error),
}

impl RenderError {
    /// Only output-side failures carry a code; read failures belong to the
    /// source.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Read(_) => None,
            Self::Write(_) => Some(ErrorCode::RenderFailed),
        }
    }
}

pub struct Compiler<W: Write> {
    style: RenderStyle,
    out: W,
    written: usize,
}

impl<W: Write> Compiler<W> {
    pub const fn new(style: RenderStyle, out: W) -> Self {
        Self {
            style,
            out,
            written: 0,
        }
    }

    /// Number of fragments written so far.
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Write one fragment: header, the raw content, footer.
    ///
    /// # Errors
    ///
    /// [`RenderError::Read`] if `content` fails, [`RenderError::Write`] if the
    /// output does.
    pub fn fragment(
        &mut self,
        name: &str,
        path: &Path,
        content: &mut dyn Read,
    ) -> Result<(), RenderError> {
        let mut body = Vec::new();
        content.read_to_end(&mut body).map_err(RenderError::Read)?;
        self.write_fragment(name, path, &body).map_err(RenderError::Write)?;
        self.written += 1;
        Ok(())
    }

    fn write_fragment(&mut self, name: &str, path: &Path, body: &[u8]) -> io::Result<()> {
        if self.written > 0 {
            writeln!(self.out)?;
        }

        write!(self.out, "\n# START {name}\n# from {}\n", path.display())?;
        if self.style == RenderStyle::Timed {
            writeln!(self.out, "{{ echo -n {name}; time (")?;
        }

        self.out.write_all(body)?;

        if self.style == RenderStyle::Timed {
            write!(self.out, "\n) }}")?;
        }
        write!(self.out, "\n# END {name}\n")
    }

    /// Flush and hand back the writer.
    ///
    /// # Errors
    ///
    /// [`RenderError::Write`] if the flush fails.
    pub fn finish(mut self) -> Result<W, RenderError> {
        self.out.flush().map_err(RenderError::Write)?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(style: RenderStyle, fragments: &[(&str, &str)]) -> String {
        let mut compiler = Compiler::new(style, Vec::new());
        for (name, body) in fragments {
            compiler
                .fragment(name, &Path::new("/src").join(name), &mut body.as_bytes())
                .expect("write to vec");
        }
        String::from_utf8(compiler.finish().expect("flush")).expect("utf8")
    }

    #[test]
    fn plain_fragment_layout() {
        let rendered = render(RenderStyle::Plain, &[("a", "echo a\n")]);
        assert_eq!(rendered, "\n# START a\n# from /src/a\necho a\n\n# END a\n");
    }

    #[test]
    fn fragments_are_separated_by_blank_line() {
        let rendered = render(RenderStyle::Plain, &[("a", "1"), ("b", "2")]);
        assert_eq!(
            rendered,
            "\n# START a\n# from /src/a\n1\n# END a\n\n\n# START b\n# from /src/b\n2\n# END b\n"
        );
    }

    #[test]
    fn timed_fragment_wraps_content() {
        let rendered = render(RenderStyle::Timed, &[("a", "sleep 1\n")]);
        assert_eq!(
            rendered,
            "\n# START a\n# from /src/a\n{ echo -n a; time (\nsleep 1\n\n) }\n# END a\n"
        );
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn source_read_failure_has_no_code() {
        let mut compiler = Compiler::new(RenderStyle::Plain, Vec::new());
        let err = compiler
            .fragment("a", Path::new("/a"), &mut Broken)
            .expect_err("read fails");
        assert!(matches!(err, RenderError::Read(_)));
        assert_eq!(err.code(), None);
        assert_eq!(compiler.written(), 0);
    }

    #[test]
    fn output_write_failure_is_render_failed() {
        let mut compiler = Compiler::new(RenderStyle::Plain, Broken);
        let err = compiler
            .fragment("a", Path::new("/a"), &mut "x".as_bytes())
            .expect_err("write fails");
        assert!(matches!(err, RenderError::Write(_)));
        assert_eq!(err.code(), Some(ErrorCode::RenderFailed));
        assert!(err.to_string().starts_with("E5001"));
    }

    #[test]
    fn counts_written_fragments() {
        let mut compiler = Compiler::new(RenderStyle::Plain, Vec::new());
        assert_eq!(compiler.written(), 0);
        compiler
            .fragment("x", Path::new("/x"), &mut "".as_bytes())
            .expect("write");
        assert_eq!(compiler.written(), 1);
    }
}
