use super::InputChannel;
use crate::Result;
use std::io::{self, BufRead, BufReader, Write};

/// Terminal stand-in for the microphone and speaker
pub struct TextMic {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    keyword: String,
}

impl TextMic {
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>, keyword: &str) -> Self {
        Self {
            input,
            output,
            keyword: keyword.to_uppercase(),
        }
    }

    /// Read from stdin, answer on `output`
    pub fn from_stdin(output: Box<dyn Write>, keyword: &str) -> Self {
        Self::new(Box::new(BufReader::new(io::stdin())), output, keyword)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        write!(self.output, "YOU: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl InputChannel for TextMic {
    fn listen(&mut self) -> Result<Option<Vec<String>>> {
        Ok(self.read_line()?.map(|line| {
            if line.is_empty() {
                Vec::new()
            } else {
                vec![line]
            }
        }))
    }

    fn active_listen(&mut self) -> Result<Vec<String>> {
        Ok(self
            .read_line()?
            .filter(|line| !line.is_empty())
            .into_iter()
            .collect())
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}: {}", self.keyword, text)?;
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Cursor;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_prompt_and_reply() {
        let out = SharedOutput::default();
        let mut mic = TextMic::new(
            Box::new(Cursor::new("  hello  \n\nyes\n")),
            Box::new(out.clone()),
            "naomi",
        );
        assert_eq!(mic.listen().unwrap(), Some(vec!["hello".to_string()]));
        assert_eq!(mic.listen().unwrap(), Some(Vec::new()));
        assert_eq!(mic.active_listen().unwrap(), vec!["yes".to_string()]);
        mic.say("Hi there").unwrap();
        assert_eq!(mic.listen().unwrap(), None);
        assert!(mic.active_listen().unwrap().is_empty());

        let printed = String::from_utf8(out.0.lock().clone()).unwrap();
        assert!(printed.starts_with("YOU: "));
        assert!(printed.contains("NAOMI: Hi there\n"));
    }
}
