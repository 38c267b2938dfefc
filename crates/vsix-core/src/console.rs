//! Output sinks for command results.
//!
//! Commands never print directly. They write to a [`ConsoleSink`], which the
//! caller can point at stdout, a buffer, or a boundary protocol stream.

use std::io::Write;

pub trait ConsoleSink {
    fn write(&mut self, text: &str);
    fn write_line(&mut self, text: &str);
}

/// Writes to the process's stdout, flushing after partial lines.
#[derive(Debug, Default)]
pub struct StdoutConsole;

impl ConsoleSink for StdoutConsole {
    fn write(&mut self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn write_line(&mut self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", text);
    }
}

/// Collects output in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    buffer: String,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> &str {
        &self.buffer
    }

    pub fn lines(&self) -> Vec<&str> {
        self.buffer.lines().collect()
    }
}

impl ConsoleSink for BufferConsole {
    fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn write_line(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_console_collects_partial_lines() {
        let mut console = BufferConsole::new();
        console.write("Vs2015 Install ... ");
        console.write_line("Succeeded");
        console.write_line("");
        assert_eq!(console.contents(), "Vs2015 Install ... Succeeded\n\n");
        assert_eq!(console.lines(), vec!["Vs2015 Install ... Succeeded", ""]);
    }
}
