//! Where `print` output goes
//!
//! The command-line front end writes straight to stdout; library callers
//! and tests capture into a buffer.

#[derive(Debug, Clone, Default)]
pub enum PrintHandler {
    /// Write each line to stdout as it is printed
    #[default]
    Stdout,

    /// Capture lines into a string
    Buffer(String),

    /// Discard output
    Silent,
}

impl PrintHandler {
    pub fn buffer() -> Self {
        PrintHandler::Buffer(String::new())
    }

    pub fn println(&mut self, line: &str) {
        match self {
            PrintHandler::Stdout => println!("{line}"),
            PrintHandler::Buffer(buf) => {
                buf.push_str(line);
                buf.push('\n');
            }
            PrintHandler::Silent => {}
        }
    }

    /// Captured text; empty unless buffering
    pub fn get_output(&self) -> &str {
        match self {
            PrintHandler::Buffer(buf) => buf,
            PrintHandler::Stdout | PrintHandler::Silent => "",
        }
    }
}
