/// One parsed request line: uppercase name token plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    /// Tokenizes on whitespace. The name match is case-insensitive, so the
    /// stored name is uppercased; arguments keep their original case.
    /// Returns `None` for blank lines.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?.to_uppercase();
        let args = tokens.map(str::to_string).collect();
        Some(Self { name, args })
    }
}
