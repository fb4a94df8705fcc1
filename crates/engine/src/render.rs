use crate::destination::DestinationFile;

/// Optional pretty-printer applied to rendered text
pub trait Formatter {
    /// Formatted text, or a description of why formatting failed
    fn format(&self, text: &str) -> std::result::Result<String, String>;
}

/// Serialize blocks back to text
pub fn render(file: &DestinationFile) -> String {
    let mut lines: Vec<&str> = Vec::with_capacity(file.blocks.len());
    for block in &file.blocks {
        if let Some(comment) = &block.comment {
            lines.push(comment);
        }
        lines.push(&block.text);
    }
    lines.join("\n")
}

/// Serialize and pass through `formatter`; formatting failures keep the raw text
pub fn render_with(file: &DestinationFile, formatter: Option<&dyn Formatter>) -> String {
    let text = render(file);
    let Some(formatter) = formatter else {
        return text;
    };

    match formatter.format(&text) {
        Ok(formatted) => formatted,
        Err(err) => {
            log::warn!("formatting failed, writing unformatted output: {err}");
            text
        }
    }
}
