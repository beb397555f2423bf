use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use djson::{DjsTokenizer, FormatRegistry, JsonFormat, Token, WriterOptions};
use is_terminal::IsTerminal;

/// Convert and reformat JSON and DJS documents.
///
/// djson reads a document from stdin or files and rewrites it in either
/// format. DJS is a JSON superset with comments, unquoted keys, and soft
/// delimiters; formatting metadata (blank lines, comments) survives the
/// conversion wherever the target format can express it.
#[derive(Parser, Debug)]
#[command(name = "djson")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file(s). If not specified, reads from stdin.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Output file. If not specified, writes to stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Input format. Defaults to the input file extension, or djs.
    #[arg(long, value_enum)]
    from: Option<FormatArg>,

    /// Output format. Defaults to the output file extension, or the
    /// input format.
    #[arg(long, value_enum)]
    to: Option<FormatArg>,

    /// Minify output (drop all whitespace and comments).
    #[arg(short, long)]
    compact: bool,

    /// Number of spaces per indentation level.
    #[arg(short, long, default_value = "2")]
    indent: usize,

    /// Cap on preserved consecutive blank lines.
    #[arg(long, default_value = "5")]
    max_spacing: i32,

    /// Write braces around the root object (DJS output only).
    #[arg(long)]
    root_braces: bool,

    /// Always quote keys (DJS output only).
    #[arg(long)]
    quote_keys: bool,

    /// Colorize output for the terminal (stdout only).
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorModeArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Json,
    Djs,
}

impl FormatArg {
    fn extension(self) -> &'static str {
        match self {
            FormatArg::Json => "json",
            FormatArg::Djs => "djs",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(FormatArg::Json),
            "djs" | "xjs" => Some(FormatArg::Djs),
            _ => None,
        }
    }

    fn writer_format(self, compact: bool) -> JsonFormat {
        match (self, compact) {
            (FormatArg::Json, true) => JsonFormat::Json,
            (FormatArg::Json, false) => JsonFormat::JsonFormatted,
            (FormatArg::Djs, true) => JsonFormat::Djs,
            (FormatArg::Djs, false) => JsonFormat::DjsFormatted,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorModeArg {
    Auto,
    Always,
    Never,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("djson: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = read_inputs(&args)?;

    let mut options = WriterOptions::default();
    options.indent = " ".repeat(args.indent);
    options.max_spacing = args.max_spacing;
    options.omit_root_braces = !args.root_braces;
    options.omit_quotes = !args.quote_keys;

    let to = output_format(&args);
    let registry = FormatRegistry::new();
    let mut rendered = Vec::new();
    for (path, source) in &inputs {
        let from = input_format(&args, path.as_deref());
        let value = registry
            .parse(from.extension(), source)
            .map_err(|e| match path {
                Some(p) => format!("{}: {}", p.display(), e),
                None => e.to_string(),
            })?;
        let mut text = djson::stringify(&value, to.writer_format(args.compact), &options)?;
        if !text.ends_with('\n') {
            text.push('\n');
        }
        rendered.push(text);
    }
    let output = rendered.concat();

    let output = if args.output.is_none() && should_colorize(args.color) {
        colorize(&output)
    } else {
        output
    };

    match args.output {
        Some(path) => fs::write(&path, &output)
            .map_err(|e| format!("cannot write '{}': {}", path.display(), e))?,
        None => io::stdout().write_all(output.as_bytes())?,
    }
    Ok(())
}

fn read_inputs(args: &Args) -> Result<Vec<(Option<PathBuf>, String)>, Box<dyn std::error::Error>> {
    if args.files.is_empty() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(vec![(None, buffer)]);
    }
    let mut inputs = Vec::new();
    for path in &args.files {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        inputs.push((Some(path.clone()), content));
    }
    Ok(inputs)
}

fn input_format(args: &Args, path: Option<&Path>) -> FormatArg {
    if let Some(format) = args.from {
        return format;
    }
    path.and_then(|p| FormatArg::from_extension(&djson::file_extension(p)))
        .unwrap_or(FormatArg::Djs)
}

fn output_format(args: &Args) -> FormatArg {
    if let Some(format) = args.to {
        return format;
    }
    if let Some(path) = &args.output {
        if let Some(format) = FormatArg::from_extension(&djson::file_extension(path)) {
            return format;
        }
    }
    input_format(args, args.files.first().map(PathBuf::as_path))
}

fn should_colorize(mode: ColorModeArg) -> bool {
    match mode {
        ColorModeArg::Auto => io::stdout().is_terminal(),
        ColorModeArg::Always => true,
        ColorModeArg::Never => false,
    }
}

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEY: &str = "\x1b[94m";
const COLOR_STRING: &str = "\x1b[32m";
const COLOR_NUMBER: &str = "\x1b[36m";
const COLOR_LITERAL: &str = "\x1b[35m";
const COLOR_PUNCT: &str = "\x1b[2m";
const COLOR_COMMENT: &str = "\x1b[90m";

/// Colorizes rendered output by lexing it with the DJS tokenizer and
/// painting each token span. Text that fails to lex is returned as-is.
fn colorize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let stream = DjsTokenizer::stream(text);
    if stream.read_to_end().is_err() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut cursor = stream.cursor();
    let mut pos = 0usize;
    loop {
        let token = match cursor.next() {
            Ok(Some(token)) => token,
            Ok(None) => break,
            Err(_) => return text.to_string(),
        };
        let span = token.span();
        out.extend(&chars[pos..span.start.min(chars.len())]);
        let slice: String = chars[span.start..span.end.min(chars.len())].iter().collect();
        let is_key = matches!(
            &token,
            Token::Word { .. } | Token::Str { .. } | Token::Number { .. }
        ) && matches!(cursor.peek(1), Ok(Some(ref next)) if next.is_symbol(':'));
        let color = match &token {
            _ if is_key => Some(COLOR_KEY),
            Token::Str { .. } => Some(COLOR_STRING),
            Token::Number { .. } => Some(COLOR_NUMBER),
            Token::Word { .. } => Some(COLOR_LITERAL),
            Token::Comment { .. } => Some(COLOR_COMMENT),
            Token::Symbol { .. } => Some(COLOR_PUNCT),
            Token::Break { .. } | Token::Stream(_) => None,
        };
        match color {
            Some(color) => {
                out.push_str(color);
                out.push_str(&slice);
                out.push_str(COLOR_RESET);
            }
            None => out.push_str(&slice),
        }
        pos = span.end;
    }
    out.extend(&chars[pos.min(chars.len())..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_highlights_tokens() {
        let input = "key: [1, 'two', true] // done\n";
        let output = colorize(input);

        assert!(output.contains(&format!("{COLOR_KEY}key{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_NUMBER}1{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_STRING}'two'{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_LITERAL}true{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_COMMENT}// done{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_PUNCT}[{COLOR_RESET}")));
    }

    #[test]
    fn colorize_leaves_invalid_text_unchanged() {
        let input = "'unterminated";
        assert_eq!(input, colorize(input));
    }

    #[test]
    fn output_format_follows_output_extension() {
        let args = Args::parse_from(["djson", "in.djs", "-o", "out.json"]);
        assert_eq!(FormatArg::Json, output_format(&args));
    }

    #[test]
    fn output_format_defaults_to_input_format() {
        let args = Args::parse_from(["djson", "in.json"]);
        assert_eq!(FormatArg::Json, output_format(&args));
    }
}
