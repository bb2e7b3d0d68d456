use crate::ir::{FlowBuilder, SankeyData};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^sankey(-beta)?\s*$").unwrap());
static INIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%%\{\s*init\s*:\s*(\{.*\})\s*\}%%").unwrap());

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: expected `source,target,value`, found {found} field(s)")]
    MalformedRow { line: usize, found: usize },
    #[error("line {line}: invalid flow value {value:?}")]
    InvalidValue { line: usize, value: String },
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
    #[error("input is not a sankey diagram")]
    MissingHeader,
    #[error("invalid JSON input: {0}")]
    Json(String),
}

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub data: SankeyData,
    pub init_config: Option<serde_json::Value>,
}

/// Reads either a JSON `{nodes, links}` document or Mermaid sankey text.
pub fn parse_input(input: &str) -> Result<ParseOutput, ParseError> {
    if input.trim_start().starts_with('{') {
        let data = serde_json::from_str::<SankeyData>(input)
            .map_err(|err| ParseError::Json(err.to_string()))?;
        return Ok(ParseOutput {
            data,
            init_config: None,
        });
    }
    parse_sankey(input)
}

/// Parses Mermaid sankey text: a `sankey-beta` header followed by
/// `source,target,value` rows. Nodes appear in first-mention order.
pub fn parse_sankey(input: &str) -> Result<ParseOutput, ParseError> {
    let mut output = ParseOutput::default();
    let mut flows = FlowBuilder::new();
    let mut seen_header = false;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = INIT_RE.captures(line) {
            if let Some(json_str) = caps.get(1).map(|m| m.as_str()) {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(json_str) {
                    output.init_config = Some(value);
                } else if let Ok(value) = json5::from_str::<serde_json::Value>(json_str) {
                    output.init_config = Some(value);
                }
            }
            continue;
        }
        if line.starts_with("%%") {
            continue;
        }
        if !seen_header {
            if HEADER_RE.is_match(line) {
                seen_header = true;
                continue;
            }
            return Err(ParseError::MissingHeader);
        }

        let fields = split_csv_row(line, line_no)?;
        if fields.len() != 3 {
            return Err(ParseError::MalformedRow {
                line: line_no,
                found: fields.len(),
            });
        }
        let value = fields[2]
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ParseError::InvalidValue {
                line: line_no,
                value: fields[2].clone(),
            })?;
        flows.push_flow(fields[0].trim(), fields[1].trim(), value);
    }

    if !seen_header {
        return Err(ParseError::MissingHeader);
    }
    output.data = flows.finish();
    Ok(output)
}

/// Splits one CSV row. Double-quoted fields may hold commas, and `""` inside
/// quotes stands for a literal quote.
fn split_csv_row(line: &str, line_no: usize) -> Result<Vec<String>, ParseError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
            continue;
        }
        match ch {
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if in_quotes {
        return Err(ParseError::UnterminatedQuote { line: line_no });
    }
    fields.push(current);
    Ok(fields)
}
