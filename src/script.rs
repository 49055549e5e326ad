//! Readers for the bulk-file helpers: SQL scripts for `execute_file` and
//! comma-separated rows for `insert_file`.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read a SQL script into individual statements.
///
/// One statement per logical line: `--` and `/* ... */` comments are
/// stripped, a trailing `\` continues the statement on the next line
/// (joined with a single space), a literal `\n` becomes a real newline,
/// and an optional trailing `;` is dropped.
pub(crate) fn read_statements(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening sql script {}", path.display()))?;
    parse_statements(BufReader::new(file))
        .with_context(|| format!("reading sql script {}", path.display()))
}

pub(crate) fn parse_statements<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut statements = Vec::new();
    let mut pending = String::new();
    let mut in_comment = false;

    for line in reader.lines() {
        let mut line = line?;
        if in_comment {
            match line.find("*/") {
                Some(end) => {
                    line = line[end + 2..].to_string();
                    in_comment = false;
                }
                None => continue,
            }
        }
        line = strip_comments(&line, &mut in_comment);

        let line = line.trim();
        if let Some(continued) = line.strip_suffix('\\') {
            // Continued lines join with exactly one space.
            pending.push_str(continued.trim_end());
            pending.push(' ');
            continue;
        }
        pending.push_str(line);

        let mut statement = pending.trim().to_string();
        if let Some(stripped) = statement.strip_suffix(';') {
            statement = stripped.trim_end().to_string();
        }
        if !statement.is_empty() {
            statements.push(statement.replace("\\n", "\n"));
        }
        pending.clear();
    }
    Ok(statements)
}

/// Remove `--` and `/* ... */` comments from one line, flagging an unclosed
/// block comment.
fn strip_comments(line: &str, in_comment: &mut bool) -> String {
    let mut line = line.to_string();
    while let Some(start) = line.find("/*") {
        match line[start + 2..].find("*/") {
            Some(end) => {
                line.replace_range(start..start + 2 + end + 2, "");
            }
            None => {
                line.truncate(start);
                *in_comment = true;
                break;
            }
        }
    }
    if let Some(dash) = line.find("--") {
        line.truncate(dash);
    }
    line
}

/// One row of values from a comma-separated file.
pub(crate) type CsvRow = Vec<String>;

/// Read a comma-separated bulk-insert file.
///
/// The first non-empty line is the list of column names; each further
/// non-empty line is one row of values. `\` line continuation and literal
/// `\n` replacement behave as in SQL scripts. Every row must have one value
/// per column.
pub(crate) fn read_csv_rows(path: &Path) -> Result<(Vec<String>, Vec<CsvRow>)> {
    let file = File::open(path).with_context(|| format!("opening data file {}", path.display()))?;
    parse_csv_rows(BufReader::new(file))
        .with_context(|| format!("reading data file {}", path.display()))
}

pub(crate) fn parse_csv_rows<R: BufRead>(reader: R) -> Result<(Vec<String>, Vec<CsvRow>)> {
    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    let mut pending = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if let Some(continued) = line.strip_suffix('\\') {
            pending.push_str(continued.trim_end());
            pending.push(' ');
            continue;
        }
        pending.push_str(line);
        let pending_row = pending.trim();

        if !pending_row.is_empty() {
            let fields: Vec<String> = pending_row
                .split(',')
                .map(|f| f.trim().replace("\\n", "\n"))
                .collect();
            if columns.is_empty() {
                columns = fields;
            } else {
                if fields.len() != columns.len() {
                    bail!(
                        "row has {} values, expected {}",
                        fields.len(),
                        columns.len()
                    );
                }
                rows.push(fields);
            }
        }
        pending.clear();
    }
    if columns.is_empty() {
        bail!("no column header line");
    }
    Ok((columns, rows))
}
