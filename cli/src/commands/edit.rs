//! Interactive form editing
//!
//! Reads field edits from stdin, one per line, using the same syntax as the
//! `fields` subcommands. The draft is auto-saved in the background and
//! written to the saved forms on `save`.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use formwright_core::{AutoSaver, FormBuilder, FormRepository};

use super::fields::{self, FieldEdit};
use super::find_form;

#[derive(Parser)]
#[command(name = "edit", no_binary_name = true)]
struct EditLine {
    #[command(subcommand)]
    command: EditCommand,
}

#[derive(Subcommand)]
enum EditCommand {
    #[command(flatten)]
    Field(FieldEdit),
    /// Rename the form
    Rename { name: String },
    /// List the fields
    Show,
    /// Save the form
    Save,
    /// Stop editing
    Quit,
}

pub async fn handle(
    form: Option<&str>,
    name: &str,
    repo: Arc<dyn FormRepository>,
    interval: Duration,
) -> anyhow::Result<()> {
    let mut builder = match form {
        Some(key) => FormBuilder::from_definition(repo.clone(), find_form(repo.as_ref(), key).await?),
        None => FormBuilder::new(repo.clone(), name),
    };
    let auto_saver = AutoSaver::new(repo, interval).spawn(builder.subscribe());
    println!(
        "Editing {:?}; auto-save every {}s. Type `help` for commands, `quit` to stop.",
        builder.draft().name(),
        interval.as_secs()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words = match split_words(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                continue;
            }
        };
        let command = match EditLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // clap renders help and usage errors itself
                let _ = e.print();
                continue;
            }
        };

        match command {
            EditCommand::Field(edit) => match fields::apply(&mut builder, edit) {
                Ok(summary) => {
                    println!("{} {}", "OK".green(), summary);
                    fields::warn_cycles(&builder);
                }
                Err(e) => eprintln!("{} {:#}", "error:".red().bold(), e),
            },
            EditCommand::Rename { name } => builder.rename(name),
            EditCommand::Show => {
                for (i, field) in builder.draft().fields().iter().enumerate() {
                    println!("{:>3}  {:<24} {}", i, field.label, field.field_type.to_string().dimmed());
                }
            }
            EditCommand::Save => match builder.save().await {
                Ok(()) => println!("{} Saved {}", "OK".green(), builder.draft().id()),
                Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
            },
            EditCommand::Quit => break,
        }
    }

    drop(builder);
    auto_saver.await?;
    Ok(())
}

/// Split a line on whitespace, keeping double-quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words(r#"derive "Line Total" "Unit Price * Qty""#).unwrap(),
            vec!["derive", "Line Total", "Unit Price * Qty"]
        );
        assert_eq!(split_words("  show  ").unwrap(), vec!["show"]);
        assert_eq!(split_words(r#"set Name --label """#).unwrap(), vec!["set", "Name", "--label", ""]);
        assert!(split_words(r#"rename "Oops"#).is_err());
    }

    #[test]
    fn test_edit_line_parses_field_edits() {
        let parsed = EditLine::try_parse_from(["add", "number", "--label", "Qty"]).unwrap();
        assert!(matches!(
            parsed.command,
            EditCommand::Field(FieldEdit::Add { ref label, .. }) if label.as_deref() == Some("Qty")
        ));
        assert!(matches!(EditLine::try_parse_from(["quit"]).unwrap().command, EditCommand::Quit));
        assert!(EditLine::try_parse_from(["launch"]).is_err());
    }
}
