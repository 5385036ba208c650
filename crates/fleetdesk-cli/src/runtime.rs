// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fleetdesk_app::rules::value_text;
use fleetdesk_app::{FieldType, InputOutcome, RecordId};
use fleetdesk_engine::{ManagementScreen, Notice, NoticeLevel, ScreenError};
use serde_json::Value;
use std::io::Write;

/// One `field=value` pair from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub field: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search {
        query: String,
    },
    Create {
        assignments: Vec<Assignment>,
    },
    /// `position` is the 1-based row of the search results to edit.
    Edit {
        query: String,
        position: usize,
        assignments: Vec<Assignment>,
    },
    Deactivate {
        id: RecordId,
    },
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((verb, rest)) = args.split_first() else {
            bail!("missing command -- use one of: search, create, edit, deactivate");
        };

        match verb.as_str() {
            "search" => match rest {
                [query] => Ok(Self::Search {
                    query: query.clone(),
                }),
                _ => bail!("usage: search <query>"),
            },
            "create" => Ok(Self::Create {
                assignments: parse_assignments(rest)?,
            }),
            "edit" => {
                let [query, position, assignments @ ..] = rest else {
                    bail!("usage: edit <query> <n> field=value...");
                };
                let position: usize = position
                    .parse()
                    .ok()
                    .filter(|position| *position > 0)
                    .ok_or_else(|| {
                        anyhow!("invalid result number {position:?} -- use 1 for the first row")
                    })?;
                Ok(Self::Edit {
                    query: query.clone(),
                    position,
                    assignments: parse_assignments(assignments)?,
                })
            }
            "deactivate" => match rest {
                [id] => Ok(Self::Deactivate { id: parse_id(id)? }),
                _ => bail!("usage: deactivate <id>"),
            },
            other => {
                bail!("unknown command {other:?} -- use one of: search, create, edit, deactivate")
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Create { .. } => "create",
            Self::Edit { .. } => "edit",
            Self::Deactivate { .. } => "deactivate",
        }
    }
}

fn parse_assignments(args: &[String]) -> Result<Vec<Assignment>> {
    args.iter()
        .map(|arg| {
            let (field, raw) = arg.split_once('=').ok_or_else(|| {
                anyhow!("invalid assignment {arg:?} -- write it as field=value")
            })?;
            if field.trim().is_empty() {
                bail!("invalid assignment {arg:?} -- the field name is empty");
            }
            Ok(Assignment {
                field: field.trim().to_owned(),
                raw: raw.to_owned(),
            })
        })
        .collect()
}

fn parse_id(raw: &str) -> Result<RecordId> {
    let value = match raw.parse::<i64>() {
        Ok(number) => Value::from(number),
        Err(_) => Value::from(raw),
    };
    RecordId::from_value(&value).ok_or_else(|| anyhow!("invalid record id {raw:?}"))
}

/// Runs `command` against an opened screen, writing results and notices to
/// `out`. Screen failures come back as errors after their notices are shown.
pub fn execute(
    screen: &mut ManagementScreen<'_>,
    command: &Command,
    out: &mut dyn Write,
) -> Result<()> {
    let result = dispatch(screen, command, out);
    print_notices(screen.take_notices(), out)?;
    if let Err(error) = &result
        && let Some(ScreenError::Validation { errors }) = error.downcast_ref::<ScreenError>()
    {
        for (field, message) in errors.fields() {
            writeln!(out, "  {field}: {message}")?;
        }
    }
    result.with_context(|| format!("{} {} failed", screen.config().entity_name, command.name()))
}

fn dispatch(
    screen: &mut ManagementScreen<'_>,
    command: &Command,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Search { query } => {
            screen.open_edit();
            run_search(screen, query, out)?;
            screen.cancel();
        }
        Command::Create { assignments } => {
            screen.open_new();
            apply(screen, assignments)?;
            screen.save()?;
        }
        Command::Edit {
            query,
            position,
            assignments,
        } => {
            screen.open_edit();
            let found = run_search(screen, query, out)?;
            if *position > found {
                bail!("result {position} does not exist -- the search returned {found} row(s)");
            }
            let id = screen
                .select(position - 1)
                .ok_or_else(|| anyhow!("result {position} has no id and cannot be edited"))?;
            log::debug!("editing {} {id}", screen.config().entity_name);
            apply(screen, assignments)?;
            screen.save()?;
        }
        Command::Deactivate { id } => {
            screen.deactivate(id)?;
        }
    }
    Ok(())
}

fn run_search(screen: &mut ManagementScreen<'_>, query: &str, out: &mut dyn Write) -> Result<usize> {
    let found = screen.search(query)?;
    if found == 0 {
        writeln!(out, "sin resultados para {query:?}")?;
    }
    for (row, label) in screen.result_labels().iter().enumerate() {
        writeln!(out, "{:>3}  {label}", row + 1)?;
    }
    Ok(found)
}

fn apply(screen: &mut ManagementScreen<'_>, assignments: &[Assignment]) -> Result<()> {
    for assignment in assignments {
        let value = coerce(screen, &assignment.field, &assignment.raw);
        match screen.input(&assignment.field, value) {
            InputOutcome::Committed => {}
            InputOutcome::Rejected => bail!(
                "{:?} is not accepted for {} -- check the value's format",
                assignment.raw,
                assignment.field
            ),
            InputOutcome::UnknownField => {
                let known: Vec<&str> = screen
                    .config()
                    .initial_data
                    .keys()
                    .map(String::as_str)
                    .collect();
                bail!(
                    "{} has no field {:?} -- use one of: {}",
                    screen.config().entity_name,
                    assignment.field,
                    known.join(", ")
                );
            }
        }
    }
    Ok(())
}

/// Converts command-line text into the JSON shape the field holds: numbers
/// for number inputs, booleans for checkboxes and the option's own value for
/// selects. Anything else stays a string.
fn coerce(screen: &ManagementScreen<'_>, field: &str, raw: &str) -> Value {
    let Some(descriptor) = screen.config().field(field) else {
        return Value::from(raw);
    };

    match descriptor.field_type {
        FieldType::Number => raw
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
            })
            .unwrap_or_else(|| Value::from(raw)),
        FieldType::Checkbox => match raw.to_ascii_lowercase().as_str() {
            "true" | "si" | "sí" | "1" => Value::Bool(true),
            "false" | "no" | "0" => Value::Bool(false),
            _ => Value::from(raw),
        },
        FieldType::Select => screen
            .strategy()
            .form()
            .config
            .options_for(field)
            .and_then(|options| {
                options
                    .iter()
                    .find(|option| value_text(&option.value) == raw)
            })
            .map(|option| option.value.clone())
            .unwrap_or_else(|| Value::from(raw)),
        _ => Value::from(raw),
    }
}

fn print_notices(notices: Vec<Notice>, out: &mut dyn Write) -> Result<()> {
    for notice in notices {
        match notice.level {
            NoticeLevel::Success => writeln!(out, "{}", notice.message)?,
            level => writeln!(out, "{}: {}", level.as_str(), notice.message)?,
        }
    }
    Ok(())
}
