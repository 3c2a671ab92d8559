//! Line-oriented front end over a backend
//!
//! Parses one command per line, runs it against the [`RecordStore`]
//! contract and answers with a status plus a JSON body. Statuses map onto
//! the HTTP codes a web facade would use (200, 204, 400, 404, 422, 500).
//!
//! ```text
//! > add 1 title=Pyotr Pervy value=tsar
//! 204 {"message":"Record 1 created"}
//! > get 1
//! 200 {"id":1,"title":"Pyotr Pervy","value":"tsar"}
//! ```

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::storage::{Outcome, RecordId, RecordStore, Template};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

pub const HELP: &str = "\
commands:
  get <id>                       show one record
  list [page]                    all records, or one page of 10
  pages                          number of pages
  add <id> name=value ...        create a record (missing fields are empty)
  update <id> name=value ...     replace a record's fields
  delete <id>                    remove a record
  search <text>                  records whose first field contains text
  cache                          cached entries, least recent first
  help                           this text
  quit                           leave the shell";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get(RecordId),
    List(Option<usize>),
    Pages,
    Add(RecordId, Vec<(String, String)>),
    Update(RecordId, Vec<(String, String)>),
    Delete(RecordId),
    Search(String),
    Cache,
    Help,
    Quit,
}

impl Command {
    /// Parse one line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();

        let command = match word {
            "get" => Command::Get(parse_id(args.next())?),
            "list" => match args.next() {
                Some(page) => Command::List(Some(page.parse().map_err(|_| {
                    Error::InvalidArgument(format!("invalid page '{}'", page))
                })?)),
                None => Command::List(None),
            },
            "pages" => Command::Pages,
            "add" => Command::Add(parse_id(args.next())?, parse_fields(args)?),
            "update" => Command::Update(parse_id(args.next())?, parse_fields(args)?),
            "delete" => Command::Delete(parse_id(args.next())?),
            "search" => Command::Search(rest.to_string()),
            "cache" => Command::Cache,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(Error::InvalidArgument(format!("unknown command '{}'", other)));
            }
        };
        Ok(Some(command))
    }
}

/// Positive integer id
fn parse_id(token: Option<&str>) -> Result<RecordId> {
    let token = token.ok_or_else(|| Error::InvalidArgument("missing id".to_string()))?;
    match token.parse::<RecordId>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(Error::InvalidArgument(format!("invalid id '{}'", token))),
    }
}

/// `name=value` tokens; bare tokens continue the previous value
fn parse_fields<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Vec<(String, String)>> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for token in tokens {
        match token.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                pairs.push((name.to_string(), value.to_string()));
            }
            _ => match pairs.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(token);
                }
                None => {
                    return Err(Error::InvalidArgument(format!(
                        "expected name=value, got '{}'",
                        token
                    )));
                }
            },
        }
    }
    Ok(pairs)
}

/// Reply status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Created,
    NotFound,
    Conflict,
    BadRequest,
    Error,
}

impl Status {
    /// Equivalent HTTP status code
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 204,
            Status::NotFound => 404,
            Status::Conflict => 422,
            Status::BadRequest => 400,
            Status::Error => 500,
        }
    }
}

/// Answer to one command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub status: Status,
    pub body: Value,
}

impl Reply {
    fn new(status: Status, body: Value) -> Self {
        Self { status, body }
    }

    fn message(status: Status, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "message": message.into() }))
    }

    fn from_error(err: Error) -> Self {
        let status = match err {
            Error::InvalidArgument(_) | Error::OutOfRange { .. } => Status::BadRequest,
            _ => Status::Error,
        };
        Self::new(status, json!({ "error": err.to_string() }))
    }

    /// `<code> <json>` as printed by the shell
    pub fn render(&self) -> String {
        format!("{} {}", self.status.code(), self.body)
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Serialization(e.to_string()))
}

/// Run one command against the backend
pub async fn execute(backend: &Backend, template: &Template, command: Command) -> Reply {
    debug!(?command, "Executing command");
    match dispatch(backend, template, command).await {
        Ok(reply) => reply,
        Err(err) => {
            if !matches!(err, Error::InvalidArgument(_) | Error::OutOfRange { .. }) {
                error!(%err, "Command failed");
            }
            Reply::from_error(err)
        }
    }
}

async fn dispatch(backend: &Backend, template: &Template, command: Command) -> Result<Reply> {
    let reply = match command {
        Command::Get(id) => match backend.get(id).await? {
            Some(record) => Reply::new(Status::Ok, to_body(&record)?),
            None => Reply::message(Status::NotFound, format!("No record with id={}", id)),
        },
        Command::List(page) => {
            let records = match page {
                Some(page) => backend.list_paginated(page).await?,
                None => backend.list().await?,
            };
            if records.is_empty() {
                Reply::message(Status::NotFound, "No records")
            } else {
                Reply::new(Status::Ok, to_body(&records)?)
            }
        }
        Command::Pages => Reply::new(Status::Ok, json!({ "pages": backend.page_count().await? })),
        Command::Add(id, pairs) => match backend.add(template.record(id, pairs)?).await? {
            Outcome::Success => Reply::message(Status::Created, format!("Record {} created", id)),
            _ => Reply::message(Status::Conflict, format!("Record {} already exists", id)),
        },
        Command::Update(id, pairs) => match backend.update(template.record(id, pairs)?).await? {
            Outcome::Success => Reply::message(Status::Created, format!("Record {} updated", id)),
            _ => Reply::message(Status::NotFound, format!("No record with id={}", id)),
        },
        Command::Delete(id) => match backend.delete(id).await? {
            Outcome::Success => Reply::message(Status::Created, format!("Record {} deleted", id)),
            _ => Reply::message(Status::NotFound, format!("No record with id={}", id)),
        },
        Command::Search(query) => Reply::new(Status::Ok, to_body(&backend.search(&query).await?)?),
        Command::Cache => match backend.cache() {
            Some(cache) => {
                let stats = cache.cache_stats();
                let ids: Vec<RecordId> = cache.cache_index().into_iter().map(|(id, _)| id).collect();
                Reply::new(
                    Status::Ok,
                    json!({
                        "entries": ids,
                        "hits": stats.hits,
                        "misses": stats.misses,
                        "evictions": stats.evictions,
                        "capacity": stats.capacity,
                    }),
                )
            }
            None => Reply::message(Status::NotFound, "No cache configured"),
        },
        Command::Help => Reply::message(Status::Ok, HELP),
        Command::Quit => Reply::message(Status::Ok, "bye"),
    };
    Ok(reply)
}

/// Read commands until EOF or `quit`, writing one rendered reply per command
pub async fn run<R, W>(backend: &Backend, template: &Template, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let reply = match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => execute(backend, template, command).await,
            Err(err) => Reply::from_error(err),
        };
        writer.write_all(reply.render().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
