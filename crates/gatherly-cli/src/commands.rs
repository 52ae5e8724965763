//! Command parsing and execution.
//!
//! Arguments are parsed by hand; every command maps onto one call into
//! `gatherly_core` followed by rendering of the result.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use tracing::warn;

use gatherly_core::{Gatherly, ItemKind, LocationPreference, Session, SessionData};

use crate::render;

pub const USAGE: &str = "\
Usage: gatherly <command>

  login <token> <user-id> [username]   store a session issued by the web sign-in
  logout                               forget the session
  events | places                      browse (saved items marked with *)
  recommended                          events recommended from your preferences
  saved [events|places]                list saved items
  save|unsave|toggle <event|place> <id>
  prefs                                show preferences
  prefs add-category <id> | remove-category <id>
  prefs add-location <lat> <lon> <name...> | remove-location <name...>
  prefs set <key> <json>
  education|work list [user-id]         defaults to the signed-in or last user
  education|work show <id>
  education|work delete <id> <user-id>";

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryResource {
    Education,
    Work,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    List { user_id: Option<i64> },
    Show { id: i64 },
    Delete { id: i64, user_id: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrefsAction {
    Show,
    AddCategory(i64),
    RemoveCategory(i64),
    AddLocation(LocationPreference),
    RemoveLocation(String),
    Set { key: String, value: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { token: String, user_id: i64, username: Option<String> },
    Logout,
    Events,
    Places,
    Recommended,
    Saved(Option<ItemKind>),
    Save(ItemKind, i64),
    Unsave(ItemKind, i64),
    Toggle(ItemKind, i64),
    Prefs(PrefsAction),
    History(HistoryResource, HistoryAction),
    Help,
}

fn parse_id(arg: Option<&String>, what: &str) -> Result<i64> {
    let raw = arg.ok_or_else(|| anyhow!("missing {}", what))?;
    raw.parse()
        .with_context(|| format!("{} must be a number, got '{}'", what, raw))
}

fn parse_kind(arg: Option<&String>) -> Result<ItemKind> {
    let raw = arg.ok_or_else(|| anyhow!("missing item kind (event or place)"))?;
    raw.parse().map_err(|e: String| anyhow!(e))
}

fn rest(args: &[String], from: usize, what: &str) -> Result<String> {
    let joined = args.get(from..).unwrap_or_default().join(" ");
    if joined.is_empty() {
        bail!("missing {}", what);
    }
    Ok(joined)
}

impl Command {
    /// Parse the arguments after the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some(first) = args.first() else {
            return Ok(Command::Help);
        };

        let command = match first.as_str() {
            "login" => Command::Login {
                token: args.get(1).cloned().ok_or_else(|| anyhow!("missing token"))?,
                user_id: parse_id(args.get(2), "user id")?,
                username: args.get(3).cloned(),
            },
            "logout" => Command::Logout,
            "events" => Command::Events,
            "places" => Command::Places,
            "recommended" => Command::Recommended,
            "saved" => Command::Saved(match args.get(1) {
                Some(_) => Some(parse_kind(args.get(1))?),
                None => None,
            }),
            "save" => Command::Save(parse_kind(args.get(1))?, parse_id(args.get(2), "id")?),
            "unsave" => Command::Unsave(parse_kind(args.get(1))?, parse_id(args.get(2), "id")?),
            "toggle" => Command::Toggle(parse_kind(args.get(1))?, parse_id(args.get(2), "id")?),
            "prefs" => Command::Prefs(Self::parse_prefs(args)?),
            "education" => Command::History(HistoryResource::Education, Self::parse_history(args)?),
            "work" => Command::History(HistoryResource::Work, Self::parse_history(args)?),
            "help" | "-h" | "--help" => Command::Help,
            other => bail!("unknown command '{}'\n\n{}", other, USAGE),
        };
        Ok(command)
    }

    fn parse_prefs(args: &[String]) -> Result<PrefsAction> {
        let action = match args.get(1).map(String::as_str) {
            None => PrefsAction::Show,
            Some("add-category") => PrefsAction::AddCategory(parse_id(args.get(2), "category id")?),
            Some("remove-category") => {
                PrefsAction::RemoveCategory(parse_id(args.get(2), "category id")?)
            }
            Some("add-location") => {
                let latitude = args.get(2).cloned().ok_or_else(|| anyhow!("missing latitude"))?;
                let longitude = args.get(3).cloned().ok_or_else(|| anyhow!("missing longitude"))?;
                PrefsAction::AddLocation(LocationPreference::new(
                    latitude,
                    longitude,
                    rest(args, 4, "location name")?,
                ))
            }
            Some("remove-location") => PrefsAction::RemoveLocation(rest(args, 2, "location name")?),
            Some("set") => {
                let key = args.get(2).cloned().ok_or_else(|| anyhow!("missing key"))?;
                let raw = rest(args, 3, "value")?;
                // Bare words are taken as strings
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                PrefsAction::Set { key, value }
            }
            Some(other) => bail!("unknown prefs action '{}'", other),
        };
        Ok(action)
    }

    fn parse_history(args: &[String]) -> Result<HistoryAction> {
        let action = match args.get(1).map(String::as_str) {
            Some("list") => HistoryAction::List {
                user_id: match args.get(2) {
                    Some(_) => Some(parse_id(args.get(2), "user id")?),
                    None => None,
                },
            },
            Some("show") => HistoryAction::Show {
                id: parse_id(args.get(2), "id")?,
            },
            Some("delete") => HistoryAction::Delete {
                id: parse_id(args.get(2), "id")?,
                user_id: parse_id(args.get(3), "user id")?,
            },
            Some(other) => bail!("unknown history action '{}'", other),
            None => bail!("missing history action (list, show or delete)"),
        };
        Ok(action)
    }
}

fn resolve_user(user_id: Option<i64>, default_user: Option<i64>) -> Result<i64> {
    user_id
        .or(default_user)
        .ok_or_else(|| anyhow!("missing user id (sign in or pass one)"))
}

/// Refresh the saved set so listings can mark saved items. A failure only
/// costs the markers; the listing itself is still shown.
async fn refresh_markers(app: &Gatherly, kind: ItemKind) {
    if !app.is_authenticated() {
        return;
    }
    if let Err(e) = app.saved().refresh(kind).await {
        warn!(kind = %kind, error = %e, "Could not load saved items, listing without markers");
    }
}

/// Run one command against the client, returning the text to print.
///
/// `default_user` fills in the user id of history listings when none is given.
pub async fn run(
    app: &Gatherly,
    session: &mut Session,
    command: Command,
    default_user: Option<i64>,
) -> Result<String> {
    let output = match command {
        Command::Help => USAGE.to_string(),
        Command::Login { token, user_id, username } => {
            let data = SessionData::new(token, user_id, username);
            session.update(data.clone());
            session.save().context("Failed to save session")?;
            app.sign_in(data);
            format!("Signed in as user {}", user_id)
        }
        Command::Logout => {
            session.clear().context("Failed to remove session")?;
            app.sign_out();
            "Signed out".to_string()
        }
        Command::Events => {
            let events = app.events().await?;
            refresh_markers(app, ItemKind::Event).await;
            render::events(&events, |id| app.saved().is_item_saved(id, ItemKind::Event))
        }
        Command::Places => {
            let places = app.places().await?;
            refresh_markers(app, ItemKind::Place).await;
            render::places(&places, |id| app.saved().is_item_saved(id, ItemKind::Place))
        }
        Command::Recommended => {
            let events = app.preferences().recommended_events().await?;
            render::events(&events, |_| false)
        }
        Command::Saved(kind) => {
            let mut sections = Vec::new();
            if kind != Some(ItemKind::Place) {
                sections.push(render::events(&app.saved().saved_events().await?, |_| true));
            }
            if kind != Some(ItemKind::Event) {
                sections.push(render::places(&app.saved().saved_places().await?, |_| true));
            }
            sections.join("\n\n")
        }
        Command::Save(kind, id) => {
            app.saved().save(id, kind).await?;
            format!("{} {}: {}", kind, id, render::save_state(app.saved().state(id, kind)))
        }
        Command::Unsave(kind, id) => {
            app.saved().unsave(id, kind).await?;
            format!("{} {}: {}", kind, id, render::save_state(app.saved().state(id, kind)))
        }
        Command::Toggle(kind, id) => {
            // Membership must be known before deciding which way to go
            app.saved().refresh(kind).await?;
            let state = app.saved().toggle_save(id, kind).await?;
            format!("{} {}: {}", kind, id, render::save_state(state))
        }
        Command::Prefs(action) => {
            let prefs = app.preferences();
            let updated = match action {
                PrefsAction::Show => prefs.load().await?,
                PrefsAction::AddCategory(id) => prefs.add_category_preference(id).await?,
                PrefsAction::RemoveCategory(id) => prefs.remove_category_preference(id).await?,
                PrefsAction::AddLocation(location) => prefs.add_location_preference(location).await?,
                PrefsAction::RemoveLocation(name) => prefs.remove_location_preference(&name).await?,
                PrefsAction::Set { key, value } => prefs.set_preference(&key, value).await?,
            };
            render::preferences(&updated)
        }
        Command::History(HistoryResource::Education, action) => match action {
            HistoryAction::List { user_id } => {
                let user_id = resolve_user(user_id, default_user)?;
                render::education(&app.education().list_by_user(user_id).await?)
            }
            HistoryAction::Show { id } => render::education(&[app.education().get_by_id(id).await?]),
            HistoryAction::Delete { id, user_id } => {
                app.education().delete(id, user_id).await?;
                format!("Deleted education record {}", id)
            }
        },
        Command::History(HistoryResource::Work, action) => match action {
            HistoryAction::List { user_id } => {
                let user_id = resolve_user(user_id, default_user)?;
                render::work(&app.work().list_by_user(user_id).await?)
            }
            HistoryAction::Show { id } => render::work(&[app.work().get_by_id(id).await?]),
            HistoryAction::Delete { id, user_id } => {
                app.work().delete(id, user_id).await?;
                format!("Deleted work record {}", id)
            }
        },
    };
    Ok(output)
}
