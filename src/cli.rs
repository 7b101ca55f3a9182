//! One-shot subcommands for scripting admin work.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::RefreshOutcome;
use crate::config::Config;
use crate::notice::board::NoticeBoard;
use crate::notice::client::NoticeClient;
use crate::notice::draft::{format_size, load_attachment, load_draft};
use crate::notice::html;
use crate::notice::types::{Department, Notice, NoticeDraft, NoticeId};
use crate::session::SessionStore;
use crate::ui::renderfns::format_date;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List notices, newest first
  List {
    /// Only this department (plus notices addressed to all)
    #[arg(short, long)]
    department: Option<Department>,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
  },
  /// Show one notice
  Show { id: String },
  /// Notice counts per department
  Departments,
  /// Sign in as an admin and remember the session
  Login {
    /// Defaults to api.username from the config
    #[arg(short, long)]
    username: Option<String>,
  },
  /// Forget the stored session
  Logout,
  /// Publish a notice from a YAML draft
  Create {
    #[arg(short, long)]
    file: PathBuf,
    /// Files to attach (repeatable)
    #[arg(short, long)]
    attach: Vec<PathBuf>,
  },
  /// Replace a notice with the content of a YAML draft
  Update {
    id: String,
    #[arg(short, long)]
    file: PathBuf,
    #[arg(short, long)]
    attach: Vec<PathBuf>,
  },
  Delete { id: String },
  /// Make a notice the featured one
  Feature { id: String },
  /// Check that the service is reachable
  Health,
}

pub async fn run(
  command: Command,
  config: &Config,
  client: NoticeClient,
  sessions: &SessionStore,
) -> Result<()> {
  let board = NoticeBoard::new(Arc::new(client));

  match command {
    Command::List { department, json } => {
      let notices = load(&board).await?;
      let notices: Vec<&Notice> = notices
        .iter()
        .filter(|n| department.map_or(true, |d| n.applies_to(d)))
        .collect();
      if json {
        println!("{}", serde_json::to_string_pretty(&notices)?);
      } else if notices.is_empty() {
        println!("No notices found.");
      } else {
        for notice in notices {
          println!("{}", list_line(notice));
        }
      }
    }
    Command::Show { id } => {
      let notice = board.get(&NoticeId::new(id)).await?;
      print!("{}", detail_text(&notice));
    }
    Command::Departments => {
      load(&board).await?;
      for (dept, count) in board.cache().department_counts() {
        println!("{:<18}{:>4}", dept.label(), count);
      }
    }
    Command::Login { username } => {
      let username = username
        .or_else(|| config.api.username.clone())
        .ok_or_else(|| eyre!("No username given. Use --username or set api.username"))?;
      let password = match Config::get_password() {
        Some(password) => password,
        None => {
          eprint!("Password for {}: ", username);
          read_password(std::io::stdin().lock())?
        }
      };

      let session = board.store().login(&username, &password).await?;
      sessions.save(&config.api.url, &session.username, &session.token)?;
      println!("Logged in as {}", session.username);
    }
    Command::Logout => {
      board.store().logout();
      if sessions.clear(&config.api.url)? {
        println!("Logged out");
      } else {
        println!("Not logged in");
      }
    }
    Command::Create { file, attach } => {
      let draft = draft_with_attachments(&file, &attach)?;
      let notice = board.create(&draft).await?;
      println!("Created notice {} ({})", notice.id, notice.title);
    }
    Command::Update { id, file, attach } => {
      let draft = draft_with_attachments(&file, &attach)?;
      let notice = board.update(&NoticeId::new(id), &draft).await?;
      println!("Updated notice {} ({})", notice.id, notice.title);
    }
    Command::Delete { id } => {
      let id = NoticeId::new(id);
      board.delete(&id).await?;
      println!("Deleted notice {}", id);
    }
    Command::Feature { id } => {
      let notice = board.set_featured(&NoticeId::new(id)).await?;
      println!("Featured notice {} ({})", notice.id, notice.title);
    }
    Command::Health => {
      let status = board.store().health().await?;
      println!("{}: {}", config.api.url, status);
    }
  }

  Ok(())
}

/// Fill the cache, failing loudly where the UI would show a stale list
async fn load(board: &NoticeBoard<NoticeClient>) -> Result<Vec<Notice>> {
  match board.load().await {
    RefreshOutcome::Failed(error) => Err(eyre!(error)),
    _ => Ok(board.cache().items()),
  }
}

fn draft_with_attachments(file: &Path, attach: &[PathBuf]) -> Result<NoticeDraft> {
  let mut draft = load_draft(file)?;
  for path in attach {
    draft.attachments.push(load_attachment(path)?);
  }
  Ok(draft)
}

/// First line of `input`, without the line ending
fn read_password(mut input: impl BufRead) -> Result<String> {
  let mut line = String::new();
  input
    .read_line(&mut line)
    .map_err(|e| eyre!("Failed to read password: {}", e))?;
  let password = line.trim_end_matches(['\r', '\n']).to_string();
  if password.is_empty() {
    return Err(eyre!("No password given"));
  }
  Ok(password)
}

fn list_line(notice: &Notice) -> String {
  format!(
    "{} {:<8} {:<12} {:<17} {}",
    if notice.is_featured { "*" } else { " " },
    notice.id,
    format_date(notice.date),
    notice.department.label(),
    notice.title
  )
}

fn detail_text(notice: &Notice) -> String {
  let mut out = format!(
    "{}\n{} | {}{}\nSubject: {}\n\n{}\n",
    notice.title,
    notice.department.label(),
    format_date(notice.date),
    if notice.is_featured { " | featured" } else { "" },
    notice.subject,
    html::to_plain_text(&notice.body),
  );
  if !notice.attachments.is_empty() {
    out.push_str("\nAttachments:\n");
    for attachment in &notice.attachments {
      out.push_str(&format!(
        "  {} ({}, {})\n",
        attachment.name,
        attachment.mime_type,
        format_size(attachment.size_bytes)
      ));
    }
  }
  out
}
