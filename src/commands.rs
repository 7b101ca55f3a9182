/// Command palette entries and autocomplete

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home"],
    description: "Featured notice and departments",
  },
  Command {
    name: "notices",
    aliases: &["n", "list", "circulars"],
    description: "Browse all notices",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Reload notices from the server",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit noticeboard",
  },
];

/// Suggestions for `input`, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();

  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut ranked: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &input).map(|r| (cmd, r)))
    .collect();

  // Stable, so ties keep palette order
  ranked.sort_by_key(|(_, r)| *r);
  ranked.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better; `None` means no match
fn rank(cmd: &Command, input: &str) -> Option<u32> {
  let aliases = cmd.aliases.iter();
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if aliases.clone().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if aliases.clone().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}
