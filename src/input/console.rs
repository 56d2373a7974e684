//! Line-oriented console commands.
//!
//! The console mirrors the two buttons so the ranger can be driven over a
//! serial monitor or a terminal:
//!
//! - `set` - press the set button
//! - `enter` - press the enter button
//! - `status` - print the current status snapshot
//! - `help` - show available commands
//!
//! On the host two more commands move the simulated peer:
//!
//! - `move <meters>` - place the peer at a new distance
//! - `peer on|off` - bring the peer online or take it away

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// The "set" button.
    Set,
    /// The "enter" button.
    Enter,
    /// Print status.
    Status,
    /// Print help.
    Help,
    /// Move the simulated peer.
    Move { meters: f32 },
    /// Switch the simulated peer on or off.
    Peer { online: bool },
    /// Unknown or invalid command, with a message for the operator.
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse one input line.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Self::Unknown(String::new());
        }

        let mut parts = input.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("").trim();

        match cmd.to_lowercase().as_str() {
            "set" | "next" => Self::Set,
            "enter" | "ok" => Self::Enter,
            "status" | "stat" | "s" => Self::Status,
            "help" | "h" | "?" => Self::Help,
            "move" | "m" => match args.parse::<f32>() {
                Ok(meters) if meters.is_finite() && meters >= 0.0 => Self::Move { meters },
                _ => Self::Unknown("Usage: move <meters>".to_string()),
            },
            "peer" => match args.to_lowercase().as_str() {
                "on" | "up" => Self::Peer { online: true },
                "off" | "down" => Self::Peer { online: false },
                _ => Self::Unknown("Usage: peer on|off".to_string()),
            },
            _ => Self::Unknown(format!(
                "Unknown command: {}. Type 'help' for commands.",
                cmd
            )),
        }
    }
}

/// Help text for available commands.
pub const HELP_TEXT: &str = r#"
Available commands:
  set                Cycle mode / start or abort calibration
  enter              Lock mode / apply calibration
  status             Show mode, RSSI, distance and link health
  help               Show this help

Simulated peer (host only):
  move <meters>      Place the peer at a new distance
  peer on|off        Bring the peer online or take it away

Shortcuts: s=status, h=help, m=move
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_buttons() {
        assert_eq!(ConsoleCommand::parse("set"), ConsoleCommand::Set);
        assert_eq!(ConsoleCommand::parse("  ENTER "), ConsoleCommand::Enter);
        assert_eq!(ConsoleCommand::parse("next"), ConsoleCommand::Set);
    }

    #[test]
    fn test_parse_status_help() {
        assert_eq!(ConsoleCommand::parse("s"), ConsoleCommand::Status);
        assert_eq!(ConsoleCommand::parse("status"), ConsoleCommand::Status);
        assert_eq!(ConsoleCommand::parse("?"), ConsoleCommand::Help);
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(
            ConsoleCommand::parse("move 2.5"),
            ConsoleCommand::Move { meters: 2.5 }
        );
        assert!(matches!(
            ConsoleCommand::parse("move"),
            ConsoleCommand::Unknown(_)
        ));
        assert!(matches!(
            ConsoleCommand::parse("move -1"),
            ConsoleCommand::Unknown(_)
        ));
        assert!(matches!(
            ConsoleCommand::parse("move far"),
            ConsoleCommand::Unknown(_)
        ));
    }

    #[test]
    fn test_parse_peer() {
        assert_eq!(
            ConsoleCommand::parse("peer off"),
            ConsoleCommand::Peer { online: false }
        );
        assert_eq!(
            ConsoleCommand::parse("peer ON"),
            ConsoleCommand::Peer { online: true }
        );
        assert!(matches!(
            ConsoleCommand::parse("peer maybe"),
            ConsoleCommand::Unknown(_)
        ));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            ConsoleCommand::parse(""),
            ConsoleCommand::Unknown(String::new())
        );
        match ConsoleCommand::parse("launch") {
            ConsoleCommand::Unknown(msg) => assert!(msg.contains("launch")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
