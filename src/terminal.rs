//! Mock terminal emulator
//!
//! A finite table of canned responses keyed by the exact lowercased
//! command string. No process is ever executed; the pane is an
//! append-only list of lines the front-end paints verbatim.

use crate::view::Tone;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionType {
    Ssh,
    Docker,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Ssh => write!(f, "SSH"),
            ConnectionType::Docker => write!(f, "DOCKER"),
        }
    }
}

impl From<&str> for ConnectionType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "docker" => ConnectionType::Docker,
            _ => ConnectionType::Ssh,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TerminalLine {
    pub text: String,
    pub tone: Tone,
}

impl TerminalLine {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

enum CommandOutcome {
    Lines(Vec<TerminalLine>),
    Clear,
}

/// One simulated connection to a lab server. Dropping the session is
/// the disconnect: history and pane go with it.
#[derive(Clone, Debug)]
pub struct TerminalSession {
    server: String,
    connection: ConnectionType,
    prompt: String,
    history: Vec<String>,
    output: Vec<TerminalLine>,
}

impl TerminalSession {
    pub fn connect(server: &str, connection: ConnectionType) -> Self {
        let output = vec![
            TerminalLine::new(
                format!("Connected to server {} via {}", server, connection),
                Tone::Success,
            ),
            TerminalLine::new(format!("Type: {} | Status: Online", connection), Tone::Info),
            TerminalLine::new("Type commands below or use 'help' for help", Tone::Info),
        ];

        Self {
            server: server.to_string(),
            connection,
            prompt: format!("{}$", server),
            history: Vec::new(),
            output,
        }
    }

    /// Custom connection form: `user@host:port`.
    pub fn connect_custom(user: &str, host: &str, port: u16, connection: ConnectionType) -> Self {
        Self::connect(&format!("{}@{}:{}", user, host, port), connection)
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn connection(&self) -> ConnectionType {
        self.connection
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn output(&self) -> &[TerminalLine] {
        &self.output
    }

    /// Run one input line: echo it, append the canned response, record
    /// it in history. Blank input is ignored.
    pub fn execute(&mut self, command: &str) {
        let command = command.trim();
        if command.is_empty() {
            return;
        }

        self.history.push(command.to_string());
        self.output.push(TerminalLine::new(
            format!("{} {}", self.prompt, command),
            Tone::Neutral,
        ));

        match interpret(command) {
            CommandOutcome::Clear => self.clear(),
            CommandOutcome::Lines(lines) => self.output.extend(lines),
        }
    }

    /// Empty the pane down to the cleared banner.
    pub fn clear(&mut self) {
        self.output = vec![TerminalLine::new("Terminal cleared", Tone::Success)];
    }
}

fn interpret(command: &str) -> CommandOutcome {
    let cmd = command.to_lowercase();

    match cmd.as_str() {
        "help" => CommandOutcome::Lines(info_block(&[
            "Available commands:",
            "- ls: list files",
            "- pwd: current directory",
            "- whoami: current user",
            "- docker ps: list containers",
            "- docker images: list images",
            "- clear: clear terminal",
            "- help: show this help",
        ])),
        "ls" | "ls -la" => CommandOutcome::Lines(plain_block(&[
            "drwxr-xr-x  5 user user 4096 Jan 19 10:30 .",
            "drwxr-xr-x 25 user user 4096 Jan 18 15:20 ..",
            "-rw-r--r--  1 user user  220 Jan 10 09:15 .bash_logout",
            "-rw-r--r--  1 user user 3526 Jan 10 09:15 .bashrc",
            "drwxr-xr-x  3 user user 4096 Jan 15 14:30 docker",
            "-rw-r--r--  1 user user  807 Jan 10 09:15 .profile",
        ])),
        "pwd" => CommandOutcome::Lines(plain_block(&["/home/user"])),
        "whoami" => CommandOutcome::Lines(plain_block(&["user"])),
        "docker ps" => CommandOutcome::Lines(plain_block(&[
            "CONTAINER ID   IMAGE                 COMMAND                  STATUS         PORTS",
            "a1b2c3d4e5f6   portainer/portainer   \"portainer\"              Up 2 hours     0.0.0.0:9000->9000/tcp",
            "f6e5d4c3b2a1   jenkins/jenkins       \"/sbin/tini -- /usr/…\"   Up 3 hours     0.0.0.0:8081->8080/tcp",
            "b2a1f6e5d4c3   sonarqube:latest      \"bin/run.sh bin/sona…\"   Up 4 hours     0.0.0.0:9001->9000/tcp",
        ])),
        "docker images" => CommandOutcome::Lines(plain_block(&[
            "REPOSITORY            TAG       IMAGE ID       CREATED        SIZE",
            "portainer/portainer   latest    abc123def456   2 weeks ago    294MB",
            "jenkins/jenkins       latest    def456abc123   3 weeks ago    441MB",
            "sonarqube             latest    123abc456def   1 month ago    567MB",
        ])),
        "clear" => CommandOutcome::Clear,
        _ => CommandOutcome::Lines(vec![TerminalLine::new(
            format!("bash: {}: command not found", command),
            Tone::Warning,
        )]),
    }
}

fn plain_block(lines: &[&str]) -> Vec<TerminalLine> {
    lines
        .iter()
        .map(|line| TerminalLine::new(*line, Tone::Neutral))
        .collect()
}

fn info_block(lines: &[&str]) -> Vec<TerminalLine> {
    lines
        .iter()
        .map(|line| TerminalLine::new(*line, Tone::Info))
        .collect()
}
