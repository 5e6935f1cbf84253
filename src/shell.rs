//! Command-backed collaborators so the binary can drive a project's own
//! tooling (e.g. a framework console) without linking an ORM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;

use crate::drivers::process::{CommandRunner, CommandSpec};
use crate::drivers::selector::ConnectionParams;
use crate::error::Operation;
use crate::session::{FixtureLoader, OrmSession};

/// Runs `<command> <fixture>...` and treats each non-empty stdout line as one
/// hydrated object.
pub struct ShellFixtureLoader {
    runner: Arc<dyn CommandRunner>,
    command: Option<String>,
}

impl ShellFixtureLoader {
    pub fn new(runner: Arc<dyn CommandRunner>, command: Option<String>) -> Self {
        Self { runner, command }
    }
}

impl FixtureLoader for ShellFixtureLoader {
    fn load(&mut self, fixtures: &[PathBuf]) -> anyhow::Result<Vec<String>> {
        let command = self
            .command
            .as_deref()
            .ok_or_else(|| anyhow!("no `load_fixtures_command` configured"))?;
        let mut line = command.to_string();
        for fixture in fixtures {
            let path = fixture.to_string_lossy();
            let quoted = shlex::try_quote(&path)
                .map_err(|e| anyhow!("cannot pass fixture {} to the shell: {}", fixture.display(), e))?;
            line.push(' ');
            line.push_str(&quoted);
        }
        let stdout = self.runner.run(Operation::LoadFixtures, &CommandSpec::shell(&line))?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

/// Session stand-in for out-of-process ORMs. Only `purge` does work.
pub struct ShellSession {
    runner: Arc<dyn CommandRunner>,
    connection: ConnectionParams,
    purge_command: Option<String>,
}

impl ShellSession {
    pub fn new(runner: Arc<dyn CommandRunner>, connection: ConnectionParams, purge_command: Option<String>) -> Self {
        Self { runner, connection, purge_command }
    }
}

impl OrmSession for ShellSession {
    fn connection(&self) -> &ConnectionParams {
        &self.connection
    }

    fn clear(&mut self) {}

    fn purge(&mut self) -> anyhow::Result<()> {
        if let Some(command) = &self.purge_command {
            self.runner.run(Operation::Purge, &CommandSpec::shell(command))?;
        }
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
