//! Headless match runner.
//!
//! [`HeadlessRunner`] owns one [`Simulation`] and answers protocol lines
//! synchronously: each input line is fully handled (commands applied, steps
//! run) before the next one is read. Time only advances on `step`, so a
//! controller can think as long as it likes between ticks.

use std::io::{BufRead, Write};

use rts_core::rules::GameRules;
use rts_core::simulation::Simulation;

use crate::error::Result;
use crate::protocol::{Command, Response};

/// Headless runner configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Output state after every `step` (vs only on `query`).
    pub auto_state_output: bool,
    /// Map and opponent seed.
    pub seed: u64,
    /// Let the scripted policy also play the player side.
    pub scripted_player: bool,
    /// Rules for the session.
    pub rules: GameRules,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            auto_state_output: false,
            seed: 0,
            scripted_player: false,
            rules: GameRules::default(),
        }
    }
}

/// Headless runner for externally controlled matches.
#[derive(Debug)]
pub struct HeadlessRunner {
    sim: Simulation,
    config: HeadlessConfig,
    game_over_sent: bool,
    quit: bool,
}

impl HeadlessRunner {
    /// Start a fresh session from the configuration.
    pub fn new(config: HeadlessConfig) -> Result<Self> {
        let mut sim = Simulation::new(config.rules.clone(), config.seed)?;
        if config.scripted_player {
            sim = sim.with_scripted_player(config.seed);
        }
        Ok(Self::with_simulation(sim, config))
    }

    /// Drive an existing simulation.
    pub fn with_simulation(sim: Simulation, config: HeadlessConfig) -> Self {
        Self {
            sim,
            config,
            game_over_sent: false,
            quit: false,
        }
    }

    /// The driven simulation.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Whether a `quit` command has been handled.
    pub fn is_finished(&self) -> bool {
        self.quit
    }

    /// Run the protocol loop until `quit` or end of input.
    ///
    /// Writes `ready` first and `bye` last; every response is flushed as soon
    /// as its line is handled.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        tracing::info!(seed = self.config.seed, "Headless session started");
        write_response(&mut output, &Response::ready(self.sim.tick()))?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            for response in self.handle_line(line) {
                write_response(&mut output, &response)?;
            }
            if self.quit {
                break;
            }
        }

        if !self.quit {
            tracing::debug!("Input closed without quit");
            write_response(&mut output, &Response::Bye)?;
        }
        tracing::info!(tick = self.sim.tick(), "Headless session ended");
        Ok(())
    }

    /// Parse and handle one protocol line.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        match Command::from_json(line) {
            Ok(cmd) => self.handle(&cmd),
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable command line");
                vec![Response::error(format!("Parse error: {e}"), None)]
            }
        }
    }

    /// Handle one parsed command.
    pub fn handle(&mut self, cmd: &Command) -> Vec<Response> {
        let name = cmd.name();
        tracing::debug!(cmd = name, "Handling command");

        if let Some((faction, player_cmd)) = cmd.to_player_command() {
            let outcome = self.sim.apply_command(faction, &player_cmd);
            return vec![Response::outcome(name, outcome)];
        }

        match cmd {
            Command::Step { count } => self.step(*count),
            Command::Query => vec![self.state()],
            Command::Summary => vec![Response::Summary {
                summary: self.sim.summary(),
            }],
            Command::Hash => vec![Response::StateHash {
                tick: self.sim.tick(),
                hash: self.sim.state_hash(),
            }],
            Command::Quit => {
                self.quit = true;
                vec![Response::Bye]
            }
            _ => vec![Response::error("Unhandled command", Some(name))],
        }
    }

    fn step(&mut self, count: u32) -> Vec<Response> {
        let mut events = Vec::new();
        for _ in 0..count {
            events.extend(self.sim.step().events);
        }

        let mut responses = vec![Response::Stepped {
            tick: self.sim.tick(),
            events,
            outcome: self.sim.outcome(),
        }];
        if self.config.auto_state_output {
            responses.push(self.state());
        }

        let outcome = self.sim.outcome();
        if outcome.is_decided() && !self.game_over_sent {
            self.game_over_sent = true;
            responses.push(Response::game_over(outcome, self.sim.tick()));
        }
        responses
    }

    fn state(&self) -> Response {
        Response::State {
            hash: self.sim.state_hash(),
            outcome: self.sim.outcome(),
            world: self.sim.snapshot(),
        }
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> Result<()> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()?;
    Ok(())
}
