//! Diagnostic reporting and decision transport.
//!
//! Two independent, fire-and-forget outputs:
//!
//! - a per-inference score table for a human diagnostic sink, emitted
//!   through `tracing`
//! - a per-decision textual token submitted to a byte-oriented transport
//!   (typically a serial link), best-effort with no acknowledgment
//!
//! Neither path feeds back into classification; transport failures are
//! logged and swallowed.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use mudra_core::{CategorySet, Error, GestureDecision, Result};

/// One row of a per-inference score table
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub label: String,
    pub percent: i32,
    pub score: f32,
}

/// Full per-inference score table with the winning row marked
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    pub top_index: usize,
    pub entries: Vec<ScoreEntry>,
}

impl ScoreTable {
    pub fn new(
        categories: &CategorySet,
        percentages: &[i32],
        scores: &[f32],
        top_index: usize,
    ) -> Self {
        let entries = categories
            .labels()
            .iter()
            .zip(percentages.iter().zip(scores.iter()))
            .map(|(label, (&percent, &score))| ScoreEntry {
                label: label.clone(),
                percent,
                score,
            })
            .collect();

        Self { top_index, entries }
    }

    pub fn top(&self) -> &ScoreEntry {
        &self.entries[self.top_index]
    }
}

impl fmt::Display for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let top = self.top();
        writeln!(f, "max score: {}% (class: {})", top.percent, top.label)?;

        let width = self
            .entries
            .iter()
            .map(|e| e.label.len())
            .max()
            .unwrap_or(0);

        for entry in &self.entries {
            writeln!(
                f,
                "  {:>width$}: {:>3}% ({:.6})",
                entry.label,
                entry.percent,
                entry.score,
                width = width
            )?;
        }
        Ok(())
    }
}

/// Byte-oriented, best-effort transport for decision tokens.
///
/// The wire driver behind this (UART, socket, whatever) is an external
/// collaborator; implementations must not block the classification loop.
pub trait DecisionTransport: Send {
    fn send(&mut self, payload: &[u8]) -> Result<()>;
}

/// Transport backed by a bounded in-process channel.
///
/// `send` never blocks: a full queue drops the token, which is the
/// same contract a saturated serial link gives us.
pub struct ChannelTransport {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl DecisionTransport for ChannelTransport {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.tx
            .try_send(payload.to_vec())
            .map_err(|e| Error::Transport(e.to_string()))
    }
}

/// Transport that discards everything, for pipelines without a wire
pub struct NullTransport;

impl DecisionTransport for NullTransport {
    fn send(&mut self, _payload: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Formats and submits diagnostics and decisions
pub struct DecisionReporter {
    transport: Box<dyn DecisionTransport>,
    emit_score_tables: bool,
}

impl DecisionReporter {
    pub fn new(transport: Box<dyn DecisionTransport>) -> Self {
        Self {
            transport,
            emit_score_tables: true,
        }
    }

    pub fn with_score_tables(mut self, emit: bool) -> Self {
        self.emit_score_tables = emit;
        self
    }

    /// Newline-terminated wire token for one decision
    pub fn format_token(decision: &GestureDecision) -> String {
        format!("{}\n", decision.label)
    }

    /// Log the per-inference score table
    pub fn log_inference(&self, table: &ScoreTable) {
        if self.emit_score_tables {
            debug!("\n{}", table);
        } else {
            let top = table.top();
            debug!("max score: {}% (class: {})", top.percent, top.label);
        }
    }

    /// Submit one decision to the transport, best-effort
    pub fn report(&mut self, decision: &GestureDecision) {
        info!(
            "decision: {} ({}/{} votes)",
            decision.label, decision.votes, decision.window
        );

        let token = Self::format_token(decision);
        if let Err(e) = self.transport.send(token.as_bytes()) {
            warn!("decision transport failed: {}", e);
        }
    }
}
