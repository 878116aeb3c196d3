//! SQL accumulated by a migration for the three execution phases

use std::fmt;

/// Execution phase of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs first, e.g. type creation other migrations rely on
    Prologue,
    /// Schema creation and upgrades
    Main,
    /// Runs last, after every main section has been committed
    Epilogue,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 3] = [Phase::Prologue, Phase::Main, Phase::Epilogue];

    /// Lowercase name used in logs and errors
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prologue => "prologue",
            Phase::Main => "main",
            Phase::Epilogue => "epilogue",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-migration accumulator for prologue, main and epilogue SQL
///
/// Appends are plain concatenation; callers supply complete, `;`-terminated statements.
/// Writing through [`fmt::Write`] targets the main section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlWriter {
    prologue: String,
    main: String,
    epilogue: String,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_to_prologue(&mut self, sql: &str) -> &mut Self {
        self.prologue.push_str(sql);
        self
    }

    pub fn append(&mut self, sql: &str) -> &mut Self {
        self.main.push_str(sql);
        self
    }

    pub fn append_to_epilogue(&mut self, sql: &str) -> &mut Self {
        self.epilogue.push_str(sql);
        self
    }

    pub fn prologue(&self) -> &str {
        &self.prologue
    }

    pub fn main(&self) -> &str {
        &self.main
    }

    pub fn epilogue(&self) -> &str {
        &self.epilogue
    }

    /// Text accumulated for `phase`
    pub fn section(&self, phase: Phase) -> &str {
        match phase {
            Phase::Prologue => &self.prologue,
            Phase::Main => &self.main,
            Phase::Epilogue => &self.epilogue,
        }
    }

    /// True when all three sections are empty
    pub fn is_empty(&self) -> bool {
        self.prologue.is_empty() && self.main.is_empty() && self.epilogue.is_empty()
    }
}

impl fmt::Write for SqlWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.main.push_str(s);
        Ok(())
    }
}
