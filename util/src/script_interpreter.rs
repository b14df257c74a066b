//! # Input script interpreter module
//!
//! Scripts replay inbound messages against the session clock, which allows the control
//! executable to be exercised without any network peers. Each entry has the form
//!
//! ```text
//! <time_s>: <json input message>;
//! ```
//!
//! for example `1.5: {"DesiredDepth": {"desired_depth": 2.0}};`. Entries must be in time order.
//! Anything not matching an entry (such as comment lines) is ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;
use comms_if::ctrl::InputMsg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A message which is scripted to arrive at a specific time.
struct Entry {
    exec_time_s: f64,
    msg: InputMsg,
}

/// A script interpreter.
///
/// After loading the script use `.get_pending()` each cycle to acquire the messages which are due.
pub struct ScriptInterpreter {
    entries: VecDeque<Entry>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not build the script parser: {0}")]
    RegexError(regex::Error),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script entries are out of order at {0} s")]
    OutOfOrder(f64),

    #[error("Script contains an invalid message at {0} s: {1}")]
    InvalidMsg(f64, serde_json::Error),
}

/// Result of polling the interpreter for due messages.
#[derive(Debug, PartialEq)]
pub enum PendingMsgs {
    None,
    Some(Vec<InputMsg>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Load a script from the given path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let script = fs::read_to_string(script_path).map_err(ScriptError::ScriptLoadError)?;

        Self::parse(&script)
    }

    /// Parse a script from its contents.
    pub fn parse(script: &str) -> Result<Self, ScriptError> {
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(ScriptError::RegexError)?;

        let mut entries: VecDeque<Entry> = VecDeque::new();

        for cap in re.captures_iter(script) {
            let time_str = &cap[1];
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|_| ScriptError::InvalidTimestamp(time_str.to_string()))?;

            if let Some(last) = entries.back() {
                if exec_time_s < last.exec_time_s {
                    return Err(ScriptError::OutOfOrder(exec_time_s));
                }
            }

            let msg = InputMsg::from_json(&cap[3])
                .map_err(|e| ScriptError::InvalidMsg(exec_time_s, e))?;

            entries.push_back(Entry { exec_time_s, msg });
        }

        if entries.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(Self { entries })
    }

    /// Return the messages due at the current session time.
    pub fn get_pending(&mut self) -> PendingMsgs {
        self.get_pending_at(get_elapsed_seconds())
    }

    /// Return the messages due at or before `time_s`.
    pub fn get_pending_at(&mut self, time_s: f64) -> PendingMsgs {
        if self.entries.is_empty() {
            return PendingMsgs::EndOfScript;
        }

        let mut msgs = vec![];

        while let Some(entry) = self.entries.front() {
            if entry.exec_time_s > time_s {
                break;
            }
            if let Some(entry) = self.entries.pop_front() {
                msgs.push(entry.msg);
            }
        }

        if msgs.is_empty() {
            PendingMsgs::None
        } else {
            PendingMsgs::Some(msgs)
        }
    }

    /// Get the number of messages remaining in the script
    pub fn get_num_msgs(&self) -> usize {
        self.entries.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        self.entries.back().map(|e| e.exec_time_s).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = r#"
        # Dive to two meters then turn
        0.0: "Init";
        0.5: {"DesiredDepth": {"desired_depth": 2.0}};
        0.5: {"DesiredSpeed": {"desired_speed": 20.0}};
        3.0: {"DesiredHeading": {"desired_heading": 90.0}};
    "#;

    #[test]
    fn test_load_script() {
        let si = ScriptInterpreter::parse(SCRIPT).unwrap();
        assert_eq!(si.get_num_msgs(), 4);
        assert_eq!(si.get_duration(), 3.0);
    }

    #[test]
    fn test_pending_in_time_order() {
        let mut si = ScriptInterpreter::parse(SCRIPT).unwrap();

        assert_eq!(si.get_pending_at(0.1), PendingMsgs::Some(vec![InputMsg::Init]));
        assert_eq!(si.get_pending_at(0.2), PendingMsgs::None);
        assert_eq!(
            si.get_pending_at(1.0),
            PendingMsgs::Some(vec![
                InputMsg::DesiredDepth { desired_depth: 2.0 },
                InputMsg::DesiredSpeed { desired_speed: 20.0 },
            ])
        );
        assert_eq!(
            si.get_pending_at(10.0),
            PendingMsgs::Some(vec![InputMsg::DesiredHeading { desired_heading: 90.0 }])
        );
        assert_eq!(si.get_pending_at(11.0), PendingMsgs::EndOfScript);
    }

    #[test]
    fn test_script_errors() {
        assert!(matches!(
            ScriptInterpreter::parse("# nothing here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::parse("1.0: {\"Bogus\": 1};"),
            Err(ScriptError::InvalidMsg(t, _)) if t == 1.0
        ));
        assert!(matches!(
            ScriptInterpreter::parse("2.0: \"Init\";\n1.0: \"Init\";"),
            Err(ScriptError::OutOfOrder(t)) if t == 1.0
        ));
    }
}
