//! Minimal telnet option handling.
//!
//! The host only needs a plain 8-bit stream, so every option it offers is
//! refused except BINARY, SGA and ECHO. Each option is answered once.

use std::borrow::Cow;
use std::collections::HashSet;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const OPT_BINARY: u8 = 0;
const OPT_ECHO: u8 = 1;
const OPT_SGA: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    Negotiate(u8),
    Sub,
    SubIac,
}

/// Strips telnet commands from inbound bytes and collects the replies.
pub(crate) struct TelnetFilter {
    state: State,
    answered: HashSet<(u8, u8)>,
    replies: Vec<u8>,
}

impl TelnetFilter {
    pub(crate) fn new() -> Self {
        Self {
            state: State::Data,
            answered: HashSet::new(),
            replies: Vec::new(),
        }
    }

    /// Return the data bytes of `input`; negotiation replies accumulate until
    /// [`take_replies`](Self::take_replies).
    pub(crate) fn feed(&mut self, input: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(input.len());
        for &byte in input {
            self.state = match (self.state, byte) {
                (State::Data, IAC) => State::Iac,
                (State::Data, b) => {
                    data.push(b);
                    State::Data
                }
                (State::Iac, IAC) => {
                    data.push(IAC);
                    State::Data
                }
                (State::Iac, cmd @ (WILL | WONT | DO | DONT)) => State::Negotiate(cmd),
                (State::Iac, SB) => State::Sub,
                (State::Iac, _) => State::Data,
                (State::Negotiate(cmd), option) => {
                    self.answer(cmd, option);
                    State::Data
                }
                (State::Sub, IAC) => State::SubIac,
                (State::Sub, _) => State::Sub,
                (State::SubIac, SE) => State::Data,
                (State::SubIac, _) => State::Sub,
            };
        }
        data
    }

    pub(crate) fn take_replies(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.replies)
    }

    fn answer(&mut self, cmd: u8, option: u8) {
        let reply = match cmd {
            WILL if matches!(option, OPT_BINARY | OPT_ECHO | OPT_SGA) => DO,
            WILL => DONT,
            DO if matches!(option, OPT_BINARY | OPT_SGA) => WILL,
            DO => WONT,
            // Acknowledging a refusal is never required.
            _ => return,
        };
        if self.answered.insert((cmd, option)) {
            self.replies.extend_from_slice(&[IAC, reply, option]);
        }
    }
}

/// Double every IAC byte in an outbound payload.
pub(crate) fn escape(payload: &[u8]) -> Cow<'_, [u8]> {
    if !payload.contains(&IAC) {
        return Cow::Borrowed(payload);
    }
    let mut out = Vec::with_capacity(payload.len() + 4);
    for &byte in payload {
        out.push(byte);
        if byte == IAC {
            out.push(IAC);
        }
    }
    Cow::Owned(out)
}
