// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire framing for the embedded REPL helper protocol.
//!
//! Request framing: `<request><US><args-joined-by-PU1>` where `US` is the
//! unit separator (U+001F) and `PU1` is U+0091. The response is a single
//! line terminated by `\n`. `ping` is reserved for sentinel synchronisation
//! and carries `"ok"` or `"error"` instead of a framed request.

pub const UNIT_SEPARATOR: char = '\u{1F}';
pub const PRIVATE_USE_ONE: char = '\u{91}';

pub const REQUEST_COMPLETIONS: &str = "completions";
pub const REQUEST_ADD_HISTORY: &str = "add_history";
pub const REQUEST_HISTORY_ITEM: &str = "history_item";
pub const REQUEST_IS_COMPLETE: &str = "is_complete";

pub const SENTINEL_OK: &str = "ok";
pub const SENTINEL_ERROR: &str = "error";

/// Encode a request line for the helper's loopback socket.
pub fn encode_request(request: &str, args: &[&str]) -> String {
    let joined = args.join(&PRIVATE_USE_ONE.to_string());
    format!("{request}{UNIT_SEPARATOR}{joined}")
}

/// Split a received request line back into its request name and args.
pub fn decode_request(line: &str) -> (&str, Vec<&str>) {
    match line.split_once(UNIT_SEPARATOR) {
        Some((request, rest)) if !rest.is_empty() => {
            (request, rest.split(PRIVATE_USE_ONE).collect())
        }
        Some((request, _)) => (request, Vec::new()),
        None => (line, Vec::new()),
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
