//! Turns an input line into an [`AlarmRequest`].
//!
//! Two forms are accepted, with whitespace between tokens optional:
//!
//! ```text
//! <seconds> Message(<number>) <message>
//! Cancel: Message(<number>)
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    alarm::AlarmRequest,
    error::{Error, Result},
};

static ALARM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*Message\(\s*(\d+)\)\s*(\S.*)$").expect("alarm pattern is valid")
});

static CANCEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*Cancel:\s*Message\(\s*(\d+)\)").expect("cancel pattern is valid")
});

/// Parses one line of input. Blank lines give `Ok(None)`.
///
/// # Errors
/// Returns [`Error::BadCommand`] when the line matches neither form or a
/// number doesn't fit.
pub fn parse(line: &str) -> Result<Option<AlarmRequest>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    let bad = || Error::BadCommand(line.to_owned());

    if let Some(captures) = ALARM.captures(line) {
        let interval = captures[1].parse().map_err(|_| bad())?;
        let number = captures[2].parse().map_err(|_| bad())?;
        return Ok(Some(AlarmRequest::standard(
            number,
            interval,
            &captures[3],
        )));
    }
    if let Some(captures) = CANCEL.captures(line) {
        let number = captures[1].parse().map_err(|_| bad())?;
        return Ok(Some(AlarmRequest::cancel(number)));
    }
    Err(bad())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AlarmKind, CANCEL_MESSAGE, MAX_MESSAGE_LEN};

    #[test]
    fn parses_alarm_requests() {
        let request = parse("10 Message(3) stand up and stretch\n")
            .unwrap()
            .unwrap();
        assert_eq!(request.kind, AlarmKind::Standard);
        assert_eq!(request.interval, 10);
        assert_eq!(request.number, 3);
        assert_eq!(request.message, "stand up and stretch");

        let tight = parse("  5Message( 12)hi").unwrap().unwrap();
        assert_eq!((tight.interval, tight.number), (5, 12));
        assert_eq!(tight.message, "hi");
    }

    #[test]
    fn parses_cancellations() {
        let request = parse("Cancel: Message(7)").unwrap().unwrap();
        assert_eq!(request.kind, AlarmKind::Cancellation);
        assert_eq!(request.number, 7);
        assert_eq!(request.message, CANCEL_MESSAGE);
    }

    #[test]
    fn long_messages_are_truncated() {
        let line = format!("1 Message(1) {}", "a".repeat(200));
        let request = parse(&line).unwrap().unwrap();
        assert_eq!(request.message.len(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse("").unwrap().is_none());
        assert!(parse("   \r\n").unwrap().is_none());
    }

    #[test]
    fn malformed_lines_are_rejected() {
        for line in [
            "hello",
            "-5 Message(1) negative interval",
            "5 Message(1)",
            "5 Message(x) bad number",
            "Cancel: 4",
            "99999999999999999999999 Message(1) overflow",
            "5 Message(99999999999) number too big",
        ] {
            assert!(
                matches!(parse(line), Err(Error::BadCommand(_))),
                "accepted {line:?}"
            );
        }
    }
}
