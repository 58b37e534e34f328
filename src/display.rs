use std::fmt::Write;

use crate::communication::{Event, EventKind};

/// Renders `event` as one console line, formatting its timestamp with
/// `time_format` (strftime syntax). An unusable format falls back to epoch
/// seconds.
#[must_use]
pub fn render(event: &Event, time_format: &str) -> String {
    let mut at = String::new();
    if write!(at, "{}", event.at.format(time_format)).is_err() {
        at = event.at.timestamp().to_string();
    }
    let n = event.alarm_number;
    let message = &event.message;

    match event.kind {
        EventKind::RequestReceived => {
            format!("First Alarm Request With Message Number ({n}) Received at {at}: {message}")
        }
        EventKind::RequestReplaced => format!(
            "Replacement Alarm Request With Message Number ({n}) Received at {at}: {message}"
        ),
        EventKind::RequestCancelled => {
            format!("Cancel Alarm Request With Message Number ({n}) Received at {at}: {message}")
        }
        EventKind::CancelRejectedNotFound => {
            format!("Error: No Alarm Request With Message Number ({n}) to Cancel!")
        }
        EventKind::CancelRejectedDuplicate => format!(
            "Error: More Than One Request to Cancel Alarm Request With Message Number ({n})!"
        ),
        EventKind::RequestProcessed => {
            format!("Alarm Request With Message Number ({n}) Processed at {at}: {message}")
        }
        EventKind::Displayed => {
            format!("Alarm With Message Number ({n}) Displayed at {at}: {message}")
        }
        EventKind::ReplacementDisplayed => {
            format!("Replacement Alarm With Message Number ({n}) Displayed at {at}: {message}")
        }
        EventKind::ReplacedNotice => {
            format!("Alarm With Message Number ({n}) Replaced at {at}: {message}")
        }
        EventKind::NotifierExiting => {
            format!("Display thread for Message Number ({n}) exiting at {at}: {message}")
        }
    }
}
