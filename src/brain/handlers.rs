//! Built-in speech handlers

use super::{HandlerOutcome, SpeechHandler};
use crate::mic::InputChannel;
use crate::profile::Profile;
use crate::Result;
use chrono::{Local, Timelike};

/// Tells the current local time
pub struct ClockHandler {
    phrases: Vec<String>,
}

impl ClockHandler {
    pub fn new() -> Self {
        Self {
            phrases: vec!["TIME".to_string(), "WHAT TIME IS IT".to_string()],
        }
    }

    fn spoken_time(hour: u32, minute: u32) -> String {
        let (hour12, suffix) = match hour {
            0 => (12, "A M"),
            1..=11 => (hour, "A M"),
            12 => (12, "P M"),
            _ => (hour - 12, "P M"),
        };
        match minute {
            0 => format!("It is {} {} right now.", hour12, suffix),
            1..=9 => format!("It is {} oh {} {} right now.", hour12, minute, suffix),
            _ => format!("It is {} {} {} right now.", hour12, minute, suffix),
        }
    }
}

impl Default for ClockHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechHandler for ClockHandler {
    fn phrases(&self) -> Vec<String> {
        self.phrases.clone()
    }

    fn handle(&mut self, _text: &str, mic: &mut dyn InputChannel) -> Result<HandlerOutcome> {
        let now = Local::now();
        mic.say(&Self::spoken_time(now.hour(), now.minute()))?;
        Ok(HandlerOutcome::Continue)
    }
}

/// Ends the conversation
pub struct ShutdownHandler {
    first_name: Option<String>,
}

impl ShutdownHandler {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            first_name: profile.get_str(&["first_name"]),
        }
    }
}

impl SpeechHandler for ShutdownHandler {
    fn phrases(&self) -> Vec<String> {
        vec!["SHUTDOWN".to_string(), "SHUT DOWN".to_string(), "GOODBYE".to_string()]
    }

    // Checked before anything that might also match "DOWN"
    fn priority(&self) -> i32 {
        100
    }

    fn handle(&mut self, _text: &str, mic: &mut dyn InputChannel) -> Result<HandlerOutcome> {
        let farewell = match &self.first_name {
            Some(name) => format!("Goodbye, {}.", name),
            None => "Goodbye.".to_string(),
        };
        mic.say(&farewell)?;
        Ok(HandlerOutcome::Stop)
    }
}
