//! The listen / dispatch / answer loop

use crate::brain::{Dispatcher, HandlerOutcome};
use crate::mic::InputChannel;
use crate::Result;
use tracing::{debug, error, info};

pub struct Conversation<M: InputChannel> {
    mic: M,
    dispatcher: Dispatcher,
    first_name: Option<String>,
    keyword: String,
}

impl<M: InputChannel> Conversation<M> {
    pub fn new(mic: M, dispatcher: Dispatcher, keyword: &str, first_name: Option<String>) -> Self {
        Self {
            mic,
            dispatcher,
            first_name,
            keyword: keyword.to_string(),
        }
    }

    pub fn mic(&self) -> &M {
        &self.mic
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn greet(&mut self) -> Result<()> {
        let greeting = match &self.first_name {
            Some(name) => format!("How can I be of service, {}?", name),
            None => "How can I be of service?".to_string(),
        };
        self.mic.say(&greeting)
    }

    /// Handle one batch of transcriptions, returning whether to keep going
    pub fn handle(&mut self, texts: &[String]) -> Result<HandlerOutcome> {
        if texts.iter().all(|t| t.trim().is_empty()) {
            debug!("Nothing heard");
            return Ok(HandlerOutcome::Continue);
        }

        let Some((index, text)) = self.dispatcher.query(texts) else {
            info!("No handler for {:?}", texts);
            self.mic.say("I'm sorry, I didn't understand that.")?;
            return Ok(HandlerOutcome::Continue);
        };

        let Some(handler) = self.dispatcher.handler_mut(index) else {
            return Ok(HandlerOutcome::Continue);
        };
        match handler.handle(&text, &mut self.mic) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Handler failed on '{}': {}", text, e);
                self.mic.say(&format!(
                    "I'm sorry, something went wrong: {}",
                    e.user_message()
                ))?;
                Ok(HandlerOutcome::Continue)
            }
        }
    }

    /// Listen and answer until the input runs out or a handler stops
    pub fn handle_forever(&mut self) -> Result<()> {
        info!("Listening for '{}'", self.keyword);
        while let Some(texts) = self.mic.listen()? {
            if self.handle(&texts)? == HandlerOutcome::Stop {
                info!("Conversation stopped by handler");
                return Ok(());
            }
        }
        info!("Input exhausted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::handlers::ShutdownHandler;
    use crate::brain::SpeechHandler;
    use crate::profile::Profile;
    use crate::ParleyError;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Script {
        heard: VecDeque<Vec<String>>,
        said: Vec<String>,
    }

    impl InputChannel for Script {
        fn listen(&mut self) -> Result<Option<Vec<String>>> {
            Ok(self.heard.pop_front())
        }

        fn active_listen(&mut self) -> Result<Vec<String>> {
            Ok(self.heard.pop_front().unwrap_or_default())
        }

        fn say(&mut self, text: &str) -> Result<()> {
            self.said.push(text.to_string());
            Ok(())
        }
    }

    struct Failing;

    impl SpeechHandler for Failing {
        fn phrases(&self) -> Vec<String> {
            vec!["WEATHER".to_string()]
        }

        fn handle(&mut self, _text: &str, _mic: &mut dyn InputChannel) -> Result<HandlerOutcome> {
            Err(ParleyError::Io("forecast unavailable".into()))
        }
    }

    fn conversation(heard: &[&str]) -> Conversation<Script> {
        let mut dispatcher = Dispatcher::new(Vec::new());
        dispatcher.add_handler(Box::new(ShutdownHandler::from_profile(&Profile::default())));
        dispatcher.add_handler(Box::new(Failing));
        let mic = Script {
            heard: heard.iter().map(|h| vec![h.to_string()]).collect(),
            said: Vec::new(),
        };
        Conversation::new(mic, dispatcher, "NAOMI", Some("Ada".to_string()))
    }

    #[test]
    fn test_greeting_uses_first_name() {
        let mut c = conversation(&[]);
        c.greet().unwrap();
        assert_eq!(c.mic().said, vec!["How can I be of service, Ada?".to_string()]);
    }

    #[test]
    fn test_greeting_without_name_does_not_ask() {
        let mut c = conversation(&["goodbye"]);
        c.first_name = None;
        c.greet().unwrap();
        assert_eq!(c.mic().said, vec!["How can I be of service?".to_string()]);
        // Nothing was read from the input channel
        assert_eq!(c.mic().heard.len(), 1);
    }

    #[test]
    fn test_stops_on_shutdown() {
        let mut c = conversation(&["hello", "goodbye", "weather"]);
        c.handle_forever().unwrap();
        assert_eq!(c.mic().said.len(), 2);
        assert!(c.mic().said[0].contains("didn't understand"));
        assert_eq!(c.mic().said[1], "Goodbye.");
        assert_eq!(c.mic().heard.len(), 1);
    }

    #[test]
    fn test_handler_error_is_reported() {
        let mut c = conversation(&["weather"]);
        c.handle_forever().unwrap();
        assert!(c.mic().said[0].starts_with("I'm sorry, something went wrong"));
    }
}
