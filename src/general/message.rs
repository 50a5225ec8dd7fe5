use std::fmt;

use askama::Template;

#[derive(Clone, Debug)]
pub enum Level {
    Success,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let class = match self {
            Level::Success => "success",
            Level::Error => "negative",
        };

        write!(f, "{}", class)
    }
}

/// Inline message shown above a form
#[derive(Clone, Debug, Template)]
#[template(path = "general/message_block.html")]
pub struct MessageBlock {
    level: Level,
    body: String,
}

impl MessageBlock {
    pub fn empty() -> Self {
        Self {
            level: Level::Success,
            body: "".to_owned(),
        }
    }

    pub fn error(body: &str) -> Self {
        Self {
            level: Level::Error,
            body: body.to_owned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
