use std::io::{self, IsTerminal as _};

use wl_chat::Options;
use wl_client::Client;
use wl_config::Config;

use crate::{Globals, Result};

/// Context for the CLI application
pub(crate) struct Ctx {
    /// Merged file/env/CLI configuration.
    config: Config,

    /// Global CLI arguments.
    pub(crate) term: Term,

    /// Client for the chatbot API.
    pub(crate) client: Client,
}

pub(crate) struct Term {
    /// Global CLI arguments.
    pub(crate) args: Globals,

    /// Whether or not stdout is connected to a TTY.
    ///
    /// If you pipe (|) or redirect (>) the output, stdout is connected to a
    /// pipe or a regular file, respectively. These are not managed by the TTY
    /// subsystem.
    pub(crate) is_tty: bool,
}

impl Term {
    /// Whether to style output with colors.
    pub(crate) fn color(&self) -> bool {
        self.is_tty && self.args.colors
    }
}

impl Ctx {
    pub(crate) fn new(args: Globals, config: Config) -> Result<Self> {
        let client = Client::new(&config.api.base_url)?
            .with_timeout(config.api.timeout())
            .with_max_line_length(config.stream.max_line_length);

        Ok(Self {
            config,
            term: Term {
                args,
                is_tty: io::stdout().is_terminal(),
            },
            client,
        })
    }

    /// Get immutable access to the configuration.
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Options for a chat session, optionally overriding retrieval.
    pub(crate) fn chat_options(&self, no_rag: bool) -> Options {
        Options {
            use_rag: self.config.chat.use_rag && !no_rag,
            idle_timeout: self.config.chat.idle_timeout(),
        }
    }
}
