use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::task::JoinSet;

use super::{TEST_BODY, TEST_TITLE};
use crate::api::{ApiClient, DeviceApi};
use crate::core::AppConfig;
use crate::notify::{MessageHandler, NotificationPresenter, RemoteMessage, TerminalPresenter};
use crate::session::{Registration, Session};
use crate::token::{DeviceRegistrar, StaticTokenSource, TokenListener, TokenSource, bootstrap};

const HELP: &str = "\
push                     send a test notification to this device
token <value>            simulate a token rotation
message <title> | <body> simulate an incoming remote message
status                   show the current registration
quit                     leave the session";

const NO_TOKEN: &str = "No push token available, use `token <value>` to register";

#[derive(Debug, PartialEq, Eq)]
enum ListenCommand {
    Push,
    Token(String),
    Message(RemoteMessage),
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<ListenCommand> {
    let line = line.trim();
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match cmd {
        "push" => Some(ListenCommand::Push),
        "token" if !rest.is_empty() => Some(ListenCommand::Token(rest.to_string())),
        "message" => {
            let (title, body) = rest.split_once('|').unwrap_or((rest, ""));
            let title = title.trim();
            let body = body.trim();
            Some(ListenCommand::Message(RemoteMessage {
                title: (!title.is_empty()).then(|| title.to_string()),
                body: (!body.is_empty()).then(|| body.to_string()),
            }))
        }
        "status" => Some(ListenCommand::Status),
        "help" | "?" => Some(ListenCommand::Help),
        "quit" | "exit" => Some(ListenCommand::Quit),
        _ => None,
    }
}

/// Registers the initial token. Returns the notice to show when there
/// is no token to register.
async fn start(source: &dyn TokenSource, registrar: &DeviceRegistrar) -> Option<&'static str> {
    bootstrap(source, registrar).await.err().map(|_| NO_TOKEN)
}

pub async fn run(config: &AppConfig, model: &str, token: &str) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let client: Arc<dyn DeviceApi> = Arc::new(ApiClient::new(config)?);
    let session = Arc::new(Session::new());
    let registrar = Arc::new(DeviceRegistrar::new(
        Arc::clone(&client),
        Arc::clone(&session),
        model,
    ));

    let presenter = Arc::new(TerminalPresenter::new(true));
    presenter.request_permission();
    let messages = MessageHandler::new(presenter);

    // Every network call runs in its own task so the prompt stays
    // responsive. They are awaited before leaving the session.
    let mut tasks = JoinSet::new();
    {
        let registrar = Arc::clone(&registrar);
        let source = StaticTokenSource::new(token);
        tasks.spawn(async move {
            if let Some(notice) = start(&source, &registrar).await {
                println!("{}", notice);
            }
        });
    }

    println!("Type `help` for commands");
    loop {
        let readline = rl.readline(">>> ");
        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Some(ListenCommand::Push) => {
                let client = Arc::clone(&client);
                let session = Arc::clone(&session);
                tasks.spawn(async move {
                    match session.dispatch(client.as_ref(), TEST_TITLE, TEST_BODY).await {
                        Ok(id) => println!("Notification sent to device {}", id),
                        Err(e) => {
                            tracing::error!("{}", e);
                            println!("{}", e.notice());
                        }
                    }
                });
            }
            Some(ListenCommand::Token(token)) => {
                let registrar = Arc::clone(&registrar);
                tasks.spawn(async move { registrar.on_token_issued(token).await });
            }
            Some(ListenCommand::Message(message)) => {
                if let Err(e) = messages.on_message_received(message) {
                    println!("Notification not shown: {}", e);
                }
            }
            Some(ListenCommand::Status) => match session.registration() {
                Registration::Registered { id, token } => {
                    println!("Registered as device {} with token {}", id, token)
                }
                Registration::Unregistered => println!("Not registered"),
            },
            Some(ListenCommand::Help) => println!("{}", HELP),
            Some(ListenCommand::Quit) => break,
            None => println!("Unknown command, type `help`"),
        }

        // Reap finished tasks so the set doesn't grow for the whole session
        while tasks.try_join_next().is_some() {}
    }

    while tasks.join_next().await.is_some() {}
    Ok(())
}
