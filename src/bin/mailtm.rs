//! Small CLI that opens a throwaway mailbox and waits for mail.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mailtm_client::{Client, Credentials, Error, Inbox, MessageIntro, MessageStream, Token};

#[derive(Debug, Parser)]
#[command(
    name = "mailtm",
    about = "Open a temporary mail.tm mailbox and print messages as they arrive. \
             Exit the loop with ctrl+c."
)]
struct Args {
    /// Address of an existing account (requires --password).
    #[arg(short, long, requires = "password")]
    address: Option<String>,
    /// Password for the existing account.
    #[arg(short, long)]
    password: Option<String>,
    /// Use the polling fallback instead of the event stream.
    #[arg(long)]
    poll: bool,
    /// Exit after the first message instead of looping.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let client = Client::new()?;

    let credentials = match (args.address, args.password) {
        (Some(address), Some(password)) => Credentials { address, password },
        _ => {
            let credentials = client.generate_credentials(None, None, None).await?;
            let account = client.create_account(&credentials).await?;
            println!("Account created: {}", account.address);
            println!("Password: {}", credentials.password);
            credentials
        }
    };

    let token = client.authenticate(&credentials).await?;
    let account = client.get_me(&token).await?;
    debug!(account_id = %account.id, "logged in");

    let mut inbox = Inbox::new();
    client.refresh_inbox(&mut inbox, &token).await?;
    if !inbox.is_empty() {
        println!("{} message(s) already in the mailbox", inbox.len());
    }

    // One subscription for the whole run, so a message pushed while the
    // previous one is being printed is queued instead of lost.
    let mut stream = if args.poll {
        None
    } else {
        Some(client.subscribe(&account.id, &token)?)
    };

    println!("\nWaiting for new messages... (ctrl+c to exit)");
    loop {
        let intro = tokio::select! {
            result = next_message(&client, stream.as_mut(), &token) => result?,
            _ = tokio::signal::ctrl_c() => {
                println!("\n\nClosing! Bye!");
                return Ok(());
            }
        };
        print_message(&client, &mut inbox, &intro, &token).await?;
        client.refresh_inbox(&mut inbox, &token).await?;
        debug!(cached = inbox.len(), "inbox refreshed");
        if args.once {
            return Ok(());
        }
    }
}

async fn next_message(
    client: &Client,
    stream: Option<&mut MessageStream>,
    token: &Token,
) -> Result<MessageIntro, Error> {
    match stream {
        Some(stream) => stream.next_message().await,
        None => client.wait_for_new_message_polling(token).await,
    }
}

async fn print_message(
    client: &Client,
    inbox: &mut Inbox,
    intro: &MessageIntro,
    token: &Token,
) -> Result<(), Error> {
    println!("\nNew message arrived!");
    println!("From: {}", intro.from.address);
    println!("Subject: {}", intro.subject);
    match client.get_message(&intro.id, token).await {
        Ok(message) => {
            if let Some(text) = &message.text {
                println!("\n{text}");
            }
            client.mark_as_seen(&message.id, token).await?;
            inbox.upgrade(message);
        }
        Err(e) => {
            // The intro is still worth showing even if the full fetch fails.
            println!("(could not fetch full message: {e})");
        }
    }
    Ok(())
}
